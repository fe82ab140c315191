//! # Traversal Limits
//!
//! Budgets for the eager traversal modes (sequence resolution and path
//! preview). Interactive stepping ignores them.
//!
//! ```rust,ignore
//! let limits = TraversalLimits::load("limits.json")?;
//! let preview = graph.enumerate_paths(&limits);
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::{env, fs};

/// Environment variable naming a limits JSON file.
pub const LIMITS_PATH_ENV: &str = "STORYFLOW_LIMITS_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalLimits {
    /// Maximum steps for `resolve_sequence` (default: 1000)
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Maximum parts on one previewed path (default: 256)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum number of previewed paths (default: 512)
    #[serde(default = "default_max_paths")]
    pub max_paths: usize,
}

fn default_max_steps() -> usize {
    1000
}
fn default_max_depth() -> usize {
    256
}
fn default_max_paths() -> usize {
    512
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_depth: default_max_depth(),
            max_paths: default_max_paths(),
        }
    }
}

impl TraversalLimits {
    /// Load limits from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse limits from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let limits: TraversalLimits = serde_json::from_str(json)?;
        limits.validate()?;
        Ok(limits)
    }

    /// Load from the file named by `STORYFLOW_LIMITS_PATH`, or defaults when
    /// the variable is unset or blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        let Ok(path) = env::var(LIMITS_PATH_ENV) else {
            return Ok(Self::default());
        };

        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_steps == 0 {
            return Err(ConfigError::Invalid("max_steps must be at least 1".to_string()));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".to_string()));
        }
        if self.max_paths == 0 {
            return Err(ConfigError::Invalid("max_paths must be at least 1".to_string()));
        }
        Ok(())
    }
}
