//! # storyflow_core - Quiz Decision Logic and Branching Story Traversal
//!
//! Evaluates quiz answers against ordered decision tables and walks the
//! resulting branching story graph.
//!
//! ## Features
//! - First-hit decision tables with stable tie-breaking and default fallback
//! - Story graph validation that reports every problem at once
//! - Interactive playback (cycles allowed) and bounded eager traversal
//! - JSON / MessagePack boundary for the surrounding application
//!
//! Everything here is synchronous and pure over in-memory data. A built
//! [`StoryGraph`] is immutable and can be shared across threads.

pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod story;

pub use api::{resolve_next_json, validate_story_json, StoryRecords};
pub use config::TraversalLimits;
pub use error::{ConfigError, CoreError, ReferenceSource, ResolveError, Result, RuleError, ValidationError};
pub use logic::{evaluate, AnswerSet, DecisionTable, Evaluation, HitPolicy, Rule, RuleInput};
pub use story::{
    AnswerSource, GraphCache, Part, PlaybackSession, Playthrough, Scene, Step, StepReason,
    StoryGraph,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;
