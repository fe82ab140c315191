//! Story Part Types
//!
//! A part is one node of the branching story graph. Background and
//! foreground are closed tagged unions keyed by `type`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Content descriptor for a part layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Scene {
    Video {
        url: String,
        #[serde(default)]
        muted: bool,
    },
    /// Quiz definition is owned by the quiz runtime and kept opaque here.
    Quiz {
        #[serde(default)]
        definition: serde_json::Value,
    },
    Announcement {
        #[serde(default)]
        title: String,
        #[serde(default)]
        text: String,
    },
    #[default]
    None,
}

impl Scene {
    pub fn is_quiz(&self) -> bool {
        matches!(self, Scene::Quiz { .. })
    }
}

/// A node of the story graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Part {
    pub id: String,
    pub story_id: String,
    #[serde(default)]
    pub is_initial: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub background: Scene,
    #[serde(default)]
    pub foreground: Scene,
    #[serde(default)]
    pub default_next_part_id: Option<String>,
    /// Set for branching parts.
    #[serde(default)]
    pub decision_table_id: Option<String>,
}

impl Part {
    pub fn new(id: impl Into<String>, story_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            story_id: story_id.into(),
            is_initial: false,
            is_final: false,
            background: Scene::None,
            foreground: Scene::None,
            default_next_part_id: None,
            decision_table_id: None,
        }
    }

    pub fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    pub fn final_part(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn with_next(mut self, next_part_id: impl Into<String>) -> Self {
        self.default_next_part_id = Some(next_part_id.into());
        self
    }

    pub fn with_decision_table(mut self, table_id: impl Into<String>) -> Self {
        self.decision_table_id = Some(table_id.into());
        self
    }

    pub fn with_background(mut self, scene: Scene) -> Self {
        self.background = scene;
        self
    }

    pub fn with_foreground(mut self, scene: Scene) -> Self {
        self.foreground = scene;
        self
    }

    pub fn is_branching(&self) -> bool {
        self.decision_table_id.is_some()
    }
}
