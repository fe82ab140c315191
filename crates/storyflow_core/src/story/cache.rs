//! Built-graph cache keyed by story id.
//!
//! Building validates the whole story, so callers keep the result around
//! and rebuild after every authoring edit. There is no partial update.

use super::graph::StoryGraph;
use super::types::Part;
use crate::error::ValidationError;
use crate::logic::DecisionTable;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug, Default)]
pub struct GraphCache {
    graphs: RwLock<HashMap<String, Arc<StoryGraph>>>,
}

impl GraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, story_id: &str) -> Option<Arc<StoryGraph>> {
        let graphs = self.graphs.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        graphs.get(story_id).cloned()
    }

    /// Build and cache a graph; every part must belong to `story_id`. On
    /// validation failure the previous entry (if any) stays in place.
    pub fn rebuild(
        &self,
        story_id: &str,
        parts: Vec<Part>,
        tables: Vec<DecisionTable>,
    ) -> Result<Arc<StoryGraph>, Vec<ValidationError>> {
        let graph = Arc::new(StoryGraph::build_for_story(story_id, parts, tables)?);
        let mut graphs = self.graphs.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        graphs.insert(story_id.to_string(), Arc::clone(&graph));
        debug!(story = story_id, "story graph cached");
        Ok(graph)
    }

    pub fn invalidate(&self, story_id: &str) -> bool {
        let mut graphs = self.graphs.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        graphs.remove(story_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.graphs.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
