//! Answer sets submitted by the quiz runtime

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Answers for one quiz instance, keyed by question id.
///
/// Values are opaque JSON (scalars, arrays, objects, or an answer-item id).
/// A missing key means the question was left unanswered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AnswerSet {
    values: BTreeMap<String, Value>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer; a second answer for the same question replaces the first.
    pub fn insert(&mut self, question_id: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(question_id.into(), value.into());
    }

    pub fn with(mut self, question_id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(question_id, value);
        self
    }

    pub fn get(&self, question_id: &str) -> Option<&Value> {
        self.values.get(question_id)
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.values.contains_key(question_id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build from a JSON object as produced by the quiz UI.
    pub fn from_json(value: &Value) -> Option<Self> {
        value.as_object().map(|map| {
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        })
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self { values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}
