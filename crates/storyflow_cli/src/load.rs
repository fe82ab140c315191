//! Input file loading (JSON or YAML by extension)

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use storyflow_core::{AnswerSet, AnswerSource, Part, StoryRecords, TraversalLimits};

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("yaml") | Some("yml")
    )
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if is_yaml(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))
    }
}

pub fn load_records(path: &Path) -> Result<StoryRecords> {
    load_document(path)
}

/// Explicit limits file, else `STORYFLOW_LIMITS_PATH`, else defaults.
pub fn load_limits(path: Option<&Path>) -> Result<TraversalLimits> {
    match path {
        Some(path) => TraversalLimits::load(path)
            .with_context(|| format!("Failed to load limits from {}", path.display())),
        None => TraversalLimits::from_env().context("Failed to load limits from environment"),
    }
}

/// Scripted answers for `play`: part id → answer sets, used in visit order.
///
/// A part visited more often than it has scripted answers is treated as
/// unanswered from then on.
#[derive(Debug, Default)]
pub struct AnswerScript {
    by_part: HashMap<String, VecDeque<AnswerSet>>,
}

impl AnswerScript {
    pub fn load(path: &Path) -> Result<Self> {
        let by_part: HashMap<String, Vec<AnswerSet>> = load_document(path)?;
        Ok(Self { by_part: by_part.into_iter().map(|(k, v)| (k, v.into())).collect() })
    }

    pub fn remaining(&self) -> usize {
        self.by_part.values().map(VecDeque::len).sum()
    }
}

impl AnswerSource for AnswerScript {
    fn answers_for(&mut self, part: &Part) -> Option<AnswerSet> {
        self.by_part.get_mut(&part.id).and_then(VecDeque::pop_front)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml_records() {
        let file = temp_file(
            ".yaml",
            r#"
parts:
  - id: intro
    story_id: demo
    is_initial: true
    background: { type: video, url: intro.mp4 }
    default_next_part_id: end
  - id: end
    story_id: demo
    is_final: true
"#,
        );

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.parts.len(), 2);
        assert!(records.build_graph().is_ok());
    }

    #[test]
    fn test_load_json_records_reports_path() {
        let file = temp_file(".json", "{ not json");
        let err = load_records(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_answer_script_pops_in_order() {
        let file = temp_file(
            ".json",
            r#"{"quiz": [{"q": "NO"}, {"q": "YES"}]}"#,
        );
        let mut script = AnswerScript::load(file.path()).unwrap();
        let quiz = Part::new("quiz", "s");

        assert_eq!(script.answers_for(&quiz).unwrap().get("q").unwrap(), "NO");
        assert_eq!(script.answers_for(&quiz).unwrap().get("q").unwrap(), "YES");
        assert!(script.answers_for(&quiz).is_none());
        assert!(script.answers_for(&Part::new("other", "s")).is_none());
        assert_eq!(script.remaining(), 0);
    }
}
