//! Persistence Records
//!
//! Flat records as handed over by the storage layer (parts, quiz logic,
//! rules, rule inputs linked by foreign keys). `assemble` builds every
//! entity first, then wires part → decision table once.

use crate::error::{CoreError, ValidationError};
use crate::logic::{DecisionTable, HitPolicy, Rule, RuleInput};
use crate::story::{Part, StoryGraph};
use crate::SCHEMA_VERSION;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

fn default_schema_version() -> u8 {
    SCHEMA_VERSION
}

/// Everything stored for one story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoryRecords {
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
    #[serde(default)]
    pub story_id: Option<String>,
    pub parts: Vec<Part>,
    #[serde(default)]
    pub quiz_logics: Vec<QuizLogicRecord>,
    #[serde(default)]
    pub rules: Vec<QuizLogicRuleRecord>,
    #[serde(default)]
    pub rule_inputs: Vec<QuizLogicRuleInputRecord>,
}

/// Decision table row ("quiz logic for part").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuizLogicRecord {
    pub id: String,
    /// Owning part. The part's `decision_table_id` is filled from this.
    #[serde(default)]
    pub part_id: Option<String>,
    #[serde(default)]
    pub hit_policy: HitPolicy,
    #[serde(default)]
    pub default_next_part_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuizLogicRuleRecord {
    pub id: String,
    pub quiz_logic_id: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub name: String,
    pub next_part_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuizLogicRuleInputRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub rule_id: String,
    /// Blank or missing ids are rejected when the rule is built.
    #[serde(default)]
    pub question_id: String,
    #[serde(default)]
    pub answer_item_id: Option<String>,
    /// Canonical expected value.
    #[serde(default)]
    pub value: Value,
}

impl StoryRecords {
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Wire the flat records into parts and decision tables.
    pub fn assemble(self) -> Result<(Vec<Part>, Vec<DecisionTable>), CoreError> {
        let StoryRecords { schema_version, story_id: _, mut parts, quiz_logics, rules, rule_inputs } =
            self;
        if schema_version != SCHEMA_VERSION {
            return Err(CoreError::SchemaVersion { found: schema_version, expected: SCHEMA_VERSION });
        }

        let logic_ids: HashSet<&str> = quiz_logics.iter().map(|l| l.id.as_str()).collect();
        let mut rule_ids = HashSet::new();
        for rule in &rules {
            if !rule_ids.insert(rule.id.as_str()) {
                return Err(CoreError::Assembly(format!("duplicate rule id {}", rule.id)));
            }
            if !logic_ids.contains(rule.quiz_logic_id.as_str()) {
                return Err(CoreError::Assembly(format!(
                    "rule {} references unknown quiz logic {}",
                    rule.id, rule.quiz_logic_id
                )));
            }
        }

        let mut inputs_by_rule: HashMap<&str, Vec<RuleInput>> = HashMap::new();
        for input in &rule_inputs {
            if !rule_ids.contains(input.rule_id.as_str()) {
                return Err(CoreError::Assembly(format!(
                    "rule input {} references unknown rule {}",
                    input.id.as_deref().unwrap_or("<unnamed>"),
                    input.rule_id
                )));
            }
            inputs_by_rule.entry(input.rule_id.as_str()).or_default().push(RuleInput {
                question_id: input.question_id.clone(),
                answer_item_id: input.answer_item_id.clone(),
                expected_value: input.value.clone(),
            });
        }

        let mut rules_by_logic: HashMap<&str, Vec<Rule>> = HashMap::new();
        for record in &rules {
            let inputs = inputs_by_rule.remove(record.id.as_str()).unwrap_or_default();
            let rule = Rule::new(
                record.id.clone(),
                record.order,
                record.name.clone(),
                inputs,
                record.next_part_id.clone(),
            )?;
            rules_by_logic.entry(record.quiz_logic_id.as_str()).or_default().push(rule);
        }

        let part_slots: HashMap<String, usize> =
            parts.iter().enumerate().map(|(i, p)| (p.id.clone(), i)).collect();

        let mut tables = Vec::with_capacity(quiz_logics.len());
        for logic in &quiz_logics {
            if let Some(part_id) = &logic.part_id {
                let slot = *part_slots.get(part_id).ok_or_else(|| {
                    CoreError::Assembly(format!(
                        "quiz logic {} belongs to unknown part {}",
                        logic.id, part_id
                    ))
                })?;
                let part = &mut parts[slot];
                match &part.decision_table_id {
                    Some(existing) if existing != &logic.id => {
                        return Err(CoreError::Assembly(format!(
                            "part {} is linked to quiz logic {} but quiz logic {} claims it",
                            part.id, existing, logic.id
                        )));
                    }
                    _ => part.decision_table_id = Some(logic.id.clone()),
                }
            }

            tables.push(DecisionTable::new(
                logic.id.clone(),
                logic.hit_policy,
                rules_by_logic.remove(logic.id.as_str()).unwrap_or_default(),
                logic.default_next_part_id.clone(),
            ));
        }

        debug!(parts = parts.len(), tables = tables.len(), "story records assembled");
        Ok((parts, tables))
    }

    /// Assemble and validate in one go. When `story_id` is set, every part
    /// must belong to it.
    pub fn build_graph(self) -> Result<StoryGraph, CoreError> {
        let story_id = self.story_id.clone();
        let (parts, tables) = self.assemble()?;
        Ok(build_graph_for(story_id.as_deref(), parts, tables)?)
    }
}

pub(crate) fn build_graph_for(
    story_id: Option<&str>,
    parts: Vec<Part>,
    tables: Vec<DecisionTable>,
) -> Result<StoryGraph, Vec<ValidationError>> {
    match story_id {
        Some(story_id) => StoryGraph::build_for_story(story_id, parts, tables),
        None => StoryGraph::build(parts, tables),
    }
}

/// JSON schema describing [`StoryRecords`].
pub fn story_schema() -> RootSchema {
    schemars::schema_for!(StoryRecords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;
    use serde_json::json;

    const DEMO: &str = include_str!("../../fixtures/play_pause_story.json");

    fn demo() -> StoryRecords {
        StoryRecords::from_json(DEMO).unwrap()
    }

    #[test]
    fn test_assemble_demo() {
        let (parts, tables) = demo().assemble().unwrap();
        assert_eq!(parts.len(), 4);
        assert_eq!(tables.len(), 1);

        let quiz = parts.iter().find(|p| p.id == "play-pause").unwrap();
        assert_eq!(quiz.decision_table_id.as_deref(), Some("play-pause-quiz"));

        let rule = &tables[0].rules()[0];
        assert_eq!(rule.inputs().len(), 2);
        assert_eq!(rule.inputs()[0].answer_item_id.as_deref(), Some("question1-item-1"));
        assert_eq!(rule.inputs()[0].expected_value, json!("1"));
    }

    #[test]
    fn test_build_graph_demo() {
        let graph = demo().build_graph().unwrap();
        assert_eq!(graph.initial_part().id, "intro");
        assert!(graph.part("finale").unwrap().is_final);
    }

    #[test]
    fn test_rule_without_inputs_rejected() {
        let mut records = demo();
        records.rule_inputs.clear();
        let err = records.assemble().unwrap_err();
        assert!(matches!(err, CoreError::Rule(RuleError::EmptyRule { ref rule_id }) if rule_id == "rule1"));
    }

    #[test]
    fn test_input_without_question_rejected() {
        let mut records = demo();
        records.rule_inputs[1].question_id = String::new();
        let err = records.assemble().unwrap_err();
        assert!(matches!(err, CoreError::Rule(RuleError::MissingQuestionId { .. })));
    }

    #[test]
    fn test_orphan_records_rejected() {
        let mut records = demo();
        records.rules[0].quiz_logic_id = "nope".to_string();
        assert!(matches!(records.assemble(), Err(CoreError::Assembly(_))));

        let mut records = demo();
        records.rule_inputs[0].rule_id = "nope".to_string();
        assert!(matches!(records.assemble(), Err(CoreError::Assembly(_))));

        let mut records = demo();
        records.quiz_logics[0].part_id = Some("nope".to_string());
        assert!(matches!(records.assemble(), Err(CoreError::Assembly(_))));
    }

    #[test]
    fn test_conflicting_back_pointer_rejected() {
        let mut records = demo();
        records.parts[1].decision_table_id = Some("other".to_string());
        assert!(matches!(records.assemble(), Err(CoreError::Assembly(_))));
    }

    #[test]
    fn test_schema_version_checked() {
        let mut records = demo();
        records.schema_version = 2;
        assert!(matches!(
            records.assemble(),
            Err(CoreError::SchemaVersion { found: 2, expected: 1 })
        ));
    }

    #[test]
    fn test_validation_errors_surface() {
        let mut records = demo();
        records.rules[0].next_part_id = "ghost".to_string();
        match records.build_graph() {
            Err(CoreError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation failure, got {:?}", other.map(|g| g.len())),
        }
    }

    #[test]
    fn test_parts_must_match_story_id() {
        let mut records = demo();
        records.parts[3].story_id = "other".to_string();
        match records.build_graph() {
            Err(CoreError::Validation(errors)) => assert_eq!(
                errors,
                vec![ValidationError::ForeignPart {
                    part_id: "finale".to_string(),
                    story_id: "other".to_string(),
                    expected: "demo".to_string(),
                }]
            ),
            other => panic!("expected validation failure, got {:?}", other.map(|g| g.len())),
        }

        let mut records = demo();
        records.story_id = Some("renamed".to_string());
        assert!(matches!(records.build_graph(), Err(CoreError::Validation(errors)) if errors.len() == 4));
    }

    #[test]
    fn test_schema_accepts_demo() {
        let schema = serde_json::to_value(story_schema()).unwrap();
        let compiled = jsonschema::JSONSchema::compile(&schema).unwrap();
        let instance: Value = serde_json::from_str(DEMO).unwrap();
        assert!(compiled.is_valid(&instance));
        assert!(!compiled.is_valid(&json!({"parts": "not a list"})));
    }
}
