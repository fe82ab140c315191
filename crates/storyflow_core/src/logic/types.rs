//! Decision table core types
//!
//! RuleInput → Rule → DecisionTable. Rules are validated when they are
//! constructed, so every table the evaluator sees is well formed.

use super::answers::AnswerSet;
use crate::error::RuleError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Strategy for choosing among several matching rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HitPolicy {
    /// First rule in `order` whose inputs all match wins
    #[default]
    First,
}

/// One condition of a rule: `question_id == expected_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, JsonSchema)]
pub struct RuleInput {
    #[validate(length(min = 1))]
    pub question_id: String,
    /// Answer item the author picked in the editor. Display/provenance only;
    /// the evaluator compares `expected_value`.
    #[serde(default)]
    pub answer_item_id: Option<String>,
    pub expected_value: Value,
}

impl RuleInput {
    pub fn new(question_id: impl Into<String>, expected_value: impl Into<Value>) -> Self {
        Self {
            question_id: question_id.into(),
            answer_item_id: None,
            expected_value: expected_value.into(),
        }
    }

    pub fn with_answer_item(mut self, answer_item_id: impl Into<String>) -> Self {
        self.answer_item_id = Some(answer_item_id.into());
        self
    }

    /// Exact structural equality, no coercion: `"1"` does not match `1`.
    pub fn matches(&self, answers: &AnswerSet) -> bool {
        answers.get(&self.question_id).is_some_and(|v| *v == self.expected_value)
    }
}

/// A named conjunction of inputs mapped to the next part.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    id: String,
    order: i32,
    name: String,
    inputs: Vec<RuleInput>,
    next_part_id: String,
}

impl Rule {
    /// Rejects rules with no inputs and inputs with a blank question id.
    pub fn new(
        id: impl Into<String>,
        order: i32,
        name: impl Into<String>,
        inputs: Vec<RuleInput>,
        next_part_id: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let id = id.into();
        if inputs.is_empty() {
            return Err(RuleError::EmptyRule { rule_id: id });
        }
        if inputs
            .iter()
            .any(|input| input.validate().is_err() || input.question_id.trim().is_empty())
        {
            return Err(RuleError::MissingQuestionId { rule_id: id });
        }

        Ok(Self { id, order, name: name.into(), inputs, next_part_id: next_part_id.into() })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[RuleInput] {
        &self.inputs
    }

    pub fn next_part_id(&self) -> &str {
        &self.next_part_id
    }

    /// True only if every input matches.
    pub fn matches(&self, answers: &AnswerSet) -> bool {
        self.inputs.iter().all(|input| input.matches(answers))
    }

    /// Question ids whose input did not match, in input order.
    pub fn failed_questions(&self, answers: &AnswerSet) -> Vec<String> {
        self.inputs
            .iter()
            .filter(|input| !input.matches(answers))
            .map(|input| input.question_id.clone())
            .collect()
    }
}

/// Quiz logic attached to a branching part.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionTable {
    id: String,
    hit_policy: HitPolicy,
    /// Insertion order; evaluation order comes from `ordered_rules`.
    rules: Vec<Rule>,
    default_next_part_id: Option<String>,
}

impl DecisionTable {
    pub fn new(
        id: impl Into<String>,
        hit_policy: HitPolicy,
        rules: Vec<Rule>,
        default_next_part_id: Option<String>,
    ) -> Self {
        Self { id: id.into(), hit_policy, rules, default_next_part_id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn hit_policy(&self) -> HitPolicy {
        self.hit_policy
    }

    pub fn default_next_part_id(&self) -> Option<&str> {
        self.default_next_part_id.as_deref()
    }

    pub fn set_default_next_part_id(&mut self, next: Option<String>) {
        self.default_next_part_id = next;
    }

    /// Rules in insertion order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules sorted by `order`; equal orders keep insertion order.
    pub fn ordered_rules(&self) -> Vec<&Rule> {
        let mut ordered: Vec<&Rule> = self.rules.iter().collect();
        // sort_by_key is stable
        ordered.sort_by_key(|rule| rule.order);
        ordered
    }

    pub fn rule(&self, rule_id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == rule_id)
    }

    pub fn push_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn remove_rule(&mut self, rule_id: &str) -> Option<Rule> {
        let index = self.rules.iter().position(|rule| rule.id == rule_id)?;
        Some(self.rules.remove(index))
    }

    /// Returns false when no rule has that id.
    pub fn set_rule_order(&mut self, rule_id: &str, order: i32) -> bool {
        match self.rules.iter_mut().find(|rule| rule.id == rule_id) {
            Some(rule) => {
                rule.order = order;
                true
            }
            None => false,
        }
    }

    /// Every part id this table can lead to: rule targets in evaluation
    /// order, then the table default.
    pub fn targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> =
            self.ordered_rules().into_iter().map(|rule| rule.next_part_id()).collect();
        if let Some(default) = self.default_next_part_id() {
            targets.push(default);
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(id: &str, order: i32, next: &str) -> Rule {
        Rule::new(id, order, id, vec![RuleInput::new("q", "a")], next).unwrap()
    }

    #[test]
    fn test_empty_rule_rejected() {
        let err = Rule::new("r1", 1, "empty", vec![], "p2").unwrap_err();
        assert_eq!(err, RuleError::EmptyRule { rule_id: "r1".to_string() });
    }

    #[test]
    fn test_blank_question_rejected() {
        let err = Rule::new("r1", 1, "blank", vec![RuleInput::new("", "a")], "p2").unwrap_err();
        assert_eq!(err, RuleError::MissingQuestionId { rule_id: "r1".to_string() });

        let err = Rule::new("r2", 1, "spaces", vec![RuleInput::new("  ", "a")], "p2").unwrap_err();
        assert_eq!(err, RuleError::MissingQuestionId { rule_id: "r2".to_string() });
    }

    #[test]
    fn test_input_matching_has_no_coercion() {
        let input = RuleInput::new("question1", "1");
        assert!(input.matches(&AnswerSet::new().with("question1", "1")));
        assert!(!input.matches(&AnswerSet::new().with("question1", 1)));
        assert!(!input.matches(&AnswerSet::new()));
    }

    #[test]
    fn test_input_matching_is_structural() {
        let input = RuleInput::new("colors", json!(["red", "blue"]));
        assert!(input.matches(&AnswerSet::new().with("colors", json!(["red", "blue"]))));
        assert!(!input.matches(&AnswerSet::new().with("colors", json!(["blue", "red"]))));
    }

    #[test]
    fn test_answer_item_is_not_compared() {
        let input = RuleInput::new("q", "YES").with_answer_item("item-yes");
        assert!(input.matches(&AnswerSet::new().with("q", "YES")));
        assert!(!input.matches(&AnswerSet::new().with("q", "item-yes")));
    }

    #[test]
    fn test_ordered_rules_stable_on_ties() {
        let table = DecisionTable::new(
            "t",
            HitPolicy::First,
            vec![rule("b", 2, "x"), rule("a1", 1, "x"), rule("a2", 1, "x")],
            None,
        );
        let ids: Vec<&str> = table.ordered_rules().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["a1", "a2", "b"]);
    }

    #[test]
    fn test_table_editing() {
        let mut table = DecisionTable::new("t", HitPolicy::First, vec![rule("r1", 1, "p1")], None);
        table.push_rule(rule("r2", 2, "p2"));
        assert!(table.set_rule_order("r2", 0));
        assert!(!table.set_rule_order("missing", 0));
        assert_eq!(table.ordered_rules()[0].id(), "r2");

        let removed = table.remove_rule("r1").unwrap();
        assert_eq!(removed.next_part_id(), "p1");
        assert_eq!(table.rules().len(), 1);
        assert!(table.remove_rule("r1").is_none());
    }

    #[test]
    fn test_targets_include_default() {
        let table = DecisionTable::new(
            "t",
            HitPolicy::First,
            vec![rule("r2", 2, "p2"), rule("r1", 1, "p1")],
            Some("fallback".to_string()),
        );
        assert_eq!(table.targets(), vec!["p1", "p2", "fallback"]);
    }

    #[test]
    fn test_hit_policy_wire_name() {
        assert_eq!(serde_json::to_value(HitPolicy::First).unwrap(), json!("FIRST"));
    }
}
