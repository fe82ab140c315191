//! Decision Table Evaluation
//!
//! Pure functions over `(table, answers)`. "No match" is a normal outcome
//! and resolves to the table default.

use super::answers::AnswerSet;
use super::types::{DecisionTable, HitPolicy};
use serde::Serialize;
use tracing::trace;

/// Result of evaluating a decision table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub next_part_id: Option<String>,
    /// `None` when the table default (or nothing) was used.
    pub matched_rule_id: Option<String>,
}

impl Evaluation {
    pub fn is_match(&self) -> bool {
        self.matched_rule_id.is_some()
    }
}

/// Per-rule diagnostic produced by [`trace_rules`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleTrace {
    pub rule_id: String,
    pub order: i32,
    pub matched: bool,
    pub failed_questions: Vec<String>,
}

/// Evaluate `answers` against `table` under its hit policy.
pub fn evaluate(table: &DecisionTable, answers: &AnswerSet) -> Evaluation {
    match table.hit_policy() {
        HitPolicy::First => {
            for rule in table.ordered_rules() {
                if rule.matches(answers) {
                    trace!(table = table.id(), rule = rule.id(), "rule matched");
                    return Evaluation {
                        next_part_id: Some(rule.next_part_id().to_string()),
                        matched_rule_id: Some(rule.id().to_string()),
                    };
                }
                trace!(table = table.id(), rule = rule.id(), "rule did not match");
            }
        }
    }

    trace!(table = table.id(), default = ?table.default_next_part_id(), "falling back to default");
    Evaluation {
        next_part_id: table.default_next_part_id().map(str::to_string),
        matched_rule_id: None,
    }
}

/// Check every rule, without short-circuiting, for authoring diagnostics.
pub fn trace_rules(table: &DecisionTable, answers: &AnswerSet) -> Vec<RuleTrace> {
    table
        .ordered_rules()
        .into_iter()
        .map(|rule| {
            let failed_questions = rule.failed_questions(answers);
            RuleTrace {
                rule_id: rule.id().to_string(),
                order: rule.order(),
                matched: failed_questions.is_empty(),
                failed_questions,
            }
        })
        .collect()
}

impl DecisionTable {
    pub fn evaluate(&self, answers: &AnswerSet) -> Evaluation {
        evaluate(self, answers)
    }
}
