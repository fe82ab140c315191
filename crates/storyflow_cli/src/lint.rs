//! Authoring lints
//!
//! Warnings that never block publishing but are worth showing in the editor.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use storyflow_core::{DecisionTable, Part, StoryGraph};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lint {
    /// Several rules share an order; insertion order decides between them.
    TiedRuleOrder { table_id: String, order: i32, rule_ids: Vec<String> },
    /// Input has an answer item but a null expected value, so it only
    /// matches a null answer.
    ItemOnlyInput { table_id: String, rule_id: String, question_id: String },
    FinalPartWithExit { part_id: String },
    UnreachablePart { part_id: String },
}

impl fmt::Display for Lint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Lint::TiedRuleOrder { table_id, order, rule_ids } => write!(
                f,
                "decision table {}: rules {} share order {}",
                table_id,
                rule_ids.join(", "),
                order
            ),
            Lint::ItemOnlyInput { table_id, rule_id, question_id } => write!(
                f,
                "decision table {}: rule {} input for {} has an answer item but no value",
                table_id, rule_id, question_id
            ),
            Lint::FinalPartWithExit { part_id } => {
                write!(f, "part {} is marked final but has outgoing references", part_id)
            }
            Lint::UnreachablePart { part_id } => {
                write!(f, "part {} cannot be reached from the initial part", part_id)
            }
        }
    }
}

pub fn lint_tables(tables: &[DecisionTable]) -> Vec<Lint> {
    let mut lints = Vec::new();
    for table in tables {
        let mut by_order: BTreeMap<i32, Vec<String>> = BTreeMap::new();
        for rule in table.ordered_rules() {
            by_order.entry(rule.order()).or_default().push(rule.id().to_string());

            for input in rule.inputs() {
                if input.answer_item_id.is_some() && input.expected_value.is_null() {
                    lints.push(Lint::ItemOnlyInput {
                        table_id: table.id().to_string(),
                        rule_id: rule.id().to_string(),
                        question_id: input.question_id.clone(),
                    });
                }
            }
        }

        for (order, rule_ids) in by_order {
            if rule_ids.len() > 1 {
                lints.push(Lint::TiedRuleOrder { table_id: table.id().to_string(), order, rule_ids });
            }
        }
    }
    lints
}

pub fn lint_parts(parts: &[Part]) -> Vec<Lint> {
    parts
        .iter()
        .filter(|p| p.is_final && (p.default_next_part_id.is_some() || p.is_branching()))
        .map(|p| Lint::FinalPartWithExit { part_id: p.id.clone() })
        .collect()
}

pub fn lint_graph(graph: &StoryGraph) -> Vec<Lint> {
    let unreachable: HashSet<&str> = graph.unreachable_part_ids().into_iter().collect();
    graph
        .parts()
        .iter()
        .filter(|p| unreachable.contains(p.id.as_str()))
        .map(|p| Lint::UnreachablePart { part_id: p.id.clone() })
        .collect()
}
