//! Quiz Decision Logic
//!
//! Decision tables (a.k.a. quiz logic) that map submitted answers to the
//! next story part.

pub mod answers;
pub mod evaluator;
pub mod types;

pub use answers::AnswerSet;
pub use evaluator::{evaluate, trace_rules, Evaluation, RuleTrace};
pub use types::{DecisionTable, HitPolicy, Rule, RuleInput};
