use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised while constructing a rule. The object is rejected outright.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Rule {rule_id} has no inputs; a rule needs at least one condition")]
    EmptyRule { rule_id: String },

    #[error("Rule input is missing a question id (rule: {rule_id})")]
    MissingQuestionId { rule_id: String },
}

/// Where a next-part reference lives inside a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceSource {
    PartDefault { part_id: String },
    TableDefault { table_id: String },
    Rule { table_id: String, rule_id: String },
}

impl fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReferenceSource::PartDefault { part_id } => write!(f, "part {}", part_id),
            ReferenceSource::TableDefault { table_id } => {
                write!(f, "default of decision table {}", table_id)
            }
            ReferenceSource::Rule { table_id, rule_id } => {
                write!(f, "rule {} in decision table {}", rule_id, table_id)
            }
        }
    }
}

/// Referential-integrity problems found while building a [`crate::StoryGraph`].
///
/// These are collected and reported together; a graph is never built while
/// any of them exist.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Story has no initial part")]
    MissingInitialPart,

    #[error("Story has {} initial parts: {}", .part_ids.len(), .part_ids.join(", "))]
    MultipleInitialParts { part_ids: Vec<String> },

    #[error("Dangling reference from {origin} to unknown part {target}")]
    DanglingReference { origin: ReferenceSource, target: String },

    #[error("Part {part_id} references unknown decision table {table_id}")]
    MissingDecisionTable { part_id: String, table_id: String },

    #[error("Duplicate part id: {part_id}")]
    DuplicatePartId { part_id: String },

    #[error("Duplicate decision table id: {table_id}")]
    DuplicateDecisionTableId { table_id: String },

    #[error("Decision table {table_id} is attached to several parts: {}", .part_ids.join(", "))]
    SharedDecisionTable { table_id: String, part_ids: Vec<String> },

    #[error("Part {part_id} belongs to story {story_id}, expected {expected}")]
    ForeignPart { part_id: String, story_id: String, expected: String },
}

impl ValidationError {
    /// Stable machine-readable name, used by the JSON report.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::MissingInitialPart => "missing_initial_part",
            ValidationError::MultipleInitialParts { .. } => "multiple_initial_parts",
            ValidationError::DanglingReference { .. } => "dangling_reference",
            ValidationError::MissingDecisionTable { .. } => "missing_decision_table",
            ValidationError::DuplicatePartId { .. } => "duplicate_part_id",
            ValidationError::DuplicateDecisionTableId { .. } => "duplicate_decision_table_id",
            ValidationError::SharedDecisionTable { .. } => "shared_decision_table",
            ValidationError::ForeignPart { .. } => "foreign_part",
        }
    }
}

/// Failure of a single resolution call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unknown part: {part_id}")]
    UnknownPart { part_id: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid traversal limits: {0}")]
    Invalid(String),
}

/// Errors surfaced by the records and JSON API layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    #[error("Unsupported schema version: found {found}, expected {expected}")]
    SchemaVersion { found: u8, expected: u8 },

    #[error("Record assembly failed: {0}")]
    Assembly(String),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("Story failed validation with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl CoreError {
    /// Whether the author can fix the input and retry.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CoreError::Validation(_) => true,
            CoreError::Rule(_) => true,
            CoreError::Assembly(_) => true,
            CoreError::Resolve(_) => true,
            CoreError::Parse(_) => false,
            CoreError::Serialization(_) => false,
            CoreError::Deserialization(_) => false,
            CoreError::SchemaVersion { .. } => false,
        }
    }
}

impl From<Vec<ValidationError>> for CoreError {
    fn from(errors: Vec<ValidationError>) -> Self {
        CoreError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
