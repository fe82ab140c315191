//! Boundary with the persistence and host layers

pub mod bundle;
pub mod records;
pub mod story_json;

pub use bundle::{decode_bundle, encode_bundle, read_bundle, write_bundle};
pub use records::{
    story_schema, QuizLogicRecord, QuizLogicRuleInputRecord, QuizLogicRuleRecord, StoryRecords,
};
pub use story_json::{
    resolve_next, resolve_next_json, validate_story, validate_story_json, ResolveNextRequest,
    ResolveNextResponse, ValidationIssueJson, ValidationReport,
};
