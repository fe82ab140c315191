//! Story JSON API
//!
//! String-in/string-out entry points for hosts that talk JSON (editor,
//! playback front end). Typed variants are exposed for in-process callers.

use super::records::{build_graph_for, StoryRecords};
use crate::error::{CoreError, ValidationError};
use crate::logic::AnswerSet;
use crate::story::{StepReason, StoryGraph};
use crate::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};

/// One validation problem, as shown in the editor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssueJson {
    pub kind: String,
    pub message: String,
    pub detail: ValidationError,
}

impl From<ValidationError> for ValidationIssueJson {
    fn from(error: ValidationError) -> Self {
        Self { kind: error.kind().to_string(), message: error.to_string(), detail: error }
    }
}

/// Validation report for the authoring side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub schema_version: u8,
    pub valid: bool,
    pub story_id: Option<String>,
    pub initial_part_id: Option<String>,
    pub errors: Vec<ValidationIssueJson>,
    pub reachable_part_ids: Vec<String>,
    pub unreachable_part_ids: Vec<String>,
}

impl ValidationReport {
    fn from_graph(story_id: Option<String>, graph: &StoryGraph) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            valid: true,
            story_id: story_id.or_else(|| Some(graph.story_id().to_string())),
            initial_part_id: Some(graph.initial_part().id.clone()),
            errors: Vec::new(),
            reachable_part_ids: graph.reachable_part_ids().into_iter().map(String::from).collect(),
            unreachable_part_ids: graph
                .unreachable_part_ids()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    fn from_errors(story_id: Option<String>, errors: Vec<ValidationError>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            valid: false,
            story_id,
            initial_part_id: None,
            errors: errors.into_iter().map(ValidationIssueJson::from).collect(),
            reachable_part_ids: Vec::new(),
            unreachable_part_ids: Vec::new(),
        }
    }
}

/// Next-step request
#[derive(Debug, Deserialize)]
pub struct ResolveNextRequest {
    pub schema_version: u8,
    pub story: StoryRecords,
    pub current_part_id: String,
    #[serde(default)]
    pub answers: Option<AnswerSet>,
}

/// Next-step response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveNextResponse {
    pub schema_version: u8,
    pub next_part_id: Option<String>,
    pub reason: StepReason,
    pub matched_rule_id: Option<String>,
}

/// Build a validation report. Construction errors (malformed records) are
/// returned as `Err`; graph validation problems go into the report.
pub fn validate_story(records: StoryRecords) -> Result<ValidationReport, CoreError> {
    let story_id = records.story_id.clone();
    let (parts, tables) = records.assemble()?;

    let built = build_graph_for(story_id.as_deref(), parts, tables);
    Ok(match built {
        Ok(graph) => ValidationReport::from_graph(story_id, &graph),
        Err(errors) => ValidationReport::from_errors(story_id, errors),
    })
}

pub fn validate_story_json(json: &str) -> Result<String, CoreError> {
    let records = StoryRecords::from_json(json)?;
    let report = validate_story(records)?;
    Ok(serde_json::to_string(&report)?)
}

pub fn resolve_next(request: ResolveNextRequest) -> Result<ResolveNextResponse, CoreError> {
    if request.schema_version != SCHEMA_VERSION {
        return Err(CoreError::SchemaVersion {
            found: request.schema_version,
            expected: SCHEMA_VERSION,
        });
    }

    let graph = request.story.build_graph()?;
    let step = graph.resolve_next(&request.current_part_id, request.answers.as_ref())?;

    Ok(ResolveNextResponse {
        schema_version: SCHEMA_VERSION,
        next_part_id: step.next_part_id,
        reason: step.reason,
        matched_rule_id: step.matched_rule_id,
    })
}

pub fn resolve_next_json(json: &str) -> Result<String, CoreError> {
    let request: ResolveNextRequest = serde_json::from_str(json)?;
    let response = resolve_next(request)?;
    Ok(serde_json::to_string(&response)?)
}
