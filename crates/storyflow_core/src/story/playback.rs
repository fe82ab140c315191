//! Playback Resolution
//!
//! part → decision table → rule → next part, one step at a time.
//!
//! Interactive stepping ([`StoryGraph::resolve_next`], [`PlaybackSession`])
//! never caps iterations, so cycles can be replayed indefinitely. The eager
//! modes ([`StoryGraph::resolve_sequence`], [`StoryGraph::enumerate_paths`])
//! are bounded by [`TraversalLimits`].

use super::graph::StoryGraph;
use super::types::Part;
use crate::config::TraversalLimits;
use crate::error::ResolveError;
use crate::logic::{evaluate, AnswerSet};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

/// Why a step went where it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepReason {
    /// Part has no decision table and followed its default
    Linear,
    /// A rule matched
    DecisionMatch,
    /// No rule matched; a default was followed
    DecisionDefault,
    /// Nowhere left to go
    Terminal,
}

/// Outcome of one resolution step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub next_part_id: Option<String>,
    pub reason: StepReason,
    /// Set when `reason` is `DecisionMatch`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rule_id: Option<String>,
}

impl Step {
    fn terminal() -> Self {
        Self { next_part_id: None, reason: StepReason::Terminal, matched_rule_id: None }
    }

    pub fn is_terminal(&self) -> bool {
        self.reason == StepReason::Terminal
    }
}

/// Supplies answers for branching parts during sequence resolution.
pub trait AnswerSource {
    /// Called once per branching part visited. `None` means unanswered.
    fn answers_for(&mut self, part: &Part) -> Option<AnswerSet>;
}

impl<F> AnswerSource for F
where
    F: FnMut(&Part) -> Option<AnswerSet>,
{
    fn answers_for(&mut self, part: &Part) -> Option<AnswerSet> {
        self(part)
    }
}

/// How a resolved sequence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaythroughEnd {
    Terminal,
    StepLimit,
}

/// Ordered list of parts visited by [`StoryGraph::resolve_sequence`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Playthrough {
    pub part_ids: Vec<String>,
    pub steps: Vec<Step>,
    pub end: PlaythroughEnd,
}

/// How a previewed path ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathEnd {
    Terminal,
    /// The path re-entered a part already on it.
    Cycle { back_to: String },
    DepthLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathPreview {
    pub part_ids: Vec<String>,
    pub end: PathEnd,
}

/// Every distinct path from the initial part, for authoring previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathEnumeration {
    pub paths: Vec<PathPreview>,
    /// More paths exist than `max_paths` allowed.
    pub truncated: bool,
}

impl StoryGraph {
    /// Resolve the part that follows `current_part_id`.
    ///
    /// Branching parts evaluate `answers` (an empty set when `None`). When no
    /// rule matches, the table default is used, then the part's own default.
    pub fn resolve_next(
        &self,
        current_part_id: &str,
        answers: Option<&AnswerSet>,
    ) -> Result<Step, ResolveError> {
        let index = self.require_part(current_part_id)?;
        let part = self.part_at(index);

        let step = match self.table_for_index(index) {
            None => match &part.default_next_part_id {
                Some(next) => Step {
                    next_part_id: Some(next.clone()),
                    reason: StepReason::Linear,
                    matched_rule_id: None,
                },
                None => Step::terminal(),
            },
            Some(table) => {
                let empty = AnswerSet::new();
                let evaluation = evaluate(table, answers.unwrap_or(&empty));
                if evaluation.is_match() {
                    Step {
                        next_part_id: evaluation.next_part_id,
                        reason: StepReason::DecisionMatch,
                        matched_rule_id: evaluation.matched_rule_id,
                    }
                } else {
                    match evaluation.next_part_id.or_else(|| part.default_next_part_id.clone()) {
                        Some(next) => Step {
                            next_part_id: Some(next),
                            reason: StepReason::DecisionDefault,
                            matched_rule_id: None,
                        },
                        None => Step::terminal(),
                    }
                }
            }
        };

        debug!(
            part = current_part_id,
            next = ?step.next_part_id,
            reason = ?step.reason,
            "resolved step"
        );
        Ok(step)
    }

    /// Walk from the initial part, asking `source` for answers at every
    /// branching part, until a terminal step or `limits.max_steps`.
    pub fn resolve_sequence<S: AnswerSource + ?Sized>(
        &self,
        source: &mut S,
        limits: &TraversalLimits,
    ) -> Result<Playthrough, ResolveError> {
        let mut current = self.initial_part().id.clone();
        let mut part_ids = vec![current.clone()];
        let mut steps = Vec::new();

        loop {
            if steps.len() >= limits.max_steps {
                warn!(max_steps = limits.max_steps, "sequence resolution hit step limit");
                return Ok(Playthrough { part_ids, steps, end: PlaythroughEnd::StepLimit });
            }

            let index = self.require_part(&current)?;
            let part = self.part_at(index);
            let answers = if part.is_branching() { source.answers_for(part) } else { None };

            let step = self.resolve_next(&current, answers.as_ref())?;
            let next = step.next_part_id.clone();
            steps.push(step);

            match next {
                Some(next) => {
                    part_ids.push(next.clone());
                    current = next;
                }
                None => {
                    return Ok(Playthrough { part_ids, steps, end: PlaythroughEnd::Terminal });
                }
            }
        }
    }

    /// Enumerate every path from the initial part, following all possible
    /// successors of branching parts.
    pub fn enumerate_paths(&self, limits: &TraversalLimits) -> PathEnumeration {
        let mut enumeration = PathEnumeration { paths: Vec::new(), truncated: false };
        let mut path = vec![self.initial_part().id.as_str()];
        self.walk_paths(&mut path, limits, &mut enumeration);

        if enumeration.truncated {
            warn!(max_paths = limits.max_paths, "path enumeration truncated");
        }
        enumeration
    }

    fn walk_paths<'g>(
        &'g self,
        path: &mut Vec<&'g str>,
        limits: &TraversalLimits,
        out: &mut PathEnumeration,
    ) {
        if out.truncated {
            return;
        }

        let current = path[path.len() - 1];
        let successors = match self.successors(current) {
            Ok(successors) => successors,
            Err(_) => return,
        };

        if successors.is_empty() {
            Self::record(path, PathEnd::Terminal, limits, out);
            return;
        }
        if path.len() >= limits.max_depth {
            Self::record(path, PathEnd::DepthLimit, limits, out);
            return;
        }

        for next in successors {
            if out.truncated {
                return;
            }
            if path.contains(&next) {
                let mut looped = path.clone();
                looped.push(next);
                Self::record(&looped, PathEnd::Cycle { back_to: next.to_string() }, limits, out);
                continue;
            }
            path.push(next);
            self.walk_paths(path, limits, out);
            path.pop();
        }
    }

    fn record(path: &[&str], end: PathEnd, limits: &TraversalLimits, out: &mut PathEnumeration) {
        if out.paths.len() >= limits.max_paths {
            out.truncated = true;
            return;
        }
        out.paths.push(PathPreview { part_ids: path.iter().map(|s| s.to_string()).collect(), end });
    }
}

/// Step-by-step playback of one story for one viewer.
#[derive(Debug, Clone)]
pub struct PlaybackSession<'g> {
    id: Uuid,
    graph: &'g StoryGraph,
    current: Option<String>,
    history: Vec<String>,
}

impl<'g> PlaybackSession<'g> {
    /// Start at the story's initial part.
    pub fn start(graph: &'g StoryGraph) -> Self {
        let initial = graph.initial_part().id.clone();
        Self { id: Uuid::new_v4(), graph, current: Some(initial.clone()), history: vec![initial] }
    }

    /// Resume at an arbitrary part, e.g. from a saved bookmark.
    pub fn resume(graph: &'g StoryGraph, part_id: &str) -> Result<Self, ResolveError> {
        graph.require_part(part_id)?;
        Ok(Self {
            id: Uuid::new_v4(),
            graph,
            current: Some(part_id.to_string()),
            history: vec![part_id.to_string()],
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current_part(&self) -> Option<&'g Part> {
        self.current.as_deref().and_then(|id| self.graph.part(id))
    }

    /// Parts visited so far, including repeats.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn is_finished(&self) -> bool {
        self.current.is_none()
    }

    /// Advance one step. After a terminal step the session is finished and
    /// further calls keep returning terminal steps.
    pub fn advance(&mut self, answers: Option<&AnswerSet>) -> Result<Step, ResolveError> {
        let Some(current) = self.current.as_deref() else {
            return Ok(Step::terminal());
        };

        let step = self.graph.resolve_next(current, answers)?;
        if let Some(next) = &step.next_part_id {
            self.history.push(next.clone());
        }
        self.current = step.next_part_id.clone();
        Ok(step)
    }
}
