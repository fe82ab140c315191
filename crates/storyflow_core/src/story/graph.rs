//! Story Graph
//!
//! Parts and decision tables are loaded wholesale, cross-referenced by id,
//! validated, and then frozen. Editing a story means building a new graph.

use super::types::Part;
use crate::error::{ReferenceSource, ResolveError, ValidationError};
use crate::logic::DecisionTable;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Validated, immutable collection of parts and decision tables for one story.
#[derive(Debug, Clone)]
pub struct StoryGraph {
    parts: Vec<Part>,
    part_index: HashMap<String, usize>,
    tables: Vec<DecisionTable>,
    table_index: HashMap<String, usize>,
    /// `parts[i]` → index into `tables`
    part_tables: Vec<Option<usize>>,
    initial: usize,
}

impl StoryGraph {
    /// Build a graph, or return every validation problem found.
    ///
    /// Cycles are allowed; a part that loops back to itself is a normal
    /// narrative pattern.
    pub fn build(
        parts: Vec<Part>,
        tables: Vec<DecisionTable>,
    ) -> Result<Self, Vec<ValidationError>> {
        Self::build_inner(None, parts, tables)
    }

    /// Like [`StoryGraph::build`], but every part must belong to `story_id`.
    pub fn build_for_story(
        story_id: &str,
        parts: Vec<Part>,
        tables: Vec<DecisionTable>,
    ) -> Result<Self, Vec<ValidationError>> {
        Self::build_inner(Some(story_id), parts, tables)
    }

    fn build_inner(
        expected_story: Option<&str>,
        parts: Vec<Part>,
        tables: Vec<DecisionTable>,
    ) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let mut part_index = HashMap::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            if part_index.insert(part.id.clone(), i).is_some() {
                errors.push(ValidationError::DuplicatePartId { part_id: part.id.clone() });
            }
        }

        let mut table_index = HashMap::with_capacity(tables.len());
        for (i, table) in tables.iter().enumerate() {
            if table_index.insert(table.id().to_string(), i).is_some() {
                errors.push(ValidationError::DuplicateDecisionTableId {
                    table_id: table.id().to_string(),
                });
            }
        }

        let initial_ids: Vec<&Part> = parts.iter().filter(|p| p.is_initial).collect();
        match initial_ids.len() {
            0 => errors.push(ValidationError::MissingInitialPart),
            1 => {}
            _ => errors.push(ValidationError::MultipleInitialParts {
                part_ids: initial_ids.iter().map(|p| p.id.clone()).collect(),
            }),
        }

        // Without an explicit story, the initial part (else the first part) decides.
        let story = expected_story
            .or_else(|| initial_ids.first().map(|p| p.story_id.as_str()))
            .or_else(|| parts.first().map(|p| p.story_id.as_str()));

        let mut part_tables = Vec::with_capacity(parts.len());
        let mut attachments: HashMap<&str, Vec<String>> = HashMap::new();
        for part in &parts {
            if let Some(story) = story {
                if part.story_id != story {
                    errors.push(ValidationError::ForeignPart {
                        part_id: part.id.clone(),
                        story_id: part.story_id.clone(),
                        expected: story.to_string(),
                    });
                }
            }

            if let Some(next) = &part.default_next_part_id {
                if !part_index.contains_key(next) {
                    errors.push(ValidationError::DanglingReference {
                        origin: ReferenceSource::PartDefault { part_id: part.id.clone() },
                        target: next.clone(),
                    });
                }
            }

            let table_slot = match &part.decision_table_id {
                Some(table_id) => match table_index.get(table_id) {
                    Some(&slot) => {
                        attachments.entry(table_id.as_str()).or_default().push(part.id.clone());
                        Some(slot)
                    }
                    None => {
                        errors.push(ValidationError::MissingDecisionTable {
                            part_id: part.id.clone(),
                            table_id: table_id.clone(),
                        });
                        None
                    }
                },
                None => None,
            };
            part_tables.push(table_slot);
        }

        for table in &tables {
            if let Some(part_ids) = attachments.get(table.id()) {
                if part_ids.len() > 1 {
                    errors.push(ValidationError::SharedDecisionTable {
                        table_id: table.id().to_string(),
                        part_ids: part_ids.clone(),
                    });
                }
            }

            for rule in table.rules() {
                if !part_index.contains_key(rule.next_part_id()) {
                    errors.push(ValidationError::DanglingReference {
                        origin: ReferenceSource::Rule {
                            table_id: table.id().to_string(),
                            rule_id: rule.id().to_string(),
                        },
                        target: rule.next_part_id().to_string(),
                    });
                }
            }

            if let Some(next) = table.default_next_part_id() {
                if !part_index.contains_key(next) {
                    errors.push(ValidationError::DanglingReference {
                        origin: ReferenceSource::TableDefault { table_id: table.id().to_string() },
                        target: next.to_string(),
                    });
                }
            }
        }

        if !errors.is_empty() {
            debug!(errors = errors.len(), "story graph failed validation");
            return Err(errors);
        }

        let initial = parts.iter().position(|p| p.is_initial).unwrap_or_default();
        debug!(parts = parts.len(), tables = tables.len(), "story graph built");

        Ok(Self { parts, part_index, tables, table_index, part_tables, initial })
    }

    /// Story id of the entry point.
    pub fn story_id(&self) -> &str {
        &self.parts[self.initial].story_id
    }

    pub fn initial_part(&self) -> &Part {
        &self.parts[self.initial]
    }

    pub fn part(&self, part_id: &str) -> Option<&Part> {
        self.part_index.get(part_id).map(|&i| &self.parts[i])
    }

    pub(crate) fn require_part(&self, part_id: &str) -> Result<usize, ResolveError> {
        self.part_index
            .get(part_id)
            .copied()
            .ok_or_else(|| ResolveError::UnknownPart { part_id: part_id.to_string() })
    }

    pub(crate) fn part_at(&self, index: usize) -> &Part {
        &self.parts[index]
    }

    pub(crate) fn table_for_index(&self, index: usize) -> Option<&DecisionTable> {
        self.part_tables[index].map(|slot| &self.tables[slot])
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn decision_tables(&self) -> &[DecisionTable] {
        &self.tables
    }

    pub fn decision_table(&self, table_id: &str) -> Option<&DecisionTable> {
        self.table_index.get(table_id).map(|&i| &self.tables[i])
    }

    /// Decision table attached to a branching part.
    pub fn decision_table_for(&self, part_id: &str) -> Option<&DecisionTable> {
        let index = *self.part_index.get(part_id)?;
        self.table_for_index(index)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Every part that can directly follow `part_id`, without duplicates.
    ///
    /// For a branching part: rule targets in evaluation order, then the table
    /// default, or the part default when the table has none.
    pub fn successors(&self, part_id: &str) -> Result<Vec<&str>, ResolveError> {
        let index = self.require_part(part_id)?;
        Ok(self.successors_at(index))
    }

    pub(crate) fn successors_at(&self, index: usize) -> Vec<&str> {
        let part = &self.parts[index];
        let mut targets: Vec<&str> = Vec::new();
        let table = self.table_for_index(index);
        if let Some(table) = table {
            targets.extend(table.targets());
        }
        // A table default shadows the part default.
        if table.map_or(true, |t| t.default_next_part_id().is_none()) {
            if let Some(next) = part.default_next_part_id.as_deref() {
                targets.push(next);
            }
        }

        let mut seen = HashSet::new();
        targets.retain(|id| seen.insert(*id));
        targets
    }

    /// Part ids reachable from the initial part, in breadth-first order.
    pub fn reachable_part_ids(&self) -> Vec<&str> {
        let mut visited = vec![false; self.parts.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::from([self.initial]);
        visited[self.initial] = true;

        while let Some(index) = queue.pop_front() {
            order.push(self.parts[index].id.as_str());
            for next in self.successors_at(index) {
                let next_index = self.part_index[next];
                if !visited[next_index] {
                    visited[next_index] = true;
                    queue.push_back(next_index);
                }
            }
        }
        order
    }

    /// Part ids no path from the initial part can reach, in input order.
    pub fn unreachable_part_ids(&self) -> Vec<&str> {
        let reachable: HashSet<&str> = self.reachable_part_ids().into_iter().collect();
        self.parts.iter().map(|p| p.id.as_str()).filter(|id| !reachable.contains(id)).collect()
    }
}
