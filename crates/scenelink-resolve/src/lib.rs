//! Two-hop parent resolution.
//!
//! The schedule never names a scene object's parent directly; the link runs
//! through image identifiers, twice:
//!
//! ```text
//! SceneObject s ──shared image id──► row r        (s belongs to r.host_id)
//! row r2 where r2.object_id == r.host_id          (the host's own row)
//! SceneObject p ──shared image id──► r2.image_ids (p is the parent)
//! ```
//!
//! `p.unique_id` becomes `s.parent_id`. Matching is a pure function from
//! the loaded inputs to a positional result vector; nothing mutates the
//! schedule or the document mid-iteration.
//!
//! When several chains nominate different parents for one object, the
//! default policy rejects the document as ambiguous. `LastMatchWins`
//! reproduces the historical overwrite order instead (schedule row order,
//! then document order) for byte-for-byte parity with existing outputs.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use scenelink_model::{Id, RelationshipRow, SceneObject};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("schedule has more than one row describing object `{object_id}`")]
    DuplicateObjectRow { object_id: Id },
    #[error("object `{unique_id}` has ambiguous parents `{first}` and `{second}`")]
    AmbiguousParent {
        unique_id: Id,
        first: Id,
        second: Id,
    },
}

/// How to settle multiple parent candidates for one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// All candidates must agree; disagreement is an error.
    #[default]
    Unique,
    /// Historical behavior: the last candidate in iteration order wins.
    LastMatchWins,
}

/// Schedule rows plus an `object_id -> row` map.
///
/// The map gives O(1) lookup of the row describing a host, replacing a
/// rescan of the whole table per match. At most one row may describe any
/// `object_id`; the schedule is rejected otherwise.
#[derive(Debug, Clone)]
pub struct HostIndex {
    rows: Vec<RelationshipRow>,
    by_object: HashMap<Id, usize>,
}

impl HostIndex {
    pub fn new(rows: Vec<RelationshipRow>) -> Result<Self, ResolveError> {
        let mut by_object = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if by_object.insert(row.object_id, i).is_some() {
                return Err(ResolveError::DuplicateObjectRow {
                    object_id: row.object_id,
                });
            }
        }
        Ok(Self { rows, by_object })
    }

    /// All rows, in schedule order.
    pub fn rows(&self) -> &[RelationshipRow] {
        &self.rows
    }

    /// The row describing `object_id` itself (not the rows it hosts).
    pub fn object_row(&self, object_id: Id) -> Option<&RelationshipRow> {
        self.by_object.get(&object_id).map(|&i| &self.rows[i])
    }
}

/// Resolve a parent id for every object, positionally.
///
/// For each object: every schedule row sharing an image id nominates its
/// `host_id`; the host's own row (if any) supplies the parent image set;
/// every object intersecting that set is a parent candidate. Objects with
/// no complete chain resolve to `None`.
pub fn resolve_parents(
    index: &HostIndex,
    objects: &[SceneObject],
    policy: MatchPolicy,
) -> Result<Vec<Option<Id>>, ResolveError> {
    let mut parents = vec![None; objects.len()];

    for (i, object) in objects.iter().enumerate() {
        let image_set: HashSet<Id> = object.image_ids.iter().copied().collect();
        if image_set.is_empty() {
            continue;
        }

        let mut assigned: Option<Id> = None;
        for row in &index.rows {
            if !row.image_ids.iter().any(|id| image_set.contains(id)) {
                continue;
            }
            let Some(host_row) = index.object_row(row.host_id) else {
                continue;
            };
            for candidate in objects {
                if !host_row.links_any(&candidate.image_ids) {
                    continue;
                }
                match policy {
                    MatchPolicy::LastMatchWins => assigned = Some(candidate.unique_id),
                    MatchPolicy::Unique => match assigned {
                        None => assigned = Some(candidate.unique_id),
                        Some(prev) if prev == candidate.unique_id => {}
                        Some(prev) => {
                            return Err(ResolveError::AmbiguousParent {
                                unique_id: object.unique_id,
                                first: prev,
                                second: candidate.unique_id,
                            })
                        }
                    },
                }
            }
        }
        parents[i] = assigned;
    }

    let resolved = parents.iter().filter(|p| p.is_some()).count();
    tracing::debug!(objects = objects.len(), resolved, "parent resolution done");
    Ok(parents)
}
