//! Like/friend protocol: pending actions and reciprocity detection.
//!
//! Each ordered pair moves `None -> Pending -> Matched` independently per
//! [`RelationKind`]. A match is settled on both records in one step through
//! [`ProbeTable::get_pair_mut`], so no caller ever sees one side matched and
//! the other still pending.

use thiserror::Error;

use crate::person::{PersonRecord, RelationKind};
use crate::table::PeopleTable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationError {
    #[error("unknown source id: {0}")]
    UnknownSource(String),

    #[error("unknown target id: {0}")]
    UnknownTarget(String),

    #[error("{0} cannot interact with themselves")]
    SelfInteraction(String),
}

/// What an interaction did to the pair's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LikeOutcome {
    /// Recorded, waiting for the other side.
    Pending,
    /// The other side was already pending: both records are now matched.
    Matched,
    /// Source had already sent this action; nothing changed.
    AlreadyPending,
    /// Pair was already matched for this kind; nothing changed.
    AlreadyMatched,
}

impl LikeOutcome {
    /// Whether the interaction changed state.
    #[inline]
    pub fn is_accepted(self) -> bool {
        matches!(self, LikeOutcome::Pending | LikeOutcome::Matched)
    }
}

/// Applies a like (romantic) or friend action from `source` to `target`.
///
/// Romantic likes fold the target's type into the source's preference
/// vector. Repeats toward a pending or matched target are no-ops. Popularity
/// is left to the caller.
pub fn interact(
    table: &mut PeopleTable,
    source_id: &str,
    target_id: &str,
    kind: RelationKind,
) -> Result<LikeOutcome, RelationError> {
    if source_id == target_id {
        return Err(RelationError::SelfInteraction(source_id.to_string()));
    }
    if !table.contains(source_id) {
        return Err(RelationError::UnknownSource(source_id.to_string()));
    }
    let Some((source, target)) = table.get_pair_mut(source_id, target_id) else {
        return Err(RelationError::UnknownTarget(target_id.to_string()));
    };
    Ok(apply(source, target, kind))
}

fn apply(source: &mut PersonRecord, target: &mut PersonRecord, kind: RelationKind) -> LikeOutcome {
    if source.matched(kind).contains(target.id()) {
        return LikeOutcome::AlreadyMatched;
    }
    if !source.pending_mut(kind).insert(target.id().to_string()) {
        return LikeOutcome::AlreadyPending;
    }
    if kind == RelationKind::Romantic {
        source.record_preference(target.type_code());
    }
    if target.pending(kind).contains(source.id()) {
        settle(source, target, kind);
        return LikeOutcome::Matched;
    }
    LikeOutcome::Pending
}

/// Removes `id` from the table along with every pending or matched link
/// other records hold to it.
///
/// A later registration under the same id starts with no relationships.
pub fn remove_person(table: &mut PeopleTable, id: &str) -> Option<PersonRecord> {
    let removed = table.remove(id)?;
    for other in table.iter_mut() {
        for kind in [RelationKind::Romantic, RelationKind::Friend] {
            other.pending_mut(kind).shift_remove(id);
            other.matched_mut(kind).shift_remove(id);
        }
    }
    Some(removed)
}

/// Moves a reciprocated pair from pending to matched on both records.
fn settle(a: &mut PersonRecord, b: &mut PersonRecord, kind: RelationKind) {
    let (a_id, b_id) = (a.id().to_string(), b.id().to_string());
    a.pending_mut(kind).shift_remove(&b_id);
    b.pending_mut(kind).shift_remove(&a_id);
    a.matched_mut(kind).insert(b_id);
    b.matched_mut(kind).insert(a_id);
}
