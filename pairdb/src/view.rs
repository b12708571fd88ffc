//! Owned snapshots of person records returned from queries.

use pairtable::{PersonRecord, RelationKind, AXES};
use serde::Serialize;

/// A person as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonView {
    /// Unique id
    pub id: String,
    /// Name shown and searched
    pub display_name: String,
    /// Type code, `"NA"` when unknown
    pub type_code: String,
    /// `+1`/`-1` per axis, zeros when unknown
    pub self_vector: [i32; AXES],
    /// Running sum of liked types per axis
    pub preference: [i32; AXES],
    /// Likes that carried a known type
    pub valid_interactions: u32,
    /// Accepted romantic likes received
    pub popularity: u32,
    /// Declared gender
    pub gender: Option<String>,
    /// Genders this person wants to be shown
    pub gender_preferences: Option<Vec<String>>,
    /// Ids liked, not yet reciprocated
    pub pending_romantic: Vec<String>,
    /// Ids friend-liked, not yet reciprocated
    pub pending_friend: Vec<String>,
    /// Romantic matches
    pub matched_romantic: Vec<String>,
    /// Friend matches
    pub matched_friend: Vec<String>,
}

impl PersonView {
    /// Drops the relationship lists, for showing a person to someone else.
    pub fn without_lists(mut self) -> Self {
        self.pending_romantic.clear();
        self.pending_friend.clear();
        self.matched_romantic.clear();
        self.matched_friend.clear();
        self
    }
}

impl From<&PersonRecord> for PersonView {
    fn from(p: &PersonRecord) -> Self {
        let list = |set: &indexmap::IndexSet<String>| set.iter().cloned().collect::<Vec<_>>();
        Self {
            id: p.id().to_string(),
            display_name: p.display_name().to_string(),
            type_code: p.type_label().to_string(),
            self_vector: p.self_vector(),
            preference: p.preference(),
            valid_interactions: p.valid_interactions(),
            popularity: p.popularity(),
            gender: p.gender().map(str::to_string),
            gender_preferences: p.gender_preferences().map(<[String]>::to_vec),
            pending_romantic: list(p.pending(RelationKind::Romantic)),
            pending_friend: list(p.pending(RelationKind::Friend)),
            matched_romantic: list(p.matched(RelationKind::Romantic)),
            matched_friend: list(p.matched(RelationKind::Friend)),
        }
    }
}

/// A person's relationship lists resolved to views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonLists {
    /// People this person liked
    pub pending_romantic: Vec<PersonView>,
    /// People this person friend-liked
    pub pending_friend: Vec<PersonView>,
    /// Romantic matches
    pub matched_romantic: Vec<PersonView>,
    /// Friend matches
    pub matched_friend: Vec<PersonView>,
    /// People recommended by match discovery
    pub recommended: Vec<PersonView>,
}
