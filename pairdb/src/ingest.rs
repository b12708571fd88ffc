//! Ingestion rows and the bookkeeping for a batch load.

use pairtable::{parse_gender_preferences, PersonRecord, RelationKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing ingestion input.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A relationship kind other than `"like"` or `"friend"`.
    #[error("unknown interaction kind {0:?}, expected \"like\" or \"friend\"")]
    UnknownKind(String),

    /// Malformed row JSON.
    #[error("invalid ingestion JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Gender preferences as either a list or a comma-separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenderPreferences {
    /// `["Woman", "Man"]`
    List(Vec<String>),
    /// `"Woman, Man"`; `"All"` or empty means no preference
    Text(String),
}

impl GenderPreferences {
    fn into_list(self) -> Option<Vec<String>> {
        match self {
            GenderPreferences::List(list) => Some(list),
            GenderPreferences::Text(raw) => parse_gender_preferences(&raw),
        }
    }
}

/// One person to register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRow {
    /// Unique id, trimmed on import
    pub id: String,
    /// Name shown and searched
    #[serde(default)]
    pub display_name: String,
    /// Four-letter type code; anything invalid is treated as unknown
    #[serde(default)]
    pub type_code: Option<String>,
    /// Declared gender
    #[serde(default)]
    pub gender: Option<String>,
    /// Genders this person wants to be shown
    #[serde(default)]
    pub gender_preferences: Option<GenderPreferences>,
}

impl PersonRow {
    /// A row with only an id and a name.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            type_code: None,
            gender: None,
            gender_preferences: None,
        }
    }

    /// Sets the type code.
    pub fn type_code(mut self, code: impl Into<String>) -> Self {
        self.type_code = Some(code.into());
        self
    }
}

impl From<PersonRow> for PersonRecord {
    fn from(row: PersonRow) -> Self {
        let mut p = PersonRecord::new(row.id.trim(), row.display_name.trim());
        if let Some(code) = &row.type_code {
            p.set_type_code(code);
        }
        p.set_gender(row.gender);
        p.set_gender_preferences(row.gender_preferences.and_then(GenderPreferences::into_list));
        p
    }
}

/// One like or friend action to replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRow {
    /// Who acts
    pub source_id: String,
    /// `"like"` or `"friend"`
    pub kind: String,
    /// Who is acted on
    pub target_id: String,
}

impl RelationshipRow {
    /// A row from its three parts.
    pub fn new(
        source_id: impl Into<String>,
        kind: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            kind: kind.into(),
            target_id: target_id.into(),
        }
    }
}

/// Parses `"like"` or `"friend"`, ignoring case and surrounding whitespace.
pub fn parse_kind(raw: &str) -> Result<RelationKind, IngestError> {
    let kind = raw.trim();
    if kind.eq_ignore_ascii_case("like") {
        Ok(RelationKind::Romantic)
    } else if kind.eq_ignore_ascii_case("friend") {
        Ok(RelationKind::Friend)
    } else {
        Err(IngestError::UnknownKind(raw.to_string()))
    }
}

/// Parses a JSON array of rows.
pub fn rows_from_json<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, IngestError> {
    Ok(serde_json::from_str(json)?)
}

/// Counts from one ingestion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Rows read
    pub rows: usize,
    /// People inserted or interactions accepted
    pub applied: usize,
    /// Interactions that completed a match
    pub matched: usize,
    /// People whose id was already present
    pub duplicates: usize,
    /// Interactions repeating a pending or matched action
    pub repeats: usize,
    /// Rows naming an unknown person
    pub unknown_ids: usize,
    /// Rows with an empty id, an unknown kind or a self-interaction
    pub malformed: usize,
}

impl IngestReport {
    /// Rows that changed nothing.
    pub fn skipped(&self) -> usize {
        self.rows - self.applied
    }
}
