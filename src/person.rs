//! Person records: identity, personality axes, learned preferences and
//! relationship sets.

use indexmap::IndexSet;

/// Number of personality axes.
pub const AXES: usize = 4;

/// Type label used when no valid type code is known.
pub const UNKNOWN_TYPE: &str = "NA";

/// Letters for each axis as `(positive, negative)`.
const AXIS_LETTERS: [(u8, u8); AXES] = [(b'E', b'I'), (b'S', b'N'), (b'F', b'T'), (b'J', b'P')];

// =============================================================================
// Type code
// =============================================================================

/// A validated four-letter personality code such as `ENFP`.
///
/// Each position must be one of the two letters of its axis
/// (`E/I`, `S/N`, `F/T`, `J/P`); parsing is case-insensitive and the stored
/// form is upper case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeCode([u8; AXES]);

impl TypeCode {
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim().as_bytes();
        if code.len() != AXES {
            return None;
        }
        let mut out = [0u8; AXES];
        for (k, &(pos, neg)) in AXIS_LETTERS.iter().enumerate() {
            let c = code[k].to_ascii_uppercase();
            if c != pos && c != neg {
                return None;
            }
            out[k] = c;
        }
        Some(Self(out))
    }

    /// `+1` for the first letter of each axis pair, `-1` for the second.
    pub fn vector(self) -> [i32; AXES] {
        let mut v = [0i32; AXES];
        for (k, &(pos, _)) in AXIS_LETTERS.iter().enumerate() {
            v[k] = if self.0[k] == pos { 1 } else { -1 };
        }
        v
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or(UNKNOWN_TYPE)
    }
}

impl std::fmt::Display for TypeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Relationship kind
// =============================================================================

/// The two independent relationship kinds a person can express.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Romantic,
    Friend,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Romantic => "like",
            Self::Friend => "friend",
        }
    }
}

// =============================================================================
// Person record
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct PersonRecord {
    id: String,
    display_name: String,
    self_type: Option<TypeCode>,
    preference: [i32; AXES],
    valid_interactions: u32,
    popularity: u32,
    pending_romantic: IndexSet<String>,
    pending_friend: IndexSet<String>,
    matched_romantic: IndexSet<String>,
    matched_friend: IndexSet<String>,
    gender: Option<String>,
    gender_preferences: Option<Vec<String>>,
}

impl PersonRecord {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            self_type: None,
            preference: [0; AXES],
            valid_interactions: 0,
            popularity: 0,
            pending_romantic: IndexSet::new(),
            pending_friend: IndexSet::new(),
            matched_romantic: IndexSet::new(),
            matched_friend: IndexSet::new(),
            gender: None,
            gender_preferences: None,
        }
    }

    /// Builder form of [`PersonRecord::set_type_code`].
    pub fn with_type_code(mut self, code: &str) -> Self {
        self.set_type_code(code);
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.set_gender(Some(gender.into()));
        self
    }

    pub fn with_gender_preferences<I, S>(mut self, prefs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_gender_preferences(Some(prefs.into_iter().map(Into::into).collect()));
        self
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = name.into();
    }

    /// Lower-cased whitespace tokens of the display name.
    pub fn name_tokens(&self) -> impl Iterator<Item = String> + '_ {
        self.display_name.split_whitespace().map(str::to_lowercase)
    }

    /// Sets the self type once. Invalid codes and repeat calls leave the
    /// record unchanged. Returns whether the type was set.
    pub fn set_type_code(&mut self, code: &str) -> bool {
        if self.self_type.is_some() {
            return false;
        }
        match TypeCode::parse(code) {
            Some(t) => {
                self.self_type = Some(t);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn type_code(&self) -> Option<TypeCode> {
        self.self_type
    }

    /// Type label, `"NA"` when unknown.
    pub fn type_label(&self) -> &str {
        match &self.self_type {
            Some(t) => t.as_str(),
            None => UNKNOWN_TYPE,
        }
    }

    /// Self-type vector; all zero when the type is unknown.
    pub fn self_vector(&self) -> [i32; AXES] {
        self.self_type.map(TypeCode::vector).unwrap_or([0; AXES])
    }

    #[inline]
    pub fn preference(&self) -> [i32; AXES] {
        self.preference
    }

    #[inline]
    pub fn valid_interactions(&self) -> u32 {
        self.valid_interactions
    }

    /// Folds a liked person's type into the preference vector. Unknown types
    /// are not counted. Returns whether the vector changed.
    pub fn record_preference(&mut self, liked: Option<TypeCode>) -> bool {
        let Some(t) = liked else {
            return false;
        };
        for (acc, axis) in self.preference.iter_mut().zip(t.vector()) {
            *acc += axis;
        }
        self.valid_interactions += 1;
        true
    }

    #[inline]
    pub fn popularity(&self) -> u32 {
        self.popularity
    }

    pub fn bump_popularity(&mut self) {
        self.popularity = self.popularity.saturating_add(1);
    }

    pub fn pending(&self, kind: RelationKind) -> &IndexSet<String> {
        match kind {
            RelationKind::Romantic => &self.pending_romantic,
            RelationKind::Friend => &self.pending_friend,
        }
    }

    pub fn matched(&self, kind: RelationKind) -> &IndexSet<String> {
        match kind {
            RelationKind::Romantic => &self.matched_romantic,
            RelationKind::Friend => &self.matched_friend,
        }
    }

    pub(crate) fn pending_mut(&mut self, kind: RelationKind) -> &mut IndexSet<String> {
        match kind {
            RelationKind::Romantic => &mut self.pending_romantic,
            RelationKind::Friend => &mut self.pending_friend,
        }
    }

    pub(crate) fn matched_mut(&mut self, kind: RelationKind) -> &mut IndexSet<String> {
        match kind {
            RelationKind::Romantic => &mut self.matched_romantic,
            RelationKind::Friend => &mut self.matched_friend,
        }
    }

    #[inline]
    pub fn gender(&self) -> Option<&str> {
        self.gender.as_deref()
    }

    pub fn set_gender(&mut self, gender: Option<String>) {
        self.gender = gender
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());
    }

    #[inline]
    pub fn gender_preferences(&self) -> Option<&[String]> {
        self.gender_preferences.as_deref()
    }

    /// `None` or an empty list both mean "no preference".
    pub fn set_gender_preferences(&mut self, prefs: Option<Vec<String>>) {
        self.gender_preferences = prefs
            .map(|p| {
                p.into_iter()
                    .map(|g| g.trim().to_string())
                    .filter(|g| !g.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|p| !p.is_empty());
    }
}

/// Parses a comma-separated preference list such as `"Woman, Man"`.
///
/// Empty input and `"All"` mean no preference.
pub fn parse_gender_preferences(raw: &str) -> Option<Vec<String>> {
    let prefs: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if prefs.is_empty() || prefs.iter().any(|p| p.eq_ignore_ascii_case("all")) {
        None
    } else {
        Some(prefs)
    }
}
