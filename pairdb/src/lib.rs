//! # PairDb - concurrent person database
//!
//! Wraps a single [`pairtable::PeopleTable`] behind a reader/writer lock and
//! adds what callers need around the core algorithms:
//!
//! - **Interactions**: likes and friend-likes with popularity accounting
//! - **Discovery**: random-start match finding with a recommendation ledger
//! - **Ranking**: popularity-ranked autocomplete and compatibility-ranked search
//! - **Ingestion**: batch loading of people and relationship rows
//! - **Dumps**: slot-level table layout and relationship audit
//!
//! ## Example
//!
//! ```rust
//! use pairdb::{Config, PairDb, PersonRow};
//!
//! let db = PairDb::with_config(Config { match_seed: Some(7), ..Config::default() }).unwrap();
//! db.register(PersonRow::new("ada@example.com", "Ada Lovelace").type_code("INTJ"));
//! db.register(PersonRow::new("alan@example.com", "Alan Turing").type_code("INTP"));
//!
//! db.interact("ada@example.com", "like", "alan@example.com").unwrap();
//! assert_eq!(db.get("alan@example.com").unwrap().popularity, 1);
//!
//! let hits = db.autocomplete("tur");
//! assert_eq!(hits[0].id, "alan@example.com");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod ingest;
pub mod report;
pub mod view;

pub use config::{Config, ConfigError, NamePolicy};
pub use ingest::{
    parse_kind, rows_from_json, GenderPreferences, IngestError, IngestReport, PersonRow,
    RelationshipRow,
};
pub use view::{PersonLists, PersonView};

use std::collections::HashMap;

use indexmap::IndexSet;
use pairtable::{LikeOutcome, NameMatch, PeopleTable, PersonRecord, RelationError, RelationKind};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::report::{RelationsDump, TableDump};

/// Errors from [`PairDb::interact`].
#[derive(Debug, Error)]
pub enum InteractError {
    /// The action was neither `"like"` nor `"friend"`.
    #[error("unknown interaction kind {0:?}, expected \"like\" or \"friend\"")]
    UnknownKind(String),

    /// The action was rejected by the relationship protocol.
    #[error(transparent)]
    Relation(#[from] RelationError),
}

/// Result of an accepted or repeated interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    /// Romantic like or friend action
    pub kind: RelationKind,
    /// State change the action caused
    pub outcome: LikeOutcome,
}

impl Interaction {
    /// Whether this action completed a match.
    #[inline]
    pub fn is_match(&self) -> bool {
        self.outcome == LikeOutcome::Matched
    }
}

/// Recommendations handed out by `find_match`.
#[derive(Debug, Default)]
struct Ledger {
    by_person: HashMap<String, IndexSet<String>>,
    history: IndexSet<String>,
}

impl Ledger {
    fn record(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        self.by_person
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.by_person
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
    }

    /// Drops everything recommended to or with `id`. History lines stay.
    fn forget(&mut self, id: &str) {
        self.by_person.remove(id);
        for recommended in self.by_person.values_mut() {
            recommended.shift_remove(id);
        }
    }
}

/// A person database safe to share between threads.
///
/// Writers (inserts, removals, interactions) take the table's write lock;
/// queries share the read lock.
pub struct PairDb {
    table: RwLock<PeopleTable>,
    rng: Mutex<StdRng>,
    ledger: RwLock<Ledger>,
    config: Config,
}

impl PairDb {
    /// Create a new empty database with default configuration.
    pub fn new() -> Self {
        Self::build(Config::default())
    }

    /// Create a database with the given configuration.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        let rng = match config.match_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            table: RwLock::new(PeopleTable::with_capacity(config.initial_capacity)),
            rng: Mutex::new(rng),
            ledger: RwLock::new(Ledger::default()),
            config,
        }
    }

    /// The configuration this database was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    fn name_match(&self) -> NameMatch {
        self.config.name_match.into()
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Insert a person. Returns `false` if the id is already present; the
    /// stored record is kept.
    pub fn insert(&self, person: PersonRecord) -> bool {
        let id = person.id().to_string();
        let inserted = self.table.write().insert(person);
        if !inserted {
            tracing::debug!(%id, "duplicate id ignored");
        }
        inserted
    }

    /// Insert a person from an ingestion row.
    pub fn register(&self, row: PersonRow) -> bool {
        self.insert(row.into())
    }

    /// Remove a person together with every relationship and recommendation
    /// that points at them, so the id can be registered again from scratch.
    pub fn remove(&self, id: &str) -> Option<PersonView> {
        let mut table = self.table.write();
        let removed = pairtable::remove_person(&mut table, id)?;
        self.ledger.write().forget(id);
        tracing::debug!(%id, "removed person and their links");
        Some(PersonView::from(&removed))
    }

    /// Snapshot of one person, including their relationship lists.
    pub fn get(&self, id: &str) -> Option<PersonView> {
        self.table.read().get(id).map(PersonView::from)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.table.read().contains(id)
    }

    /// Number of registered people.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Whether no one is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current slot count of the underlying table.
    pub fn capacity(&self) -> usize {
        self.table.read().capacity()
    }

    /// Every active person in slot order.
    pub fn all_people(&self) -> Vec<PersonView> {
        self.table.read().iter().map(PersonView::from).collect()
    }

    // =========================================================================
    // Interactions
    // =========================================================================

    /// Applies a `"like"` or `"friend"` action from `source` to `target`.
    ///
    /// An accepted like raises the target's popularity. Repeats change
    /// nothing.
    pub fn interact(
        &self,
        source: &str,
        kind: &str,
        target: &str,
    ) -> Result<Interaction, InteractError> {
        let kind = parse_kind(kind).map_err(|_| InteractError::UnknownKind(kind.to_string()))?;
        Ok(self.interact_kind(source, kind, target)?)
    }

    /// [`PairDb::interact`] with an already parsed kind.
    pub fn interact_kind(
        &self,
        source: &str,
        kind: RelationKind,
        target: &str,
    ) -> Result<Interaction, RelationError> {
        let mut table = self.table.write();
        let outcome = pairtable::interact(&mut table, source, target, kind)?;
        if outcome.is_accepted() && kind == RelationKind::Romantic {
            if let Some(t) = table.get_mut(target) {
                t.bump_popularity();
            }
        }
        if outcome == LikeOutcome::Matched {
            tracing::info!(%source, %target, kind = kind.as_str(), "new match");
        }
        Ok(Interaction { kind, outcome })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Finds a mutually compatible person for `seeker` and, when enabled,
    /// records the recommendation for both people.
    pub fn find_match(&self, seeker: &str) -> Option<PersonView> {
        let (me, found) = {
            let table = self.table.read();
            let mut rng = self.rng.lock();
            let found = pairtable::find_match(&table, seeker, &mut *rng)?;
            let me = table.get(seeker).map(PersonView::from)?;
            (me, PersonView::from(found))
        };

        if self.config.record_recommendations {
            let mut ledger = self.ledger.write();
            ledger.record(&me.id, &found.id);
            ledger.history.insert(format!(
                "{} ({}) recommended with {} ({})",
                me.display_name, me.type_code, found.display_name, found.type_code
            ));
        }
        tracing::debug!(seeker = %me.id, candidate = %found.id, "match recommended");
        Some(found.without_lists())
    }

    /// People whose name matches `prefix`, most popular first.
    pub fn autocomplete(&self, prefix: &str) -> Vec<PersonView> {
        let table = self.table.read();
        pairtable::autocomplete_by_popularity(&table, prefix, self.name_match())
            .into_iter()
            .map(|p| PersonView::from(p).without_lists())
            .collect()
    }

    /// People whose name matches `query`, best compatibility with `seeker`
    /// first.
    pub fn search(&self, query: &str, seeker: &str) -> Vec<PersonView> {
        let table = self.table.read();
        pairtable::search_ranked_by_compatibility(&table, query, seeker, self.name_match())
            .into_iter()
            .map(|p| PersonView::from(p).without_lists())
            .collect()
    }

    /// Ids recommended to `id`, oldest first.
    pub fn recommendations(&self, id: &str) -> Vec<String> {
        self.ledger
            .read()
            .by_person
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every distinct recommendation made, oldest first.
    pub fn match_history(&self) -> Vec<String> {
        self.ledger.read().history.iter().cloned().collect()
    }

    /// A person's pending, matched and recommended people. Ids that no
    /// longer resolve are left out.
    pub fn lists(&self, id: &str) -> Option<PersonLists> {
        let recommended = self.recommendations(id);
        let table = self.table.read();
        let me = table.get(id)?;
        Some(PersonLists {
            pending_romantic: resolve(&table, me.pending(RelationKind::Romantic)),
            pending_friend: resolve(&table, me.pending(RelationKind::Friend)),
            matched_romantic: resolve(&table, me.matched(RelationKind::Romantic)),
            matched_friend: resolve(&table, me.matched(RelationKind::Friend)),
            recommended: resolve(&table, &recommended),
        })
    }

    /// Slot-by-slot dump of the table.
    pub fn render_table(&self) -> String {
        TableDump(&self.table.read()).to_string()
    }

    /// Everyone's pending and matched lists.
    pub fn render_relations(&self) -> String {
        RelationsDump(&self.table.read()).to_string()
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Inserts a batch of people. Rows without an id and duplicate ids are
    /// skipped and counted.
    pub fn ingest_people<I>(&self, rows: I) -> IngestReport
    where
        I: IntoIterator<Item = PersonRow>,
    {
        let mut report = IngestReport::default();
        let mut table = self.table.write();
        for row in rows {
            report.rows += 1;
            if row.id.trim().is_empty() {
                tracing::debug!(?row, "skipping person row without id");
                report.malformed += 1;
                continue;
            }
            let person = PersonRecord::from(row);
            let id = person.id().to_string();
            if table.insert(person) {
                report.applied += 1;
            } else {
                tracing::debug!(%id, "duplicate id ignored");
                report.duplicates += 1;
            }
        }
        tracing::info!(
            rows = report.rows,
            inserted = report.applied,
            duplicates = report.duplicates,
            malformed = report.malformed,
            "ingested people"
        );
        report
    }

    /// Applies a batch of actions in order. Rows with an unknown kind or id,
    /// and self-interactions, are skipped and counted.
    pub fn ingest_relationships<I>(&self, rows: I) -> IngestReport
    where
        I: IntoIterator<Item = RelationshipRow>,
    {
        let mut report = IngestReport::default();
        for row in rows {
            report.rows += 1;
            let kind = match parse_kind(&row.kind) {
                Ok(kind) => kind,
                Err(err) => {
                    tracing::debug!(%err, "skipping relationship row");
                    report.malformed += 1;
                    continue;
                }
            };
            match self.interact_kind(row.source_id.trim(), kind, row.target_id.trim()) {
                Ok(i) => match i.outcome {
                    LikeOutcome::Pending => report.applied += 1,
                    LikeOutcome::Matched => {
                        report.applied += 1;
                        report.matched += 1;
                    }
                    LikeOutcome::AlreadyPending | LikeOutcome::AlreadyMatched => {
                        report.repeats += 1
                    }
                },
                Err(err) => {
                    tracing::debug!(%err, "skipping relationship row");
                    match err {
                        RelationError::SelfInteraction(_) => report.malformed += 1,
                        RelationError::UnknownSource(_) | RelationError::UnknownTarget(_) => {
                            report.unknown_ids += 1
                        }
                    }
                }
            }
        }
        tracing::info!(
            rows = report.rows,
            applied = report.applied,
            matched = report.matched,
            skipped = report.skipped(),
            "ingested relationships"
        );
        report
    }
}

fn resolve<'a>(
    table: &PeopleTable,
    ids: impl IntoIterator<Item = &'a String>,
) -> Vec<PersonView> {
    ids.into_iter()
        .filter_map(|id| table.get(id))
        .map(|p| PersonView::from(p).without_lists())
        .collect()
}

impl Default for PairDb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> PairDb {
        PairDb::with_config(Config {
            match_seed: Some(11),
            ..Config::default()
        })
        .unwrap()
    }

    fn people() -> Vec<PersonRow> {
        vec![
            PersonRow::new("ada@x", "Ada Lovelace").type_code("INTJ"),
            PersonRow::new("alan@x", "Alan Turing").type_code("INTP"),
            PersonRow::new("grace@x", "Grace Hopper").type_code("ESTJ"),
            PersonRow::new("linus@x", "Linus Torvalds"),
        ]
    }

    #[test]
    fn test_basic_operations() {
        let db = seeded();
        assert!(db.is_empty());
        assert!(db.register(PersonRow::new("a@x", "First")));
        assert!(!db.register(PersonRow::new("a@x", "Second")));
        assert_eq!(db.len(), 1);
        assert_eq!(db.get("a@x").unwrap().display_name, "First");
        assert!(db.get("b@x").is_none());

        assert_eq!(db.remove("a@x").unwrap().id, "a@x");
        assert!(!db.contains("a@x"));
        assert!(db.remove("a@x").is_none());
    }

    #[test]
    fn test_interactions_and_popularity() {
        let db = seeded();
        db.ingest_people(people());

        let first = db.interact("ada@x", "like", "alan@x").unwrap();
        assert_eq!(first.outcome, LikeOutcome::Pending);
        let repeat = db.interact("ada@x", "LIKE", "alan@x").unwrap();
        assert_eq!(repeat.outcome, LikeOutcome::AlreadyPending);
        assert_eq!(db.get("alan@x").unwrap().popularity, 1);

        let back = db.interact("alan@x", "like", "ada@x").unwrap();
        assert!(back.is_match());
        assert_eq!(db.get("ada@x").unwrap().popularity, 1);
        assert_eq!(db.get("ada@x").unwrap().matched_romantic, vec!["alan@x"]);
        assert!(db.get("alan@x").unwrap().pending_romantic.is_empty());

        db.interact("grace@x", "friend", "ada@x").unwrap();
        assert_eq!(db.get("ada@x").unwrap().popularity, 1);

        assert!(matches!(
            db.interact("ada@x", "wave", "alan@x"),
            Err(InteractError::UnknownKind(k)) if k == "wave"
        ));
        assert!(matches!(
            db.interact("ada@x", "like", "ada@x"),
            Err(InteractError::Relation(RelationError::SelfInteraction(_)))
        ));
        assert!(matches!(
            db.interact("ghost@x", "like", "ada@x"),
            Err(InteractError::Relation(RelationError::UnknownSource(_)))
        ));
    }

    #[test]
    fn test_ingest_reports() {
        let db = seeded();
        let mut rows = people();
        rows.push(PersonRow::new("ada@x", "Impostor"));
        rows.push(PersonRow::new("  ", "Nobody"));
        let report = db.ingest_people(rows);
        assert_eq!(report.rows, 6);
        assert_eq!(report.applied, 4);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.malformed, 1);
        assert_eq!(db.get("ada@x").unwrap().display_name, "Ada Lovelace");

        let report = db.ingest_relationships(vec![
            RelationshipRow::new("ada@x", "like", "alan@x"),
            RelationshipRow::new("alan@x", "like", "ada@x"),
            RelationshipRow::new("ada@x", "like", "alan@x"),
            RelationshipRow::new("ada@x", "like", "ghost@x"),
            RelationshipRow::new("ada@x", "poke", "alan@x"),
            RelationshipRow::new("grace@x", "friend", "grace@x"),
            RelationshipRow::new("grace@x", "friend", "linus@x"),
        ]);
        assert_eq!(report.rows, 7);
        assert_eq!(report.applied, 3);
        assert_eq!(report.matched, 1);
        assert_eq!(report.repeats, 1);
        assert_eq!(report.unknown_ids, 1);
        assert_eq!(report.malformed, 2);
        assert_eq!(report.skipped(), 4);
    }

    #[test]
    fn test_find_match_records_both_sides() {
        let db = seeded();
        db.register(PersonRow::new("a@x", "Ann Lee").type_code("ENFP"));
        db.register(PersonRow::new("b@x", "Bo Kim").type_code("ISTJ"));

        let found = db.find_match("a@x").unwrap();
        assert_eq!(found.id, "b@x");
        assert!(found.pending_romantic.is_empty());
        db.find_match("a@x").unwrap();

        assert_eq!(db.recommendations("a@x"), vec!["b@x"]);
        assert_eq!(db.recommendations("b@x"), vec!["a@x"]);
        assert_eq!(
            db.match_history(),
            vec!["Ann Lee (ENFP) recommended with Bo Kim (ISTJ)"]
        );

        let lists = db.lists("b@x").unwrap();
        assert_eq!(lists.recommended.len(), 1);
        assert_eq!(lists.recommended[0].id, "a@x");
        assert!(db.lists("ghost@x").is_none());
        assert!(db.find_match("ghost@x").is_none());
    }

    #[test]
    fn test_ledger_can_be_disabled() {
        let db = PairDb::with_config(Config {
            match_seed: Some(1),
            record_recommendations: false,
            ..Config::default()
        })
        .unwrap();
        db.register(PersonRow::new("a@x", "A"));
        db.register(PersonRow::new("b@x", "B"));
        assert!(db.find_match("a@x").is_some());
        assert!(db.recommendations("a@x").is_empty());
        assert!(db.match_history().is_empty());
    }

    #[test]
    fn test_lists_skip_removed_people() {
        let db = seeded();
        db.ingest_people(people());
        db.interact("ada@x", "like", "alan@x").unwrap();
        db.interact("ada@x", "friend", "grace@x").unwrap();
        db.remove("alan@x");

        let lists = db.lists("ada@x").unwrap();
        assert!(lists.pending_romantic.is_empty());
        assert_eq!(lists.pending_friend.len(), 1);
        assert_eq!(lists.pending_friend[0].id, "grace@x");
    }

    #[test]
    fn test_remove_then_reregister_starts_clean() {
        let db = seeded();
        db.ingest_people(people());
        db.interact("ada@x", "like", "alan@x").unwrap();
        db.interact("alan@x", "like", "ada@x").unwrap();
        db.interact("grace@x", "like", "alan@x").unwrap();
        db.find_match("linus@x");

        assert!(db.remove("alan@x").is_some());
        assert!(db.get("ada@x").unwrap().matched_romantic.is_empty());
        assert!(db.get("grace@x").unwrap().pending_romantic.is_empty());
        assert!(db.recommendations("alan@x").is_empty());
        assert!(!db.recommendations("linus@x").contains(&"alan@x".to_string()));

        db.register(PersonRow::new("alan@x", "Someone Else"));
        assert!(db.get("alan@x").unwrap().matched_romantic.is_empty());
        let out = db.interact("alan@x", "like", "grace@x").unwrap();
        assert_eq!(out.outcome, LikeOutcome::Pending);
        let out = db.interact("ada@x", "like", "alan@x").unwrap();
        assert_eq!(out.outcome, LikeOutcome::Pending);
        assert!(db.interact("alan@x", "like", "ada@x").unwrap().is_match());
    }

    #[test]
    fn test_autocomplete_and_search() {
        let db = seeded();
        db.ingest_people(people());
        db.register(PersonRow::new("al@x", "Al Green").type_code("INTP"));
        db.interact("ada@x", "like", "al@x").unwrap();
        db.interact("grace@x", "like", "al@x").unwrap();

        let hits: Vec<String> = db.autocomplete("AL").into_iter().map(|p| p.id).collect();
        assert_eq!(hits, vec!["al@x", "alan@x"]);

        // ada liked one INTP, so INTP people score 1.0 for her.
        let ranked: Vec<String> = db.search("a", "ada@x").into_iter().map(|p| p.id).collect();
        assert_eq!(ranked, vec!["al@x", "alan@x"]);
        assert!(db.search("a", "ghost@x").is_empty());
    }

    #[test]
    fn test_substring_policy() {
        let db = PairDb::with_config(Config {
            name_match: NamePolicy::Substring,
            ..Config::default()
        })
        .unwrap();
        db.ingest_people(people());
        let hits: Vec<String> = db.autocomplete("orv").into_iter().map(|p| p.id).collect();
        assert_eq!(hits, vec!["linus@x"]);
    }

    #[test]
    fn test_dumps() {
        let db = seeded();
        db.ingest_people(people());
        db.interact("ada@x", "friend", "grace@x").unwrap();
        let table = db.render_table();
        assert!(table.contains("ada@x"));
        assert!(table.starts_with(&format!("Table size: {}", db.capacity())));
        let relations = db.render_relations();
        assert!(relations.contains("User: Ada Lovelace (ada@x)"));
        assert!(relations.contains("[grace@x]"));
    }

    #[test]
    fn test_capacity_from_config() {
        let db = PairDb::with_config(Config {
            initial_capacity: 100,
            ..Config::default()
        })
        .unwrap();
        assert_eq!(db.capacity(), 101);
        assert!(PairDb::with_config(Config {
            initial_capacity: 0,
            ..Config::default()
        })
        .is_err());
    }

    #[test]
    fn test_concurrent_access() {
        let db = seeded();
        for i in 0..64 {
            db.register(PersonRow::new(format!("p{i}"), format!("Person {i}")).type_code("ENFP"));
        }

        std::thread::scope(|s| {
            for w in 0..4 {
                let db = &db;
                s.spawn(move || {
                    for i in 0..64 {
                        let _ = db.interact(&format!("p{}", (i + w) % 64), "like", &format!("p{i}"));
                    }
                });
            }
            for _ in 0..4 {
                let db = &db;
                s.spawn(move || {
                    for _ in 0..50 {
                        assert!(db.autocomplete("person").len() == 64);
                        let _ = db.find_match("p0");
                    }
                });
            }
        });

        for p in db.all_people() {
            for other in &p.matched_romantic {
                let q = db.get(other).unwrap();
                assert!(q.matched_romantic.contains(&p.id));
                assert!(!q.pending_romantic.contains(&p.id));
            }
        }
    }
}
