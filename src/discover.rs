//! Read-only traversals over the person table: random-start match discovery,
//! popularity-ranked autocomplete and compatibility-ranked name search.

use rand::Rng;

use crate::compat::{gender_compatible, is_mutually_compatible, score};
use crate::person::{PersonRecord, RelationKind};
use crate::table::PeopleTable;

/// How a query is matched against display-name tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NameMatch {
    /// A token must start with the query.
    #[default]
    Prefix,
    /// The query may appear anywhere inside a token.
    Substring,
}

impl NameMatch {
    /// Whether any whitespace token of `name` matches `query`, ignoring case.
    pub fn matches(self, name: &str, query: &str) -> bool {
        let query = query.to_lowercase();
        name.split_whitespace().map(str::to_lowercase).any(|token| match self {
            NameMatch::Prefix => token.starts_with(&query),
            NameMatch::Substring => token.contains(&query),
        })
    }
}

/// Scans every slot once in circular order from a random start and returns
/// the first candidate that is mutually compatible with the seeker.
///
/// Skips empty and deleted slots, the seeker, people the seeker is already
/// romantically matched with, and gender-gated candidates.
pub fn find_match<'a, R>(
    table: &'a PeopleTable,
    seeker_id: &str,
    rng: &mut R,
) -> Option<&'a PersonRecord>
where
    R: Rng + ?Sized,
{
    let seeker = table.get(seeker_id)?;
    let capacity = table.capacity();
    let start = rng.gen_range(0..capacity);
    let matched = seeker.matched(RelationKind::Romantic);

    (0..capacity)
        .filter_map(|i| table.occupied_at((start + i) % capacity))
        .filter(|c| c.id() != seeker.id())
        .filter(|c| !matched.contains(c.id()))
        .filter(|c| gender_compatible(seeker, c))
        .find(|c| is_mutually_compatible(seeker, c))
}

/// People with a name token matching `query`, most popular first.
///
/// Equal popularity keeps slot order.
pub fn autocomplete_by_popularity<'a>(
    table: &'a PeopleTable,
    query: &str,
    policy: NameMatch,
) -> Vec<&'a PersonRecord> {
    let mut hits: Vec<&PersonRecord> = table
        .iter()
        .filter(|p| policy.matches(p.display_name(), query))
        .collect();
    hits.sort_by(|a, b| b.popularity().cmp(&a.popularity()));
    hits
}

/// Name search ranked by the seeker's compatibility score, then popularity.
///
/// The seeker and gender-incompatible people are excluded; an unknown seeker
/// yields no results.
pub fn search_ranked_by_compatibility<'a>(
    table: &'a PeopleTable,
    query: &str,
    seeker_id: &str,
    policy: NameMatch,
) -> Vec<&'a PersonRecord> {
    let Some(seeker) = table.get(seeker_id) else {
        return Vec::new();
    };

    let mut scored: Vec<(f64, &PersonRecord)> = table
        .iter()
        .filter(|p| p.id() != seeker.id())
        .filter(|p| policy.matches(p.display_name(), query))
        .filter(|p| gender_compatible(seeker, p))
        .map(|p| (score(seeker, p), p))
        .collect();
    scored.sort_by(|(sa, a), (sb, b)| {
        sb.total_cmp(sa)
            .then_with(|| b.popularity().cmp(&a.popularity()))
    });
    scored.into_iter().map(|(_, p)| p).collect()
}
