//! # pairtable
//!
//! An open-addressing table of person records with reciprocity tracking and
//! compatibility ranking.
//!
//! - [`table`]: quadratic-probing hash table with tombstones and prime-sized
//!   rehashing.
//! - [`person`]: the stored record, its personality axes and learned
//!   preferences.
//! - [`compat`]: pairwise compatibility checks and scores.
//! - [`relation`]: like/friend actions and match detection.
//! - [`discover`]: match discovery, autocomplete and ranked search.
//!
//! ## Example
//!
//! ```rust
//! use pairtable::{interact, PeopleTable, PersonRecord, RelationKind, LikeOutcome};
//!
//! let mut table = PeopleTable::new();
//! table.insert(PersonRecord::new("ada@example.com", "Ada Lovelace").with_type_code("INTJ"));
//! table.insert(PersonRecord::new("alan@example.com", "Alan Turing").with_type_code("INTP"));
//!
//! let first = interact(&mut table, "ada@example.com", "alan@example.com", RelationKind::Romantic);
//! assert_eq!(first, Ok(LikeOutcome::Pending));
//! let second = interact(&mut table, "alan@example.com", "ada@example.com", RelationKind::Romantic);
//! assert_eq!(second, Ok(LikeOutcome::Matched));
//!
//! let ada = table.get("ada@example.com").unwrap();
//! assert!(ada.matched(RelationKind::Romantic).contains("alan@example.com"));
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

pub mod compat;
pub mod discover;
pub mod person;
pub mod relation;
pub mod table;

pub use compat::{gender_compatible, is_compatible, is_mutually_compatible, score};
pub use discover::{
    autocomplete_by_popularity, find_match, search_ranked_by_compatibility, NameMatch,
};
pub use person::{parse_gender_preferences, PersonRecord, RelationKind, TypeCode, AXES};
pub use relation::{interact, remove_person, LikeOutcome, RelationError};
pub use table::{next_prime, Keyed, PeopleTable, ProbeTable, Slot};

#[cfg(test)]
mod proptests;
