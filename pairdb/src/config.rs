//! Database configuration.

use std::path::{Path, PathBuf};

use pairtable::NameMatch;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest initial capacity accepted by [`Config::validate`].
pub const MAX_INITIAL_CAPACITY: usize = 1 << 24;

/// Errors from loading or validating a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `initial_capacity` out of range.
    #[error("initial_capacity must be between 1 and 16777216, got {0}")]
    InvalidCapacity(usize),

    /// Malformed JSON or an unknown field value.
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read config {}: {source}", path.display())]
    /// The config file could not be read.
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Name matching policy for autocomplete and search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamePolicy {
    /// A name token must start with the query.
    #[default]
    Prefix,
    /// The query may appear anywhere in a name token.
    Substring,
}

impl From<NamePolicy> for NameMatch {
    fn from(p: NamePolicy) -> Self {
        match p {
            NamePolicy::Prefix => NameMatch::Prefix,
            NamePolicy::Substring => NameMatch::Substring,
        }
    }
}

/// Configuration for a [`PairDb`](crate::PairDb).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Starting table capacity, rounded up to a prime
    pub initial_capacity: usize,
    /// How queries match name tokens
    pub name_match: NamePolicy,
    /// Seed for match discovery; entropy when unset
    pub match_seed: Option<u64>,
    /// Keep a ledger of recommendations made by `find_match`
    pub record_recommendations: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: pairtable::table::DEFAULT_CAPACITY,
            name_match: NamePolicy::Prefix,
            match_seed: None,
            record_recommendations: true,
        }
    }
}

impl Config {
    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity == 0 || self.initial_capacity > MAX_INITIAL_CAPACITY {
            return Err(ConfigError::InvalidCapacity(self.initial_capacity));
        }
        Ok(())
    }

    /// Parses and validates a JSON config. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
