//! In-memory load board
//!
//! Loads come from `[[loads]]` entries in the configuration. Search is a
//! case-insensitive substring match on origin, destination and equipment type.

use serde::{Deserialize, Serialize};
use tracing::debug;

use loadbroker_config::{Config, LoadRecord};
use loadbroker_engine::RateSource;
use loadbroker_utils::error::DeskError;

/// A posted load.
pub type Load = LoadRecord;

pub const DEFAULT_SEARCH_LIMIT: usize = 3;
pub const MAX_SEARCH_LIMIT: usize = 10;
const MIN_TERM_LEN: usize = 2;

/// Load search parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadQuery {
    pub origin: String,
    pub destination: String,
    pub equipment_type: String,
    /// Maximum number of loads returned; defaults to 3, at most 10
    #[serde(default)]
    pub limit: Option<usize>,
}

impl LoadQuery {
    #[must_use]
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        equipment_type: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            equipment_type: equipment_type.into(),
            limit: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn validate(&self) -> Result<usize, DeskError> {
        for (field, term) in [
            ("origin", &self.origin),
            ("destination", &self.destination),
            ("equipment_type", &self.equipment_type),
        ] {
            if term.trim().chars().count() < MIN_TERM_LEN {
                return Err(DeskError::invalid_query(
                    field,
                    format!("'{term}' is shorter than {MIN_TERM_LEN} characters"),
                ));
            }
        }

        let limit = self.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
            return Err(DeskError::invalid_query(
                "limit",
                format!("{limit} (must be between 1 and {MAX_SEARCH_LIMIT})"),
            ));
        }
        Ok(limit)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_lowercase()
        .contains(&needle.trim().to_lowercase())
}

#[derive(Debug, Clone, Default)]
pub struct LoadBoard {
    loads: Vec<Load>,
}

impl LoadBoard {
    #[must_use]
    pub fn new(loads: Vec<Load>) -> Self {
        Self { loads }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.loads.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.loads.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    #[must_use]
    pub fn get(&self, load_id: &str) -> Option<&Load> {
        self.loads.iter().find(|load| load.load_id == load_id)
    }

    /// Loads matching all three terms, in board order, up to the query limit.
    ///
    /// # Errors
    ///
    /// - `DeskError::InvalidQuery` for short terms or an out-of-range limit
    /// - `DeskError::NoMatchingLoads` when nothing matches
    pub fn search(&self, query: &LoadQuery) -> Result<Vec<&Load>, DeskError> {
        let limit = query.validate()?;

        let matches: Vec<&Load> = self
            .loads
            .iter()
            .filter(|load| {
                contains_ignore_case(&load.origin, &query.origin)
                    && contains_ignore_case(&load.destination, &query.destination)
                    && contains_ignore_case(&load.equipment_type, &query.equipment_type)
            })
            .take(limit)
            .collect();

        debug!(
            origin = %query.origin,
            destination = %query.destination,
            equipment_type = %query.equipment_type,
            matches = matches.len(),
            "Load search"
        );

        if matches.is_empty() {
            return Err(DeskError::NoMatchingLoads);
        }
        Ok(matches)
    }
}

impl RateSource for LoadBoard {
    fn lookup(&self, load_id: &str) -> Option<f64> {
        self.get(load_id).map(|load| load.loadboard_rate)
    }
}
