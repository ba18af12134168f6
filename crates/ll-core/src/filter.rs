//! # Filter Predicate Builder
//!
//! Turns the optional criteria of a [`QueryParameters`] into a list of
//! backend-neutral predicates. Each criterion has one constructor; the
//! constructors run in a fixed order and every predicate they return is
//! joined with AND. An empty [`Filter`] matches every row.
//!
//! Backends render the same predicates: SQL dialects in [`crate::sql`],
//! the document store in its own crate.

use crate::level::{self, LevelFilter, LevelFormat, LevelValue};
use crate::params::QueryParameters;
use chrono::{DateTime, Utc};

/// One atomic match condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    LevelEquals(LevelValue),
    /// Case-insensitive substring of message or exception.
    TextContains(String),
    TimestampAtOrAfter(DateTime<Utc>),
    /// Exclusive upper bound.
    TimestampBefore(DateTime<Utc>),
    /// Matches nothing.
    Never,
}

/// AND-combination of predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches_all(&self) -> bool {
        self.predicates.is_empty()
    }
}

type PredicateConstructor = fn(&QueryParameters, LevelFormat) -> Option<Predicate>;

const CONSTRUCTORS: [PredicateConstructor; 4] = [
    level_predicate,
    search_predicate,
    start_predicate,
    end_predicate,
];

/// Build the filter for `params` against a sink storing levels as `format`.
pub fn build(params: &QueryParameters, format: LevelFormat) -> Filter {
    let predicates = CONSTRUCTORS
        .iter()
        .filter_map(|construct| construct(params, format))
        .collect();
    Filter { predicates }
}

fn level_predicate(params: &QueryParameters, format: LevelFormat) -> Option<Predicate> {
    match level::normalize(params.level(), format) {
        LevelFilter::Any => None,
        LevelFilter::Match(value) => Some(Predicate::LevelEquals(value)),
        LevelFilter::Unrecognized => Some(Predicate::Never),
    }
}

fn search_predicate(params: &QueryParameters, _: LevelFormat) -> Option<Predicate> {
    params
        .search_text()
        .map(|text| Predicate::TextContains(text.to_string()))
}

fn start_predicate(params: &QueryParameters, _: LevelFormat) -> Option<Predicate> {
    params.start_date().map(Predicate::TimestampAtOrAfter)
}

fn end_predicate(params: &QueryParameters, _: LevelFormat) -> Option<Predicate> {
    params.end_date().map(Predicate::TimestampBefore)
}
