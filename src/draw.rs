//! # Draw records
//! Validated draw rows and the recency-ordered dataset built from them.
//!
//! A `DrawRecord` can only be obtained through `DrawRecord::new`, which enforces
//! the row invariants: exactly `DRAW_SIZE` distinct numbers in `[1, domain_max]`,
//! strictly ascending. Once built a record is never mutated.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Number of winning numbers in one draw.
pub const DRAW_SIZE: usize = 6;

/// Largest domain max the two-digit extractor can represent.
pub const MAX_DOMAIN: u8 = 99;

/// Why a set of numbers cannot form a draw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected {expected} numbers, got {got}")]
    WrongArity { expected: usize, got: usize },
    #[error("number {number} outside [1, {domain_max}]")]
    OutOfRange { number: u32, domain_max: u8 },
    #[error("number {0} appears more than once")]
    Duplicate(u8),
    #[error("invalid date: {0}")]
    InvalidDate(#[from] crate::ingest::dates::DateError),
    #[error("number extraction failed: {0}")]
    Numbers(#[from] crate::ingest::numbers::ExtractError),
}

impl ValidationError {
    /// Stable label for rejection tallies and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::WrongArity { .. } => "arity",
            ValidationError::OutOfRange { .. } => "range",
            ValidationError::Duplicate(_) => "duplicate",
            ValidationError::InvalidDate(_) => "date",
            ValidationError::Numbers(_) => "numbers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawRecord {
    date: NaiveDate,
    numbers: [u8; DRAW_SIZE],
    source: String,
}

impl DrawRecord {
    /// Build a record, sorting `numbers` ascending and checking arity, range and uniqueness.
    pub fn new(
        date: NaiveDate,
        numbers: &[u32],
        domain_max: u8,
        source: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if numbers.len() != DRAW_SIZE {
            return Err(ValidationError::WrongArity {
                expected: DRAW_SIZE,
                got: numbers.len(),
            });
        }

        let mut out = [0u8; DRAW_SIZE];
        for (slot, &n) in out.iter_mut().zip(numbers) {
            if n == 0 || n > u32::from(domain_max) {
                return Err(ValidationError::OutOfRange {
                    number: n,
                    domain_max,
                });
            }
            *slot = n as u8;
        }
        out.sort_unstable();

        if let Some(w) = out.windows(2).find(|w| w[0] == w[1]) {
            return Err(ValidationError::Duplicate(w[0]));
        }

        Ok(Self {
            date,
            numbers: out,
            source: source.into(),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn numbers(&self) -> &[u8; DRAW_SIZE] {
        &self.numbers
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn contains(&self, n: u8) -> bool {
        self.numbers.binary_search(&n).is_ok()
    }

    /// Dedup key: the same draw reported by two sources collapses to one row.
    pub fn key(&self) -> (NaiveDate, [u8; DRAW_SIZE]) {
        (self.date, self.numbers)
    }
}

/// Ordered, deduplicated draw history: newest first, bounded by the run's row limit.
///
/// Only the merger builds non-empty datasets from fetched records; the store
/// rebuilds them from a snapshot through the same path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dataset {
    records: Vec<DrawRecord>,
}

impl Dataset {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Caller guarantees ordering and uniqueness (see `ingest::merge`).
    pub(crate) fn from_sorted(records: Vec<DrawRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[DrawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent draw, if any.
    pub fn latest(&self) -> Option<&DrawRecord> {
        self.records.first()
    }

    /// The `window` most recent draws (all of them when fewer are available).
    pub fn recent(&self, window: usize) -> &[DrawRecord] {
        &self.records[..window.min(self.records.len())]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a DrawRecord;
    type IntoIter = std::slice::Iter<'a, DrawRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
