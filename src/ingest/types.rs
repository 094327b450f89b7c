// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One fetched page. Dropped as soon as the adapter has parsed it.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub source: String,
    pub text: String,
    pub retrieved_at: DateTime<Utc>,
}

impl RawDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            retrieved_at: Utc::now(),
        }
    }
}

/// Unvalidated row as produced by a source adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub date: String,         // raw date text, e.g. "Thứ 4, 05/11/2025"
    pub numbers: Vec<String>, // raw 1–2 digit tokens, in page order
    pub source: String,
}

/// A configured source: display name plus URL, tried in list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub name: String,
    pub url: String,
}

/// Per-structural-family parser. A page with none of the structure it knows yields an
/// empty vec: that is a signal to try the next adapter or source, not an error.
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    fn can_parse(&self, doc: &RawDocument) -> bool;
    fn parse(&self, doc: &RawDocument) -> Vec<CandidateRecord>;
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("http status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("all {attempted} sources exhausted without a valid record")]
    AcquisitionFailed { attempted: usize },
}
