// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod draw;
pub mod store;

// Acquisition: fetch, adapters, normalize, merge
pub mod ingest;

// Frequency, features, classifier seam, scoring
pub mod analyze;

pub mod notify;
pub mod pipeline;

// ---- Re-exports for stable public API ----
pub use crate::config::PipelineConfig;
pub use crate::draw::{Dataset, DrawRecord, ValidationError};
pub use crate::notify::{Delivery, DeliveryOutcome, LogDelivery};
pub use crate::pipeline::{run_once, Classifiers, RunReport};
