// src/ingest/orchestrator.rs
//! Fetch orchestrator: walks the ordered source list and turns pages into a `Dataset`.
//!
//! Per source the state machine is
//! `Idle → Fetching → {Retrying → Fetching | Parsed | SourceExhausted}`,
//! `Parsed → Validating → {Accepted | SourceExhausted}`.
//! A run ends `Accepted` (first success, or enough rows in merge mode) or with every
//! source exhausted, which is the only failure surfaced to the caller.
//!
//! Sources are processed one after another and the batch list is only touched here,
//! which keeps the merge trivially deterministic.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};

use crate::draw::{Dataset, DrawRecord, DRAW_SIZE};
use crate::ingest::ensure_metrics_described;
use crate::ingest::fetch::{fetch_with_retry, Fetcher, RetryPolicy};
use crate::ingest::merge::merge;
use crate::ingest::normalize::{normalize_batch, RejectionTally};
use crate::ingest::providers::AdapterRegistry;
use crate::ingest::types::{AcquisitionError, RawDocument, SourceSpec};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// Stop at the first source that yields a valid record.
    #[default]
    FirstSuccess,
    /// Keep accumulating sources until `target_count` unique rows are collected.
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    Idle,
    Fetching,
    Retrying,
    Parsed,
    Validating,
    Accepted,
    SourceExhausted,
}

/// What happened to one source during a run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    pub state: SourceState,
    pub attempts: u32,
    pub adapter: Option<&'static str>,
    pub candidates: usize,
    pub accepted: usize,
    pub rejected: RejectionTally,
    pub reason: Option<String>,
}

impl SourceOutcome {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            state: SourceState::Idle,
            attempts: 0,
            adapter: None,
            candidates: 0,
            accepted: 0,
            rejected: RejectionTally::default(),
            reason: None,
        }
    }

    fn exhausted(mut self, reason: impl Into<String>) -> Self {
        self.state = SourceState::SourceExhausted;
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct AcquisitionReport {
    pub dataset: Dataset,
    pub outcomes: Vec<SourceOutcome>,
    pub rejected: RejectionTally,
    pub duplicates: usize,
}

pub struct FetchOrchestrator {
    fetcher: Arc<dyn Fetcher>,
    adapters: AdapterRegistry,
    policy: RetryPolicy,
    mode: AcquisitionMode,
}

impl FetchOrchestrator {
    pub fn new(fetcher: Arc<dyn Fetcher>, policy: RetryPolicy, mode: AcquisitionMode) -> Self {
        Self {
            fetcher,
            adapters: AdapterRegistry::default(),
            policy,
            mode,
        }
    }

    pub fn with_adapters(mut self, adapters: AdapterRegistry) -> Self {
        self.adapters = adapters;
        self
    }

    /// Acquire up to `target_count` draws for a game with numbers in `[1, domain_max]`.
    pub async fn fetch(
        &self,
        sources: &[SourceSpec],
        domain_max: u8,
        target_count: usize,
    ) -> Result<AcquisitionReport, AcquisitionError> {
        ensure_metrics_described();

        let mut batches: Vec<Vec<DrawRecord>> = Vec::new();
        let mut seen: HashSet<(NaiveDate, [u8; DRAW_SIZE])> = HashSet::new();
        let mut outcomes = Vec::with_capacity(sources.len());
        let mut rejected = RejectionTally::default();

        for src in sources {
            let (outcome, records) = self.acquire_source(src, domain_max).await;
            rejected.absorb(&outcome.rejected);

            if outcome.state != SourceState::Accepted {
                tracing::warn!(
                    source = %outcome.source,
                    attempts = outcome.attempts,
                    reason = outcome.reason.as_deref().unwrap_or("unknown"),
                    "source skipped"
                );
                counter!("ingest_source_errors_total").increment(1);
                outcomes.push(outcome);
                continue;
            }

            tracing::info!(
                source = %outcome.source,
                adapter = outcome.adapter.unwrap_or("-"),
                accepted = outcome.accepted,
                rejected = outcome.rejected.total(),
                "source accepted"
            );
            outcomes.push(outcome);
            seen.extend(records.iter().map(DrawRecord::key));
            batches.push(records);

            match self.mode {
                AcquisitionMode::FirstSuccess => break,
                AcquisitionMode::Merge if seen.len() >= target_count => break,
                AcquisitionMode::Merge => {}
            }
        }

        if batches.is_empty() {
            return Err(AcquisitionError::AcquisitionFailed {
                attempted: outcomes.len(),
            });
        }

        let (dataset, duplicates) = merge(batches, target_count);

        counter!("ingest_kept_total").increment(dataset.len() as u64);
        counter!("ingest_dedup_total").increment(duplicates as u64);
        gauge!("ingest_pipeline_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

        Ok(AcquisitionReport {
            dataset,
            outcomes,
            rejected,
            duplicates,
        })
    }

    async fn acquire_source(
        &self,
        src: &SourceSpec,
        domain_max: u8,
    ) -> (SourceOutcome, Vec<DrawRecord>) {
        let mut outcome = SourceOutcome::new(&src.name);
        outcome.state = SourceState::Fetching;
        tracing::debug!(source = %src.name, url = %src.url, "fetching");

        let budget = self.policy.per_source_timeout();
        let mut attempts = 0u32;
        let fetched = tokio::time::timeout(
            budget,
            fetch_with_retry(
                self.fetcher.as_ref(),
                &src.name,
                &src.url,
                &self.policy,
                &mut attempts,
            ),
        )
        .await;
        outcome.attempts = attempts;

        let body = match fetched {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => return (outcome.exhausted(format!("retrieval failed: {e}")), Vec::new()),
            Err(_) => {
                return (
                    outcome.exhausted(format!("source timed out after {budget:?}")),
                    Vec::new(),
                )
            }
        };

        let doc = RawDocument::new(src.name.as_str(), body);
        let (adapter, candidates) = self.adapters.parse(&doc);
        drop(doc);
        outcome.state = SourceState::Parsed;
        outcome.adapter = adapter;
        outcome.candidates = candidates.len();
        if candidates.is_empty() {
            return (outcome.exhausted("no recognizable structure"), Vec::new());
        }

        outcome.state = SourceState::Validating;
        let (records, tally) = normalize_batch(&candidates, domain_max);
        outcome.accepted = records.len();
        outcome.rejected = tally;
        if records.is_empty() {
            return (outcome.exhausted("zero valid records"), Vec::new());
        }

        outcome.state = SourceState::Accepted;
        (outcome, records)
    }
}
