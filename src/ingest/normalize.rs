// src/ingest/normalize.rs
//! Record normalizer & validator: `CandidateRecord` → `DrawRecord`.
//!
//! Every adapter funnels through here, so date parsing, number extraction and the
//! row invariants are applied identically to all sources. Rejected candidates are
//! dropped and only counted.

use std::collections::BTreeMap;

use metrics::counter;
use serde::Serialize;

use crate::draw::{DrawRecord, ValidationError, DRAW_SIZE};
use crate::ingest::dates::normalize_date;
use crate::ingest::numbers::extract_numbers;
use crate::ingest::types::CandidateRecord;

/// Normalize a single candidate.
pub fn normalize(candidate: &CandidateRecord, domain_max: u8) -> Result<DrawRecord, ValidationError> {
    let date = normalize_date(&candidate.date)?;
    let numbers = extract_numbers(&candidate.numbers.join(" "), DRAW_SIZE, domain_max)?;
    DrawRecord::new(date, &numbers, domain_max, candidate.source.as_str())
}

/// Rejection counts keyed by `ValidationError::kind`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectionTally {
    by_kind: BTreeMap<&'static str, usize>,
}

impl RejectionTally {
    pub fn record(&mut self, err: &ValidationError) {
        *self.by_kind.entry(err.kind()).or_default() += 1;
    }

    pub fn total(&self) -> usize {
        self.by_kind.values().sum()
    }

    pub fn get(&self, kind: &str) -> usize {
        self.by_kind.get(kind).copied().unwrap_or(0)
    }

    pub fn absorb(&mut self, other: &RejectionTally) {
        for (k, v) in &other.by_kind {
            *self.by_kind.entry(k).or_default() += v;
        }
    }
}

/// Normalize a batch, keeping valid records in input order and tallying the rest.
pub fn normalize_batch(
    candidates: &[CandidateRecord],
    domain_max: u8,
) -> (Vec<DrawRecord>, RejectionTally) {
    let mut kept = Vec::with_capacity(candidates.len());
    let mut tally = RejectionTally::default();

    for c in candidates {
        match normalize(c, domain_max) {
            Ok(r) => kept.push(r),
            Err(e) => {
                tracing::debug!(source = %c.source, date = %c.date, reason = %e, "candidate rejected");
                counter!("ingest_rejected_total", "reason" => e.kind()).increment(1);
                tally.record(&e);
            }
        }
    }

    (kept, tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::numbers::scan_tokens;

    fn cand(date: &str, nums: &str) -> CandidateRecord {
        CandidateRecord {
            date: date.into(),
            numbers: scan_tokens(nums),
            source: "test".into(),
        }
    }

    #[test]
    fn valid_candidate_becomes_sorted_record() {
        let r = normalize(&cand("05/11/2025", "45 03 22 11 34 29"), 45).unwrap();
        assert_eq!(r.date().to_string(), "2025-11-05");
        assert_eq!(r.numbers(), &[3, 11, 22, 29, 34, 45]);
    }

    #[test]
    fn batch_tallies_rejections_by_kind() {
        let batch = vec![
            cand("05/11/2025", "01 02 03 04 05 06"),
            cand("not a date", "01 02 03 04 05 06"),
            cand("06/11/2025", "01 02 03"),
            cand("07/11/2025", "01 02 03 04 05 05"),
        ];
        let (kept, tally) = normalize_batch(&batch, 45);
        assert_eq!(kept.len(), 1);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.get("date"), 1);
        assert_eq!(tally.get("numbers"), 2);
    }
}
