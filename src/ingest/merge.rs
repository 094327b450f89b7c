// src/ingest/merge.rs
//! Merger / deduplicator: validated batches → `Dataset`.
//!
//! Duplicates are keyed by `(date, numbers)`, never by date alone. When the same draw
//! arrives from several sources the lexicographically smallest source name is kept, so
//! the result does not depend on the order in which batches arrived.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::draw::{Dataset, DrawRecord, DRAW_SIZE};

/// Merge batches into a dataset sorted newest first and truncated to `limit`.
/// Returns the dataset and the number of duplicates dropped.
pub fn merge<I>(batches: I, limit: usize) -> (Dataset, usize)
where
    I: IntoIterator<Item = Vec<DrawRecord>>,
{
    // (Reverse(date), numbers) orders newest first, then by ascending number tuple.
    let mut unique: BTreeMap<(Reverse<NaiveDate>, [u8; DRAW_SIZE]), DrawRecord> = BTreeMap::new();
    let mut dups = 0usize;

    for batch in batches {
        for rec in batch {
            let (date, numbers) = rec.key();
            let key = (Reverse(date), numbers);
            match unique.get_mut(&key) {
                Some(existing) => {
                    dups += 1;
                    if rec.source() < existing.source() {
                        *existing = rec;
                    }
                }
                None => {
                    unique.insert(key, rec);
                }
            }
        }
    }

    let records: Vec<DrawRecord> = unique.into_values().take(limit).collect();
    (Dataset::from_sorted(records), dups)
}
