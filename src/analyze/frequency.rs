//! Windowed frequency table: how often each number in `[1, domain_max]` was drawn
//! over the most recent `window` draws.

use serde::Serialize;

use crate::draw::Dataset;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyTable {
    domain_max: u8,
    /// `counts[n - 1]` is the count for number `n`.
    counts: Vec<u32>,
    /// Draws actually covered (≤ requested window).
    window_used: usize,
}

impl FrequencyTable {
    /// Table with no observations.
    pub fn empty(domain_max: u8) -> Self {
        Self {
            domain_max,
            counts: vec![0; usize::from(domain_max)],
            window_used: 0,
        }
    }

    pub fn domain_max(&self) -> u8 {
        self.domain_max
    }

    pub fn window_used(&self) -> usize {
        self.window_used
    }

    /// True when no draw contributed to the table.
    pub fn is_empty(&self) -> bool {
        self.window_used == 0
    }

    pub fn count(&self, n: u8) -> u32 {
        match n {
            0 => 0,
            n => self.counts.get(usize::from(n) - 1).copied().unwrap_or(0),
        }
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// `(number, count)` pairs in ascending number order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (i as u8 + 1, c))
    }
}

/// Count occurrences over the `window` newest draws of `dataset`.
/// A window larger than the dataset uses everything available.
pub fn build_frequency(dataset: &Dataset, window: usize, domain_max: u8) -> FrequencyTable {
    let mut table = FrequencyTable::empty(domain_max);
    let recent = dataset.recent(window);
    for rec in recent {
        for &n in rec.numbers() {
            if let Some(slot) = table.counts.get_mut(usize::from(n).wrapping_sub(1)) {
                *slot += 1;
            }
        }
    }
    table.window_used = recent.len();
    table
}
