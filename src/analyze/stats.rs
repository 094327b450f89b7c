//! Descriptive statistics reported next to the ranking. Informational only; they do
//! not feed the score.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::draw::{Dataset, DrawRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairCount {
    pub pair: (u8, u8),
    pub count: u32,
}

/// The `top` most frequent number pairs over the `window` newest draws,
/// ties broken by ascending pair.
pub fn top_pairs(dataset: &Dataset, window: usize, top: usize) -> Vec<PairCount> {
    let mut counts: BTreeMap<(u8, u8), u32> = BTreeMap::new();
    for rec in dataset.recent(window) {
        let n = rec.numbers();
        for i in 0..n.len() {
            for j in i + 1..n.len() {
                *counts.entry((n[i], n[j])).or_default() += 1;
            }
        }
    }

    let mut v: Vec<PairCount> = counts
        .into_iter()
        .map(|(pair, count)| PairCount { pair, count })
        .collect();
    // BTreeMap order is already ascending by pair; a stable sort keeps it for ties.
    v.sort_by(|a, b| b.count.cmp(&a.count));
    v.truncate(top);
    v
}

/// Numbers shared by the two newest draws.
pub fn repeated_from_previous(dataset: &Dataset) -> Vec<u8> {
    match dataset.records() {
        [latest, prev, ..] => latest
            .numbers()
            .iter()
            .copied()
            .filter(|&n| prev.contains(n))
            .collect(),
        _ => Vec::new(),
    }
}

/// How a stored prediction fared against an actual draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionCheck {
    pub draw_date: String,
    pub matched: usize,
    pub accuracy: f64,
}

pub fn check_prediction(predicted: &[u8], actual: &DrawRecord) -> PredictionCheck {
    let matched = predicted.iter().filter(|&&n| actual.contains(n)).count();
    PredictionCheck {
        draw_date: actual.date().format("%Y-%m-%d").to_string(),
        matched,
        accuracy: matched as f64 / actual.numbers().len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::merge::merge;
    use chrono::NaiveDate;

    fn rec(day: u32, n: [u32; 6]) -> DrawRecord {
        DrawRecord::new(NaiveDate::from_ymd_opt(2025, 2, day).unwrap(), &n, 45, "t").unwrap()
    }

    #[test]
    fn pairs_and_repeats() {
        let ds = merge(
            vec![vec![rec(2, [1, 2, 3, 10, 11, 12]), rec(1, [1, 2, 3, 20, 21, 22])]],
            10,
        )
        .0;
        let pairs = top_pairs(&ds, 50, 3);
        assert_eq!(
            pairs,
            vec![
                PairCount { pair: (1, 2), count: 2 },
                PairCount { pair: (1, 3), count: 2 },
                PairCount { pair: (2, 3), count: 2 },
            ]
        );
        assert_eq!(repeated_from_previous(&ds), vec![1, 2, 3]);
        assert!(repeated_from_previous(&Dataset::empty()).is_empty());
    }

    #[test]
    fn prediction_check_counts_overlap() {
        let c = check_prediction(&[1, 2, 3, 40, 41, 42], &rec(5, [1, 2, 3, 4, 5, 6]));
        assert_eq!(c.matched, 3);
        assert!((c.accuracy - 0.5).abs() < 1e-9);
        assert_eq!(c.draw_date, "2025-02-05");
    }
}
