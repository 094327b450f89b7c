//! Score aggregation and top-K selection.
//!
//! Two optional signals per number, both normalized to [0,1]:
//! - `frequency`  : windowed count divided by the window's max count
//! - `classifier` : external probability
//!
//! score = (w_frequency*frequency + w_classifier*classifier) / (w_frequency + w_classifier)
//! when both exist (equal weights make it the arithmetic mean), otherwise the one that
//! exists. With neither, raw counts are used (all zero without history) and the
//! ascending-number tie-break fills the ranking: the degraded path.

use std::collections::BTreeSet;

use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analyze::frequency::FrequencyTable;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub frequency: f64,
    pub classifier: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            frequency: 1.0,
            classifier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Combined,
    Frequency,
    Classifier,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("k = {k} must be within [1, {domain_max}]")]
    InvalidK { k: usize, domain_max: u8 },
    #[error("ranking failed re-validation: {0}")]
    Integrity(String),
}

/// One score per number, `scores[n - 1]` for number `n`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreVector {
    pub scores: Vec<f64>,
    pub source: SignalSource,
}

/// Final selection: `k` distinct numbers, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranking {
    pub numbers: Vec<u8>,
    pub source: SignalSource,
}

/// Combine the available signals into a score vector over `[1, domain_max]`.
pub fn aggregate_scores(
    frequency: Option<&FrequencyTable>,
    classifier: Option<&[f64]>,
    domain_max: u8,
    weights: &SignalWeights,
) -> ScoreVector {
    let len = usize::from(domain_max);

    let freq: Option<Vec<f64>> = frequency.filter(|t| !t.is_empty()).map(|t| {
        let max = f64::from(t.max_count().max(1));
        (1..=domain_max).map(|n| f64::from(t.count(n)) / max).collect()
    });

    let prob: Option<Vec<f64>> = classifier.and_then(|p| {
        if p.len() != len || p.iter().any(|x| !x.is_finite()) {
            tracing::warn!(
                expected = len,
                got = p.len(),
                "classifier probabilities unusable, ignoring"
            );
            return None;
        }
        Some(p.iter().map(|x| x.clamp(0.0, 1.0)).collect())
    });

    match (freq, prob) {
        (Some(f), Some(p)) => {
            let wf = weights.frequency.max(0.0);
            let wc = weights.classifier.max(0.0);
            // Light normalization: divide by sum of weights if > 0.
            let denom = (wf + wc).max(1e-6);
            ScoreVector {
                scores: f.iter().zip(&p).map(|(a, b)| (wf * a + wc * b) / denom).collect(),
                source: SignalSource::Combined,
            }
        }
        (Some(f), None) => ScoreVector {
            scores: f,
            source: SignalSource::Frequency,
        },
        (None, Some(p)) => ScoreVector {
            scores: p,
            source: SignalSource::Classifier,
        },
        (None, None) => ScoreVector {
            scores: (1..=domain_max)
                .map(|n| frequency.map_or(0.0, |t| f64::from(t.count(n))))
                .collect(),
            source: SignalSource::Degraded,
        },
    }
}

/// Pick `k` numbers by descending score, lower number winning ties, returned ascending.
pub fn select_from_scores(scores: &ScoreVector, k: usize, domain_max: u8) -> Result<Ranking, ScoreError> {
    if k == 0 || k > usize::from(domain_max) {
        return Err(ScoreError::InvalidK { k, domain_max });
    }

    let mut order: Vec<(u8, f64)> = (1..=domain_max)
        .map(|n| {
            let s = scores.scores.get(usize::from(n) - 1).copied().unwrap_or(0.0);
            (n, if s.is_nan() { 0.0 } else { s })
        })
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut picked: BTreeSet<u8> = order.iter().take(k).map(|(n, _)| *n).collect();

    // Fill any shortfall from the full domain, ascending.
    for n in 1..=domain_max {
        if picked.len() >= k {
            break;
        }
        picked.insert(n);
    }

    let numbers: Vec<u8> = picked.into_iter().collect();
    validate_ranking(&numbers, k, domain_max)?;

    if scores.source == SignalSource::Degraded {
        counter!("ranking_degraded_total").increment(1);
    }
    Ok(Ranking {
        numbers,
        source: scores.source,
    })
}

/// Aggregate with equal weights and select.
pub fn select_topk(
    frequency: Option<&FrequencyTable>,
    classifier: Option<&[f64]>,
    k: usize,
    domain_max: u8,
) -> Result<Ranking, ScoreError> {
    let scores = aggregate_scores(frequency, classifier, domain_max, &SignalWeights::default());
    select_from_scores(&scores, k, domain_max)
}

fn validate_ranking(numbers: &[u8], k: usize, domain_max: u8) -> Result<(), ScoreError> {
    if numbers.len() != k {
        return Err(ScoreError::Integrity(format!("{} numbers, expected {k}", numbers.len())));
    }
    if numbers.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ScoreError::Integrity("numbers not strictly ascending".into()));
    }
    if numbers.iter().any(|&n| n == 0 || n > domain_max) {
        return Err(ScoreError::Integrity(format!("number outside [1, {domain_max}]")));
    }
    Ok(())
}
