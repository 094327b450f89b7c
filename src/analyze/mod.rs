// src/analyze/mod.rs
//! Analysis stage: windowed frequency → features → classifier → score → top-K.

pub mod classifier;
pub mod features;
pub mod frequency;
pub mod scoring;
pub mod stats;

use serde::Serialize;

use crate::draw::{Dataset, DRAW_SIZE};

// Re-export convenient types.
pub use crate::analyze::classifier::{Classifier, ClassifierError, ProbabilityFileClassifier};
pub use crate::analyze::features::{build_feature_matrix, FeatureMatrix};
pub use crate::analyze::frequency::{build_frequency, FrequencyTable};
pub use crate::analyze::scoring::{
    aggregate_scores, select_from_scores, select_topk, Ranking, ScoreError, SignalSource,
    SignalWeights,
};

/// Knobs for one game's ranking.
#[derive(Debug, Clone, Copy)]
pub struct RankParams {
    pub window: usize,
    pub top_k: usize,
    pub min_history: usize,
    pub domain_max: u8,
    pub weights: SignalWeights,
}

/// Ranking plus what went into it.
#[derive(Debug, Clone, Serialize)]
pub struct RankOutcome {
    pub ranking: Ranking,
    pub window_used: usize,
    pub history_rows: usize,
    /// Set when the classifier was skipped or failed.
    pub classifier_note: Option<String>,
}

/// Rank one game. Below `min_history` rows the classifier is not consulted
/// (insufficient history); a classifier error is logged and dropped.
pub fn rank(
    dataset: &Dataset,
    companion: Option<&Dataset>,
    classifier: Option<&dyn Classifier>,
    params: &RankParams,
) -> Result<RankOutcome, ScoreError> {
    let freq = build_frequency(dataset, params.window, params.domain_max);

    let mut note = None;
    let probs = match classifier {
        None => None,
        Some(_) if dataset.len() < params.min_history => {
            tracing::info!(
                rows = dataset.len(),
                min_history = params.min_history,
                "insufficient history, classifier skipped"
            );
            note = Some(format!(
                "insufficient history: {} < {} rows",
                dataset.len(),
                params.min_history
            ));
            None
        }
        Some(c) => {
            let features = build_feature_matrix(dataset, companion, params.window, params.domain_max);
            match c.score_all(&features) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(error = %e, "classifier failed, using frequency only");
                    note = Some(e.to_string());
                    None
                }
            }
        }
    };

    let scores = aggregate_scores(Some(&freq), probs.as_deref(), params.domain_max, &params.weights);
    let ranking = select_from_scores(&scores, params.top_k, params.domain_max)?;

    Ok(RankOutcome {
        ranking,
        window_used: freq.window_used(),
        history_rows: dataset.len(),
        classifier_note: note,
    })
}

impl Default for RankParams {
    fn default() -> Self {
        Self {
            window: 50,
            top_k: DRAW_SIZE,
            min_history: 50,
            domain_max: 45,
            weights: SignalWeights::default(),
        }
    }
}
