// src/analyze/classifier.rs
//! Classifier collaborator seam.
//!
//! Models are trained outside this crate; the pipeline only asks for one probability
//! per candidate number given the feature matrix.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::analyze::features::FeatureMatrix;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
    #[error("classifier output malformed: {0}")]
    Malformed(String),
}

pub trait Classifier: Send + Sync {
    /// Probability that each number `1..=domain_max` appears in the next draw,
    /// `out[n - 1]` for number `n`.
    fn score_all(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ClassifierError>;
}

/// Probabilities exported by an external trainer, read from JSON on every call.
///
/// Accepted shapes: `{"probabilities": {"1": 0.12, "2": 0.08}}` or `[0.12, 0.08, ...]`
/// (index 0 is number 1). Numbers missing from the map score 0.
#[derive(Debug, Clone)]
pub struct ProbabilityFileClassifier {
    path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProbabilityFile {
    Keyed { probabilities: BTreeMap<String, f64> },
    Dense(Vec<f64>),
}

impl ProbabilityFileClassifier {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load(&self, domain_max: u8) -> Result<Vec<f64>, ClassifierError> {
        let data = fs::read_to_string(&self.path)
            .map_err(|e| ClassifierError::Unavailable(format!("{}: {e}", self.path.display())))?;
        let parsed: ProbabilityFile =
            serde_json::from_str(&data).map_err(|e| ClassifierError::Malformed(e.to_string()))?;

        let len = usize::from(domain_max);
        let mut out = vec![0.0; len];
        match parsed {
            ProbabilityFile::Dense(v) => {
                for (slot, p) in out.iter_mut().zip(v) {
                    *slot = p;
                }
            }
            ProbabilityFile::Keyed { probabilities } => {
                for (k, p) in probabilities {
                    let n: usize = k
                        .trim()
                        .parse()
                        .map_err(|_| ClassifierError::Malformed(format!("bad number key {k:?}")))?;
                    if (1..=len).contains(&n) {
                        out[n - 1] = p;
                    }
                }
            }
        }

        if let Some(p) = out.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(ClassifierError::Malformed(format!("probability {p} outside [0, 1]")));
        }
        Ok(out)
    }
}

impl Classifier for ProbabilityFileClassifier {
    fn score_all(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ClassifierError> {
        self.load(features.domain_max)
    }
}
