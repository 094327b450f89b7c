// src/pipeline.rs
//! One batch run over both games:
//! acquire → persist snapshot (or fall back to it) → rank → evaluate the previous
//! prediction → write the prediction artifact → deliver.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analyze::stats::{check_prediction, repeated_from_previous, top_pairs, PairCount, PredictionCheck};
use crate::analyze::{rank, Classifier, ProbabilityFileClassifier, RankOutcome, RankParams, SignalSource};
use crate::config::{GameConfig, PipelineConfig};
use crate::draw::Dataset;
use crate::ingest::fetch::Fetcher;
use crate::ingest::normalize::RejectionTally;
use crate::ingest::types::AcquisitionError;
use crate::ingest::{FetchOrchestrator, SourceOutcome};
use crate::notify::{Delivery, DeliveryOutcome};
use crate::store::{read_dataset, read_previous_rankings, sha256_hex, write_dataset, write_json};

const TOP_PAIRS: usize = 5;

/// Where the dataset a game was ranked on came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetOrigin {
    Fresh,
    Snapshot,
    Empty,
}

/// Per-game classifier, if one is configured.
#[derive(Default)]
pub struct Classifiers {
    pub primary: Option<Box<dyn Classifier>>,
    pub secondary: Option<Box<dyn Classifier>>,
}

impl Classifiers {
    /// File-backed classifiers for games that name a probability export.
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        let load = |g: &GameConfig| -> Option<Box<dyn Classifier>> {
            g.classifier_probs
                .as_ref()
                .map(|p| Box::new(ProbabilityFileClassifier::new(p)) as Box<dyn Classifier>)
        };
        Self {
            primary: load(&cfg.primary),
            secondary: load(&cfg.secondary),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameMetadata {
    pub game: String,
    pub domain_max: u8,
    pub origin: DatasetOrigin,
    pub rows: usize,
    pub dataset_sha256: Option<String>,
    pub signal: SignalSource,
    pub window_used: usize,
    pub classifier_note: Option<String>,
    pub previous: Option<PredictionCheck>,
    pub top_pairs: Vec<PairCount>,
    pub repeated: Vec<u8>,
    pub rejected: RejectionTally,
    pub duplicates: usize,
    pub sources: Vec<SourceOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalMetadata {
    pub primary: GameMetadata,
    pub secondary: GameMetadata,
}

/// `last_prediction.json`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionArtifact {
    pub timestamp: String,
    pub ranking_primary: Vec<u8>,
    pub ranking_secondary: Vec<u8>,
    pub signal_metadata: SignalMetadata,
}

/// Everything one game produced in a run.
#[derive(Debug, Clone)]
pub struct GameRun {
    pub name: String,
    pub dataset: Dataset,
    pub origin: DatasetOrigin,
    pub outcome: RankOutcome,
    pub metadata: GameMetadata,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub artifact: PredictionArtifact,
    pub primary: GameRun,
    pub secondary: GameRun,
    pub delivery: Option<DeliveryOutcome>,
}

struct Acquired {
    dataset: Dataset,
    origin: DatasetOrigin,
    sha256: Option<String>,
    rejected: RejectionTally,
    duplicates: usize,
    sources: Vec<SourceOutcome>,
}

/// Run both games once. Per-source and per-game acquisition failures degrade the run;
/// only persistence errors (and an invalid `top_k`) fail it.
pub async fn run_once(
    cfg: &PipelineConfig,
    fetcher: Arc<dyn Fetcher>,
    classifiers: &Classifiers,
    delivery: &dyn Delivery,
) -> Result<RunReport> {
    cfg.validate()?;
    let orchestrator = FetchOrchestrator::new(fetcher, cfg.retry, cfg.mode);

    let primary = acquire_game(cfg, &cfg.primary, &orchestrator).await?;
    let secondary = acquire_game(cfg, &cfg.secondary, &orchestrator).await?;

    let previous = match read_previous_rankings(&cfg.prediction_path()) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "previous prediction unreadable, skipping evaluation");
            None
        }
    };

    let primary_run = rank_game(
        cfg,
        &cfg.primary,
        primary,
        Some(&secondary.dataset),
        classifiers.primary.as_deref(),
        previous.as_ref().map(|p| p.ranking_primary.as_slice()),
    )?;
    let secondary_run = rank_game(
        cfg,
        &cfg.secondary,
        secondary,
        Some(&primary_run.dataset),
        classifiers.secondary.as_deref(),
        previous.as_ref().map(|p| p.ranking_secondary.as_slice()),
    )?;

    let artifact = PredictionArtifact {
        timestamp: chrono::Utc::now().to_rfc3339(),
        ranking_primary: primary_run.outcome.ranking.numbers.clone(),
        ranking_secondary: secondary_run.outcome.ranking.numbers.clone(),
        signal_metadata: SignalMetadata {
            primary: primary_run.metadata.clone(),
            secondary: secondary_run.metadata.clone(),
        },
    };
    write_json(&cfg.prediction_path(), &artifact).context("writing prediction artifact")?;
    tracing::info!(
        primary = ?artifact.ranking_primary,
        secondary = ?artifact.ranking_secondary,
        "prediction written"
    );

    let mut report = RunReport {
        artifact,
        primary: primary_run,
        secondary: secondary_run,
        delivery: None,
    };

    match delivery.deliver(&report).await {
        Ok(outcome) => report.delivery = Some(outcome),
        Err(e) => {
            tracing::warn!(error = %e, "delivery failed");
            report.delivery = Some(DeliveryOutcome::Skipped {
                reason: e.to_string(),
            });
        }
    }

    Ok(report)
}

async fn acquire_game(
    cfg: &PipelineConfig,
    game: &GameConfig,
    orchestrator: &FetchOrchestrator,
) -> Result<Acquired> {
    let snapshot = game.snapshot_path(&cfg.data_dir);

    match orchestrator.fetch(&game.sources, game.domain_max, cfg.limit).await {
        Ok(report) => {
            let sha = write_dataset(&snapshot, &report.dataset)
                .with_context(|| format!("writing {} snapshot", game.name))?;
            tracing::info!(
                game = %game.name,
                rows = report.dataset.len(),
                duplicates = report.duplicates,
                rejected = report.rejected.total(),
                "dataset refreshed"
            );
            Ok(Acquired {
                dataset: report.dataset,
                origin: DatasetOrigin::Fresh,
                sha256: Some(sha),
                rejected: report.rejected,
                duplicates: report.duplicates,
                sources: report.outcomes,
            })
        }
        Err(AcquisitionError::AcquisitionFailed { attempted }) => {
            tracing::warn!(game = %game.name, attempted, "acquisition failed, using snapshot");
            let (dataset, origin, sha256) = load_snapshot(&snapshot, game);
            Ok(Acquired {
                dataset,
                origin,
                sha256,
                rejected: RejectionTally::default(),
                duplicates: 0,
                sources: Vec::new(),
            })
        }
    }
}

fn load_snapshot(path: &Path, game: &GameConfig) -> (Dataset, DatasetOrigin, Option<String>) {
    if !path.exists() {
        tracing::warn!(game = %game.name, "no snapshot, ranking on an empty dataset");
        return (Dataset::empty(), DatasetOrigin::Empty, None);
    }
    match read_dataset(path, game.domain_max) {
        Ok(ds) => {
            let sha = fs::read(path).ok().map(|b| sha256_hex(&b));
            (ds, DatasetOrigin::Snapshot, sha)
        }
        Err(e) => {
            tracing::warn!(game = %game.name, error = %e, "snapshot unusable, ranking on an empty dataset");
            (Dataset::empty(), DatasetOrigin::Empty, None)
        }
    }
}

fn rank_game(
    cfg: &PipelineConfig,
    game: &GameConfig,
    acquired: Acquired,
    companion: Option<&Dataset>,
    classifier: Option<&dyn Classifier>,
    previous: Option<&[u8]>,
) -> Result<GameRun> {
    let params = RankParams {
        window: cfg.window,
        top_k: cfg.top_k,
        min_history: cfg.min_history,
        domain_max: game.domain_max,
        weights: cfg.weights,
    };
    let outcome = rank(&acquired.dataset, companion, classifier, &params)
        .with_context(|| format!("ranking {}", game.name))?;

    // A stale snapshot says nothing about how the last prediction did.
    let previous = match (acquired.origin, previous, acquired.dataset.latest()) {
        (DatasetOrigin::Fresh, Some(pred), Some(latest)) => Some(check_prediction(pred, latest)),
        _ => None,
    };
    if let Some(check) = &previous {
        tracing::info!(
            game = %game.name,
            draw = %check.draw_date,
            matched = check.matched,
            "previous prediction evaluated"
        );
    }

    let metadata = GameMetadata {
        game: game.name.clone(),
        domain_max: game.domain_max,
        origin: acquired.origin,
        rows: acquired.dataset.len(),
        dataset_sha256: acquired.sha256,
        signal: outcome.ranking.source,
        window_used: outcome.window_used,
        classifier_note: outcome.classifier_note.clone(),
        previous,
        top_pairs: top_pairs(&acquired.dataset, cfg.window, TOP_PAIRS),
        repeated: repeated_from_previous(&acquired.dataset),
        rejected: acquired.rejected,
        duplicates: acquired.duplicates,
        sources: acquired.sources,
    };

    Ok(GameRun {
        name: game.name.clone(),
        dataset: acquired.dataset,
        origin: acquired.origin,
        outcome,
        metadata,
    })
}
