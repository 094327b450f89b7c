//! Delivery seam: hands a finished run to whatever reports it onward.
//! Only the log-based delivery lives in this crate.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::draw::DRAW_SIZE;
use crate::pipeline::{GameRun, RunReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum DeliveryOutcome {
    Delivered { channel: String },
    Skipped { reason: String },
}

#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, report: &RunReport) -> Result<DeliveryOutcome>;
}

/// Summarizes the run through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct LogDelivery;

#[async_trait]
impl Delivery for LogDelivery {
    async fn deliver(&self, report: &RunReport) -> Result<DeliveryOutcome> {
        for game in [&report.primary, &report.secondary] {
            tracing::info!(
                game = %game.name,
                rows = game.dataset.len(),
                origin = ?game.origin,
                signal = ?game.outcome.ranking.source,
                "{}",
                summary_line(game)
            );
        }
        Ok(DeliveryOutcome::Delivered {
            channel: "log".into(),
        })
    }
}

/// One-line human summary of a game, e.g.
/// `mega_6_45: 03 11 22 29 34 45 (latest 2025-11-07, prev 2/6)`.
pub fn summary_line(game: &GameRun) -> String {
    let numbers = game
        .outcome
        .ranking
        .numbers
        .iter()
        .map(|n| format!("{n:02}"))
        .collect::<Vec<_>>()
        .join(" ");

    let latest = game
        .dataset
        .latest()
        .map(|r| r.date().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "none".into());

    match &game.metadata.previous {
        Some(check) => format!(
            "{}: {numbers} (latest {latest}, prev {}/{DRAW_SIZE})",
            game.name, check.matched
        ),
        None => format!("{}: {numbers} (latest {latest})", game.name),
    }
}
