// src/ingest/mod.rs
pub mod config;
pub mod dates;
pub mod fetch;
pub mod merge;
pub mod normalize;
pub mod numbers;
pub mod orchestrator;
pub mod providers;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

pub use orchestrator::{AcquisitionMode, AcquisitionReport, FetchOrchestrator, SourceOutcome, SourceState};

/// One-time metrics registration (so series show up in the exposition).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_fetch_attempts_total",
            "HTTP attempts made against sources, retries included."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Sources skipped after retrieval failure, timeout or zero valid records."
        );
        describe_counter!(
            "ingest_candidates_total",
            "Candidate rows produced by source adapters."
        );
        describe_counter!(
            "ingest_rejected_total",
            "Candidate rows dropped by validation, by reason."
        );
        describe_counter!("ingest_kept_total", "Draw records kept after merge.");
        describe_counter!("ingest_dedup_total", "Duplicate draw records removed by merge.");
        describe_histogram!("ingest_parse_ms", "Adapter parse time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when the acquisition pipeline last ran."
        );
        describe_counter!(
            "ranking_degraded_total",
            "Rankings produced without window data or classifier signal."
        );
    });
}

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</?(p|div|tr|li|h[1-6]|table|tbody|ul|ol|section|article)\b[^>]*>")
        .unwrap()
});
static RE_SCRIPTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)\b.*?</(script|style)>").unwrap());

/// Normalize a fragment of page text: decode entities, strip tags, fold quotes and whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) Strip tags, then decode entities (decoded `&lt;` must survive as text)
    let out = RE_TAGS.replace_all(s, " ");
    let out = html_escape::decode_html_entities(&out).to_string();

    // 2) Normalize “ ” ‘ ’ « » to ASCII quotes
    let out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 3) Collapse whitespace (NBSP included)
    RE_WS.replace_all(&out, " ").trim().to_string()
}

/// Split a document into normalized, non-empty text lines, treating block-level
/// tags as line breaks.
pub fn text_lines(doc: &str) -> Vec<String> {
    let without_scripts = RE_SCRIPTS.replace_all(doc, " ");
    let broken = RE_BLOCK.replace_all(&without_scripts, "\n");
    broken
        .lines()
        .map(normalize_text)
        .filter(|l| !l.is_empty())
        .collect()
}
