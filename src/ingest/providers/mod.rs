// src/ingest/providers/mod.rs
//! Source adapters, one per structural family of result page.
//!
//! Dispatch is by capability, not by URL: the registry asks each adapter in order
//! whether it recognizes the document and keeps the first non-empty parse. Source
//! quirks live in selectors, not in forked code paths.

pub mod cards;
pub mod table;
pub mod text_lines;

use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::draw::DRAW_SIZE;
use crate::ingest::numbers::scan_tokens;
use crate::ingest::types::{CandidateRecord, RawDocument, SourceAdapter};

pub use cards::CardAdapter;
pub use table::TableAdapter;
pub use text_lines::TextLineAdapter;

/// Elements that hold exactly one drawn number on most result pages.
const BALL_SELECTOR: &str =
    ".ball, .bong, .number, .num, span[class*='ball'], li[class*='ball']";

/// Ball classes that mark the bonus number (Power 6/55), never one of the six.
const BONUS_MARKERS: [&str; 3] = ["special", "bonus", "extra"];

/// Draw ids (`#01432`), grouped amounts (`12.345.678.900`) and currency marks. A cell
/// matching any of these never holds the drawn numbers.
static RE_NOT_NUMBERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)#\s*\d|\d{1,3}(?:[.,]\d{3})+|\d\s*(?:đ|₫|vn[dđ]|\$)|\$\s*\d").unwrap()
});

/// Outcome of looking for the one cell that carries the draw numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NumberCell {
    /// No cell carries number tokens (header or spacer).
    Missing,
    Found(Vec<String>),
    /// More than one cell could be the draw; the row must not be guessed at.
    Ambiguous,
}

/// Pick the draw numbers from a row's non-date cells without balls to anchor on.
///
/// Amount and id cells are skipped. Exactly one cell with at least `DRAW_SIZE`
/// tokens wins; failing that, a lone token-bearing cell is handed on so a short
/// row is rejected downstream instead of silently vanishing.
pub(crate) fn pick_number_cell<'a>(cells: impl IntoIterator<Item = &'a str>) -> NumberCell {
    let mut usable: Vec<Vec<String>> = cells
        .into_iter()
        .filter(|t| !RE_NOT_NUMBERS.is_match(t))
        .map(scan_tokens)
        .filter(|toks| !toks.is_empty())
        .collect();

    let full = usable.iter().filter(|t| t.len() >= DRAW_SIZE).count();
    match (full, usable.len()) {
        (0, 0) => NumberCell::Missing,
        (0, 1) => NumberCell::Found(usable.remove(0)),
        (1, _) => {
            usable.retain(|t| t.len() >= DRAW_SIZE);
            NumberCell::Found(usable.remove(0))
        }
        _ => NumberCell::Ambiguous,
    }
}

/// Ordered adapter list; the last entry should accept anything.
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self {
            adapters: vec![
                Box::new(TableAdapter),
                Box::new(CardAdapter::default()),
                Box::new(TextLineAdapter),
            ],
        }
    }
}

impl AdapterRegistry {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    /// Run capable adapters in order; first non-empty result wins.
    /// Returns the winning adapter name (if any) and its candidates.
    pub fn parse(&self, doc: &RawDocument) -> (Option<&'static str>, Vec<CandidateRecord>) {
        let t0 = std::time::Instant::now();
        let mut result = (None, Vec::new());

        for a in self.adapters.iter().filter(|a| a.can_parse(doc)) {
            let out = a.parse(doc);
            if out.is_empty() {
                tracing::debug!(source = %doc.source, adapter = a.name(), "no matching structure");
                continue;
            }
            result = (Some(a.name()), out);
            break;
        }

        histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("ingest_candidates_total").increment(result.1.len() as u64);
        result
    }
}

/// Whitespace-collapsed text content of an element.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokens from explicit ball elements under `el`, bonus balls excluded.
/// Empty when the markup has no ball elements.
pub(crate) fn ball_tokens(el: ElementRef<'_>) -> Vec<String> {
    let Ok(sel) = Selector::parse(BALL_SELECTOR) else {
        return Vec::new();
    };
    el.select(&sel)
        .filter(|b| {
            let class = b.value().attr("class").unwrap_or_default().to_ascii_lowercase();
            !BONUS_MARKERS.iter().any(|m| class.contains(m))
        })
        // nested matches (span.ball inside li.ball) would double count
        .filter(|b| b.select(&sel).next().is_none())
        .flat_map(|b| scan_tokens(&element_text(b)))
        .collect()
}
