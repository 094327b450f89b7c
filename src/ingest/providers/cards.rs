// src/ingest/providers/cards.rs
use scraper::{ElementRef, Html, Selector};

use super::{ball_tokens, element_text, pick_number_cell, NumberCell};
use crate::ingest::types::{CandidateRecord, RawDocument, SourceAdapter};

/// Card/list result pages: one repeated element per draw.
///
/// Container selectors are tried in order and the first one with matches wins, so a
/// page that has both `[data-draw-date]` cards and a generic `li.draw` menu is read
/// from the more specific structure.
pub struct CardAdapter {
    containers: Vec<String>,
    date_fields: Vec<String>,
}

impl Default for CardAdapter {
    fn default() -> Self {
        Self {
            containers: [
                ".draw-card",
                ".result-card",
                "[data-draw-date]",
                "li.draw",
                "div.kqxs",
            ]
            .map(String::from)
            .to_vec(),
            date_fields: [".draw-date", ".date", "time"].map(String::from).to_vec(),
        }
    }
}

impl CardAdapter {
    /// Adapter for a source whose cards use other class names.
    pub fn with_selectors(containers: Vec<String>, date_fields: Vec<String>) -> Self {
        Self {
            containers,
            date_fields,
        }
    }

    fn cards<'a>(&self, html: &'a Html) -> Vec<ElementRef<'a>> {
        for c in &self.containers {
            let Ok(sel) = Selector::parse(c) else {
                tracing::warn!(selector = %c, "invalid card selector");
                continue;
            };
            let found: Vec<_> = html.select(&sel).collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Date text of a card: explicit attribute, then a date child, then nothing.
    fn card_date(&self, card: ElementRef<'_>) -> Option<String> {
        if let Some(v) = card.value().attr("data-draw-date") {
            return Some(v.trim().to_string());
        }
        if let Ok(sel) = Selector::parse("time[datetime]") {
            if let Some(t) = card.select(&sel).next() {
                return t.value().attr("datetime").map(|v| v.trim().to_string());
            }
        }
        self.date_fields.iter().find_map(|f| {
            let sel = Selector::parse(f).ok()?;
            card.select(&sel)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())
        })
    }
}

/// Text of each direct child of a card, element or bare text, in document order.
fn card_segments(card: ElementRef<'_>) -> Vec<String> {
    card.children()
        .filter_map(|child| match ElementRef::wrap(child) {
            Some(el) => Some(element_text(el)),
            None => child
                .value()
                .as_text()
                .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" ")),
        })
        .filter(|s| !s.is_empty())
        .collect()
}

impl SourceAdapter for CardAdapter {
    fn name(&self) -> &'static str {
        "cards"
    }

    fn can_parse(&self, doc: &RawDocument) -> bool {
        let html = Html::parse_document(&doc.text);
        !self.cards(&html).is_empty()
    }

    fn parse(&self, doc: &RawDocument) -> Vec<CandidateRecord> {
        let html = Html::parse_document(&doc.text);
        let mut out = Vec::new();

        for card in self.cards(&html) {
            let text = element_text(card);
            let date = self.card_date(card);

            let mut numbers = ball_tokens(card);
            if numbers.is_empty() {
                // Without balls, the card's direct children stand in for table cells;
                // the date child is left out so its day and month are not read as numbers.
                let segments = card_segments(card);
                let rest = segments
                    .iter()
                    .map(String::as_str)
                    .filter(|s| date.as_deref() != Some(*s));
                numbers = match pick_number_cell(rest) {
                    NumberCell::Found(n) => n,
                    NumberCell::Missing => continue,
                    NumberCell::Ambiguous => {
                        tracing::debug!(source = %doc.source, card = %text, "ambiguous number segments");
                        Vec::new()
                    }
                };
            }

            out.push(CandidateRecord {
                date: date.unwrap_or(text),
                numbers,
                source: doc.source.clone(),
            });
        }
        out
    }
}
