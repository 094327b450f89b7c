// src/ingest/providers/table.rs
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::{ball_tokens, element_text, pick_number_cell, NumberCell};
use crate::ingest::dates::normalize_date;
use crate::ingest::types::{CandidateRecord, RawDocument, SourceAdapter};

static RE_HAS_TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<table\b.*?<td\b").unwrap());

/// Tabular result pages (one `<tr>` per draw: date cell, number cell(s), extras).
pub struct TableAdapter;

impl SourceAdapter for TableAdapter {
    fn name(&self) -> &'static str {
        "table"
    }

    fn can_parse(&self, doc: &RawDocument) -> bool {
        RE_HAS_TABLE.is_match(&doc.text)
    }

    fn parse(&self, doc: &RawDocument) -> Vec<CandidateRecord> {
        let html = Html::parse_document(&doc.text);
        let (Ok(row_sel), Ok(cell_sel)) = (Selector::parse("table tr"), Selector::parse("td"))
        else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for tr in html.select(&row_sel) {
            let cells: Vec<_> = tr.select(&cell_sel).collect();
            if cells.len() < 2 {
                continue;
            }

            let texts: Vec<String> = cells.iter().map(|c| element_text(*c)).collect();
            let date_idx = texts.iter().position(|t| normalize_date(t).is_ok());

            let mut numbers = ball_tokens(tr);
            if numbers.is_empty() {
                let rest = texts
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| Some(*i) != date_idx)
                    .map(|(_, t)| t.as_str());
                numbers = match pick_number_cell(rest) {
                    NumberCell::Found(n) => n,
                    NumberCell::Missing => continue, // header or spacer row
                    NumberCell::Ambiguous => {
                        // handed on empty so the row is tallied as rejected
                        tracing::debug!(source = %doc.source, row = %texts.join(" | "), "ambiguous number cells");
                        Vec::new()
                    }
                };
            }

            let date = match date_idx {
                Some(i) => texts[i].clone(),
                None => texts[0].clone(),
            };
            out.push(CandidateRecord {
                date,
                numbers,
                source: doc.source.clone(),
            });
        }
        out
    }
}
