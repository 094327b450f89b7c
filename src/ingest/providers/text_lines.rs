// src/ingest/providers/text_lines.rs
use crate::draw::DRAW_SIZE;
use crate::ingest::dates::normalize_date;
use crate::ingest::numbers::scan_tokens;
use crate::ingest::text_lines;
use crate::ingest::types::{CandidateRecord, RawDocument, SourceAdapter};

/// Fallback for plain-text pages and markup no other adapter recognizes:
/// one candidate per line that carries a date and enough numeric tokens.
pub struct TextLineAdapter;

impl SourceAdapter for TextLineAdapter {
    fn name(&self) -> &'static str {
        "text_lines"
    }

    fn can_parse(&self, _doc: &RawDocument) -> bool {
        true
    }

    fn parse(&self, doc: &RawDocument) -> Vec<CandidateRecord> {
        text_lines(&doc.text)
            .into_iter()
            .filter(|line| normalize_date(line).is_ok())
            .filter_map(|line| {
                let numbers = scan_tokens(&line);
                (numbers.len() >= DRAW_SIZE).then(|| CandidateRecord {
                    date: line,
                    numbers,
                    source: doc.source.clone(),
                })
            })
            .collect()
    }
}
