// src/ingest/numbers.rs
//! Number extractor: pulls the draw numbers out of free text.
//!
//! Policy is precision over recall. Tokens of one or two digits are scanned, filtered to
//! `[1, domain_max]`, and the *last* `count` of them are taken: in a result row the
//! draw numbers trail the date and draw id. Fewer than `count` usable tokens is a failure,
//! never a padded draw.
//!
//! The last-N rule silently picks up stray digits when a source changes its markup, so
//! adapters should hand over anchored text (ball elements) wherever the page has it.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("found {found} usable numbers, need {needed}")]
    InsufficientNumbers { found: usize, needed: usize },
    #[error("number {0} repeated among the selected tokens")]
    Duplicate(u32),
}

static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,2}\b").unwrap());

/// All one- or two-digit tokens in `text`, in order of appearance.
pub fn scan_tokens(text: &str) -> Vec<String> {
    RE_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Extract `count` draw numbers from `text`: sorted ascending, distinct, within `[1, domain_max]`.
pub fn extract_numbers(text: &str, count: usize, domain_max: u8) -> Result<Vec<u32>, ExtractError> {
    let usable: Vec<u32> = RE_TOKEN
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .filter(|&n| (1..=u32::from(domain_max)).contains(&n))
        .collect();

    if usable.len() < count {
        return Err(ExtractError::InsufficientNumbers {
            found: usable.len(),
            needed: count,
        });
    }

    let mut picked = usable[usable.len() - count..].to_vec();
    picked.sort_unstable();
    if let Some(w) = picked.windows(2).find(|w| w[0] == w[1]) {
        return Err(ExtractError::Duplicate(w[0]));
    }
    Ok(picked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_trailing_tokens_sorted() {
        let out = extract_numbers("Thứ 4, 05/11/2025 — 03 11 22 29 34 45", 6, 45).unwrap();
        assert_eq!(out, vec![3, 11, 22, 29, 34, 45]);
    }

    #[test]
    fn filters_out_of_domain_and_long_tokens() {
        // 2025 is four digits, 50 and 00 are outside [1, 45]
        let out = extract_numbers("#01234 2025 50 00 45 44 01 02 03 04", 6, 45).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 44, 45]);
    }

    #[test]
    fn refuses_to_pad_short_rows() {
        assert_eq!(
            extract_numbers("01 02 03 04 05", 6, 45),
            Err(ExtractError::InsufficientNumbers {
                found: 5,
                needed: 6
            })
        );
    }

    #[test]
    fn duplicates_are_rejected() {
        assert_eq!(
            extract_numbers("01 02 03 04 05 05", 6, 55),
            Err(ExtractError::Duplicate(5))
        );
    }

    #[test]
    fn scan_keeps_order() {
        assert_eq!(scan_tokens("a 7, b 08 c 123"), vec!["7", "08"]);
    }
}
