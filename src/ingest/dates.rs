// src/ingest/dates.rs
//! Date normalizer: heterogeneous textual draw dates → `NaiveDate` (ISO `YYYY-MM-DD`).
//!
//! Order of attempts:
//! 1) year-first `2025-11-05`, `2025/11/05`, `2025.11.05` (canonical input is returned unchanged)
//! 2) day-first `05/11/2025`, `5-11-25`, `05.11.2025`; month-first only when day-first is impossible
//! 3) English month names `5 November 2025`, `Nov 5, 2025`
//! 4) permissive day-first: three numeric groups separated by arbitrary words
//!    (`ngày 05 tháng 11 năm 2025`)
//!
//! Leading weekday tokens (`Thứ 4,`, `T4`, `Wed,`) need no special casing: patterns are
//! searched, not anchored.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("empty date text")]
    Empty,
    #[error("no recognizable date in {0:?}")]
    Unrecognized(String),
}

static RE_YMD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})\b").unwrap());
static RE_DMY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})\b").unwrap());
static RE_D_MON_Y: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\s+([A-Za-z]{3,9})\.?,?\s+(\d{4})\b").unwrap());
static RE_MON_D_Y: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})\b").unwrap());
static RE_LOOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\D{1,12}?(\d{1,2})\D{1,12}?(\d{4})\b").unwrap());

/// Normalize free-form date text. Never panics; unparseable input is a typed failure.
pub fn normalize_date(text: &str) -> Result<NaiveDate, DateError> {
    let t = text.trim();
    if t.is_empty() {
        return Err(DateError::Empty);
    }

    if let Some(c) = RE_YMD.captures(t) {
        if let Some(d) = ymd(num(&c[1]), num(&c[2]), num(&c[3])) {
            return Ok(d);
        }
    }

    if let Some(c) = RE_DMY.captures(t) {
        let (a, b) = (num(&c[1]), num(&c[2]));
        let y = expand_year(&c[3]);
        if let Some(d) = ymd(y, b, a).or_else(|| ymd(y, a, b)) {
            return Ok(d);
        }
    }

    if let Some(c) = RE_D_MON_Y.captures(t) {
        if let Some(m) = month_from_name(&c[2]) {
            if let Some(d) = ymd(num(&c[3]), m, num(&c[1])) {
                return Ok(d);
            }
        }
    }

    if let Some(c) = RE_MON_D_Y.captures(t) {
        if let Some(m) = month_from_name(&c[1]) {
            if let Some(d) = ymd(num(&c[3]), m, num(&c[2])) {
                return Ok(d);
            }
        }
    }

    if let Some(c) = RE_LOOSE.captures(t) {
        if let Some(d) = ymd(num(&c[3]), num(&c[2]), num(&c[1])) {
            return Ok(d);
        }
    }

    Err(DateError::Unrecognized(t.chars().take(64).collect()))
}

/// Same as [`normalize_date`] but rendered as the canonical `YYYY-MM-DD` string.
pub fn normalize_date_str(text: &str) -> Result<String, DateError> {
    normalize_date(text).map(|d| d.format("%Y-%m-%d").to_string())
}

fn num(s: &str) -> i64 {
    // Captures are 1–4 ASCII digits, always in range.
    s.parse().unwrap_or(0)
}

fn expand_year(s: &str) -> i64 {
    let y = num(s);
    if s.len() == 2 {
        2000 + y
    } else {
        y
    }
}

fn ymd(y: i64, m: i64, d: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        i32::try_from(y).ok()?,
        u32::try_from(m).ok()?,
        u32::try_from(d).ok()?,
    )
}

fn month_from_name(name: &str) -> Option<i64> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = name.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| lower.starts_with(m))
        .map(|i| i as i64 + 1)
}
