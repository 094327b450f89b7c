//! # Store
//! On-disk artifacts of a run: the per-game dataset snapshot (CSV) and the prediction
//! artifact (JSON). Every write replaces the whole file through a temp file + rename,
//! so a reader never sees a half-written snapshot.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::draw::{Dataset, DrawRecord, DRAW_SIZE};
use crate::ingest::merge::merge;

pub const DATASET_HEADER: &str = "date,n1,n2,n3,n4,n5,n6";
pub const SNAPSHOT_SOURCE: &str = "snapshot";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Render a dataset as CSV, newest first.
pub fn dataset_to_csv(dataset: &Dataset) -> String {
    let mut out = String::with_capacity(24 * (dataset.len() + 1));
    out.push_str(DATASET_HEADER);
    out.push('\n');
    for rec in dataset {
        let _ = write!(out, "{}", rec.date().format("%Y-%m-%d"));
        for n in rec.numbers() {
            let _ = write!(out, ",{n}");
        }
        out.push('\n');
    }
    out
}

/// Write the snapshot, replacing any previous one. Returns the SHA-256 of the bytes written.
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<String, StoreError> {
    let csv = dataset_to_csv(dataset);
    write_atomic(path, csv.as_bytes())?;
    Ok(sha256_hex(csv.as_bytes()))
}

/// Read a snapshot back, validating every row with the same rules as fresh records.
pub fn read_dataset(path: &Path, domain_max: u8) -> Result<Dataset, StoreError> {
    let content = fs::read_to_string(path).map_err(io_err(path))?;
    let malformed = |line: usize, reason: String| StoreError::Malformed {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut lines = content.lines().enumerate();
    match lines.next() {
        Some((_, h)) if h.trim() == DATASET_HEADER => {}
        _ => return Err(malformed(1, format!("expected header {DATASET_HEADER:?}"))),
    }

    let mut records = Vec::new();
    for (i, line) in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split(',').map(str::trim).collect();
        if cols.len() != DRAW_SIZE + 1 {
            return Err(malformed(i + 1, format!("{} columns", cols.len())));
        }
        let date = NaiveDate::parse_from_str(cols[0], "%Y-%m-%d")
            .map_err(|e| malformed(i + 1, format!("date {:?}: {e}", cols[0])))?;
        let numbers = cols[1..]
            .iter()
            .map(|c| c.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| malformed(i + 1, e.to_string()))?;
        let rec = DrawRecord::new(date, &numbers, domain_max, SNAPSHOT_SOURCE)
            .map_err(|e| malformed(i + 1, e.to_string()))?;
        records.push(rec);
    }

    Ok(merge(vec![records], usize::MAX).0)
}

/// Rankings of a stored prediction artifact; other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredRankings {
    pub ranking_primary: Vec<u8>,
    pub ranking_secondary: Vec<u8>,
}

/// Read the previous artifact. A missing file is `Ok(None)`.
pub fn read_previous_rankings(path: &Path) -> Result<Option<StoredRankings>, StoreError> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(serde_json::from_str(&s)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path)(e)),
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &bytes)
}

pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err(dir))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(io_err(&tmp))?;
    fs::rename(&tmp, path).map_err(io_err(path))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let recs = vec![
            DrawRecord::new(NaiveDate::from_ymd_opt(2025, 11, 5).unwrap(), &[3, 11, 22, 29, 34, 45], 45, "a").unwrap(),
            DrawRecord::new(NaiveDate::from_ymd_opt(2025, 11, 7).unwrap(), &[1, 2, 3, 4, 5, 6], 45, "b").unwrap(),
        ];
        merge(vec![recs], 10).0
    }

    #[test]
    fn csv_layout_is_newest_first() {
        assert_eq!(
            dataset_to_csv(&sample()),
            "date,n1,n2,n3,n4,n5,n6\n2025-11-07,1,2,3,4,5,6\n2025-11-05,3,11,22,29,34,45\n"
        );
    }

    #[test]
    fn snapshot_reads_back_and_hash_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("nested").join("mega.csv");
        let h1 = write_dataset(&p, &sample()).unwrap();
        let back = read_dataset(&p, 45).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.records()[0].source(), SNAPSHOT_SOURCE);
        assert_eq!(write_dataset(&p, &back).unwrap(), h1);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn malformed_snapshot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("bad.csv");
        fs::write(&p, "date,n1,n2,n3,n4,n5,n6\n2025-11-07,1,2,3,4,5,99\n").unwrap();
        assert!(matches!(
            read_dataset(&p, 45),
            Err(StoreError::Malformed { line: 2, .. })
        ));
        fs::write(&p, "oops\n").unwrap();
        assert!(read_dataset(&p, 45).is_err());
    }

    #[test]
    fn previous_rankings_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_previous_rankings(&dir.path().join("x.json")).unwrap(), None);
        let p = dir.path().join("last.json");
        fs::write(
            &p,
            r#"{"timestamp":"x","ranking_primary":[1,2,3,4,5,6],"ranking_secondary":[7,8,9,10,11,12],"signal_metadata":{}}"#,
        )
        .unwrap();
        let r = read_previous_rankings(&p).unwrap().unwrap();
        assert_eq!(r.ranking_secondary, vec![7, 8, 9, 10, 11, 12]);
    }
}
