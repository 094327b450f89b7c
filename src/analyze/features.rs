//! Per-number feature rows handed to the external classifier.
//!
//! Row for number `n`: `[count_self, count_companion, share_self, share_companion]`
//! where shares are counts divided by `window_used * DRAW_SIZE`. The companion is the other
//! game's history over the same window; numbers it cannot draw simply count zero.

use serde::Serialize;

use crate::analyze::frequency::build_frequency;
use crate::draw::{Dataset, DRAW_SIZE};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMatrix {
    pub domain_max: u8,
    /// Draws of the primary game actually covered.
    pub window: usize,
    /// `rows[n - 1]` belongs to number `n`.
    pub rows: Vec<[f64; 4]>,
}

impl FeatureMatrix {
    pub fn row(&self, n: u8) -> Option<&[f64; 4]> {
        usize::from(n).checked_sub(1).and_then(|i| self.rows.get(i))
    }
}

pub fn build_feature_matrix(
    primary: &Dataset,
    companion: Option<&Dataset>,
    window: usize,
    domain_max: u8,
) -> FeatureMatrix {
    let own = build_frequency(primary, window, domain_max);
    let other = companion.map(|c| build_frequency(c, window, domain_max));
    let used = own.window_used();
    let denom = (used.max(1) * DRAW_SIZE) as f64;

    let rows = own
        .iter()
        .map(|(n, c)| {
            let oc = other.as_ref().map_or(0, |t| t.count(n));
            [f64::from(c), f64::from(oc), f64::from(c) / denom, f64::from(oc) / denom]
        })
        .collect();

    FeatureMatrix {
        domain_max,
        window: used,
        rows,
    }
}
