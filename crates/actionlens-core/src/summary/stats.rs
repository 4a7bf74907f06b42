use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Five-number summary of durations in seconds.
///
/// Every field is `None` for an empty input. Zero is a real duration, so
/// absence is never encoded as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationStat {
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub p80: Option<f64>,
    pub p90: Option<f64>,
    pub max: Option<f64>,
}

impl DurationStat {
    pub fn from_secs(durations: &[f64]) -> Self {
        if durations.is_empty() {
            return Self::default();
        }

        let mut sorted = durations.to_vec();
        sorted.sort_by(|a, b| cmp_f64(*a, *b));

        Self {
            min: sorted.first().copied(),
            median: quantile_sorted(&sorted, 0.5),
            p80: quantile_sorted(&sorted, 0.8),
            p90: quantile_sorted(&sorted, 0.9),
            max: sorted.last().copied(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.median.is_none()
    }
}

pub(crate) fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Quantile of an ascending slice.
///
/// `idx = n * p`; a fractional index takes `x[ceil(idx) - 1]`, an integral one
/// averages `x[idx - 1]` and `x[idx]` for even `n` and takes `x[idx]` for odd `n`.
fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let len = sorted.len();
    if len == 0 || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if p == 1.0 {
        return sorted.last().copied();
    }
    if p == 0.0 {
        return sorted.first().copied();
    }

    let idx = len as f64 * p;
    if idx.fract() != 0.0 {
        let i = (idx.ceil() as usize).saturating_sub(1).min(len - 1);
        return Some(sorted[i]);
    }

    let i = idx as usize;
    if len % 2 == 0 {
        Some((sorted[i - 1] + sorted[i]) / 2.0)
    } else {
        Some(sorted[i])
    }
}
