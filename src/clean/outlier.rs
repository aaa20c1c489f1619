//! Per-utility percentile outlier filter for meter readings.
//!
//! Utilities have very different usage distributions (electricity vs. steam vs.
//! chilled water), so the cutoff is computed per utility when the utility column
//! is present.

use std::collections::HashMap;

use crate::domain::MeterTable;

/// Outcome of an outlier pass (for logging and tests).
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub removed: usize,
    pub per_utility: bool,
    /// Threshold per utility (`None` key for the global threshold).
    pub thresholds: HashMap<Option<String>, f64>,
}

/// Drop readings above the `percentile` of their utility's values.
///
/// Rows without a utility value have no threshold and are removed when the
/// filter runs per utility.
pub fn drop_outliers(meter: &mut MeterTable, percentile: f64) -> OutlierReport {
    let per_utility = meter.has_column("utility");
    let before = meter.readings.len();

    let mut thresholds: HashMap<Option<String>, f64> = HashMap::new();
    if per_utility {
        let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();
        for r in &meter.readings {
            if let Some(u) = r.utility.as_deref() {
                groups.entry(u).or_default().push(r.reading_value);
            }
        }
        for (utility, mut values) in groups {
            if let Some(t) = quantile(&mut values, percentile) {
                thresholds.insert(Some(utility.to_string()), t);
            }
        }
        meter.readings.retain(|r| {
            r.utility
                .as_ref()
                .and_then(|u| thresholds.get(&Some(u.clone())))
                .is_some_and(|&t| r.reading_value <= t)
        });
    } else {
        let mut values: Vec<f64> = meter.readings.iter().map(|r| r.reading_value).collect();
        if let Some(t) = quantile(&mut values, percentile) {
            thresholds.insert(None, t);
            meter.readings.retain(|r| r.reading_value <= t);
        }
    }

    let removed = before - meter.readings.len();
    log::info!(
        "Outlier filter ({}, p{percentile}): removed {removed} rows",
        if per_utility { "per utility" } else { "global" }
    );

    OutlierReport {
        removed,
        per_utility,
        thresholds,
    }
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &mut [f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q = q.clamp(0.0, 1.0);
    let pos = q * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(values[lo] + (values[hi] - values[lo]) * frac)
}
