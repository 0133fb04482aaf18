//! Descriptive statistics, completeness and outlier detection over a
//! monthly usage series.
//!
//! Outliers are flagged, never removed: silently altering real consumption
//! data would corrupt every downstream number. Callers that want them gone
//! exclude the flagged months upstream and re-run.

use itertools::Itertools;
use itertools::MinMaxResult;

use crate::domain::{
    next_month, DataQualityMetrics, MonthlyUsage, OutlierDetection, UsageStatistics,
};

const ZERO_MONTH_PENALTY: f64 = 0.3;
const IQR_FENCE_K: f64 = 1.5;

/// Fill calendar gaps between the first and last observed month.
///
/// A missing month takes the average of its nearest known neighbors; at the
/// edges of a degenerate series it falls back to the single neighbor or the
/// overall mean. Input must be sorted chronologically.
pub fn fill_gaps(usage: &[MonthlyUsage]) -> (Vec<MonthlyUsage>, DataQualityMetrics) {
    if usage.is_empty() {
        return (
            Vec::new(),
            DataQualityMetrics {
                total_months: 0,
                missing_months: 0,
                has_gaps: false,
                completeness_pct: 0.0,
                quality_score: 0.0,
            },
        );
    }

    let observed: Vec<(chrono::NaiveDate, f64)> =
        usage.iter().map(|u| (u.month(), u.kwh())).collect();
    let overall_mean = observed.iter().map(|(_, k)| k).sum::<f64>() / observed.len() as f64;

    let mut filled = Vec::new();
    let mut cursor = observed[0].0;
    let last = observed[observed.len() - 1].0;
    let mut idx = 0usize; // next observed entry at or after `cursor`

    while cursor <= last {
        if idx < observed.len() && observed[idx].0 == cursor {
            filled.push(MonthlyUsage::from_parts(cursor, observed[idx].1));
            idx += 1;
        } else {
            let prev = idx.checked_sub(1).map(|i| observed[i].1);
            let next = observed.get(idx).map(|&(_, k)| k);
            let value = match (prev, next) {
                (Some(p), Some(n)) => (p + n) / 2.0,
                (Some(p), None) => p,
                (None, Some(n)) => n,
                (None, None) => overall_mean,
            };
            filled.push(MonthlyUsage::from_parts(cursor, value));
        }
        cursor = next_month(cursor);
    }

    let total_months = filled.len();
    let missing_months = total_months - observed.len();
    let completeness_pct = observed.len() as f64 / total_months as f64 * 100.0;
    let zero_fraction =
        observed.iter().filter(|(_, k)| *k == 0.0).count() as f64 / observed.len() as f64;
    let quality_score =
        (completeness_pct / 100.0 - ZERO_MONTH_PENALTY * zero_fraction).clamp(0.0, 1.0);

    let metrics = DataQualityMetrics {
        total_months,
        missing_months,
        has_gaps: missing_months > 0,
        completeness_pct,
        quality_score,
    };

    (filled, metrics)
}

/// Tukey fence (k = 1.5) on the interquartile range of kWh values.
pub fn detect_outliers(usage: &[MonthlyUsage]) -> OutlierDetection {
    let mut sorted: Vec<f64> = usage.iter().map(|u| u.kwh()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    // Quartiles on fewer than 4 points say more about the sample than the
    // customer; report a clean slate.
    if sorted.len() < 4 {
        return OutlierDetection {
            has_outliers: false,
            outlier_months: Vec::new(),
            outlier_values: Vec::new(),
            method: "IQR".into(),
        };
    }

    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower_fence = q1 - IQR_FENCE_K * iqr;
    let upper_fence = q3 + IQR_FENCE_K * iqr;

    let mut outlier_months = Vec::new();
    let mut outlier_values = Vec::new();
    for u in usage {
        if u.kwh() < lower_fence || u.kwh() > upper_fence {
            outlier_months.push(u.month());
            outlier_values.push(u.kwh());
        }
    }

    OutlierDetection {
        has_outliers: !outlier_months.is_empty(),
        outlier_months,
        outlier_values,
        method: "IQR".into(),
    }
}

/// Min/max/mean/median, sample standard deviation, coefficient of variation
/// and the annualized total over a cleaned series.
pub fn compute_statistics(usage: &[MonthlyUsage]) -> UsageStatistics {
    if usage.is_empty() {
        return UsageStatistics::empty();
    }

    let values: Vec<f64> = usage.iter().map(|u| u.kwh()).collect();
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    let (min, max) = match values.iter().cloned().minmax() {
        MinMaxResult::NoElements => (0.0, 0.0),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };

    let mut sorted = values.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = percentile(&sorted, 0.5);

    let std_dev = sample_std_dev(&values, mean);
    let cv = if mean > 0.0 { std_dev / mean } else { 0.0 };

    UsageStatistics {
        min_kwh: min,
        max_kwh: max,
        mean_kwh: mean,
        median_kwh: median,
        std_dev_kwh: std_dev,
        coefficient_of_variation: cv,
        total_annual_kwh: mean * 12.0,
    }
}

/// Convenience wrapper running the full quality pass in pipeline order.
pub fn assess(usage: &[MonthlyUsage]) -> (UsageStatistics, DataQualityMetrics, OutlierDetection) {
    let (filled, quality) = fill_gaps(usage);
    let outliers = detect_outliers(&filled);
    let statistics = compute_statistics(&filled);
    (statistics, quality, outliers)
}

pub(crate) fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Linear-interpolation percentile over a pre-sorted slice, p in [0, 1].
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}
