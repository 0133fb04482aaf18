//! Seasonality detection over a monthly usage series.
//!
//! Months are grouped into the four meteorological seasons; a pattern is
//! declared when the summer/winter mean ratio clears a configured threshold
//! in either direction (cooling-heavy or heating-heavy homes).

use itertools::Itertools;
use tracing::debug;

use crate::config::ProfileConfig;
use crate::domain::{MonthlyUsage, Season, SeasonPattern, SeasonalAnalysis};
use crate::profile::statistics::sample_std_dev;

/// Detect per-season structure in the (cleaned, sorted) series.
///
/// Below the minimum month count the call reports "no pattern" at zero
/// confidence rather than guessing from a partial year.
pub fn detect_seasonality(usage: &[MonthlyUsage], config: &ProfileConfig) -> SeasonalAnalysis {
    if usage.len() < config.seasonal_min_months {
        return SeasonalAnalysis::none();
    }

    let by_season = usage.iter().map(|u| (u.season(), u)).into_group_map();

    let mut patterns = Vec::new();
    for season in Season::ALL {
        let Some(members) = by_season.get(&season) else {
            continue;
        };
        let values: Vec<f64> = members.iter().map(|u| u.kwh()).collect();
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        let Some(peak) = members.iter().max_by(|a, b| a.kwh().total_cmp(&b.kwh())) else {
            continue;
        };
        let std_dev = sample_std_dev(&values, avg);
        let variation_pct = if avg > 0.0 { std_dev / avg * 100.0 } else { 0.0 };

        patterns.push(SeasonPattern {
            season,
            avg_kwh: avg,
            peak_month: peak.month(),
            peak_kwh: peak.kwh(),
            variation_pct,
        });
    }

    let season_avg = |s: Season| patterns.iter().find(|p| p.season == s).map(|p| p.avg_kwh);

    let summer_to_winter_ratio = match (season_avg(Season::Summer), season_avg(Season::Winter)) {
        (Some(summer), Some(winter)) if winter > 0.0 => summer / winter,
        // Either season unobserved (or an all-zero winter): nothing to compare.
        _ => 1.0,
    };

    let threshold = config.seasonal_ratio_threshold;
    let has_seasonal_pattern =
        summer_to_winter_ratio >= threshold || summer_to_winter_ratio <= 1.0 / threshold;

    let dominant_season = patterns
        .iter()
        .max_by(|a, b| a.avg_kwh.total_cmp(&b.avg_kwh))
        .map(|p| p.season);

    let overall_mean = usage.iter().map(|u| u.kwh()).sum::<f64>() / usage.len() as f64;
    let peak_kwh = usage
        .iter()
        .map(|u| u.kwh())
        .fold(0.0_f64, f64::max);
    let peak_to_avg_ratio = if overall_mean > 0.0 { peak_kwh / overall_mean } else { 1.0 };

    // Completeness beats pattern purity: a confident "no pattern" from a full
    // year is worth more than a noisy "pattern" from a fragment.
    let completeness = (usage.len() as f64 / 12.0).min(1.0);
    let mean_within_cv = if patterns.is_empty() {
        0.0
    } else {
        patterns.iter().map(|p| p.variation_pct / 100.0).sum::<f64>() / patterns.len() as f64
    };
    let confidence_score =
        (0.6 * completeness + 0.4 * (1.0 - mean_within_cv).max(0.0)).clamp(0.0, 1.0);

    debug!(
        months = usage.len(),
        ratio = summer_to_winter_ratio,
        seasonal = has_seasonal_pattern,
        confidence = confidence_score,
        "seasonality detection complete"
    );

    SeasonalAnalysis {
        has_seasonal_pattern,
        dominant_season,
        patterns,
        summer_to_winter_ratio,
        peak_to_avg_ratio,
        confidence_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn year_of_usage(kwh_by_month: [f64; 12]) -> Vec<MonthlyUsage> {
        kwh_by_month
            .iter()
            .enumerate()
            .map(|(i, &kwh)| {
                MonthlyUsage::new(
                    NaiveDate::from_ymd_opt(2024, i as u32 + 1, 1).unwrap(),
                    kwh,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_summer_heavy_year_is_seasonal() {
        // Jan..Dec: winter 800, spring 900, summer 1200, fall 900.
        let usage = year_of_usage([
            800.0, 800.0, 900.0, 900.0, 900.0, 1200.0, 1200.0, 1200.0, 900.0, 900.0, 900.0, 800.0,
        ]);
        let analysis = detect_seasonality(&usage, &ProfileConfig::default());

        assert!(analysis.has_seasonal_pattern);
        assert_eq!(analysis.dominant_season, Some(Season::Summer));
        assert!((analysis.summer_to_winter_ratio - 1.5).abs() < 1e-9);
        assert!(analysis.confidence_score >= 0.5);
    }

    #[test]
    fn test_winter_heavy_year_is_seasonal_via_inverse_ratio() {
        let usage = year_of_usage([
            1400.0, 1400.0, 900.0, 900.0, 900.0, 900.0, 900.0, 900.0, 900.0, 900.0, 900.0, 1400.0,
        ]);
        let analysis = detect_seasonality(&usage, &ProfileConfig::default());

        assert!(analysis.has_seasonal_pattern);
        assert_eq!(analysis.dominant_season, Some(Season::Winter));
        assert!(analysis.summer_to_winter_ratio < 1.0 / 1.35);
    }

    #[test]
    fn test_flat_year_has_no_pattern() {
        let usage = year_of_usage([800.0; 12]);
        let analysis = detect_seasonality(&usage, &ProfileConfig::default());

        assert!(!analysis.has_seasonal_pattern);
        assert!((analysis.summer_to_winter_ratio - 1.0).abs() < 1e-9);
        // full year of perfectly regular data: maximum confidence
        assert!((analysis.confidence_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_history_short_circuits() {
        let usage = year_of_usage([800.0; 12])[..5].to_vec();
        let analysis = detect_seasonality(&usage, &ProfileConfig::default());

        assert!(!analysis.has_seasonal_pattern);
        assert_eq!(analysis.confidence_score, 0.0);
        assert!(analysis.patterns.is_empty());
    }

    #[test]
    fn test_patterns_follow_fixed_season_order() {
        let usage = year_of_usage([
            800.0, 800.0, 900.0, 900.0, 900.0, 1200.0, 1200.0, 1200.0, 900.0, 900.0, 900.0, 800.0,
        ]);
        let analysis = detect_seasonality(&usage, &ProfileConfig::default());
        let order: Vec<Season> = analysis.patterns.iter().map(|p| p.season).collect();
        assert_eq!(order, vec![Season::Winter, Season::Spring, Season::Summer, Season::Fall]);
    }
}
