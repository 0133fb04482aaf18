//! Usage profile pipeline.
//!
//! The single entry point external callers use to turn a raw monthly series
//! into a [`UsageProfile`]. Stages run in a fixed linear order, each
//! consuming the previous stage's output:
//!
//! 1. Sort (and collapse duplicate months)
//! 2. Assess quality; short-circuit below the minimum history bar
//! 3. Fill calendar gaps
//! 4. Flag outliers (kept in the series)
//! 5. Descriptive statistics
//! 6. Seasonality detection
//! 7. Peak/off-peak skew
//! 8. Archetype classification
//! 9. 12-month projection
//! 10. Overall confidence and warnings
//!
//! Malformed-but-valid input never raises here; it degrades to lower
//! confidence and extra warnings. Only construction invariants (negative
//! kWh) fail, and those fail before this pipeline ever sees the data.

use tracing::debug;
use uuid::Uuid;

use crate::config::ProfileConfig;
use crate::domain::{
    MonthlyUsage, PeakOffPeakAnalysis, ProfileType, SeasonalAnalysis, UsageProfile,
    UsageStatistics,
};
use crate::profile::projection::{project, project_insufficient};
use crate::profile::seasonal::detect_seasonality;
use crate::profile::statistics::{compute_statistics, detect_outliers, fill_gaps};

const QUALITY_WEIGHT: f64 = 0.4;
const SEASONAL_WEIGHT: f64 = 0.3;
const PROJECTION_WEIGHT: f64 = 0.3;

pub struct ProfileBuilder {
    config: ProfileConfig,
}

impl ProfileBuilder {
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline over a customer's usage history.
    ///
    /// `regional_avg_kwh` is only consulted when history is too thin to
    /// analyze, as the projection fallback.
    pub fn analyze(
        &self,
        usage: &[MonthlyUsage],
        user_id: Option<Uuid>,
        regional_avg_kwh: Option<f64>,
    ) -> UsageProfile {
        let mut sorted: Vec<MonthlyUsage> = usage.to_vec();
        sorted.sort_by_key(MonthlyUsage::month);
        // Duplicate months collapse to the first reading.
        sorted.dedup_by(|a, b| a.month() == b.month());

        if sorted.len() < self.config.min_history_months {
            return self.insufficient_data_profile(&sorted, user_id, regional_avg_kwh);
        }

        let (filled, quality) = fill_gaps(&sorted);
        let outliers = detect_outliers(&filled);
        let statistics = compute_statistics(&filled);
        let seasonal = detect_seasonality(&filled, &self.config);
        let peak_offpeak = analyze_peak_offpeak(&filled);
        let profile_type = self.classify(&statistics, &seasonal);
        let projection = project(&filled, &seasonal, &self.config);

        let overall_confidence = (QUALITY_WEIGHT * quality.quality_score
            + SEASONAL_WEIGHT * seasonal.confidence_score
            + PROJECTION_WEIGHT * projection.confidence_score)
            .clamp(0.0, 1.0);

        let mut warnings = Vec::new();
        if quality.has_gaps {
            warnings.push(format!(
                "{} missing months were interpolated from neighboring readings",
                quality.missing_months
            ));
        }
        if outliers.has_outliers {
            warnings.push(format!(
                "{} months look like statistical outliers and were kept in the analysis",
                outliers.outlier_months.len()
            ));
        }
        if quality.quality_score < 0.5 {
            warnings.push("Data quality is low; every downstream figure inherits that uncertainty".into());
        }
        if sorted.len() < 12 {
            warnings.push(format!(
                "Only {} months of history; a full year may reveal seasonal effects",
                sorted.len()
            ));
        }
        if projection.confidence_score < 0.5 {
            warnings.push("Usage projection confidence is low".into());
        }

        debug!(
            profile_type = %profile_type,
            months = sorted.len(),
            confidence = overall_confidence,
            "usage analysis complete"
        );

        UsageProfile {
            user_id,
            profile_type,
            statistics,
            seasonal_analysis: seasonal,
            peak_offpeak,
            outliers,
            data_quality: quality,
            projection,
            overall_confidence,
            warnings,
            period_start: filled.first().map(MonthlyUsage::month),
            period_end: filled.last().map(MonthlyUsage::month),
        }
    }

    /// First match wins: seasonal beats volume, volume beats volatility.
    fn classify(&self, statistics: &UsageStatistics, seasonal: &SeasonalAnalysis) -> ProfileType {
        let cv = statistics.coefficient_of_variation;
        if seasonal.has_seasonal_pattern {
            ProfileType::Seasonal
        } else if statistics.mean_kwh > self.config.high_user_threshold_kwh
            && cv < self.config.variable_cv_threshold
        {
            ProfileType::HighUser
        } else if cv >= self.config.variable_cv_threshold {
            ProfileType::Variable
        } else {
            ProfileType::Baseline
        }
    }

    fn insufficient_data_profile(
        &self,
        sorted: &[MonthlyUsage],
        user_id: Option<Uuid>,
        regional_avg_kwh: Option<f64>,
    ) -> UsageProfile {
        let statistics = compute_statistics(sorted);
        let (_, quality) = fill_gaps(sorted);
        let outliers = detect_outliers(sorted);
        let peak_offpeak = analyze_peak_offpeak(sorted);

        let fallback = regional_avg_kwh.unwrap_or(statistics.mean_kwh);
        let projection = project_insufficient(fallback, sorted.len());

        let mut warnings = vec![format!(
            "Only {} months of usage history; at least {} are needed for a full analysis",
            sorted.len(),
            self.config.min_history_months
        )];
        if regional_avg_kwh.is_some() {
            warnings.push("Projection is based on the regional average, not observed usage".into());
        } else if !sorted.is_empty() {
            warnings.push("Projection repeats the observed average across the horizon".into());
        }

        let overall_confidence = (QUALITY_WEIGHT * quality.quality_score
            + PROJECTION_WEIGHT * projection.confidence_score)
            .clamp(0.0, 1.0)
            .min(0.49); // thin history is never a confident read

        debug!(months = sorted.len(), "insufficient history, emitting fallback profile");

        UsageProfile {
            user_id,
            profile_type: ProfileType::InsufficientData,
            statistics,
            seasonal_analysis: SeasonalAnalysis::none(),
            peak_offpeak,
            outliers,
            data_quality: quality,
            projection,
            overall_confidence,
            warnings,
            period_start: sorted.first().map(MonthlyUsage::month),
            period_end: sorted.last().map(MonthlyUsage::month),
        }
    }
}

/// Peak/off-peak skew of the observed months.
fn analyze_peak_offpeak(usage: &[MonthlyUsage]) -> PeakOffPeakAnalysis {
    if usage.is_empty() {
        return PeakOffPeakAnalysis {
            peak_month: None,
            peak_kwh: 0.0,
            low_month: None,
            low_kwh: 0.0,
            peak_to_avg_ratio: 1.0,
            top_quarter_share_pct: 0.0,
        };
    }

    let peak = usage.iter().max_by(|a, b| a.kwh().total_cmp(&b.kwh()));
    let low = usage.iter().min_by(|a, b| a.kwh().total_cmp(&b.kwh()));
    let total: f64 = usage.iter().map(|u| u.kwh()).sum();
    let mean = total / usage.len() as f64;

    let mut desc: Vec<f64> = usage.iter().map(|u| u.kwh()).collect();
    desc.sort_by(|a, b| b.total_cmp(a));
    let top3: f64 = desc.iter().take(3).sum();
    let top_quarter_share_pct = if total > 0.0 { top3 / total * 100.0 } else { 0.0 };

    PeakOffPeakAnalysis {
        peak_month: peak.map(MonthlyUsage::month),
        peak_kwh: peak.map(MonthlyUsage::kwh).unwrap_or(0.0),
        low_month: low.map(MonthlyUsage::month),
        low_kwh: low.map(MonthlyUsage::kwh).unwrap_or(0.0),
        peak_to_avg_ratio: if mean > 0.0 {
            peak.map(MonthlyUsage::kwh).unwrap_or(0.0) / mean
        } else {
            1.0
        },
        top_quarter_share_pct,
    }
}
