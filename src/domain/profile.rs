use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::Season;

/// Customer archetype derived from the cleaned usage series.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProfileType {
    Baseline,
    HighUser,
    Variable,
    Seasonal,
    InsufficientData,
}

/// Descriptive statistics over the cleaned series. Recomputed on every
/// analysis call, never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStatistics {
    pub min_kwh: f64,
    pub max_kwh: f64,
    pub mean_kwh: f64,
    pub median_kwh: f64,
    pub std_dev_kwh: f64,
    pub coefficient_of_variation: f64,
    /// Mean monthly usage annualized to a 12-month figure.
    pub total_annual_kwh: f64,
}

impl UsageStatistics {
    pub fn empty() -> Self {
        Self {
            min_kwh: 0.0,
            max_kwh: 0.0,
            mean_kwh: 0.0,
            median_kwh: 0.0,
            std_dev_kwh: 0.0,
            coefficient_of_variation: 0.0,
            total_annual_kwh: 0.0,
        }
    }
}

/// Completeness of the observed series between its first and last month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityMetrics {
    /// Months in the full first..last calendar range.
    pub total_months: usize,
    pub missing_months: usize,
    pub has_gaps: bool,
    pub completeness_pct: f64,
    /// Completeness penalized by zero-usage months, clamped to [0, 1].
    pub quality_score: f64,
}

/// Months flagged by the 1.5x IQR fence. Flag-only: outliers are reported
/// but stay in the series so real consumption is never silently altered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierDetection {
    pub has_outliers: bool,
    pub outlier_months: Vec<NaiveDate>,
    pub outlier_values: Vec<f64>,
    pub method: String,
}

/// Per-season aggregate used by seasonality detection and projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonPattern {
    pub season: Season,
    pub avg_kwh: f64,
    pub peak_month: NaiveDate,
    pub peak_kwh: f64,
    /// Within-season coefficient of variation, as a percentage.
    pub variation_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalAnalysis {
    pub has_seasonal_pattern: bool,
    pub dominant_season: Option<Season>,
    pub patterns: Vec<SeasonPattern>,
    pub summer_to_winter_ratio: f64,
    pub peak_to_avg_ratio: f64,
    pub confidence_score: f64,
}

impl SeasonalAnalysis {
    /// The "nothing detectable" result used below the minimum history bar.
    pub fn none() -> Self {
        Self {
            has_seasonal_pattern: false,
            dominant_season: None,
            patterns: Vec::new(),
            summer_to_winter_ratio: 1.0,
            peak_to_avg_ratio: 1.0,
            confidence_score: 0.0,
        }
    }
}

/// Peak/off-peak skew of the observed months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakOffPeakAnalysis {
    pub peak_month: Option<NaiveDate>,
    pub peak_kwh: f64,
    pub low_month: Option<NaiveDate>,
    pub low_kwh: f64,
    pub peak_to_avg_ratio: f64,
    /// Share of annual usage carried by the three heaviest months.
    pub top_quarter_share_pct: f64,
}

/// How the 12-month forward numbers were produced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectionMethod {
    SeasonalAverage,
    LinearTrend,
    MovingAverage,
    SimpleAverage,
    InsufficientDataAverage,
}

/// 12-month forward projection with a 95% confidence band.
///
/// `projected_monthly_kwh`, `confidence_lower` and `confidence_upper` always
/// hold exactly 12 entries, one per forward month starting the month after
/// the last observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageProjection {
    pub projected_monthly_kwh: Vec<f64>,
    pub projected_annual_kwh: f64,
    pub confidence_lower: Vec<f64>,
    pub confidence_upper: Vec<f64>,
    pub confidence_score: f64,
    pub method: ProjectionMethod,
    pub assumptions: Vec<String>,
}

/// The aggregate analysis result: one customer's usage, characterized.
///
/// Built fresh per call, immutable afterwards, owned by the caller. The core
/// keeps no cached instance; recomputation is always correct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageProfile {
    pub user_id: Option<Uuid>,
    pub profile_type: ProfileType,
    pub statistics: UsageStatistics,
    pub seasonal_analysis: SeasonalAnalysis,
    pub peak_offpeak: PeakOffPeakAnalysis,
    pub outliers: OutlierDetection,
    pub data_quality: DataQualityMetrics,
    pub projection: UsageProjection,
    pub overall_confidence: f64,
    pub warnings: Vec<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

impl UsageProfile {
    /// Whether downstream consumers should treat the analysis as solid
    /// rather than hedged.
    pub fn is_reliable(&self) -> bool {
        self.profile_type != ProfileType::InsufficientData && self.overall_confidence >= 0.5
    }
}
