use anyhow::Result;
use chrono::NaiveDate;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

/// Tunable thresholds for the whole analysis pipeline.
///
/// Every constant a deployment might want to tune lives here; the algorithms
/// themselves take the config by reference and hold no other state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub profile: ProfileConfig,
    pub scoring: ScoringConfig,
    pub savings: SavingsConfig,
    pub risk: RiskConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            profile: ProfileConfig::default(),
            scoring: ScoringConfig::default(),
            savings: SavingsConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Below this many observed months the pipeline short-circuits to an
    /// insufficient-data profile.
    pub min_history_months: usize,
    /// Months required before seasonality detection is attempted.
    pub seasonal_min_months: usize,
    /// Summer/winter mean ratio (or its inverse) that flags a seasonal pattern.
    pub seasonal_ratio_threshold: f64,
    /// Seasonal confidence required to project from per-season averages.
    pub seasonal_projection_confidence: f64,
    /// Correlation magnitude required to project along a linear trend.
    pub trend_correlation_threshold: f64,
    /// Window for the moving-average fallback projection.
    pub moving_average_window: usize,
    /// Mean monthly kWh above which a low-variability customer is a high user.
    pub high_user_threshold_kwh: f64,
    /// Coefficient of variation at or above which usage counts as variable.
    pub variable_cv_threshold: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            min_history_months: 3,
            seasonal_min_months: 6,
            seasonal_ratio_threshold: 1.35,
            seasonal_projection_confidence: 0.5,
            trend_correlation_threshold: 0.5,
            moving_average_window: 6,
            high_user_threshold_kwh: 1500.0,
            variable_cv_threshold: 0.25,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Shortlist length when the caller does not ask for a specific count.
    pub default_top_n: usize,
    /// Contract length (months) at which the flexibility component bottoms out.
    pub contract_months_ceiling: f64,
    /// Early-termination fee at which the flexibility component bottoms out.
    pub etf_ceiling: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_top_n: 3,
            contract_months_ceiling: 36.0,
            etf_ceiling: 300.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SavingsConfig {
    /// Relative cost swing assumed for variable-rate products.
    pub variable_volatility: f64,
    /// Relative cost swing assumed for market-indexed products.
    pub indexed_volatility: f64,
    /// Relative cost swing assumed for everything else.
    pub default_volatility: f64,
    /// Early-termination fee above which a warning is attached.
    pub high_etf_threshold: f64,
    /// Savings percentage below which savings count as marginal.
    pub marginal_savings_pct: f64,
    /// Projection confidence below which a warning is attached.
    pub low_confidence_threshold: f64,
}

impl Default for SavingsConfig {
    fn default() -> Self {
        Self {
            variable_volatility: 0.10,
            indexed_volatility: 0.15,
            default_volatility: 0.05,
            high_etf_threshold: 150.0,
            marginal_savings_pct: 5.0,
            low_confidence_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Reference date for contract-timing rules. The core never reads a
    /// clock; callers that want timing checks inject the date here.
    pub as_of: Option<NaiveDate>,
    /// A current contract ending within this many days of `as_of` counts as
    /// near expiry.
    pub contract_expiry_window_days: i64,
    /// Early-termination fee above which the high-ETF rule fires.
    pub high_etf_threshold: f64,
    /// Savings percentage below which the stay recommendation triggers.
    pub marginal_savings_pct: f64,
    /// Profile confidence below which the data-quality rule fires.
    pub min_profile_confidence: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            as_of: None,
            contract_expiry_window_days: 60,
            high_etf_threshold: 150.0,
            marginal_savings_pct: 5.0,
            min_profile_confidence: 0.5,
        }
    }
}

impl AnalysisConfig {
    /// Load thresholds from `config/default.toml` overridden by
    /// `ADVISOR__`-prefixed environment variables. Missing file and missing
    /// variables both fall back to the built-in defaults.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("ADVISOR__").split("__"));
        Ok(figment.extract()?)
    }
}
