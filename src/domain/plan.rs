use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;

/// One pricing tier of a tiered rate. `limit_kwh` is the cumulative upper
/// bound of the tier; the final tier carries `None` and absorbs all remaining
/// consumption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTier {
    pub limit_kwh: Option<f64>,
    pub rate_cents_per_kwh: f64,
}

/// How a plan prices energy. Tagged union instead of a stringly-typed
/// payload so malformed structures fail at construction, not mid-analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RateStructure {
    Fixed {
        rate_cents_per_kwh: f64,
    },
    Tiered {
        tiers: Vec<RateTier>,
    },
    TimeOfUse {
        peak_rate_cents_per_kwh: f64,
        off_peak_rate_cents_per_kwh: f64,
    },
    Variable {
        current_rate_cents_per_kwh: f64,
        /// Market-indexed products move with the spot price and get the
        /// widest uncertainty band in the savings analysis.
        indexed: bool,
    },
}

impl RateStructure {
    /// Check structural invariants: finite non-negative rates, and for
    /// tiered rates a non-empty ascending tier table ending in an
    /// unbounded tier.
    pub fn validate(&self) -> Result<(), AdvisorError> {
        let check_rate = |rate: f64, what: &str| {
            if !rate.is_finite() || rate < 0.0 {
                Err(AdvisorError::InvalidRateStructure(format!(
                    "{what} must be a non-negative finite number, got {rate}"
                )))
            } else {
                Ok(())
            }
        };

        match self {
            Self::Fixed { rate_cents_per_kwh } => check_rate(*rate_cents_per_kwh, "fixed rate"),
            Self::TimeOfUse {
                peak_rate_cents_per_kwh,
                off_peak_rate_cents_per_kwh,
            } => {
                check_rate(*peak_rate_cents_per_kwh, "peak rate")?;
                check_rate(*off_peak_rate_cents_per_kwh, "off-peak rate")
            }
            Self::Variable {
                current_rate_cents_per_kwh,
                ..
            } => check_rate(*current_rate_cents_per_kwh, "variable base rate"),
            Self::Tiered { tiers } => {
                if tiers.is_empty() {
                    return Err(AdvisorError::InvalidRateStructure(
                        "tiered rate needs at least one tier".into(),
                    ));
                }
                let mut prev_limit = 0.0_f64;
                for (i, tier) in tiers.iter().enumerate() {
                    check_rate(tier.rate_cents_per_kwh, "tier rate")?;
                    let last = i == tiers.len() - 1;
                    match tier.limit_kwh {
                        Some(limit) if last => {
                            return Err(AdvisorError::InvalidRateStructure(format!(
                                "final tier must be unbounded, got limit {limit}"
                            )));
                        }
                        Some(limit) => {
                            if !limit.is_finite() || limit <= prev_limit {
                                return Err(AdvisorError::InvalidRateStructure(format!(
                                    "tier limits must ascend, got {limit} after {prev_limit}"
                                )));
                            }
                            prev_limit = limit;
                        }
                        None if !last => {
                            return Err(AdvisorError::InvalidRateStructure(
                                "only the final tier may be unbounded".into(),
                            ));
                        }
                        None => {}
                    }
                }
                Ok(())
            }
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable { .. })
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Variable { indexed: true, .. })
    }
}

/// A candidate plan from the (externally owned) catalog. Static attributes
/// only; scores are recomputed per call and live on [`RankedPlan`].
///
/// [`RankedPlan`]: crate::scoring::RankedPlan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanCandidate {
    pub plan_id: String,
    pub supplier_name: String,
    pub rate_structure: RateStructure,
    pub contract_length_months: u32,
    pub early_termination_fee: f64,
    pub renewable_percentage: f64,
    pub monthly_fee: f64,
    pub connection_fee: f64,
    /// Supplier rating on a 0-5 scale.
    pub supplier_rating: f64,
    /// Free-form flags from the catalog (promotional rate, new supplier,
    /// pending acquisition). Surfaced by the risk engine as-is.
    #[serde(default)]
    pub risk_flags: Vec<String>,
}

/// The customer's plan of record, fetched by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentPlan {
    pub plan_id: String,
    pub rate_structure: RateStructure,
    pub monthly_fee: f64,
    pub renewable_percentage: f64,
    pub supplier_rating: f64,
    pub early_termination_fee: f64,
    pub contract_end_date: Option<NaiveDate>,
}

/// What the customer cares about, as four 0-100 priorities. The API layer
/// validates that they sum to 100; the engine normalizes by the actual sum
/// so a slightly-off payload still ranks sensibly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub cost_priority: f64,
    pub flexibility_priority: f64,
    pub renewable_priority: f64,
    pub rating_priority: f64,
}

impl UserPreferences {
    pub fn balanced() -> Self {
        Self {
            cost_priority: 25.0,
            flexibility_priority: 25.0,
            renewable_priority: 25.0,
            rating_priority: 25.0,
        }
    }

    pub fn weight_sum(&self) -> f64 {
        self.cost_priority + self.flexibility_priority + self.renewable_priority + self.rating_priority
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self::balanced()
    }
}
