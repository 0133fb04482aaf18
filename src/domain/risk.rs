use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What a risk rule is about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskType {
    HighEarlyTerminationFee,
    MarginalSavings,
    NegativeSavings,
    DataQuality,
    RateVolatility,
    ContractTiming,
    PlanFlag,
}

/// Severity of a warning or trade-off note.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Aggregate risk across the whole shortlist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One finding from the rule battery, tagged with the plans it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskWarning {
    pub risk_type: RiskType,
    pub severity: Severity,
    pub category: String,
    pub title: String,
    pub message: String,
    pub mitigation: Option<String>,
    pub affected_plan_ids: Vec<String>,
}

/// The stay-vs-switch call, with enough material to audit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StayRecommendation {
    pub should_stay: bool,
    pub reasoning: String,
    /// Rule names that fired while deciding, in evaluation order.
    pub triggers: Vec<String>,
    pub net_annual_savings: Option<f64>,
    pub break_even_months: Option<u32>,
    pub confidence: f64,
}

/// Everything the risk pass produces in one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub warnings: Vec<RiskWarning>,
    pub overall_risk: RiskLevel,
    pub stay_recommendation: StayRecommendation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(RiskType::HighEarlyTerminationFee.to_string(), "high_early_termination_fee");
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), r#""medium""#);
    }
}
