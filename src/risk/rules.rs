//! Rule-based risk detection over the shortlist.
//!
//! A fixed battery of independent rules; every applicable rule fires on
//! every call, nothing short-circuits. Each rule emits zero or more
//! warnings tagged with the plans they apply to, so one plan can carry
//! findings from several rules at once.

use chrono::Duration;
use tracing::debug;

use crate::config::RiskConfig;
use crate::domain::{
    CurrentPlan, ProfileType, RiskLevel, RiskType, RiskWarning, Severity, UsageProfile,
    UserPreferences,
};
use crate::savings::SavingsAnalysis;
use crate::scoring::RankedPlan;

pub struct RiskEngine {
    pub(crate) config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn detect(
        &self,
        plans: &[RankedPlan],
        current: &CurrentPlan,
        savings_analyses: &[SavingsAnalysis],
        profile: &UsageProfile,
        preferences: &UserPreferences,
    ) -> Vec<RiskWarning> {
        let mut warnings = Vec::new();

        self.check_termination_fees(plans, &mut warnings);
        self.check_savings(savings_analyses, preferences, &mut warnings);
        self.check_data_quality(plans, profile, &mut warnings);
        self.check_rate_volatility(plans, &mut warnings);
        self.check_contract_timing(plans, current, &mut warnings);
        self.check_plan_flags(plans, &mut warnings);

        debug!(count = warnings.len(), "risk detection complete");
        warnings
    }

    /// Aggregate level across all candidates, from the severity mix.
    pub fn overall_level(&self, warnings: &[RiskWarning]) -> RiskLevel {
        let criticals = warnings.iter().filter(|w| w.severity == Severity::Critical).count();
        let warns = warnings.iter().filter(|w| w.severity == Severity::Warning).count();
        let infos = warnings.iter().filter(|w| w.severity == Severity::Info).count();

        if criticals > 0 || warns >= 4 {
            RiskLevel::High
        } else if warns >= 2 || (warns >= 1 && infos >= 2) {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    fn check_termination_fees(&self, plans: &[RankedPlan], out: &mut Vec<RiskWarning>) {
        for plan in plans {
            let etf = plan.plan.early_termination_fee;
            if etf <= self.config.high_etf_threshold {
                continue;
            }
            let severity = if etf > 2.0 * self.config.high_etf_threshold {
                Severity::Critical
            } else {
                Severity::Warning
            };
            out.push(RiskWarning {
                risk_type: RiskType::HighEarlyTerminationFee,
                severity,
                category: "fees".into(),
                title: "High early termination fee".into(),
                message: format!(
                    "Leaving {} before its {}-month term ends costs ${etf:.2}",
                    plan.plan.plan_id, plan.plan.contract_length_months
                ),
                mitigation: Some(
                    "Diarize the contract end date and review before auto-renewal".into(),
                ),
                affected_plan_ids: vec![plan.plan.plan_id.clone()],
            });
        }
    }

    fn check_savings(
        &self,
        savings_analyses: &[SavingsAnalysis],
        preferences: &UserPreferences,
        out: &mut Vec<RiskWarning>,
    ) {
        // A cost-driven customer should see a thin margin flagged loudly;
        // for everyone else it is informational.
        let marginal_severity = if preferences.cost_priority >= 50.0 {
            Severity::Warning
        } else {
            Severity::Info
        };

        for analysis in savings_analyses {
            if analysis.annual_savings < 0.0 {
                out.push(RiskWarning {
                    risk_type: RiskType::NegativeSavings,
                    severity: Severity::Critical,
                    category: "savings".into(),
                    title: "Plan costs more than the current one".into(),
                    message: format!(
                        "{} is projected to cost ${:.2} more per year than staying",
                        analysis.plan_id, -analysis.annual_savings
                    ),
                    mitigation: None,
                    affected_plan_ids: vec![analysis.plan_id.clone()],
                });
            } else if analysis.savings_percentage < self.config.marginal_savings_pct {
                out.push(RiskWarning {
                    risk_type: RiskType::MarginalSavings,
                    severity: marginal_severity,
                    category: "savings".into(),
                    title: "Savings are marginal".into(),
                    message: format!(
                        "{} saves only {:.1}% per year; small rate moves could erase it",
                        analysis.plan_id, analysis.savings_percentage
                    ),
                    mitigation: None,
                    affected_plan_ids: vec![analysis.plan_id.clone()],
                });
            }
        }
    }

    fn check_data_quality(
        &self,
        plans: &[RankedPlan],
        profile: &UsageProfile,
        out: &mut Vec<RiskWarning>,
    ) {
        let all_plans: Vec<String> = plans.iter().map(|p| p.plan.plan_id.clone()).collect();

        if profile.profile_type == ProfileType::InsufficientData {
            out.push(RiskWarning {
                risk_type: RiskType::DataQuality,
                severity: Severity::Warning,
                category: "data".into(),
                title: "Not enough usage history".into(),
                message: "Every projection below rests on a fallback average, not observed usage"
                    .into(),
                mitigation: Some("Re-run the analysis after a few more billing cycles".into()),
                affected_plan_ids: all_plans,
            });
        } else if profile.overall_confidence < self.config.min_profile_confidence {
            out.push(RiskWarning {
                risk_type: RiskType::DataQuality,
                severity: Severity::Warning,
                category: "data".into(),
                title: "Low analysis confidence".into(),
                message: format!(
                    "Overall analysis confidence is {:.0}%; treat projected costs as rough",
                    profile.overall_confidence * 100.0
                ),
                mitigation: None,
                affected_plan_ids: all_plans,
            });
        } else if profile.data_quality.has_gaps || profile.outliers.has_outliers {
            out.push(RiskWarning {
                risk_type: RiskType::DataQuality,
                severity: Severity::Info,
                category: "data".into(),
                title: "Usage history needed cleanup".into(),
                message: "Gaps were interpolated and outlying months kept; figures carry extra spread"
                    .into(),
                mitigation: None,
                affected_plan_ids: all_plans,
            });
        }
    }

    fn check_rate_volatility(&self, plans: &[RankedPlan], out: &mut Vec<RiskWarning>) {
        for plan in plans {
            if !plan.plan.rate_structure.is_variable() {
                continue;
            }
            let message = if plan.plan.rate_structure.is_indexed() {
                format!(
                    "{} is indexed to the wholesale market; bills move with it month to month",
                    plan.plan.plan_id
                )
            } else {
                format!(
                    "{} carries a variable rate the supplier can reprice",
                    plan.plan.plan_id
                )
            };
            out.push(RiskWarning {
                risk_type: RiskType::RateVolatility,
                severity: Severity::Warning,
                category: "rates".into(),
                title: "Rate can change".into(),
                message,
                mitigation: Some("A fixed-rate plan trades a little cost for certainty".into()),
                affected_plan_ids: vec![plan.plan.plan_id.clone()],
            });
        }
    }

    fn check_contract_timing(
        &self,
        plans: &[RankedPlan],
        current: &CurrentPlan,
        out: &mut Vec<RiskWarning>,
    ) {
        // Needs an injected reference date and a known end date; without
        // both the rule stays silent rather than guessing.
        let (Some(as_of), Some(end)) = (self.config.as_of, current.contract_end_date) else {
            return;
        };
        if plans.is_empty() {
            return;
        }
        let all_plans: Vec<String> = plans.iter().map(|p| p.plan.plan_id.clone()).collect();
        let window_end = as_of + Duration::days(self.config.contract_expiry_window_days);

        if end > window_end && current.early_termination_fee > 0.0 {
            out.push(RiskWarning {
                risk_type: RiskType::ContractTiming,
                severity: Severity::Warning,
                category: "timing".into(),
                title: "Current contract is still running".into(),
                message: format!(
                    "Switching before {end} triggers the current plan's ${:.2} exit fee",
                    current.early_termination_fee
                ),
                mitigation: Some(format!("Waiting until {end} avoids the fee entirely")),
                affected_plan_ids: all_plans,
            });
        } else if end <= window_end {
            out.push(RiskWarning {
                risk_type: RiskType::ContractTiming,
                severity: Severity::Info,
                category: "timing".into(),
                title: "Good switching window".into(),
                message: format!("The current contract ends {end}; switching now is penalty-free or nearly so"),
                mitigation: None,
                affected_plan_ids: all_plans,
            });
        }
    }

    fn check_plan_flags(&self, plans: &[RankedPlan], out: &mut Vec<RiskWarning>) {
        for plan in plans {
            for flag in &plan.plan.risk_flags {
                out.push(RiskWarning {
                    risk_type: RiskType::PlanFlag,
                    severity: Severity::Info,
                    category: "catalog".into(),
                    title: "Catalog flag".into(),
                    message: format!("{}: {flag}", plan.plan.plan_id),
                    mitigation: None,
                    affected_plan_ids: vec![plan.plan.plan_id.clone()],
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProfileConfig, SavingsConfig};
    use crate::domain::{MonthlyUsage, PlanCandidate, RateStructure};
    use crate::profile::ProfileBuilder;
    use crate::savings::SavingsCalculator;
    use chrono::NaiveDate;

    fn engine() -> RiskEngine {
        RiskEngine::new(RiskConfig::default())
    }

    fn profile() -> UsageProfile {
        let usage: Vec<MonthlyUsage> = (1..=12)
            .map(|m| {
                MonthlyUsage::new(NaiveDate::from_ymd_opt(2024, m, 1).unwrap(), 900.0).unwrap()
            })
            .collect();
        ProfileBuilder::new(ProfileConfig::default()).analyze(&usage, None, None)
    }

    fn ranked(id: &str, rate_structure: RateStructure, etf: f64) -> RankedPlan {
        RankedPlan {
            plan: PlanCandidate {
                plan_id: id.into(),
                supplier_name: format!("{id} energy"),
                rate_structure,
                contract_length_months: 12,
                early_termination_fee: etf,
                renewable_percentage: 40.0,
                monthly_fee: 0.0,
                connection_fee: 0.0,
                supplier_rating: 4.0,
                risk_flags: Vec::new(),
            },
            cost_score: 80.0,
            flexibility_score: 70.0,
            renewable_score: 40.0,
            rating_score: 80.0,
            composite_score: 75.0,
            projected_annual_cost: 1000.0,
            rank: 1,
        }
    }

    fn current(etf: f64, end: Option<NaiveDate>) -> CurrentPlan {
        CurrentPlan {
            plan_id: "current".into(),
            rate_structure: RateStructure::Fixed { rate_cents_per_kwh: 13.0 },
            monthly_fee: 0.0,
            renewable_percentage: 10.0,
            supplier_rating: 3.0,
            early_termination_fee: etf,
            contract_end_date: end,
        }
    }

    fn savings_for(plans: &[RankedPlan], cur: &CurrentPlan, profile: &UsageProfile) -> Vec<SavingsAnalysis> {
        let calc = SavingsCalculator::new(SavingsConfig::default());
        plans.iter().map(|p| calc.analyze(cur, p, &profile.projection)).collect()
    }

    #[test]
    fn test_high_etf_rule_fires_per_plan() {
        let plans = vec![
            ranked("steep", RateStructure::Fixed { rate_cents_per_kwh: 10.0 }, 200.0),
            ranked("free", RateStructure::Fixed { rate_cents_per_kwh: 10.5 }, 0.0),
        ];
        let prof = profile();
        let cur = current(0.0, None);
        let warnings = engine().detect(&plans, &cur, &savings_for(&plans, &cur, &prof), &prof, &UserPreferences::balanced());

        let etf_warnings: Vec<_> = warnings
            .iter()
            .filter(|w| w.risk_type == RiskType::HighEarlyTerminationFee)
            .collect();
        assert_eq!(etf_warnings.len(), 1);
        assert_eq!(etf_warnings[0].affected_plan_ids, vec!["steep".to_string()]);
        assert_eq!(etf_warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_extreme_etf_is_critical() {
        let plans = vec![ranked("lockbox", RateStructure::Fixed { rate_cents_per_kwh: 10.0 }, 400.0)];
        let prof = profile();
        let cur = current(0.0, None);
        let warnings = engine().detect(&plans, &cur, &savings_for(&plans, &cur, &prof), &prof, &UserPreferences::balanced());
        assert!(warnings
            .iter()
            .any(|w| w.risk_type == RiskType::HighEarlyTerminationFee
                && w.severity == Severity::Critical));
    }

    #[test]
    fn test_negative_savings_is_critical() {
        let plans = vec![ranked("pricier", RateStructure::Fixed { rate_cents_per_kwh: 16.0 }, 0.0)];
        let prof = profile();
        let cur = current(0.0, None);
        let warnings = engine().detect(&plans, &cur, &savings_for(&plans, &cur, &prof), &prof, &UserPreferences::balanced());
        assert!(warnings
            .iter()
            .any(|w| w.risk_type == RiskType::NegativeSavings && w.severity == Severity::Critical));
    }

    #[test]
    fn test_variable_rate_flagged() {
        let plans = vec![ranked(
            "floating",
            RateStructure::Variable { current_rate_cents_per_kwh: 10.0, indexed: true },
            0.0,
        )];
        let prof = profile();
        let cur = current(0.0, None);
        let warnings = engine().detect(&plans, &cur, &savings_for(&plans, &cur, &prof), &prof, &UserPreferences::balanced());
        let w = warnings
            .iter()
            .find(|w| w.risk_type == RiskType::RateVolatility)
            .unwrap();
        assert!(w.message.contains("indexed"));
    }

    #[test]
    fn test_contract_timing_needs_both_dates() {
        let plans = vec![ranked("a", RateStructure::Fixed { rate_cents_per_kwh: 10.0 }, 0.0)];
        let prof = profile();

        // end date known but no reference date injected: rule stays silent
        let cur = current(150.0, NaiveDate::from_ymd_opt(2026, 6, 1));
        let warnings = engine().detect(&plans, &cur, &savings_for(&plans, &cur, &prof), &prof, &UserPreferences::balanced());
        assert!(!warnings.iter().any(|w| w.risk_type == RiskType::ContractTiming));
    }

    #[test]
    fn test_contract_timing_mismatch_fires_with_dates() {
        let mut cfg = RiskConfig::default();
        cfg.as_of = NaiveDate::from_ymd_opt(2025, 1, 15);
        let engine = RiskEngine::new(cfg);

        let plans = vec![ranked("a", RateStructure::Fixed { rate_cents_per_kwh: 10.0 }, 0.0)];
        let prof = profile();
        let cur = current(150.0, NaiveDate::from_ymd_opt(2025, 11, 30));
        let warnings = engine.detect(&plans, &cur, &savings_for(&plans, &cur, &prof), &prof, &UserPreferences::balanced());

        let w = warnings
            .iter()
            .find(|w| w.risk_type == RiskType::ContractTiming)
            .unwrap();
        assert_eq!(w.severity, Severity::Warning);
        assert!(w.message.contains("150.00"));
    }

    #[test]
    fn test_near_expiry_is_informational() {
        let mut cfg = RiskConfig::default();
        cfg.as_of = NaiveDate::from_ymd_opt(2025, 1, 15);
        let engine = RiskEngine::new(cfg);

        let plans = vec![ranked("a", RateStructure::Fixed { rate_cents_per_kwh: 10.0 }, 0.0)];
        let prof = profile();
        let cur = current(150.0, NaiveDate::from_ymd_opt(2025, 2, 10));
        let warnings = engine.detect(&plans, &cur, &savings_for(&plans, &cur, &prof), &prof, &UserPreferences::balanced());
        assert!(warnings
            .iter()
            .any(|w| w.risk_type == RiskType::ContractTiming && w.severity == Severity::Info));
    }

    #[test]
    fn test_catalog_flags_pass_through() {
        let mut plan = ranked("flagged", RateStructure::Fixed { rate_cents_per_kwh: 10.0 }, 0.0);
        plan.plan.risk_flags = vec!["promotional first-year rate".into()];
        let prof = profile();
        let cur = current(0.0, None);
        let plans = vec![plan];
        let warnings = engine().detect(&plans, &cur, &savings_for(&plans, &cur, &prof), &prof, &UserPreferences::balanced());
        assert!(warnings
            .iter()
            .any(|w| w.risk_type == RiskType::PlanFlag && w.message.contains("promotional")));
    }

    #[test]
    fn test_overall_level_from_severity_mix() {
        let engine = engine();
        let make = |severity| RiskWarning {
            risk_type: RiskType::MarginalSavings,
            severity,
            category: "savings".into(),
            title: "t".into(),
            message: "m".into(),
            mitigation: None,
            affected_plan_ids: vec![],
        };

        assert_eq!(engine.overall_level(&[]), RiskLevel::Low);
        assert_eq!(engine.overall_level(&[make(Severity::Info)]), RiskLevel::Low);
        assert_eq!(
            engine.overall_level(&[make(Severity::Warning), make(Severity::Warning)]),
            RiskLevel::Medium
        );
        assert_eq!(engine.overall_level(&[make(Severity::Critical)]), RiskLevel::High);
        assert_eq!(
            engine.overall_level(&[
                make(Severity::Warning),
                make(Severity::Warning),
                make(Severity::Warning),
                make(Severity::Warning)
            ]),
            RiskLevel::High
        );
    }
}
