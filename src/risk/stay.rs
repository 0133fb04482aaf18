//! The stay-vs-switch decision.
//!
//! Recommends staying when there is nothing to switch to, when the best
//! candidate costs more, or when savings are marginal and either the
//! current contract is not near expiry or the switching cost would erase
//! the savings within the 12-month horizon. The result always names its
//! triggers so the call is auditable.

use chrono::Duration;
use tracing::debug;

use crate::domain::{CurrentPlan, RiskWarning, Severity, StayRecommendation, UsageProfile};
use crate::savings::SavingsAnalysis;
use crate::scoring::RankedPlan;

use super::rules::RiskEngine;

/// Break-even beyond this many months means the switch never pays off
/// inside the comparison horizon.
const BREAK_EVEN_HORIZON_MONTHS: u32 = 12;

impl RiskEngine {
    pub fn should_recommend_staying(
        &self,
        current: &CurrentPlan,
        top_plan: Option<&RankedPlan>,
        savings: Option<&SavingsAnalysis>,
        risks: &[RiskWarning],
        total_plans_analyzed: usize,
        profile: &UsageProfile,
    ) -> StayRecommendation {
        let mut triggers = Vec::new();

        let (Some(top), Some(analysis)) = (top_plan, savings) else {
            return no_alternatives(total_plans_analyzed);
        };
        if total_plans_analyzed == 0 {
            return no_alternatives(0);
        }

        let pct = analysis.savings_percentage;
        let threshold = self.config.marginal_savings_pct;

        let should_stay = if analysis.annual_savings <= 0.0 {
            triggers.push("negative_savings".into());
            true
        } else if pct < threshold {
            triggers.push("marginal_savings".into());
            if !self.near_expiry(current) {
                triggers.push("contract_not_near_expiry".into());
                true
            } else if analysis
                .break_even_months
                .map_or(true, |m| m > BREAK_EVEN_HORIZON_MONTHS)
            {
                triggers.push("switching_cost_exceeds_savings".into());
                true
            } else {
                false
            }
        } else {
            false
        };

        if !profile.is_reliable() {
            triggers.push("low_data_confidence".into());
        }
        if risks
            .iter()
            .any(|w| w.severity == Severity::Critical && w.affected_plan_ids.contains(&top.plan.plan_id))
        {
            triggers.push("critical_risk_on_top_plan".into());
        }

        let reasoning = if should_stay {
            if analysis.annual_savings <= 0.0 {
                format!(
                    "The best available plan ({}) is projected to cost ${:.2} more per year; the current plan already wins on price",
                    top.plan.plan_id, -analysis.annual_savings
                )
            } else {
                format!(
                    "Projected savings of ${:.2}/year ({pct:.1}%) are below the {threshold:.0}% threshold once switching friction is considered",
                    analysis.annual_savings
                )
            }
        } else {
            format!(
                "Switching to {} is projected to save ${:.2}/year ({pct:.1}%), clearing the {threshold:.0}% threshold",
                top.plan.plan_id, analysis.annual_savings
            )
        };

        // Margin distance and profile confidence both firm the call up.
        let margin_factor = ((pct - threshold).abs() / 10.0).min(1.0);
        let confidence =
            (0.55 + 0.25 * profile.overall_confidence + 0.2 * margin_factor).clamp(0.0, 1.0);

        debug!(should_stay, ?triggers, "stay recommendation computed");

        StayRecommendation {
            should_stay,
            reasoning,
            triggers,
            net_annual_savings: Some(analysis.cumulative_savings_12_months),
            break_even_months: analysis.break_even_months,
            confidence,
        }
    }

    fn near_expiry(&self, current: &CurrentPlan) -> bool {
        // Unknown dates read as "mid-contract": the cautious default.
        match (self.config.as_of, current.contract_end_date) {
            (Some(as_of), Some(end)) => {
                end <= as_of + Duration::days(self.config.contract_expiry_window_days)
            }
            _ => false,
        }
    }
}

fn no_alternatives(total_plans_analyzed: usize) -> StayRecommendation {
    StayRecommendation {
        should_stay: true,
        reasoning: format!(
            "No viable alternative plans were found ({total_plans_analyzed} analyzed); staying on the current plan"
        ),
        triggers: vec!["no_alternatives".into()],
        net_annual_savings: None,
        break_even_months: None,
        confidence: 0.9,
    }
}
