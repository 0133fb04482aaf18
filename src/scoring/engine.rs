//! Multi-factor plan scoring and ranking.
//!
//! Four sub-scores on a 0-100 scale (cost, flexibility, renewable content,
//! supplier rating) combined into a preference-weighted composite. Ranking
//! is fully deterministic: composite descending, ties by lower projected
//! annual cost, then by plan id, so identical inputs always produce the
//! identical shortlist.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScoringConfig;
use crate::cost::monthly_cost;
use crate::domain::{PlanCandidate, UsageProfile, UserPreferences};

/// A candidate with its computed scores and final rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlan {
    pub plan: PlanCandidate,
    pub cost_score: f64,
    pub flexibility_score: f64,
    pub renewable_score: f64,
    pub rating_score: f64,
    pub composite_score: f64,
    /// Energy plus recurring fees over the projected 12 months. One-time
    /// connection fees are a savings/TCO concern, not a rate signal.
    pub projected_annual_cost: f64,
    pub rank: usize,
}

pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score every candidate against the profile's projection and return the
    /// top-N shortlist. Fewer valid candidates than N returns fewer entries,
    /// never placeholders; an empty candidate set returns an empty list.
    pub fn rank(
        &self,
        plans: &[PlanCandidate],
        profile: &UsageProfile,
        preferences: &UserPreferences,
        top_n: Option<usize>,
    ) -> Vec<RankedPlan> {
        if plans.is_empty() {
            return Vec::new();
        }

        let annual_costs: Vec<f64> = plans
            .iter()
            .map(|p| projected_annual_cost(p, profile))
            .collect();
        let min_cost = annual_costs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_cost = annual_costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let mut ranked: Vec<RankedPlan> = plans
            .iter()
            .zip(annual_costs.iter())
            .map(|(plan, &annual_cost)| {
                let cost_score = inverse_cost_score(annual_cost, min_cost, max_cost);
                let flexibility_score = self.flexibility_score(
                    plan.contract_length_months,
                    plan.early_termination_fee,
                );
                let renewable_score = plan.renewable_percentage.clamp(0.0, 100.0);
                let rating_score = (plan.supplier_rating * 20.0).clamp(0.0, 100.0);
                let composite_score = composite(
                    preferences,
                    cost_score,
                    flexibility_score,
                    renewable_score,
                    rating_score,
                );

                RankedPlan {
                    plan: plan.clone(),
                    cost_score,
                    flexibility_score,
                    renewable_score,
                    rating_score,
                    composite_score,
                    projected_annual_cost: annual_cost,
                    rank: 0,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            OrderedFloat(b.composite_score)
                .cmp(&OrderedFloat(a.composite_score))
                .then_with(|| {
                    OrderedFloat(a.projected_annual_cost).cmp(&OrderedFloat(b.projected_annual_cost))
                })
                .then_with(|| a.plan.plan_id.cmp(&b.plan.plan_id))
        });

        let limit = top_n.unwrap_or(self.config.default_top_n);
        ranked.truncate(limit);
        for (i, plan) in ranked.iter_mut().enumerate() {
            plan.rank = i + 1;
        }

        debug!(candidates = plans.len(), shortlisted = ranked.len(), "plan ranking complete");

        ranked
    }

    /// Shorter contracts and lower exit fees both read as flexibility;
    /// the two components average with equal weight.
    pub fn flexibility_score(&self, contract_months: u32, early_termination_fee: f64) -> f64 {
        let contract_component =
            (100.0 * (1.0 - f64::from(contract_months) / self.config.contract_months_ceiling))
                .clamp(0.0, 100.0);
        let etf_component =
            (100.0 * (1.0 - early_termination_fee / self.config.etf_ceiling)).clamp(0.0, 100.0);
        (contract_component + etf_component) / 2.0
    }
}

/// Energy plus recurring monthly fees across the 12 projected months.
pub fn projected_annual_cost(plan: &PlanCandidate, profile: &UsageProfile) -> f64 {
    profile
        .projection
        .projected_monthly_kwh
        .iter()
        .map(|&kwh| monthly_cost(kwh, &plan.rate_structure, plan.monthly_fee))
        .sum()
}

/// Cheapest plan in the set scores 100, priciest 0, linear in between.
/// A single candidate (or a zero-width cost span) scores 100.
fn inverse_cost_score(cost: f64, min_cost: f64, max_cost: f64) -> f64 {
    let span = max_cost - min_cost;
    if span <= f64::EPSILON {
        return 100.0;
    }
    ((max_cost - cost) / span * 100.0).clamp(0.0, 100.0)
}

fn composite(
    preferences: &UserPreferences,
    cost: f64,
    flexibility: f64,
    renewable: f64,
    rating: f64,
) -> f64 {
    let sum = preferences.weight_sum();
    if sum <= 0.0 {
        // all-zero priorities degrade to an equal-weight blend
        return (cost + flexibility + renewable + rating) / 4.0;
    }
    (preferences.cost_priority * cost
        + preferences.flexibility_priority * flexibility
        + preferences.renewable_priority * renewable
        + preferences.rating_priority * rating)
        / sum
}
