//! Savings, total cost of ownership and break-even math for one candidate
//! against the customer's current plan.
//!
//! All twelve projected months are priced under both plans with the shared
//! cost model; the candidate's connection fee lands in month one. The
//! monthly breakdown always sums to the projected annual cost.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SavingsConfig;
use crate::cost::{average_rate_cents, energy_cost};
use crate::domain::{CurrentPlan, PlanCandidate, RateStructure, UsageProjection};
use crate::scoring::RankedPlan;

/// One month of the cost breakdown. `month_number` counts 1-12 from the
/// first projected month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCost {
    pub month_number: u32,
    pub kwh: f64,
    pub energy_cost: f64,
    pub fixed_fees: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsAnalysis {
    pub plan_id: String,
    pub projected_annual_cost: f64,
    pub current_annual_cost: f64,
    pub annual_savings: f64,
    pub savings_percentage: f64,
    pub monthly_breakdown: Vec<MonthlyCost>,
    pub total_cost_of_ownership: f64,
    pub tco_current_plan: f64,
    /// Months of savings needed to recover the switching cost. `Some(0)`
    /// when switching is free, `None` when savings never cover it.
    pub break_even_months: Option<u32>,
    pub switching_cost: f64,
    pub cumulative_savings_12_months: f64,
    /// (low, high) bound on the projected annual cost under rate movement.
    pub uncertainty_range: Option<(f64, f64)>,
    pub assumptions: Vec<String>,
    pub warnings: Vec<String>,
}

pub struct SavingsCalculator {
    config: SavingsConfig,
}

impl SavingsCalculator {
    pub fn new(config: SavingsConfig) -> Self {
        Self { config }
    }

    pub fn analyze(
        &self,
        current: &CurrentPlan,
        candidate: &RankedPlan,
        projection: &UsageProjection,
    ) -> SavingsAnalysis {
        let plan = &candidate.plan;

        let monthly_breakdown: Vec<MonthlyCost> = projection
            .projected_monthly_kwh
            .iter()
            .enumerate()
            .map(|(i, &kwh)| {
                let energy = energy_cost(kwh, &plan.rate_structure);
                let connection = if i == 0 { plan.connection_fee } else { 0.0 };
                let fixed_fees = plan.monthly_fee + connection;
                MonthlyCost {
                    month_number: i as u32 + 1,
                    kwh,
                    energy_cost: energy,
                    fixed_fees,
                    total_cost: energy + fixed_fees,
                }
            })
            .collect();

        let projected_annual_cost: f64 = monthly_breakdown.iter().map(|m| m.total_cost).sum();
        let current_annual_cost: f64 = projection
            .projected_monthly_kwh
            .iter()
            .map(|&kwh| energy_cost(kwh, &current.rate_structure) + current.monthly_fee)
            .sum();

        let annual_savings = current_annual_cost - projected_annual_cost;
        let savings_percentage = if current_annual_cost > 0.0 {
            annual_savings / current_annual_cost * 100.0
        } else {
            0.0
        };

        // Month-to-month plans are held to a 12-month horizon so every TCO
        // compares over at least a year.
        let horizon_years = f64::from(plan.contract_length_months.max(12)) / 12.0;
        let recurring_annual = projected_annual_cost - plan.connection_fee;
        let total_cost_of_ownership = recurring_annual * horizon_years + plan.connection_fee;
        let tco_current_plan = current_annual_cost * horizon_years;

        // Leaving the current contract is what costs money; the candidate's
        // connection fee is already in the month-one breakdown.
        let switching_cost = current.early_termination_fee.max(0.0);
        let break_even_months = if switching_cost <= 0.0 {
            Some(0)
        } else if annual_savings <= 0.0 {
            None
        } else {
            Some((switching_cost / (annual_savings / 12.0)).ceil() as u32)
        };

        let cumulative_savings_12_months = annual_savings - switching_cost;

        let volatility = self.volatility(&plan.rate_structure);
        let uncertainty_range = Some((
            projected_annual_cost * (1.0 - volatility),
            projected_annual_cost * (1.0 + volatility),
        ));

        let assumptions = self.assumptions(plan, projection, projected_annual_cost);
        let warnings = self.warnings(plan, projection, annual_savings, savings_percentage);

        debug!(
            plan_id = %plan.plan_id,
            annual_savings,
            break_even = ?break_even_months,
            "savings analysis complete"
        );

        SavingsAnalysis {
            plan_id: plan.plan_id.clone(),
            projected_annual_cost,
            current_annual_cost,
            annual_savings,
            savings_percentage,
            monthly_breakdown,
            total_cost_of_ownership,
            tco_current_plan,
            break_even_months,
            switching_cost,
            cumulative_savings_12_months,
            uncertainty_range,
            assumptions,
            warnings,
        }
    }

    fn volatility(&self, rate: &RateStructure) -> f64 {
        match rate {
            RateStructure::Variable { indexed: true, .. } => self.config.indexed_volatility,
            RateStructure::Variable { indexed: false, .. } => self.config.variable_volatility,
            _ => self.config.default_volatility,
        }
    }

    fn assumptions(
        &self,
        plan: &PlanCandidate,
        projection: &UsageProjection,
        projected_annual_cost: f64,
    ) -> Vec<String> {
        let annual_kwh = projection.projected_annual_kwh;
        let mut out = vec![format!(
            "Based on projected annual usage of {annual_kwh:.0} kWh"
        )];
        out.push(format!(
            "Effective rate works out to {:.1} cents/kWh (${projected_annual_cost:.2}/year)",
            average_rate_cents(annual_kwh, &plan.rate_structure)
        ));
        if plan.connection_fee > 0.0 {
            out.push(format!(
                "One-time connection fee of ${:.2} charged in the first month",
                plan.connection_fee
            ));
        }
        match &plan.rate_structure {
            RateStructure::TimeOfUse { .. } => out.push(
                "Time-of-use costs assume an even split between peak and off-peak consumption"
                    .into(),
            ),
            RateStructure::Variable { .. } => out.push(
                "Variable rate held at its current value for the point estimate".into(),
            ),
            _ => {}
        }
        out
    }

    fn warnings(
        &self,
        plan: &PlanCandidate,
        projection: &UsageProjection,
        annual_savings: f64,
        savings_percentage: f64,
    ) -> Vec<String> {
        let mut out = Vec::new();
        if plan.early_termination_fee > self.config.high_etf_threshold {
            out.push(format!(
                "Early termination fee of ${:.2} applies if you leave this plan early",
                plan.early_termination_fee
            ));
        }
        if annual_savings < 0.0 {
            out.push(format!(
                "This plan would cost ${:.2} more per year than your current plan",
                -annual_savings
            ));
        } else if savings_percentage < self.config.marginal_savings_pct {
            out.push(format!(
                "Projected savings of {savings_percentage:.1}% are marginal"
            ));
        }
        if plan.rate_structure.is_variable() {
            out.push("Rates on this plan can move with the market".into());
        }
        if projection.confidence_score < self.config.low_confidence_threshold {
            out.push("Usage projection confidence is low; actual costs may differ".into());
        }
        out
    }
}
