//! Side-by-side comparison across the shortlist plus the current plan:
//! best-in-category tags, pairwise trade-off notes and a 1-3 year outlook.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::config::{SavingsConfig, ScoringConfig};
use crate::cost::energy_cost;
use crate::domain::{CurrentPlan, Severity, UsageProjection};
use crate::savings::calculator::{SavingsAnalysis, SavingsCalculator};
use crate::scoring::{RankedPlan, ScoringEngine};

const OUTLOOK_YEARS: u32 = 3;
/// Sub-score gap that makes a pairwise difference worth a note.
const TRADE_OFF_GAP: f64 = 20.0;

/// One row of the side-by-side table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummaryRow {
    pub plan_id: String,
    pub is_current: bool,
    /// First-year cost, connection fee included for candidates.
    pub annual_cost: f64,
    pub contract_length_months: Option<u32>,
    pub early_termination_fee: f64,
    pub renewable_percentage: f64,
    pub supplier_rating: f64,
    pub annual_savings: Option<f64>,
}

/// Plan ids of the single best plan per category. The current plan competes
/// everywhere except best value, which only makes sense for a switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWinners {
    pub lowest_cost: Option<String>,
    pub highest_renewable: Option<String>,
    pub most_flexible: Option<String>,
    pub highest_rated: Option<String>,
    pub best_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOffNote {
    pub severity: Severity,
    pub message: String,
    pub affected_plan_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearCost {
    pub year: u32,
    pub cost: f64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiYearEntry {
    pub plan_id: String,
    pub yearly_costs: Vec<YearCost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanComparison {
    pub rows: Vec<PlanSummaryRow>,
    pub category_winners: CategoryWinners,
    pub trade_off_notes: Vec<TradeOffNote>,
    pub multi_year: Vec<MultiYearEntry>,
}

pub struct ComparisonBuilder {
    savings: SavingsCalculator,
    scoring: ScoringEngine,
    high_etf_threshold: f64,
}

impl ComparisonBuilder {
    pub fn new(savings_config: SavingsConfig, scoring_config: ScoringConfig) -> Self {
        Self {
            high_etf_threshold: savings_config.high_etf_threshold,
            savings: SavingsCalculator::new(savings_config),
            scoring: ScoringEngine::new(scoring_config),
        }
    }

    pub fn compare(
        &self,
        ranked: &[RankedPlan],
        current: &CurrentPlan,
        projection: &UsageProjection,
    ) -> PlanComparison {
        let analyses: Vec<_> = ranked
            .iter()
            .map(|plan| self.savings.analyze(current, plan, projection))
            .collect();

        let current_annual: f64 = projection
            .projected_monthly_kwh
            .iter()
            .map(|&kwh| energy_cost(kwh, &current.rate_structure) + current.monthly_fee)
            .sum();

        let mut rows: Vec<PlanSummaryRow> = ranked
            .iter()
            .zip(analyses.iter())
            .map(|(plan, analysis)| PlanSummaryRow {
                plan_id: plan.plan.plan_id.clone(),
                is_current: false,
                annual_cost: analysis.projected_annual_cost,
                contract_length_months: Some(plan.plan.contract_length_months),
                early_termination_fee: plan.plan.early_termination_fee,
                renewable_percentage: plan.plan.renewable_percentage,
                supplier_rating: plan.plan.supplier_rating,
                annual_savings: Some(analysis.annual_savings),
            })
            .collect();
        rows.push(PlanSummaryRow {
            plan_id: current.plan_id.clone(),
            is_current: true,
            annual_cost: current_annual,
            contract_length_months: None,
            early_termination_fee: current.early_termination_fee,
            renewable_percentage: current.renewable_percentage,
            supplier_rating: current.supplier_rating,
            annual_savings: None,
        });

        let category_winners = self.pick_winners(ranked, &analyses, current, current_annual);
        let trade_off_notes = self.trade_off_notes(ranked, &analyses);
        let multi_year = self.multi_year(ranked, &analyses, current, current_annual);

        PlanComparison {
            rows,
            category_winners,
            trade_off_notes,
            multi_year,
        }
    }

    fn pick_winners(
        &self,
        ranked: &[RankedPlan],
        analyses: &[SavingsAnalysis],
        current: &CurrentPlan,
        current_annual: f64,
    ) -> CategoryWinners {
        // (id, cost, renewable, flexibility, rating) across candidates + current
        let mut entries: Vec<(String, f64, f64, f64, f64)> = ranked
            .iter()
            .zip(analyses.iter())
            .map(|(plan, analysis)| {
                (
                    plan.plan.plan_id.clone(),
                    analysis.projected_annual_cost,
                    plan.plan.renewable_percentage,
                    plan.flexibility_score,
                    plan.plan.supplier_rating,
                )
            })
            .collect();
        // The current plan has no fixed term left to model, so its
        // flexibility reads as month-to-month with its exit fee.
        entries.push((
            current.plan_id.clone(),
            current_annual,
            current.renewable_percentage,
            self.scoring.flexibility_score(0, current.early_termination_fee),
            current.supplier_rating,
        ));

        let lowest_cost = entries
            .iter()
            .min_by_key(|e| (OrderedFloat(e.1), e.0.clone()))
            .map(|e| e.0.clone());
        let highest_renewable = entries
            .iter()
            .max_by_key(|e| (OrderedFloat(e.2), Reverse(e.0.clone())))
            .map(|e| e.0.clone());
        let most_flexible = entries
            .iter()
            .max_by_key(|e| (OrderedFloat(e.3), Reverse(e.0.clone())))
            .map(|e| e.0.clone());
        let highest_rated = entries
            .iter()
            .max_by_key(|e| (OrderedFloat(e.4), Reverse(e.0.clone())))
            .map(|e| e.0.clone());

        // Best value: candidates only, by composite score; ties go to the
        // plan whose savings best survive an amortized exit fee.
        let best_value = ranked
            .iter()
            .zip(analyses.iter())
            .max_by_key(|(plan, analysis)| {
                let risk_adjusted =
                    analysis.annual_savings - plan.plan.early_termination_fee / 12.0;
                (
                    OrderedFloat(plan.composite_score),
                    OrderedFloat(risk_adjusted),
                    Reverse(plan.plan.plan_id.clone()),
                )
            })
            .map(|(plan, _)| plan.plan.plan_id.clone());

        CategoryWinners {
            lowest_cost,
            highest_renewable,
            most_flexible,
            highest_rated,
            best_value,
        }
    }

    fn trade_off_notes(
        &self,
        ranked: &[RankedPlan],
        analyses: &[SavingsAnalysis],
    ) -> Vec<TradeOffNote> {
        let mut notes = Vec::new();
        if ranked.is_empty() {
            return notes;
        }

        let cheapest = ranked
            .iter()
            .zip(analyses.iter())
            .min_by_key(|(plan, a)| (OrderedFloat(a.projected_annual_cost), plan.plan.plan_id.clone()));

        if let Some((cheap, _)) = cheapest {
            if let Some(flexible) = ranked
                .iter()
                .max_by_key(|p| (OrderedFloat(p.flexibility_score), Reverse(p.plan.plan_id.clone())))
            {
                if flexible.plan.plan_id != cheap.plan.plan_id
                    && flexible.flexibility_score - cheap.flexibility_score > TRADE_OFF_GAP
                {
                    notes.push(TradeOffNote {
                        severity: Severity::Info,
                        message: format!(
                            "{} is the cheapest option but {} is easier to walk away from",
                            cheap.plan.plan_id, flexible.plan.plan_id
                        ),
                        affected_plan_ids: vec![
                            cheap.plan.plan_id.clone(),
                            flexible.plan.plan_id.clone(),
                        ],
                    });
                }
            }

            if let Some(greenest) = ranked
                .iter()
                .max_by_key(|p| (OrderedFloat(p.plan.renewable_percentage), Reverse(p.plan.plan_id.clone())))
            {
                if greenest.plan.plan_id != cheap.plan.plan_id
                    && greenest.plan.renewable_percentage - cheap.plan.renewable_percentage
                        > TRADE_OFF_GAP
                {
                    notes.push(TradeOffNote {
                        severity: Severity::Info,
                        message: format!(
                            "{} costs less while {} carries more renewable content",
                            cheap.plan.plan_id, greenest.plan.plan_id
                        ),
                        affected_plan_ids: vec![
                            cheap.plan.plan_id.clone(),
                            greenest.plan.plan_id.clone(),
                        ],
                    });
                }
            }
        }

        let high_etf: Vec<String> = ranked
            .iter()
            .filter(|p| p.plan.early_termination_fee > self.high_etf_threshold)
            .map(|p| p.plan.plan_id.clone())
            .collect();
        if !high_etf.is_empty() {
            notes.push(TradeOffNote {
                severity: Severity::Warning,
                message: format!(
                    "High early termination fees on: {}",
                    high_etf.join(", ")
                ),
                affected_plan_ids: high_etf,
            });
        }

        notes
    }

    fn multi_year(
        &self,
        ranked: &[RankedPlan],
        analyses: &[SavingsAnalysis],
        current: &CurrentPlan,
        current_annual: f64,
    ) -> Vec<MultiYearEntry> {
        let mut out: Vec<MultiYearEntry> = ranked
            .iter()
            .zip(analyses.iter())
            .map(|(plan, analysis)| {
                let recurring = analysis.projected_annual_cost - plan.plan.connection_fee;
                let contract = plan.plan.contract_length_months;
                let yearly_costs = (1..=OUTLOOK_YEARS)
                    .map(|year| {
                        let cost = if year == 1 {
                            recurring + plan.plan.connection_fee
                        } else {
                            recurring
                        };
                        let note = (contract > 0 && year * 12 > contract)
                            .then(|| "contract renewed (rates may change)".to_string());
                        YearCost { year, cost, note }
                    })
                    .collect();
                MultiYearEntry {
                    plan_id: plan.plan.plan_id.clone(),
                    yearly_costs,
                }
            })
            .collect();

        out.push(MultiYearEntry {
            plan_id: current.plan_id.clone(),
            yearly_costs: (1..=OUTLOOK_YEARS)
                .map(|year| YearCost { year, cost: current_annual, note: None })
                .collect(),
        });

        out
    }
}
