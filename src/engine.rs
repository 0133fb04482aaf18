//! Facade over the analysis pipeline.
//!
//! The surrounding system (web API, job runner) talks to exactly this type.
//! Every method is a pure function of its arguments plus the immutable
//! config captured at construction; the engine holds no per-request state
//! and is safe to share across threads and calls.

use tracing::info;
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::domain::{
    CurrentPlan, MonthlyUsage, PlanCandidate, RiskReport, UsageProfile, UsageProjection,
    UserPreferences,
};
use crate::profile::ProfileBuilder;
use crate::risk::RiskEngine;
use crate::savings::{ComparisonBuilder, PlanComparison, SavingsAnalysis, SavingsCalculator};
use crate::scoring::{RankedPlan, ScoringEngine};

pub struct RecommendationEngine {
    profile_builder: ProfileBuilder,
    scoring: ScoringEngine,
    savings: SavingsCalculator,
    comparison: ComparisonBuilder,
    risk: RiskEngine,
}

impl RecommendationEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            profile_builder: ProfileBuilder::new(config.profile.clone()),
            scoring: ScoringEngine::new(config.scoring.clone()),
            savings: SavingsCalculator::new(config.savings.clone()),
            comparison: ComparisonBuilder::new(config.savings, config.scoring),
            risk: RiskEngine::new(config.risk),
        }
    }

    /// Characterize a customer's usage and project it 12 months forward.
    pub fn analyze_usage(
        &self,
        usage_history: &[MonthlyUsage],
        user_id: Option<Uuid>,
        regional_avg_kwh: Option<f64>,
    ) -> UsageProfile {
        let profile = self.profile_builder.analyze(usage_history, user_id, regional_avg_kwh);
        info!(
            profile_type = %profile.profile_type,
            confidence = profile.overall_confidence,
            "usage profile built"
        );
        profile
    }

    /// Score and shortlist candidate plans against a profile.
    pub fn rank_plans(
        &self,
        candidate_plans: &[PlanCandidate],
        usage_profile: &UsageProfile,
        preferences: &UserPreferences,
        top_n: Option<usize>,
    ) -> Vec<RankedPlan> {
        self.scoring.rank(candidate_plans, usage_profile, preferences, top_n)
    }

    /// Full cost/savings/break-even picture for one shortlisted plan.
    pub fn calculate_savings(
        &self,
        current_plan: &CurrentPlan,
        ranked_plan: &RankedPlan,
        usage_projection: &UsageProjection,
    ) -> SavingsAnalysis {
        self.savings.analyze(current_plan, ranked_plan, usage_projection)
    }

    /// Side-by-side comparison of the shortlist plus the current plan.
    pub fn compare_plans(
        &self,
        ranked_plans: &[RankedPlan],
        current_plan: &CurrentPlan,
        usage_projection: &UsageProjection,
    ) -> PlanComparison {
        self.comparison.compare(ranked_plans, current_plan, usage_projection)
    }

    /// Run the risk rule battery and derive the stay-vs-switch call.
    pub fn detect_risks(
        &self,
        ranked_plans: &[RankedPlan],
        current_plan: &CurrentPlan,
        savings_analyses: &[SavingsAnalysis],
        usage_profile: &UsageProfile,
        preferences: &UserPreferences,
    ) -> RiskReport {
        let warnings = self.risk.detect(
            ranked_plans,
            current_plan,
            savings_analyses,
            usage_profile,
            preferences,
        );
        let overall_risk = self.risk.overall_level(&warnings);

        let top_plan = ranked_plans.first();
        let top_savings = top_plan.and_then(|top| {
            savings_analyses.iter().find(|s| s.plan_id == top.plan.plan_id)
        });
        let stay_recommendation = self.risk.should_recommend_staying(
            current_plan,
            top_plan,
            top_savings,
            &warnings,
            ranked_plans.len(),
            usage_profile,
        );

        info!(
            warnings = warnings.len(),
            overall_risk = %overall_risk,
            should_stay = stay_recommendation.should_stay,
            "risk assessment complete"
        );

        RiskReport {
            warnings,
            overall_risk,
            stay_recommendation,
        }
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
