//! End-to-end flow through the four public contracts: profile, ranking,
//! savings, risk.

use chrono::NaiveDate;
use tariff_advisor::config::AnalysisConfig;
use tariff_advisor::domain::{
    CurrentPlan, MonthlyUsage, PlanCandidate, ProfileType, RateStructure, RateTier, RiskType,
    Season, UserPreferences,
};
use tariff_advisor::RecommendationEngine;
use uuid::Uuid;

fn month(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).unwrap()
}

/// Two years of summer-peaking usage.
fn seasonal_usage() -> Vec<MonthlyUsage> {
    let mut out = Vec::new();
    for year in [2023, 2024] {
        for m in 1..=12u32 {
            let kwh = match Season::from_month(m) {
                Season::Winter => 850.0,
                Season::Spring => 950.0,
                Season::Summer => 1400.0,
                Season::Fall => 900.0,
            };
            out.push(MonthlyUsage::new(month(year, m), kwh).unwrap());
        }
    }
    out
}

fn current_plan() -> CurrentPlan {
    CurrentPlan {
        plan_id: "incumbent".into(),
        rate_structure: RateStructure::Fixed { rate_cents_per_kwh: 13.8 },
        monthly_fee: 5.0,
        renewable_percentage: 15.0,
        supplier_rating: 3.2,
        early_termination_fee: 0.0,
        contract_end_date: None,
    }
}

fn catalog() -> Vec<PlanCandidate> {
    vec![
        PlanCandidate {
            plan_id: "fixed-value".into(),
            supplier_name: "Value Power".into(),
            rate_structure: RateStructure::Fixed { rate_cents_per_kwh: 10.8 },
            contract_length_months: 12,
            early_termination_fee: 100.0,
            renewable_percentage: 30.0,
            monthly_fee: 4.95,
            connection_fee: 25.0,
            supplier_rating: 4.1,
            risk_flags: Vec::new(),
        },
        PlanCandidate {
            plan_id: "green-choice".into(),
            supplier_name: "Green Choice".into(),
            rate_structure: RateStructure::Fixed { rate_cents_per_kwh: 12.4 },
            contract_length_months: 24,
            early_termination_fee: 200.0,
            renewable_percentage: 100.0,
            monthly_fee: 0.0,
            connection_fee: 0.0,
            supplier_rating: 4.6,
            risk_flags: Vec::new(),
        },
        PlanCandidate {
            plan_id: "market-rider".into(),
            supplier_name: "Rider Energy".into(),
            rate_structure: RateStructure::Variable {
                current_rate_cents_per_kwh: 9.9,
                indexed: true,
            },
            contract_length_months: 0,
            early_termination_fee: 0.0,
            renewable_percentage: 20.0,
            monthly_fee: 9.95,
            connection_fee: 0.0,
            supplier_rating: 3.8,
            risk_flags: vec!["introductory rate expires after 3 months".into()],
        },
        PlanCandidate {
            plan_id: "tiered-saver".into(),
            supplier_name: "Stepwise".into(),
            rate_structure: RateStructure::Tiered {
                tiers: vec![
                    RateTier { limit_kwh: Some(500.0), rate_cents_per_kwh: 9.0 },
                    RateTier { limit_kwh: Some(1000.0), rate_cents_per_kwh: 11.5 },
                    RateTier { limit_kwh: None, rate_cents_per_kwh: 13.5 },
                ],
            },
            contract_length_months: 12,
            early_termination_fee: 175.0,
            renewable_percentage: 25.0,
            monthly_fee: 0.0,
            connection_fee: 30.0,
            supplier_rating: 3.9,
            risk_flags: Vec::new(),
        },
    ]
}

#[test]
fn full_pipeline_produces_consistent_recommendation() {
    let engine = RecommendationEngine::default();
    let preferences = UserPreferences {
        cost_priority: 50.0,
        flexibility_priority: 15.0,
        renewable_priority: 20.0,
        rating_priority: 15.0,
    };

    let user_id = Uuid::new_v4();
    let profile = engine.analyze_usage(&seasonal_usage(), Some(user_id), None);
    assert_eq!(profile.user_id, Some(user_id));
    assert_eq!(profile.profile_type, ProfileType::Seasonal);
    assert_eq!(profile.seasonal_analysis.dominant_season, Some(Season::Summer));
    assert_eq!(profile.projection.projected_monthly_kwh.len(), 12);
    assert!(profile.projection.projected_monthly_kwh.iter().all(|&v| v >= 0.0));

    let ranked = engine.rank_plans(&catalog(), &profile, &preferences, None);
    assert_eq!(ranked.len(), 3); // default shortlist
    assert!(ranked.windows(2).all(|w| w[0].composite_score >= w[1].composite_score));
    assert_eq!(ranked[0].rank, 1);

    let current = current_plan();
    let analyses: Vec<_> = ranked
        .iter()
        .map(|plan| engine.calculate_savings(&current, plan, &profile.projection))
        .collect();
    for analysis in &analyses {
        assert_eq!(analysis.monthly_breakdown.len(), 12);
        let sum: f64 = analysis.monthly_breakdown.iter().map(|m| m.total_cost).sum();
        assert!((sum - analysis.projected_annual_cost).abs() < 0.01);
    }

    let comparison = engine.compare_plans(&ranked, &current, &profile.projection);
    assert_eq!(comparison.rows.len(), ranked.len() + 1);
    assert!(comparison.category_winners.best_value.is_some());

    let report = engine.detect_risks(&ranked, &current, &analyses, &profile, &preferences);
    assert!(report
        .stay_recommendation
        .triggers
        .iter()
        .all(|t| !t.is_empty()));
    // the cheapest plan clears the marginal-savings bar comfortably
    if !report.stay_recommendation.should_stay {
        assert!(report.stay_recommendation.net_annual_savings.unwrap_or(0.0) > 0.0);
    }
}

#[test]
fn savings_scenario_matches_rate_spread() {
    // 13.8c -> 10.8c at 13,320 kWh/yr clears 10% savings easily.
    let engine = RecommendationEngine::default();
    let usage: Vec<MonthlyUsage> = (1..=12).map(|m| {
        MonthlyUsage::new(month(2024, m), 1110.0).unwrap()
    }).collect();
    let profile = engine.analyze_usage(&usage, None, None);
    assert!((profile.projection.projected_annual_kwh - 13_320.0).abs() < 1.0);

    let mut plan = catalog()[0].clone();
    plan.monthly_fee = 0.0;
    plan.connection_fee = 0.0;
    let mut current = current_plan();
    current.monthly_fee = 0.0;

    let ranked = engine.rank_plans(&[plan], &profile, &UserPreferences::balanced(), None);
    let analysis = engine.calculate_savings(&current, &ranked[0], &profile.projection);

    assert!(analysis.annual_savings > 0.0);
    assert!(analysis.savings_percentage > 10.0);
}

#[test]
fn flat_usage_projects_flat() {
    let engine = RecommendationEngine::default();
    let usage: Vec<MonthlyUsage> =
        (1..=12).map(|m| MonthlyUsage::new(month(2024, m), 800.0).unwrap()).collect();

    let profile = engine.analyze_usage(&usage, None, None);
    assert!(!profile.seasonal_analysis.has_seasonal_pattern);
    assert_eq!(profile.profile_type, ProfileType::Baseline);
    assert!((profile.projection.projected_annual_kwh - 9600.0).abs() < 1e-6);
}

#[test]
fn two_months_of_history_degrades_gracefully() {
    let engine = RecommendationEngine::default();
    let usage = vec![
        MonthlyUsage::new(month(2024, 11), 700.0).unwrap(),
        MonthlyUsage::new(month(2024, 12), 750.0).unwrap(),
    ];

    let profile = engine.analyze_usage(&usage, None, Some(900.0));
    assert_eq!(profile.profile_type, ProfileType::InsufficientData);
    assert!(profile.overall_confidence < 0.5);
    assert_eq!(profile.projection.projected_monthly_kwh, vec![900.0; 12]);

    // ranking still works against the fallback projection
    let ranked = engine.rank_plans(&catalog(), &profile, &UserPreferences::balanced(), None);
    assert!(!ranked.is_empty());
}

#[test]
fn empty_catalog_recommends_staying() {
    let engine = RecommendationEngine::default();
    let usage: Vec<MonthlyUsage> =
        (1..=12).map(|m| MonthlyUsage::new(month(2024, m), 900.0).unwrap()).collect();
    let profile = engine.analyze_usage(&usage, None, None);

    let ranked = engine.rank_plans(&[], &profile, &UserPreferences::balanced(), None);
    assert!(ranked.is_empty());

    let report = engine.detect_risks(&ranked, &current_plan(), &[], &profile, &UserPreferences::balanced());
    assert!(report.stay_recommendation.should_stay);
    assert!(report
        .stay_recommendation
        .triggers
        .contains(&"no_alternatives".to_string()));
}

#[test]
fn variable_plan_carries_volatility_warning_through_report() {
    let engine = RecommendationEngine::default();
    let usage: Vec<MonthlyUsage> =
        (1..=12).map(|m| MonthlyUsage::new(month(2024, m), 1000.0).unwrap()).collect();
    let profile = engine.analyze_usage(&usage, None, None);

    let variable_only: Vec<PlanCandidate> = catalog()
        .into_iter()
        .filter(|p| p.plan_id == "market-rider")
        .collect();
    let ranked = engine.rank_plans(&variable_only, &profile, &UserPreferences::balanced(), None);
    let current = current_plan();
    let analyses = vec![engine.calculate_savings(&current, &ranked[0], &profile.projection)];

    let report = engine.detect_risks(&ranked, &current, &analyses, &profile, &UserPreferences::balanced());
    assert!(report.warnings.iter().any(|w| w.risk_type == RiskType::RateVolatility));
    assert!(report.warnings.iter().any(|w| w.risk_type == RiskType::PlanFlag));

    let analysis = &analyses[0];
    let (low, high) = analysis.uncertainty_range.unwrap();
    assert!(low < analysis.projected_annual_cost && analysis.projected_annual_cost < high);
}

#[test]
fn ranking_is_deterministic_across_calls() {
    let engine = RecommendationEngine::default();
    let profile = engine.analyze_usage(&seasonal_usage(), None, None);
    let prefs = UserPreferences::balanced();

    let first = engine.rank_plans(&catalog(), &profile, &prefs, Some(4));
    let second = engine.rank_plans(&catalog(), &profile, &prefs, Some(4));
    let first_ids: Vec<_> = first.iter().map(|p| p.plan.plan_id.clone()).collect();
    let second_ids: Vec<_> = second.iter().map(|p| p.plan.plan_id.clone()).collect();
    assert_eq!(first_ids, second_ids);
}

#[test]
fn config_is_tunable() {
    // Raising the marginal-savings bar flips a borderline switch to a stay.
    let mut config = AnalysisConfig::default();
    config.risk.marginal_savings_pct = 40.0;
    let engine = RecommendationEngine::new(config);

    let usage: Vec<MonthlyUsage> =
        (1..=12).map(|m| MonthlyUsage::new(month(2024, m), 1000.0).unwrap()).collect();
    let profile = engine.analyze_usage(&usage, None, None);
    let ranked = engine.rank_plans(&catalog(), &profile, &UserPreferences::balanced(), None);
    let current = current_plan();
    let analyses: Vec<_> = ranked
        .iter()
        .map(|p| engine.calculate_savings(&current, p, &profile.projection))
        .collect();

    let report = engine.detect_risks(&ranked, &current, &analyses, &profile, &UserPreferences::balanced());
    assert!(report.stay_recommendation.should_stay);
    assert!(report
        .stay_recommendation
        .triggers
        .contains(&"marginal_savings".to_string()));
}
