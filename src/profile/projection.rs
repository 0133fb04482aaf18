//! 12-month forward usage projection.
//!
//! Method selection, in priority order: per-season averages when a seasonal
//! pattern was detected with enough confidence, a linear trend when the
//! series correlates strongly with time, a 6-month moving average when there
//! is at least half a year of history, and the overall mean below that.
//! Every method returns exactly 12 values with a 95% confidence band.

use chrono::Datelike;
use tracing::debug;

use crate::config::ProfileConfig;
use crate::domain::{
    next_month, MonthlyUsage, ProjectionMethod, Season, SeasonalAnalysis, UsageProjection,
};
use crate::profile::statistics::sample_std_dev;

const HORIZON_MONTHS: usize = 12;
const Z_95: f64 = 1.96;
/// Band width stand-in when the series is too short for a standard deviation.
const SINGLE_POINT_SIGMA_FRACTION: f64 = 0.15;

const MOVING_AVERAGE_CONFIDENCE: f64 = 0.7;
const SIMPLE_AVERAGE_CONFIDENCE: f64 = 0.6;
const INSUFFICIENT_DATA_CONFIDENCE: f64 = 0.3;

/// Project the next 12 calendar months from a cleaned, sorted series of at
/// least 3 months.
pub fn project(
    usage: &[MonthlyUsage],
    seasonal: &SeasonalAnalysis,
    config: &ProfileConfig,
) -> UsageProjection {
    let values: Vec<f64> = usage.iter().map(|u| u.kwh()).collect();
    let n = values.len();
    let mean = if n > 0 { values.iter().sum::<f64>() / n as f64 } else { 0.0 };
    let completeness = (n as f64 / 12.0).min(1.0);

    let (monthly, method, base_confidence, mut assumptions) = if seasonal.has_seasonal_pattern
        && seasonal.confidence_score >= config.seasonal_projection_confidence
    {
        let last_month = usage.last().map(|u| u.month());
        let mut months = Vec::with_capacity(HORIZON_MONTHS);
        let mut cursor = last_month.unwrap_or_default();
        for _ in 0..HORIZON_MONTHS {
            cursor = next_month(cursor);
            months.push(cursor);
        }
        let season_avg = |s: Season| {
            seasonal
                .patterns
                .iter()
                .find(|p| p.season == s)
                .map(|p| p.avg_kwh)
                .unwrap_or(mean)
        };
        let monthly: Vec<f64> = months
            .iter()
            .map(|m| season_avg(Season::from_month(m.month())))
            .collect();
        (
            monthly,
            ProjectionMethod::SeasonalAverage,
            seasonal.confidence_score,
            vec![format!(
                "Each projected month uses its season's historical average (summer/winter ratio {:.2})",
                seasonal.summer_to_winter_ratio
            )],
        )
    } else if n >= config.seasonal_min_months {
        let (slope, intercept, r) = linear_regression(&values);
        if r.abs() > config.trend_correlation_threshold {
            let monthly: Vec<f64> = (1..=HORIZON_MONTHS)
                .map(|i| (intercept + slope * (n - 1 + i) as f64).max(0.0))
                .collect();
            let direction = if slope >= 0.0 { "increasing" } else { "decreasing" };
            (
                monthly,
                ProjectionMethod::LinearTrend,
                r.abs(),
                vec![format!(
                    "Usage trend is {direction} by {:.1} kWh/month (r = {:.2}); trend extended 12 months",
                    slope.abs(),
                    r
                )],
            )
        } else {
            let window = config.moving_average_window.min(n);
            let recent = &values[n - window..];
            let avg = recent.iter().sum::<f64>() / window as f64;
            (
                vec![avg; HORIZON_MONTHS],
                ProjectionMethod::MovingAverage,
                MOVING_AVERAGE_CONFIDENCE,
                vec![format!("No strong trend or seasonal pattern; average of the last {window} months applied")],
            )
        }
    } else {
        (
            vec![mean; HORIZON_MONTHS],
            ProjectionMethod::SimpleAverage,
            SIMPLE_AVERAGE_CONFIDENCE,
            vec![format!("Only {n} months of history; overall average applied to all projected months")],
        )
    };

    let sigma = if n >= 2 {
        sample_std_dev(&values, mean)
    } else {
        mean * SINGLE_POINT_SIGMA_FRACTION
    };
    assumptions.push(format!(
        "95% confidence band of +/-{:.0} kWh around each projected month",
        Z_95 * sigma
    ));

    let confidence_score = (base_confidence * completeness).clamp(0.0, 1.0);

    debug!(
        method = %method,
        months = n,
        confidence = confidence_score,
        "usage projection complete"
    );

    build_projection(monthly, sigma, confidence_score, method, assumptions)
}

/// Projection used when history is too thin to analyze: a single fallback
/// figure (regional average if the caller has one, otherwise the raw mean)
/// repeated across the horizon at very low confidence.
pub fn project_insufficient(fallback_kwh: f64, observed_months: usize) -> UsageProjection {
    let fallback = fallback_kwh.max(0.0);
    let sigma = fallback * SINGLE_POINT_SIGMA_FRACTION;
    let completeness = (observed_months as f64 / 12.0).min(1.0);
    let confidence = (INSUFFICIENT_DATA_CONFIDENCE * completeness).clamp(0.0, 1.0);

    build_projection(
        vec![fallback; HORIZON_MONTHS],
        sigma,
        confidence,
        ProjectionMethod::InsufficientDataAverage,
        vec![format!(
            "Fewer than 3 months observed; {fallback:.0} kWh/month assumed for the full horizon"
        )],
    )
}

fn build_projection(
    monthly: Vec<f64>,
    sigma: f64,
    confidence_score: f64,
    method: ProjectionMethod,
    assumptions: Vec<String>,
) -> UsageProjection {
    debug_assert_eq!(monthly.len(), HORIZON_MONTHS);
    let confidence_lower: Vec<f64> = monthly.iter().map(|v| (v - Z_95 * sigma).max(0.0)).collect();
    let confidence_upper: Vec<f64> = monthly.iter().map(|v| v + Z_95 * sigma).collect();
    let projected_annual_kwh = monthly.iter().sum();

    UsageProjection {
        projected_monthly_kwh: monthly,
        projected_annual_kwh,
        confidence_lower,
        confidence_upper,
        confidence_score,
        method,
        assumptions,
    }
}

/// Least-squares fit of kWh against month index, returning
/// (slope, intercept, Pearson r). Degenerate series fit flat with r = 0.
fn linear_regression(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    if values.len() < 2 {
        return (0.0, values.first().copied().unwrap_or(0.0), 0.0);
    }

    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xx: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();

    let denom_x = n * sum_xx - sum_x * sum_x;
    if denom_x.abs() < f64::EPSILON {
        return (0.0, sum_y / n, 0.0);
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom_x;
    let intercept = (sum_y - slope * sum_x) / n;

    let mean_y = sum_y / n;
    let var_y: f64 = values.iter().map(|y| (y - mean_y).powi(2)).sum();
    let var_x: f64 = (0..values.len())
        .map(|i| (i as f64 - sum_x / n).powi(2))
        .sum();
    if var_y < f64::EPSILON || var_x < f64::EPSILON {
        return (slope, intercept, 0.0);
    }

    let cov: f64 = values
        .iter()
        .enumerate()
        .map(|(i, y)| (i as f64 - sum_x / n) * (y - mean_y))
        .sum();
    let r = cov / (var_x.sqrt() * var_y.sqrt());

    (slope, intercept, r.clamp(-1.0, 1.0))
}
