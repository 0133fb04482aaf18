//! Energy cost model.
//!
//! Pure functions mapping (kWh, rate structure) to a dollar amount for one
//! billing period. Used by scoring, savings and comparison alike so the same
//! kWh always prices identically everywhere.
//!
//! Known simplification: time-of-use plans are priced at the plain average of
//! peak and off-peak rates because no hourly load curve is modeled. Variable
//! plans are priced at their current base rate; their uncertainty is expressed
//! as a band in the savings analysis, not baked into the point estimate.

use crate::domain::{RateStructure, RateTier};

/// Cost in dollars of `kwh` under `rate` for one billing period,
/// energy charges only (no fixed fees).
pub fn energy_cost(kwh: f64, rate: &RateStructure) -> f64 {
    let kwh = kwh.max(0.0);
    match rate {
        RateStructure::Fixed { rate_cents_per_kwh } => kwh * rate_cents_per_kwh / 100.0,
        RateStructure::Tiered { tiers } => tiered_cost(kwh, tiers),
        RateStructure::TimeOfUse {
            peak_rate_cents_per_kwh,
            off_peak_rate_cents_per_kwh,
        } => {
            let blended = (peak_rate_cents_per_kwh + off_peak_rate_cents_per_kwh) / 2.0;
            kwh * blended / 100.0
        }
        RateStructure::Variable {
            current_rate_cents_per_kwh,
            ..
        } => kwh * current_rate_cents_per_kwh / 100.0,
    }
}

/// One month's bill: energy charges plus the recurring monthly fee.
pub fn monthly_cost(kwh: f64, rate: &RateStructure, monthly_fee: f64) -> f64 {
    energy_cost(kwh, rate) + monthly_fee
}

/// Effective cents/kWh a structure works out to at a given annual volume.
/// Used for human-readable assumptions on the savings analysis.
pub fn average_rate_cents(annual_kwh: f64, rate: &RateStructure) -> f64 {
    if annual_kwh <= 0.0 {
        return 0.0;
    }
    energy_cost(annual_kwh, rate) / annual_kwh * 100.0
}

fn tiered_cost(kwh: f64, tiers: &[RateTier]) -> f64 {
    let mut remaining = kwh;
    let mut prev_limit = 0.0_f64;
    let mut cost = 0.0_f64;

    for tier in tiers {
        if remaining <= 0.0 {
            break;
        }
        let capacity = match tier.limit_kwh {
            Some(limit) => (limit - prev_limit).max(0.0),
            None => remaining,
        };
        let band = remaining.min(capacity);
        cost += band * tier.rate_cents_per_kwh / 100.0;
        remaining -= band;
        if let Some(limit) = tier.limit_kwh {
            prev_limit = limit;
        }
    }

    // A validated structure ends in an unbounded tier, so nothing is left;
    // an unvalidated one silently prices the overflow at the last tier rate.
    if remaining > 0.0 {
        if let Some(last) = tiers.last() {
            cost += remaining * last.rate_cents_per_kwh / 100.0;
        }
    }

    cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tiered() -> RateStructure {
        RateStructure::Tiered {
            tiers: vec![
                RateTier { limit_kwh: Some(500.0), rate_cents_per_kwh: 8.0 },
                RateTier { limit_kwh: Some(1000.0), rate_cents_per_kwh: 11.0 },
                RateTier { limit_kwh: None, rate_cents_per_kwh: 14.0 },
            ],
        }
    }

    #[test]
    fn test_fixed_rate() {
        let rate = RateStructure::Fixed { rate_cents_per_kwh: 12.5 };
        assert!((energy_cost(800.0, &rate) - 100.0).abs() < 1e-9);
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(300.0, 24.0)] // entirely in the first tier
    #[case(500.0, 40.0)] // exactly the first tier
    #[case(800.0, 73.0)] // 500 @ 8c + 300 @ 11c
    #[case(1200.0, 123.0)] // 500 @ 8c + 500 @ 11c + 200 @ 14c
    fn test_tiered_walk(#[case] kwh: f64, #[case] expected: f64) {
        assert!((energy_cost(kwh, &tiered()) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_time_of_use_is_peak_offpeak_average() {
        let rate = RateStructure::TimeOfUse {
            peak_rate_cents_per_kwh: 18.0,
            off_peak_rate_cents_per_kwh: 8.0,
        };
        // 13c blended
        assert!((energy_cost(1000.0, &rate) - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_variable_uses_current_rate() {
        let rate = RateStructure::Variable { current_rate_cents_per_kwh: 10.0, indexed: false };
        assert!((energy_cost(900.0, &rate) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_cost_adds_fee() {
        let rate = RateStructure::Fixed { rate_cents_per_kwh: 10.0 };
        assert!((monthly_cost(1000.0, &rate, 9.95) - 109.95).abs() < 1e-9);
    }

    #[test]
    fn test_average_rate_reflects_tier_blend() {
        let avg = average_rate_cents(1200.0, &tiered());
        assert!((avg - 10.25).abs() < 1e-9);
    }

    #[test]
    fn test_negative_kwh_clamped_to_zero() {
        let rate = RateStructure::Fixed { rate_cents_per_kwh: 10.0 };
        assert_eq!(energy_cost(-5.0, &rate), 0.0);
    }
}
