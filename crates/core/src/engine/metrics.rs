//! Discounted cash-flow metrics over a year-0-first cash-flow series.

use serde::Serialize;

use crate::config::SolverConfig;
use crate::formula::spreadsheet_round;

pub const MONTHS_PER_YEAR: f64 = 12.0;
pub const NO_BREAK_EVEN: &str = "No break-even within 5 years";

/// Grid resolution used to bracket a sign change before bisecting.
const IRR_SCAN_STEPS: u32 = 400;

pub fn npv(rate: f64, cash_flows: &[f64]) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .map(|(year, cash_flow)| cash_flow / (1.0 + rate).powi(year as i32))
        .sum()
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrOutcome {
    /// Clamped rate; NaN when no root was found.
    pub rate: f64,
    pub converged: bool,
    pub capped: bool,
}

/// Internal rate of return by bracket scan and bisection.
///
/// Reports NaN rather than a forced value when the NPV curve has no sign
/// change inside the configured bracket or bisection runs out of iterations.
pub fn irr(cash_flows: &[f64], solver: &SolverConfig, cap: f64) -> IrrOutcome {
    let not_found = IrrOutcome { rate: f64::NAN, converged: false, capped: false };

    let Some((mut low, mut high)) = bracket(cash_flows, solver) else {
        return not_found;
    };
    let mut npv_low = npv(low, cash_flows);

    for _ in 0..solver.irr_max_iterations {
        let mid = (low + high) / 2.0;
        let npv_mid = npv(mid, cash_flows);
        if npv_mid.abs() <= solver.irr_tolerance || (high - low) / 2.0 <= solver.irr_tolerance {
            let capped = mid.abs() > cap;
            return IrrOutcome { rate: mid.clamp(-cap, cap), converged: true, capped };
        }
        if npv_mid.signum() == npv_low.signum() {
            low = mid;
            npv_low = npv_mid;
        } else {
            high = mid;
        }
    }
    not_found
}

fn bracket(cash_flows: &[f64], solver: &SolverConfig) -> Option<(f64, f64)> {
    let step = (solver.irr_upper_bound - solver.irr_lower_bound) / f64::from(IRR_SCAN_STEPS);
    let mut low = solver.irr_lower_bound;
    let mut npv_low = npv(low, cash_flows);
    if npv_low == 0.0 {
        return Some((low, low));
    }

    for index in 1..=IRR_SCAN_STEPS {
        let high = solver.irr_lower_bound + step * f64::from(index);
        let npv_high = npv(high, cash_flows);
        if !npv_high.is_finite() {
            return None;
        }
        if npv_high == 0.0 || npv_high.signum() != npv_low.signum() {
            return Some((low, high));
        }
        low = high;
        npv_low = npv_high;
    }
    None
}

/// Month of first break-even on the undiscounted cumulative series,
/// interpolated inside the crossing year and rounded to 0.1.
pub fn payback_months(cash_flows: &[f64]) -> Option<f64> {
    let (first, rest) = cash_flows.split_first()?;
    let mut cumulative = *first;
    if cumulative >= 0.0 {
        return Some(0.0);
    }

    for (index, cash_flow) in rest.iter().enumerate() {
        let previous = cumulative;
        cumulative += cash_flow;
        if previous < 0.0 && cumulative >= 0.0 {
            let months = index as f64 * MONTHS_PER_YEAR + (-previous / cash_flow) * MONTHS_PER_YEAR;
            return Some(spreadsheet_round(months, 1));
        }
    }
    None
}

/// `(Σ years 1..n − upfront) / total investment`, clamped to `±cap`.
/// Returns the ratio and whether the clamp bound.
pub fn roic(cash_flows: &[f64], upfront_investment: f64, total_investment: f64, cap: f64) -> (f64, bool) {
    if total_investment == 0.0 {
        return (0.0, false);
    }
    let returns: f64 = cash_flows.iter().skip(1).sum();
    let raw = (returns - upfront_investment) / total_investment;
    let clamped = raw.clamp(-cap, cap);
    (clamped, clamped != raw)
}
