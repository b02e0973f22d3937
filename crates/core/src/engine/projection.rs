use serde::Serialize;

use super::costs::CostModel;
use super::metrics::{self, NO_BREAK_EVEN};
use super::value::ValueBreakdown;
use crate::benchmarks::{ModelConstants, YearBenchmark};
use crate::config::SolverConfig;

/// The handful of scalars a projection depends on. Scenarios and the
/// sensitivity sweep are projections over perturbed copies of this.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionDrivers {
    pub enhancement_risk_adjusted: f64,
    pub headcount_risk_adjusted: f64,
    pub separation_cost: f64,
    pub ongoing_cost: f64,
    pub upfront_investment: f64,
    pub discount_rate: f64,
    pub wage_inflation: f64,
}

impl ProjectionDrivers {
    pub fn new(costs: &CostModel, value: &ValueBreakdown, constants: &ModelConstants) -> Self {
        Self {
            enhancement_risk_adjusted: value.enhancement.risk_adjusted,
            headcount_risk_adjusted: value.headcount.risk_adjusted,
            separation_cost: costs.separation_cost,
            ongoing_cost: costs.ongoing.effective,
            upfront_investment: costs.upfront_investment,
            discount_rate: costs.risk.discount_rate,
            wage_inflation: constants.wage_inflation,
        }
    }

    pub fn total_investment(&self) -> f64 {
        self.upfront_investment + self.separation_cost
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearProjection {
    pub year: u32,
    pub adoption_ramp: f64,
    pub cumulative_hr_reduction: f64,
    pub wage_growth: f64,
    pub enhancement_savings: f64,
    pub headcount_savings: f64,
    pub gross_savings: f64,
    pub separation_cost: f64,
    pub ongoing_cost: f64,
    pub net_cash_flow: f64,
    pub cumulative_cash_flow: f64,
    pub present_value: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub multiplier: f64,
    pub projections: Vec<YearProjection>,
    /// Year 0 through year N, year 0 being the upfront outflow.
    pub cash_flows: Vec<f64>,
    pub npv: f64,
    /// NaN (serialised as `null`) when no rate solves the series.
    pub irr: f64,
    pub irr_converged: bool,
    pub irr_capped: bool,
    pub roic: f64,
    pub roic_capped: bool,
    pub payback_months: Option<f64>,
    pub payback_label: String,
}

pub fn wage_growth(wage_inflation: f64, year: u32) -> f64 {
    (1.0 + wage_inflation).powi(year as i32 - 1)
}

/// Projects the drivers over the schedule with savings scaled by `multiplier`.
pub fn project(
    drivers: &ProjectionDrivers,
    schedule: &[YearBenchmark],
    multiplier: f64,
    solver: &SolverConfig,
    constants: &ModelConstants,
) -> ScenarioResult {
    let mut cash_flows = Vec::with_capacity(schedule.len() + 1);
    cash_flows.push(-drivers.upfront_investment);

    let mut cumulative = -drivers.upfront_investment;
    let projections: Vec<YearProjection> = schedule
        .iter()
        .map(|row| {
            let growth = wage_growth(drivers.wage_inflation, row.year);
            let enhancement_savings = drivers.enhancement_risk_adjusted * row.adoption_ramp * multiplier * growth;
            let headcount_savings =
                drivers.headcount_risk_adjusted * row.cumulative_hr_reduction * multiplier * growth;
            let gross_savings = enhancement_savings + headcount_savings;
            let separation_cost = drivers.separation_cost * row.hr_reduction_this_year;
            let ongoing_cost = drivers.ongoing_cost * row.cumulative_escalation;
            let net_cash_flow = gross_savings - separation_cost - ongoing_cost;
            cumulative += net_cash_flow;
            cash_flows.push(net_cash_flow);

            YearProjection {
                year: row.year,
                adoption_ramp: row.adoption_ramp,
                cumulative_hr_reduction: row.cumulative_hr_reduction,
                wage_growth: growth,
                enhancement_savings,
                headcount_savings,
                gross_savings,
                separation_cost,
                ongoing_cost,
                net_cash_flow,
                cumulative_cash_flow: cumulative,
                present_value: net_cash_flow / (1.0 + drivers.discount_rate).powi(row.year as i32),
            }
        })
        .collect();

    let npv = metrics::npv(drivers.discount_rate, &cash_flows);
    let irr = metrics::irr(&cash_flows, solver, constants.irr_cap);
    let (roic, roic_capped) = metrics::roic(
        &cash_flows,
        drivers.upfront_investment,
        drivers.total_investment(),
        constants.roic_cap,
    );
    let payback_months = metrics::payback_months(&cash_flows)
        .filter(|months| *months <= f64::from(constants.dcf_years) * metrics::MONTHS_PER_YEAR);
    let payback_label = match payback_months {
        Some(months) => format!("{months:.1} months"),
        None => NO_BREAK_EVEN.to_owned(),
    };

    ScenarioResult {
        multiplier,
        projections,
        cash_flows,
        npv,
        irr: irr.rate,
        irr_converged: irr.converged,
        irr_capped: irr.capped,
        roic,
        roic_capped,
        payback_months,
        payback_label,
    }
}

#[cfg(test)]
mod tests {
    use super::{project, wage_growth, ProjectionDrivers};
    use crate::benchmarks::{BenchmarkTables, ModelConstants};
    use crate::config::SolverConfig;

    fn drivers() -> ProjectionDrivers {
        ProjectionDrivers {
            enhancement_risk_adjusted: 300_000.0,
            headcount_risk_adjusted: 200_000.0,
            separation_cost: 50_000.0,
            ongoing_cost: 80_000.0,
            upfront_investment: 400_000.0,
            discount_rate: 0.12,
            wage_inflation: 0.04,
        }
    }

    fn run(multiplier: f64) -> super::ScenarioResult {
        let tables = BenchmarkTables::standard();
        project(&drivers(), &tables.year_schedule, multiplier, &SolverConfig::default(), &ModelConstants::default())
    }

    #[test]
    fn year_zero_is_the_upfront_outflow_only() {
        let scenario = run(1.0);
        assert_eq!(scenario.cash_flows.len(), 6);
        assert_eq!(scenario.cash_flows[0], -400_000.0);
        assert_eq!(scenario.projections.len(), 5);
    }

    #[test]
    fn first_year_has_no_separation_outflow_and_no_headcount_savings() {
        let first = &run(1.0).projections[0];
        assert_eq!(first.separation_cost, 0.0);
        assert_eq!(first.headcount_savings, 0.0);
        assert_eq!(first.wage_growth, 1.0);
    }

    #[test]
    fn separations_are_phased_and_fully_paid() {
        let scenario = run(1.0);
        let paid: f64 = scenario.projections.iter().map(|year| year.separation_cost).sum();
        assert!((paid - 50_000.0).abs() < 1e-6);
    }

    #[test]
    fn savings_grow_with_wage_inflation() {
        let scenario = run(1.0);
        let fifth = &scenario.projections[4];
        let expected = 300_000.0 * 1.0 * 1.04_f64.powi(4);
        assert!((fifth.enhancement_savings - expected).abs() < 1e-6);
        assert!((wage_growth(0.04, 3) - 1.0816).abs() < 1e-12);
    }

    #[test]
    fn npv_is_monotone_in_the_multiplier() {
        let conservative = run(0.7);
        let base = run(1.0);
        let optimistic = run(1.2);
        assert!(conservative.npv <= base.npv);
        assert!(base.npv <= optimistic.npv);
    }

    #[test]
    fn costs_do_not_change_across_scenarios() {
        let conservative = run(0.7);
        let optimistic = run(1.2);
        for (low, high) in conservative.projections.iter().zip(&optimistic.projections) {
            assert_eq!(low.ongoing_cost, high.ongoing_cost);
            assert_eq!(low.separation_cost, high.separation_cost);
        }
    }

    #[test]
    fn cumulative_series_ends_at_the_undiscounted_total() {
        let scenario = run(1.0);
        let total: f64 = scenario.cash_flows.iter().sum();
        let last = scenario.projections.last().map(|year| year.cumulative_cash_flow).unwrap_or_default();
        assert!((total - last).abs() < 1e-6);
    }

    #[test]
    fn losing_projection_reports_no_break_even() {
        let mut losing = drivers();
        losing.enhancement_risk_adjusted = 10_000.0;
        losing.headcount_risk_adjusted = 0.0;
        let tables = BenchmarkTables::standard();
        let scenario =
            project(&losing, &tables.year_schedule, 1.0, &SolverConfig::default(), &ModelConstants::default());
        assert_eq!(scenario.payback_months, None);
        assert_eq!(scenario.payback_label, "No break-even within 5 years");
        assert!(scenario.roic >= -1.0);
    }
}
