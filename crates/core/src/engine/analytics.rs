//! Derived analytics over the cost model and scenario projections. None of
//! these feed back into NPV, IRR or ROIC.

use serde::Serialize;
use tracing::debug;

use super::costs::CostModel;
use super::inputs::ResolvedInputs;
use super::projection::{project, ProjectionDrivers, ScenarioResult};
use super::value::ValueBreakdown;
use super::Scenarios;
use crate::benchmarks::{ModelConstants, PeerDistribution};
use crate::config::SolverConfig;
use crate::formula::spreadsheet_round;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SensitivityVariable {
    SavingsRealization,
    ImplementationCost,
    OngoingCost,
    SeparationCost,
    WageInflation,
    DiscountRate,
}

impl SensitivityVariable {
    pub const ALL: [SensitivityVariable; 6] = [
        Self::SavingsRealization,
        Self::ImplementationCost,
        Self::OngoingCost,
        Self::SeparationCost,
        Self::WageInflation,
        Self::DiscountRate,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::SavingsRealization => "Savings realization (±20%)",
            Self::ImplementationCost => "Implementation cost (±25%)",
            Self::OngoingCost => "Ongoing cost (±20%)",
            Self::SeparationCost => "Separation cost (±30%)",
            Self::WageInflation => "Wage inflation (2% / 6%)",
            Self::DiscountRate => "Discount rate (±2 pp)",
        }
    }

    /// Low and high perturbations of the base drivers.
    fn perturb(&self, base: &ProjectionDrivers, implementation_cost: f64) -> [ProjectionDrivers; 2] {
        let mut low = *base;
        let mut high = *base;
        match self {
            Self::SavingsRealization => {
                low.enhancement_risk_adjusted *= 0.8;
                low.headcount_risk_adjusted *= 0.8;
                high.enhancement_risk_adjusted *= 1.2;
                high.headcount_risk_adjusted *= 1.2;
            }
            Self::ImplementationCost => {
                low.upfront_investment -= implementation_cost * 0.25;
                high.upfront_investment += implementation_cost * 0.25;
            }
            Self::OngoingCost => {
                low.ongoing_cost *= 0.8;
                high.ongoing_cost *= 1.2;
            }
            Self::SeparationCost => {
                low.separation_cost *= 0.7;
                high.separation_cost *= 1.3;
            }
            Self::WageInflation => {
                low.wage_inflation = 0.02;
                high.wage_inflation = 0.06;
            }
            Self::DiscountRate => {
                low.discount_rate = (base.discount_rate - 0.02).max(0.0);
                high.discount_rate = base.discount_rate + 0.02;
            }
        }
        [low, high]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityEntry {
    pub variable: SensitivityVariable,
    pub label: String,
    pub low_npv: f64,
    pub high_npv: f64,
    pub low_roic: f64,
    pub high_roic: f64,
    pub low_payback_months: Option<f64>,
    pub high_payback_months: Option<f64>,
    /// `|high − low|` NPV, the tornado bar length.
    pub npv_swing: f64,
}

/// One-at-a-time sweep on the base multiplier, widest swing first.
pub fn sensitivity(
    drivers: &ProjectionDrivers,
    costs: &CostModel,
    inputs: &ResolvedInputs,
    solver: &SolverConfig,
) -> Vec<SensitivityEntry> {
    let constants = &inputs.constants;
    let schedule = &inputs.benchmarks.schedule;

    let mut entries: Vec<SensitivityEntry> = SensitivityVariable::ALL
        .iter()
        .map(|variable| {
            let [low, high] = variable
                .perturb(drivers, costs.implementation.realistic)
                .map(|perturbed| project(&perturbed, schedule, constants.base_multiplier, solver, constants));
            SensitivityEntry {
                variable: *variable,
                label: variable.label().to_owned(),
                low_npv: low.npv,
                high_npv: high.npv,
                low_roic: low.roic,
                high_roic: high.roic,
                low_payback_months: low.payback_months,
                high_payback_months: high.payback_months,
                npv_swing: (high.npv - low.npv).abs(),
            }
        })
        .collect();

    entries.sort_by(|left, right| right.npv_swing.total_cmp(&left.npv_swing));
    entries
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub low: f64,
    pub base: f64,
    pub high: f64,
}

impl Interval {
    fn envelope(base: f64, values: impl IntoIterator<Item = f64>) -> Self {
        values.into_iter().fold(Self { low: base, base, high: base }, |acc, value| Self {
            low: acc.low.min(value),
            base,
            high: acc.high.max(value),
        })
    }
}

/// Payback bounds; `None` on a bound means no break-even inside the horizon.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaybackInterval {
    pub earliest: Option<f64>,
    pub base: Option<f64>,
    pub latest: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceIntervals {
    pub npv: Interval,
    pub roic: Interval,
    pub payback_months: PaybackInterval,
}

pub fn confidence_intervals(scenarios: &Scenarios, sweep: &[SensitivityEntry]) -> ConfidenceIntervals {
    let all = scenarios.all();

    let npv = Interval::envelope(
        scenarios.base.npv,
        all.iter()
            .map(|scenario| scenario.npv)
            .chain(sweep.iter().flat_map(|entry| [entry.low_npv, entry.high_npv])),
    );
    let roic = Interval::envelope(
        scenarios.base.roic,
        all.iter()
            .map(|scenario| scenario.roic)
            .chain(sweep.iter().flat_map(|entry| [entry.low_roic, entry.high_roic])),
    );

    let paybacks: Vec<Option<f64>> = all
        .iter()
        .map(|scenario| scenario.payback_months)
        .chain(sweep.iter().flat_map(|entry| [entry.low_payback_months, entry.high_payback_months]))
        .collect();
    let earliest = paybacks.iter().flatten().copied().reduce(f64::min);
    let latest = if paybacks.iter().any(Option::is_none) {
        None
    } else {
        paybacks.iter().flatten().copied().reduce(f64::max)
    };

    ConfidenceIntervals {
        npv,
        roic,
        payback_months: PaybackInterval { earliest, base: scenarios.base.payback_months, latest },
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Quartile {
    Bottom,
    LowerMiddle,
    UpperMiddle,
    Top,
}

impl Quartile {
    fn of(percentile: f64) -> Self {
        if percentile < 25.0 {
            Self::Bottom
        } else if percentile < 50.0 {
            Self::LowerMiddle
        } else if percentile < 75.0 {
            Self::UpperMiddle
        } else {
            Self::Top
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerComparison {
    pub roic: f64,
    pub peers: PeerDistribution,
    pub percentile: f64,
    pub quartile: Quartile,
}

/// Percentile rank of `roic` in a three-point peer distribution: linear
/// between quartiles, exponential tails outside them.
pub fn peer_percentile(roic: f64, peers: &PeerDistribution) -> f64 {
    let lower_spread = (peers.median - peers.p25).max(f64::EPSILON);
    let upper_spread = (peers.p75 - peers.median).max(f64::EPSILON);

    let raw = if roic <= peers.p25 {
        25.0 * (-(peers.p25 - roic) / lower_spread).exp()
    } else if roic <= peers.median {
        25.0 + 25.0 * (roic - peers.p25) / lower_spread
    } else if roic <= peers.p75 {
        50.0 + 25.0 * (roic - peers.median) / upper_spread
    } else {
        75.0 + 25.0 * (1.0 - (-(roic - peers.p75) / upper_spread).exp())
    };
    spreadsheet_round(raw.clamp(0.0, 100.0), 1)
}

pub fn peer_comparison(roic: f64, peers: PeerDistribution) -> PeerComparison {
    let percentile = peer_percentile(roic, &peers);
    PeerComparison { roic, peers, percentile, quartile: Quartile::of(percentile) }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InactionYear {
    pub year: u32,
    pub forgone_savings: f64,
    pub wage_inflation_loss: f64,
    pub legacy_creep_loss: f64,
    pub competitive_penalty_loss: f64,
    pub compliance_risk_loss: f64,
    pub total: f64,
    pub cumulative: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityCost {
    pub years: Vec<InactionYear>,
    pub twelve_month_total: f64,
    pub twenty_four_month_total: f64,
    pub five_year_total: f64,
    pub monthly_cost_of_delay: f64,
}

/// Compounding growth over `year` years: `(1 + rate)^year − 1`.
pub fn compounded(rate: f64, year: u32) -> f64 {
    (1.0 + rate).powi(year as i32) - 1.0
}

pub fn opportunity_cost(inputs: &ResolvedInputs, costs: &CostModel, value: &ValueBreakdown) -> OpportunityCost {
    let constants = &inputs.constants;
    let industry = &inputs.benchmarks.industry;
    let current = &costs.current;
    let forgone_base = value.net_annual_savings.max(0.0);

    let mut cumulative = 0.0;
    let years: Vec<InactionYear> = inputs
        .benchmarks
        .schedule
        .iter()
        .map(|row| {
            let forgone_savings = forgone_base * row.adoption_ramp;
            let wage_inflation_loss = current.annual_labor_cost * compounded(constants.wage_inflation, row.year);
            let legacy_creep_loss = (current.tool_cost + current.annual_rework_cost)
                * compounded(constants.legacy_creep_rate, row.year);
            let competitive_penalty_loss =
                current.total_current_cost * compounded(industry.competitive_penalty_rate, row.year);
            let compliance_risk_loss =
                current.total_current_cost * compounded(industry.compliance_risk_rate, row.year);
            let total = forgone_savings
                + wage_inflation_loss
                + legacy_creep_loss
                + competitive_penalty_loss
                + compliance_risk_loss;
            cumulative += total;
            InactionYear {
                year: row.year,
                forgone_savings,
                wage_inflation_loss,
                legacy_creep_loss,
                competitive_penalty_loss,
                compliance_risk_loss,
                total,
                cumulative,
            }
        })
        .collect();

    let through = |year: u32| years.iter().filter(|row| row.year <= year).map(|row| row.total).sum::<f64>();
    let twelve_month_total = through(1);

    OpportunityCost {
        twelve_month_total,
        twenty_four_month_total: through(2),
        five_year_total: through(constants.dcf_years),
        monthly_cost_of_delay: twelve_month_total / 12.0,
        years,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueScenario {
    pub gross: f64,
    pub risk_adjusted: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueEnablement {
    pub conservative: RevenueScenario,
    pub base: RevenueScenario,
    pub optimistic: RevenueScenario,
    pub archetype_revenue_impact: f64,
    pub risk_discount: f64,
    /// Reported only; never added to savings or cash flows.
    pub risk_reduction: f64,
    pub informational: bool,
}

pub fn revenue_enablement(inputs: &ResolvedInputs, costs: &CostModel) -> RevenueEnablement {
    let constants = &inputs.constants;
    let total_current = costs.current.total_current_cost;
    let scenario = |uplift: f64| {
        let gross = uplift * total_current + inputs.revenue_impact;
        RevenueScenario { gross, risk_adjusted: gross * (1.0 - constants.revenue_risk_discount) }
    };
    let [conservative, base, optimistic] = inputs.benchmarks.industry.revenue_uplift;

    RevenueEnablement {
        conservative: scenario(conservative),
        base: scenario(base),
        optimistic: scenario(optimistic),
        archetype_revenue_impact: inputs.revenue_impact,
        risk_discount: constants.revenue_risk_discount,
        risk_reduction: inputs.risk_reduction,
        informational: true,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RdTaxCredit {
    pub qualified_spend: f64,
    pub federal_rate: f64,
    pub state_rate: f64,
    pub federal_credit: f64,
    pub state_credit: f64,
    pub total_credit: f64,
    pub informational: bool,
}

pub fn rd_tax_credit(inputs: &ResolvedInputs, costs: &CostModel) -> RdTaxCredit {
    let constants = &inputs.constants;
    let qualified_spend = costs.implementation.realistic * constants.rd_qualification_rate;
    let federal_credit = qualified_spend * constants.federal_rd_rate;
    let state_credit = qualified_spend * inputs.benchmarks.rd_credit_rate;
    RdTaxCredit {
        qualified_spend,
        federal_rate: constants.federal_rd_rate,
        state_rate: inputs.benchmarks.rd_credit_rate,
        federal_credit,
        state_credit,
        total_credit: federal_credit + state_credit,
        informational: true,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleTier {
    pub volume_multiple: f64,
    pub traditional_cost: f64,
    pub ai_incremental_cost: f64,
    pub premium: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalabilityPremium {
    pub tiers: Vec<ScaleTier>,
}

/// Extra cost avoided when volume grows: linear re-hiring against marginal
/// API spend plus a per-tier ongoing uplift.
pub fn scalability_premium(constants: &ModelConstants, costs: &CostModel) -> ScalabilityPremium {
    let tiers = constants
        .scale_tiers
        .iter()
        .map(|multiple| {
            let growth = multiple - 1.0;
            let traditional_cost = costs.current.total_current_cost * growth;
            let ai_incremental_cost =
                costs.ongoing.api * growth + costs.ongoing.effective * constants.scale_ongoing_uplift * growth;
            ScaleTier {
                volume_multiple: *multiple,
                traditional_cost,
                ai_incremental_cost,
                premium: (traditional_cost - ai_incremental_cost).max(0.0),
            }
        })
        .collect();
    ScalabilityPremium { tiers }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdAnalysis {
    pub present_value_of_savings: f64,
    pub present_value_of_costs: f64,
    /// Savings multiplier at which base NPV reaches zero.
    pub break_even_savings_multiplier: Option<f64>,
    pub margin_of_safety: Option<f64>,
    pub max_upfront_investment: f64,
    pub max_ongoing_cost: f64,
}

pub fn threshold_analysis(
    drivers: &ProjectionDrivers,
    base: &ScenarioResult,
    inputs: &ResolvedInputs,
) -> ThresholdAnalysis {
    let discount = |year: u32| (1.0 + drivers.discount_rate).powi(year as i32);

    let present_value_of_savings: f64 = base
        .projections
        .iter()
        .map(|year| year.gross_savings / base.multiplier / discount(year.year))
        .sum();
    let present_value_of_costs = drivers.upfront_investment
        + base
            .projections
            .iter()
            .map(|year| (year.separation_cost + year.ongoing_cost) / discount(year.year))
            .sum::<f64>();
    let escalation_factor: f64 = inputs
        .benchmarks
        .schedule
        .iter()
        .map(|row| row.cumulative_escalation / discount(row.year))
        .sum();

    let break_even_savings_multiplier =
        (present_value_of_savings > 0.0).then(|| present_value_of_costs / present_value_of_savings);

    ThresholdAnalysis {
        present_value_of_savings,
        present_value_of_costs,
        break_even_savings_multiplier,
        margin_of_safety: break_even_savings_multiplier.map(|multiplier| 1.0 - multiplier),
        max_upfront_investment: drivers.upfront_investment + base.npv,
        max_ongoing_cost: if escalation_factor > 0.0 {
            drivers.ongoing_cost + base.npv / escalation_factor
        } else {
            drivers.ongoing_cost
        },
    }
}

pub fn log_summary(intervals: &ConfidenceIntervals, peer: &PeerComparison, inaction: &OpportunityCost) {
    debug!(
        event_name = "engine.analytics.built",
        npv_low = intervals.npv.low,
        npv_high = intervals.npv.high,
        peer_percentile = peer.percentile,
        monthly_cost_of_delay = inaction.monthly_cost_of_delay,
        "analytics built"
    );
}

#[cfg(test)]
mod tests {
    use super::{compounded, peer_percentile, Quartile};
    use crate::benchmarks::PeerDistribution;

    const PEERS: PeerDistribution = PeerDistribution { p25: 0.10, median: 0.35, p75: 0.65 };

    #[test]
    fn percentile_hits_quartile_anchors() {
        assert_eq!(peer_percentile(0.10, &PEERS), 25.0);
        assert_eq!(peer_percentile(0.35, &PEERS), 50.0);
        assert_eq!(peer_percentile(0.65, &PEERS), 75.0);
    }

    #[test]
    fn percentile_interpolates_between_anchors() {
        assert_eq!(peer_percentile(0.225, &PEERS), 37.5);
        assert_eq!(peer_percentile(0.50, &PEERS), 62.5);
    }

    #[test]
    fn tails_flatten_and_stay_in_range() {
        let high = peer_percentile(1.0, &PEERS);
        let higher = peer_percentile(5.0, &PEERS);
        assert!(high > 75.0 && high < 100.0);
        assert!(higher >= high && higher <= 100.0);

        let low = peer_percentile(-0.2, &PEERS);
        let lower = peer_percentile(-1.0, &PEERS);
        assert!(low < 25.0 && low > 0.0);
        assert!(lower <= low && lower >= 0.0);
    }

    #[test]
    fn percentile_is_monotone() {
        let mut previous = -1.0;
        for step in -20..=20 {
            let percentile = peer_percentile(f64::from(step) * 0.05, &PEERS);
            assert!(percentile >= previous);
            previous = percentile;
        }
    }

    #[test]
    fn quartile_labels_follow_percentile() {
        assert_eq!(Quartile::of(10.0), Quartile::Bottom);
        assert_eq!(Quartile::of(25.0), Quartile::LowerMiddle);
        assert_eq!(Quartile::of(74.9), Quartile::UpperMiddle);
        assert_eq!(Quartile::of(75.0), Quartile::Top);
    }

    #[test]
    fn losses_compound_rather_than_accrue() {
        assert_eq!(compounded(0.1, 0), 0.0);
        assert!((compounded(0.1, 2) - 0.21).abs() < 1e-12);
    }
}
