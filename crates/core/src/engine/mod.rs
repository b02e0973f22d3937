//! Core Calculation Engine
//!
//! A deterministic, stateless function of an [`InputProfile`] and a set of
//! [`BenchmarkTables`]. The pipeline runs in dependency order:
//!
//! 1. resolve inputs (archetype merge, clamping, benchmark lookups)
//! 2. build the cost stack, then the value stack
//! 3. project each scenario and derive NPV, IRR, ROIC and payback
//! 4. derive analytics that never feed back into the headline metrics

pub mod analytics;
pub mod costs;
pub mod inputs;
pub mod metrics;
pub mod projection;
pub mod value;

use serde::Serialize;
use tracing::debug;

use crate::archetypes::ArchetypeOverrides;
use crate::benchmarks::BenchmarkTables;
use crate::config::SolverConfig;
use crate::errors::EngineError;

pub use analytics::{
    ConfidenceIntervals, Interval, OpportunityCost, PaybackInterval, PeerComparison, Quartile, RdTaxCredit,
    RevenueEnablement, ScalabilityPremium, SensitivityEntry, SensitivityVariable, ThresholdAnalysis,
};
pub use costs::CostModel;
pub use inputs::{InputProfile, ResolvedInputs};
pub use projection::{ProjectionDrivers, ScenarioResult, YearProjection};
pub use value::{ValueBreakdown, ValueLine};

pub const DISCLAIMERS: [&str; 4] = [
    "Projections are estimates derived from industry benchmarks and the inputs provided; actual results will vary.",
    "Revenue enablement is informational and excluded from NPV, IRR and ROIC.",
    "The R&D tax credit figure is an informational estimate, not tax advice. Consult a qualified tax professional.",
    "Separation costs are modelled for planning purposes only and are not legal or HR guidance.",
];

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenarios {
    pub conservative: ScenarioResult,
    pub base: ScenarioResult,
    pub optimistic: ScenarioResult,
}

impl Scenarios {
    pub fn all(&self) -> [&ScenarioResult; 3] {
        [&self.conservative, &self.base, &self.optimistic]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub cost_model: CostModel,
    pub value_breakdown: ValueBreakdown,
    pub scenarios: Scenarios,
    pub expected_npv: f64,
    pub confidence_intervals: ConfidenceIntervals,
    pub sensitivity: Vec<SensitivityEntry>,
    pub peer_comparison: PeerComparison,
    pub opportunity_cost: OpportunityCost,
    pub scalability_premium: ScalabilityPremium,
    pub rd_tax_credit: RdTaxCredit,
    pub revenue_enablement: RevenueEnablement,
    pub threshold_analysis: ThresholdAnalysis,
    pub archetype_id: Option<String>,
    pub applied_overrides: ArchetypeOverrides,
    pub benchmark_version: String,
    pub disclaimers: Vec<String>,
}

/// Engine bound to one benchmark set. Cheap to construct; holds no state
/// between calls.
#[derive(Clone, Copy, Debug)]
pub struct RoiEngine<'a> {
    tables: &'a BenchmarkTables,
    solver: SolverConfig,
}

impl<'a> RoiEngine<'a> {
    pub fn new(tables: &'a BenchmarkTables) -> Self {
        Self { tables, solver: SolverConfig::default() }
    }

    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn tables(&self) -> &'a BenchmarkTables {
        self.tables
    }

    pub fn calculate(&self, profile: &InputProfile) -> Result<CalculationResult, EngineError> {
        let inputs = ResolvedInputs::resolve(profile, self.tables)?;
        let constants = &inputs.constants;

        let cost_model = CostModel::build(&inputs);
        let value_breakdown = ValueBreakdown::build(&inputs, &cost_model);
        let drivers = ProjectionDrivers::new(&cost_model, &value_breakdown, constants);

        let scenario = |multiplier: f64| {
            projection::project(&drivers, &inputs.benchmarks.schedule, multiplier, &self.solver, constants)
        };
        let scenarios = Scenarios {
            conservative: scenario(constants.conservative_multiplier),
            base: scenario(constants.base_multiplier),
            optimistic: scenario(constants.optimistic_multiplier),
        };
        let expected_npv = scenarios.conservative.npv * constants.conservative_weight
            + scenarios.base.npv * constants.base_weight
            + scenarios.optimistic.npv * constants.optimistic_weight;

        debug!(
            event_name = "engine.scenarios.projected",
            conservative_npv = scenarios.conservative.npv,
            base_npv = scenarios.base.npv,
            optimistic_npv = scenarios.optimistic.npv,
            base_roic = scenarios.base.roic,
            base_irr = scenarios.base.irr,
            expected_npv,
            "scenarios projected"
        );

        let sensitivity = analytics::sensitivity(&drivers, &cost_model, &inputs, &self.solver);
        let confidence_intervals = analytics::confidence_intervals(&scenarios, &sensitivity);
        let peer_comparison = analytics::peer_comparison(scenarios.base.roic, inputs.benchmarks.peer_roic);
        let opportunity_cost = analytics::opportunity_cost(&inputs, &cost_model, &value_breakdown);
        let scalability_premium = analytics::scalability_premium(constants, &cost_model);
        let rd_tax_credit = analytics::rd_tax_credit(&inputs, &cost_model);
        let revenue_enablement = analytics::revenue_enablement(&inputs, &cost_model);
        let threshold_analysis = analytics::threshold_analysis(&drivers, &scenarios.base, &inputs);
        analytics::log_summary(&confidence_intervals, &peer_comparison, &opportunity_cost);

        Ok(CalculationResult {
            cost_model,
            value_breakdown,
            scenarios,
            expected_npv,
            confidence_intervals,
            sensitivity,
            peer_comparison,
            opportunity_cost,
            scalability_premium,
            rd_tax_credit,
            revenue_enablement,
            threshold_analysis,
            archetype_id: inputs.archetype_id.clone(),
            applied_overrides: inputs.applied_overrides.clone(),
            benchmark_version: self.tables.version.clone(),
            disclaimers: DISCLAIMERS.iter().map(|line| (*line).to_owned()).collect(),
        })
    }
}

pub fn calculate_roi(profile: &InputProfile, tables: &BenchmarkTables) -> Result<CalculationResult, EngineError> {
    RoiEngine::new(tables).calculate(profile)
}
