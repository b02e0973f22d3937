use serde::Serialize;
use tracing::debug;

use super::costs::CostModel;
use super::inputs::ResolvedInputs;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueLine {
    pub gross: f64,
    pub risk_adjusted: f64,
}

impl ValueLine {
    fn new(gross: f64, risk_multiplier: f64) -> Self {
        Self { gross, risk_adjusted: gross * risk_multiplier }
    }

    fn sum(lines: &[ValueLine]) -> Self {
        lines.iter().fold(Self::default(), |acc, line| Self {
            gross: acc.gross + line.gross,
            risk_adjusted: acc.risk_adjusted + line.risk_adjusted,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueBreakdown {
    pub headcount: ValueLine,
    pub efficiency: ValueLine,
    pub error_reduction: ValueLine,
    pub tool_replacement: ValueLine,
    /// Efficiency, error reduction and tool replacement; no role is removed.
    pub enhancement: ValueLine,
    pub total: ValueLine,
    pub net_annual_savings: f64,
}

impl ValueBreakdown {
    pub fn build(inputs: &ResolvedInputs, costs: &CostModel) -> Self {
        let risk = costs.risk.risk_multiplier;
        let ap = costs.risk.automation_potential;
        let current = &costs.current;

        let headcount_gross = costs.workforce.displaced_ftes * inputs.avg_salary;
        let headcount = ValueLine::new(headcount_gross, risk);
        let efficiency = ValueLine::new((current.annual_labor_cost * ap - headcount_gross).max(0.0), risk);
        let error_reduction = ValueLine::new(current.annual_rework_cost * ap, risk);
        let tool_replacement =
            ValueLine::new(current.tool_cost * inputs.benchmarks.process_type.tool_replacement_rate, risk);

        let enhancement = ValueLine::sum(&[efficiency, error_reduction, tool_replacement]);
        let total = ValueLine::sum(&[headcount, enhancement]);
        let net_annual_savings = current.total_current_cost * ap * risk - costs.ongoing.effective;

        debug!(
            event_name = "engine.value.built",
            headcount = headcount.risk_adjusted,
            enhancement = enhancement.risk_adjusted,
            net_annual_savings,
            "value stack built"
        );

        Self {
            headcount,
            efficiency,
            error_reduction,
            tool_replacement,
            enhancement,
            total,
            net_annual_savings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ValueBreakdown;
    use crate::benchmarks::BenchmarkTables;
    use crate::engine::costs::CostModel;
    use crate::engine::inputs::{InputProfile, ResolvedInputs};

    fn breakdown(profile: InputProfile) -> (CostModel, ValueBreakdown) {
        let tables = BenchmarkTables::standard();
        let inputs = ResolvedInputs::resolve(&profile, &tables).expect("resolves");
        let costs = CostModel::build(&inputs);
        let value = ValueBreakdown::build(&inputs, &costs);
        (costs, value)
    }

    #[test]
    fn enhancement_excludes_headcount() {
        let (_, value) = breakdown(InputProfile { tool_cost: 20_000.0, ..InputProfile::default() });
        let expected = value.efficiency.gross + value.error_reduction.gross + value.tool_replacement.gross;
        assert!((value.enhancement.gross - expected).abs() < 1e-9);
        assert!((value.total.gross - value.enhancement.gross - value.headcount.gross).abs() < 1e-9);
    }

    #[test]
    fn every_line_is_discounted_by_the_risk_multiplier() {
        let (costs, value) = breakdown(InputProfile::default());
        let risk = costs.risk.risk_multiplier;
        for line in [value.headcount, value.efficiency, value.error_reduction, value.tool_replacement] {
            assert!((line.risk_adjusted - line.gross * risk).abs() < 1e-9);
        }
    }

    #[test]
    fn efficiency_value_is_never_negative() {
        let (_, value) = breakdown(InputProfile {
            team_size: 4.0,
            automation_potential: Some(0.05),
            ..InputProfile::default()
        });
        assert!(value.efficiency.gross >= 0.0);
    }

    #[test]
    fn net_savings_subtracts_ongoing_cost() {
        let (costs, value) = breakdown(InputProfile::default());
        let expected = costs.current.total_current_cost * costs.risk.automation_potential * costs.risk.risk_multiplier
            - costs.ongoing.effective;
        assert!((value.net_annual_savings - expected).abs() < 1e-6);
    }
}
