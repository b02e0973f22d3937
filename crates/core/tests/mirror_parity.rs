use std::collections::BTreeSet;

use roicast_core::engine::ResolvedInputs;
use roicast_core::mirror::{CellContent, WorkbookValues};
use roicast_core::{
    archetypes, build_workbook, calculate_roi, get_archetype_input_defaults, map_archetype_to_overrides,
    ArchetypeAnswers, BenchmarkTables, InputProfile, Tab,
};
use serde_json::{json, Value};

type MirrorParityTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($condition:expr, $($arg:tt)+) => {
        if !$condition {
            return Err(format!($($arg)+));
        }
    };
}

fn close(left: f64, right: f64) -> bool {
    if left.is_nan() || right.is_nan() {
        return left.is_nan() && right.is_nan();
    }
    (left - right).abs() <= 1e-6 * left.abs().max(right.abs()).max(1.0)
}

fn require_cell(values: &WorkbookValues, id: &str, expected: f64, label: &str) -> MirrorParityTestResult {
    let actual = values.get(id).ok_or_else(|| format!("{label}: workbook has no cell `{id}`"))?;
    require!(close(actual, expected), "{label}: `{id}` is {actual}, engine says {expected}");
    Ok(())
}

fn evaluate(profile: &InputProfile, tables: &BenchmarkTables) -> MirrorParityTestResult<WorkbookValues> {
    build_workbook(profile, tables)
        .and_then(|workbook| workbook.evaluate().map_err(Into::into))
        .map_err(|error| error.to_string())
}

fn profiles() -> Vec<(String, InputProfile)> {
    let base = InputProfile::default();
    let mut profiles = vec![
        ("default".to_owned(), base.clone()),
        (
            "flat legacy payload".to_owned(),
            InputProfile {
                team_size: 10.0,
                avg_salary: 100_000.0,
                hours_per_week: 20.0,
                error_rate: 0.10,
                ..base.clone()
            },
        ),
        (
            "no sponsor, weak data".to_owned(),
            InputProfile {
                has_exec_sponsor: false,
                data_readiness: 1.0,
                change_readiness: 2.0,
                location: "US - Major Metro".to_owned(),
                ..base.clone()
            },
        ),
        (
            "enterprise with budget".to_owned(),
            InputProfile {
                company_size: "Enterprise (5000+)".to_owned(),
                industry: "Financial Services".to_owned(),
                process_type: "Financial Reporting".to_owned(),
                team_size: 120.0,
                avg_salary: 95_000.0,
                tool_cost: 250_000.0,
                stated_budget: 3_500_000.0,
                stated_ongoing_cost: 400_000.0,
                vendors_to_replace: 2.0,
                vendor_termination_cost: 60_000.0,
                expected_timeline_months: 3.0,
                state: "California".to_owned(),
                ..base.clone()
            },
        ),
        (
            "flat overrides, fractional readiness".to_owned(),
            InputProfile {
                automation_potential: Some(0.3),
                revenue_impact: Some(40_000.0),
                risk_reduction: Some(0.1),
                change_readiness: 2.6,
                data_readiness: 4.4,
                expected_timeline_months: 0.5,
                ..base.clone()
            },
        ),
        (
            "archetype over flat override".to_owned(),
            InputProfile {
                automation_potential: Some(0.3),
                archetype_id: Some("claims-processing".to_owned()),
                archetype_inputs: json!({ "notAnInput": 4 }).as_object().cloned().unwrap_or_default(),
                ..base.clone()
            },
        ),
        (
            "startup, tiny team".to_owned(),
            InputProfile {
                company_size: "Startup (1-50)".to_owned(),
                team_size: 2.0,
                hours_per_week: 10.0,
                avg_salary: 55_000.0,
                ..base.clone()
            },
        ),
    ];

    for schema in archetypes() {
        let answers: ArchetypeAnswers = get_archetype_input_defaults(schema.id.as_str())
            .into_iter()
            .filter_map(|(key, value)| serde_json::Number::from_f64(value).map(|number| (key, Value::Number(number))))
            .collect();
        profiles.push((
            format!("archetype {}", schema.id),
            InputProfile {
                process_type: schema.process_type.to_owned(),
                archetype_id: Some(schema.id.as_str().to_owned()),
                archetype_inputs: answers,
                ..base.clone()
            },
        ));
    }
    profiles
}

fn check_parity(
    label: &str,
    profile: &InputProfile,
    tables: &BenchmarkTables,
    values: &WorkbookValues,
) -> MirrorParityTestResult {
    let result = calculate_roi(profile, tables).map_err(|error| format!("{label}: {error}"))?;
    let resolved = ResolvedInputs::resolve(profile, tables).map_err(|error| format!("{label}: {error}"))?;

    require_cell(values, "calc.hours_per_week", resolved.hours_per_week, label)?;
    require_cell(values, "calc.error_rate", resolved.error_rate, label)?;
    require_cell(values, "calc.tool_cost", resolved.tool_cost, label)?;
    require_cell(values, "calc.timeline_months", resolved.timeline_months, label)?;
    require_cell(values, "calc.automation_potential", resolved.automation_potential, label)?;
    require_cell(values, "calc.revenue_impact", resolved.revenue_impact, label)?;
    require_cell(values, "calc.risk_reduction", resolved.risk_reduction, label)?;
    require_cell(values, "calc.adoption_rate", resolved.benchmarks.change_readiness.adoption_rate, label)?;
    require_cell(
        values,
        "calc.data_timeline_multiplier",
        resolved.benchmarks.data_readiness.timeline_multiplier,
        label,
    )?;
    require_cell(values, "calc.data_cost_multiplier", resolved.benchmarks.data_readiness.cost_multiplier, label)?;
    if let Some(id) = profile.archetype_id.as_deref() {
        let overrides = map_archetype_to_overrides(id, &profile.archetype_inputs);
        require!(!overrides.is_empty(), "{label}: archetype produced no overrides");
        for (field, value) in overrides {
            require_cell(values, &format!("calc.mapped.{}", field.as_str()), value, label)?;
        }
    }

    let costs = &result.cost_model;
    require_cell(values, "calc.annual_labor_cost", costs.current.annual_labor_cost, label)?;
    require_cell(values, "calc.total_current_cost", costs.current.total_current_cost, label)?;
    require_cell(values, "calc.displaced_ftes", costs.workforce.displaced_ftes, label)?;
    require_cell(values, "calc.implementation_realistic", costs.implementation.realistic, label)?;
    require_cell(values, "calc.ongoing_effective", costs.ongoing.effective, label)?;
    require_cell(values, "calc.hidden_total", costs.hidden.total, label)?;
    require_cell(values, "calc.upfront_investment", costs.upfront_investment, label)?;
    require_cell(values, "calc.separation_cost", costs.separation_cost, label)?;
    require_cell(values, "calc.total_investment", costs.total_investment, label)?;

    let scenarios = [
        ("conservative", &result.scenarios.conservative),
        ("base", &result.scenarios.base),
        ("optimistic", &result.scenarios.optimistic),
    ];
    for (key, scenario) in scenarios {
        require_cell(values, &format!("scenarios.{key}.npv"), scenario.npv, label)?;
        require_cell(values, &format!("scenarios.{key}.roic"), scenario.roic, label)?;
        require_cell(
            values,
            &format!("scenarios.{key}.payback_months"),
            scenario.payback_months.unwrap_or(f64::NAN),
            label,
        )?;
        for year in &scenario.projections {
            let cell = |field: &str| format!("dcf.{key}.{field}.y{}", year.year);
            require_cell(values, &cell("gross_savings"), year.gross_savings, label)?;
            require_cell(values, &cell("net_cash_flow"), year.net_cash_flow, label)?;
            require_cell(values, &cell("present_value"), year.present_value, label)?;
            require_cell(values, &cell("cumulative_cash_flow"), year.cumulative_cash_flow, label)?;
        }
    }
    require_cell(values, "scenarios.expected_npv", result.expected_npv, label)?;

    let inaction = &result.opportunity_cost;
    require_cell(values, "inaction.twelve_month_total", inaction.twelve_month_total, label)?;
    require_cell(values, "inaction.twenty_four_month_total", inaction.twenty_four_month_total, label)?;
    require_cell(values, "inaction.five_year_total", inaction.five_year_total, label)?;
    require_cell(values, "inaction.monthly_cost_of_delay", inaction.monthly_cost_of_delay, label)?;

    let revenue = &result.revenue_enablement;
    require_cell(values, "revenue.base.risk_adjusted", revenue.base.risk_adjusted, label)?;
    require_cell(values, "revenue.rd_total_credit", result.rd_tax_credit.total_credit, label)?;
    for tier in &result.scalability_premium.tiers {
        require_cell(values, &format!("revenue.scale_{}x.premium", tier.volume_multiple), tier.premium, label)?;
    }

    let thresholds = &result.threshold_analysis;
    require_cell(values, "dashboard.peer_percentile", result.peer_comparison.percentile, label)?;
    require_cell(values, "dashboard.present_value_of_costs", thresholds.present_value_of_costs, label)?;
    require_cell(values, "dashboard.max_upfront_investment", thresholds.max_upfront_investment, label)?;
    require_cell(values, "dashboard.max_ongoing_cost", thresholds.max_ongoing_cost, label)?;
    Ok(())
}

#[test]
fn workbook_matches_engine_for_every_profile() -> MirrorParityTestResult {
    let tables = BenchmarkTables::standard();
    for (label, profile) in profiles() {
        let values = evaluate(&profile, &tables).map_err(|error| format!("{label}: {error}"))?;
        check_parity(&label, &profile, &tables, &values)?;
    }
    Ok(())
}

#[test]
fn calculated_cells_are_formulas_over_inputs_and_lookups() -> MirrorParityTestResult {
    let workbook =
        build_workbook(&InputProfile::default(), &BenchmarkTables::standard()).map_err(|error| error.to_string())?;

    for cell in workbook.cells() {
        let calculated = matches!(
            cell.tab,
            Tab::CalcEngine
                | Tab::FiveYearDcf
                | Tab::Scenarios
                | Tab::OpportunityCost
                | Tab::RevenueAndScale
                | Tab::Dashboard
        );
        if calculated {
            require!(
                matches!(cell.content, CellContent::Formula(_)),
                "{} on {} is a literal",
                cell.id,
                cell.tab.title()
            );
        } else {
            require!(
                !matches!(cell.content, CellContent::Formula(_)),
                "{} on {} should be a plain value",
                cell.id,
                cell.tab.title()
            );
        }
    }
    Ok(())
}

#[test]
fn editing_input_cells_recalculates_like_a_fresh_profile() -> MirrorParityTestResult {
    let tables = BenchmarkTables::standard();
    let before = InputProfile::default();
    let mut workbook = build_workbook(&before, &tables).map_err(|error| error.to_string())?;
    let original = workbook.evaluate().map_err(|error| error.to_string())?;

    workbook.set_number("inputs.change_readiness", 5.0).map_err(|error| error.to_string())?;
    workbook.set_number("inputs.data_readiness", 1.0).map_err(|error| error.to_string())?;
    workbook.set_number("inputs.avg_salary", before.avg_salary * 2.0).map_err(|error| error.to_string())?;
    let edited = workbook.evaluate().map_err(|error| error.to_string())?;

    for id in ["calc.adoption_rate", "calc.data_cost_multiplier", "calc.annual_labor_cost", "scenarios.base.npv"] {
        require!(edited.get(id) != original.get(id), "`{id}` did not move after the edit");
    }
    let after = InputProfile {
        change_readiness: 5.0,
        data_readiness: 1.0,
        avg_salary: before.avg_salary * 2.0,
        ..before
    };
    check_parity("edited readiness and salary", &after, &tables, &edited)
}

#[test]
fn editing_an_archetype_answer_recalculates_its_mappings() -> MirrorParityTestResult {
    let tables = BenchmarkTables::standard();
    let before = InputProfile {
        archetype_id: Some("document-processing".to_owned()),
        ..InputProfile::default()
    };
    let mut workbook = build_workbook(&before, &tables).map_err(|error| error.to_string())?;
    workbook
        .set_number("inputs.answer.documentsPerMonth", 20_000.0)
        .map_err(|error| error.to_string())?;
    workbook.set_number("inputs.answer.structuredPct", 90.0).map_err(|error| error.to_string())?;
    let edited = workbook.evaluate().map_err(|error| error.to_string())?;

    let after = InputProfile {
        archetype_inputs: json!({ "documentsPerMonth": 20_000, "structuredPct": 90 })
            .as_object()
            .cloned()
            .unwrap_or_default(),
        ..before
    };
    check_parity("edited document answers", &after, &tables, &edited)
}

#[test]
fn every_entered_number_feeds_a_formula() -> MirrorParityTestResult {
    let workbook =
        build_workbook(&InputProfile::default(), &BenchmarkTables::standard()).map_err(|error| error.to_string())?;
    let referenced: BTreeSet<String> = workbook
        .cells()
        .iter()
        .filter_map(|cell| match &cell.content {
            CellContent::Formula(expr) => Some(expr.references()),
            _ => None,
        })
        .flatten()
        .collect();

    for cell in workbook.tab(Tab::Inputs) {
        if matches!(cell.content, CellContent::Number(_)) {
            require!(referenced.contains(&cell.id), "`{}` is not read by any formula", cell.id);
        }
    }
    Ok(())
}
