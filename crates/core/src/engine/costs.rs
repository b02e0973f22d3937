use serde::Serialize;
use tracing::debug;

use super::inputs::ResolvedInputs;
use crate::formula::spreadsheet_round;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    pub automation_potential: f64,
    pub adoption_rate: f64,
    pub sponsor_adjustment: f64,
    pub org_readiness: f64,
    pub industry_success_rate: f64,
    /// Single discount applied to every gross savings line.
    pub risk_multiplier: f64,
    pub discount_rate: f64,
    pub sponsor_timeline_multiplier: f64,
    pub adjusted_timeline_months: f64,
    pub timeline_years: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStateCosts {
    pub hourly_rate: f64,
    pub annual_labor_cost: f64,
    pub annual_rework_cost: f64,
    pub tool_cost: f64,
    pub total_current_cost: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workforce {
    pub raw_displaced_ftes: f64,
    pub max_displaced_ftes: f64,
    pub displaced_ftes: f64,
    pub retained_ftes: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplementationCost {
    pub scope_min_engineers: f64,
    pub timeline_pressure_multiplier: f64,
    pub data_headcount_multiplier: f64,
    pub engineers: f64,
    pub project_managers: f64,
    pub ai_salary: f64,
    pub engineering: f64,
    pub project_management: f64,
    pub infrastructure: f64,
    pub training: f64,
    pub computed: f64,
    pub stated_budget_floor: f64,
    /// `max(stated budget × data cost multiplier, computed)`.
    pub realistic: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OngoingCost {
    pub ai_headcount: f64,
    pub ai_headcount_cost: f64,
    pub api: f64,
    pub license: f64,
    pub adjacent_products: f64,
    pub model_retraining: f64,
    pub compliance: f64,
    pub retained_staff_retraining: f64,
    pub tech_debt: f64,
    pub cyber_insurance: f64,
    pub computed: f64,
    pub stated: f64,
    pub effective: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OneTimeCosts {
    pub legal: f64,
    pub security: f64,
    pub contingency: f64,
    pub vendor_termination: f64,
    pub total: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenCosts {
    pub change_management: f64,
    pub cultural_resistance: f64,
    pub data_cleanup: f64,
    pub integration_testing: f64,
    pub productivity_dip: f64,
    pub total: f64,
}

/// Everything on the cost side of the model, built once per calculation and
/// shared by every scenario.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostModel {
    pub risk: RiskProfile,
    pub current: CurrentStateCosts,
    pub workforce: Workforce,
    pub implementation: ImplementationCost,
    pub ongoing: OngoingCost,
    pub one_time: OneTimeCosts,
    pub hidden: HiddenCosts,
    pub upfront_investment: f64,
    pub separation_cost: f64,
    pub total_investment: f64,
}

impl CostModel {
    pub fn build(inputs: &ResolvedInputs) -> Self {
        let risk = risk_profile(inputs);
        let current = current_state(inputs);
        let workforce = workforce(inputs, &risk);
        let implementation = implementation(inputs, &risk);
        let ongoing = ongoing(inputs, &workforce, &implementation);
        let one_time = one_time(inputs, &implementation);
        let hidden = hidden(inputs, &current, &implementation);

        let upfront_investment = implementation.realistic + hidden.total + one_time.total;
        let separation_cost = workforce.displaced_ftes
            * inputs.avg_salary
            * inputs.benchmarks.company_size.separation_multiplier;
        let total_investment = upfront_investment + separation_cost;

        debug!(
            event_name = "engine.costs.built",
            risk_multiplier = risk.risk_multiplier,
            displaced_ftes = workforce.displaced_ftes,
            engineers = implementation.engineers,
            implementation_cost = implementation.realistic,
            ongoing_cost = ongoing.effective,
            upfront_investment,
            total_investment,
            "cost stack built"
        );

        Self {
            risk,
            current,
            workforce,
            implementation,
            ongoing,
            one_time,
            hidden,
            upfront_investment,
            separation_cost,
            total_investment,
        }
    }
}

fn risk_profile(inputs: &ResolvedInputs) -> RiskProfile {
    let constants = &inputs.constants;
    let benchmarks = &inputs.benchmarks;

    let adoption_rate = benchmarks.change_readiness.adoption_rate;
    let sponsor_adjustment =
        if inputs.has_exec_sponsor { 1.0 } else { constants.no_sponsor_adoption_factor };
    let org_readiness = adoption_rate * sponsor_adjustment;
    let industry_success_rate = benchmarks.industry.success_rate;
    let sponsor_timeline_multiplier =
        if inputs.has_exec_sponsor { 1.0 } else { constants.no_sponsor_timeline_factor };
    let adjusted_timeline_months = (inputs.timeline_months
        * benchmarks.data_readiness.timeline_multiplier
        * benchmarks.company_size.size_multiplier
        * sponsor_timeline_multiplier)
        .ceil();

    RiskProfile {
        automation_potential: inputs.automation_potential,
        adoption_rate,
        sponsor_adjustment,
        org_readiness,
        industry_success_rate,
        risk_multiplier: (org_readiness + industry_success_rate) / 2.0,
        discount_rate: benchmarks.company_size.discount_rate,
        sponsor_timeline_multiplier,
        adjusted_timeline_months,
        timeline_years: adjusted_timeline_months / 12.0,
    }
}

fn current_state(inputs: &ResolvedInputs) -> CurrentStateCosts {
    let annual_labor_cost = inputs.team_size * inputs.avg_salary;
    let annual_rework_cost = annual_labor_cost * inputs.error_rate;
    CurrentStateCosts {
        hourly_rate: inputs.avg_salary / inputs.constants.hours_per_year,
        annual_labor_cost,
        annual_rework_cost,
        tool_cost: inputs.tool_cost,
        total_current_cost: annual_labor_cost + annual_rework_cost + inputs.tool_cost,
    }
}

fn workforce(inputs: &ResolvedInputs, risk: &RiskProfile) -> Workforce {
    let raw_displaced_ftes =
        spreadsheet_round(inputs.team_size * risk.automation_potential * risk.org_readiness, 0);
    let max_displaced_ftes = (inputs.team_size * inputs.constants.max_headcount_reduction).floor();
    let displaced_ftes = raw_displaced_ftes.min(max_displaced_ftes);
    Workforce {
        raw_displaced_ftes,
        max_displaced_ftes,
        displaced_ftes,
        retained_ftes: inputs.team_size - displaced_ftes,
    }
}

fn implementation(inputs: &ResolvedInputs, risk: &RiskProfile) -> ImplementationCost {
    let constants = &inputs.constants;
    let benchmarks = &inputs.benchmarks;

    let scope_min_engineers = (inputs.team_size / constants.team_members_per_engineer).ceil().max(1.0);
    let timeline_pressure_multiplier = if risk.adjusted_timeline_months <= constants.urgent_timeline_months {
        constants.urgent_timeline_multiplier
    } else if risk.adjusted_timeline_months <= constants.short_timeline_months {
        constants.short_timeline_multiplier
    } else {
        1.0
    };
    let data_headcount_multiplier = data_tier(
        inputs.data_readiness,
        constants.low_data_headcount_multiplier,
        constants.mid_data_headcount_multiplier,
        1.0,
    );
    let engineers = (scope_min_engineers * timeline_pressure_multiplier * data_headcount_multiplier)
        .ceil()
        .min(benchmarks.company_size.max_team_size);
    let project_managers = (engineers / constants.engineers_per_pm).ceil().max(constants.min_pms);

    let ai_salary = benchmarks.ai_salary;
    let engineering = engineers * ai_salary * risk.timeline_years;
    let project_management = project_managers * ai_salary * constants.pm_salary_ratio * risk.timeline_years;
    let infrastructure = (engineering + project_management) * constants.infrastructure_rate;
    let training = (engineering + project_management) * constants.training_rate;
    let computed = engineering + project_management + infrastructure + training;
    let stated_budget_floor = inputs.stated_budget * benchmarks.data_readiness.cost_multiplier;

    ImplementationCost {
        scope_min_engineers,
        timeline_pressure_multiplier,
        data_headcount_multiplier,
        engineers,
        project_managers,
        ai_salary,
        engineering,
        project_management,
        infrastructure,
        training,
        computed,
        stated_budget_floor,
        realistic: stated_budget_floor.max(computed),
    }
}

/// Annual API spend for the automated share of the process volume.
pub fn annual_api_cost(inputs: &ResolvedInputs) -> f64 {
    let process = &inputs.benchmarks.process_type;
    inputs.team_size
        * inputs.hours_per_week
        * inputs.constants.weeks_per_year
        * inputs.automation_potential
        * process.requests_per_hour
        / 1000.0
        * process.api_cost_per_1k
}

fn ongoing(inputs: &ResolvedInputs, workforce: &Workforce, implementation: &ImplementationCost) -> OngoingCost {
    let constants = &inputs.constants;
    let size = &inputs.benchmarks.company_size;

    let ai_headcount =
        (implementation.engineers * constants.ongoing_headcount_ratio).max(constants.min_ongoing_headcount);
    let ai_headcount_cost = ai_headcount * implementation.ai_salary;
    let api = annual_api_cost(inputs);
    let license = size.annual_license;
    let adjacent_products = license * constants.adjacent_product_rate;
    let model_retraining = implementation.realistic * constants.model_retraining_rate;
    let compliance = size.compliance_cost;
    let retained_staff_retraining = workforce.retained_ftes * inputs.avg_salary * constants.retained_retraining_rate;
    let tech_debt = implementation.realistic * constants.tech_debt_rate;
    let cyber_insurance = size.cyber_insurance_cost;

    let computed = ai_headcount_cost
        + api
        + license
        + adjacent_products
        + model_retraining
        + compliance
        + retained_staff_retraining
        + tech_debt
        + cyber_insurance;

    OngoingCost {
        ai_headcount,
        ai_headcount_cost,
        api,
        license,
        adjacent_products,
        model_retraining,
        compliance,
        retained_staff_retraining,
        tech_debt,
        cyber_insurance,
        computed,
        stated: inputs.stated_ongoing_cost,
        effective: inputs.stated_ongoing_cost.max(computed),
    }
}

fn one_time(inputs: &ResolvedInputs, implementation: &ImplementationCost) -> OneTimeCosts {
    let size = &inputs.benchmarks.company_size;
    let contingency = implementation.realistic * inputs.constants.contingency_rate;
    let vendor_termination = inputs.vendor_termination_cost
        + inputs.vendors_to_replace * size.annual_license * size.vendor_switching_rate;
    OneTimeCosts {
        legal: size.legal_cost,
        security: size.security_cost,
        contingency,
        vendor_termination,
        total: size.legal_cost + size.security_cost + contingency + vendor_termination,
    }
}

fn hidden(inputs: &ResolvedInputs, current: &CurrentStateCosts, implementation: &ImplementationCost) -> HiddenCosts {
    let constants = &inputs.constants;
    let base = implementation.realistic;

    let change_management = base * constants.change_management_rate;
    let cultural_resistance = base * constants.cultural_resistance_rate;
    let data_cleanup = base
        * data_tier(inputs.data_readiness, constants.low_data_cleanup_rate, constants.mid_data_cleanup_rate, 0.0);
    let integration_testing = base * constants.integration_testing_rate;
    let productivity_dip =
        constants.productivity_dip_months * constants.productivity_dip_rate * current.annual_labor_cost / 12.0;

    HiddenCosts {
        change_management,
        cultural_resistance,
        data_cleanup,
        integration_testing,
        productivity_dip,
        total: change_management + cultural_resistance + data_cleanup + integration_testing + productivity_dip,
    }
}

/// Picks a value by data-readiness tier: `<= 2`, `== 3`, `>= 4`.
pub fn data_tier(data_readiness: u8, low: f64, mid: f64, high: f64) -> f64 {
    match data_readiness {
        0..=2 => low,
        3 => mid,
        _ => high,
    }
}
