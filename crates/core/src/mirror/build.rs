use tracing::debug;

use super::{CellContent, Tab, Workbook};
use crate::archetypes::{archetype, ArchetypeSchema, ComputedMapping, OverrideField};
use crate::benchmarks::BenchmarkTables;
use crate::engine::inputs::{InputProfile, ResolvedInputs};
use crate::engine::metrics::MONTHS_PER_YEAR;
use crate::errors::EngineError;
use crate::formula::{
    ceil, clamp, exp, floor, if_then, max_of, min_of, num, pow, round, sum_of, Comparison, Expr,
    FormulaError,
};

/// Resolves `profile` exactly as the engine does and lays the model out as a
/// workbook.
pub fn build_workbook(profile: &InputProfile, tables: &BenchmarkTables) -> Result<Workbook, EngineError> {
    let inputs = ResolvedInputs::resolve(profile, tables)?;
    let workbook = Workbook::from_resolved(profile, &inputs, tables)?;
    debug!(event_name = "mirror.workbook.built", cells = workbook.len(), "workbook built");
    Ok(workbook)
}

impl Workbook {
    pub fn from_resolved(
        profile: &InputProfile,
        inputs: &ResolvedInputs,
        tables: &BenchmarkTables,
    ) -> Result<Self, FormulaError> {
        let mut workbook = Workbook::new();
        let schema = profile.archetype_id.as_deref().and_then(archetype);
        let lookups = Lookups::write(&mut workbook, inputs, tables)?;
        let entered = Entered::write(&mut workbook, profile, schema)?;
        let effective = Effective::write(&mut workbook, &lookups, &entered, schema)?;
        let calc = Calc::write(&mut workbook, &lookups, &entered, &effective)?;
        let scenarios = Scenario::write_multipliers(&mut workbook, inputs)?;
        let dcf = Dcf::write(&mut workbook, &lookups, &calc, &scenarios)?;
        let headline = write_scenario_summaries(&mut workbook, &lookups, &calc, &dcf)?;
        let inaction = write_opportunity_cost(&mut workbook, &lookups, &calc)?;
        write_revenue_and_scale(&mut workbook, inputs, &lookups, &effective, &calc)?;
        write_dashboard(&mut workbook, &lookups, &calc, &dcf, &headline, &inaction)?;
        write_sources(&mut workbook, profile, &tables.version)?;
        Ok(workbook)
    }
}

/// Writes cells onto one tab, prefixing ids with the tab's id prefix.
struct Sheet<'w> {
    workbook: &'w mut Workbook,
    tab: Tab,
}

impl<'w> Sheet<'w> {
    fn new(workbook: &'w mut Workbook, tab: Tab) -> Self {
        Self { workbook, tab }
    }

    fn id(&self, key: &str) -> String {
        format!("{}.{key}", self.tab.id_prefix())
    }

    fn number(&mut self, key: &str, label: impl Into<String>, value: f64) -> Result<Expr, FormulaError> {
        let id = self.id(key);
        self.workbook.insert(self.tab, id, label, CellContent::Number(value))
    }

    fn flag(&mut self, key: &str, label: impl Into<String>, value: bool) -> Result<Expr, FormulaError> {
        self.number(key, label, if value { 1.0 } else { 0.0 })
    }

    fn formula(&mut self, key: &str, label: impl Into<String>, expr: Expr) -> Result<Expr, FormulaError> {
        let id = self.id(key);
        self.workbook.insert(self.tab, id, label, CellContent::Formula(expr))
    }

    fn text(&mut self, key: &str, label: impl Into<String>, text: impl Into<String>) -> Result<(), FormulaError> {
        let id = self.id(key);
        self.workbook.insert(self.tab, id, label, CellContent::Text(text.into())).map(|_| ())
    }

    /// Gross and risk-adjusted cells for one value line.
    fn value_line(&mut self, key: &str, label: &str, gross: Expr, risk: &Expr) -> Result<(Expr, Expr), FormulaError> {
        let gross = self.formula(&format!("{key}_gross"), format!("{label} (gross)"), gross)?;
        let adjusted = self.formula(
            &format!("{key}_risk_adjusted"),
            format!("{label} (risk-adjusted)"),
            gross.clone() * risk.clone(),
        )?;
        Ok((gross, adjusted))
    }
}

fn year_key(key: &str, year: u32) -> String {
    format!("{key}.y{year}")
}

fn data_tier(data_readiness: &Expr, low: Expr, mid: Expr, high: Expr) -> Expr {
    if_then(
        data_readiness.clone(),
        Comparison::Le,
        num(2.0),
        low,
        if_then(data_readiness.clone(), Comparison::Eq, num(3.0), mid, high),
    )
}

/// `IF(level<=1, r1, IF(level<=2, r2, …))` over rows ordered by level.
fn select_by_level(level: &Expr, rows: &[(u8, Expr)]) -> Expr {
    let mut rows = rows.iter().rev();
    let Some((_, last)) = rows.next() else {
        return num(f64::NAN);
    };
    rows.fold(last.clone(), |otherwise, (row_level, value)| {
        if_then(level.clone(), Comparison::Le, num(f64::from(*row_level)), value.clone(), otherwise)
    })
}

/// `candidate` when it is a finite, non-negative number, else `fallback`.
/// `x-x=0` fails for NaN and infinities.
fn accepted_override(candidate: &Expr, fallback: Expr) -> Expr {
    if_then(
        candidate.clone() - candidate.clone(),
        Comparison::Eq,
        num(0.0),
        if_then(candidate.clone(), Comparison::Ge, num(0.0), candidate.clone(), fallback.clone()),
        fallback,
    )
}

struct ReadinessRow {
    level: u8,
    adoption_rate: Expr,
    timeline_multiplier: Expr,
    cost_multiplier: Expr,
}

fn readiness_column(rows: &[ReadinessRow], pick: impl Fn(&ReadinessRow) -> &Expr) -> Vec<(u8, Expr)> {
    rows.iter().map(|row| (row.level, pick(row).clone())).collect()
}

struct YearRow {
    year: u32,
    hr_reduction_this_year: Expr,
    cumulative_hr_reduction: Expr,
    adoption_ramp: Expr,
    cumulative_escalation: Expr,
}

/// Benchmark rows and model assumptions, all literals. The readiness scale is
/// carried whole; rows keyed by text categories are carried as selected.
struct Lookups {
    benchmark_automation_potential: Expr,
    readiness: Vec<ReadinessRow>,
    success_rate: Expr,
    competitive_penalty_rate: Expr,
    compliance_risk_rate: Expr,
    revenue_uplift: [Expr; 3],
    size_multiplier: Expr,
    discount_rate: Expr,
    max_team_size: Expr,
    separation_multiplier: Expr,
    annual_license: Expr,
    legal_cost: Expr,
    security_cost: Expr,
    compliance_cost: Expr,
    cyber_insurance_cost: Expr,
    vendor_switching_rate: Expr,
    ai_salary: Expr,
    api_cost_per_1k: Expr,
    requests_per_hour: Expr,
    tool_replacement_rate: Expr,
    rd_credit_rate: Expr,
    peer_p25: Expr,
    peer_median: Expr,
    peer_p75: Expr,
    years: Vec<YearRow>,

    hours_per_year: Expr,
    weeks_per_year: Expr,
    max_headcount_reduction: Expr,
    no_sponsor_adoption_factor: Expr,
    no_sponsor_timeline_factor: Expr,
    team_members_per_engineer: Expr,
    engineers_per_pm: Expr,
    min_pms: Expr,
    urgent_timeline_months: Expr,
    urgent_timeline_multiplier: Expr,
    short_timeline_months: Expr,
    short_timeline_multiplier: Expr,
    low_data_headcount_multiplier: Expr,
    mid_data_headcount_multiplier: Expr,
    pm_salary_ratio: Expr,
    infrastructure_rate: Expr,
    training_rate: Expr,
    ongoing_headcount_ratio: Expr,
    min_ongoing_headcount: Expr,
    adjacent_product_rate: Expr,
    model_retraining_rate: Expr,
    retained_retraining_rate: Expr,
    tech_debt_rate: Expr,
    contingency_rate: Expr,
    change_management_rate: Expr,
    cultural_resistance_rate: Expr,
    low_data_cleanup_rate: Expr,
    mid_data_cleanup_rate: Expr,
    integration_testing_rate: Expr,
    productivity_dip_months: Expr,
    productivity_dip_rate: Expr,
    wage_inflation: Expr,
    legacy_creep_rate: Expr,
    roic_cap: Expr,
    revenue_risk_discount: Expr,
    rd_qualification_rate: Expr,
    federal_rd_rate: Expr,
    scale_ongoing_uplift: Expr,
}

impl Lookups {
    fn write(
        workbook: &mut Workbook,
        inputs: &ResolvedInputs,
        tables: &BenchmarkTables,
    ) -> Result<Self, FormulaError> {
        let selected = &inputs.benchmarks;
        let size = &selected.company_size;
        let industry = &selected.industry;
        let process = &selected.process_type;
        let constants = &inputs.constants;
        let mut sheet = Sheet::new(workbook, Tab::Lookups);

        let benchmark_automation_potential = sheet.number(
            "automation_potential",
            "Automation potential (industry × process)",
            selected.automation_potential,
        )?;
        let mut readiness = Vec::with_capacity(tables.readiness.len());
        for row in &tables.readiness {
            let level = row.level;
            readiness.push(ReadinessRow {
                level,
                adoption_rate: sheet.number(
                    &format!("readiness.l{level}.adoption_rate"),
                    format!("Adoption rate (readiness {level})"),
                    row.adoption_rate,
                )?,
                timeline_multiplier: sheet.number(
                    &format!("readiness.l{level}.timeline_multiplier"),
                    format!("Timeline multiplier (readiness {level})"),
                    row.timeline_multiplier,
                )?,
                cost_multiplier: sheet.number(
                    &format!("readiness.l{level}.cost_multiplier"),
                    format!("Cost multiplier (readiness {level})"),
                    row.cost_multiplier,
                )?,
            });
        }
        let success_rate = sheet.number("success_rate", "Industry success rate", industry.success_rate)?;
        let competitive_penalty_rate =
            sheet.number("competitive_penalty_rate", "Competitive penalty rate", industry.competitive_penalty_rate)?;
        let compliance_risk_rate = sheet.number(
            "compliance_risk_rate",
            "Compliance risk rate",
            industry.compliance_risk_rate,
        )?;
        let [conservative_uplift, base_uplift, optimistic_uplift] = industry.revenue_uplift;
        let revenue_uplift = [
            sheet.number("revenue_uplift.conservative", "Revenue uplift (conservative)", conservative_uplift)?,
            sheet.number("revenue_uplift.base", "Revenue uplift (base)", base_uplift)?,
            sheet.number("revenue_uplift.optimistic", "Revenue uplift (optimistic)", optimistic_uplift)?,
        ];

        let size_multiplier = sheet.number(
            "size_multiplier",
            "Company size timeline multiplier",
            size.size_multiplier,
        )?;
        let discount_rate = sheet.number("discount_rate", "Discount rate", size.discount_rate)?;
        let max_team_size = sheet.number("max_team_size", "Maximum AI team size", size.max_team_size)?;
        let separation_multiplier =
            sheet.number("separation_multiplier", "Separation cost multiplier", size.separation_multiplier)?;
        let annual_license = sheet.number("annual_license", "Annual license", size.annual_license)?;
        let legal_cost = sheet.number("legal_cost", "Legal review", size.legal_cost)?;
        let security_cost = sheet.number("security_cost", "Security review", size.security_cost)?;
        let compliance_cost = sheet.number("compliance_cost", "Annual compliance", size.compliance_cost)?;
        let cyber_insurance_cost = sheet.number("cyber_insurance_cost", "Cyber insurance", size.cyber_insurance_cost)?;
        let vendor_switching_rate =
            sheet.number("vendor_switching_rate", "Vendor switching rate", size.vendor_switching_rate)?;

        let ai_salary = sheet.number("ai_salary", "AI engineer salary (location)", selected.ai_salary)?;
        let api_cost_per_1k = sheet.number("api_cost_per_1k", "API cost per 1k requests", process.api_cost_per_1k)?;
        let requests_per_hour = sheet.number(
            "requests_per_hour",
            "Requests per automated hour",
            process.requests_per_hour,
        )?;
        let tool_replacement_rate =
            sheet.number("tool_replacement_rate", "Tool replacement rate", process.tool_replacement_rate)?;
        let rd_credit_rate = sheet.number("rd_credit_rate", "State R&D credit rate", selected.rd_credit_rate)?;
        let peer_p25 = sheet.number("peer_roic.p25", "Peer ROIC p25", selected.peer_roic.p25)?;
        let peer_median = sheet.number("peer_roic.median", "Peer ROIC median", selected.peer_roic.median)?;
        let peer_p75 = sheet.number("peer_roic.p75", "Peer ROIC p75", selected.peer_roic.p75)?;

        let mut years = Vec::with_capacity(selected.schedule.len());
        for row in &selected.schedule {
            let year = row.year;
            years.push(YearRow {
                year,
                hr_reduction_this_year: sheet.number(
                    &year_key("hr_reduction_this_year", year),
                    format!("HR reduction this year (Y{year})"),
                    row.hr_reduction_this_year,
                )?,
                cumulative_hr_reduction: sheet.number(
                    &year_key("cumulative_hr_reduction", year),
                    format!("Cumulative HR reduction (Y{year})"),
                    row.cumulative_hr_reduction,
                )?,
                adoption_ramp: sheet.number(
                    &year_key("adoption_ramp", year),
                    format!("Adoption ramp (Y{year})"),
                    row.adoption_ramp,
                )?,
                cumulative_escalation: sheet.number(
                    &year_key("cumulative_escalation", year),
                    format!("Cumulative cost escalation (Y{year})"),
                    row.cumulative_escalation,
                )?,
            });
        }

        Ok(Self {
            benchmark_automation_potential,
            readiness,
            success_rate,
            competitive_penalty_rate,
            compliance_risk_rate,
            revenue_uplift,
            size_multiplier,
            discount_rate,
            max_team_size,
            separation_multiplier,
            annual_license,
            legal_cost,
            security_cost,
            compliance_cost,
            cyber_insurance_cost,
            vendor_switching_rate,
            ai_salary,
            api_cost_per_1k,
            requests_per_hour,
            tool_replacement_rate,
            rd_credit_rate,
            peer_p25,
            peer_median,
            peer_p75,
            years,
            hours_per_year: sheet.number("hours_per_year", "Working hours per year", constants.hours_per_year)?,
            weeks_per_year: sheet.number("weeks_per_year", "Working weeks per year", constants.weeks_per_year)?,
            max_headcount_reduction: sheet.number(
                "max_headcount_reduction",
                "Maximum headcount reduction",
                constants.max_headcount_reduction,
            )?,
            no_sponsor_adoption_factor: sheet.number(
                "no_sponsor_adoption_factor",
                "Adoption factor without sponsor",
                constants.no_sponsor_adoption_factor,
            )?,
            no_sponsor_timeline_factor: sheet.number(
                "no_sponsor_timeline_factor",
                "Timeline factor without sponsor",
                constants.no_sponsor_timeline_factor,
            )?,
            team_members_per_engineer: sheet.number(
                "team_members_per_engineer",
                "Team members per engineer",
                constants.team_members_per_engineer,
            )?,
            engineers_per_pm: sheet.number("engineers_per_pm", "Engineers per PM", constants.engineers_per_pm)?,
            min_pms: sheet.number("min_pms", "Minimum PMs", constants.min_pms)?,
            urgent_timeline_months: sheet.number(
                "urgent_timeline_months",
                "Urgent timeline (months)",
                constants.urgent_timeline_months,
            )?,
            urgent_timeline_multiplier: sheet.number(
                "urgent_timeline_multiplier",
                "Urgent staffing multiplier",
                constants.urgent_timeline_multiplier,
            )?,
            short_timeline_months: sheet.number(
                "short_timeline_months",
                "Short timeline (months)",
                constants.short_timeline_months,
            )?,
            short_timeline_multiplier: sheet.number(
                "short_timeline_multiplier",
                "Short staffing multiplier",
                constants.short_timeline_multiplier,
            )?,
            low_data_headcount_multiplier: sheet.number(
                "low_data_headcount_multiplier",
                "Staffing multiplier (data readiness ≤ 2)",
                constants.low_data_headcount_multiplier,
            )?,
            mid_data_headcount_multiplier: sheet.number(
                "mid_data_headcount_multiplier",
                "Staffing multiplier (data readiness 3)",
                constants.mid_data_headcount_multiplier,
            )?,
            pm_salary_ratio: sheet.number("pm_salary_ratio", "PM salary ratio", constants.pm_salary_ratio)?,
            infrastructure_rate: sheet.number(
                "infrastructure_rate",
                "Infrastructure rate",
                constants.infrastructure_rate,
            )?,
            training_rate: sheet.number("training_rate", "Training rate", constants.training_rate)?,
            ongoing_headcount_ratio: sheet.number(
                "ongoing_headcount_ratio",
                "Ongoing headcount ratio",
                constants.ongoing_headcount_ratio,
            )?,
            min_ongoing_headcount: sheet.number(
                "min_ongoing_headcount",
                "Minimum ongoing headcount",
                constants.min_ongoing_headcount,
            )?,
            adjacent_product_rate: sheet.number(
                "adjacent_product_rate",
                "Adjacent product rate",
                constants.adjacent_product_rate,
            )?,
            model_retraining_rate: sheet.number(
                "model_retraining_rate",
                "Model retraining rate",
                constants.model_retraining_rate,
            )?,
            retained_retraining_rate: sheet.number(
                "retained_retraining_rate",
                "Retained staff retraining rate",
                constants.retained_retraining_rate,
            )?,
            tech_debt_rate: sheet.number("tech_debt_rate", "Tech debt rate", constants.tech_debt_rate)?,
            contingency_rate: sheet.number("contingency_rate", "Contingency rate", constants.contingency_rate)?,
            change_management_rate: sheet.number(
                "change_management_rate",
                "Change management rate",
                constants.change_management_rate,
            )?,
            cultural_resistance_rate: sheet.number(
                "cultural_resistance_rate",
                "Cultural resistance rate",
                constants.cultural_resistance_rate,
            )?,
            low_data_cleanup_rate: sheet.number(
                "low_data_cleanup_rate",
                "Data cleanup rate (data readiness ≤ 2)",
                constants.low_data_cleanup_rate,
            )?,
            mid_data_cleanup_rate: sheet.number(
                "mid_data_cleanup_rate",
                "Data cleanup rate (data readiness 3)",
                constants.mid_data_cleanup_rate,
            )?,
            integration_testing_rate: sheet.number(
                "integration_testing_rate",
                "Integration testing rate",
                constants.integration_testing_rate,
            )?,
            productivity_dip_months: sheet.number(
                "productivity_dip_months",
                "Productivity dip (months)",
                constants.productivity_dip_months,
            )?,
            productivity_dip_rate: sheet.number(
                "productivity_dip_rate",
                "Productivity dip rate",
                constants.productivity_dip_rate,
            )?,
            wage_inflation: sheet.number("wage_inflation", "Wage inflation", constants.wage_inflation)?,
            legacy_creep_rate: sheet.number("legacy_creep_rate", "Legacy cost creep", constants.legacy_creep_rate)?,
            roic_cap: sheet.number("roic_cap", "ROIC cap", constants.roic_cap)?,
            revenue_risk_discount: sheet.number(
                "revenue_risk_discount",
                "Revenue risk discount",
                constants.revenue_risk_discount,
            )?,
            rd_qualification_rate: sheet.number(
                "rd_qualification_rate",
                "R&D qualified share",
                constants.rd_qualification_rate,
            )?,
            federal_rd_rate: sheet.number("federal_rd_rate", "Federal R&D credit rate", constants.federal_rd_rate)?,
            scale_ongoing_uplift: sheet.number(
                "scale_ongoing_uplift",
                "Ongoing uplift per volume tier",
                constants.scale_ongoing_uplift,
            )?,
        })
    }
}

/// One flat override field as typed: the value and whether it was supplied.
struct DirectOverride {
    value: Expr,
    supplied: Expr,
}

impl DirectOverride {
    /// The override when supplied and acceptable, else `fallback`.
    fn or(&self, fallback: Expr) -> Expr {
        if_then(
            self.supplied.clone(),
            Comparison::Eq,
            num(1.0),
            accepted_override(&self.value, fallback.clone()),
            fallback,
        )
    }
}

/// Profile values exactly as entered, before overrides and clamping.
struct Entered {
    team_size: Expr,
    hours_per_week: Expr,
    avg_salary: Expr,
    error_rate: Expr,
    tool_cost: Expr,
    change_readiness: Expr,
    data_readiness: Expr,
    has_exec_sponsor: Expr,
    stated_budget: Expr,
    timeline_months: Expr,
    stated_ongoing_cost: Expr,
    vendors_to_replace: Expr,
    vendor_termination_cost: Expr,
    automation_potential: DirectOverride,
    revenue_impact: DirectOverride,
    risk_reduction: DirectOverride,
    /// Archetype answer cell ids keyed by input key.
    answers: Vec<(&'static str, String)>,
}

impl Entered {
    fn write(
        workbook: &mut Workbook,
        profile: &InputProfile,
        schema: Option<&ArchetypeSchema>,
    ) -> Result<Self, FormulaError> {
        let mut sheet = Sheet::new(workbook, Tab::Inputs);
        sheet.text("industry", "Industry", profile.industry.trim())?;
        sheet.text("company_size", "Company size", profile.company_size.trim())?;
        sheet.text("location", "Location", profile.location.trim())?;
        sheet.text("state", "State", profile.state.trim())?;
        sheet.text("process_type", "Process type", profile.process_type.trim())?;
        sheet.text("archetype", "Archetype", schema.map_or("none", |schema| schema.id.as_str()))?;

        let team_size = sheet.number("team_size", "Team size (FTE)", profile.team_size)?;
        let hours_per_week = sheet.number("hours_per_week", "Hours per week on process", profile.hours_per_week)?;
        let avg_salary = sheet.number("avg_salary", "Average salary", profile.avg_salary)?;
        let error_rate = sheet.number("error_rate", "Error rate", profile.error_rate)?;
        let tool_cost = sheet.number("tool_cost", "Annual tool cost", profile.tool_cost)?;
        let change_readiness =
            sheet.number("change_readiness", "Change readiness (1-5)", profile.change_readiness)?;
        let data_readiness = sheet.number("data_readiness", "Data readiness (1-5)", profile.data_readiness)?;
        let has_exec_sponsor =
            sheet.flag("has_exec_sponsor", "Executive sponsor (1 = yes)", profile.has_exec_sponsor)?;
        let stated_budget = sheet.number("stated_budget", "Stated budget", profile.stated_budget)?;
        let timeline_months = sheet.number(
            "timeline_months",
            "Expected timeline (months)",
            profile.expected_timeline_months,
        )?;
        let stated_ongoing_cost =
            sheet.number("stated_ongoing_cost", "Stated ongoing cost", profile.stated_ongoing_cost)?;
        let vendors_to_replace =
            sheet.number("vendors_to_replace", "Vendors to replace", profile.vendors_to_replace)?;
        let vendor_termination_cost = sheet.number(
            "vendor_termination_cost",
            "Vendor termination cost",
            profile.vendor_termination_cost,
        )?;

        let mut direct = |key: &str, label: &str, value: Option<f64>| -> Result<DirectOverride, FormulaError> {
            Ok(DirectOverride {
                value: sheet.number(&format!("{key}_override"), format!("{label} override"), value.unwrap_or(0.0))?,
                supplied: sheet.flag(
                    &format!("has_{key}_override"),
                    format!("{label} overridden (1 = yes)"),
                    value.is_some(),
                )?,
            })
        };
        let automation_potential =
            direct("automation_potential", "Automation potential", profile.automation_potential)?;
        let revenue_impact = direct("revenue_impact", "Revenue impact", profile.revenue_impact)?;
        let risk_reduction = direct("risk_reduction", "Risk reduction", profile.risk_reduction)?;

        let mut answers = Vec::new();
        if let Some(schema) = schema {
            let resolved = schema.resolve_inputs(&profile.archetype_inputs);
            for field in &schema.inputs {
                let value = resolved.get(field.key).copied().unwrap_or(field.default);
                let key = format!("answer.{}", field.key);
                sheet.number(&key, format!("{} ({})", field.label, field.unit), value)?;
                answers.push((field.key, sheet.id(&key)));
            }
        }

        Ok(Self {
            team_size,
            hours_per_week,
            avg_salary,
            error_rate,
            tool_cost,
            change_readiness,
            data_readiness,
            has_exec_sponsor,
            stated_budget,
            timeline_months,
            stated_ongoing_cost,
            vendors_to_replace,
            vendor_termination_cost,
            automation_potential,
            revenue_impact,
            risk_reduction,
            answers,
        })
    }
}

/// Calc Engine cells that turn entries into model inputs: readiness rows
/// picked off the scale, archetype mappings over the answer cells, and the
/// override precedence benchmark < flat override < archetype mapping.
struct Effective {
    data_level: Expr,
    adoption_rate: Expr,
    data_timeline_multiplier: Expr,
    data_cost_multiplier: Expr,
    hours_per_week: Expr,
    error_rate: Expr,
    tool_cost: Expr,
    timeline_months: Expr,
    automation_potential: Expr,
    revenue_impact: Expr,
}

impl Effective {
    fn write(
        workbook: &mut Workbook,
        lookups: &Lookups,
        entered: &Entered,
        schema: Option<&ArchetypeSchema>,
    ) -> Result<Self, FormulaError> {
        let e = entered;
        let mut sheet = Sheet::new(workbook, Tab::CalcEngine);

        let change_level = sheet.formula(
            "change_readiness_level",
            "Change readiness level",
            clamp(round(e.change_readiness.clone(), 0), 1.0, 5.0),
        )?;
        let data_level = sheet.formula(
            "data_readiness_level",
            "Data readiness level",
            clamp(round(e.data_readiness.clone(), 0), 1.0, 5.0),
        )?;
        let rows = &lookups.readiness;
        let adoption_rate = sheet.formula(
            "adoption_rate",
            "Adoption rate (change readiness)",
            select_by_level(&change_level, &readiness_column(rows, |row| &row.adoption_rate)),
        )?;
        let data_timeline_multiplier = sheet.formula(
            "data_timeline_multiplier",
            "Timeline multiplier (data readiness)",
            select_by_level(&data_level, &readiness_column(rows, |row| &row.timeline_multiplier)),
        )?;
        let data_cost_multiplier = sheet.formula(
            "data_cost_multiplier",
            "Cost multiplier (data readiness)",
            select_by_level(&data_level, &readiness_column(rows, |row| &row.cost_multiplier)),
        )?;
        let timeline_months = sheet.formula(
            "timeline_months",
            "Timeline (months, at least 1)",
            max_of([num(1.0), e.timeline_months.clone()]),
        )?;

        let mut mapped: Vec<(OverrideField, Expr)> = Vec::new();
        if let Some(schema) = schema {
            let answer_id = |key: &str| {
                e.answers
                    .iter()
                    .find(|(answer, _)| *answer == key)
                    .map_or_else(|| key.to_owned(), |(_, id)| id.clone())
            };
            // A later mapping for the same field replaces an earlier one.
            let mut latest: Vec<&ComputedMapping> = Vec::new();
            for mapping in &schema.mappings {
                latest.retain(|kept| kept.target != mapping.target);
                latest.push(mapping);
            }
            for mapping in latest {
                let cell = sheet.formula(
                    &format!("mapped.{}", mapping.target.as_str()),
                    format!("{} (archetype mapping)", mapping.target.as_str()),
                    mapping.expression.rename_references(&answer_id),
                )?;
                mapped.push((mapping.target, cell));
            }
        }
        let with_mapping = |field: OverrideField, fallback: Expr| {
            match mapped.iter().find(|(target, _)| *target == field) {
                Some((_, cell)) => accepted_override(cell, fallback),
                None => fallback,
            }
        };

        let hours_per_week = sheet.formula(
            "hours_per_week",
            "Hours per week (effective)",
            with_mapping(OverrideField::HoursPerWeek, e.hours_per_week.clone()),
        )?;
        let error_rate = sheet.formula(
            "error_rate",
            "Error rate (effective)",
            min_of([num(1.0), with_mapping(OverrideField::ErrorRate, e.error_rate.clone())]),
        )?;
        let tool_cost = sheet.formula(
            "tool_cost",
            "Annual tool cost (effective)",
            with_mapping(OverrideField::ToolCost, e.tool_cost.clone()),
        )?;
        let automation_potential = sheet.formula(
            "automation_potential",
            "Automation potential",
            min_of([
                num(1.0),
                with_mapping(
                    OverrideField::AutomationPotential,
                    e.automation_potential.or(lookups.benchmark_automation_potential.clone()),
                ),
            ]),
        )?;
        let revenue_impact = sheet.formula(
            "revenue_impact",
            "Revenue impact (effective)",
            with_mapping(OverrideField::RevenueImpact, e.revenue_impact.or(num(0.0))),
        )?;
        sheet.formula(
            "risk_reduction",
            "Risk reduction (informational)",
            with_mapping(OverrideField::RiskReduction, e.risk_reduction.or(num(0.0))),
        )?;

        Ok(Self {
            data_level,
            adoption_rate,
            data_timeline_multiplier,
            data_cost_multiplier,
            hours_per_week,
            error_rate,
            tool_cost,
            timeline_months,
            automation_potential,
            revenue_impact,
        })
    }
}

/// Calc Engine cells other tabs read.
struct Calc {
    automation_potential: Expr,
    risk_multiplier: Expr,
    annual_labor_cost: Expr,
    annual_rework_cost: Expr,
    tool_cost: Expr,
    total_current_cost: Expr,
    implementation_realistic: Expr,
    api_cost: Expr,
    ongoing_effective: Expr,
    upfront_investment: Expr,
    separation_cost: Expr,
    total_investment: Expr,
    headcount_risk_adjusted: Expr,
    enhancement_risk_adjusted: Expr,
    net_annual_savings: Expr,
}

impl Calc {
    fn write(
        workbook: &mut Workbook,
        lookups: &Lookups,
        entered: &Entered,
        effective: &Effective,
    ) -> Result<Self, FormulaError> {
        let l = lookups;
        let e = entered;
        let f = effective;
        let mut sheet = Sheet::new(workbook, Tab::CalcEngine);
        let sponsor = |then: Expr, otherwise: Expr| {
            if_then(e.has_exec_sponsor.clone(), Comparison::Eq, num(1.0), then, otherwise)
        };

        // Risk profile
        let automation_potential = f.automation_potential.clone();
        let sponsor_adjustment = sheet.formula(
            "sponsor_adjustment",
            "Sponsor adjustment",
            sponsor(num(1.0), l.no_sponsor_adoption_factor.clone()),
        )?;
        let org_readiness =
            sheet.formula("org_readiness", "Organisational readiness", f.adoption_rate.clone() * sponsor_adjustment)?;
        let risk_multiplier = sheet.formula(
            "risk_multiplier",
            "Risk multiplier",
            (org_readiness.clone() + l.success_rate.clone()) / 2.0,
        )?;
        let sponsor_timeline = sheet.formula(
            "sponsor_timeline_multiplier",
            "Sponsor timeline multiplier",
            sponsor(num(1.0), l.no_sponsor_timeline_factor.clone()),
        )?;
        let adjusted_months = sheet.formula(
            "adjusted_timeline_months",
            "Adjusted timeline (months)",
            ceil(
                f.timeline_months.clone()
                    * f.data_timeline_multiplier.clone()
                    * l.size_multiplier.clone()
                    * sponsor_timeline,
            ),
        )?;
        let timeline_years =
            sheet.formula("timeline_years", "Timeline (years)", adjusted_months.clone() / MONTHS_PER_YEAR)?;

        // Current state
        sheet.formula("hourly_rate", "Hourly rate", e.avg_salary.clone() / l.hours_per_year.clone())?;
        let annual_labor_cost =
            sheet.formula("annual_labor_cost", "Annual labor cost", e.team_size.clone() * e.avg_salary.clone())?;
        let annual_rework_cost = sheet.formula(
            "annual_rework_cost",
            "Annual rework cost",
            annual_labor_cost.clone() * f.error_rate.clone(),
        )?;
        let total_current_cost = sheet.formula(
            "total_current_cost",
            "Total current cost",
            annual_labor_cost.clone() + annual_rework_cost.clone() + f.tool_cost.clone(),
        )?;

        // Workforce
        let raw_displaced = sheet.formula(
            "raw_displaced_ftes",
            "Displaced FTEs (uncapped)",
            round(e.team_size.clone() * automation_potential.clone() * org_readiness, 0),
        )?;
        let max_displaced = sheet.formula(
            "max_displaced_ftes",
            "Displacement cap",
            floor(e.team_size.clone() * l.max_headcount_reduction.clone()),
        )?;
        let displaced = sheet.formula("displaced_ftes", "Displaced FTEs", min_of([raw_displaced, max_displaced]))?;
        let retained = sheet.formula("retained_ftes", "Retained FTEs", e.team_size.clone() - displaced.clone())?;

        // Implementation
        let scope_min = sheet.formula(
            "scope_min_engineers",
            "Scope minimum engineers",
            max_of([num(1.0), ceil(e.team_size.clone() / l.team_members_per_engineer.clone())]),
        )?;
        let pressure = sheet.formula(
            "timeline_pressure_multiplier",
            "Timeline pressure multiplier",
            if_then(
                adjusted_months.clone(),
                Comparison::Le,
                l.urgent_timeline_months.clone(),
                l.urgent_timeline_multiplier.clone(),
                if_then(
                    adjusted_months,
                    Comparison::Le,
                    l.short_timeline_months.clone(),
                    l.short_timeline_multiplier.clone(),
                    num(1.0),
                ),
            ),
        )?;
        let data_headcount = sheet.formula(
            "data_headcount_multiplier",
            "Data readiness staffing multiplier",
            data_tier(
                &f.data_level,
                l.low_data_headcount_multiplier.clone(),
                l.mid_data_headcount_multiplier.clone(),
                num(1.0),
            ),
        )?;
        let engineers = sheet.formula(
            "engineers",
            "AI engineers",
            min_of([ceil(scope_min * pressure * data_headcount), l.max_team_size.clone()]),
        )?;
        let project_managers = sheet.formula(
            "project_managers",
            "Project managers",
            max_of([ceil(engineers.clone() / l.engineers_per_pm.clone()), l.min_pms.clone()]),
        )?;
        let engineering = sheet.formula(
            "engineering_cost",
            "Engineering",
            engineers.clone() * l.ai_salary.clone() * timeline_years.clone(),
        )?;
        let project_management = sheet.formula(
            "project_management_cost",
            "Project management",
            project_managers * l.ai_salary.clone() * l.pm_salary_ratio.clone() * timeline_years,
        )?;
        let infrastructure = sheet.formula(
            "infrastructure_cost",
            "Infrastructure",
            (engineering.clone() + project_management.clone()) * l.infrastructure_rate.clone(),
        )?;
        let training = sheet.formula(
            "training_cost",
            "Training",
            (engineering.clone() + project_management.clone()) * l.training_rate.clone(),
        )?;
        let computed = sheet.formula(
            "implementation_computed",
            "Implementation (computed)",
            sum_of([engineering, project_management, infrastructure, training]),
        )?;
        let budget_floor = sheet.formula(
            "stated_budget_floor",
            "Stated budget × data cost multiplier",
            e.stated_budget.clone() * f.data_cost_multiplier.clone(),
        )?;
        let realistic =
            sheet.formula("implementation_realistic", "Implementation (realistic)", max_of([budget_floor, computed]))?;

        // Ongoing
        let ongoing_headcount = sheet.formula(
            "ongoing_headcount",
            "Ongoing AI headcount",
            max_of([engineers * l.ongoing_headcount_ratio.clone(), l.min_ongoing_headcount.clone()]),
        )?;
        let ongoing_headcount_cost = sheet.formula(
            "ongoing_headcount_cost",
            "Ongoing AI headcount cost",
            ongoing_headcount * l.ai_salary.clone(),
        )?;
        let api_cost = sheet.formula(
            "api_cost",
            "API cost",
            e.team_size.clone()
                * f.hours_per_week.clone()
                * l.weeks_per_year.clone()
                * automation_potential.clone()
                * l.requests_per_hour.clone()
                / 1000.0
                * l.api_cost_per_1k.clone(),
        )?;
        let adjacent = sheet.formula(
            "adjacent_products",
            "Adjacent products",
            l.annual_license.clone() * l.adjacent_product_rate.clone(),
        )?;
        let model_retraining = sheet.formula(
            "model_retraining",
            "Model retraining",
            realistic.clone() * l.model_retraining_rate.clone(),
        )?;
        let retained_retraining = sheet.formula(
            "retained_staff_retraining",
            "Retained staff retraining",
            retained * e.avg_salary.clone() * l.retained_retraining_rate.clone(),
        )?;
        let tech_debt = sheet.formula("tech_debt", "Tech debt", realistic.clone() * l.tech_debt_rate.clone())?;
        let ongoing_computed = sheet.formula(
            "ongoing_computed",
            "Ongoing cost (computed)",
            sum_of([
                ongoing_headcount_cost,
                api_cost.clone(),
                l.annual_license.clone(),
                adjacent,
                model_retraining,
                l.compliance_cost.clone(),
                retained_retraining,
                tech_debt,
                l.cyber_insurance_cost.clone(),
            ]),
        )?;
        let ongoing_effective = sheet.formula(
            "ongoing_effective",
            "Ongoing cost (effective)",
            max_of([e.stated_ongoing_cost.clone(), ongoing_computed]),
        )?;

        // One-time and hidden
        let contingency = sheet.formula("contingency", "Contingency", realistic.clone() * l.contingency_rate.clone())?;
        let vendor_termination = sheet.formula(
            "vendor_termination",
            "Vendor termination",
            e.vendor_termination_cost.clone()
                + e.vendors_to_replace.clone() * l.annual_license.clone() * l.vendor_switching_rate.clone(),
        )?;
        let one_time_total = sheet.formula(
            "one_time_total",
            "One-time costs",
            sum_of([l.legal_cost.clone(), l.security_cost.clone(), contingency, vendor_termination]),
        )?;
        let change_management = sheet.formula(
            "change_management",
            "Change management",
            realistic.clone() * l.change_management_rate.clone(),
        )?;
        let cultural_resistance = sheet.formula(
            "cultural_resistance",
            "Cultural resistance",
            realistic.clone() * l.cultural_resistance_rate.clone(),
        )?;
        let data_cleanup = sheet.formula(
            "data_cleanup",
            "Data cleanup",
            realistic.clone()
                * data_tier(
                    &f.data_level,
                    l.low_data_cleanup_rate.clone(),
                    l.mid_data_cleanup_rate.clone(),
                    num(0.0),
                ),
        )?;
        let integration_testing = sheet.formula(
            "integration_testing",
            "Integration testing",
            realistic.clone() * l.integration_testing_rate.clone(),
        )?;
        let productivity_dip = sheet.formula(
            "productivity_dip",
            "Productivity dip",
            l.productivity_dip_months.clone() * l.productivity_dip_rate.clone() * annual_labor_cost.clone()
                / MONTHS_PER_YEAR,
        )?;
        let hidden_total = sheet.formula(
            "hidden_total",
            "Hidden costs",
            sum_of([change_management, cultural_resistance, data_cleanup, integration_testing, productivity_dip]),
        )?;

        let upfront_investment = sheet.formula(
            "upfront_investment",
            "Upfront investment",
            realistic.clone() + hidden_total + one_time_total,
        )?;
        let separation_cost = sheet.formula(
            "separation_cost",
            "Separation cost",
            displaced.clone() * e.avg_salary.clone() * l.separation_multiplier.clone(),
        )?;
        let total_investment = sheet.formula(
            "total_investment",
            "Total investment",
            upfront_investment.clone() + separation_cost.clone(),
        )?;

        // Value
        let (headcount_gross, headcount_risk_adjusted) = sheet.value_line(
            "headcount_value",
            "Headcount value",
            displaced * e.avg_salary.clone(),
            &risk_multiplier,
        )?;
        let (_, efficiency) = sheet.value_line(
            "efficiency_value",
            "Efficiency value",
            max_of([annual_labor_cost.clone() * automation_potential.clone() - headcount_gross, num(0.0)]),
            &risk_multiplier,
        )?;
        let (_, error_reduction) = sheet.value_line(
            "error_reduction_value",
            "Error reduction value",
            annual_rework_cost.clone() * automation_potential.clone(),
            &risk_multiplier,
        )?;
        let (_, tool_replacement) = sheet.value_line(
            "tool_replacement_value",
            "Tool replacement value",
            f.tool_cost.clone() * l.tool_replacement_rate.clone(),
            &risk_multiplier,
        )?;
        let enhancement_risk_adjusted = sheet.formula(
            "enhancement_value_risk_adjusted",
            "Enhancement value (risk-adjusted)",
            sum_of([efficiency, error_reduction, tool_replacement]),
        )?;
        sheet.formula(
            "total_value_risk_adjusted",
            "Total value (risk-adjusted)",
            headcount_risk_adjusted.clone() + enhancement_risk_adjusted.clone(),
        )?;
        let net_annual_savings = sheet.formula(
            "net_annual_savings",
            "Net annual savings",
            total_current_cost.clone() * automation_potential.clone() * risk_multiplier.clone()
                - ongoing_effective.clone(),
        )?;

        Ok(Self {
            automation_potential,
            risk_multiplier,
            annual_labor_cost,
            annual_rework_cost,
            tool_cost: f.tool_cost.clone(),
            total_current_cost,
            implementation_realistic: realistic,
            api_cost,
            ongoing_effective,
            upfront_investment,
            separation_cost,
            total_investment,
            headcount_risk_adjusted,
            enhancement_risk_adjusted,
            net_annual_savings,
        })
    }
}

struct Scenario {
    key: &'static str,
    label: &'static str,
    multiplier: Expr,
    weight: Expr,
}

impl Scenario {
    fn write_multipliers(workbook: &mut Workbook, inputs: &ResolvedInputs) -> Result<Vec<Self>, FormulaError> {
        let constants = &inputs.constants;
        let mut sheet = Sheet::new(workbook, Tab::Lookups);
        [
            ("conservative", "Conservative", constants.conservative_multiplier, constants.conservative_weight),
            ("base", "Base", constants.base_multiplier, constants.base_weight),
            ("optimistic", "Optimistic", constants.optimistic_multiplier, constants.optimistic_weight),
        ]
        .into_iter()
        .map(|(key, label, multiplier, weight)| -> Result<Self, FormulaError> {
            Ok(Self {
                key,
                label,
                multiplier: sheet.number(
                    &format!("{key}_multiplier"),
                    format!("{label} savings multiplier"),
                    multiplier,
                )?,
                weight: sheet.number(&format!("{key}_weight"), format!("{label} scenario weight"), weight)?,
            })
        })
        .collect()
    }
}

struct ScenarioFlows<'s> {
    scenario: &'s Scenario,
    gross_savings: Vec<Expr>,
    net_cash_flows: Vec<Expr>,
    present_values: Vec<Expr>,
    /// Year 0 first.
    cumulative: Vec<Expr>,
}

struct Dcf<'s> {
    discount_factors: Vec<Expr>,
    separation_costs: Vec<Expr>,
    ongoing_costs: Vec<Expr>,
    flows: Vec<ScenarioFlows<'s>>,
}

impl<'s> Dcf<'s> {
    fn write(
        workbook: &mut Workbook,
        lookups: &Lookups,
        calc: &Calc,
        scenarios: &'s [Scenario],
    ) -> Result<Self, FormulaError> {
        let mut sheet = Sheet::new(workbook, Tab::FiveYearDcf);
        let mut wage_growth = Vec::with_capacity(lookups.years.len());
        let mut discount_factors = Vec::with_capacity(lookups.years.len());
        let mut separation_costs = Vec::with_capacity(lookups.years.len());
        let mut ongoing_costs = Vec::with_capacity(lookups.years.len());

        for row in &lookups.years {
            let year = row.year;
            let elapsed = f64::from(year);
            wage_growth.push(sheet.formula(
                &year_key("wage_growth", year),
                format!("Wage growth (Y{year})"),
                pow(num(1.0) + lookups.wage_inflation.clone(), num(elapsed - 1.0)),
            )?);
            discount_factors.push(sheet.formula(
                &year_key("discount_factor", year),
                format!("Discount factor (Y{year})"),
                pow(num(1.0) + lookups.discount_rate.clone(), num(elapsed)),
            )?);
            separation_costs.push(sheet.formula(
                &year_key("separation_cost", year),
                format!("Separation outflow (Y{year})"),
                calc.separation_cost.clone() * row.hr_reduction_this_year.clone(),
            )?);
            ongoing_costs.push(sheet.formula(
                &year_key("ongoing_cost", year),
                format!("Ongoing cost (Y{year})"),
                calc.ongoing_effective.clone() * row.cumulative_escalation.clone(),
            )?);
        }

        let mut flows = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let key = |field: &str, year: u32| year_key(&format!("{}.{field}", scenario.key), year);
            let label = |field: &str, year: u32| format!("{}: {field} (Y{year})", scenario.label);

            let mut gross_savings = Vec::new();
            let mut net_cash_flows = Vec::new();
            let mut present_values = Vec::new();
            let mut cumulative = vec![sheet.formula(
                &key("cumulative_cash_flow", 0),
                label("cumulative cash flow", 0),
                -calc.upfront_investment.clone(),
            )?];

            for (index, row) in lookups.years.iter().enumerate() {
                let year = row.year;
                let (Some(growth), Some(separation), Some(ongoing), Some(factor), Some(previous)) = (
                    wage_growth.get(index),
                    separation_costs.get(index),
                    ongoing_costs.get(index),
                    discount_factors.get(index),
                    cumulative.last().cloned(),
                ) else {
                    break;
                };

                let enhancement = sheet.formula(
                    &key("enhancement_savings", year),
                    label("enhancement savings", year),
                    calc.enhancement_risk_adjusted.clone()
                        * row.adoption_ramp.clone()
                        * scenario.multiplier.clone()
                        * growth.clone(),
                )?;
                let headcount = sheet.formula(
                    &key("headcount_savings", year),
                    label("headcount savings", year),
                    calc.headcount_risk_adjusted.clone()
                        * row.cumulative_hr_reduction.clone()
                        * scenario.multiplier.clone()
                        * growth.clone(),
                )?;
                let gross =
                    sheet.formula(&key("gross_savings", year), label("gross savings", year), enhancement + headcount)?;
                let net = sheet.formula(
                    &key("net_cash_flow", year),
                    label("net cash flow", year),
                    gross.clone() - separation.clone() - ongoing.clone(),
                )?;
                let present_value = sheet.formula(
                    &key("present_value", year),
                    label("present value", year),
                    net.clone() / factor.clone(),
                )?;
                let running = sheet.formula(
                    &key("cumulative_cash_flow", year),
                    label("cumulative cash flow", year),
                    previous + net.clone(),
                )?;

                gross_savings.push(gross);
                net_cash_flows.push(net);
                present_values.push(present_value);
                cumulative.push(running);
            }

            flows.push(ScenarioFlows { scenario, gross_savings, net_cash_flows, present_values, cumulative });
        }

        Ok(Self { discount_factors, separation_costs, ongoing_costs, flows })
    }
}

/// Months to first break-even: nested IFs over the cumulative series, `NA()`
/// when it never turns non-negative.
fn payback_formula(cumulative: &[Expr], net_cash_flows: &[Expr]) -> Expr {
    let crossings: Vec<(usize, &[Expr], &Expr)> =
        cumulative.windows(2).zip(net_cash_flows).enumerate().map(|(index, (pair, net))| (index, pair, net)).collect();

    let mut formula = num(f64::NAN);
    for (index, pair, net) in crossings.into_iter().rev() {
        if let [previous, current] = pair {
            let months = num(index as f64 * MONTHS_PER_YEAR) + -previous.clone() / net.clone() * MONTHS_PER_YEAR;
            formula = if_then(current.clone(), Comparison::Ge, num(0.0), round(months, 1), formula);
        }
    }
    match cumulative.first() {
        Some(start) => if_then(start.clone(), Comparison::Ge, num(0.0), num(0.0), formula),
        None => formula,
    }
}

struct Headline {
    base_npv: Expr,
    base_roic: Expr,
    base_payback: Expr,
    expected_npv: Expr,
}

fn write_scenario_summaries(
    workbook: &mut Workbook,
    lookups: &Lookups,
    calc: &Calc,
    dcf: &Dcf<'_>,
) -> Result<Headline, FormulaError> {
    let mut sheet = Sheet::new(workbook, Tab::Scenarios);
    let cap = lookups.roic_cap.clone();
    let mut weighted = Vec::with_capacity(dcf.flows.len());
    let mut base = None;

    for flows in &dcf.flows {
        let scenario = flows.scenario;
        let npv = sheet.formula(
            &format!("{}.npv", scenario.key),
            format!("{} NPV", scenario.label),
            sum_of(std::iter::once(-calc.upfront_investment.clone()).chain(flows.present_values.iter().cloned())),
        )?;
        let total_net = sheet.formula(
            &format!("{}.total_net_cash_flow", scenario.key),
            format!("{} undiscounted net cash flow (Y1-Y5)", scenario.label),
            sum_of(flows.net_cash_flows.iter().cloned()),
        )?;
        let roic = sheet.formula(
            &format!("{}.roic", scenario.key),
            format!("{} ROIC", scenario.label),
            if_then(
                calc.total_investment.clone(),
                Comparison::Eq,
                num(0.0),
                num(0.0),
                min_of([
                    cap.clone(),
                    max_of([
                        -cap.clone(),
                        (total_net - calc.upfront_investment.clone()) / calc.total_investment.clone(),
                    ]),
                ]),
            ),
        )?;
        let payback = sheet.formula(
            &format!("{}.payback_months", scenario.key),
            format!("{} payback (months)", scenario.label),
            payback_formula(&flows.cumulative, &flows.net_cash_flows),
        )?;

        weighted.push(npv.clone() * scenario.weight.clone());
        if scenario.key == "base" {
            base = Some((npv, roic, payback));
        }
    }

    let expected_npv = sheet.formula("expected_npv", "Probability-weighted NPV", sum_of(weighted))?;
    let (base_npv, base_roic, base_payback) = base.unwrap_or_else(|| (num(f64::NAN), num(f64::NAN), num(f64::NAN)));
    Ok(Headline { base_npv, base_roic, base_payback, expected_npv })
}

struct Inaction {
    five_year_total: Expr,
    monthly_cost_of_delay: Expr,
}

fn write_opportunity_cost(workbook: &mut Workbook, lookups: &Lookups, calc: &Calc) -> Result<Inaction, FormulaError> {
    let mut sheet = Sheet::new(workbook, Tab::OpportunityCost);
    let compounded = |rate: &Expr, year: u32| pow(num(1.0) + rate.clone(), num(f64::from(year))) - 1.0;

    let forgone_base = sheet.formula(
        "forgone_base",
        "Net annual savings forgone (floored at 0)",
        max_of([calc.net_annual_savings.clone(), num(0.0)]),
    )?;

    let mut totals = Vec::with_capacity(lookups.years.len());
    let mut cumulative: Option<Expr> = None;
    for row in &lookups.years {
        let year = row.year;
        let forgone = sheet.formula(
            &year_key("forgone_savings", year),
            format!("Forgone savings (Y{year})"),
            forgone_base.clone() * row.adoption_ramp.clone(),
        )?;
        let wage = sheet.formula(
            &year_key("wage_inflation_loss", year),
            format!("Wage inflation (Y{year})"),
            calc.annual_labor_cost.clone() * compounded(&lookups.wage_inflation, year),
        )?;
        let legacy = sheet.formula(
            &year_key("legacy_creep_loss", year),
            format!("Legacy cost creep (Y{year})"),
            (calc.tool_cost.clone() + calc.annual_rework_cost.clone()) * compounded(&lookups.legacy_creep_rate, year),
        )?;
        let competitive = sheet.formula(
            &year_key("competitive_penalty_loss", year),
            format!("Competitive penalty (Y{year})"),
            calc.total_current_cost.clone() * compounded(&lookups.competitive_penalty_rate, year),
        )?;
        let compliance = sheet.formula(
            &year_key("compliance_risk_loss", year),
            format!("Compliance risk (Y{year})"),
            calc.total_current_cost.clone() * compounded(&lookups.compliance_risk_rate, year),
        )?;
        let total = sheet.formula(
            &year_key("total", year),
            format!("Cost of inaction (Y{year})"),
            sum_of([forgone, wage, legacy, competitive, compliance]),
        )?;
        let running = sheet.formula(
            &year_key("cumulative", year),
            format!("Cumulative cost of inaction (Y{year})"),
            match cumulative.take() {
                Some(previous) => previous + total.clone(),
                None => total.clone(),
            },
        )?;
        cumulative = Some(running);
        totals.push(total);
    }

    let through = |years: usize| sum_of(totals.iter().take(years).cloned());
    let twelve = sheet.formula("twelve_month_total", "Cost of inaction, 12 months", through(1))?;
    sheet.formula("twenty_four_month_total", "Cost of inaction, 24 months", through(2))?;
    let five_year_total = sheet.formula("five_year_total", "Cost of inaction, 5 years", through(totals.len()))?;
    let monthly_cost_of_delay =
        sheet.formula("monthly_cost_of_delay", "Monthly cost of delay", twelve / MONTHS_PER_YEAR)?;
    Ok(Inaction { five_year_total, monthly_cost_of_delay })
}

fn write_revenue_and_scale(
    workbook: &mut Workbook,
    inputs: &ResolvedInputs,
    lookups: &Lookups,
    effective: &Effective,
    calc: &Calc,
) -> Result<(), FormulaError> {
    let mut sheet = Sheet::new(workbook, Tab::RevenueAndScale);

    for (key, uplift) in ["conservative", "base", "optimistic"].into_iter().zip(&lookups.revenue_uplift) {
        let gross = sheet.formula(
            &format!("{key}.gross"),
            format!("Revenue enablement, {key} (gross, informational)"),
            uplift.clone() * calc.total_current_cost.clone() + effective.revenue_impact.clone(),
        )?;
        sheet.formula(
            &format!("{key}.risk_adjusted"),
            format!("Revenue enablement, {key} (risk-adjusted, informational)"),
            gross * (num(1.0) - lookups.revenue_risk_discount.clone()),
        )?;
    }

    let qualified = sheet.formula(
        "rd_qualified_spend",
        "R&D qualified spend",
        calc.implementation_realistic.clone() * lookups.rd_qualification_rate.clone(),
    )?;
    let federal = sheet.formula(
        "rd_federal_credit",
        "Federal R&D credit (informational)",
        qualified.clone() * lookups.federal_rd_rate.clone(),
    )?;
    let state = sheet.formula(
        "rd_state_credit",
        "State R&D credit (informational)",
        qualified * lookups.rd_credit_rate.clone(),
    )?;
    sheet.formula("rd_total_credit", "Total R&D credit (informational)", federal + state)?;

    for multiple in &inputs.constants.scale_tiers {
        let growth = multiple - 1.0;
        let tier = format!("scale_{multiple}x");
        let traditional = sheet.formula(
            &format!("{tier}.traditional_cost"),
            format!("{multiple}× volume, traditional cost"),
            calc.total_current_cost.clone() * growth,
        )?;
        let ai = sheet.formula(
            &format!("{tier}.ai_incremental_cost"),
            format!("{multiple}× volume, AI incremental cost"),
            calc.api_cost.clone() * growth
                + calc.ongoing_effective.clone() * lookups.scale_ongoing_uplift.clone() * growth,
        )?;
        sheet.formula(
            &format!("{tier}.premium"),
            format!("{multiple}× volume, scalability premium"),
            max_of([traditional - ai, num(0.0)]),
        )?;
    }
    Ok(())
}

fn peer_percentile_formula(roic: &Expr, lookups: &Lookups) -> Expr {
    let p25 = lookups.peer_p25.clone();
    let median = lookups.peer_median.clone();
    let p75 = lookups.peer_p75.clone();
    let lower_spread = median.clone() - p25.clone();
    let upper_spread = p75.clone() - median.clone();

    let raw = if_then(
        roic.clone(),
        Comparison::Le,
        p25.clone(),
        num(25.0) * exp(-(p25.clone() - roic.clone()) / lower_spread.clone()),
        if_then(
            roic.clone(),
            Comparison::Le,
            median.clone(),
            num(25.0) + num(25.0) * (roic.clone() - p25) / lower_spread,
            if_then(
                roic.clone(),
                Comparison::Le,
                p75.clone(),
                num(50.0) + num(25.0) * (roic.clone() - median) / upper_spread.clone(),
                num(75.0) + num(25.0) * (num(1.0) - exp(-(roic.clone() - p75) / upper_spread)),
            ),
        ),
    );
    round(min_of([num(100.0), max_of([num(0.0), raw])]), 1)
}

fn write_dashboard(
    workbook: &mut Workbook,
    lookups: &Lookups,
    calc: &Calc,
    dcf: &Dcf<'_>,
    headline: &Headline,
    inaction: &Inaction,
) -> Result<(), FormulaError> {
    let mut sheet = Sheet::new(workbook, Tab::Dashboard);

    sheet.formula("automation_potential", "Automation potential", calc.automation_potential.clone())?;
    sheet.formula("risk_multiplier", "Risk multiplier", calc.risk_multiplier.clone())?;
    sheet.formula("upfront_investment", "Upfront investment", calc.upfront_investment.clone())?;
    sheet.formula("total_investment", "Total investment", calc.total_investment.clone())?;
    sheet.formula("net_annual_savings", "Net annual savings", calc.net_annual_savings.clone())?;
    sheet.formula("base_npv", "NPV (base)", headline.base_npv.clone())?;
    sheet.formula("expected_npv", "Expected NPV", headline.expected_npv.clone())?;
    sheet.formula("base_roic", "ROIC (base)", headline.base_roic.clone())?;
    sheet.formula("base_payback_months", "Payback (base, months)", headline.base_payback.clone())?;
    sheet.formula("peer_percentile", "Peer percentile (ROIC)", peer_percentile_formula(&headline.base_roic, lookups))?;
    sheet.formula("five_year_cost_of_inaction", "Cost of inaction, 5 years", inaction.five_year_total.clone())?;
    sheet.formula("monthly_cost_of_delay", "Monthly cost of delay", inaction.monthly_cost_of_delay.clone())?;

    let base_flows = dcf.flows.iter().find(|flows| flows.scenario.key == "base");
    let Some(base) = base_flows else {
        return Ok(());
    };

    let savings_terms = base
        .gross_savings
        .iter()
        .zip(&dcf.discount_factors)
        .map(|(gross, factor)| gross.clone() / base.scenario.multiplier.clone() / factor.clone());
    let present_value_of_savings =
        sheet.formula("present_value_of_savings", "PV of savings (multiplier 1.0)", sum_of(savings_terms))?;

    let cost_terms = dcf
        .separation_costs
        .iter()
        .zip(&dcf.ongoing_costs)
        .zip(&dcf.discount_factors)
        .map(|((separation, ongoing), factor)| (separation.clone() + ongoing.clone()) / factor.clone());
    let present_value_of_costs = sheet.formula(
        "present_value_of_costs",
        "PV of costs",
        calc.upfront_investment.clone() + sum_of(cost_terms),
    )?;

    let break_even = sheet.formula(
        "break_even_savings_multiplier",
        "Break-even savings multiplier",
        if_then(
            present_value_of_savings.clone(),
            Comparison::Gt,
            num(0.0),
            present_value_of_costs / present_value_of_savings,
            num(f64::NAN),
        ),
    )?;
    sheet.formula("margin_of_safety", "Margin of safety", num(1.0) - break_even)?;
    sheet.formula(
        "max_upfront_investment",
        "Maximum upfront investment for NPV ≥ 0",
        calc.upfront_investment.clone() + headline.base_npv.clone(),
    )?;

    let escalation_terms = lookups
        .years
        .iter()
        .zip(&dcf.discount_factors)
        .map(|(row, factor)| row.cumulative_escalation.clone() / factor.clone());
    let escalation_factor =
        sheet.formula("escalation_factor", "PV of ongoing escalation", sum_of(escalation_terms))?;
    sheet.formula(
        "max_ongoing_cost",
        "Maximum ongoing cost for NPV ≥ 0",
        if_then(
            escalation_factor.clone(),
            Comparison::Gt,
            num(0.0),
            calc.ongoing_effective.clone() + headline.base_npv.clone() / escalation_factor,
            calc.ongoing_effective.clone(),
        ),
    )?;
    Ok(())
}

fn write_sources(workbook: &mut Workbook, profile: &InputProfile, benchmark_version: &str) -> Result<(), FormulaError> {
    let mut sheet = Sheet::new(workbook, Tab::Sources);
    sheet.text("benchmark_version", "Benchmark set", benchmark_version)?;
    sheet.text(
        "automation_potential",
        "Automation potential",
        format!("Industry × process table ({} / {})", profile.industry.trim(), profile.process_type.trim()),
    )?;
    sheet.text("salaries", "AI salaries", "Location salary table for AI engineering roles")?;
    sheet.text("company_size", "Company size", "Size table: discount rate, licensing, legal, security, insurance")?;
    sheet.text("readiness", "Readiness", "Change and data readiness scales, levels 1 to 5")?;
    sheet.text("schedule", "Schedule", "Five-year adoption ramp, HR reduction and cost escalation")?;
    sheet.text("irr", "IRR", "Solved numerically by the engine; not expressed as a cell formula")?;
    sheet.text(
        "informational",
        "Informational lines",
        "Revenue enablement and R&D credit estimates are excluded from NPV, IRR and ROIC",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::build_workbook;
    use crate::benchmarks::BenchmarkTables;
    use crate::engine::{calculate_roi, InputProfile};
    use crate::mirror::Tab;

    fn close(left: f64, right: f64) -> bool {
        (left - right).abs() <= 1e-6 * left.abs().max(right.abs()).max(1.0)
    }

    #[test]
    fn every_tab_is_populated() {
        let tables = BenchmarkTables::standard();
        let workbook = build_workbook(&InputProfile::default(), &tables).expect("builds");
        for tab in Tab::ALL {
            assert!(workbook.tab(tab).next().is_some(), "{} is empty", tab.title());
        }
    }

    #[test]
    fn workbook_evaluates_to_engine_headlines() {
        let tables = BenchmarkTables::standard();
        let profile = InputProfile { tool_cost: 30_000.0, ..InputProfile::default() };
        let result = calculate_roi(&profile, &tables).expect("calculates");
        let values = build_workbook(&profile, &tables).expect("builds").evaluate().expect("evaluates");

        let value = |id: &str| values.get(id).unwrap_or(f64::NAN);
        assert!(close(value("calc.upfront_investment"), result.cost_model.upfront_investment));
        assert!(close(value("scenarios.base.npv"), result.scenarios.base.npv));
        assert!(close(value("scenarios.expected_npv"), result.expected_npv));
        assert!(close(value("dashboard.peer_percentile"), result.peer_comparison.percentile));
    }

    #[test]
    fn formulas_reference_other_tabs_by_address() {
        let tables = BenchmarkTables::standard();
        let workbook = build_workbook(&InputProfile::default(), &tables).expect("builds");
        let labor = workbook.formula("calc.annual_labor_cost").unwrap_or_default();
        assert!(labor.starts_with("=Inputs!B"), "{labor}");
        let upfront = workbook.formula("calc.upfront_investment").unwrap_or_default();
        assert!(upfront.contains("'Calc Engine'!B"), "{upfront}");
        let payback = workbook.formula("scenarios.base.payback_months").unwrap_or_default();
        assert!(payback.starts_with("=IF(") && payback.contains("NA()"), "{payback}");
    }

    #[test]
    fn archetype_mappings_are_formulas_over_answer_cells() {
        let tables = BenchmarkTables::standard();
        let profile =
            InputProfile { archetype_id: Some("document-processing".to_owned()), ..InputProfile::default() };
        let workbook = build_workbook(&profile, &tables).expect("builds");

        let answers = workbook.tab(Tab::Inputs).filter(|cell| cell.id.starts_with("inputs.answer.")).count();
        assert_eq!(answers, 8);
        let mapped = workbook.formula("calc.mapped.hoursPerWeek").unwrap_or_default();
        assert!(mapped.starts_with("=MAX(1, Inputs!B"), "{mapped}");
        let effective = workbook.formula("calc.hours_per_week").unwrap_or_default();
        assert!(effective.contains("'Calc Engine'!B") && effective.contains("Inputs!B"), "{effective}");
    }

    #[test]
    fn readiness_rows_are_selected_by_formula() {
        let tables = BenchmarkTables::standard();
        let workbook = build_workbook(&InputProfile::default(), &tables).expect("builds");
        let rows = workbook.tab(Tab::Lookups).filter(|cell| cell.id.starts_with("lookups.readiness.")).count();
        assert_eq!(rows, tables.readiness.len() * 3);
        let adoption = workbook.formula("calc.adoption_rate").unwrap_or_default();
        assert!(adoption.starts_with("=IF('Calc Engine'!B") && adoption.contains("Lookups!B"), "{adoption}");
    }

    #[test]
    fn unknown_category_fails_like_the_engine() {
        let tables = BenchmarkTables::standard();
        let profile = InputProfile { company_size: "Galactic".to_owned(), ..InputProfile::default() };
        assert!(build_workbook(&profile, &tables).is_err());
    }
}
