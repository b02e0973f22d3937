use serde::{Deserialize, Serialize};
use serde_json::Map;
use tracing::warn;

use crate::archetypes::{map_archetype_to_overrides, ArchetypeAnswers, ArchetypeOverrides, OverrideField};
use crate::benchmarks::{
    BenchmarkTables, CompanySizeBenchmark, IndustryBenchmark, ModelConstants, PeerDistribution,
    ProcessTypeBenchmark, ReadinessBenchmark, YearBenchmark,
};
use crate::errors::EngineError;

pub const MIN_READINESS: u8 = 1;
pub const MAX_READINESS: u8 = 5;

/// Flat engine input. Unknown keys are ignored and missing keys take the
/// defaults below, so older payloads without archetype fields still work.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputProfile {
    pub industry: String,
    pub company_size: String,
    pub location: String,
    pub state: String,

    pub team_size: f64,
    pub hours_per_week: f64,
    pub avg_salary: f64,
    pub error_rate: f64,
    pub tool_cost: f64,
    pub process_type: String,

    pub change_readiness: f64,
    pub data_readiness: f64,
    pub has_exec_sponsor: bool,

    pub stated_budget: f64,
    pub expected_timeline_months: f64,
    pub stated_ongoing_cost: f64,
    pub vendors_to_replace: f64,
    pub vendor_termination_cost: f64,

    /// Direct replacement for the benchmark automation potential.
    pub automation_potential: Option<f64>,
    pub revenue_impact: Option<f64>,
    pub risk_reduction: Option<f64>,

    pub archetype_id: Option<String>,
    pub archetype_inputs: ArchetypeAnswers,
}

impl Default for InputProfile {
    fn default() -> Self {
        Self {
            industry: "Technology / Software".to_owned(),
            company_size: "SMB (51-500)".to_owned(),
            location: "US - Other".to_owned(),
            state: "Other".to_owned(),
            team_size: 10.0,
            hours_per_week: 40.0,
            avg_salary: 75_000.0,
            error_rate: 0.05,
            tool_cost: 0.0,
            process_type: "Document Processing".to_owned(),
            change_readiness: 3.0,
            data_readiness: 3.0,
            has_exec_sponsor: true,
            stated_budget: 0.0,
            expected_timeline_months: 6.0,
            stated_ongoing_cost: 0.0,
            vendors_to_replace: 0.0,
            vendor_termination_cost: 0.0,
            automation_potential: None,
            revenue_impact: None,
            risk_reduction: None,
            archetype_id: None,
            archetype_inputs: Map::new(),
        }
    }
}

impl InputProfile {
    pub fn from_json(payload: &str) -> Result<Self, EngineError> {
        serde_json::from_str(payload).map_err(|error| EngineError::InvalidInput(error.to_string()))
    }

    fn check_amounts(&self) -> Result<(), EngineError> {
        let amounts = [
            ("teamSize", self.team_size),
            ("hoursPerWeek", self.hours_per_week),
            ("avgSalary", self.avg_salary),
            ("errorRate", self.error_rate),
            ("toolCost", self.tool_cost),
            ("changeReadiness", self.change_readiness),
            ("dataReadiness", self.data_readiness),
            ("statedBudget", self.stated_budget),
            ("expectedTimelineMonths", self.expected_timeline_months),
            ("statedOngoingCost", self.stated_ongoing_cost),
            ("vendorsToReplace", self.vendors_to_replace),
            ("vendorTerminationCost", self.vendor_termination_cost),
        ];
        for (field, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidInput(format!(
                    "`{field}` must be a finite, non-negative number"
                )));
            }
        }
        if self.team_size < 1.0 {
            return Err(EngineError::InvalidInput("`teamSize` must be at least 1".to_owned()));
        }
        if self.error_rate > 1.0 {
            return Err(EngineError::InvalidInput("`errorRate` must be a fraction in [0, 1]".to_owned()));
        }
        Ok(())
    }
}

/// Benchmark rows selected by the profile's category keys.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedBenchmarks {
    pub automation_potential: f64,
    pub industry: IndustryBenchmark,
    pub company_size: CompanySizeBenchmark,
    pub change_readiness: ReadinessBenchmark,
    pub data_readiness: ReadinessBenchmark,
    pub ai_salary: f64,
    pub process_type: ProcessTypeBenchmark,
    pub rd_credit_rate: f64,
    pub peer_roic: PeerDistribution,
    pub schedule: Vec<YearBenchmark>,
}

/// Profile after archetype merge, clamping, and benchmark lookups. Everything
/// downstream is arithmetic over this value and the model constants.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedInputs {
    pub team_size: f64,
    pub hours_per_week: f64,
    pub avg_salary: f64,
    pub error_rate: f64,
    pub tool_cost: f64,
    pub change_readiness: u8,
    pub data_readiness: u8,
    pub has_exec_sponsor: bool,
    pub stated_budget: f64,
    pub timeline_months: f64,
    pub stated_ongoing_cost: f64,
    pub vendors_to_replace: f64,
    pub vendor_termination_cost: f64,
    /// Benchmark value, or the override when one was supplied.
    pub automation_potential: f64,
    pub revenue_impact: f64,
    pub risk_reduction: f64,
    pub archetype_id: Option<String>,
    pub applied_overrides: ArchetypeOverrides,
    pub benchmarks: SelectedBenchmarks,
    pub constants: ModelConstants,
}

impl ResolvedInputs {
    pub fn resolve(profile: &InputProfile, tables: &BenchmarkTables) -> Result<Self, EngineError> {
        profile.check_amounts()?;

        let constants = tables.constants.clone();
        let change_readiness = clamp_readiness("changeReadiness", profile.change_readiness);
        let data_readiness = clamp_readiness("dataReadiness", profile.data_readiness);

        let mut applied_overrides = ArchetypeOverrides::new();
        let direct = [
            (OverrideField::AutomationPotential, profile.automation_potential),
            (OverrideField::RevenueImpact, profile.revenue_impact),
            (OverrideField::RiskReduction, profile.risk_reduction),
        ];
        for (field, value) in direct {
            if let Some(value) = value {
                accept_override(&mut applied_overrides, field, value);
            }
        }
        // Archetype mappings win over the flat override fields.
        if let Some(id) = profile.archetype_id.as_deref() {
            for (field, value) in map_archetype_to_overrides(id, &profile.archetype_inputs) {
                accept_override(&mut applied_overrides, field, value);
            }
        }

        let mut schedule = Vec::with_capacity(constants.dcf_years as usize);
        for year in 1..=constants.dcf_years {
            schedule.push(tables.year(year)?.clone());
        }

        let benchmarks = SelectedBenchmarks {
            automation_potential: tables.automation_potential(&profile.industry, &profile.process_type)?,
            industry: tables.industry(&profile.industry)?.clone(),
            company_size: tables.company_size(&profile.company_size)?.clone(),
            change_readiness: tables.readiness(change_readiness)?.clone(),
            data_readiness: tables.readiness(data_readiness)?.clone(),
            ai_salary: tables.ai_salary(&profile.location)?,
            process_type: tables.process_type(&profile.process_type)?.clone(),
            rd_credit_rate: tables.rd_credit_rate(&profile.state)?,
            peer_roic: tables.peer_roic(&profile.industry, &profile.company_size)?,
            schedule,
        };

        let overridden = |field: OverrideField| applied_overrides.get(&field).copied();

        Ok(Self {
            team_size: profile.team_size,
            hours_per_week: overridden(OverrideField::HoursPerWeek).unwrap_or(profile.hours_per_week),
            avg_salary: profile.avg_salary,
            error_rate: overridden(OverrideField::ErrorRate).unwrap_or(profile.error_rate).min(1.0),
            tool_cost: overridden(OverrideField::ToolCost).unwrap_or(profile.tool_cost),
            change_readiness,
            data_readiness,
            has_exec_sponsor: profile.has_exec_sponsor,
            stated_budget: profile.stated_budget,
            timeline_months: profile.expected_timeline_months.max(1.0),
            stated_ongoing_cost: profile.stated_ongoing_cost,
            vendors_to_replace: profile.vendors_to_replace,
            vendor_termination_cost: profile.vendor_termination_cost,
            automation_potential: overridden(OverrideField::AutomationPotential)
                .unwrap_or(benchmarks.automation_potential)
                .min(1.0),
            revenue_impact: overridden(OverrideField::RevenueImpact).unwrap_or(0.0),
            risk_reduction: overridden(OverrideField::RiskReduction).unwrap_or(0.0),
            archetype_id: profile.archetype_id.clone(),
            applied_overrides,
            benchmarks,
            constants,
        })
    }
}

/// Records `value` unless it is non-finite or negative; a rejected value
/// leaves any earlier override for the field in place.
fn accept_override(overrides: &mut ArchetypeOverrides, field: OverrideField, value: f64) {
    if value.is_finite() && value >= 0.0 {
        overrides.insert(field, value);
    } else {
        warn!(
            event_name = "engine.override.ignored",
            field = field.as_str(),
            value,
            "override must be a finite, non-negative number"
        );
    }
}

fn clamp_readiness(field: &'static str, value: f64) -> u8 {
    let rounded = value.round();
    let clamped = rounded.clamp(f64::from(MIN_READINESS), f64::from(MAX_READINESS));
    if clamped != value {
        warn!(
            event_name = "engine.readiness.clamped",
            field,
            value,
            clamped,
            "readiness outside the 1-5 integer scale"
        );
    }
    clamped as u8
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{accept_override, InputProfile, ResolvedInputs};
    use crate::archetypes::{ArchetypeOverrides, OverrideField};
    use crate::benchmarks::BenchmarkTables;
    use crate::errors::{BenchmarkTable, EngineError, LookupError};

    #[test]
    fn missing_keys_take_defaults_and_unknown_keys_are_ignored() {
        let profile = InputProfile::from_json(r#"{"teamSize": 4, "favouriteColour": "teal"}"#)
            .expect("parses");
        assert_eq!(profile.team_size, 4.0);
        assert_eq!(profile.industry, "Technology / Software");
        assert!(profile.archetype_id.is_none());
        assert!(profile.archetype_inputs.is_empty());
    }

    #[test]
    fn archetype_overrides_replace_generic_fields_and_benchmark() {
        let tables = BenchmarkTables::standard();
        let profile = InputProfile {
            archetype_id: Some("document-processing".to_owned()),
            archetype_inputs: json!({ "documentsPerMonth": 5200, "minutesPerDocument": 10, "processors": 5 })
                .as_object()
                .cloned()
                .unwrap_or_default(),
            ..InputProfile::default()
        };

        let resolved = ResolvedInputs::resolve(&profile, &tables).expect("resolves");
        assert!((resolved.hours_per_week - 40.0).abs() < 1e-9);
        assert_eq!(
            Some(&resolved.automation_potential),
            resolved.applied_overrides.get(&OverrideField::AutomationPotential)
        );
        assert_ne!(resolved.automation_potential, resolved.benchmarks.automation_potential);
    }

    #[test]
    fn readiness_is_clamped_into_scale() {
        let tables = BenchmarkTables::standard();
        let profile = InputProfile { change_readiness: 9.0, data_readiness: 0.0, ..InputProfile::default() };
        let resolved = ResolvedInputs::resolve(&profile, &tables).expect("resolves");
        assert_eq!(resolved.change_readiness, 5);
        assert_eq!(resolved.data_readiness, 1);
    }

    #[test]
    fn stated_timeline_is_at_least_one_month() {
        let tables = BenchmarkTables::standard();
        let profile = InputProfile { expected_timeline_months: 0.0, ..InputProfile::default() };
        let resolved = ResolvedInputs::resolve(&profile, &tables).expect("resolves");
        assert_eq!(resolved.timeline_months, 1.0);
    }

    #[test]
    fn unknown_industry_is_a_lookup_error() {
        let tables = BenchmarkTables::standard();
        let profile = InputProfile { industry: "Asteroid Mining".to_owned(), ..InputProfile::default() };
        let error = ResolvedInputs::resolve(&profile, &tables).expect_err("unknown industry");
        assert!(matches!(
            error,
            EngineError::Lookup(LookupError::UnknownKey { table: BenchmarkTable::AutomationPotential, .. })
        ));
    }

    #[test]
    fn unknown_state_falls_back_to_declared_row() {
        let tables = BenchmarkTables::standard();
        let profile = InputProfile { state: "Atlantis".to_owned(), ..InputProfile::default() };
        let resolved = ResolvedInputs::resolve(&profile, &tables).expect("resolves");
        assert_eq!(resolved.benchmarks.rd_credit_rate, 0.0);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let tables = BenchmarkTables::standard();
        let profile = InputProfile { avg_salary: -1.0, ..InputProfile::default() };
        let error = ResolvedInputs::resolve(&profile, &tables).expect_err("negative salary");
        assert!(matches!(error, EngineError::InvalidInput(message) if message.contains("avgSalary")));
    }

    #[test]
    fn non_finite_override_is_ignored() {
        let tables = BenchmarkTables::standard();
        let profile = InputProfile { automation_potential: Some(f64::NAN), ..InputProfile::default() };
        let resolved = ResolvedInputs::resolve(&profile, &tables).expect("resolves");
        assert!(resolved.applied_overrides.is_empty());
        assert_eq!(resolved.automation_potential, resolved.benchmarks.automation_potential);
    }

    #[test]
    fn rejected_later_override_keeps_the_earlier_one() {
        let mut overrides = ArchetypeOverrides::new();
        accept_override(&mut overrides, OverrideField::AutomationPotential, 0.4);
        accept_override(&mut overrides, OverrideField::AutomationPotential, -0.2);
        accept_override(&mut overrides, OverrideField::AutomationPotential, f64::INFINITY);
        assert_eq!(overrides.get(&OverrideField::AutomationPotential), Some(&0.4));
    }

    #[test]
    fn archetype_mapping_wins_over_the_flat_override() {
        let tables = BenchmarkTables::standard();
        let flat = InputProfile { automation_potential: Some(0.4), ..InputProfile::default() };
        let resolved = ResolvedInputs::resolve(&flat, &tables).expect("resolves");
        assert_eq!(resolved.automation_potential, 0.4);

        let mapped = InputProfile { archetype_id: Some("document-processing".to_owned()), ..flat };
        let resolved = ResolvedInputs::resolve(&mapped, &tables).expect("resolves");
        assert_ne!(resolved.automation_potential, 0.4);
    }
}
