//! Benchmark Store
//!
//! Static reference tables consumed by the calculation engine. The tables are
//! versioned as a unit and never mutated once built; the engine receives them
//! by reference so alternate benchmark sets can be injected in tests.

mod data;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{BenchmarkTable, LookupError};

pub use data::{COMPANY_SIZES, INDUSTRIES, LOCATIONS, PROCESS_TYPES, STANDARD_VERSION, US_STATES};

/// Key every category table carries as a selectable catch-all row.
pub const OTHER_KEY: &str = "Other";

/// A string-keyed table with an optional declared fallback row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyedTable<T> {
    entries: BTreeMap<String, T>,
    fallback: Option<String>,
}

impl<T> KeyedTable<T> {
    pub fn new<K: Into<String>>(entries: impl IntoIterator<Item = (K, T)>) -> Self {
        Self {
            entries: entries.into_iter().map(|(key, value)| (key.into(), value)).collect(),
            fallback: None,
        }
    }

    /// Declares the row unknown keys resolve to. The row must exist.
    pub fn with_fallback(mut self, key: impl Into<String>) -> Self {
        self.fallback = Some(key.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, table: BenchmarkTable, key: &str) -> Result<&T, LookupError> {
        let trimmed = key.trim();
        if let Some(value) = self.entries.get(trimmed) {
            return Ok(value);
        }

        self.fallback
            .as_deref()
            .and_then(|fallback| self.entries.get(fallback))
            .ok_or_else(|| LookupError::UnknownKey { table, key: trimmed.to_owned() })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key.trim())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryBenchmark {
    pub success_rate: f64,
    pub competitive_penalty_rate: f64,
    pub compliance_risk_rate: f64,
    /// Revenue uplift fractions for conservative, base and optimistic scenarios.
    pub revenue_uplift: [f64; 3],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySizeBenchmark {
    pub size_multiplier: f64,
    pub discount_rate: f64,
    pub max_team_size: f64,
    pub separation_multiplier: f64,
    pub annual_license: f64,
    pub legal_cost: f64,
    pub security_cost: f64,
    pub compliance_cost: f64,
    pub cyber_insurance_cost: f64,
    pub vendor_switching_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessBenchmark {
    pub level: u8,
    pub adoption_rate: f64,
    pub timeline_multiplier: f64,
    pub cost_multiplier: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTypeBenchmark {
    pub api_cost_per_1k: f64,
    pub requests_per_hour: f64,
    pub tool_replacement_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearBenchmark {
    pub year: u32,
    pub hr_reduction_this_year: f64,
    pub cumulative_hr_reduction: f64,
    pub adoption_ramp: f64,
    pub cost_escalation_this_year: f64,
    pub cumulative_escalation: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerDistribution {
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
}

/// Named scalar assumptions used throughout the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConstants {
    pub dcf_years: u32,
    pub hours_per_year: f64,
    pub weeks_per_year: f64,
    pub max_headcount_reduction: f64,
    pub no_sponsor_adoption_factor: f64,
    pub no_sponsor_timeline_factor: f64,
    pub team_members_per_engineer: f64,
    pub engineers_per_pm: f64,
    pub min_pms: f64,
    pub urgent_timeline_months: f64,
    pub urgent_timeline_multiplier: f64,
    pub short_timeline_months: f64,
    pub short_timeline_multiplier: f64,
    pub low_data_headcount_multiplier: f64,
    pub mid_data_headcount_multiplier: f64,
    pub pm_salary_ratio: f64,
    pub infrastructure_rate: f64,
    pub training_rate: f64,
    pub ongoing_headcount_ratio: f64,
    pub min_ongoing_headcount: f64,
    pub adjacent_product_rate: f64,
    pub model_retraining_rate: f64,
    pub retained_retraining_rate: f64,
    pub tech_debt_rate: f64,
    pub contingency_rate: f64,
    pub change_management_rate: f64,
    pub cultural_resistance_rate: f64,
    pub low_data_cleanup_rate: f64,
    pub mid_data_cleanup_rate: f64,
    pub integration_testing_rate: f64,
    pub productivity_dip_months: f64,
    pub productivity_dip_rate: f64,
    pub wage_inflation: f64,
    pub legacy_creep_rate: f64,
    pub conservative_multiplier: f64,
    pub base_multiplier: f64,
    pub optimistic_multiplier: f64,
    pub conservative_weight: f64,
    pub base_weight: f64,
    pub optimistic_weight: f64,
    pub roic_cap: f64,
    pub irr_cap: f64,
    pub revenue_risk_discount: f64,
    pub rd_qualification_rate: f64,
    pub federal_rd_rate: f64,
    pub scale_tiers: Vec<f64>,
    pub scale_ongoing_uplift: f64,
}

impl Default for ModelConstants {
    fn default() -> Self {
        Self {
            dcf_years: 5,
            hours_per_year: 2080.0,
            weeks_per_year: 52.0,
            max_headcount_reduction: 0.75,
            no_sponsor_adoption_factor: 0.85,
            no_sponsor_timeline_factor: 1.25,
            team_members_per_engineer: 12.0,
            engineers_per_pm: 5.0,
            min_pms: 0.5,
            urgent_timeline_months: 3.0,
            urgent_timeline_multiplier: 1.5,
            short_timeline_months: 6.0,
            short_timeline_multiplier: 1.2,
            low_data_headcount_multiplier: 1.3,
            mid_data_headcount_multiplier: 1.1,
            pm_salary_ratio: 0.85,
            infrastructure_rate: 0.12,
            training_rate: 0.08,
            ongoing_headcount_ratio: 0.25,
            min_ongoing_headcount: 0.5,
            adjacent_product_rate: 0.25,
            model_retraining_rate: 0.07,
            retained_retraining_rate: 0.03,
            tech_debt_rate: 0.05,
            contingency_rate: 0.20,
            change_management_rate: 0.15,
            cultural_resistance_rate: 0.12,
            low_data_cleanup_rate: 0.25,
            mid_data_cleanup_rate: 0.10,
            integration_testing_rate: 0.10,
            productivity_dip_months: 3.0,
            productivity_dip_rate: 0.25,
            wage_inflation: 0.04,
            legacy_creep_rate: 0.07,
            conservative_multiplier: 0.7,
            base_multiplier: 1.0,
            optimistic_multiplier: 1.2,
            conservative_weight: 0.25,
            base_weight: 0.50,
            optimistic_weight: 0.25,
            roic_cap: 1.0,
            irr_cap: 0.75,
            revenue_risk_discount: 0.50,
            rd_qualification_rate: 0.65,
            federal_rd_rate: 0.065,
            scale_tiers: vec![2.0, 3.0],
            scale_ongoing_uplift: 0.10,
        }
    }
}

/// The complete, immutable benchmark set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkTables {
    pub version: String,
    /// industry -> process type -> automation potential fraction.
    pub automation_potential: KeyedTable<KeyedTable<f64>>,
    pub industries: KeyedTable<IndustryBenchmark>,
    pub company_sizes: KeyedTable<CompanySizeBenchmark>,
    pub readiness: Vec<ReadinessBenchmark>,
    pub ai_salaries: KeyedTable<f64>,
    pub process_types: KeyedTable<ProcessTypeBenchmark>,
    pub rd_credit_rates: KeyedTable<f64>,
    /// industry -> company size -> peer ROIC distribution.
    pub peer_roic: KeyedTable<KeyedTable<PeerDistribution>>,
    pub year_schedule: Vec<YearBenchmark>,
    pub constants: ModelConstants,
}

impl Default for BenchmarkTables {
    fn default() -> Self {
        Self::standard()
    }
}

impl BenchmarkTables {
    /// The shipped benchmark set.
    pub fn standard() -> Self {
        data::standard_tables()
    }

    pub fn automation_potential(&self, industry: &str, process_type: &str) -> Result<f64, LookupError> {
        self.automation_potential
            .get(BenchmarkTable::AutomationPotential, industry)?
            .get(BenchmarkTable::AutomationPotential, process_type)
            .copied()
    }

    pub fn industry(&self, industry: &str) -> Result<&IndustryBenchmark, LookupError> {
        self.industries.get(BenchmarkTable::Industry, industry)
    }

    pub fn company_size(&self, company_size: &str) -> Result<&CompanySizeBenchmark, LookupError> {
        self.company_sizes.get(BenchmarkTable::CompanySize, company_size)
    }

    pub fn readiness(&self, level: u8) -> Result<&ReadinessBenchmark, LookupError> {
        self.readiness.iter().find(|row| row.level == level).ok_or_else(|| {
            LookupError::UnknownKey { table: BenchmarkTable::Readiness, key: level.to_string() }
        })
    }

    pub fn ai_salary(&self, location: &str) -> Result<f64, LookupError> {
        self.ai_salaries.get(BenchmarkTable::Location, location).copied()
    }

    pub fn process_type(&self, process_type: &str) -> Result<&ProcessTypeBenchmark, LookupError> {
        self.process_types.get(BenchmarkTable::ProcessType, process_type)
    }

    pub fn rd_credit_rate(&self, state: &str) -> Result<f64, LookupError> {
        self.rd_credit_rates.get(BenchmarkTable::RdCredit, state).copied()
    }

    pub fn peer_roic(&self, industry: &str, company_size: &str) -> Result<PeerDistribution, LookupError> {
        self.peer_roic
            .get(BenchmarkTable::PeerRoic, industry)?
            .get(BenchmarkTable::PeerRoic, company_size)
            .copied()
    }

    /// Schedule row for a 1-based projection year.
    pub fn year(&self, year: u32) -> Result<&YearBenchmark, LookupError> {
        self.year_schedule.iter().find(|row| row.year == year).ok_or_else(|| {
            LookupError::UnknownKey { table: BenchmarkTable::YearSchedule, key: year.to_string() }
        })
    }

    /// Valid keys of a category table, in key order.
    pub fn keys(&self, table: BenchmarkTable) -> Vec<String> {
        match table {
            BenchmarkTable::AutomationPotential | BenchmarkTable::Industry => {
                owned_keys(&self.industries)
            }
            BenchmarkTable::CompanySize => owned_keys(&self.company_sizes),
            BenchmarkTable::Readiness => {
                self.readiness.iter().map(|row| row.level.to_string()).collect()
            }
            BenchmarkTable::Location => owned_keys(&self.ai_salaries),
            BenchmarkTable::ProcessType => owned_keys(&self.process_types),
            BenchmarkTable::RdCredit => owned_keys(&self.rd_credit_rates),
            BenchmarkTable::PeerRoic => owned_keys(&self.peer_roic),
            BenchmarkTable::YearSchedule => {
                self.year_schedule.iter().map(|row| row.year.to_string()).collect()
            }
        }
    }
}

fn owned_keys<T>(table: &KeyedTable<T>) -> Vec<String> {
    table.keys().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use crate::benchmarks::{
        BenchmarkTables, KeyedTable, COMPANY_SIZES, INDUSTRIES, LOCATIONS, OTHER_KEY,
        PROCESS_TYPES,
    };
    use crate::errors::{BenchmarkTable, LookupError};

    #[test]
    fn every_industry_and_process_pair_has_an_automation_potential_in_unit_range() {
        let tables = BenchmarkTables::standard();
        for industry in INDUSTRIES {
            for process_type in PROCESS_TYPES {
                let potential = tables
                    .automation_potential(industry, process_type)
                    .unwrap_or_else(|error| panic!("{industry}/{process_type}: {error}"));
                assert!((0.0..=1.0).contains(&potential), "{industry}/{process_type}");
            }
        }
    }

    #[test]
    fn unknown_industry_is_a_lookup_error_not_a_zero() {
        let tables = BenchmarkTables::standard();
        let error = tables.industry("Asteroid Mining").expect_err("unknown industry");

        assert_eq!(
            error,
            LookupError::UnknownKey {
                table: BenchmarkTable::Industry,
                key: "Asteroid Mining".to_owned(),
            }
        );
    }

    #[test]
    fn unknown_state_resolves_to_declared_other_row() {
        let tables = BenchmarkTables::standard();
        assert_eq!(tables.rd_credit_rate("Nevada").ok(), Some(0.0));
        assert_eq!(tables.rd_credit_rates.fallback(), Some(OTHER_KEY));
        assert!(tables.rd_credit_rate("California").unwrap_or_default() > 0.0);
    }

    #[test]
    fn keys_are_matched_after_trimming() {
        let tables = BenchmarkTables::standard();
        assert!(tables.company_size("  SMB (51-500) ").is_ok());
    }

    #[test]
    fn year_schedule_phases_separations_out_of_year_one() {
        let tables = BenchmarkTables::standard();
        let first = tables.year(1).expect("year 1");
        assert_eq!(first.hr_reduction_this_year, 0.0);
        assert_eq!(first.cumulative_hr_reduction, 0.0);

        let total: f64 = tables.year_schedule.iter().map(|row| row.hr_reduction_this_year).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(tables.year_schedule.len() as u32, tables.constants.dcf_years);

        let mut cumulative = 0.0;
        for row in &tables.year_schedule {
            cumulative += row.hr_reduction_this_year;
            assert!((row.cumulative_hr_reduction - cumulative).abs() < 1e-12, "year {}", row.year);
        }
    }

    #[test]
    fn readiness_levels_cover_one_through_five_and_reject_others() {
        let tables = BenchmarkTables::standard();
        for level in 1..=5 {
            assert!(tables.readiness(level).is_ok());
        }
        assert!(tables.readiness(0).is_err());
        assert!(tables.readiness(6).is_err());
    }

    #[test]
    fn peer_distributions_are_ordered_for_every_industry_and_size() {
        let tables = BenchmarkTables::standard();
        for industry in INDUSTRIES {
            for size in COMPANY_SIZES {
                let peer = tables.peer_roic(industry, size).expect("peer row");
                assert!(peer.p25 < peer.median && peer.median < peer.p75, "{industry}/{size}");
            }
        }
    }

    #[test]
    fn every_location_has_a_positive_salary() {
        let tables = BenchmarkTables::standard();
        for location in LOCATIONS {
            assert!(tables.ai_salary(location).unwrap_or_default() > 0.0, "{location}");
        }
    }

    #[test]
    fn keyed_table_without_fallback_rejects_unknown_keys() {
        let table = KeyedTable::new([("a", 1.0), ("b", 2.0)]);
        assert_eq!(table.get(BenchmarkTable::Location, "b").ok(), Some(&2.0));
        assert!(table.get(BenchmarkTable::Location, "c").is_err());

        let with_fallback = table.with_fallback("a");
        assert_eq!(with_fallback.get(BenchmarkTable::Location, "c").ok(), Some(&1.0));
    }

    #[test]
    fn keys_list_matches_declared_categories() {
        let tables = BenchmarkTables::standard();
        let industries = tables.keys(BenchmarkTable::Industry);
        assert_eq!(industries.len(), INDUSTRIES.len());
        assert!(industries.iter().any(|key| key == OTHER_KEY));
        assert_eq!(tables.keys(BenchmarkTable::Readiness), vec!["1", "2", "3", "4", "5"]);
    }
}
