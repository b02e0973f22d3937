use super::{
    BenchmarkTables, CompanySizeBenchmark, IndustryBenchmark, KeyedTable, ModelConstants,
    PeerDistribution, ProcessTypeBenchmark, ReadinessBenchmark, YearBenchmark, OTHER_KEY,
};

pub const STANDARD_VERSION: &str = "2026.2";

pub const INDUSTRIES: &[&str] = &[
    "Technology / Software",
    "Financial Services",
    "Healthcare",
    "Insurance",
    "Manufacturing",
    "Retail / E-commerce",
    "Professional Services",
    "Logistics / Transportation",
    "Energy / Utilities",
    "Government / Public Sector",
    "Education",
    "Real Estate",
    OTHER_KEY,
];

pub const PROCESS_TYPES: &[&str] = &[
    "Document Processing",
    "Customer Support",
    "Data Entry",
    "Financial Reporting",
    "Content Creation",
    "Software Development",
    "Sales & Marketing",
    "HR & Recruiting",
    "Compliance & Risk",
    "IT Operations",
    OTHER_KEY,
];

pub const COMPANY_SIZES: &[&str] =
    &["Startup (1-50)", "SMB (51-500)", "Mid-Market (501-5000)", "Enterprise (5000+)"];

pub const LOCATIONS: &[&str] = &[
    "US - Major Metro",
    "US - Other",
    "Canada",
    "United Kingdom",
    "Western Europe",
    "Eastern Europe",
    "India",
    "Latin America",
    "Asia Pacific",
    OTHER_KEY,
];

pub const US_STATES: &[&str] = &[
    "Arizona",
    "California",
    "Connecticut",
    "Florida",
    "Georgia",
    "Illinois",
    "Massachusetts",
    "Minnesota",
    "New Jersey",
    "New York",
    "North Carolina",
    "Pennsylvania",
    "Texas",
    "Washington",
    OTHER_KEY,
];

// Columns follow PROCESS_TYPES order.
const AUTOMATION_POTENTIAL: &[(&str, [f64; 11])] = &[
    ("Technology / Software", [0.70, 0.60, 0.80, 0.55, 0.50, 0.45, 0.50, 0.45, 0.50, 0.60, 0.45]),
    ("Financial Services", [0.68, 0.58, 0.78, 0.60, 0.45, 0.43, 0.48, 0.43, 0.52, 0.53, 0.43]),
    ("Healthcare", [0.62, 0.48, 0.68, 0.43, 0.35, 0.33, 0.38, 0.33, 0.40, 0.43, 0.33]),
    ("Insurance", [0.72, 0.57, 0.77, 0.52, 0.42, 0.42, 0.47, 0.42, 0.50, 0.52, 0.42]),
    ("Manufacturing", [0.62, 0.50, 0.72, 0.47, 0.40, 0.37, 0.42, 0.37, 0.42, 0.47, 0.37]),
    ("Retail / E-commerce", [0.65, 0.60, 0.75, 0.50, 0.50, 0.40, 0.50, 0.40, 0.45, 0.50, 0.40]),
    ("Professional Services", [0.67, 0.55, 0.77, 0.52, 0.50, 0.42, 0.47, 0.42, 0.47, 0.52, 0.42]),
    ("Logistics / Transportation", [0.65, 0.52, 0.74, 0.47, 0.38, 0.37, 0.42, 0.37, 0.42, 0.47, 0.37]),
    ("Energy / Utilities", [0.60, 0.50, 0.70, 0.45, 0.35, 0.35, 0.40, 0.35, 0.42, 0.45, 0.35]),
    ("Government / Public Sector", [0.55, 0.45, 0.65, 0.40, 0.32, 0.30, 0.30, 0.30, 0.35, 0.40, 0.30]),
    ("Education", [0.60, 0.50, 0.70, 0.45, 0.45, 0.35, 0.40, 0.35, 0.38, 0.45, 0.35]),
    ("Real Estate", [0.63, 0.53, 0.73, 0.48, 0.45, 0.38, 0.45, 0.38, 0.43, 0.48, 0.38]),
    (OTHER_KEY, [0.62, 0.52, 0.72, 0.47, 0.42, 0.37, 0.42, 0.37, 0.42, 0.47, 0.37]),
];

// success, competitive penalty, compliance risk, uplift (conservative, base, optimistic)
const INDUSTRY_PROFILES: &[(&str, f64, f64, f64, [f64; 3])] = &[
    ("Technology / Software", 0.72, 0.06, 0.02, [0.020, 0.040, 0.060]),
    ("Financial Services", 0.65, 0.05, 0.05, [0.015, 0.030, 0.050]),
    ("Healthcare", 0.55, 0.03, 0.06, [0.010, 0.020, 0.035]),
    ("Insurance", 0.60, 0.04, 0.05, [0.010, 0.025, 0.040]),
    ("Manufacturing", 0.58, 0.04, 0.03, [0.010, 0.025, 0.040]),
    ("Retail / E-commerce", 0.62, 0.06, 0.02, [0.020, 0.035, 0.055]),
    ("Professional Services", 0.66, 0.05, 0.02, [0.015, 0.030, 0.050]),
    ("Logistics / Transportation", 0.57, 0.04, 0.03, [0.010, 0.020, 0.035]),
    ("Energy / Utilities", 0.54, 0.03, 0.04, [0.008, 0.015, 0.030]),
    ("Government / Public Sector", 0.45, 0.01, 0.04, [0.000, 0.005, 0.010]),
    ("Education", 0.50, 0.02, 0.02, [0.005, 0.010, 0.020]),
    ("Real Estate", 0.56, 0.03, 0.02, [0.010, 0.020, 0.030]),
    (OTHER_KEY, 0.55, 0.04, 0.03, [0.010, 0.020, 0.035]),
];

const COMPANY_SIZE_PROFILES: &[(&str, CompanySizeBenchmark)] = &[
    (
        "Startup (1-50)",
        CompanySizeBenchmark {
            size_multiplier: 0.85,
            discount_rate: 0.15,
            max_team_size: 3.0,
            separation_multiplier: 0.15,
            annual_license: 12_000.0,
            legal_cost: 10_000.0,
            security_cost: 8_000.0,
            compliance_cost: 5_000.0,
            cyber_insurance_cost: 3_000.0,
            vendor_switching_rate: 0.10,
        },
    ),
    (
        "SMB (51-500)",
        CompanySizeBenchmark {
            size_multiplier: 1.0,
            discount_rate: 0.12,
            max_team_size: 6.0,
            separation_multiplier: 0.25,
            annual_license: 36_000.0,
            legal_cost: 25_000.0,
            security_cost: 20_000.0,
            compliance_cost: 15_000.0,
            cyber_insurance_cost: 8_000.0,
            vendor_switching_rate: 0.15,
        },
    ),
    (
        "Mid-Market (501-5000)",
        CompanySizeBenchmark {
            size_multiplier: 1.15,
            discount_rate: 0.10,
            max_team_size: 12.0,
            separation_multiplier: 0.35,
            annual_license: 96_000.0,
            legal_cost: 60_000.0,
            security_cost: 50_000.0,
            compliance_cost: 40_000.0,
            cyber_insurance_cost: 20_000.0,
            vendor_switching_rate: 0.20,
        },
    ),
    (
        "Enterprise (5000+)",
        CompanySizeBenchmark {
            size_multiplier: 1.35,
            discount_rate: 0.09,
            max_team_size: 25.0,
            separation_multiplier: 0.50,
            annual_license: 250_000.0,
            legal_cost: 150_000.0,
            security_cost: 120_000.0,
            compliance_cost: 100_000.0,
            cyber_insurance_cost: 50_000.0,
            vendor_switching_rate: 0.25,
        },
    ),
];

const READINESS_LEVELS: [ReadinessBenchmark; 5] = [
    ReadinessBenchmark {
        level: 1,
        adoption_rate: 0.40,
        timeline_multiplier: 1.60,
        cost_multiplier: 1.50,
    },
    ReadinessBenchmark {
        level: 2,
        adoption_rate: 0.55,
        timeline_multiplier: 1.35,
        cost_multiplier: 1.30,
    },
    ReadinessBenchmark {
        level: 3,
        adoption_rate: 0.70,
        timeline_multiplier: 1.15,
        cost_multiplier: 1.15,
    },
    ReadinessBenchmark {
        level: 4,
        adoption_rate: 0.82,
        timeline_multiplier: 1.00,
        cost_multiplier: 1.00,
    },
    ReadinessBenchmark {
        level: 5,
        adoption_rate: 0.92,
        timeline_multiplier: 0.90,
        cost_multiplier: 0.95,
    },
];

const AI_SALARIES: &[(&str, f64)] = &[
    ("US - Major Metro", 210_000.0),
    ("US - Other", 175_000.0),
    ("Canada", 150_000.0),
    ("United Kingdom", 140_000.0),
    ("Western Europe", 135_000.0),
    ("Eastern Europe", 85_000.0),
    ("India", 55_000.0),
    ("Latin America", 70_000.0),
    ("Asia Pacific", 120_000.0),
    (OTHER_KEY, 120_000.0),
];

// api cost per 1k requests, requests per automated hour, tool replacement rate
const PROCESS_PROFILES: &[(&str, f64, f64, f64)] = &[
    ("Document Processing", 2.50, 40.0, 0.40),
    ("Customer Support", 1.80, 30.0, 0.35),
    ("Data Entry", 1.20, 60.0, 0.50),
    ("Financial Reporting", 3.00, 20.0, 0.30),
    ("Content Creation", 4.00, 15.0, 0.25),
    ("Software Development", 6.00, 25.0, 0.20),
    ("Sales & Marketing", 3.50, 20.0, 0.30),
    ("HR & Recruiting", 2.00, 15.0, 0.35),
    ("Compliance & Risk", 3.00, 20.0, 0.25),
    ("IT Operations", 2.50, 35.0, 0.30),
    (OTHER_KEY, 2.50, 25.0, 0.25),
];

// Effective state R&D credit rates on qualified spend, informational only.
const RD_CREDIT_RATES: &[(&str, f64)] = &[
    ("Arizona", 0.24),
    ("California", 0.15),
    ("Connecticut", 0.06),
    ("Florida", 0.10),
    ("Georgia", 0.10),
    ("Illinois", 0.065),
    ("Massachusetts", 0.10),
    ("Minnesota", 0.10),
    ("New Jersey", 0.10),
    ("New York", 0.09),
    ("North Carolina", 0.0325),
    ("Pennsylvania", 0.10),
    ("Texas", 0.05),
    ("Washington", 0.0),
    (OTHER_KEY, 0.0),
];

// p25, median, p75 ROIC for a mid-sized peer group.
const PEER_ROIC: &[(&str, f64, f64, f64)] = &[
    ("Technology / Software", 0.10, 0.35, 0.65),
    ("Financial Services", 0.08, 0.30, 0.58),
    ("Healthcare", 0.02, 0.20, 0.45),
    ("Insurance", 0.05, 0.25, 0.50),
    ("Manufacturing", 0.04, 0.22, 0.48),
    ("Retail / E-commerce", 0.06, 0.28, 0.55),
    ("Professional Services", 0.08, 0.30, 0.60),
    ("Logistics / Transportation", 0.03, 0.20, 0.45),
    ("Energy / Utilities", 0.02, 0.18, 0.40),
    ("Government / Public Sector", -0.05, 0.10, 0.30),
    ("Education", -0.02, 0.12, 0.32),
    ("Real Estate", 0.03, 0.18, 0.40),
    (OTHER_KEY, 0.03, 0.20, 0.45),
];

// Shift applied to every quartile of the industry peer row.
const PEER_SIZE_SHIFT: &[(&str, f64)] = &[
    ("Startup (1-50)", -0.05),
    ("SMB (51-500)", 0.0),
    ("Mid-Market (501-5000)", 0.03),
    ("Enterprise (5000+)", 0.05),
];

const YEAR_SCHEDULE: [YearBenchmark; 5] = [
    YearBenchmark {
        year: 1,
        hr_reduction_this_year: 0.0,
        cumulative_hr_reduction: 0.0,
        adoption_ramp: 0.40,
        cost_escalation_this_year: 0.0,
        cumulative_escalation: 1.0,
    },
    YearBenchmark {
        year: 2,
        hr_reduction_this_year: 0.40,
        cumulative_hr_reduction: 0.40,
        adoption_ramp: 0.75,
        cost_escalation_this_year: 0.05,
        cumulative_escalation: 1.05,
    },
    YearBenchmark {
        year: 3,
        hr_reduction_this_year: 0.35,
        cumulative_hr_reduction: 0.75,
        adoption_ramp: 0.90,
        cost_escalation_this_year: 0.05,
        cumulative_escalation: 1.1025,
    },
    YearBenchmark {
        year: 4,
        hr_reduction_this_year: 0.25,
        cumulative_hr_reduction: 1.0,
        adoption_ramp: 1.0,
        cost_escalation_this_year: 0.04,
        cumulative_escalation: 1.1466,
    },
    YearBenchmark {
        year: 5,
        hr_reduction_this_year: 0.0,
        cumulative_hr_reduction: 1.0,
        adoption_ramp: 1.0,
        cost_escalation_this_year: 0.04,
        cumulative_escalation: 1.192464,
    },
];

pub(super) fn standard_tables() -> BenchmarkTables {
    let automation_potential = KeyedTable::new(AUTOMATION_POTENTIAL.iter().map(|(industry, row)| {
        (*industry, KeyedTable::new(PROCESS_TYPES.iter().copied().zip(row.iter().copied())))
    }));

    let industries = KeyedTable::new(INDUSTRY_PROFILES.iter().map(
        |(industry, success_rate, competitive_penalty_rate, compliance_risk_rate, uplift)| {
            (
                *industry,
                IndustryBenchmark {
                    success_rate: *success_rate,
                    competitive_penalty_rate: *competitive_penalty_rate,
                    compliance_risk_rate: *compliance_risk_rate,
                    revenue_uplift: *uplift,
                },
            )
        },
    ));

    let process_types = KeyedTable::new(PROCESS_PROFILES.iter().map(
        |(process_type, api_cost_per_1k, requests_per_hour, tool_replacement_rate)| {
            (
                *process_type,
                ProcessTypeBenchmark {
                    api_cost_per_1k: *api_cost_per_1k,
                    requests_per_hour: *requests_per_hour,
                    tool_replacement_rate: *tool_replacement_rate,
                },
            )
        },
    ));

    let peer_roic = KeyedTable::new(PEER_ROIC.iter().map(|(industry, p25, median, p75)| {
        let by_size = KeyedTable::new(PEER_SIZE_SHIFT.iter().map(|(size, shift)| {
            (
                *size,
                PeerDistribution { p25: p25 + shift, median: median + shift, p75: p75 + shift },
            )
        }));
        (*industry, by_size)
    }));

    BenchmarkTables {
        version: STANDARD_VERSION.to_owned(),
        automation_potential,
        industries,
        company_sizes: KeyedTable::new(COMPANY_SIZE_PROFILES.iter().cloned()),
        readiness: READINESS_LEVELS.to_vec(),
        ai_salaries: KeyedTable::new(AI_SALARIES.iter().copied()),
        process_types,
        rd_credit_rates: KeyedTable::new(RD_CREDIT_RATES.iter().copied()).with_fallback(OTHER_KEY),
        peer_roic,
        year_schedule: YEAR_SCHEDULE.to_vec(),
        constants: ModelConstants::default(),
    }
}
