use super::{ArchetypeId, ArchetypeSchema, ComputedMapping, InputField, OverrideField};
use crate::formula::{clamp, max_of, num, refer, Expr};

fn input(key: &'static str) -> Expr {
    refer(key)
}

fn pct(key: &'static str) -> Expr {
    refer(key) / 100.0
}

fn at_least_one_hour(expression: Expr) -> Expr {
    max_of([num(1.0), expression])
}

fn non_negative(expression: Expr) -> Expr {
    max_of([num(0.0), expression])
}

fn mapping(target: OverrideField, expression: Expr) -> ComputedMapping {
    ComputedMapping { target, expression }
}

/// Monthly volume × minutes per item, spread over weeks and people.
fn weekly_hours_from_monthly(volume: &'static str, minutes: &'static str, people: &'static str) -> Expr {
    at_least_one_hour(input(volume) * input(minutes) / 60.0 * 12.0 / 52.0 / input(people))
}

pub(super) fn schema(id: ArchetypeId) -> ArchetypeSchema {
    use OverrideField::*;

    match id {
        ArchetypeId::DocumentProcessing => ArchetypeSchema {
            id,
            name: "Document Processing & Extraction",
            description: "Intake, classification and data extraction from invoices, forms and contracts.",
            process_type: "Document Processing",
            inputs: [
                InputField::new("documentsPerMonth", "Documents per month", "docs", 5_000.0, 0.0, 1_000_000.0),
                InputField::new("minutesPerDocument", "Minutes per document", "min", 12.0, 1.0, 240.0),
                InputField::new("pagesPerDocument", "Pages per document", "pages", 5.0, 1.0, 500.0),
                InputField::new("structuredPct", "Structured or templated share", "%", 40.0, 0.0, 100.0),
                InputField::new("exceptionRatePct", "Exception rate", "%", 8.0, 0.0, 100.0),
                InputField::new("reworkRatePct", "Rework rate", "%", 6.0, 0.0, 100.0),
                InputField::new("ocrSpendAnnual", "Current OCR / capture spend", "$/yr", 15_000.0, 0.0, 5_000_000.0),
                InputField::new("processors", "People processing documents", "FTE", 6.0, 1.0, 1_000.0),
            ],
            mappings: vec![
                mapping(
                    HoursPerWeek,
                    weekly_hours_from_monthly("documentsPerMonth", "minutesPerDocument", "processors"),
                ),
                mapping(
                    AutomationPotential,
                    clamp(
                        0.45 + pct("structuredPct") * 0.35 - pct("exceptionRatePct") * 0.5
                            - input("pagesPerDocument") / 1000.0,
                        0.1,
                        0.95,
                    ),
                ),
                mapping(ErrorRate, clamp(pct("reworkRatePct"), 0.0, 1.0)),
                mapping(ToolCost, non_negative(input("ocrSpendAnnual"))),
            ],
        },
        ArchetypeId::CustomerSupport => ArchetypeSchema {
            id,
            name: "Customer Support Automation",
            description: "Ticket triage, deflection and agent assist for inbound support.",
            process_type: "Customer Support",
            inputs: [
                InputField::new("ticketsPerMonth", "Tickets per month", "tickets", 8_000.0, 0.0, 2_000_000.0),
                InputField::new("avgHandleMinutes", "Average handle time", "min", 14.0, 1.0, 240.0),
                InputField::new("agents", "Support agents", "FTE", 20.0, 1.0, 5_000.0),
                InputField::new("tier1SharePct", "Tier-1 (repetitive) share", "%", 60.0, 0.0, 100.0),
                InputField::new("escalationRatePct", "Escalation rate", "%", 15.0, 0.0, 100.0),
                InputField::new("csatPct", "Customer satisfaction", "%", 82.0, 0.0, 100.0),
                InputField::new(
                    "churnRevenueAtRisk",
                    "Revenue at risk from churn",
                    "$/yr",
                    500_000.0,
                    0.0,
                    500_000_000.0,
                ),
                InputField::new("helpdeskSpendAnnual", "Help-desk tooling spend", "$/yr", 40_000.0, 0.0, 10_000_000.0),
            ],
            mappings: vec![
                mapping(HoursPerWeek, weekly_hours_from_monthly("ticketsPerMonth", "avgHandleMinutes", "agents")),
                mapping(
                    AutomationPotential,
                    clamp(0.1 + pct("tier1SharePct") * 0.8 - pct("escalationRatePct") * 0.3, 0.05, 0.9),
                ),
                mapping(
                    ErrorRate,
                    clamp(
                        pct("escalationRatePct") * 0.5 + (100.0 - input("csatPct")) / 100.0 * 0.3,
                        0.0,
                        1.0,
                    ),
                ),
                mapping(
                    RevenueImpact,
                    non_negative(input("churnRevenueAtRisk") * (100.0 - input("csatPct")) / 100.0 * 0.25),
                ),
                mapping(ToolCost, non_negative(input("helpdeskSpendAnnual"))),
            ],
        },
        ArchetypeId::FinancialClose => ArchetypeSchema {
            id,
            name: "Finance & Accounting Close",
            description: "Journal entry preparation, reconciliations and month-end close.",
            process_type: "Financial Reporting",
            inputs: [
                InputField::new(
                    "journalEntriesPerMonth",
                    "Journal entries per month",
                    "entries",
                    3_000.0,
                    0.0,
                    1_000_000.0,
                ),
                InputField::new("closeDays", "Days to close", "days", 8.0, 1.0, 30.0),
                InputField::new("accountants", "Accountants on the close", "FTE", 8.0, 1.0, 1_000.0),
                InputField::new("reconciliationsPerMonth", "Reconciliations per month", "recs", 400.0, 0.0, 100_000.0),
                InputField::new("manualReconPct", "Manual reconciliation share", "%", 70.0, 0.0, 100.0),
                InputField::new("adjustmentRatePct", "Post-close adjustment rate", "%", 5.0, 0.0, 100.0),
                InputField::new("auditFindingsPerYear", "Audit findings per year", "findings", 4.0, 0.0, 200.0),
                InputField::new("erpAddonSpend", "ERP add-on spend", "$/yr", 25_000.0, 0.0, 10_000_000.0),
            ],
            mappings: vec![
                mapping(
                    HoursPerWeek,
                    at_least_one_hour(
                        (input("journalEntriesPerMonth") * 0.1
                            + input("reconciliationsPerMonth") * pct("manualReconPct") * 1.5)
                            * 12.0
                            / 52.0
                            / input("accountants"),
                    ),
                ),
                mapping(
                    AutomationPotential,
                    clamp(0.3 + pct("manualReconPct") * 0.4 - input("closeDays") / 100.0, 0.1, 0.85),
                ),
                mapping(ErrorRate, clamp(pct("adjustmentRatePct"), 0.0, 1.0)),
                mapping(RiskReduction, non_negative(input("auditFindingsPerYear") * 15_000.0)),
                mapping(ToolCost, non_negative(input("erpAddonSpend"))),
            ],
        },
        ArchetypeId::SalesOperations => ArchetypeSchema {
            id,
            name: "Sales Operations & Proposals",
            description: "Lead research, qualification and proposal drafting for the sales team.",
            process_type: "Sales & Marketing",
            inputs: [
                InputField::new("reps", "Sales reps", "FTE", 25.0, 1.0, 5_000.0),
                InputField::new("leadsPerMonth", "Leads per month", "leads", 2_000.0, 0.0, 1_000_000.0),
                InputField::new("minutesResearchPerLead", "Research minutes per lead", "min", 10.0, 0.0, 240.0),
                InputField::new("proposalsPerMonth", "Proposals per month", "proposals", 60.0, 0.0, 10_000.0),
                InputField::new("hoursPerProposal", "Hours per proposal", "h", 4.0, 0.0, 80.0),
                InputField::new("winRatePct", "Win rate", "%", 22.0, 0.0, 100.0),
                InputField::new("avgDealSize", "Average deal size", "$", 40_000.0, 0.0, 50_000_000.0),
                InputField::new("crmAddonSpend", "CRM add-on spend", "$/yr", 30_000.0, 0.0, 10_000_000.0),
            ],
            mappings: vec![
                mapping(
                    HoursPerWeek,
                    at_least_one_hour(
                        (input("leadsPerMonth") * input("minutesResearchPerLead") / 60.0
                            + input("proposalsPerMonth") * input("hoursPerProposal"))
                            * 12.0
                            / 52.0
                            / input("reps"),
                    ),
                ),
                mapping(
                    AutomationPotential,
                    clamp(
                        0.3 + input("hoursPerProposal") / 80.0 + input("minutesResearchPerLead") / 480.0,
                        0.1,
                        0.8,
                    ),
                ),
                mapping(
                    RevenueImpact,
                    non_negative(
                        input("proposalsPerMonth") * 12.0 * pct("winRatePct") * input("avgDealSize") * 0.05,
                    ),
                ),
                mapping(ToolCost, non_negative(input("crmAddonSpend"))),
            ],
        },
        ArchetypeId::HrRecruiting => ArchetypeSchema {
            id,
            name: "HR & Recruiting",
            description: "Resume screening, interview scheduling and candidate communication.",
            process_type: "HR & Recruiting",
            inputs: [
                InputField::new("recruiters", "Recruiters", "FTE", 6.0, 1.0, 1_000.0),
                InputField::new("hiresPerYear", "Hires per year", "hires", 120.0, 0.0, 100_000.0),
                InputField::new("applicantsPerRole", "Applicants per role", "applicants", 150.0, 1.0, 5_000.0),
                InputField::new(
                    "screeningMinutesPerApplicant",
                    "Screening minutes per applicant",
                    "min",
                    4.0,
                    0.0,
                    60.0,
                ),
                InputField::new("interviewsPerHire", "Interviews per hire", "interviews", 6.0, 0.0, 50.0),
                InputField::new("timeToFillDays", "Time to fill", "days", 45.0, 1.0, 365.0),
                InputField::new("badHireRatePct", "Bad-hire rate", "%", 10.0, 0.0, 100.0),
                InputField::new("atsSpendAnnual", "Applicant tracking spend", "$/yr", 20_000.0, 0.0, 5_000_000.0),
            ],
            mappings: vec![
                mapping(
                    HoursPerWeek,
                    at_least_one_hour(
                        input("hiresPerYear")
                            * (input("applicantsPerRole") * input("screeningMinutesPerApplicant") / 60.0
                                + input("interviewsPerHire") * 1.5)
                            / 52.0
                            / input("recruiters"),
                    ),
                ),
                mapping(
                    AutomationPotential,
                    clamp(0.25 + input("applicantsPerRole") / 1000.0, 0.1, 0.75),
                ),
                mapping(ErrorRate, clamp(pct("badHireRatePct"), 0.0, 1.0)),
                mapping(
                    RevenueImpact,
                    non_negative(input("hiresPerYear") * input("timeToFillDays") * 0.2 * 400.0),
                ),
                mapping(ToolCost, non_negative(input("atsSpendAnnual"))),
            ],
        },
        ArchetypeId::SoftwareEngineering => ArchetypeSchema {
            id,
            name: "Software Engineering Assist",
            description: "Code generation, review and test authoring for product engineering teams.",
            process_type: "Software Development",
            inputs: [
                InputField::new("developers", "Developers", "FTE", 30.0, 1.0, 10_000.0),
                InputField::new("codingHoursPerWeek", "Coding hours per week", "h", 22.0, 0.0, 60.0),
                InputField::new("reviewHoursPerWeek", "Code review hours per week", "h", 5.0, 0.0, 40.0),
                InputField::new("testingHoursPerWeek", "Testing hours per week", "h", 6.0, 0.0, 40.0),
                InputField::new("bugEscapeRatePct", "Bug escape rate", "%", 8.0, 0.0, 100.0),
                InputField::new("deploymentsPerMonth", "Deployments per month", "deploys", 20.0, 0.0, 10_000.0),
                InputField::new("incidentCostAvg", "Average incident cost", "$", 8_000.0, 0.0, 10_000_000.0),
                InputField::new("devToolSpend", "Developer tooling spend", "$/yr", 60_000.0, 0.0, 50_000_000.0),
            ],
            mappings: vec![
                mapping(
                    HoursPerWeek,
                    at_least_one_hour(
                        input("codingHoursPerWeek") + input("reviewHoursPerWeek") + input("testingHoursPerWeek"),
                    ),
                ),
                mapping(
                    AutomationPotential,
                    clamp(
                        (input("codingHoursPerWeek") * 0.3
                            + input("reviewHoursPerWeek") * 0.4
                            + input("testingHoursPerWeek") * 0.5)
                            / max_of([
                                num(1.0),
                                input("codingHoursPerWeek")
                                    + input("reviewHoursPerWeek")
                                    + input("testingHoursPerWeek"),
                            ]),
                        0.05,
                        0.6,
                    ),
                ),
                mapping(ErrorRate, clamp(pct("bugEscapeRatePct"), 0.0, 1.0)),
                mapping(
                    RiskReduction,
                    non_negative(
                        input("deploymentsPerMonth") * 12.0 * pct("bugEscapeRatePct") * input("incidentCostAvg") * 0.3,
                    ),
                ),
                mapping(ToolCost, non_negative(input("devToolSpend"))),
            ],
        },
        ArchetypeId::ComplianceMonitoring => ArchetypeSchema {
            id,
            name: "Compliance Monitoring",
            description: "Alert review, transaction monitoring and regulatory filing preparation.",
            process_type: "Compliance & Risk",
            inputs: [
                InputField::new("analysts", "Compliance analysts", "FTE", 10.0, 1.0, 5_000.0),
                InputField::new("alertsPerMonth", "Alerts per month", "alerts", 6_000.0, 0.0, 5_000_000.0),
                InputField::new("falsePositivePct", "False-positive rate", "%", 85.0, 0.0, 100.0),
                InputField::new("minutesPerAlert", "Minutes per alert", "min", 9.0, 1.0, 240.0),
                InputField::new(
                    "regulatoryFilingsPerYear",
                    "Regulatory filings per year",
                    "filings",
                    24.0,
                    0.0,
                    10_000.0,
                ),
                InputField::new("hoursPerFiling", "Hours per filing", "h", 30.0, 0.0, 1_000.0),
                InputField::new(
                    "finesAtRiskAnnual",
                    "Fines and penalties at risk",
                    "$/yr",
                    250_000.0,
                    0.0,
                    1_000_000_000.0,
                ),
                InputField::new("regtechSpend", "RegTech tooling spend", "$/yr", 80_000.0, 0.0, 50_000_000.0),
            ],
            mappings: vec![
                mapping(
                    HoursPerWeek,
                    at_least_one_hour(
                        (input("alertsPerMonth") * input("minutesPerAlert") / 60.0 * 12.0
                            + input("regulatoryFilingsPerYear") * input("hoursPerFiling"))
                            / 52.0
                            / input("analysts"),
                    ),
                ),
                mapping(AutomationPotential, clamp(0.2 + pct("falsePositivePct") * 0.5, 0.1, 0.85)),
                mapping(RiskReduction, non_negative(input("finesAtRiskAnnual") * 0.3)),
                mapping(ToolCost, non_negative(input("regtechSpend"))),
            ],
        },
        ArchetypeId::SupplyChainPlanning => ArchetypeSchema {
            id,
            name: "Supply Chain Planning",
            description: "Demand forecasting, replenishment and inventory planning.",
            process_type: "Other",
            inputs: [
                InputField::new("planners", "Planners", "FTE", 8.0, 1.0, 2_000.0),
                InputField::new("skuCount", "Active SKUs", "SKUs", 5_000.0, 1.0, 10_000_000.0),
                InputField::new("forecastErrorPct", "Forecast error (MAPE)", "%", 30.0, 0.0, 100.0),
                InputField::new("stockoutRatePct", "Stock-out rate", "%", 5.0, 0.0, 100.0),
                InputField::new("inventoryValue", "Average inventory value", "$", 10_000_000.0, 0.0, 10_000_000_000.0),
                InputField::new("carryingCostPct", "Carrying cost", "%", 20.0, 0.0, 100.0),
                InputField::new("planningHoursPerWeek", "Planning hours per planner per week", "h", 30.0, 1.0, 80.0),
                InputField::new(
                    "planningSoftwareSpend",
                    "Planning software spend",
                    "$/yr",
                    50_000.0,
                    0.0,
                    50_000_000.0,
                ),
            ],
            mappings: vec![
                mapping(HoursPerWeek, at_least_one_hour(input("planningHoursPerWeek"))),
                mapping(
                    AutomationPotential,
                    clamp(0.2 + pct("forecastErrorPct") * 0.6 + input("skuCount") / 1_000_000.0, 0.1, 0.7),
                ),
                mapping(ErrorRate, clamp(pct("forecastErrorPct") * 0.5, 0.0, 1.0)),
                mapping(RevenueImpact, non_negative(input("inventoryValue") * pct("stockoutRatePct") * 0.4)),
                mapping(
                    RiskReduction,
                    non_negative(
                        input("inventoryValue") * pct("carryingCostPct") * pct("forecastErrorPct") * 0.25,
                    ),
                ),
                mapping(ToolCost, non_negative(input("planningSoftwareSpend"))),
            ],
        },
        ArchetypeId::MarketingContent => ArchetypeSchema {
            id,
            name: "Marketing Content Production",
            description: "Copy, creative variants and localisation for campaigns.",
            process_type: "Content Creation",
            inputs: [
                InputField::new("marketers", "Content marketers", "FTE", 12.0, 1.0, 2_000.0),
                InputField::new("assetsPerMonth", "Assets per month", "assets", 80.0, 0.0, 100_000.0),
                InputField::new("hoursPerAsset", "Hours per asset", "h", 6.0, 0.0, 200.0),
                InputField::new("localizationLanguages", "Localisation languages", "languages", 3.0, 0.0, 50.0),
                InputField::new("revisionRounds", "Revision rounds per asset", "rounds", 2.0, 0.0, 10.0),
                InputField::new("agencySpendAnnual", "Agency spend", "$/yr", 150_000.0, 0.0, 100_000_000.0),
                InputField::new(
                    "campaignRevenue",
                    "Campaign-attributed revenue",
                    "$/yr",
                    2_000_000.0,
                    0.0,
                    10_000_000_000.0,
                ),
                InputField::new("contentToolSpend", "Content tooling spend", "$/yr", 24_000.0, 0.0, 10_000_000.0),
            ],
            mappings: vec![
                mapping(
                    HoursPerWeek,
                    at_least_one_hour(
                        input("assetsPerMonth")
                            * input("hoursPerAsset")
                            * (1.0 + input("revisionRounds") * 0.25)
                            * (1.0 + input("localizationLanguages") * 0.1)
                            * 12.0
                            / 52.0
                            / input("marketers"),
                    ),
                ),
                mapping(
                    AutomationPotential,
                    clamp(
                        0.3 + input("localizationLanguages") * 0.03 + input("revisionRounds") * 0.03,
                        0.1,
                        0.75,
                    ),
                ),
                mapping(ErrorRate, clamp(input("revisionRounds") * 0.04, 0.0, 1.0)),
                mapping(
                    ToolCost,
                    non_negative(input("contentToolSpend") + input("agencySpendAnnual") * 0.5),
                ),
                mapping(RevenueImpact, non_negative(input("campaignRevenue") * 0.03)),
            ],
        },
        ArchetypeId::ItServiceDesk => ArchetypeSchema {
            id,
            name: "IT Service Desk",
            description: "Password resets, access requests and L1 incident resolution.",
            process_type: "IT Operations",
            inputs: [
                InputField::new("technicians", "Service desk technicians", "FTE", 10.0, 1.0, 5_000.0),
                InputField::new("ticketsPerMonth", "Tickets per month", "tickets", 3_000.0, 0.0, 2_000_000.0),
                InputField::new("passwordResetPct", "Password reset / access share", "%", 20.0, 0.0, 100.0),
                InputField::new("minutesPerTicket", "Minutes per ticket", "min", 25.0, 1.0, 480.0),
                InputField::new("reopenRatePct", "Reopen rate", "%", 7.0, 0.0, 100.0),
                InputField::new("endpoints", "Managed endpoints", "devices", 2_000.0, 0.0, 10_000_000.0),
                InputField::new("downtimeCostPerHour", "Downtime cost per hour", "$/h", 5_000.0, 0.0, 10_000_000.0),
                InputField::new("itsmSpend", "ITSM tooling spend", "$/yr", 45_000.0, 0.0, 50_000_000.0),
            ],
            mappings: vec![
                mapping(HoursPerWeek, weekly_hours_from_monthly("ticketsPerMonth", "minutesPerTicket", "technicians")),
                mapping(AutomationPotential, clamp(0.25 + pct("passwordResetPct") * 0.6, 0.1, 0.85)),
                mapping(ErrorRate, clamp(pct("reopenRatePct"), 0.0, 1.0)),
                mapping(
                    RiskReduction,
                    non_negative(input("endpoints") / 1000.0 * 20.0 * input("downtimeCostPerHour") * 0.25),
                ),
                mapping(ToolCost, non_negative(input("itsmSpend"))),
            ],
        },
        ArchetypeId::ClaimsProcessing => ArchetypeSchema {
            id,
            name: "Claims Processing",
            description: "First notice of loss intake, adjudication support and fraud screening.",
            process_type: "Document Processing",
            inputs: [
                InputField::new("adjusters", "Claims adjusters", "FTE", 15.0, 1.0, 10_000.0),
                InputField::new("claimsPerMonth", "Claims per month", "claims", 2_500.0, 0.0, 5_000_000.0),
                InputField::new("minutesPerClaim", "Minutes per claim", "min", 35.0, 1.0, 600.0),
                InputField::new("straightThroughPct", "Straight-through processing share", "%", 25.0, 0.0, 100.0),
                InputField::new("leakagePct", "Claims leakage", "%", 4.0, 0.0, 50.0),
                InputField::new("avgClaimValue", "Average claim value", "$", 6_000.0, 0.0, 10_000_000.0),
                InputField::new("fraudRatePct", "Suspected fraud rate", "%", 3.0, 0.0, 100.0),
                InputField::new("claimsSystemSpend", "Claims system spend", "$/yr", 70_000.0, 0.0, 50_000_000.0),
            ],
            mappings: vec![
                mapping(HoursPerWeek, weekly_hours_from_monthly("claimsPerMonth", "minutesPerClaim", "adjusters")),
                mapping(
                    AutomationPotential,
                    clamp(0.3 + (100.0 - input("straightThroughPct")) / 100.0 * 0.35, 0.1, 0.85),
                ),
                mapping(ErrorRate, clamp(pct("leakagePct") * 2.0, 0.0, 1.0)),
                mapping(
                    RiskReduction,
                    non_negative(
                        input("claimsPerMonth") * 12.0 * input("avgClaimValue") * pct("fraudRatePct") * 0.15,
                    ),
                ),
                mapping(ToolCost, non_negative(input("claimsSystemSpend"))),
            ],
        },
        ArchetypeId::KnowledgeManagement => ArchetypeSchema {
            id,
            name: "Knowledge Management",
            description: "Internal search, documentation upkeep and employee onboarding.",
            process_type: "Other",
            inputs: [
                InputField::new("employees", "Knowledge workers", "people", 200.0, 1.0, 500_000.0),
                InputField::new("searchHoursPerWeek", "Hours searching per person per week", "h", 4.0, 0.0, 40.0),
                InputField::new("documentsMaintained", "Documents maintained", "docs", 20_000.0, 0.0, 100_000_000.0),
                InputField::new("staleContentPct", "Stale content share", "%", 30.0, 0.0, 100.0),
                InputField::new("onboardingHires", "New hires per year", "hires", 40.0, 0.0, 100_000.0),
                InputField::new("onboardingWeeks", "Weeks to productivity", "weeks", 6.0, 0.0, 52.0),
                InputField::new("avgFullyLoadedRate", "Fully loaded hourly rate", "$/h", 60.0, 0.0, 1_000.0),
                InputField::new("wikiSpend", "Wiki / intranet spend", "$/yr", 30_000.0, 0.0, 50_000_000.0),
            ],
            mappings: vec![
                mapping(HoursPerWeek, at_least_one_hour(input("searchHoursPerWeek"))),
                mapping(
                    AutomationPotential,
                    clamp(
                        0.2 + pct("staleContentPct") * 0.4 + input("documentsMaintained") / 10_000_000.0,
                        0.1,
                        0.7,
                    ),
                ),
                mapping(ErrorRate, clamp(pct("staleContentPct") * 0.2, 0.0, 1.0)),
                mapping(
                    RevenueImpact,
                    non_negative(
                        input("onboardingHires") * input("onboardingWeeks") * 40.0 * input("avgFullyLoadedRate") * 0.3,
                    ),
                ),
                mapping(ToolCost, non_negative(input("wikiSpend"))),
            ],
        },
    }
}
