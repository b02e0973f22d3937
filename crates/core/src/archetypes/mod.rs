//! Archetype Schema Registry
//!
//! Twelve operational questionnaires, each with eight bounded inputs and an
//! ordered list of computed mappings that translate the answers into overrides
//! for the generic engine inputs.

mod catalog;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::ValidationError;
use crate::formula::Expr;

/// Raw questionnaire answers keyed by input key.
pub type ArchetypeAnswers = Map<String, Value>;

/// Engine overrides produced by an archetype's computed mappings.
pub type ArchetypeOverrides = BTreeMap<OverrideField, f64>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchetypeId {
    DocumentProcessing,
    CustomerSupport,
    FinancialClose,
    SalesOperations,
    HrRecruiting,
    SoftwareEngineering,
    ComplianceMonitoring,
    SupplyChainPlanning,
    MarketingContent,
    ItServiceDesk,
    ClaimsProcessing,
    KnowledgeManagement,
}

impl ArchetypeId {
    pub const ALL: [ArchetypeId; 12] = [
        Self::DocumentProcessing,
        Self::CustomerSupport,
        Self::FinancialClose,
        Self::SalesOperations,
        Self::HrRecruiting,
        Self::SoftwareEngineering,
        Self::ComplianceMonitoring,
        Self::SupplyChainPlanning,
        Self::MarketingContent,
        Self::ItServiceDesk,
        Self::ClaimsProcessing,
        Self::KnowledgeManagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentProcessing => "document-processing",
            Self::CustomerSupport => "customer-support",
            Self::FinancialClose => "financial-close",
            Self::SalesOperations => "sales-operations",
            Self::HrRecruiting => "hr-recruiting",
            Self::SoftwareEngineering => "software-engineering",
            Self::ComplianceMonitoring => "compliance-monitoring",
            Self::SupplyChainPlanning => "supply-chain-planning",
            Self::MarketingContent => "marketing-content",
            Self::ItServiceDesk => "it-service-desk",
            Self::ClaimsProcessing => "claims-processing",
            Self::KnowledgeManagement => "knowledge-management",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|id| id.as_str() == normalized)
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generic engine inputs an archetype mapping may replace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverrideField {
    AutomationPotential,
    ErrorRate,
    HoursPerWeek,
    ToolCost,
    RevenueImpact,
    RiskReduction,
}

impl OverrideField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutomationPotential => "automationPotential",
            Self::ErrorRate => "errorRate",
            Self::HoursPerWeek => "hoursPerWeek",
            Self::ToolCost => "toolCost",
            Self::RevenueImpact => "revenueImpact",
            Self::RiskReduction => "riskReduction",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

impl InputField {
    fn new(
        key: &'static str,
        label: &'static str,
        unit: &'static str,
        default: f64,
        min: f64,
        max: f64,
    ) -> Self {
        Self { key, label, unit, default, min, max }
    }
}

/// One override derived from the archetype inputs. The expression is both the
/// evaluated function and the published closed form.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputedMapping {
    pub target: OverrideField,
    pub expression: Expr,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingFormula {
    pub target: OverrideField,
    pub formula: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArchetypeSchema {
    pub id: ArchetypeId,
    pub name: &'static str,
    pub description: &'static str,
    /// Generic process type the archetype maps onto for benchmark lookups.
    pub process_type: &'static str,
    pub inputs: [InputField; 8],
    pub mappings: Vec<ComputedMapping>,
}

impl ArchetypeSchema {
    pub fn input(&self, key: &str) -> Option<&InputField> {
        self.inputs.iter().find(|field| field.key == key)
    }

    pub fn defaults(&self) -> BTreeMap<String, f64> {
        self.inputs.iter().map(|field| (field.key.to_owned(), field.default)).collect()
    }

    /// Checks every provided field; missing fields are allowed.
    pub fn validate(&self, values: &ArchetypeAnswers) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (key, value) in values {
            let Some(field) = self.input(key) else {
                errors.push(ValidationError::new(
                    key.as_str(),
                    format!("is not an input of archetype `{}`", self.id),
                ));
                continue;
            };

            match numeric_value(value) {
                None => errors.push(ValidationError::new(key.as_str(), "must be a number")),
                Some(number) if !number.is_finite() => {
                    errors.push(ValidationError::new(key.as_str(), "must be a finite number"))
                }
                Some(number) if number < field.min => errors.push(ValidationError::new(
                    key.as_str(),
                    format!("must be at least {}", field.min),
                )),
                Some(number) if number > field.max => errors.push(ValidationError::new(
                    key.as_str(),
                    format!("must be at most {}", field.max),
                )),
                Some(_) => {}
            }
        }
        errors
    }

    /// Resolves the full input vector: provided numeric answers over defaults.
    /// Non-number answers fall back to the default like missing ones.
    pub fn resolve_inputs(&self, values: &ArchetypeAnswers) -> BTreeMap<String, f64> {
        let mut resolved = self.defaults();
        for field in &self.inputs {
            if let Some(number) = values.get(field.key).and_then(numeric_value) {
                resolved.insert(field.key.to_owned(), number);
            }
        }
        resolved
    }

    /// Runs every mapping; a failing or non-finite mapping is dropped alone.
    pub fn map_to_overrides(&self, values: &ArchetypeAnswers) -> ArchetypeOverrides {
        let inputs = self.resolve_inputs(values);
        let resolve = |name: &str| inputs.get(name).copied();

        let mut overrides = ArchetypeOverrides::new();
        for mapping in &self.mappings {
            match mapping.expression.eval(&resolve) {
                Ok(value) if value.is_finite() => {
                    overrides.insert(mapping.target, value);
                }
                Ok(value) => warn!(
                    event_name = "archetype.mapping.dropped",
                    archetype_id = %self.id,
                    target = mapping.target.as_str(),
                    value,
                    "computed mapping produced a non-finite value"
                ),
                Err(error) => warn!(
                    event_name = "archetype.mapping.dropped",
                    archetype_id = %self.id,
                    target = mapping.target.as_str(),
                    error = %error,
                    "computed mapping failed to evaluate"
                ),
            }
        }
        overrides
    }

    pub fn formulas(&self) -> Vec<MappingFormula> {
        self.mappings
            .iter()
            .map(|mapping| MappingFormula {
                target: mapping.target,
                formula: mapping.expression.to_string(),
            })
            .collect()
    }
}

/// Only JSON numbers count; a string holding digits is still a type error.
fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

static REGISTRY: OnceLock<Vec<ArchetypeSchema>> = OnceLock::new();

/// All archetypes in declaration order.
pub fn archetypes() -> &'static [ArchetypeSchema] {
    REGISTRY.get_or_init(|| ArchetypeId::ALL.into_iter().map(catalog::schema).collect())
}

pub fn archetype(id: &str) -> Option<&'static ArchetypeSchema> {
    let id = ArchetypeId::parse(id)?;
    archetypes().iter().find(|schema| schema.id == id)
}

/// Default answers for an archetype; empty when the id is unknown.
pub fn get_archetype_input_defaults(id: &str) -> BTreeMap<String, f64> {
    archetype(id).map(ArchetypeSchema::defaults).unwrap_or_default()
}

pub fn validate_archetype_inputs(id: &str, values: &ArchetypeAnswers) -> Vec<ValidationError> {
    match archetype(id) {
        Some(schema) => schema.validate(values),
        None => vec![ValidationError::new("archetypeId", format!("unknown archetype `{id}`"))],
    }
}

pub fn map_archetype_to_overrides(id: &str, values: &ArchetypeAnswers) -> ArchetypeOverrides {
    archetype(id).map(|schema| schema.map_to_overrides(values)).unwrap_or_default()
}

pub fn mapping_formulas(id: &str) -> Vec<MappingFormula> {
    archetype(id).map(ArchetypeSchema::formulas).unwrap_or_default()
}
