pub mod archetypes;
pub mod benchmarks;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod errors;
pub mod formula;
pub mod logging;
pub mod mirror;

pub use archetypes::{
    archetype, archetypes, get_archetype_input_defaults, map_archetype_to_overrides, mapping_formulas,
    validate_archetype_inputs, ArchetypeAnswers, ArchetypeId, ArchetypeOverrides, ArchetypeSchema, OverrideField,
};
pub use benchmarks::{BenchmarkTables, ModelConstants, PeerDistribution};
pub use classifier::{classify_archetype, ArchetypeMatch, ProfileAnswers};
pub use config::{ConfigError, EngineConfig, LoadOptions, SolverConfig};
pub use engine::{calculate_roi, CalculationResult, InputProfile, RoiEngine, ScenarioResult, Scenarios};
pub use errors::{BenchmarkTable, EngineError, LookupError, ValidationError};
pub use formula::{Expr, FormulaError};
pub use mirror::{build_workbook, Tab, Workbook};
