use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::benchmarks::{BenchmarkTables, ModelConstants};

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub logging: LoggingConfig,
    pub solver: SolverConfig,
    pub model: ModelConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Bounds for the IRR root finder.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub irr_max_iterations: u32,
    pub irr_tolerance: f64,
    pub irr_lower_bound: f64,
    pub irr_upper_bound: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            irr_max_iterations: 200,
            irr_tolerance: 1e-9,
            irr_lower_bound: -0.99,
            irr_upper_bound: 10.0,
        }
    }
}

/// Macro assumptions that deployments commonly tune.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelConfig {
    pub wage_inflation: f64,
    pub legacy_creep_rate: f64,
    pub federal_rd_rate: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let constants = ModelConstants::default();
        Self {
            wage_inflation: constants.wage_inflation,
            legacy_creep_rate: constants.legacy_creep_rate,
            federal_rd_rate: constants.federal_rd_rate,
        }
    }
}

impl ModelConfig {
    pub fn apply_to(&self, constants: &mut ModelConstants) {
        constants.wage_inflation = self.wage_inflation;
        constants.legacy_creep_rate = self.legacy_creep_rate;
        constants.federal_rd_rate = self.federal_rd_rate;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub irr_max_iterations: Option<u32>,
    pub wage_inflation: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            solver: SolverConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl EngineConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("roicast.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// The shipped benchmark tables with the configured model assumptions.
    pub fn benchmark_tables(&self) -> BenchmarkTables {
        let mut tables = BenchmarkTables::standard();
        self.model.apply_to(&mut tables.constants);
        tables
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(solver) = patch.solver {
            if let Some(irr_max_iterations) = solver.irr_max_iterations {
                self.solver.irr_max_iterations = irr_max_iterations;
            }
            if let Some(irr_tolerance) = solver.irr_tolerance {
                self.solver.irr_tolerance = irr_tolerance;
            }
            if let Some(irr_lower_bound) = solver.irr_lower_bound {
                self.solver.irr_lower_bound = irr_lower_bound;
            }
            if let Some(irr_upper_bound) = solver.irr_upper_bound {
                self.solver.irr_upper_bound = irr_upper_bound;
            }
        }

        if let Some(model) = patch.model {
            if let Some(wage_inflation) = model.wage_inflation {
                self.model.wage_inflation = wage_inflation;
            }
            if let Some(legacy_creep_rate) = model.legacy_creep_rate {
                self.model.legacy_creep_rate = legacy_creep_rate;
            }
            if let Some(federal_rd_rate) = model.federal_rd_rate {
                self.model.federal_rd_rate = federal_rd_rate;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let log_level = read_env("ROICAST_LOGGING_LEVEL").or_else(|| read_env("ROICAST_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ROICAST_LOGGING_FORMAT").or_else(|| read_env("ROICAST_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        if let Some(value) = read_env("ROICAST_SOLVER_IRR_MAX_ITERATIONS") {
            self.solver.irr_max_iterations = parse_u32("ROICAST_SOLVER_IRR_MAX_ITERATIONS", &value)?;
        }
        if let Some(value) = read_env("ROICAST_SOLVER_IRR_TOLERANCE") {
            self.solver.irr_tolerance = parse_f64("ROICAST_SOLVER_IRR_TOLERANCE", &value)?;
        }
        if let Some(value) = read_env("ROICAST_SOLVER_IRR_LOWER_BOUND") {
            self.solver.irr_lower_bound = parse_f64("ROICAST_SOLVER_IRR_LOWER_BOUND", &value)?;
        }
        if let Some(value) = read_env("ROICAST_SOLVER_IRR_UPPER_BOUND") {
            self.solver.irr_upper_bound = parse_f64("ROICAST_SOLVER_IRR_UPPER_BOUND", &value)?;
        }

        if let Some(value) = read_env("ROICAST_MODEL_WAGE_INFLATION") {
            self.model.wage_inflation = parse_f64("ROICAST_MODEL_WAGE_INFLATION", &value)?;
        }
        if let Some(value) = read_env("ROICAST_MODEL_LEGACY_CREEP_RATE") {
            self.model.legacy_creep_rate = parse_f64("ROICAST_MODEL_LEGACY_CREEP_RATE", &value)?;
        }
        if let Some(value) = read_env("ROICAST_MODEL_FEDERAL_RD_RATE") {
            self.model.federal_rd_rate = parse_f64("ROICAST_MODEL_FEDERAL_RD_RATE", &value)?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(irr_max_iterations) = overrides.irr_max_iterations {
            self.solver.irr_max_iterations = irr_max_iterations;
        }
        if let Some(wage_inflation) = overrides.wage_inflation {
            self.model.wage_inflation = wage_inflation;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_logging(&self.logging)?;
        validate_solver(&self.solver)?;
        validate_model(&self.model)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("roicast.toml"), PathBuf::from("config/roicast.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_solver(solver: &SolverConfig) -> Result<(), ConfigError> {
    if solver.irr_max_iterations == 0 || solver.irr_max_iterations > 10_000 {
        return Err(ConfigError::Validation(
            "solver.irr_max_iterations must be in range 1..=10000".to_string(),
        ));
    }

    if !(solver.irr_tolerance.is_finite() && solver.irr_tolerance > 0.0) {
        return Err(ConfigError::Validation(
            "solver.irr_tolerance must be a positive number".to_string(),
        ));
    }

    if !(solver.irr_lower_bound.is_finite() && solver.irr_lower_bound > -1.0) {
        return Err(ConfigError::Validation(
            "solver.irr_lower_bound must be greater than -1".to_string(),
        ));
    }

    if !(solver.irr_upper_bound.is_finite() && solver.irr_upper_bound > solver.irr_lower_bound) {
        return Err(ConfigError::Validation(
            "solver.irr_upper_bound must be greater than solver.irr_lower_bound".to_string(),
        ));
    }

    Ok(())
}

fn validate_model(model: &ModelConfig) -> Result<(), ConfigError> {
    let rates = [
        ("model.wage_inflation", model.wage_inflation),
        ("model.legacy_creep_rate", model.legacy_creep_rate),
        ("model.federal_rd_rate", model.federal_rd_rate),
    ];
    for (key, rate) in rates {
        if !(0.0..1.0).contains(&rate) {
            return Err(ConfigError::Validation(format!("{key} must be a fraction in [0, 1)")));
        }
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    logging: Option<LoggingPatch>,
    solver: Option<SolverPatch>,
    model: Option<ModelPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct SolverPatch {
    irr_max_iterations: Option<u32>,
    irr_tolerance: Option<f64>,
    irr_lower_bound: Option<f64>,
    irr_upper_bound: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelPatch {
    wage_inflation: Option<f64>,
    legacy_creep_rate: Option<f64>,
    federal_rd_rate: Option<f64>,
}
