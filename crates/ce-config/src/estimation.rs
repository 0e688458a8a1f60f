//! Estimation configuration types.
//!
//! Defaults are the standard sampling budgets and enumeration limits,
//! so an empty configuration file behaves exactly like `EstimationConfig::default()`.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::{ValidationError, ValidationResult};
use crate::CONFIG_SCHEMA_VERSION;

/// Complete estimation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EstimationConfig {
    pub schema_version: String,

    /// Graph and sample counts requested from the model.
    pub sampling: SamplingPolicy,

    /// Functional CATE estimator settings.
    pub rff: RffConfig,

    /// CPDAG enumeration and cycle repair limits.
    pub enumeration: EnumerationConfig,

    /// Largest `|tr(exp(A)) - n|` accepted as acyclic.
    pub dag_tolerance: f64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            sampling: SamplingPolicy::default(),
            rff: RffConfig::default(),
            enumeration: EnumerationConfig::default(),
            dag_tolerance: 1e-9,
        }
    }
}

/// Number of graphs and samples per graph for one model query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SampleBudget {
    pub graphs: usize,
    pub samples_per_graph: usize,
}

impl SampleBudget {
    pub const fn new(graphs: usize, samples_per_graph: usize) -> Self {
        Self {
            graphs,
            samples_per_graph,
        }
    }
}

/// Sampling budgets keyed by graph mode and presence of conditioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SamplingPolicy {
    /// Most likely graph, conditional query.
    pub most_likely_conditional: SampleBudget,
    /// Most likely graph, unconditional query.
    pub most_likely_unconditional: SampleBudget,
    /// Posterior graph samples, conditional query.
    pub posterior_conditional: SampleBudget,
    /// Posterior graph samples, unconditional query.
    pub posterior_unconditional: SampleBudget,
    /// Graphs sampled for counterfactual (ITE) queries.
    pub ite_graphs: usize,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            most_likely_conditional: SampleBudget::new(1, 50_000),
            most_likely_unconditional: SampleBudget::new(1, 20_000),
            posterior_conditional: SampleBudget::new(10, 5_000),
            posterior_unconditional: SampleBudget::new(10_000, 2),
            ite_graphs: 100,
        }
    }
}

impl SamplingPolicy {
    /// Budget for a query given the graph mode and whether it conditions.
    pub fn budget(&self, most_likely_graph: bool, conditioned: bool) -> SampleBudget {
        match (most_likely_graph, conditioned) {
            (true, true) => self.most_likely_conditional,
            (true, false) => self.most_likely_unconditional,
            (false, true) => self.posterior_conditional,
            (false, false) => self.posterior_unconditional,
        }
    }

    fn cells(&self) -> [(&'static str, SampleBudget); 4] {
        [
            ("sampling.most_likely_conditional", self.most_likely_conditional),
            ("sampling.most_likely_unconditional", self.most_likely_unconditional),
            ("sampling.posterior_conditional", self.posterior_conditional),
            ("sampling.posterior_unconditional", self.posterior_unconditional),
        ]
    }
}

/// Kernel lengthscale for random Fourier features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LengthscaleConfig {
    Fixed(f64),
    Uniform { low: f64, high: f64 },
}

impl Default for LengthscaleConfig {
    fn default() -> Self {
        LengthscaleConfig::Uniform {
            low: 0.1,
            high: 1.0,
        }
    }
}

/// Random-Fourier-feature regression settings for the CATE estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RffConfig {
    pub n_features: usize,
    pub lengthscale: LengthscaleConfig,
    /// Prior precision of the linear weights (ridge strength).
    pub prior_precision: f64,
}

impl Default for RffConfig {
    fn default() -> Self {
        Self {
            n_features: 3000,
            lengthscale: LengthscaleConfig::default(),
            prior_precision: 1.0,
        }
    }
}

/// CPDAG enumeration and acyclic-subgraph settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EnumerationConfig {
    /// Random orders tried by a direct acyclic-subgraph approximation.
    pub approximation_samples: usize,
    /// Random orders tried when repairing a cyclic CPDAG before enumeration.
    pub repair_samples: usize,
    /// Largest undetermined-edge count enumerated by shuffling every assignment.
    pub max_exhaustive_edges: usize,
    /// Assignment draws allowed above `max_exhaustive_edges`.
    pub max_attempts: usize,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            approximation_samples: 10,
            repair_samples: 1000,
            max_exhaustive_edges: 20,
            max_attempts: 100_000,
        }
    }
}

impl EstimationConfig {
    /// Load configuration from a `.json` or `.toml` file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&content),
            Some("toml") => Self::parse_toml(&content),
            other => Err(ValidationError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Parse configuration from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, ValidationError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))?;
        config.check_version()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(text: &str) -> Result<Self, ValidationError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))?;
        config.check_version()?;
        Ok(config)
    }

    fn check_version(&self) -> Result<(), ValidationError> {
        let major = |v: &str| v.split('.').next().map(str::to_string);
        if major(&self.schema_version) != major(CONFIG_SCHEMA_VERSION) {
            return Err(ValidationError::SchemaVersion {
                found: self.schema_version.clone(),
                supported: CONFIG_SCHEMA_VERSION.to_string(),
            });
        }
        Ok(())
    }

    /// Semantic validation of every field.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        for (field, budget) in self.sampling.cells() {
            if budget.graphs == 0 {
                result.push(field, "graphs must be at least 1");
            }
            if budget.samples_per_graph == 0 {
                result.push(field, "samples_per_graph must be at least 1");
            }
        }
        if self.sampling.ite_graphs == 0 {
            result.push("sampling.ite_graphs", "must be at least 1");
        }

        if self.rff.n_features == 0 {
            result.push("rff.n_features", "must be at least 1");
        }
        match self.rff.lengthscale {
            LengthscaleConfig::Fixed(l) if !(l > 0.0 && l.is_finite()) => {
                result.push("rff.lengthscale", format!("fixed lengthscale {} must be positive", l));
            }
            LengthscaleConfig::Uniform { low, high }
                if !(low > 0.0 && high >= low && high.is_finite()) =>
            {
                result.push(
                    "rff.lengthscale",
                    format!("range [{}, {}] must be positive and ordered", low, high),
                );
            }
            _ => {}
        }
        if !(self.rff.prior_precision > 0.0 && self.rff.prior_precision.is_finite()) {
            result.push("rff.prior_precision", "must be positive and finite");
        }

        if self.enumeration.approximation_samples == 0 {
            result.push("enumeration.approximation_samples", "must be at least 1");
        }
        if self.enumeration.repair_samples == 0 {
            result.push("enumeration.repair_samples", "must be at least 1");
        }
        if self.enumeration.max_exhaustive_edges > 30 {
            result.push(
                "enumeration.max_exhaustive_edges",
                "must be at most 30 (2^k assignment indices are materialised)",
            );
        }
        if self.enumeration.max_attempts == 0 {
            result.push("enumeration.max_attempts", "must be at least 1");
        }

        if !(self.dag_tolerance > 0.0 && self.dag_tolerance < 1e-3) {
            result.push("dag_tolerance", "must lie in (0, 1e-3)");
        }

        result
    }

    /// JSON schema of the configuration format.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(EstimationConfig))
            .unwrap_or(serde_json::Value::Null)
    }
}
