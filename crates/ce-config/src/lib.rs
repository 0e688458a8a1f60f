//! Causal effect estimation configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the estimation configuration
//! - Loading from JSON or TOML files
//! - Semantic validation
//! - JSON schema generation

pub mod estimation;
pub mod validate;

pub use estimation::{
    EnumerationConfig, EstimationConfig, LengthscaleConfig, RffConfig, SampleBudget,
    SamplingPolicy,
};
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
