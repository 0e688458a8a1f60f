//! Causal effect estimation common types and errors.
//!
//! This crate provides foundational types shared across the ce-* crates:
//! - The unified error type and its numeric codes
//! - Variable metadata (types, bounds, groups, processed column spans)
//! - Interventions paired with ground-truth samples

pub mod error;
pub mod intervention;
pub mod variables;

pub use error::{Error, Result};
pub use intervention::{Intervention, InterventionData};
pub use variables::{Variable, VariableType, Variables, MAX_CATEGORIES};
