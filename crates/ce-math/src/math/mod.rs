//! Core math modules.

pub mod acyclicity;
pub mod features;
pub mod regression;
pub mod stats;
