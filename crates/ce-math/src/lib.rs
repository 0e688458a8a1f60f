//! Causal effect estimation math utilities.

pub mod math;

pub use math::acyclicity::*;
pub use math::features::{Lengthscale, RandomFourierFeatures};
pub use math::regression::RidgeRegression;
pub use math::stats::*;
