//! Matrix-exponential acyclicity penalty.
//!
//! For a non-negative adjacency matrix `A` of size `n`,
//! `h(A) = tr(exp(A)) - n` counts weighted closed walks and is zero exactly
//! when the graph has no directed cycle (self-loops included). A cycle of
//! length `L` contributes at least `1/(L-1)!`, so the test separates DAGs from
//! cyclic graphs reliably only while that bound stays well above
//! [`DAG_PENALTY_TOLERANCE`] (graphs up to roughly a dozen nodes per cycle).

use nalgebra::DMatrix;

/// Largest `|h(A)|` still accepted as acyclic.
pub const DAG_PENALTY_TOLERANCE: f64 = 1e-9;

/// Acyclicity penalty `tr(exp(A)) - n`.
///
/// Returns NaN for non-square input.
pub fn dag_penalty(adjacency: &DMatrix<f64>) -> f64 {
    if !adjacency.is_square() {
        return f64::NAN;
    }
    let n = adjacency.nrows();
    if n == 0 {
        return 0.0;
    }
    adjacency.clone().exp().trace() - n as f64
}

/// Whether the penalty lies inside the tolerance band around zero.
pub fn is_acyclic(adjacency: &DMatrix<f64>, tolerance: f64) -> bool {
    let penalty = dag_penalty(adjacency);
    penalty.is_finite() && penalty.abs() < tolerance
}
