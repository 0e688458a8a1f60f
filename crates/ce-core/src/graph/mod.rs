//! Graph algorithms over binary adjacency matrices.
//!
//! Entry `(i, j) == 1` is a directed edge `i -> j`. A CPDAG marks an
//! undetermined edge by setting both `(i, j)` and `(j, i)`.

pub mod acyclic;
pub mod adjacency;
pub mod cpdag;
pub mod intervene;

pub use acyclic::approximate_maximal_acyclic_subgraph;
pub use adjacency::{process_adjacency_mats, weighted_graph_posterior, AdjacencySamples, WeightedDags};
pub use cpdag::{cpdag_to_dags, decode_assignment, split_cpdag, CpdagParts, UndeterminedEdge};
pub use intervene::intervene_graph;

use ce_config::{EnumerationConfig, EstimationConfig};
use ce_math::{dag_penalty, DAG_PENALTY_TOLERANCE};
use nalgebra::DMatrix;
use thiserror::Error;

/// Binary adjacency matrix.
pub type AdjacencyMatrix = DMatrix<u8>;

/// Errors from graph operations.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("adjacency matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("adjacency matrix entry ({row}, {col}) is {value}, expected 0 or 1")]
    NonBinary { row: usize, col: usize, value: u8 },

    #[error("expected a {expected}x{expected} adjacency matrix, got {rows}x{cols}")]
    ShapeMismatch {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    #[error("adjacency matrix is not a DAG (penalty {penalty})")]
    NotADag { penalty: f64 },

    #[error("no DAG left in batch after dropping {dropped} cyclic samples")]
    NoDagInBatch { dropped: usize },

    #[error("node {node} out of range for a graph with {num_nodes} nodes")]
    NodeOutOfRange { node: usize, num_nodes: usize },
}

impl From<GraphError> for ce_common::Error {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::NotSquare { rows, cols } => {
                ce_common::Error::shape("adjacency matrix", (rows, rows), (rows, cols))
            }
            GraphError::ShapeMismatch {
                expected,
                rows,
                cols,
            } => ce_common::Error::shape("adjacency matrix", (expected, expected), (rows, cols)),
            GraphError::NodeOutOfRange { node, num_nodes } => ce_common::Error::IndexOutOfRange {
                context: "graph nodes".to_string(),
                index: node,
                len: num_nodes,
            },
            other => ce_common::Error::InvalidInput(other.to_string()),
        }
    }
}

/// Enumeration limits and acyclicity tolerance shared by the graph routines.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphOptions {
    pub enumeration: EnumerationConfig,
    pub dag_tolerance: f64,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            enumeration: EnumerationConfig::default(),
            dag_tolerance: DAG_PENALTY_TOLERANCE,
        }
    }
}

impl From<&EstimationConfig> for GraphOptions {
    fn from(config: &EstimationConfig) -> Self {
        Self {
            enumeration: config.enumeration.clone(),
            dag_tolerance: config.dag_tolerance,
        }
    }
}

/// Acyclicity penalty `tr(exp(A)) - n` of a binary adjacency matrix.
pub fn dag_pen(adjacency: &AdjacencyMatrix) -> f64 {
    dag_penalty(&adjacency.map(f64::from))
}

/// Whether the graph has a directed cycle (self-loops included).
///
/// Kahn's topological sort: the graph is acyclic exactly when every node can
/// be peeled off once its in-degree drops to zero. Non-square input counts as
/// cyclic.
pub fn has_directed_cycle(adjacency: &AdjacencyMatrix) -> bool {
    if !adjacency.is_square() {
        return true;
    }
    let n = adjacency.nrows();
    let mut in_degree: Vec<usize> = (0..n)
        .map(|j| adjacency.column(j).iter().filter(|&&v| v != 0).count())
        .collect();
    let mut ready: Vec<usize> = (0..n).filter(|&j| in_degree[j] == 0).collect();
    let mut peeled = 0;
    while let Some(node) = ready.pop() {
        peeled += 1;
        for child in 0..n {
            if adjacency[(node, child)] != 0 {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    ready.push(child);
                }
            }
        }
    }
    peeled < n
}

/// Whether the graph is acyclic.
///
/// The structural check is exact at any size. The penalty must also be
/// within `tolerance` of zero; on an acyclic 0/1 matrix it only carries
/// rounding noise, far below any accepted tolerance.
pub fn is_dag(adjacency: &AdjacencyMatrix, tolerance: f64) -> bool {
    if has_directed_cycle(adjacency) {
        return false;
    }
    let penalty = dag_pen(adjacency);
    penalty.is_finite() && penalty.abs() < tolerance
}

pub fn edge_count(adjacency: &AdjacencyMatrix) -> usize {
    adjacency.iter().filter(|&&v| v != 0).count()
}

/// Check the matrix is square with 0/1 entries.
pub fn check_adjacency(adjacency: &AdjacencyMatrix) -> Result<(), GraphError> {
    let (rows, cols) = adjacency.shape();
    if rows != cols {
        return Err(GraphError::NotSquare { rows, cols });
    }
    for row in 0..rows {
        for col in 0..cols {
            let value = adjacency[(row, col)];
            if value > 1 {
                return Err(GraphError::NonBinary { row, col, value });
            }
        }
    }
    Ok(())
}
