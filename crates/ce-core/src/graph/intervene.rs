//! Graph surgery for `do()` interventions.

use super::{AdjacencyMatrix, GraphError};

/// Copy of `adjacency` with every edge into an intervened node removed.
pub fn intervene_graph(
    adjacency: &AdjacencyMatrix,
    intervention_idxs: &[usize],
) -> Result<AdjacencyMatrix, GraphError> {
    let num_nodes = adjacency.ncols();
    if let Some(&node) = intervention_idxs.iter().find(|&&node| node >= num_nodes) {
        return Err(GraphError::NodeOutOfRange { node, num_nodes });
    }

    let mut intervened = adjacency.clone();
    for &node in intervention_idxs {
        intervened.column_mut(node).fill(0);
    }
    Ok(intervened)
}
