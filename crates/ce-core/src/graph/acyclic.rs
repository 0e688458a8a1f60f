//! Approximate maximum acyclic subgraph.
//!
//! For any vertex order, the edges pointing "forward" and the edges pointing
//! "backward" each form an acyclic subgraph, and together they hold every
//! non-loop edge, so the larger half keeps at least 1/2 of them. Trying several
//! random orders and keeping the densest half gives a 2-approximation
//! (Hassin & Rubinstein, 1994).

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use super::{edge_count, AdjacencyMatrix, GraphError, GraphOptions};

/// Densest acyclic subgraph found over `n_samples` random vertex orders.
///
/// The result never contains an edge absent from `adjacency` and never
/// contains a self-loop. Ties between orders keep the earliest candidate.
pub fn approximate_maximal_acyclic_subgraph<R: Rng>(
    adjacency: &AdjacencyMatrix,
    n_samples: usize,
    rng: &mut R,
) -> Result<AdjacencyMatrix, GraphError> {
    let (rows, cols) = adjacency.shape();
    if rows != cols {
        return Err(GraphError::NotSquare { rows, cols });
    }
    let n = rows;

    let mut best = AdjacencyMatrix::zeros(n, n);
    let mut best_edges = 0usize;
    // rank[i] is the position of node i in the sampled order
    let mut rank: Vec<usize> = (0..n).collect();

    for _ in 0..n_samples {
        rank.shuffle(rng);
        let forward =
            AdjacencyMatrix::from_fn(n, n, |i, j| if rank[i] > rank[j] { adjacency[(i, j)] } else { 0 });
        let backward =
            AdjacencyMatrix::from_fn(n, n, |i, j| if rank[i] < rank[j] { adjacency[(i, j)] } else { 0 });

        let (forward_edges, backward_edges) = (edge_count(&forward), edge_count(&backward));
        let (candidate, candidate_edges) = if backward_edges < forward_edges {
            (forward, forward_edges)
        } else {
            (backward, backward_edges)
        };

        if candidate_edges > best_edges {
            best = candidate;
            best_edges = candidate_edges;
        }
    }

    trace!(
        nodes = n,
        input_edges = edge_count(adjacency),
        kept_edges = best_edges,
        n_samples,
        "approximated maximal acyclic subgraph"
    );
    Ok(best)
}

impl GraphOptions {
    /// [`approximate_maximal_acyclic_subgraph`] with the configured number of
    /// random orders (`enumeration.approximation_samples`).
    pub fn approximate_acyclic_subgraph<R: Rng>(
        &self,
        adjacency: &AdjacencyMatrix,
        rng: &mut R,
    ) -> Result<AdjacencyMatrix, GraphError> {
        approximate_maximal_acyclic_subgraph(adjacency, self.enumeration.approximation_samples, rng)
    }
}
