//! Post-processing of sampled adjacency matrices into weighted DAGs.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::{dag_pen, is_dag, AdjacencyMatrix, GraphError, GraphOptions};
use crate::model::CausalInferenceModel;

/// Adjacency output of a structural model.
#[derive(Debug, Clone, PartialEq)]
pub enum AdjacencySamples {
    /// A single (most likely) graph.
    Single(AdjacencyMatrix),
    /// Posterior samples, duplicates allowed.
    Batch(Vec<AdjacencyMatrix>),
}

/// Unique DAGs with their empirical frequencies.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedDags {
    pub dags: Vec<AdjacencyMatrix>,
    /// `weights[i]` belongs to `dags[i]`; sums to 1.
    pub weights: Vec<f64>,
}

impl WeightedDags {
    pub fn len(&self) -> usize {
        self.dags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AdjacencyMatrix, f64)> {
        self.dags.iter().zip(self.weights.iter().copied())
    }
}

fn check_shape(adjacency: &AdjacencyMatrix, num_nodes: usize) -> Result<(), GraphError> {
    let (rows, cols) = adjacency.shape();
    if rows != num_nodes || cols != num_nodes {
        return Err(GraphError::ShapeMismatch {
            expected: num_nodes,
            rows,
            cols,
        });
    }
    Ok(())
}

/// Drop cyclic samples, merge duplicates and weight each DAG by its count.
///
/// A single matrix must already be a DAG and comes back with weight `1.0`.
/// Unique DAGs keep the order of their first appearance in the batch.
pub fn process_adjacency_mats(
    samples: &AdjacencySamples,
    num_nodes: usize,
    options: &GraphOptions,
) -> Result<WeightedDags, GraphError> {
    let tolerance = options.dag_tolerance;
    match samples {
        AdjacencySamples::Single(adjacency) => {
            check_shape(adjacency, num_nodes)?;
            if !is_dag(adjacency, tolerance) {
                return Err(GraphError::NotADag {
                    penalty: dag_pen(adjacency),
                });
            }
            Ok(WeightedDags {
                dags: vec![adjacency.clone()],
                weights: vec![1.0],
            })
        }
        AdjacencySamples::Batch(batch) => {
            let mut dags: Vec<AdjacencyMatrix> = Vec::new();
            let mut counts: Vec<usize> = Vec::new();
            let mut index: HashMap<Vec<u8>, usize> = HashMap::new();
            let mut dropped = 0usize;

            for adjacency in batch {
                check_shape(adjacency, num_nodes)?;
                if !is_dag(adjacency, tolerance) {
                    dropped += 1;
                    continue;
                }
                match index.get(adjacency.as_slice()) {
                    Some(&pos) => counts[pos] += 1,
                    None => {
                        index.insert(adjacency.as_slice().to_vec(), dags.len());
                        dags.push(adjacency.clone());
                        counts.push(1);
                    }
                }
            }

            if dags.is_empty() {
                return Err(GraphError::NoDagInBatch { dropped });
            }
            if dropped > 0 {
                warn!(
                    dropped,
                    total = batch.len(),
                    "dropped cyclic adjacency samples"
                );
            }

            let kept: usize = counts.iter().sum();
            let weights = counts.iter().map(|&c| c as f64 / kept as f64).collect();
            debug!(unique = dags.len(), kept, "deduplicated adjacency samples");
            Ok(WeightedDags { dags, weights })
        }
    }
}

/// Draw adjacency samples from a model and weight the DAGs among them.
pub fn weighted_graph_posterior<M: CausalInferenceModel + ?Sized>(
    model: &M,
    most_likely_graph: bool,
    samples: usize,
    options: &GraphOptions,
) -> ce_common::Result<WeightedDags> {
    let drawn = model.adjacency_samples(most_likely_graph, samples)?;
    Ok(process_adjacency_mats(&drawn, model.num_nodes(), options)?)
}
