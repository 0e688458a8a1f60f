//! Causal effect estimation core.
//!
//! - [`graph`]: acyclic-subgraph approximation, CPDAG-to-DAG enumeration and
//!   post-processing of sampled adjacency matrices into weighted DAGs
//! - [`estimate`]: ATE/CATE/ITE estimators, RMSE scoring and the evaluation
//!   routines that drive a trained model across intervention datasets
//! - [`model`]: capability traits a trained model implements
//! - [`logging`]: tracing subscriber setup

pub mod estimate;
pub mod graph;
pub mod logging;
pub mod model;

pub use graph::{
    approximate_maximal_acyclic_subgraph, cpdag_to_dags, intervene_graph, process_adjacency_mats,
    AdjacencyMatrix, AdjacencySamples, GraphError, GraphOptions, WeightedDags,
};
pub use model::{
    CateQuery, CausalInferenceModel, CounterfactualModel, EffectEstimate, InterventionModel,
    IteQuery,
};
