//! Capability traits for trained structural causal models.
//!
//! Estimators never train or inspect a model; they only query it. The three
//! traits split those queries by capability so every evaluation routine can
//! state exactly what it needs:
//!
//! - [`CausalInferenceModel`]: graph posterior access
//! - [`InterventionModel`]: interventional log-likelihoods and CATE
//! - [`CounterfactualModel`]: individual treatment effects

use ce_common::{Intervention, Result};
use ce_config::SampleBudget;
use nalgebra::{DMatrix, DVector};

use crate::graph::AdjacencySamples;

/// An effect estimate on the raw data scale and on the normalised scale.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectEstimate<T> {
    pub raw: T,
    pub normalised: T,
}

/// A (conditional) average treatment effect query.
#[derive(Debug, Clone, Copy)]
pub struct CateQuery<'a> {
    pub intervention_idxs: &'a [usize],
    pub intervention_values: &'a DVector<f64>,
    /// Reference treatment; the observational distribution when absent.
    pub reference_values: Option<&'a DVector<f64>>,
    /// Outcome nodes; all nodes when absent.
    pub effect_idxs: Option<&'a [usize]>,
    pub conditioning_idxs: Option<&'a [usize]>,
    pub conditioning_values: Option<&'a DMatrix<f64>>,
    pub most_likely_graph: bool,
    pub budget: SampleBudget,
}

/// An individual treatment effect query over factual samples `x`.
#[derive(Debug, Clone, Copy)]
pub struct IteQuery<'a> {
    pub x: &'a DMatrix<f64>,
    pub intervention_idxs: &'a [usize],
    pub intervention_values: &'a DVector<f64>,
    pub reference_values: Option<&'a DVector<f64>>,
    pub most_likely_graph: bool,
    pub graphs: usize,
}

/// A model with a (posterior over) causal graph.
pub trait CausalInferenceModel {
    /// Number of graph nodes.
    fn num_nodes(&self) -> usize;

    /// The most likely graph, or `samples` draws from the graph posterior.
    fn adjacency_samples(&self, most_likely_graph: bool, samples: usize)
        -> Result<AdjacencySamples>;
}

/// A model that can be queried under interventions.
pub trait InterventionModel: CausalInferenceModel {
    /// Per-row log-probability of `x` under the intervention.
    fn log_prob(
        &self,
        x: &DMatrix<f64>,
        most_likely_graph: bool,
        intervention: &Intervention,
    ) -> Result<DVector<f64>>;

    /// Estimated (conditional) average treatment effect per effect column.
    fn cate(&self, query: &CateQuery<'_>) -> Result<EffectEstimate<DVector<f64>>>;
}

/// A model that can answer counterfactual queries.
pub trait CounterfactualModel: InterventionModel {
    /// Estimated individual treatment effects, one row per row of `query.x`.
    fn ite(&self, query: &IteQuery<'_>) -> Result<EffectEstimate<DMatrix<f64>>>;
}
