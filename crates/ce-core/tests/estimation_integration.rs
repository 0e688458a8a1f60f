//! End-to-end evaluation against a deterministic linear model.
//!
//! The mock model is `x` free, `y = 2x + u`. Its CATE and ITE answers are
//! exact up to a configurable bias on `y`, so every RMSE below is known in
//! closed form.

use std::cell::RefCell;

use ce_common::{Intervention, InterventionData, Result, Variable, Variables};
use ce_config::{SampleBudget, SamplingPolicy};
use ce_core::estimate::{
    eval_test_quality_by_ate_error, get_ate_rms, get_ite_evaluation_results,
    get_treatment_data_logprob, EvaluationOptions,
};
use ce_core::graph::{weighted_graph_posterior, AdjacencyMatrix, AdjacencySamples, GraphOptions};
use ce_core::model::{
    CateQuery, CausalInferenceModel, CounterfactualModel, EffectEstimate, InterventionModel,
    IteQuery,
};
use nalgebra::{DMatrix, DVector};

const RANGES: [f64; 2] = [2.0, 4.0];

struct LinearMock {
    observational_mean_x: f64,
    y_bias: f64,
    budgets: RefCell<Vec<SampleBudget>>,
    ite_calls: RefCell<usize>,
}

impl LinearMock {
    fn new(y_bias: f64) -> Self {
        Self {
            observational_mean_x: 0.5,
            y_bias,
            budgets: RefCell::new(Vec::new()),
            ite_calls: RefCell::new(0),
        }
    }

    fn effect_row(&self, shift: f64) -> [f64; 2] {
        [shift, 2.0 * shift + self.y_bias]
    }
}

fn chain() -> AdjacencyMatrix {
    AdjacencyMatrix::from_row_slice(2, 2, &[0, 1, 0, 0])
}

fn reversed() -> AdjacencyMatrix {
    AdjacencyMatrix::from_row_slice(2, 2, &[0, 0, 1, 0])
}

fn two_cycle() -> AdjacencyMatrix {
    AdjacencyMatrix::from_row_slice(2, 2, &[0, 1, 1, 0])
}

impl CausalInferenceModel for LinearMock {
    fn num_nodes(&self) -> usize {
        2
    }

    fn adjacency_samples(&self, most_likely_graph: bool, _samples: usize) -> Result<AdjacencySamples> {
        if most_likely_graph {
            Ok(AdjacencySamples::Single(chain()))
        } else {
            Ok(AdjacencySamples::Batch(vec![
                chain(),
                two_cycle(),
                chain(),
                reversed(),
            ]))
        }
    }
}

impl InterventionModel for LinearMock {
    fn log_prob(
        &self,
        x: &DMatrix<f64>,
        _most_likely_graph: bool,
        _intervention: &Intervention,
    ) -> Result<DVector<f64>> {
        Ok(DVector::from_fn(x.nrows(), |i, _| -(i as f64 + 1.0)))
    }

    fn cate(&self, query: &CateQuery<'_>) -> Result<EffectEstimate<DVector<f64>>> {
        self.budgets.borrow_mut().push(query.budget);
        let reference = query
            .reference_values
            .map_or(self.observational_mean_x, |r| r[0]);
        let row = self.effect_row(query.intervention_values[0] - reference);
        let effects: Vec<usize> = query.effect_idxs.map_or(vec![0, 1], <[usize]>::to_vec);
        Ok(EffectEstimate {
            raw: DVector::from_iterator(effects.len(), effects.iter().map(|&e| row[e])),
            normalised: DVector::from_iterator(
                effects.len(),
                effects.iter().map(|&e| row[e] / RANGES[e]),
            ),
        })
    }
}

impl CounterfactualModel for LinearMock {
    fn ite(&self, query: &IteQuery<'_>) -> Result<EffectEstimate<DMatrix<f64>>> {
        *self.ite_calls.borrow_mut() += 1;
        let value = query.intervention_values[0];
        let raw = DMatrix::from_fn(query.x.nrows(), 2, |i, j| {
            let reference = query.reference_values.map_or(query.x[(i, 0)], |r| r[0]);
            self.effect_row(value - reference)[j]
        });
        let normalised = DMatrix::from_fn(raw.nrows(), 2, |i, j| raw[(i, j)] / RANGES[j]);
        Ok(EffectEstimate { raw, normalised })
    }
}

fn variables() -> Variables {
    Variables::new(vec![
        Variable::continuous("x", 0.0, 2.0),
        Variable::continuous("y", 0.0, 4.0),
    ])
    .unwrap()
}

fn observational() -> DMatrix<f64> {
    DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 2.0])
}

fn do_x(value: f64) -> InterventionData {
    InterventionData::new(
        vec![0],
        Some(DVector::from_vec(vec![value])),
        DMatrix::from_row_slice(2, 2, &[value, 2.0 * value, value, 2.0 * value]),
    )
    .unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-12, "{actual} != {expected}");
}

#[test]
fn logprob_is_normalised_per_free_dimension() {
    let model = LinearMock::new(0.0);
    let out = get_treatment_data_logprob(&model, &[do_x(1.5), do_x(0.5)], false).unwrap();

    assert_eq!(out.per_intervention_mean, vec![-1.5, -1.5]);
    assert_eq!(out.per_intervention_std, vec![0.5, 0.5]);
    assert_close(out.all_mean, -1.5);
    assert_close(out.all_std, 0.5);

    let empty = get_treatment_data_logprob(&model, &[], false).unwrap();
    assert!(empty.all_mean.is_nan() && empty.all_std.is_nan());
}

#[test]
fn logprob_rejects_degenerate_datasets() {
    let model = LinearMock::new(0.0);
    let everything = InterventionData::new(
        vec![0, 1],
        Some(DVector::from_vec(vec![1.0, 2.0])),
        DMatrix::zeros(2, 2),
    )
    .unwrap();
    let err = get_treatment_data_logprob(&model, &[everything], false).unwrap_err();
    assert_eq!(err.code(), 13);

    let no_values = InterventionData::new(vec![0], None, DMatrix::zeros(2, 2)).unwrap();
    let err = get_treatment_data_logprob(&model, &[no_values], false).unwrap_err();
    assert_eq!(err.code(), 13);
}

#[test]
fn ate_rms_scores_each_group() {
    let model = LinearMock::new(0.4);
    let (raw, normalised) = get_ate_rms(
        &model,
        &observational(),
        &[do_x(1.5), do_x(0.5)],
        &variables(),
        &EvaluationOptions::default(),
        &SamplingPolicy::default(),
    )
    .unwrap();

    assert_eq!(raw.n_interventions(), 2);
    assert_eq!(raw.n_groups(), 2);
    for i in 0..2 {
        assert_close(raw.get_rmse(i, 0).unwrap(), 0.0);
        assert_close(raw.get_rmse(i, 1).unwrap(), 0.4);
        assert_close(normalised.get_rmse(i, 1).unwrap(), 0.1);
    }
    assert_close(raw.all(), 0.2);
}

#[test]
fn ate_rms_follows_sampling_policy() {
    let conditioned = do_x(1.5).with_conditioning(vec![0], DMatrix::from_element(1, 1, 1.5));
    let datasets = [do_x(1.5), conditioned];
    let variables = variables();

    let model = LinearMock::new(0.0);
    get_ate_rms(
        &model,
        &observational(),
        &datasets,
        &variables,
        &EvaluationOptions::default(),
        &SamplingPolicy::default(),
    )
    .unwrap();
    assert_eq!(
        *model.budgets.borrow(),
        vec![SampleBudget::new(10_000, 2), SampleBudget::new(10, 5_000)]
    );

    let model = LinearMock::new(0.0);
    let options = EvaluationOptions {
        most_likely_graph: true,
        processed: true,
    };
    get_ate_rms(
        &model,
        &observational(),
        &datasets,
        &variables,
        &options,
        &SamplingPolicy::default(),
    )
    .unwrap();
    assert_eq!(
        *model.budgets.borrow(),
        vec![SampleBudget::new(1, 20_000), SampleBudget::new(1, 50_000)]
    );
}

#[test]
fn ate_rms_uses_reference_data_and_effect_filter() {
    let model = LinearMock::new(0.4);
    let dataset = do_x(1.5)
        .with_reference(DVector::from_vec(vec![0.5]))
        .unwrap()
        .with_reference_data(DMatrix::from_row_slice(1, 2, &[0.5, 1.0]))
        .unwrap()
        .with_effects(vec![1]);

    let (raw, normalised) = get_ate_rms(
        &model,
        &DMatrix::zeros(1, 2),
        &[dataset],
        &variables(),
        &EvaluationOptions::default(),
        &SamplingPolicy::default(),
    )
    .unwrap();

    assert_eq!(raw.n_groups(), 1);
    assert_close(raw.get_rmse(0, 0).unwrap(), 0.4);
    assert_close(normalised.get_rmse(0, 0).unwrap(), 0.1);
}

#[test]
fn ate_rms_needs_datasets() {
    let model = LinearMock::new(0.0);
    let err = get_ate_rms(
        &model,
        &observational(),
        &[],
        &variables(),
        &EvaluationOptions::default(),
        &SamplingPolicy::default(),
    )
    .unwrap_err();
    assert_eq!(err.code(), 12);
}

fn counterfactual() -> InterventionData {
    let factual = observational();
    InterventionData::new(
        vec![0],
        Some(DVector::from_vec(vec![1.5])),
        DMatrix::from_row_slice(2, 2, &[1.5, 3.0, 1.5, 3.0]),
    )
    .unwrap()
    .with_reference(DVector::from_vec(vec![0.5]))
    .unwrap()
    .with_reference_data(DMatrix::from_row_slice(2, 2, &[0.5, 1.0, 0.5, 1.0]))
    .unwrap()
    .with_factual_samples(factual)
}

#[test]
fn ite_evaluation_is_per_sample() {
    let model = LinearMock::new(0.2);
    let (raw, normalised) = get_ite_evaluation_results(
        &model,
        &[counterfactual(), counterfactual()],
        &variables(),
        &EvaluationOptions::default(),
        SamplingPolicy::default().ite_graphs,
    )
    .unwrap();

    assert_eq!(raw.n_interventions(), 2);
    assert_eq!(raw.group_rmses[0].shape(), (2, 2));
    assert_close(raw.get_rmse(1, 0).unwrap(), 0.0);
    assert_close(raw.get_rmse(1, 1).unwrap(), 0.2);
    assert_close(normalised.get_rmse(0, 1).unwrap(), 0.05);
    assert_close(raw.all(), 0.1);
}

#[test]
fn ite_evaluation_filters_effects_and_checks_inputs() {
    let model = LinearMock::new(0.2);
    let (raw, _) = get_ite_evaluation_results(
        &model,
        &[counterfactual().with_effects(vec![1])],
        &variables(),
        &EvaluationOptions::default(),
        100,
    )
    .unwrap();
    assert_eq!(raw.n_groups(), 1);
    assert_close(raw.get_rmse(0, 0).unwrap(), 0.2);

    let missing_factual = do_x(1.5)
        .with_reference_data(DMatrix::zeros(2, 2))
        .unwrap();
    let err = get_ite_evaluation_results(
        &model,
        &[missing_factual],
        &variables(),
        &EvaluationOptions::default(),
        100,
    )
    .unwrap_err();
    assert_eq!(err.code(), 13);
}

#[test]
fn posterior_drops_cycles_and_weights_duplicates() {
    let model = LinearMock::new(0.0);
    let options = GraphOptions::default();

    let posterior = weighted_graph_posterior(&model, false, 4, &options).unwrap();
    assert_eq!(posterior.dags, vec![chain(), reversed()]);
    assert_close(posterior.weights[0], 2.0 / 3.0);
    assert_close(posterior.weights[1], 1.0 / 3.0);

    let most_likely = weighted_graph_posterior(&model, true, 1, &options).unwrap();
    assert_eq!(most_likely.dags, vec![chain()]);
    assert_eq!(most_likely.weights, vec![1.0]);
}

#[test]
fn test_quality_propagates_missing_ipw_estimator() {
    let model = LinearMock::new(0.0);
    let intervention = Intervention::new(vec![0], DVector::from_vec(vec![1.5])).unwrap();
    let err = eval_test_quality_by_ate_error(
        &model,
        &observational(),
        &DVector::from_vec(vec![0.5, 0.5]),
        &[true, false],
        &[1],
        &intervention,
        &DVector::from_vec(vec![0.5]),
        1,
        true,
    )
    .unwrap_err();

    assert_eq!(err.code(), 40);
    assert_eq!(*model.ite_calls.borrow(), 3);
}
