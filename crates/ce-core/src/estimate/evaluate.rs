//! Model evaluation against ground-truth intervention datasets.

use ce_common::{Error, InterventionData, Result, Variables};
use ce_config::SamplingPolicy;
use ce_math::{mean, population_std};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use super::metrics::{AteRmseMetrics, IteRmseMetrics, TreatmentDataLogProb};
use super::rmse::calculate_per_group_rmse;
use super::samples::{filter_effect_columns, get_ate_from_samples, get_ite_from_samples, Scale};
use crate::model::{CateQuery, CounterfactualModel, InterventionModel, IteQuery};

/// How the model is queried and how the dataset columns are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// Use the single most likely graph instead of posterior samples.
    pub most_likely_graph: bool,
    /// Dataset samples use the processed column layout.
    pub processed: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            most_likely_graph: false,
            processed: true,
        }
    }
}

fn values_of(data: &InterventionData) -> Result<&DVector<f64>> {
    data.intervention_values().ok_or_else(|| {
        Error::InvalidInput("intervention dataset has no intervention values".to_string())
    })
}

fn as_row(v: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_row_slice(1, v.len(), v.as_slice())
}

fn stack_rows(rows: &[DMatrix<f64>], context: &str) -> Result<DMatrix<f64>> {
    let ncols = rows.first().map_or(0, DMatrix::ncols);
    if let Some(row) = rows.iter().find(|r| r.ncols() != ncols) {
        return Err(Error::shape(context, (1, ncols), row.shape()));
    }
    Ok(DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][(0, j)]))
}

/// Per-dimension log-probability of the test data of every intervention.
///
/// Each sample's log-probability is divided by the number of non-intervened
/// columns. With no datasets the overall mean and std are NaN.
pub fn get_treatment_data_logprob<M: InterventionModel + ?Sized>(
    model: &M,
    datasets: &[InterventionData],
    most_likely_graph: bool,
) -> Result<TreatmentDataLogProb> {
    let mut all = Vec::new();
    let mut per_intervention_mean = Vec::with_capacity(datasets.len());
    let mut per_intervention_std = Vec::with_capacity(datasets.len());

    for data in datasets {
        let intervention = data.intervention()?;
        let test_data = data.test_data();
        let dims = test_data
            .ncols()
            .checked_sub(intervention.idxs().len())
            .filter(|&d| d > 0)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "{} intervened nodes leave no free dimension in {} columns",
                    intervention.idxs().len(),
                    test_data.ncols()
                ))
            })?;

        let log_probs = model.log_prob(test_data, most_likely_graph, &intervention)?;
        if log_probs.len() != test_data.nrows() {
            return Err(Error::ShapeMismatch {
                context: "log-probabilities per test sample".to_string(),
                expected: test_data.nrows().to_string(),
                actual: log_probs.len().to_string(),
            });
        }
        let per_dim: Vec<f64> = log_probs.iter().map(|lp| lp / dims as f64).collect();

        let m = mean(&per_dim);
        debug!(
            intervention = ?intervention.idxs(),
            samples = per_dim.len(),
            mean = m,
            "interventional log-probability"
        );
        per_intervention_mean.push(m);
        per_intervention_std.push(population_std(&per_dim));
        all.extend(per_dim);
    }

    Ok(TreatmentDataLogProb {
        all_mean: mean(&all),
        all_std: population_std(&all),
        per_intervention_mean,
        per_intervention_std,
    })
}

/// RMSE between the model's (C)ATE and the ground-truth ATE per intervention.
///
/// Ground truth compares each dataset's test data with its reference data, or
/// with the observational `test_samples` when it has none. Conditioning is
/// already baked into the test data, so the ground truth is a CATE whenever
/// conditioning is present. The model is queried with the budget `policy`
/// assigns to the graph mode and presence of conditioning. Returns raw and
/// normalised metrics.
pub fn get_ate_rms<M: InterventionModel + ?Sized>(
    model: &M,
    test_samples: &DMatrix<f64>,
    datasets: &[InterventionData],
    variables: &Variables,
    options: &EvaluationOptions,
    policy: &SamplingPolicy,
) -> Result<(AteRmseMetrics, AteRmseMetrics)> {
    if datasets.is_empty() {
        return Err(Error::EmptySamples("no intervention datasets to evaluate".to_string()));
    }
    let normalised = Scale::normalised(variables, options.processed);

    let mut group_rmses = Vec::with_capacity(datasets.len());
    let mut norm_group_rmses = Vec::with_capacity(datasets.len());
    for data in datasets {
        let reference = data.reference_data().unwrap_or(test_samples);
        let ate = get_ate_from_samples(data.test_data(), reference, Scale::Raw)?;
        let norm_ate = get_ate_from_samples(data.test_data(), reference, normalised)?;

        let (ate, norm_ate, filtered) = match data.effect_idxs() {
            Some(effects) => {
                let (arrays, filtered) = filter_effect_columns(
                    &[as_row(&ate), as_row(&norm_ate)],
                    variables,
                    effects,
                    options.processed,
                )?;
                let [ate, norm_ate]: [DMatrix<f64>; 2] = arrays
                    .try_into()
                    .map_err(|_| Error::Model("effect filtering dropped an array".to_string()))?;
                (ate, norm_ate, filtered)
            }
            None => (as_row(&ate), as_row(&norm_ate), variables.clone()),
        };

        let conditioned = data.conditioning_idxs().is_some();
        let budget = policy.budget(options.most_likely_graph, conditioned);
        let query = CateQuery {
            intervention_idxs: data.intervention_idxs(),
            intervention_values: values_of(data)?,
            reference_values: data.intervention_reference(),
            effect_idxs: data.effect_idxs(),
            conditioning_idxs: data.conditioning_idxs(),
            conditioning_values: data.conditioning_values(),
            most_likely_graph: options.most_likely_graph,
            budget,
        };
        let estimate = model.cate(&query)?;
        debug!(
            intervention = ?data.intervention_idxs(),
            conditioned,
            graphs = budget.graphs,
            samples_per_graph = budget.samples_per_graph,
            "queried model ATE"
        );

        group_rmses.push(calculate_per_group_rmse(&as_row(&estimate.raw), &ate, &filtered)?);
        norm_group_rmses.push(calculate_per_group_rmse(
            &as_row(&estimate.normalised),
            &norm_ate,
            &filtered,
        )?);
    }

    Ok((
        AteRmseMetrics::new(stack_rows(&group_rmses, "ATE group rmses")?),
        AteRmseMetrics::new(stack_rows(&norm_group_rmses, "normalised ATE group rmses")?),
    ))
}

/// Per-sample, per-group RMSE of the model's ITE on counterfactual datasets.
///
/// A counterfactual dataset carries the factual samples as conditioning
/// values, the samples under the intervention as test data and the samples
/// under the reference treatment as reference data. When the dataset names
/// effect variables only those are scored.
pub fn get_ite_evaluation_results<M: CounterfactualModel + ?Sized>(
    model: &M,
    datasets: &[InterventionData],
    variables: &Variables,
    options: &EvaluationOptions,
    graphs: usize,
) -> Result<(IteRmseMetrics, IteRmseMetrics)> {
    if datasets.is_empty() {
        return Err(Error::EmptySamples("no counterfactual datasets to evaluate".to_string()));
    }
    let normalised = Scale::normalised(variables, options.processed);

    let mut group_rmses = Vec::with_capacity(datasets.len());
    let mut norm_group_rmses = Vec::with_capacity(datasets.len());
    for data in datasets {
        let factual = data.conditioning_values().ok_or_else(|| {
            Error::InvalidInput("counterfactual dataset has no factual samples".to_string())
        })?;
        let reference = data.reference_data().ok_or_else(|| {
            Error::InvalidInput("counterfactual dataset has no reference samples".to_string())
        })?;

        let sample_ite = get_ite_from_samples(data.test_data(), reference, Scale::Raw)?;
        let sample_norm_ite = get_ite_from_samples(data.test_data(), reference, normalised)?;

        let query = IteQuery {
            x: factual,
            intervention_idxs: data.intervention_idxs(),
            intervention_values: values_of(data)?,
            reference_values: data.intervention_reference(),
            most_likely_graph: options.most_likely_graph,
            graphs,
        };
        let estimate = model.ite(&query)?;
        debug!(
            intervention = ?data.intervention_idxs(),
            samples = factual.nrows(),
            graphs,
            "queried model ITE"
        );

        let mut arrays = vec![sample_ite, estimate.raw, sample_norm_ite, estimate.normalised];
        let filtered = match data.effect_idxs() {
            Some(effects) if !effects.is_empty() => {
                let (projected, filtered) =
                    filter_effect_columns(&arrays, variables, effects, options.processed)?;
                arrays = projected;
                filtered
            }
            _ => variables.clone(),
        };

        group_rmses.push(calculate_per_group_rmse(&arrays[0], &arrays[1], &filtered)?);
        norm_group_rmses.push(calculate_per_group_rmse(&arrays[2], &arrays[3], &filtered)?);
    }

    Ok((
        IteRmseMetrics::new(group_rmses),
        IteRmseMetrics::new(norm_group_rmses),
    ))
}
