//! Real-world testing quality via inverse probability weighting.
//!
//! The IPW estimator and the treatment assignment policy are not available
//! yet; both report [`Error::NotImplemented`].

use ce_common::{Error, Intervention, Result};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::model::{CounterfactualModel, EffectEstimate, IteQuery};

/// IPW estimate of the ATE from data gathered under a treatment policy:
/// `sum_i T_i Y_i / p_i / N - sum_i (1 - T_i) Y_i / (1 - p_i) / N`.
pub fn get_ipw_estimated_ate(
    _interventional_x: &DMatrix<f64>,
    _treatment_probability: &DVector<f64>,
    _treatment_mask: &[bool],
    _outcome_idxs: &[usize],
) -> Result<DVector<f64>> {
    Err(Error::NotImplemented("inverse probability weighted ATE"))
}

/// Treatment probability and sampled assignment for each observational row.
pub fn get_real_world_testing_assignment(
    _observational_x: &DMatrix<f64>,
    _intervention: &Intervention,
) -> Result<(DVector<f64>, Vec<bool>)> {
    Err(Error::NotImplemented("real-world testing assignment"))
}

fn check_ite_shape(ite: &DMatrix<f64>, expected: (usize, usize)) -> Result<()> {
    if ite.shape() != expected {
        return Err(Error::shape("model ITE", expected, ite.shape()));
    }
    Ok(())
}

fn rows_where(mask: &[bool], value: bool) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(row, &m)| (m == value).then_some(row))
        .collect()
}

/// Outcomes of every row under its assigned treatment.
///
/// Rows with a set `treatment_mask` receive `treated_values`, the rest
/// `reference_values`. The simulated effect is added to the observed row.
fn simulate_policy_outcomes<F>(
    ite: F,
    observational_x: &DMatrix<f64>,
    treatment_mask: &[bool],
    treated_values: &DVector<f64>,
    reference_values: &DVector<f64>,
) -> Result<DMatrix<f64>>
where
    F: Fn(&DMatrix<f64>, Option<&DVector<f64>>, &DVector<f64>) -> Result<EffectEstimate<DMatrix<f64>>>,
{
    let mut outcomes = observational_x.clone();
    for (value, treatment) in [(true, treated_values), (false, reference_values)] {
        let rows = rows_where(treatment_mask, value);
        if rows.is_empty() {
            continue;
        }
        let simulated = ite(&observational_x.select_rows(rows.iter()), None, treatment)?.raw;
        check_ite_shape(&simulated, (rows.len(), observational_x.ncols()))?;
        for (i, &row) in rows.iter().enumerate() {
            let outcome = &outcomes.row(row) + &simulated.row(i);
            outcomes.set_row(row, &outcome);
        }
    }
    Ok(outcomes)
}

/// Squared error between the counterfactual ATE of `model` on the outcome
/// columns and the IPW estimate from simulated policy-assigned data.
///
/// Rows with a set `treatment_mask` receive the intervention, the rest the
/// reference treatment.
#[allow(clippy::too_many_arguments)]
pub fn eval_test_quality_by_ate_error<M: CounterfactualModel + ?Sized>(
    model: &M,
    observational_x: &DMatrix<f64>,
    treatment_probability: &DVector<f64>,
    treatment_mask: &[bool],
    outcome_idxs: &[usize],
    intervention: &Intervention,
    reference_values: &DVector<f64>,
    graphs: usize,
    most_likely_graph: bool,
) -> Result<DVector<f64>> {
    let n = observational_x.nrows();
    if treatment_mask.len() != n || treatment_probability.len() != n {
        return Err(Error::ShapeMismatch {
            context: "treatment assignment per observation".to_string(),
            expected: n.to_string(),
            actual: format!(
                "{} probabilities, {} mask entries",
                treatment_probability.len(),
                treatment_mask.len()
            ),
        });
    }
    if let Some(&col) = outcome_idxs.iter().find(|&&c| c >= observational_x.ncols()) {
        return Err(Error::IndexOutOfRange {
            context: "outcome columns".to_string(),
            index: col,
            len: observational_x.ncols(),
        });
    }

    let ite = |x: &DMatrix<f64>, reference: Option<&DVector<f64>>, values: &DVector<f64>| {
        model.ite(&IteQuery {
            x,
            intervention_idxs: intervention.idxs(),
            intervention_values: values,
            reference_values: reference,
            most_likely_graph,
            graphs,
        })
    };

    let effects = ite(observational_x, Some(reference_values), intervention.values())?.raw;
    check_ite_shape(&effects, observational_x.shape())?;
    let outcome_effects = effects.select_columns(outcome_idxs.iter());
    let ground_truth = DVector::from_iterator(
        outcome_effects.ncols(),
        outcome_effects.column_iter().map(|c| c.mean()),
    );
    debug!(outcomes = ?outcome_idxs, "ground-truth ATE for test quality");

    let interventional_x = simulate_policy_outcomes(
        &ite,
        observational_x,
        treatment_mask,
        intervention.values(),
        reference_values,
    )?;

    let estimated = get_ipw_estimated_ate(
        &interventional_x,
        treatment_probability,
        treatment_mask,
        outcome_idxs,
    )?;
    Ok((estimated - ground_truth).map(|d| d * d))
}
