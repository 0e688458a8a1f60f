//! Functional CATE estimator.
//!
//! For every graph sample a ridge regression on random Fourier features maps
//! the conditioning columns to the effect column, once on intervened samples
//! and once on baseline samples. The CATE at the conditioning point is the
//! difference of the two predictions, averaged over graphs. All graphs share
//! one feature map.

use ce_common::{Error, Result};
use ce_config::{LengthscaleConfig, RffConfig};
use ce_math::{Lengthscale, RandomFourierFeatures, RidgeRegression};
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use tracing::debug;

use super::samples::{column_bounds, mask_columns, normalise_data, Scale};

fn lengthscale(config: LengthscaleConfig) -> Lengthscale {
    match config {
        LengthscaleConfig::Fixed(l) => Lengthscale::Fixed(l),
        LengthscaleConfig::Uniform { low, high } => Lengthscale::Uniform { low, high },
    }
}

fn fit_and_predict(
    features: &RandomFourierFeatures,
    samples: &DMatrix<f64>,
    conditioning_cols: &[usize],
    effect_col: usize,
    test_features: &DMatrix<f64>,
    prior_precision: f64,
) -> Result<f64> {
    let inputs = features.transform(&samples.select_columns(conditioning_cols.iter()));
    let targets: DVector<f64> = samples.column(effect_col).into_owned();
    let model = RidgeRegression::fit(&inputs, &targets, prior_precision).ok_or_else(|| {
        Error::Numerical("ridge regression on random features could not be solved".to_string())
    })?;
    Ok(model.predict(test_features)[0])
}

/// Estimate the CATE of a single effect column at `conditioning_values`.
///
/// `intervened[g]` and `baseline[g]` are the samples drawn under graph `g`.
/// Both masks run over the sample columns; `effect_mask` must select exactly
/// one column and `conditioning_values` holds one value per conditioning
/// column.
///
/// `conditioning_values` are always in data units. When normalising, the
/// point is mapped with the same bounds as the samples, so the regressors are
/// evaluated on the scale they were fitted on. Callers that already hold a
/// normalised point must pass it back in data units.
#[allow(clippy::too_many_arguments)]
pub fn get_cate_from_samples<R: Rng>(
    intervened: &[DMatrix<f64>],
    baseline: &[DMatrix<f64>],
    conditioning_mask: &[bool],
    conditioning_values: &DVector<f64>,
    effect_mask: &[bool],
    scale: Scale<'_>,
    rff: &RffConfig,
    rng: &mut R,
) -> Result<f64> {
    if intervened.is_empty() {
        return Err(Error::EmptySamples("CATE needs at least one graph sample".to_string()));
    }
    if intervened.len() != baseline.len() {
        return Err(Error::ShapeMismatch {
            context: "baseline graph samples".to_string(),
            expected: intervened.len().to_string(),
            actual: baseline.len().to_string(),
        });
    }

    let effect_cols = mask_columns(effect_mask);
    let effect_col = match effect_cols.as_slice() {
        [col] => *col,
        _ => {
            return Err(Error::ShapeMismatch {
                context: "CATE effect mask (only 1d outcomes are supported)".to_string(),
                expected: "1 column".to_string(),
                actual: format!("{} columns", effect_cols.len()),
            })
        }
    };
    let conditioning_cols = mask_columns(conditioning_mask);
    if conditioning_cols.len() != conditioning_values.len() {
        return Err(Error::ShapeMismatch {
            context: "CATE conditioning values".to_string(),
            expected: conditioning_cols.len().to_string(),
            actual: conditioning_values.len().to_string(),
        });
    }

    let n_cols = effect_mask.len();
    for samples in intervened.iter().chain(baseline) {
        if samples.ncols() != n_cols || conditioning_mask.len() != n_cols {
            return Err(Error::shape(
                "CATE samples",
                (samples.nrows(), n_cols),
                samples.shape(),
            ));
        }
        if samples.nrows() == 0 {
            return Err(Error::EmptySamples("CATE graph sample has no rows".to_string()));
        }
    }

    let mut test_input =
        DMatrix::from_row_slice(1, conditioning_values.len(), conditioning_values.as_slice());
    let (intervened, baseline) = match scale {
        Scale::Raw => (intervened.to_vec(), baseline.to_vec()),
        Scale::Normalised {
            variables,
            processed,
        } => {
            let (lowers, uppers) = column_bounds(variables, processed);
            for (i, &col) in conditioning_cols.iter().enumerate() {
                if let (Some(lower), Some(upper)) = (lowers.get(col), uppers.get(col)) {
                    test_input[(0, i)] = (test_input[(0, i)] - lower) / (upper - lower);
                }
            }
            let refs: Vec<&DMatrix<f64>> = intervened.iter().chain(baseline).collect();
            let mut normalised = normalise_data(&refs, variables, processed)?;
            let baseline = normalised.split_off(intervened.len());
            (normalised, baseline)
        }
    };

    let features = RandomFourierFeatures::sample(
        conditioning_cols.len(),
        rff.n_features,
        lengthscale(rff.lengthscale),
        rng,
    );
    let test_features = features.transform(&test_input);

    let mut total = 0.0;
    for (treated, reference) in intervened.iter().zip(&baseline) {
        let treated_pred = fit_and_predict(
            &features,
            treated,
            &conditioning_cols,
            effect_col,
            &test_features,
            rff.prior_precision,
        )?;
        let reference_pred = fit_and_predict(
            &features,
            reference,
            &conditioning_cols,
            effect_col,
            &test_features,
            rff.prior_precision,
        )?;
        total += treated_pred - reference_pred;
    }
    let cate = total / intervened.len() as f64;
    debug!(graphs = intervened.len(), effect_col, cate, "functional CATE estimate");
    Ok(cate)
}
