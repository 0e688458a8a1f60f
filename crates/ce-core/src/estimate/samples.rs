//! Treatment effects computed directly from samples.

use ce_common::{Error, Result, VariableType, Variables};
use nalgebra::{DMatrix, DVector};

/// Scale on which an effect is reported.
#[derive(Debug, Clone, Copy)]
pub enum Scale<'a> {
    /// Data units.
    Raw,
    /// Continuous columns mapped to `[0, 1]` through their variable bounds.
    Normalised {
        variables: &'a Variables,
        /// Whether the samples use the processed column layout.
        processed: bool,
    },
}

impl<'a> Scale<'a> {
    pub fn normalised(variables: &'a Variables, processed: bool) -> Self {
        Scale::Normalised {
            variables,
            processed,
        }
    }
}

/// Per-column `(lower, upper)` used by [`normalise_data`].
///
/// Non-continuous columns get `(0, 1)` so they pass through unchanged.
pub(crate) fn column_bounds(variables: &Variables, processed: bool) -> (Vec<f64>, Vec<f64>) {
    let col_groups = if processed {
        variables.processed_cols().to_vec()
    } else {
        variables.unprocessed_cols()
    };
    let n_cols = if processed {
        variables.num_processed_cols()
    } else {
        variables.num_unprocessed_cols()
    };

    let mut lowers = vec![0.0; n_cols];
    let mut uppers = vec![1.0; n_cols];
    for (cols, variable) in col_groups.iter().zip(variables.iter()) {
        if variable.var_type == VariableType::Continuous {
            for &col in cols {
                lowers[col] = variable.lower;
                uppers[col] = variable.upper;
            }
        }
    }
    (lowers, uppers)
}

/// Normalise every array to `[0, 1]` using the bounds of continuous variables.
///
/// Each array must have exactly the number of columns of the requested layout.
pub fn normalise_data(
    arrays: &[&DMatrix<f64>],
    variables: &Variables,
    processed: bool,
) -> Result<Vec<DMatrix<f64>>> {
    let (lowers, uppers) = column_bounds(variables, processed);
    let n_cols = lowers.len();

    arrays
        .iter()
        .map(|array| {
            if array.ncols() != n_cols {
                let layout = if processed { "processed" } else { "unprocessed" };
                return Err(Error::shape(
                    format!("{layout} samples"),
                    (array.nrows(), n_cols),
                    array.shape(),
                ));
            }
            let mut out = (*array).clone();
            for (col, mut column) in out.column_iter_mut().enumerate() {
                let (lower, upper) = (lowers[col], uppers[col]);
                column.apply(|x| *x = (*x - lower) / (upper - lower));
            }
            Ok(out)
        })
        .collect()
}

fn column_means(samples: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(
        samples.ncols(),
        samples.column_iter().map(|c| c.mean()),
    )
}

/// ATE `E[y | do(x = a)] - E[y]` estimated column-wise from two sample sets.
pub fn get_ate_from_samples(
    intervened: &DMatrix<f64>,
    baseline: &DMatrix<f64>,
    scale: Scale<'_>,
) -> Result<DVector<f64>> {
    if intervened.nrows() == 0 || baseline.nrows() == 0 {
        return Err(Error::EmptySamples(
            "ATE needs at least one intervened and one baseline sample".to_string(),
        ));
    }
    if intervened.ncols() != baseline.ncols() {
        return Err(Error::shape(
            "baseline samples",
            (baseline.nrows(), intervened.ncols()),
            baseline.shape(),
        ));
    }

    match scale {
        Scale::Raw => Ok(column_means(intervened) - column_means(baseline)),
        Scale::Normalised {
            variables,
            processed,
        } => {
            let normalised = normalise_data(&[intervened, baseline], variables, processed)?;
            Ok(column_means(&normalised[0]) - column_means(&normalised[1]))
        }
    }
}

/// Individual treatment effects: elementwise difference of paired samples.
pub fn get_ite_from_samples(
    intervened: &DMatrix<f64>,
    reference: &DMatrix<f64>,
    scale: Scale<'_>,
) -> Result<DMatrix<f64>> {
    if intervened.shape() != reference.shape() {
        return Err(Error::shape(
            "ITE reference samples",
            intervened.shape(),
            reference.shape(),
        ));
    }

    match scale {
        Scale::Raw => Ok(intervened - reference),
        Scale::Normalised {
            variables,
            processed,
        } => {
            let normalised = normalise_data(&[intervened, reference], variables, processed)?;
            Ok(&normalised[0] - &normalised[1])
        }
    }
}

/// Keep only the columns of the effect variables.
///
/// In the processed layout each effect variable contributes its whole column
/// span. Also returns the matching variable subset.
pub fn filter_effect_columns(
    arrays: &[DMatrix<f64>],
    variables: &Variables,
    effect_idxs: &[usize],
    processed: bool,
) -> Result<(Vec<DMatrix<f64>>, Variables)> {
    let mut cols = Vec::new();
    for &idx in effect_idxs {
        if idx >= variables.len() {
            return Err(Error::IndexOutOfRange {
                context: "effect variables".to_string(),
                index: idx,
                len: variables.len(),
            });
        }
        if processed {
            cols.extend_from_slice(&variables.processed_cols()[idx]);
        } else {
            cols.push(idx);
        }
    }

    let filtered = arrays
        .iter()
        .map(|array| {
            if let Some(&col) = cols.iter().find(|&&c| c >= array.ncols()) {
                return Err(Error::IndexOutOfRange {
                    context: "effect columns".to_string(),
                    index: col,
                    len: array.ncols(),
                });
            }
            Ok(array.select_columns(cols.iter()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((filtered, variables.subset(effect_idxs)?))
}

/// Mask over processed columns covering every column of the listed groups.
pub fn get_mask_from_idxs(idxs: &[usize], group_mask: &DMatrix<bool>) -> Result<Vec<bool>> {
    let mut mask = vec![false; group_mask.ncols()];
    for &group in idxs {
        if group >= group_mask.nrows() {
            return Err(Error::IndexOutOfRange {
                context: "variable groups".to_string(),
                index: group,
                len: group_mask.nrows(),
            });
        }
        for (col, &member) in group_mask.row(group).iter().enumerate() {
            mask[col] |= member;
        }
    }
    Ok(mask)
}

/// Column indices set in a mask.
pub(crate) fn mask_columns(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(col, &set)| set.then_some(col))
        .collect()
}
