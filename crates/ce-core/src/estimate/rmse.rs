//! RMSE scoring, overall and per variable group.

use ce_common::{Error, Result, Variables};
use nalgebra::{DMatrix, DVector};

/// Root mean squared error between two equally long slices.
pub fn calculate_rmse(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::ShapeMismatch {
            context: "rmse operands".to_string(),
            expected: a.len().to_string(),
            actual: b.len().to_string(),
        });
    }
    if a.is_empty() {
        return Err(Error::EmptySamples("rmse of empty slices".to_string()));
    }
    Ok(ce_math::rmse(a, b))
}

fn check_group_columns(variables: &Variables, ncols: usize) -> Result<()> {
    let max = variables.group_idxs().iter().flatten().copied().max();
    match max {
        Some(col) if col >= ncols => Err(Error::IndexOutOfRange {
            context: "group columns".to_string(),
            index: col,
            len: ncols,
        }),
        _ => Ok(()),
    }
}

/// RMSE per row over the columns of each group, shape `(rows, num_groups)`.
///
/// Group columns are the variable indices of the group, so `a` and `b` hold
/// one column per variable.
pub fn calculate_per_group_rmse(
    a: &DMatrix<f64>,
    b: &DMatrix<f64>,
    variables: &Variables,
) -> Result<DMatrix<f64>> {
    if a.shape() != b.shape() {
        return Err(Error::shape("per-group rmse operands", a.shape(), b.shape()));
    }
    check_group_columns(variables, a.ncols())?;

    let mut out = DMatrix::zeros(a.nrows(), variables.num_groups());
    for (group, cols) in variables.group_idxs().iter().enumerate() {
        for row in 0..a.nrows() {
            let sq: f64 = cols
                .iter()
                .map(|&col| {
                    let d = a[(row, col)] - b[(row, col)];
                    d * d
                })
                .sum();
            out[(row, group)] = (sq / cols.len() as f64).sqrt();
        }
    }
    Ok(out)
}

/// [`calculate_per_group_rmse`] for a single row.
pub fn calculate_group_rmse(
    a: &DVector<f64>,
    b: &DVector<f64>,
    variables: &Variables,
) -> Result<DVector<f64>> {
    let a = DMatrix::from_row_slice(1, a.len(), a.as_slice());
    let b = DMatrix::from_row_slice(1, b.len(), b.as_slice());
    let per_row = calculate_per_group_rmse(&a, &b, variables)?;
    Ok(per_row.row(0).transpose())
}
