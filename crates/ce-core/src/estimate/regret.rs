//! Regret of observed outcomes against attainable maxima.

use ce_common::{Error, Result, Variables};
use nalgebra::{DMatrix, DVector};

use super::samples::{get_mask_from_idxs, mask_columns};

/// `regret(x) = max_values(x) - observed outcome`, one value per row of `x`.
///
/// `x` uses the processed layout and `target_idx` is a group index whose
/// processed columns must reduce to a single outcome column.
pub fn calculate_regret(
    variables: &Variables,
    x: &DMatrix<f64>,
    target_idx: usize,
    max_values: &DVector<f64>,
) -> Result<DVector<f64>> {
    let mask = get_mask_from_idxs(&[target_idx], &variables.group_mask())?;
    let target_cols = mask_columns(&mask);
    let col = match target_cols.as_slice() {
        [col] => *col,
        _ => {
            return Err(Error::ShapeMismatch {
                context: format!("regret target {target_idx} columns"),
                expected: "1".to_string(),
                actual: target_cols.len().to_string(),
            })
        }
    };
    if x.ncols() != mask.len() {
        return Err(Error::shape("regret contexts", (x.nrows(), mask.len()), x.shape()));
    }
    if max_values.len() != x.nrows() {
        return Err(Error::ShapeMismatch {
            context: "regret max values".to_string(),
            expected: x.nrows().to_string(),
            actual: max_values.len().to_string(),
        });
    }
    Ok(max_values - x.column(col))
}
