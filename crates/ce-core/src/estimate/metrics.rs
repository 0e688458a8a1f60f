//! Evaluation summaries.

use ce_math::{mean, population_std};
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

/// Log-probability of interventional test data, per dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentDataLogProb {
    pub all_mean: f64,
    pub all_std: f64,
    pub per_intervention_mean: Vec<f64>,
    pub per_intervention_std: Vec<f64>,
}

/// ATE RMSEs, one row per intervention and one column per variable group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AteRmseMetrics {
    pub group_rmses: DMatrix<f64>,
}

impl AteRmseMetrics {
    pub fn new(group_rmses: DMatrix<f64>) -> Self {
        Self { group_rmses }
    }

    pub fn n_interventions(&self) -> usize {
        self.group_rmses.nrows()
    }

    pub fn n_groups(&self) -> usize {
        self.group_rmses.ncols()
    }

    pub fn get_rmse(&self, intervention_idx: usize, group_idx: usize) -> Option<f64> {
        self.group_rmses.get((intervention_idx, group_idx)).copied()
    }

    /// Mean over interventions, one value per group.
    pub fn across_interventions(&self) -> DVector<f64> {
        column_means(&self.group_rmses)
    }

    /// Mean over groups, one value per intervention.
    pub fn across_groups(&self) -> DVector<f64> {
        row_means(&self.group_rmses)
    }

    /// Mean over everything.
    pub fn all(&self) -> f64 {
        mean(self.group_rmses.as_slice())
    }
}

/// ITE RMSEs: for each intervention a `(n_samples, n_groups)` matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IteRmseMetrics {
    pub group_rmses: Vec<DMatrix<f64>>,
}

impl IteRmseMetrics {
    pub fn new(group_rmses: Vec<DMatrix<f64>>) -> Self {
        Self { group_rmses }
    }

    pub fn n_interventions(&self) -> usize {
        self.group_rmses.len()
    }

    pub fn n_groups(&self) -> usize {
        self.group_rmses.first().map_or(0, DMatrix::ncols)
    }

    /// Sample-averaged RMSEs, shape `(n_interventions, n_groups)`.
    pub fn average_ite_rmses(&self) -> DMatrix<f64> {
        let n_groups = self.n_groups();
        DMatrix::from_fn(self.n_interventions(), n_groups, |i, g| {
            self.get_rmse(i, g).unwrap_or(f64::NAN)
        })
    }

    /// Sample-averaged RMSE for one intervention and group.
    pub fn get_rmse(&self, intervention_idx: usize, group_idx: usize) -> Option<f64> {
        let per_sample = self.group_rmses.get(intervention_idx)?;
        (group_idx < per_sample.ncols()).then(|| per_sample.column(group_idx).mean())
    }

    /// Sample-averaged RMSE std over samples for one intervention and group.
    pub fn get_rmse_std(&self, intervention_idx: usize, group_idx: usize) -> Option<f64> {
        let per_sample = self.group_rmses.get(intervention_idx)?;
        (group_idx < per_sample.ncols()).then(|| {
            let column: Vec<f64> = per_sample.column(group_idx).iter().copied().collect();
            population_std(&column)
        })
    }

    pub fn across_interventions(&self) -> DVector<f64> {
        column_means(&self.average_ite_rmses())
    }

    pub fn across_groups(&self) -> DVector<f64> {
        row_means(&self.average_ite_rmses())
    }

    pub fn all(&self) -> f64 {
        mean(self.average_ite_rmses().as_slice())
    }
}

fn column_means(m: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(
        m.ncols(),
        m.column_iter().map(|c| mean(&c.iter().copied().collect::<Vec<_>>())),
    )
}

fn row_means(m: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(
        m.nrows(),
        m.row_iter().map(|r| mean(&r.iter().copied().collect::<Vec<_>>())),
    )
}
