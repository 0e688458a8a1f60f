//! Interventions and ground-truth intervention datasets.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// A `do(X_idxs = values)` intervention on graph nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Intervention {
    idxs: Vec<usize>,
    values: DVector<f64>,
}

impl Intervention {
    pub fn new(idxs: Vec<usize>, values: DVector<f64>) -> Result<Self> {
        if idxs.len() != values.len() {
            return Err(Error::ShapeMismatch {
                context: "intervention values".to_string(),
                expected: idxs.len().to_string(),
                actual: values.len().to_string(),
            });
        }
        Ok(Self { idxs, values })
    }

    pub fn idxs(&self) -> &[usize] {
        &self.idxs
    }

    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }
}

/// An intervention paired with samples drawn from the ground-truth process
/// under that intervention.
///
/// For counterfactual datasets `conditioning_values` holds the factual
/// (baseline) samples and `reference_data` the samples under the reference
/// treatment.
#[derive(Debug, Clone)]
pub struct InterventionData {
    intervention_idxs: Vec<usize>,
    intervention_values: Option<DVector<f64>>,
    intervention_reference: Option<DVector<f64>>,
    test_data: DMatrix<f64>,
    conditioning_idxs: Option<Vec<usize>>,
    conditioning_values: Option<DMatrix<f64>>,
    effect_idxs: Option<Vec<usize>>,
    reference_data: Option<DMatrix<f64>>,
}

impl InterventionData {
    pub fn new(
        intervention_idxs: Vec<usize>,
        intervention_values: Option<DVector<f64>>,
        test_data: DMatrix<f64>,
    ) -> Result<Self> {
        if let Some(values) = &intervention_values {
            check_len("intervention values", intervention_idxs.len(), values.len())?;
        }
        Ok(Self {
            intervention_idxs,
            intervention_values,
            intervention_reference: None,
            test_data,
            conditioning_idxs: None,
            conditioning_values: None,
            effect_idxs: None,
            reference_data: None,
        })
    }

    /// Reference treatment values, one per intervened node.
    pub fn with_reference(mut self, reference: DVector<f64>) -> Result<Self> {
        check_len(
            "intervention reference",
            self.intervention_idxs.len(),
            reference.len(),
        )?;
        self.intervention_reference = Some(reference);
        Ok(self)
    }

    /// Conditioning nodes and the values they are conditioned on.
    ///
    /// Each row of `values` is one conditioning point unless the dataset is a
    /// counterfactual one, in which case rows are full factual samples.
    pub fn with_conditioning(mut self, idxs: Vec<usize>, values: DMatrix<f64>) -> Self {
        self.conditioning_idxs = Some(idxs);
        self.conditioning_values = Some(values);
        self
    }

    /// Factual samples for counterfactual evaluation, without conditioning nodes.
    pub fn with_factual_samples(mut self, samples: DMatrix<f64>) -> Self {
        self.conditioning_values = Some(samples);
        self
    }

    pub fn with_effects(mut self, idxs: Vec<usize>) -> Self {
        self.effect_idxs = Some(idxs);
        self
    }

    pub fn with_reference_data(mut self, data: DMatrix<f64>) -> Result<Self> {
        if data.ncols() != self.test_data.ncols() {
            return Err(Error::shape(
                "reference data",
                (data.nrows(), self.test_data.ncols()),
                data.shape(),
            ));
        }
        self.reference_data = Some(data);
        Ok(self)
    }

    pub fn intervention_idxs(&self) -> &[usize] {
        &self.intervention_idxs
    }

    pub fn intervention_values(&self) -> Option<&DVector<f64>> {
        self.intervention_values.as_ref()
    }

    pub fn intervention_reference(&self) -> Option<&DVector<f64>> {
        self.intervention_reference.as_ref()
    }

    pub fn test_data(&self) -> &DMatrix<f64> {
        &self.test_data
    }

    pub fn conditioning_idxs(&self) -> Option<&[usize]> {
        self.conditioning_idxs.as_deref()
    }

    pub fn conditioning_values(&self) -> Option<&DMatrix<f64>> {
        self.conditioning_values.as_ref()
    }

    pub fn effect_idxs(&self) -> Option<&[usize]> {
        self.effect_idxs.as_deref()
    }

    pub fn reference_data(&self) -> Option<&DMatrix<f64>> {
        self.reference_data.as_ref()
    }

    /// The intervention as a checked [`Intervention`]; fails when no values
    /// were recorded.
    pub fn intervention(&self) -> Result<Intervention> {
        let values = self.intervention_values.clone().ok_or_else(|| {
            Error::InvalidInput("intervention dataset has no intervention values".to_string())
        })?;
        Intervention::new(self.intervention_idxs.clone(), values)
    }
}

fn check_len(context: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::ShapeMismatch {
            context: context.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}
