//! Variable metadata.
//!
//! A [`Variables`] table describes the columns of every sample matrix the
//! estimators see. It is read-only once built and answers two kinds of
//! lookups:
//!
//! - which columns belong to a variable or a variable group, both in the
//!   unprocessed layout (one column per variable) and in the processed layout
//!   (categorical variables expanded to one-hot spans);
//! - the `(lower, upper)` bounds used to normalise continuous columns.
//!
//! Groups are the nodes of the causal graph. A variable without a
//! `group_name` forms a group of its own.

use std::collections::HashSet;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Most categories a categorical variable may span.
pub const MAX_CATEGORIES: usize = 10_000;

/// Kind of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Continuous,
    Binary,
    Categorical,
}

/// A single variable descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    #[serde(default)]
    pub group_name: Option<String>,
    pub lower: f64,
    pub upper: f64,
}

impl Variable {
    pub fn continuous(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            var_type: VariableType::Continuous,
            group_name: None,
            lower,
            upper,
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_type: VariableType::Binary,
            group_name: None,
            lower: 0.0,
            upper: 1.0,
        }
    }

    /// Categorical variable taking integer values in `[lower, upper]`.
    pub fn categorical(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            var_type: VariableType::Categorical,
            group_name: None,
            lower,
            upper,
        }
    }

    /// Attach the variable to a named group.
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group_name = Some(group.into());
        self
    }

    /// Number of columns this variable occupies in processed data.
    pub fn processed_dim(&self) -> usize {
        match self.var_type {
            VariableType::Categorical => (self.upper - self.lower).round() as usize + 1,
            VariableType::Continuous | VariableType::Binary => 1,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("variable name must not be empty".to_string());
        }
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(format!("variable '{}' has non-finite bounds", self.name));
        }
        if self.lower > self.upper {
            return Err(format!(
                "variable '{}' has lower bound {} above upper bound {}",
                self.name, self.lower, self.upper
            ));
        }
        if self.var_type == VariableType::Continuous && self.lower == self.upper {
            return Err(format!(
                "continuous variable '{}' has an empty range [{}, {}]",
                self.name, self.lower, self.upper
            ));
        }
        if self.var_type == VariableType::Categorical
            && (self.upper - self.lower).round() >= MAX_CATEGORIES as f64
        {
            return Err(format!(
                "categorical variable '{}' spans more than {} categories",
                self.name, MAX_CATEGORIES
            ));
        }
        Ok(())
    }
}

/// Ordered, validated table of variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Variable>", into = "Vec<Variable>")]
pub struct Variables {
    variables: Vec<Variable>,
    processed_cols: Vec<Vec<usize>>,
    group_names: Vec<String>,
    group_idxs: Vec<Vec<usize>>,
}

impl Variables {
    /// Build a table, validating every variable.
    pub fn new(variables: Vec<Variable>) -> Result<Self> {
        let mut seen = HashSet::new();
        for variable in &variables {
            variable.validate().map_err(Error::InvalidVariables)?;
            if !seen.insert(variable.name.as_str()) {
                return Err(Error::InvalidVariables(format!(
                    "duplicate variable name '{}'",
                    variable.name
                )));
            }
        }

        let mut processed_cols = Vec::with_capacity(variables.len());
        let mut next_col = 0usize;
        for variable in &variables {
            let width = variable.processed_dim();
            processed_cols.push((next_col..next_col + width).collect());
            next_col += width;
        }

        let mut group_names: Vec<String> = Vec::new();
        let mut group_idxs: Vec<Vec<usize>> = Vec::new();
        for (idx, variable) in variables.iter().enumerate() {
            let group = variable
                .group_name
                .clone()
                .unwrap_or_else(|| variable.name.clone());
            match group_names.iter().position(|name| *name == group) {
                Some(pos) => group_idxs[pos].push(idx),
                None => {
                    group_names.push(group);
                    group_idxs.push(vec![idx]);
                }
            }
        }

        Ok(Self {
            variables,
            processed_cols,
            group_names,
            group_idxs,
        })
    }

    /// Parse a JSON array of variables.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Variable> {
        self.variables.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }

    /// Total number of columns in processed data.
    pub fn num_processed_cols(&self) -> usize {
        self.processed_cols.iter().map(Vec::len).sum()
    }

    /// Processed column indices of each variable.
    pub fn processed_cols(&self) -> &[Vec<usize>] {
        &self.processed_cols
    }

    pub fn num_unprocessed_cols(&self) -> usize {
        self.variables.len()
    }

    /// Unprocessed column indices of each variable (one column each).
    pub fn unprocessed_cols(&self) -> Vec<Vec<usize>> {
        (0..self.variables.len()).map(|idx| vec![idx]).collect()
    }

    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    /// Variable indices belonging to each group.
    pub fn group_idxs(&self) -> &[Vec<usize>] {
        &self.group_idxs
    }

    pub fn num_groups(&self) -> usize {
        self.group_names.len()
    }

    /// Boolean mask of shape `(num_groups, num_processed_cols)`.
    pub fn group_mask(&self) -> DMatrix<bool> {
        let mut mask = DMatrix::from_element(self.num_groups(), self.num_processed_cols(), false);
        for (group, members) in self.group_idxs.iter().enumerate() {
            for &var_idx in members {
                for &col in &self.processed_cols[var_idx] {
                    mask[(group, col)] = true;
                }
            }
        }
        mask
    }

    /// New table holding only the listed variables, in the listed order.
    pub fn subset(&self, idxs: &[usize]) -> Result<Variables> {
        let picked = idxs
            .iter()
            .map(|&idx| {
                self.variables
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| Error::IndexOutOfRange {
                        context: "variables".to_string(),
                        index: idx,
                        len: self.variables.len(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Variables::new(picked)
    }
}

impl TryFrom<Vec<Variable>> for Variables {
    type Error = Error;

    fn try_from(variables: Vec<Variable>) -> Result<Self> {
        Variables::new(variables)
    }
}

impl From<Variables> for Vec<Variable> {
    fn from(variables: Variables) -> Self {
        variables.variables
    }
}

impl<'a> IntoIterator for &'a Variables {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}
