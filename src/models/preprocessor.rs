//! Column-wise imputation and encoding feeding the classifier.
//!
//! Categorical columns: most-frequent imputation, then one-hot encoding with
//! an infrequent bucket. Numeric columns: median imputation. Output columns
//! are categorical blocks first, then numeric columns, in fit order.

use crate::error::{PipelineError, Result};
use crate::types::frame::FeatureFrame;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Categories seen fewer times than this are pooled together
pub const DEFAULT_MIN_FREQUENCY: usize = 10;

/// Most-frequent imputer plus one-hot encoder for one text column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    pub column: String,
    /// Value substituted for missing cells; `None` if the column was never observed
    pub fill_value: Option<String>,
    /// Frequent categories, sorted; one output column each
    pub categories: Vec<String>,
    /// Infrequent categories, sorted; all share the last output column
    pub infrequent: Vec<String>,
}

impl CategoricalEncoder {
    pub fn fit(column: &str, values: &[Option<String>], min_frequency: usize) -> Self {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for value in values.iter().flatten() {
            *counts.entry(value.as_str()).or_insert(0) += 1;
        }

        // Ties go to the smallest value: BTreeMap iterates in order and only
        // a strictly larger count replaces the current best.
        let mut fill: Option<(&str, usize)> = None;
        for (&value, &count) in &counts {
            if fill.map_or(true, |(_, best)| count > best) {
                fill = Some((value, count));
            }
        }
        let fill_value = fill.map(|(v, _)| v.to_string());

        let missing = values.iter().filter(|v| v.is_none()).count();
        if let Some((value, _)) = fill {
            if let Some(count) = counts.get_mut(value) {
                *count += missing;
            }
        } else {
            warn!(column = %column, "Categorical column has no observed values");
        }

        let (categories, infrequent): (Vec<_>, Vec<_>) = counts
            .into_iter()
            .partition(|(_, count)| *count >= min_frequency);

        Self {
            column: column.to_string(),
            fill_value,
            categories: categories.into_iter().map(|(v, _)| v.to_string()).collect(),
            infrequent: infrequent.into_iter().map(|(v, _)| v.to_string()).collect(),
        }
    }

    /// Number of output columns
    pub fn width(&self) -> usize {
        self.categories.len() + usize::from(!self.infrequent.is_empty())
    }

    /// Write the one-hot encoding of `value` into `out` (length `width()`).
    /// Unknown categories leave `out` all zero.
    pub fn encode_into(&self, value: Option<&str>, out: &mut [f64]) {
        out.iter_mut().for_each(|v| *v = 0.0);

        let Some(value) = value.or(self.fill_value.as_deref()) else {
            return;
        };

        if let Ok(pos) = self
            .categories
            .binary_search_by(|c| c.as_str().cmp(value))
        {
            out[pos] = 1.0;
        } else if self
            .infrequent
            .binary_search_by(|c| c.as_str().cmp(value))
            .is_ok()
        {
            out[self.categories.len()] = 1.0;
        }
    }

    pub fn output_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .categories
            .iter()
            .map(|c| format!("{}_{}", self.column, c))
            .collect();
        if !self.infrequent.is_empty() {
            names.push(format!("{}_INFREQUENT", self.column));
        }
        names
    }
}

/// Median imputer for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    pub column: String,
    pub median: f64,
}

impl MedianImputer {
    pub fn fit(column: &str, values: &[Option<f64>]) -> Self {
        let mut observed: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
        observed.sort_by(|a, b| a.total_cmp(b));

        let median = match observed.len() {
            0 => {
                warn!(column = %column, "Numeric column has no observed values, imputing 0");
                0.0
            }
            n if n % 2 == 1 => observed[n / 2],
            n => (observed[n / 2 - 1] + observed[n / 2]) / 2.0,
        };

        Self {
            column: column.to_string(),
            median,
        }
    }

    pub fn impute(&self, value: Option<f64>) -> f64 {
        value.filter(|v| v.is_finite()).unwrap_or(self.median)
    }
}

/// Fitted column transformer: categorical encoders then numeric imputers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePreprocessor {
    pub categorical: Vec<CategoricalEncoder>,
    pub numeric: Vec<MedianImputer>,
}

impl FeaturePreprocessor {
    /// Fit on a training frame. Every named column must exist with the
    /// matching kind.
    pub fn fit<S: AsRef<str>>(
        frame: &FeatureFrame,
        categorical_columns: &[S],
        numeric_columns: &[S],
        min_frequency: usize,
    ) -> Result<Self> {
        check_columns(frame, categorical_columns, numeric_columns)?;

        let categorical = categorical_columns
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let values = text_column(frame, name)?;
                Ok(CategoricalEncoder::fit(name, values, min_frequency))
            })
            .collect::<Result<Vec<_>>>()?;

        let numeric = numeric_columns
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let values = numeric_column(frame, name)?;
                Ok(MedianImputer::fit(name, values))
            })
            .collect::<Result<Vec<_>>>()?;

        let fitted = Self {
            categorical,
            numeric,
        };

        debug!(
            rows = frame.len(),
            output_width = fitted.output_width(),
            infrequent_columns = fitted
                .categorical
                .iter()
                .filter(|e| !e.infrequent.is_empty())
                .count(),
            "Preprocessor fitted"
        );

        Ok(fitted)
    }

    /// Width of the transformed design matrix
    pub fn output_width(&self) -> usize {
        self.categorical.iter().map(|e| e.width()).sum::<usize>() + self.numeric.len()
    }

    pub fn output_names(&self) -> Vec<String> {
        self.categorical
            .iter()
            .flat_map(|e| e.output_names())
            .chain(self.numeric.iter().map(|n| n.column.clone()))
            .collect()
    }

    /// Input columns the preprocessor reads, categorical first
    pub fn input_columns(&self) -> Vec<String> {
        self.categorical
            .iter()
            .map(|e| e.column.clone())
            .chain(self.numeric.iter().map(|n| n.column.clone()))
            .collect()
    }

    /// Transform a frame into the dense design matrix.
    pub fn transform(&self, frame: &FeatureFrame) -> Result<Array2<f64>> {
        let categorical_names: Vec<&str> = self.categorical.iter().map(|e| e.column.as_str()).collect();
        let numeric_names: Vec<&str> = self.numeric.iter().map(|n| n.column.as_str()).collect();
        check_columns(frame, &categorical_names, &numeric_names)?;

        let mut matrix = Array2::<f64>::zeros((frame.len(), self.output_width()));
        let mut offset = 0;

        for encoder in &self.categorical {
            let values = text_column(frame, &encoder.column)?;
            let width = encoder.width();
            let mut buffer = vec![0.0; width];
            for (row, value) in values.iter().enumerate() {
                encoder.encode_into(value.as_deref(), &mut buffer);
                for (j, v) in buffer.iter().enumerate() {
                    matrix[[row, offset + j]] = *v;
                }
            }
            offset += width;
        }

        for imputer in &self.numeric {
            let values = numeric_column(frame, &imputer.column)?;
            for (row, value) in values.iter().enumerate() {
                matrix[[row, offset]] = imputer.impute(*value);
            }
            offset += 1;
        }

        Ok(matrix)
    }
}

fn check_columns<S: AsRef<str>>(
    frame: &FeatureFrame,
    categorical_columns: &[S],
    numeric_columns: &[S],
) -> Result<()> {
    let mut missing: Vec<String> = categorical_columns
        .iter()
        .chain(numeric_columns.iter())
        .map(|c| c.as_ref())
        .filter(|c| !frame.contains(c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(PipelineError::MissingColumns(missing));
    }
    Ok(())
}

fn text_column<'a>(frame: &'a FeatureFrame, name: &str) -> Result<&'a [Option<String>]> {
    frame
        .column(name)
        .and_then(|c| c.as_text())
        .ok_or_else(|| PipelineError::InvalidInput(format!("column {} is not categorical", name)))
}

fn numeric_column<'a>(frame: &'a FeatureFrame, name: &str) -> Result<&'a [Option<f64>]> {
    frame
        .column(name)
        .and_then(|c| c.as_numeric())
        .ok_or_else(|| PipelineError::InvalidInput(format!("column {} is not numeric", name)))
}
