//! Binary logistic regression with balanced class weights and L2 penalty.
//!
//! Fitting happens on standardized features; the learned coefficients are
//! mapped back to the raw feature scale, so prediction takes the untouched
//! output of the preprocessor.

use crate::error::{PipelineError, Result};
use crate::types::prediction::Label;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Solver settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticParams {
    /// Inverse regularization strength
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the gradient norm drops below this
    pub tolerance: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 2000,
            tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Sorted class labels; the second one is the positive class
    classes: Vec<Label>,
    coefficients: Array1<f64>,
    intercept: f64,
    n_iter: usize,
    converged: bool,
}

impl LogisticRegression {
    /// Fit on a design matrix and its labels.
    pub fn fit(x: &Array2<f64>, y: &[Label], params: &LogisticParams) -> Result<Self> {
        let (n, d) = x.dim();
        if n == 0 {
            return Err(PipelineError::EmptyDataset("no training rows".to_string()));
        }
        if n != y.len() {
            return Err(PipelineError::InvalidInput(format!(
                "design matrix has {} rows but {} labels were given",
                n,
                y.len()
            )));
        }

        let mut classes: Vec<Label> = y.to_vec();
        classes.sort();
        classes.dedup();

        if classes.len() < 2 {
            warn!(
                classes = ?classes,
                "Training data holds a single class, fitting a constant classifier"
            );
            return Ok(Self {
                classes,
                coefficients: Array1::zeros(d),
                intercept: 0.0,
                n_iter: 0,
                converged: true,
            });
        }

        let positive = classes[1];
        let targets: Array1<f64> = y
            .iter()
            .map(|label| if *label == positive { 1.0 } else { 0.0 })
            .collect();

        // Balanced weights: n_samples / (n_classes * class_count)
        let positives = targets.sum();
        let negatives = n as f64 - positives;
        let weight_pos = n as f64 / (2.0 * positives);
        let weight_neg = n as f64 / (2.0 * negatives);
        let sample_weights: Array1<f64> = targets.mapv(|t| if t > 0.5 { weight_pos } else { weight_neg });
        let total_weight = sample_weights.sum();

        let (means, scales) = standardization(x);
        let xs = (x - &means) / &scales;

        let alpha = 1.0 / (params.c * total_weight);
        let objective = Objective {
            x: xs.view(),
            targets: &targets,
            sample_weights: &sample_weights,
            total_weight,
            alpha,
        };

        let mut w = Array1::<f64>::zeros(d);
        let mut b = 0.0;
        let mut step = 1.0;
        let mut converged = false;
        let mut n_iter = 0;

        for iter in 0..params.max_iter {
            n_iter = iter + 1;
            let (loss, grad_w, grad_b) = objective.loss_and_gradient(&w, b);
            let grad_norm_sq = grad_w.dot(&grad_w) + grad_b * grad_b;

            if grad_norm_sq.sqrt() < params.tolerance {
                converged = true;
                break;
            }

            // Backtracking line search (Armijo condition)
            loop {
                let w_next = &w - &(&grad_w * step);
                let b_next = b - grad_b * step;
                let next_loss = objective.loss(&w_next, b_next);
                if next_loss <= loss - 0.5 * step * grad_norm_sq || step < 1e-12 {
                    w = w_next;
                    b = b_next;
                    break;
                }
                step *= 0.5;
            }
            step = (step * 2.0).min(1e3);
        }

        if converged {
            debug!(iterations = n_iter, "Logistic regression converged");
        } else {
            warn!(
                iterations = n_iter,
                "Logistic regression reached max_iter without converging"
            );
        }

        // Map back to the raw feature scale
        let coefficients = &w / &scales;
        let intercept = b - coefficients.dot(&means);

        info!(
            features = d,
            rows = n,
            positive_class = %positive,
            iterations = n_iter,
            converged = converged,
            "Classifier fitted"
        );

        Ok(Self {
            classes,
            coefficients,
            intercept,
            n_iter,
            converged,
        })
    }

    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Raw decision values (log-odds of the positive class)
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(PipelineError::InvalidInput(format!(
                "expected {} features, got {}",
                self.coefficients.len(),
                x.ncols()
            )));
        }
        Ok(x.dot(&self.coefficients) + self.intercept)
    }

    /// Class probabilities, one column per entry of `classes()`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let decision = self.decision_function(x)?;
        let mut proba = Array2::<f64>::zeros((x.nrows(), self.classes.len()));

        if self.classes.len() == 1 {
            proba.fill(1.0);
            return Ok(proba);
        }

        for (i, z) in decision.iter().enumerate() {
            let p = sigmoid(*z);
            proba[[i, 0]] = 1.0 - p;
            proba[[i, 1]] = p;
        }
        Ok(proba)
    }

    /// Most probable class per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<Label>> {
        let decision = self.decision_function(x)?;
        Ok(decision
            .iter()
            .map(|z| {
                if self.classes.len() > 1 && *z > 0.0 {
                    self.classes[1]
                } else {
                    self.classes[0]
                }
            })
            .collect())
    }
}

struct Objective<'a> {
    x: ArrayView2<'a, f64>,
    targets: &'a Array1<f64>,
    sample_weights: &'a Array1<f64>,
    total_weight: f64,
    alpha: f64,
}

impl Objective<'_> {
    fn loss(&self, w: &Array1<f64>, b: f64) -> f64 {
        let z = self.x.dot(w) + b;
        let data_loss: f64 = z
            .iter()
            .zip(self.targets.iter())
            .zip(self.sample_weights.iter())
            .map(|((z, t), s)| s * (softplus(*z) - t * z))
            .sum();
        data_loss / self.total_weight + 0.5 * self.alpha * w.dot(w)
    }

    fn loss_and_gradient(&self, w: &Array1<f64>, b: f64) -> (f64, Array1<f64>, f64) {
        let loss = self.loss(w, b);
        let z = self.x.dot(w) + b;
        let residual: Array1<f64> = z
            .iter()
            .zip(self.targets.iter())
            .zip(self.sample_weights.iter())
            .map(|((z, t), s)| s * (sigmoid(*z) - t) / self.total_weight)
            .collect();

        let grad_w = self.x.t().dot(&residual) + &(w * self.alpha);
        let grad_b = residual.sum();
        (loss, grad_w, grad_b)
    }
}

/// Column means and standard deviations; constant columns get scale 1.
fn standardization(x: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    let means = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let scales = x.std_axis(Axis(0), 0.0).mapv(|s| if s > 1e-12 { s } else { 1.0 });
    (means, scales)
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// ln(1 + e^z) without overflow
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Vec<Label>) {
        let x = array![
            [1.0, 0.0, 2020.0],
            [1.0, 0.0, 2020.0],
            [1.0, 0.0, 2019.0],
            [1.0, 0.0, 2020.0],
            [0.0, 1.0, 2020.0],
            [0.0, 1.0, 2019.0],
            [0.0, 1.0, 2020.0],
            [0.0, 1.0, 2020.0],
        ];
        let y = vec![
            Label::Integral,
            Label::Integral,
            Label::Integral,
            Label::Integral,
            Label::Parcial,
            Label::Parcial,
            Label::Parcial,
            Label::Parcial,
        ];
        (x, y)
    }

    #[test]
    fn test_fits_separable_data() {
        let (x, y) = separable();
        let model = LogisticRegression::fit(&x, &y, &LogisticParams::default()).unwrap();

        assert_eq!(model.classes(), &[Label::Integral, Label::Parcial]);
        assert_eq!(model.predict(&x).unwrap(), y);

        let proba = model.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
        assert!(proba[[0, 0]] > 0.5);
        assert!(proba[[7, 1]] > 0.5);
    }

    #[test]
    fn test_balanced_weights_counter_imbalance() {
        // Feature carries no signal; balanced weights keep the intercept
        // neutral despite a 3:1 label ratio.
        let x = Array2::<f64>::zeros((8, 1));
        let mut y = vec![Label::Parcial; 6];
        y.extend([Label::Integral, Label::Integral]);
        let model = LogisticRegression::fit(&x, &y, &LogisticParams::default()).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert!((proba[[0, 0]] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_single_class_is_constant() {
        let x = Array2::<f64>::ones((3, 2));
        let model =
            LogisticRegression::fit(&x, &[Label::Parcial; 3], &LogisticParams::default()).unwrap();
        assert_eq!(model.classes(), &[Label::Parcial]);
        assert_eq!(model.predict(&x).unwrap(), vec![Label::Parcial; 3]);
        assert_eq!(model.predict_proba(&x).unwrap().ncols(), 1);
    }

    #[test]
    fn test_feature_count_mismatch() {
        let (x, y) = separable();
        let model = LogisticRegression::fit(&x, &y, &LogisticParams::default()).unwrap();
        let wrong = Array2::<f64>::zeros((1, 2));
        assert!(matches!(
            model.predict_proba(&wrong),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_numerics_are_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
        assert!(sigmoid(-800.0) >= 0.0 && sigmoid(800.0) <= 1.0);
        assert!(softplus(800.0).is_finite());
        assert!((softplus(0.0) - 2f64.ln()).abs() < 1e-12);
    }
}
