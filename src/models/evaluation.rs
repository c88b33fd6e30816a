//! Hold-out evaluation: classification report and ROC-AUC

use crate::types::prediction::Label;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub per_class: Vec<(Label, ClassMetrics)>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Build the report over every label present in truth or predictions.
    /// Undefined ratios (zero denominators) count as 0.
    pub fn new(truth: &[Label], predicted: &[Label]) -> Self {
        let mut labels: Vec<Label> = truth.iter().chain(predicted.iter()).copied().collect();
        labels.sort();
        labels.dedup();

        let per_class: Vec<(Label, ClassMetrics)> = labels
            .iter()
            .map(|&label| {
                let pairs = || truth.iter().zip(predicted.iter());
                let tp = pairs().filter(|(t, p)| **t == label && **p == label).count();
                let predicted_pos = predicted.iter().filter(|p| **p == label).count();
                let support = truth.iter().filter(|t| **t == label).count();

                let precision = ratio(tp, predicted_pos);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                (
                    label,
                    ClassMetrics {
                        precision,
                        recall,
                        f1,
                        support,
                    },
                )
            })
            .collect();

        let correct = truth.iter().zip(predicted.iter()).filter(|(t, p)| t == p).count();
        let total = truth.len();
        let n_classes = per_class.len().max(1) as f64;

        let macro_avg = ClassMetrics {
            precision: per_class.iter().map(|(_, m)| m.precision).sum::<f64>() / n_classes,
            recall: per_class.iter().map(|(_, m)| m.recall).sum::<f64>() / n_classes,
            f1: per_class.iter().map(|(_, m)| m.f1).sum::<f64>() / n_classes,
            support: total,
        };

        let weighted = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                per_class
                    .iter()
                    .map(|(_, m)| f(m) * m.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        Self {
            per_class,
            accuracy: ratio(correct, total),
            macro_avg,
            weighted_avg,
        }
    }

    pub fn class(&self, label: Label) -> Option<&ClassMetrics> {
        self.per_class
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, m)| m)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (label, m) in &self.per_class {
            writeln!(
                f,
                "{:>14} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                label.as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.4} {:>10}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Area under the ROC curve via the rank-sum statistic, with average ranks
/// for tied scores. `None` unless both classes are present.
pub fn roc_auc(is_positive: &[bool], scores: &[f64]) -> Option<f64> {
    let n = is_positive.len().min(scores.len());
    let n_pos = is_positive[..n].iter().filter(|p| **p).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based average rank for the tie group
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = rank;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = (0..n).filter(|&k| is_positive[k]).map(|k| ranks[k]).sum();
    let u = pos_rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Some(u / (n_pos * n_neg) as f64)
}
