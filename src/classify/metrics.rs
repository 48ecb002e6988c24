use std::collections::BTreeSet;

use ndarray::ArrayView1;

use crate::error::{Error, Result};

/// Precision, recall, F-score and support of one label
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores {
    /// Label id
    pub label: u32,
    /// `tp / (tp + fp)`, 0 when nothing was predicted as `label`
    pub precision: f64,
    /// `tp / (tp + fn)`, 0 when `label` never occurs in the truth
    pub recall: f64,
    /// Harmonic mean of precision and recall, 0 when both are 0
    pub f_score: f64,
    /// Number of true occurrences of `label`
    pub support: usize,
}

fn check_lengths(y_true: &ArrayView1<u32>, y_pred: &ArrayView1<u32>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(Error::invalid(format!(
            "y_true and y_pred must have the same length ({} != {})",
            y_true.len(),
            y_pred.len()
        )));
    }
    Ok(())
}

#[inline]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Per-label precision, recall, F1 and support.
///
/// Labels are the sorted union of the labels found in `y_true` and `y_pred`.
pub fn precision_recall_fscore_support(
    y_true: ArrayView1<u32>,
    y_pred: ArrayView1<u32>,
) -> Result<Vec<ClassScores>> {
    check_lengths(&y_true, &y_pred)?;

    let labels: BTreeSet<u32> = y_true.iter().chain(y_pred.iter()).copied().collect();
    let scores = labels
        .into_iter()
        .map(|label| {
            let mut tp = 0;
            let mut fp = 0;
            let mut fn_count = 0;
            for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
                match (t == label, p == label) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_count += 1,
                    (false, false) => {}
                }
            }
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_count);
            let f_score = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassScores {
                label,
                precision,
                recall,
                f_score,
                support: tp + fn_count,
            }
        })
        .collect();
    Ok(scores)
}

/// Fraction of positions where `y_pred` equals `y_true`
pub fn accuracy(y_true: ArrayView1<u32>, y_pred: ArrayView1<u32>) -> Result<f64> {
    check_lengths(&y_true, &y_pred)?;
    if y_true.is_empty() {
        return Err(Error::invalid("cannot score empty predictions"));
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(ratio(correct, y_true.len()))
}
