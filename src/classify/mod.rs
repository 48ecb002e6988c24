//! Classifier side of the pipeline
//!
//! The encoding engine only talks to a classifier through [`Classifier`] and
//! [`ImportanceRanker`]. [`DecisionTreeClassifier`] implements both.

use ndarray::{Array1, Array2};

use crate::error::Result;

mod metrics;
mod tree;

pub use self::metrics::{accuracy, precision_recall_fscore_support, ClassScores};
pub use self::tree::{DecisionTreeClassifier, TreeParams};

/// Fit/predict contract over presence matrices and label-id vectors
pub trait Classifier {
    /// Fit the classifier to `x` (one row per sample) and label ids `y`
    fn fit(&mut self, x: &Array2<u8>, y: &Array1<u32>) -> Result<()>;

    /// Predict a label id for every row of `x`
    fn predict(&self, x: &Array2<u8>) -> Result<Array1<u32>>;
}

/// Ranks the input dimensions of a fitted model.
pub trait ImportanceRanker {
    /// Importance weight of every column the model was fitted on
    fn importances(&self) -> Result<Vec<f64>>;

    /// Every column id, most important first; ties keep ascending column order
    fn rank_importance(&self) -> Result<Vec<u32>> {
        let importances = self.importances()?;
        let mut ranking: Vec<u32> = (0..importances.len() as u32).collect();
        ranking.sort_by(|&a, &b| {
            importances[b as usize]
                .total_cmp(&importances[a as usize])
                .then(a.cmp(&b))
        });
        Ok(ranking)
    }
}

/// Predictions together with their per-class scores
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Predicted label id of every row
    pub predictions: Array1<u32>,
    /// Scores of every label seen in the truth or the predictions
    pub scores: Vec<ClassScores>,
}

/// Predict `x` and score the predictions against `y`
pub fn evaluate<C: Classifier + ?Sized>(
    classifier: &C,
    x: &Array2<u8>,
    y: &Array1<u32>,
) -> Result<Evaluation> {
    let predictions = classifier.predict(x)?;
    let scores = precision_recall_fscore_support(y.view(), predictions.view())?;
    Ok(Evaluation {
        predictions,
        scores,
    })
}
