use std::collections::BTreeMap;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::{Classifier, ImportanceRanker};
use crate::error::{Error, Result};

const MIN_DECREASE: f64 = 1e-12;

/// Decision tree parameters.
#[derive(Debug, Clone)]
pub struct TreeParams {
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    random_state: u64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            random_state: 1234,
        }
    }
}

impl TreeParams {
    /// Maximum tree depth, `None` for unbounded
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Set the maximum depth, at least 1 when bounded
    pub fn set_max_depth(&mut self, max_depth: Option<usize>) -> Result<()> {
        if max_depth == Some(0) {
            return Err(Error::invalid("max_depth must be at least 1"));
        }
        self.max_depth = max_depth;
        Ok(())
    }

    /// Minimum number of samples a node needs to be split
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Set the split threshold, at least 2
    pub fn set_min_samples_split(&mut self, min_samples_split: usize) -> Result<()> {
        if min_samples_split < 2 {
            return Err(Error::invalid("min_samples_split must be at least 2"));
        }
        self.min_samples_split = min_samples_split;
        Ok(())
    }

    /// Minimum number of samples on each side of a split
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Set the leaf size, at least 1
    pub fn set_min_samples_leaf(&mut self, min_samples_leaf: usize) -> Result<()> {
        if min_samples_leaf < 1 {
            return Err(Error::invalid("min_samples_leaf must be at least 1"));
        }
        self.min_samples_leaf = min_samples_leaf;
        Ok(())
    }

    /// Seed of the feature visiting order
    pub fn random_state(&self) -> u64 {
        self.random_state
    }

    /// Set the seed of the feature visiting order
    pub fn set_random_state(&mut self, random_state: u64) {
        self.random_state = random_state;
    }

    /// Set a parameter by name.
    ///
    /// `max_depth` accepts `none` for an unbounded tree.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "max_depth" => {
                let depth = if value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(parse(name, value)?)
                };
                self.set_max_depth(depth)
            }
            "min_samples_split" => self.set_min_samples_split(parse(name, value)?),
            "min_samples_leaf" => self.set_min_samples_leaf(parse(name, value)?),
            "random_state" => {
                self.set_random_state(parse(name, value)?);
                Ok(())
            }
            _ => Err(Error::invalid(format!("unknown parameter: {}", name))),
        }
    }

    /// Get a parameter value by name
    pub fn get(&self, name: &str) -> Result<String> {
        match name {
            "max_depth" => Ok(self
                .max_depth
                .map_or_else(|| "none".to_string(), |d| d.to_string())),
            "min_samples_split" => Ok(self.min_samples_split.to_string()),
            "min_samples_leaf" => Ok(self.min_samples_leaf.to_string()),
            "random_state" => Ok(self.random_state.to_string()),
            _ => Err(Error::invalid(format!("unknown parameter: {}", name))),
        }
    }
}

fn parse<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::invalid(format!("invalid value for {}: {}", name, value)))
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        class: u32,
    },
    Split {
        feature: usize,
        absent: Box<TreeNode>,
        present: Box<TreeNode>,
    },
}

impl TreeNode {
    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split {
                absent, present, ..
            } => 1 + absent.depth().max(present.depth()),
        }
    }

    fn leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split {
                absent, present, ..
            } => absent.leaves() + present.leaves(),
        }
    }
}

/// A candidate split on one presence column
struct Split {
    feature: usize,
    present: Vec<usize>,
    absent: Vec<usize>,
    /// Weighted impurity decrease, `n * gini - n_present * gini_present - n_absent * gini_absent`
    decrease: f64,
}

/// Grows a tree over the rows of a presence matrix
struct Grower<'a> {
    x: &'a Array2<u8>,
    y: &'a Array1<u32>,
    params: &'a TreeParams,
    rng: StdRng,
    importances: Vec<f64>,
}

impl<'a> Grower<'a> {
    fn class_counts(&self, rows: &[usize]) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for &row in rows {
            *counts.entry(self.y[row]).or_insert(0) += 1;
        }
        counts
    }

    fn gini(&self, rows: &[usize]) -> f64 {
        gini(&self.class_counts(rows), rows.len())
    }

    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> TreeNode {
        let counts = self.class_counts(&rows);
        let class = majority(&counts);
        let impurity = gini(&counts, rows.len());

        let depth_reached = self.params.max_depth.map_or(false, |max| depth >= max);
        if impurity <= 0.0 || rows.len() < self.params.min_samples_split || depth_reached {
            return TreeNode::Leaf { class };
        }

        match self.best_split(&rows, impurity) {
            Some(split) => {
                self.importances[split.feature] += split.decrease;
                let absent = self.grow(split.absent, depth + 1);
                let present = self.grow(split.present, depth + 1);
                TreeNode::Split {
                    feature: split.feature,
                    absent: Box::new(absent),
                    present: Box::new(present),
                }
            }
            None => TreeNode::Leaf { class },
        }
    }

    /// Best split over a seeded shuffle of the columns; the first column
    /// visited wins ties.
    fn best_split(&mut self, rows: &[usize], impurity: f64) -> Option<Split> {
        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        features.shuffle(&mut self.rng);

        let x = self.x;
        let min_leaf = self.params.min_samples_leaf;
        let n = rows.len() as f64;
        let mut best: Option<Split> = None;

        for feature in features {
            let (present, absent): (Vec<usize>, Vec<usize>) =
                rows.iter().partition(|&&row| x[[row, feature]] != 0);
            if present.len() < min_leaf || absent.len() < min_leaf {
                continue;
            }
            let weighted = present.len() as f64 * self.gini(&present)
                + absent.len() as f64 * self.gini(&absent);
            let decrease = n * impurity - weighted;
            if decrease <= MIN_DECREASE {
                continue;
            }
            if best
                .as_ref()
                .map_or(true, |b| decrease > b.decrease + MIN_DECREASE)
            {
                best = Some(Split {
                    feature,
                    present,
                    absent,
                    decrease,
                });
            }
        }
        best
    }
}

fn gini(counts: &BTreeMap<u32, usize>, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Most frequent class, the smallest label on ties
fn majority(counts: &BTreeMap<u32, usize>) -> u32 {
    let mut best = (0, 0);
    for (&label, &count) in counts {
        if count > best.1 {
            best = (label, count);
        }
    }
    best.0
}

/// CART decision tree over presence matrices.
///
/// Every split tests whether one feature is present. Splits minimize Gini
/// impurity; feature importances are the normalized total impurity decrease
/// each feature contributed.
#[derive(Debug, Clone, Default)]
pub struct DecisionTreeClassifier {
    params: TreeParams,
    root: Option<TreeNode>,
    n_features: usize,
    importances: Vec<f64>,
}

impl DecisionTreeClassifier {
    /// Create an unfitted tree with default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unfitted tree with the given parameters
    pub fn with_params(params: TreeParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Set maximum depth (builder pattern)
    pub fn with_max_depth(mut self, max_depth: usize) -> Result<Self> {
        self.params.set_max_depth(Some(max_depth))?;
        Ok(self)
    }

    /// Set the shuffling seed (builder pattern)
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.params.set_random_state(random_state);
        self
    }

    /// Get tree parameters
    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Get tree parameters for mutation
    pub fn params_mut(&mut self) -> &mut TreeParams {
        &mut self.params
    }

    /// Returns `true` once [`Classifier::fit`] has succeeded
    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    /// Depth of the fitted tree
    pub fn depth(&self) -> Option<usize> {
        self.root.as_ref().map(TreeNode::depth)
    }

    /// Normalized feature importances of the fitted tree, indexed by column
    pub fn feature_importances(&self) -> Option<&[f64]> {
        self.root.as_ref().map(|_| self.importances.as_slice())
    }

    fn predict_row(node: &TreeNode, x: &Array2<u8>, row: usize) -> u32 {
        let mut node = node;
        loop {
            match node {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split {
                    feature,
                    absent,
                    present,
                } => {
                    node = if x[[row, *feature]] != 0 {
                        &**present
                    } else {
                        &**absent
                    };
                }
            }
        }
    }
}

impl Classifier for DecisionTreeClassifier {
    fn fit(&mut self, x: &Array2<u8>, y: &Array1<u32>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(Error::invalid(format!(
                "x and y must have the same number of samples ({} != {})",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(Error::invalid("no training data"));
        }

        let mut grower = Grower {
            x,
            y,
            params: &self.params,
            rng: StdRng::seed_from_u64(self.params.random_state),
            importances: vec![0.0; x.ncols()],
        };
        let root = grower.grow((0..x.nrows()).collect(), 0);
        let mut importances = grower.importances;

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for importance in &mut importances {
                *importance /= total;
            }
        }

        debug!(
            samples = x.nrows(),
            features = x.ncols(),
            depth = root.depth(),
            leaves = root.leaves(),
            "grew decision tree"
        );
        self.root = Some(root);
        self.n_features = x.ncols();
        self.importances = importances;
        Ok(())
    }

    fn predict(&self, x: &Array2<u8>) -> Result<Array1<u32>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| Error::invalid("classifier has not been fitted"))?;
        if x.ncols() != self.n_features {
            return Err(Error::invalid(format!(
                "expected {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok((0..x.nrows())
            .map(|row| Self::predict_row(root, x, row))
            .collect())
    }
}

impl ImportanceRanker for DecisionTreeClassifier {
    fn importances(&self) -> Result<Vec<f64>> {
        self.feature_importances()
            .map(<[f64]>::to_vec)
            .ok_or_else(|| Error::invalid("classifier has not been fitted"))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};

    use super::*;

    #[test]
    fn test_fit_predict_separable() {
        let x = arr2(&[[1u8, 0], [1, 0], [0, 1], [0, 1]]);
        let y = arr1(&[0u32, 0, 1, 1]);

        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
        assert_eq!(tree.depth(), Some(1));

        // either column separates the classes on its own
        let ranking = tree.rank_importance().unwrap();
        let importances = tree.feature_importances().unwrap();
        assert!((importances[ranking[0] as usize] - 1.0).abs() < 1e-12);
        assert_eq!(importances[ranking[1] as usize], 0.0);
    }

    #[test]
    fn test_constant_column_is_never_split() {
        let x = arr2(&[[1u8, 0], [1, 0], [1, 1], [1, 1]]);
        let y = arr1(&[0u32, 0, 1, 1]);

        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.rank_importance().unwrap(), vec![1, 0]);
        assert_eq!(tree.feature_importances().unwrap(), &[0.0, 1.0]);
    }

    #[test]
    fn test_same_seed_same_tree() {
        let x = arr2(&[[1u8, 1, 0], [1, 1, 0], [0, 0, 1], [0, 0, 1], [1, 0, 1]]);
        let y = arr1(&[0u32, 0, 1, 1, 2]);

        let mut first = DecisionTreeClassifier::new().with_random_state(7);
        let mut second = DecisionTreeClassifier::new().with_random_state(7);
        first.fit(&x, &y).unwrap();
        second.fit(&x, &y).unwrap();
        assert_eq!(
            first.rank_importance().unwrap(),
            second.rank_importance().unwrap()
        );
        assert_eq!(first.predict(&x).unwrap(), second.predict(&x).unwrap());
    }

    #[test]
    fn test_max_depth() {
        let x = arr2(&[[1u8, 0], [1, 1], [0, 1], [0, 0]]);
        let y = arr1(&[0u32, 1, 2, 3]);

        let mut tree = DecisionTreeClassifier::new().with_max_depth(1).unwrap();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.depth(), Some(1));

        let mut full = DecisionTreeClassifier::new();
        full.fit(&x, &y).unwrap();
        assert_eq!(full.depth(), Some(2));
        assert_eq!(full.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_pure_labels_make_a_leaf() {
        let x = arr2(&[[1u8], [0]]);
        let y = arr1(&[4u32, 4]);
        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.depth(), Some(0));
        assert_eq!(tree.feature_importances().unwrap(), &[0.0]);
        assert_eq!(tree.predict(&arr2(&[[1u8]])).unwrap(), arr1(&[4u32]));
    }

    #[test]
    fn test_unfitted_and_mismatched() {
        let tree = DecisionTreeClassifier::new();
        assert!(tree.predict(&arr2(&[[1u8]])).is_err());
        assert!(tree.rank_importance().is_err());

        let mut tree = DecisionTreeClassifier::new();
        let err = tree
            .fit(&arr2(&[[1u8], [0]]), &arr1(&[0u32]))
            .unwrap_err();
        assert!(err.to_string().contains("same number of samples"));

        tree.fit(&arr2(&[[1u8], [0]]), &arr1(&[0u32, 1])).unwrap();
        assert!(tree.predict(&arr2(&[[1u8, 0]])).is_err());
    }

    #[test]
    fn test_empty_training_data() {
        let mut tree = DecisionTreeClassifier::new();
        let x = Array2::<u8>::zeros((0, 3));
        let y = Array1::<u32>::zeros(0);
        assert_eq!(tree.fit(&x, &y).unwrap_err().to_string(), "no training data");
    }

    #[test]
    fn test_params_by_name() {
        let mut params = TreeParams::default();
        params.set("max_depth", "3").unwrap();
        assert_eq!(params.get("max_depth").unwrap(), "3");
        params.set("max_depth", "none").unwrap();
        assert_eq!(params.max_depth(), None);
        params.set("random_state", "42").unwrap();
        assert_eq!(params.random_state(), 42);
        assert!(params.set("min_samples_leaf", "0").is_err());
    }
}
