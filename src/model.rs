use ndarray::Array1;

use crate::classify::{evaluate, Classifier, DecisionTreeClassifier, Evaluation, ImportanceRanker};
use crate::error::{Error, Result};
use crate::graph::{Emit, LexGraph, LexSubgraphs, SubgraphEnumerator};
use crate::matrix::{FeatureMatrix, MatrixBuilder};
use crate::relabel::Relabeling;
use crate::select::Selector;
use crate::session::{ExtractionSession, SampleRecord};
use crate::vocabulary::Vocabulary;

/// Feature extraction settings.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    max_edges: usize,
    emit: Emit,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_edges: 1,
            emit: Emit::ALL,
        }
    }
}

impl ModelConfig {
    /// Largest number of edges in an extracted subgraph
    pub fn max_edges(&self) -> usize {
        self.max_edges
    }

    /// Set the largest subgraph size, at least 1
    pub fn set_max_edges(&mut self, max_edges: usize) -> Result<()> {
        if max_edges < 1 {
            return Err(Error::invalid("max_edges must be at least 1"));
        }
        self.max_edges = max_edges;
        Ok(())
    }

    /// Kinds of subgraphs turned into features
    pub fn emit(&self) -> Emit {
        self.emit
    }

    /// Set the emitted subgraph kinds, at least one
    pub fn set_emit(&mut self, emit: Emit) -> Result<()> {
        if emit.is_empty() {
            return Err(Error::invalid("emit must select nodes, edges or both"));
        }
        self.emit = emit;
        Ok(())
    }

    /// Set maximum subgraph size (builder pattern)
    pub fn with_max_edges(mut self, max_edges: usize) -> Result<Self> {
        self.set_max_edges(max_edges)?;
        Ok(self)
    }

    /// Set emitted subgraph kinds (builder pattern)
    pub fn with_emit(mut self, emit: Emit) -> Result<Self> {
        self.set_emit(emit)?;
        Ok(self)
    }
}

/// Subgraph-feature classifier over lexical graphs.
///
/// Ties an extraction session, a matrix builder and a classifier together:
/// featurize labeled graphs, build the training matrix, fit, then optionally
/// shrink the feature space to the classifier's most important features and
/// refit on the reduced matrix.
#[derive(Debug, Clone)]
pub struct GraphModel<C = DecisionTreeClassifier> {
    config: ModelConfig,
    enumerator: LexSubgraphs,
    session: ExtractionSession<String>,
    builder: MatrixBuilder,
    /// Active feature selection
    relabeling: Option<Relabeling>,
    /// Selection of the matrix the classifier was last fitted on; `None`
    /// until [`GraphModel::fit`] succeeds
    fitted_on: Option<Option<Relabeling>>,
    classifier: C,
}

impl GraphModel<DecisionTreeClassifier> {
    /// Create a model with default settings and a decision tree seeded with 1234
    pub fn new() -> Self {
        Self::with_classifier(ModelConfig::default(), DecisionTreeClassifier::new())
    }
}

impl Default for GraphModel<DecisionTreeClassifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> GraphModel<C> {
    /// Create a model around an arbitrary classifier
    pub fn with_classifier(config: ModelConfig, classifier: C) -> Self {
        Self {
            enumerator: LexSubgraphs::new(config.emit()),
            config,
            session: ExtractionSession::new(),
            builder: MatrixBuilder::new(),
            relabeling: None,
            fitted_on: None,
            classifier,
        }
    }

    /// Extraction settings
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Featurized samples and the feature vocabulary
    pub fn session(&self) -> &ExtractionSession<String> {
        &self.session
    }

    /// Feature vocabulary
    pub fn vocabulary(&self) -> &Vocabulary<String> {
        self.session.vocabulary()
    }

    /// Label vocabulary
    pub fn labels(&self) -> &Vocabulary<String> {
        self.builder.labels()
    }

    /// Wrapped classifier
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Mutable access to the wrapped classifier.
    ///
    /// Fitting through this reference bypasses [`GraphModel::fit`], so the
    /// model does not learn which columns the classifier was fitted on.
    pub fn classifier_mut(&mut self) -> &mut C {
        &mut self.classifier
    }

    /// Active feature selection, if any
    pub fn relabeling(&self) -> Option<&Relabeling> {
        self.relabeling.as_ref()
    }

    /// Number of matrix columns under the active selection
    pub fn vocab_size(&self) -> usize {
        self.relabeling
            .as_ref()
            .map_or(self.vocabulary().len(), Relabeling::new_size)
    }

    /// Extract the features of a labeled graph
    pub fn featurize(&mut self, sample_id: &str, graph: &LexGraph, label: &str) -> Result<()> {
        self.session.extract(
            &self.enumerator,
            sample_id,
            graph,
            label,
            self.config.max_edges(),
        )?;
        Ok(())
    }

    /// Every feature key, by feature id
    pub fn feature_names(&self) -> Vec<&str> {
        self.vocabulary().keys().map(String::as_str).collect()
    }

    /// Keys of the columns under the active selection
    pub fn selected_feature_names(&self) -> Result<Vec<&str>> {
        match &self.relabeling {
            Some(relabeling) => Ok(Selector::new(self.vocabulary())
                .selected_keys(relabeling)?
                .into_iter()
                .map(String::as_str)
                .collect()),
            None => Ok(self.feature_names()),
        }
    }

    /// Drop the active selection; later matrices use every feature again
    pub fn clear_selection(&mut self) -> Option<Relabeling> {
        self.relabeling.take()
    }

    /// Matrix of every featurized sample under the active selection
    pub fn train_matrix(&mut self) -> Result<FeatureMatrix> {
        self.builder.build(&self.session, self.relabeling.as_ref())
    }

    /// Encode unseen graphs against the current vocabulary.
    ///
    /// Subgraphs whose key was never registered are ignored; the vocabulary
    /// does not grow. Labels go through the same label vocabulary as the
    /// training matrix.
    pub fn transform(&mut self, samples: &[(&LexGraph, &str)]) -> Result<FeatureMatrix> {
        let max_edges = self.config.max_edges();
        let vocab = self.session.vocabulary();
        let records: Vec<SampleRecord> = samples
            .iter()
            .enumerate()
            .map(|(i, (graph, label))| {
                let features = self
                    .enumerator
                    .enumerate(graph, max_edges)
                    .filter_map(|(key, _)| vocab.lookup(key.as_str()))
                    .collect();
                SampleRecord::new(i.to_string(), features, label.to_string())
            })
            .collect();
        self.builder
            .build_records(&records, vocab.len(), self.relabeling.as_ref())
    }

    /// Raw label behind a label id
    pub fn label_name(&self, id: u32) -> Result<&str> {
        self.labels().get_word(id).map(String::as_str)
    }
}

impl<C: Classifier> GraphModel<C> {
    /// Fit the classifier and remember the selection `data` was built under
    pub fn fit(&mut self, data: &FeatureMatrix) -> Result<()> {
        self.classifier.fit(&data.x, &data.y)?;
        self.fitted_on = Some(data.relabeling().cloned());
        Ok(())
    }

    /// Predict a label id for every row of `data`
    pub fn predict(&self, data: &FeatureMatrix) -> Result<Array1<u32>> {
        self.classifier.predict(&data.x)
    }

    /// Predict `data` and score the predictions per label
    pub fn evaluate(&self, data: &FeatureMatrix) -> Result<Evaluation> {
        evaluate(&self.classifier, &data.x, &data.y)
    }
}

impl<C: Classifier + ImportanceRanker> GraphModel<C> {
    /// Feature id behind every column of the last fitted matrix
    fn fitted_feature_id(&self, column: u32) -> Result<u32> {
        let fitted_on = self
            .fitted_on
            .as_ref()
            .ok_or_else(|| Error::invalid("model has not been fitted"))?;
        match fitted_on {
            Some(relabeling) => relabeling.old_id(column).ok_or_else(|| {
                Error::invalid(format!("ranking references unknown column {}", column))
            }),
            None => Ok(column),
        }
    }

    /// Keep the `n` features the fitted classifier ranks highest.
    ///
    /// The classifier ranks the columns of the matrix it was last fitted on,
    /// so those columns are mapped back to feature ids through the selection
    /// that matrix was built under, whatever selection is active now. The new
    /// selection replaces the active one.
    pub fn select_n_best(&mut self, n: usize) -> Result<&Relabeling> {
        let ranking = self
            .classifier
            .rank_importance()?
            .into_iter()
            .map(|column| self.fitted_feature_id(column))
            .collect::<Result<Vec<u32>>>()?;
        let relabeling = self.session.select_top(n, &ranking)?;
        Ok(&*self.relabeling.insert(relabeling))
    }

    /// Importance weight of every fitted feature, most important first
    pub fn feature_weights(&self) -> Result<Vec<(&str, f64)>> {
        let importances = self.classifier.importances()?;
        let vocab = self.vocabulary();
        self.classifier
            .rank_importance()?
            .into_iter()
            .map(|column| {
                let key = vocab.get_word(self.fitted_feature_id(column)?)?;
                Ok((key.as_str(), importances[column as usize]))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(subject: &str, verb: &str) -> LexGraph {
        let mut graph = LexGraph::new();
        let v = graph.add_node(verb.to_string());
        let s = graph.add_node(subject.to_string());
        graph.add_edge(v, s, "nsubj".to_string());
        graph
    }

    #[test]
    fn test_config_validation() {
        let mut config = ModelConfig::default();
        assert_eq!(config.max_edges(), 1);
        let err = config.set_max_edges(0).unwrap_err();
        assert_eq!(err.to_string(), "max_edges must be at least 1");
        assert!(config.set_emit(Emit::empty()).is_err());
        assert!(ModelConfig::default().with_max_edges(3).is_ok());
    }

    #[test]
    fn test_featurize_and_names() {
        let mut model = GraphModel::new();
        model.featurize("s1", &sentence("dog", "bark"), "animal").unwrap();
        model.featurize("s2", &sentence("car", "honk"), "vehicle").unwrap();

        assert_eq!(
            model.feature_names(),
            vec![
                "(bark)",
                "(dog)",
                "(bark -nsubj-> dog)",
                "(honk)",
                "(car)",
                "(honk -nsubj-> car)",
            ]
        );
        assert!(matches!(
            model.featurize("s1", &sentence("cat", "purr"), "animal"),
            Err(Error::DuplicateKey(_))
        ));
    }

    #[test]
    fn test_transform_ignores_unknown_keys() {
        let mut model = GraphModel::new();
        model.featurize("s1", &sentence("dog", "bark"), "animal").unwrap();
        let train = model.train_matrix().unwrap();

        let unseen = sentence("dog", "sleep");
        let test = model.transform(&[(&unseen, "animal")]).unwrap();
        assert_eq!(test.n_features(), train.n_features());
        assert_eq!(test.x.row(0).to_vec(), vec![0, 1, 0]);
        assert_eq!(test.y.to_vec(), vec![0]);
        assert_eq!(model.vocabulary().len(), 3);
    }

    #[test]
    fn test_select_requires_fit() {
        let mut model = GraphModel::new();
        model.featurize("s1", &sentence("dog", "bark"), "animal").unwrap();
        assert!(model.select_n_best(1).is_err());
        assert!(model.feature_weights().is_err());
        assert!(model.relabeling().is_none());
    }

    #[test]
    fn test_classifier_fitted_outside_model() {
        let mut model = GraphModel::new();
        model.featurize("s1", &sentence("dog", "bark"), "animal").unwrap();
        model.featurize("s2", &sentence("car", "honk"), "vehicle").unwrap();
        let train = model.train_matrix().unwrap();
        model.classifier_mut().fit(&train.x, &train.y).unwrap();

        // The model cannot tell which columns the classifier saw
        let err = model.select_n_best(1).unwrap_err();
        assert_eq!(err.to_string(), "model has not been fitted");
    }
}
