use std::collections::BTreeSet;
use std::hash::Hash;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::SubgraphEnumerator;
use crate::relabel::Relabeling;
use crate::select::Selector;
use crate::vocabulary::Vocabulary;

/// One extracted sample: its feature-id set and raw label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    id: String,
    features: BTreeSet<u32>,
    label: String,
}

impl SampleRecord {
    pub(crate) fn new(id: String, features: BTreeSet<u32>, label: String) -> Self {
        Self {
            id,
            features,
            label,
        }
    }

    /// Sample identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Feature ids present in the sample, ascending
    pub fn features(&self) -> &BTreeSet<u32> {
        &self.features
    }

    /// Raw label value
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A single-writer feature extraction session.
///
/// The session owns the feature vocabulary and the sample records. Records
/// keep extraction order, which becomes the row order of every matrix built
/// from the session.
#[derive(Debug, Clone)]
pub struct ExtractionSession<K = String> {
    /// Feature vocabulary
    features: Vocabulary<K>,
    /// Sample records by sample ID, in extraction order
    records: IndexMap<String, SampleRecord>,
}

impl<K> ExtractionSession<K> {
    /// Create an empty session
    pub fn new() -> Self {
        Self {
            features: Vocabulary::new(),
            records: IndexMap::new(),
        }
    }

    /// Feature vocabulary built so far
    pub fn vocabulary(&self) -> &Vocabulary<K> {
        &self.features
    }

    /// Number of extracted samples
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been extracted yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sample ids in extraction order
    pub fn roster(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.keys().map(String::as_str)
    }

    /// Sample records in extraction order
    pub fn records(&self) -> impl ExactSizeIterator<Item = &SampleRecord> + '_ {
        self.records.values()
    }

    /// Record of a single sample
    pub fn record(&self, sample_id: &str) -> Option<&SampleRecord> {
        self.records.get(sample_id)
    }

    /// Consume the session, returning its vocabulary and records
    pub fn into_parts(self) -> (Vocabulary<K>, Vec<SampleRecord>) {
        (self.features, self.records.into_values().collect())
    }
}

impl<K: Hash + Eq + Clone> ExtractionSession<K> {
    /// Extract the features of one labeled graph.
    ///
    /// Every key produced by `enumerator` is registered in the feature
    /// vocabulary in enumeration order. Fails with [`Error::DuplicateKey`],
    /// leaving the session untouched, if `sample_id` was already extracted.
    pub fn extract<E>(
        &mut self,
        enumerator: &E,
        sample_id: &str,
        graph: &E::Graph,
        label: &str,
        max_edges: usize,
    ) -> Result<&SampleRecord>
    where
        E: SubgraphEnumerator<Key = K>,
    {
        self.check_new(sample_id)?;
        let keys = enumerator.enumerate(graph, max_edges).map(|(key, _)| key);
        self.extract_keys(sample_id, keys, label)
    }

    /// Record a sample from already-enumerated feature keys
    pub fn extract_keys<I>(&mut self, sample_id: &str, keys: I, label: &str) -> Result<&SampleRecord>
    where
        I: IntoIterator<Item = K>,
    {
        self.check_new(sample_id)?;
        let mut features = BTreeSet::new();
        for key in keys {
            features.insert(self.features.get_id(&key));
        }
        debug!(
            sample = sample_id,
            features = features.len(),
            vocab_size = self.features.len(),
            "extracted sample"
        );
        let record = SampleRecord::new(sample_id.to_string(), features, label.to_string());
        let entry = self.records.entry(sample_id.to_string()).or_insert(record);
        Ok(&*entry)
    }

    /// Keep the `n` most important features of `ranking`.
    ///
    /// See [`Selector::select_top`].
    pub fn select_top(&self, n: usize, ranking: &[u32]) -> Result<Relabeling> {
        Selector::new(&self.features).select_top(n, ranking)
    }

    fn check_new(&self, sample_id: &str) -> Result<()> {
        if self.records.contains_key(sample_id) {
            return Err(Error::DuplicateKey(sample_id.to_string()));
        }
        Ok(())
    }
}

impl<K> Default for ExtractionSession<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Emit, LexGraph, LexSubgraphs};

    fn keys(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_extract_keys() {
        let mut session = ExtractionSession::new();
        session.extract_keys("s1", keys(&["a", "b", "a"]), "X").unwrap();
        session.extract_keys("s2", keys(&["b", "c"]), "Y").unwrap();

        assert_eq!(session.len(), 2);
        assert_eq!(session.vocabulary().len(), 3);
        assert_eq!(session.roster().collect::<Vec<_>>(), vec!["s1", "s2"]);

        let s1 = session.record("s1").unwrap();
        assert_eq!(s1.features().iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(s1.label(), "X");
        let s2 = session.record("s2").unwrap();
        assert_eq!(s2.features().iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_duplicate_sample_id() {
        let mut session = ExtractionSession::new();
        session.extract_keys("s1", keys(&["a"]), "X").unwrap();

        let err = session
            .extract_keys("s1", keys(&["b"]), "Y")
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(ref id) if id == "s1"));
        // nothing leaked into the session
        assert_eq!(session.len(), 1);
        assert_eq!(session.vocabulary().len(), 1);
        assert_eq!(session.record("s1").unwrap().label(), "X");
    }

    #[test]
    fn test_extract_from_graph() {
        let mut graph = LexGraph::new();
        let bark = graph.add_node("bark".to_string());
        let dog = graph.add_node("dog".to_string());
        graph.add_edge(bark, dog, "nsubj".to_string());

        let mut session = ExtractionSession::new();
        let record = session
            .extract(&LexSubgraphs::new(Emit::ALL), "s1", &graph, "pos", 1)
            .unwrap();
        assert_eq!(record.features().len(), 3);
        assert_eq!(
            session.vocabulary().get_word(2).unwrap(),
            "(bark -nsubj-> dog)"
        );

        let err = session
            .extract(&LexSubgraphs::default(), "s1", &graph, "pos", 1)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));
    }

    #[test]
    fn test_into_parts_keeps_order() {
        let mut session = ExtractionSession::new();
        session.extract_keys("b", keys(&["x"]), "1").unwrap();
        session.extract_keys("a", keys(&["y"]), "2").unwrap();

        let (vocab, records) = session.into_parts();
        assert_eq!(vocab.len(), 2);
        let ids: Vec<&str> = records.iter().map(SampleRecord::id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
