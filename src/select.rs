use std::hash::Hash;

use tracing::info;

use crate::error::Result;
use crate::relabel::Relabeling;
use crate::vocabulary::Vocabulary;

/// Importance-based feature selection over a vocabulary snapshot.
///
/// Selection is a pure function of the vocabulary, the ranking and `n`:
/// selecting twice with the same inputs yields equal relabelings.
#[derive(Debug, Clone, Copy)]
pub struct Selector<'v, K> {
    vocab: &'v Vocabulary<K>,
}

impl<'v, K: Hash + Eq + Clone> Selector<'v, K> {
    /// Create a selector over `vocab`
    pub fn new(vocab: &'v Vocabulary<K>) -> Self {
        Self { vocab }
    }

    /// Keep the `n` best features of `ranking` (most important first).
    pub fn select_top(&self, n: usize, ranking: &[u32]) -> Result<Relabeling> {
        let relabeling = self.vocab.select_n_best(ranking, n)?;
        info!(
            requested = n,
            retained = relabeling.new_size(),
            vocab_size = self.vocab.len(),
            "selected features"
        );
        Ok(relabeling)
    }

    /// Keys of the retained features, indexed by new id
    pub fn selected_keys(&self, relabeling: &Relabeling) -> Result<Vec<&'v K>> {
        relabeling
            .inverse()
            .iter()
            .map(|&old_id| self.vocab.get_word(old_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn vocab(keys: &[&str]) -> Vocabulary<String> {
        let mut vocab = Vocabulary::new();
        for key in keys {
            vocab.get_id(*key);
        }
        vocab
    }

    #[test]
    fn test_select_top_is_idempotent() {
        let vocab = vocab(&["a", "b", "c", "d"]);
        let selector = Selector::new(&vocab);
        let first = selector.select_top(3, &[2, 0, 3, 1]).unwrap();
        let second = selector.select_top(3, &[2, 0, 3, 1]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_selected_keys() {
        let vocab = vocab(&["a", "b", "c"]);
        let selector = Selector::new(&vocab);
        let relabeling = selector.select_top(2, &[1, 2, 0]).unwrap();
        let keys = selector.selected_keys(&relabeling).unwrap();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_selected_keys_from_other_vocabulary() {
        let big = vocab(&["a", "b", "c"]);
        let small = vocab(&["a"]);
        let relabeling = Selector::new(&big).select_top(1, &[2]).unwrap();
        assert!(matches!(
            Selector::new(&small).selected_keys(&relabeling),
            Err(Error::Lookup { id: 2, size: 1 })
        ));
    }
}
