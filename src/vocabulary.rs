use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::relabel::Relabeling;

/// A bidirectional vocabulary mapping keys to dense integer ids.
///
/// Ids are handed out as `0, 1, 2, ...` in first-seen order and never change
/// once issued. Pruning does not edit the vocabulary; [`select_n_best`]
/// returns a separate [`Relabeling`] instead.
///
/// [`select_n_best`]: Vocabulary::select_n_best
#[derive(Debug, Clone)]
pub struct Vocabulary<K = String> {
    /// Map from key to ID
    key_to_id: HashMap<K, u32>,
    /// Map from ID to key
    id_to_key: Vec<K>,
}

impl<K> Vocabulary<K> {
    /// Create a new empty vocabulary
    pub fn new() -> Self {
        Self {
            key_to_id: HashMap::new(),
            id_to_key: Vec::new(),
        }
    }

    /// Get the number of registered keys
    pub fn len(&self) -> usize {
        self.id_to_key.len()
    }

    /// Returns `true` if the vocabulary contains no keys
    pub fn is_empty(&self) -> bool {
        self.id_to_key.is_empty()
    }

    /// Get the key registered under `id`
    pub fn get_word(&self, id: u32) -> Result<&K> {
        self.id_to_key.get(id as usize).ok_or(Error::Lookup {
            id,
            size: self.len(),
        })
    }

    /// Iterate over all (key, id) pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (&K, u32)> + '_ {
        self.id_to_key
            .iter()
            .enumerate()
            .map(|(id, key)| (key, id as u32))
    }

    /// Iterate over all keys in id order
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.id_to_key.iter()
    }
}

impl<K: Hash + Eq + Clone> Vocabulary<K> {
    /// Get or create an ID for a key
    /// Returns the ID for the key, registering it if it hasn't been seen yet
    pub fn get_id<Q>(&mut self, key: &Q) -> u32
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(&id) = self.key_to_id.get(key) {
            id
        } else {
            let id = self.id_to_key.len() as u32;
            self.key_to_id.insert(key.to_owned(), id);
            self.id_to_key.push(key.to_owned());
            id
        }
    }

    /// Look up the ID of a key without registering it
    pub fn lookup<Q>(&self, key: &Q) -> Option<u32>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.key_to_id.get(key).copied()
    }

    /// Returns `true` if `key` has been registered
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.key_to_id.contains_key(key)
    }

    /// Keep the `n` best features of an externally computed ranking.
    ///
    /// `ranking` lists ids most important first. The first `n` of them are
    /// mapped onto `0..n` in ranking order, so `ranking[0]` gets new id 0.
    /// `n` is clamped to the vocabulary size; a ranking shorter than `n`
    /// keeps every id it names.
    pub fn select_n_best(&self, ranking: &[u32], n: usize) -> Result<Relabeling> {
        if n == 0 {
            return Err(Error::invalid("n must be at least 1"));
        }
        let size = self.len();
        if let Some(&id) = ranking.iter().find(|&&id| id as usize >= size) {
            return Err(Error::invalid(format!(
                "ranking references unregistered id {} (vocabulary size {})",
                id, size
            )));
        }
        let n = n.min(size);
        Relabeling::from_ranking(size, ranking.iter().copied().take(n))
    }
}

impl<K> Default for Vocabulary<K> {
    fn default() -> Self {
        Self::new()
    }
}
