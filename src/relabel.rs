use crate::error::{Error, Result};

/// An id-space-shrinking map produced by feature selection.
///
/// Retained old ids map onto the dense range `0..new_size()`; every other
/// old id has no new id and is dropped from matrices built under this
/// relabeling. Once built it never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relabeling {
    /// Map from old ID to new ID, indexed by old ID
    forward: Vec<Option<u32>>,
    /// Map from new ID to old ID
    inverse: Vec<u32>,
}

impl Relabeling {
    /// Build a relabeling over `old_size` ids keeping `retained` in order.
    pub(crate) fn from_ranking<I>(old_size: usize, retained: I) -> Result<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut forward: Vec<Option<u32>> = vec![None; old_size];
        let mut inverse = Vec::new();

        for old_id in retained {
            let slot = forward.get_mut(old_id as usize).ok_or_else(|| {
                Error::invalid(format!(
                    "ranking references unregistered id {} (vocabulary size {})",
                    old_id, old_size
                ))
            })?;
            if slot.is_some() {
                return Err(Error::invalid(format!(
                    "ranking lists id {} more than once",
                    old_id
                )));
            }
            *slot = Some(inverse.len() as u32);
            inverse.push(old_id);
        }

        Ok(Self { forward, inverse })
    }

    /// Number of retained features
    pub fn new_size(&self) -> usize {
        self.inverse.len()
    }

    /// Size of the id space this relabeling was computed from
    pub fn old_size(&self) -> usize {
        self.forward.len()
    }

    /// Returns `true` if no feature survived
    pub fn is_empty(&self) -> bool {
        self.inverse.is_empty()
    }

    /// New id of `old_id`, or `None` if it was pruned
    pub fn get(&self, old_id: u32) -> Option<u32> {
        self.forward.get(old_id as usize).copied().flatten()
    }

    /// Old id behind `new_id`
    pub fn old_id(&self, new_id: u32) -> Option<u32> {
        self.inverse.get(new_id as usize).copied()
    }

    /// Old ids indexed by new id
    pub fn inverse(&self) -> &[u32] {
        &self.inverse
    }

    /// Iterate over (old id, new id) pairs in new-id order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.inverse
            .iter()
            .enumerate()
            .map(|(new_id, &old_id)| (old_id, new_id as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relabeling_bijection() {
        let relabel = Relabeling::from_ranking(5, vec![3, 0, 4]).unwrap();
        assert_eq!(relabel.old_size(), 5);
        assert_eq!(relabel.new_size(), 3);

        for (old_id, new_id) in relabel.iter() {
            assert_eq!(relabel.get(old_id), Some(new_id));
            assert_eq!(relabel.old_id(new_id), Some(old_id));
        }
        assert_eq!(relabel.get(3), Some(0));
        assert_eq!(relabel.get(1), None);
        assert_eq!(relabel.get(2), None);
        assert_eq!(relabel.old_id(3), None);
    }

    #[test]
    fn test_ids_past_old_size_are_dropped() {
        let relabel = Relabeling::from_ranking(2, vec![1]).unwrap();
        assert_eq!(relabel.get(7), None);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Relabeling::from_ranking(3, vec![2, 2]).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_empty_relabeling() {
        let relabel = Relabeling::from_ranking(3, Vec::new()).unwrap();
        assert!(relabel.is_empty());
        assert_eq!(relabel.iter().count(), 0);
    }
}
