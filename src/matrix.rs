use ndarray::{Array1, Array2};
use tracing::info;

use crate::error::{Error, Result};
use crate::relabel::Relabeling;
use crate::session::{ExtractionSession, SampleRecord};
use crate::vocabulary::Vocabulary;

/// A dense presence matrix with its parallel label vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureMatrix {
    /// `[samples][features]` matrix, 1 where the feature occurs in the sample
    pub x: Array2<u8>,
    /// Label id of every sample
    pub y: Array1<u32>,
    /// Selection the columns were built under
    relabeling: Option<Relabeling>,
}

impl FeatureMatrix {
    /// Number of rows
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    /// Number of columns
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Selection the columns were built under, `None` for raw feature ids
    pub fn relabeling(&self) -> Option<&Relabeling> {
        self.relabeling.as_ref()
    }

    /// Feature id behind a column
    pub fn feature_id(&self, column: u32) -> Option<u32> {
        match &self.relabeling {
            Some(relabeling) => relabeling.old_id(column),
            None => ((column as usize) < self.n_features()).then_some(column),
        }
    }
}

/// Renders sample records into a [`FeatureMatrix`].
///
/// The builder owns the label vocabulary, so label ids stay consistent
/// across every matrix it builds (e.g. a training and an evaluation split).
#[derive(Debug, Clone, Default)]
pub struct MatrixBuilder {
    labels: Vocabulary<String>,
}

impl MatrixBuilder {
    /// Create a builder with an empty label vocabulary
    pub fn new() -> Self {
        Self::default()
    }

    /// Label vocabulary filled by previous builds
    pub fn labels(&self) -> &Vocabulary<String> {
        &self.labels
    }

    /// Build the matrix of every sample in `session`.
    pub fn build<K>(
        &mut self,
        session: &ExtractionSession<K>,
        relabeling: Option<&Relabeling>,
    ) -> Result<FeatureMatrix> {
        self.build_records(session.records(), session.vocabulary().len(), relabeling)
    }

    /// Build a matrix from records in the given row order.
    ///
    /// Under a relabeling the matrix has `relabeling.new_size()` columns and
    /// pruned feature ids are skipped. Without one it has `vocab_size`
    /// columns and any recorded id `>= vocab_size` is an
    /// [`Error::IndexOutOfRange`].
    pub fn build_records<'a, I>(
        &mut self,
        records: I,
        vocab_size: usize,
        relabeling: Option<&Relabeling>,
    ) -> Result<FeatureMatrix>
    where
        I: IntoIterator<Item = &'a SampleRecord>,
    {
        let records: Vec<&SampleRecord> = records.into_iter().collect();

        // Validate before the label vocabulary is touched
        if relabeling.is_none() {
            for record in &records {
                if let Some(&id) = record.features().iter().next_back() {
                    if id as usize >= vocab_size {
                        return Err(Error::IndexOutOfRange {
                            id,
                            size: vocab_size,
                        });
                    }
                }
            }
        }

        let n_features = relabeling.map_or(vocab_size, Relabeling::new_size);
        let mut x = Array2::<u8>::zeros((records.len(), n_features));
        let mut y = Array1::<u32>::zeros(records.len());

        for (i, record) in records.iter().enumerate() {
            for &id in record.features() {
                let column = match relabeling {
                    Some(relabeling) => match relabeling.get(id) {
                        Some(new_id) => new_id,
                        None => continue,
                    },
                    None => id,
                };
                x[[i, column as usize]] = 1;
            }
            y[i] = self.labels.get_id(record.label());
        }

        info!(
            rows = records.len(),
            columns = n_features,
            relabeled = relabeling.is_some(),
            "built feature matrix"
        );
        Ok(FeatureMatrix {
            x,
            y,
            relabeling: relabeling.cloned(),
        })
    }
}
