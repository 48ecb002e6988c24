//! Subgraph features for lexical graph classification
//!
//! Labeled lexical graphs are turned into sets of subgraph keys, the keys are
//! mapped to dense feature ids through a [`Vocabulary`], and the resulting
//! samples are rendered as a binary presence matrix for a classifier. Once a
//! classifier is fitted its importance ranking can shrink the feature space
//! to the `n` best features through a [`Relabeling`].
//!
//! # Examples
//!
//! ```no_run
//! use graph_feat::{GraphModel, LexGraph};
//!
//! let mut graph = LexGraph::new();
//! let bark = graph.add_node("bark".to_string());
//! let dog = graph.add_node("dog".to_string());
//! graph.add_edge(bark, dog, "nsubj".to_string());
//!
//! let mut model = GraphModel::new();
//! model.featurize("s1", &graph, "animal")?;
//!
//! let train = model.train_matrix()?;
//! model.fit(&train)?;
//! model.select_n_best(2)?;
//!
//! let reduced = model.train_matrix()?;
//! model.fit(&reduced)?;
//! println!("{:?}", model.selected_feature_names()?);
//! # Ok::<(), graph_feat::Error>(())
//! ```

mod error;
mod graph;
mod matrix;
mod model;
mod relabel;
mod select;
mod session;
mod store;
mod vocabulary;

/// Classifier contract, the decision tree and scoring helpers
pub mod classify;

pub use self::error::{Error, Result};
pub use self::graph::{Emit, LexGraph, LexSubgraphs, Subgraph, SubgraphEnumerator};
pub use self::matrix::{FeatureMatrix, MatrixBuilder};
pub use self::model::{GraphModel, ModelConfig};
pub use self::relabel::Relabeling;
pub use self::select::Selector;
pub use self::session::{ExtractionSession, SampleRecord};
pub use self::vocabulary::Vocabulary;
