use std::io;

use thiserror::Error;

/// Errors raised while encoding, selecting, classifying or persisting features
#[derive(Debug, Error)]
pub enum Error {
    /// An id outside `[0, size)` was looked up
    #[error("id {id} is out of range for a vocabulary of size {size}")]
    Lookup {
        /// Requested id
        id: u32,
        /// Vocabulary size at lookup time
        size: usize,
    },
    /// A caller supplied an argument that violates an operation's contract
    #[error("{0}")]
    InvalidArgument(String),
    /// A sample identifier was extracted twice within one session
    #[error("sample {0:?} has already been extracted")]
    DuplicateKey(String),
    /// A recorded feature id does not fit the live vocabulary.
    ///
    /// This means the vocabulary and the sample records went out of sync and
    /// the session should be discarded.
    #[error("feature id {id} exceeds vocabulary size {size}")]
    IndexOutOfRange {
        /// Offending feature id
        id: u32,
        /// Live vocabulary size
        size: usize,
    },
    /// A persisted vocabulary could not be decoded
    #[error("invalid vocabulary format: {0}")]
    Format(String),
    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type used throughout this crate
pub type Result<T, E = Error> = std::result::Result<T, E>;
