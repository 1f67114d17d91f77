use std::io;

use thiserror::Error;

/// Errors returned while serializing/deserializing compiled patterns.
#[derive(Error, Debug)]
pub enum SerializationError {
    /// The data doesn't start with the expected file header.
    #[error("not a MOA compiled pattern file")]
    InvalidFormat,

    /// The data is not a valid serialized pattern.
    #[error("invalid MOA compiled pattern file")]
    InvalidEncoding(#[from] bincode::Error),

    /// An I/O error occurred while reading or writing the data.
    #[error(transparent)]
    IoError(#[from] io::Error),
}

/// An error occurred during the compilation process.
#[derive(Error, Debug, Eq, PartialEq)]
pub enum CompileError {
    /// Compilation produced an automaton in which some state has more
    /// than one edge that could match the same input. Such patterns are
    /// rejected outright; no partially-built automaton is ever returned.
    #[error("pattern `{pattern}` does not compile to a deterministic automaton")]
    NonDeterministic {
        /// Textual description of the offending pattern.
        pattern: String,
    },
}
