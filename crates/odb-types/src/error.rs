use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("malformed object id {input:?}: {reason}")]
    MalformedHash { input: String, reason: String },

    #[error("invalid object kind {0:?}")]
    InvalidKind(String),

    #[error("object size {0} out of range")]
    SizeOutOfRange(i64),

    #[error("malformed object header: {0}")]
    MalformedHeader(String),
}
