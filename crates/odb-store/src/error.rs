use odb_types::{ObjectId, ObjectKind, TypeError};

/// Errors from repository and resolver operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Content hash mismatch on read (data corruption).
    #[error("object {id} is corrupted: content hashes to {computed}")]
    Corrupted { id: ObjectId, computed: ObjectId },

    /// A textual object id could not be parsed.
    #[error("malformed object id {input:?}: {reason}")]
    MalformedHash { input: String, reason: String },

    /// An object kind outside blob/tree/commit/tag.
    #[error("invalid object kind {0:?}")]
    InvalidKind(String),

    /// A declared length that is negative or does not fit in memory.
    #[error("object size {0} out of range")]
    SizeOutOfRange(i64),

    /// Fewer bytes were available than the header declared.
    #[error("truncated object: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// The resolver reached an object that cannot satisfy the request.
    #[error("object {id} is a {found}, not a {wanted}")]
    UnexpectedKind {
        id: ObjectId,
        found: ObjectKind,
        wanted: ObjectKind,
    },

    /// A tag declared its target as one kind but the target is another.
    #[error("object {id} was declared as a {declared} but is a {found}")]
    TypeMismatch {
        id: ObjectId,
        declared: ObjectKind,
        found: ObjectKind,
    },

    /// A tag points at a kind that can never yield the requested kind.
    #[error("tag {id} references a {target}, which cannot be resolved to a {wanted}")]
    UnsupportedReference {
        id: ObjectId,
        target: ObjectKind,
        wanted: ObjectKind,
    },

    /// A `"<kind> <len>\0"` object header could not be parsed. No id is known
    /// yet at this point, since the id is computed over the header.
    #[error("malformed object header: {0}")]
    MalformedHeader(String),

    /// A commit, tag, or tree payload could not be parsed.
    #[error("malformed object {id}: {reason}")]
    MalformedObject { id: ObjectId, reason: String },

    /// The dereference chain exceeded the configured hop limit.
    #[error("dereferencing {id} exceeded {limit} hops")]
    DereferenceDepthExceeded { id: ObjectId, limit: usize },

    /// The execution context was cancelled or its deadline passed.
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error from the underlying source or destination.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::MalformedHash { input, reason } => Self::MalformedHash { input, reason },
            TypeError::InvalidKind(kind) => Self::InvalidKind(kind),
            TypeError::SizeOutOfRange(size) => Self::SizeOutOfRange(size),
            TypeError::MalformedHeader(reason) => Self::MalformedHeader(reason),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
