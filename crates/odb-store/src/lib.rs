//! Content-addressed object repositories for odb.
//!
//! This crate models git's immutable object graph (blobs, trees, commits,
//! tags), verifies integrity on every read, and coerces a stored object into
//! the related object of a requested kind, e.g. resolving a tag or commit
//! down to the tree it designates.
//!
//! # Repositories
//!
//! Any object source implements [`Repository`]: open a verified payload
//! stream for an id, or report its header. A repository may additionally
//! implement [`Dereferencer`] to coerce objects on its own; [`dereference`]
//! prefers that and otherwise falls back to the generic [`resolve`].
//!
//! - [`Map`] -- `HashMap`-based repository for tests and embedding
//! - [`Cat`] -- wraps any repository as a [`Dereferencer`]
//!
//! # Design Rules
//!
//! 1. Objects are immutable; an object is only ever stored under the SHA-1
//!    of its canonical serialization.
//! 2. Content that does not hash to its key is reported as corrupted, never
//!    returned.
//! 3. Every call takes a [`Context`] and aborts promptly once it is cancelled.
//! 4. Failed writes leave the store untouched.

pub mod cat;
pub mod config;
pub mod context;
pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use cat::{copy_payload, dereference, resolve, Cat};
pub use config::ResolverConfig;
pub use context::Context;
pub use error::{StoreError, StoreResult};
pub use memory::Map;
pub use object::{Commit, EntryMode, Object, Tag, Tree, TreeEntry};
pub use traits::{Dereferencer, ObjectReader, Repository};

pub use odb_types::{ObjectId, ObjectKind, ObjectPrefix};
