//! Notes lookup for odb.
//!
//! Git notes attach auxiliary content to a commit without rewriting it. The
//! notes live in a tree keyed by the commit's hex id, sharded into fanout
//! directories of two hex characters each: the note for `abcdef...` may be
//! stored as `abcdef...`, `ab/cdef...`, `ab/cd/ef...`, and so on.
//!
//! # Modules
//!
//! - [`error`] -- Error types for notes lookups
//! - [`notes`] -- [`find_note`] and [`notes_for_commit`]

pub mod error;
pub mod notes;

pub use error::{NotesError, Result};
pub use notes::{find_note, notes_for_commit, NoteLocation};
