//! Foundation types for the odb object database.
//!
//! Every object in odb is addressed by the SHA-1 digest of its canonical
//! git serialization. This crate holds the value types shared by every other
//! odb crate and has no behavior beyond parsing, formatting, and equality.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- 20-byte content address, rendered as 40 lowercase hex characters
//! - [`ObjectKind`] -- the closed set {blob, tree, commit, tag}
//! - [`ObjectPrefix`] -- an object header: kind plus payload length

pub mod error;
pub mod kind;
pub mod object;

pub use error::TypeError;
pub use kind::{ObjectKind, ObjectPrefix};
pub use object::ObjectId;
