//! Content hashing for the odb object database.
//!
//! Object ids are SHA-1 digests over the canonical git serialization
//! `"<kind> <len>\0" || payload`. [`ObjectHasher`] computes them either in
//! one shot or incrementally, so large payloads never need to be copied
//! next to their header.
//!
//! Hashing is delegated to the `sha1` crate.

pub mod hasher;

pub use hasher::ObjectHasher;
