//! Content hashing for the lode artifact store.
//!
//! BLAKE3 everywhere, chosen for collision resistance: revision identity and
//! corruption detection both treat collisions as impossible, so the hash has
//! to be cryptographic, not fast-but-weak.

pub mod hasher;

pub use hasher::{hash_revision, ContentHasher, HasherError};
