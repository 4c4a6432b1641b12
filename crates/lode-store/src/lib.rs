//! Storage backends for the lode artifact store.
//!
//! This crate implements the raw persistence layer: content-addressed
//! artifact bytes plus their revision manifests, keyed by
//! `(box id, revision id)`, and the one piece of mutable state in the
//! system, the per-box latest pointer.
//!
//! # Backends
//!
//! All backends implement the [`StorageBackend`] trait:
//!
//! - [`InMemoryBackend`] -- `HashMap`-based store for tests and embedding
//! - [`FileBackend`] -- sharded on-disk layout with temp-then-rename writes
//!
//! # Design Rules
//!
//! 1. Artifacts are immutable once written (content-addressing guarantees
//!    this); `put` on an existing key is a no-op.
//! 2. `put` is atomic: a concurrent `get`/`exists` sees either nothing or
//!    the complete artifact, never a partial write.
//! 3. The latest pointer is last-write-wins; racing writers only race on
//!    currency, never on content.
//! 4. The store never interprets artifact bytes -- transformers and codecs
//!    live above it.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FileBackend;
pub use memory::InMemoryBackend;
pub use traits::StorageBackend;
