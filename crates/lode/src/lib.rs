//! High-level API for the lode artifact store.
//!
//! [`Store`] wires a storage backend, a transformer pipeline, a codec
//! registry and a lineage graph into one handle. Values written through a
//! [`RunContext`] automatically carry provenance: every write records the
//! revisions read so far in the run as its origin set.
//!
//! ```no_run
//! use lode::{Selector, Store};
//! use lode_types::BoxId;
//!
//! let store = Store::in_memory();
//! let raw = BoxId::new("ingest/raw")?;
//!
//! let mut run = store.begin_run();
//! store.write_in(&mut run, &raw, "hello")?;
//! let value = store.read_in(&mut run, &raw, Selector::Latest)?;
//! assert_eq!(value.as_text(), Some("hello"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod run;
pub mod store;

pub use error::{LodeError, LodeResult};
pub use run::RunContext;
pub use store::{Selector, Store};

// Re-export key types
pub use lode_graph::LineageNode;
pub use lode_pipe::{Pipeline, Transformer};
pub use lode_store::{FileBackend, InMemoryBackend, StorageBackend};
pub use lode_types::{BoxId, Metadata, Revision, RevisionId, RevisionRef, RunId};
pub use lode_values::{CodecRegistry, Value, ValueCodec};
