//! In-memory lineage graph for the lode artifact store.
//!
//! Tracks origin edges between revisions within one store handle. Supports
//! ancestor and descendant traversal, root enumeration and per-box history.
//! The graph is a derived index: the durable record of lineage is the
//! origin list inside each persisted revision manifest, from which the
//! graph can always be rebuilt.

pub mod error;
pub mod graph;
pub mod node;

pub use error::{GraphError, GraphResult};
pub use graph::LineageGraph;
pub use node::LineageNode;
