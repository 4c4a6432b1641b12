//! Error types for the lineage graph.

use lode_types::RevisionId;

/// Errors that can occur during lineage graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A referenced revision was not found in the graph.
    #[error("revision not found in lineage graph: {}", .0.short_hex())]
    NodeNotFound(RevisionId),

    /// An origin reference points to a revision the graph has never seen.
    #[error(
        "dangling origin: revision {} references unknown origin {}",
        node.short_hex(),
        origin.short_hex()
    )]
    DanglingOrigin {
        /// The revision carrying the bad reference.
        node: RevisionId,
        /// The missing origin.
        origin: RevisionId,
    },

    /// Attempted to add a revision that is already in the graph.
    #[error("duplicate revision in lineage graph: {}", .0.short_hex())]
    DuplicateNode(RevisionId),

    /// A cycle was detected, which violates the graph invariant.
    #[error("lineage cycle detected involving revision {}", .0.short_hex())]
    CycleDetected(RevisionId),
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
