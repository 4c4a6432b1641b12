//! Node type for the lineage graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lode_types::{RevisionRef, RunId};

/// One entry in the lineage arena.
///
/// Nodes are immutable once appended. Origin edges are stored as arena
/// indices strictly less than the node's own index, so they always point
/// at revisions that were recorded earlier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineageNode {
    /// The revision this node represents.
    pub revision: RevisionRef,
    /// The run that produced this revision.
    pub run_id: RunId,
    /// When the revision was recorded.
    pub created_at: DateTime<Utc>,
    /// Arena indices of the origin revisions, each strictly less than this
    /// node's own index.
    pub(crate) origins: Vec<usize>,
}

impl LineageNode {
    pub(crate) fn new(
        revision: RevisionRef,
        run_id: RunId,
        created_at: DateTime<Utc>,
        origins: Vec<usize>,
    ) -> Self {
        Self {
            revision,
            run_id,
            created_at,
            origins,
        }
    }

    /// Returns `true` if this revision has no origins (a source artifact).
    pub fn is_root(&self) -> bool {
        self.origins.is_empty()
    }

    /// Arena indices of this node's origins.
    pub fn origin_indices(&self) -> &[usize] {
        &self.origins
    }
}
