use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::box_id::BoxId;
use crate::metadata::Metadata;
use crate::revision::RevisionId;
use crate::run::RunId;

/// A `(box, revision)` pair: the unit of lineage edges and read-sets.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RevisionRef {
    /// The box the revision belongs to.
    pub box_id: BoxId,
    /// The content-addressed revision id.
    pub revision_id: RevisionId,
}

impl RevisionRef {
    /// Create a new revision reference.
    pub fn new(box_id: BoxId, revision_id: RevisionId) -> Self {
        Self {
            box_id,
            revision_id,
        }
    }
}

impl std::fmt::Display for RevisionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.box_id, self.revision_id.short_hex())
    }
}

/// Immutable manifest describing one stored revision of a box.
///
/// The manifest is persisted alongside the transformed bytes and never
/// changes after the write completes. It carries everything needed to
/// reconstruct the value (value-type descriptor, transformer metadata) and
/// to answer provenance queries (origin set, producing run).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// The box this revision belongs to.
    pub box_id: BoxId,
    /// Content-addressed id of the transformed bytes.
    pub revision_id: RevisionId,
    /// Descriptor of the value codec used on write (e.g. `"text:utf-8"`).
    pub value_type: String,
    /// Codec and transformer metadata (checksum, size, encoding, ...).
    pub meta: Metadata,
    /// Revisions read by the producing run before this write.
    pub origins: Vec<RevisionRef>,
    /// The run that produced this revision.
    pub run_id: RunId,
    /// When the revision was written.
    pub created_at: DateTime<Utc>,
}

impl Revision {
    /// Reference to this revision.
    pub fn to_ref(&self) -> RevisionRef {
        RevisionRef::new(self.box_id.clone(), self.revision_id)
    }

    /// Returns `true` if this revision has no recorded origins.
    pub fn is_root(&self) -> bool {
        self.origins.is_empty()
    }

    /// Ids of all origin revisions.
    pub fn origin_ids(&self) -> Vec<RevisionId> {
        self.origins.iter().map(|r| r.revision_id).collect()
    }
}
