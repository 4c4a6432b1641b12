//! Run-scoped provenance bookkeeping.

use std::collections::HashMap;

use lode_types::{BoxId, RevisionId, RevisionRef, RunId};

/// Bookkeeping for one pipeline execution.
///
/// A run accumulates the revisions it reads; each write snapshots that
/// read-set as the new revision's origin set. The read-set is ordered by
/// first read, deduplicated, and never cleared during the run, so a late
/// write still cites everything the run consumed before it.
///
/// Runs are plain values: drop one to end it. A run is bound to the store
/// that created it only by convention; nothing is global.
#[derive(Clone, Debug)]
pub struct RunContext {
    id: RunId,
    /// Revisions read during this run, in first-read order.
    read_set: Vec<RevisionRef>,
    /// Latest revision written per box, for read-your-writes.
    writes: HashMap<BoxId, RevisionId>,
}

impl RunContext {
    pub(crate) fn new() -> Self {
        Self {
            id: RunId::new(),
            read_set: Vec::new(),
            writes: HashMap::new(),
        }
    }

    /// The unique id of this run.
    pub fn id(&self) -> RunId {
        self.id
    }

    /// Revisions read so far, in first-read order.
    pub fn read_set(&self) -> &[RevisionRef] {
        &self.read_set
    }

    /// The revision this run last wrote to a box, if any.
    pub fn written(&self, box_id: &BoxId) -> Option<RevisionId> {
        self.writes.get(box_id).copied()
    }

    /// Record a read. Re-reads of the same revision are not duplicated.
    pub(crate) fn record_read(&mut self, revision: RevisionRef) {
        if !self.read_set.contains(&revision) {
            self.read_set.push(revision);
        }
    }

    /// Record a write for read-your-writes resolution.
    pub(crate) fn record_write(&mut self, box_id: BoxId, revision: RevisionId) {
        self.writes.insert(box_id, revision);
    }

    /// Snapshot the current read-set as an origin set.
    pub(crate) fn origin_snapshot(&self) -> Vec<RevisionRef> {
        self.read_set.clone()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
