use lode_types::{BoxId, Revision, RevisionId};

use crate::error::StoreResult;

/// Backend-agnostic persistence for content-addressed artifacts.
///
/// All implementations must satisfy these invariants:
/// - Artifacts are immutable once written. `put` on an existing
///   `(box, revision)` key is a cheap no-op (content-addressing guarantees
///   the same key always maps to the same bytes).
/// - `put` is atomic from the perspective of concurrent `get`/`exists`
///   calls: readers see nothing or the complete artifact, never a prefix.
/// - Concurrent reads are always safe (artifacts are immutable).
/// - The latest pointer is the only mutable state. Concurrent `set_latest`
///   calls race last-write-wins, with no merge; losing revisions stay
///   retrievable by id.
/// - All I/O errors are propagated, never silently ignored.
pub trait StorageBackend: Send + Sync {
    /// Check whether a revision exists in the store.
    fn exists(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<bool>;

    /// Persist transformed bytes and their manifest.
    ///
    /// The key is `(manifest.box_id, manifest.revision_id)`. If the key
    /// already exists the call is a no-op; existing content is never
    /// overwritten.
    fn put(&self, bytes: &[u8], manifest: &Revision) -> StoreResult<()>;

    /// Fetch an artifact's bytes and manifest.
    ///
    /// Fails with [`StoreError::NotFound`] if the revision is absent.
    ///
    /// [`StoreError::NotFound`]: crate::error::StoreError::NotFound
    fn get(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<(Vec<u8>, Revision)>;

    /// Fetch only the manifest, without reading the payload bytes.
    fn get_manifest(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<Revision>;

    /// Delete a revision. Returns `true` if it existed.
    ///
    /// Intended for garbage-collection tooling only; deleting a revision
    /// that appears in another revision's origin set breaks lineage queries.
    fn delete(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<bool>;

    /// All revision ids stored for a box, in sorted order.
    fn list_revisions(&self, box_id: &BoxId) -> StoreResult<Vec<RevisionId>>;

    /// All box ids known to this store, in sorted order.
    fn list_boxes(&self) -> StoreResult<Vec<BoxId>>;

    /// Update the latest pointer for a box. Last write wins.
    fn set_latest(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<()>;

    /// Current latest pointer for a box, or `None` if the box has none.
    fn latest(&self, box_id: &BoxId) -> StoreResult<Option<RevisionId>>;
}
