use std::collections::HashMap;
use std::sync::RwLock;

use lode_types::{BoxId, Revision, RevisionId};

use crate::error::{StoreError, StoreResult};
use crate::traits::StorageBackend;

/// One stored artifact: bytes plus the manifest written alongside them.
#[derive(Clone, Debug)]
struct StoredArtifact {
    bytes: Vec<u8>,
    manifest: Revision,
}

/// In-memory, HashMap-based storage backend.
///
/// Intended for tests and embedding. All artifacts are held in memory behind
/// a `RwLock` for safe concurrent access. Bytes and manifests are cloned on
/// read/write.
pub struct InMemoryBackend {
    artifacts: RwLock<HashMap<(BoxId, RevisionId), StoredArtifact>>,
    pointers: RwLock<HashMap<BoxId, RevisionId>>,
}

impl InMemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            artifacts: RwLock::new(HashMap::new()),
            pointers: RwLock::new(HashMap::new()),
        }
    }

    /// Number of artifacts currently stored.
    pub fn len(&self) -> usize {
        self.artifacts.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.artifacts.read().expect("lock poisoned").is_empty()
    }

    /// Total payload bytes across all stored artifacts.
    pub fn total_bytes(&self) -> u64 {
        self.artifacts
            .read()
            .expect("lock poisoned")
            .values()
            .map(|a| a.bytes.len() as u64)
            .sum()
    }

    /// Remove all artifacts and pointers.
    pub fn clear(&self) {
        self.artifacts.write().expect("lock poisoned").clear();
        self.pointers.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for InMemoryBackend {
    fn exists(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<bool> {
        let map = self.artifacts.read().expect("lock poisoned");
        Ok(map.contains_key(&(box_id.clone(), *revision)))
    }

    fn put(&self, bytes: &[u8], manifest: &Revision) -> StoreResult<()> {
        if manifest.revision_id.is_null() {
            return Err(StoreError::NullRevisionId);
        }
        let key = (manifest.box_id.clone(), manifest.revision_id);
        let mut map = self.artifacts.write().expect("lock poisoned");
        // Idempotent: if already present, keep the existing artifact
        // (content-addressing guarantees identical bytes).
        map.entry(key).or_insert_with(|| StoredArtifact {
            bytes: bytes.to_vec(),
            manifest: manifest.clone(),
        });
        Ok(())
    }

    fn get(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<(Vec<u8>, Revision)> {
        let map = self.artifacts.read().expect("lock poisoned");
        match map.get(&(box_id.clone(), *revision)) {
            Some(artifact) => Ok((artifact.bytes.clone(), artifact.manifest.clone())),
            None => Err(StoreError::NotFound {
                box_id: box_id.clone(),
                revision: *revision,
            }),
        }
    }

    fn get_manifest(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<Revision> {
        let map = self.artifacts.read().expect("lock poisoned");
        match map.get(&(box_id.clone(), *revision)) {
            Some(artifact) => Ok(artifact.manifest.clone()),
            None => Err(StoreError::NotFound {
                box_id: box_id.clone(),
                revision: *revision,
            }),
        }
    }

    fn delete(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<bool> {
        let mut map = self.artifacts.write().expect("lock poisoned");
        Ok(map.remove(&(box_id.clone(), *revision)).is_some())
    }

    fn list_revisions(&self, box_id: &BoxId) -> StoreResult<Vec<RevisionId>> {
        let map = self.artifacts.read().expect("lock poisoned");
        let mut ids: Vec<RevisionId> = map
            .keys()
            .filter(|(b, _)| b == box_id)
            .map(|(_, r)| *r)
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn list_boxes(&self) -> StoreResult<Vec<BoxId>> {
        let map = self.artifacts.read().expect("lock poisoned");
        let mut boxes: Vec<BoxId> = map.keys().map(|(b, _)| b.clone()).collect();
        boxes.sort();
        boxes.dedup();
        Ok(boxes)
    }

    fn set_latest(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<()> {
        let mut pointers = self.pointers.write().expect("lock poisoned");
        pointers.insert(box_id.clone(), *revision);
        Ok(())
    }

    fn latest(&self, box_id: &BoxId) -> StoreResult<Option<RevisionId>> {
        let pointers = self.pointers.read().expect("lock poisoned");
        Ok(pointers.get(box_id).copied())
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("artifact_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lode_types::{Metadata, RunId};

    fn box_id(name: &str) -> BoxId {
        BoxId::new(name).unwrap()
    }

    fn make_manifest(box_name: &str, content: &[u8]) -> Revision {
        Revision {
            box_id: box_id(box_name),
            revision_id: RevisionId::from_bytes(content),
            value_type: "bytes".to_string(),
            meta: Metadata::new(),
            origins: Vec::new(),
            run_id: RunId::new(),
            created_at: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Core put/get
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get() {
        let store = InMemoryBackend::new();
        let manifest = make_manifest("x", b"hello");
        store.put(b"hello", &manifest).unwrap();

        let (bytes, read_back) = store
            .get(&manifest.box_id, &manifest.revision_id)
            .unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(read_back, manifest);
    }

    #[test]
    fn get_missing_fails_with_not_found() {
        let store = InMemoryBackend::new();
        let err = store
            .get(&box_id("x"), &RevisionId::from_bytes(b"missing"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn get_manifest_without_payload() {
        let store = InMemoryBackend::new();
        let manifest = make_manifest("x", b"payload");
        store.put(b"payload", &manifest).unwrap();

        let read_back = store
            .get_manifest(&manifest.box_id, &manifest.revision_id)
            .unwrap();
        assert_eq!(read_back, manifest);
    }

    #[test]
    fn put_null_revision_id_rejected() {
        let store = InMemoryBackend::new();
        let mut manifest = make_manifest("x", b"data");
        manifest.revision_id = RevisionId::null();
        let err = store.put(b"data", &manifest).unwrap_err();
        assert!(matches!(err, StoreError::NullRevisionId));
    }

    // -----------------------------------------------------------------------
    // Idempotency / dedup
    // -----------------------------------------------------------------------

    #[test]
    fn put_is_idempotent() {
        let store = InMemoryBackend::new();
        let manifest = make_manifest("x", b"once");
        store.put(b"once", &manifest).unwrap();
        store.put(b"once", &manifest).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn same_content_in_different_boxes_stored_separately() {
        let store = InMemoryBackend::new();
        let in_x = make_manifest("x", b"shared");
        let in_y = make_manifest("y", b"shared");
        store.put(b"shared", &in_x).unwrap();
        store.put(b"shared", &in_y).unwrap();
        assert_eq!(store.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Exists / Delete
    // -----------------------------------------------------------------------

    #[test]
    fn exists_reflects_puts() {
        let store = InMemoryBackend::new();
        let manifest = make_manifest("x", b"here");
        assert!(!store
            .exists(&manifest.box_id, &manifest.revision_id)
            .unwrap());
        store.put(b"here", &manifest).unwrap();
        assert!(store
            .exists(&manifest.box_id, &manifest.revision_id)
            .unwrap());
    }

    #[test]
    fn delete_present_and_missing() {
        let store = InMemoryBackend::new();
        let manifest = make_manifest("x", b"gone");
        store.put(b"gone", &manifest).unwrap();

        assert!(store
            .delete(&manifest.box_id, &manifest.revision_id)
            .unwrap());
        assert!(!store
            .exists(&manifest.box_id, &manifest.revision_id)
            .unwrap());
        assert!(!store
            .delete(&manifest.box_id, &manifest.revision_id)
            .unwrap());
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[test]
    fn list_revisions_is_sorted_and_scoped() {
        let store = InMemoryBackend::new();
        let a = make_manifest("x", b"aaa");
        let b = make_manifest("x", b"bbb");
        let other = make_manifest("y", b"ccc");
        store.put(b"aaa", &a).unwrap();
        store.put(b"bbb", &b).unwrap();
        store.put(b"ccc", &other).unwrap();

        let ids = store.list_revisions(&box_id("x")).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.windows(2).all(|w| w[0] <= w[1]));
        assert!(ids.contains(&a.revision_id));
        assert!(ids.contains(&b.revision_id));
    }

    #[test]
    fn list_boxes_sorted_and_deduped() {
        let store = InMemoryBackend::new();
        store.put(b"1", &make_manifest("b", b"1")).unwrap();
        store.put(b"2", &make_manifest("a", b"2")).unwrap();
        store.put(b"3", &make_manifest("b", b"3")).unwrap();

        let boxes = store.list_boxes().unwrap();
        assert_eq!(boxes, vec![box_id("a"), box_id("b")]);
    }

    // -----------------------------------------------------------------------
    // Latest pointer
    // -----------------------------------------------------------------------

    #[test]
    fn latest_is_none_for_unknown_box() {
        let store = InMemoryBackend::new();
        assert!(store.latest(&box_id("nope")).unwrap().is_none());
    }

    #[test]
    fn set_latest_last_write_wins() {
        let store = InMemoryBackend::new();
        let first = RevisionId::from_bytes(b"first");
        let second = RevisionId::from_bytes(b"second");

        store.set_latest(&box_id("x"), &first).unwrap();
        assert_eq!(store.latest(&box_id("x")).unwrap(), Some(first));

        store.set_latest(&box_id("x"), &second).unwrap();
        assert_eq!(store.latest(&box_id("x")).unwrap(), Some(second));
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[test]
    fn len_total_bytes_and_clear() {
        let store = InMemoryBackend::new();
        assert!(store.is_empty());
        store.put(b"12345", &make_manifest("x", b"12345")).unwrap();
        store
            .put(b"123456789", &make_manifest("x", b"123456789"))
            .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.total_bytes(), 14);

        store.clear();
        assert!(store.is_empty());
    }

    // -----------------------------------------------------------------------
    // Concurrent access
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryBackend::new());
        let manifest = make_manifest("x", b"shared data");
        store.put(b"shared data", &manifest).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let manifest = manifest.clone();
                thread::spawn(move || {
                    let (bytes, read_back) = store
                        .get(&manifest.box_id, &manifest.revision_id)
                        .unwrap();
                    assert_eq!(bytes, b"shared data");
                    assert_eq!(read_back.revision_id, manifest.revision_id);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn concurrent_identical_puts_store_one_copy() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryBackend::new());
        let manifest = make_manifest("x", b"raced");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let manifest = manifest.clone();
                thread::spawn(move || store.put(b"raced", &manifest).unwrap())
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(store.len(), 1);
    }
}
