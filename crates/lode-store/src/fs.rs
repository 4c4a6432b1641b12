//! File-based storage backend.
//!
//! On-disk layout under the root directory:
//!
//! ```text
//! <root>/
//!   tmp/                              staging area for atomic writes
//!   boxes/<box id>/
//!     objects/<2-hex shard>/<rest>.data   transformed payload bytes
//!     objects/<2-hex shard>/<rest>.meta   JSON revision manifest
//!     LATEST                              current latest revision id (hex)
//! ```
//!
//! Every write goes through a uniquely named temp file in `tmp/` (same
//! filesystem volume as the final path), is flushed durably, then renamed
//! into place. Content files use no-clobber renames: if the destination
//! already exists the temp file is discarded, preserving immutability. The
//! `.meta` manifest is renamed into place after the `.data` file and
//! existence checks consult the manifest, so a reader never observes a
//! partially written revision.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

use lode_types::{BoxId, Revision, RevisionId};

use crate::error::{StoreError, StoreResult};
use crate::traits::StorageBackend;

const TMP_DIR: &str = "tmp";
const BOXES_DIR: &str = "boxes";
const OBJECTS_DIR: &str = "objects";
const POINTER_FILE: &str = "LATEST";
const DATA_EXT: &str = "data";
const META_EXT: &str = "meta";

/// Storage backend persisting artifacts in a local directory tree.
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
    tmp_dir: PathBuf,
    boxes_dir: PathBuf,
}

impl FileBackend {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        let tmp_dir = root.join(TMP_DIR);
        let boxes_dir = root.join(BOXES_DIR);
        fs::create_dir_all(&tmp_dir)?;
        fs::create_dir_all(&boxes_dir)?;
        Ok(Self {
            root,
            tmp_dir,
            boxes_dir,
        })
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn box_dir(&self, box_id: &BoxId) -> PathBuf {
        let mut dir = self.boxes_dir.clone();
        for component in box_id.components() {
            dir.push(component);
        }
        dir
    }

    /// Sharded data/manifest paths for a revision. The first two hex
    /// characters become a subdirectory to bound directory fan-out.
    fn object_paths(&self, box_id: &BoxId, revision: &RevisionId) -> (PathBuf, PathBuf) {
        let hex = revision.to_hex();
        let dir = self
            .box_dir(box_id)
            .join(OBJECTS_DIR)
            .join(&hex[..2]);
        let data = dir.join(format!("{}.{DATA_EXT}", &hex[2..]));
        let meta = dir.join(format!("{}.{META_EXT}", &hex[2..]));
        (data, meta)
    }

    fn pointer_path(&self, box_id: &BoxId) -> PathBuf {
        self.box_dir(box_id).join(POINTER_FILE)
    }

    /// Write `bytes` to `dest` via temp-then-rename.
    ///
    /// With `overwrite` false, an already existing destination leaves the
    /// file untouched and returns `Ok(false)` (the temp file is discarded).
    fn write_atomic(&self, dest: &Path, bytes: &[u8], overwrite: bool) -> StoreResult<bool> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = NamedTempFile::new_in(&self.tmp_dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;

        if overwrite {
            tmp.persist(dest).map_err(|e| StoreError::Io(e.error))?;
            Ok(true)
        } else {
            match tmp.persist_noclobber(dest) {
                Ok(_) => Ok(true),
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
                Err(e) => Err(StoreError::Io(e.error)),
            }
        }
    }

    fn read_manifest(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<Revision> {
        let (_, meta_path) = self.object_paths(box_id, revision);
        let raw = match fs::read(&meta_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    box_id: box_id.clone(),
                    revision: *revision,
                })
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        serde_json::from_slice(&raw).map_err(|e| StoreError::CorruptArtifact {
            box_id: box_id.clone(),
            revision: *revision,
            reason: format!("unreadable manifest: {e}"),
        })
    }
}

impl StorageBackend for FileBackend {
    fn exists(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<bool> {
        let (_, meta_path) = self.object_paths(box_id, revision);
        Ok(meta_path.exists())
    }

    fn put(&self, bytes: &[u8], manifest: &Revision) -> StoreResult<()> {
        if manifest.revision_id.is_null() {
            return Err(StoreError::NullRevisionId);
        }
        if self.exists(&manifest.box_id, &manifest.revision_id)? {
            debug!(
                box_id = %manifest.box_id,
                revision = %manifest.revision_id.short_hex(),
                "revision already stored, skipping put"
            );
            return Ok(());
        }

        let (data_path, meta_path) = self.object_paths(&manifest.box_id, &manifest.revision_id);
        let raw_manifest = serde_json::to_vec_pretty(manifest)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Payload first, manifest last: existence is defined by the
        // manifest, so a crash in between leaves no visible revision.
        self.write_atomic(&data_path, bytes, false)?;
        self.write_atomic(&meta_path, &raw_manifest, false)?;

        debug!(
            box_id = %manifest.box_id,
            revision = %manifest.revision_id.short_hex(),
            size = bytes.len(),
            "stored revision"
        );
        Ok(())
    }

    fn get(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<(Vec<u8>, Revision)> {
        let manifest = self.read_manifest(box_id, revision)?;
        let (data_path, _) = self.object_paths(box_id, revision);
        let bytes = match fs::read(&data_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::CorruptArtifact {
                    box_id: box_id.clone(),
                    revision: *revision,
                    reason: "manifest present but payload missing".to_string(),
                })
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        Ok((bytes, manifest))
    }

    fn get_manifest(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<Revision> {
        self.read_manifest(box_id, revision)
    }

    fn delete(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<bool> {
        let (data_path, meta_path) = self.object_paths(box_id, revision);
        // Manifest first: once it is gone the revision no longer exists,
        // even if payload removal is interrupted.
        match fs::remove_file(&meta_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StoreError::Io(e)),
        }
        let _ = fs::remove_file(&data_path);
        Ok(true)
    }

    fn list_revisions(&self, box_id: &BoxId) -> StoreResult<Vec<RevisionId>> {
        let objects_dir = self.box_dir(box_id).join(OBJECTS_DIR);
        if !objects_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in WalkDir::new(&objects_dir).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXT) {
                continue;
            }
            let shard = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let stem = path
                .file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let hex = format!("{shard}{stem}");
            match RevisionId::from_hex(&hex) {
                Ok(id) => ids.push(id),
                // Stray files in the objects tree are not revisions.
                Err(_) => continue,
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn list_boxes(&self) -> StoreResult<Vec<BoxId>> {
        let mut boxes = Vec::new();
        for entry in WalkDir::new(&self.boxes_dir) {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            if !entry.file_type().is_dir() || entry.file_name() != OBJECTS_DIR {
                continue;
            }
            let Some(parent) = entry.path().parent() else {
                continue;
            };
            let Ok(relative) = parent.strip_prefix(&self.boxes_dir) else {
                continue;
            };
            let name = relative
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .collect::<Vec<_>>()
                .join("/");
            if let Ok(box_id) = BoxId::new(name) {
                boxes.push(box_id);
            }
        }
        boxes.sort();
        boxes.dedup();
        Ok(boxes)
    }

    fn set_latest(&self, box_id: &BoxId, revision: &RevisionId) -> StoreResult<()> {
        let pointer = self.pointer_path(box_id);
        let contents = format!("{}\n", revision.to_hex());
        // Overwriting rename: the pointer is the one mutable record, and
        // concurrent updates are last-write-wins by contract.
        self.write_atomic(&pointer, contents.as_bytes(), true)?;
        debug!(
            box_id = %box_id,
            revision = %revision.short_hex(),
            "updated latest pointer"
        );
        Ok(())
    }

    fn latest(&self, box_id: &BoxId) -> StoreResult<Option<RevisionId>> {
        let pointer = self.pointer_path(box_id);
        let raw = match fs::read_to_string(&pointer) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };
        let id = RevisionId::from_hex(raw.trim())
            .map_err(|e| StoreError::Serialization(format!("bad pointer for {box_id}: {e}")))?;
        Ok(Some(id))
    }
}
