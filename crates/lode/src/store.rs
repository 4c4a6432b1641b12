//! The store handle: backend + pipeline + codecs + lineage in one place.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use tracing::debug;

use lode_graph::{GraphError, LineageGraph};
use lode_hash::hash_revision;
use lode_pipe::Pipeline;
use lode_store::{FileBackend, InMemoryBackend, StorageBackend};
use lode_types::{BoxId, Metadata, Revision, RevisionId, RevisionRef, RunId};
use lode_values::{CodecRegistry, Value, ValueCodec};

use crate::error::{LodeError, LodeResult};
use crate::run::RunContext;

/// Selects which revision of a box to read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selector {
    /// The box's latest revision. Within a run, a box written earlier in
    /// the same run resolves to that write instead of the latest pointer.
    #[default]
    Latest,
    /// A specific revision by id.
    Pinned(RevisionId),
}

/// A handle onto one artifact store.
///
/// Wires together a storage backend, the transformer pipeline applied on
/// every write and read, the codec registry, and an in-memory lineage graph
/// used for deduplication and lineage indexing. All methods take `&self`;
/// the handle is safe to share across threads.
///
/// Operations without an explicit [`RunContext`] use a per-handle default
/// run, so casual reads and writes still accumulate provenance. There is no
/// process-global state: two handles have two independent default runs.
pub struct Store {
    backend: Arc<dyn StorageBackend>,
    pipeline: Pipeline,
    values: CodecRegistry,
    graph: RwLock<LineageGraph>,
    default_run: Mutex<RunContext>,
}

impl Store {
    /// Create a store over the given backend with the standard pipeline
    /// (checksum, then statistics) and the built-in codecs.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            pipeline: Pipeline::standard(),
            values: CodecRegistry::with_defaults(),
            graph: RwLock::new(LineageGraph::new()),
            default_run: Mutex::new(RunContext::new()),
        }
    }

    /// Create a store over a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBackend::new()))
    }

    /// Open (or initialize) a store rooted at a directory on disk.
    pub fn open(root: impl AsRef<Path>) -> LodeResult<Self> {
        let backend = FileBackend::open(root.as_ref().to_path_buf())?;
        Ok(Self::new(Arc::new(backend)))
    }

    /// Replace the transformer pipeline. Affects subsequent writes and
    /// reads; previously stored revisions carry their own metadata.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Register a value codec with priority over all existing ones.
    pub fn register_codec(&mut self, codec: impl ValueCodec + 'static) {
        self.values.register(codec);
    }

    /// The backend this store writes through.
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    // ---- Runs ----

    /// Start a new run with a fresh id and empty read-set.
    pub fn begin_run(&self) -> RunContext {
        RunContext::new()
    }

    // ---- Write ----

    /// Write a value to a box within the default run.
    pub fn write(&self, box_id: &BoxId, value: impl Into<Value>) -> LodeResult<RevisionRef> {
        let mut run = self.default_run.lock().expect("lock poisoned");
        self.write_in_with_meta(&mut run, box_id, value, Metadata::new())
    }

    /// Write a value with caller-supplied metadata within the default run.
    pub fn write_with_meta(
        &self,
        box_id: &BoxId,
        value: impl Into<Value>,
        meta: Metadata,
    ) -> LodeResult<RevisionRef> {
        let mut run = self.default_run.lock().expect("lock poisoned");
        self.write_in_with_meta(&mut run, box_id, value, meta)
    }

    /// Write a value to a box within an explicit run.
    pub fn write_in(
        &self,
        run: &mut RunContext,
        box_id: &BoxId,
        value: impl Into<Value>,
    ) -> LodeResult<RevisionRef> {
        self.write_in_with_meta(run, box_id, value, Metadata::new())
    }

    /// Write a value with caller-supplied metadata within an explicit run.
    ///
    /// The persisted metadata is the caller's entries, then the codec's,
    /// then the transformers' — later stages win on key collisions. The
    /// run's current read-set becomes the new revision's origin set.
    ///
    /// Writes are content-addressed: re-writing byte-identical content to
    /// the same box yields the same revision id, and the payload is not
    /// stored again.
    pub fn write_in_with_meta(
        &self,
        run: &mut RunContext,
        box_id: &BoxId,
        value: impl Into<Value>,
        meta: Metadata,
    ) -> LodeResult<RevisionRef> {
        let value = value.into();
        let codec = self.values.resolve(&value)?;

        let mut meta = meta;
        let bytes = codec.serialize(&value, &mut meta)?;
        let transformed = self.pipeline.forward(bytes, &mut meta)?;
        let revision_id = hash_revision(box_id, &transformed);

        // Dedup before any storage I/O: if this handle has already seen the
        // revision, only the latest pointer moves.
        if self
            .graph
            .read()
            .expect("lock poisoned")
            .contains(&revision_id)
        {
            debug!(box_id = %box_id, revision = %revision_id.short_hex(), "write deduplicated");
            self.backend.set_latest(box_id, &revision_id)?;
            run.record_write(box_id.clone(), revision_id);
            return Ok(RevisionRef::new(box_id.clone(), revision_id));
        }

        let origins = run.origin_snapshot();
        if origins.iter().any(|o| o.revision_id == revision_id) {
            return Err(LodeError::CycleDetected(revision_id));
        }

        let manifest = Revision {
            box_id: box_id.clone(),
            revision_id,
            value_type: codec.descriptor(),
            meta,
            origins,
            run_id: run.id(),
            created_at: Utc::now(),
        };

        self.backend.put(&transformed, &manifest)?;
        self.backend.set_latest(box_id, &revision_id)?;
        self.index_manifest(&manifest)?;
        run.record_write(box_id.clone(), revision_id);

        debug!(
            box_id = %box_id,
            revision = %revision_id.short_hex(),
            origins = manifest.origins.len(),
            "wrote revision"
        );
        Ok(manifest.to_ref())
    }

    // ---- Read ----

    /// Read a value from a box within the default run.
    pub fn read(&self, box_id: &BoxId, selector: Selector) -> LodeResult<Value> {
        let mut run = self.default_run.lock().expect("lock poisoned");
        self.read_in(&mut run, box_id, selector)
    }

    /// Read a value from a box within an explicit run.
    ///
    /// The resolved revision is appended to the run's read-set, so later
    /// writes in the run cite it as an origin. Checksum verification runs
    /// before the value is decoded; corrupted bytes never reach the caller.
    pub fn read_in(
        &self,
        run: &mut RunContext,
        box_id: &BoxId,
        selector: Selector,
    ) -> LodeResult<Value> {
        let revision_id = self.resolve_in(run, box_id, selector)?;
        let (stored, manifest) = self.backend.get(box_id, &revision_id)?;
        let bytes = self.pipeline.inverse(stored, &manifest.meta)?;
        let codec = self.values.by_descriptor(&manifest.value_type)?;
        let value = codec.deserialize(bytes, &manifest.meta)?;

        self.index_manifest(&manifest)?;
        run.record_read(manifest.to_ref());
        debug!(box_id = %box_id, revision = %revision_id.short_hex(), "read revision");
        Ok(value)
    }

    fn resolve_in(
        &self,
        run: &RunContext,
        box_id: &BoxId,
        selector: Selector,
    ) -> LodeResult<RevisionId> {
        if selector == Selector::Latest {
            // Read-your-writes: a box written earlier in this run resolves
            // to that write, not the shared latest pointer.
            if let Some(revision) = run.written(box_id) {
                return Ok(revision);
            }
        }
        self.resolve(box_id, selector)
    }

    /// Resolve a selector against the backend alone, ignoring any run.
    ///
    /// A pinned revision must actually be stored; a dangling pin is
    /// `NotFound` here, not on the later payload fetch.
    pub fn resolve(&self, box_id: &BoxId, selector: Selector) -> LodeResult<RevisionId> {
        match selector {
            Selector::Pinned(revision) => {
                if self.backend.exists(box_id, &revision)? {
                    Ok(revision)
                } else {
                    Err(LodeError::NotFound {
                        box_id: box_id.clone(),
                        revision: Some(revision),
                    })
                }
            }
            Selector::Latest => {
                self.backend
                    .latest(box_id)?
                    .ok_or_else(|| LodeError::NotFound {
                        box_id: box_id.clone(),
                        revision: None,
                    })
            }
        }
    }

    // ---- Inspection ----

    /// The manifest of a revision, without reading the payload.
    pub fn info(&self, box_id: &BoxId, selector: Selector) -> LodeResult<Revision> {
        let revision_id = self.resolve(box_id, selector)?;
        Ok(self.backend.get_manifest(box_id, &revision_id)?)
    }

    /// All boxes known to the backend.
    pub fn boxes(&self) -> LodeResult<Vec<BoxId>> {
        Ok(self.backend.list_boxes()?)
    }

    /// All stored revisions of a box.
    pub fn revisions(&self, box_id: &BoxId) -> LodeResult<Vec<RevisionId>> {
        Ok(self.backend.list_revisions(box_id)?)
    }

    /// The latest revision of a box, if any.
    pub fn latest(&self, box_id: &BoxId) -> LodeResult<Option<RevisionId>> {
        Ok(self.backend.latest(box_id)?)
    }

    /// All run ids that produced at least one stored revision, oldest
    /// first (run ids are UUID v7 and sort chronologically).
    pub fn runs(&self) -> LodeResult<Vec<RunId>> {
        let mut runs = Vec::new();
        self.for_each_manifest(|m| runs.push(m.run_id))?;
        runs.sort();
        runs.dedup();
        Ok(runs)
    }

    /// Every revision a run produced, in creation order.
    ///
    /// A deduplicated rewrite stores no new manifest, so it shows up under
    /// the run that first produced the content.
    pub fn run_revisions(&self, run_id: &RunId) -> LodeResult<Vec<RevisionRef>> {
        let mut found = Vec::new();
        self.for_each_manifest(|m| {
            if m.run_id == *run_id {
                found.push((m.created_at, m.to_ref()));
            }
        })?;
        found.sort_by_key(|(created_at, _)| *created_at);
        Ok(found.into_iter().map(|(_, rref)| rref).collect())
    }

    fn for_each_manifest(&self, mut f: impl FnMut(&Revision)) -> LodeResult<()> {
        for box_id in self.backend.list_boxes()? {
            for revision in self.backend.list_revisions(&box_id)? {
                f(&self.backend.get_manifest(&box_id, &revision)?);
            }
        }
        Ok(())
    }

    // ---- Lineage ----

    /// The full transitive origin closure of a revision, walked from
    /// persisted manifests.
    ///
    /// The revision itself is not included. Terminates because origin edges
    /// only ever point at revisions that existed before the referencing one.
    pub fn lineage(&self, revision: &RevisionRef) -> LodeResult<Vec<RevisionRef>> {
        let start = self
            .backend
            .get_manifest(&revision.box_id, &revision.revision_id)?;

        let mut result = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(revision.revision_id);
        let mut queue: VecDeque<RevisionRef> = start.origins.into_iter().collect();

        while let Some(origin) = queue.pop_front() {
            if !visited.insert(origin.revision_id) {
                continue;
            }
            let manifest = self
                .backend
                .get_manifest(&origin.box_id, &origin.revision_id)?;
            for o in manifest.origins {
                if !visited.contains(&o.revision_id) {
                    queue.push_back(o);
                }
            }
            result.push(origin);
        }

        Ok(result)
    }

    /// Index a manifest (and any unseen transitive origins) into the
    /// in-memory lineage graph. Origins are loaded from the backend so
    /// revisions written by other handles still index cleanly.
    fn index_manifest(&self, manifest: &Revision) -> LodeResult<()> {
        let mut pending: Vec<Revision> = Vec::new();
        {
            let graph = self.graph.read().expect("lock poisoned");
            if graph.contains(&manifest.revision_id) {
                return Ok(());
            }

            let mut queued = HashSet::new();
            let mut stack = vec![manifest.clone()];
            while let Some(m) = stack.pop() {
                if graph.contains(&m.revision_id) || !queued.insert(m.revision_id) {
                    continue;
                }
                for origin in &m.origins {
                    if !graph.contains(&origin.revision_id) && !queued.contains(&origin.revision_id)
                    {
                        stack.push(
                            self.backend
                                .get_manifest(&origin.box_id, &origin.revision_id)?,
                        );
                    }
                }
                pending.push(m);
            }
        }

        // Insert origins before the revisions that cite them. Each pass
        // admits every manifest whose origins are already present; a pass
        // that admits nothing would mean a cycle, which add_node's
        // append-only discipline rules out.
        let mut graph = self.graph.write().expect("lock poisoned");
        while !pending.is_empty() {
            let before = pending.len();
            pending.retain(|m| {
                if m.origins.iter().all(|o| graph.contains(&o.revision_id)) {
                    !matches!(
                        graph.add(m),
                        Ok(_) | Err(GraphError::DuplicateNode(_))
                    )
                } else {
                    true
                }
            });
            if pending.len() == before {
                return Err(LodeError::CycleDetected(manifest.revision_id));
            }
        }
        Ok(())
    }
}
