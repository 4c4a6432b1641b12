use lode_graph::GraphError;
use lode_pipe::PipeError;
use lode_store::StoreError;
use lode_types::{BoxId, RevisionId, TypeError};
use lode_values::ValueError;
use thiserror::Error;

/// Errors surfaced by the high-level store API.
///
/// All failures are reported synchronously; the store never retries
/// internally.
#[derive(Debug, Error)]
pub enum LodeError {
    /// No registered codec matches the value. Raised before any transformer
    /// or storage work begins.
    #[error("no value codec matches value of kind '{0}'")]
    UnsupportedValue(&'static str),

    /// Checksum verification failed on read; the data may be corrupted.
    #[error("integrity failure reading revision: expected {expected}, computed {computed}")]
    Integrity {
        /// Digest recorded at write time.
        expected: String,
        /// Digest recomputed from the stored bytes.
        computed: String,
    },

    /// The requested revision does not exist. `revision` is `None` when the
    /// box has no latest pointer at all.
    #[error("not found: box '{box_id}'{}", match revision {
        Some(r) => format!(" revision {}", r.short_hex()),
        None => " has no revisions".to_string(),
    })]
    NotFound {
        box_id: BoxId,
        revision: Option<RevisionId>,
    },

    /// A write's origin set would contain the revision being created.
    /// Indicates an internal bookkeeping bug, never user data.
    #[error("lineage cycle detected at revision {}", .0.short_hex())]
    CycleDetected(RevisionId),

    /// Codec failure other than an unmatched value.
    #[error(transparent)]
    Value(ValueError),

    /// Pipeline failure other than a checksum mismatch.
    #[error(transparent)]
    Pipe(PipeError),

    /// Backend failure other than a missing revision.
    #[error(transparent)]
    Storage(StoreError),

    /// Lineage graph failure other than a cycle.
    #[error(transparent)]
    Graph(GraphError),

    /// Invalid box name or revision id.
    #[error(transparent)]
    InvalidName(#[from] TypeError),
}

impl From<ValueError> for LodeError {
    fn from(err: ValueError) -> Self {
        match err {
            ValueError::UnsupportedValue(kind) => Self::UnsupportedValue(kind),
            other => Self::Value(other),
        }
    }
}

impl From<PipeError> for LodeError {
    fn from(err: PipeError) -> Self {
        match err {
            PipeError::Integrity { expected, computed } => Self::Integrity { expected, computed },
            other => Self::Pipe(other),
        }
    }
}

impl From<StoreError> for LodeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { box_id, revision } => Self::NotFound {
                box_id,
                revision: Some(revision),
            },
            other => Self::Storage(other),
        }
    }
}

impl From<GraphError> for LodeError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::CycleDetected(id) => Self::CycleDetected(id),
            other => Self::Graph(other),
        }
    }
}

/// Result alias for store operations.
pub type LodeResult<T> = Result<T, LodeError>;
