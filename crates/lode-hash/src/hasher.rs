use lode_types::{BoxId, RevisionId};

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"lode-revision-v1"`,
/// `"lode-checksum-v1"`) that is prepended to every hash computation. This
/// prevents cross-purpose collisions: a revision id and a payload checksum
/// over identical bytes produce different hashes. The `-v1` suffix is the
/// schema version; bumping it changes every derived id.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher deriving revision ids from box id + transformed bytes.
    pub const REVISION: Self = Self {
        domain: "lode-revision-v1",
    };
    /// Hasher for payload checksums computed by the checksum transformer.
    pub const CHECKSUM: Self = Self {
        domain: "lode-checksum-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> RevisionId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        RevisionId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash several byte fields with domain separation.
    ///
    /// Each field is length-prefixed so that `["ab", "c"]` and `["a", "bc"]`
    /// hash differently.
    pub fn hash_fields(&self, fields: &[&[u8]]) -> RevisionId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for field in fields {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
        RevisionId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Hash a serializable value as JSON with domain separation.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<RevisionId, HasherError> {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }

    /// Verify that data produces the expected hash.
    pub fn verify(&self, data: &[u8], expected: &RevisionId) -> bool {
        self.hash(data) == *expected
    }

    /// Raw BLAKE3 hash without domain separation (for low-level use).
    pub fn raw_hash(data: &[u8]) -> [u8; 32] {
        *blake3::hash(data).as_bytes()
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Compute the content address of a revision.
///
/// `revision_id = blake3("lode-revision-v1" || box_id || transformed_bytes)`
/// with length-prefixed fields. Identical bytes written to the same box
/// always map to the same id (dedup); the same bytes in a different box map
/// to a different id.
pub fn hash_revision(box_id: &BoxId, transformed_bytes: &[u8]) -> RevisionId {
    ContentHasher::REVISION.hash_fields(&[box_id.as_str().as_bytes(), transformed_bytes])
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
