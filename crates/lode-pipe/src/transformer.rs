use lode_hash::ContentHasher;
use lode_types::Metadata;
use tracing::warn;

use crate::error::{PipeError, PipeResult};

/// Metadata key under which the checksum stage stores its digest.
pub const META_CHECKSUM: &str = "checksum";
/// Metadata key under which the statistics stage stores the byte size.
pub const META_SIZE: &str = "size";

/// One stage of the transformer pipeline.
///
/// A tagged variant per stage kind keeps composition explicit: pipelines
/// are ordered lists of these variants, and adding a stage kind means
/// adding a variant here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transformer {
    /// Digest on write, verify on read.
    Checksum(ChecksumTransformer),
    /// Observational metadata on write, pass-through on read.
    Statistics(StatisticsTransformer),
}

impl Transformer {
    /// A checksum stage.
    pub fn checksum() -> Self {
        Self::Checksum(ChecksumTransformer)
    }

    /// A statistics stage.
    pub fn statistics() -> Self {
        Self::Statistics(StatisticsTransformer)
    }

    /// Stage name for logging and persisted pipeline descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Checksum(_) => "checksum",
            Self::Statistics(_) => "statistics",
        }
    }

    /// Apply this stage on the write path.
    pub fn forward(&self, bytes: Vec<u8>, meta: &mut Metadata) -> PipeResult<Vec<u8>> {
        match self {
            Self::Checksum(t) => t.forward(bytes, meta),
            Self::Statistics(t) => t.forward(bytes, meta),
        }
    }

    /// Apply this stage on the read path.
    pub fn inverse(&self, bytes: Vec<u8>, meta: &Metadata) -> PipeResult<Vec<u8>> {
        match self {
            Self::Checksum(t) => t.inverse(bytes, meta),
            Self::Statistics(t) => t.inverse(bytes, meta),
        }
    }
}

/// Checksum stage: the load-bearing integrity check.
///
/// `forward` computes a domain-separated BLAKE3 digest over the incoming
/// bytes, records it in metadata, and passes the bytes through unchanged.
/// `inverse` recomputes the digest over the bytes fetched from storage and
/// compares it to the stored one; a mismatch fails the read before any data
/// reaches the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChecksumTransformer;

impl ChecksumTransformer {
    fn forward(&self, bytes: Vec<u8>, meta: &mut Metadata) -> PipeResult<Vec<u8>> {
        let digest = ContentHasher::CHECKSUM.hash(&bytes).to_hex();
        meta.insert(META_CHECKSUM, digest);
        Ok(bytes)
    }

    fn inverse(&self, bytes: Vec<u8>, meta: &Metadata) -> PipeResult<Vec<u8>> {
        let Some(expected) = meta.get_str(META_CHECKSUM) else {
            return Err(PipeError::MissingChecksum);
        };
        let computed = ContentHasher::CHECKSUM.hash(&bytes).to_hex();
        if computed != expected {
            warn!(expected, computed, "checksum mismatch on read");
            return Err(PipeError::Integrity {
                expected: expected.to_string(),
                computed,
            });
        }
        Ok(bytes)
    }
}

/// Statistics stage: records summary metadata as a side channel.
///
/// Only the byte size is recorded here; richer metric sets belong to
/// external collaborators. `inverse` is a no-op pass-through, which is the
/// general contract for observational, non-protective stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatisticsTransformer;

impl StatisticsTransformer {
    fn forward(&self, bytes: Vec<u8>, meta: &mut Metadata) -> PipeResult<Vec<u8>> {
        meta.insert(META_SIZE, bytes.len() as u64);
        Ok(bytes)
    }

    fn inverse(&self, bytes: Vec<u8>, _meta: &Metadata) -> PipeResult<Vec<u8>> {
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_forward_records_digest_and_passes_bytes() {
        let mut meta = Metadata::new();
        let out = Transformer::checksum()
            .forward(b"payload".to_vec(), &mut meta)
            .unwrap();
        assert_eq!(out, b"payload");
        let digest = meta.get_str(META_CHECKSUM).unwrap();
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn checksum_inverse_accepts_unmodified_bytes() {
        let stage = Transformer::checksum();
        let mut meta = Metadata::new();
        let out = stage.forward(b"payload".to_vec(), &mut meta).unwrap();
        let back = stage.inverse(out, &meta).unwrap();
        assert_eq!(back, b"payload");
    }

    #[test]
    fn checksum_inverse_rejects_flipped_byte() {
        let stage = Transformer::checksum();
        let mut meta = Metadata::new();
        let mut out = stage.forward(b"payload".to_vec(), &mut meta).unwrap();
        out[3] ^= 0x01;

        let err = stage.inverse(out, &meta).unwrap_err();
        assert!(matches!(err, PipeError::Integrity { .. }));
    }

    #[test]
    fn checksum_inverse_requires_stored_digest() {
        let err = Transformer::checksum()
            .inverse(b"payload".to_vec(), &Metadata::new())
            .unwrap_err();
        assert_eq!(err, PipeError::MissingChecksum);
    }

    #[test]
    fn statistics_records_size() {
        let mut meta = Metadata::new();
        let out = Transformer::statistics()
            .forward(b"12345".to_vec(), &mut meta)
            .unwrap();
        assert_eq!(out, b"12345");
        assert_eq!(meta.get_u64(META_SIZE), Some(5));
    }

    #[test]
    fn statistics_inverse_is_pass_through() {
        let out = Transformer::statistics()
            .inverse(b"anything".to_vec(), &Metadata::new())
            .unwrap();
        assert_eq!(out, b"anything");
    }

    #[test]
    fn stage_names() {
        assert_eq!(Transformer::checksum().name(), "checksum");
        assert_eq!(Transformer::statistics().name(), "statistics");
    }
}
