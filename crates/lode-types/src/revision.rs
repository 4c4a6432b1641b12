use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content-addressed identifier for one immutable revision of a box.
///
/// A `RevisionId` is the BLAKE3 hash of the box id and the transformed bytes
/// (domain-separated, see `lode-hash`). Identical content written to the same
/// box always produces the same `RevisionId`, which is what makes revisions
/// deduplicatable and verifiable.
///
/// Serializes as its hex string, so persisted manifests stay readable and
/// the id works as a JSON map key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevisionId([u8; 32]);

impl RevisionId {
    /// Compute a `RevisionId` directly from raw bytes (no domain separation).
    ///
    /// Mostly useful in tests; production ids come from `lode-hash`.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create a `RevisionId` from a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The null revision id (all zeros). Represents "no revision".
    pub const fn null() -> Self {
        Self([0u8; 32])
    }

    /// Returns `true` if this is the null revision id.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevisionId({})", self.short_hex())
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for RevisionId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<RevisionId> for [u8; 32] {
    fn from(id: RevisionId) -> Self {
        id.0
    }
}

impl Serialize for RevisionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RevisionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_is_deterministic() {
        let data = b"hello world";
        let id1 = RevisionId::from_bytes(data);
        let id2 = RevisionId::from_bytes(data);
        assert_eq!(id1, id2);
    }

    #[test]
    fn different_data_produces_different_ids() {
        let id1 = RevisionId::from_bytes(b"hello");
        let id2 = RevisionId::from_bytes(b"world");
        assert_ne!(id1, id2);
    }

    #[test]
    fn null_is_all_zeros() {
        let null = RevisionId::null();
        assert!(null.is_null());
        assert_eq!(null.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn hex_roundtrip() {
        let id = RevisionId::from_bytes(b"test");
        let hex = id.to_hex();
        let parsed = RevisionId::from_hex(&hex).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(matches!(
            RevisionId::from_hex("abcd"),
            Err(TypeError::InvalidLength { .. })
        ));
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(matches!(
            RevisionId::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn short_hex_is_8_chars() {
        let id = RevisionId::from_bytes(b"test");
        assert_eq!(id.short_hex().len(), 8);
    }

    #[test]
    fn display_is_full_hex() {
        let id = RevisionId::from_bytes(b"test");
        let display = format!("{id}");
        assert_eq!(display.len(), 64);
        assert_eq!(display, id.to_hex());
    }

    #[test]
    fn serde_roundtrip() {
        let id = RevisionId::from_bytes(b"serde test");
        let json = serde_json::to_string(&id).unwrap();
        let parsed: RevisionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = RevisionId::from_bytes(b"serde test");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
    }

    #[test]
    fn usable_as_json_map_key() {
        let mut map = std::collections::HashMap::new();
        map.insert(RevisionId::from_bytes(b"key"), 7usize);
        let json = serde_json::to_string(&map).unwrap();
        let parsed: std::collections::HashMap<RevisionId, usize> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn deserialize_rejects_bad_hex() {
        assert!(serde_json::from_str::<RevisionId>("\"not hex\"").is_err());
        assert!(serde_json::from_str::<RevisionId>("\"abcd\"").is_err());
    }

    #[test]
    fn ordering_is_consistent() {
        let id1 = RevisionId::from_hash([0; 32]);
        let id2 = RevisionId::from_hash([1; 32]);
        assert!(id1 < id2);
    }
}
