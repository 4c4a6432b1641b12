use std::fs;
use std::io::Write;
use std::path::PathBuf;

use lode_types::Metadata;

use crate::error::{ValueError, ValueResult};
use crate::value::Value;

/// Metadata key recording the text encoding.
pub const META_ENCODING: &str = "encoding";
/// Metadata key recording the media type of structured values.
pub const META_MEDIA_TYPE: &str = "media_type";
/// Metadata key recording the original file name of a file value.
pub const META_FILENAME: &str = "filename";

/// Serialization strategy for one family of runtime values.
///
/// `matches` decides whether the codec can handle a value (used for
/// automatic selection on write); `serialize`/`deserialize` perform the
/// conversion. Determinism is encouraged but not required: logically
/// identical values that serialize identically deduplicate to one stored
/// revision, while violations merely reduce dedup effectiveness.
pub trait ValueCodec: Send + Sync {
    /// Stable codec name, the first component of the descriptor.
    fn name(&self) -> &'static str;

    /// Descriptor persisted in the manifest, `"<name>"` or
    /// `"<name>:<params>"`. Parameters after `:` are codec-private.
    fn descriptor(&self) -> String {
        self.name().to_string()
    }

    /// Returns `true` if this codec can serialize the given value.
    fn matches(&self, value: &Value) -> bool;

    /// Serialize a value to bytes, recording descriptive metadata.
    fn serialize(&self, value: &Value, meta: &mut Metadata) -> ValueResult<Vec<u8>>;

    /// Reconstruct a value from bytes and the metadata stored with them.
    fn deserialize(&self, bytes: Vec<u8>, meta: &Metadata) -> ValueResult<Value>;
}

/// Identity codec for raw bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct BytesCodec;

impl ValueCodec for BytesCodec {
    fn name(&self) -> &'static str {
        "bytes"
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(value, Value::Bytes(_))
    }

    fn serialize(&self, value: &Value, _meta: &mut Metadata) -> ValueResult<Vec<u8>> {
        match value {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            other => Err(ValueError::UnsupportedValue(other.kind())),
        }
    }

    fn deserialize(&self, bytes: Vec<u8>, _meta: &Metadata) -> ValueResult<Value> {
        Ok(Value::Bytes(bytes))
    }
}

/// UTF-8 text codec. The encoding is recorded in metadata so readers can
/// tell how the bytes were produced.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextCodec;

impl ValueCodec for TextCodec {
    fn name(&self) -> &'static str {
        "text"
    }

    fn descriptor(&self) -> String {
        "text:utf-8".to_string()
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(value, Value::Text(_))
    }

    fn serialize(&self, value: &Value, meta: &mut Metadata) -> ValueResult<Vec<u8>> {
        match value {
            Value::Text(text) => {
                meta.insert(META_ENCODING, "utf-8");
                Ok(text.as_bytes().to_vec())
            }
            other => Err(ValueError::UnsupportedValue(other.kind())),
        }
    }

    fn deserialize(&self, bytes: Vec<u8>, _meta: &Metadata) -> ValueResult<Value> {
        let text = String::from_utf8(bytes)
            .map_err(|e| ValueError::Decode(format!("invalid utf-8: {e}")))?;
        Ok(Value::Text(text))
    }
}

/// JSON codec with compact, key-sorted encoding, so logically identical
/// values serialize identically and deduplicate.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(value, Value::Json(_))
    }

    fn serialize(&self, value: &Value, meta: &mut Metadata) -> ValueResult<Vec<u8>> {
        match value {
            Value::Json(json) => {
                meta.insert(META_MEDIA_TYPE, "application/json");
                serde_json::to_vec(json).map_err(|e| ValueError::Decode(e.to_string()))
            }
            other => Err(ValueError::UnsupportedValue(other.kind())),
        }
    }

    fn deserialize(&self, bytes: Vec<u8>, _meta: &Metadata) -> ValueResult<Value> {
        let json = serde_json::from_slice(&bytes)
            .map_err(|e| ValueError::Decode(format!("invalid json: {e}")))?;
        Ok(Value::Json(json))
    }
}

/// File codec: the value is the content of a local file.
///
/// `matches` only accepts paths that point at an existing regular file, so
/// a dangling path fails fast as unsupported instead of erroring mid-write.
/// On read the content is materialized into `target` if configured,
/// otherwise into a fresh temporary file the caller owns (and deletes).
#[derive(Clone, Debug, Default)]
pub struct FileCodec {
    target: Option<PathBuf>,
}

impl FileCodec {
    /// Codec materializing reads into temporary files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec materializing reads into the given path.
    pub fn into_path(target: impl Into<PathBuf>) -> Self {
        Self {
            target: Some(target.into()),
        }
    }
}

impl ValueCodec for FileCodec {
    fn name(&self) -> &'static str {
        "file"
    }

    fn matches(&self, value: &Value) -> bool {
        match value {
            Value::File(path) => path.is_file(),
            _ => false,
        }
    }

    fn serialize(&self, value: &Value, meta: &mut Metadata) -> ValueResult<Vec<u8>> {
        match value {
            Value::File(path) => {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    meta.insert(META_FILENAME, name);
                }
                Ok(fs::read(path)?)
            }
            other => Err(ValueError::UnsupportedValue(other.kind())),
        }
    }

    fn deserialize(&self, bytes: Vec<u8>, _meta: &Metadata) -> ValueResult<Value> {
        let path = match &self.target {
            Some(target) => {
                fs::write(target, &bytes)?;
                target.clone()
            }
            None => {
                let mut tmp = tempfile::NamedTempFile::new()?;
                tmp.write_all(&bytes)?;
                tmp.flush()?;
                let (_, path) = tmp
                    .keep()
                    .map_err(|e| ValueError::Io(e.error))?;
                path
            }
        };
        Ok(Value::File(path))
    }
}
