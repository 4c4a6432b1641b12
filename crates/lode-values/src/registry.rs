use std::sync::Arc;

use crate::codec::{BytesCodec, FileCodec, JsonCodec, TextCodec, ValueCodec};
use crate::error::{ValueError, ValueResult};
use crate::value::Value;

/// Ordered collection of value codecs.
///
/// Resolution is most-specific-first: codecs registered later are consulted
/// before earlier ones, so a custom codec registered on top of the defaults
/// wins for any value it matches. On read, codecs are selected by the
/// descriptor recorded in the manifest instead.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn ValueCodec>>,
}

impl CodecRegistry {
    /// Registry pre-loaded with the built-in codecs.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(BytesCodec);
        registry.register(TextCodec);
        registry.register(JsonCodec);
        registry.register(FileCodec::new());
        registry
    }

    /// Registry with no codecs at all.
    pub fn empty() -> Self {
        Self { codecs: Vec::new() }
    }

    /// Register a codec with higher priority than all existing ones.
    pub fn register(&mut self, codec: impl ValueCodec + 'static) {
        self.codecs.insert(0, Arc::new(codec));
    }

    /// Number of registered codecs.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Select the codec for a value on write. The first codec whose
    /// `matches` accepts the value wins.
    pub fn resolve(&self, value: &Value) -> ValueResult<Arc<dyn ValueCodec>> {
        self.codecs
            .iter()
            .find(|codec| codec.matches(value))
            .cloned()
            .ok_or(ValueError::UnsupportedValue(value.kind()))
    }

    /// Select the codec for a persisted descriptor on read. Only the name
    /// before any `:` is compared, so parameterized descriptors like
    /// `"text:utf-8"` resolve to their codec by name.
    pub fn by_descriptor(&self, descriptor: &str) -> ValueResult<Arc<dyn ValueCodec>> {
        let name = descriptor.split(':').next().unwrap_or(descriptor);
        self.codecs
            .iter()
            .find(|codec| codec.name() == name)
            .cloned()
            .ok_or_else(|| ValueError::UnknownDescriptor(descriptor.to_string()))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.codecs.iter().map(|c| c.descriptor()))
            .finish()
    }
}
