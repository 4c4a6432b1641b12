//! Value codecs for the lode artifact store.
//!
//! A [`ValueCodec`] maps a runtime [`Value`] to serialized bytes plus
//! descriptive metadata, and back. The [`CodecRegistry`] picks the codec for
//! a value most-specific-first: explicitly registered codecs are consulted
//! before the always-present defaults, and the first whose `matches` accepts
//! the value wins.
//!
//! The persisted manifest records each codec's descriptor string (e.g.
//! `"text:utf-8"`); on read the registry selects the codec by that
//! descriptor, so a value loads with the same strategy it was stored with.
//!
//! Built-in codecs cover bytes, UTF-8 text, JSON values and files. Adapters
//! for richer external data formats implement [`ValueCodec`] and register
//! themselves; nothing in the core depends on them.

pub mod codec;
pub mod error;
pub mod registry;
pub mod value;

pub use codec::{BytesCodec, FileCodec, JsonCodec, TextCodec, ValueCodec};
pub use error::{ValueError, ValueResult};
pub use registry::CodecRegistry;
pub use value::Value;
