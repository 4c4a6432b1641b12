//! Invertible transformer pipeline for the lode artifact store.
//!
//! Transformers sit between the serialized value and the storage backend.
//! Each stage has a `forward` operation applied on write and an `inverse`
//! operation applied on read, with `inverse(forward(x)) == x` required for
//! every conforming stage. A [`Pipeline`] runs its stages in configured
//! order on write and in exactly reversed order on read.
//!
//! # Stages
//!
//! - [`ChecksumTransformer`] -- computes a BLAKE3 digest on write and
//!   verifies it on read; the load-bearing corruption check.
//! - [`StatisticsTransformer`] -- records observational metadata (byte
//!   size); a pass-through on read.
//!
//! New stage kinds are added as new [`Transformer`] variants, not via
//! trait objects: the set of stages is explicit and order-sensitive.

pub mod error;
pub mod pipeline;
pub mod transformer;

pub use error::{PipeError, PipeResult};
pub use pipeline::Pipeline;
pub use transformer::{
    ChecksumTransformer, StatisticsTransformer, Transformer, META_CHECKSUM, META_SIZE,
};
