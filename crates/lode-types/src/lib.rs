//! Foundation types for the lode artifact store.
//!
//! This crate provides the identity, metadata, and manifest types used
//! throughout the lode system. Every other lode crate depends on
//! `lode-types`.
//!
//! # Key Types
//!
//! - [`BoxId`] — Validated hierarchical name of a logical artifact slot
//! - [`RevisionId`] — Content-addressed identifier (BLAKE3 hash)
//! - [`RunId`] — UUID v7 identifier correlating one pipeline execution
//! - [`Metadata`] — Ordered string-to-JSON map carried alongside bytes
//! - [`Revision`] — Immutable manifest describing one stored revision
//! - [`RevisionRef`] — A `(box, revision)` pair, the unit of lineage edges

pub mod box_id;
pub mod error;
pub mod manifest;
pub mod metadata;
pub mod revision;
pub mod run;

pub use box_id::BoxId;
pub use error::TypeError;
pub use manifest::{Revision, RevisionRef};
pub use metadata::Metadata;
pub use revision::RevisionId;
pub use run::RunId;
