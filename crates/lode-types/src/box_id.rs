//! Validated hierarchical box names.
//!
//! A box id names a logical slot for a time series of values, e.g.
//! `"dataset/train_features"`. Names are hierarchical with `/` separators
//! and must be safe to map onto filesystem paths:
//!
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot)
//! - Must not start or end with `.` or `/`
//! - Must not contain consecutive slashes (`//`)
//! - Components between slashes must be non-empty and not start with `.`
//! - Components must not be `LATEST` or `objects`, which are reserved for
//!   the on-disk layout

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Characters that are forbidden anywhere in a box id.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// Path components claimed by the on-disk layout (the latest pointer file
/// and the objects tree live inside each box directory).
const RESERVED_COMPONENTS: &[&str] = &["LATEST", "objects"];

/// The validated, hierarchical name of a box.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoxId(String);

impl BoxId {
    /// Create a box id, validating the name.
    ///
    /// # Examples
    ///
    /// ```
    /// use lode_types::BoxId;
    ///
    /// assert!(BoxId::new("dataset/train_features").is_ok());
    /// assert!(BoxId::new("").is_err());
    /// assert!(BoxId::new("bad..name").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_box_name(&name)?;
        Ok(Self(name))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path components of the hierarchical name.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Debug for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoxId({})", self.0)
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BoxId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for BoxId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Validate a box name, returning `Ok(())` if valid.
pub fn validate_box_name(name: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidBoxName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("box name must not be empty"));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(TypeError::InvalidBoxName {
                name: name.to_string(),
                reason: format!("contains forbidden character: {ch:?}"),
            });
        }
    }

    // `..` could escape the storage root when mapped to a path.
    if name.contains("..") {
        return Err(invalid("must not contain '..'"));
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid("must not start or end with '.'"));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid("must not start or end with '/'"));
    }

    if name.contains("//") {
        return Err(invalid("must not contain consecutive slashes '//'"));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid("path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(TypeError::InvalidBoxName {
                name: name.to_string(),
                reason: format!("component must not start with '.': {component:?}"),
            });
        }
        if RESERVED_COMPONENTS.contains(&component) {
            return Err(TypeError::InvalidBoxName {
                name: name.to_string(),
                reason: format!("reserved component: {component:?}"),
            });
        }
    }

    Ok(())
}
