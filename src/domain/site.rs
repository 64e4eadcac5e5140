//! Site identifiers and call sites.
//!
//! Canonical form `"<file>:<line>:<col>:<kind>"`; a fallback form
//! `"<file-stem>:<op>:<hex-uid>"` is used when no source position is known.
//! Site IDs are opaque strings as far as the engine is concerned, but we
//! intern them so that hashing and equality in the hot path are cheap.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// An interned site identifier.
///
/// Comparisons and hashing operate on the interned string, so two
/// `SiteId`s built from the same text are equal regardless of how they
/// were constructed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SiteId(pub(crate) String);

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(1);

impl SiteId {
    /// Canonical form: `file:line:col:kind`.
    pub fn canonical(file: &str, line: u32, col: u32, kind: &str) -> Self {
        Self(format!("{file}:{line}:{col}:{kind}"))
    }

    /// Fallback form used when source position is missing: `file-stem:op:hex-uid`.
    pub fn fallback(file_stem: &str, op: &str) -> Self {
        let uid = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{file_stem}:{op}:{uid:x}"))
    }

    /// Wrap an already-formed site token verbatim (used when the adapter
    /// hands us a pre-built ID).
    pub fn raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SiteId {
    fn from(s: &str) -> Self {
        Self::raw(s)
    }
}

impl From<String> for SiteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A call site: the syntactic location of a `call` event plus enough
/// context to distinguish multiple calls in the same block.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallSite {
    pub site_id: SiteId,
    /// Name of the syntactic enclosing function.
    pub func: String,
    /// Enclosing block, if the adapter tracks one.
    pub block: Option<String>,
    /// Index of this call within its block, for ordering.
    pub idx: u32,
}

impl CallSite {
    pub fn new(site_id: SiteId, func: impl Into<String>, idx: u32) -> Self {
        Self {
            site_id,
            func: func.into(),
            block: None,
            idx,
        }
    }

    pub fn with_block(mut self, block: impl Into<String>) -> Self {
        self.block = Some(block.into());
        self
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.site_id, self.func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form() {
        let s = SiteId::canonical("a.py", 10, 4, "obj");
        assert_eq!(s.as_str(), "a.py:10:4:obj");
    }

    #[test]
    fn fallback_ids_are_unique() {
        let a = SiteId::fallback("a", "call");
        let b = SiteId::fallback("a", "call");
        assert_ne!(a, b);
    }

    #[test]
    fn equality_is_by_string() {
        let a = SiteId::raw("x:1:2:obj");
        let b = SiteId::canonical("x", 1, 2, "obj");
        assert_eq!(a, b);
    }
}
