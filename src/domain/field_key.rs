//! Field keys discriminating attribute, element, value, and unknown heap
//! fields (part of C2's abstract domain).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminator for a heap field.
///
/// Invariant: `Attr` requires a non-empty name; `Elem`, `Value`, `Unknown`
/// carry no name. No two distinct variants compare equal, and `Attr(name)`
/// is only ever constructed with `name` non-empty (enforced at the
/// constructor, see [`FieldKey::attr`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    /// Named attribute access: `obj.name`.
    Attr(String),
    /// List/tuple/set element field.
    Elem,
    /// Dict value field.
    Value,
    /// Dynamic attribute access collapsed to a single field.
    Unknown,
}

impl FieldKey {
    /// Build an `Attr` field key, panicking on an empty name since that
    /// would violate the field-key discipline invariant. Adapters should
    /// route empty/absent attribute names through `unknown()`.
    pub fn attr(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "attr field key requires a non-empty name");
        Self::Attr(name)
    }

    pub fn elem() -> Self {
        Self::Elem
    }

    pub fn value() -> Self {
        Self::Value
    }

    pub fn unknown() -> Self {
        Self::Unknown
    }

    /// Map a field-name token from an event (`"elem"`, `"value"`,
    /// `"unknown"`, or any other string naming an attribute) to a field
    /// key. An empty token also routes to `Unknown`, so a malformed
    /// `attr_load`/`attr_store` event never reaches the panicking
    /// `attr()` constructor.
    pub fn from_token(token: &str) -> Self {
        match token {
            "elem" => Self::Elem,
            "value" => Self::Value,
            "unknown" | "" => Self::Unknown,
            other => Self::attr(other),
        }
    }

    /// Map a container kind (from `elem_load`/`elem_store`/container
    /// constructor summaries) to its field per the container map.
    pub fn for_container_kind(kind: &str) -> Self {
        match kind {
            "dict" => Self::Value,
            _ => Self::Elem,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attr(name) => write!(f, "attr({name})"),
            Self::Elem => write!(f, "elem"),
            Self::Value => write!(f, "value"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_are_pairwise_distinct() {
        let keys = [
            FieldKey::attr("x"),
            FieldKey::elem(),
            FieldKey::value(),
            FieldKey::unknown(),
        ];
        for i in 0..keys.len() {
            for j in 0..keys.len() {
                if i != j {
                    assert_ne!(keys[i], keys[j]);
                }
            }
        }
    }

    #[test]
    #[should_panic]
    fn attr_requires_nonempty_name() {
        FieldKey::attr("");
    }

    #[test]
    fn token_mapping() {
        assert_eq!(FieldKey::from_token("elem"), FieldKey::Elem);
        assert_eq!(FieldKey::from_token("value"), FieldKey::Value);
        assert_eq!(FieldKey::from_token("unknown"), FieldKey::Unknown);
        assert_eq!(FieldKey::from_token("f"), FieldKey::attr("f"));
        assert_eq!(FieldKey::from_token(""), FieldKey::Unknown);
    }

    #[test]
    fn container_kind_mapping() {
        assert_eq!(FieldKey::for_container_kind("dict"), FieldKey::Value);
        assert_eq!(FieldKey::for_container_kind("list"), FieldKey::Elem);
        assert_eq!(FieldKey::for_container_kind("set"), FieldKey::Elem);
        assert_eq!(FieldKey::for_container_kind("tuple"), FieldKey::Elem);
    }
}
