//! DynamoDB `AttributeValue` type.
//!
//! `AttributeValue` is a tagged union where exactly one variant is present.
//! It has no serde implementation of its own: the on-disk representation is
//! owned by [`crate::codec`], which translates to and from [`crate::WireValue`].

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

/// DynamoDB attribute value.
///
/// Represented as a tagged union where exactly one variant is present.
/// Numbers are always string-encoded to preserve arbitrary precision.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Binary value.
    B(Bytes),
    /// Boolean value.
    Bool(bool),
    /// Binary Set.
    Bs(Vec<Bytes>),
    /// Number value (string-encoded for arbitrary precision).
    N(String),
    /// Number Set (string-encoded).
    Ns(Vec<String>),
    /// Explicit null marker.
    Null(bool),
    /// String value.
    S(String),
    /// String Set.
    Ss(Vec<String>),
    /// List of attribute values.
    L(Vec<AttributeValue>),
    /// Map of attribute values.
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Returns `true` if this is a null value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(true))
    }

    /// Returns the string value if this is an `S` variant.
    #[must_use]
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number string if this is an `N` variant.
    #[must_use]
    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the bytes if this is a `B` variant.
    #[must_use]
    pub fn as_b(&self) -> Option<&Bytes> {
        match self {
            Self::B(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the map if this is an `M` variant.
    #[must_use]
    pub fn as_m(&self) -> Option<&HashMap<String, AttributeValue>> {
        match self {
            Self::M(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the list if this is an `L` variant.
    #[must_use]
    pub fn as_l(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::L(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the DynamoDB type descriptor string (e.g., "S", "N", "BOOL").
    #[must_use]
    pub fn type_descriptor(&self) -> &'static str {
        match self {
            Self::B(_) => "B",
            Self::Bool(_) => "BOOL",
            Self::Bs(_) => "BS",
            Self::N(_) => "N",
            Self::Ns(_) => "NS",
            Self::Null(_) => "NULL",
            Self::S(_) => "S",
            Self::Ss(_) => "SS",
            Self::L(_) => "L",
            Self::M(_) => "M",
        }
    }

    /// Nesting depth of this value. Scalars and sets are depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::L(list) => 1 + list.iter().map(Self::depth).max().unwrap_or(0),
            Self::M(map) => 1 + map.values().map(Self::depth).max().unwrap_or(0),
            _ => 1,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::B(b) => write!(f, "{{B: {} bytes}}", b.len()),
            Self::Bool(b) => write!(f, "{{BOOL: {b}}}"),
            Self::Bs(v) => write!(f, "{{BS: {} items}}", v.len()),
            Self::N(n) => write!(f, "{{N: {n}}}"),
            Self::Ns(v) => write!(f, "{{NS: {v:?}}}"),
            Self::Null(b) => write!(f, "{{NULL: {b}}}"),
            Self::S(s) => write!(f, "{{S: {s}}}"),
            Self::Ss(v) => write!(f, "{{SS: {v:?}}}"),
            Self::L(v) => write!(f, "{{L: {} items}}", v.len()),
            Self::M(m) => write!(f, "{{M: {} keys}}", m.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_report_type_descriptor() {
        assert_eq!(AttributeValue::S("a".to_owned()).type_descriptor(), "S");
        assert_eq!(AttributeValue::Bool(false).type_descriptor(), "BOOL");
        assert_eq!(AttributeValue::Null(true).type_descriptor(), "NULL");
        assert_eq!(AttributeValue::M(HashMap::new()).type_descriptor(), "M");
    }

    #[test]
    fn test_should_compare_nested_values_structurally() {
        let mut left = HashMap::new();
        left.insert(
            "tags".to_owned(),
            AttributeValue::L(vec![AttributeValue::S("x".to_owned())]),
        );
        let right = left.clone();
        assert_eq!(AttributeValue::M(left), AttributeValue::M(right));
        assert_ne!(
            AttributeValue::L(vec![]),
            AttributeValue::M(HashMap::new())
        );
    }

    #[test]
    fn test_should_compute_depth() {
        let inner = AttributeValue::L(vec![AttributeValue::N("1".to_owned())]);
        let mut m = HashMap::new();
        m.insert("inner".to_owned(), inner);
        let outer = AttributeValue::L(vec![AttributeValue::M(m)]);
        assert_eq!(outer.depth(), 4);
        assert_eq!(AttributeValue::L(vec![]).depth(), 1);
    }

    #[test]
    fn test_should_display_summary() {
        let val = AttributeValue::B(Bytes::from_static(b"abc"));
        assert_eq!(val.to_string(), "{B: 3 bytes}");
        assert!(AttributeValue::Null(true).is_null());
        assert!(!AttributeValue::Null(false).is_null());
    }
}
