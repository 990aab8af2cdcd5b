//! Compact line codec for backed-up items.
//!
//! Every attribute value is written as an object carrying one lowercase field
//! per variant. Fields for variants that are not populated are never emitted,
//! so a string attribute costs `{"s":"..."}` rather than ten placeholders:
//!
//! ```text
//! {"artist":{"s":"Queen"},"songs":{"ss":["Under pressure"]},"tags":{"l":[]}}
//! ```
//!
//! The translation between [`AttributeValue`] and [`WireValue`] is a pair of
//! pure functions ([`encode_value`], [`decode_value`]); `serde_json` is only
//! involved at the byte boundary ([`encode_item`], [`decode_item`]).
//! Attribute and map keys are emitted in sorted order so a given item always
//! encodes to the same bytes.

use std::collections::{BTreeMap, HashMap};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::attribute_value::AttributeValue;
use crate::types::Item;

/// Errors produced while decoding a backup line.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The line is not valid JSON or does not match the wire shape.
    #[error("invalid item JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A binary field does not hold valid base64.
    #[error("invalid base64 in '{field}' field: {source}")]
    Base64 {
        /// Wire field name (`b` or `bs`).
        field: &'static str,
        /// Underlying decode error.
        #[source]
        source: base64::DecodeError,
    },

    /// More than one variant field is present on a single value.
    #[error("attribute value has more than one type field: {fields:?}")]
    MultipleVariants {
        /// The populated wire fields.
        fields: Vec<&'static str>,
    },
}

/// Wire form of an attribute value.
///
/// At most one field is populated. Absent fields deserialize to `None`, which
/// is distinct from an empty collection: `{"l":[]}` is an empty list while
/// `{}` carries no list at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireValue {
    /// Binary, base64-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<String>,
    /// Boolean.
    #[serde(rename = "bool", skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
    /// Binary set, base64-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bs: Option<Vec<String>>,
    /// Number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// Number set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ns: Option<Vec<String>>,
    /// Null marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null: Option<bool>,
    /// String.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,
    /// String set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ss: Option<Vec<String>>,
    /// List.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l: Option<Vec<WireValue>>,
    /// Map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub m: Option<BTreeMap<String, WireValue>>,
}

impl WireValue {
    /// Names of the populated fields, in wire order.
    #[must_use]
    pub fn populated_fields(&self) -> Vec<&'static str> {
        let flags = [
            ("b", self.b.is_some()),
            ("bool", self.boolean.is_some()),
            ("bs", self.bs.is_some()),
            ("n", self.n.is_some()),
            ("ns", self.ns.is_some()),
            ("null", self.null.is_some()),
            ("s", self.s.is_some()),
            ("ss", self.ss.is_some()),
            ("l", self.l.is_some()),
            ("m", self.m.is_some()),
        ];
        flags
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }
}

/// Translate a value into its wire form.
#[must_use]
pub fn encode_value(value: &AttributeValue) -> WireValue {
    let mut wire = WireValue::default();
    match value {
        AttributeValue::B(b) => wire.b = Some(STANDARD.encode(b)),
        AttributeValue::Bool(b) => wire.boolean = Some(*b),
        AttributeValue::Bs(set) => {
            wire.bs = Some(set.iter().map(|b| STANDARD.encode(b)).collect());
        }
        AttributeValue::N(n) => wire.n = Some(n.clone()),
        AttributeValue::Ns(set) => wire.ns = Some(set.clone()),
        AttributeValue::Null(b) => wire.null = Some(*b),
        AttributeValue::S(s) => wire.s = Some(s.clone()),
        AttributeValue::Ss(set) => wire.ss = Some(set.clone()),
        AttributeValue::L(list) => wire.l = Some(list.iter().map(encode_value).collect()),
        AttributeValue::M(map) => {
            wire.m = Some(
                map.iter()
                    .map(|(k, v)| (k.clone(), encode_value(v)))
                    .collect(),
            );
        }
    }
    wire
}

/// Translate a wire value back into an [`AttributeValue`].
///
/// A wire value without any populated field is the explicit null.
pub fn decode_value(wire: WireValue) -> Result<AttributeValue, CodecError> {
    let fields = wire.populated_fields();
    if fields.len() > 1 {
        return Err(CodecError::MultipleVariants { fields });
    }

    let WireValue {
        b,
        boolean,
        bs,
        n,
        ns,
        null,
        s,
        ss,
        l,
        m,
    } = wire;

    if let Some(b) = b {
        return decode_binary("b", &b).map(AttributeValue::B);
    }
    if let Some(b) = boolean {
        return Ok(AttributeValue::Bool(b));
    }
    if let Some(set) = bs {
        let decoded = set
            .iter()
            .map(|b| decode_binary("bs", b))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(AttributeValue::Bs(decoded));
    }
    if let Some(n) = n {
        return Ok(AttributeValue::N(n));
    }
    if let Some(set) = ns {
        return Ok(AttributeValue::Ns(set));
    }
    if let Some(b) = null {
        return Ok(AttributeValue::Null(b));
    }
    if let Some(s) = s {
        return Ok(AttributeValue::S(s));
    }
    if let Some(set) = ss {
        return Ok(AttributeValue::Ss(set));
    }
    if let Some(list) = l {
        let decoded = list
            .into_iter()
            .map(decode_value)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(AttributeValue::L(decoded));
    }
    if let Some(map) = m {
        let decoded = map
            .into_iter()
            .map(|(k, v)| decode_value(v).map(|v| (k, v)))
            .collect::<Result<HashMap<_, _>, _>>()?;
        return Ok(AttributeValue::M(decoded));
    }

    Ok(AttributeValue::Null(true))
}

/// Encode an item as one JSON line (without the trailing newline).
pub fn encode_item(item: &Item) -> Result<Vec<u8>, CodecError> {
    let wire: BTreeMap<&str, WireValue> = item
        .iter()
        .map(|(k, v)| (k.as_str(), encode_value(v)))
        .collect();
    Ok(serde_json::to_vec(&wire)?)
}

/// Decode one JSON line into an item.
pub fn decode_item(line: &[u8]) -> Result<Item, CodecError> {
    let wire: BTreeMap<String, WireValue> = serde_json::from_slice(line)?;
    wire.into_iter()
        .map(|(k, v)| decode_value(v).map(|v| (k, v)))
        .collect()
}

fn decode_binary(field: &'static str, encoded: &str) -> Result<Bytes, CodecError> {
    STANDARD
        .decode(encoded)
        .map(Bytes::from)
        .map_err(|source| CodecError::Base64 { field, source })
}
