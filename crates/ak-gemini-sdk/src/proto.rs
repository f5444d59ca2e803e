// SPDX-License-Identifier: MIT OR Apache-2.0
//! The vendor's nested key-value type for function-call arguments.
//!
//! Gemini transports `FunctionCall.args` as a `google.protobuf.Struct`:
//! an insertion-ordered map whose values are null, bool, double, string,
//! list, or another struct. [`ProtoStruct`] and [`ProtoValue`] model that
//! shape. Plain data comes out of them through [`crate::walker`].

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A `google.protobuf.Value`.
///
/// Serializing a non-finite number fails, the same way the walker rejects it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum ProtoValue {
    /// `null_value`.
    Null,
    /// `bool_value`.
    Bool(bool),
    /// `number_value`; protobuf numbers are always doubles.
    Number(f64),
    /// `string_value`.
    String(String),
    /// `list_value`.
    List(ProtoList),
    /// `struct_value`.
    Struct(ProtoStruct),
}

/// A `google.protobuf.ListValue`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct ProtoList {
    values: Vec<ProtoValue>,
}

/// A `google.protobuf.Struct` with keys kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct ProtoStruct {
    fields: Vec<(String, ProtoValue)>,
}

impl ProtoStruct {
    /// An empty struct.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ProtoValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Builder form of [`ProtoStruct::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ProtoValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ProtoValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProtoValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` when the struct has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<ProtoValue>> FromIterator<(K, V)> for ProtoStruct {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut s = Self::new();
        for (k, v) in iter {
            s.insert(k, v);
        }
        s
    }
}

impl ProtoList {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value.
    pub fn push(&mut self, value: impl Into<ProtoValue>) {
        self.values.push(value.into());
    }

    /// Values in order.
    #[must_use]
    pub fn as_slice(&self) -> &[ProtoValue] {
        &self.values
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<V: Into<ProtoValue>> FromIterator<V> for ProtoList {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Conversions into ProtoValue ─────────────────────────────────────────

impl From<bool> for ProtoValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for ProtoValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for ProtoValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for ProtoValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for ProtoValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<ProtoList> for ProtoValue {
    fn from(v: ProtoList) -> Self {
        Self::List(v)
    }
}

impl From<ProtoStruct> for ProtoValue {
    fn from(v: ProtoStruct) -> Self {
        Self::Struct(v)
    }
}

// ── JSON interop (serde) ────────────────────────────────────────────────

impl From<Value> for ProtoValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or_default()),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().collect()),
            Value::Object(map) => Self::Struct(map.into_iter().collect()),
        }
    }
}

impl TryFrom<Value> for ProtoStruct {
    type Error = String;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match ProtoValue::from(v) {
            ProtoValue::Struct(s) => Ok(s),
            _ => Err("expected a JSON object for a protobuf Struct".into()),
        }
    }
}

impl TryFrom<Value> for ProtoList {
    type Error = String;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match ProtoValue::from(v) {
            ProtoValue::List(l) => Ok(l),
            _ => Err("expected a JSON array for a protobuf ListValue".into()),
        }
    }
}

impl Serialize for ProtoValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProtoValue::Null => serializer.serialize_unit(),
            ProtoValue::Bool(b) => serializer.serialize_bool(*b),
            ProtoValue::Number(n) => match number_to_json(*n) {
                Some(v) => v.serialize(serializer),
                None => Err(S::Error::custom(format!("non-finite number {n} has no JSON form"))),
            },
            ProtoValue::String(s) => serializer.serialize_str(s),
            ProtoValue::List(l) => l.serialize(serializer),
            ProtoValue::Struct(s) => s.serialize(serializer),
        }
    }
}

impl Serialize for ProtoList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.values)
    }
}

impl Serialize for ProtoStruct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Lossy: non-finite numbers become `null`. Use [`crate::walker`] or
/// serde serialization where they must be rejected.
impl From<ProtoValue> for Value {
    fn from(v: ProtoValue) -> Self {
        match v {
            ProtoValue::Null => Value::Null,
            ProtoValue::Bool(b) => Value::Bool(b),
            ProtoValue::Number(n) => number_to_json(n).unwrap_or(Value::Null),
            ProtoValue::String(s) => Value::String(s),
            ProtoValue::List(l) => l.into(),
            ProtoValue::Struct(s) => s.into(),
        }
    }
}

impl From<ProtoList> for Value {
    fn from(l: ProtoList) -> Self {
        Value::Array(l.values.into_iter().map(Value::from).collect())
    }
}

impl From<ProtoStruct> for Value {
    fn from(s: ProtoStruct) -> Self {
        Value::Object(s.fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
    }
}

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Convert a protobuf double to a JSON number.
///
/// Integral values within the exact-integer range become JSON integers so
/// `1` stays `1` after a trip through the vendor type. Non-finite values have
/// no JSON form and yield `None`.
pub(crate) fn number_to_json(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Some(Value::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(Value::Number)
}
