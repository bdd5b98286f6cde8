//! Loosely typed field values as they travel over the wire.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;
use std::collections::BTreeMap;
use std::fmt;

/// A single JSON-shaped value held by an entity field.
///
/// Mirrors JSON one to one, except that numbers are split into [`FieldValue::Integer`]
/// (anything that fits an `i64`) and [`FieldValue::Float`] (everything else).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// JSON `null`
    #[default]
    Null,
    /// JSON `true`/`false`
    Boolean(bool),
    /// Integral JSON number within the `i64` range
    Integer(i64),
    /// Any other JSON number
    Float(f64),
    /// JSON string
    String(SmolStr),
    /// JSON array
    Array(Vec<FieldValue>),
    /// JSON object
    Object(BTreeMap<SmolStr, FieldValue>),
}

/// The shape of a [`FieldValue`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `null`
    Null,
    /// boolean
    Boolean,
    /// integer
    Integer,
    /// float
    Float,
    /// string
    String,
    /// array
    Array,
    /// object
    Object,
}

impl ValueKind {
    /// Lower-case name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FieldValue {
    /// Shape of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Null => ValueKind::Null,
            FieldValue::Boolean(_) => ValueKind::Boolean,
            FieldValue::Integer(_) => ValueKind::Integer,
            FieldValue::Float(_) => ValueKind::Float,
            FieldValue::String(_) => ValueKind::String,
            FieldValue::Array(_) => ValueKind::Array,
            FieldValue::Object(_) => ValueKind::Object,
        }
    }

    /// `true` for [`FieldValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Borrow the string, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The integer, if this is one
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The number as a float; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The boolean, if this is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the elements, if this is an array
    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Borrow the members, if this is an object
    pub fn as_object(&self) -> Option<&BTreeMap<SmolStr, FieldValue>> {
        match self {
            FieldValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Convert into a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.clone())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

macro_rules! value_from_prim {
    ($variant:ident, $($ty:ty),+) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::$variant(v.into())
                }
            }
        )+
    };
}

value_from_prim!(Boolean, bool);
value_from_prim!(Integer, i8, i16, i32, i64, u8, u16, u32);
value_from_prim!(Float, f32, f64);
value_from_prim!(String, &str, String, SmolStr);

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl From<BTreeMap<SmolStr, FieldValue>> for FieldValue {
    fn from(map: BTreeMap<SmolStr, FieldValue>) -> Self {
        FieldValue::Object(map)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::String(s.into()),
            Value::Array(items) => FieldValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => FieldValue::Object(
                map.into_iter()
                    .map(|(k, v)| (SmolStr::from(k), v.into()))
                    .collect(),
            ),
        }
    }
}

impl From<FieldValue> for serde_json::Value {
    fn from(value: FieldValue) -> Self {
        use serde_json::Value;
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Boolean(b) => Value::Bool(b),
            FieldValue::Integer(i) => Value::from(i),
            // non-finite floats have no JSON form
            FieldValue::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::String(s) => Value::String(s.to_string()),
            FieldValue::Array(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            FieldValue::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k.to_string(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Float(f) => serializer.serialize_f64(*f),
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Array(items) => items.serialize(serializer),
            FieldValue::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    /// Only self-describing formats are supported.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

struct FieldValueVisitor;

impl<'de> serde::de::Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(FieldValue::Null)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(FieldValue::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Deserialize::deserialize(deserializer)
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(FieldValue::Boolean(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(FieldValue::Integer(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(i64::try_from(v)
            .map(FieldValue::Integer)
            .unwrap_or(FieldValue::Float(v as f64)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(FieldValue::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(FieldValue::String(SmolStr::new(v)))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(FieldValue::String(v.into()))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(FieldValue::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut members = BTreeMap::new();
        while let Some((key, value)) = map.next_entry::<SmolStr, FieldValue>()? {
            members.insert(key, value);
        }
        Ok(FieldValue::Object(members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_numbers_split_by_range() {
        let v: FieldValue = serde_json::from_str("[1, -7, 2.5, 18446744073709551615]").unwrap();
        let items = v.as_array().unwrap();
        assert_eq!(items[0], FieldValue::Integer(1));
        assert_eq!(items[1], FieldValue::Integer(-7));
        assert_eq!(items[2], FieldValue::Float(2.5));
        assert_eq!(items[3].kind(), ValueKind::Float);
    }

    #[test]
    fn nested_payload_survives_reencoding() {
        let text = r#"{"active":true,"count":3,"ratio":0.125,"tags":["a","b"],"inner":{"x":null}}"#;
        let v: FieldValue = serde_json::from_str(text).unwrap();
        let back = serde_json::to_string(&v).unwrap();
        let again: FieldValue = serde_json::from_str(&back).unwrap();
        assert_eq!(v, again);
        assert_eq!(
            v.as_object().unwrap()["inner"].as_object().unwrap()["x"],
            FieldValue::Null
        );
    }

    #[test]
    fn conversions_from_rust_types() {
        assert_eq!(FieldValue::from("x"), FieldValue::String("x".into()));
        assert_eq!(FieldValue::from(3u8), FieldValue::Integer(3));
        assert_eq!(FieldValue::from(None::<bool>), FieldValue::Null);
        assert_eq!(
            FieldValue::from(vec!["a", "b"]),
            FieldValue::Array(vec!["a".into(), "b".into()])
        );
        assert_eq!(FieldValue::Integer(4).as_float(), Some(4.0));
    }

    #[test]
    fn display_prints_strings_bare() {
        assert_eq!(FieldValue::from("Graffiti ").to_string(), "Graffiti ");
        assert_eq!(FieldValue::from(vec![1, 2]).to_string(), "[1,2]");
    }
}
