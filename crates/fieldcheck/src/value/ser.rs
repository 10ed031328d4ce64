use serde::ser::{self, Serialize};

use super::{Record, Value};

/// Returned when a record cannot be converted into a [`Value`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ValueError {
    /// The `Serialize` implementation reported an error.
    #[error("{0}")]
    Message(String),

    /// A map key is not a string, char, integer or boolean.
    #[error("cannot use {0} as a record key")]
    InvalidKey(super::Kind),

    /// A signed integer does not fit in 64 bits.
    #[error("integer {0} does not fit in 64 bits")]
    IntegerOverflow(i128),

    /// An unsigned integer does not fit in 64 bits.
    #[error("integer {0} does not fit in 64 bits")]
    UnsignedOverflow(u128),
}

impl ser::Error for ValueError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self::Message(msg.to_string())
    }
}

type Result<T> = std::result::Result<T, ValueError>;

/// Convert any serializable value into a [`Value`].
///
/// Unlike `serde_json::to_value`, integers and floats stay distinct and
/// non-finite floats are preserved.
///
/// # Errors
///
/// Returns a [`ValueError`] when the `Serialize` implementation fails, a map
/// key has an unsupported kind, or a 128-bit integer is out of range.
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(Serializer)
}

#[derive(Clone, Copy)]
struct Serializer;

fn variant_record(variant: &'static str, value: Value) -> Value {
    let mut record = Record::with_capacity(1);
    record.insert(variant.to_string(), value);
    Value::Record(record)
}

impl ser::Serializer for Serializer {
    type Ok = Value;
    type Error = ValueError;

    type SerializeSeq = SerializeList;
    type SerializeTuple = SerializeList;
    type SerializeTupleStruct = SerializeList;
    type SerializeTupleVariant = SerializeVariant<SerializeList>;
    type SerializeMap = SerializeRecord;
    type SerializeStruct = SerializeRecord;
    type SerializeStructVariant = SerializeVariant<SerializeRecord>;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        if let Ok(v) = i64::try_from(v) {
            return Ok(Value::Int(v));
        }
        u64::try_from(v)
            .map(Value::UInt)
            .map_err(|_| ValueError::IntegerOverflow(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        u64::try_from(v)
            .map(Value::from)
            .map_err(|_| ValueError::UnsignedOverflow(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::List(v.iter().map(|&b| Value::Int(i64::from(b))).collect()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(variant_record(variant, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SerializeList {
            values: Vec::with_capacity(len.unwrap_or_default()),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(SerializeVariant {
            variant,
            inner: SerializeList {
                values: Vec::with_capacity(len),
            },
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(SerializeRecord {
            record: Record::with_capacity(len.unwrap_or_default()),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(SerializeVariant {
            variant,
            inner: SerializeRecord {
                record: Record::with_capacity(len),
                next_key: None,
            },
        })
    }
}

pub struct SerializeList {
    values: Vec<Value>,
}

impl SerializeList {
    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.values.push(value.serialize(Serializer)?);
        Ok(())
    }
}

impl ser::SerializeSeq for SerializeList {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::List(self.values))
    }
}

impl ser::SerializeTuple for SerializeList {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::List(self.values))
    }
}

impl ser::SerializeTupleStruct for SerializeList {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::List(self.values))
    }
}

pub struct SerializeRecord {
    record: Record,
    next_key: Option<String>,
}

impl SerializeRecord {
    fn insert<T>(&mut self, key: String, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.record.insert(key, value.serialize(Serializer)?);
        Ok(())
    }
}

fn record_key(key: Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Int(v) => Ok(v.to_string()),
        Value::UInt(v) => Ok(v.to_string()),
        Value::Bool(v) => Ok(v.to_string()),
        other => Err(ValueError::InvalidKey(other.kind())),
    }
}

impl ser::SerializeMap for SerializeRecord {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.next_key = Some(record_key(key.serialize(Serializer)?)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self.next_key.take().ok_or_else(|| {
            ValueError::Message("serialize_value called before serialize_key".to_string())
        })?;
        self.insert(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Record(self.record))
    }
}

impl ser::SerializeStruct for SerializeRecord {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.insert(key.to_string(), value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Record(self.record))
    }
}

/// Wraps the content of a data-carrying enum variant in a one-entry record.
pub struct SerializeVariant<S> {
    variant: &'static str,
    inner: S,
}

impl ser::SerializeTupleVariant for SerializeVariant<SerializeList> {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.inner.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(variant_record(self.variant, Value::List(self.inner.values)))
    }
}

impl ser::SerializeStructVariant for SerializeVariant<SerializeRecord> {
    type Ok = Value;
    type Error = ValueError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.inner.insert(key.to_string(), value)
    }

    fn end(self) -> Result<Value> {
        Ok(variant_record(self.variant, Value::Record(self.inner.record)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{ValueError, to_value};
    use crate::value::{Kind, Value};
    use pretty_assertions::assert_eq;
    use serde::Serialize;

    #[derive(Serialize)]
    struct User {
        name: String,
        age: u8,
        score: f32,
        tags: Vec<&'static str>,
        nickname: Option<String>,
        status: Status,
    }

    #[derive(Serialize)]
    enum Status {
        Active,
        Banned { reason: String },
    }

    #[test]
    fn structs_become_ordered_records() {
        let user = User {
            name: "John".to_string(),
            age: 30,
            score: 1.5,
            tags: vec!["a", "b"],
            nickname: None,
            status: Status::Active,
        };

        let value = to_value(&user).expect("user serializes");
        let record = value.as_record().expect("struct is a record");
        let keys: Vec<_> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "age", "score", "tags", "nickname", "status"]);
        assert_eq!(record["age"], Value::Int(30));
        assert_eq!(record["score"], Value::Float(1.5));
        assert_eq!(record["tags"], Value::from(vec!["a", "b"]));
        assert_eq!(record["nickname"], Value::Null);
        assert_eq!(record["status"], Value::from("Active"));
    }

    #[test]
    fn references_serialize_like_values() {
        let user = User {
            name: "Jane".to_string(),
            age: 41,
            score: 0.0,
            tags: Vec::new(),
            nickname: Some("J".to_string()),
            status: Status::Banned {
                reason: "spam".to_string(),
            },
        };
        assert_eq!(to_value(&&user).ok(), to_value(&user).ok());
        let value = to_value(&user).expect("user serializes");
        assert_eq!(
            value.get("status").and_then(|s| s.get("Banned")).and_then(|b| b.get("reason")),
            Some(&Value::from("spam"))
        );
    }

    #[test]
    fn non_finite_floats_survive() {
        let value = to_value(&f64::INFINITY).expect("float serializes");
        assert_eq!(value, Value::Float(f64::INFINITY));
    }

    #[test]
    fn integer_map_keys_are_stringified() {
        let map = BTreeMap::from([(1, "one"), (2, "two")]);
        let value = to_value(&map).expect("map serializes");
        assert_eq!(value.get("2"), Some(&Value::from("two")));
    }

    #[test]
    fn composite_map_keys_are_rejected() {
        let map = BTreeMap::from([((1, 2), "pair")]);
        let err = to_value(&map).expect_err("tuple keys are not record keys");
        assert!(matches!(err, ValueError::InvalidKey(Kind::List)));
    }

    #[test]
    fn oversized_integers_are_rejected() {
        assert_eq!(to_value(&u128::from(u64::MAX)).ok(), Some(Value::UInt(u64::MAX)));
        assert!(matches!(
            to_value(&i128::MIN),
            Err(ValueError::IntegerOverflow(_))
        ));

        let err = to_value(&u128::MAX).expect_err("u128::MAX is out of range");
        assert!(matches!(err, ValueError::UnsignedOverflow(u128::MAX)));
        assert_eq!(
            err.to_string(),
            "integer 340282366920938463463374607431768211455 does not fit in 64 bits"
        );
    }
}
