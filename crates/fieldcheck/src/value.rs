//! The closed value model rules are evaluated against.
//!
//! Records are converted into a [`Value`] tree with [`to_value`] before a
//! schema runs, so rules only ever pattern-match on a handful of variants.

mod ser;

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;

pub use ser::{ValueError, to_value};

/// A record: field names mapped to values, in declaration order.
pub type Record = IndexMap<String, Value>;

/// A dynamically typed value extracted from a record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// `None`, `()` or a unit struct.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer of any width.
    Int(i64),
    /// An unsigned integer that does not fit in `i64`.
    UInt(u64),
    /// A floating-point number of any width.
    Float(f64),
    /// A string or char.
    String(String),
    /// A sequence, tuple or byte string.
    List(Vec<Value>),
    /// A struct or string-keyed map.
    Record(Record),
}

/// The representational kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// [`Value::Null`]
    Null,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Int`] or [`Value::UInt`]
    Integer,
    /// [`Value::Float`]
    Float,
    /// [`Value::String`]
    String,
    /// [`Value::List`]
    List,
    /// [`Value::Record`]
    Record,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::List => "array",
            Self::Record => "record",
        })
    }
}

impl Value {
    /// Returns the kind of this value.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Bool(_) => Kind::Bool,
            Self::Int(_) | Self::UInt(_) => Kind::Integer,
            Self::Float(_) => Kind::Float,
            Self::String(_) => Kind::String,
            Self::List(_) => Kind::List,
            Self::Record(_) => Kind::Record,
        }
    }

    /// The string contents, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The numeric value, if this is an integer or float.
    #[must_use]
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Int(v) => Some(Number::Int(*v)),
            Self::UInt(v) => Some(Number::UInt(*v)),
            Self::Float(v) => Some(Number::Float(*v)),
            _ => None,
        }
    }

    /// The elements, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The fields, if this is a record.
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Look up a field when this value is a record.
    ///
    /// Handy inside custom rules, which receive the whole record as context.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_record().and_then(|record| record.get(key))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
            Self::List(items) => write_list(f, items),
            Self::Record(record) => {
                f.write_str("{")?;
                for (i, (key, value)) in record.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Formats `items` as `[a b c]`, the list form used in rule messages.
pub(crate) fn list_string<T: fmt::Display>(items: &[T]) -> String {
    struct List<'a, T>(&'a [T]);

    impl<T: fmt::Display> fmt::Display for List<'_, T> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write_list(f, self.0)
        }
    }

    List(items).to_string()
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(<$target>::from(v))
                }
            }
        )*
    };
}

value_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => Int as i64,
    u16 => Int as i64,
    u32 => Int as i64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => String as String,
    &str => String as String,
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Self::UInt(v), Self::Int)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A numeric value or bound.
///
/// Comparisons between two integers are exact; any comparison involving a
/// float is done in `f64`.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A floating-point number.
    Float(f64),
}

impl Number {
    fn as_i128(self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(i128::from(v)),
            Self::UInt(v) => Some(i128::from(v)),
            Self::Float(_) => None,
        }
    }

    /// The value as `f64`, rounding large integers.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::UInt(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    /// The value with any fractional part truncated toward zero.
    ///
    /// Floats outside the `i128` range saturate; `NaN` becomes zero.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn truncate(self) -> i128 {
        match self {
            Self::Float(v) => v.trunc() as i128,
            other => other.as_i128().unwrap_or_default(),
        }
    }

    /// Whether the value equals zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        match self {
            Self::Int(v) => v == 0,
            Self::UInt(v) => v == 0,
            Self::Float(v) => v == 0.0,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.as_i128(), other.as_i128()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! number_from {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$ty> for Number {
                fn from(v: $ty) -> Self {
                    Self::$variant(<$target>::from(v))
                }
            }
        )*
    };
}

number_from! {
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
}

#[cfg(test)]
mod tests {
    use super::{Kind, Number, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn kinds_group_integer_widths() {
        assert_eq!(Value::Int(-1).kind(), Kind::Integer);
        assert_eq!(Value::UInt(u64::MAX).kind(), Kind::Integer);
        assert_eq!(Value::Float(1.5).kind(), Kind::Float);
        assert_eq!(Value::from("x").kind(), Kind::String);
        assert_eq!(Value::from(vec![1, 2]).kind(), Kind::List);
        assert_eq!(Value::from(None::<i32>).kind(), Kind::Null);
    }

    #[test]
    fn large_unsigned_values_stay_exact() {
        assert_eq!(Value::from(7_u64), Value::Int(7));
        assert_eq!(Value::from(u64::MAX), Value::UInt(u64::MAX));
    }

    #[test]
    fn number_comparisons_mix_integers_and_floats() {
        assert!(Number::Int(3) < Number::Float(3.5));
        assert!(Number::UInt(u64::MAX) > Number::Int(i64::MAX));
        assert_eq!(Number::Float(2.0), Number::Int(2));
        assert!(Number::Float(f64::NAN).partial_cmp(&Number::Int(0)).is_none());
    }

    #[test]
    fn truncation_goes_toward_zero() {
        assert_eq!(Number::Float(2.9).truncate(), 2);
        assert_eq!(Number::Float(-2.9).truncate(), -2);
        assert_eq!(Number::Int(-4).truncate(), -4);
    }

    #[test]
    fn display_formats_lists_with_spaces() {
        let list = Value::from(vec!["foo", "bar"]);
        assert_eq!(list.to_string(), "[foo bar]");
    }
}
