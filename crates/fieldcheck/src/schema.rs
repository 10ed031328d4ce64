use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, ValidationError, fatal};
use crate::validator::Field;
use crate::value::{Value, to_value};

/// An ordered mapping from record keys to validator chains.
///
/// Fields are checked in insertion order and evaluation stops at the first
/// failing rule. Schemas are immutable once built and can be shared between
/// threads, for example from a `static LazyLock<Schema>`.
///
/// ```
/// use fieldcheck::{Schema, field};
///
/// #[derive(serde::Serialize)]
/// struct Signup {
///     name: String,
///     age: u8,
/// }
///
/// let schema = Schema::new()
///     .field("name", field().string().non_empty())
///     .field("age", field().number().min(18));
///
/// let err = schema
///     .parse(&Signup { name: "Ada".into(), age: 12 })
///     .unwrap_err();
/// assert_eq!(err.to_string(), "age must be at least 18");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Schema {
    fields: IndexMap<String, Field>,
}

impl Schema {
    /// Create an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the chain for `key`.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, chain: impl Into<Field>) -> Self {
        self.insert(key, chain);
        self
    }

    /// Add (or replace) the chain for `key`, returning the previous chain.
    ///
    /// A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, chain: impl Into<Field>) -> Option<Field> {
        self.fields.insert(key.into(), chain.into())
    }

    /// The chain registered for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keys in evaluation order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Key and chain pairs in evaluation order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Field> {
        self.fields.iter()
    }

    /// Merge `other` into this schema. On a key collision the chain from
    /// `other` wins.
    pub fn concat(&mut self, other: Schema) {
        self.fields.extend(other.fields);
    }

    /// By-value form of [`Schema::concat`].
    #[must_use]
    pub fn merge(mut self, other: Schema) -> Self {
        self.concat(other);
        self
    }

    /// Validate a record.
    ///
    /// Accepts anything serializable into a record (structs and string-keyed
    /// maps), by value or by reference.
    ///
    /// # Errors
    ///
    /// Returns the error of the first rule that fails.
    ///
    /// # Panics
    ///
    /// Panics when the value cannot be converted, is not a record, lacks a
    /// key of the schema, or when a rule meets a value of the wrong kind.
    /// These are errors in the schema definition, not in the input.
    ///
    /// Keys are looked up in the serialized form, so a struct field marked
    /// `#[serde(skip)]`, or left out by `skip_serializing_if`, counts as
    /// missing even though the struct declares it.
    pub fn parse<T>(&self, record: &T) -> Result<(), ValidationError>
    where
        T: Serialize + ?Sized,
    {
        let value = match to_value(record) {
            Ok(value) => value,
            Err(err) => fatal(format!("cannot inspect record: {err}")),
        };
        self.parse_value(&value)
    }

    /// Validate an already converted record.
    ///
    /// # Errors
    ///
    /// Returns the error of the first rule that fails.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Schema::parse`].
    pub fn parse_value(&self, value: &Value) -> Result<(), ValidationError> {
        let Some(record) = value.as_record() else {
            fatal(format!("expected a record to validate, got {}", value.kind()))
        };

        for (key, chain) in &self.fields {
            let Some(field_value) = record.get(key) else {
                fatal(format!("field `{key}` not found in record"))
            };
            tracing::trace!(field = %key, "validating field");
            chain.run(field_value, value, key)?;
        }

        Ok(())
    }

    /// Validate a record, panicking with the error message on failure.
    ///
    /// # Panics
    ///
    /// Panics when a rule fails, and in every case [`Schema::parse`] does.
    #[track_caller]
    pub fn must_parse<T>(&self, record: &T)
    where
        T: Serialize + ?Sized,
    {
        if let Err(err) = self.parse(record) {
            panic!("{err}");
        }
    }

    /// Decode JSON into `T`, then validate and return it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when the input is not valid JSON for `T` and
    /// [`Error::Validation`] when a rule fails.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Schema::parse`].
    pub fn unmarshal<T>(&self, bytes: &[u8]) -> Result<T, Error>
    where
        T: DeserializeOwned + Serialize,
    {
        let decoded: T = serde_json::from_slice(bytes)?;
        self.parse(&decoded)?;
        Ok(decoded)
    }

    /// Like [`Schema::unmarshal`], panicking on either failure.
    ///
    /// # Panics
    ///
    /// Panics when decoding or validation fails.
    #[track_caller]
    pub fn must_unmarshal<T>(&self, bytes: &[u8]) -> T
    where
        T: DeserializeOwned + Serialize,
    {
        match self.unmarshal(bytes) {
            Ok(decoded) => decoded,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<K, C> FromIterator<(K, C)> for Schema
where
    K: Into<String>,
    C: Into<Field>,
{
    fn from_iter<I: IntoIterator<Item = (K, C)>>(iter: I) -> Self {
        let mut schema = Self::new();
        schema.extend(iter);
        schema
    }
}

impl<K, C> Extend<(K, C)> for Schema
where
    K: Into<String>,
    C: Into<Field>,
{
    fn extend<I: IntoIterator<Item = (K, C)>>(&mut self, iter: I) {
        for (key, chain) in iter {
            self.insert(key, chain);
        }
    }
}

impl IntoIterator for Schema {
    type Item = (String, Field);
    type IntoIter = indexmap::map::IntoIter<String, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = (&'a String, &'a Field);
    type IntoIter = indexmap::map::Iter<'a, String, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Build a [`Schema`] from `key => chain` pairs.
///
/// ```
/// use fieldcheck::{field, schema};
///
/// let schema = schema! {
///     "Name" => field().string().non_empty(),
///     "Age" => field().number().min(18),
/// };
/// assert_eq!(schema.len(), 2);
/// ```
#[macro_export]
macro_rules! schema {
    ($($key:expr => $chain:expr),* $(,)?) => {
        $crate::Schema::new()$(.field($key, $chain))*
    };
}
