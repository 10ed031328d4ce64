use crate::error::ValidationError;
use crate::schema::Schema;
use crate::validator::{Field, narrow, typed_field};
use crate::value::{Kind, Record, Value};

use super::misapplied;

const NOT_AN_OBJECT: &str = "{} is not an object";

typed_field! {
    /// A chain narrowed to records: structs and string-keyed maps.
    ObjectField
}

impl ObjectField {
    pub(crate) fn narrow(field: Field) -> Self {
        Self(narrow(field, NOT_AN_OBJECT, |kind| kind == Kind::Record))
    }

    /// Validate the record against a nested schema.
    ///
    /// Nested fields see the nested record as their context, and the first
    /// nested failure is returned unchanged.
    pub fn schema(self, schema: Schema) -> Self {
        self.push_final(move |scope| schema.parse_value(scope.value))
    }

    /// Run a custom rule receiving the whole record and this field's record.
    pub fn test<F>(self, f: F) -> Self
    where
        F: Fn(&Value, &Record) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.push_final(move |scope| {
            let Some(record) = scope.value.as_record() else {
                misapplied("test", scope)
            };
            f(scope.context, record)
        })
    }
}
