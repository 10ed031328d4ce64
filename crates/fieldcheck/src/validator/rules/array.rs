use crate::error::ValidationError;
use crate::schema::Schema;
use crate::validator::{Failure, Field, Scope, narrow, typed_field};
use crate::value::{Kind, Value};

use super::misapplied;

const NOT_AN_ARRAY: &str = "{} is not an array";
const EMPTY: &str = "{} cannot be empty";
const MIN_LENGTH: &str = "{} must contain at least {} elements";
const MAX_LENGTH: &str = "{} must contain at most {} elements";
const LENGTH: &str = "{} must contain exactly {} elements";

typed_field! {
    /// A chain narrowed to arrays (any serialized sequence).
    ArrayField
}

fn items<'a>(rule: &str, scope: &Scope<'a>) -> &'a [Value] {
    let Some(items) = scope.value.as_list() else {
        misapplied(rule, scope)
    };
    items
}

/// Display name given to elements whose chain has no name of its own.
fn element_name(array: &str) -> String {
    format!("{array}'s elements")
}

impl ArrayField {
    pub(crate) fn narrow(field: Field) -> Self {
        Self(narrow(field, NOT_AN_ARRAY, |kind| kind == Kind::List))
    }

    /// Reject empty arrays.
    pub fn non_empty(self) -> Self {
        self.push(|scope| {
            if items("non_empty", scope).is_empty() {
                Err(Failure::template(EMPTY))
            } else {
                Ok(())
            }
        })
    }

    /// Require at least `min` elements.
    pub fn min_length(self, min: usize) -> Self {
        self.push(move |scope| {
            if items("min_length", scope).len() < min {
                Err(Failure::template(MIN_LENGTH).param(min))
            } else {
                Ok(())
            }
        })
    }

    /// Allow at most `max` elements.
    pub fn max_length(self, max: usize) -> Self {
        self.push(move |scope| {
            if items("max_length", scope).len() > max {
                Err(Failure::template(MAX_LENGTH).param(max))
            } else {
                Ok(())
            }
        })
    }

    /// Require exactly `length` elements.
    pub fn length(self, length: usize) -> Self {
        self.push(move |scope| {
            if items("length", scope).len() == length {
                Ok(())
            } else {
                Err(Failure::template(LENGTH).param(length))
            }
        })
    }

    /// Validate every element with `element`, stopping at the first failure.
    ///
    /// Elements are reported as `"<field>'s elements"` unless the element
    /// chain has its own display name. The element's error is returned
    /// unchanged.
    pub fn of(self, element: impl Into<Field>) -> Self {
        let element = element.into();
        self.push_final(move |scope| {
            let name = element_name(scope.name);
            for item in items("of", scope) {
                element.run(item, scope.context, &name)?;
            }
            Ok(())
        })
    }

    /// Validate every element, which must be a record, against `schema`.
    pub fn of_schema(self, schema: Schema) -> Self {
        self.push_final(move |scope| {
            for item in items("of_schema", scope) {
                schema.parse_value(item)?;
            }
            Ok(())
        })
    }

    /// Run a custom rule receiving the whole record and the elements.
    pub fn test<F>(self, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.push_final(move |scope| f(scope.context, items("test", scope)))
    }
}
