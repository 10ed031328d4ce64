use crate::error::ValidationError;
use crate::validator::{Field, narrow, typed_field};
use crate::value::{Kind, Value};

use super::misapplied;

const NOT_A_BOOLEAN: &str = "{} is not a boolean";

typed_field! {
    /// A chain narrowed to booleans. Further constraints go through
    /// [`BooleanField::test`].
    BooleanField
}

impl BooleanField {
    pub(crate) fn narrow(field: Field) -> Self {
        Self(narrow(field, NOT_A_BOOLEAN, |kind| kind == Kind::Bool))
    }

    /// Run a custom rule receiving the whole record and the boolean.
    pub fn test<F>(self, f: F) -> Self
    where
        F: Fn(&Value, bool) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.push_final(move |scope| {
            let Some(b) = scope.value.as_bool() else {
                misapplied("test", scope)
            };
            f(scope.context, b)
        })
    }
}
