use std::fmt;

/// Top-level error type returned by [`Schema::unmarshal`](crate::Schema::unmarshal).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A validation rule was violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The input could not be decoded before validation started.
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

/// Returned when a rule of a schema is violated.
///
/// Carries only the rendered, human-readable message of the single rule that
/// failed first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// Create a validation error with a free-form message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the rendered message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

impl From<String> for ValidationError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ValidationError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Abort on a broken schema definition.
///
/// Unknown fields, values that cannot be inspected and rules applied to the
/// wrong kind of value are programmer errors, not bad input, so they never
/// become a [`ValidationError`].
#[track_caller]
pub(crate) fn fatal(message: impl fmt::Display) -> ! {
    let message = message.to_string();
    tracing::error!(error = %message, "invalid schema configuration");
    panic!("{message}");
}

#[cfg(test)]
mod tests {
    use super::{Error, ValidationError, fatal};
    use pretty_assertions::assert_eq;

    #[test]
    fn validation_error_displays_message_only() {
        let err = ValidationError::new("Age must be at least 18");
        assert_eq!(err.to_string(), "Age must be at least 18");
        assert_eq!(err.message(), "Age must be at least 18");
    }

    #[test]
    fn error_is_transparent_over_both_sources() {
        let validation: Error = ValidationError::from("Name cannot be empty").into();
        assert_eq!(validation.to_string(), "Name cannot be empty");

        let decode_source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let expected = decode_source.to_string();
        let decode: Error = decode_source.into();
        assert_eq!(decode.to_string(), expected);
        assert!(matches!(decode, Error::Decode(_)));
    }

    #[test]
    #[should_panic(expected = "field `Missing` not found")]
    fn fatal_panics_with_message() {
        fatal("field `Missing` not found");
    }
}
