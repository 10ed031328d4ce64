//! Declarative, composable validation for `serde`-serializable records.
//!
//! A [`Schema`] maps record keys to validator chains. Each chain is an ordered
//! list of rules built fluently from [`field`]; the first rule that fails stops
//! the whole validation and its message is returned as a [`ValidationError`].
//!
//! # Quick start
//!
//! ```
//! use fieldcheck::{field, schema};
//!
//! #[derive(serde::Serialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct User {
//!     name: String,
//!     age: u32,
//!     hobbies: Vec<String>,
//! }
//!
//! let schema = schema! {
//!     "Name" => field().string().non_empty().max_length(20),
//!     "Age" => field().number().min(18).message("{} must be an adult"),
//!     "Hobbies" => field().array().of(field().string().min_length(3)),
//! };
//!
//! let user = User { name: "Ada".into(), age: 16, hobbies: vec![] };
//! let err = schema.parse(&user).unwrap_err();
//! assert_eq!(err.message(), "Age must be an adult");
//! ```
//!
//! # Messages
//!
//! Every built-in rule has a default message template. [`Field::message`]
//! replaces the template of the rule appended last; `{}` placeholders receive
//! the field's display name, then the rule's parameters. See [`MISSING`] for
//! templates with more placeholders than arguments.
//!
//! # Errors and panics
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | A rule rejects a value | [`ValidationError`] |
//! | Input bytes are not valid JSON ([`Schema::unmarshal`]) | [`Error::Decode`] |
//! | A schema key is missing from the record | panic |
//! | The input is not a record | panic |
//! | A rule is applied to a value of the wrong kind | panic |
//!
//! Panics signal a broken schema definition rather than bad input; each one
//! is preceded by an `error`-level `tracing` event.

#![warn(missing_docs)]

mod error;
mod message;
mod schema;
#[cfg(test)]
mod test_util;
mod validator;
mod value;

pub use error::{Error, ValidationError};
pub use message::MISSING;
pub use schema::Schema;
pub use validator::{ArrayField, BooleanField, Field, NumberField, ObjectField, StringField, field};
pub use value::{Kind, Number, Record, Value, ValueError, to_value};
