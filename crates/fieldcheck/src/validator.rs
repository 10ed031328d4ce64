use std::fmt;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::message;
use crate::schema::Schema;
use crate::value::{Kind, Value, list_string};

pub(crate) mod rules;

pub use rules::array::ArrayField;
pub use rules::boolean::BooleanField;
pub use rules::number::NumberField;
pub use rules::object::ObjectField;
pub use rules::string::StringField;

const NOT_ONE_OF: &str = "{} must be one of {}";

/// The per-call binding of a chain to the value it validates.
///
/// Lives on the call stack only, so a chain can be shared between any number
/// of concurrent validations.
pub(crate) struct Scope<'a> {
    /// The value of the field being validated.
    pub value: &'a Value,
    /// The whole record the field belongs to.
    pub context: &'a Value,
    /// Display name substituted into messages.
    pub name: &'a str,
}

/// Why a single rule rejected a value.
pub(crate) enum Failure {
    /// Rendered from the rule's template, or from the chain's override.
    Template {
        template: &'static str,
        params: Vec<String>,
    },
    /// Already final: custom rules, nested schemas and array elements.
    Error(ValidationError),
}

impl Failure {
    pub(crate) fn template(template: &'static str) -> Self {
        Self::Template {
            template,
            params: Vec::new(),
        }
    }

    pub(crate) fn param(mut self, param: impl fmt::Display) -> Self {
        if let Self::Template { params, .. } = &mut self {
            params.push(param.to_string());
        }
        self
    }
}

pub(crate) type Outcome = Result<(), Failure>;

type Check = dyn Fn(&Scope<'_>) -> Outcome + Send + Sync;

#[derive(Clone)]
struct Rule {
    check: Arc<Check>,
    message: Option<Arc<str>>,
    /// Fails only with [`Failure::Error`], so an override can never apply.
    reports_own_errors: bool,
}

/// An ordered chain of validation rules for one field.
///
/// Rules run in the order they were appended and the first failure stops the
/// chain. Start a chain with [`field`] or [`Field::named`], narrow it with
/// one of the kind entry points ([`Field::string`], [`Field::number`], ...)
/// and keep appending rules:
///
/// ```
/// use fieldcheck::field;
///
/// let name = field().string().non_empty().max_length(20);
/// let age = fieldcheck::Field::named("Age").number().min(18).message("{} must be an adult");
/// # let _ = (name, age);
/// ```
#[derive(Clone, Default)]
pub struct Field {
    name: Option<String>,
    rules: Vec<Rule>,
}

/// Start an untyped chain whose display name is the schema key.
#[must_use]
pub fn field() -> Field {
    Field::new()
}

impl Field {
    /// Create an empty chain whose display name is the schema key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty chain with an explicit display name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            rules: Vec::new(),
        }
    }

    /// The explicit display name, if one was given.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of rules in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the chain has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Replace the message of the most recently appended rule.
    ///
    /// `{}` placeholders receive the display name first, then the rule's
    /// parameters. Custom rules, nested schemas and array elements report
    /// their own errors; an override following one of them is discarded with
    /// a warning, as is an override on a chain without rules.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        match self.rules.last_mut() {
            Some(rule) if !rule.reports_own_errors => rule.message = Some(message.into()),
            Some(_) => {
                tracing::warn!(
                    template = %message,
                    "message override on a rule that reports its own errors is ignored"
                );
            }
            None => {
                tracing::warn!(
                    template = %message,
                    "message override on a chain without rules is ignored"
                );
            }
        }
        self
    }

    fn push_rule<F>(mut self, check: F, reports_own_errors: bool) -> Self
    where
        F: Fn(&Scope<'_>) -> Outcome + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            check: Arc::new(check),
            message: None,
            reports_own_errors,
        });
        self
    }

    pub(crate) fn push<F>(self, check: F) -> Self
    where
        F: Fn(&Scope<'_>) -> Outcome + Send + Sync + 'static,
    {
        self.push_rule(check, false)
    }

    /// Append a rule whose failures are final [`ValidationError`]s.
    pub(crate) fn push_final<F>(self, check: F) -> Self
    where
        F: Fn(&Scope<'_>) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.push_rule(move |scope| check(scope).map_err(Failure::Error), true)
    }

    /// Run every rule against `value`, stopping at the first failure.
    ///
    /// `default_name` is used when the chain has no display name of its own.
    pub(crate) fn run(
        &self,
        value: &Value,
        context: &Value,
        default_name: &str,
    ) -> Result<(), ValidationError> {
        let name = self.name.as_deref().unwrap_or(default_name);
        let scope = Scope {
            value,
            context,
            name,
        };

        for rule in &self.rules {
            match (rule.check)(&scope) {
                Ok(()) => {}
                Err(Failure::Template { template, params }) => {
                    let args = std::iter::once(name.to_string()).chain(params);
                    let rendered = message::render(template, rule.message.as_deref(), args);
                    return Err(ValidationError::new(rendered));
                }
                Err(Failure::Error(err)) => return Err(err),
            }
        }

        Ok(())
    }

    /// Narrow to strings.
    #[must_use]
    pub fn string(self) -> StringField {
        StringField::narrow(self)
    }

    /// Narrow to numbers, integer or floating-point.
    #[must_use]
    pub fn number(self) -> NumberField {
        NumberField::narrow(self)
    }

    /// Narrow to booleans.
    #[must_use]
    pub fn boolean(self) -> BooleanField {
        BooleanField::narrow(self)
    }

    /// Narrow to arrays.
    #[must_use]
    pub fn array(self) -> ArrayField {
        ArrayField::narrow(self)
    }

    /// Narrow to records (structs and string-keyed maps).
    #[must_use]
    pub fn object(self) -> ObjectField {
        ObjectField::narrow(self)
    }

    /// Validate the field's value, which must be a record, against `schema`.
    ///
    /// The nested schema's own errors are returned unchanged.
    #[must_use]
    pub fn schema(self, schema: Schema) -> Self {
        self.push_final(move |scope| schema.parse_value(scope.value))
    }

    /// Require the value to equal one of `allowed`.
    ///
    /// Numbers compare by value across integer and float forms, so `2` and
    /// `2.0` match; every other kind compares exactly.
    #[must_use]
    pub fn one_of<I>(self, allowed: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
        let listed = list_string(&allowed);
        self.push(move |scope| {
            if allowed.iter().any(|candidate| same_value(candidate, scope.value)) {
                Ok(())
            } else {
                Err(Failure::template(NOT_ONE_OF).param(&listed))
            }
        })
    }

    /// Run a custom rule receiving the whole record and the raw field value.
    ///
    /// The returned error is reported as-is.
    #[must_use]
    pub fn test<F>(self, f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.push_final(move |scope| f(scope.context, scope.value))
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("rules", &self.rules.len())
            .finish()
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a.as_number(), b.as_number()) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

/// Append the rule that admits only values of one kind.
pub(crate) fn narrow(
    field: Field,
    template: &'static str,
    accepts: fn(Kind) -> bool,
) -> Field {
    field.push(move |scope| {
        if accepts(scope.value.kind()) {
            Ok(())
        } else {
            Err(Failure::template(template))
        }
    })
}

/// Shared surface of the kind-narrowed chains.
macro_rules! typed_field {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        #[must_use]
        pub struct $name(crate::validator::Field);

        impl $name {
            /// Replace the message of the most recently appended rule.
            ///
            /// See [`Field::message`](crate::Field::message).
            pub fn message(self, message: impl Into<String>) -> Self {
                Self(self.0.message(message))
            }

            // Boolean and object chains only take final rules.
            #[allow(dead_code)]
            fn push<F>(self, check: F) -> Self
            where
                F: Fn(&crate::validator::Scope<'_>) -> crate::validator::Outcome
                    + Send
                    + Sync
                    + 'static,
            {
                Self(self.0.push(check))
            }

            fn push_final<F>(self, check: F) -> Self
            where
                F: Fn(&crate::validator::Scope<'_>) -> Result<(), crate::error::ValidationError>
                    + Send
                    + Sync
                    + 'static,
            {
                Self(self.0.push_final(check))
            }

            /// Number of rules in the chain, including the kind check.
            #[must_use]
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Always false: a typed chain holds at least its kind check.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<$name> for crate::validator::Field {
            fn from(typed: $name) -> Self {
                typed.0
            }
        }
    };
}

pub(crate) use typed_field;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;
    use tracing::Level;

    use super::{Field, field};
    use crate::error::ValidationError;
    use crate::schema::Schema;
    use crate::test_util::capture_logs;
    use crate::value::Value;

    fn run(chain: impl Into<Field>, value: impl Into<Value>) -> Result<(), ValidationError> {
        chain.into().run(&value.into(), &Value::Null, "Field")
    }

    #[test]
    fn rules_after_the_first_failure_never_run() {
        let calls: Vec<Arc<AtomicUsize>> = (0..4).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let failing = 2;

        let mut chain = field();
        for (i, counter) in calls.iter().enumerate() {
            let counter = Arc::clone(counter);
            chain = chain.test(move |_, _| {
                counter.fetch_add(1, Ordering::Relaxed);
                if i == failing {
                    Err(ValidationError::new(format!("rule {i} failed")))
                } else {
                    Ok(())
                }
            });
        }

        let err = run(chain, 1).expect_err("third rule fails");
        assert_eq!(err.message(), "rule 2 failed");
        let counts: Vec<_> = calls.iter().map(|c| c.load(Ordering::Relaxed)).collect();
        assert_eq!(counts, [1, 1, 1, 0]);
    }

    #[test]
    fn display_name_overrides_default() {
        let err = run(Field::named("Nickname").string(), 3).expect_err("not a string");
        assert_eq!(err.message(), "Nickname is not a string");

        let err = run(field().string(), 3).expect_err("not a string");
        assert_eq!(err.message(), "Field is not a string");
    }

    #[test]
    fn message_overrides_only_the_last_rule() {
        let chain = field().number().min(10).message("{} is too small").max(20);
        assert_eq!(run(chain.clone(), 5).unwrap_err().message(), "Field is too small");
        assert_eq!(
            run(chain, 25).unwrap_err().message(),
            "Field must be at most 20"
        );
    }

    #[test]
    fn message_on_empty_chain_is_ignored() {
        let (chain, logs) = capture_logs(Level::WARN, || field().message("never used"));
        assert!(chain.is_empty());
        assert!(run(chain, 1).is_ok());
        assert!(logs.contains("chain without rules is ignored"), "{logs}");
    }

    #[test]
    fn custom_rule_errors_ignore_overrides() {
        let (chain, logs) = capture_logs(Level::WARN, || {
            field()
                .test(|_, _| Err("custom failure".into()))
                .message("override")
        });
        assert_eq!(run(chain, 1).unwrap_err().message(), "custom failure");
        assert!(logs.contains("reports its own errors is ignored"), "{logs}");
    }

    #[test]
    fn overrides_after_composite_rules_are_discarded() {
        let nested = Schema::new().field("Zip", field().string().length(4));
        let (chains, logs) = capture_logs(Level::WARN, || {
            (
                field().schema(nested).message("{} is wrong"),
                Field::from(field().array().of(field().number().min(3)).message("{} is wrong")),
            )
        });
        assert_eq!(logs.matches("reports its own errors is ignored").count(), 2);

        let (nested_chain, elements) = chains;
        let address = Value::Record([("Zip".to_string(), Value::from("1"))].into_iter().collect());
        assert_eq!(
            nested_chain.run(&address, &Value::Null, "Address").unwrap_err().message(),
            "Zip must be exactly 4 characters long"
        );
        assert_eq!(
            run(elements, vec![1]).unwrap_err().message(),
            "Field's elements must be at least 3"
        );
    }

    #[test]
    fn overrides_on_template_rules_do_not_warn() {
        let (_, logs) = capture_logs(Level::WARN, || {
            field().number().min(1).message("{} too small")
        });
        assert_eq!(logs, "");
    }

    #[test]
    fn custom_rules_see_the_whole_record() {
        let context = Value::Record(
            [("Password".to_string(), Value::from("secret"))]
                .into_iter()
                .collect(),
        );
        let chain = field().test(|ctx, value| {
            if ctx.get("Password") == Some(value) {
                Ok(())
            } else {
                Err("passwords must match".into())
            }
        });

        assert!(chain.run(&Value::from("secret"), &context, "Confirm").is_ok());
        let err = chain
            .run(&Value::from("other"), &context, "Confirm")
            .expect_err("mismatch");
        assert_eq!(err.message(), "passwords must match");
    }

    #[test]
    fn untyped_one_of_compares_values() {
        let chain = field().one_of(["admin", "user"]);
        assert!(run(chain.clone(), "admin").is_ok());
        assert_eq!(
            run(chain, "guest").unwrap_err().message(),
            "Field must be one of [admin user]"
        );
    }

    #[test]
    fn untyped_one_of_matches_numbers_across_forms() {
        let chain = field().one_of([1, 2]);
        assert!(run(chain.clone(), 2.0).is_ok());
        assert!(run(chain.clone(), 2_u64).is_ok());
        assert_eq!(
            run(chain.clone(), 2.5).unwrap_err().message(),
            "Field must be one of [1 2]"
        );
        assert!(run(chain, "2").is_err());
    }

    #[test]
    fn chains_are_shareable_across_threads() {
        let chain = Arc::new(Field::from(field().number().min(0)));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let chain = Arc::clone(&chain);
                std::thread::spawn(move || {
                    let value = if i % 2 == 0 { i } else { -i };
                    chain.run(&Value::from(value), &Value::Null, &format!("F{i}"))
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread completes"))
            .collect();
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().message(), "F1 must be at least 0");
        assert!(results[2].is_ok());
        assert_eq!(results[3].as_ref().unwrap_err().message(), "F3 must be at least 0");
    }
}
