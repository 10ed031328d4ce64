use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::LazyLock;

use regex::Regex;
use uriparse::URI;

use crate::error::{ValidationError, fatal};
use crate::validator::{Failure, Field, Scope, narrow, typed_field};
use crate::value::{Kind, Value, list_string};

use super::misapplied;

const NOT_A_STRING: &str = "{} is not a string";
const EMPTY: &str = "{} cannot be empty";
const MIN_LENGTH: &str = "{} must be at least {} characters long";
const MAX_LENGTH: &str = "{} must be at most {} characters long";
const LENGTH: &str = "{} must be exactly {} characters long";
const PATTERN: &str = "{} does not match the pattern {}";
const PREFIX: &str = "{} must start with {}";
const SUFFIX: &str = "{} must end with {}";
const CONTAINS: &str = "{} must contain {}";
const NOT_ONE_OF: &str = "{} must be one of {}";
const URL: &str = "{} must be a valid URL";
const EMAIL: &str = "{} must be a valid email address";
const UUID: &str = "{} must be a valid UUID";
const CUID: &str = "{} must be a valid CUID";
const HEX_COLOR: &str = "{} must be a valid hex color";

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email regex must compile")
});
static UUID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-4[0-9a-fA-F]{3}-[89abAB][0-9a-fA-F]{3}-[0-9a-fA-F]{12}$",
    )
    .expect("uuid regex must compile")
});
static CUID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^c[^\s-]{8,}$").expect("cuid regex must compile"));
static HEX_COLOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("hex color regex must compile")
});

typed_field! {
    /// A chain narrowed to strings.
    ///
    /// Lengths are counted in Unicode scalar values, not bytes.
    StringField
}

fn string<'a>(rule: &str, scope: &Scope<'a>) -> &'a str {
    let Some(s) = scope.value.as_str() else {
        misapplied(rule, scope)
    };
    s
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

impl StringField {
    pub(crate) fn narrow(field: Field) -> Self {
        Self(narrow(field, NOT_A_STRING, |kind| kind == Kind::String))
    }

    /// Reject strings that are empty after trimming whitespace.
    pub fn non_empty(self) -> Self {
        self.push(|scope| {
            if string("non_empty", scope).trim().is_empty() {
                Err(Failure::template(EMPTY))
            } else {
                Ok(())
            }
        })
    }

    /// Require at least `min` characters.
    pub fn min_length(self, min: usize) -> Self {
        self.push(move |scope| {
            if char_count(string("min_length", scope)) < min {
                Err(Failure::template(MIN_LENGTH).param(min))
            } else {
                Ok(())
            }
        })
    }

    /// Allow at most `max` characters.
    pub fn max_length(self, max: usize) -> Self {
        self.push(move |scope| {
            if char_count(string("max_length", scope)) > max {
                Err(Failure::template(MAX_LENGTH).param(max))
            } else {
                Ok(())
            }
        })
    }

    /// Require exactly `length` characters.
    pub fn length(self, length: usize) -> Self {
        self.push(move |scope| {
            if char_count(string("length", scope)) == length {
                Ok(())
            } else {
                Err(Failure::template(LENGTH).param(length))
            }
        })
    }

    /// Require the string to match `pattern`.
    ///
    /// The empty string always passes; combine with [`StringField::non_empty`]
    /// to reject it.
    ///
    /// # Panics
    ///
    /// Panics when `pattern` is not a valid regular expression.
    pub fn matches(self, pattern: &str) -> Self {
        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(e) => fatal(format!("invalid regex pattern `{pattern}`: {e}")),
        };
        self.pattern(regex, PATTERN)
    }

    fn pattern(self, regex: Regex, template: &'static str) -> Self {
        self.push(move |scope| {
            let s = string("matches", scope);
            if s.is_empty() || regex.is_match(s) {
                Ok(())
            } else {
                Err(Failure::template(template).param(regex.as_str()))
            }
        })
    }

    /// Require the string to start with `prefix`.
    pub fn starts_with(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.push(move |scope| {
            if string("starts_with", scope).starts_with(prefix.as_str()) {
                Ok(())
            } else {
                Err(Failure::template(PREFIX).param(&prefix))
            }
        })
    }

    /// Require the string to end with `suffix`.
    pub fn ends_with(self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.push(move |scope| {
            if string("ends_with", scope).ends_with(suffix.as_str()) {
                Ok(())
            } else {
                Err(Failure::template(SUFFIX).param(&suffix))
            }
        })
    }

    /// Require the string to contain `needle`.
    pub fn contains(self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        self.push(move |scope| {
            if string("contains", scope).contains(needle.as_str()) {
                Ok(())
            } else {
                Err(Failure::template(CONTAINS).param(&needle))
            }
        })
    }

    /// Require the string to equal one of `allowed`, case-sensitively.
    pub fn one_of<I>(self, allowed: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let ordered: Vec<String> = allowed.into_iter().map(Into::into).collect();
        let listed = list_string(&ordered);
        let allowed: HashSet<String> = ordered.into_iter().collect();
        self.push(move |scope| {
            if allowed.contains(string("one_of", scope)) {
                Ok(())
            } else {
                Err(Failure::template(NOT_ONE_OF).param(&listed))
            }
        })
    }

    /// Require an absolute URI such as `https://example.com/path`.
    pub fn url(self) -> Self {
        self.push(|scope| {
            if is_url(string("url", scope)) {
                Ok(())
            } else {
                Err(Failure::template(URL))
            }
        })
    }

    /// Require an email address. The empty string passes.
    pub fn email(self) -> Self {
        self.pattern(EMAIL_REGEX.clone(), EMAIL)
    }

    /// Require a version 4 UUID. The empty string passes.
    pub fn uuid(self) -> Self {
        self.pattern(UUID_REGEX.clone(), UUID)
    }

    /// Require a CUID. The empty string passes.
    pub fn cuid(self) -> Self {
        self.pattern(CUID_REGEX.clone(), CUID)
    }

    /// Require a `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` color. The empty
    /// string passes.
    pub fn hex_color(self) -> Self {
        self.pattern(HEX_COLOR_REGEX.clone(), HEX_COLOR)
    }

    /// Run a custom rule receiving the whole record and the string.
    pub fn test<F>(self, f: F) -> Self
    where
        F: Fn(&Value, &str) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.push_final(move |scope| f(scope.context, string("test", scope)))
    }
}

fn is_url(s: &str) -> bool {
    if has_invalid_scheme(s) {
        return false;
    }
    // uriparse can panic on some malformed schemes
    catch_unwind(AssertUnwindSafe(|| URI::try_from(s).is_ok())).unwrap_or(false)
}

fn has_invalid_scheme(s: &str) -> bool {
    let Some(scheme_end) = s.find(':') else {
        return true;
    };

    let mut bytes = s[..scheme_end].bytes();
    let Some(first) = bytes.next() else {
        return true;
    };
    if !first.is_ascii_alphabetic() {
        return true;
    }
    !bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}
