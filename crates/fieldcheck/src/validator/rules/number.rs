use std::cmp::Ordering;

use crate::error::{ValidationError, fatal};
use crate::validator::{Failure, Field, Outcome, Scope, narrow, typed_field};
use crate::value::{Kind, Number, Value, list_string};

use super::misapplied;

const NOT_A_NUMBER: &str = "{} is not a number";
const NOT_POSITIVE: &str = "{} must be a positive number";
const NOT_NEGATIVE: &str = "{} must be a negative number";
const NOT_NON_NEGATIVE: &str = "{} must be a non-negative number";
const NOT_NON_POSITIVE: &str = "{} must be a non-positive number";
const ZERO: &str = "{} must not be zero";
const NOT_MULTIPLE_OF: &str = "{} must be a multiple of {}";
const NOT_FINITE: &str = "{} must be a finite number";
const NOT_ONE_OF: &str = "{} must be one of {}";
const MIN: &str = "{} must be at least {}";
const MAX: &str = "{} must be at most {}";

typed_field! {
    /// A chain narrowed to numbers.
    ///
    /// Integers of every width and floats are accepted. Bounds accept any
    /// primitive numeric type.
    NumberField
}

fn number(rule: &str, scope: &Scope<'_>) -> Number {
    let Some(n) = scope.value.as_number() else {
        misapplied(rule, scope)
    };
    n
}

/// Pass when the value compares to zero as one of `accepted`; NaN never passes.
fn sign(rule: &str, scope: &Scope<'_>, accepted: &[Ordering], template: &'static str) -> Outcome {
    match number(rule, scope).partial_cmp(&Number::Int(0)) {
        Some(ordering) if accepted.contains(&ordering) => Ok(()),
        _ => Err(Failure::template(template)),
    }
}

impl NumberField {
    pub(crate) fn narrow(field: Field) -> Self {
        Self(narrow(field, NOT_A_NUMBER, |kind| {
            matches!(kind, Kind::Integer | Kind::Float)
        }))
    }

    /// Require the value to be at least `min` (inclusive).
    pub fn min(self, min: impl Into<Number>) -> Self {
        let min = min.into();
        self.push(move |scope| match number("min", scope).partial_cmp(&min) {
            Some(Ordering::Greater | Ordering::Equal) => Ok(()),
            _ => Err(Failure::template(MIN).param(min)),
        })
    }

    /// Require the value to be at most `max` (inclusive).
    pub fn max(self, max: impl Into<Number>) -> Self {
        let max = max.into();
        self.push(move |scope| match number("max", scope).partial_cmp(&max) {
            Some(Ordering::Less | Ordering::Equal) => Ok(()),
            _ => Err(Failure::template(MAX).param(max)),
        })
    }

    /// Require the value to be greater than zero.
    pub fn positive(self) -> Self {
        self.push(|scope| sign("positive", scope, &[Ordering::Greater], NOT_POSITIVE))
    }

    /// Require the value to be less than zero.
    pub fn negative(self) -> Self {
        self.push(|scope| sign("negative", scope, &[Ordering::Less], NOT_NEGATIVE))
    }

    /// Require the value to be zero or greater.
    pub fn non_negative(self) -> Self {
        self.push(|scope| {
            sign(
                "non_negative",
                scope,
                &[Ordering::Greater, Ordering::Equal],
                NOT_NON_NEGATIVE,
            )
        })
    }

    /// Require the value to be zero or less.
    pub fn non_positive(self) -> Self {
        self.push(|scope| {
            sign(
                "non_positive",
                scope,
                &[Ordering::Less, Ordering::Equal],
                NOT_NON_POSITIVE,
            )
        })
    }

    /// Reject zero.
    pub fn non_zero(self) -> Self {
        self.push(|scope| {
            if number("non_zero", scope).is_zero() {
                Err(Failure::template(ZERO))
            } else {
                Ok(())
            }
        })
    }

    /// Require the value to be a multiple of `divisor`.
    ///
    /// Floats are truncated toward zero first. Zero is a multiple of every
    /// divisor.
    ///
    /// # Panics
    ///
    /// Panics when `divisor` is zero.
    pub fn multiple_of(self, divisor: i64) -> Self {
        if divisor == 0 {
            fatal("multiple_of() requires a non-zero divisor");
        }
        self.push(move |scope| {
            let value = number("multiple_of", scope).truncate();
            if value == 0 || value % i128::from(divisor) == 0 {
                Ok(())
            } else {
                Err(Failure::template(NOT_MULTIPLE_OF).param(divisor))
            }
        })
    }

    /// Reject positive and negative infinity. Integers always pass.
    pub fn finite(self) -> Self {
        self.push(|scope| match number("finite", scope) {
            Number::Float(v) if v.is_infinite() => Err(Failure::template(NOT_FINITE)),
            _ => Ok(()),
        })
    }

    /// Require the value to equal one of `allowed`.
    ///
    /// Floats are truncated toward zero before the comparison.
    pub fn one_of(self, allowed: impl IntoIterator<Item = i64>) -> Self {
        let allowed: Vec<i64> = allowed.into_iter().collect();
        let listed = list_string(&allowed);
        self.push(move |scope| {
            let value = number("one_of", scope).truncate();
            if allowed.iter().any(|&a| i128::from(a) == value) {
                Ok(())
            } else {
                Err(Failure::template(NOT_ONE_OF).param(&listed))
            }
        })
    }

    /// Run a custom rule receiving the whole record and the number.
    pub fn test<F>(self, f: F) -> Self
    where
        F: Fn(&Value, Number) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.push_final(move |scope| f(scope.context, number("test", scope)))
    }
}
