pub(crate) mod array;
pub(crate) mod boolean;
pub(crate) mod number;
pub(crate) mod object;
pub(crate) mod string;

use crate::error::fatal;

use super::Scope;

/// Abort when a rule meets a value its kind check should have excluded.
pub(crate) fn misapplied(rule: &str, scope: &Scope<'_>) -> ! {
    fatal(format!(
        "{rule}() cannot be applied to field `{}` of kind {}",
        scope.name,
        scope.value.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::misapplied;
    use crate::validator::Scope;
    use crate::value::Value;

    #[test]
    #[should_panic(expected = "min_length() cannot be applied to field `Age` of kind integer")]
    fn misapplied_rules_abort() {
        let value = Value::Int(3);
        let scope = Scope {
            value: &value,
            context: &Value::Null,
            name: "Age",
        };
        misapplied("min_length", &scope);
    }
}
