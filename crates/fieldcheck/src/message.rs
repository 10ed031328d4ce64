//! Rendering of rule failure messages.
//!
//! Templates use `{}` as a positional placeholder and `{{` / `}}` to emit a
//! literal brace. A non-empty override replaces the rule's default template
//! entirely. Arguments beyond the number of placeholders are dropped, and a
//! placeholder with no argument left renders as [`MISSING`].

use std::fmt::Write;

/// Rendered in place of a placeholder that has no argument.
pub const MISSING: &str = "<missing>";

/// Render `template` (or `custom` when it is non-empty) with `args`.
pub(crate) fn render<I>(template: &str, custom: Option<&str>, args: I) -> String
where
    I: IntoIterator,
    I::Item: std::fmt::Display,
{
    let template = match custom {
        Some(custom) if !custom.is_empty() => custom,
        _ => template,
    };

    let mut args = args.into_iter();
    let mut out = String::with_capacity(template.len() + 16);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            ('{', Some('}')) => {
                chars.next();
                match args.next() {
                    Some(arg) => {
                        let _ = write!(out, "{arg}");
                    }
                    None => out.push_str(MISSING),
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Number of `{}` placeholders in `template`.
#[cfg(test)]
fn placeholders(template: &str) -> usize {
    let mut count = 0;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
            }
            ('{', Some('}')) => {
                chars.next();
                count += 1;
            }
            _ => {}
        }
    }
    count
}
