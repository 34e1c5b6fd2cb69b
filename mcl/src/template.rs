//! Template rendering: turn raw script steps into shell-ready command lines.
//!
//! Each step goes through these passes in order:
//!
//! 1. `?$N` optional positional, replaced by argument `N` or the empty string
//! 2. `$N` required positional, replaced by argument `N` or an error
//! 3. `$name` config variable, replaced by its value or an error
//! 4. `$$` collapses to a literal `$`
//!
//! A marker directly preceded by `$` is never substituted, which is what lets
//! `$$1` and `$$name` survive to the unescape pass. Blank lines and lines
//! starting with `#` are dropped.

use crate::error::TemplateError;
use std::collections::BTreeMap;
use std::convert::Infallible;

/// Render every step, dropping blank and comment lines.
///
/// # Errors
///
/// Returns the first [`TemplateError`] hit by any step; nothing rendered so
/// far is returned in that case.
pub fn render(
    steps: &[String],
    args: &[String],
    vars: &BTreeMap<String, String>,
) -> Result<Vec<String>, TemplateError> {
    let mut rendered = Vec::with_capacity(steps.len());

    for raw in steps {
        let stripped = raw.trim_start();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let step = replace_optional(raw, args);
        let step = replace_positional(&step, args)?;
        let step = replace_vars(&step, vars)?;
        let step = unescape(&step);

        let step = step.trim();
        if !step.is_empty() {
            rendered.push(step.to_string());
        }
    }

    Ok(rendered)
}

/// Replace `?$N` with argument `N`, or nothing if it was not supplied.
#[must_use]
pub fn replace_optional(step: &str, args: &[String]) -> String {
    let Ok(rendered) = substitute::<Infallible, _>(step, |rest| {
        let Some(digits) = rest.strip_prefix("?$").map(leading_digits) else {
            return Ok(None);
        };
        let Some(index) = argument_index(digits) else {
            return Ok(None);
        };
        let value = args.get(index - 1).cloned().unwrap_or_default();
        Ok(Some((2 + digits.len(), value)))
    });
    rendered
}

/// Replace `$N` with argument `N`.
///
/// # Errors
///
/// Returns [`TemplateError::MissingArgument`] if `N` exceeds the number of arguments.
pub fn replace_positional(step: &str, args: &[String]) -> Result<String, TemplateError> {
    substitute(step, |rest| {
        let Some(digits) = rest.strip_prefix('$').map(leading_digits) else {
            return Ok(None);
        };
        let Some(index) = argument_index(digits) else {
            return Ok(None);
        };
        match args.get(index - 1) {
            Some(value) => Ok(Some((1 + digits.len(), value.clone()))),
            None => Err(TemplateError::MissingArgument {
                index: digits.trim_start_matches('0').to_string(),
            }),
        }
    })
}

/// Replace `$name` with the config variable `name`.
///
/// # Errors
///
/// Returns [`TemplateError::UnknownVariable`] if `name` is not defined.
pub fn replace_vars(
    step: &str,
    vars: &BTreeMap<String, String>,
) -> Result<String, TemplateError> {
    substitute(step, |rest| {
        let Some(name) = rest.strip_prefix('$').map(leading_identifier) else {
            return Ok(None);
        };
        if name.is_empty() {
            return Ok(None);
        }
        match vars.get(name) {
            Some(value) => Ok(Some((1 + name.len(), value.clone()))),
            None => Err(TemplateError::UnknownVariable {
                name: name.to_string(),
            }),
        }
    })
}

/// Collapse each `$$` pair to `$`, left to right.
#[must_use]
pub fn unescape(step: &str) -> String {
    step.replace("$$", "$")
}

/// Scan `input` left to right and splice in replacements.
///
/// At every position not directly preceded by `$`, `marker_at` receives the
/// rest of the input and may claim a marker by returning its byte length and
/// replacement. Matches never overlap; scanning resumes after a claimed marker.
fn substitute<E, F>(input: &str, mut marker_at: F) -> Result<String, E>
where
    F: FnMut(&str) -> Result<Option<(usize, String)>, E>,
{
    let bytes = input.as_bytes();
    let mut output = String::with_capacity(input.len());
    let mut copied = 0;
    let mut pos = 0;

    while pos < input.len() {
        let escaped = pos > 0 && bytes[pos - 1] == b'$';
        if !escaped && let Some((len, value)) = marker_at(&input[pos..])? {
            output.push_str(&input[copied..pos]);
            output.push_str(&value);
            pos += len;
            copied = pos;
            continue;
        }
        pos += input[pos..].chars().next().map_or(1, char::len_utf8);
    }

    output.push_str(&input[copied..]);
    Ok(output)
}

fn leading_digits(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    &s[..end]
}

fn leading_identifier(s: &str) -> &str {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return "",
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map_or(s.len(), |(i, _)| i);
    &s[..end]
}

/// 1-based argument index from a digit run; `None` for an empty run or zero.
///
/// A run too large for `usize` can never name a supplied argument, so it
/// saturates to `usize::MAX`.
fn argument_index(digits: &str) -> Option<usize> {
    if digits.is_empty() || digits.bytes().all(|b| b == b'0') {
        return None;
    }
    Some(digits.parse::<usize>().unwrap_or(usize::MAX))
}
