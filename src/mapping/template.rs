//! Template rendering against source records.
//!
//! A template is literal text with `{column}` placeholders; `{{` and `}}`
//! render literal braces. Substituted values are inserted verbatim and never
//! re-scanned.

use log::debug;
use rustc_hash::FxHashSet;

use crate::error::{CircusError, Result};
use crate::models::SourceRecord;

/// How resolution failures are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Failures propagate as errors
    Execute,
    /// Failures render the field as an empty string
    Preview,
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Placeholder(&'a str),
}

fn syntax_error(template: &str, reason: &str) -> CircusError {
    CircusError::TemplateSyntax {
        template: template.to_string(),
        reason: reason.to_string(),
    }
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        if pos > 0 {
            segments.push(Segment::Literal(&rest[..pos]));
        }
        let brace = rest[pos..].chars().next().unwrap_or('{');
        let after = &rest[pos + 1..];

        if after.starts_with(brace) {
            segments.push(Segment::Brace(brace));
            rest = &after[1..];
            continue;
        }
        if brace == '}' {
            return Err(syntax_error(template, "single '}' encountered"));
        }

        let end = after
            .find(['{', '}'])
            .filter(|&i| after[i..].starts_with('}'))
            .ok_or_else(|| syntax_error(template, "unterminated placeholder"))?;
        let name = &after[..end];
        if name.is_empty() {
            return Err(syntax_error(template, "empty placeholder"));
        }
        segments.push(Segment::Placeholder(name));
        rest = &after[end + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

/// Column names referenced by `template`, in order of appearance
pub fn placeholders(template: &str) -> Result<Vec<&str>> {
    Ok(parse(template)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name),
            _ => None,
        })
        .collect())
}

fn render(template: &str, record: &SourceRecord) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    for segment in parse(template)? {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Brace(brace) => out.push(brace),
            Segment::Placeholder(name) => {
                let value = record.get(name).ok_or_else(|| CircusError::MissingField {
                    column: name.to_string(),
                })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

/// Render one destination value from `template` against `record`
///
/// An empty template yields an empty string. In [`Mode::Preview`] every
/// failure renders as an empty string instead of an error.
pub fn resolve(template: &str, record: &SourceRecord, mode: Mode) -> Result<String> {
    if template.is_empty() {
        return Ok(String::new());
    }

    match (render(template, record), mode) {
        (Ok(value), _) => Ok(value),
        (Err(e), Mode::Preview) => {
            debug!("Preview left field empty: {e}");
            Ok(String::new())
        }
        (Err(e), Mode::Execute) => Err(e),
    }
}

/// Check that every placeholder of `template` names one of `columns`
pub fn validate(template: &str, columns: &FxHashSet<&str>) -> Result<()> {
    for name in placeholders(template)? {
        if !columns.contains(name) {
            return Err(CircusError::MissingField {
                column: name.to_string(),
            });
        }
    }
    Ok(())
}
