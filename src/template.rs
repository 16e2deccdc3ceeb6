//! Prompt template rendering.
//!
//! Templates interpolate arguments with `<%= it.name %>` (or the raw form
//! `<%~ it.name %>`). Anything that is not an interpolation tag of that shape is
//! copied through unchanged, including other `<% ... %>` blocks.

use crate::catalog::ArgumentSet;

const OPEN: &str = "<%";
const CLOSE: &str = "%>";

/// Argument name referenced by a tag body such as `= it.scope `.
fn interpolated_name(body: &str) -> Option<&str> {
    let expression = body
        .strip_prefix('=')
        .or_else(|| body.strip_prefix('~'))?
        .trim();
    let name = expression.strip_prefix("it.")?;

    let mut chars = name.chars();
    let first = chars.next()?;
    let valid = (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    valid.then_some(name)
}

/// Substitute `arguments` into `template`. Unset arguments render as empty.
pub fn render(template: &str, arguments: &ArgumentSet) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let (before, tag_onwards) = rest.split_at(start);
        output.push_str(before);

        let Some(end) = tag_onwards[OPEN.len()..].find(CLOSE) else {
            output.push_str(tag_onwards);
            return output;
        };
        let body = &tag_onwards[OPEN.len()..OPEN.len() + end];
        let tag_len = OPEN.len() + end + CLOSE.len();

        match interpolated_name(body) {
            Some(name) => {
                if let Some(value) = arguments.get(name) {
                    output.push_str(value);
                }
            }
            None => output.push_str(&tag_onwards[..tag_len]),
        }
        rest = &tag_onwards[tag_len..];
    }

    output.push_str(rest);
    output
}
