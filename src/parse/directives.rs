//! `%%` directive lines

use std::collections::BTreeMap;

use crate::diagnostics::{Diagnostics, ParseIssue};
use crate::models::directives::VERBATIM_KEY;
use crate::models::{Directive, DirectiveKind};

use super::scan_attributes;

/// Reserved two-character directive prefix
pub const DIRECTIVE_PREFIX: &str = "%%";

/// Parse a directive line positioned at `measure`/`beat`.
///
/// Returns `None` (after reporting) when the line has no directive name.
pub fn parse_directive(
    line_text: &str,
    line: usize,
    measure: u32,
    beat: f64,
    diagnostics: &mut Diagnostics,
) -> Option<Directive> {
    let body = line_text.strip_prefix(DIRECTIVE_PREFIX)?.trim();
    let name = match body.split_whitespace().next() {
        Some(name) => name,
        None => {
            diagnostics.report(ParseIssue::UnrecognizedToken {
                line,
                column: 1,
                token: line_text.to_string(),
            });
            return None;
        }
    };
    let rest = body[name.len()..].trim();

    let mut attributes: BTreeMap<String, String> = scan_attributes(rest, false).into_iter().collect();
    if attributes.is_empty() && !rest.is_empty() {
        attributes.insert(VERBATIM_KEY.to_string(), rest.to_string());
    }

    Some(Directive {
        kind: DirectiveKind::from_name(name),
        name: name.to_string(),
        measure,
        beat,
        attributes,
    })
}
