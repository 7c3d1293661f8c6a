//! Parse diagnostics shared by the text and markup parsers
//!
//! Parsers never fail outright. Every problem becomes a [`ParseIssue`]
//! whose [`Severity`] decides where it lands in the [`ParseOutcome`]:
//! structural issues abort the parse and go to `errors`, grammar and
//! range issues are skipped or clamped and go to `warnings`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Directive, Mom};

/// Severity class of a parse issue
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Input cannot be read at all; the parse aborts
    Structural,
    /// Unrecognized unit; skipped
    Grammar,
    /// Value outside a legal bound; clamped
    Range,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseIssue {
    #[error("invalid document: {reason}")]
    InvalidDocument { reason: String },

    #[error("missing root element: expected <score-partwise> or <score-timewise>, found <{found}>")]
    MissingRoot { found: String },

    #[error("line {line}, column {column}: unrecognized token '{token}'")]
    UnrecognizedToken { line: usize, column: usize, token: String },

    #[error("line {line}: unrecognized field '{field}'")]
    UnrecognizedField { line: usize, field: String },

    #[error("line {line}: malformed {field} value '{value}'")]
    MalformedValue { line: usize, field: String, value: String },

    #[error("{context}: value {value} clamped to {clamped}")]
    Clamped { context: String, value: f64, clamped: f64 },
}

impl ParseIssue {
    pub fn severity(&self) -> Severity {
        match self {
            ParseIssue::InvalidDocument { .. } | ParseIssue::MissingRoot { .. } => Severity::Structural,
            ParseIssue::UnrecognizedToken { .. }
            | ParseIssue::UnrecognizedField { .. }
            | ParseIssue::MalformedValue { .. } => Severity::Grammar,
            ParseIssue::Clamped { .. } => Severity::Range,
        }
    }
}

/// Collects issues during one parse, routing them by severity
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<ParseIssue>,
    warnings: Vec<ParseIssue>,
}

impl Diagnostics {
    pub fn report(&mut self, issue: ParseIssue) {
        match issue.severity() {
            Severity::Structural => {
                log::error!("{}", issue);
                self.errors.push(issue);
            }
            Severity::Grammar | Severity::Range => {
                log::warn!("{}", issue);
                self.warnings.push(issue);
            }
        }
    }

    /// Record a clamp when `clamped` differs from the computed value
    pub fn clamped(&mut self, context: impl Into<String>, value: f64, clamped: f64) {
        if value != clamped {
            self.report(ParseIssue::Clamped { context: context.into(), value, clamped });
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Bundle the collected issues with the parse products
    pub fn finish(self, mom: Mom, directives: Vec<Directive>) -> ParseOutcome {
        ParseOutcome {
            mom,
            directives,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

/// Result object returned by the text and markup parsers
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ParseOutcome {
    pub mom: Mom,
    pub directives: Vec<Directive>,
    pub errors: Vec<ParseIssue>,
    pub warnings: Vec<ParseIssue>,
}

impl ParseOutcome {
    /// True when no structural error was reported
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issues_route_by_severity() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.report(ParseIssue::MissingRoot { found: "html".to_string() });
        diagnostics.report(ParseIssue::UnrecognizedToken { line: 3, column: 4, token: "&".to_string() });
        diagnostics.clamped("midi", 130.0, 127.0);
        diagnostics.clamped("velocity", 0.5, 0.5);

        assert!(diagnostics.has_errors());
        let outcome = diagnostics.finish(Mom::default(), Vec::new());
        assert!(!outcome.is_ok());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.warnings.len(), 2);
        assert_eq!(outcome.warnings[1].severity(), Severity::Range);
    }

    #[test]
    fn test_issue_messages() {
        let issue = ParseIssue::UnrecognizedField { line: 2, field: "Z".to_string() };
        assert_eq!(issue.to_string(), "line 2: unrecognized field 'Z'");
    }
}
