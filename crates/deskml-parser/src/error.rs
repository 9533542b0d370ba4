//! Diagnostic catalog and formatting.
//!
//! Every diagnostic carries an [`ErrorCode`] whose message template lives in
//! [`ErrorCode::template`]. Templates use `{name}` placeholders filled from the
//! diagnostic's params. The catalog is fixed at compile time.

use std::collections::BTreeMap;
use std::fmt;

use deskml_combinator::{Failure, Reason, SourceLocation};
use serde::{Deserialize, Serialize};

/// Named template arguments. Ordered so serialized output is deterministic.
pub type Params = BTreeMap<String, String>;

/// Which stage of the pipeline raised a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Syntax errors. Fatal: no tree is produced.
    Parser,
    /// Schema violations. Accumulated; output is still rendered.
    Transformer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    // Parser phase
    MissingOpeningBracket,
    TagNameAlphanumeric,
    UnterminatedTag,
    ExpectedAttrValue,
    InvalidAttribute,
    MismatchedNesting,
    UnclosedTag,
    ExpectedText,
    UnexpectedEof,
    MaxDepthExceeded,
    UnexpectedInput,

    // Transformer phase
    UnknownTag,
    UnexpectedAttribute,
    AttributeTypeMismatch,
    MissingRequiredAttribute,
    InvalidAttributeValue,
    TextNotAllowed,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 17] = [
        ErrorCode::MissingOpeningBracket,
        ErrorCode::TagNameAlphanumeric,
        ErrorCode::UnterminatedTag,
        ErrorCode::ExpectedAttrValue,
        ErrorCode::InvalidAttribute,
        ErrorCode::MismatchedNesting,
        ErrorCode::UnclosedTag,
        ErrorCode::ExpectedText,
        ErrorCode::UnexpectedEof,
        ErrorCode::MaxDepthExceeded,
        ErrorCode::UnexpectedInput,
        ErrorCode::UnknownTag,
        ErrorCode::UnexpectedAttribute,
        ErrorCode::AttributeTypeMismatch,
        ErrorCode::MissingRequiredAttribute,
        ErrorCode::InvalidAttributeValue,
        ErrorCode::TextNotAllowed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingOpeningBracket => "missing-opening-bracket",
            ErrorCode::TagNameAlphanumeric => "tag-name-alphanumeric",
            ErrorCode::UnterminatedTag => "unterminated-tag",
            ErrorCode::ExpectedAttrValue => "expected-attr-value",
            ErrorCode::InvalidAttribute => "invalid-attribute",
            ErrorCode::MismatchedNesting => "mismatched-nesting",
            ErrorCode::UnclosedTag => "unclosed-tag",
            ErrorCode::ExpectedText => "expected-text",
            ErrorCode::UnexpectedEof => "unexpected-eof",
            ErrorCode::MaxDepthExceeded => "max-depth-exceeded",
            ErrorCode::UnexpectedInput => "unexpected-input",
            ErrorCode::UnknownTag => "unknown-tag",
            ErrorCode::UnexpectedAttribute => "unexpected-attribute",
            ErrorCode::AttributeTypeMismatch => "attribute-type-mismatch",
            ErrorCode::MissingRequiredAttribute => "missing-required-attribute",
            ErrorCode::InvalidAttributeValue => "invalid-attribute-value",
            ErrorCode::TextNotAllowed => "text-not-allowed",
        }
    }

    /// Message template with `{placeholder}` arguments.
    pub fn template(self) -> &'static str {
        match self {
            ErrorCode::MissingOpeningBracket => "Expected '<' to start a tag",
            ErrorCode::TagNameAlphanumeric => "Tag name must be alphanumeric",
            ErrorCode::UnterminatedTag => "Missing closing '>' for opening tag <{tag}>",
            ErrorCode::ExpectedAttrValue => {
                "Expected a quoted string or a number as the value of attribute \"{key}\""
            }
            ErrorCode::InvalidAttribute => "Expected an alphanumeric attribute name in <{tag}>",
            ErrorCode::MismatchedNesting => "Expected closing tag </{expected}>, found </{found}>",
            ErrorCode::UnclosedTag => "Unclosed tag <{tag}>: reached end of file",
            ErrorCode::ExpectedText => "Expected text, but found the start of a tag",
            ErrorCode::UnexpectedEof => "Unexpected end of input",
            ErrorCode::MaxDepthExceeded => {
                "Tag <{tag}> is nested deeper than the maximum of {max} levels"
            }
            ErrorCode::UnexpectedInput => "Unexpected input: {reason}",
            ErrorCode::UnknownTag => "Unknown tag <{tag}>",
            ErrorCode::UnexpectedAttribute => "Unexpected attribute \"{key}\" on <{tag}>",
            ErrorCode::AttributeTypeMismatch => {
                "Attribute \"{key}\" expects a {expected}, got a {actual}"
            }
            ErrorCode::MissingRequiredAttribute => "<{tag}> is missing required attribute \"{key}\"",
            ErrorCode::InvalidAttributeValue => "Invalid value for attribute \"{key}\": {reason}",
            ErrorCode::TextNotAllowed => "Text is not allowed inside {parent}",
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            ErrorCode::UnknownTag
            | ErrorCode::UnexpectedAttribute
            | ErrorCode::AttributeTypeMismatch
            | ErrorCode::MissingRequiredAttribute
            | ErrorCode::InvalidAttributeValue
            | ErrorCode::TextNotAllowed => Phase::Transformer,
            _ => Phase::Parser,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substitute `{name}` placeholders. Unknown placeholders are left as written.
pub fn render_template(template: &str, params: &Params) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &after[..close];
        match params.get(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

fn message_for(code: &ErrorCode, params: &Params) -> String {
    render_template(code.template(), params)
}

/// A diagnostic, from either phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{}", message_for(.code, .params))]
pub struct MlError {
    pub phase: Phase,
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: Params,
    pub loc: SourceLocation,
}

impl MlError {
    pub fn new(code: ErrorCode, loc: SourceLocation) -> Self {
        Self {
            phase: code.phase(),
            code,
            params: Params::new(),
            loc,
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The resolved message, without location.
    pub fn message(&self) -> String {
        message_for(&self.code, &self.params)
    }
}

/// The failure payload the grammar threads through the combinators.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxError {
    /// A low-level failure no grammar rule gave a meaning to.
    Mechanical(Reason),
    Coded { code: ErrorCode, params: Params },
}

impl SyntaxError {
    pub fn new(code: ErrorCode) -> Self {
        SyntaxError::Coded {
            code,
            params: Params::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        if let SyntaxError::Coded { params, .. } = &mut self {
            params.insert(key.to_string(), value.to_string());
        }
        self
    }
}

impl From<Reason> for SyntaxError {
    fn from(reason: Reason) -> Self {
        SyntaxError::Mechanical(reason)
    }
}

/// Convert a grammar failure into a parser-phase diagnostic.
///
/// Failures without a grammar-assigned code become `unexpected-input`.
pub fn to_ml_error(failure: Failure<SyntaxError>) -> MlError {
    match failure.reason {
        SyntaxError::Coded { code, params } => MlError {
            phase: Phase::Parser,
            code,
            params,
            loc: failure.loc,
        },
        SyntaxError::Mechanical(reason) => {
            MlError::new(ErrorCode::UnexpectedInput, failure.loc).with("reason", reason)
        }
    }
}

/// Render a four-line, caret-annotated report of `error` against `source`.
///
/// ```text
/// error[unknown-tag]: Unknown tag <asdf>
///   --> line 1, column 2
/// > <asdf>content</asdf>
///    ^^^^
/// ```
pub fn format_error(source: &str, error: &MlError) -> String {
    // Locations may come back from a host, so tolerate inverted ranges and
    // offsets that fall inside a character.
    let start = floor_char_boundary(source, error.loc.start.min(error.loc.end));
    let end = error.loc.end.max(error.loc.start).min(source.len()).max(start);
    let before = &source[..start];

    let line_index = before.matches('\n').count();
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;

    let line_text = source
        .split('\n')
        .nth(line_index)
        .unwrap_or("")
        .trim_end_matches('\r');

    let span_chars = source
        .get(start..end)
        .map_or(end - start, |text| text.chars().count());
    let carets = "^".repeat(span_chars.max(1));

    format!(
        "error[{}]: {}\n  --> line {}, column {}\n> {}\n  {}{}",
        error.code,
        error.message(),
        line_index + 1,
        column,
        line_text,
        " ".repeat(column - 1),
        carets,
    )
}

/// The largest char boundary of `source` at or before `offset`.
fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let offset = offset.min(source.len());
    (0..=offset)
        .rev()
        .find(|&i| source.is_char_boundary(i))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Catalog
    // =========================================================================

    #[test]
    fn test_serialized_code_matches_as_str() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_serialized_shape() {
        let err = MlError::new(ErrorCode::UnknownTag, SourceLocation::new(1, 5)).with("tag", "asdf");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "phase": "transformer",
                "code": "unknown-tag",
                "params": { "tag": "asdf" },
                "loc": { "start": 1, "end": 5 }
            })
        );

        let bare = MlError::new(ErrorCode::UnexpectedEof, SourceLocation::point(0));
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("params").is_none());
        let back: MlError = serde_json::from_value(json).unwrap();
        assert_eq!(back, bare);
    }

    #[test]
    fn test_phases() {
        assert_eq!(ErrorCode::UnclosedTag.phase(), Phase::Parser);
        assert_eq!(ErrorCode::UnknownTag.phase(), Phase::Transformer);
        assert_eq!(ErrorCode::TextNotAllowed.phase(), Phase::Transformer);
    }

    #[test]
    fn test_render_template() {
        let mut params = Params::new();
        params.insert("tag".into(), "box".into());
        assert_eq!(
            render_template("Unclosed tag <{tag}>: reached end of file", &params),
            "Unclosed tag <box>: reached end of file"
        );
    }

    #[test]
    fn test_render_template_keeps_unknown_placeholders() {
        assert_eq!(render_template("a {missing} b", &Params::new()), "a {missing} b");
        assert_eq!(render_template("open { brace", &Params::new()), "open { brace");
    }

    #[test]
    fn test_message_uses_params() {
        let err = MlError::new(ErrorCode::AttributeTypeMismatch, SourceLocation::new(0, 1))
            .with("key", "width")
            .with("expected", "number")
            .with("actual", "string");
        assert_eq!(err.to_string(), "Attribute \"width\" expects a number, got a string");
        assert_eq!(err.phase, Phase::Transformer);
    }

    // =========================================================================
    // Conversion from grammar failures
    // =========================================================================

    #[test]
    fn test_to_ml_error_keeps_code() {
        let failure = Failure::spanning(
            SyntaxError::new(ErrorCode::UnterminatedTag).with("tag", "box"),
            SourceLocation::new(0, 14),
        );
        let err = to_ml_error(failure);
        assert_eq!(err.code, ErrorCode::UnterminatedTag);
        assert_eq!(err.param("tag"), Some("box"));
        assert_eq!(err.loc, SourceLocation::new(0, 14));
        assert_eq!(err.phase, Phase::Parser);
    }

    #[test]
    fn test_to_ml_error_falls_back_for_mechanical() {
        let failure: Failure<SyntaxError> = Failure::new(Reason::Stuck, 3);
        let err = to_ml_error(failure);
        assert_eq!(err.code, ErrorCode::UnexpectedInput);
        assert_eq!(
            err.param("reason"),
            Some("parser stuck: child parser did not consume any input")
        );
    }

    // =========================================================================
    // format_error
    // =========================================================================

    #[test]
    fn test_format_error_single_line() {
        let source = "<asdf>content</asdf>";
        let err = MlError::new(ErrorCode::UnknownTag, SourceLocation::new(1, 5)).with("tag", "asdf");
        assert_eq!(
            format_error(source, &err),
            "error[unknown-tag]: Unknown tag <asdf>\n  --> line 1, column 2\n> <asdf>content</asdf>\n   ^^^^"
        );
    }

    #[test]
    fn test_format_error_later_line() {
        let source = "<main>\n  <box wide>\n</main>";
        let err = MlError::new(ErrorCode::UnexpectedAttribute, SourceLocation::new(14, 18))
            .with("key", "wide")
            .with("tag", "box");
        let report = format_error(source, &err);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "  --> line 2, column 8");
        assert_eq!(lines[2], ">   <box wide>");
        assert_eq!(lines[3], "         ^^^^");
    }

    #[test]
    fn test_format_error_zero_width_gets_one_caret() {
        let source = "<box width=10 ";
        let err = MlError::new(ErrorCode::UnterminatedTag, SourceLocation::point(14)).with("tag", "box");
        let report = format_error(source, &err);
        assert!(report.ends_with(&format!("  {}^", " ".repeat(14))));
        assert!(report.contains("line 1, column 15"));
    }

    #[test]
    fn test_format_error_counts_columns_in_chars() {
        let source = "ñ<x>";
        let err = MlError::new(ErrorCode::UnknownTag, SourceLocation::new(3, 4)).with("tag", "x");
        assert!(format_error(source, &err).contains("column 3"));
    }

    #[test]
    fn test_format_error_inverted_span() {
        let err: MlError = serde_json::from_value(serde_json::json!({
            "phase": "transformer",
            "code": "unknown-tag",
            "params": { "tag": "asdf" },
            "loc": { "start": 5, "end": 2 }
        }))
        .unwrap();
        let report = format_error("<asdf>content</asdf>", &err);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[1], "  --> line 1, column 3");
        assert_eq!(lines[3], "    ^^^");
    }

    #[test]
    fn test_format_error_offset_inside_char() {
        let source = "ñ\n<asdf>";
        let err = MlError::new(ErrorCode::UnknownTag, SourceLocation::new(1, 2)).with("tag", "asdf");
        let report = format_error(source, &err);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[1], "  --> line 1, column 1");
        assert_eq!(lines[2], "> ñ");
        assert_eq!(lines[3], "  ^");
    }

    #[test]
    fn test_format_error_span_past_end() {
        let err = MlError::new(ErrorCode::UnexpectedEof, SourceLocation::new(2, 1_000_000));
        let report = format_error("abc", &err);
        assert!(report.ends_with("\n    ^"));
        assert!(report.contains("line 1, column 3"));
    }
}
