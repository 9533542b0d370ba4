//! Document grammar for DeskML.
//!
//! Recursive descent over the combinators:
//!
//! ```text
//! document  = (tag | text)* EOF
//! tag       = '<' ws NAME attribute* ws '>' body
//! body      = (ws (closing | tag | text))*          closing = '</' ws NAME ws '>'
//! attribute = ws NAME (ws '=' ws (STRING | NUMBER))?
//! text      = (!'<' ANY)+
//! ```
//!
//! The first syntax error aborts the parse; no partial tree is returned.

use deskml_combinator::{
    alphanumeric1, any_char, choice, eof, expect, literal, located, many, many_until, map,
    number, optional, seq, take_until1, whitespace, Failure, Located, ParseResult, Parser,
    Reason, SourceLocation, Success,
};

use crate::ast::{AttrValue, AttributeData, Document, MlNode, TagNode, TextNode};
use crate::error::{to_ml_error, ErrorCode, MlError, SyntaxError};

/// Nesting limit used by [`Grammar::new`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

pub type PResult<T> = ParseResult<T, SyntaxError>;

fn remaining(input: &str, offset: usize) -> &str {
    input.get(offset..).unwrap_or("")
}

/// DeskML grammar.
///
/// Holds only the nesting limit, so it is `Copy` and can be shared freely.
/// Recursion depth equals document nesting depth; tags nested deeper than
/// `max_depth` fail with `max-depth-exceeded` instead of growing the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grammar {
    max_depth: usize,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parse `source` into a document, or report the first syntax error.
    pub fn parse(&self, source: &str) -> Result<Document, MlError> {
        match self.parse_document(source, 0) {
            Ok(parsed) => {
                log::debug!("parsed {} top-level nodes", parsed.value.nodes.len());
                Ok(parsed.value)
            }
            Err(failure) => {
                let error = to_ml_error(failure);
                log::debug!("syntax error {} at {:?}", error.code, error.loc);
                Err(error)
            }
        }
    }

    // =========================================================================
    // Document
    // =========================================================================

    /// Parse nodes from `offset` to the end of input.
    pub fn parse_document<'a>(&self, input: &'a str, offset: usize) -> PResult<Document> {
        let node = located(|i: &'a str, o: usize| self.node(i, o, 0));
        let nodes = many(&node).parse(input, offset)?;

        let end: PResult<()> = eof().parse(input, nodes.offset);
        match end {
            Ok(end) => Ok(Success::new(Document { nodes: nodes.value }, end.offset)),
            // many() stopped early, so parsing one more node reproduces its failure
            Err(_) => match node.parse(input, nodes.offset) {
                Err(failure) => Err(failure),
                Ok(_) => Err(Failure::new(Reason::ExpectedEof, nodes.offset)),
            },
        }
    }

    fn node<'a>(&self, input: &'a str, offset: usize, depth: usize) -> PResult<MlNode> {
        choice((|i: &'a str, o: usize| self.tag(i, o, depth), text_node)).parse(input, offset)
    }

    // =========================================================================
    // Tags
    // =========================================================================

    fn tag<'a>(&self, input: &'a str, offset: usize, depth: usize) -> PResult<MlNode> {
        let head = seq((
            expect(literal("<"), SyntaxError::new(ErrorCode::MissingOpeningBracket)),
            whitespace(),
            expect(
                located(alphanumeric1()),
                SyntaxError::new(ErrorCode::TagNameAlphanumeric),
            ),
        ))
        .parse(input, offset)?;
        let (_, _, name) = head.value;

        if depth >= self.max_depth {
            return Err(Failure::spanning(
                SyntaxError::new(ErrorCode::MaxDepthExceeded)
                    .with("tag", name.value)
                    .with("max", self.max_depth),
                name.loc,
            ));
        }

        let attributes = self.attributes(input, head.offset, name.value)?;
        let before_close = whitespace::<SyntaxError>().parse(input, attributes.offset)?;
        let opened = expect(
            literal(">"),
            SyntaxError::new(ErrorCode::UnterminatedTag).with("tag", name.value),
        )
        .parse(input, before_close.offset)
        .map_err(|failure| Failure {
            loc: SourceLocation::new(offset, failure.loc.end),
            ..failure
        })?;

        let body = self.body(input, opened.offset, &name, depth)?;

        let node = TagNode {
            tag: name.map(str::to_string),
            attributes: attributes.value,
            children: body.value,
        };
        Ok(Success::new(MlNode::Tag(node), body.offset))
    }

    /// Attributes up to the closing `>` of the opening tag, or end of input.
    fn attributes<'a>(
        &self,
        input: &'a str,
        offset: usize,
        tag: &str,
    ) -> PResult<Vec<AttributeData>> {
        let end_of_head = seq((whitespace(), choice((map(literal(">"), |_| ()), eof()))));
        let item = map(
            seq((whitespace(), |i: &'a str, o: usize| attribute(i, o, tag))),
            |(_, attr)| attr,
        );
        many_until(item, end_of_head).parse(input, offset)
    }

    /// Children up to and including the closing tag for `name`.
    fn body<'a>(
        &self,
        input: &'a str,
        offset: usize,
        name: &Located<&'a str>,
        depth: usize,
    ) -> PResult<Vec<Located<MlNode>>> {
        // Tag names are alphanumeric, so the name is safe to match literally.
        let closing = seq((
            literal("</"),
            whitespace(),
            literal(name.value),
            whitespace(),
            literal(">"),
        ));
        let child = located(|i: &'a str, o: usize| self.node(i, o, depth + 1));

        let mut children = Vec::new();
        let mut cursor = offset;
        loop {
            cursor = whitespace::<SyntaxError>().parse(input, cursor)?.offset;

            let closed: PResult<_> = closing.parse(input, cursor);
            if let Ok(closed) = closed {
                return Ok(Success::new(children, closed.offset));
            }

            if remaining(input, cursor).starts_with("</") {
                return Err(mismatched_closing_tag(input, cursor, name.value));
            }

            if cursor >= input.len() {
                return Err(Failure {
                    reason: SyntaxError::new(ErrorCode::UnclosedTag).with("tag", name.value),
                    offset: cursor,
                    loc: name.loc,
                });
            }

            let parsed = child.parse(input, cursor)?;
            cursor = parsed.offset;
            children.push(parsed.value);
        }
    }
}

/// Build the failure for a `</...>` that does not close `expected`.
///
/// `found` is the text between `</` and the next `>` or `<`, so a malformed
/// closing tag is shown as written rather than by its name alone.
fn mismatched_closing_tag(input: &str, offset: usize, expected: &str) -> Failure<SyntaxError> {
    let found: PResult<_> = located(seq((
        literal("</"),
        whitespace(),
        optional(take_until1(|c| c == '>' || c == '<')),
        optional(literal(">")),
    )))
    .parse(input, offset);

    let (found_text, loc) = match found {
        Ok(found) => {
            let (_, _, raw, _) = found.value.value;
            (raw.unwrap_or("").trim_end(), found.value.loc)
        }
        Err(failure) => ("", failure.loc),
    };

    Failure::spanning(
        SyntaxError::new(ErrorCode::MismatchedNesting)
            .with("expected", expected)
            .with("found", found_text),
        loc,
    )
}

// =========================================================================
// Attributes
// =========================================================================

/// `key="text"`, `key=12.5`, or a bare `key` meaning `true`.
fn attribute<'a>(input: &'a str, offset: usize, tag: &str) -> PResult<AttributeData> {
    let key = expect(
        located(alphanumeric1()),
        SyntaxError::new(ErrorCode::InvalidAttribute).with("tag", tag),
    )
    .parse(input, offset)?;
    let key_loc = key.value.loc;
    let key_name = key.value.value;

    let equals: PResult<_> = seq((whitespace(), literal("="))).parse(input, key.offset);
    let Ok(equals) = equals else {
        let attr = AttributeData {
            key: Located::new(key_name.to_string(), key_loc),
            attr: Located::new(AttrValue::Boolean(true), key_loc),
        };
        return Ok(Success::new(attr, key.offset));
    };

    let value = map(
        seq((
            whitespace(),
            expect(
                located(attr_value),
                SyntaxError::new(ErrorCode::ExpectedAttrValue).with("key", key_name),
            ),
        )),
        |(_, value)| value,
    )
    .parse(input, equals.offset)?;

    // A value must end at whitespace, `>` or end of input, so `10px` is one
    // bad value rather than `10` followed by a boolean `px`.
    let rest = remaining(input, value.offset);
    if rest.starts_with(|c: char| !c.is_whitespace() && c != '>') {
        let run = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '<')
            .unwrap_or(rest.len());
        return Err(Failure::spanning(
            SyntaxError::new(ErrorCode::ExpectedAttrValue).with("key", key_name),
            SourceLocation::new(value.value.loc.start, value.offset + run),
        ));
    }

    let attr = AttributeData {
        key: Located::new(key_name.to_string(), key_loc),
        attr: value.value,
    };
    Ok(Success::new(attr, value.offset))
}

fn attr_value<'a>(input: &'a str, offset: usize) -> PResult<AttrValue> {
    choice((
        map(quoted_string, AttrValue::String),
        map(number(), AttrValue::Number),
    ))
    .parse(input, offset)
}

/// A double-quoted string, taken verbatim up to the next quote.
fn quoted_string<'a>(input: &'a str, offset: usize) -> PResult<String> {
    map(
        seq((
            literal("\""),
            many_until(any_char(), literal("\"")),
            literal("\""),
        )),
        |(_, chars, _)| chars.into_iter().collect(),
    )
    .parse(input, offset)
}

// =========================================================================
// Text
// =========================================================================

/// One or more characters up to the next `<`.
fn text_node<'a>(input: &'a str, offset: usize) -> PResult<MlNode> {
    if offset >= input.len() {
        return Err(Failure::new(SyntaxError::new(ErrorCode::UnexpectedEof), offset));
    }
    if remaining(input, offset).starts_with('<') {
        return Err(Failure::new(SyntaxError::new(ErrorCode::ExpectedText), offset));
    }

    map(take_until1(|c| c == '<'), |content: &str| {
        MlNode::Text(TextNode {
            content: content.to_string(),
        })
    })
    .parse(input, offset)
}
