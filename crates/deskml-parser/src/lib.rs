//! DeskML Parser
//!
//! Turns DeskML source into a span-annotated syntax tree. Built on the
//! combinators from `deskml-combinator`, with a hand-written tag body loop so
//! nesting errors can name the closing tag that was expected.
//!
//! Also home of the diagnostic catalog shared by every later stage: each
//! [`ErrorCode`] maps to a fixed message template, and [`format_error`]
//! renders a caret-annotated report against the source.
//!
//! # Example
//!
//! ```
//! let doc = deskml_parser::parse("<box color=\"red\"><text>Hi</text></box>").unwrap();
//! assert_eq!(doc.nodes.len(), 1);
//! ```

pub mod ast;
pub mod error;
pub mod grammar;

pub use ast::{AttrType, AttrValue, AttributeData, Document, MlNode, TagNode, TextNode};
pub use error::{format_error, to_ml_error, ErrorCode, MlError, Params, Phase, SyntaxError};
pub use grammar::{Grammar, DEFAULT_MAX_DEPTH};

/// Parse a complete document with the default nesting limit.
pub fn parse(source: &str) -> Result<Document, MlError> {
    Grammar::new().parse(source)
}
