//! DeskML Combinators
//!
//! Offset-based parser primitives and combinators. A parser is any function
//! `(input, offset) -> ParseResult<T, E>`; it never mutates shared state and can
//! be re-invoked at any offset, including recursively on itself.
//!
//! Failures are generic over an application error type `E`. Primitives report
//! mechanical failures through `E: From<Reason>`, and grammars replace them with
//! their own structured errors via [`expect`].
//!
//! # Example
//!
//! ```
//! use deskml_combinator::{alphanumeric1, literal, seq, whitespace, Parser, Reason};
//!
//! let assign = seq((alphanumeric1::<Reason>(), whitespace(), literal("="), whitespace(), alphanumeric1()));
//! let parsed = assign.parse("width = 10", 0).unwrap();
//! assert_eq!(parsed.value, ("width", " ", "=", " ", "10"));
//! assert_eq!(parsed.offset, 10);
//! ```

pub mod combinators;
pub mod primitives;
pub mod span;

pub use combinators::{
    choice, expect, located, lookahead, many, many1, many_until, map, not, optional, seq,
    Alternatives, Sequence,
};
pub use primitives::{alphanumeric1, any_char, eof, literal, number, take_until1, whitespace};
pub use span::{Located, SourceLocation};

/// Mechanical failure reasons produced by the primitives and combinators.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Reason {
    #[error("expected \"{0}\"")]
    Literal(String),
    #[error("expected alphanumeric character")]
    Alphanumeric,
    #[error("expected number")]
    Number,
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("expected end of input")]
    ExpectedEof,
    #[error("expected parser to fail")]
    UnexpectedMatch,
    #[error("predicate matched immediately; nothing to take")]
    EmptyTake,
    #[error("reached end of input before terminator")]
    UnterminatedRepetition,
    #[error("parser stuck: child parser did not consume any input")]
    Stuck,
}

/// A successful parse: the produced value and the cursor after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Success<T> {
    pub value: T,
    pub offset: usize,
}

impl<T> Success<T> {
    pub fn new(value: T, offset: usize) -> Self {
        Self { value, offset }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Success<U> {
        Success {
            value: f(self.value),
            offset: self.offset,
        }
    }
}

/// A failed parse.
///
/// `offset` is where the parser gave up; `loc` may start earlier to cover the
/// whole construct that failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure<E> {
    pub reason: E,
    pub offset: usize,
    pub loc: SourceLocation,
}

impl<E> Failure<E> {
    /// A failure located at a single offset.
    pub fn new(reason: impl Into<E>, offset: usize) -> Self {
        Self {
            reason: reason.into(),
            offset,
            loc: SourceLocation::point(offset),
        }
    }

    /// A failure covering `loc`, giving up at `loc.end`.
    pub fn spanning(reason: impl Into<E>, loc: SourceLocation) -> Self {
        Self {
            reason: reason.into(),
            offset: loc.end,
            loc,
        }
    }
}

pub type ParseResult<T, E> = Result<Success<T>, Failure<E>>;

/// A parser over `&'a str` producing `T` or failing with `E`.
///
/// Implemented for every `Fn(&'a str, usize) -> ParseResult<T, E>`, so plain
/// functions and closures are parsers.
pub trait Parser<'a, T, E> {
    fn parse(&self, input: &'a str, offset: usize) -> ParseResult<T, E>;
}

impl<'a, T, E, F> Parser<'a, T, E> for F
where
    F: Fn(&'a str, usize) -> ParseResult<T, E>,
{
    fn parse(&self, input: &'a str, offset: usize) -> ParseResult<T, E> {
        self(input, offset)
    }
}

