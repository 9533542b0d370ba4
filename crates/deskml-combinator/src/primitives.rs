//! Atomic matchers.
//!
//! Every primitive succeeds or fails at the given offset without looking
//! behind it. None of them allocate except for the values they return.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Failure, ParseResult, Reason, Success};

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?").expect("number pattern compiles"));

fn rest(input: &str, offset: usize) -> &str {
    input.get(offset..).unwrap_or("")
}

/// Match `expected` exactly, returning the pattern.
pub fn literal<'a, 'p, E: From<Reason>>(
    expected: &'p str,
) -> impl Fn(&'a str, usize) -> ParseResult<&'p str, E> {
    move |input: &'a str, offset: usize| -> ParseResult<&'p str, E> {
        if rest(input, offset).starts_with(expected) {
            Ok(Success::new(expected, offset + expected.len()))
        } else {
            Err(Failure::new(Reason::Literal(expected.to_string()), offset))
        }
    }
}

/// Zero or more whitespace characters. Never fails.
pub fn whitespace<'a, E>() -> impl Fn(&'a str, usize) -> ParseResult<&'a str, E> {
    move |input: &'a str, offset: usize| -> ParseResult<&'a str, E> {
        let tail = rest(input, offset);
        let taken = tail.len() - tail.trim_start().len();
        Ok(Success::new(&tail[..taken], offset + taken))
    }
}

/// One or more ASCII alphanumeric characters.
///
/// Tag names are built from this, so they can never contain anything that
/// would need escaping when reused as a literal pattern.
pub fn alphanumeric1<'a, E: From<Reason>>() -> impl Fn(&'a str, usize) -> ParseResult<&'a str, E> {
    move |input: &'a str, offset: usize| -> ParseResult<&'a str, E> {
        let tail = rest(input, offset);
        let taken = tail
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        if taken == 0 {
            return Err(Failure::new(Reason::Alphanumeric, offset));
        }
        Ok(Success::new(&tail[..taken], offset + taken))
    }
}

/// A decimal literal of the form `-?digits(.digits)?`.
pub fn number<'a, E: From<Reason>>() -> impl Fn(&'a str, usize) -> ParseResult<f64, E> {
    move |input: &'a str, offset: usize| -> ParseResult<f64, E> {
        let tail = rest(input, offset);
        let Some(found) = NUMBER.find(tail) else {
            return Err(Failure::new(Reason::Number, offset));
        };
        match found.as_str().parse::<f64>() {
            Ok(value) => Ok(Success::new(value, offset + found.end())),
            Err(_) => Err(Failure::new(Reason::Number, offset)),
        }
    }
}

/// Exactly one character, whatever it is.
pub fn any_char<'a, E: From<Reason>>() -> impl Fn(&'a str, usize) -> ParseResult<char, E> {
    move |input: &'a str, offset: usize| -> ParseResult<char, E> {
        match rest(input, offset).chars().next() {
            Some(c) => Ok(Success::new(c, offset + c.len_utf8())),
            None => Err(Failure::new(Reason::UnexpectedEof, offset)),
        }
    }
}

/// Succeeds only when no input remains.
pub fn eof<'a, E: From<Reason>>() -> impl Fn(&'a str, usize) -> ParseResult<(), E> {
    move |input: &'a str, offset: usize| -> ParseResult<(), E> {
        if offset >= input.len() {
            Ok(Success::new((), offset))
        } else {
            Err(Failure::new(Reason::ExpectedEof, offset))
        }
    }
}

/// One or more characters up to, not including, the first one matching `stop`.
pub fn take_until1<'a, E: From<Reason>>(
    stop: impl Fn(char) -> bool,
) -> impl Fn(&'a str, usize) -> ParseResult<&'a str, E> {
    move |input: &'a str, offset: usize| -> ParseResult<&'a str, E> {
        let tail = rest(input, offset);
        match tail.chars().next() {
            None => return Err(Failure::new(Reason::UnexpectedEof, offset)),
            Some(c) if stop(c) => return Err(Failure::new(Reason::EmptyTake, offset)),
            Some(_) => {}
        }
        let taken = tail.find(|c: char| stop(c)).unwrap_or(tail.len());
        Ok(Success::new(&tail[..taken], offset + taken))
    }
}
