//! Composition operators.
//!
//! `seq` and `choice` take tuples of one to eight parsers, so an empty
//! alternative list cannot be written. Repetition combinators fail with
//! [`Reason::Stuck`] instead of looping when their child succeeds without
//! consuming input.

use crate::{Failure, Located, ParseResult, Parser, Reason, SourceLocation, Success};

// =========================================================================
// Sequencing and alternation over tuples
// =========================================================================

/// A tuple of parsers run one after another.
pub trait Sequence<'a, T, E> {
    fn parse_sequence(&self, input: &'a str, offset: usize) -> ParseResult<T, E>;
}

/// A tuple of parsers producing the same type, tried in order.
pub trait Alternatives<'a, T, E> {
    fn parse_alternatives(&self, input: &'a str, offset: usize) -> ParseResult<T, E>;
}

macro_rules! sequence_impl {
    ($($P:ident $T:ident $idx:tt),+) => {
        impl<'a, E, $($P, $T),+> Sequence<'a, ($($T,)+), E> for ($($P,)+)
        where
            $($P: Parser<'a, $T, E>,)+
        {
            fn parse_sequence(&self, input: &'a str, offset: usize) -> ParseResult<($($T,)+), E> {
                let mut cursor = offset;
                let value = ($(
                    {
                        let step = self.$idx.parse(input, cursor)?;
                        cursor = step.offset;
                        step.value
                    },
                )+);
                Ok(Success::new(value, cursor))
            }
        }
    };
}

sequence_impl!(P0 T0 0);
sequence_impl!(P0 T0 0, P1 T1 1);
sequence_impl!(P0 T0 0, P1 T1 1, P2 T2 2);
sequence_impl!(P0 T0 0, P1 T1 1, P2 T2 2, P3 T3 3);
sequence_impl!(P0 T0 0, P1 T1 1, P2 T2 2, P3 T3 3, P4 T4 4);
sequence_impl!(P0 T0 0, P1 T1 1, P2 T2 2, P3 T3 3, P4 T4 4, P5 T5 5);
sequence_impl!(P0 T0 0, P1 T1 1, P2 T2 2, P3 T3 3, P4 T4 4, P5 T5 5, P6 T6 6);
sequence_impl!(P0 T0 0, P1 T1 1, P2 T2 2, P3 T3 3, P4 T4 4, P5 T5 5, P6 T6 6, P7 T7 7);

macro_rules! alternatives_impl {
    ($P0:ident $idx0:tt $(, $P:ident $idx:tt)*) => {
        impl<'a, T, E, $P0 $(, $P)*> Alternatives<'a, T, E> for ($P0, $($P,)*)
        where
            $P0: Parser<'a, T, E>,
            $($P: Parser<'a, T, E>,)*
        {
            #[allow(unused_mut)]
            fn parse_alternatives(&self, input: &'a str, offset: usize) -> ParseResult<T, E> {
                let mut best = match self.$idx0.parse(input, offset) {
                    Ok(success) => return Ok(success),
                    Err(failure) => failure,
                };
                $(
                    match self.$idx.parse(input, offset) {
                        Ok(success) => return Ok(success),
                        // ties keep the earlier alternative
                        Err(failure) if failure.loc.end > best.loc.end => best = failure,
                        Err(_) => {}
                    }
                )*
                Err(best)
            }
        }
    };
}

alternatives_impl!(P0 0);
alternatives_impl!(P0 0, P1 1);
alternatives_impl!(P0 0, P1 1, P2 2);
alternatives_impl!(P0 0, P1 1, P2 2, P3 3);
alternatives_impl!(P0 0, P1 1, P2 2, P3 3, P4 4);
alternatives_impl!(P0 0, P1 1, P2 2, P3 3, P4 4, P5 5);
alternatives_impl!(P0 0, P1 1, P2 2, P3 3, P4 4, P5 5, P6 6);
alternatives_impl!(P0 0, P1 1, P2 2, P3 3, P4 4, P5 5, P6 6, P7 7);

/// Run parsers in order, short-circuiting on the first failure.
pub fn seq<'a, T, E>(
    parsers: impl Sequence<'a, T, E>,
) -> impl Fn(&'a str, usize) -> ParseResult<T, E> {
    move |input: &'a str, offset: usize| parsers.parse_sequence(input, offset)
}

/// Try alternatives in order and return the first success.
///
/// When every alternative fails, the failure whose span ends furthest into
/// the input is reported.
pub fn choice<'a, T, E>(
    alternatives: impl Alternatives<'a, T, E>,
) -> impl Fn(&'a str, usize) -> ParseResult<T, E> {
    move |input: &'a str, offset: usize| alternatives.parse_alternatives(input, offset)
}

// =========================================================================
// Value transforms
// =========================================================================

pub fn map<'a, T, U, E>(
    parser: impl Parser<'a, T, E>,
    f: impl Fn(T) -> U,
) -> impl Fn(&'a str, usize) -> ParseResult<U, E> {
    move |input: &'a str, offset: usize| parser.parse(input, offset).map(|success| success.map(&f))
}

/// `Some(value)` on success, `None` without consuming input on failure.
pub fn optional<'a, T, E>(
    parser: impl Parser<'a, T, E>,
) -> impl Fn(&'a str, usize) -> ParseResult<Option<T>, E> {
    move |input: &'a str, offset: usize| -> ParseResult<Option<T>, E> {
        match parser.parse(input, offset) {
            Ok(success) => Ok(success.map(Some)),
            Err(_) => Ok(Success::new(None, offset)),
        }
    }
}

/// Wrap the value with the span from entry to exit offset.
pub fn located<'a, T, E>(
    parser: impl Parser<'a, T, E>,
) -> impl Fn(&'a str, usize) -> ParseResult<Located<T>, E> {
    move |input: &'a str, offset: usize| -> ParseResult<Located<T>, E> {
        let success = parser.parse(input, offset)?;
        let loc = SourceLocation::new(offset, success.offset);
        Ok(success.map(|value| Located::new(value, loc)))
    }
}

// =========================================================================
// Repetition
// =========================================================================

fn repeat<'a, T, E: From<Reason>>(
    parser: &impl Parser<'a, T, E>,
    input: &'a str,
    mut cursor: usize,
    values: &mut Vec<T>,
) -> Result<usize, Failure<E>> {
    loop {
        match parser.parse(input, cursor) {
            Ok(step) if step.offset == cursor => return Err(Failure::new(Reason::Stuck, cursor)),
            Ok(step) => {
                cursor = step.offset;
                values.push(step.value);
            }
            Err(_) => return Ok(cursor),
        }
    }
}

/// Zero or more applications of `parser`.
pub fn many<'a, T, E: From<Reason>>(
    parser: impl Parser<'a, T, E>,
) -> impl Fn(&'a str, usize) -> ParseResult<Vec<T>, E> {
    move |input: &'a str, offset: usize| -> ParseResult<Vec<T>, E> {
        let mut values = Vec::new();
        let cursor = repeat(&parser, input, offset, &mut values)?;
        Ok(Success::new(values, cursor))
    }
}

/// One or more applications of `parser`; the first failure is propagated.
pub fn many1<'a, T, E: From<Reason>>(
    parser: impl Parser<'a, T, E>,
) -> impl Fn(&'a str, usize) -> ParseResult<Vec<T>, E> {
    move |input: &'a str, offset: usize| -> ParseResult<Vec<T>, E> {
        let first = parser.parse(input, offset)?;
        if first.offset == offset {
            return Err(Failure::new(Reason::Stuck, offset));
        }
        let mut values = vec![first.value];
        let cursor = repeat(&parser, input, first.offset, &mut values)?;
        Ok(Success::new(values, cursor))
    }
}

/// Apply `parser` until `terminator` matches at the cursor.
///
/// The terminator is only peeked, never consumed. Fails when input runs out
/// first, when `parser` fails, or when `parser` stops making progress.
pub fn many_until<'a, T, U, E: From<Reason>>(
    parser: impl Parser<'a, T, E>,
    terminator: impl Parser<'a, U, E>,
) -> impl Fn(&'a str, usize) -> ParseResult<Vec<T>, E> {
    move |input: &'a str, offset: usize| -> ParseResult<Vec<T>, E> {
        let mut values = Vec::new();
        let mut cursor = offset;
        while terminator.parse(input, cursor).is_err() {
            if cursor >= input.len() {
                return Err(Failure::new(Reason::UnterminatedRepetition, cursor));
            }
            let step = parser.parse(input, cursor)?;
            if step.offset == cursor {
                return Err(Failure::new(Reason::Stuck, cursor));
            }
            cursor = step.offset;
            values.push(step.value);
        }
        Ok(Success::new(values, cursor))
    }
}

// =========================================================================
// Lookahead and error shaping
// =========================================================================

/// Succeed or fail exactly as `parser`, without advancing.
pub fn lookahead<'a, T, E>(
    parser: impl Parser<'a, T, E>,
) -> impl Fn(&'a str, usize) -> ParseResult<T, E> {
    move |input: &'a str, offset: usize| -> ParseResult<T, E> {
        let success = parser.parse(input, offset)?;
        Ok(Success::new(success.value, offset))
    }
}

/// Negative lookahead: succeed without consuming input only if `parser` fails.
pub fn not<'a, T, E: From<Reason>>(
    parser: impl Parser<'a, T, E>,
) -> impl Fn(&'a str, usize) -> ParseResult<(), E> {
    move |input: &'a str, offset: usize| -> ParseResult<(), E> {
        match parser.parse(input, offset) {
            Ok(_) => Err(Failure::new(Reason::UnexpectedMatch, offset)),
            Err(_) => Ok(Success::new((), offset)),
        }
    }
}

/// Replace the failure reason of `parser` with `reason`.
///
/// The reported span is widened to start at the entry offset, so it covers
/// the whole attempted construct rather than only the failing character.
pub fn expect<'a, T, E: Clone>(
    parser: impl Parser<'a, T, E>,
    reason: E,
) -> impl Fn(&'a str, usize) -> ParseResult<T, E> {
    move |input: &'a str, offset: usize| -> ParseResult<T, E> {
        parser.parse(input, offset).map_err(|failure| Failure {
            reason: reason.clone(),
            offset: failure.offset,
            loc: SourceLocation::point(offset).cover(failure.loc),
        })
    }
}
