//! Parse errors and the user-facing reports they build.
//!
//! Every kind is a small struct implementing [`ErrorKind`] by hand; the reports all share the
//! same shape (message, one label per span, optional help), produced through
//! [`canon_error::build_report`].

use ariadne::{Fmt, Report};
use canon_error::{build_report, ErrorKind, EXPR};
use crate::tokenizer::TokenKind;
use std::ops::Range;

/// A general parsing error.
#[derive(Debug)]
pub struct Error {
    /// The regions of the source code that this error originated from.
    pub spans: Vec<Range<usize>>,

    /// The kind of error that occurred.
    pub kind: Box<dyn ErrorKind>,
}

impl Error {
    /// Creates a new error with the given spans and kind.
    pub fn new(spans: Vec<Range<usize>>, kind: impl ErrorKind + 'static) -> Self {
        Self { spans, kind: Box::new(kind) }
    }

    /// Build a report from this error kind.
    pub fn build_report<'a>(&self, src_id: &'a str) -> Report<(&'a str, Range<usize>)> {
        self.kind.build_report(src_id, &self.spans)
    }
}

impl From<Error> for canon_error::Error {
    fn from(err: Error) -> Self {
        Self { spans: err.spans, kind: err.kind }
    }
}

/// The end of the source code was reached unexpectedly.
#[derive(Debug, Clone, PartialEq)]
pub struct UnexpectedEof;

impl ErrorKind for UnexpectedEof {
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)> {
        build_report(
            src_id,
            spans,
            "unexpected end of file".to_string(),
            vec![format!("you might need to add another {} here", "expression".fg(EXPR))],
            None,
        )
    }
}

/// The end of the source code was expected, but something else was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedEof;

impl ErrorKind for ExpectedEof {
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)> {
        build_report(
            src_id,
            spans,
            "expected end of file".to_string(),
            vec![format!("I could not understand the remaining {} here", "expression".fg(EXPR))],
            None,
        )
    }
}

/// An unexpected token was encountered.
#[derive(Debug, Clone, PartialEq)]
pub struct UnexpectedToken {
    /// The token(s) that were expected.
    pub expected: &'static [TokenKind],

    /// The token that was found.
    pub found: TokenKind,
}

impl ErrorKind for UnexpectedToken {
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)> {
        build_report(
            src_id,
            spans,
            "unexpected token".to_string(),
            vec![format!(
                "expected one of: {}",
                self.expected
                    .iter()
                    .map(|t| format!("{:?}", t))
                    .collect::<Vec<_>>()
                    .join(", "),
            )],
            Some(format!("found {:?}", self.found)),
        )
    }
}

/// An invalid digit was used in a radix literal.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRadixDigit {
    /// The radix that was expected.
    pub radix: u8,

    /// The set of allowed digits for this radix.
    pub allowed: &'static [char],

    /// The invalid digit that was used.
    pub digit: char,
}

impl ErrorKind for InvalidRadixDigit {
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)> {
        build_report(
            src_id,
            spans,
            format!("invalid digit in radix notation: `{}`", self.digit),
            vec!["here".to_string()],
            Some(format!(
                "base {} uses these digits (from lowest to highest value): {}",
                self.radix,
                self.allowed.iter().collect::<String>().fg(EXPR),
            )),
        )
    }
}

/// A radix literal prefix was not followed by any digits.
#[derive(Debug, Clone, PartialEq)]
pub struct EmptyRadixLiteral {
    /// The radix of the literal.
    pub radix: u8,
}

impl ErrorKind for EmptyRadixLiteral {
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)> {
        build_report(
            src_id,
            spans,
            "missing digits in radix notation".to_string(),
            vec![format!("add base-{} digits after this prefix", self.radix)],
            None,
        )
    }
}

/// A parenthesis was not closed.
#[derive(Debug, Clone, PartialEq)]
pub struct UnclosedParenthesis {
    /// Whether the parenthesis was an opening parenthesis `(`. Otherwise, the parenthesis was a
    /// closing parenthesis `)`.
    pub opening: bool,
}

impl ErrorKind for UnclosedParenthesis {
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)> {
        build_report(
            src_id,
            spans,
            "unclosed parenthesis".to_string(),
            vec!["this parenthesis is not closed".to_string()],
            Some(
                if self.opening {
                    "add a closing parenthesis `)` somewhere after this"
                } else {
                    "add an opening parenthesis `(` somewhere before this"
                }
                .to_string(),
            ),
        )
    }
}

/// There was no expression inside a pair of parentheses.
#[derive(Debug, Clone, PartialEq)]
pub struct EmptyParenthesis;

impl ErrorKind for EmptyParenthesis {
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)> {
        build_report(
            src_id,
            spans,
            "missing expression inside parenthesis".to_string(),
            vec!["add an expression here".to_string()],
            None,
        )
    }
}
