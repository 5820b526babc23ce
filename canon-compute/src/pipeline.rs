//! The end-to-end text pipeline: parse, canonicalize, render.
//!
//! [`evaluate`] is the single entry point a text front end needs. It parses the input, checks
//! that the expression fits the caller's output buffer **before** reducing it (an input too
//! large to echo back is rejected up front, not after the work is done), reduces the tree, and
//! renders the canonical result for display.

use crate::fmt::{self, DisplayMode, Mode, TruncationError};
use crate::reduce::{reduce, ReductionContext};
use crate::tree::{from_ast, FromAstError};
use canon_parser::parser::{error::Error as ParseError, Parser};

/// The number of significant digits used for scientific display.
pub const DEFAULT_SIGNIFICANT_DIGITS: usize = 7;

/// An error from any stage of the pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// The input is not a well-formed expression. The inner error carries the spans and kind
    /// needed to build a source-annotated report.
    Parse(ParseError),

    /// The expression parsed, but cannot be represented as a tree.
    Build(FromAstError),

    /// The expression or its result does not fit the output buffer.
    Truncated(TruncationError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(_) => write!(f, "the input is not a well-formed expression"),
            Self::Build(err) => write!(f, "{}", err),
            Self::Truncated(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<ParseError> for PipelineError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<FromAstError> for PipelineError {
    fn from(err: FromAstError) -> Self {
        Self::Build(err)
    }
}

impl From<TruncationError> for PipelineError {
    fn from(err: TruncationError) -> Self {
        Self::Truncated(err)
    }
}

/// Parses `input`, reduces it under `ctx`, and renders the canonical result into `out`.
/// Returns the number of bytes written.
///
/// Before reduction, the unreduced tree is rendered into `out` in parseable form as a size
/// check; input that cannot be echoed back through the same buffer fails with
/// [`PipelineError::Truncated`] without being reduced.
pub fn evaluate(
    input: &str,
    ctx: &ReductionContext,
    out: &mut [u8],
) -> Result<usize, PipelineError> {
    let ast = Parser::new(input).try_parse_full()?;
    let mut tree = from_ast(&ast)?;

    let Some(root) = tree.root() else {
        return Err(PipelineError::Truncated(TruncationError));
    };
    fmt::render(
        &tree,
        root,
        out,
        Mode::Parseable,
        DisplayMode::Decimal,
        DEFAULT_SIGNIFICANT_DIGITS,
    )?;

    reduce(&mut tree, ctx);

    let Some(root) = tree.root() else {
        return Err(PipelineError::Truncated(TruncationError));
    };
    let len = fmt::render(
        &tree,
        root,
        out,
        Mode::Displayable,
        ctx.display_mode,
        DEFAULT_SIGNIFICANT_DIGITS,
    )?;
    Ok(len)
}
