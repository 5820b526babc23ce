//! Contains the common [`ErrorKind`] trait used by all errors to display user-facing error
//! messages.

use ariadne::{Color, Label, Report, ReportKind, Source};
use std::{fmt::Debug, io, ops::Range};

/// The color to use to highlight expressions.
pub const EXPR: Color = Color::RGB(52, 235, 152);

/// Represents any kind of error that can occur during some operation.
pub trait ErrorKind: Debug + Send {
    /// Builds the report for this error.
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)>;
}

/// Builds a report from a message, one label string per span, and an optional help message.
///
/// [`ErrorKind`] implementations call this to produce the same report shape for every error.
/// The report owns all of its text, so it borrows nothing from the caller.
pub fn build_report<'a>(
    src_id: &'a str,
    spans: &[Range<usize>],
    message: String,
    labels: Vec<String>,
    help: Option<String>,
) -> Report<'static, (&'a str, Range<usize>)> {
    let mut builder = Report::build(ReportKind::Error, src_id, spans[0].start)
        .with_message(message)
        .with_labels(
            labels
                .into_iter()
                .enumerate()
                .map(|(i, label_str)| {
                    let mut label = Label::new((src_id, spans[i].clone()))
                        .with_color(EXPR);

                    if !label_str.is_empty() {
                        label = label.with_message(label_str);
                    }

                    label
                })
                .collect::<Vec<_>>(),
        );

    if let Some(help) = help {
        builder.set_help(help);
    }

    builder.finish()
}

/// An error associated with regions of source code that can be highlighted.
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

    /// Report this error to stderr, highlighting the offending regions of `input`.
    pub fn report_to_stderr(&self, src_id: &str, input: &str) -> io::Result<()> {
        self.build_report(src_id)
            .eprint((src_id, Source::from(input)))
    }
}
