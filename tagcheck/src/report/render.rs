//! Terminal rendering with ariadne

use std::io::Write;
use std::ops::Range;

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};

use super::{Diagnostic, DiagnosticSink};
use crate::error::Severity;

/// Renders each diagnostic against the unit's source text
pub struct AriadneSink<W: Write> {
    source: String,
    out: W,
    color: bool,
    emitted: usize,
}

impl<W: Write> AriadneSink<W> {
    pub fn new(source: impl Into<String>, out: W) -> Self {
        Self {
            source: source.into(),
            out,
            color: true,
            emitted: 0,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Number of diagnostics rendered so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DiagnosticSink for AriadneSink<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let (kind, color) = match diagnostic.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Advisory => (ReportKind::Advice, Color::Cyan),
        };
        let file = diagnostic.file.as_str();
        let range: Range<usize> = diagnostic.span.into();

        let mut label = Label::new((file, range.clone())).with_message(&diagnostic.message);
        // Label colours are written even when the config disables colour
        if self.color {
            label = label.with_color(color);
        }

        let written = Report::build(kind, (file, range))
            .with_code(diagnostic.code)
            .with_message(&diagnostic.message)
            .with_label(label)
            .with_config(
                Config::default()
                    .with_color(self.color)
                    .with_index_type(IndexType::Byte),
            )
            .finish()
            .write((file, Source::from(self.source.as_str())), &mut self.out);

        match written {
            Ok(()) => self.emitted += 1,
            Err(err) => tracing::warn!(%err, file, "failed to render diagnostic"),
        }
    }
}
