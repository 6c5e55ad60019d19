//! Pretty rendering of diagnostics with ariadne

use ariadne::{Cache, Label, Report, ReportKind, Source};
use datalog_ast::{SrcId, Span};
use std::collections::HashMap;
use std::fmt;
use std::io;

use crate::{ErrorReport, Severity};

/// Owns the source text of every file referenced by a report
#[derive(Default)]
pub struct SourceCache {
    sources: HashMap<SrcId, Source>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, src: SrcId, text: &str) {
        self.sources.insert(src, Source::from(text));
    }
}

struct CacheRef<'a>(&'a mut SourceCache);

impl Cache<SrcId> for CacheRef<'_> {
    fn fetch(&mut self, id: &SrcId) -> Result<&Source, Box<dyn fmt::Debug + '_>> {
        self.0
            .sources
            .get(id)
            .ok_or_else(|| Box::new(format!("unknown source {}", id)) as Box<dyn fmt::Debug>)
    }

    fn display<'b>(&self, id: &'b SrcId) -> Option<Box<dyn fmt::Display + 'b>> {
        Some(Box::new(*id))
    }
}

impl ErrorReport {
    /// Render every diagnostic as an ariadne report
    pub fn write_pretty<W: io::Write>(
        &self,
        cache: &mut SourceCache,
        writer: &mut W,
    ) -> io::Result<()> {
        for diagnostic in self.diagnostics() {
            let kind = match diagnostic.severity {
                Severity::Error => ReportKind::Error,
                Severity::Warning => ReportKind::Warning,
            };
            let primary_span = diagnostic.primary.span;
            let src = primary_span.map(|s| s.src()).unwrap_or_else(SrcId::empty);
            let offset = primary_span.map(|s| s.start()).unwrap_or(0);

            let mut builder =
                Report::<Span>::build(kind, src, offset).with_message(&diagnostic.primary.message);
            if let Some(span) = primary_span {
                builder = builder.with_label(Label::new(span).with_message(&diagnostic.primary.message));
            }
            for note in &diagnostic.notes {
                match note.span {
                    Some(span) => {
                        builder = builder.with_label(Label::new(span).with_message(&note.message));
                    }
                    None => {
                        builder = builder.with_note(&note.message);
                    }
                }
            }
            builder.finish().write(CacheRef(&mut *cache), &mut *writer)?;
        }
        Ok(())
    }
}
