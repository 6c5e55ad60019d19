use datalog_ast::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks compilation
    Error,
    /// Informational
    Warning,
}

/// A single message with an optional source location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    pub message: String,
    #[serde(skip)]
    pub span: Option<Span>,
}

impl DiagnosticMessage {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn unlocated(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }
}

/// A primary message plus any number of notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub primary: DiagnosticMessage,
    pub notes: Vec<DiagnosticMessage>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", kind, self.primary.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {}", note.message)?;
        }
        Ok(())
    }
}

/// Sink that checks write their diagnostics into
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorReport {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>, span: Span) {
        self.add_diagnostic(Diagnostic {
            severity: Severity::Error,
            primary: DiagnosticMessage::new(message, span),
            notes: Vec::new(),
        });
    }

    /// Error that cannot be pinned to a source location, such as the
    /// umbrella errors of the type analysis
    pub fn add_unlocated_error(&mut self, message: impl Into<String>) {
        self.add_diagnostic(Diagnostic {
            severity: Severity::Error,
            primary: DiagnosticMessage::unlocated(message),
            notes: Vec::new(),
        });
    }

    pub fn add_warning(&mut self, message: impl Into<String>, span: Span) {
        self.add_diagnostic(Diagnostic {
            severity: Severity::Warning,
            primary: DiagnosticMessage::new(message, span),
            notes: Vec::new(),
        });
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Messages of all error diagnostics, for assertions and summaries
    pub fn error_messages(&self) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.primary.message.as_str())
            .collect()
    }

    /// Messages of all warning diagnostics
    pub fn warning_messages(&self) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.primary.message.as_str())
            .collect()
    }
}
