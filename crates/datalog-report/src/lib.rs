//! Diagnostic values for the semantic analysis core
//!
//! Diagnostics are values, not exceptions: every check appends to an
//! [`ErrorReport`] and analysis always runs to completion. A diagnostic has
//! a severity, a primary message, and any number of note messages; messages
//! carry source locations where one exists.

mod render;
mod report;

pub use render::SourceCache;
pub use report::{Diagnostic, DiagnosticMessage, ErrorReport, Severity};
