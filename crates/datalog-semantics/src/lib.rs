//! Semantic checking for Datalog programs
//!
//! [`check_program`] orchestrates every static check over a program: type
//! declaration well-formedness, rule and relation checks, namespaces, I/O
//! directives, the aggregate witness problem, inlining safety,
//! groundedness, type usage, type correctness against the inference
//! results, and stratification. Checks are independent; diagnostics
//! accumulate in the caller's [`datalog_report::ErrorReport`] and no check
//! halts the others.
//!
//! Two passes sit outside the orchestration on purpose:
//!
//! - [`apply_warning_suppression`] is the only pass that writes to the AST
//!   (the suppression qualifier) and is run by the driver beforehand
//! - [`check_execution_plans`] needs the stratification schedule and runs
//!   as its own pass, as in the original compiler pipeline
//!
//! Instead of mutating global configuration when record types show up,
//! [`check_program`] reports the fact through [`ProgramFeatures`] and
//! leaves the reaction to the driver.

mod checker;
mod config;
mod inlining;
mod plan;
mod typecheck;
mod witness;

pub use checker::{check_program, ProgramFeatures};
pub use config::{apply_warning_suppression, Config};
pub use plan::check_execution_plans;
