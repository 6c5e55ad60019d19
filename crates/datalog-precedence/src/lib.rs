//! Dependency analyses over a Datalog program
//!
//! The semantic checks consume a handful of precomputed views of the
//! program: the precedence graph of its relations, the set of recursive
//! clauses, the stratification schedule, and the I/O classification of
//! each relation. This crate computes all four.

mod graph;
mod io;
mod precedence;
mod recursive;
mod schedule;

pub use graph::Graph;
pub use io::IoTypes;
pub use precedence::PrecedenceGraph;
pub use recursive::RecursiveClauses;
pub use schedule::{RelationSchedule, RelationScheduleStep};
