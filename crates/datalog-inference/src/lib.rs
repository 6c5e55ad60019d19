//! Type inference for Datalog clauses
//!
//! Inference runs per clause: one traversal generates a system of
//! constraints over the clause's arguments, then a fixed point resolves
//! them. Every resolution step can only lower an argument's type in the
//! lattice, so the loop terminates at the most general assignment that
//! satisfies all constraints.
//!
//! Clauses that are structurally unfit for typing (undefined relations,
//! arity mismatches, undeclared types) are skipped and recorded so the
//! semantic checker can report an umbrella diagnostic instead of piling
//! errors onto an already broken clause.

mod analysis;
mod constraints;
mod solver;

pub use analysis::TypeAnalysis;
pub use constraints::{Constraint, FixedConstraint, TypeAssignment};
pub use solver::TypeSolver;
