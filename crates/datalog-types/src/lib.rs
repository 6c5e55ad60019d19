//! The analysis-type lattice of the Datalog type checker
//!
//! User declarations induce a finite lattice of analysis types per program:
//! everything sits below `Top` and above `Bottom`, each primitive kind has
//! its own top, bottom and constant layer, and declared base, union and
//! record types fill the middle. The type solver only ever moves an
//! argument's type downwards in this lattice, which is what guarantees its
//! termination.

mod environment;
mod lattice;

pub use environment::TypeEnvironment;
pub use lattice::{AType, AnalysisType, Kind, TypeLattice};
