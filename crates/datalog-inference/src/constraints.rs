//! Type constraints over clause arguments

use std::collections::HashMap;
use std::fmt;

use datalog_ast::ArgId;
use datalog_types::{AType, AnalysisType, TypeLattice};

/// Current type of every argument of a clause
pub type TypeAssignment = HashMap<ArgId, AType>;

fn current(assignment: &TypeAssignment, arg: ArgId) -> AType {
    assignment
        .get(&arg)
        .copied()
        .unwrap_or_else(AnalysisType::top)
}

/// Requires `type(arg) <= bound`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedConstraint {
    pub arg: ArgId,
    pub bound: AType,
}

impl FixedConstraint {
    /// Unsatisfied under the initial all-`Top` assignment whenever the
    /// bound is below `Top`; that is what drives the first resolution pass.
    fn is_satisfied(&self, assignment: &TypeAssignment, lattice: &TypeLattice) -> bool {
        lattice.is_subtype(current(assignment, self.arg), self.bound)
    }

    fn resolve(&self, assignment: &mut TypeAssignment, lattice: &TypeLattice) {
        let tightened = lattice.meet(current(assignment, self.arg), self.bound);
        assignment.insert(self.arg, tightened);
    }
}

impl fmt::Display for FixedConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type(#{}) <: {}", self.arg.0, self.bound)
    }
}

/// A constraint the solver can test and enforce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `type(arg) <= bound`
    Fixed(FixedConstraint),
    /// `type(target) <= type(source)`
    Variable { target: ArgId, source: ArgId },
    /// `type(result) <= join(type(lhs), type(rhs))`
    Union {
        result: ArgId,
        lhs: ArgId,
        rhs: ArgId,
    },
    /// When every requirement holds, the consequent must hold
    Implication {
        consequent: FixedConstraint,
        requirements: Vec<FixedConstraint>,
    },
}

impl Constraint {
    pub fn is_satisfied(&self, assignment: &TypeAssignment, lattice: &TypeLattice) -> bool {
        match self {
            Constraint::Fixed(fixed) => fixed.is_satisfied(assignment, lattice),
            Constraint::Variable { target, source } => lattice.is_subtype(
                current(assignment, *target),
                current(assignment, *source),
            ),
            Constraint::Union { result, lhs, rhs } => {
                let bound =
                    lattice.join(current(assignment, *lhs), current(assignment, *rhs));
                lattice.is_subtype(current(assignment, *result), bound)
            }
            Constraint::Implication {
                consequent,
                requirements,
            } => {
                if requirements
                    .iter()
                    .all(|r| r.is_satisfied(assignment, lattice))
                {
                    consequent.is_satisfied(assignment, lattice)
                } else {
                    true
                }
            }
        }
    }

    /// Tighten the assignment towards satisfying the constraint. Each
    /// resolution moves a type downwards in the lattice only.
    pub fn resolve(&self, assignment: &mut TypeAssignment, lattice: &TypeLattice) {
        match self {
            Constraint::Fixed(fixed) => fixed.resolve(assignment, lattice),
            Constraint::Variable { target, source } => {
                let tightened = lattice.meet(
                    current(assignment, *target),
                    current(assignment, *source),
                );
                assignment.insert(*target, tightened);
            }
            Constraint::Union { result, lhs, rhs } => {
                let bound =
                    lattice.join(current(assignment, *lhs), current(assignment, *rhs));
                let tightened = lattice.meet(current(assignment, *result), bound);
                assignment.insert(*result, tightened);
            }
            Constraint::Implication {
                consequent,
                requirements,
            } => {
                if requirements
                    .iter()
                    .all(|r| r.is_satisfied(assignment, lattice))
                {
                    consequent.resolve(assignment, lattice);
                }
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Fixed(fixed) => write!(f, "{}", fixed),
            Constraint::Variable { target, source } => {
                write!(f, "type(#{}) <: type(#{})", target.0, source.0)
            }
            Constraint::Union { result, lhs, rhs } => write!(
                f,
                "type(#{}) <: type(#{}) | type(#{})",
                result.0, lhs.0, rhs.0
            ),
            Constraint::Implication {
                consequent,
                requirements,
            } => {
                write!(f, "(")?;
                for (i, requirement) in requirements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", requirement)?;
                }
                write!(f, ") => {}", consequent)
            }
        }
    }
}
