//! Groundedness analysis for clauses
//!
//! An argument is grounded when its value is forced by the clause body.
//! The rules:
//!
//! 1. Arguments of positive atoms are grounded, and the grounding reaches
//!    down through record constructors and type casts
//! 2. Constants and counters are grounded
//! 3. A functor or record over grounded arguments is grounded
//! 4. An equality constraint with one grounded side grounds the other side
//! 5. An aggregate result position is grounded, and the atoms of an
//!    aggregate body ground their arguments like positive atoms
//! 6. Negations and non-equality constraints ground nothing
//!
//! The computation is a fixed point over the variables and positions of
//! the clause; rules 3 and 4 feed back into rule 1.

use std::collections::{HashMap, HashSet};

use crate::ast::*;
use crate::visit::visit_clause_arguments;

/// Compute, for every argument of the clause, whether it is grounded
pub fn grounded_terms(clause: &Clause) -> HashMap<ArgId, bool> {
    let mut state = State::default();

    // Iterate until no new variable or position becomes grounded
    loop {
        let before = (state.variables.len(), state.positions.len());
        state.propagate_literals(&clause.body);
        for arg in &clause.head.args {
            state.propagate_argument_aggregates(arg);
        }
        if (state.variables.len(), state.positions.len()) == before {
            break;
        }
    }

    let mut grounded = HashMap::new();
    visit_clause_arguments(clause, &mut |arg| {
        grounded.insert(arg.id, state.eval(arg));
    });
    grounded
}

#[derive(Default)]
struct State {
    /// Variable names whose value is forced
    variables: HashSet<Symbol>,
    /// Argument positions grounded directly by an atom or equality
    positions: HashSet<ArgId>,
}

impl State {
    fn propagate_literals(&mut self, body: &[Literal]) {
        for literal in body {
            match literal {
                Literal::Atom(atom) => {
                    for arg in &atom.args {
                        self.mark(arg);
                    }
                }
                Literal::Binary(constraint) if constraint.op == ConstraintOp::Eq => {
                    if self.eval(&constraint.lhs) {
                        self.mark(&constraint.rhs);
                    }
                    if self.eval(&constraint.rhs) {
                        self.mark(&constraint.lhs);
                    }
                }
                _ => {}
            }
        }
        // aggregate bodies ground their own atoms, blind to scope
        for literal in body {
            match literal {
                Literal::Atom(atom) => {
                    for arg in &atom.args {
                        self.propagate_argument_aggregates(arg);
                    }
                }
                Literal::Negation(negation) => {
                    for arg in &negation.atom.args {
                        self.propagate_argument_aggregates(arg);
                    }
                }
                Literal::Binary(constraint) => {
                    self.propagate_argument_aggregates(&constraint.lhs);
                    self.propagate_argument_aggregates(&constraint.rhs);
                }
                Literal::Boolean(_) => {}
            }
        }
    }

    fn propagate_argument_aggregates(&mut self, arg: &Argument) {
        match &arg.kind {
            ArgKind::Aggregate(agg) => {
                if let Some(target) = &agg.target {
                    self.propagate_argument_aggregates(target);
                }
                self.propagate_literals(&agg.body);
            }
            ArgKind::Cast { value, .. } => self.propagate_argument_aggregates(value),
            ArgKind::Intrinsic { args, .. }
            | ArgKind::UserFunctor { args, .. }
            | ArgKind::Record { args, .. } => {
                for arg in args {
                    self.propagate_argument_aggregates(arg);
                }
            }
            _ => {}
        }
    }

    /// Ground a position, reaching down through records and casts
    fn mark(&mut self, arg: &Argument) {
        self.positions.insert(arg.id);
        match &arg.kind {
            ArgKind::Variable(name) => {
                self.variables.insert(*name);
            }
            ArgKind::Record { args, .. } => {
                for arg in args {
                    self.mark(arg);
                }
            }
            ArgKind::Cast { value, .. } => self.mark(value),
            _ => {}
        }
    }

    /// Value-groundedness of an argument under the current state
    fn eval(&self, arg: &Argument) -> bool {
        match &arg.kind {
            ArgKind::Variable(name) => self.variables.contains(name),
            ArgKind::Unnamed => self.positions.contains(&arg.id),
            ArgKind::Number(_) | ArgKind::Text(_) | ArgKind::Nil | ArgKind::Counter => true,
            ArgKind::Cast { value, .. } => self.positions.contains(&arg.id) || self.eval(value),
            ArgKind::Intrinsic { args, .. }
            | ArgKind::UserFunctor { args, .. }
            | ArgKind::Record { args, .. } => {
                self.positions.contains(&arg.id) || args.iter().all(|a| self.eval(a))
            }
            ArgKind::Aggregate(_) => true,
        }
    }
}
