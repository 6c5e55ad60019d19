//! Read-only queries over clauses and programs

use crate::ast::*;
use crate::visit::{
    visit_clause_aggregates, visit_clause_arguments, visit_clause_negations, visit_literal_atoms,
};
use crate::Span;

/// All named variable occurrences of a clause, in traversal order
pub fn variables(clause: &Clause) -> Vec<Argument> {
    let mut found = Vec::new();
    visit_clause_arguments(clause, &mut |arg| {
        if matches!(arg.kind, ArgKind::Variable(_)) {
            found.push(arg.clone());
        }
    });
    found
}

/// All record constructor occurrences of a clause, in traversal order
pub fn records(clause: &Clause) -> Vec<Argument> {
    let mut found = Vec::new();
    visit_clause_arguments(clause, &mut |arg| {
        if matches!(arg.kind, ArgKind::Record { .. }) {
            found.push(arg.clone());
        }
    });
    found
}

/// The declaration of the relation an atom refers to, if any
pub fn atom_relation<'p>(program: &'p Program, atom: &Atom) -> Option<&'p Relation> {
    program.relation(atom.relation)
}

/// Whether a clause of `of` negates the relation `on`; returns the location
/// of the first such negation.
pub fn negated_dependency(program: &Program, of: RelationName, on: RelationName) -> Option<Span> {
    for clause in program.clauses_of(of) {
        let mut found = None;
        visit_clause_negations(clause, &mut |negation| {
            if found.is_none() && negation.atom.relation == on {
                found = Some(negation.span);
            }
        });
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Whether a clause of `of` mentions the relation `on` inside an aggregate
/// body; returns the location of the first such atom.
pub fn aggregated_dependency(
    program: &Program,
    of: RelationName,
    on: RelationName,
) -> Option<Span> {
    for clause in program.clauses_of(of) {
        let mut found = None;
        visit_clause_aggregates(clause, &mut |arg| {
            let ArgKind::Aggregate(agg) = &arg.kind else {
                return;
            };
            for literal in &agg.body {
                visit_literal_atoms(literal, &mut |atom| {
                    if found.is_none() && atom.relation == on {
                        found = Some(atom.span);
                    }
                });
            }
        });
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Whether an argument contains the unnamed variable `_`. Aggregates are
/// opaque: an underscore inside an aggregate body does not count.
pub fn has_unnamed_variable(arg: &Argument) -> bool {
    match &arg.kind {
        ArgKind::Unnamed => true,
        ArgKind::Variable(_)
        | ArgKind::Number(_)
        | ArgKind::Text(_)
        | ArgKind::Nil
        | ArgKind::Counter
        | ArgKind::Aggregate(_) => false,
        ArgKind::Cast { value, .. } => has_unnamed_variable(value),
        ArgKind::Intrinsic { args, .. }
        | ArgKind::UserFunctor { args, .. }
        | ArgKind::Record { args, .. } => args.iter().any(has_unnamed_variable),
    }
}

/// Whether a literal contains the unnamed variable `_`, aggregates excluded
pub fn literal_has_unnamed_variable(literal: &Literal) -> bool {
    match literal {
        Literal::Atom(atom) => atom.args.iter().any(has_unnamed_variable),
        Literal::Negation(negation) => negation.atom.args.iter().any(has_unnamed_variable),
        Literal::Binary(constraint) => {
            has_unnamed_variable(&constraint.lhs) || has_unnamed_variable(&constraint.rhs)
        }
        Literal::Boolean(_) => false,
    }
}
