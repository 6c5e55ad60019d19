//! Depth-first traversal and mapping over the AST
//!
//! Visitors are plain closures invoked in parent-before-child order; the
//! mapper rebuilds a subtree bottom-up, letting the callback replace any
//! argument node with a newly owned one.

use crate::ast::*;

/// Visit an argument and all nested arguments, including aggregate targets
/// and the arguments of literals inside aggregate bodies.
pub fn visit_argument<F: FnMut(&Argument)>(arg: &Argument, f: &mut F) {
    f(arg);
    match &arg.kind {
        ArgKind::Cast { value, .. } => visit_argument(value, f),
        ArgKind::Intrinsic { args, .. }
        | ArgKind::UserFunctor { args, .. }
        | ArgKind::Record { args, .. } => {
            for arg in args {
                visit_argument(arg, f);
            }
        }
        ArgKind::Aggregate(agg) => {
            if let Some(target) = &agg.target {
                visit_argument(target, f);
            }
            for literal in &agg.body {
                visit_literal_arguments(literal, f);
            }
        }
        _ => {}
    }
}

pub fn visit_literal_arguments<F: FnMut(&Argument)>(literal: &Literal, f: &mut F) {
    match literal {
        Literal::Atom(atom) => {
            for arg in &atom.args {
                visit_argument(arg, f);
            }
        }
        Literal::Negation(negation) => {
            for arg in &negation.atom.args {
                visit_argument(arg, f);
            }
        }
        Literal::Binary(constraint) => {
            visit_argument(&constraint.lhs, f);
            visit_argument(&constraint.rhs, f);
        }
        Literal::Boolean(_) => {}
    }
}

/// Visit every argument of a clause, head included
pub fn visit_clause_arguments<F: FnMut(&Argument)>(clause: &Clause, f: &mut F) {
    for arg in &clause.head.args {
        visit_argument(arg, f);
    }
    for literal in &clause.body {
        visit_literal_arguments(literal, f);
    }
}

fn visit_argument_atoms<F: FnMut(&Atom)>(arg: &Argument, f: &mut F) {
    match &arg.kind {
        ArgKind::Cast { value, .. } => visit_argument_atoms(value, f),
        ArgKind::Intrinsic { args, .. }
        | ArgKind::UserFunctor { args, .. }
        | ArgKind::Record { args, .. } => {
            for arg in args {
                visit_argument_atoms(arg, f);
            }
        }
        ArgKind::Aggregate(agg) => {
            if let Some(target) = &agg.target {
                visit_argument_atoms(target, f);
            }
            for literal in &agg.body {
                visit_literal_atoms(literal, f);
            }
        }
        _ => {}
    }
}

/// Visit the atoms of a body literal, including atoms nested in aggregates
pub fn visit_literal_atoms<F: FnMut(&Atom)>(literal: &Literal, f: &mut F) {
    match literal {
        Literal::Atom(atom) => {
            f(atom);
            for arg in &atom.args {
                visit_argument_atoms(arg, f);
            }
        }
        Literal::Negation(negation) => {
            f(&negation.atom);
            for arg in &negation.atom.args {
                visit_argument_atoms(arg, f);
            }
        }
        Literal::Binary(constraint) => {
            visit_argument_atoms(&constraint.lhs, f);
            visit_argument_atoms(&constraint.rhs, f);
        }
        Literal::Boolean(_) => {}
    }
}

/// Visit every atom of a clause, the head included
pub fn visit_clause_atoms<F: FnMut(&Atom)>(clause: &Clause, f: &mut F) {
    f(&clause.head);
    for arg in &clause.head.args {
        visit_argument_atoms(arg, f);
    }
    for literal in &clause.body {
        visit_literal_atoms(literal, f);
    }
}

pub fn visit_program_atoms<F: FnMut(&Atom)>(program: &Program, f: &mut F) {
    for clause in &program.clauses {
        visit_clause_atoms(clause, f);
    }
}

fn visit_argument_negations<F: FnMut(&Negation)>(arg: &Argument, f: &mut F) {
    match &arg.kind {
        ArgKind::Cast { value, .. } => visit_argument_negations(value, f),
        ArgKind::Intrinsic { args, .. }
        | ArgKind::UserFunctor { args, .. }
        | ArgKind::Record { args, .. } => {
            for arg in args {
                visit_argument_negations(arg, f);
            }
        }
        ArgKind::Aggregate(agg) => {
            if let Some(target) = &agg.target {
                visit_argument_negations(target, f);
            }
            for literal in &agg.body {
                visit_literal_negations(literal, f);
            }
        }
        _ => {}
    }
}

fn visit_literal_negations<F: FnMut(&Negation)>(literal: &Literal, f: &mut F) {
    match literal {
        Literal::Negation(negation) => f(negation),
        Literal::Atom(atom) => {
            for arg in &atom.args {
                visit_argument_negations(arg, f);
            }
        }
        Literal::Binary(constraint) => {
            visit_argument_negations(&constraint.lhs, f);
            visit_argument_negations(&constraint.rhs, f);
        }
        Literal::Boolean(_) => {}
    }
}

pub fn visit_clause_negations<F: FnMut(&Negation)>(clause: &Clause, f: &mut F) {
    for arg in &clause.head.args {
        visit_argument_negations(arg, f);
    }
    for literal in &clause.body {
        visit_literal_negations(literal, f);
    }
}

pub fn visit_program_negations<F: FnMut(&Negation)>(program: &Program, f: &mut F) {
    for clause in &program.clauses {
        visit_clause_negations(clause, f);
    }
}

/// Visit every aggregate argument node of a clause, nested ones included
pub fn visit_clause_aggregates<F: FnMut(&Argument)>(clause: &Clause, f: &mut F) {
    visit_clause_arguments(clause, &mut |arg| {
        if matches!(arg.kind, ArgKind::Aggregate(_)) {
            f(arg);
        }
    });
}

pub fn visit_program_aggregates<F: FnMut(&Argument)>(program: &Program, f: &mut F) {
    for clause in &program.clauses {
        visit_clause_aggregates(clause, f);
    }
}

fn visit_direct_aggregates_in_argument<F: FnMut(&Argument)>(arg: &Argument, f: &mut F) {
    match &arg.kind {
        ArgKind::Aggregate(_) => f(arg),
        ArgKind::Cast { value, .. } => visit_direct_aggregates_in_argument(value, f),
        ArgKind::Intrinsic { args, .. }
        | ArgKind::UserFunctor { args, .. }
        | ArgKind::Record { args, .. } => {
            for arg in args {
                visit_direct_aggregates_in_argument(arg, f);
            }
        }
        _ => {}
    }
}

/// Visit the aggregates of a literal that are not enclosed by another
/// aggregate; their bodies are not descended into.
pub fn visit_direct_aggregates<F: FnMut(&Argument)>(literal: &Literal, f: &mut F) {
    match literal {
        Literal::Atom(atom) => {
            for arg in &atom.args {
                visit_direct_aggregates_in_argument(arg, f);
            }
        }
        Literal::Negation(negation) => {
            for arg in &negation.atom.args {
                visit_direct_aggregates_in_argument(arg, f);
            }
        }
        Literal::Binary(constraint) => {
            visit_direct_aggregates_in_argument(&constraint.lhs, f);
            visit_direct_aggregates_in_argument(&constraint.rhs, f);
        }
        Literal::Boolean(_) => {}
    }
}

/// Rebuild an argument bottom-up, applying `f` to every node after its
/// children have been mapped. `f` may return a replacement subtree.
pub fn map_argument<F: FnMut(Argument) -> Argument>(arg: Argument, f: &mut F) -> Argument {
    let Argument { id, span, kind } = arg;
    let kind = match kind {
        ArgKind::Cast { type_name, value } => ArgKind::Cast {
            type_name,
            value: Box::new(map_argument(*value, f)),
        },
        ArgKind::Intrinsic { op, args } => ArgKind::Intrinsic {
            op,
            args: args.into_iter().map(|a| map_argument(a, f)).collect(),
        },
        ArgKind::UserFunctor { name, args } => ArgKind::UserFunctor {
            name,
            args: args.into_iter().map(|a| map_argument(a, f)).collect(),
        },
        ArgKind::Record { type_name, args } => ArgKind::Record {
            type_name,
            args: args.into_iter().map(|a| map_argument(a, f)).collect(),
        },
        ArgKind::Aggregate(agg) => {
            let Aggregate { op, target, body } = *agg;
            ArgKind::Aggregate(Box::new(Aggregate {
                op,
                target: target.map(|t| map_argument(t, f)),
                body: body
                    .into_iter()
                    .map(|l| map_literal_arguments(l, f))
                    .collect(),
            }))
        }
        other => other,
    };
    f(Argument { id, span, kind })
}

pub fn map_literal_arguments<F: FnMut(Argument) -> Argument>(
    literal: Literal,
    f: &mut F,
) -> Literal {
    match literal {
        Literal::Atom(mut atom) => {
            atom.args = atom.args.into_iter().map(|a| map_argument(a, f)).collect();
            Literal::Atom(atom)
        }
        Literal::Negation(mut negation) => {
            negation.atom.args = negation
                .atom
                .args
                .into_iter()
                .map(|a| map_argument(a, f))
                .collect();
            Literal::Negation(negation)
        }
        Literal::Binary(mut constraint) => {
            constraint.lhs = map_argument(constraint.lhs, f);
            constraint.rhs = map_argument(constraint.rhs, f);
            Literal::Binary(constraint)
        }
        Literal::Boolean(b) => Literal::Boolean(b),
    }
}
