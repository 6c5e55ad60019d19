//! Aggregate witness detection
//!
//! A witness problem arises when an argument owes its groundedness to an
//! aggregate: a variable bound inside an aggregate body, or a variable
//! equated to nothing but the aggregate's result, is not well-defined in
//! the enclosing scope.
//!
//! The detection builds two parallel clones of a clause body in one
//! traversal, together with the map between their argument positions. In
//! the second clone every aggregate is replaced by a freshly named
//! variable, severing everything the aggregate contributed. A synthetic
//! grounding atom carrying the arguments inherited from enclosing scopes
//! is appended to both clones. Any argument that is ungrounded in the
//! replaced clone but grounded in the original was grounded only through
//! an aggregate, and is reported. Aggregate bodies are then checked
//! recursively for nested witnesses.

use std::collections::HashMap;

use datalog_ast::{
    map_literal_arguments, visit_argument, visit_clause_arguments, visit_direct_aggregates,
    grounded_terms, ArgId, ArgKind, Argument, Atom, Clause, Literal, Negation, Program,
    RelationName, Span, Symbol,
};
use datalog_report::ErrorReport;

pub(crate) fn check_witness_problem(report: &mut ErrorReport, program: &Program) {
    for clause in &program.clauses {
        // head variables take part as a negated pseudo-literal, so their
        // groundedness is observed without being contributed to
        let mut ids = IdGen::default();
        let mut head_vars = Vec::new();
        for arg in &clause.head.args {
            visit_argument(arg, &mut |inner| {
                if matches!(inner.kind, ArgKind::Variable(_)) {
                    head_vars.push(inner.clone());
                }
            });
        }

        let mut literals: Vec<Literal> = clause.body.clone();
        literals.push(Literal::Negation(Negation {
            atom: Atom {
                relation: RelationName::from_dotted("+head"),
                args: head_vars,
                span: clause.head.span,
            },
            span: clause.head.span,
        }));

        for span in invalid_witnesses(&literals, &[], &mut ids) {
            report.add_error(
                "Witness problem: argument grounded by an aggregator's inner scope is used \
                 ungrounded in outer scope",
                span,
            );
        }
    }
}

#[derive(Default)]
struct IdGen {
    next: u32,
    replaced: usize,
}

impl IdGen {
    fn next_id(&mut self) -> ArgId {
        let id = ArgId(self.next);
        self.next += 1;
        id
    }

    fn fresh_variable(&mut self, span: Span) -> Argument {
        let name = format!("+aggr_var_{}", self.replaced);
        self.replaced += 1;
        Argument {
            id: self.next_id(),
            span,
            kind: ArgKind::Variable(Symbol::new(name)),
        }
    }
}

/// Source locations of the arguments grounded only through an aggregate,
/// at this literal level and recursively inside aggregate bodies.
/// `inherited` carries the arguments already grounded by enclosing scopes.
fn invalid_witnesses(literals: &[Literal], inherited: &[Argument], ids: &mut IdGen) -> Vec<Span> {
    let mut position_map: HashMap<ArgId, ArgId> = HashMap::new();
    let mut original_body = Vec::new();
    let mut replaced_body = Vec::new();

    // paired clone with the position map built along the way
    for literal in literals {
        let (original, replaced) = paired_clone_literal(literal, ids, &mut position_map);
        original_body.push(original);
        replaced_body.push(replaced);
    }

    // sever the aggregates in the replaced clone
    replaced_body = replaced_body
        .into_iter()
        .map(|literal| {
            map_literal_arguments(literal, &mut |arg| {
                if matches!(arg.kind, ArgKind::Aggregate(_)) {
                    ids.fresh_variable(arg.span)
                } else {
                    arg
                }
            })
        })
        .collect();

    // both clones receive the inherited groundedness through a synthetic
    // atom; the fresh aggregate variables receive none, which is exactly
    // what exposes arguments grounded only through an aggregate
    original_body.push(grounding_atom(inherited, ids));
    replaced_body.push(grounding_atom(inherited, ids));

    let original_clause = synthetic_clause(original_body);
    let replaced_clause = synthetic_clause(replaced_body);

    let original_grounded = grounded_terms(&original_clause);
    let replaced_grounded = grounded_terms(&replaced_clause);

    let mut result = Vec::new();
    let mut newly_grounded: Vec<Argument> = Vec::new();
    visit_clause_arguments(&replaced_clause, &mut |arg| {
        if replaced_grounded.get(&arg.id) == Some(&false) {
            if let Some(original_id) = position_map.get(&arg.id) {
                if original_grounded.get(original_id) == Some(&true) {
                    result.push(arg.span);
                }
            }
        }
        // everything at this level counts as grounded for nested scopes
        newly_grounded.push(arg.clone());
    });
    for arg in inherited {
        newly_grounded.push(arg.clone());
    }

    // nested aggregates are checked against the enriched grounding
    for literal in literals {
        visit_direct_aggregates(literal, &mut |arg| {
            if let ArgKind::Aggregate(aggregate) = &arg.kind {
                result.extend(invalid_witnesses(&aggregate.body, &newly_grounded, ids));
            }
        });
    }

    result
}

fn grounding_atom(inherited: &[Argument], ids: &mut IdGen) -> Literal {
    let args = inherited.iter().map(|arg| reid_clone(arg, ids)).collect();
    Literal::Atom(Atom {
        relation: RelationName::from_dotted("+grounding"),
        args,
        span: Span::internal(),
    })
}

fn synthetic_clause(body: Vec<Literal>) -> Clause {
    Clause {
        head: Atom {
            relation: RelationName::from_dotted("+witness"),
            args: Vec::new(),
            span: Span::internal(),
        },
        body,
        plan: None,
        is_generated: true,
        span: Span::internal(),
    }
}

/// Deep clone with fresh ids; used for the grounding atoms
fn reid_clone(arg: &Argument, ids: &mut IdGen) -> Argument {
    let mut discard = HashMap::new();
    paired_clone_argument(arg, ids, &mut discard).0
}

fn paired_clone_literal(
    literal: &Literal,
    ids: &mut IdGen,
    map: &mut HashMap<ArgId, ArgId>,
) -> (Literal, Literal) {
    match literal {
        Literal::Atom(atom) => {
            let (first, second) = paired_clone_atom(atom, ids, map);
            (Literal::Atom(first), Literal::Atom(second))
        }
        Literal::Negation(negation) => {
            let (first, second) = paired_clone_atom(&negation.atom, ids, map);
            (
                Literal::Negation(Negation {
                    atom: first,
                    span: negation.span,
                }),
                Literal::Negation(Negation {
                    atom: second,
                    span: negation.span,
                }),
            )
        }
        Literal::Binary(constraint) => {
            let (lhs_first, lhs_second) = paired_clone_argument(&constraint.lhs, ids, map);
            let (rhs_first, rhs_second) = paired_clone_argument(&constraint.rhs, ids, map);
            let mut first = constraint.clone();
            first.lhs = lhs_first;
            first.rhs = rhs_first;
            let mut second = constraint.clone();
            second.lhs = lhs_second;
            second.rhs = rhs_second;
            (Literal::Binary(first), Literal::Binary(second))
        }
        Literal::Boolean(boolean) => (
            Literal::Boolean(boolean.clone()),
            Literal::Boolean(boolean.clone()),
        ),
    }
}

fn paired_clone_atom(
    atom: &Atom,
    ids: &mut IdGen,
    map: &mut HashMap<ArgId, ArgId>,
) -> (Atom, Atom) {
    let mut first_args = Vec::new();
    let mut second_args = Vec::new();
    for arg in &atom.args {
        let (first, second) = paired_clone_argument(arg, ids, map);
        first_args.push(first);
        second_args.push(second);
    }
    (
        Atom {
            relation: atom.relation,
            args: first_args,
            span: atom.span,
        },
        Atom {
            relation: atom.relation,
            args: second_args,
            span: atom.span,
        },
    )
}

/// Clone one argument into two owned copies with fresh ids, recording the
/// replaced-clone to original-clone correspondence
fn paired_clone_argument(
    arg: &Argument,
    ids: &mut IdGen,
    map: &mut HashMap<ArgId, ArgId>,
) -> (Argument, Argument) {
    let first_id = ids.next_id();
    let second_id = ids.next_id();
    map.insert(second_id, first_id);

    let (first_kind, second_kind) = match &arg.kind {
        ArgKind::Cast { type_name, value } => {
            let (first, second) = paired_clone_argument(value, ids, map);
            (
                ArgKind::Cast {
                    type_name: *type_name,
                    value: Box::new(first),
                },
                ArgKind::Cast {
                    type_name: *type_name,
                    value: Box::new(second),
                },
            )
        }
        ArgKind::Intrinsic { op, args } => {
            let (first, second) = paired_clone_arguments(args, ids, map);
            (
                ArgKind::Intrinsic { op: *op, args: first },
                ArgKind::Intrinsic {
                    op: *op,
                    args: second,
                },
            )
        }
        ArgKind::UserFunctor { name, args } => {
            let (first, second) = paired_clone_arguments(args, ids, map);
            (
                ArgKind::UserFunctor {
                    name: *name,
                    args: first,
                },
                ArgKind::UserFunctor {
                    name: *name,
                    args: second,
                },
            )
        }
        ArgKind::Record { type_name, args } => {
            let (first, second) = paired_clone_arguments(args, ids, map);
            (
                ArgKind::Record {
                    type_name: *type_name,
                    args: first,
                },
                ArgKind::Record {
                    type_name: *type_name,
                    args: second,
                },
            )
        }
        ArgKind::Aggregate(aggregate) => {
            let (first_target, second_target) = match &aggregate.target {
                Some(target) => {
                    let (first, second) = paired_clone_argument(target, ids, map);
                    (Some(first), Some(second))
                }
                None => (None, None),
            };
            let mut first_body = Vec::new();
            let mut second_body = Vec::new();
            for literal in &aggregate.body {
                let (first, second) = paired_clone_literal(literal, ids, map);
                first_body.push(first);
                second_body.push(second);
            }
            (
                ArgKind::Aggregate(Box::new(datalog_ast::Aggregate {
                    op: aggregate.op,
                    target: first_target,
                    body: first_body,
                })),
                ArgKind::Aggregate(Box::new(datalog_ast::Aggregate {
                    op: aggregate.op,
                    target: second_target,
                    body: second_body,
                })),
            )
        }
        simple => (simple.clone(), simple.clone()),
    };

    (
        Argument {
            id: first_id,
            span: arg.span,
            kind: first_kind,
        },
        Argument {
            id: second_id,
            span: arg.span,
            kind: second_kind,
        },
    )
}

fn paired_clone_arguments(
    args: &[Argument],
    ids: &mut IdGen,
    map: &mut HashMap<ArgId, ArgId>,
) -> (Vec<Argument>, Vec<Argument>) {
    let mut first = Vec::new();
    let mut second = Vec::new();
    for arg in args {
        let (a, b) = paired_clone_argument(arg, ids, map);
        first.push(a);
        second.push(b);
    }
    (first, second)
}
