//! Type usage and type correctness checks
//!
//! `check_type_usage` validates the syntactic use of types without the
//! solver: casts and record constructors name declared types of the right
//! shape, number constants stay in the domain, user functors match their
//! declarations. `check_type_correctness` consumes the solver's results
//! and reports every place where an inferred type contradicts a declared
//! one.

use std::collections::HashSet;

use datalog_ast::{
    grounded_terms, visit_clause_arguments, visit_clause_atoms, ArgKind, Argument,
    BinaryConstraint, Clause, ConstraintOp, Literal, Program, Symbol, TypeDecl,
    MAX_AST_DOMAIN, MIN_AST_DOMAIN,
};
use datalog_inference::TypeAnalysis;
use datalog_report::ErrorReport;
use datalog_types::{AnalysisType, Kind, TypeEnvironment, TypeLattice};

use crate::checker::ProgramFeatures;

pub(crate) fn check_type_usage(
    report: &mut ErrorReport,
    env: &TypeEnvironment,
    program: &Program,
    features: &mut ProgramFeatures,
) {
    for clause in &program.clauses {
        if program.relation(clause.head.relation).is_none() {
            continue;
        }
        visit_clause_arguments(clause, &mut |arg| match &arg.kind {
            ArgKind::Cast { type_name, .. } => {
                if !env.is_type(*type_name) {
                    report.add_error(
                        format!("Type cast is to undeclared type {}", type_name),
                        arg.span,
                    );
                }
            }
            ArgKind::Record { type_name, args } => {
                features.uses_records = true;
                match env.decl(*type_name) {
                    Some(TypeDecl::Record(declaration)) => {
                        if declaration.fields.len() != args.len() {
                            report.add_error(
                                "Wrong number of arguments given to record",
                                arg.span,
                            );
                        }
                    }
                    Some(_) => report.add_error(
                        format!("Type {} is not a record type", type_name),
                        arg.span,
                    ),
                    None => report.add_error(
                        format!("Type {} has not been declared", type_name),
                        arg.span,
                    ),
                }
            }
            ArgKind::Number(value) => {
                if *value > MAX_AST_DOMAIN || *value < MIN_AST_DOMAIN {
                    report.add_error(
                        format!(
                            "Number constant not in range [{}, {}]",
                            MIN_AST_DOMAIN, MAX_AST_DOMAIN
                        ),
                        arg.span,
                    );
                }
            }
            ArgKind::UserFunctor { name, args } => match program.functor(*name) {
                None => report.add_error("User-defined functor hasn't been declared", arg.span),
                Some(declaration) => {
                    if declaration.arity() != args.len() {
                        report.add_error("Mismatching number of arguments of functor", arg.span);
                    }
                }
            },
            _ => {}
        });
    }
}

pub(crate) fn check_type_correctness(
    report: &mut ErrorReport,
    analysis: &TypeAnalysis,
    program: &Program,
) {
    let lattice = analysis.lattice();
    if !lattice.is_valid() {
        report.add_unlocated_error("No type checking could occur due to other errors present");
        return;
    }
    if analysis.found_invalid_clauses() {
        report.add_unlocated_error("Not all clauses could be typechecked due to other errors present");
    }

    for &clause in analysis.typed_clauses() {
        check_argument_types(report, analysis, clause);
        check_functor_arguments(report, analysis, lattice, program, clause);
        check_record_types(report, analysis, lattice, program, clause);
        check_aggregate_targets(report, analysis, lattice, clause);
        check_casts(report, analysis, lattice, clause);
        check_atom_arguments(report, analysis, lattice, program, clause);
        check_binary_constraints(report, analysis, lattice, clause);
    }
}

/// Every grounded argument must carry a valid analysis type
fn check_argument_types(report: &mut ErrorReport, analysis: &TypeAnalysis, clause: &Clause) {
    let grounded = grounded_terms(clause);
    let mut seen_variables: HashSet<Symbol> = HashSet::new();

    visit_clause_arguments(clause, &mut |arg| {
        // ungrounded terms were already reported by the groundedness check
        if grounded.get(&arg.id) != Some(&true) {
            return;
        }
        if let ArgKind::Variable(name) = &arg.kind {
            if !seen_variables.insert(*name) {
                return;
            }
        }
        let Some(ty) = analysis.type_of(arg) else {
            return;
        };
        if ty.is_valid() {
            return;
        }
        match &*ty {
            AnalysisType::BottomPrimitive(_) => report.add_error(
                "Unable to deduce valid type for expression, as base types are disjoint",
                arg.span,
            ),
            AnalysisType::Bottom => report.add_error(
                "Unable to deduce valid type for expression, as primitive types are disjoint",
                arg.span,
            ),
            // a grounded Top belongs to a mistyped record constructor,
            // which reports the error itself
            _ => {}
        }
    });
}

fn functor_argument_error(expected: Kind, actual: &AnalysisType) -> String {
    match expected {
        Kind::Symbol => format!(
            "Non-symbolic argument for functor, instead argument has type {}",
            actual
        ),
        _ => format!(
            "Non-numeric argument for functor, instead argument has type {}",
            actual
        ),
    }
}

fn check_functor_arguments(
    report: &mut ErrorReport,
    analysis: &TypeAnalysis,
    lattice: &TypeLattice,
    program: &Program,
    clause: &Clause,
) {
    visit_clause_arguments(clause, &mut |arg| match &arg.kind {
        ArgKind::Intrinsic { op, args } => {
            for (index, inner) in args.iter().enumerate() {
                let Some(ty) = analysis.type_of(inner) else {
                    continue;
                };
                if !ty.is_valid() {
                    continue;
                }
                let expected = if op.accepts_symbols(index) {
                    Kind::Symbol
                } else {
                    Kind::Number
                };
                if !lattice.is_subtype(ty, AnalysisType::top_primitive(expected)) {
                    report.add_error(functor_argument_error(expected, &ty), inner.span);
                }
            }
        }
        ArgKind::UserFunctor { name, args } => {
            let Some(declaration) = program.functor(*name) else {
                return;
            };
            for (index, inner) in args.iter().enumerate() {
                let Some(ty) = analysis.type_of(inner) else {
                    continue;
                };
                if !ty.is_valid() {
                    continue;
                }
                let expected = if declaration.accepts_symbols(index) {
                    Kind::Symbol
                } else {
                    Kind::Number
                };
                if !lattice.is_subtype(ty, AnalysisType::top_primitive(expected)) {
                    report.add_error(functor_argument_error(expected, &ty), inner.span);
                }
            }
        }
        _ => {}
    });
}

fn check_record_types(
    report: &mut ErrorReport,
    analysis: &TypeAnalysis,
    lattice: &TypeLattice,
    program: &Program,
    clause: &Clause,
) {
    let grounded = grounded_terms(clause);

    visit_clause_arguments(clause, &mut |arg| {
        let ArgKind::Record { type_name, args } = &arg.kind else {
            return;
        };
        if grounded.get(&arg.id) != Some(&true) {
            return;
        }
        let Some(TypeDecl::Record(declaration)) = program.type_decl(*type_name) else {
            return;
        };

        // the record is grounded through its elements but never took the
        // record type: some element has the wrong type
        if analysis.type_of(arg) == Some(AnalysisType::top()) {
            report.add_error(
                format!(
                    "Unable to deduce type {} as record is not grounded as a record elsewhere, \
                     and at least one of its elements has the wrong type",
                    type_name
                ),
                arg.span,
            );
        }

        for (inner, field) in args.iter().zip(&declaration.fields) {
            let Some(actual) = analysis.type_of(inner) else {
                continue;
            };
            let Some(expected) = lattice.analysis_type(field.type_name) else {
                continue;
            };
            if actual.is_valid() && !lattice.is_subtype(actual, expected) {
                report.add_error(
                    format!(
                        "Record constructor expects element to have type {} but instead it has type {}",
                        *expected, *actual
                    ),
                    inner.span,
                );
            }
        }
    });
}

fn check_aggregate_targets(
    report: &mut ErrorReport,
    analysis: &TypeAnalysis,
    lattice: &TypeLattice,
    clause: &Clause,
) {
    visit_clause_arguments(clause, &mut |arg| {
        let ArgKind::Aggregate(aggregate) = &arg.kind else {
            return;
        };
        if aggregate.op == datalog_ast::AggregateOp::Count {
            return;
        }
        let Some(target) = &aggregate.target else {
            return;
        };
        let Some(ty) = analysis.type_of(target) else {
            return;
        };
        if ty.is_valid() && !lattice.is_subtype(ty, AnalysisType::top_primitive(Kind::Number)) {
            report.add_error(
                format!("Aggregation variable is not a number, instead has type {}", *ty),
                target.span,
            );
        }
    });
}

fn check_casts(
    report: &mut ErrorReport,
    analysis: &TypeAnalysis,
    lattice: &TypeLattice,
    clause: &Clause,
) {
    visit_clause_arguments(clause, &mut |arg| {
        let ArgKind::Cast { type_name, value } = &arg.kind else {
            return;
        };
        let Some(actual) = analysis.type_of(arg) else {
            return;
        };
        if !actual.is_valid() {
            return;
        }
        let Some(expected) = lattice.analysis_type(*type_name) else {
            return;
        };

        if actual != expected {
            report.add_error(
                format!(
                    "Typecast is to type {} but is used where the type {} is expected",
                    type_name, *actual
                ),
                arg.span,
            );
        }

        let Some(input) = analysis.type_of(value) else {
            return;
        };
        if !input.is_valid() {
            return;
        }
        let (Some(in_kind), Some(out_kind)) = (input.kind(), expected.kind()) else {
            return;
        };
        if !lattice.is_subtype(input, AnalysisType::top_primitive(out_kind)) {
            report.add_warning(
                format!(
                    "Casts from {} values to {} types may cause runtime errors",
                    in_kind, out_kind
                ),
                arg.span,
            );
        } else if out_kind == Kind::Record && !lattice.is_subtype(input, expected) {
            report.add_warning(
                "Casting a record to the wrong record type may cause runtime errors",
                arg.span,
            );
        }
    });
}

/// Head and negated atom arguments carry the only type obligations an
/// atom imposes; body atoms satisfy theirs by construction
fn check_atom_arguments(
    report: &mut ErrorReport,
    analysis: &TypeAnalysis,
    lattice: &TypeLattice,
    program: &Program,
    clause: &Clause,
) {
    visit_clause_atoms(clause, &mut |atom| {
        let Some(relation) = program.relation(atom.relation) else {
            return;
        };
        for (arg, attribute) in atom.args.iter().zip(&relation.attributes) {
            let Some(actual) = analysis.type_of(arg) else {
                continue;
            };
            if !actual.is_valid() {
                continue;
            }
            let Some(expected) = lattice.analysis_type(attribute.type_name) else {
                continue;
            };
            if !lattice.is_subtype(actual, expected) {
                report.add_error(
                    format!(
                        "Relation expects value of type {} but got argument of type {}",
                        attribute.type_name, *actual
                    ),
                    arg.span,
                );
            }
        }
    });
}

fn check_binary_constraints(
    report: &mut ErrorReport,
    analysis: &TypeAnalysis,
    lattice: &TypeLattice,
    clause: &Clause,
) {
    let mut constraints: Vec<BinaryConstraint> = Vec::new();
    for literal in &clause.body {
        if let Literal::Binary(constraint) = literal {
            constraints.push(constraint.clone());
        }
    }
    visit_clause_arguments(clause, &mut |arg| {
        if let ArgKind::Aggregate(aggregate) = &arg.kind {
            for literal in &aggregate.body {
                if let Literal::Binary(constraint) = literal {
                    constraints.push(constraint.clone());
                }
            }
        }
    });

    for constraint in &constraints {
        check_binary_constraint(report, analysis, lattice, constraint);
    }
}

fn check_binary_constraint(
    report: &mut ErrorReport,
    analysis: &TypeAnalysis,
    lattice: &TypeLattice,
    constraint: &BinaryConstraint,
) {
    let op = constraint.op;
    if op == ConstraintOp::Eq {
        // equality is enforced by the solver itself
        return;
    }

    let lhs_type = analysis.type_of(&constraint.lhs);
    let rhs_type = analysis.type_of(&constraint.rhs);

    if op == ConstraintOp::Ne {
        let (Some(lhs), Some(rhs)) = (lhs_type, rhs_type) else {
            return;
        };
        if !lhs.is_valid() || !rhs.is_valid() {
            return;
        }
        let (Some(lhs_kind), Some(rhs_kind)) = (lhs.kind(), rhs.kind()) else {
            return;
        };
        if lhs_kind != rhs_kind {
            report.add_error(
                format!(
                    "Cannot compare operands of different kinds, left operand is a {} and right \
                     operand is a {}",
                    lhs_kind, rhs_kind
                ),
                constraint.span,
            );
        } else if lhs_kind == Kind::Record
            && !(lattice.is_subtype(lhs, rhs) && lattice.is_subtype(rhs, lhs))
        {
            report.add_error("Cannot compare records of different types", constraint.span);
        }
        return;
    }

    let (expected, adjective) = if op.is_numerical() {
        (Kind::Number, "Non-numerical")
    } else {
        (Kind::Symbol, "Non-symbolic")
    };
    let bound = AnalysisType::top_primitive(expected);
    check_operand(report, lattice, lhs_type, bound, adjective, "left", constraint.lhs.span);
    check_operand(report, lattice, rhs_type, bound, adjective, "right", constraint.rhs.span);
}

fn check_operand(
    report: &mut ErrorReport,
    lattice: &TypeLattice,
    ty: Option<datalog_types::AType>,
    bound: datalog_types::AType,
    adjective: &str,
    side: &str,
    span: datalog_ast::Span,
) {
    let Some(ty) = ty else {
        return;
    };
    if ty.is_valid() && !lattice.is_subtype(ty, bound) {
        report.add_error(
            format!(
                "{} operand for comparison, instead {} operand has type {}",
                adjective, side, *ty
            ),
            span,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalog_ast::{
        AstBuilder, Atom, Attribute, FunctorOp, PrimitiveKind, PrimitiveType, RecordField,
        RecordType, Relation, RelationName, Representation, Span, SrcId,
    };

    fn sym(s: &str) -> Symbol {
        Symbol::new(s.to_string())
    }

    fn span() -> Span {
        Span::new(SrcId::repl(), 0..1)
    }

    fn attribute(name: &str, type_name: &str) -> Attribute {
        Attribute {
            name: sym(name),
            type_name: sym(type_name),
            span: span(),
        }
    }

    fn relation(name: &str, attributes: Vec<Attribute>) -> Relation {
        Relation {
            name: RelationName::from_dotted(name),
            attributes,
            representation: Representation::Default,
            is_inline: false,
            is_input: false,
            is_output: false,
            is_suppressed: false,
            span: span(),
        }
    }

    fn atom(args: Vec<Argument>, name: &str) -> Atom {
        Atom {
            relation: RelationName::from_dotted(name),
            args,
            span: span(),
        }
    }

    fn rule(head: Atom, body: Vec<Literal>) -> Clause {
        Clause {
            head,
            body,
            plan: None,
            is_generated: false,
            span: span(),
        }
    }

    fn eq(lhs: Argument, rhs: Argument) -> Literal {
        Literal::Binary(BinaryConstraint {
            op: ConstraintOp::Eq,
            lhs,
            rhs,
            span: span(),
        })
    }

    fn run_correctness(program: &Program) -> ErrorReport {
        let env = TypeEnvironment::from_program(program);
        let analysis = TypeAnalysis::run(program, &env, false);
        let mut report = ErrorReport::new();
        check_type_correctness(&mut report, &analysis, program);
        report
    }

    // ===== Type usage =====

    #[test]
    fn test_usage_checks() {
        let mut b = AstBuilder::new();
        let cast_num = b.number(1, span());
        let cast = b.cast(cast_num, "ghost", span());
        let rec = b.record("notrecord", vec![], span());
        let out_of_range = b.number(MAX_AST_DOMAIN + 1, span());
        let functor = b.user_functor("f", vec![], span());
        let program = Program {
            types: vec![TypeDecl::Primitive(PrimitiveType {
                name: sym("notrecord"),
                kind: PrimitiveKind::Number,
                span: span(),
            })],
            relations: vec![relation(
                "r",
                vec![
                    attribute("a", "number"),
                    attribute("b", "number"),
                    attribute("c", "number"),
                    attribute("d", "number"),
                ],
            )],
            clauses: vec![rule(
                atom(vec![cast, rec, out_of_range, functor], "r"),
                vec![Literal::Boolean(datalog_ast::BooleanConstraint {
                    value: true,
                    span: span(),
                })],
            )],
            ..Program::default()
        };
        let env = TypeEnvironment::from_program(&program);
        let mut report = ErrorReport::new();
        let mut features = ProgramFeatures::default();
        check_type_usage(&mut report, &env, &program, &mut features);

        assert!(features.uses_records);
        assert!(report
            .error_messages()
            .contains(&"Type cast is to undeclared type ghost"));
        assert!(report
            .error_messages()
            .contains(&"Type notrecord is not a record type"));
        assert!(report
            .error_messages()
            .contains(&"Number constant not in range [-2147483648, 2147483647]"));
        assert!(report
            .error_messages()
            .contains(&"User-defined functor hasn't been declared"));
    }

    // ===== Type correctness =====

    #[test]
    fn test_invalid_lattice_reports_umbrella_error() {
        let program = Program {
            types: vec![TypeDecl::Union(datalog_ast::UnionType {
                name: sym("broken"),
                members: vec![sym("number"), sym("symbol")],
                span: span(),
            })],
            ..Program::default()
        };
        let report = run_correctness(&program);
        assert_eq!(
            report.error_messages(),
            vec!["No type checking could occur due to other errors present"]
        );
    }

    #[test]
    fn test_skipped_clauses_report_umbrella_error() {
        let mut b = AstBuilder::new();
        let program = Program {
            relations: vec![relation("r", vec![attribute("x", "number")])],
            clauses: vec![rule(
                atom(vec![b.number(1, span())], "r"),
                vec![Literal::Atom(atom(vec![b.number(1, span())], "ghost"))],
            )],
            ..Program::default()
        };
        let report = run_correctness(&program);
        assert!(report
            .error_messages()
            .contains(&"Not all clauses could be typechecked due to other errors present"));
    }

    #[test]
    fn test_disjoint_base_types_reported() {
        // p(X) :- q(X), r(X). with disjoint base-typed attributes
        let mut b = AstBuilder::new();
        let program = Program {
            types: vec![
                TypeDecl::Primitive(PrimitiveType {
                    name: sym("a"),
                    kind: PrimitiveKind::Number,
                    span: span(),
                }),
                TypeDecl::Primitive(PrimitiveType {
                    name: sym("b"),
                    kind: PrimitiveKind::Number,
                    span: span(),
                }),
            ],
            relations: vec![
                relation("p", vec![attribute("x", "number")]),
                relation("q", vec![attribute("x", "a")]),
                relation("r", vec![attribute("x", "b")]),
            ],
            clauses: vec![rule(
                atom(vec![b.variable("X", span())], "p"),
                vec![
                    Literal::Atom(atom(vec![b.variable("X", span())], "q")),
                    Literal::Atom(atom(vec![b.variable("X", span())], "r")),
                ],
            )],
            ..Program::default()
        };
        let report = run_correctness(&program);
        assert!(report
            .error_messages()
            .contains(&"Unable to deduce valid type for expression, as base types are disjoint"));
    }

    #[test]
    fn test_symbol_argument_for_numeric_functor() {
        // p(X) :- q(S), X = S + 1.
        let mut b = AstBuilder::new();
        let s_arg = b.variable("S", span());
        let one_arg = b.number(1, span());
        let sum = b.intrinsic(FunctorOp::Add, vec![s_arg, one_arg], span());
        let program = Program {
            relations: vec![
                relation("p", vec![attribute("x", "number")]),
                relation("q", vec![attribute("x", "symbol")]),
            ],
            clauses: vec![rule(
                atom(vec![b.variable("X", span())], "p"),
                vec![
                    Literal::Atom(atom(vec![b.variable("S", span())], "q")),
                    eq(b.variable("X", span()), sum),
                ],
            )],
            ..Program::default()
        };
        let report = run_correctness(&program);
        assert!(report
            .error_messages()
            .contains(&"Non-numeric argument for functor, instead argument has type symbol"));
    }

    #[test]
    fn test_cast_kind_mismatch_warns() {
        // r(X) :- X = as("abc", number).
        let mut b = AstBuilder::new();
        let cast_text = b.text("abc", span());
        let cast = b.cast(cast_text, "number", span());
        let program = Program {
            relations: vec![relation("r", vec![attribute("x", "number")])],
            clauses: vec![rule(
                atom(vec![b.variable("X", span())], "r"),
                vec![eq(b.variable("X", span()), cast)],
            )],
            ..Program::default()
        };
        let report = run_correctness(&program);
        assert_eq!(report.error_count(), 0);
        assert!(report
            .warning_messages()
            .contains(&"Casts from SYMBOL values to NUMBER types may cause runtime errors"));
    }

    #[test]
    fn test_head_argument_type_mismatch() {
        // p(S) :- q(S). with p over a number base and q over symbols
        let mut b = AstBuilder::new();
        let program = Program {
            relations: vec![
                relation("p", vec![attribute("x", "number")]),
                relation("q", vec![attribute("x", "symbol")]),
            ],
            clauses: vec![rule(
                atom(vec![b.variable("S", span())], "p"),
                vec![Literal::Atom(atom(vec![b.variable("S", span())], "q"))],
            )],
            ..Program::default()
        };
        let report = run_correctness(&program);
        // head attributes impose no constraints, so the variable keeps its
        // body type and the head check reports the mismatch
        assert!(report
            .error_messages()
            .contains(&"Relation expects value of type number but got argument of type symbol"));
    }

    #[test]
    fn test_negated_atom_argument_checked() {
        // p(X) :- q(X), !r(X). with r over a different base
        let mut b = AstBuilder::new();
        let neg_arg = b.variable("X", span());
        let program = Program {
            types: vec![
                TypeDecl::Primitive(PrimitiveType {
                    name: sym("a"),
                    kind: PrimitiveKind::Number,
                    span: span(),
                }),
                TypeDecl::Primitive(PrimitiveType {
                    name: sym("b"),
                    kind: PrimitiveKind::Number,
                    span: span(),
                }),
            ],
            relations: vec![
                relation("p", vec![attribute("x", "a")]),
                relation("q", vec![attribute("x", "a")]),
                relation("r", vec![attribute("x", "b")]),
            ],
            clauses: vec![rule(
                atom(vec![b.variable("X", span())], "p"),
                vec![
                    Literal::Atom(atom(vec![b.variable("X", span())], "q")),
                    Literal::Negation(datalog_ast::Negation {
                        atom: atom(vec![neg_arg], "r"),
                        span: span(),
                    }),
                ],
            )],
            ..Program::default()
        };
        let report = run_correctness(&program);
        assert!(report
            .error_messages()
            .contains(&"Relation expects value of type b but got argument of type a"));
    }

    #[test]
    fn test_ordering_constraint_requires_numbers() {
        // p(X) :- q(X), X < "abc".
        let mut b = AstBuilder::new();
        let program = Program {
            relations: vec![
                relation("p", vec![attribute("x", "number")]),
                relation("q", vec![attribute("x", "number")]),
            ],
            clauses: vec![rule(
                atom(vec![b.variable("X", span())], "p"),
                vec![
                    Literal::Atom(atom(vec![b.variable("X", span())], "q")),
                    Literal::Binary(BinaryConstraint {
                        op: ConstraintOp::Lt,
                        lhs: b.variable("X", span()),
                        rhs: b.text("abc", span()),
                        span: span(),
                    }),
                ],
            )],
            ..Program::default()
        };
        let report = run_correctness(&program);
        assert!(report.error_messages().contains(
            &"Non-numerical operand for comparison, instead right operand has type symbol constant"
        ));
    }

    #[test]
    fn test_record_element_type_mismatch() {
        // p([S, 2]) :- s(S).  pair expects two numbers, S is a symbol, and
        // nothing else grounds the record as a record
        let mut b = AstBuilder::new();
        let record_var_s = b.variable("S", span());
        let record_num = b.number(2, span());
        let record = b.record("pair", vec![record_var_s, record_num], span());
        let program = Program {
            types: vec![TypeDecl::Record(RecordType {
                name: sym("pair"),
                fields: vec![
                    RecordField {
                        name: sym("x"),
                        type_name: sym("number"),
                    },
                    RecordField {
                        name: sym("y"),
                        type_name: sym("number"),
                    },
                ],
                span: span(),
            })],
            relations: vec![
                relation("p", vec![attribute("x", "pair")]),
                relation("s", vec![attribute("x", "symbol")]),
            ],
            clauses: vec![rule(
                atom(vec![record], "p"),
                vec![Literal::Atom(atom(vec![b.variable("S", span())], "s"))],
            )],
            ..Program::default()
        };
        let report = run_correctness(&program);
        assert!(report
            .error_messages()
            .contains(&"Record constructor expects element to have type number but instead it has type symbol"));
        assert!(report.error_messages().iter().any(|m| {
            m.starts_with("Unable to deduce type pair as record is not grounded as a record elsewhere")
        }));
    }

    #[test]
    fn test_aggregate_target_must_be_numeric() {
        // p(X) :- X = min S : { q(S) }. with q over symbols
        let mut b = AstBuilder::new();
        let agg_witness = b.variable("S", span());
        let agg_var = b.variable("S", span());
        let agg = b.aggregate(
            datalog_ast::AggregateOp::Min,
            Some(agg_witness),
            vec![Literal::Atom(atom(vec![agg_var], "q"))],
            span(),
        );
        let program = Program {
            relations: vec![
                relation("p", vec![attribute("x", "number")]),
                relation("q", vec![attribute("x", "symbol")]),
            ],
            clauses: vec![rule(
                atom(vec![b.variable("X", span())], "p"),
                vec![eq(b.variable("X", span()), agg)],
            )],
            ..Program::default()
        };
        let report = run_correctness(&program);
        assert!(report
            .error_messages()
            .contains(&"Aggregation variable is not a number, instead has type symbol"));
    }
}
