//! End-to-end checks over small programs, exercising the full pipeline:
//! type environment, type analysis, precedence analyses, and every
//! semantic check.

use datalog_ast::{
    AggregateOp, Argument, AstBuilder, Atom, Attribute, BinaryConstraint, Clause, ConstraintOp,
    Literal, Negation, Program, RelationName, Representation, Span, SrcId, Symbol, TypeDecl,
    UnionType,
};
use datalog_inference::TypeAnalysis;
use datalog_precedence::{IoTypes, PrecedenceGraph, RecursiveClauses, RelationSchedule};
use datalog_report::{ErrorReport, Severity};
use datalog_semantics::{check_execution_plans, check_program, ProgramFeatures};
use datalog_types::TypeEnvironment;

fn sym(s: &str) -> Symbol {
    Symbol::new(s.to_string())
}

fn span_at(start: usize) -> Span {
    Span::new(SrcId::repl(), start..start + 1)
}

fn attribute(name: &str, type_name: &str) -> Attribute {
    Attribute {
        name: sym(name),
        type_name: sym(type_name),
        span: span_at(0),
    }
}

fn relation(name: &str, attributes: Vec<Attribute>) -> datalog_ast::Relation {
    datalog_ast::Relation {
        name: RelationName::from_dotted(name),
        attributes,
        representation: Representation::Default,
        is_inline: false,
        is_input: false,
        is_output: false,
        is_suppressed: false,
        span: span_at(0),
    }
}

fn atom_at(args: Vec<Argument>, name: &str, start: usize) -> Atom {
    Atom {
        relation: RelationName::from_dotted(name),
        args,
        span: span_at(start),
    }
}

fn rule(head: Atom, body: Vec<Literal>) -> Clause {
    Clause {
        head,
        body,
        plan: None,
        is_generated: false,
        span: span_at(0),
    }
}

fn analyze(program: &Program) -> (ErrorReport, ProgramFeatures) {
    let env = TypeEnvironment::from_program(program);
    let analysis = TypeAnalysis::run(program, &env, false);
    let precedence = PrecedenceGraph::build(program);
    let recursive = RecursiveClauses::new(&precedence);
    let io = IoTypes::build(program);
    let schedule = RelationSchedule::build(program, &precedence);

    let mut report = ErrorReport::new();
    let features = check_program(
        &mut report,
        program,
        &env,
        &analysis,
        &precedence,
        &recursive,
        &io,
    );
    check_execution_plans(&mut report, program, &schedule, &recursive);
    (report, features)
}

fn error_spans(report: &ErrorReport, message: &str) -> Vec<Span> {
    report
        .diagnostics()
        .iter()
        .filter(|d| d.severity == Severity::Error && d.primary.message == message)
        .filter_map(|d| d.primary.span)
        .collect()
}

// ===== Scenario: a fact with a bare variable =====

#[test]
fn scenario_variable_in_fact() {
    // .decl r(x : number)
    // r(X).
    let mut b = AstBuilder::new();
    let program = Program {
        relations: vec![relation("r", vec![attribute("x", "number")])],
        clauses: vec![rule(atom_at(vec![b.variable("X", span_at(2))], "r", 0), vec![])],
        ..Program::default()
    };
    let (report, _) = analyze(&program);

    assert_eq!(report.error_count(), 1);
    assert_eq!(error_spans(&report, "Variable X in fact"), vec![span_at(2)]);
}

// ===== Scenario: undefined relation in a body =====

#[test]
fn scenario_undefined_relation() {
    // .decl r(x : number)
    // r(1) :- s(1).
    let mut b = AstBuilder::new();
    let program = Program {
        relations: vec![relation("r", vec![attribute("x", "number")])],
        clauses: vec![rule(
            atom_at(vec![b.number(1, span_at(2))], "r", 0),
            vec![Literal::Atom(atom_at(vec![b.number(1, span_at(12))], "s", 10))],
        )],
        ..Program::default()
    };
    let (report, _) = analyze(&program);

    assert_eq!(error_spans(&report, "Undefined relation s"), vec![span_at(10)]);
    // the skipped clause is reported once as an umbrella error
    assert!(report
        .error_messages()
        .contains(&"Not all clauses could be typechecked due to other errors present"));
}

// ===== Scenario: mixed-kind union =====

#[test]
fn scenario_mixed_union() {
    // .type T = number | symbol
    let program = Program {
        types: vec![TypeDecl::Union(UnionType {
            name: sym("T"),
            members: vec![sym("number"), sym("symbol")],
            span: span_at(6),
        })],
        ..Program::default()
    };
    let (report, _) = analyze(&program);

    assert_eq!(
        error_spans(
            &report,
            "Union type T contains a mixture of symbol and number types"
        ),
        vec![span_at(6)]
    );
    assert!(report
        .error_messages()
        .contains(&"No type checking could occur due to other errors present"));
}

// ===== Scenario: negation inside a recursion cycle =====

#[test]
fn scenario_unstratifiable_negation() {
    // .decl a(x : number)  .decl b(x : number)
    // a(X) :- b(X).
    // b(X) :- !a(X).
    let mut b = AstBuilder::new();
    let program = Program {
        relations: vec![
            relation("a", vec![attribute("x", "number")]),
            relation("b", vec![attribute("x", "number")]),
        ],
        clauses: vec![
            rule(
                atom_at(vec![b.variable("X", span_at(2))], "a", 0),
                vec![Literal::Atom(atom_at(
                    vec![b.variable("X", span_at(12))],
                    "b",
                    10,
                ))],
            ),
            rule(
                atom_at(vec![b.variable("X", span_at(22))], "b", 20),
                vec![Literal::Negation(Negation {
                    atom: atom_at(vec![b.variable("X", span_at(32))], "a", 31),
                    span: span_at(30),
                })],
            ),
        ],
        ..Program::default()
    };
    let (report, _) = analyze(&program);

    let stratification: Vec<_> = report
        .diagnostics()
        .iter()
        .filter(|d| d.primary.message == "Unable to stratify relation(s) {a,b}")
        .collect();
    assert_eq!(stratification.len(), 1);
    assert!(stratification[0]
        .notes
        .iter()
        .any(|note| note.message == "has cyclic negation" && note.span == Some(span_at(30))));
}

// ===== Scenario: aggregate witness leak =====

#[test]
fn scenario_witness_leak() {
    // .decl r(x : number, y : number)  .decl s(x : number)
    // s(X) :- X = min Y : { r(_, Y) }.
    let mut b = AstBuilder::new();
    let witness_var = b.variable("Y", span_at(17));
    let inner_unnamed = b.unnamed(span_at(23));
    let inner_var = b.variable("Y", span_at(26));
    let aggregate = b.aggregate(
        AggregateOp::Min,
        Some(witness_var),
        vec![Literal::Atom(atom_at(
            vec![inner_unnamed, inner_var],
            "r",
            21,
        ))],
        span_at(13),
    );
    let program = Program {
        relations: vec![
            relation(
                "r",
                vec![attribute("x", "number"), attribute("y", "number")],
            ),
            relation("s", vec![attribute("x", "number")]),
        ],
        clauses: vec![rule(
            atom_at(vec![b.variable("X", span_at(2))], "s", 0),
            vec![Literal::Binary(BinaryConstraint {
                op: ConstraintOp::Eq,
                lhs: b.variable("X", span_at(9)),
                rhs: aggregate,
                span: span_at(9),
            })],
        )],
        ..Program::default()
    };
    let (report, _) = analyze(&program);

    let witness_spans = error_spans(
        &report,
        "Witness problem: argument grounded by an aggregator's inner scope is used ungrounded \
         in outer scope",
    );
    assert!(witness_spans.contains(&span_at(2)));
}

// ===== Scenario: cast-kind mismatch =====

#[test]
fn scenario_cast_kind_mismatch() {
    // .decl r(x : number)
    // r(X) :- X = as("abc", number).
    let mut b = AstBuilder::new();
    let cast_text = b.text("abc", span_at(15));
    let cast = b.cast(cast_text, "number", span_at(13));
    let program = Program {
        relations: vec![relation("r", vec![attribute("x", "number")])],
        clauses: vec![rule(
            atom_at(vec![b.variable("X", span_at(2))], "r", 0),
            vec![Literal::Binary(BinaryConstraint {
                op: ConstraintOp::Eq,
                lhs: b.variable("X", span_at(8)),
                rhs: cast,
                span: span_at(8),
            })],
        )],
        ..Program::default()
    };
    let (report, _) = analyze(&program);

    assert_eq!(report.error_count(), 0);
    assert!(report
        .warning_messages()
        .contains(&"Casts from SYMBOL values to NUMBER types may cause runtime errors"));
}

// ===== Equivalence relations =====

#[test]
fn equivalence_relation_accepted_iff_binary_with_one_domain() {
    let good = datalog_ast::Relation {
        representation: Representation::Equivalence,
        is_suppressed: true,
        ..relation(
            "same",
            vec![attribute("x", "number"), attribute("y", "number")],
        )
    };
    let program = Program {
        relations: vec![good],
        ..Program::default()
    };
    let (report, _) = analyze(&program);
    assert_eq!(report.error_count(), 0);

    let bad = datalog_ast::Relation {
        representation: Representation::Equivalence,
        is_suppressed: true,
        ..relation(
            "same",
            vec![attribute("x", "number"), attribute("y", "symbol")],
        )
    };
    let program = Program {
        relations: vec![bad],
        ..Program::default()
    };
    let (report, _) = analyze(&program);
    assert!(report
        .error_messages()
        .contains(&"Domains of equivalence relation same are different"));
}

// ===== Records flag for the driver =====

#[test]
fn record_use_sets_program_feature() {
    let mut b = AstBuilder::new();
    let record_field1 = b.number(1, span_at(4));
    let record_field2 = b.number(2, span_at(7));
    let record = b.record(
        "pair",
        vec![record_field1, record_field2],
        span_at(2),
    );
    let program = Program {
        types: vec![TypeDecl::Record(datalog_ast::RecordType {
            name: sym("pair"),
            fields: vec![
                datalog_ast::RecordField {
                    name: sym("x"),
                    type_name: sym("number"),
                },
                datalog_ast::RecordField {
                    name: sym("y"),
                    type_name: sym("number"),
                },
            ],
            span: span_at(0),
        })],
        relations: vec![relation("p", vec![attribute("r", "pair")])],
        clauses: vec![rule(atom_at(vec![record], "p", 0), vec![])],
        ..Program::default()
    };
    let (report, features) = analyze(&program);

    assert!(features.uses_records);
    assert_eq!(report.error_count(), 0);
}

// ===== Order independence =====

#[test]
fn diagnostics_do_not_depend_on_declaration_order() {
    let build = |flip: bool| {
        let mut b = AstBuilder::new();
        let mut relations = vec![
            relation("a", vec![attribute("x", "number")]),
            relation("b", vec![attribute("x", "number")]),
        ];
        if flip {
            relations.reverse();
        }
        Program {
            relations,
            clauses: vec![
                rule(
                    atom_at(vec![b.variable("X", span_at(2))], "a", 0),
                    vec![Literal::Negation(Negation {
                        atom: atom_at(vec![b.variable("X", span_at(12))], "b", 11),
                        span: span_at(10),
                    })],
                ),
                rule(
                    atom_at(vec![b.variable("X", span_at(22))], "b", 20),
                    vec![Literal::Atom(atom_at(
                        vec![b.variable("X", span_at(32))],
                        "a",
                        30,
                    ))],
                ),
            ],
            ..Program::default()
        }
    };

    let (first, _) = analyze(&build(false));
    let (second, _) = analyze(&build(true));

    let mut first_messages: Vec<String> = first
        .diagnostics()
        .iter()
        .map(|d| d.primary.message.clone())
        .collect();
    let mut second_messages: Vec<String> = second
        .diagnostics()
        .iter()
        .map(|d| d.primary.message.clone())
        .collect();
    first_messages.sort();
    second_messages.sort();
    assert_eq!(first_messages, second_messages);
}

// ===== Unnamed variables stay out of scenario noise =====

#[test]
fn underscore_in_positive_atom_is_quiet() {
    let mut b = AstBuilder::new();
    let program = Program {
        relations: vec![
            relation("p", vec![attribute("x", "number")]),
            relation(
                "q",
                vec![attribute("x", "number"), attribute("y", "number")],
            ),
        ],
        clauses: vec![rule(
            atom_at(vec![b.variable("X", span_at(2))], "p", 0),
            vec![Literal::Atom(atom_at(
                vec![b.variable("X", span_at(12)), b.unnamed(span_at(15))],
                "q",
                10,
            ))],
        )],
        ..Program::default()
    };
    let (report, _) = analyze(&program);
    assert_eq!(report.error_count(), 0);
}
