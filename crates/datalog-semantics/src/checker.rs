//! Orchestration of the semantic checks
//!
//! Mirrors the classic pass structure: each check runs over the whole
//! program, reports what it finds, and never prevents the other checks
//! from running.

use std::collections::{BTreeMap, HashMap, HashSet};

use datalog_ast::{
    aggregated_dependency, grounded_terms, negated_dependency, records, variables,
    visit_clause_arguments, ArgKind, Argument, Atom, Clause, Literal, Program, RecordType,
    Relation, Representation, Span, Symbol, TypeDecl, UnionType,
};
use datalog_inference::TypeAnalysis;
use datalog_precedence::{IoTypes, PrecedenceGraph, RecursiveClauses};
use datalog_report::{Diagnostic, DiagnosticMessage, ErrorReport, Severity};
use datalog_types::TypeEnvironment;

use crate::inlining::check_inlining;
use crate::typecheck::{check_type_correctness, check_type_usage};
use crate::witness::check_witness_problem;

/// Facts about the program the driver may need to react to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramFeatures {
    /// A record-typed attribute or a record constructor occurs somewhere.
    /// The driver consults this instead of the checker silently rewriting
    /// global engine configuration.
    pub uses_records: bool,
}

/// Run every semantic check over the program
pub fn check_program(
    report: &mut ErrorReport,
    program: &Program,
    env: &TypeEnvironment,
    type_analysis: &TypeAnalysis,
    precedence: &PrecedenceGraph,
    recursive: &RecursiveClauses,
    io: &IoTypes,
) -> ProgramFeatures {
    let mut features = ProgramFeatures::default();

    check_types(report, program);
    check_rules(report, env, program, recursive, io, &mut features);
    check_namespaces(report, program);
    check_io_directives(report, program);
    check_witness_problem(report, program);
    check_inlining(report, program, precedence, io);
    check_groundedness(report, program);
    check_type_usage(report, env, program, &mut features);
    check_type_correctness(report, type_analysis, program);
    check_stratification(report, program, precedence);

    features
}

// ----- types -----

fn check_types(report: &mut ErrorReport, program: &Program) {
    for decl in &program.types {
        match decl {
            TypeDecl::Union(union) => check_union_type(report, program, union),
            TypeDecl::Record(record) => check_record_type(report, program, record),
            TypeDecl::Primitive(_) => {}
        }
    }
}

fn check_union_type(report: &mut ErrorReport, program: &Program, union: &UnionType) {
    // all members exist and are primitive-based
    for &member in &union.members {
        if TypeEnvironment::is_primitive_name(member) {
            continue;
        }
        match program.type_decl(member) {
            None => report.add_error(
                format!(
                    "Undefined type {} in definition of union type {}",
                    member, union.name
                ),
                union.span,
            ),
            Some(TypeDecl::Record(_)) => report.add_error(
                format!(
                    "Union type {} contains the non-primitive type {}",
                    union.name, member
                ),
                union.span,
            ),
            Some(_) => {}
        }
    }

    // all members are based on the same primitive
    let mut visited = HashSet::new();
    let has_number = union_contains_kind(program, union, true, &mut visited);
    visited.clear();
    let has_symbol = union_contains_kind(program, union, false, &mut visited);
    if has_number && has_symbol {
        report.add_error(
            format!(
                "Union type {} contains a mixture of symbol and number types",
                union.name
            ),
            union.span,
        );
    }
}

/// Whether the union transitively covers the number primitive (`number`
/// true) or the symbol primitive (`number` false)
fn union_contains_kind(
    program: &Program,
    union: &UnionType,
    number: bool,
    visited: &mut HashSet<Symbol>,
) -> bool {
    if !visited.insert(union.name) {
        return false;
    }
    let primitive = if number { "number" } else { "symbol" };
    for &member in &union.members {
        if member.as_ref() == primitive {
            return true;
        }
        match program.type_decl(member) {
            Some(TypeDecl::Union(inner)) => {
                if union_contains_kind(program, inner, number, visited) {
                    return true;
                }
            }
            Some(TypeDecl::Primitive(inner)) => {
                let is_number = inner.kind == datalog_ast::PrimitiveKind::Number;
                if is_number == number {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

fn check_record_type(report: &mut ErrorReport, program: &Program, record: &RecordType) {
    for field in &record.fields {
        if !TypeEnvironment::is_primitive_name(field.type_name)
            && program.type_decl(field.type_name).is_none()
        {
            report.add_error(
                format!(
                    "Undefined type {} in definition of field {}",
                    field.type_name, field.name
                ),
                record.span,
            );
        }
    }

    for (index, field) in record.fields.iter().enumerate() {
        if record.fields[..index].iter().any(|f| f.name == field.name) {
            report.add_error(
                format!(
                    "Doubly defined field name {} in definition of type {}",
                    field.name, record.name
                ),
                record.span,
            );
        }
    }
}

// ----- rules -----

fn check_rules(
    report: &mut ErrorReport,
    env: &TypeEnvironment,
    program: &Program,
    recursive: &RecursiveClauses,
    io: &IoTypes,
    features: &mut ProgramFeatures,
) {
    for relation in &program.relations {
        check_relation(report, env, program, relation, recursive, io, features);
    }
    for clause in program.orphan_clauses() {
        check_clause(report, program, clause, recursive);
    }
}

fn check_relation(
    report: &mut ErrorReport,
    env: &TypeEnvironment,
    program: &Program,
    relation: &Relation,
    recursive: &RecursiveClauses,
    io: &IoTypes,
    features: &mut ProgramFeatures,
) {
    if relation.representation == Representation::Equivalence {
        if relation.arity() == 2 {
            if relation.attributes[0].type_name != relation.attributes[1].type_name {
                report.add_error(
                    format!(
                        "Domains of equivalence relation {} are different",
                        relation.name
                    ),
                    relation.span,
                );
            }
        } else {
            report.add_error(
                format!("Equivalence relation {} is not binary", relation.name),
                relation.span,
            );
        }
    }

    check_relation_declaration(report, env, program, relation, io, features);

    let mut clause_count = 0;
    for clause in program.clauses_of(relation.name) {
        check_clause(report, program, clause, recursive);
        clause_count += 1;
    }

    if clause_count == 0 && !io.is_input(relation.name) && !relation.is_suppressed {
        report.add_warning(
            format!("No rules/facts defined for relation {}", relation.name),
            relation.span,
        );
    }
}

fn check_relation_declaration(
    report: &mut ErrorReport,
    env: &TypeEnvironment,
    program: &Program,
    relation: &Relation,
    io: &IoTypes,
    features: &mut ProgramFeatures,
) {
    for (index, attribute) in relation.attributes.iter().enumerate() {
        let type_name = attribute.type_name;

        if !TypeEnvironment::is_primitive_name(type_name) && program.type_decl(type_name).is_none()
        {
            report.add_error(
                format!(
                    "Undefined type in attribute {}:{}",
                    attribute.name, type_name
                ),
                attribute.span,
            );
        }

        if relation.attributes[..index]
            .iter()
            .any(|other| other.name == attribute.name)
        {
            report.add_error(
                format!(
                    "Doubly defined attribute name {}:{}",
                    attribute.name, type_name
                ),
                attribute.span,
            );
        }

        if env.is_record_type(type_name) {
            features.uses_records = true;

            if io.is_input(relation.name) {
                report.add_error(
                    format!(
                        "Input relations must not have record types. Attribute {} has record type {}",
                        attribute.name, type_name
                    ),
                    attribute.span,
                );
            }
            if io.is_output(relation.name) {
                report.add_warning(
                    format!(
                        "Record types in output relations are not printed verbatim: attribute {} has record type {}",
                        attribute.name, type_name
                    ),
                    attribute.span,
                );
            }
        }
    }
}

fn check_clause(
    report: &mut ErrorReport,
    program: &Program,
    clause: &Clause,
    recursive: &RecursiveClauses,
) {
    check_atom(report, program, &clause.head);

    if clause
        .head
        .args
        .iter()
        .any(datalog_ast::has_unnamed_variable)
    {
        report.add_error("Underscore in head of rule", clause.head.span);
    }

    for literal in &clause.body {
        check_literal(report, program, literal);
    }

    if clause.is_fact() {
        check_fact(report, program, clause);
    }

    // variables occurring exactly once are suspicious
    if !clause.is_generated {
        let mut occurrences: BTreeMap<String, (usize, Span)> = BTreeMap::new();
        visit_clause_arguments(clause, &mut |arg| {
            if let ArgKind::Variable(name) = &arg.kind {
                let entry = occurrences
                    .entry(name.as_ref().clone())
                    .or_insert((0, arg.span));
                entry.0 += 1;
                entry.1 = arg.span;
            }
        });
        for (name, (count, span)) in occurrences {
            if count == 1 && !name.starts_with('_') {
                report.add_warning(format!("Variable {} only occurs once", name), span);
            }
        }
    }

    if let Some(plan) = &clause.plan {
        let atom_count = clause.body_atoms().count();
        for (_, order) in &plan.orders {
            if order.positions.len() != atom_count || !order.is_complete() {
                report.add_error("Invalid execution plan", order.span);
            }
        }
    }

    if recursive.recursive(clause) {
        visit_clause_arguments(clause, &mut |arg| {
            if matches!(arg.kind, ArgKind::Counter) {
                report.add_error("Auto-increment functor in a recursive rule", arg.span);
            }
        });
    }
}

fn check_atom(report: &mut ErrorReport, program: &Program, atom: &Atom) {
    match program.relation(atom.relation) {
        None => report.add_error(format!("Undefined relation {}", atom.relation), atom.span),
        Some(relation) => {
            if relation.arity() != atom.arity() {
                report.add_error(
                    format!("Mismatching arity of relation {}", atom.relation),
                    atom.span,
                );
            }
        }
    }

    for arg in &atom.args {
        check_argument(report, program, arg);
    }
}

fn check_literal(report: &mut ErrorReport, program: &Program, literal: &Literal) {
    match literal {
        Literal::Atom(atom) => check_atom(report, program, atom),
        Literal::Negation(negation) => check_atom(report, program, &negation.atom),
        Literal::Binary(constraint) => {
            check_argument(report, program, &constraint.lhs);
            check_argument(report, program, &constraint.rhs);
        }
        Literal::Boolean(_) => {}
    }

    // underscores may sit in atoms and negations, nowhere else
    if datalog_ast::literal_has_unnamed_variable(literal) {
        if let Literal::Binary(constraint) = literal {
            report.add_error("Underscore in binary relation", constraint.span);
        }
    }
}

fn check_argument(report: &mut ErrorReport, program: &Program, arg: &Argument) {
    match &arg.kind {
        ArgKind::Aggregate(aggregate) => {
            for literal in &aggregate.body {
                check_literal(report, program, literal);
            }
        }
        ArgKind::Intrinsic { args, .. } | ArgKind::UserFunctor { args, .. } => {
            for inner in args {
                check_argument(report, program, inner);
            }
        }
        _ => {}
    }
}

// ----- facts -----

fn is_constant_arith_expr(arg: &Argument) -> bool {
    match &arg.kind {
        ArgKind::Number(_) => true,
        ArgKind::Intrinsic { op, args } => {
            op.is_numerical() && args.iter().all(is_constant_arith_expr)
        }
        _ => false,
    }
}

fn check_fact(report: &mut ErrorReport, program: &Program, fact: &Clause) {
    if program.relation(fact.head.relation).is_none() {
        return; // already reported by the clause check
    }
    for arg in &fact.head.args {
        check_constant(report, arg);
    }
}

/// Facts may only contain constants and records of constants
fn check_constant(report: &mut ErrorReport, arg: &Argument) {
    match &arg.kind {
        ArgKind::Variable(name) => {
            report.add_error(format!("Variable {} in fact", name), arg.span);
        }
        ArgKind::Unnamed => report.add_error("Underscore in fact", arg.span),
        ArgKind::Counter => report.add_error("Counter in fact", arg.span),
        ArgKind::Intrinsic { .. } => {
            if !is_constant_arith_expr(arg) {
                report.add_error("Function in fact", arg.span);
            }
        }
        ArgKind::UserFunctor { .. } => {
            report.add_error("User-defined functor in fact", arg.span);
        }
        ArgKind::Aggregate(_) => report.add_error("Aggregator in fact", arg.span),
        ArgKind::Cast { value, .. } => check_constant(report, value),
        ArgKind::Record { args, .. } => {
            for inner in args {
                check_constant(report, inner);
            }
        }
        ArgKind::Number(_) | ArgKind::Text(_) | ArgKind::Nil => {}
    }
}

// ----- namespaces, io, groundedness, stratification -----

fn check_namespaces(report: &mut ErrorReport, program: &Program) {
    let mut names: HashMap<String, Span> = HashMap::new();

    for decl in &program.types {
        let name = decl.name().as_ref().clone();
        if names.contains_key(&name) {
            report.add_error(format!("Name clash on type {}", name), decl.span());
        } else {
            names.insert(name, decl.span());
        }
    }

    for relation in &program.relations {
        let name = relation.name.to_string();
        if names.contains_key(&name) {
            report.add_error(format!("Name clash on relation {}", name), relation.span);
        } else {
            names.insert(name, relation.span);
        }
    }
}

fn check_io_directives(report: &mut ErrorReport, program: &Program) {
    for directive in &program.io_directives {
        if program.relation(directive.relation).is_none() {
            report.add_error(
                format!("Undefined relation {}", directive.relation),
                directive.span,
            );
        }
    }
}

fn check_groundedness(report: &mut ErrorReport, program: &Program) {
    for clause in &program.clauses {
        if program.relation(clause.head.relation).is_none() || clause.is_fact() {
            continue;
        }

        let grounded = grounded_terms(clause);

        // every variable must be grounded, each name reported once
        let mut reported: HashSet<Symbol> = HashSet::new();
        for var in variables(clause) {
            let ArgKind::Variable(name) = &var.kind else {
                continue;
            };
            if grounded.get(&var.id) == Some(&false) && reported.insert(*name) {
                report.add_error(format!("Ungrounded variable {}", name), var.span);
            }
        }

        for record in records(clause) {
            if grounded.get(&record.id) == Some(&false) {
                report.add_error("Ungrounded record", record.span);
            }
        }
    }
}

fn check_stratification(
    report: &mut ErrorReport,
    program: &Program,
    precedence: &PrecedenceGraph,
) {
    let graph = precedence.graph();
    for current in graph.vertices() {
        if !graph.reaches(current, current) {
            continue;
        }
        let clique = graph.clique(current);
        for &member in &clique {
            let negation = negated_dependency(program, member, current);
            let aggregation = if negation.is_none() {
                aggregated_dependency(program, member, current)
            } else {
                None
            };
            let (span, dependency) = match (negation, aggregation) {
                (Some(span), _) => (span, "negation"),
                (None, Some(span)) => (span, "aggregation"),
                (None, None) => continue,
            };

            let names: Vec<String> = clique.iter().map(|r| r.to_string()).collect();
            let mut notes = Vec::new();
            if let Some(relation) = program.relation(current) {
                notes.push(DiagnosticMessage::new(
                    format!("Relation {}", current),
                    relation.span,
                ));
            }
            notes.push(DiagnosticMessage::new(
                format!("has cyclic {}", dependency),
                span,
            ));
            report.add_diagnostic(Diagnostic {
                severity: Severity::Error,
                primary: DiagnosticMessage::unlocated(format!(
                    "Unable to stratify relation(s) {{{}}}",
                    names.join(",")
                )),
                notes,
            });
            break;
        }
    }
}
