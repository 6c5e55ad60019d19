//! Inlining safety checks
//!
//! A relation marked inline is substituted into its callers before
//! execution. Substitution is only sound when:
//!
//! 1. the relation does no I/O
//! 2. the inlined relations are not cyclically dependent
//! 3. no inlined atom or clause mentions the counter `$`
//! 4. a negated inlined relation introduces no fresh body variables
//! 5. a negated inlined atom carries no unnamed variable outside aggregates
//! 6. inlined atoms do not occur inside aggregate bodies

use std::collections::BTreeSet;

use datalog_ast::{
    visit_argument, visit_clause_arguments, visit_literal_atoms, visit_program_aggregates,
    visit_program_atoms, visit_program_negations, ArgKind, Argument, Program, RelationName,
};
use datalog_precedence::{Graph, IoTypes, PrecedenceGraph};
use datalog_report::ErrorReport;

pub(crate) fn check_inlining(
    report: &mut ErrorReport,
    program: &Program,
    precedence: &PrecedenceGraph,
    io: &IoTypes,
) {
    let mut inlined: BTreeSet<RelationName> = BTreeSet::new();
    for relation in &program.relations {
        if relation.is_inline {
            inlined.insert(relation.name);
            if io.is_io(relation.name) {
                report.add_error(
                    format!("IO relation {} cannot be inlined", relation.name),
                    relation.span,
                );
            }
        }
    }

    // 1. the restriction of the precedence graph to inlined relations must
    //    be acyclic
    if let Some(cycle) = find_inline_cycle(precedence.graph(), &inlined) {
        let names: Vec<String> = cycle.iter().map(|name| name.to_string()).collect();
        let origin_span = program
            .relation(cycle[0])
            .map(|relation| relation.span)
            .unwrap_or_else(datalog_ast::Span::internal);
        report.add_error(
            format!(
                "Cannot inline cyclically dependent relations {{{}}}",
                names.join(", ")
            ),
            origin_span,
        );
    }

    // 2. no counter in atoms of inlined relations
    visit_program_atoms(program, &mut |atom| {
        if !inlined.contains(&atom.relation) {
            return;
        }
        for arg in &atom.args {
            visit_argument(arg, &mut |inner| {
                if matches!(inner.kind, ArgKind::Counter) {
                    report.add_error(
                        "Cannot inline literal containing a counter argument '$'",
                        inner.span,
                    );
                }
            });
        }
    });

    // ... and no counter in clauses of inlined relations
    for &name in &inlined {
        for clause in program.clauses_of(name) {
            visit_clause_arguments(clause, &mut |arg| {
                if matches!(arg.kind, ArgKind::Counter) {
                    report.add_error(
                        "Cannot inline clause containing a counter argument '$'",
                        arg.span,
                    );
                }
            });
        }
    }

    // 3. a negated inlined relation must not introduce fresh body variables
    let mut non_negatable: BTreeSet<RelationName> = BTreeSet::new();
    for &name in &inlined {
        'clauses: for clause in program.clauses_of(name) {
            let mut head_vars: BTreeSet<String> = BTreeSet::new();
            for arg in &clause.head.args {
                visit_argument(arg, &mut |inner| {
                    if let ArgKind::Variable(var) = &inner.kind {
                        head_vars.insert(var.as_ref().clone());
                    }
                });
            }
            for literal in &clause.body {
                let mut introduces = false;
                datalog_ast::visit_literal_arguments(literal, &mut |inner| {
                    if let ArgKind::Variable(var) = &inner.kind {
                        if !head_vars.contains(var.as_ref()) {
                            introduces = true;
                        }
                    }
                });
                if introduces {
                    non_negatable.insert(name);
                    break 'clauses;
                }
            }
        }
    }
    visit_program_negations(program, &mut |negation| {
        if non_negatable.contains(&negation.atom.relation) {
            report.add_error(
                "Cannot inline negated relation which may introduce new variables",
                negation.span,
            );
        }
    });

    // 4. inlined atoms may not appear inside aggregate bodies
    visit_program_aggregates(program, &mut |arg| {
        let ArgKind::Aggregate(aggregate) = &arg.kind else {
            return;
        };
        for literal in &aggregate.body {
            visit_literal_atoms(literal, &mut |atom| {
                if inlined.contains(&atom.relation) {
                    report.add_error(
                        "Cannot inline relations that appear in aggregator",
                        atom.span,
                    );
                }
            });
        }
    });

    // 5. a negated inlined atom may not contain an unnamed variable,
    //    except inside a nested aggregate
    visit_program_negations(program, &mut |negation| {
        if !inlined.contains(&negation.atom.relation) {
            return;
        }
        for arg in &negation.atom.args {
            if let Some(span) = find_unnamed_outside_aggregates(arg) {
                report.add_error(
                    "Cannot inline negated atom containing an unnamed variable unless the \
                     variable is within an aggregator",
                    span,
                );
                return;
            }
        }
    });
}

fn find_unnamed_outside_aggregates(arg: &Argument) -> Option<datalog_ast::Span> {
    match &arg.kind {
        ArgKind::Unnamed => Some(arg.span),
        ArgKind::Aggregate(_) => None,
        ArgKind::Cast { value, .. } => find_unnamed_outside_aggregates(value),
        ArgKind::Intrinsic { args, .. }
        | ArgKind::UserFunctor { args, .. }
        | ArgKind::Record { args, .. } => args.iter().find_map(find_unnamed_outside_aggregates),
        _ => None,
    }
}

/// Depth-first search for a cycle within the inlined relations. The
/// returned path starts and ends at the cycle entry, in edge order.
fn find_inline_cycle(
    graph: &Graph<RelationName>,
    inlined: &BTreeSet<RelationName>,
) -> Option<Vec<RelationName>> {
    let mut visited: BTreeSet<RelationName> = BTreeSet::new();
    for &start in inlined {
        if visited.contains(&start) {
            continue;
        }
        let mut path = Vec::new();
        let mut on_path = BTreeSet::new();
        if let Some(cycle) = dfs(graph, inlined, start, &mut path, &mut on_path, &mut visited) {
            return Some(cycle);
        }
    }
    None
}

fn dfs(
    graph: &Graph<RelationName>,
    inlined: &BTreeSet<RelationName>,
    current: RelationName,
    path: &mut Vec<RelationName>,
    on_path: &mut BTreeSet<RelationName>,
    visited: &mut BTreeSet<RelationName>,
) -> Option<Vec<RelationName>> {
    path.push(current);
    on_path.insert(current);

    for successor in graph.successors(current) {
        if !inlined.contains(&successor) || visited.contains(&successor) {
            continue;
        }
        if on_path.contains(&successor) {
            let entry = path.iter().position(|&name| name == successor);
            if let Some(entry) = entry {
                return Some(path[entry..].to_vec());
            }
        }
        if let Some(cycle) = dfs(graph, inlined, successor, path, on_path, visited) {
            return Some(cycle);
        }
    }

    path.pop();
    on_path.remove(&current);
    visited.insert(current);
    None
}
