//! Execution-plan version check
//!
//! A recursive clause is specialized into one version per body atom whose
//! relation lives in the same stratum. A user-supplied plan may only give
//! orders for those versions.

use datalog_ast::Program;
use datalog_precedence::{RecursiveClauses, RelationSchedule};
use datalog_report::{Diagnostic, DiagnosticMessage, ErrorReport, Severity};

pub fn check_execution_plans(
    report: &mut ErrorReport,
    program: &Program,
    schedule: &RelationSchedule,
    recursive: &RecursiveClauses,
) {
    for step in schedule.steps() {
        let stratum = step.computed();
        for &name in stratum {
            for clause in program.clauses_of(name) {
                if !recursive.recursive(clause) {
                    continue;
                }
                let Some(plan) = &clause.plan else {
                    continue;
                };

                let versions = clause
                    .body_atoms()
                    .filter(|atom| stratum.contains(&atom.relation))
                    .count();

                for (version, order) in &plan.orders {
                    if *version >= versions {
                        report.add_diagnostic(Diagnostic {
                            severity: Severity::Error,
                            primary: DiagnosticMessage::new(
                                format!("execution plan for version {}", version),
                                order.span,
                            ),
                            notes: vec![DiagnosticMessage::unlocated(format!(
                                "only versions 0..{} permitted",
                                versions.saturating_sub(1)
                            ))],
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalog_ast::{
        AstBuilder, Atom, Attribute, Clause, ExecutionOrder, ExecutionPlan, Literal, Relation,
        RelationName, Representation, Span, SrcId, Symbol,
    };
    use datalog_precedence::PrecedenceGraph;

    fn span() -> Span {
        Span::new(SrcId::repl(), 0..1)
    }

    fn relation(name: &str) -> Relation {
        Relation {
            name: RelationName::from_dotted(name),
            attributes: vec![Attribute {
                name: Symbol::new("x".to_string()),
                type_name: Symbol::new("number".to_string()),
                span: span(),
            }],
            representation: Representation::Default,
            is_inline: false,
            is_input: false,
            is_output: false,
            is_suppressed: false,
            span: span(),
        }
    }

    fn atom(b: &mut AstBuilder, name: &str) -> Atom {
        Atom {
            relation: RelationName::from_dotted(name),
            args: vec![b.variable("X", span())],
            span: span(),
        }
    }

    fn planned_rule(head: Atom, body: Vec<Literal>, versions: Vec<usize>) -> Clause {
        Clause {
            head,
            body,
            plan: Some(ExecutionPlan {
                orders: versions
                    .into_iter()
                    .map(|version| {
                        (
                            version,
                            ExecutionOrder {
                                positions: vec![1, 2],
                                span: span(),
                            },
                        )
                    })
                    .collect(),
            }),
            is_generated: false,
            span: span(),
        }
    }

    #[test]
    fn test_version_beyond_stratum_count_is_an_error() {
        let mut b = AstBuilder::new();
        // path(X) :- path(X), edge(X).  one recursive atom, so only
        // version 0 exists
        let program = Program {
            relations: vec![relation("path"), relation("edge")],
            clauses: vec![planned_rule(
                atom(&mut b, "path"),
                vec![
                    Literal::Atom(atom(&mut b, "path")),
                    Literal::Atom(atom(&mut b, "edge")),
                ],
                vec![0, 1],
            )],
            ..Program::default()
        };
        let precedence = PrecedenceGraph::build(&program);
        let schedule = RelationSchedule::build(&program, &precedence);
        let recursive = RecursiveClauses::new(&precedence);
        let mut report = ErrorReport::new();
        check_execution_plans(&mut report, &program, &schedule, &recursive);

        assert_eq!(report.error_count(), 1);
        let diagnostic = &report.diagnostics()[0];
        assert_eq!(diagnostic.primary.message, "execution plan for version 1");
        assert_eq!(diagnostic.notes[0].message, "only versions 0..0 permitted");
    }

    #[test]
    fn test_valid_versions_pass() {
        let mut b = AstBuilder::new();
        let program = Program {
            relations: vec![relation("path"), relation("edge")],
            clauses: vec![planned_rule(
                atom(&mut b, "path"),
                vec![
                    Literal::Atom(atom(&mut b, "path")),
                    Literal::Atom(atom(&mut b, "edge")),
                ],
                vec![0],
            )],
            ..Program::default()
        };
        let precedence = PrecedenceGraph::build(&program);
        let schedule = RelationSchedule::build(&program, &precedence);
        let recursive = RecursiveClauses::new(&precedence);
        let mut report = ErrorReport::new();
        check_execution_plans(&mut report, &program, &schedule, &recursive);
        assert!(report.is_empty());
    }
}
