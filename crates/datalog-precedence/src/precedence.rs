//! Precedence graph of a program's relations
//!
//! There is an edge from `a` to `b` when `a` occurs in the body of a
//! clause whose head is `b`, negations and aggregate bodies included. Only
//! declared relations contribute vertices; orphan clauses add no edges.

use datalog_ast::{visit_literal_atoms, Program, RelationName};

use crate::Graph;

#[derive(Debug, Clone)]
pub struct PrecedenceGraph {
    graph: Graph<RelationName>,
}

impl PrecedenceGraph {
    pub fn build(program: &Program) -> Self {
        let mut graph = Graph::new();
        for relation in &program.relations {
            graph.insert_vertex(relation.name);
        }

        for clause in &program.clauses {
            if program.relation(clause.head.relation).is_none() {
                continue;
            }
            for literal in &clause.body {
                visit_literal_atoms(literal, &mut |atom| {
                    if program.relation(atom.relation).is_some() {
                        graph.insert_edge(atom.relation, clause.head.relation);
                    }
                });
            }
        }

        Self { graph }
    }

    pub fn graph(&self) -> &Graph<RelationName> {
        &self.graph
    }
}
