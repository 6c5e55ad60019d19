//! Recursive-clause classification
//!
//! A clause is recursive when its head relation is on a dependency cycle
//! with one of its body atoms. Every body atom reaches the head by
//! construction of the precedence graph, so the test reduces to the head
//! reaching the body atom back.

use datalog_ast::{visit_literal_atoms, Clause};

use crate::PrecedenceGraph;

#[derive(Debug, Clone, Copy)]
pub struct RecursiveClauses<'a> {
    precedence: &'a PrecedenceGraph,
}

impl<'a> RecursiveClauses<'a> {
    pub fn new(precedence: &'a PrecedenceGraph) -> Self {
        Self { precedence }
    }

    pub fn recursive(&self, clause: &Clause) -> bool {
        let head = clause.head.relation;
        let graph = self.precedence.graph();
        let mut found = false;
        for literal in &clause.body {
            visit_literal_atoms(literal, &mut |atom| {
                if atom.relation == head || graph.reaches(head, atom.relation) {
                    found = true;
                }
            });
        }
        found
    }
}
