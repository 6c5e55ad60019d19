//! I/O classification of relations
//!
//! A relation counts as input when it carries the input qualifier or is the
//! target of a load directive, and as output when it carries the output
//! qualifier or is the target of a store or printsize directive.

use std::collections::BTreeSet;

use datalog_ast::{IoKind, Program, RelationName};

#[derive(Debug, Clone, Default)]
pub struct IoTypes {
    inputs: BTreeSet<RelationName>,
    outputs: BTreeSet<RelationName>,
}

impl IoTypes {
    pub fn build(program: &Program) -> Self {
        let mut io = Self::default();
        for relation in &program.relations {
            if relation.is_input {
                io.inputs.insert(relation.name);
            }
            if relation.is_output {
                io.outputs.insert(relation.name);
            }
        }
        for directive in &program.io_directives {
            match directive.kind {
                IoKind::Load => {
                    io.inputs.insert(directive.relation);
                }
                IoKind::Store | IoKind::PrintSize => {
                    io.outputs.insert(directive.relation);
                }
            }
        }
        io
    }

    pub fn is_input(&self, relation: RelationName) -> bool {
        self.inputs.contains(&relation)
    }

    pub fn is_output(&self, relation: RelationName) -> bool {
        self.outputs.contains(&relation)
    }

    pub fn is_io(&self, relation: RelationName) -> bool {
        self.is_input(relation) || self.is_output(relation)
    }
}
