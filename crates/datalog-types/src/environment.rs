//! The set of declared types of a program

use std::collections::HashMap;

use datalog_ast::{Program, Symbol, TypeDecl};

/// Name-indexed view of a program's type declarations. The primitives
/// `number` and `symbol` are always considered declared.
#[derive(Debug, Clone)]
pub struct TypeEnvironment<'p> {
    types: HashMap<Symbol, &'p TypeDecl>,
}

impl<'p> TypeEnvironment<'p> {
    pub fn from_program(program: &'p Program) -> Self {
        let mut types = HashMap::new();
        for decl in &program.types {
            // duplicates keep the first declaration; the namespace check
            // reports the clash
            types.entry(decl.name()).or_insert(decl);
        }
        Self { types }
    }

    pub fn is_primitive_name(name: Symbol) -> bool {
        name.as_ref() == "number" || name.as_ref() == "symbol"
    }

    pub fn is_type(&self, name: Symbol) -> bool {
        Self::is_primitive_name(name) || self.types.contains_key(&name)
    }

    pub fn decl(&self, name: Symbol) -> Option<&'p TypeDecl> {
        self.types.get(&name).copied()
    }

    pub fn decls(&self) -> impl Iterator<Item = &'p TypeDecl> + '_ {
        self.types.values().copied()
    }

    pub fn is_record_type(&self, name: Symbol) -> bool {
        matches!(self.decl(name), Some(TypeDecl::Record(_)))
    }
}
