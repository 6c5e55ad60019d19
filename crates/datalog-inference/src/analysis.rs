//! Program-wide type analysis
//!
//! Builds the lattice from the type environment, runs the solver over
//! every typeable clause, and keeps the per-argument solutions. With the
//! debug report enabled, each typed clause contributes a section listing
//! its constraints and final type assignment.

use std::collections::HashMap;
use std::fmt::Write;

use datalog_ast::{
    visit_clause_arguments, visit_clause_atoms, ArgId, ArgKind, Argument, Clause, Program,
};
use datalog_types::{AType, TypeEnvironment, TypeLattice};

use crate::TypeSolver;

pub struct TypeAnalysis<'p> {
    lattice: TypeLattice,
    types: HashMap<ArgId, AType>,
    typed_clauses: Vec<&'p Clause>,
    has_invalid_clauses: bool,
    debug: Option<String>,
}

impl<'p> TypeAnalysis<'p> {
    /// Run the analysis over every clause of the program. With `debug` set,
    /// a per-clause text report is accumulated for the driver.
    pub fn run(program: &'p Program, env: &TypeEnvironment<'p>, debug: bool) -> Self {
        let mut analysis = Self {
            lattice: TypeLattice::from_environment(env),
            types: HashMap::new(),
            typed_clauses: Vec::new(),
            has_invalid_clauses: false,
            debug: debug.then(String::new),
        };

        if !analysis.lattice.is_valid() {
            return analysis;
        }

        for clause in &program.clauses {
            if !Self::is_clause_typeable(program, clause) {
                analysis.has_invalid_clauses = true;
                continue;
            }
            analysis.typed_clauses.push(clause);

            let solver = TypeSolver::solve(program, &analysis.lattice, clause);
            visit_clause_arguments(clause, &mut |arg| {
                analysis.types.insert(arg.id, solver.type_of(arg));
            });

            if let Some(log) = analysis.debug.as_mut() {
                write_debug_section(log, clause, &solver);
            }
        }

        if analysis.has_invalid_clauses {
            if let Some(log) = analysis.debug.as_mut() {
                let _ = writeln!(log, "Some clauses were skipped as they cannot be typechecked");
            }
        }

        analysis
    }

    pub fn lattice(&self) -> &TypeLattice {
        &self.lattice
    }

    /// The inferred type of an argument, absent for skipped clauses
    pub fn type_of(&self, arg: &Argument) -> Option<AType> {
        self.types.get(&arg.id).copied()
    }

    pub fn typed_clauses(&self) -> &[&'p Clause] {
        &self.typed_clauses
    }

    /// Whether at least one clause was structurally unfit for typing
    pub fn found_invalid_clauses(&self) -> bool {
        self.has_invalid_clauses
    }

    pub fn debug_report(&self) -> Option<&str> {
        self.debug.as_deref()
    }

    /// A clause can be typed when every atom resolves to a declared
    /// relation of matching arity whose attribute types are declared, every
    /// user functor and record constructor matches its declaration, every
    /// cast names a declared type, and intrinsic functors are fully
    /// applied.
    pub fn is_clause_typeable(program: &Program, clause: &Clause) -> bool {
        let mut typeable = true;

        visit_clause_atoms(clause, &mut |atom| {
            match program.relation(atom.relation) {
                None => typeable = false,
                Some(relation) => {
                    if relation.arity() != atom.arity() {
                        typeable = false;
                    } else if relation.attributes.iter().any(|attribute| {
                        !is_declared_type(program, attribute.type_name)
                    }) {
                        typeable = false;
                    }
                }
            }
        });

        visit_clause_arguments(clause, &mut |arg| match &arg.kind {
            ArgKind::UserFunctor { name, args } => match program.functor(*name) {
                Some(declaration) if declaration.arity() == args.len() => {}
                _ => typeable = false,
            },
            ArgKind::Record { type_name, args } => match program.type_decl(*type_name) {
                Some(datalog_ast::TypeDecl::Record(declaration))
                    if declaration.fields.len() == args.len() => {}
                _ => typeable = false,
            },
            ArgKind::Cast { type_name, .. } => {
                if !is_declared_type(program, *type_name) {
                    typeable = false;
                }
            }
            ArgKind::Intrinsic { op, args } => {
                if op.arity() != args.len() {
                    typeable = false;
                }
            }
            _ => {}
        });

        typeable
    }
}

fn is_declared_type(program: &Program, name: datalog_ast::Symbol) -> bool {
    TypeEnvironment::is_primitive_name(name) || program.type_decl(name).is_some()
}

fn write_debug_section(log: &mut String, clause: &Clause, solver: &TypeSolver) {
    let _ = writeln!(log, "Clause:\n{}\n", clause);
    let _ = writeln!(log, "\tConstraints:");
    for constraint in solver.constraints() {
        let _ = writeln!(log, "\t\t{}", constraint);
    }
    let _ = writeln!(log, "\tTypes:");
    visit_clause_arguments(clause, &mut |arg| {
        let _ = writeln!(log, "\t\ttype({}) = {}", arg, solver.type_of(arg));
    });
    let _ = writeln!(log);
}
