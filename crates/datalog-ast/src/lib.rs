//! Abstract syntax tree for Datalog programs
//!
//! This crate defines the data structures a semantic analysis front-end
//! operates on, together with read-only queries over them.
//!
//! # Key Components
//!
//! - **Program**: type declarations, relation declarations, clauses,
//!   I/O directives and functor declarations
//! - **Clause**: a head atom plus a body of literals; a fact is a clause
//!   with an empty body
//! - **Literal**: positive atom, negated atom, binary constraint, or
//!   boolean constraint
//! - **Argument**: variables, constants, functor applications, record
//!   constructors, type casts, counters and aggregates
//! - **Visitors**: closure-driven depth-first walkers and a bottom-up
//!   node mapper
//! - **Groundedness**: the fixed-point computation deciding which
//!   arguments of a clause are forced by its body
//!
//! Every node carries a [`Span`]; every argument additionally carries an
//! [`ArgId`] that analysis passes use to key their result maps.

mod ast;
mod builder;
mod constants;
mod ground;
mod query;
mod span;
mod visit;

pub use ast::{
    Aggregate, AggregateOp, ArgId, ArgKind, Argument, Atom, Attribute, BinaryConstraint,
    BooleanConstraint,
    Clause, ConstraintOp, ExecutionOrder, ExecutionPlan, FunctorDeclaration, FunctorKind,
    FunctorOp, IoDirective, IoKind, Literal, Negation, PrimitiveKind, PrimitiveType, Program,
    RecordField, RecordType, Relation, RelationName, Representation, Symbol, TypeDecl, UnionType,
};
pub use builder::AstBuilder;
pub use constants::{AstDomain, MAX_AST_DOMAIN, MIN_AST_DOMAIN};
pub use ground::grounded_terms;
pub use query::{
    aggregated_dependency, atom_relation, has_unnamed_variable, literal_has_unnamed_variable,
    negated_dependency, records, variables,
};
pub use span::{Span, SrcId};
pub use visit::{
    map_argument, map_literal_arguments, visit_argument, visit_clause_aggregates,
    visit_clause_arguments, visit_clause_atoms, visit_clause_negations, visit_direct_aggregates,
    visit_literal_arguments, visit_literal_atoms, visit_program_aggregates, visit_program_atoms,
    visit_program_negations,
};
