//! Per-clause constraint generation and resolution
//!
//! One solver instance types one clause. Generation walks the body
//! literals and the children of the head; the head atom itself imposes no
//! constraints, its arguments are checked against the relation's attribute
//! types after the fact. All occurrences of a variable are redirected to a
//! single representative argument before constraints are stated.

use std::collections::HashMap;

use datalog_ast::{
    visit_clause_arguments, AggregateOp, ArgId, ArgKind, Argument, Atom, Clause, Literal,
    ConstraintOp, Program, Symbol,
};
use datalog_types::{AnalysisType, AType, Kind, TypeLattice};

use crate::{Constraint, FixedConstraint, TypeAssignment};

pub struct TypeSolver<'a> {
    program: &'a Program,
    lattice: &'a TypeLattice,
    clause: &'a Clause,
    constraints: Vec<Constraint>,
    assignment: TypeAssignment,
    representatives: HashMap<Symbol, ArgId>,
}

impl<'a> TypeSolver<'a> {
    /// Generate the clause's constraints and resolve them to a fixed point
    pub fn solve(program: &'a Program, lattice: &'a TypeLattice, clause: &'a Clause) -> Self {
        let mut solver = Self {
            program,
            lattice,
            clause,
            constraints: Vec::new(),
            assignment: TypeAssignment::new(),
            representatives: HashMap::new(),
        };
        solver.generate();
        solver.resolve();
        solver
    }

    /// The inferred type of an argument occurrence. Variable occurrences
    /// share the type of their representative.
    pub fn type_of(&self, arg: &Argument) -> AType {
        self.assignment
            .get(&self.representative_id(arg))
            .copied()
            .unwrap_or_else(AnalysisType::top)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn clause(&self) -> &'a Clause {
        self.clause
    }

    fn representative_id(&self, arg: &Argument) -> ArgId {
        match &arg.kind {
            ArgKind::Variable(name) => self
                .representatives
                .get(name)
                .copied()
                .unwrap_or(arg.id),
            _ => arg.id,
        }
    }

    /// The canonical argument standing for `arg` in constraints. The first
    /// traversal contact with a variable name fixes its representative.
    fn representative(&mut self, arg: &Argument) -> ArgId {
        match &arg.kind {
            ArgKind::Variable(name) => *self.representatives.entry(*name).or_insert(arg.id),
            _ => arg.id,
        }
    }

    fn fixed(&mut self, arg: ArgId, bound: AType) {
        self.constraints
            .push(Constraint::Fixed(FixedConstraint { arg, bound }));
    }

    // ----- constraint generation -----

    fn generate(&mut self) {
        let clause = self.clause;
        for literal in &clause.body {
            self.generate_literal(literal);
        }
        // children of the head only; the head atom is checked post hoc
        for arg in &clause.head.args {
            self.generate_argument(arg);
        }
    }

    fn generate_literal(&mut self, literal: &Literal) {
        match literal {
            Literal::Atom(atom) => self.generate_atom(atom),
            Literal::Negation(negation) => {
                // no attribute constraints: variables under a negation are
                // not grounded by it, only nested structure is typed
                for arg in &negation.atom.args {
                    self.generate_argument(arg);
                }
            }
            Literal::Binary(constraint) => {
                self.generate_argument(&constraint.lhs);
                self.generate_argument(&constraint.rhs);
                if constraint.op == ConstraintOp::Eq {
                    let lhs = self.representative(&constraint.lhs);
                    let rhs = self.representative(&constraint.rhs);
                    self.constraints.push(Constraint::Variable {
                        target: lhs,
                        source: rhs,
                    });
                    self.constraints.push(Constraint::Variable {
                        target: rhs,
                        source: lhs,
                    });
                }
            }
            Literal::Boolean(_) => {}
        }
    }

    fn generate_atom(&mut self, atom: &Atom) {
        for arg in &atom.args {
            self.generate_argument(arg);
        }
        let Some(relation) = self.program.relation(atom.relation) else {
            return;
        };
        for (arg, attribute) in atom.args.iter().zip(&relation.attributes) {
            let representative = self.representative(arg);
            if let Some(expected) = self.lattice.analysis_type(attribute.type_name) {
                self.fixed(representative, expected);
            }
        }
    }

    fn generate_argument(&mut self, arg: &Argument) {
        match &arg.kind {
            ArgKind::Variable(_) => {
                self.representative(arg);
            }
            ArgKind::Unnamed => {}
            ArgKind::Number(_) => self.fixed(arg.id, AnalysisType::constant(Kind::Number)),
            ArgKind::Text(_) => self.fixed(arg.id, AnalysisType::constant(Kind::Symbol)),
            ArgKind::Nil => self.fixed(arg.id, AnalysisType::constant(Kind::Record)),
            ArgKind::Counter => self.fixed(arg.id, AnalysisType::constant(Kind::Number)),
            ArgKind::Cast { type_name, value } => {
                self.generate_argument(value);
                if let Some(target) = self.lattice.analysis_type(*type_name) {
                    self.fixed(arg.id, target);
                }
            }
            ArgKind::Intrinsic { op, args } => {
                for inner in args {
                    self.generate_argument(inner);
                }
                if matches!(op, datalog_ast::FunctorOp::Max | datalog_ast::FunctorOp::Min) {
                    // result of max and min is one of the argument types
                    if let [first, second] = args.as_slice() {
                        let lhs = self.representative(first);
                        let rhs = self.representative(second);
                        self.constraints.push(Constraint::Union {
                            result: arg.id,
                            lhs,
                            rhs,
                        });
                    }
                } else {
                    let out_kind = if op.is_symbolic() {
                        Kind::Symbol
                    } else {
                        Kind::Number
                    };
                    self.fixed(arg.id, AnalysisType::top_primitive(out_kind));

                    // a functor over constants evaluates to a constant
                    let mut requirements = Vec::new();
                    for (index, inner) in args.iter().enumerate() {
                        let kind = if op.accepts_symbols(index) {
                            Kind::Symbol
                        } else {
                            Kind::Number
                        };
                        requirements.push(FixedConstraint {
                            arg: self.representative(inner),
                            bound: AnalysisType::constant(kind),
                        });
                    }
                    self.constraints.push(Constraint::Implication {
                        consequent: FixedConstraint {
                            arg: arg.id,
                            bound: AnalysisType::constant(out_kind),
                        },
                        requirements,
                    });
                }
            }
            ArgKind::UserFunctor { name, args } => {
                for inner in args {
                    self.generate_argument(inner);
                }
                let Some(declaration) = self.program.functor(*name) else {
                    return;
                };
                let out_kind = match declaration.output {
                    datalog_ast::FunctorKind::Symbol => Kind::Symbol,
                    datalog_ast::FunctorKind::Number => Kind::Number,
                };
                self.fixed(arg.id, AnalysisType::top_primitive(out_kind));

                let mut requirements = Vec::new();
                for (index, inner) in args.iter().enumerate() {
                    let kind = if declaration.accepts_symbols(index) {
                        Kind::Symbol
                    } else {
                        Kind::Number
                    };
                    requirements.push(FixedConstraint {
                        arg: self.representative(inner),
                        bound: AnalysisType::constant(kind),
                    });
                }
                self.constraints.push(Constraint::Implication {
                    consequent: FixedConstraint {
                        arg: arg.id,
                        bound: AnalysisType::constant(out_kind),
                    },
                    requirements,
                });
            }
            ArgKind::Record { type_name, args } => {
                for inner in args {
                    self.generate_argument(inner);
                }
                self.generate_record(arg, *type_name, args);
            }
            ArgKind::Aggregate(aggregate) => {
                if let Some(target) = &aggregate.target {
                    self.generate_argument(target);
                }
                for literal in &aggregate.body {
                    self.generate_literal(literal);
                }
                match aggregate.op {
                    AggregateOp::Count | AggregateOp::Sum => {
                        self.fixed(arg.id, AnalysisType::top_primitive(Kind::Number));
                    }
                    AggregateOp::Min | AggregateOp::Max => {
                        if let Some(target) = &aggregate.target {
                            let source = self.representative(target);
                            self.constraints.push(Constraint::Variable {
                                target: arg.id,
                                source,
                            });
                        }
                    }
                }
            }
        }
    }

    /// A record constructor is typed through two implications:
    ///
    /// 1. once the record is known to be a record, each element must have
    ///    its field type
    /// 2. once every element has its field type, the record has the
    ///    declared record type
    fn generate_record(&mut self, record: &Argument, type_name: Symbol, args: &[Argument]) {
        let Some(datalog_ast::TypeDecl::Record(declaration)) =
            self.program.type_decl(type_name)
        else {
            return;
        };
        let Some(record_type) = self.lattice.analysis_type(type_name) else {
            return;
        };

        let mut element_bounds = Vec::new();
        for (arg, field) in args.iter().zip(&declaration.fields) {
            if let Some(field_type) = self.lattice.analysis_type(field.type_name) {
                element_bounds.push(FixedConstraint {
                    arg: self.representative(arg),
                    bound: field_type,
                });
            }
        }

        for bound in &element_bounds {
            self.constraints.push(Constraint::Implication {
                consequent: bound.clone(),
                requirements: vec![FixedConstraint {
                    arg: record.id,
                    bound: AnalysisType::top_primitive(Kind::Record),
                }],
            });
        }
        self.constraints.push(Constraint::Implication {
            consequent: FixedConstraint {
                arg: record.id,
                bound: record_type,
            },
            requirements: element_bounds,
        });
    }

    // ----- resolution -----

    fn resolve(&mut self) {
        self.assignment.clear();
        visit_clause_arguments(self.clause, &mut |arg| {
            self.assignment.insert(arg.id, AnalysisType::top());
        });

        // resolve until a full pass leaves every constraint satisfied;
        // termination is monotone descent in a finite lattice
        let mut changed = true;
        while changed {
            changed = false;
            for constraint in &self.constraints {
                if !constraint.is_satisfied(&self.assignment, self.lattice) {
                    constraint.resolve(&mut self.assignment, self.lattice);
                    changed = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalog_ast::{
        AstBuilder, Attribute, BinaryConstraint, FunctorOp, PrimitiveKind, PrimitiveType,
        RecordField, RecordType, Relation, RelationName, Representation, Span, SrcId, TypeDecl,
    };
    use datalog_types::TypeEnvironment;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s.to_string())
    }

    fn span() -> Span {
        Span::new(SrcId::repl(), 0..1)
    }

    fn attribute(name: &str, type_name: &str) -> Attribute {
        Attribute {
            name: sym(name),
            type_name: sym(type_name),
            span: span(),
        }
    }

    fn relation(name: &str, attributes: Vec<Attribute>) -> Relation {
        Relation {
            name: RelationName::from_dotted(name),
            attributes,
            representation: Representation::Default,
            is_inline: false,
            is_input: false,
            is_output: false,
            is_suppressed: false,
            span: span(),
        }
    }

    fn atom(args: Vec<Argument>, name: &str) -> Atom {
        Atom {
            relation: RelationName::from_dotted(name),
            args,
            span: span(),
        }
    }

    fn rule(head: Atom, body: Vec<Literal>) -> Clause {
        Clause {
            head,
            body,
            plan: None,
            is_generated: false,
            span: span(),
        }
    }

    fn eq(lhs: Argument, rhs: Argument) -> Literal {
        Literal::Binary(BinaryConstraint {
            op: ConstraintOp::Eq,
            lhs,
            rhs,
            span: span(),
        })
    }

    #[test]
    fn test_atom_attribute_types_flow_to_variables() {
        // p(X) :- q(X).  with q(x : number)
        let mut b = AstBuilder::new();
        let head_var = b.variable("X", span());
        let body_var = b.variable("X", span());
        let program = Program {
            relations: vec![
                relation("p", vec![attribute("x", "number")]),
                relation("q", vec![attribute("x", "number")]),
            ],
            clauses: vec![rule(
                atom(vec![head_var.clone()], "p"),
                vec![Literal::Atom(atom(vec![body_var.clone()], "q"))],
            )],
            ..Program::default()
        };
        let env = TypeEnvironment::from_program(&program);
        let lattice = TypeLattice::from_environment(&env);
        let solver = TypeSolver::solve(&program, &lattice, &program.clauses[0]);

        let number = AnalysisType::top_primitive(Kind::Number);
        assert_eq!(solver.type_of(&body_var), number);
        // unification: the head occurrence shares the representative
        assert_eq!(solver.type_of(&head_var), number);
    }

    #[test]
    fn test_equality_gives_equal_types() {
        // p(X) :- q(Y), X = Y.  with q(x : age)
        let mut b = AstBuilder::new();
        let head_var = b.variable("X", span());
        let q_var = b.variable("Y", span());
        let lhs = b.variable("X", span());
        let rhs = b.variable("Y", span());
        let program = Program {
            types: vec![TypeDecl::Primitive(PrimitiveType {
                name: sym("age"),
                kind: PrimitiveKind::Number,
                span: span(),
            })],
            relations: vec![
                relation("p", vec![attribute("x", "number")]),
                relation("q", vec![attribute("x", "age")]),
            ],
            clauses: vec![rule(
                atom(vec![head_var.clone()], "p"),
                vec![
                    Literal::Atom(atom(vec![q_var.clone()], "q")),
                    eq(lhs.clone(), rhs),
                ],
            )],
            ..Program::default()
        };
        let env = TypeEnvironment::from_program(&program);
        let lattice = TypeLattice::from_environment(&env);
        let solver = TypeSolver::solve(&program, &lattice, &program.clauses[0]);

        let age = lattice.analysis_type(sym("age")).unwrap();
        assert_eq!(solver.type_of(&q_var), age);
        assert_eq!(solver.type_of(&lhs), age);
        assert_eq!(solver.type_of(&head_var), age);
    }

    #[test]
    fn test_functor_over_constants_is_constant() {
        // p(X) :- X = 1 + 2.
        let mut b = AstBuilder::new();
        let head_var = b.variable("X", span());
        let sum_arg1 = b.number(1, span());
        let sum_arg2 = b.number(2, span());
        let sum = b.intrinsic(FunctorOp::Add, vec![sum_arg1, sum_arg2], span());
        let sum_clone = sum.clone();
        let program = Program {
            relations: vec![relation("p", vec![attribute("x", "number")])],
            clauses: vec![rule(
                atom(vec![head_var], "p"),
                vec![eq(b.variable("X", span()), sum)],
            )],
            ..Program::default()
        };
        let env = TypeEnvironment::from_program(&program);
        let lattice = TypeLattice::from_environment(&env);
        let solver = TypeSolver::solve(&program, &lattice, &program.clauses[0]);

        assert_eq!(
            solver.type_of(&sum_clone),
            AnalysisType::constant(Kind::Number)
        );
    }

    #[test]
    fn test_functor_over_variable_is_primitive() {
        // p(X) :- q(Y), X = Y + 1.
        let mut b = AstBuilder::new();
        let head_var = b.variable("X", span());
        let sum_var = b.variable("Y", span());
        let sum_num = b.number(1, span());
        let sum = b.intrinsic(FunctorOp::Add, vec![sum_var, sum_num], span());
        let sum_clone = sum.clone();
        let program = Program {
            relations: vec![
                relation("p", vec![attribute("x", "number")]),
                relation("q", vec![attribute("x", "number")]),
            ],
            clauses: vec![rule(
                atom(vec![head_var], "p"),
                vec![
                    Literal::Atom(atom(vec![b.variable("Y", span())], "q")),
                    eq(b.variable("X", span()), sum),
                ],
            )],
            ..Program::default()
        };
        let env = TypeEnvironment::from_program(&program);
        let lattice = TypeLattice::from_environment(&env);
        let solver = TypeSolver::solve(&program, &lattice, &program.clauses[0]);

        assert_eq!(
            solver.type_of(&sum_clone),
            AnalysisType::top_primitive(Kind::Number)
        );
    }

    #[test]
    fn test_record_typed_through_elements() {
        // p(R) :- R = [1, 2].  with .type pair = [x : number, y : number]
        let mut b = AstBuilder::new();
        let head_var = b.variable("R", span());
        let record_num1 = b.number(1, span());
        let record_num2 = b.number(2, span());
        let record = b.record("pair", vec![record_num1, record_num2], span());
        let record_clone = record.clone();
        let program = Program {
            types: vec![TypeDecl::Record(RecordType {
                name: sym("pair"),
                fields: vec![
                    RecordField {
                        name: sym("x"),
                        type_name: sym("number"),
                    },
                    RecordField {
                        name: sym("y"),
                        type_name: sym("number"),
                    },
                ],
                span: span(),
            })],
            relations: vec![relation("p", vec![attribute("r", "pair")])],
            clauses: vec![rule(
                atom(vec![head_var.clone()], "p"),
                vec![eq(b.variable("R", span()), record)],
            )],
            ..Program::default()
        };
        let env = TypeEnvironment::from_program(&program);
        let lattice = TypeLattice::from_environment(&env);
        let solver = TypeSolver::solve(&program, &lattice, &program.clauses[0]);

        let pair = lattice.analysis_type(sym("pair")).unwrap();
        assert_eq!(solver.type_of(&record_clone), pair);
        assert_eq!(solver.type_of(&head_var), pair);
    }

    #[test]
    fn test_disjoint_attribute_types_descend_to_bottom_primitive() {
        // p(X) :- q(X), r(X).  with q(x : a), r(x : b), disjoint bases
        let mut b = AstBuilder::new();
        let head_var = b.variable("X", span());
        let program = Program {
            types: vec![
                TypeDecl::Primitive(PrimitiveType {
                    name: sym("a"),
                    kind: PrimitiveKind::Number,
                    span: span(),
                }),
                TypeDecl::Primitive(PrimitiveType {
                    name: sym("b"),
                    kind: PrimitiveKind::Number,
                    span: span(),
                }),
            ],
            relations: vec![
                relation("p", vec![attribute("x", "number")]),
                relation("q", vec![attribute("x", "a")]),
                relation("r", vec![attribute("x", "b")]),
            ],
            clauses: vec![rule(
                atom(vec![head_var.clone()], "p"),
                vec![
                    Literal::Atom(atom(vec![b.variable("X", span())], "q")),
                    Literal::Atom(atom(vec![b.variable("X", span())], "r")),
                ],
            )],
            ..Program::default()
        };
        let env = TypeEnvironment::from_program(&program);
        let lattice = TypeLattice::from_environment(&env);
        let solver = TypeSolver::solve(&program, &lattice, &program.clauses[0]);

        assert_eq!(
            solver.type_of(&head_var),
            AnalysisType::bottom_primitive(Kind::Number)
        );
    }

    #[test]
    fn test_solving_is_idempotent() {
        // running the solver twice yields the same assignment
        let mut b = AstBuilder::new();
        let head_var = b.variable("X", span());
        let program = Program {
            relations: vec![
                relation("p", vec![attribute("x", "number")]),
                relation("q", vec![attribute("x", "number")]),
            ],
            clauses: vec![rule(
                atom(vec![head_var.clone()], "p"),
                vec![Literal::Atom(atom(vec![b.variable("X", span())], "q"))],
            )],
            ..Program::default()
        };
        let env = TypeEnvironment::from_program(&program);
        let lattice = TypeLattice::from_environment(&env);
        let first = TypeSolver::solve(&program, &lattice, &program.clauses[0]);
        let second = TypeSolver::solve(&program, &lattice, &program.clauses[0]);
        assert_eq!(first.type_of(&head_var), second.type_of(&head_var));
    }
}
