//! Construction API for argument nodes
//!
//! Arguments carry a unique [`ArgId`]; the builder is the id allocator. A
//! parser front-end keeps one builder per program so ids never collide;
//! analysis passes that synthesize temporary clauses use a fresh builder,
//! since their result maps are scoped to the synthetic clause.

use crate::ast::*;
use crate::{AstDomain, Span};

#[derive(Debug, Default)]
pub struct AstBuilder {
    next: u32,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh_id(&mut self) -> ArgId {
        let id = ArgId(self.next);
        self.next += 1;
        id
    }

    fn arg(&mut self, kind: ArgKind, span: Span) -> Argument {
        Argument {
            id: self.fresh_id(),
            span,
            kind,
        }
    }

    pub fn variable(&mut self, name: &str, span: Span) -> Argument {
        self.arg(ArgKind::Variable(Symbol::new(name.to_string())), span)
    }

    pub fn unnamed(&mut self, span: Span) -> Argument {
        self.arg(ArgKind::Unnamed, span)
    }

    pub fn number(&mut self, value: AstDomain, span: Span) -> Argument {
        self.arg(ArgKind::Number(value), span)
    }

    pub fn text(&mut self, value: &str, span: Span) -> Argument {
        self.arg(ArgKind::Text(Symbol::new(value.to_string())), span)
    }

    pub fn nil(&mut self, span: Span) -> Argument {
        self.arg(ArgKind::Nil, span)
    }

    pub fn counter(&mut self, span: Span) -> Argument {
        self.arg(ArgKind::Counter, span)
    }

    pub fn cast(&mut self, value: Argument, type_name: &str, span: Span) -> Argument {
        self.arg(
            ArgKind::Cast {
                type_name: Symbol::new(type_name.to_string()),
                value: Box::new(value),
            },
            span,
        )
    }

    pub fn intrinsic(&mut self, op: FunctorOp, args: Vec<Argument>, span: Span) -> Argument {
        self.arg(ArgKind::Intrinsic { op, args }, span)
    }

    pub fn user_functor(&mut self, name: &str, args: Vec<Argument>, span: Span) -> Argument {
        self.arg(
            ArgKind::UserFunctor {
                name: Symbol::new(name.to_string()),
                args,
            },
            span,
        )
    }

    pub fn record(&mut self, type_name: &str, args: Vec<Argument>, span: Span) -> Argument {
        self.arg(
            ArgKind::Record {
                type_name: Symbol::new(type_name.to_string()),
                args,
            },
            span,
        )
    }

    pub fn aggregate(
        &mut self,
        op: AggregateOp,
        target: Option<Argument>,
        body: Vec<Literal>,
        span: Span,
    ) -> Argument {
        self.arg(
            ArgKind::Aggregate(Box::new(Aggregate { op, target, body })),
            span,
        )
    }
}
