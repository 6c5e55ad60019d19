//! Analysis types and the lattice operations over them
//!
//! # Lattice shape
//!
//! ```text
//!                     Top
//!        ┌────────────┼────────────┐
//!   number kind   symbol kind  record kind      (TopPrimitive)
//!        │  declared unions and bases  │
//!        │      Constant(kind)         │
//!        └── BottomPrimitive(kind) ────┘
//!                    Bottom
//! ```
//!
//! Analysis types are interned, so equality is cheap and every value has a
//! single canonical representative. Union members are flattened to the set
//! of base names they cover, which turns subtype tests into set inclusion.

use internment::Intern;
use std::collections::HashMap;
use std::fmt;

use datalog_ast::{Symbol, TypeDecl};

use crate::TypeEnvironment;

/// Coarse classification every inner analysis type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Symbol,
    Number,
    Record,
}

impl Kind {
    fn lower(self) -> &'static str {
        match self {
            Kind::Symbol => "symbol",
            Kind::Number => "number",
            Kind::Record => "record",
        }
    }

    fn primitive_name(self) -> Option<&'static str> {
        match self {
            Kind::Symbol => Some("symbol"),
            Kind::Number => Some("number"),
            Kind::Record => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Symbol => write!(f, "SYMBOL"),
            Kind::Number => write!(f, "NUMBER"),
            Kind::Record => write!(f, "RECORD"),
        }
    }
}

/// One element of the type lattice
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnalysisType {
    /// Accepts anything
    Top,
    /// Empty; a contradiction between kinds
    Bottom,
    /// The universe of one primitive kind
    TopPrimitive(Kind),
    /// A contradiction within one kind
    BottomPrimitive(Kind),
    /// The sublattice element inhabited only by literal constants
    Constant(Kind),
    /// A user-declared leaf type
    Base { name: Symbol, kind: Kind },
    /// A user-declared union, flattened to the base names it covers
    Union {
        name: Symbol,
        kind: Kind,
        members: Vec<Symbol>,
    },
    /// A user-declared record type; elements are field type names
    Record { name: Symbol, elements: Vec<Symbol> },
}

/// Interned analysis type
pub type AType = Intern<AnalysisType>;

impl AnalysisType {
    pub fn intern(self) -> AType {
        Intern::new(self)
    }

    pub fn top() -> AType {
        AnalysisType::Top.intern()
    }

    pub fn bottom() -> AType {
        AnalysisType::Bottom.intern()
    }

    pub fn top_primitive(kind: Kind) -> AType {
        AnalysisType::TopPrimitive(kind).intern()
    }

    pub fn bottom_primitive(kind: Kind) -> AType {
        AnalysisType::BottomPrimitive(kind).intern()
    }

    pub fn constant(kind: Kind) -> AType {
        AnalysisType::Constant(kind).intern()
    }

    /// The kind of an inner type; `Top` and `Bottom` have none
    pub fn kind(&self) -> Option<Kind> {
        match self {
            AnalysisType::Top | AnalysisType::Bottom => None,
            AnalysisType::TopPrimitive(k)
            | AnalysisType::BottomPrimitive(k)
            | AnalysisType::Constant(k) => Some(*k),
            AnalysisType::Base { kind, .. } | AnalysisType::Union { kind, .. } => Some(*kind),
            AnalysisType::Record { .. } => Some(Kind::Record),
        }
    }

    /// A valid type can be given to a grounded argument; the tops of the
    /// lattice are not informative enough and the bottoms are contradictions
    pub fn is_valid(&self) -> bool {
        !matches!(
            self,
            AnalysisType::Top | AnalysisType::Bottom | AnalysisType::BottomPrimitive(_)
        )
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisType::Top => write!(f, "any"),
            AnalysisType::Bottom => write!(f, "none"),
            AnalysisType::TopPrimitive(k) => write!(f, "{}", k.lower()),
            AnalysisType::BottomPrimitive(k) => write!(f, "empty {}", k.lower()),
            AnalysisType::Constant(k) => write!(f, "{} constant", k.lower()),
            AnalysisType::Base { name, .. }
            | AnalysisType::Union { name, .. }
            | AnalysisType::Record { name, .. } => write!(f, "{}", name),
        }
    }
}

/// The lattice of one program's declared types
#[derive(Debug, Clone)]
pub struct TypeLattice {
    by_name: HashMap<Symbol, AType>,
    unions: Vec<AType>,
    valid: bool,
}

impl TypeLattice {
    pub fn from_environment(env: &TypeEnvironment) -> Self {
        let mut lattice = TypeLattice {
            by_name: HashMap::new(),
            unions: Vec::new(),
            valid: true,
        };

        for decl in env.decls() {
            match decl {
                TypeDecl::Primitive(primitive) => {
                    let kind = match primitive.kind {
                        datalog_ast::PrimitiveKind::Symbol => Kind::Symbol,
                        datalog_ast::PrimitiveKind::Number => Kind::Number,
                    };
                    lattice.by_name.insert(
                        primitive.name,
                        AnalysisType::Base {
                            name: primitive.name,
                            kind,
                        }
                        .intern(),
                    );
                }
                TypeDecl::Union(union) => {
                    let mut visiting = Vec::new();
                    match flatten_union(env, union.name, &mut visiting) {
                        Some((kind, mut members)) => {
                            members.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
                            members.dedup();
                            let ty = AnalysisType::Union {
                                name: union.name,
                                kind,
                                members,
                            }
                            .intern();
                            lattice.by_name.insert(union.name, ty);
                            lattice.unions.push(ty);
                        }
                        None => lattice.valid = false,
                    }
                }
                TypeDecl::Record(record) => {
                    let elements: Vec<Symbol> =
                        record.fields.iter().map(|field| field.type_name).collect();
                    if elements.iter().any(|&name| !env.is_type(name)) {
                        lattice.valid = false;
                    }
                    lattice.by_name.insert(
                        record.name,
                        AnalysisType::Record {
                            name: record.name,
                            elements,
                        }
                        .intern(),
                    );
                }
            }
        }

        // deterministic join/meet tie-breaking
        lattice.unions.sort_by(|a, b| {
            (union_len(*a), a.to_string()).cmp(&(union_len(*b), b.to_string()))
        });

        lattice
    }

    /// Whether the type environment produced a usable lattice
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Canonical analysis type of a type name; the primitives map to the
    /// top of their kind
    pub fn analysis_type(&self, name: Symbol) -> Option<AType> {
        match name.as_ref().as_str() {
            "number" => Some(AnalysisType::top_primitive(Kind::Number)),
            "symbol" => Some(AnalysisType::top_primitive(Kind::Symbol)),
            _ => self.by_name.get(&name).copied(),
        }
    }

    /// Reflexive, transitive subtype relation of the lattice
    pub fn is_subtype(&self, a: AType, b: AType) -> bool {
        use AnalysisType::*;

        if a == b {
            return true;
        }
        match (&*a, &*b) {
            (Bottom, _) | (_, Top) => true,
            (Top, _) | (_, Bottom) => false,
            (x, y) => {
                let (Some(ka), Some(kb)) = (x.kind(), y.kind()) else {
                    return false;
                };
                if ka != kb {
                    return false;
                }
                match (x, y) {
                    (BottomPrimitive(_), _) => true,
                    (_, BottomPrimitive(_)) => false,
                    (_, TopPrimitive(_)) => true,
                    (TopPrimitive(_), Union { members, .. }) => ka
                        .primitive_name()
                        .is_some_and(|p| members.iter().any(|m| m.as_ref() == p)),
                    (TopPrimitive(_), _) => false,
                    (Constant(_), _) => true,
                    (_, Constant(_)) => false,
                    (Base { name, .. }, Union { members, .. }) => members.contains(name),
                    (Union { members: ma, .. }, Union { members: mb, .. }) => {
                        ma.iter().all(|m| mb.contains(m))
                    }
                    (Union { members, .. }, Base { name, .. }) => {
                        members.iter().all(|m| m == name)
                    }
                    _ => false,
                }
            }
        }
    }

    /// Least upper bound. Incomparable same-kind types join at the smallest
    /// declared union covering both, or at the top of their kind.
    pub fn join(&self, a: AType, b: AType) -> AType {
        if self.is_subtype(a, b) {
            return b;
        }
        if self.is_subtype(b, a) {
            return a;
        }

        let (Some(ka), Some(kb)) = (a.kind(), b.kind()) else {
            return AnalysisType::top();
        };
        if ka != kb {
            return AnalysisType::top();
        }
        if ka == Kind::Record {
            return AnalysisType::top_primitive(Kind::Record);
        }

        let mut best: Option<AType> = None;
        for &union in &self.unions {
            if union.kind() == Some(ka) && self.is_subtype(a, union) && self.is_subtype(b, union) {
                let smaller = match best {
                    Some(current) => union_len(union) < union_len(current),
                    None => true,
                };
                if smaller {
                    best = Some(union);
                }
            }
        }
        best.unwrap_or_else(|| AnalysisType::top_primitive(ka))
    }

    /// Greatest lower bound. Two types of different kinds meet at `Bottom`;
    /// same-kind types with no common declared content meet at the bottom
    /// of their kind.
    pub fn meet(&self, a: AType, b: AType) -> AType {
        if self.is_subtype(a, b) {
            return a;
        }
        if self.is_subtype(b, a) {
            return b;
        }

        let (Some(ka), Some(kb)) = (a.kind(), b.kind()) else {
            return AnalysisType::bottom();
        };
        if ka != kb {
            return AnalysisType::bottom();
        }
        if ka == Kind::Record {
            // distinct record types share only nil
            return AnalysisType::bottom_primitive(Kind::Record);
        }

        let intersection: Vec<Symbol> = match (members_of(&a), members_of(&b)) {
            (Some(ma), Some(mb)) => ma.iter().filter(|m| mb.contains(*m)).copied().collect(),
            _ => Vec::new(),
        };
        if intersection.is_empty() {
            return AnalysisType::bottom_primitive(ka);
        }

        // a declared union matching the intersection exactly
        for &union in &self.unions {
            if let AnalysisType::Union { members, .. } = &*union {
                if union.kind() == Some(ka) && *members == intersection {
                    return union;
                }
            }
        }
        if intersection.len() == 1 {
            if let Some(base) = self.by_name.get(&intersection[0]) {
                return *base;
            }
        }
        // largest declared union inside the intersection
        let mut best: Option<AType> = None;
        for &union in &self.unions {
            if let AnalysisType::Union { members, .. } = &*union {
                if union.kind() == Some(ka)
                    && members.iter().all(|m| intersection.contains(m))
                {
                    let larger = match best {
                        Some(current) => union_len(union) > union_len(current),
                        None => true,
                    };
                    if larger {
                        best = Some(union);
                    }
                }
            }
        }
        best.unwrap_or_else(|| AnalysisType::bottom_primitive(ka))
    }
}

fn union_len(ty: AType) -> usize {
    match &*ty {
        AnalysisType::Union { members, .. } => members.len(),
        _ => 0,
    }
}

fn members_of(ty: &AnalysisType) -> Option<Vec<Symbol>> {
    match ty {
        AnalysisType::Base { name, .. } => Some(vec![*name]),
        AnalysisType::Union { members, .. } => Some(members.clone()),
        _ => None,
    }
}

/// Flatten a union declaration to its kind and covered base names.
/// `None` marks a malformed union: an undefined or non-primitive member, a
/// mix of kinds, or a cyclic definition.
fn flatten_union(
    env: &TypeEnvironment,
    name: Symbol,
    visiting: &mut Vec<Symbol>,
) -> Option<(Kind, Vec<Symbol>)> {
    if visiting.contains(&name) {
        return None;
    }
    visiting.push(name);

    let result = (|| {
        let Some(TypeDecl::Union(union)) = env.decl(name) else {
            return None;
        };
        let mut kind: Option<Kind> = None;
        let mut members: Vec<Symbol> = Vec::new();
        for &member in &union.members {
            let (member_kind, mut covered) = match member.as_ref().as_str() {
                "number" => (Kind::Number, vec![member]),
                "symbol" => (Kind::Symbol, vec![member]),
                _ => match env.decl(member) {
                    Some(TypeDecl::Primitive(primitive)) => {
                        let k = match primitive.kind {
                            datalog_ast::PrimitiveKind::Symbol => Kind::Symbol,
                            datalog_ast::PrimitiveKind::Number => Kind::Number,
                        };
                        (k, vec![member])
                    }
                    Some(TypeDecl::Union(_)) => flatten_union(env, member, visiting)?,
                    _ => return None,
                },
            };
            match kind {
                Some(k) if k != member_kind => return None,
                _ => kind = Some(member_kind),
            }
            members.append(&mut covered);
        }
        kind.map(|k| (k, members))
    })();

    visiting.pop();
    result
}
