//! Type expressions, generic parameters and where-clauses.

use lumen_common::Span;
use serde::{Deserialize, Serialize};

use crate::{Ident, NodeId};

/// A type as written in source: `i32`, `Array T`, `(i32) -> bool`, `T?`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeExpr {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub kind: TypeExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExprKind {
    /// A bare name: `i32`, `Point`, `T`, `pkg.Type`.
    Simple(String),
    /// A generic application: `Array i32`, `Map K V`.
    Generic {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
    /// `(A, B) -> R`
    Function {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
    },
    /// `T?`
    Nullable(Box<TypeExpr>),
    /// `!T`, a value or an error.
    Result(Box<TypeExpr>),
    /// `A | B | C`
    Union(Vec<TypeExpr>),
    /// `_`
    Wildcard,
}

impl TypeExpr {
    /// The name of a `Simple` type expression.
    pub fn simple_name(&self) -> Option<&str> {
        match &self.kind {
            TypeExprKind::Simple(name) => Some(name),
            _ => None,
        }
    }

    /// The base name of a `Simple` or `Generic` type expression.
    pub fn base_name(&self) -> Option<&str> {
        match &self.kind {
            TypeExprKind::Simple(name) => Some(name),
            TypeExprKind::Generic { base, .. } => base.base_name(),
            _ => None,
        }
    }

    /// Visit every simple name in the expression, outermost first.
    pub fn for_each_name(&self, f: &mut dyn FnMut(&str, &TypeExpr)) {
        match &self.kind {
            TypeExprKind::Simple(name) => f(name, self),
            TypeExprKind::Generic { base, args } => {
                base.for_each_name(f);
                for arg in args {
                    arg.for_each_name(f);
                }
            }
            TypeExprKind::Function { params, ret } => {
                for param in params {
                    param.for_each_name(f);
                }
                ret.for_each_name(f);
            }
            TypeExprKind::Nullable(inner) | TypeExprKind::Result(inner) => inner.for_each_name(f),
            TypeExprKind::Union(members) => {
                for member in members {
                    member.for_each_name(f);
                }
            }
            TypeExprKind::Wildcard => {}
        }
    }
}

/// A declared generic parameter with optional interface bounds: `T: Display + Clone`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericParam {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub name: Ident,
    #[serde(default)]
    pub constraints: Vec<TypeExpr>,
}

/// `where T: Display, U: Ord`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    /// The constrained type, usually a bare type parameter name.
    pub subject: TypeExpr,
    pub constraints: Vec<TypeExpr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(id: u32, name: &str) -> TypeExpr {
        TypeExpr {
            id: NodeId(id),
            span: Span::default(),
            kind: TypeExprKind::Simple(name.to_string()),
        }
    }

    #[test]
    fn base_name_of_generic() {
        let ty = TypeExpr {
            id: NodeId(3),
            span: Span::default(),
            kind: TypeExprKind::Generic {
                base: Box::new(simple(1, "Array")),
                args: vec![simple(2, "T")],
            },
        };
        assert_eq!(ty.base_name(), Some("Array"));
        assert_eq!(ty.simple_name(), None);

        let mut names = Vec::new();
        ty.for_each_name(&mut |name, _| names.push(name.to_string()));
        assert_eq!(names, vec!["Array", "T"]);
    }
}
