//! Statements and declarations.

use lumen_common::Span;
use serde::{Deserialize, Serialize};

use crate::expr::{Block, Expr, FunctionParam};
use crate::types::{GenericParam, TypeExpr, WhereClause};
use crate::{Ident, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    Expr(Expr),
    Struct(StructDef),
    Union(UnionDef),
    Interface(InterfaceDef),
    Alias(AliasDef),
    Function(FunctionDef),
    Impl(ImplDef),
    Methods(MethodsDef),
    Extern(ExternFn),
    /// Host-language code prepended to the generated program.
    Prelude {
        target: HostTarget,
        code: String,
    },
    Return(Option<Expr>),
    Break {
        label: Option<Ident>,
        value: Option<Expr>,
    },
    Continue {
        label: Option<Ident>,
    },
    Raise(Expr),
    Rethrow,
    /// `gen.yield(value)` inside an iterator literal.
    Yield(Option<Expr>),
    DynImport(Import),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructKind {
    Singleton,
    Named,
    Positional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    /// `None` for positional fields.
    pub name: Option<Ident>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: Ident,
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    pub fields: Vec<StructField>,
    #[serde(default)]
    pub where_clause: Vec<WhereClause>,
    pub kind: StructKind,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionDef {
    pub name: Ident,
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    pub variants: Vec<TypeExpr>,
    #[serde(default)]
    pub where_clause: Vec<WhereClause>,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasDef {
    pub name: Ident,
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    pub target: TypeExpr,
    #[serde(default)]
    pub where_clause: Vec<WhereClause>,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub name: Ident,
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    pub params: Vec<FunctionParam>,
    pub ret: Option<TypeExpr>,
    pub body: Block,
    #[serde(default)]
    pub where_clause: Vec<WhereClause>,
    /// `fn #name()`: an implicit `self` receiver inside a methods block.
    #[serde(default)]
    pub method_shorthand: bool,
    #[serde(default)]
    pub private: bool,
}

/// A method signature inside an interface, optionally with a default body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSig {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub name: Ident,
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    pub params: Vec<FunctionParam>,
    pub ret: Option<TypeExpr>,
    #[serde(default)]
    pub where_clause: Vec<WhereClause>,
    pub default_body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDef {
    pub name: Ident,
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    /// `for T _`: restricts which shapes of type may implement the interface.
    pub self_pattern: Option<TypeExpr>,
    pub signatures: Vec<FunctionSig>,
    #[serde(default)]
    pub where_clause: Vec<WhereClause>,
    #[serde(default)]
    pub base_interfaces: Vec<TypeExpr>,
    #[serde(default)]
    pub private: bool,
}

/// `impl [Name =] Interface Args for Target { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplDef {
    /// Named implementations are only used when selected explicitly.
    pub impl_name: Option<Ident>,
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    pub interface: Option<Ident>,
    #[serde(default)]
    pub interface_args: Vec<TypeExpr>,
    pub target: TypeExpr,
    pub definitions: Vec<FunctionDef>,
    #[serde(default)]
    pub where_clause: Vec<WhereClause>,
    #[serde(default)]
    pub private: bool,
}

/// `methods Target { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodsDef {
    pub target: TypeExpr,
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    pub definitions: Vec<FunctionDef>,
    #[serde(default)]
    pub where_clause: Vec<WhereClause>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostTarget {
    Go,
    Crystal,
    TypeScript,
    Python,
    Ruby,
}

/// `extern go fn name(...) -> T { host code }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternFn {
    pub target: HostTarget,
    pub signature: FunctionDef,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSelector {
    pub name: Ident,
    pub alias: Option<Ident>,
}

/// `import a.b`, `import a.b.{x, y::z}`, `import a.b.*`, `import a.b::alias`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub path: Vec<Ident>,
    #[serde(default)]
    pub wildcard: bool,
    #[serde(default)]
    pub selectors: Vec<ImportSelector>,
    pub alias: Option<Ident>,
}

impl Import {
    /// Dotted package name, e.g. `"geometry.shapes"`.
    pub fn package_name(&self) -> String {
        self.path
            .iter()
            .map(|segment| segment.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDecl {
    pub path: Vec<Ident>,
    #[serde(default)]
    pub private: bool,
}

impl PackageDecl {
    pub fn name(&self) -> String {
        self.path
            .iter()
            .map(|segment| segment.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Stmt {
    /// The expression of an expression statement.
    pub fn as_expr(&self) -> Option<&Expr> {
        match &self.kind {
            StmtKind::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    /// The declared name for declaration statements.
    pub fn declared_name(&self) -> Option<&Ident> {
        match &self.kind {
            StmtKind::Struct(def) => Some(&def.name),
            StmtKind::Union(def) => Some(&def.name),
            StmtKind::Interface(def) => Some(&def.name),
            StmtKind::Alias(def) => Some(&def.name),
            StmtKind::Function(def) => Some(&def.name),
            StmtKind::Extern(ext) => Some(&ext.signature.name),
            _ => None,
        }
    }
}
