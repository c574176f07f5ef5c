//! Syntax tree consumed by the Lumen type checker.
//!
//! The tree is produced by an external parser and handed over as data, so
//! every type here is plain, owned and `serde` (de)serializable. Each node
//! that the checker can report on or cache a type for carries a stable
//! [`NodeId`] assigned by the parser (or by [`Builder`] in tools and tests).

pub mod builder;
pub mod expr;
pub mod pattern;
pub mod stmt;
pub mod types;

use std::fmt;

use lumen_common::Span;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub use builder::Builder;
pub use expr::*;
pub use pattern::{Pattern, PatternKind, StructPatternField};
pub use stmt::*;
pub use types::{GenericParam, TypeExpr, TypeExprKind, WhereClause};

/// Stable identity of a syntax node, unique within one [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A name occurrence in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub name: String,
}

/// One parsed source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub package: Option<PackageDecl>,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub body: Vec<Stmt>,
    /// Source file this module was parsed from.
    #[serde(default)]
    pub path: Option<String>,
    /// Per-node source paths for nodes spliced in from other files.
    #[serde(default)]
    pub origins: FxHashMap<NodeId, String>,
}

impl Module {
    /// Source path of `node`, falling back to the module's own path.
    pub fn origin_of(&self, node: NodeId) -> Option<&str> {
        self.origins
            .get(&node)
            .map(String::as_str)
            .or(self.path.as_deref())
    }

    /// The declared package name, or `None` for an anonymous module.
    pub fn package_name(&self) -> Option<String> {
        self.package.as_ref().map(PackageDecl::name)
    }
}

/// A whole program: modules in any order, grouped by package when checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub modules: Vec<Module>,
}
