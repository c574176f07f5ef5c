//! Expression nodes.
//!
//! Control-flow constructs (`if`, `match`, loops, `rescue`) are expressions
//! and carry types; statements that only transfer control live in
//! [`crate::stmt`].

use std::fmt;

use lumen_common::Span;
use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;
use crate::stmt::Stmt;
use crate::types::{GenericParam, TypeExpr, WhereClause};
use crate::{Ident, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Identifier(String),
    Literal(Literal),
    /// `[a, b, c]`
    Array(Vec<Expr>),
    /// `#{ k: v, ...other }`
    Map(Vec<MapElement>),
    StructLiteral(StructLiteral),
    /// `` `x = ${x}` ``
    Interpolation(Vec<Expr>),
    /// `a..b` / `a...b`
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
        inclusive: bool,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assignment {
        op: AssignOp,
        target: Box<AssignTarget>,
        value: Box<Expr>,
    },
    /// `expr as T`
    Cast {
        expr: Box<Expr>,
        ty: TypeExpr,
    },
    Call(Call),
    /// `object.member` / `object?.member`
    Member {
        object: Box<Expr>,
        member: MemberName,
        #[serde(default)]
        safe: bool,
    },
    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// `#member`, a member of the enclosing method's receiver.
    ImplicitMember(Ident),
    /// `@` / `@2`
    Placeholder(Option<u32>),
    /// `%`, the value flowing through a pipeline.
    Topic,
    Block(Block),
    Lambda(Lambda),
    /// `Iterator { gen => ... gen.yield(x) }`
    Iterator {
        body: Vec<Stmt>,
        binding: Option<Ident>,
        element_type: Option<TypeExpr>,
    },
    If {
        condition: Box<Expr>,
        then: Block,
        #[serde(default)]
        or_clauses: Vec<OrClause>,
    },
    Match {
        subject: Box<Expr>,
        clauses: Vec<MatchClause>,
    },
    While {
        condition: Box<Expr>,
        body: Block,
    },
    For {
        pattern: Pattern,
        iterable: Box<Expr>,
        body: Block,
    },
    Loop {
        body: Block,
    },
    /// `breakpoint 'label { ... }`
    Breakpoint {
        label: Ident,
        body: Block,
    },
    Proc(Box<Expr>),
    Spawn(Box<Expr>),
    Await(Box<Expr>),
    /// `expr!`
    Propagate(Box<Expr>),
    /// `expr or { err => ... }`
    OrElse {
        expr: Box<Expr>,
        handler: Block,
        binding: Option<Ident>,
    },
    Rescue {
        monitored: Box<Expr>,
        clauses: Vec<MatchClause>,
    },
    Ensure {
        expr: Box<Expr>,
        ensure: Block,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Decimal digits with an optional leading `-`; the width is unbounded.
    Integer {
        value: String,
        suffix: Option<IntegerSuffix>,
    },
    Float {
        value: f64,
        suffix: Option<FloatSuffix>,
    },
    String(String),
    Bool(bool),
    Char(char),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegerSuffix {
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
}

impl IntegerSuffix {
    pub const ALL: [IntegerSuffix; 12] = [
        IntegerSuffix::I8,
        IntegerSuffix::I16,
        IntegerSuffix::I32,
        IntegerSuffix::I64,
        IntegerSuffix::I128,
        IntegerSuffix::Isize,
        IntegerSuffix::U8,
        IntegerSuffix::U16,
        IntegerSuffix::U32,
        IntegerSuffix::U64,
        IntegerSuffix::U128,
        IntegerSuffix::Usize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IntegerSuffix::I8 => "i8",
            IntegerSuffix::I16 => "i16",
            IntegerSuffix::I32 => "i32",
            IntegerSuffix::I64 => "i64",
            IntegerSuffix::I128 => "i128",
            IntegerSuffix::Isize => "isize",
            IntegerSuffix::U8 => "u8",
            IntegerSuffix::U16 => "u16",
            IntegerSuffix::U32 => "u32",
            IntegerSuffix::U64 => "u64",
            IntegerSuffix::U128 => "u128",
            IntegerSuffix::Usize => "usize",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for IntegerSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatSuffix {
    F32,
    F64,
}

impl FloatSuffix {
    pub fn as_str(self) -> &'static str {
        match self {
            FloatSuffix::F32 => "f32",
            FloatSuffix::F64 => "f64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "f32" => Some(FloatSuffix::F32),
            "f64" => Some(FloatSuffix::F64),
            _ => None,
        }
    }
}

impl fmt::Display for FloatSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Negate,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitNot,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "^")]
    Pow,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "//")]
    FloorDiv,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "/%")]
    DivMod,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = ".&")]
    BitAnd,
    #[serde(rename = ".|")]
    BitOr,
    #[serde(rename = ".^")]
    BitXor,
    #[serde(rename = ".<<")]
    Shl,
    #[serde(rename = ".>>")]
    Shr,
    #[serde(rename = "|>")]
    Pipe,
    #[serde(rename = "|>>")]
    PipeForward,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Pow => "^",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::DivMod => "/%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => ".&",
            BinaryOp::BitOr => ".|",
            BinaryOp::BitXor => ".^",
            BinaryOp::Shl => ".<<",
            BinaryOp::Shr => ".>>",
            BinaryOp::Pipe => "|>",
            BinaryOp::PipeForward => "|>>",
        }
    }

    pub fn is_pipe(self) -> bool {
        matches!(self, BinaryOp::Pipe | BinaryOp::PipeForward)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    #[serde(rename = ":=")]
    Declare,
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    Add,
    #[serde(rename = "-=")]
    Sub,
    #[serde(rename = "*=")]
    Mul,
    #[serde(rename = "/=")]
    Div,
    #[serde(rename = "%=")]
    Mod,
    #[serde(rename = ".&=")]
    BitAnd,
    #[serde(rename = ".|=")]
    BitOr,
    #[serde(rename = ".^=")]
    BitXor,
    #[serde(rename = ".<<=")]
    Shl,
    #[serde(rename = ".>>=")]
    Shr,
}

impl AssignOp {
    /// The binary operator a compound assignment applies.
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            AssignOp::Declare | AssignOp::Assign => return None,
            AssignOp::Add => BinaryOp::Add,
            AssignOp::Sub => BinaryOp::Sub,
            AssignOp::Mul => BinaryOp::Mul,
            AssignOp::Div => BinaryOp::Div,
            AssignOp::Mod => BinaryOp::Mod,
            AssignOp::BitAnd => BinaryOp::BitAnd,
            AssignOp::BitOr => BinaryOp::BitOr,
            AssignOp::BitXor => BinaryOp::BitXor,
            AssignOp::Shl => BinaryOp::Shl,
            AssignOp::Shr => BinaryOp::Shr,
        })
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignOp::Declare => f.write_str(":="),
            AssignOp::Assign => f.write_str("="),
            other => match other.binary_op() {
                Some(op) => write!(f, "{op}="),
                None => Ok(()),
            },
        }
    }
}

/// Left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignTarget {
    /// A destructuring or identifier pattern.
    Pattern(Pattern),
    /// A member, index or implicit-member expression.
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapElement {
    Entry { key: Expr, value: Expr },
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructLiteral {
    /// `None` for an anonymous literal whose struct is taken from context.
    pub name: Option<Ident>,
    pub fields: Vec<FieldInit>,
    #[serde(default)]
    pub positional: bool,
    /// `Point { ...base, x: 1 }`
    #[serde(default)]
    pub update_sources: Vec<Expr>,
    #[serde(default)]
    pub type_args: Vec<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInit {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub name: Option<Ident>,
    pub value: Expr,
    #[serde(default)]
    pub shorthand: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    #[serde(default)]
    pub type_args: Vec<TypeExpr>,
    #[serde(default)]
    pub trailing_lambda: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MemberName {
    Named(Ident),
    /// `pair.0`
    Positional(u32),
}

impl fmt::Display for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberName::Named(ident) => f.write_str(&ident.name),
            MemberName::Positional(index) => write!(f, "{index}"),
        }
    }
}

/// A `{ ... }` block. Its value is the value of its last expression statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    #[serde(default)]
    pub generics: Vec<GenericParam>,
    pub params: Vec<FunctionParam>,
    pub ret: Option<TypeExpr>,
    pub body: Box<Expr>,
    #[serde(default)]
    pub where_clause: Vec<WhereClause>,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParam {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub pattern: Pattern,
    pub ty: Option<TypeExpr>,
}

/// `or cond { ... }` / a trailing `or { ... }` else clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrClause {
    pub condition: Option<Expr>,
    pub body: Block,
}

/// A `case pattern if guard => body` arm of `match` or `rescue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchClause {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Expr,
}

impl Expr {
    /// The identifier name when this is a bare identifier.
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_integer_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(Literal::Integer { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_names_round_trip() {
        for suffix in IntegerSuffix::ALL {
            assert_eq!(IntegerSuffix::from_name(suffix.as_str()), Some(suffix));
        }
        assert_eq!(IntegerSuffix::from_name("i7"), None);
        assert_eq!(FloatSuffix::from_name("f64"), Some(FloatSuffix::F64));
    }

    #[test]
    fn compound_assignment_maps_to_binary() {
        assert_eq!(AssignOp::Add.binary_op(), Some(BinaryOp::Add));
        assert_eq!(AssignOp::Declare.binary_op(), None);
        assert_eq!(AssignOp::Shl.to_string(), ".<<=");
        assert_eq!(AssignOp::Declare.to_string(), ":=");
    }
}
