//! Programmatic tree construction.
//!
//! [`Builder`] hands out fresh [`NodeId`]s and stamps every node with the
//! current line so diagnostics built from synthesized trees still carry a
//! position. All methods take `&self`, which lets calls nest freely:
//!
//! ```
//! use lumen_ast::{BinaryOp, Builder};
//!
//! let b = Builder::new();
//! let sum = b.binary(BinaryOp::Add, b.int(1), b.float(2.0));
//! let module = b.module(vec![b.expr_stmt(sum)]);
//! assert_eq!(module.body.len(), 1);
//! ```

use std::cell::Cell;

use lumen_common::Span;

use crate::expr::*;
use crate::pattern::{Pattern, PatternKind, StructPatternField};
use crate::stmt::*;
use crate::types::{GenericParam, TypeExpr, TypeExprKind, WhereClause};
use crate::{Ident, Module, NodeId};

#[derive(Debug)]
pub struct Builder {
    next_id: Cell<u32>,
    line: Cell<u32>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! impl_into_stmt_kind {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for StmtKind {
            fn from(def: $ty) -> Self {
                StmtKind::$variant(def)
            }
        })*
    };
}

impl_into_stmt_kind! {
    StructDef => Struct,
    UnionDef => Union,
    InterfaceDef => Interface,
    AliasDef => Alias,
    FunctionDef => Function,
    ImplDef => Impl,
    MethodsDef => Methods,
    ExternFn => Extern,
    Expr => Expr,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            line: Cell::new(1),
        }
    }

    /// Continue numbering after ids already used by another tree.
    pub fn starting_at(first_id: u32) -> Self {
        Self {
            next_id: Cell::new(first_id),
            line: Cell::new(1),
        }
    }

    /// Nodes created after this call report `line` as their position.
    pub fn at_line(&self, line: u32) -> &Self {
        self.line.set(line);
        self
    }

    pub fn id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId(id)
    }

    fn span(&self) -> Span {
        Span::with_position(0, 0, self.line.get(), 1)
    }

    pub fn ident(&self, name: &str) -> Ident {
        Ident {
            id: self.id(),
            span: self.span(),
            name: name.to_string(),
        }
    }

    // ── Types ───────────────────────────────────────────────────────────

    pub fn type_expr(&self, kind: TypeExprKind) -> TypeExpr {
        TypeExpr {
            id: self.id(),
            span: self.span(),
            kind,
        }
    }

    pub fn ty(&self, name: &str) -> TypeExpr {
        self.type_expr(TypeExprKind::Simple(name.to_string()))
    }

    pub fn generic_ty(&self, base: &str, args: Vec<TypeExpr>) -> TypeExpr {
        let base = self.ty(base);
        self.type_expr(TypeExprKind::Generic {
            base: Box::new(base),
            args,
        })
    }

    pub fn fn_ty(&self, params: Vec<TypeExpr>, ret: TypeExpr) -> TypeExpr {
        self.type_expr(TypeExprKind::Function {
            params,
            ret: Box::new(ret),
        })
    }

    pub fn nullable_ty(&self, inner: TypeExpr) -> TypeExpr {
        self.type_expr(TypeExprKind::Nullable(Box::new(inner)))
    }

    pub fn result_ty(&self, inner: TypeExpr) -> TypeExpr {
        self.type_expr(TypeExprKind::Result(Box::new(inner)))
    }

    pub fn union_ty(&self, members: Vec<TypeExpr>) -> TypeExpr {
        self.type_expr(TypeExprKind::Union(members))
    }

    pub fn wildcard_ty(&self) -> TypeExpr {
        self.type_expr(TypeExprKind::Wildcard)
    }

    pub fn generic(&self, name: &str, constraints: Vec<TypeExpr>) -> GenericParam {
        GenericParam {
            id: self.id(),
            span: self.span(),
            name: self.ident(name),
            constraints,
        }
    }

    pub fn where_clause(&self, subject: &str, constraints: Vec<TypeExpr>) -> WhereClause {
        WhereClause {
            id: self.id(),
            span: self.span(),
            subject: self.ty(subject),
            constraints,
        }
    }

    // ── Expressions ─────────────────────────────────────────────────────

    pub fn expr(&self, kind: ExprKind) -> Expr {
        Expr {
            id: self.id(),
            span: self.span(),
            kind,
        }
    }

    pub fn var(&self, name: &str) -> Expr {
        self.expr(ExprKind::Identifier(name.to_string()))
    }

    pub fn int(&self, value: i128) -> Expr {
        self.int_literal(&value.to_string(), None)
    }

    pub fn int_suffixed(&self, value: i128, suffix: IntegerSuffix) -> Expr {
        self.int_literal(&value.to_string(), Some(suffix))
    }

    /// An integer literal from its decimal text, for values beyond `i128`.
    pub fn int_literal(&self, digits: &str, suffix: Option<IntegerSuffix>) -> Expr {
        self.expr(ExprKind::Literal(Literal::Integer {
            value: digits.to_string(),
            suffix,
        }))
    }

    pub fn float(&self, value: f64) -> Expr {
        self.expr(ExprKind::Literal(Literal::Float {
            value,
            suffix: None,
        }))
    }

    pub fn float_suffixed(&self, value: f64, suffix: FloatSuffix) -> Expr {
        self.expr(ExprKind::Literal(Literal::Float {
            value,
            suffix: Some(suffix),
        }))
    }

    pub fn string(&self, value: &str) -> Expr {
        self.expr(ExprKind::Literal(Literal::String(value.to_string())))
    }

    pub fn bool(&self, value: bool) -> Expr {
        self.expr(ExprKind::Literal(Literal::Bool(value)))
    }

    pub fn char(&self, value: char) -> Expr {
        self.expr(ExprKind::Literal(Literal::Char(value)))
    }

    pub fn nil(&self) -> Expr {
        self.expr(ExprKind::Literal(Literal::Nil))
    }

    pub fn array(&self, elements: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Array(elements))
    }

    pub fn map(&self, entries: Vec<(Expr, Expr)>) -> Expr {
        self.expr(ExprKind::Map(
            entries
                .into_iter()
                .map(|(key, value)| MapElement::Entry { key, value })
                .collect(),
        ))
    }

    pub fn unary(&self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn binary(&self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn cast(&self, expr: Expr, ty: TypeExpr) -> Expr {
        self.expr(ExprKind::Cast {
            expr: Box::new(expr),
            ty,
        })
    }

    pub fn call(&self, callee: Expr, args: Vec<Expr>) -> Expr {
        self.call_with_type_args(callee, args, Vec::new())
    }

    pub fn call_with_type_args(&self, callee: Expr, args: Vec<Expr>, type_args: Vec<TypeExpr>) -> Expr {
        self.expr(ExprKind::Call(Call {
            callee: Box::new(callee),
            args,
            type_args,
            trailing_lambda: false,
        }))
    }

    /// `name(args...)`
    pub fn call_named(&self, name: &str, args: Vec<Expr>) -> Expr {
        let callee = self.var(name);
        self.call(callee, args)
    }

    /// `object.name(args...)`
    pub fn method_call(&self, object: Expr, name: &str, args: Vec<Expr>) -> Expr {
        let callee = self.member(object, name);
        self.call(callee, args)
    }

    pub fn member(&self, object: Expr, name: &str) -> Expr {
        let member = MemberName::Named(self.ident(name));
        self.expr(ExprKind::Member {
            object: Box::new(object),
            member,
            safe: false,
        })
    }

    pub fn safe_member(&self, object: Expr, name: &str) -> Expr {
        let member = MemberName::Named(self.ident(name));
        self.expr(ExprKind::Member {
            object: Box::new(object),
            member,
            safe: true,
        })
    }

    pub fn positional_member(&self, object: Expr, index: u32) -> Expr {
        self.expr(ExprKind::Member {
            object: Box::new(object),
            member: MemberName::Positional(index),
            safe: false,
        })
    }

    pub fn index(&self, object: Expr, index: Expr) -> Expr {
        self.expr(ExprKind::Index {
            object: Box::new(object),
            index: Box::new(index),
        })
    }

    pub fn implicit_member(&self, name: &str) -> Expr {
        let ident = self.ident(name);
        self.expr(ExprKind::ImplicitMember(ident))
    }

    pub fn placeholder(&self, index: Option<u32>) -> Expr {
        self.expr(ExprKind::Placeholder(index))
    }

    pub fn topic(&self) -> Expr {
        self.expr(ExprKind::Topic)
    }

    pub fn interpolation(&self, parts: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Interpolation(parts))
    }

    pub fn range(&self, start: Expr, end: Expr, inclusive: bool) -> Expr {
        self.expr(ExprKind::Range {
            start: Box::new(start),
            end: Box::new(end),
            inclusive,
        })
    }

    pub fn field_init(&self, name: Option<&str>, value: Expr) -> FieldInit {
        FieldInit {
            id: self.id(),
            span: self.span(),
            name: name.map(|n| self.ident(n)),
            value,
            shorthand: false,
        }
    }

    /// `Name { field: value, ... }`
    pub fn struct_lit(&self, name: &str, fields: Vec<(&str, Expr)>) -> Expr {
        self.struct_lit_with_type_args(name, fields, Vec::new())
    }

    pub fn struct_lit_with_type_args(
        &self,
        name: &str,
        fields: Vec<(&str, Expr)>,
        type_args: Vec<TypeExpr>,
    ) -> Expr {
        let fields = fields
            .into_iter()
            .map(|(field, value)| self.field_init(Some(field), value))
            .collect();
        self.expr(ExprKind::StructLiteral(StructLiteral {
            name: Some(self.ident(name)),
            fields,
            positional: false,
            update_sources: Vec::new(),
            type_args,
        }))
    }

    /// `Name(value, ...)` for positional structs.
    pub fn positional_struct_lit(&self, name: &str, values: Vec<Expr>) -> Expr {
        let fields = values
            .into_iter()
            .map(|value| self.field_init(None, value))
            .collect();
        self.expr(ExprKind::StructLiteral(StructLiteral {
            name: Some(self.ident(name)),
            fields,
            positional: true,
            update_sources: Vec::new(),
            type_args: Vec::new(),
        }))
    }

    pub fn block(&self, body: Vec<Stmt>) -> Block {
        Block {
            id: self.id(),
            span: self.span(),
            body,
        }
    }

    pub fn block_expr(&self, body: Vec<Stmt>) -> Expr {
        let block = self.block(body);
        self.expr(ExprKind::Block(block))
    }

    pub fn param(&self, name: &str, ty: Option<TypeExpr>) -> FunctionParam {
        FunctionParam {
            id: self.id(),
            span: self.span(),
            pattern: self.pat_ident(name),
            ty,
        }
    }

    pub fn lambda(&self, params: Vec<FunctionParam>, ret: Option<TypeExpr>, body: Expr) -> Expr {
        self.expr(ExprKind::Lambda(Lambda {
            generics: Vec::new(),
            params,
            ret,
            body: Box::new(body),
            where_clause: Vec::new(),
            verbose: false,
        }))
    }

    pub fn iterator_lit(&self, binding: Option<&str>, element_type: Option<TypeExpr>, body: Vec<Stmt>) -> Expr {
        let binding = binding.map(|b| self.ident(b));
        self.expr(ExprKind::Iterator {
            body,
            binding,
            element_type,
        })
    }

    /// `if cond { then } or { otherwise }`
    pub fn if_else(&self, condition: Expr, then: Vec<Stmt>, otherwise: Option<Vec<Stmt>>) -> Expr {
        let then = self.block(then);
        let or_clauses = otherwise
            .map(|body| {
                vec![OrClause {
                    condition: None,
                    body: self.block(body),
                }]
            })
            .unwrap_or_default();
        self.expr(ExprKind::If {
            condition: Box::new(condition),
            then,
            or_clauses,
        })
    }

    pub fn while_loop(&self, condition: Expr, body: Vec<Stmt>) -> Expr {
        let body = self.block(body);
        self.expr(ExprKind::While {
            condition: Box::new(condition),
            body,
        })
    }

    pub fn for_loop(&self, pattern: Pattern, iterable: Expr, body: Vec<Stmt>) -> Expr {
        let body = self.block(body);
        self.expr(ExprKind::For {
            pattern,
            iterable: Box::new(iterable),
            body,
        })
    }

    pub fn loop_expr(&self, body: Vec<Stmt>) -> Expr {
        let body = self.block(body);
        self.expr(ExprKind::Loop { body })
    }

    pub fn breakpoint(&self, label: &str, body: Vec<Stmt>) -> Expr {
        let label = self.ident(label);
        let body = self.block(body);
        self.expr(ExprKind::Breakpoint { label, body })
    }

    pub fn clause(&self, pattern: Pattern, guard: Option<Expr>, body: Expr) -> MatchClause {
        MatchClause {
            id: self.id(),
            span: self.span(),
            pattern,
            guard,
            body,
        }
    }

    pub fn match_expr(&self, subject: Expr, clauses: Vec<MatchClause>) -> Expr {
        self.expr(ExprKind::Match {
            subject: Box::new(subject),
            clauses,
        })
    }

    pub fn rescue(&self, monitored: Expr, clauses: Vec<MatchClause>) -> Expr {
        self.expr(ExprKind::Rescue {
            monitored: Box::new(monitored),
            clauses,
        })
    }

    pub fn ensure(&self, expr: Expr, ensure: Vec<Stmt>) -> Expr {
        let ensure = self.block(ensure);
        self.expr(ExprKind::Ensure {
            expr: Box::new(expr),
            ensure,
        })
    }

    pub fn or_else(&self, expr: Expr, binding: Option<&str>, handler: Vec<Stmt>) -> Expr {
        let binding = binding.map(|b| self.ident(b));
        let handler = self.block(handler);
        self.expr(ExprKind::OrElse {
            expr: Box::new(expr),
            handler,
            binding,
        })
    }

    pub fn propagate(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::Propagate(Box::new(expr)))
    }

    pub fn proc_expr(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::Proc(Box::new(expr)))
    }

    pub fn spawn(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::Spawn(Box::new(expr)))
    }

    pub fn await_expr(&self, expr: Expr) -> Expr {
        self.expr(ExprKind::Await(Box::new(expr)))
    }

    pub fn assign(&self, op: AssignOp, target: Pattern, value: Expr) -> Expr {
        self.expr(ExprKind::Assignment {
            op,
            target: Box::new(AssignTarget::Pattern(target)),
            value: Box::new(value),
        })
    }

    /// Assignment to a member or index expression.
    pub fn assign_to(&self, op: AssignOp, target: Expr, value: Expr) -> Expr {
        self.expr(ExprKind::Assignment {
            op,
            target: Box::new(AssignTarget::Expr(target)),
            value: Box::new(value),
        })
    }

    // ── Patterns ────────────────────────────────────────────────────────

    pub fn pattern(&self, kind: PatternKind) -> Pattern {
        Pattern {
            id: self.id(),
            span: self.span(),
            kind,
        }
    }

    pub fn pat_ident(&self, name: &str) -> Pattern {
        self.pattern(PatternKind::Identifier(name.to_string()))
    }

    pub fn pat_wildcard(&self) -> Pattern {
        self.pattern(PatternKind::Wildcard)
    }

    pub fn pat_literal(&self, literal: Literal) -> Pattern {
        self.pattern(PatternKind::Literal(literal))
    }

    pub fn pat_typed(&self, inner: Pattern, ty: TypeExpr) -> Pattern {
        self.pattern(PatternKind::Typed {
            pattern: Box::new(inner),
            ty,
        })
    }

    /// `Name { field: pattern, ... }`
    pub fn pat_struct(&self, name: Option<&str>, fields: Vec<(&str, Pattern)>) -> Pattern {
        let name = name.map(|n| self.ident(n));
        let fields = fields
            .into_iter()
            .map(|(field, pattern)| StructPatternField {
                id: self.id(),
                span: self.span(),
                field: Some(self.ident(field)),
                pattern,
                binding: None,
            })
            .collect();
        self.pattern(PatternKind::Struct {
            name,
            fields,
            positional: false,
        })
    }

    pub fn pat_positional(&self, name: Option<&str>, elements: Vec<Pattern>) -> Pattern {
        let name = name.map(|n| self.ident(n));
        let fields = elements
            .into_iter()
            .map(|pattern| StructPatternField {
                id: self.id(),
                span: self.span(),
                field: None,
                pattern,
                binding: None,
            })
            .collect();
        self.pattern(PatternKind::Struct {
            name,
            fields,
            positional: true,
        })
    }

    pub fn pat_array(&self, elements: Vec<Pattern>, rest: Option<Pattern>) -> Pattern {
        self.pattern(PatternKind::Array {
            elements,
            rest: rest.map(Box::new),
        })
    }

    // ── Statements ──────────────────────────────────────────────────────

    pub fn stmt(&self, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.id(),
            span: self.span(),
            kind,
        }
    }

    /// Wrap a definition or expression into a statement.
    pub fn item(&self, item: impl Into<StmtKind>) -> Stmt {
        self.stmt(item.into())
    }

    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr(expr))
    }

    /// `name := value`
    pub fn declare(&self, name: &str, value: Expr) -> Stmt {
        let target = self.pat_ident(name);
        let assign = self.assign(AssignOp::Declare, target, value);
        self.expr_stmt(assign)
    }

    /// `name = value`
    pub fn assign_var(&self, name: &str, value: Expr) -> Stmt {
        let target = self.pat_ident(name);
        let assign = self.assign(AssignOp::Assign, target, value);
        self.expr_stmt(assign)
    }

    pub fn ret(&self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return(value))
    }

    pub fn break_stmt(&self, label: Option<&str>, value: Option<Expr>) -> Stmt {
        let label = label.map(|l| self.ident(l));
        self.stmt(StmtKind::Break { label, value })
    }

    pub fn continue_stmt(&self, label: Option<&str>) -> Stmt {
        let label = label.map(|l| self.ident(l));
        self.stmt(StmtKind::Continue { label })
    }

    pub fn raise(&self, value: Expr) -> Stmt {
        self.stmt(StmtKind::Raise(value))
    }

    pub fn rethrow(&self) -> Stmt {
        self.stmt(StmtKind::Rethrow)
    }

    pub fn yield_stmt(&self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Yield(value))
    }

    // ── Declarations ────────────────────────────────────────────────────

    pub fn struct_field(&self, name: Option<&str>, ty: TypeExpr) -> StructField {
        StructField {
            id: self.id(),
            span: self.span(),
            name: name.map(|n| self.ident(n)),
            ty,
        }
    }

    /// `struct Name T { field: Type, ... }`
    pub fn struct_def(&self, name: &str, generics: Vec<GenericParam>, fields: Vec<(&str, TypeExpr)>) -> StructDef {
        let fields = fields
            .into_iter()
            .map(|(field, ty)| self.struct_field(Some(field), ty))
            .collect();
        StructDef {
            name: self.ident(name),
            generics,
            fields,
            where_clause: Vec::new(),
            kind: StructKind::Named,
            private: false,
        }
    }

    /// `struct Name T (Type, ...)`
    pub fn positional_struct_def(&self, name: &str, generics: Vec<GenericParam>, fields: Vec<TypeExpr>) -> StructDef {
        let fields = fields
            .into_iter()
            .map(|ty| self.struct_field(None, ty))
            .collect();
        StructDef {
            name: self.ident(name),
            generics,
            fields,
            where_clause: Vec::new(),
            kind: StructKind::Positional,
            private: false,
        }
    }

    pub fn singleton_struct_def(&self, name: &str) -> StructDef {
        StructDef {
            name: self.ident(name),
            generics: Vec::new(),
            fields: Vec::new(),
            where_clause: Vec::new(),
            kind: StructKind::Singleton,
            private: false,
        }
    }

    pub fn union_def(&self, name: &str, generics: Vec<GenericParam>, variants: Vec<TypeExpr>) -> UnionDef {
        UnionDef {
            name: self.ident(name),
            generics,
            variants,
            where_clause: Vec::new(),
            private: false,
        }
    }

    pub fn alias_def(&self, name: &str, generics: Vec<GenericParam>, target: TypeExpr) -> AliasDef {
        AliasDef {
            name: self.ident(name),
            generics,
            target,
            where_clause: Vec::new(),
            private: false,
        }
    }

    pub fn function_def(
        &self,
        name: &str,
        params: Vec<FunctionParam>,
        ret: Option<TypeExpr>,
        body: Vec<Stmt>,
    ) -> FunctionDef {
        FunctionDef {
            id: self.id(),
            span: self.span(),
            name: self.ident(name),
            generics: Vec::new(),
            params,
            ret,
            body: self.block(body),
            where_clause: Vec::new(),
            method_shorthand: false,
            private: false,
        }
    }

    pub fn sig(&self, name: &str, params: Vec<FunctionParam>, ret: Option<TypeExpr>) -> FunctionSig {
        FunctionSig {
            id: self.id(),
            span: self.span(),
            name: self.ident(name),
            generics: Vec::new(),
            params,
            ret,
            where_clause: Vec::new(),
            default_body: None,
        }
    }

    pub fn interface_def(&self, name: &str, generics: Vec<GenericParam>, signatures: Vec<FunctionSig>) -> InterfaceDef {
        InterfaceDef {
            name: self.ident(name),
            generics,
            self_pattern: None,
            signatures,
            where_clause: Vec::new(),
            base_interfaces: Vec::new(),
            private: false,
        }
    }

    /// `impl Interface for Target { definitions }`
    pub fn impl_def(&self, interface: &str, target: TypeExpr, definitions: Vec<FunctionDef>) -> ImplDef {
        ImplDef {
            impl_name: None,
            generics: Vec::new(),
            interface: Some(self.ident(interface)),
            interface_args: Vec::new(),
            target,
            definitions,
            where_clause: Vec::new(),
            private: false,
        }
    }

    pub fn methods_def(&self, target: TypeExpr, definitions: Vec<FunctionDef>) -> MethodsDef {
        MethodsDef {
            target,
            generics: Vec::new(),
            definitions,
            where_clause: Vec::new(),
        }
    }

    /// `import a.b` with optional selectors `(name, alias)`.
    pub fn import(&self, package: &str, selectors: Vec<(&str, Option<&str>)>) -> Import {
        Import {
            id: self.id(),
            span: self.span(),
            path: package.split('.').map(|seg| self.ident(seg)).collect(),
            wildcard: false,
            selectors: selectors
                .into_iter()
                .map(|(name, alias)| ImportSelector {
                    name: self.ident(name),
                    alias: alias.map(|a| self.ident(a)),
                })
                .collect(),
            alias: None,
        }
    }

    pub fn module(&self, body: Vec<Stmt>) -> Module {
        Module {
            body,
            ..Default::default()
        }
    }

    /// A module declared as `package name` at `path`.
    pub fn module_in(&self, package: &str, path: &str, imports: Vec<Import>, body: Vec<Stmt>) -> Module {
        Module {
            package: Some(PackageDecl {
                path: package.split('.').map(|seg| self.ident(seg)).collect(),
                private: false,
            }),
            imports,
            body,
            path: Some(path.to_string()),
            origins: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_fresh_and_increasing() {
        let b = Builder::new();
        let first = b.var("x");
        let second = b.var("y");
        assert!(second.id > first.id);
    }

    #[test]
    fn nested_calls_compose() {
        let b = Builder::new();
        let expr = b.binary(BinaryOp::Add, b.int(1), b.int(2));
        match expr.kind {
            ExprKind::Binary { op, left, right } => {
                assert_eq!(op, BinaryOp::Add);
                assert_ne!(left.id, right.id);
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn at_line_stamps_positions() {
        let b = Builder::new();
        b.at_line(12);
        let stmt = b.item(b.struct_def("Point", vec![], vec![("x", b.ty("i32"))]));
        assert_eq!(stmt.span.line, 12);
        assert_eq!(stmt.declared_name().map(|i| i.name.as_str()), Some("Point"));
    }

    #[test]
    fn module_in_records_package() {
        let b = Builder::new();
        let module = b.module_in("geo.shapes", "geo/shapes.lm", vec![], vec![]);
        assert_eq!(module.package_name().as_deref(), Some("geo.shapes"));
    }
}
