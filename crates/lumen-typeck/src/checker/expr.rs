//! Expression dispatch and the simple expression forms: literals,
//! identifiers, collections, ranges, casts, member access and blocks.

use lumen_ast::{Block, Expr, ExprKind, Ident, Literal, MapElement, MemberName, Stmt, StmtKind, TypeExpr};

use super::placeholders;
use super::{Checker, TypeScope};
use crate::assignable::{is_assignable, literal_mismatch, normalize_special};
use crate::decls::SignatureParts;
use crate::error::{DiagnosticKind, Located};
use crate::members::{Lookup, MemberError};
use crate::numeric::IntLiteral;
use crate::specs::Site;
use crate::ty::{FloatSuffix, IntegerSuffix, IntegerType, Type};
use crate::unions;

impl Checker {
    /// Infer the type of `expr`, caching it under the expression's id.
    pub(crate) fn check_expr(&mut self, expr: &Expr) -> Type {
        self.check_expr_with(expr, None)
    }

    /// Like [`Checker::check_expr`], with a type the context expects.
    /// Lambdas, placeholder lambdas, generic calls and empty collections
    /// use it to fill in what the expression itself leaves open.
    pub(crate) fn check_expected(&mut self, expr: &Expr, expected: &Type) -> Type {
        let expected = (!expected.is_unknown()).then_some(expected);
        self.check_expr_with(expr, expected)
    }

    pub(crate) fn check_expr_with(&mut self, expr: &Expr, expected: Option<&Type>) -> Type {
        if self.cx.placeholder_depth == 0 {
            if let Some(count) = placeholders::plan(expr) {
                let ty = self.check_placeholder_lambda(expr, count, expected);
                return self.record(expr.id, ty);
            }
        }
        let ty = match &expr.kind {
            ExprKind::Identifier(name) => self.check_identifier(expr, name),
            ExprKind::Literal(literal) => literal_type(literal),
            ExprKind::Array(elements) => self.check_array(elements, expected),
            ExprKind::Map(elements) => self.check_map(elements),
            ExprKind::StructLiteral(literal) => self.check_struct_literal(expr, literal),
            ExprKind::Interpolation(parts) => {
                for part in parts {
                    self.check_expr(part);
                }
                Type::string()
            }
            ExprKind::Range { start, end, .. } => self.check_range(start, end),
            ExprKind::Unary { op, operand } => self.check_unary(expr, *op, operand),
            ExprKind::Binary { op, left, right } => self.check_binary(expr, *op, left, right),
            ExprKind::Assignment { op, target, value } => self.check_assignment(expr, *op, target, value),
            ExprKind::Cast { expr: inner, ty } => self.check_cast(expr, inner, ty),
            ExprKind::Call(call) => self.check_call(expr, call, expected),
            ExprKind::Member { object, member, safe } => self.check_member(expr, object, member, *safe, false),
            ExprKind::Index { object, index } => self.check_index(expr, object, index),
            ExprKind::ImplicitMember(name) => self.check_implicit_member(expr, name),
            ExprKind::Placeholder(index) => self.placeholder_type(*index),
            ExprKind::Topic => self.check_topic(expr),
            ExprKind::Block(block) => self.check_block(block),
            ExprKind::Lambda(lambda) => self.check_lambda(lambda, expected),
            ExprKind::Iterator {
                body,
                binding,
                element_type,
            } => self.check_iterator_literal(body, binding.as_ref(), element_type.as_ref(), expected),
            ExprKind::If {
                condition,
                then,
                or_clauses,
            } => self.check_if(condition, then, or_clauses),
            ExprKind::Match { subject, clauses } => self.check_match(subject, clauses),
            ExprKind::While { condition, body } => self.check_while(condition, body),
            ExprKind::For {
                pattern,
                iterable,
                body,
            } => self.check_for(pattern, iterable, body),
            ExprKind::Loop { body } => self.check_loop(body),
            ExprKind::Breakpoint { label, body } => self.check_breakpoint(label, body),
            ExprKind::Proc(inner) => self.check_proc(inner),
            ExprKind::Spawn(inner) => self.check_spawn(inner),
            ExprKind::Await(inner) => self.check_await(inner),
            ExprKind::Propagate(inner) => self.check_propagate(inner),
            ExprKind::OrElse {
                expr: inner,
                handler,
                binding,
            } => self.check_or_else(inner, handler, binding.as_ref()),
            ExprKind::Rescue { monitored, clauses } => self.check_rescue(monitored, clauses),
            ExprKind::Ensure { expr: inner, ensure } => self.check_ensure(inner, ensure),
        };
        self.record(expr.id, ty)
    }

    // ── Compatibility reporting ────────────────────────────────────────

    /// Check that `actual` may flow into `expected`, reporting at `at`.
    /// Literal overflow wins over a plain mismatch.
    pub(crate) fn check_assignable(
        &mut self,
        actual: &Type,
        expected: &Type,
        at: &dyn Located,
        mismatch: impl FnOnce() -> String,
    ) -> bool {
        if expected.is_unknown() || actual.is_unknown() {
            return true;
        }
        if let Some(message) = literal_mismatch(actual, expected) {
            self.report(DiagnosticKind::Literal, message, at);
            return false;
        }
        if self.accepts(actual, expected) {
            return true;
        }
        self.report(DiagnosticKind::Mismatch, mismatch(), at);
        false
    }

    pub(crate) fn report_member_error(&mut self, error: MemberError, at: &dyn Located) -> Type {
        let (kind, message) = error;
        self.report(kind, message, at);
        Type::Unknown
    }

    /// Generic names visible at the current point of the walk.
    pub(crate) fn current_type_scope(&self) -> TypeScope {
        let mut scope = TypeScope::default();
        for frame in &self.cx.constraints {
            for name in frame.keys() {
                scope.insert(name.clone(), Type::param(name));
            }
        }
        for frame in &self.cx.generics {
            for param in &frame.inferred {
                scope.insert(param.name.clone(), Type::param(&param.name));
            }
        }
        if let Some(receiver) = self.cx.receivers.last() {
            scope.insert("Self".into(), receiver.clone());
        }
        scope
    }

    pub(crate) fn resolve_local_type(&self, ty: &TypeExpr) -> Type {
        let scope = self.current_type_scope();
        self.resolve_type_expr(ty, &scope)
    }

    // ── Names ──────────────────────────────────────────────────────────

    fn check_identifier(&mut self, expr: &Expr, name: &str) -> Type {
        if let Some(ty) = self.env.lookup(name) {
            return ty.clone();
        }
        if !self.allow_dynamic {
            self.report(DiagnosticKind::UnknownName, format!("undefined identifier '{name}'"), expr);
        }
        Type::Unknown
    }

    fn check_topic(&mut self, expr: &Expr) -> Type {
        match self.cx.topics.last() {
            Some(topic) => topic.clone(),
            None => {
                self.report(
                    DiagnosticKind::ControlFlow,
                    "topic reference '%' is only valid inside a pipeline",
                    expr,
                );
                Type::Unknown
            }
        }
    }

    fn check_implicit_member(&mut self, expr: &Expr, name: &Ident) -> Type {
        let Some(receiver) = self.cx.receivers.last().cloned() else {
            self.report(
                DiagnosticKind::ControlFlow,
                format!("implicit member '#{}' used outside of a method", name.name),
                expr,
            );
            return Type::Unknown;
        };
        match self.lookup_member(&receiver, &name.name, Lookup::default()) {
            Ok(ty) => ty,
            Err(error) => self.report_member_error(error, expr),
        }
    }

    // ── Collections ────────────────────────────────────────────────────

    fn check_array(&mut self, elements: &[Expr], expected: Option<&Type>) -> Type {
        let expected_element = expected.and_then(|ty| match normalize_special(ty) {
            Type::Array(element) => Some(*element),
            _ => None,
        });
        let mut element = Type::Unknown;
        for item in elements {
            let ty = match &expected_element {
                Some(hint) => self.check_expected(item, hint),
                None => self.check_expr(item),
            };
            element = merge_array_element(element, ty);
        }
        if element.is_unknown() {
            if let Some(hint) = expected_element {
                element = hint;
            }
        }
        Type::array(element)
    }

    fn check_map(&mut self, elements: &[MapElement]) -> Type {
        let mut key = Type::Unknown;
        let mut value = Type::Unknown;
        for element in elements {
            match element {
                MapElement::Entry { key: k, value: v } => {
                    let key_ty = self.check_expr(k);
                    let value_ty = self.check_expr(v);
                    key = self.merge_map_component(key, key_ty, "map key", k);
                    value = self.merge_map_component(value, value_ty, "map value", v);
                }
                MapElement::Spread(source) => {
                    let ty = self.check_expr(source);
                    match normalize_special(&ty) {
                        Type::Map(k, v) => {
                            key = self.merge_map_component(key, *k, "map key", source);
                            value = self.merge_map_component(value, *v, "map value", source);
                        }
                        Type::Unknown => {}
                        other => {
                            self.report(
                                DiagnosticKind::Mismatch,
                                format!("map spread expects Map/HashMap, got {other}"),
                                source,
                            );
                        }
                    }
                }
            }
        }
        Type::map(key, value)
    }

    fn merge_map_component(&mut self, current: Type, candidate: Type, label: &str, at: &Expr) -> Type {
        if current.is_unknown() {
            return unions::without_literal(candidate);
        }
        if candidate.is_unknown() || is_assignable(&candidate, &current) {
            return current;
        }
        if is_assignable(&current, &candidate) {
            return unions::without_literal(candidate);
        }
        self.report(
            DiagnosticKind::Mismatch,
            format!("{label} expects type {current}, got {candidate}"),
            at,
        );
        current
    }

    fn check_range(&mut self, start: &Expr, end: &Expr) -> Type {
        let start_ty = self.check_expr(start);
        let end_ty = self.check_expr(end);
        let mut valid = true;
        for (ty, label, at) in [(&start_ty, "start", start), (&end_ty, "end", end)] {
            if !ty.is_open() && !ty.is_numeric() {
                self.report(
                    DiagnosticKind::Mismatch,
                    format!("range {label} must be numeric (got {ty})"),
                    at,
                );
                valid = false;
            }
        }
        if !valid {
            return Type::range(Type::Unknown);
        }
        if start_ty.is_open() {
            return Type::range(unions::without_literal(end_ty));
        }
        if end_ty.is_open() {
            return Type::range(unions::without_literal(start_ty));
        }
        match (&start_ty, &end_ty) {
            (Type::Integer(a), Type::Integer(b)) if a.suffix == b.suffix => {
                Type::range(Type::Integer(IntegerType::new(a.suffix)))
            }
            (Type::Integer(a), Type::Integer(b)) if a.literal.is_some() && !a.explicit => {
                Type::range(Type::Integer(IntegerType::new(b.suffix)))
            }
            (Type::Integer(a), Type::Integer(b)) if b.literal.is_some() && !b.explicit => {
                Type::range(Type::Integer(IntegerType::new(a.suffix)))
            }
            _ if unions::same_type(&start_ty, &end_ty) => Type::range(unions::without_literal(start_ty)),
            _ => {
                self.report(
                    DiagnosticKind::Mismatch,
                    format!("range bounds must share a numeric type (got {start_ty} and {end_ty})"),
                    end,
                );
                Type::range(Type::Unknown)
            }
        }
    }

    // ── Casts ──────────────────────────────────────────────────────────

    fn check_cast(&mut self, expr: &Expr, inner: &Expr, ty: &TypeExpr) -> Type {
        let value = self.check_expr(inner);
        let target = self.resolve_local_type(ty);
        if value.is_unknown() || target.is_unknown() || is_assignable(&value, &target) {
            return target;
        }
        if value.is_numeric() && target.is_numeric() {
            return target;
        }
        if target.is_error_variant() && value.is_result() {
            return target;
        }
        self.report(DiagnosticKind::Mismatch, format!("cannot cast {value} to {target}"), expr);
        target
    }

    // ── Members ────────────────────────────────────────────────────────

    /// `object.member`, `object?.member` and `object.N`. Calls pass
    /// `prefer_methods` so a method wins over a same-named field.
    pub(crate) fn check_member(
        &mut self,
        expr: &Expr,
        object: &Expr,
        member: &MemberName,
        safe: bool,
        prefer_methods: bool,
    ) -> Type {
        if let (Some(type_name), MemberName::Named(name)) = (object.as_identifier(), member) {
            if let Some(found) = self.type_qualified_member(object, type_name, &name.name, prefer_methods) {
                return match found {
                    Ok(ty) => ty,
                    Err(error) => self.report_member_error(error, expr),
                };
            }
        }

        let object_ty = self.check_expr(object);
        let result = match member {
            MemberName::Positional(index) => {
                let receiver = if safe {
                    unions::strip_nil(&object_ty)
                } else {
                    object_ty.clone()
                };
                self.positional_member(&receiver, *index).map(|ty| {
                    if safe && object_ty.can_be_nil() && !object_ty.is_unknown() && !ty.can_be_nil() {
                        Type::nullable(ty)
                    } else {
                        ty
                    }
                })
            }
            MemberName::Named(name) => {
                let lookup = Lookup {
                    prefer_methods,
                    type_qualified: false,
                };
                if safe {
                    self.safe_member(&object_ty, &name.name, lookup)
                } else {
                    self.lookup_member(&object_ty, &name.name, lookup)
                }
            }
        };
        match result {
            Ok(ty) => ty,
            Err(error) => self.report_member_error(error, expr),
        }
    }

    /// `Type.member` where `Type` names a struct, union or interface that
    /// no local binding shadows. Field-less structs are values, not
    /// namespaces, unless a type-qualified method of that name exists.
    fn type_qualified_member(
        &mut self,
        object: &Expr,
        type_name: &str,
        member: &str,
        prefer_methods: bool,
    ) -> Option<Result<Type, MemberError>> {
        let receiver = self.type_named(type_name)?;
        let key = format!("{type_name}.{member}");
        if let Some(found) = self.env.lookup_global(&key).cloned() {
            self.record(object.id, receiver);
            return Some(Ok(found));
        }
        if let Type::Struct(def) = &receiver {
            if def.fields.is_empty() && def.positional.is_empty() && def.type_params.is_empty() {
                return None;
            }
        }
        self.record(object.id, receiver.clone());
        let lookup = Lookup {
            prefer_methods,
            type_qualified: true,
        };
        Some(self.lookup_member(&receiver, member, lookup))
    }

    // ── Blocks ─────────────────────────────────────────────────────────

    pub(crate) fn check_block(&mut self, block: &Block) -> Type {
        let ty = self.in_scope(|c| c.check_body(&block.body));
        self.record(block.id, ty)
    }

    /// Check statements in the current scope. The value is that of the
    /// final expression statement; a `return` ends the sequence.
    pub(crate) fn check_body(&mut self, body: &[Stmt]) -> Type {
        self.predeclare_functions(body);
        let mut result = Type::Unknown;
        for (i, stmt) in body.iter().enumerate() {
            match &stmt.kind {
                StmtKind::Return(_) => {
                    self.check_stmt(stmt);
                    return Type::Unknown;
                }
                StmtKind::Expr(expr) => {
                    let ty = self.check_expr(expr);
                    self.record(stmt.id, ty.clone());
                    if i + 1 == body.len() {
                        result = ty;
                    }
                }
                _ => self.check_stmt(stmt),
            }
        }
        result
    }

    /// Nested function definitions are callable anywhere in their block.
    fn predeclare_functions(&mut self, body: &[Stmt]) {
        for stmt in body {
            let StmtKind::Function(def) = &stmt.kind else {
                continue;
            };
            if self.env.defined_in_current(&def.name.name) {
                continue;
            }
            let scope = self.current_type_scope();
            let owner = format!("fn {}", def.name.name);
            let sig = self.signature_type(&owner, &SignatureParts::of_def(def), &scope, Site::of(def));
            self.function_generics.insert(def.id, sig.type_params.clone());
            self.signatures.insert(def.id, sig.clone());
            self.env.define(def.name.name.clone(), Type::Function(Box::new(sig)));
        }
    }
}

/// The type of a literal. Integer literals keep their value for bounds
/// checks; an unsuffixed integer is `i32` and an unsuffixed float `f64`.
pub(crate) fn literal_type(literal: &Literal) -> Type {
    match literal {
        Literal::Integer { value, suffix } => Type::Integer(IntegerType {
            suffix: suffix.unwrap_or(IntegerSuffix::I32),
            literal: IntLiteral::parse(value),
            explicit: suffix.is_some(),
        }),
        Literal::Float { suffix, .. } => Type::Float(suffix.unwrap_or(FloatSuffix::F64)),
        Literal::String(_) => Type::string(),
        Literal::Bool(_) => Type::bool(),
        Literal::Char(_) => Type::char(),
        Literal::Nil => Type::nil(),
    }
}

/// Array elements of one integer suffix keep the widest literal so a
/// later bounds check sees the value most likely to overflow.
fn merge_array_element(current: Type, next: Type) -> Type {
    if current.is_unknown() {
        return next;
    }
    if let (Type::Integer(a), Type::Integer(b)) = (&current, &next) {
        if a.suffix == b.suffix && a.explicit == b.explicit {
            return match (&a.literal, &b.literal) {
                (Some(x), Some(y)) if y.magnitude > x.magnitude => next,
                (Some(_), Some(_)) => current,
                _ => Type::Integer(IntegerType::new(a.suffix)),
            };
        }
    }
    unions::merge_allow_union(&current, &next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(text: &str) -> Type {
        literal_type(&Literal::Integer {
            value: text.into(),
            suffix: None,
        })
    }

    #[test]
    fn literal_defaults() {
        assert_eq!(int("7").to_string(), "i32");
        let suffixed = literal_type(&Literal::Integer {
            value: "7".into(),
            suffix: Some(IntegerSuffix::U8),
        });
        assert!(matches!(&suffixed, Type::Integer(t) if t.explicit && t.suffix == IntegerSuffix::U8));
        assert_eq!(
            literal_type(&Literal::Float {
                value: 1.5,
                suffix: None
            }),
            Type::f64()
        );
        assert!(literal_type(&Literal::Nil).is_nil());
    }

    #[test]
    fn array_merge_keeps_largest_literal() {
        let merged = merge_array_element(merge_array_element(Type::Unknown, int("1")), int("512"));
        let Type::Integer(merged) = merged else {
            panic!("expected an integer element");
        };
        assert_eq!(merged.literal.and_then(|lit| lit.magnitude), Some(512));
    }

    #[test]
    fn array_merge_unions_distinct_elements() {
        let merged = merge_array_element(Type::string(), Type::bool());
        assert_eq!(merged.to_string(), "string | bool");
    }
}
