//! Pattern binding and assignment.
//!
//! Patterns appear on the left of `:=` and `=`, in `for` loops, match and
//! rescue clauses and function parameters. [`Binding`] says whether the
//! names they mention are new, existing or arm-local.

use lumen_ast::{AssignOp, AssignTarget, Expr, ExprKind, MemberName, Pattern, PatternKind, StructPatternField};

use super::expr::literal_type;
use super::Checker;
use crate::assignable::{array_element, is_assignable, literal_mismatch};
use crate::error::DiagnosticKind;
use crate::ty::Type;
use crate::unions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Binding {
    /// `:=` and parameters: every name is new in the current scope.
    Declare,
    /// `=`: names update existing bindings, declaring the ones that do
    /// not exist yet.
    Assign,
    /// Match, rescue and `for` patterns: names are arm-local and typed
    /// annotations are type tests rather than requirements.
    Match,
}

impl Checker {
    pub(crate) fn bind_pattern(&mut self, pattern: &Pattern, ty: &Type, mode: Binding) {
        match &pattern.kind {
            PatternKind::Wildcard => {}
            PatternKind::Identifier(name) => self.bind_name(name, ty, mode),
            PatternKind::Literal(literal) => {
                let literal_ty = literal_type(literal);
                if !ty.is_open() && !is_assignable(&literal_ty, ty) && !is_assignable(ty, &literal_ty) {
                    self.report(
                        DiagnosticKind::Pattern,
                        format!("pattern literal of type {literal_ty} cannot match {ty}"),
                        pattern,
                    );
                }
            }
            PatternKind::Typed { pattern: inner, ty: annotation } => {
                let annotated = self.resolve_local_type(annotation);
                if mode != Binding::Match && !ty.is_unknown() && !annotated.is_unknown() {
                    if let Some(message) = literal_mismatch(ty, &annotated) {
                        self.report(DiagnosticKind::Literal, message, pattern);
                    } else if !self.accepts(ty, &annotated) {
                        self.report(
                            DiagnosticKind::Mismatch,
                            format!("cannot bind {ty} to pattern of type {annotated}"),
                            pattern,
                        );
                    }
                }
                self.record(pattern.id, annotated.clone());
                self.bind_pattern(inner, &annotated, mode);
            }
            PatternKind::Struct { name, fields, positional } => {
                let name = name.as_ref().map(|ident| ident.name.as_str());
                self.bind_struct_pattern(pattern, name, fields, *positional, ty, mode);
            }
            PatternKind::Array { elements, rest } => {
                let element = match array_element(ty) {
                    Some(element) => element,
                    None => {
                        if !ty.is_open() {
                            self.report(
                                DiagnosticKind::Pattern,
                                format!("array pattern cannot match type {ty}"),
                                pattern,
                            );
                        }
                        Type::Unknown
                    }
                };
                for element_pattern in elements {
                    self.bind_pattern(element_pattern, &element, mode);
                }
                if let Some(rest) = rest {
                    self.bind_pattern(rest, &Type::array(element), mode);
                }
            }
        }
    }

    fn bind_name(&mut self, name: &str, ty: &Type, mode: Binding) {
        if name == "_" {
            return;
        }
        let ty = unions::without_literal(ty.clone());
        match mode {
            Binding::Declare | Binding::Match => self.env.define(name, ty),
            Binding::Assign => {
                let current = self.env.lookup(name).cloned();
                match current {
                    // An established type survives reassignment.
                    Some(existing) if !existing.is_unknown() => {}
                    Some(_) => {
                        self.env.assign(name, ty);
                    }
                    None => self.env.define(name, ty),
                }
            }
        }
    }

    fn bind_struct_pattern(
        &mut self,
        pattern: &Pattern,
        name: Option<&str>,
        fields: &[StructPatternField],
        positional: bool,
        subject: &Type,
        mode: Binding,
    ) {
        let receiver = match self.struct_pattern_receiver(name, subject) {
            Some(receiver) => receiver,
            None => {
                self.report(
                    DiagnosticKind::Pattern,
                    format!("struct pattern cannot match type {subject}"),
                    pattern,
                );
                Type::Unknown
            }
        };
        self.record(pattern.id, receiver.clone());

        for (i, field) in fields.iter().enumerate() {
            let field_ty = if receiver.is_unknown() {
                Type::Unknown
            } else if positional || field.field.is_none() {
                match self.positional_member(&receiver, i as u32) {
                    Ok(ty) => ty,
                    Err((kind, message)) => {
                        self.report(kind, message, field);
                        Type::Unknown
                    }
                }
            } else {
                let field_name = field.field.as_ref().map(|ident| ident.name.as_str()).unwrap_or_default();
                match self.field_type(&receiver, field_name) {
                    Some(ty) => ty,
                    None => {
                        self.report(
                            DiagnosticKind::Pattern,
                            format!("struct pattern field '{field_name}' not found in {receiver}"),
                            field,
                        );
                        Type::Unknown
                    }
                }
            };
            self.bind_pattern(&field.pattern, &field_ty, mode);
            if let Some(binding) = &field.binding {
                self.bind_name(&binding.name, &field_ty, mode);
            }
        }
    }

    /// The struct a pattern destructures. A named pattern against a
    /// union, nullable or union literal picks the matching variant.
    fn struct_pattern_receiver(&self, name: Option<&str>, subject: &Type) -> Option<Type> {
        let Some(name) = name else {
            return (subject.is_unknown() || subject.struct_name().is_some()).then(|| subject.clone());
        };
        if subject.is_unknown() || subject.struct_name() == Some(name) {
            return Some(if subject.is_unknown() {
                self.struct_def(name).map(Type::Struct).unwrap_or(Type::Unknown)
            } else {
                subject.clone()
            });
        }
        let variants: Vec<Type> = match subject {
            Type::Union(def) => def.variants.clone(),
            Type::UnionLiteral(members) => members.clone(),
            Type::Nullable(inner) => vec![(**inner).clone()],
            Type::Applied(base, _) => match base.as_ref() {
                Type::Union(def) => def.variants.clone(),
                _ => Vec::new(),
            },
            Type::TypeParam(_) | Type::Interface(_) => {
                return Some(self.struct_def(name).map(Type::Struct).unwrap_or(Type::Unknown));
            }
            _ => Vec::new(),
        };
        variants
            .into_iter()
            .find(|variant| variant.struct_name() == Some(name))
            .map(|variant| match variant {
                Type::Struct(def) if def.fields.is_empty() && def.positional.is_empty() => {
                    self.struct_def(name).map(Type::Struct).unwrap_or(Type::Struct(def))
                }
                other => other,
            })
    }

    // ── Assignment ─────────────────────────────────────────────────────

    pub(crate) fn check_assignment(&mut self, expr: &Expr, op: AssignOp, target: &AssignTarget, value: &Expr) -> Type {
        match target {
            AssignTarget::Expr(target) => self.assign_to_place(expr, op, target, value),
            AssignTarget::Pattern(pattern) => match op {
                AssignOp::Declare => self.check_declaration(expr, pattern, value),
                _ => self.assign_to_pattern(op, pattern, value),
            },
        }
    }

    fn check_declaration(&mut self, expr: &Expr, pattern: &Pattern, value: &Expr) -> Type {
        let names = pattern.binding_names();
        if !names.is_empty() && names.iter().all(|name| self.env.defined_in_current(name)) {
            self.report(
                DiagnosticKind::Declaration,
                "':=' requires at least one new binding",
                expr,
            );
        }
        let value_ty = match &pattern.kind {
            PatternKind::Typed { pattern: inner, ty } => {
                let annotated = self.resolve_local_type(ty);
                let value_ty = self.check_expected(value, &annotated);
                self.check_assignable(&value_ty, &annotated, value, || {
                    format!("cannot assign {value_ty} to {annotated}")
                });
                self.record(pattern.id, annotated.clone());
                self.bind_pattern(inner, &annotated, Binding::Declare);
                return value_ty;
            }
            _ => self.check_expr(value),
        };
        self.bind_pattern(pattern, &value_ty, Binding::Declare);
        value_ty
    }

    fn assign_to_pattern(&mut self, op: AssignOp, pattern: &Pattern, value: &Expr) -> Type {
        let PatternKind::Identifier(name) = &pattern.kind else {
            let value_ty = self.check_expr(value);
            if let Some(binary) = op.binary_op() {
                self.report(
                    DiagnosticKind::Mismatch,
                    format!("compound assignment '{binary}=' requires a single variable"),
                    pattern,
                );
            }
            self.bind_pattern(pattern, &value_ty, Binding::Assign);
            return value_ty;
        };

        let existing = self.env.lookup(name).cloned();
        let value_ty = match &existing {
            Some(existing) => self.check_expected(value, existing),
            None => self.check_expr(value),
        };
        let Some(existing) = existing else {
            if op.binary_op().is_some() && !self.allow_dynamic {
                self.report(DiagnosticKind::UnknownName, format!("undefined identifier '{name}'"), pattern);
            }
            self.bind_name(name, &value_ty, Binding::Assign);
            return value_ty;
        };

        let result = match op.binary_op() {
            Some(binary) => self.binary_result(binary, &existing, &value_ty, value),
            None => value_ty,
        };
        self.check_assignable(&result, &existing, value, || {
            format!("cannot assign {result} to variable '{name}' (expected {existing})")
        });
        self.bind_name(name, &result, Binding::Assign);
        result
    }

    /// `a.b = v`, `a[i] = v` and their compound forms.
    fn assign_to_place(&mut self, expr: &Expr, op: AssignOp, target: &Expr, value: &Expr) -> Type {
        let slot = match &target.kind {
            ExprKind::Index { object, index } => {
                if op == AssignOp::Declare {
                    self.report(DiagnosticKind::Declaration, "cannot use := on index assignment", expr);
                }
                self.check_index_target(target, object, index)
            }
            ExprKind::Member { object, member, safe } => {
                if op == AssignOp::Declare {
                    self.report(
                        DiagnosticKind::Declaration,
                        "cannot declare new binding on member assignment",
                        expr,
                    );
                }
                let slot = self.check_member(target, object, member, *safe, false);
                if let MemberName::Named(name) = member {
                    if matches!(slot, Type::Function(_)) && self.is_method_slot(object, &name.name) {
                        self.report(
                            DiagnosticKind::Member,
                            format!("cannot assign to method '{}'", name.name),
                            target,
                        );
                    }
                }
                self.record(target.id, slot)
            }
            ExprKind::Identifier(_) => self.check_expr(target),
            _ => {
                self.report(DiagnosticKind::Mismatch, "invalid assignment target", target);
                self.check_expr(value);
                return Type::Unknown;
            }
        };

        let value_ty = self.check_expected(value, &slot);
        let result = match op.binary_op() {
            Some(binary) => self.binary_result(binary, &slot, &value_ty, value),
            None => value_ty,
        };
        self.check_assignable(&result, &slot, value, || {
            format!("cannot assign {result} to member (expected {slot})")
        });
        result
    }

    /// Whether `object.name` resolves to a method rather than a field.
    fn is_method_slot(&self, object: &Expr, name: &str) -> bool {
        let object_ty = self.type_at(object.id);
        self.field_type(&object_ty, name).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CheckOptions;
    use lumen_ast::Builder;

    fn checker() -> Checker {
        let b = Builder::new();
        Checker::new(&b.module(vec![]), &CheckOptions::default())
    }

    #[test]
    fn array_patterns_bind_elements_and_rest() {
        let b = Builder::new();
        let mut c = checker();
        let pattern = b.pat_array(vec![b.pat_ident("head")], Some(b.pat_ident("tail")));
        c.bind_pattern(&pattern, &Type::array(Type::string()), Binding::Declare);
        assert_eq!(c.env.lookup("head"), Some(&Type::string()));
        assert_eq!(c.env.lookup("tail"), Some(&Type::array(Type::string())));
        assert!(c.diagnostics.is_empty());
    }

    #[test]
    fn assignment_keeps_established_types() {
        let mut c = checker();
        c.env.define("x", Type::i32());
        c.bind_name("x", &Type::string(), Binding::Assign);
        assert_eq!(c.env.lookup("x"), Some(&Type::i32()));
        c.bind_name("fresh", &Type::bool(), Binding::Assign);
        assert_eq!(c.env.lookup("fresh"), Some(&Type::bool()));
    }

    #[test]
    fn array_pattern_against_scalar_is_reported() {
        let b = Builder::new();
        let mut c = checker();
        let pattern = b.pat_array(vec![b.pat_ident("a")], None);
        c.bind_pattern(&pattern, &Type::bool(), Binding::Match);
        assert_eq!(c.diagnostics.len(), 1);
        assert!(c.diagnostics[0].message.contains("array pattern cannot match type bool"));
        assert_eq!(c.env.lookup("a"), Some(&Type::Unknown));
    }
}
