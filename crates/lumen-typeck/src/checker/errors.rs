//! Error handling: `!` propagation, `raise`, `rethrow`, `rescue`,
//! `ensure` and `or` handlers.

use lumen_ast::{Block, Expr, Ident, MatchClause, Stmt};

use super::patterns::Binding;
use super::Checker;
use crate::error::DiagnosticKind;
use crate::ty::Type;
use crate::unions;

impl Checker {
    /// The type an error handler binds.
    fn error_type(&self) -> Type {
        match self.env.lookup_global("Error") {
            Some(ty @ Type::Interface(_)) => ty.clone(),
            _ => Type::Unknown,
        }
    }

    fn is_failure(&self, ty: &Type) -> bool {
        ty.is_nil() || ty.struct_name() == Some("ProcError") || ty.is_error_variant()
    }

    /// `ty` without its nil and error members: what remains after a
    /// failure has been handled or propagated.
    pub(crate) fn success_type(&self, ty: &Type) -> Type {
        if let Some(success) = ty.result_success() {
            return success;
        }
        match ty {
            Type::Nullable(inner) => (**inner).clone(),
            Type::UnionLiteral(members) => unions::normalize(
                members
                    .iter()
                    .filter(|member| !self.is_failure(member))
                    .cloned()
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    pub(crate) fn check_propagate(&mut self, inner: &Expr) -> Type {
        let ty = self.check_expr(inner);
        self.success_type(&ty)
    }

    pub(crate) fn check_raise(&mut self, stmt: &Stmt, value: &Expr) {
        let ty = self.check_expr(value);
        if ty.is_open() || ty.is_string() || self.is_failure(&ty) {
            return;
        }
        let implements_error = match self.interface_def("Error") {
            Some(def) => self.type_implements(&ty, &def, &[]).is_ok(),
            None => false,
        };
        if !implements_error {
            self.report(
                DiagnosticKind::Mismatch,
                format!("raise expects an Error value (got {ty})"),
                stmt,
            );
        }
    }

    pub(crate) fn check_rethrow(&mut self, stmt: &Stmt) {
        if self.cx.rescue_depth == 0 {
            self.report(
                DiagnosticKind::ControlFlow,
                "rethrow is only valid inside rescue handlers",
                stmt,
            );
        }
    }

    pub(crate) fn check_rescue(&mut self, monitored: &Expr, clauses: &[MatchClause]) -> Type {
        let mut result = self.check_expr(monitored);
        let error = self.error_type();
        for clause in clauses {
            let arm = self.in_scope(|c| {
                c.in_rescue(|c| {
                    c.bind_pattern(&clause.pattern, &error, Binding::Match);
                    if let Some(guard) = &clause.guard {
                        let ty = c.check_expr(guard);
                        if !ty.is_open() && !ty.is_bool() {
                            c.report(
                                DiagnosticKind::Mismatch,
                                format!("rescue guard must evaluate to bool (got {ty})"),
                                guard,
                            );
                        }
                    }
                    c.check_expr(&clause.body)
                })
            });
            result = unions::merge_allow_union(&result, &arm);
        }
        result
    }

    pub(crate) fn check_ensure(&mut self, inner: &Expr, ensure: &Block) -> Type {
        let ty = self.check_expr(inner);
        self.check_block(ensure);
        ty
    }

    /// `expr or |err| { handler }`: the handler runs on nil or an error,
    /// so the result is the success type merged with the handler's.
    pub(crate) fn check_or_else(&mut self, inner: &Expr, handler: &Block, binding: Option<&Ident>) -> Type {
        let ty = self.check_expr(inner);
        let success = self.success_type(&ty);
        let error = self.error_type();
        let handled = self.in_scope(|c| {
            if let Some(binding) = binding {
                c.env.define(binding.name.clone(), error);
            }
            c.check_block(handler)
        });
        unions::merge_allow_union(&success, &handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CheckOptions;
    use lumen_ast::Builder;

    #[test]
    fn success_type_drops_failures() {
        let b = Builder::new();
        let c = Checker::new(&b.module(vec![]), &CheckOptions::default());
        let proc_error = c.env.lookup_global("ProcError").cloned().unwrap();
        let union = Type::UnionLiteral(vec![Type::i32(), proc_error, Type::nil()]);
        assert_eq!(c.success_type(&union), Type::i32());
        assert_eq!(c.success_type(&Type::nullable(Type::string())), Type::string());
        assert_eq!(c.success_type(&Type::result_of(Type::bool())), Type::bool());
    }
}
