//! `proc`, `spawn` and `await`. Both task forms check their body in an
//! asynchronous context and wrap its type.

use lumen_ast::Expr;

use super::Checker;
use crate::assignable::normalize_special;
use crate::error::DiagnosticKind;
use crate::solver::ImplResolution;
use crate::subst;
use crate::ty::Type;
use crate::unions;

impl Checker {
    pub(crate) fn check_proc(&mut self, inner: &Expr) -> Type {
        let body = self.in_async(|c| c.check_expr(inner));
        Type::proc(unions::without_literal(body))
    }

    pub(crate) fn check_spawn(&mut self, inner: &Expr) -> Type {
        let body = self.in_async(|c| c.check_expr(inner));
        Type::future(unions::without_literal(body))
    }

    pub(crate) fn check_await(&mut self, inner: &Expr) -> Type {
        let ty = self.check_expr(inner);
        match normalize_special(&ty) {
            Type::Unknown | Type::TypeParam(_) => Type::Unknown,
            Type::Proc(result) | Type::Future(result) => *result,
            other => match self.awaitable_output(&other) {
                Some(output) => output,
                None => {
                    self.report(
                        DiagnosticKind::Mismatch,
                        format!("await expects Awaitable values (got {other})"),
                        inner,
                    );
                    Type::Unknown
                }
            },
        }
    }

    /// `Output` of an `Awaitable Output` value or implementation.
    fn awaitable_output(&self, ty: &Type) -> Option<Type> {
        if let Some((def, args)) = ty.as_interface() {
            if def.name == "Awaitable" {
                return Some(args.first().cloned().unwrap_or(Type::Unknown));
            }
        }
        let def = self.interface_def("Awaitable")?;
        match self.resolve_implementation(ty, &def, &[]) {
            ImplResolution::Found(found) => Some(
                found
                    .spec
                    .interface_args
                    .first()
                    .map(|output| subst::substitute(output, &found.bindings))
                    .unwrap_or(Type::Unknown),
            ),
            _ => None,
        }
    }
}
