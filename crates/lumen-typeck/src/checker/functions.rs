//! Function, lambda and method bodies, and `return`.

use lumen_ast::{Expr, FunctionDef, FunctionParam, Ident, ImplDef, InterfaceDef, Lambda, MethodsDef, Stmt};

use super::patterns::Binding;
use super::{Checker, GenericFrame};
use crate::assignable::{literal_mismatch, normalize_result_return};
use crate::decls::SignatureParts;
use crate::error::{DiagnosticKind, Located};
use crate::specs::Site;
use crate::ty::{FunctionType, Type};
use crate::unions;

/// Return types that accept any body.
fn accepts_any_body(ret: &Type) -> bool {
    ret.is_unknown() || ret.struct_name() == Some("void")
}

impl Checker {
    // ── Named functions ────────────────────────────────────────────────

    pub(crate) fn check_function_def(&mut self, def: &FunctionDef) {
        let Some(sig) = self.signatures.get(&def.id).cloned() else {
            return;
        };
        let generics = self.function_generics.get(&def.id).cloned().unwrap_or_default();
        let frame = GenericFrame {
            label: format!("fn {}", def.name.name),
            inferred: generics.iter().filter(|param| param.inferred).cloned().collect(),
        };
        let ret = sig.ret.clone();
        self.with_generics(frame, |c| {
            c.with_constraints(&generics, &sig.where_clause, |c| {
                c.in_function(ret.clone(), |c| {
                    c.bind_params(&def.params, &sig, def.method_shorthand);
                    let body = c.check_block(&def.body);
                    let what = format!("function '{}' body", def.name.name);
                    c.check_body_result(&what, &body, &ret, &def.body);
                });
            });
        });
    }

    fn bind_params(&mut self, params: &[FunctionParam], sig: &FunctionType, shorthand: bool) {
        let mut types = sig.params.iter();
        if shorthand {
            if let Some(receiver) = types.next() {
                self.env.define("self", receiver.clone());
            }
        }
        for param in params {
            let ty = types.next().cloned().unwrap_or(Type::Unknown);
            self.record(param.id, ty.clone());
            self.bind_pattern(&param.pattern, &ty, Binding::Declare);
        }
    }

    /// Check the value a body produces against its declared result.
    fn check_body_result(&mut self, what: &str, actual: &Type, expected: &Type, at: &dyn Located) {
        if accepts_any_body(expected) || actual.is_unknown() {
            return;
        }
        if let Some(message) = literal_mismatch(actual, expected) {
            self.report(DiagnosticKind::Literal, message, at);
            return;
        }
        if self.returnable(actual, expected) {
            return;
        }
        self.report(
            DiagnosticKind::Mismatch,
            format!("{what} returns {actual}, expected {expected}"),
            at,
        );
    }

    /// Whether `actual` may be returned where `expected` is declared: a
    /// bare success value or an error value both fit a `Result`.
    fn returnable(&self, actual: &Type, expected: &Type) -> bool {
        if normalize_result_return(actual, expected).1 || self.accepts(actual, expected) {
            return true;
        }
        expected.is_result() && self.is_error_value(actual)
    }

    fn is_error_value(&self, ty: &Type) -> bool {
        if ty.is_error_variant() || ty.struct_name().is_some_and(|name| name.ends_with("Error")) {
            return true;
        }
        match self.interface_def("Error") {
            Some(def) => self.type_implements(ty, &def, &[]).is_ok(),
            None => false,
        }
    }

    // ── Lambdas ────────────────────────────────────────────────────────

    pub(crate) fn check_lambda(&mut self, lambda: &Lambda, expected: Option<&Type>) -> Type {
        let parts = SignatureParts {
            generics: &lambda.generics,
            params: &lambda.params,
            ret: lambda.ret.as_ref(),
            where_clause: &lambda.where_clause,
            method_shorthand: false,
        };
        let scope = self.current_type_scope();
        let mut sig = self.signature_type("lambda", &parts, &scope, Site::default());
        let hinted: &[Type] = match expected {
            Some(Type::Function(expected)) => &expected.params,
            _ => &[],
        };
        for (i, param) in sig.params.iter_mut().enumerate() {
            if param.is_unknown() {
                if let Some(hint) = hinted.get(i) {
                    if hint.type_params().is_empty() {
                        *param = hint.clone();
                    }
                }
            }
        }

        let declared_ret = sig.ret.clone();
        let placeholder_depth = std::mem::replace(&mut self.cx.placeholder_depth, 0);
        let body = self.with_constraints(&sig.type_params, &sig.where_clause, |c| {
            c.in_function(declared_ret.clone(), |c| {
                c.bind_params(&lambda.params, &sig, false);
                c.check_expr(&lambda.body)
            })
        });
        self.cx.placeholder_depth = placeholder_depth;

        if declared_ret.is_unknown() {
            sig.ret = unions::without_literal(body);
        } else {
            self.check_body_result("lambda body", &body, &declared_ret, lambda.body.as_ref());
        }
        Type::Function(Box::new(sig))
    }

    // ── return ─────────────────────────────────────────────────────────

    pub(crate) fn check_return(&mut self, stmt: &Stmt, value: Option<&Expr>) {
        let Some(expected) = self.cx.returns.last().cloned() else {
            if let Some(value) = value {
                self.check_expr(value);
            }
            self.report(DiagnosticKind::ControlFlow, "return statement outside function", stmt);
            return;
        };
        let Some(value) = value else {
            if !accepts_any_body(&expected) && !expected.can_be_nil() {
                self.report(
                    DiagnosticKind::Mismatch,
                    format!("return expects {expected}, got void"),
                    stmt,
                );
            }
            return;
        };
        let actual = self.check_expected(value, &expected);
        if accepts_any_body(&expected) || actual.is_unknown() {
            return;
        }
        if let Some(message) = literal_mismatch(&actual, &expected) {
            self.report(DiagnosticKind::Literal, message, value);
            return;
        }
        if !self.returnable(&actual, &expected) {
            self.report(
                DiagnosticKind::Mismatch,
                format!("return expects {expected}, got {actual}"),
                value,
            );
        }
    }

    // ── Method bodies ──────────────────────────────────────────────────

    pub(crate) fn check_impl_bodies(&mut self, stmt: &Stmt, def: &ImplDef) {
        let Some(spec) = self.impl_specs.get(&stmt.id).cloned() else {
            return;
        };
        self.with_constraints(&spec.type_params, &spec.where_clause, |c| {
            c.with_receiver(spec.target.clone(), |c| {
                for func in &def.definitions {
                    c.check_function_def(func);
                }
            });
        });
    }

    pub(crate) fn check_method_bodies(&mut self, stmt: &Stmt, def: &MethodsDef) {
        let Some(spec) = self.method_set_specs.get(&stmt.id).cloned() else {
            return;
        };
        self.with_constraints(&spec.type_params, &spec.where_clause, |c| {
            c.with_receiver(spec.target.clone(), |c| {
                for func in &def.definitions {
                    c.check_function_def(func);
                }
            });
        });
    }

    /// Default method bodies, checked against `Self` as an open receiver.
    pub(crate) fn check_interface_defaults(&mut self, def: &InterfaceDef) {
        let Some(iface) = self.interface_def(&def.name.name) else {
            return;
        };
        self.with_constraints(&iface.type_params, &iface.where_clause, |c| {
            c.with_receiver(Type::param("Self"), |c| {
                for sig in &def.signatures {
                    let (Some(body), Some(method)) = (&sig.default_body, iface.methods.get(&sig.name.name)) else {
                        continue;
                    };
                    let ret = method.ret.clone();
                    c.in_function(ret.clone(), |c| {
                        c.bind_params(&sig.params, method, false);
                        let actual = c.check_block(body);
                        let what = format!("default method '{}' body", sig.name.name);
                        c.check_body_result(&what, &actual, &ret, body);
                    });
                }
            });
        });
    }

    // ── Local type declarations ────────────────────────────────────────

    /// A type declared inside a function may not reuse the name of one of
    /// that function's inferred type parameters.
    pub(crate) fn check_local_type_name(&mut self, name: &Ident) {
        let conflict = self.cx.generics.iter().rev().find_map(|frame| {
            frame
                .inferred
                .iter()
                .find(|param| param.name == name.name)
                .map(|param| (frame.label.clone(), param.site))
        });
        if let Some((label, site)) = conflict {
            let location = self.describe_site(site);
            self.report(
                DiagnosticKind::Declaration,
                format!(
                    "cannot redeclare inferred type parameter '{}' inside {label} (inferred at {location})",
                    name.name
                ),
                name,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_and_unknown_accept_any_body() {
        assert!(accepts_any_body(&Type::Unknown));
        assert!(accepts_any_body(&Type::named_struct("void")));
        assert!(!accepts_any_body(&Type::i32()));
    }
}
