//! Index expressions: arrays, maps and strings, with the `Index` and
//! `IndexMut` interfaces for everything else.

use lumen_ast::Expr;

use super::Checker;
use crate::assignable::normalize_special;
use crate::error::DiagnosticKind;
use crate::ty::Type;

/// Which side of an assignment an index expression is on.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

impl Checker {
    pub(crate) fn check_index(&mut self, expr: &Expr, object: &Expr, index: &Expr) -> Type {
        self.index_access(expr, object, index, Access::Read)
    }

    /// Type a value stored through `object[index]` must have.
    pub(crate) fn check_index_target(&mut self, expr: &Expr, object: &Expr, index: &Expr) -> Type {
        let ty = self.index_access(expr, object, index, Access::Write);
        self.record(expr.id, ty)
    }

    fn index_access(&mut self, expr: &Expr, object: &Expr, index: &Expr, access: Access) -> Type {
        let object_ty = self.check_expr(object);
        let index_ty = self.check_expr(index);
        match normalize_special(&object_ty) {
            Type::Unknown | Type::TypeParam(_) => Type::Unknown,
            Type::Array(element) => {
                self.require_integer_index(&index_ty, "array", index);
                *element
            }
            Type::Map(key, value) => {
                self.check_assignable(&index_ty, &key, index, || {
                    format!("map key expects {key}, got {index_ty}")
                });
                *value
            }
            ty if ty.is_string() => {
                self.require_integer_index(&index_ty, "string", index);
                if access == Access::Write {
                    self.report(DiagnosticKind::Mismatch, "strings do not support index assignment", expr);
                    return Type::Unknown;
                }
                Type::char()
            }
            other => self.index_interface(expr, &other, &index_ty, index, access),
        }
    }

    fn require_integer_index(&mut self, index_ty: &Type, what: &str, at: &Expr) {
        if !index_ty.is_open() && !index_ty.is_integer() {
            self.report(
                DiagnosticKind::Mismatch,
                format!("{what} index must be an integer (got {index_ty})"),
                at,
            );
        }
    }

    /// `index(i)` from `Index`, or `set_index(i, value)` from `IndexMut`.
    fn index_interface(&mut self, expr: &Expr, object: &Type, index_ty: &Type, index: &Expr, access: Access) -> Type {
        let (iface, method) = match access {
            Access::Read => ("Index", "index"),
            Access::Write => ("IndexMut", "set_index"),
        };
        let sig = match self.find_method(object, method, false) {
            Ok(Some(Type::Function(sig))) => sig,
            Ok(_) => {
                let verb = match access {
                    Access::Read => "indexing",
                    Access::Write => "index assignment",
                };
                self.report(
                    DiagnosticKind::Mismatch,
                    format!("type {object} does not support {verb} (missing {iface} implementation)"),
                    expr,
                );
                return Type::Unknown;
            }
            Err(error) => return self.report_member_error(error, expr),
        };
        if let Some(param) = sig.params.first() {
            self.check_assignable(index_ty, param, index, || {
                format!("{iface}.{method} expects index of type {param}, got {index_ty}")
            });
        }
        match access {
            Access::Read => sig.ret.clone(),
            Access::Write => sig.params.get(1).cloned().unwrap_or(Type::Unknown),
        }
    }
}
