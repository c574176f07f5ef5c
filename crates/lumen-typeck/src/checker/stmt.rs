//! Statement dispatch.

use lumen_ast::{Import, Stmt, StmtKind};

use super::Checker;
use crate::ty::Type;

impl Checker {
    pub(crate) fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                let ty = self.check_expr(expr);
                self.record(stmt.id, ty);
            }
            StmtKind::Struct(_) | StmtKind::Union(_) | StmtKind::Alias(_) => self.check_type_declaration(stmt),
            StmtKind::Interface(def) => {
                self.check_type_declaration(stmt);
                if self.env.depth() == 1 {
                    self.check_interface_defaults(def);
                }
            }
            StmtKind::Function(def) => self.check_function_def(def),
            StmtKind::Impl(def) => self.check_impl_bodies(stmt, def),
            StmtKind::Methods(def) => self.check_method_bodies(stmt, def),
            StmtKind::Extern(_) | StmtKind::Prelude { .. } => {}
            StmtKind::Return(value) => self.check_return(stmt, value.as_ref()),
            StmtKind::Break { label, value } => self.check_break(stmt, label.as_ref(), value.as_ref()),
            StmtKind::Continue { label } => self.check_continue(stmt, label.as_ref()),
            StmtKind::Raise(value) => self.check_raise(stmt, value),
            StmtKind::Rethrow => self.check_rethrow(stmt),
            StmtKind::Yield(value) => self.check_yield(stmt, value.as_ref()),
            StmtKind::DynImport(import) => self.check_dynamic_import(import),
        }
    }

    /// Module-level types were registered during collection; a type
    /// declared inside a body is only checked for clashes.
    fn check_type_declaration(&mut self, stmt: &Stmt) {
        if self.env.depth() == 1 {
            return;
        }
        if let Some(name) = stmt.declared_name() {
            self.check_local_type_name(name);
        }
    }

    /// `dynimport` names are resolved at run time, so they bind Unknown.
    fn check_dynamic_import(&mut self, import: &Import) {
        if import.wildcard {
            self.allow_dynamic = true;
        }
        if let Some(alias) = &import.alias {
            self.env.define(alias.name.clone(), Type::Unknown);
        } else if import.selectors.is_empty() && !import.wildcard {
            if let Some(last) = import.path.last() {
                self.env.define(last.name.clone(), Type::Unknown);
            }
        }
        for selector in &import.selectors {
            let name = selector.alias.as_ref().unwrap_or(&selector.name);
            self.env.define(name.name.clone(), Type::Unknown);
        }
    }
}
