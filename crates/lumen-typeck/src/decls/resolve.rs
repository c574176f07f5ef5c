//! Type-expression resolution.
//!
//! Turns a written [`TypeExpr`] into a [`Type`] against a scope of generic
//! names and the module's global definitions. Resolution never fails: an
//! unknown name becomes a nominal struct reference so later passes can
//! report it in context.

use lumen_ast::{GenericParam, TypeExpr, TypeExprKind, WhereClause};

use crate::assignable::special_form;
use crate::checker::{Checker, TypeScope};
use crate::specs::{GenericParamSpec, Site, WhereConstraintSpec};
use crate::subst;
use crate::ty::{FloatSuffix, IntegerSuffix, Type};
use crate::unions;

impl Checker {
    pub(crate) fn resolve_type_expr(&self, expr: &TypeExpr, scope: &TypeScope) -> Type {
        match &expr.kind {
            TypeExprKind::Simple(name) => self.resolve_named_type(name, scope),
            TypeExprKind::Wildcard => Type::Unknown,
            TypeExprKind::Generic { base, args } => {
                let args: Vec<Type> = args.iter().map(|arg| self.resolve_type_expr(arg, scope)).collect();
                self.apply_type(base, args, scope)
            }
            TypeExprKind::Function { params, ret } => Type::function(
                params.iter().map(|param| self.resolve_type_expr(param, scope)).collect(),
                self.resolve_type_expr(ret, scope),
            ),
            TypeExprKind::Nullable(inner) => Type::nullable(self.resolve_type_expr(inner, scope)),
            TypeExprKind::Result(inner) => Type::result_of(self.resolve_type_expr(inner, scope)),
            TypeExprKind::Union(members) => {
                unions::normalize(members.iter().map(|member| self.resolve_type_expr(member, scope)).collect())
            }
        }
    }

    /// Resolve an optional annotation, Unknown when absent.
    pub(crate) fn resolve_annotation(&self, expr: Option<&TypeExpr>, scope: &TypeScope) -> Type {
        expr.map_or(Type::Unknown, |expr| self.resolve_type_expr(expr, scope))
    }

    fn resolve_named_type(&self, name: &str, scope: &TypeScope) -> Type {
        if let Some(ty) = scope.get(name) {
            return ty.clone();
        }
        if let Some(ty) = primitive_named(name) {
            return ty;
        }
        if name == "Self" {
            return Type::param("Self");
        }
        if let Some((package, symbol)) = name.rsplit_once('.') {
            if let Some(Type::Package(pkg)) = self.env.lookup(package) {
                if let Some(ty) = pkg.symbols.get(symbol) {
                    return nominal_value(ty).unwrap_or_else(|| Type::named_struct(name));
                }
            }
            return Type::named_struct(name);
        }
        if let Some(ty) = self.env.lookup_global(name).and_then(nominal_value) {
            return ty;
        }
        special_form(name, &[]).unwrap_or_else(|| Type::named_struct(name))
    }

    fn apply_type(&self, base: &TypeExpr, args: Vec<Type>, scope: &TypeScope) -> Type {
        if let Some(name) = base.simple_name() {
            if !scope.contains_key(name) {
                if let Some(special) = special_form(name, &args) {
                    return special;
                }
            }
        }
        match self.resolve_type_expr(base, scope) {
            Type::Alias(alias) => subst::instantiate_alias(&alias, &args),
            Type::Union(def) if !def.type_params.is_empty() => {
                let applied = subst::instantiate_union(&def, &args);
                Type::applied(Type::Union(std::rc::Rc::new(applied)), args)
            }
            Type::Applied(inner, mut prefix) => {
                prefix.extend(args);
                Type::Applied(inner, prefix)
            }
            base => Type::applied(base, args),
        }
    }

    // ── Generic parameters and where-clauses ───────────────────────────

    /// Convert declared generic parameters, adding each to `scope` before
    /// any bound is resolved so bounds may mention sibling parameters.
    pub(crate) fn generic_specs(&self, generics: &[GenericParam], scope: &mut TypeScope) -> Vec<GenericParamSpec> {
        for param in generics {
            scope.insert(param.name.name.clone(), Type::param(&param.name.name));
        }
        generics
            .iter()
            .map(|param| GenericParamSpec {
                name: param.name.name.clone(),
                constraints: param
                    .constraints
                    .iter()
                    .map(|constraint| self.resolve_type_expr(constraint, scope))
                    .collect(),
                inferred: false,
                site: Site::of(param),
            })
            .collect()
    }

    pub(crate) fn where_specs(&self, clauses: &[WhereClause], scope: &TypeScope) -> Vec<WhereConstraintSpec> {
        clauses
            .iter()
            .map(|clause| WhereConstraintSpec {
                type_param: clause.subject.base_name().unwrap_or_default().to_string(),
                constraints: clause
                    .constraints
                    .iter()
                    .map(|constraint| self.resolve_type_expr(constraint, scope))
                    .collect(),
                site: Site::of(clause),
            })
            .collect()
    }
}

/// Builtin scalar names. `String` is accepted as a spelling of `string`.
pub(crate) fn primitive_named(name: &str) -> Option<Type> {
    Some(match name {
        "_" => Type::Unknown,
        "bool" => Type::bool(),
        "char" => Type::char(),
        "string" | "String" => Type::string(),
        "nil" => Type::nil(),
        _ => {
            if let Some(suffix) = IntegerSuffix::from_name(name) {
                return Some(Type::int(suffix));
            }
            return FloatSuffix::from_name(name).map(Type::Float);
        }
    })
}

/// The type a global binding contributes when named in a type position.
fn nominal_value(ty: &Type) -> Option<Type> {
    match ty {
        Type::Alias(alias) => Some(subst::instantiate_alias(alias, &[])),
        Type::Struct(_) | Type::Union(_) | Type::Interface(_) => Some(ty.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CheckOptions;
    use lumen_ast::{Builder, Module};

    fn checker() -> Checker {
        Checker::new(&Module::default(), &CheckOptions::default())
    }

    #[test]
    fn scalars_and_builtin_containers() {
        let b = Builder::new();
        let c = checker();
        let scope = TypeScope::default();
        assert_eq!(c.resolve_type_expr(&b.ty("String"), &scope), Type::string());
        assert_eq!(c.resolve_type_expr(&b.ty("_"), &scope), Type::Unknown);
        let map = b.generic_ty("Map", vec![b.ty("string"), b.ty("u8")]);
        assert_eq!(c.resolve_type_expr(&map, &scope).to_string(), "Map string u8");
        let array = b.generic_ty("Array", vec![b.nullable_ty(b.ty("i64"))]);
        assert_eq!(c.resolve_type_expr(&array, &scope).to_string(), "Array i64?");
    }

    #[test]
    fn result_and_union_forms() {
        let b = Builder::new();
        let c = checker();
        let scope = TypeScope::default();
        let result = c.resolve_type_expr(&b.result_ty(b.ty("i32")), &scope);
        assert!(result.is_result());
        let union = b.union_ty(vec![b.ty("i32"), b.ty("nil")]);
        assert_eq!(c.resolve_type_expr(&union, &scope).to_string(), "i32?");
    }

    #[test]
    fn scope_names_win_and_unknown_names_stay_nominal() {
        let b = Builder::new();
        let c = checker();
        let mut scope = TypeScope::default();
        scope.insert("T".into(), Type::param("T"));
        assert_eq!(c.resolve_type_expr(&b.ty("T"), &scope), Type::param("T"));
        assert_eq!(c.resolve_type_expr(&b.ty("Widget"), &scope), Type::named_struct("Widget"));
    }
}
