//! Collection of `impl` blocks and `methods` blocks.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use lumen_ast::{FunctionDef, ImplDef, MethodsDef, Stmt, TypeExpr};

use super::{hoist_where_constraints, is_self_param, InferenceSources, SignatureParts};
use crate::checker::{Checker, TypeScope};
use crate::error::DiagnosticKind;
use crate::specs::{obligations_from_specs, GenericParamSpec, ImplementationSpec, MethodSetSpec, Site};
use crate::subst::{self, Bindings};
use crate::ty::{FunctionType, Type};

impl Checker {
    /// Generic parameters and target of an implementation or methods
    /// header. `Self` is bound to the target in the returned scope.
    fn header_scope(
        &mut self,
        generics: &[lumen_ast::GenericParam],
        target: &TypeExpr,
        extra: &[TypeExpr],
        where_clause: &[lumen_ast::WhereClause],
    ) -> (Vec<GenericParamSpec>, TypeScope, Type) {
        let mut scope = TypeScope::default();
        scope.insert("Self".into(), Type::param("Self"));
        let mut params = self.generic_specs(generics, &mut scope);
        let mut types = vec![target];
        types.extend(extra);
        let sources = InferenceSources {
            types,
            where_clause,
            where_constraints: true,
        };
        let inferred = self.infer_generic_params(&sources, &scope, &params);
        for param in &inferred {
            scope.insert(param.name.clone(), Type::param(&param.name));
        }
        params.extend(inferred);
        let target = self.resolve_type_expr(target, &scope);
        scope.insert("Self".into(), target.clone());
        (params, scope, target)
    }

    pub(crate) fn collect_implementation(&mut self, stmt: &Stmt, def: &ImplDef) {
        let site = Site::of(stmt);
        let Some(iface_ident) = &def.interface else {
            self.report(DiagnosticKind::Declaration, "implementation requires an interface name", stmt);
            return;
        };
        let iface_name = iface_ident.name.as_str();
        let (mut type_params, scope, target) =
            self.header_scope(&def.generics, &def.target, &def.interface_args, &def.where_clause);

        let iface = match self.env.lookup_global(iface_name) {
            Some(Type::Interface(iface)) => Rc::clone(iface),
            Some(_) => {
                self.report(
                    DiagnosticKind::Declaration,
                    format!("impl references '{iface_name}' which is not an interface"),
                    iface_ident,
                );
                return;
            }
            None => {
                self.report(
                    DiagnosticKind::UnknownName,
                    format!("impl references unknown interface '{iface_name}'"),
                    iface_ident,
                );
                return;
            }
        };
        let interface_args: Vec<Type> = def
            .interface_args
            .iter()
            .map(|arg| self.resolve_type_expr(arg, &scope))
            .collect();
        let label = format!("impl {iface_name} for {target}");

        let expected = iface.type_params.len();
        let provided = interface_args.len();
        if expected != provided {
            let message = if expected == 0 {
                format!("impl {iface_name} does not accept type arguments")
            } else if provided == 0 {
                format!("{label} requires {expected} interface type argument(s)")
            } else {
                format!("{label} expected {expected} interface type argument(s), got {provided}")
            };
            self.report(DiagnosticKind::Arity, message, stmt);
            return;
        }
        if !self.check_self_pattern(&iface, &def.target, &type_params, &label, stmt) {
            return;
        }

        let mut methods = BTreeMap::new();
        for func in &def.definitions {
            let name = &func.name.name;
            if methods.contains_key(name) {
                self.report(
                    DiagnosticKind::Declaration,
                    format!("duplicate method '{name}' in {label}"),
                    func,
                );
                continue;
            }
            let sig = self.method_signature(&label, func, &scope, &target);
            methods.insert(name.clone(), sig);
        }

        let union_variants = match &target {
            Type::UnionLiteral(members) => {
                let labels: BTreeSet<String> = members.iter().map(Type::to_string).collect();
                labels.into_iter().collect()
            }
            _ => Vec::new(),
        };
        let where_clause = self.where_specs(&def.where_clause, &scope);
        let where_clause = hoist_where_constraints(&mut type_params, where_clause);
        let obligations = obligations_from_specs(&label, &type_params, &where_clause, site);
        self.obligations.extend(obligations.iter().cloned());
        let spec = Rc::new(ImplementationSpec {
            impl_name: def.impl_name.as_ref().map(|ident| ident.name.clone()),
            interface_name: iface_name.to_string(),
            type_params,
            interface_args,
            target,
            methods,
            where_clause,
            obligations,
            union_variants,
            is_builtin: false,
            site,
        });
        if let Some(name) = &spec.impl_name {
            self.declare(name, Type::ImplNamespace(Rc::clone(&spec)), site, def.private, true);
        }
        self.implementations.push(Rc::clone(&spec));
        self.local_impls.push(Rc::clone(&spec));
        self.impl_specs.insert(stmt.id, spec);
    }

    pub(crate) fn collect_method_set(&mut self, stmt: &Stmt, def: &MethodsDef) {
        let site = Site::of(stmt);
        let (mut type_params, scope, target) = self.header_scope(&def.generics, &def.target, &[], &def.where_clause);
        let label = format!("methods for {target}");
        let where_clause = self.where_specs(&def.where_clause, &scope);
        let where_clause = hoist_where_constraints(&mut type_params, where_clause);
        let obligations = obligations_from_specs(&label, &type_params, &where_clause, site);
        self.obligations.extend(obligations.iter().cloned());

        let self_binding: Bindings = [("Self".to_string(), target.clone())].into_iter().collect();
        let inherited: Vec<_> = subst::substitute_obligations(&obligations, &self_binding)
            .into_iter()
            .map(|mut ob| {
                if ob.context.is_empty() {
                    ob.context = "via method set".into();
                }
                ob
            })
            .collect();

        let mut methods = BTreeMap::new();
        let mut type_qualified = BTreeSet::new();
        for func in &def.definitions {
            let name = &func.name.name;
            if methods.contains_key(name) {
                self.report(
                    DiagnosticKind::Declaration,
                    format!("duplicate method '{name}' in {label}"),
                    func,
                );
                continue;
            }
            let mut sig = self.method_signature(&label, func, &scope, &target);
            sig.obligations.extend(inherited.iter().cloned());
            self.signatures.insert(func.id, sig.clone());
            if !has_receiver(func) {
                type_qualified.insert(name.clone());
            }
            methods.insert(name.clone(), sig);
        }

        let base = target
            .struct_name()
            .or_else(|| target.union_name())
            .map(str::to_string)
            .unwrap_or_else(|| target.to_string());
        for func in &def.definitions {
            let name = &func.name.name;
            let Some(sig) = methods.get(name) else {
                continue;
            };
            let key = if type_qualified.contains(name) {
                format!("{base}.{name}")
            } else {
                name.clone()
            };
            if self.env.lookup_global(&key).is_none() {
                self.env.define_global(key.clone(), Type::Function(Box::new(sig.clone())));
                if !func.private {
                    self.exported.insert(key);
                }
            }
        }

        let spec = Rc::new(MethodSetSpec {
            target,
            type_params,
            methods,
            type_qualified,
            where_clause,
            obligations,
            site,
        });
        self.method_sets.push(Rc::clone(&spec));
        self.local_method_sets.push(Rc::clone(&spec));
        self.method_set_specs.insert(stmt.id, spec);
    }

    fn method_signature(&mut self, label: &str, func: &FunctionDef, scope: &TypeScope, target: &Type) -> FunctionType {
        let owner = format!("{label}::{}", func.name.name);
        let mut sig = self.signature_type(&owner, &SignatureParts::of_def(func), scope, Site::of(func));
        apply_implicit_self(&mut sig, func, target);
        self.signatures.insert(func.id, sig.clone());
        self.function_generics.insert(func.id, sig.type_params.clone());
        sig
    }
}

/// Give the receiver parameter the block's target type.
pub(crate) fn apply_implicit_self(sig: &mut FunctionType, func: &FunctionDef, target: &Type) {
    let receiver = if target.is_unknown() {
        Type::param("Self")
    } else {
        target.clone()
    };
    if func.method_shorthand {
        if let Some(first) = sig.params.first_mut() {
            *first = receiver;
        }
        return;
    }
    let Some(param) = func.params.first() else {
        return;
    };
    let self_typed = param.ty.as_ref().and_then(TypeExpr::simple_name) == Some("Self");
    if self_typed || (is_self_param(param) && sig.params.first().is_some_and(Type::is_unknown)) {
        sig.params[0] = receiver;
    }
}

/// Methods without a receiver are called through the type name.
fn has_receiver(func: &FunctionDef) -> bool {
    func.method_shorthand
        || func.params.first().is_some_and(|param| {
            is_self_param(param) || param.ty.as_ref().and_then(TypeExpr::simple_name) == Some("Self")
        })
}
