//! Declaration collection.
//!
//! Runs before any statement is checked. Pass 1 registers every struct,
//! union, interface and alias so type references resolve regardless of
//! declaration order; pass 2 registers functions, extern signatures,
//! implementations and method sets, and records the obligations implied by
//! their generic bounds.

mod impls;
mod inference;
mod resolve;
mod self_pattern;

pub(crate) use inference::{hoist_where_constraints, InferenceSources};

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use lumen_ast::{
    FunctionDef, FunctionParam, FunctionSig, GenericParam, Module, PatternKind, Stmt, StmtKind, StructKind, TypeExpr,
    WhereClause,
};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::assignable::equivalent_for_signature;
use crate::checker::{Checker, TypeScope};
use crate::error::DiagnosticKind;
use crate::specs::{obligations_from_specs, Site};
use crate::ty::{AliasType, FunctionType, InterfaceType, StructType, Type, UnionType};

/// The parts of a function-like declaration a signature is built from.
pub(crate) struct SignatureParts<'a> {
    pub generics: &'a [GenericParam],
    pub params: &'a [FunctionParam],
    pub ret: Option<&'a TypeExpr>,
    pub where_clause: &'a [WhereClause],
    pub method_shorthand: bool,
}

impl<'a> SignatureParts<'a> {
    pub fn of_def(def: &'a FunctionDef) -> Self {
        SignatureParts {
            generics: &def.generics,
            params: &def.params,
            ret: def.ret.as_ref(),
            where_clause: &def.where_clause,
            method_shorthand: def.method_shorthand,
        }
    }

    pub fn of_sig(sig: &'a FunctionSig) -> Self {
        SignatureParts {
            generics: &sig.generics,
            params: &sig.params,
            ret: sig.ret.as_ref(),
            where_clause: &sig.where_clause,
            method_shorthand: false,
        }
    }
}

/// Whether a parameter is the receiver, spelled `self` in any case.
pub(crate) fn is_self_param(param: &FunctionParam) -> bool {
    matches!(&param.pattern.kind, PatternKind::Identifier(name) if name.eq_ignore_ascii_case("self"))
}

impl Checker {
    pub(crate) fn collect_declarations(&mut self, module: &Module) {
        let mut seen = FxHashSet::default();
        for stmt in &module.body {
            self.preregister_type(stmt, &mut seen);
        }
        for stmt in &module.body {
            self.register_type_declaration(stmt);
        }
        for stmt in &module.body {
            self.collect_declaration(stmt);
        }
        debug!(
            declared = self.declared.len(),
            implementations = self.local_impls.len(),
            method_sets = self.local_method_sets.len(),
            "collected declarations"
        );
    }

    /// Declare `name` at module scope. A second declaration of the same
    /// name is reported and ignored.
    pub(crate) fn declare(&mut self, name: &str, ty: Type, site: Site, private: bool, export: bool) -> bool {
        if let Some(previous) = self.declared.get(name).copied() {
            let location = self.describe_site(previous);
            self.report_site(
                DiagnosticKind::Declaration,
                format!("duplicate declaration '{name}' (previous declaration at {location})"),
                site,
            );
            return false;
        }
        self.declared.insert(name.to_string(), site);
        self.env.define_global(name, ty);
        if private {
            self.private_names.insert(name.to_string());
        } else if export {
            self.exported.insert(name.to_string());
        }
        true
    }

    /// Bind type names to nominal placeholders so pass 1 can resolve
    /// references to types declared further down.
    fn preregister_type(&mut self, stmt: &Stmt, seen: &mut FxHashSet<String>) {
        let placeholder = match &stmt.kind {
            StmtKind::Struct(def) => Type::named_struct(&def.name.name),
            StmtKind::Union(def) => Type::Union(Rc::new(UnionType {
                name: def.name.name.clone(),
                ..Default::default()
            })),
            StmtKind::Interface(def) => Type::Interface(Rc::new(InterfaceType::named(&def.name.name))),
            _ => return,
        };
        if let Some(name) = stmt.declared_name() {
            if seen.insert(name.name.clone()) {
                self.env.define_global(name.name.clone(), placeholder);
            }
        }
    }

    // ── Pass 1: types ──────────────────────────────────────────────────

    fn register_type_declaration(&mut self, stmt: &Stmt) {
        let site = Site::of(stmt);
        match &stmt.kind {
            StmtKind::Struct(def) => {
                let mut scope = TypeScope::default();
                let type_params = self.generic_specs(&def.generics, &mut scope);
                let where_clause = self.where_specs(&def.where_clause, &scope);
                let mut fields: Vec<(String, Type)> = Vec::new();
                let mut positional = Vec::new();
                if def.kind != StructKind::Singleton {
                    for field in &def.fields {
                        let ty = self.resolve_type_expr(&field.ty, &scope);
                        if let Some(name) = &field.name {
                            if fields.iter().any(|(existing, _)| existing == &name.name) {
                                self.report(
                                    DiagnosticKind::Declaration,
                                    format!("duplicate field '{}' in struct '{}'", name.name, def.name.name),
                                    field,
                                );
                                continue;
                            }
                            fields.push((name.name.clone(), ty.clone()));
                        }
                        positional.push(ty);
                    }
                }
                let ty = Type::Struct(Rc::new(StructType {
                    name: def.name.name.clone(),
                    type_params,
                    fields,
                    positional,
                    where_clause,
                }));
                self.declare(&def.name.name, ty, site, def.private, true);
            }
            StmtKind::Union(def) => {
                let mut scope = TypeScope::default();
                let type_params = self.generic_specs(&def.generics, &mut scope);
                let where_clause = self.where_specs(&def.where_clause, &scope);
                let variants = def
                    .variants
                    .iter()
                    .map(|variant| self.resolve_type_expr(variant, &scope))
                    .collect();
                let ty = Type::Union(Rc::new(UnionType {
                    name: def.name.name.clone(),
                    type_params,
                    variants,
                    where_clause,
                }));
                self.declare(&def.name.name, ty, site, def.private, true);
            }
            StmtKind::Interface(def) => {
                let mut scope = TypeScope::default();
                scope.insert("Self".into(), Type::param("Self"));
                let type_params = self.generic_specs(&def.generics, &mut scope);
                let where_clause = self.where_specs(&def.where_clause, &scope);
                let mut methods = BTreeMap::new();
                let mut defaults = BTreeSet::new();
                for sig in &def.signatures {
                    let name = &sig.name.name;
                    if methods.contains_key(name) {
                        self.report(
                            DiagnosticKind::Declaration,
                            format!("duplicate interface method '{name}'"),
                            sig,
                        );
                        continue;
                    }
                    let owner = format!("{}::{name}", def.name.name);
                    let func = self.signature_type(&owner, &SignatureParts::of_sig(sig), &scope, Site::of(sig));
                    if sig.default_body.is_some() {
                        defaults.insert(name.clone());
                    }
                    methods.insert(name.clone(), func);
                }
                let base_interfaces = def
                    .base_interfaces
                    .iter()
                    .map(|base| self.resolve_type_expr(base, &scope))
                    .collect();
                let ty = Type::Interface(Rc::new(InterfaceType {
                    name: def.name.name.clone(),
                    type_params,
                    methods,
                    defaults,
                    self_pattern: def.self_pattern.clone(),
                    where_clause,
                    base_interfaces,
                }));
                self.declare(&def.name.name, ty, site, def.private, true);
            }
            StmtKind::Alias(def) => {
                let mut scope = TypeScope::default();
                let type_params = self.generic_specs(&def.generics, &mut scope);
                let where_clause = self.where_specs(&def.where_clause, &scope);
                let target = self.resolve_type_expr(&def.target, &scope);
                let ty = Type::Alias(Rc::new(AliasType {
                    name: def.name.name.clone(),
                    type_params,
                    target,
                    where_clause,
                }));
                self.declare(&def.name.name, ty, site, def.private, true);
            }
            _ => {}
        }
    }

    // ── Pass 2: functions, implementations, method sets ────────────────

    fn collect_declaration(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Function(def) => {
                let owner = format!("fn {}", def.name.name);
                let sig = self.signature_type(&owner, &SignatureParts::of_def(def), &TypeScope::default(), Site::of(def));
                self.signatures.insert(def.id, sig.clone());
                self.function_generics.insert(def.id, sig.type_params.clone());
                let export = !def.method_shorthand;
                self.declare(&def.name.name, Type::Function(Box::new(sig)), Site::of(stmt), def.private, export);
            }
            StmtKind::Extern(ext) => {
                let def = &ext.signature;
                let owner = format!("fn {}", def.name.name);
                let sig = self.signature_type(&owner, &SignatureParts::of_def(def), &TypeScope::default(), Site::of(def));
                self.signatures.insert(def.id, sig.clone());
                let name = &def.name.name;
                if let Some(previous) = self.extern_signatures.get(name) {
                    if same_signature(previous, &sig) {
                        return;
                    }
                }
                if self.declare(name, Type::Function(Box::new(sig.clone())), Site::of(stmt), def.private, true) {
                    self.extern_signatures.insert(name.clone(), sig);
                }
            }
            StmtKind::Impl(def) => self.collect_implementation(stmt, def),
            StmtKind::Methods(def) => self.collect_method_set(stmt, def),
            _ => {}
        }
    }

    /// Build the signature of a function-like declaration, inferring any
    /// undeclared generic parameters. The obligations of its bounds are
    /// attached to the signature and recorded for the module.
    pub(crate) fn signature_type(
        &mut self,
        owner: &str,
        parts: &SignatureParts<'_>,
        outer: &TypeScope,
        site: Site,
    ) -> FunctionType {
        let mut scope = outer.clone();
        let mut type_params = self.generic_specs(parts.generics, &mut scope);
        let mut types: Vec<&TypeExpr> = parts.params.iter().filter_map(|param| param.ty.as_ref()).collect();
        types.extend(parts.ret);
        let sources = InferenceSources {
            types,
            where_clause: parts.where_clause,
            where_constraints: false,
        };
        let inferred = self.infer_generic_params(&sources, &scope, &type_params);
        for param in &inferred {
            scope.insert(param.name.clone(), Type::param(&param.name));
        }
        type_params.extend(inferred);
        let where_clause = self.where_specs(parts.where_clause, &scope);
        let where_clause = hoist_where_constraints(&mut type_params, where_clause);

        let mut params: Vec<Type> = parts
            .params
            .iter()
            .map(|param| self.param_type(param, &scope))
            .collect();
        if parts.method_shorthand {
            params.insert(0, Type::Unknown);
        }
        let ret = self.resolve_annotation(parts.ret, &scope);
        let obligations = obligations_from_specs(owner, &type_params, &where_clause, site);
        self.obligations.extend(obligations.iter().cloned());
        FunctionType {
            params,
            ret,
            type_params,
            where_clause,
            obligations,
        }
    }

    /// A parameter's declared type. An unannotated `self` takes the
    /// enclosing `Self` when there is one.
    pub(crate) fn param_type(&self, param: &FunctionParam, scope: &TypeScope) -> Type {
        match &param.ty {
            Some(ty) => self.resolve_type_expr(ty, scope),
            None if is_self_param(param) => scope.get("Self").cloned().unwrap_or(Type::Unknown),
            None => Type::Unknown,
        }
    }
}

fn same_signature(a: &FunctionType, b: &FunctionType) -> bool {
    a.params.len() == b.params.len()
        && a.params.iter().zip(&b.params).all(|(x, y)| equivalent_for_signature(x, y))
        && equivalent_for_signature(&a.ret, &b.ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CheckOptions;
    use lumen_ast::Builder;

    fn collect(module: &Module) -> Checker {
        let mut checker = Checker::new(module, &CheckOptions::default());
        checker.collect_declarations(module);
        checker
    }

    #[test]
    fn forward_references_resolve() {
        let b = Builder::new();
        let module = b.module(vec![
            b.item(b.struct_def("Line", vec![], vec![("shape", b.ty("Shape"))])),
            b.item(b.union_def("Shape", vec![], vec![b.ty("Line"), b.ty("nil")])),
        ]);
        let c = collect(&module);
        let line = c.struct_def("Line").unwrap();
        assert!(matches!(line.field("shape"), Some(Type::Union(_))));
        assert!(c.diagnostics.is_empty());
    }

    #[test]
    fn duplicate_declaration_names_previous_site() {
        let b = Builder::new();
        b.at_line(3);
        let first = b.item(b.struct_def("Point", vec![], vec![]));
        b.at_line(9);
        let second = b.item(b.function_def("Point", vec![], None, vec![]));
        let mut module = b.module(vec![first, second]);
        module.path = Some("geo.lm".into());
        let c = collect(&module);
        assert_eq!(c.diagnostics.len(), 1);
        assert_eq!(
            c.diagnostics[0].message,
            "typechecker: duplicate declaration 'Point' (previous declaration at geo.lm:3:1)"
        );
    }

    #[test]
    fn identical_extern_redeclaration_is_accepted() {
        let b = Builder::new();
        let ext = |b: &Builder| {
            b.item(lumen_ast::ExternFn {
                target: lumen_ast::HostTarget::Go,
                signature: b.function_def("now", vec![], Some(b.ty("i64")), vec![]),
                body: String::new(),
            })
        };
        let module = b.module(vec![ext(&b), ext(&b)]);
        let c = collect(&module);
        assert!(c.diagnostics.is_empty());
        assert!(matches!(c.env.lookup_global("now"), Some(Type::Function(_))));
    }

    #[test]
    fn function_signatures_infer_generics() {
        let b = Builder::new();
        let def = b.function_def(
            "first",
            vec![b.param("xs", Some(b.generic_ty("Array", vec![b.ty("T")])))],
            Some(b.ty("T")),
            vec![],
        );
        let module = b.module(vec![b.item(def)]);
        let c = collect(&module);
        let Some(Type::Function(sig)) = c.env.lookup_global("first") else {
            panic!("first should be a function");
        };
        assert_eq!(sig.type_params.len(), 1);
        assert!(sig.type_params[0].inferred);
        assert_eq!(Type::Function(sig.clone()).to_string(), "fn(Array T) -> T");
    }
}
