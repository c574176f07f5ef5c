//! The per-module checker.
//!
//! A [`Checker`] owns everything one module check needs: the value
//! environment, the inferred-type side table keyed by [`NodeId`], the
//! implementation and method-set tables collected from declarations, the
//! pending obligations and the context stacks consulted by control-flow
//! constructs. It is created for one module and dropped with it.
//!
//! The walk itself is split across submodules by construct; each adds an
//! `impl Checker` block.

mod calls;
mod concurrency;
mod control;
mod errors;
mod expr;
mod functions;
mod index;
mod operators;
mod patterns;
mod placeholders;
mod stmt;
mod structs;

use std::collections::BTreeSet;
use std::rc::Rc;

use lumen_ast::{Module, NodeId};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::assignable::is_assignable;
use crate::builtins;
use crate::env::TypeEnv;
use crate::error::{Diagnostic, DiagnosticKind, Located};
use crate::program::PackageExports;
use crate::specs::{GenericParamSpec, ImplementationSpec, MethodSetSpec, Obligation, Site};
use crate::ty::{FunctionType, InterfaceType, StructType, Type, UnionType};
use crate::CheckOptions;

/// Generic names visible while resolving type expressions.
pub(crate) type TypeScope = FxHashMap<String, Type>;

// ── Context frames ─────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct LoopFrame {
    pub breaks: Vec<Type>,
}

pub(crate) struct BreakpointFrame {
    pub label: String,
    pub breaks: Vec<Type>,
}

pub(crate) struct IteratorFrame {
    pub expected: Option<Type>,
    pub element: Type,
}

/// Generic parameters introduced by the function being checked.
pub(crate) struct GenericFrame {
    pub label: String,
    pub inferred: Vec<GenericParamSpec>,
}

/// Control-flow and lexical context, pushed and popped around the
/// construct that introduces it.
#[derive(Default)]
pub(crate) struct Contexts {
    pub returns: Vec<Type>,
    pub loops: Vec<LoopFrame>,
    pub breakpoints: Vec<BreakpointFrame>,
    pub async_depth: usize,
    pub rescue_depth: usize,
    pub topics: Vec<Type>,
    pub placeholder_depth: usize,
    pub placeholders: Vec<Vec<Type>>,
    pub iterators: Vec<IteratorFrame>,
    /// Interface bounds per type parameter, innermost last.
    pub constraints: Vec<FxHashMap<String, Vec<Type>>>,
    pub generics: Vec<GenericFrame>,
    /// Receiver types of the methods being checked, for `#member`.
    pub receivers: Vec<Type>,
}

// ── Checker ────────────────────────────────────────────────────────────

pub struct Checker {
    pub(crate) env: TypeEnv,
    pub(crate) types: FxHashMap<NodeId, Type>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) implementations: Vec<Rc<ImplementationSpec>>,
    pub(crate) method_sets: Vec<Rc<MethodSetSpec>>,
    pub(crate) obligations: Vec<Obligation>,
    /// Site of every module-level declaration, for duplicate reports.
    pub(crate) declared: FxHashMap<String, Site>,
    /// Signatures of extern functions, which may be declared repeatedly.
    pub(crate) extern_signatures: FxHashMap<String, FunctionType>,
    pub(crate) exported: BTreeSet<String>,
    pub(crate) private_names: BTreeSet<String>,
    /// Import aliases that rename a struct, union or interface.
    pub(crate) type_aliases: FxHashSet<String>,
    /// Collected signature per function definition node.
    pub(crate) signatures: FxHashMap<NodeId, FunctionType>,
    /// Effective generic parameters per function definition node,
    /// including inferred ones.
    pub(crate) function_generics: FxHashMap<NodeId, Vec<GenericParamSpec>>,
    pub(crate) impl_specs: FxHashMap<NodeId, Rc<ImplementationSpec>>,
    pub(crate) method_set_specs: FxHashMap<NodeId, Rc<MethodSetSpec>>,
    /// Implementations declared by this module, in source order.
    pub(crate) local_impls: Vec<Rc<ImplementationSpec>>,
    pub(crate) local_method_sets: Vec<Rc<MethodSetSpec>>,
    pub(crate) packages: FxHashMap<String, Rc<PackageExports>>,
    pub(crate) package_name: String,
    pub(crate) private_package: bool,
    pub(crate) origins: FxHashMap<NodeId, String>,
    pub(crate) module_path: Option<String>,
    /// Set by a wildcard `dynimport`: undefined names stop being errors.
    pub(crate) allow_dynamic: bool,
    pub(crate) cx: Contexts,
}

impl Checker {
    pub fn new(module: &Module, options: &CheckOptions) -> Self {
        let mut checker = Checker {
            env: TypeEnv::new(),
            types: FxHashMap::default(),
            diagnostics: Vec::new(),
            implementations: Vec::new(),
            method_sets: Vec::new(),
            obligations: Vec::new(),
            declared: FxHashMap::default(),
            extern_signatures: FxHashMap::default(),
            exported: BTreeSet::new(),
            private_names: BTreeSet::new(),
            type_aliases: FxHashSet::default(),
            signatures: FxHashMap::default(),
            function_generics: FxHashMap::default(),
            impl_specs: FxHashMap::default(),
            method_set_specs: FxHashMap::default(),
            local_impls: Vec::new(),
            local_method_sets: Vec::new(),
            packages: options
                .packages
                .iter()
                .map(|exports| (exports.package.clone(), Rc::clone(exports)))
                .collect(),
            package_name: module.package_name().unwrap_or_default(),
            private_package: module.package.as_ref().is_some_and(|decl| decl.private),
            origins: module.origins.clone(),
            module_path: module.path.clone(),
            allow_dynamic: false,
            cx: Contexts::default(),
        };
        builtins::install(&mut checker, module, options.builtin_impls);
        for prelude in &options.prelude {
            checker.install_prelude(prelude);
        }
        checker
    }

    fn install_prelude(&mut self, exports: &PackageExports) {
        for (name, ty) in &exports.symbols {
            if self.env.lookup_global(name).is_none() {
                self.env.define_global(name.clone(), ty.clone());
            }
        }
        self.implementations.extend(exports.implementations.iter().cloned());
        self.method_sets.extend(exports.method_sets.iter().cloned());
    }

    // ── Reporting ──────────────────────────────────────────────────────

    pub(crate) fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>, at: &dyn Located) {
        self.diagnostics.push(Diagnostic::at(kind, message, at));
    }

    pub(crate) fn report_site(&mut self, kind: DiagnosticKind, message: impl Into<String>, site: Site) {
        self.diagnostics.push(Diagnostic::at_site(kind, message, site));
    }

    /// Cache the type inferred for `id` and hand it back.
    pub(crate) fn record(&mut self, id: NodeId, ty: Type) -> Type {
        self.types.insert(id, ty.clone());
        ty
    }

    /// `path:line:column` of a declaration site.
    pub(crate) fn describe_site(&self, site: Site) -> String {
        let Some(node) = site.node else {
            return "<unknown location>".to_string();
        };
        let path = self
            .origins
            .get(&node)
            .cloned()
            .or_else(|| self.module_path.clone())
            .unwrap_or_else(|| "<unknown file>".to_string());
        format!("{path}:{}:{}", site.span.line, site.span.column)
    }

    // ── Context helpers ────────────────────────────────────────────────

    pub(crate) fn in_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.env.push_scope();
        let out = f(self);
        self.env.pop_scope();
        out
    }

    /// Run `f` as a loop body; returns its result and the break values.
    pub(crate) fn in_loop<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> (R, Vec<Type>) {
        self.cx.loops.push(LoopFrame::default());
        let out = f(self);
        let frame = self.cx.loops.pop().unwrap_or_default();
        (out, frame.breaks)
    }

    pub(crate) fn in_breakpoint<R>(&mut self, label: &str, f: impl FnOnce(&mut Self) -> R) -> (R, Vec<Type>) {
        self.cx.breakpoints.push(BreakpointFrame {
            label: label.to_string(),
            breaks: Vec::new(),
        });
        let out = f(self);
        let breaks = self.cx.breakpoints.pop().map(|frame| frame.breaks).unwrap_or_default();
        (out, breaks)
    }

    /// Run `f` as a function body returning `ret`. Loops and breakpoints of
    /// the enclosing body are not visible inside.
    pub(crate) fn in_function<R>(&mut self, ret: Type, f: impl FnOnce(&mut Self) -> R) -> R {
        let loops = std::mem::take(&mut self.cx.loops);
        let breakpoints = std::mem::take(&mut self.cx.breakpoints);
        let iterators = std::mem::take(&mut self.cx.iterators);
        let rescue_depth = std::mem::replace(&mut self.cx.rescue_depth, 0);
        self.cx.returns.push(ret);
        let out = self.in_scope(f);
        self.cx.returns.pop();
        self.cx.loops = loops;
        self.cx.breakpoints = breakpoints;
        self.cx.iterators = iterators;
        self.cx.rescue_depth = rescue_depth;
        out
    }

    pub(crate) fn in_async<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.cx.async_depth += 1;
        let out = f(self);
        self.cx.async_depth -= 1;
        out
    }

    pub(crate) fn in_rescue<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.cx.rescue_depth += 1;
        let out = f(self);
        self.cx.rescue_depth -= 1;
        out
    }

    pub(crate) fn with_topic<R>(&mut self, topic: Type, f: impl FnOnce(&mut Self) -> R) -> R {
        self.cx.topics.push(topic);
        let out = f(self);
        self.cx.topics.pop();
        out
    }

    pub(crate) fn in_iterator<R>(&mut self, expected: Option<Type>, f: impl FnOnce(&mut Self) -> R) -> (R, Type) {
        self.cx.iterators.push(IteratorFrame {
            expected,
            element: Type::Unknown,
        });
        let out = f(self);
        let element = self.cx.iterators.pop().map(|frame| frame.element).unwrap_or(Type::Unknown);
        (out, element)
    }

    pub(crate) fn with_receiver<R>(&mut self, receiver: Type, f: impl FnOnce(&mut Self) -> R) -> R {
        self.cx.receivers.push(receiver);
        let out = f(self);
        self.cx.receivers.pop();
        out
    }

    /// Make the bounds of `params` and `where_clause` visible to member
    /// lookups on values of those parameter types.
    pub(crate) fn with_constraints<R>(
        &mut self,
        params: &[GenericParamSpec],
        where_clause: &[crate::specs::WhereConstraintSpec],
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let mut frame: FxHashMap<String, Vec<Type>> = FxHashMap::default();
        for param in params {
            frame.entry(param.name.clone()).or_default().extend(param.constraints.iter().cloned());
        }
        for clause in where_clause {
            frame
                .entry(clause.type_param.clone())
                .or_default()
                .extend(clause.constraints.iter().cloned());
        }
        self.cx.constraints.push(frame);
        let out = f(self);
        self.cx.constraints.pop();
        out
    }

    pub(crate) fn with_generics<R>(&mut self, frame: GenericFrame, f: impl FnOnce(&mut Self) -> R) -> R {
        self.cx.generics.push(frame);
        let out = f(self);
        self.cx.generics.pop();
        out
    }

    /// Interface bounds declared for type parameter `name` in any
    /// enclosing generic context.
    pub(crate) fn bounds_of(&self, name: &str) -> Vec<Type> {
        self.cx
            .constraints
            .iter()
            .rev()
            .filter_map(|frame| frame.get(name))
            .flatten()
            .cloned()
            .collect()
    }

    // ── Definition lookups ─────────────────────────────────────────────

    pub(crate) fn struct_def(&self, name: &str) -> Option<Rc<StructType>> {
        match self.env.lookup_global(name)? {
            Type::Struct(def) => Some(Rc::clone(def)),
            _ => None,
        }
    }

    pub(crate) fn interface_def(&self, name: &str) -> Option<Rc<InterfaceType>> {
        match self.env.lookup_global(name)? {
            Type::Interface(def) => Some(Rc::clone(def)),
            _ => None,
        }
    }

    pub(crate) fn union_def(&self, name: &str) -> Option<Rc<UnionType>> {
        match self.env.lookup_global(name)? {
            Type::Union(def) => Some(Rc::clone(def)),
            _ => None,
        }
    }

    /// The current definition of the interface a constraint names. A
    /// constraint resolved before its interface was collected still
    /// carries the placeholder, so the global table wins.
    pub(crate) fn current_interface(&self, def: &Rc<InterfaceType>) -> Rc<InterfaceType> {
        self.interface_def(&def.name).unwrap_or_else(|| Rc::clone(def))
    }

    // ── Compatibility ──────────────────────────────────────────────────

    /// Whether a value of `actual` may flow where `expected` is required:
    /// plain assignability, or an implementation of an expected interface.
    pub(crate) fn accepts(&self, actual: &Type, expected: &Type) -> bool {
        if is_assignable(actual, expected) {
            return true;
        }
        match expected {
            Type::Nullable(inner) if inner.is_interface_like() => {
                actual.is_nil() || self.accepts(actual, inner)
            }
            _ => match expected.as_interface() {
                Some((def, args)) => {
                    let def = self.current_interface(def);
                    self.type_implements(actual, &def, args).is_ok()
                }
                None => false,
            },
        }
    }

    pub(crate) fn type_at(&self, id: NodeId) -> Type {
        self.types.get(&id).cloned().unwrap_or(Type::Unknown)
    }
}
