//! Builtin bindings installed before a module's own declarations.
//!
//! Registers the runtime-provided functions, the concurrency support
//! structs, the core interfaces (`Display`, `Clone`, `Ord`, `Error`,
//! `Hash`, `Eq`, `Awaitable`) and the `Ordering` union into the module
//! scope, plus implementations of the core interfaces for primitive and
//! numeric types.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use lumen_ast::{Module, StmtKind};

use crate::checker::Checker;
use crate::specs::{GenericParamSpec, ImplementationSpec};
use crate::ty::{FloatSuffix, FunctionType, IntegerSuffix, InterfaceType, StructType, Type, UnionType};

/// Core interfaces a module may replace with its own definition.
const REPLACEABLE: [&str; 6] = ["Display", "Clone", "Ord", "Error", "Hash", "Eq"];

pub(crate) fn install(checker: &mut Checker, module: &Module, with_impls: bool) {
    let env = &mut checker.env;
    env.define_global("true", Type::bool());
    env.define_global("false", Type::bool());

    // ── Functions ──────────────────────────────────────────────────────

    env.define_global("print", Type::function(vec![Type::Unknown], Type::nil()));
    env.define_global("proc_yield", Type::function(vec![], Type::nil()));
    env.define_global("proc_cancelled", Type::function(vec![], Type::bool()));
    env.define_global("proc_flush", Type::function(vec![], Type::nil()));
    env.define_global("proc_pending_tasks", Type::function(vec![], Type::i32()));

    // ── Structs ────────────────────────────────────────────────────────

    for name in ["AwaitWaker", "AwaitRegistration"] {
        env.define_global(name, Type::named_struct(name));
    }
    let t = Type::param("T");
    env.define_global(
        "DivMod",
        Type::Struct(Rc::new(StructType {
            name: "DivMod".into(),
            type_params: vec![GenericParamSpec::new("T")],
            fields: vec![("quotient".into(), t.clone()), ("remainder".into(), t.clone())],
            positional: vec![t.clone(), t],
            where_clause: Vec::new(),
        })),
    );
    env.define_global(
        "ProcError",
        Type::Struct(Rc::new(StructType {
            name: "ProcError".into(),
            fields: vec![("details".into(), Type::string())],
            positional: vec![Type::string()],
            ..Default::default()
        })),
    );

    // ── Ordering ───────────────────────────────────────────────────────

    let variants: Vec<Type> = ["Less", "Equal", "Greater"]
        .into_iter()
        .map(|name| {
            let variant = Type::named_struct(name);
            env.define_global(name, variant.clone());
            variant
        })
        .collect();
    let ordering = Type::Union(Rc::new(UnionType {
        name: "Ordering".into(),
        variants,
        ..Default::default()
    }));
    env.define_global("Ordering", ordering.clone());

    let statuses: Vec<Type> = ["Pending", "Resolved", "Cancelled", "Failed"]
        .into_iter()
        .map(|name| {
            let status = Type::named_struct(name);
            env.define_global(name, status.clone());
            status
        })
        .collect();
    env.define_global(
        "ProcStatus",
        Type::Union(Rc::new(UnionType {
            name: "ProcStatus".into(),
            variants: statuses,
            ..Default::default()
        })),
    );

    // ── Interfaces ─────────────────────────────────────────────────────

    let this = Type::param("Self");
    let error = interface("Error", |methods| {
        methods.insert("message".into(), method(vec![], Type::string()));
    });
    let error = Rc::new(InterfaceType {
        methods: {
            let mut methods = error.methods.clone();
            methods.insert("cause".into(), method(vec![], Type::nullable(Type::Interface(Rc::clone(&error)))));
            methods
        },
        ..(*error).clone()
    });
    let interfaces = [
        interface("Display", |methods| {
            methods.insert("to_string".into(), method(vec![], Type::string()));
        }),
        interface("Clone", |methods| {
            methods.insert("clone".into(), method(vec![], this.clone()));
        }),
        interface("Ord", |methods| {
            methods.insert("cmp".into(), method(vec![this.clone()], ordering.clone()));
        }),
        interface("Hash", |methods| {
            methods.insert("hash".into(), method(vec![], Type::int(IntegerSuffix::U64)));
        }),
        interface("Eq", |methods| {
            methods.insert("eq".into(), method(vec![this.clone()], Type::bool()));
        }),
        error,
        awaitable(),
    ];
    for def in interfaces {
        env.define_global(def.name.clone(), Type::Interface(def));
    }

    if with_impls {
        let overridden = module_interfaces(module);
        let impls = builtin_implementations(&ordering)
            .into_iter()
            .filter(|spec| !overridden.contains(spec.interface_name.as_str()))
            .map(Rc::new);
        checker.implementations.extend(impls);
    }
}

/// A receiver method: `Self` first, then `params`.
fn method(params: Vec<Type>, ret: Type) -> FunctionType {
    let mut all = vec![Type::param("Self")];
    all.extend(params);
    FunctionType::new(all, ret)
}

fn interface(name: &str, build: impl FnOnce(&mut BTreeMap<String, FunctionType>)) -> Rc<InterfaceType> {
    let mut methods = BTreeMap::new();
    build(&mut methods);
    Rc::new(InterfaceType {
        name: name.into(),
        methods,
        ..Default::default()
    })
}

fn awaitable() -> Rc<InterfaceType> {
    let output = Type::param("Output");
    let mut methods = BTreeMap::new();
    methods.insert("is_ready".into(), method(vec![], Type::bool()));
    methods.insert(
        "register".into(),
        method(vec![Type::named_struct("AwaitWaker")], Type::named_struct("AwaitRegistration")),
    );
    methods.insert("commit".into(), method(vec![], output));
    Rc::new(InterfaceType {
        name: "Awaitable".into(),
        type_params: vec![GenericParamSpec::new("Output")],
        methods,
        ..Default::default()
    })
}

fn module_interfaces(module: &Module) -> BTreeSet<&str> {
    module
        .body
        .iter()
        .filter_map(|stmt| match &stmt.kind {
            StmtKind::Interface(def) if REPLACEABLE.contains(&def.name.name.as_str()) => Some(def.name.name.as_str()),
            _ => None,
        })
        .collect()
}

fn scalar_types() -> Vec<Type> {
    let mut types = vec![Type::bool(), Type::char(), Type::string()];
    types.extend(IntegerSuffix::ALL.into_iter().map(Type::int));
    types.extend([Type::Float(FloatSuffix::F32), Type::Float(FloatSuffix::F64)]);
    types
}

/// `Display` and `Clone` for every scalar, `Ord` for numbers, strings and
/// chars.
pub fn builtin_implementations(ordering: &Type) -> Vec<ImplementationSpec> {
    let mut out = Vec::new();
    for target in scalar_types() {
        out.push(builtin_impl("Display", &target, "to_string", vec![], Type::string()));
        out.push(builtin_impl("Clone", &target, "clone", vec![], target.clone()));
        if !target.is_bool() {
            out.push(builtin_impl("Ord", &target, "cmp", vec![target.clone()], ordering.clone()));
        }
    }
    out
}

fn builtin_impl(iface: &str, target: &Type, name: &str, params: Vec<Type>, ret: Type) -> ImplementationSpec {
    let mut all = vec![target.clone()];
    all.extend(params);
    let mut spec = ImplementationSpec::new(iface, target.clone());
    spec.methods.insert(name.into(), FunctionType::new(all, ret));
    spec.is_builtin = true;
    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_impls_cover_core_interfaces() {
        let impls = builtin_implementations(&Type::named_struct("Ordering"));
        let labels: BTreeSet<String> = impls.iter().map(ImplementationSpec::label).collect();
        assert!(labels.contains("impl Display for string"));
        assert!(labels.contains("impl Clone for u8"));
        assert!(labels.contains("impl Ord for f64"));
        assert!(!labels.contains("impl Ord for bool"));
        assert!(impls.iter().all(|spec| spec.is_builtin));
    }

    #[test]
    fn receiver_methods_take_self_first() {
        let sig = method(vec![Type::i32()], Type::bool());
        assert_eq!(sig.params, vec![Type::param("Self"), Type::i32()]);
    }
}
