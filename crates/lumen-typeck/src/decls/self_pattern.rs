//! Self-type patterns: which target shapes may implement an interface.
//!
//! `interface Show for Point` admits only `Point`; `interface Mapper for
//! M _` admits type constructors such as `Array` or `Array T`; an interface
//! without a pattern admits any concrete type but no bare constructor.

use lumen_ast::{TypeExpr, TypeExprKind};
use rustc_hash::{FxHashMap, FxHashSet};

use super::resolve::primitive_named;
use crate::assignable::special_form;
use crate::checker::Checker;
use crate::error::{DiagnosticKind, Located};
use crate::specs::GenericParamSpec;
use crate::ty::{InterfaceType, Type};

/// Placeholder bindings made while matching one pattern.
type PatternBindings<'a> = FxHashMap<&'a str, String>;

impl Checker {
    /// Validate an implementation target against the interface's self-type
    /// pattern. Returns `false` after reporting a mismatch.
    pub(crate) fn check_self_pattern(
        &mut self,
        iface: &InterfaceType,
        target_expr: &TypeExpr,
        impl_params: &[GenericParamSpec],
        label: &str,
        at: &dyn Located,
    ) -> bool {
        let impl_generics: FxHashSet<&str> = impl_params.iter().map(|param| param.name.as_str()).collect();
        let pattern = match &iface.self_pattern {
            Some(pattern) if pattern.simple_name() != Some("Self") => pattern,
            _ => {
                if self.targets_constructor(target_expr, &impl_generics) {
                    self.report(
                        DiagnosticKind::Declaration,
                        format!(
                            "{label} cannot target a type constructor because the interface does not declare a self type"
                        ),
                        at,
                    );
                    return false;
                }
                return true;
            }
        };

        let iface_generics: FxHashSet<&str> = iface.type_params.iter().map(|param| param.name.as_str()).collect();
        let generic_target =
            self.targets_constructor(target_expr, &impl_generics) || open_last_argument(target_expr, &impl_generics);
        let matched = if allows_bare_constructor(pattern) && !generic_target {
            false
        } else {
            self.match_self_pattern(pattern, target_expr, &iface_generics, &mut PatternBindings::default())
        };
        if !matched {
            self.report(
                DiagnosticKind::Declaration,
                format!("{label} must match interface self type '{}'", type_expr_text(pattern)),
                at,
            );
        }
        matched
    }

    /// Structural match of a target against a pattern. Placeholders bind on
    /// first sight and must bind the same way on every later occurrence.
    fn match_self_pattern<'a>(
        &self,
        pattern: &'a TypeExpr,
        target: &TypeExpr,
        iface_generics: &FxHashSet<&str>,
        bindings: &mut PatternBindings<'a>,
    ) -> bool {
        match &pattern.kind {
            TypeExprKind::Wildcard => true,
            TypeExprKind::Simple(name) => {
                if self.is_placeholder(name, iface_generics) {
                    return bind_placeholder(name, target, bindings);
                }
                target.simple_name() == Some(name.as_str())
            }
            TypeExprKind::Generic { base, args } => {
                let constructor = allows_bare_constructor(pattern);
                let TypeExprKind::Generic {
                    base: target_base,
                    args: target_args,
                } = &target.kind
                else {
                    return constructor
                        && target.simple_name().is_some()
                        && self.match_self_pattern(base, target, iface_generics, bindings);
                };
                let base_matches = match base.simple_name() {
                    Some(name) if constructor && self.is_placeholder(name, iface_generics) => {
                        bind_placeholder(name, target, bindings)
                    }
                    _ => self.match_self_pattern(base, target_base, iface_generics, bindings),
                };
                if !base_matches || !args_compatible(args, target_args) {
                    return false;
                }
                args.iter()
                    .zip(target_args)
                    .filter(|(expected, _)| !is_wildcard(expected))
                    .all(|(expected, actual)| self.match_self_pattern(expected, actual, iface_generics, bindings))
            }
            _ => type_expr_text(pattern) == type_expr_text(target),
        }
    }

    /// A pattern name that stands for whatever the target puts there: an
    /// interface parameter, or any name that is not a known type.
    fn is_placeholder(&self, name: &str, iface_generics: &FxHashSet<&str>) -> bool {
        if name.is_empty() || name == "Self" || name == "_" {
            return false;
        }
        if iface_generics.contains(name) {
            return true;
        }
        if primitive_named(name).is_some() || special_form(name, &[]).is_some() {
            return false;
        }
        !matches!(
            self.env.lookup_global(name),
            Some(Type::Struct(_) | Type::StructInstance(_) | Type::Interface(_) | Type::Union(_))
        )
    }

    /// Whether `target` names a type constructor rather than a type: a
    /// generic named bare (`Array`), with a wildcard (`Array _`) or with
    /// too few arguments.
    fn targets_constructor(&self, target: &TypeExpr, impl_generics: &FxHashSet<&str>) -> bool {
        match &target.kind {
            TypeExprKind::Simple(name) => {
                !impl_generics.contains(name.as_str()) && self.expected_type_args(name).is_some_and(|n| n > 0)
            }
            TypeExprKind::Generic { base, args } => {
                if args.iter().any(is_wildcard) {
                    return true;
                }
                let Some(name) = base.base_name() else {
                    return false;
                };
                if impl_generics.contains(name) {
                    return false;
                }
                let Some(expected) = self.expected_type_args(name) else {
                    return false;
                };
                args.len() < expected
            }
            _ => false,
        }
    }

    /// How many type arguments the generic type `name` declares.
    fn expected_type_args(&self, name: &str) -> Option<usize> {
        match name {
            "Map" | "HashMap" => return Some(2),
            _ if special_form(name, &[]).is_some() => return Some(1),
            _ => {}
        }
        if let Some(def) = self.struct_def(name) {
            return Some(def.type_params.len());
        }
        self.union_def(name).map(|def| def.type_params.len())
    }
}

/// `Array T` where `T` is a parameter of the implementation: the
/// constructor stays open in the position a `M _` pattern abstracts over.
fn open_last_argument(target: &TypeExpr, impl_generics: &FxHashSet<&str>) -> bool {
    match &target.kind {
        TypeExprKind::Generic { args, .. } => args
            .last()
            .and_then(TypeExpr::simple_name)
            .is_some_and(|last| impl_generics.contains(last)),
        _ => false,
    }
}

/// A generic pattern with a wildcard argument, such as `M _`.
fn allows_bare_constructor(pattern: &TypeExpr) -> bool {
    match &pattern.kind {
        TypeExprKind::Generic { args, .. } => args.iter().any(is_wildcard),
        _ => false,
    }
}

fn is_wildcard(expr: &TypeExpr) -> bool {
    matches!(expr.kind, TypeExprKind::Wildcard) || expr.simple_name() == Some("_")
}

fn bind_placeholder<'a>(name: &'a str, target: &TypeExpr, bindings: &mut PatternBindings<'a>) -> bool {
    let text = type_expr_text(target);
    match bindings.get(name) {
        Some(existing) => *existing == text,
        None => {
            bindings.insert(name, text);
            true
        }
    }
}

/// Argument lists of different lengths agree when the extra tail is all
/// wildcards.
fn args_compatible(pattern: &[TypeExpr], target: &[TypeExpr]) -> bool {
    let shorter = pattern.len().min(target.len());
    pattern[shorter..].iter().all(is_wildcard) && target[shorter..].iter().all(is_wildcard)
}

/// Source-like rendering of a type expression for diagnostics.
pub(crate) fn type_expr_text(expr: &TypeExpr) -> String {
    match &expr.kind {
        TypeExprKind::Simple(name) => name.clone(),
        TypeExprKind::Wildcard => "_".into(),
        TypeExprKind::Generic { base, args } => {
            let mut parts = vec![type_expr_text(base)];
            parts.extend(args.iter().map(type_expr_text));
            parts.join(" ")
        }
        TypeExprKind::Function { params, ret } => {
            let params: Vec<_> = params.iter().map(type_expr_text).collect();
            format!("({}) -> {}", params.join(", "), type_expr_text(ret))
        }
        TypeExprKind::Nullable(inner) => format!("{}?", type_expr_text(inner)),
        TypeExprKind::Result(inner) => format!("!{}", type_expr_text(inner)),
        TypeExprKind::Union(members) => members.iter().map(type_expr_text).collect::<Vec<_>>().join(" | "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_ast::Builder;

    #[test]
    fn renders_patterns_like_source() {
        let b = Builder::new();
        let pattern = b.generic_ty("F", vec![b.wildcard_ty()]);
        assert_eq!(type_expr_text(&pattern), "F _");
        let func = b.fn_ty(vec![b.ty("i32")], b.nullable_ty(b.ty("T")));
        assert_eq!(type_expr_text(&func), "(i32) -> T?");
    }
}
