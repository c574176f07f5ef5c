//! Interface satisfaction.
//!
//! Decides whether a type implements an interface: intrinsic markers,
//! structural identity, implementation matches ranked by specificity and
//! duck-typed method sets, recursing through the obligations each
//! candidate carries. Obligations collected during checking are evaluated
//! here once the module walk is complete.

mod ranking;

use std::rc::Rc;

use tracing::debug;

use crate::assignable::{equivalent_for_signature, is_assignable};
use crate::checker::Checker;
use crate::error::DiagnosticKind;
use crate::matching::match_method_target;
use crate::specs::{non_empty, ImplementationSpec, MethodSetSpec, Obligation};
use crate::subst::{self, Bindings};
use crate::ty::{FunctionType, InterfaceType, Type};

/// Recursion guard for mutually dependent implementation constraints.
const MAX_DEPTH: usize = 32;

/// An implementation whose target matched a subject.
pub(crate) struct ImplMatch {
    pub spec: Rc<ImplementationSpec>,
    /// Bindings of the implementation's own parameters plus `Self`.
    pub bindings: Bindings,
}

pub(crate) enum ImplResolution {
    Found(ImplMatch),
    /// The full "ambiguous implementations of ..." message.
    Ambiguous(String),
    /// The most informative rejection detail, possibly empty.
    NotFound(String),
}

fn keep_longest(best: &mut String, candidate: String) {
    if candidate.len() > best.len() {
        *best = candidate;
    }
}

fn interface_label(iface: &InterfaceType, args: &[Type]) -> String {
    let mut label = iface.name.clone();
    for arg in args {
        label.push(' ');
        label.push_str(&arg.to_string());
    }
    label
}

fn args_compatible(actual: &[Type], expected: &[Type]) -> bool {
    expected.is_empty()
        || (actual.len() == expected.len()
            && actual
                .iter()
                .zip(expected)
                .all(|(a, e)| equivalent_for_signature(a, e) || is_assignable(a, e)))
}

fn signatures_compatible(actual: &FunctionType, expected: &FunctionType) -> bool {
    let compatible = |a: &Type, e: &Type| equivalent_for_signature(a, e) || is_assignable(a, e);
    actual.params.len() == expected.params.len()
        && actual.params.iter().zip(&expected.params).all(|(a, e)| compatible(a, e))
        && compatible(&actual.ret, &expected.ret)
}

/// Interface parameters a caller must supply; those bound by the
/// self-type pattern are implied by the subject.
pub(crate) fn explicit_param_count(iface: &InterfaceType) -> usize {
    let mut implied = Vec::new();
    if let Some(pattern) = &iface.self_pattern {
        pattern.for_each_name(&mut |name, _| implied.push(name.to_string()));
    }
    iface
        .type_params
        .iter()
        .filter(|param| !implied.contains(&param.name))
        .count()
}

impl Checker {
    /// Whether `subject` implements `iface` applied to `args`. The error
    /// carries the most specific reason available, which may be empty.
    pub(crate) fn type_implements(&self, subject: &Type, iface: &InterfaceType, args: &[Type]) -> Result<(), String> {
        self.implements_at(subject, iface, args, 0)
    }

    fn implements_at(&self, subject: &Type, iface: &InterfaceType, args: &[Type], depth: usize) -> Result<(), String> {
        if depth > MAX_DEPTH {
            return Err(format!("constraint resolution for {} is too deep", iface.name));
        }
        let subject = match subject {
            Type::Alias(alias) => subst::instantiate_alias(alias, &[]),
            other => other.clone(),
        };
        if subject.is_open() || intrinsic(&subject, &iface.name) {
            return Ok(());
        }
        if let Some((def, subject_args)) = subject.as_interface() {
            if def.name == iface.name && args_compatible(subject_args, args) {
                return Ok(());
            }
            if self.extends_interface(&self.current_interface(def), &iface.name, depth) {
                return Ok(());
            }
        }

        let mut detail = String::new();
        match self.resolve_implementation_at(&subject, iface, args, depth) {
            ImplResolution::Found(_) => return Ok(()),
            ImplResolution::Ambiguous(message) => return Err(message),
            ImplResolution::NotFound(reason) => keep_longest(&mut detail, reason),
        }

        match &subject {
            Type::Nullable(inner) => return self.implements_at(inner, iface, args, depth + 1),
            Type::UnionLiteral(members) => {
                for member in members {
                    self.implements_at(member, iface, args, depth + 1)
                        .map_err(|reason| member_failure(member, iface, args, &reason))?;
                }
                return Ok(());
            }
            _ => {}
        }

        for set in &self.method_sets {
            match self.method_set_provides(set, &subject, iface, args, depth) {
                Ok(()) => return Ok(()),
                Err(reason) => keep_longest(&mut detail, reason),
            }
        }
        Err(detail)
    }

    fn extends_interface(&self, def: &InterfaceType, target: &str, depth: usize) -> bool {
        if depth > MAX_DEPTH {
            return false;
        }
        def.base_interfaces.iter().any(|base| match base.as_interface() {
            Some((base_def, _)) => {
                let base_def = self.current_interface(base_def);
                base_def.name == target || self.extends_interface(&base_def, target, depth + 1)
            }
            None => false,
        })
    }

    /// Find the single most specific implementation of `iface` for
    /// `subject`.
    pub(crate) fn resolve_implementation(&self, subject: &Type, iface: &InterfaceType, args: &[Type]) -> ImplResolution {
        self.resolve_implementation_at(subject, iface, args, 0)
    }

    fn resolve_implementation_at(
        &self,
        subject: &Type,
        iface: &InterfaceType,
        args: &[Type],
        depth: usize,
    ) -> ImplResolution {
        let mut detail = String::new();
        let mut matches = Vec::new();
        for spec in &self.implementations {
            if spec.impl_name.is_some() || spec.interface_name != iface.name {
                continue;
            }
            let Some(found) = match_method_target(subject, &spec.target, &spec.type_params) else {
                continue;
            };
            let mut bindings = found.bindings;
            bindings.insert("Self".into(), subject.clone());
            let actual_args: Vec<Type> = spec
                .interface_args
                .iter()
                .map(|arg| subst::substitute(arg, &bindings))
                .collect();
            if !args_compatible(&actual_args, args) {
                keep_longest(
                    &mut detail,
                    format!(
                        "{}: interface arguments {} do not match {}",
                        spec.label(),
                        interface_label(iface, &actual_args),
                        interface_label(iface, args)
                    ),
                );
                continue;
            }
            let obligations = subst::substitute_obligations(&spec.obligations, &bindings);
            if let Err(reason) = self.obligations_hold(&obligations, depth + 1) {
                keep_longest(&mut detail, format!("{}: {reason}", spec.label()));
                continue;
            }
            matches.push(ImplMatch {
                spec: Rc::clone(spec),
                bindings,
            });
        }

        match ranking::select(matches) {
            Ok(best) => ImplResolution::Found(best),
            Err(tied) if tied.is_empty() => ImplResolution::NotFound(detail),
            Err(tied) => {
                let mut labels: Vec<String> = tied.iter().map(|m| m.spec.label()).collect();
                labels.sort();
                let message = format!(
                    "ambiguous implementations of {} for {subject}: {}",
                    interface_label(iface, args),
                    labels.join(", ")
                );
                debug!(interface = %iface.name, %subject, candidates = labels.len(), "ambiguous implementations");
                ImplResolution::Ambiguous(message)
            }
        }
    }

    /// Duck-typed satisfaction: the method set supplies every interface
    /// method without a default, with compatible signatures.
    fn method_set_provides(
        &self,
        set: &MethodSetSpec,
        subject: &Type,
        iface: &InterfaceType,
        args: &[Type],
        depth: usize,
    ) -> Result<(), String> {
        let Some(found) = match_method_target(subject, &set.target, &set.type_params) else {
            return Err(String::new());
        };
        let label = set.label();
        if iface.methods.is_empty() {
            return Err(format!("{label}: interface {} declares no methods", iface.name));
        }
        let mut bindings = found.bindings;
        bindings.insert("Self".into(), subject.clone());
        let mut iface_bindings = subst::bindings_for(&iface.type_params, args);
        iface_bindings.insert("Self".into(), subject.clone());

        for (name, sig) in &iface.methods {
            let Some(method) = set.methods.get(name) else {
                if iface.defaults.contains(name) {
                    continue;
                }
                return Err(format!("{label}: missing method '{name}'"));
            };
            let expected = subst::substitute_function(sig, &iface_bindings);
            let actual = subst::substitute_function(method, &bindings);
            if !signatures_compatible(&actual, &expected) {
                return Err(format!(
                    "{label}: method '{name}' has type {}, expected {}",
                    Type::Function(Box::new(actual)),
                    Type::Function(Box::new(expected))
                ));
            }
            let obligations: Vec<Obligation> = subst::substitute_obligations(&method.obligations, &bindings)
                .into_iter()
                .map(|mut ob| {
                    if ob.context.is_empty() {
                        ob.context = format!("via method '{name}'");
                    }
                    ob
                })
                .collect();
            self.obligations_hold(&obligations, depth + 1)
                .map_err(|reason| format!("{label}: {reason}"))?;
        }
        let obligations = subst::substitute_obligations(&set.obligations, &bindings);
        self.obligations_hold(&obligations, depth + 1)
            .map_err(|reason| format!("{label}: {reason}"))
    }

    /// Whether every obligation holds, describing the first failure.
    pub(crate) fn obligations_satisfied(&self, obligations: &[Obligation]) -> Result<(), String> {
        self.obligations_hold(obligations, 0)
    }

    fn obligations_hold(&self, obligations: &[Obligation], depth: usize) -> Result<(), String> {
        for ob in obligations {
            if ob.subject.is_open() {
                continue;
            }
            let (iface, args) = self.constraint_interface(&ob.constraint)?;
            self.implements_at(&ob.subject, &iface, &args, depth).map_err(|reason| {
                let mut message = format!("{} does not implement {}", ob.subject, interface_label(&iface, &args));
                if !reason.is_empty() {
                    message.push_str(": ");
                    message.push_str(&reason);
                }
                message
            })?;
        }
        Ok(())
    }

    /// The interface a constraint type refers to.
    pub(crate) fn constraint_interface(&self, constraint: &Type) -> Result<(Rc<InterfaceType>, Vec<Type>), String> {
        if let Some((def, args)) = constraint.as_interface() {
            return Ok((self.current_interface(def), args.to_vec()));
        }
        let (name, args) = match constraint {
            Type::Applied(base, args) => (base.struct_name(), args.clone()),
            other => (other.struct_name().or_else(|| other.union_name()), Vec::new()),
        };
        let Some(name) = name else {
            return Err(format!("must reference an interface (got {constraint})"));
        };
        if let Some(def) = self.interface_def(name) {
            return Ok((def, args));
        }
        if self.env.lookup_global(name).is_some() {
            Err(format!("references '{name}' which is not an interface"))
        } else {
            Err(format!("references unknown interface '{name}'"))
        }
    }

    // ── Module obligations ─────────────────────────────────────────────

    /// Evaluate every obligation recorded while checking the module.
    pub(crate) fn resolve_obligations(&mut self) {
        let obligations = std::mem::take(&mut self.obligations);
        debug!(count = obligations.len(), "resolving obligations");
        for ob in &obligations {
            self.evaluate_obligation(ob);
        }
    }

    /// Declaration obligations (open subject) validate the constraint
    /// itself; instantiated ones check the subject against it.
    fn evaluate_obligation(&mut self, ob: &Obligation) {
        let declared = ob.subject.is_open();
        if !declared && self.constraint_interface(&ob.constraint).is_err() {
            return;
        }
        let context = if ob.context.is_empty() {
            String::new()
        } else {
            format!(" ({})", ob.context)
        };
        let prefix = format!("{} constraint on {}{context}", non_empty(&ob.owner), ob.type_param);
        let (iface, args) = match self.constraint_interface(&ob.constraint) {
            Ok(found) => found,
            Err(reason) => {
                self.report_site(DiagnosticKind::Obligation, format!("{prefix} {reason}"), ob.site);
                return;
            }
        };

        let expected = explicit_param_count(&iface);
        let total = iface.type_params.len();
        let provided = args.len();
        let arity_error = if expected > 0 && provided == 0 {
            Some(format!("{prefix} requires {expected} type argument(s) for interface '{}'", iface.name))
        } else if provided != 0 && (provided < expected || provided > total) {
            Some(format!(
                "{prefix} expected {expected} type argument(s) for interface '{}', got {provided}",
                iface.name
            ))
        } else {
            None
        };
        if let Some(message) = arity_error {
            if declared {
                self.report_site(DiagnosticKind::Arity, message, ob.site);
            }
            return;
        }
        if declared {
            return;
        }

        if let Err(reason) = self.type_implements(&ob.subject, &iface, &args) {
            let (kind, message) = if reason.contains("ambiguous implementations of") {
                (DiagnosticKind::Ambiguity, format!("{prefix} is not satisfied: {reason}"))
            } else {
                let mut message = format!(
                    "{prefix} is not satisfied: {} does not implement {}",
                    ob.subject,
                    interface_label(&iface, &args)
                );
                if !reason.is_empty() {
                    message.push_str(": ");
                    message.push_str(&reason);
                }
                (DiagnosticKind::Obligation, message)
            };
            self.report_site(kind, message, ob.site);
        }
    }
}

fn member_failure(member: &Type, iface: &InterfaceType, args: &[Type], reason: &str) -> String {
    let mut message = format!("union member {member} does not implement {}", interface_label(iface, args));
    if !reason.is_empty() {
        message.push_str(": ");
        message.push_str(reason);
    }
    message
}

/// Marker interfaces every scalar satisfies without an implementation.
fn intrinsic(subject: &Type, iface: &str) -> bool {
    let scalar = matches!(subject, Type::Primitive(_)) && !subject.is_nil();
    match iface {
        "Hash" => scalar || subject.is_integer(),
        "Eq" => scalar || subject.is_integer() || subject.is_float(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs::GenericParamSpec;
    use crate::CheckOptions;
    use lumen_ast::Module;

    fn show() -> Rc<InterfaceType> {
        Rc::new(InterfaceType::named("Show"))
    }

    fn checker_with(impls: Vec<ImplementationSpec>) -> Checker {
        let mut checker = Checker::new(&Module::default(), &CheckOptions::default());
        checker.implementations.extend(impls.into_iter().map(Rc::new));
        checker
    }

    fn generic_array_impl() -> ImplementationSpec {
        let mut spec = ImplementationSpec::new("Show", Type::array(Type::param("T")));
        spec.type_params = vec![GenericParamSpec::new("T")];
        spec
    }

    #[test]
    fn concrete_implementation_is_preferred() {
        let c = checker_with(vec![
            generic_array_impl(),
            ImplementationSpec::new("Show", Type::array(Type::i32())),
        ]);
        match c.resolve_implementation(&Type::array(Type::i32()), &show(), &[]) {
            ImplResolution::Found(best) => assert_eq!(best.spec.label(), "impl Show for Array i32"),
            _ => panic!("expected a single implementation"),
        }
        assert!(c.type_implements(&Type::array(Type::string()), &show(), &[]).is_ok());
    }

    #[test]
    fn equally_specific_implementations_are_ambiguous() {
        let c = checker_with(vec![generic_array_impl(), generic_array_impl()]);
        let err = c.type_implements(&Type::array(Type::i32()), &show(), &[]).unwrap_err();
        assert_eq!(
            err,
            "ambiguous implementations of Show for Array i32: impl Show for Array T, impl Show for Array T"
        );
    }

    #[test]
    fn scalars_satisfy_marker_interfaces() {
        let c = checker_with(Vec::new());
        let hash = InterfaceType::named("Hash");
        assert!(c.type_implements(&Type::string(), &hash, &[]).is_ok());
        assert!(c.type_implements(&Type::array(Type::i32()), &hash, &[]).is_err());
    }

    #[test]
    fn nullable_and_union_subjects_check_members() {
        let c = checker_with(vec![
            ImplementationSpec::new("Show", Type::i32()),
            ImplementationSpec::new("Show", Type::string()),
        ]);
        assert!(c.type_implements(&Type::nullable(Type::i32()), &show(), &[]).is_ok());
        let union = Type::UnionLiteral(vec![Type::i32(), Type::string()]);
        assert!(c.type_implements(&union, &show(), &[]).is_ok());
        let mixed = Type::UnionLiteral(vec![Type::i32(), Type::bool()]);
        let err = c.type_implements(&mixed, &show(), &[]).unwrap_err();
        assert!(err.starts_with("union member bool does not implement Show"));
    }

    #[test]
    fn builtin_display_covers_scalars() {
        let c = checker_with(Vec::new());
        let display = c.interface_def("Display").unwrap();
        assert!(c.type_implements(&Type::f64(), &display, &[]).is_ok());
        assert!(c.type_implements(&Type::named_struct("Widget"), &display, &[]).is_err());
    }
}
