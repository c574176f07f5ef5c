//! Implementation validation.
//!
//! Runs after every statement has been checked: each implementation
//! declared by the module must provide every interface method that lacks a
//! default, and each provided method must agree with the interface
//! signature once `Self` and the interface parameters are substituted.

use std::rc::Rc;

use crate::assignable::{equivalent_for_signature, is_assignable};
use crate::checker::Checker;
use crate::error::DiagnosticKind;
use crate::specs::ImplementationSpec;
use crate::subst::{self, Bindings};
use crate::ty::{FunctionType, InterfaceType, Type};

fn compatible(actual: &Type, expected: &Type) -> bool {
    equivalent_for_signature(actual, expected) || is_assignable(actual, expected)
}

/// The first way `actual` disagrees with `expected`, as message text.
fn signature_mismatch(label: &str, name: &str, actual: &FunctionType, expected: &FunctionType) -> Option<String> {
    if actual.type_params.len() != expected.type_params.len() {
        return Some(format!(
            "{label} method '{name}' expects {} generic parameter(s), got {}",
            expected.type_params.len(),
            actual.type_params.len()
        ));
    }
    if actual.params.len() != expected.params.len() {
        return Some(format!(
            "{label} method '{name}' expects {} parameter(s), got {}",
            expected.params.len(),
            actual.params.len()
        ));
    }
    for (i, (a, e)) in actual.params.iter().zip(&expected.params).enumerate() {
        if !compatible(a, e) && !compatible(e, a) {
            return Some(format!(
                "{label} method '{name}' parameter {} has type {a}, expected {e}",
                i + 1
            ));
        }
    }
    if !compatible(&actual.ret, &expected.ret) {
        return Some(format!(
            "{label} method '{name}' returns {}, expected {}",
            actual.ret, expected.ret
        ));
    }
    None
}

impl Checker {
    pub(crate) fn validate_implementations(&mut self) {
        let impls: Vec<Rc<ImplementationSpec>> = self.local_impls.clone();
        for spec in impls {
            let Some(iface) = self.interface_def(&spec.interface_name) else {
                continue;
            };
            self.validate_implementation(&spec, &iface);
        }
    }

    fn validate_implementation(&mut self, spec: &ImplementationSpec, iface: &InterfaceType) {
        let label = spec.label();
        let mut bindings = Bindings::default();
        bindings.insert("Self".into(), spec.target.clone());
        for (param, arg) in iface.type_params.iter().zip(&spec.interface_args) {
            bindings.insert(param.name.clone(), arg.clone());
        }

        for (name, required) in &iface.methods {
            let Some(provided) = spec.methods.get(name) else {
                if !iface.defaults.contains(name) {
                    self.report_site(
                        DiagnosticKind::Member,
                        format!("{label} missing method '{name}'"),
                        spec.site,
                    );
                }
                continue;
            };
            // Substitution drops bound parameters; compare declared counts.
            let mut expected = subst::substitute_function(required, &bindings);
            expected.type_params = required.type_params.clone();
            if let Some(message) = signature_mismatch(&label, name, provided, &expected) {
                self.report_site(DiagnosticKind::Mismatch, message, spec.site);
            }
        }
    }
}
