//! Member access and method lookup.
//!
//! A member name on a receiver resolves, in order, to a struct field, a
//! builtin member of the receiver's shape, a method from a matching methods
//! block or implementation, an interface default, and finally a free
//! function taking the receiver as its first argument (UFCS).

use std::rc::Rc;

use tracing::trace;

use crate::assignable::normalize_special;
use crate::checker::Checker;
use crate::error::DiagnosticKind;
use crate::matching::{match_method_target, match_type_argument};
use crate::solver::ImplResolution;
use crate::specs::ImplementationSpec;
use crate::subst::{self, Bindings};
use crate::ty::{FunctionType, InterfaceType, PackageType, StructType, Type};
use crate::unions;

/// A failed lookup, ready to report.
pub(crate) type MemberError = (DiagnosticKind, String);

/// How a member is being looked up.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Lookup {
    /// The member is being called: methods win over non-callable fields.
    pub prefer_methods: bool,
    /// The receiver names a type (`Point.origin`) rather than a value.
    pub type_qualified: bool,
}

struct Candidate {
    label: String,
    method: FunctionType,
}

fn member_error(message: String) -> MemberError {
    (DiagnosticKind::Member, message)
}

/// A method as seen through a value: the receiver parameter is bound.
fn without_receiver(mut method: FunctionType) -> Type {
    if !method.params.is_empty() {
        method.params.remove(0);
    }
    Type::Function(Box::new(method))
}

fn is_callable(ty: &Type) -> bool {
    matches!(ty, Type::Function(_) | Type::Unknown | Type::TypeParam(_))
}

fn method(params: Vec<Type>, ret: Type) -> Type {
    Type::function(params, ret)
}

impl Checker {
    /// Resolve `name` on a value of type `object`.
    pub(crate) fn lookup_member(&self, object: &Type, name: &str, lookup: Lookup) -> Result<Type, MemberError> {
        trace!(%object, member = name, "member lookup");
        let object = match normalize_special(object) {
            Type::Alias(alias) => subst::instantiate_alias(&alias, &[]),
            other => other,
        };
        match &object {
            Type::Unknown => Ok(Type::Unknown),
            Type::TypeParam(param) => self.bounded_member(param, name),
            Type::Package(pkg) => package_member(pkg, name),
            Type::ImplNamespace(spec) => match spec.methods.get(name) {
                Some(method) => Ok(Type::Function(Box::new(method.clone()))),
                None => Err(member_error(format!("{} has no method '{name}'", spec.label()))),
            },
            _ if object.as_interface().is_some() => self.interface_member(&object, name, lookup),
            _ if object.struct_name().is_some() => self.struct_member(&object, name, lookup),
            _ => {
                if let Some(builtin) = builtin_member(&object, name) {
                    return Ok(builtin);
                }
                if let Some(found) = self.find_method(&object, name, lookup.type_qualified)? {
                    return Ok(found);
                }
                Err(member_error(self.missing_member(&object, name)))
            }
        }
    }

    fn missing_member(&self, object: &Type, name: &str) -> String {
        match object {
            Type::Array(_) => format!("array has no member '{name}'"),
            Type::Primitive(_) if object.is_string() => format!("string has no member '{name}'"),
            Type::Map(..) => format!("map has no member '{name}'"),
            Type::Nullable(_) => format!("cannot access member '{name}' on nullable type {object}; use '?.'"),
            Type::Union(_) | Type::UnionLiteral(_) => format!("union type {object} has no member '{name}'"),
            _ => format!("type {object} has no member '{name}'"),
        }
    }

    // ── Receivers ──────────────────────────────────────────────────────

    fn struct_member(&self, object: &Type, name: &str, lookup: Lookup) -> Result<Type, MemberError> {
        if object.is_error_variant() {
            if let Some(builtin) = error_member(name) {
                return Ok(builtin);
            }
        }
        let field = self.field_type(object, name);
        if let Some(field) = &field {
            if !lookup.prefer_methods || is_callable(field) {
                return Ok(field.clone());
            }
        }
        if let Some(found) = self.find_method(object, name, lookup.type_qualified)? {
            return Ok(found);
        }
        if let Some(field) = field {
            return Ok(field);
        }
        let struct_name = object.struct_name().unwrap_or_default();
        Err(member_error(format!("struct '{struct_name}' has no member '{name}'")))
    }

    /// The current definition of the struct behind `object`.
    fn struct_of(&self, object: &Type) -> Option<(Rc<StructType>, Vec<Type>)> {
        let name = object.struct_name()?;
        let def = self.struct_def(name).or_else(|| match object {
            Type::Struct(def) => Some(Rc::clone(def)),
            Type::Applied(base, _) => match base.as_ref() {
                Type::Struct(def) => Some(Rc::clone(def)),
                _ => None,
            },
            _ => None,
        })?;
        let args = match object {
            Type::Applied(_, args) => args.clone(),
            Type::StructInstance(inst) => inst.type_args.clone(),
            _ => Vec::new(),
        };
        Some((def, args))
    }

    /// Type of a named field, with the receiver's type arguments applied.
    pub(crate) fn field_type(&self, object: &Type, name: &str) -> Option<Type> {
        if let Type::StructInstance(inst) = object {
            if let Some(field) = inst.field(name) {
                return Some(field.clone());
            }
        }
        let (def, args) = self.struct_of(object)?;
        let field = def.field(name)?;
        Some(subst::substitute(field, &subst::bindings_for(&def.type_params, &args)))
    }

    /// `value.N` on a positional struct.
    pub(crate) fn positional_member(&self, object: &Type, index: u32) -> Result<Type, MemberError> {
        if object.is_open() {
            return Ok(Type::Unknown);
        }
        if let Type::StructInstance(inst) = object {
            if !inst.positional.is_empty() {
                return inst.positional.get(index as usize).cloned().ok_or_else(|| {
                    member_error(format!("positional field {index} out of range for struct '{}'", inst.name))
                });
            }
        }
        let Some((def, args)) = self.struct_of(object) else {
            return Err(member_error(format!("cannot access positional member {index} on type {object}")));
        };
        let Some(field) = def.positional.get(index as usize) else {
            return Err(member_error(format!(
                "positional field {index} out of range for struct '{}'",
                def.name
            )));
        };
        Ok(subst::substitute(field, &subst::bindings_for(&def.type_params, &args)))
    }

    fn interface_member(&self, object: &Type, name: &str, lookup: Lookup) -> Result<Type, MemberError> {
        let Some((def, args)) = object.as_interface() else {
            return Ok(Type::Unknown);
        };
        let def = self.current_interface(def);
        if def.name == "Error" {
            if let Some(builtin) = error_member(name) {
                return Ok(builtin);
            }
        }
        if let Some(method) = self.interface_method(&def, args, object, name) {
            return Ok(without_receiver(method));
        }
        if let Some(found) = self.find_method(object, name, lookup.type_qualified)? {
            return Ok(found);
        }
        Err(member_error(format!("interface '{}' has no method '{name}'", def.name)))
    }

    /// An interface method, searching base interfaces, with `Self` and
    /// the interface parameters bound.
    fn interface_method(&self, def: &InterfaceType, args: &[Type], this: &Type, name: &str) -> Option<FunctionType> {
        if let Some(sig) = def.methods.get(name) {
            let mut bindings = subst::bindings_for(&def.type_params, args);
            bindings.insert("Self".into(), this.clone());
            return Some(subst::substitute_function(sig, &bindings));
        }
        def.base_interfaces.iter().find_map(|base| {
            let (base_def, base_args) = base.as_interface()?;
            let base_def = self.current_interface(base_def);
            self.interface_method(&base_def, base_args, this, name)
        })
    }

    /// A member of a value whose type is a generic parameter, through its
    /// declared bounds.
    fn bounded_member(&self, param: &str, name: &str) -> Result<Type, MemberError> {
        let this = Type::param(param);
        for bound in self.bounds_of(param) {
            let Ok((def, args)) = self.constraint_interface(&bound) else {
                continue;
            };
            if let Some(method) = self.interface_method(&def, &args, &this, name) {
                return Ok(without_receiver(method));
            }
        }
        Ok(Type::Unknown)
    }

    // ── Methods ────────────────────────────────────────────────────────

    /// Find a method for `object` among methods blocks, implementations,
    /// interface defaults and UFCS functions, in that order of preference.
    pub(crate) fn find_method(
        &self,
        object: &Type,
        name: &str,
        type_qualified: bool,
    ) -> Result<Option<Type>, MemberError> {
        let mut candidates = Vec::new();

        for set in &self.method_sets {
            let Some(method) = set.methods.get(name) else {
                continue;
            };
            let qualified = set.type_qualified.contains(name);
            if qualified && !type_qualified {
                continue;
            }
            let Some(found) = match_method_target(object, &set.target, &set.type_params) else {
                continue;
            };
            let mut bindings = found.bindings;
            bindings.insert("Self".into(), object.clone());
            candidates.push(Candidate {
                label: set.label(),
                method: subst::substitute_function(method, &bindings),
            });
        }

        let mut defaults: Vec<(Rc<InterfaceType>, Rc<ImplementationSpec>)> = Vec::new();
        let mut interfaces: Vec<&str> = Vec::new();
        for spec in &self.implementations {
            if spec.impl_name.is_none() && !interfaces.contains(&spec.interface_name.as_str()) {
                interfaces.push(&spec.interface_name);
            }
        }
        for iface_name in interfaces {
            let Some(def) = self.interface_def(iface_name) else {
                continue;
            };
            let provides = self
                .implementations
                .iter()
                .any(|spec| spec.interface_name == iface_name && spec.methods.contains_key(name));
            let has_default = def.defaults.contains(name);
            if !provides && !has_default {
                continue;
            }
            match self.resolve_implementation(object, &def, &[]) {
                ImplResolution::Found(found) => match found.spec.methods.get(name) {
                    Some(method) => candidates.push(Candidate {
                        label: found.spec.label(),
                        method: subst::substitute_function(method, &found.bindings),
                    }),
                    None if has_default => defaults.push((def, found.spec)),
                    None => {}
                },
                ImplResolution::Ambiguous(message) if provides => {
                    return Err((DiagnosticKind::Ambiguity, message));
                }
                _ => {}
            }
        }

        if candidates.len() > 1 {
            let mut labels: Vec<String> = candidates.iter().map(|c| c.label.clone()).collect();
            labels.sort();
            return Err((
                DiagnosticKind::Ambiguity,
                format!("ambiguous method '{name}' for {object}: {}", labels.join(", ")),
            ));
        }
        if let Some(candidate) = candidates.pop() {
            trace!(member = name, source = %candidate.label, "method resolved");
            return Ok(Some(self.bind_receiver(candidate.method, type_qualified)));
        }

        if let Some((def, spec)) = defaults.first() {
            let Some(sig) = def.methods.get(name) else {
                return Ok(None);
            };
            let mut bindings = Bindings::default();
            for (param, arg) in def.type_params.iter().zip(&spec.interface_args) {
                bindings.insert(param.name.clone(), arg.clone());
            }
            bindings.insert("Self".into(), object.clone());
            let method = subst::substitute_function(sig, &bindings);
            return Ok(Some(self.bind_receiver(method, type_qualified)));
        }

        if type_qualified {
            return Ok(None);
        }
        Ok(self.ufcs_candidate(object, name))
    }

    fn bind_receiver(&self, method: FunctionType, type_qualified: bool) -> Type {
        if type_qualified {
            Type::Function(Box::new(method))
        } else {
            without_receiver(method)
        }
    }

    /// A visible free function whose first parameter accepts `object`.
    fn ufcs_candidate(&self, object: &Type, name: &str) -> Option<Type> {
        let Some(Type::Function(func)) = self.env.lookup(name) else {
            return None;
        };
        let first = func.params.first()?;
        if first.is_open() || self.accepts(object, first) {
            trace!(member = name, "ufcs candidate");
            let mut bindings = Bindings::default();
            // `accepts` has admitted the receiver. A structural miss (a
            // non-nil receiver for a nullable parameter) leaves the
            // function's generic parameters unbound.
            if match_type_argument(object, first, &mut bindings).is_none() {
                trace!(member = name, "ufcs receiver bound no parameters");
            }
            return Some(without_receiver(subst::substitute_function(func, &bindings)));
        }
        None
    }

    /// The type a global type name denotes when used as a receiver, or
    /// `None` when the name is shadowed or is not a type.
    ///
    /// A module-level value such as `p := Point{..}` is bound to the same
    /// `Type::Struct` as the declaration of `Point`, so only a binding that
    /// carries its own definition's name (or an import alias of one) counts.
    pub(crate) fn type_named(&self, name: &str) -> Option<Type> {
        let local = self.env.lookup(name)?;
        let global = self.env.lookup_global(name)?;
        if !std::ptr::eq(local, global) {
            return None;
        }
        let declared = match global {
            Type::Struct(def) => &def.name,
            Type::Union(def) => &def.name,
            Type::Interface(def) => &def.name,
            _ => return None,
        };
        if declared != name && !self.type_aliases.contains(name) {
            return None;
        }
        Some(global.clone())
    }

    /// Safe access: look through `nil`, then restore it on the result.
    pub(crate) fn safe_member(&self, object: &Type, name: &str, lookup: Lookup) -> Result<Type, MemberError> {
        let receiver = unions::strip_nil(object);
        let result = self.lookup_member(&receiver, name, lookup)?;
        if object.can_be_nil() && !object.is_unknown() && !result.can_be_nil() {
            return Ok(Type::nullable(result));
        }
        Ok(result)
    }
}

fn package_member(pkg: &PackageType, name: &str) -> Result<Type, MemberError> {
    if pkg.private_symbols.contains(name) {
        return Err((
            DiagnosticKind::Import,
            format!("package '{}' symbol '{name}' is private", pkg.package),
        ));
    }
    pkg.symbols
        .get(name)
        .cloned()
        .ok_or_else(|| member_error(format!("package '{}' has no symbol '{name}'", pkg.package)))
}

/// Members every value of a builtin shape carries.
fn builtin_member(object: &Type, name: &str) -> Option<Type> {
    match object {
        Type::Iterator(element) => match name {
            "next" => Some(method(vec![], Type::nullable((**element).clone()))),
            "close" => Some(method(vec![], Type::nil())),
            _ => None,
        },
        Type::Proc(result) | Type::Future(result) => match name {
            "status" => Some(method(vec![], Type::named_struct("ProcStatus"))),
            "value" => Some(method(
                vec![],
                unions::normalize(vec![(**result).clone(), Type::named_struct("ProcError")]),
            )),
            "cancel" => Some(method(vec![], Type::nil())),
            "is_ready" => Some(method(vec![], Type::bool())),
            _ => None,
        },
        _ => None,
    }
}

fn error_member(name: &str) -> Option<Type> {
    match name {
        "message" => Some(method(vec![], Type::string())),
        "cause" => Some(method(vec![], Type::nullable(Type::named_struct("Error")))),
        "value" => Some(Type::Unknown),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs::{GenericParamSpec, MethodSetSpec};
    use crate::CheckOptions;
    use lumen_ast::Module;

    fn checker() -> Checker {
        Checker::new(&Module::default(), &CheckOptions::default())
    }

    fn point() -> Type {
        Type::Struct(Rc::new(StructType {
            name: "Point".into(),
            fields: vec![("x".into(), Type::i32()), ("y".into(), Type::i32())],
            positional: vec![Type::i32(), Type::i32()],
            ..Default::default()
        }))
    }

    fn boxed() -> Rc<StructType> {
        Rc::new(StructType {
            name: "Box".into(),
            type_params: vec![GenericParamSpec::new("T")],
            fields: vec![("value".into(), Type::param("T"))],
            positional: vec![Type::param("T")],
            ..Default::default()
        })
    }

    #[test]
    fn fields_substitute_type_arguments() {
        let mut c = checker();
        c.env.define_global("Box", Type::Struct(boxed()));
        let applied = Type::applied(Type::Struct(boxed()), vec![Type::string()]);
        assert_eq!(c.lookup_member(&applied, "value", Lookup::default()), Ok(Type::string()));
        assert_eq!(c.positional_member(&applied, 0), Ok(Type::string()));
        let err = c.positional_member(&applied, 3).unwrap_err();
        assert_eq!(err.1, "positional field 3 out of range for struct 'Box'");
    }

    #[test]
    fn methods_blocks_supply_members() {
        let mut c = checker();
        let mut set = MethodSetSpec::new(point());
        set.methods.insert(
            "norm".into(),
            FunctionType::new(vec![point()], Type::f64()),
        );
        c.method_sets.push(Rc::new(set));
        let found = c.lookup_member(&point(), "norm", Lookup::default()).unwrap();
        assert_eq!(found.to_string(), "fn() -> f64");
        let err = c.lookup_member(&point(), "area", Lookup::default()).unwrap_err();
        assert_eq!(err.1, "struct 'Point' has no member 'area'");
    }

    #[test]
    fn ufcs_applies_when_no_method_matches() {
        let mut c = checker();
        c.env.define_global("twice", Type::function(vec![Type::i32()], Type::i32()));
        let found = c.lookup_member(&Type::i32(), "twice", Lookup::default()).unwrap();
        assert_eq!(found.to_string(), "fn() -> i32");
        let err = c.lookup_member(&Type::array(Type::i32()), "twice", Lookup::default()).unwrap_err();
        assert_eq!(err.1, "array has no member 'twice'");
    }

    #[test]
    fn safe_access_rewraps_nil() {
        let c = checker();
        let found = c.safe_member(&Type::nullable(point()), "x", Lookup::default()).unwrap();
        assert_eq!(found, Type::nullable(Type::i32()));
    }

    #[test]
    fn builtin_members_of_procs() {
        let c = checker();
        let status = c.lookup_member(&Type::proc(Type::i32()), "value", Lookup::default()).unwrap();
        assert_eq!(status.to_string(), "fn() -> i32 | ProcError");
    }
}
