//! Structural matching of a receiver type against a target pattern.
//!
//! Implementation and method-set targets are patterns that may mention the
//! block's own generic parameters (`impl Show for Array T`). Matching a
//! concrete receiver binds those parameters and counts how many of them
//! were bound. The count says how generic the match was, so it plays no
//! part in ranking implementations against each other.

use crate::assignable::equivalent_for_signature;
use crate::specs::GenericParamSpec;
use crate::subst::{self, Bindings};
use crate::ty::{InterfaceType, Type};

/// A successful target match.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetMatch {
    /// Bindings for the pattern's parameters; unbound ones map to Unknown.
    pub bindings: Bindings,
    pub score: usize,
}

/// Match `object` against the target pattern of an implementation or
/// methods block declaring `params`.
pub fn match_method_target(object: &Type, target: &Type, params: &[GenericParamSpec]) -> Option<TargetMatch> {
    if is_string_like(object) && is_string_like(target) {
        return Some(finalize(Bindings::default(), params, 0));
    }
    match (object, target) {
        (Type::Primitive(a), Type::Primitive(b)) if a == b => {
            return Some(finalize(Bindings::default(), params, 0));
        }
        (Type::Integer(a), Type::Integer(b)) if a.suffix == b.suffix => {
            return Some(finalize(Bindings::default(), params, 0));
        }
        (Type::Float(a), Type::Float(b)) if a == b => {
            return Some(finalize(Bindings::default(), params, 0));
        }
        _ => {}
    }

    if target.is_type_param() {
        let mut bindings = Bindings::default();
        let score = match_type_argument(object, target, &mut bindings)?;
        return Some(finalize(bindings, params, score));
    }
    if let Type::UnionLiteral(members) = target {
        return match_union_literal_target(object, members, params);
    }

    let object_info = struct_info(object)?;
    let target_info = struct_info(target)?;
    if object_info.name.is_empty()
        || object_info.name != target_info.name
        || object_info.is_union != target_info.is_union
        || object_info.is_nullable != target_info.is_nullable
    {
        return None;
    }
    let mut bindings = Bindings::default();
    let mut score = 0;
    for (i, pattern) in target_info.args.iter().enumerate() {
        let actual = object_info.args.get(i).cloned().unwrap_or(Type::Unknown);
        score += match_type_argument(&actual, pattern, &mut bindings)?;
    }
    Some(finalize(bindings, params, score))
}

fn is_string_like(ty: &Type) -> bool {
    ty.is_string() || ty.struct_name() == Some("String")
}

fn match_union_literal_target(object: &Type, members: &[Type], params: &[GenericParamSpec]) -> Option<TargetMatch> {
    if let Type::UnionLiteral(actual) = object {
        if actual.len() != members.len() {
            return None;
        }
        let mut bindings = Bindings::default();
        let mut score = 0;
        for (actual, pattern) in actual.iter().zip(members) {
            score += match_type_argument(actual, pattern, &mut bindings)?;
        }
        return Some(finalize(bindings, params, score));
    }
    members.iter().find_map(|member| {
        let mut bindings = Bindings::default();
        let score = match_type_argument(object, member, &mut bindings)?;
        Some(finalize(bindings, params, score))
    })
}

fn finalize(mut bindings: Bindings, params: &[GenericParamSpec], score: usize) -> TargetMatch {
    for param in params {
        if !param.name.is_empty() {
            bindings.entry(param.name.clone()).or_insert(Type::Unknown);
        }
    }
    TargetMatch { bindings, score }
}

/// Match one type argument, binding parameters of `pattern` in `bindings`.
/// Returns the number of parameters newly bound to a concrete type.
pub fn match_type_argument(actual: &Type, pattern: &Type, bindings: &mut Bindings) -> Option<usize> {
    if pattern.is_unknown() || actual.is_unknown() {
        return Some(0);
    }
    match pattern {
        Type::TypeParam(name) if name.is_empty() => return Some(0),
        Type::TypeParam(name) => {
            if let Some(existing) = bindings.get(name) {
                return equivalent_for_signature(existing, actual).then_some(0);
            }
            bindings.insert(name.clone(), actual.clone());
            return Some(1);
        }
        Type::Nullable(inner) => {
            let Type::Nullable(actual_inner) = actual else {
                return None;
            };
            return match_type_argument(actual_inner, inner, bindings);
        }
        Type::Applied(base, args) => {
            let Type::Applied(actual_base, actual_args) = actual else {
                return None;
            };
            if !nominal_bases_compatible(actual_base, base) || args.len() != actual_args.len() {
                return None;
            }
            return match_all(actual_args, args, bindings);
        }
        Type::Union(def) => return (actual.union_name() == Some(def.name.as_str())).then_some(0),
        Type::Struct(_) | Type::StructInstance(_) => {
            return (actual.struct_name().is_some() && actual.struct_name() == pattern.struct_name())
                .then_some(0);
        }
        Type::UnionLiteral(members) => {
            if let Type::UnionLiteral(actual_members) = actual {
                if actual_members.len() != members.len() {
                    return None;
                }
                return match_all(actual_members, members, bindings);
            }
        }
        Type::Array(inner) | Type::Range(inner) | Type::Iterator(inner) | Type::Proc(inner) | Type::Future(inner) => {
            if let Some(actual_inner) = same_container(actual, pattern) {
                return match_type_argument(&actual_inner, inner, bindings);
            }
        }
        Type::Map(key, value) => {
            if let Type::Map(actual_key, actual_value) = actual {
                let k = match_type_argument(actual_key, key, bindings)?;
                let v = match_type_argument(actual_value, value, bindings)?;
                return Some(k + v);
            }
        }
        Type::Function(func) => {
            if let Type::Function(actual_func) = actual {
                if actual_func.params.len() != func.params.len() {
                    return None;
                }
                let params = match_all(&actual_func.params, &func.params, bindings)?;
                return Some(params + match_type_argument(&actual_func.ret, &func.ret, bindings)?);
            }
        }
        _ => {}
    }
    equivalent_for_signature(actual, pattern).then_some(0)
}

fn match_all(actual: &[Type], patterns: &[Type], bindings: &mut Bindings) -> Option<usize> {
    let mut score = 0;
    for (actual, pattern) in actual.iter().zip(patterns) {
        score += match_type_argument(actual, pattern, bindings)?;
    }
    Some(score)
}

fn same_container(actual: &Type, pattern: &Type) -> Option<Type> {
    match (actual, pattern) {
        (Type::Array(inner), Type::Array(_))
        | (Type::Range(inner), Type::Range(_))
        | (Type::Iterator(inner), Type::Iterator(_))
        | (Type::Proc(inner), Type::Proc(_))
        | (Type::Future(inner), Type::Future(_)) => Some((**inner).clone()),
        _ => None,
    }
}

fn nominal_bases_compatible(actual: &Type, pattern: &Type) -> bool {
    match pattern {
        Type::Struct(_) | Type::StructInstance(_) => {
            actual.struct_name().is_some() && actual.struct_name() == pattern.struct_name()
        }
        Type::Union(def) => actual.union_name() == Some(def.name.as_str()),
        Type::Interface(def) => matches!(actual, Type::Interface(other) if other.name == def.name),
        _ => equivalent_for_signature(actual, pattern),
    }
}

// ── Nominal shape ──────────────────────────────────────────────────────

struct StructInfo {
    name: String,
    args: Vec<Type>,
    is_union: bool,
    is_nullable: bool,
}

impl StructInfo {
    fn new(name: &str, args: Vec<Type>) -> Self {
        StructInfo {
            name: name.to_string(),
            args,
            is_union: false,
            is_nullable: false,
        }
    }
}

/// Builtin containers present as their nominal names so `methods Array T`
/// applies to array values.
fn struct_info(ty: &Type) -> Option<StructInfo> {
    let info = match ty {
        Type::Struct(def) if !def.name.is_empty() => StructInfo::new(&def.name, Vec::new()),
        Type::StructInstance(inst) if !inst.name.is_empty() => StructInfo::new(&inst.name, inst.type_args.clone()),
        Type::Union(def) if !def.name.is_empty() => StructInfo {
            is_union: true,
            ..StructInfo::new(&def.name, Vec::new())
        },
        Type::Nullable(inner) => StructInfo {
            is_nullable: true,
            ..StructInfo::new("?", vec![(**inner).clone()])
        },
        Type::Applied(base, args) => {
            if let Some(name) = base.struct_name() {
                StructInfo::new(name, args.clone())
            } else if let Some(name) = base.union_name() {
                StructInfo {
                    is_union: true,
                    ..StructInfo::new(name, args.clone())
                }
            } else {
                return None;
            }
        }
        Type::Array(elem) => StructInfo::new("Array", vec![(**elem).clone()]),
        Type::Range(elem) => StructInfo::new("Range", vec![(**elem).clone()]),
        Type::Iterator(elem) => StructInfo::new("Iterator", vec![(**elem).clone()]),
        Type::Proc(result) => StructInfo::new("Proc", vec![(**result).clone()]),
        Type::Future(result) => StructInfo::new("Future", vec![(**result).clone()]),
        Type::Map(key, value) => StructInfo::new("Map", vec![(**key).clone(), (**value).clone()]),
        Type::Alias(alias) => return struct_info(&subst::instantiate_alias(alias, &[])),
        _ => return None,
    };
    Some(info)
}

/// Bind the interface's own parameters to the implementation's interface
/// arguments, after substituting the target bindings into them.
pub fn extend_implementation_substitution(bindings: &mut Bindings, iface: &InterfaceType, args: &[Type]) {
    for (i, param) in iface.type_params.iter().enumerate() {
        if param.name.is_empty() {
            continue;
        }
        let arg = args
            .get(i)
            .map(|arg| subst::substitute(arg, bindings))
            .unwrap_or(Type::Unknown);
        bindings.insert(param.name.clone(), arg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::IntegerSuffix;

    fn params(names: &[&str]) -> Vec<GenericParamSpec> {
        names.iter().map(|name| GenericParamSpec::new(*name)).collect()
    }

    #[test]
    fn generic_container_binds_element() {
        let found = match_method_target(
            &Type::array(Type::i32()),
            &Type::array(Type::param("T")),
            &params(&["T"]),
        )
        .unwrap();
        assert_eq!(found.bindings.get("T"), Some(&Type::i32()));
        assert_eq!(found.score, 1);
    }

    #[test]
    fn concrete_target_scores_zero() {
        let found = match_method_target(&Type::array(Type::i32()), &Type::array(Type::i32()), &[]).unwrap();
        assert_eq!(found.score, 0);
        assert!(match_method_target(&Type::array(Type::string()), &Type::array(Type::i32()), &[]).is_none());
    }

    #[test]
    fn repeated_parameter_must_agree() {
        let target = Type::applied(Type::named_struct("Pair"), vec![Type::param("T"), Type::param("T")]);
        let same = Type::applied(Type::named_struct("Pair"), vec![Type::i32(), Type::i32()]);
        let mixed = Type::applied(Type::named_struct("Pair"), vec![Type::i32(), Type::bool()]);
        assert!(match_method_target(&same, &target, &params(&["T"])).is_some());
        assert!(match_method_target(&mixed, &target, &params(&["T"])).is_none());
    }

    #[test]
    fn unbound_params_default_to_unknown() {
        let found = match_method_target(
            &Type::named_struct("Point"),
            &Type::applied(Type::named_struct("Point"), vec![Type::param("T")]),
            &params(&["T", "U"]),
        )
        .unwrap();
        assert_eq!(found.bindings.get("U"), Some(&Type::Unknown));
        assert_eq!(found.score, 0);
    }

    #[test]
    fn primitives_match_by_kind_and_suffix() {
        assert!(match_method_target(&Type::string(), &Type::named_struct("String"), &[]).is_some());
        assert!(match_method_target(&Type::i32(), &Type::int(IntegerSuffix::I64), &[]).is_none());
        assert!(match_method_target(&Type::bool(), &Type::bool(), &[]).is_some());
    }

    #[test]
    fn union_literal_target_matches_any_member() {
        let target = Type::UnionLiteral(vec![Type::string(), Type::i32()]);
        assert!(match_method_target(&Type::i32(), &target, &[]).is_some());
        assert!(match_method_target(&Type::bool(), &target, &[]).is_none());
    }
}
