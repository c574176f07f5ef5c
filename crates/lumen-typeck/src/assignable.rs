//! Assignability, signature equivalence and literal-fit checks.
//!
//! [`is_assignable`] is deliberately shallow: type parameters and Unknown
//! are accepted in either position so later passes (obligations, call-site
//! instantiation) can refine them. Interface satisfaction is decided by the
//! solver, not here.

use crate::numeric::integer_range_within;
use crate::ty::Type;

// ── Special applications ───────────────────────────────────────────────

/// Rewrite `Array T`, `Map K V` and friends written as struct applications
/// into their builtin variants.
pub fn normalize_special(ty: &Type) -> Type {
    let converted = match ty {
        Type::Applied(base, args) => base.struct_name().and_then(|name| special_form(name, args)),
        Type::Struct(def) => special_form(&def.name, &def.positional),
        Type::StructInstance(inst) => {
            let args = if inst.type_args.is_empty() {
                &inst.positional
            } else {
                &inst.type_args
            };
            special_form(&inst.name, args)
        }
        _ => None,
    };
    converted.unwrap_or_else(|| ty.clone())
}

pub(crate) fn special_form(name: &str, args: &[Type]) -> Option<Type> {
    let arg = |i: usize| args.get(i).cloned().unwrap_or(Type::Unknown);
    Some(match name {
        "Array" => Type::array(arg(0)),
        "Iterator" => Type::iterator(arg(0)),
        "Range" => Type::range(arg(0)),
        "Map" | "HashMap" => Type::map(arg(0), arg(1)),
        "Proc" => Type::proc(arg(0)),
        "Future" => Type::future(arg(0)),
        _ => return None,
    })
}

pub fn array_element(ty: &Type) -> Option<Type> {
    match normalize_special(ty) {
        Type::Array(elem) => Some(*elem),
        _ => None,
    }
}

// ── Assignability ──────────────────────────────────────────────────────

/// Whether a value of type `from` may be stored where `to` is expected.
pub fn is_assignable(from: &Type, to: &Type) -> bool {
    if to.struct_name() == Some("void") {
        return true;
    }
    let from = normalize_special(from);
    let to = normalize_special(to);
    if to.is_open() || from.is_open() {
        return true;
    }
    if literal_assignable(&from, &to) {
        return true;
    }
    if let (Type::Integer(source), Type::Integer(target)) = (&from, &to) {
        if integer_range_within(source.suffix, target.suffix) {
            return true;
        }
    }

    match &to {
        Type::Struct(_) | Type::StructInstance(_) => {
            return from.struct_name().is_some() && from.struct_name() == to.struct_name();
        }
        Type::Array(target) => {
            return array_element(&from).is_some_and(|elem| is_assignable(&elem, target));
        }
        Type::Range(target) => {
            return matches!(&from, Type::Range(elem) if is_assignable(elem, target));
        }
        Type::Iterator(target) => {
            return matches!(&from, Type::Iterator(elem) if is_assignable(elem, target));
        }
        Type::Map(key, value) => {
            return matches!(&from, Type::Map(k, v) if is_assignable(k, key) && is_assignable(v, value));
        }
        Type::Nullable(inner) => {
            return match &from {
                source if source.is_nil() => true,
                Type::Nullable(source) => is_assignable(source, inner),
                Type::UnionLiteral(members) => members
                    .iter()
                    .all(|m| m.is_nil() || is_assignable(m, inner)),
                source => is_assignable(source, inner),
            };
        }
        Type::UnionLiteral(members) => return union_literal_accepts(&from, members),
        Type::Union(target) => {
            return match &from {
                Type::Union(source) => {
                    source.name == target.name || all_assignable_to_any(&source.variants, &target.variants)
                }
                Type::UnionLiteral(members) => all_assignable_to_any(members, &target.variants),
                source => target.variants.is_empty() || assignable_to_any(source, &target.variants),
            };
        }
        Type::Applied(to_base, to_args) => {
            return match &from {
                Type::Applied(from_base, from_args) => {
                    applied_assignable(from_base, from_args, to_base, to_args)
                }
                source => source.struct_name().is_some() && source.struct_name() == to_base.struct_name(),
            };
        }
        Type::Function(target) => {
            if let Type::Function(source) = &from {
                return source.params.len() == target.params.len()
                    && source
                        .params
                        .iter()
                        .zip(&target.params)
                        .all(|(s, t)| is_assignable(t, s))
                    && is_assignable(&source.ret, &target.ret);
            }
            return false;
        }
        _ => {}
    }

    match &from {
        Type::Struct(_) | Type::StructInstance(_) => from.struct_name() == to.struct_name(),
        Type::Applied(from_base, _) => {
            to.struct_name().is_some() && from_base.struct_name() == to.struct_name()
        }
        Type::Nullable(inner) => is_assignable(inner, &to),
        Type::UnionLiteral(members) => members.iter().all(|m| is_assignable(m, &to)),
        Type::Union(source) => source.variants.iter().any(|v| is_assignable(v, &to)),
        _ => from.to_string() == to.to_string(),
    }
}

fn applied_assignable(from_base: &Type, from_args: &[Type], to_base: &Type, to_args: &[Type]) -> bool {
    is_assignable(from_base, to_base)
        && from_args.len() == to_args.len()
        && from_args.iter().zip(to_args).all(|(f, t)| is_assignable(f, t))
}

fn union_literal_accepts(from: &Type, members: &[Type]) -> bool {
    match from {
        Type::UnionLiteral(source) => all_assignable_to_any(source, members),
        Type::Nullable(inner) => {
            members.iter().any(Type::is_nil) && assignable_to_any(inner, members)
        }
        other => assignable_to_any(other, members),
    }
}

fn all_assignable_to_any(sources: &[Type], targets: &[Type]) -> bool {
    targets.is_empty() || sources.iter().all(|s| assignable_to_any(s, targets))
}

pub fn assignable_to_any(from: &Type, targets: &[Type]) -> bool {
    targets.iter().any(|target| is_assignable(from, target))
}

// ── Literals ───────────────────────────────────────────────────────────

/// An integer literal fits the target: any float for an unsuffixed literal,
/// the exact suffix for a suffixed one, otherwise the target's range.
pub fn literal_assignable(from: &Type, to: &Type) -> bool {
    let Type::Integer(source) = from else {
        return false;
    };
    let Some(literal) = &source.literal else {
        return false;
    };
    match to {
        Type::Float(_) => !source.explicit,
        Type::Integer(target) if source.explicit => source.suffix == target.suffix,
        Type::Integer(target) => literal.fits(target.suffix),
        _ => false,
    }
}

/// `literal V does not fit in S` when an unsuffixed literal reaches an
/// integer position (possibly nested in a container) that cannot hold it.
pub fn literal_mismatch(from: &Type, to: &Type) -> Option<String> {
    let from = normalize_special(from);
    let to = normalize_special(to);
    match (&from, &to) {
        (Type::Array(a), Type::Array(b))
        | (Type::Iterator(a), Type::Iterator(b))
        | (Type::Range(a), Type::Range(b))
        | (Type::Proc(a), Type::Proc(b))
        | (Type::Future(a), Type::Future(b))
        | (Type::Nullable(a), Type::Nullable(b)) => return literal_mismatch(a, b),
        (Type::Map(ak, av), Type::Map(bk, bv)) => {
            return literal_mismatch(ak, bk).or_else(|| literal_mismatch(av, bv));
        }
        (Type::UnionLiteral(actual), Type::UnionLiteral(expected)) => {
            return actual
                .iter()
                .zip(expected)
                .find_map(|(a, e)| literal_mismatch(a, e));
        }
        (Type::UnionLiteral(actual), _) => {
            return actual.iter().find_map(|a| literal_mismatch(a, &to));
        }
        (_, Type::UnionLiteral(expected)) => {
            return expected.iter().find_map(|e| literal_mismatch(&from, e));
        }
        (_, Type::Nullable(inner)) => return literal_mismatch(&from, inner),
        _ => {}
    }
    let (Type::Integer(source), Type::Integer(target)) = (&from, &to) else {
        return None;
    };
    let literal = source.literal.as_ref()?;
    if source.explicit || literal.fits(target.suffix) {
        return None;
    }
    Some(format!("literal {literal} does not fit in {}", target.suffix))
}

// ── Signatures ─────────────────────────────────────────────────────────

/// Loose equality used when comparing declared signatures: Unknown matches
/// anything and any two type parameters match each other.
pub fn equivalent_for_signature(a: &Type, b: &Type) -> bool {
    if a.is_unknown() || b.is_unknown() {
        return true;
    }
    match (a, b) {
        (Type::TypeParam(_), other) => other.is_type_param(),
        (Type::Struct(_) | Type::StructInstance(_), Type::Struct(_) | Type::StructInstance(_)) => {
            a.struct_name() == b.struct_name()
        }
        (Type::StructInstance(_), Type::Applied(base, _)) => equivalent_for_signature(a, base),
        (Type::Applied(a_base, a_args), Type::Applied(b_base, b_args)) => {
            equivalent_for_signature(a_base, b_base)
                && a_args.len() == b_args.len()
                && a_args.iter().zip(b_args).all(|(x, y)| equivalent_for_signature(x, y))
        }
        (Type::Applied(base, _), Type::Struct(_) | Type::StructInstance(_)) => {
            equivalent_for_signature(base, b)
        }
        (Type::Applied(..), _) => false,
        (Type::Array(x), Type::Array(y))
        | (Type::Nullable(x), Type::Nullable(y))
        | (Type::Range(x), Type::Range(y))
        | (Type::Iterator(x), Type::Iterator(y))
        | (Type::Proc(x), Type::Proc(y))
        | (Type::Future(x), Type::Future(y)) => equivalent_for_signature(x, y),
        (Type::Map(ak, av), Type::Map(bk, bv)) => {
            equivalent_for_signature(ak, bk) && equivalent_for_signature(av, bv)
        }
        (Type::UnionLiteral(x), Type::UnionLiteral(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| equivalent_for_signature(p, q))
        }
        (Type::Function(f), Type::Function(g)) => {
            f.params.len() == g.params.len()
                && f.params.iter().zip(&g.params).all(|(p, q)| equivalent_for_signature(p, q))
                && equivalent_for_signature(&f.ret, &g.ret)
        }
        (Type::Function(_), _) => false,
        _ => a.to_string() == b.to_string(),
    }
}

// ── Result returns ─────────────────────────────────────────────────────

/// Check a returned value against the declared return type. A bare success
/// value is accepted for a `Result T` return and widened to it.
pub fn normalize_result_return(actual: &Type, expected: &Type) -> (Type, bool) {
    if let Some(success) = expected.result_success() {
        if is_assignable(actual, expected) {
            return (actual.clone(), true);
        }
        if is_assignable(actual, &success) {
            return (expected.clone(), true);
        }
        return (actual.clone(), false);
    }
    (actual.clone(), is_assignable(actual, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::IntLiteral;
    use crate::ty::{IntegerSuffix, IntegerType};

    fn literal(text: &str) -> Type {
        Type::Integer(IntegerType {
            suffix: IntegerSuffix::I32,
            literal: IntLiteral::parse(text),
            explicit: false,
        })
    }

    #[test]
    fn literals_fit_by_value() {
        assert!(is_assignable(&literal("200"), &Type::int(IntegerSuffix::U8)));
        assert!(!is_assignable(&literal("512"), &Type::int(IntegerSuffix::U8)));
        assert!(is_assignable(&literal("3"), &Type::f64()));
        assert_eq!(
            literal_mismatch(&literal("512"), &Type::int(IntegerSuffix::U8)),
            Some("literal 512 does not fit in u8".into())
        );
    }

    #[test]
    fn literal_mismatch_looks_inside_containers() {
        let from = Type::array(literal("-1"));
        let to = Type::array(Type::int(IntegerSuffix::U16));
        assert_eq!(literal_mismatch(&from, &to), Some("literal -1 does not fit in u16".into()));
        assert_eq!(literal_mismatch(&Type::array(literal("1")), &to), None);
    }

    #[test]
    fn widening_integers_only() {
        assert!(is_assignable(&Type::int(IntegerSuffix::I8), &Type::i32()));
        assert!(!is_assignable(&Type::i32(), &Type::int(IntegerSuffix::I8)));
        assert!(!is_assignable(&Type::i32(), &Type::int(IntegerSuffix::U64)));
    }

    #[test]
    fn nullable_and_union_targets() {
        let maybe = Type::nullable(Type::string());
        assert!(is_assignable(&Type::nil(), &maybe));
        assert!(is_assignable(&Type::string(), &maybe));

        let union = Type::UnionLiteral(vec![Type::string(), Type::bool()]);
        assert!(is_assignable(&Type::bool(), &union));
        assert!(!is_assignable(&Type::char(), &union));
    }

    #[test]
    fn struct_applications_compare_bases_and_args() {
        let boxed = Type::applied(Type::named_struct("Box"), vec![Type::i32()]);
        assert!(is_assignable(&boxed, &Type::named_struct("Box")));
        assert!(!is_assignable(
            &boxed,
            &Type::applied(Type::named_struct("Box"), vec![Type::string()])
        ));
        let spelled = Type::applied(Type::named_struct("Array"), vec![Type::i32()]);
        assert!(is_assignable(&spelled, &Type::array(Type::i32())));
    }

    #[test]
    fn result_return_accepts_success_value() {
        let expected = Type::result_of(Type::i32());
        let (ty, ok) = normalize_result_return(&Type::i32(), &expected);
        assert!(ok);
        assert_eq!(ty, expected);
        assert!(!normalize_result_return(&Type::string(), &expected).1);
    }

    #[test]
    fn signature_equivalence_is_loose_on_params() {
        assert!(equivalent_for_signature(&Type::param("T"), &Type::param("U")));
        assert!(!equivalent_for_signature(&Type::param("T"), &Type::i32()));
        assert!(equivalent_for_signature(&Type::array(Type::Unknown), &Type::array(Type::bool())));
    }
}
