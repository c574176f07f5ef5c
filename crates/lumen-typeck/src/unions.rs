//! Union normalization and branch-type merging.

use crate::assignable::{is_assignable, normalize_special};
use crate::subst;
use crate::ty::{IntegerType, Type};

/// Build the canonical form of an anonymous union of `members`.
///
/// Aliases expand first, nested unions and nullables flatten, Unknown
/// members drop out and duplicates collapse in first-seen order. A lone
/// member plus `nil` becomes `T?`; a lone member is returned as itself.
pub fn normalize(members: Vec<Type>) -> Type {
    let mut flat = Vec::new();
    let mut has_nil = false;
    for member in members {
        flatten_into(member, &mut flat, &mut has_nil);
    }

    let mut distinct: Vec<Type> = Vec::new();
    for member in flat {
        if !distinct.iter().any(|seen| same_type(seen, &member)) {
            distinct.push(member);
        }
    }

    match (distinct.len(), has_nil) {
        (0, false) => Type::Unknown,
        (0, true) => Type::nil(),
        (1, true) => Type::nullable(distinct.remove(0)),
        (1, false) => distinct.remove(0),
        (_, true) => {
            distinct.push(Type::nil());
            Type::UnionLiteral(distinct)
        }
        (_, false) => Type::UnionLiteral(distinct),
    }
}

fn flatten_into(member: Type, out: &mut Vec<Type>, has_nil: &mut bool) {
    match member {
        Type::Unknown => {}
        Type::Alias(alias) => {
            let expanded = subst::instantiate_alias(&alias, &[]);
            flatten_into(expanded, out, has_nil);
        }
        Type::UnionLiteral(members) => {
            for inner in members {
                flatten_into(inner, out, has_nil);
            }
        }
        Type::Nullable(inner) => {
            *has_nil = true;
            flatten_into(*inner, out, has_nil);
        }
        other if other.is_nil() => *has_nil = true,
        other => out.push(without_literal(other)),
    }
}

/// Drop literal bookkeeping so `1` and `2` merge as plain `i32`.
pub fn without_literal(ty: Type) -> Type {
    match ty {
        Type::Integer(int) if int.literal.is_some() => Type::Integer(IntegerType::new(int.suffix)),
        other => other,
    }
}

/// Structural equality that ignores literal metadata and treats special
/// applications (`Array T` spelled as a struct) like their builtin forms.
pub fn same_type(a: &Type, b: &Type) -> bool {
    let a = normalize_special(a);
    let b = normalize_special(b);
    if a.is_unknown() || b.is_unknown() {
        return false;
    }
    a.to_string() == b.to_string()
}

// ── Merging ────────────────────────────────────────────────────────────

/// Merge branch types that must agree: any disagreement yields Unknown.
pub fn merge_branch_types(types: &[Type]) -> Type {
    let mut result = Type::Unknown;
    for ty in types {
        if ty.is_unknown() {
            continue;
        }
        if result.is_unknown() {
            result = without_literal(ty.clone());
            continue;
        }
        if result.to_string() != ty.to_string() {
            return Type::Unknown;
        }
    }
    result
}

/// The wider of two mutually assignable types, otherwise Unknown.
pub fn merge_compatible(a: &Type, b: &Type) -> Type {
    if a.is_unknown() {
        return b.clone();
    }
    if b.is_unknown() {
        return a.clone();
    }
    if is_assignable(b, a) {
        return a.clone();
    }
    if is_assignable(a, b) {
        return b.clone();
    }
    Type::Unknown
}

/// The wider of two types, or their union when neither accepts the other.
pub fn merge_allow_union(a: &Type, b: &Type) -> Type {
    if a.is_unknown() {
        return b.clone();
    }
    if b.is_unknown() {
        return a.clone();
    }
    if is_assignable(b, a) {
        return without_literal(a.clone());
    }
    if is_assignable(a, b) {
        return without_literal(b.clone());
    }
    normalize(vec![a.clone(), b.clone()])
}

/// Remove `nil` from a union, leaving its non-nil shape.
pub fn strip_nil(ty: &Type) -> Type {
    match ty {
        Type::Nullable(inner) => (**inner).clone(),
        Type::UnionLiteral(members) => {
            normalize(members.iter().filter(|m| !m.is_nil()).cloned().collect())
        }
        other => other.clone(),
    }
}
