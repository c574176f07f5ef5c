//! Specificity ranking between matching implementations.
//!
//! The tie-breakers are applied in order: a concrete target beats a
//! generic one; a strict superset of constraints beats its subset; an
//! unrestricted target beats a union-restricted one, and between two
//! union-restricted targets the narrower variant set wins; the target with
//! more concrete structure wins; a user implementation beats a builtin one.
//! The relation is not guaranteed to be transitive, so selection keeps
//! every candidate no other candidate beats and calls anything but a
//! single survivor ambiguous.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::ImplMatch;
use crate::specs::ImplementationSpec;
use crate::ty::Type;

fn constraint_keys(spec: &ImplementationSpec) -> BTreeSet<String> {
    spec.obligations
        .iter()
        .map(|ob| format!("{}->{}", ob.type_param, ob.constraint))
        .collect()
}

fn superset_order<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> Ordering {
    if a.len() > b.len() && a.is_superset(b) {
        Ordering::Greater
    } else if b.len() > a.len() && b.is_superset(a) {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

/// How much concrete structure a target pattern pins down. Type
/// parameters count nothing; every nominal or scalar node counts one.
pub(crate) fn specificity(ty: &Type) -> usize {
    match ty {
        Type::TypeParam(_) | Type::Unknown | Type::Function(_) => 0,
        Type::Applied(base, args) => specificity(base) + args.iter().map(specificity).sum::<usize>(),
        Type::Nullable(inner) => specificity(inner),
        Type::UnionLiteral(members) => members.iter().map(specificity).sum(),
        Type::Array(inner) | Type::Range(inner) | Type::Iterator(inner) | Type::Proc(inner) | Type::Future(inner) => {
            1 + specificity(inner)
        }
        Type::Map(key, value) => 1 + specificity(key) + specificity(value),
        _ => 1,
    }
}

/// `Greater` when `a` is the more specific implementation.
pub(crate) fn compare(a: &ImplMatch, b: &ImplMatch) -> Ordering {
    let a_concrete = a.spec.target.type_params().is_empty();
    let b_concrete = b.spec.target.type_params().is_empty();
    if a_concrete != b_concrete {
        return if a_concrete { Ordering::Greater } else { Ordering::Less };
    }

    let by_constraints = superset_order(&constraint_keys(&a.spec), &constraint_keys(&b.spec));
    if by_constraints != Ordering::Equal {
        return by_constraints;
    }

    let a_variants = &a.spec.union_variants;
    let b_variants = &b.spec.union_variants;
    match (a_variants.is_empty(), b_variants.is_empty()) {
        (false, true) => return Ordering::Less,
        (true, false) => return Ordering::Greater,
        _ => {}
    }
    if !a_variants.is_empty() {
        let a_set: BTreeSet<&String> = a_variants.iter().collect();
        let b_set: BTreeSet<&String> = b_variants.iter().collect();
        // Narrower wins, so the superset comparison is reversed.
        let by_variants = superset_order(&b_set, &a_set);
        if by_variants != Ordering::Equal {
            return by_variants;
        }
        if a_variants.len() != b_variants.len() {
            return b_variants.len().cmp(&a_variants.len());
        }
    }

    let by_structure = specificity(&a.spec.target).cmp(&specificity(&b.spec.target));
    if by_structure != Ordering::Equal {
        return by_structure;
    }

    match (a.spec.is_builtin, b.spec.is_builtin) {
        (false, true) => Ordering::Greater,
        (true, false) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// The single most specific match, or every candidate left tied.
pub(crate) fn select(mut matches: Vec<ImplMatch>) -> Result<ImplMatch, Vec<ImplMatch>> {
    if matches.len() <= 1 {
        return matches.pop().ok_or_else(Vec::new);
    }
    let unbeaten: Vec<usize> = (0..matches.len())
        .filter(|&i| {
            !(0..matches.len()).any(|j| j != i && compare(&matches[j], &matches[i]) == Ordering::Greater)
        })
        .collect();
    if unbeaten.len() == 1 {
        return Ok(matches.swap_remove(unbeaten[0]));
    }
    if unbeaten.is_empty() {
        return Err(matches);
    }
    let mut tied = Vec::with_capacity(unbeaten.len());
    for (i, candidate) in matches.into_iter().enumerate() {
        if unbeaten.contains(&i) {
            tied.push(candidate);
        }
    }
    Err(tied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::specs::{GenericParamSpec, Obligation, Site};
    use crate::subst::Bindings;

    fn candidate(spec: ImplementationSpec) -> ImplMatch {
        ImplMatch {
            spec: Rc::new(spec),
            bindings: Bindings::default(),
        }
    }

    fn generic_array() -> ImplementationSpec {
        let mut spec = ImplementationSpec::new("Show", Type::array(Type::param("T")));
        spec.type_params = vec![GenericParamSpec::new("T")];
        spec
    }

    #[test]
    fn concrete_beats_generic() {
        let concrete = candidate(ImplementationSpec::new("Show", Type::array(Type::i32())));
        let generic = candidate(generic_array());
        assert_eq!(compare(&concrete, &generic), Ordering::Greater);
        let chosen = select(vec![generic, concrete]).ok().unwrap();
        assert_eq!(chosen.spec.label(), "impl Show for Array i32");
    }

    #[test]
    fn constraint_superset_wins() {
        let mut constrained = generic_array();
        constrained.obligations.push(Obligation {
            owner: "impl Show for Array T".into(),
            type_param: "T".into(),
            constraint: Type::named_struct("Display"),
            subject: Type::param("T"),
            context: String::new(),
            site: Site::default(),
        });
        let a = candidate(constrained);
        let b = candidate(generic_array());
        assert_eq!(compare(&a, &b), Ordering::Greater);
        assert_eq!(compare(&b, &a), Ordering::Less);
    }

    #[test]
    fn narrower_union_wins() {
        let mut narrow = ImplementationSpec::new("Show", Type::UnionLiteral(vec![Type::i32(), Type::string()]));
        narrow.union_variants = vec!["i32".into(), "string".into()];
        let mut wide =
            ImplementationSpec::new("Show", Type::UnionLiteral(vec![Type::i32(), Type::string(), Type::bool()]));
        wide.union_variants = vec!["bool".into(), "i32".into(), "string".into()];
        assert_eq!(compare(&candidate(narrow), &candidate(wide)), Ordering::Greater);
    }

    #[test]
    fn unrestricted_beats_union_restricted() {
        let mut restricted = generic_array();
        restricted.union_variants = vec!["i32".into(), "string".into()];
        let open = candidate(generic_array());
        let restricted = candidate(restricted);
        assert_eq!(compare(&open, &restricted), Ordering::Greater);
        assert_eq!(compare(&restricted, &open), Ordering::Less);
    }

    #[test]
    fn partially_concrete_target_wins() {
        let pair = |first: Type| Type::applied(Type::named_struct("Pair"), vec![first, Type::param("U")]);
        let mut generic = ImplementationSpec::new("Show", pair(Type::param("T")));
        generic.type_params = vec![GenericParamSpec::new("T"), GenericParamSpec::new("U")];
        let mut partial = ImplementationSpec::new("Show", pair(Type::i32()));
        partial.type_params = vec![GenericParamSpec::new("U")];

        let chosen = select(vec![candidate(generic), candidate(partial)]).ok().unwrap();
        assert_eq!(chosen.spec.label(), "impl Show for Pair i32 U");
    }

    #[test]
    fn specificity_counts_concrete_nodes() {
        assert_eq!(specificity(&Type::param("T")), 0);
        assert_eq!(specificity(&Type::i32()), 1);
        assert_eq!(specificity(&Type::array(Type::param("T"))), 1);
        assert_eq!(specificity(&Type::nullable(Type::array(Type::i32()))), 2);
        let pair = Type::applied(Type::named_struct("Pair"), vec![Type::i32(), Type::param("U")]);
        assert_eq!(specificity(&pair), 2);
    }

    #[test]
    fn user_beats_builtin_on_ties() {
        let mut builtin = ImplementationSpec::new("Display", Type::i32());
        builtin.is_builtin = true;
        let user = ImplementationSpec::new("Display", Type::i32());
        assert_eq!(compare(&candidate(user), &candidate(builtin)), Ordering::Greater);
    }

    #[test]
    fn identical_candidates_tie() {
        let tied = select(vec![candidate(generic_array()), candidate(generic_array())]);
        assert_eq!(tied.err().map(|t| t.len()), Some(2));
        assert!(select(Vec::new()).err().is_some_and(|t| t.is_empty()));
    }
}
