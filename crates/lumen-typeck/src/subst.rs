//! Generic-parameter substitution.
//!
//! Every instantiation in the checker goes through [`substitute`]: call
//! sites, implementation and method-set matches, alias expansion and the
//! obligations attached to each of them.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::specs::{GenericParamSpec, Obligation, WhereConstraintSpec};
use crate::ty::{AliasType, FunctionType, StructInstance, Type, UnionType};
use crate::unions;

/// Type-parameter name to replacement.
pub type Bindings = FxHashMap<String, Type>;

/// Bind `params` to `args` positionally; missing arguments bind Unknown.
pub fn bindings_for(params: &[GenericParamSpec], args: &[Type]) -> Bindings {
    params
        .iter()
        .enumerate()
        .filter(|(_, param)| !param.name.is_empty())
        .map(|(i, param)| (param.name.clone(), args.get(i).cloned().unwrap_or(Type::Unknown)))
        .collect()
}

pub fn substitute(ty: &Type, bindings: &Bindings) -> Type {
    if bindings.is_empty() {
        return ty.clone();
    }
    match ty {
        Type::TypeParam(name) => bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
        Type::Function(func) => Type::Function(Box::new(substitute_function(func, bindings))),
        Type::Array(inner) => Type::array(substitute(inner, bindings)),
        Type::Range(inner) => Type::range(substitute(inner, bindings)),
        Type::Iterator(inner) => Type::iterator(substitute(inner, bindings)),
        Type::Proc(inner) => Type::proc(substitute(inner, bindings)),
        Type::Future(inner) => Type::future(substitute(inner, bindings)),
        Type::Nullable(inner) => Type::nullable(substitute(inner, bindings)),
        Type::Map(key, value) => Type::map(substitute(key, bindings), substitute(value, bindings)),
        Type::Applied(base, args) => Type::applied(
            substitute(base, bindings),
            args.iter().map(|arg| substitute(arg, bindings)).collect(),
        ),
        Type::UnionLiteral(members) => {
            Type::UnionLiteral(members.iter().map(|m| substitute(m, bindings)).collect())
        }
        Type::StructInstance(inst) => Type::StructInstance(Rc::new(StructInstance {
            name: inst.name.clone(),
            fields: inst
                .fields
                .iter()
                .map(|(name, ty)| (name.clone(), substitute(ty, bindings)))
                .collect(),
            positional: inst.positional.iter().map(|ty| substitute(ty, bindings)).collect(),
            type_args: inst.type_args.iter().map(|ty| substitute(ty, bindings)).collect(),
        })),
        Type::Union(def) if mentions_any(&def.variants, bindings) => Type::Union(Rc::new(UnionType {
            variants: def.variants.iter().map(|v| substitute(v, bindings)).collect(),
            ..(**def).clone()
        })),
        _ => ty.clone(),
    }
}

fn mentions_any(types: &[Type], bindings: &Bindings) -> bool {
    types
        .iter()
        .any(|ty| ty.type_params().iter().any(|name| bindings.contains_key(name)))
}

/// Substitute a signature, dropping generic parameters that are now bound.
pub fn substitute_function(func: &FunctionType, bindings: &Bindings) -> FunctionType {
    if bindings.is_empty() {
        return func.clone();
    }
    FunctionType {
        params: func.params.iter().map(|p| substitute(p, bindings)).collect(),
        ret: substitute(&func.ret, bindings),
        type_params: func
            .type_params
            .iter()
            .filter(|param| param.name.is_empty() || !bindings.contains_key(&param.name))
            .cloned()
            .collect(),
        where_clause: substitute_where(&func.where_clause, bindings),
        obligations: substitute_obligations(&func.obligations, bindings),
    }
}

/// Where-clauses on bound parameters are dropped; their obligations carry
/// the requirement forward.
pub fn substitute_where(clauses: &[WhereConstraintSpec], bindings: &Bindings) -> Vec<WhereConstraintSpec> {
    clauses
        .iter()
        .filter(|clause| clause.type_param.is_empty() || !bindings.contains_key(&clause.type_param))
        .map(|clause| WhereConstraintSpec {
            type_param: clause.type_param.clone(),
            constraints: clause.constraints.iter().map(|c| substitute(c, bindings)).collect(),
            site: clause.site,
        })
        .collect()
}

pub fn substitute_obligations(obligations: &[Obligation], bindings: &Bindings) -> Vec<Obligation> {
    if bindings.is_empty() {
        return obligations.to_vec();
    }
    obligations
        .iter()
        .map(|ob| {
            let subject = if ob.subject.is_unknown() {
                bindings.get(&ob.type_param).cloned().unwrap_or(Type::Unknown)
            } else {
                substitute(&ob.subject, bindings)
            };
            Obligation {
                constraint: substitute(&ob.constraint, bindings),
                subject,
                ..ob.clone()
            }
        })
        .collect()
}

/// Fill in the subject of obligations that do not have one yet.
pub fn populate_subjects(obligations: &[Obligation], subject: &Type) -> Vec<Obligation> {
    obligations
        .iter()
        .map(|ob| {
            let mut ob = ob.clone();
            if ob.subject.is_unknown() {
                ob.subject = subject.clone();
            }
            ob
        })
        .collect()
}

/// Expand `alias` applied to `args`.
pub fn instantiate_alias(alias: &AliasType, args: &[Type]) -> Type {
    if alias.type_params.is_empty() {
        return alias.target.clone();
    }
    substitute(&alias.target, &bindings_for(&alias.type_params, args))
}

/// Apply a nominal union to arguments. With a full argument list the
/// parameters are consumed.
pub fn instantiate_union(def: &UnionType, args: &[Type]) -> UnionType {
    if def.type_params.is_empty() {
        return def.clone();
    }
    let bindings = bindings_for(&def.type_params, args);
    let variants = def.variants.iter().map(|v| substitute(v, &bindings)).collect();
    let type_params = if args.len() >= def.type_params.len() {
        Vec::new()
    } else {
        def.type_params.clone()
    };
    UnionType {
        name: def.name.clone(),
        type_params,
        variants,
        where_clause: substitute_where(&def.where_clause, &bindings),
    }
}

/// Anonymous union of `members` after substitution, normalized.
pub fn substitute_union_members(members: &[Type], bindings: &Bindings) -> Type {
    unions::normalize(members.iter().map(|m| substitute(m, bindings)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs::Site;
    use crate::ty::InterfaceType;

    fn bind(pairs: &[(&str, Type)]) -> Bindings {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn substitutes_nested_applications() {
        let ty = Type::applied(
            Type::named_struct("Pair"),
            vec![Type::array(Type::param("T")), Type::map(Type::param("K"), Type::param("T"))],
        );
        let out = substitute(&ty, &bind(&[("T", Type::i32()), ("K", Type::string())]));
        assert_eq!(out.to_string(), "Pair Array i32 Map string i32");
    }

    #[test]
    fn unbound_params_survive() {
        let ty = Type::nullable(Type::param("U"));
        assert_eq!(substitute(&ty, &bind(&[("T", Type::i32())])), ty);
    }

    #[test]
    fn function_drops_consumed_params() {
        let mut func = FunctionType::new(vec![Type::param("T")], Type::param("U"));
        func.type_params = vec![GenericParamSpec::new("T"), GenericParamSpec::new("U")];
        func.where_clause = vec![WhereConstraintSpec {
            type_param: "T".into(),
            constraints: vec![Type::Interface(Rc::new(InterfaceType::named("Display")))],
            site: Site::default(),
        }];
        let out = substitute_function(&func, &bind(&[("T", Type::bool())]));
        assert_eq!(out.params, vec![Type::bool()]);
        assert_eq!(out.type_params.len(), 1);
        assert_eq!(out.type_params[0].name, "U");
        assert!(out.where_clause.is_empty());
    }

    #[test]
    fn obligations_take_bound_subject() {
        let ob = Obligation {
            owner: "fn show".into(),
            type_param: "T".into(),
            constraint: Type::Interface(Rc::new(InterfaceType::named("Display"))),
            subject: Type::param("T"),
            context: String::new(),
            site: Site::default(),
        };
        let out = substitute_obligations(&[ob], &bind(&[("T", Type::string())]));
        assert_eq!(out[0].subject, Type::string());
    }

    #[test]
    fn alias_with_missing_args_binds_unknown() {
        let alias = AliasType {
            name: "Pairs".into(),
            type_params: vec![GenericParamSpec::new("T")],
            target: Type::array(Type::param("T")),
            where_clause: Vec::new(),
        };
        assert_eq!(instantiate_alias(&alias, &[Type::char()]).to_string(), "Array char");
        assert_eq!(instantiate_alias(&alias, &[]).to_string(), "Array Unknown");
    }

    #[test]
    fn union_instantiation_consumes_params() {
        let def = UnionType {
            name: "Option".into(),
            type_params: vec![GenericParamSpec::new("T")],
            variants: vec![Type::param("T"), Type::nil()],
            where_clause: Vec::new(),
        };
        let out = instantiate_union(&def, &[Type::i32()]);
        assert!(out.type_params.is_empty());
        assert_eq!(out.variants, vec![Type::i32(), Type::nil()]);
    }
}
