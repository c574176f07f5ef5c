//! Generic-parameter inference for signatures.
//!
//! A name that appears in a parameter, return, target or where-clause type
//! and is neither a declared generic parameter nor a known type is taken
//! to be an implicit generic parameter. `fn first(xs: Array T) -> T` thus
//! declares `T` without a generic list.

use rustc_hash::FxHashSet;

use lumen_ast::{TypeExpr, TypeExprKind, WhereClause};

use crate::checker::{Checker, TypeScope};
use crate::error::DiagnosticKind;
use crate::specs::{GenericParamSpec, Site, WhereConstraintSpec};
use crate::ty::{FloatSuffix, IntegerSuffix, Type};

/// Names that are never inferred as generic parameters.
const RESERVED: [&str; 20] = [
    "bool", "String", "string", "char", "nil", "void", "Self", "Array", "Map", "Range", "Iterator", "Result",
    "Option", "Proc", "Future", "Channel", "Mutex", "Error", "HashMap", "_",
];

fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name) || IntegerSuffix::from_name(name).is_some() || FloatSuffix::from_name(name).is_some()
}

/// Where inference looks for candidate names.
pub(crate) struct InferenceSources<'a> {
    pub types: Vec<&'a TypeExpr>,
    pub where_clause: &'a [WhereClause],
    /// Also scan where-clause constraints, as implementation headers do.
    pub where_constraints: bool,
}

impl Checker {
    /// Synthesize generic parameters for the undeclared names in `sources`.
    /// `scope` and `declared` list the names already in play.
    pub(crate) fn infer_generic_params(
        &mut self,
        sources: &InferenceSources<'_>,
        scope: &TypeScope,
        declared: &[GenericParamSpec],
    ) -> Vec<GenericParamSpec> {
        let mut occurrences: Vec<(&str, &TypeExpr, bool)> = Vec::new();
        for ty in &sources.types {
            collect_names(ty, &mut occurrences, false);
        }
        for clause in sources.where_clause {
            collect_names(&clause.subject, &mut occurrences, true);
            if sources.where_constraints {
                for constraint in &clause.constraints {
                    collect_names(constraint, &mut occurrences, false);
                }
            }
        }

        let mut known: FxHashSet<&str> = scope.keys().map(String::as_str).collect();
        known.extend(declared.iter().map(|param| param.name.as_str()));
        let mut conflicts: FxHashSet<&str> = FxHashSet::default();
        let mut inferred = Vec::new();
        for (name, node, from_where) in occurrences {
            if name.is_empty() || name.contains('.') || known.contains(name) || is_reserved(name) {
                continue;
            }
            let known_type = self
                .env
                .lookup_global(name)
                .is_some_and(|ty| !matches!(ty, Type::Function(_)));
            if known_type {
                if from_where && conflicts.insert(name) {
                    self.report(
                        DiagnosticKind::Declaration,
                        format!(
                            "cannot infer type parameter '{name}' because a type with the same name exists; \
                             declare it explicitly or qualify the type"
                        ),
                        node,
                    );
                }
                continue;
            }
            known.insert(name);
            inferred.push(GenericParamSpec {
                name: name.to_string(),
                constraints: Vec::new(),
                inferred: true,
                site: Site::of(node),
            });
        }
        inferred
    }
}

/// Simple names in type position. Generic bases are constructors and are
/// skipped unless the name stands alone.
fn collect_names<'a>(expr: &'a TypeExpr, out: &mut Vec<(&'a str, &'a TypeExpr, bool)>, from_where: bool) {
    match &expr.kind {
        TypeExprKind::Simple(name) => out.push((name, expr, from_where)),
        TypeExprKind::Generic { args, .. } => {
            for arg in args {
                collect_names(arg, out, from_where);
            }
        }
        TypeExprKind::Function { params, ret } => {
            for param in params {
                collect_names(param, out, from_where);
            }
            collect_names(ret, out, from_where);
        }
        TypeExprKind::Nullable(inner) | TypeExprKind::Result(inner) => collect_names(inner, out, from_where),
        TypeExprKind::Union(members) => {
            for member in members {
                collect_names(member, out, from_where);
            }
        }
        TypeExprKind::Wildcard => {}
    }
}

/// Move where-clause bounds on inferred parameters onto the parameters
/// themselves; the remaining clauses are returned.
pub(crate) fn hoist_where_constraints(
    params: &mut [GenericParamSpec],
    clauses: Vec<WhereConstraintSpec>,
) -> Vec<WhereConstraintSpec> {
    clauses
        .into_iter()
        .filter_map(|clause| {
            match params
                .iter_mut()
                .find(|param| param.inferred && param.name == clause.type_param)
            {
                Some(param) => {
                    param.constraints.extend(clause.constraints);
                    None
                }
                None => Some(clause),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CheckOptions;
    use lumen_ast::{Builder, Module};

    #[test]
    fn undeclared_names_become_params() {
        let b = Builder::new();
        let mut c = Checker::new(&Module::default(), &CheckOptions::default());
        let param = b.generic_ty("Array", vec![b.ty("T")]);
        let ret = b.ty("U");
        let known = b.ty("i32");
        let sources = InferenceSources {
            types: vec![&param, &ret, &known],
            where_clause: &[],
            where_constraints: false,
        };
        let inferred = c.infer_generic_params(&sources, &TypeScope::default(), &[]);
        let names: Vec<_> = inferred.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["T", "U"]);
        assert!(inferred.iter().all(|p| p.inferred));
    }

    #[test]
    fn declared_and_scoped_names_are_skipped() {
        let b = Builder::new();
        let mut c = Checker::new(&Module::default(), &CheckOptions::default());
        let t = b.ty("T");
        let s = b.ty("S");
        let sources = InferenceSources {
            types: vec![&t, &s],
            where_clause: &[],
            where_constraints: false,
        };
        let mut scope = TypeScope::default();
        scope.insert("S".into(), Type::param("S"));
        let inferred = c.infer_generic_params(&sources, &scope, &[GenericParamSpec::new("T")]);
        assert!(inferred.is_empty());
    }

    #[test]
    fn where_subject_naming_a_type_is_reported_once() {
        let b = Builder::new();
        let mut c = Checker::new(&Module::default(), &CheckOptions::default());
        let clauses = vec![
            b.where_clause("Ordering", vec![b.ty("Display")]),
            b.where_clause("Ordering", vec![b.ty("Clone")]),
        ];
        let sources = InferenceSources {
            types: vec![],
            where_clause: &clauses,
            where_constraints: false,
        };
        let inferred = c.infer_generic_params(&sources, &TypeScope::default(), &[]);
        assert!(inferred.is_empty());
        assert_eq!(c.diagnostics.len(), 1);
        assert!(c.diagnostics[0].message.contains("cannot infer type parameter 'Ordering'"));
    }

    #[test]
    fn hoisting_moves_bounds_to_inferred_params() {
        let mut params = vec![GenericParamSpec {
            inferred: true,
            ..GenericParamSpec::new("T")
        }];
        let clauses = vec![
            WhereConstraintSpec {
                type_param: "T".into(),
                constraints: vec![Type::named_struct("Display")],
                site: Site::default(),
            },
            WhereConstraintSpec {
                type_param: "U".into(),
                constraints: vec![Type::named_struct("Ord")],
                site: Site::default(),
            },
        ];
        let rest = hoist_where_constraints(&mut params, clauses);
        assert_eq!(params[0].constraints.len(), 1);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].type_param, "U");
    }
}
