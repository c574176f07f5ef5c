//! Declaration records produced by collection and read by the solver.
//!
//! Implementations, method sets and constraint obligations are built once per
//! module and never mutated afterwards; instantiation copies them through
//! [`crate::subst`].

use std::collections::{BTreeMap, BTreeSet};

use lumen_ast::NodeId;
use lumen_common::Span;

use crate::error::Located;
use crate::ty::{FunctionType, Type};

/// Where a declaration-derived record came from, for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Site {
    pub node: Option<NodeId>,
    pub span: Span,
}

impl Site {
    pub fn of(at: &dyn Located) -> Site {
        Site {
            node: Some(at.node_id()),
            span: at.span(),
        }
    }

    pub fn new(node: NodeId, span: Span) -> Site {
        Site { node: Some(node), span }
    }

    /// `self` when it points at a node, otherwise `fallback`.
    pub fn or(self, fallback: Site) -> Site {
        if self.node.is_some() {
            self
        } else {
            fallback
        }
    }
}

/// A declared generic parameter and its interface bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct GenericParamSpec {
    pub name: String,
    pub constraints: Vec<Type>,
    /// Synthesized from an undeclared name in a signature.
    pub inferred: bool,
    pub site: Site,
}

impl GenericParamSpec {
    pub fn new(name: impl Into<String>) -> Self {
        GenericParamSpec {
            name: name.into(),
            constraints: Vec::new(),
            inferred: false,
            site: Site::default(),
        }
    }
}

/// `where T: A + B`
#[derive(Clone, Debug, PartialEq)]
pub struct WhereConstraintSpec {
    pub type_param: String,
    pub constraints: Vec<Type>,
    pub site: Site,
}

/// "`subject` must implement `constraint`", owned by a declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Obligation {
    /// Declaration label used in diagnostics, e.g. `fn show`.
    pub owner: String,
    pub type_param: String,
    pub constraint: Type,
    pub subject: Type,
    /// Free-text provenance such as `via method set`.
    pub context: String,
    pub site: Site,
}

/// An `impl Interface for Target` block.
#[derive(Clone, Debug, PartialEq)]
pub struct ImplementationSpec {
    pub impl_name: Option<String>,
    pub interface_name: String,
    pub type_params: Vec<GenericParamSpec>,
    pub interface_args: Vec<Type>,
    pub target: Type,
    pub methods: BTreeMap<String, FunctionType>,
    pub where_clause: Vec<WhereConstraintSpec>,
    pub obligations: Vec<Obligation>,
    /// Sorted member labels when the target is an anonymous union.
    pub union_variants: Vec<String>,
    pub is_builtin: bool,
    pub site: Site,
}

impl ImplementationSpec {
    pub fn new(interface_name: impl Into<String>, target: Type) -> Self {
        ImplementationSpec {
            impl_name: None,
            interface_name: interface_name.into(),
            type_params: Vec::new(),
            interface_args: Vec::new(),
            target,
            methods: BTreeMap::new(),
            where_clause: Vec::new(),
            obligations: Vec::new(),
            union_variants: Vec::new(),
            is_builtin: false,
            site: Site::default(),
        }
    }

    /// `impl I for T`, the label used by diagnostics and summaries.
    pub fn label(&self) -> String {
        format!("impl {} for {}", non_empty(&self.interface_name), self.target)
    }
}

/// A `methods Target { ... }` block.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodSetSpec {
    pub target: Type,
    pub type_params: Vec<GenericParamSpec>,
    pub methods: BTreeMap<String, FunctionType>,
    /// Methods without a receiver, callable only as `Target.name`.
    pub type_qualified: BTreeSet<String>,
    pub where_clause: Vec<WhereConstraintSpec>,
    pub obligations: Vec<Obligation>,
    pub site: Site,
}

impl MethodSetSpec {
    pub fn new(target: Type) -> Self {
        MethodSetSpec {
            target,
            type_params: Vec::new(),
            methods: BTreeMap::new(),
            type_qualified: BTreeSet::new(),
            where_clause: Vec::new(),
            obligations: Vec::new(),
            site: Site::default(),
        }
    }

    pub fn label(&self) -> String {
        format!("methods for {}", self.target)
    }
}

pub(crate) fn non_empty(value: &str) -> &str {
    if value.is_empty() {
        "<unknown>"
    } else {
        value
    }
}

/// Obligations implied by generic bounds and where-clauses of a declaration.
pub fn obligations_from_specs(
    owner: &str,
    params: &[GenericParamSpec],
    where_clause: &[WhereConstraintSpec],
    site: Site,
) -> Vec<Obligation> {
    let owner = non_empty(owner);
    let from_params = params.iter().flat_map(|param| {
        param
            .constraints
            .iter()
            .filter(|constraint| !constraint.is_unknown())
            .map(move |constraint| (param.name.as_str(), constraint, param.site.or(site)))
    });
    let from_where = where_clause.iter().flat_map(|clause| {
        clause
            .constraints
            .iter()
            .filter(|constraint| !constraint.is_unknown())
            .map(move |constraint| (clause.type_param.as_str(), constraint, clause.site.or(site)))
    });
    from_params
        .chain(from_where)
        .filter(|(name, _, _)| !name.is_empty())
        .map(|(name, constraint, site)| Obligation {
            owner: owner.to_string(),
            type_param: name.to_string(),
            constraint: constraint.clone(),
            subject: Type::param(name),
            context: String::new(),
            site,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::InterfaceType;
    use std::rc::Rc;

    #[test]
    fn obligations_cover_bounds_and_where_clauses() {
        let display = Type::Interface(Rc::new(InterfaceType::named("Display")));
        let ord = Type::Interface(Rc::new(InterfaceType::named("Ord")));
        let mut param = GenericParamSpec::new("T");
        param.constraints.push(display);
        let clause = WhereConstraintSpec {
            type_param: "U".into(),
            constraints: vec![ord, Type::Unknown],
            site: Site::default(),
        };
        let obligations = obligations_from_specs("fn show", &[param], &[clause], Site::default());
        let summary: Vec<_> = obligations
            .iter()
            .map(|ob| format!("{}: {} {}", ob.owner, ob.type_param, ob.constraint))
            .collect();
        assert_eq!(summary, vec!["fn show: T Display", "fn show: U Ord"]);
    }

    #[test]
    fn labels() {
        let spec = ImplementationSpec::new("Show", Type::array(Type::param("T")));
        assert_eq!(spec.label(), "impl Show for Array T");
        let empty = ImplementationSpec::new("", Type::i32());
        assert_eq!(empty.label(), "impl <unknown> for i32");
    }
}
