//! Serializable package summaries for downstream tooling.
//!
//! A [`PackageSummary`] is the export snapshot of a package with every
//! type rendered as text, so it can be written out as JSON.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::program::PackageExports;
use crate::specs::GenericParamSpec;
use crate::ty::{FunctionType, Type};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StructSummary {
    pub type_params: Vec<String>,
    pub fields: Vec<FieldSummary>,
    /// Field types in declaration order, named or not.
    pub positional: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InterfaceSummary {
    pub type_params: Vec<String>,
    pub methods: BTreeMap<String, String>,
    pub defaults: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FunctionSummary {
    pub type_params: Vec<String>,
    pub signature: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImplementationSummary {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub interface: String,
    pub target: String,
    pub methods: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MethodSetSummary {
    pub label: String,
    pub target: String,
    pub methods: Vec<String>,
}

/// What a package makes available to its importers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PackageSummary {
    pub package: String,
    pub visibility: Visibility,
    pub symbols: BTreeMap<String, String>,
    pub private_symbols: Vec<String>,
    pub structs: BTreeMap<String, StructSummary>,
    pub interfaces: BTreeMap<String, InterfaceSummary>,
    pub functions: BTreeMap<String, FunctionSummary>,
    pub implementations: Vec<ImplementationSummary>,
    pub method_sets: Vec<MethodSetSummary>,
}

fn param_names(params: &[GenericParamSpec]) -> Vec<String> {
    params.iter().map(|param| param.name.clone()).collect()
}

fn signature(func: &FunctionType) -> String {
    Type::Function(Box::new(func.clone())).to_string()
}

impl PackageSummary {
    pub fn from_exports(exports: &PackageExports) -> Self {
        let structs = exports
            .structs
            .iter()
            .map(|(name, def)| {
                let summary = StructSummary {
                    type_params: param_names(&def.type_params),
                    fields: def
                        .fields
                        .iter()
                        .map(|(field, ty)| FieldSummary {
                            name: field.clone(),
                            ty: ty.to_string(),
                        })
                        .collect(),
                    positional: def.positional.iter().map(Type::to_string).collect(),
                };
                (name.clone(), summary)
            })
            .collect();
        let interfaces = exports
            .interfaces
            .iter()
            .map(|(name, def)| {
                let summary = InterfaceSummary {
                    type_params: param_names(&def.type_params),
                    methods: def
                        .methods
                        .iter()
                        .map(|(method, sig)| (method.clone(), signature(sig)))
                        .collect(),
                    defaults: def.defaults.iter().cloned().collect(),
                };
                (name.clone(), summary)
            })
            .collect();
        let functions = exports
            .functions
            .iter()
            .map(|(name, func)| {
                let summary = FunctionSummary {
                    type_params: param_names(&func.type_params),
                    signature: signature(func),
                };
                (name.clone(), summary)
            })
            .collect();

        PackageSummary {
            package: exports.package.clone(),
            visibility: if exports.private_package {
                Visibility::Private
            } else {
                Visibility::Public
            },
            symbols: exports
                .symbols
                .iter()
                .map(|(name, ty)| (name.clone(), ty.to_string()))
                .collect(),
            private_symbols: exports.private_symbols.iter().cloned().collect(),
            structs,
            interfaces,
            functions,
            implementations: exports
                .implementations
                .iter()
                .map(|spec| ImplementationSummary {
                    label: spec.label(),
                    name: spec.impl_name.clone(),
                    interface: spec.interface_name.clone(),
                    target: spec.target.to_string(),
                    methods: spec.methods.keys().cloned().collect(),
                })
                .collect(),
            method_sets: exports
                .method_sets
                .iter()
                .map(|set| MethodSetSummary {
                    label: set.label(),
                    target: set.target.to_string(),
                    methods: set.methods.keys().cloned().collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::specs::ImplementationSpec;

    #[test]
    fn implementations_are_labelled() {
        let mut spec = ImplementationSpec::new("Display", Type::named_struct("Point"));
        spec.methods
            .insert("to_string".into(), FunctionType::new(vec![Type::named_struct("Point")], Type::string()));
        let exports = PackageExports {
            package: "geo".into(),
            implementations: vec![Rc::new(spec)],
            ..Default::default()
        };
        let summary = PackageSummary::from_exports(&exports);
        assert_eq!(summary.visibility, Visibility::Public);
        assert_eq!(summary.implementations[0].label, "impl Display for Point");
        assert_eq!(summary.implementations[0].methods, vec!["to_string".to_string()]);
    }

    #[test]
    fn serializes_type_fields_by_name() {
        let field = FieldSummary {
            name: "x".into(),
            ty: "i32".into(),
        };
        let json = serde_json::to_string(&field).unwrap();
        assert_eq!(json, r#"{"name":"x","type":"i32"}"#);
    }
}
