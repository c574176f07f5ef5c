//! Whole-program checking.
//!
//! Modules are grouped by package and packages are checked in dependency
//! order, each module with a fresh [`Checker`]. After a package is done its
//! [`PackageExports`] snapshot is published, read-only, for the packages
//! that import it.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use lumen_ast::{Module, Program};
use lumen_common::{topological_sort, DiagnosticConfig, PackageGraph};
use serde::Serialize;
use tracing::{debug, info_span};

use crate::checker::Checker;
use crate::error::{CheckError, Diagnostic};
use crate::specs::{ImplementationSpec, MethodSetSpec};
use crate::summary::PackageSummary;
use crate::ty::{FunctionType, InterfaceType, PackageType, StructType, Type};
use crate::{check_module, CheckOptions};

/// Package name given to modules without a `package` declaration.
pub const ANONYMOUS_PACKAGE: &str = "main";

// ── Exports ────────────────────────────────────────────────────────────

/// The declarations one package makes visible to its importers.
#[derive(Clone, Debug, Default)]
pub struct PackageExports {
    pub package: String,
    pub symbols: BTreeMap<String, Type>,
    pub private_symbols: BTreeSet<String>,
    pub private_package: bool,
    pub structs: BTreeMap<String, Rc<StructType>>,
    pub interfaces: BTreeMap<String, Rc<InterfaceType>>,
    pub functions: BTreeMap<String, FunctionType>,
    pub implementations: Vec<Rc<ImplementationSpec>>,
    pub method_sets: Vec<Rc<MethodSetSpec>>,
}

impl PackageExports {
    pub fn new(package: impl Into<String>) -> Self {
        PackageExports {
            package: package.into(),
            ..Default::default()
        }
    }

    /// Snapshot what a finished module check declared.
    pub(crate) fn from_checker(checker: &Checker) -> Self {
        let mut exports = PackageExports::new(checker.package_name.clone());
        exports.private_package = checker.private_package;
        exports.private_symbols = checker.private_names.clone();
        for name in &checker.exported {
            let Some(ty) = checker.env.lookup_global(name) else {
                continue;
            };
            match ty {
                Type::Struct(def) => {
                    exports.structs.insert(name.clone(), Rc::clone(def));
                }
                Type::Interface(def) => {
                    exports.interfaces.insert(name.clone(), Rc::clone(def));
                }
                Type::Function(func) => {
                    exports.functions.insert(name.clone(), (**func).clone());
                }
                _ => {}
            }
            exports.symbols.insert(name.clone(), ty.clone());
        }
        exports.implementations = checker.local_impls.clone();
        exports.method_sets = checker.local_method_sets.clone();
        exports
    }

    /// Fold in the exports of another module of the same package.
    pub fn merge(&mut self, other: PackageExports) {
        self.private_package |= other.private_package;
        self.symbols.extend(other.symbols);
        self.private_symbols.extend(other.private_symbols);
        self.structs.extend(other.structs);
        self.interfaces.extend(other.interfaces);
        self.functions.extend(other.functions);
        self.implementations.extend(other.implementations);
        self.method_sets.extend(other.method_sets);
    }

    /// The package as a value, for `import pkg`.
    pub fn package_type(&self) -> Rc<PackageType> {
        Rc::new(PackageType {
            package: self.package.clone(),
            symbols: self.symbols.clone(),
            private_symbols: self.private_symbols.clone(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
            && self.private_symbols.is_empty()
            && self.implementations.is_empty()
            && self.method_sets.is_empty()
    }
}

// ── Program diagnostics ────────────────────────────────────────────────

/// Best-effort source position of a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceHint {
    pub path: String,
    pub line: u32,
    pub column: u32,
}

/// A module diagnostic tagged with where it came from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgramDiagnostic {
    pub package: String,
    /// Source files of the package, relative to the diagnostic root.
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceHint>,
    #[serde(flatten)]
    pub diagnostic: Diagnostic,
}

fn source_hint(module: &Module, diagnostic: &Diagnostic, config: &DiagnosticConfig) -> Option<SourceHint> {
    let path = match diagnostic.node {
        Some(node) => module.origin_of(node),
        None => module.path.as_deref(),
    }?;
    Some(SourceHint {
        path: config.relative_path(path),
        line: diagnostic.span.line,
        column: diagnostic.span.column,
    })
}

// ── Program checker ────────────────────────────────────────────────────

/// Everything a program check produced.
#[derive(Debug, Default)]
pub struct ProgramResult {
    /// Packages in the order they were checked.
    pub order: Vec<String>,
    pub diagnostics: Vec<ProgramDiagnostic>,
    pub exports: BTreeMap<String, Rc<PackageExports>>,
    pub summaries: Vec<PackageSummary>,
}

impl ProgramResult {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

pub struct ProgramChecker {
    config: DiagnosticConfig,
    options: CheckOptions,
}

impl ProgramChecker {
    pub fn new(config: DiagnosticConfig) -> Self {
        ProgramChecker {
            config,
            options: CheckOptions::default(),
        }
    }

    /// Packages and prelude supplied from outside the program.
    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    pub fn check(&self, program: &Program) -> Result<ProgramResult, CheckError> {
        let _span = info_span!("check_program", modules = program.modules.len()).entered();

        let names: Vec<String> = program
            .modules
            .iter()
            .map(|module| module.package_name().unwrap_or_else(|| ANONYMOUS_PACKAGE.to_string()))
            .collect();
        let mut graph = PackageGraph::new();
        for (index, name) in names.iter().enumerate() {
            let id = graph.intern(name);
            graph.add_module(id, index);
        }
        for (module, name) in program.modules.iter().zip(&names) {
            let Some(from) = graph.resolve(name) else {
                continue;
            };
            for import in &module.imports {
                if let Some(to) = graph.resolve(&import.package_name()) {
                    graph.add_dependency(from, to);
                }
            }
        }
        let order = topological_sort(&graph).map_err(|err| CheckError::PackageCycle {
            cycle: err.cycle_path,
        })?;

        let mut result = ProgramResult::default();
        let mut published: BTreeMap<String, Rc<PackageExports>> = self
            .options
            .packages
            .iter()
            .map(|exports| (exports.package.clone(), Rc::clone(exports)))
            .collect();

        for id in order {
            let info = graph.get(id);
            let files: Vec<String> = info
                .modules
                .iter()
                .filter_map(|&index| program.modules[index].path.as_deref())
                .map(|path| self.config.relative_path(path))
                .collect();
            let mut exports = PackageExports::new(info.name.clone());

            for &index in &info.modules {
                let module = &program.modules[index];
                let mut prelude = self.options.prelude.clone();
                if !exports.is_empty() {
                    prelude.push(Rc::new(exports.clone()));
                }
                let options = CheckOptions {
                    packages: published.values().cloned().collect(),
                    prelude,
                    builtin_impls: self.options.builtin_impls,
                };
                let checked = check_module(Some(module), &options)?;
                for diagnostic in checked.diagnostics {
                    result.diagnostics.push(ProgramDiagnostic {
                        package: info.name.clone(),
                        files: files.clone(),
                        source: source_hint(module, &diagnostic, &self.config),
                        diagnostic,
                    });
                }
                exports.merge(checked.exports);
            }

            debug!(package = %info.name, symbols = exports.symbols.len(), "published package exports");
            result.summaries.push(PackageSummary::from_exports(&exports));
            result.order.push(info.name.clone());
            published.insert(info.name.clone(), Rc::new(exports.clone()));
            result.exports.insert(info.name.clone(), Rc::new(exports));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_accumulates_symbols() {
        let mut first = PackageExports::new("geo");
        first.symbols.insert("area".into(), Type::Unknown);
        let mut second = PackageExports::new("geo");
        second.private_symbols.insert("helper".into());
        second.private_package = true;
        first.merge(second);
        assert!(first.symbols.contains_key("area"));
        assert!(first.private_symbols.contains("helper"));
        assert!(first.private_package);
        assert!(!first.is_empty());
    }

    #[test]
    fn package_type_carries_privacy() {
        let mut exports = PackageExports::new("geo");
        exports.private_symbols.insert("secret".into());
        let pkg = exports.package_type();
        assert_eq!(pkg.package, "geo");
        assert!(pkg.private_symbols.contains("secret"));
    }
}
