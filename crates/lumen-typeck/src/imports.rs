//! Static imports.
//!
//! Imports resolve against the export snapshots of packages checked
//! earlier. `import pkg` binds the package as a value, a selector list
//! binds the chosen symbols, and a wildcard binds every public symbol.
//! Implementations and method sets of an imported package become visible
//! whichever form is used.

use std::rc::Rc;

use lumen_ast::Import;

use crate::checker::Checker;
use crate::error::DiagnosticKind;
use crate::program::PackageExports;
use crate::ty::Type;

/// Whether `ty` is the declaration of the struct, union or interface
/// exported as `symbol`.
fn names_type(ty: &Type, symbol: &str) -> bool {
    match ty {
        Type::Struct(def) => def.name == symbol,
        Type::Union(def) => def.name == symbol,
        Type::Interface(def) => def.name == symbol,
        _ => false,
    }
}

fn root_segment(package: &str) -> &str {
    package.split('.').next().unwrap_or(package)
}

impl Checker {
    pub(crate) fn check_imports(&mut self, imports: &[Import]) {
        for import in imports {
            self.check_import(import);
        }
    }

    fn check_import(&mut self, import: &Import) {
        let package = import.package_name();
        let Some(exports) = self.packages.get(&package).cloned() else {
            self.report(
                DiagnosticKind::Import,
                format!("unknown package '{package}'"),
                import,
            );
            self.bind_unresolved(import);
            return;
        };
        if exports.private_package && root_segment(&package) != root_segment(&self.package_name) {
            self.report(
                DiagnosticKind::Import,
                format!("package '{package}' is private"),
                import,
            );
            self.bind_unresolved(import);
            return;
        }
        self.adopt_implementations(&exports);

        if import.wildcard {
            for (name, ty) in &exports.symbols {
                self.env.define_global(name.clone(), ty.clone());
            }
            return;
        }
        if !import.selectors.is_empty() {
            for selector in &import.selectors {
                let symbol = &selector.name.name;
                let bound = selector.alias.as_ref().unwrap_or(&selector.name);
                let ty = if exports.private_symbols.contains(symbol) {
                    self.report(
                        DiagnosticKind::Import,
                        format!("package '{package}' symbol '{symbol}' is private"),
                        &selector.name,
                    );
                    Type::Unknown
                } else if let Some(ty) = exports.symbols.get(symbol) {
                    ty.clone()
                } else {
                    self.report(
                        DiagnosticKind::UnknownName,
                        format!("package '{package}' has no symbol '{symbol}'"),
                        &selector.name,
                    );
                    Type::Unknown
                };
                if selector.alias.is_some() && names_type(&ty, symbol) {
                    self.type_aliases.insert(bound.name.clone());
                }
                self.env.define_global(bound.name.clone(), ty);
            }
            return;
        }

        let value = Type::Package(exports.package_type());
        match &import.alias {
            Some(alias) => self.env.define_global(alias.name.clone(), value),
            None => {
                if let Some(last) = import.path.last() {
                    self.env.define_global(last.name.clone(), value.clone());
                }
                if import.path.len() > 1 {
                    self.env.define_global(package, value);
                }
            }
        }
    }

    /// Names an unresolvable import would have bound stay usable as
    /// Unknown so one bad import does not cascade.
    fn bind_unresolved(&mut self, import: &Import) {
        if let Some(alias) = &import.alias {
            self.env.define_global(alias.name.clone(), Type::Unknown);
        } else if import.selectors.is_empty() {
            if let Some(last) = import.path.last() {
                self.env.define_global(last.name.clone(), Type::Unknown);
            }
        }
        for selector in &import.selectors {
            let bound = selector.alias.as_ref().unwrap_or(&selector.name);
            self.env.define_global(bound.name.clone(), Type::Unknown);
        }
    }

    fn adopt_implementations(&mut self, exports: &PackageExports) {
        for spec in &exports.implementations {
            if !self.implementations.iter().any(|known| Rc::ptr_eq(known, spec)) {
                self.implementations.push(Rc::clone(spec));
            }
        }
        for set in &exports.method_sets {
            if !self.method_sets.iter().any(|known| Rc::ptr_eq(known, set)) {
                self.method_sets.push(Rc::clone(set));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_segments() {
        assert_eq!(root_segment("geometry.shapes"), "geometry");
        assert_eq!(root_segment("app"), "app");
    }
}
