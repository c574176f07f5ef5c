//! Lumen type checker: static semantic analysis of parsed Lumen modules.
//!
//! The checker walks a [`Module`] produced by an external parser, infers a
//! type for every expression, resolves members (including uniform call
//! syntax), discharges interface obligations and reports every semantic
//! problem as a [`Diagnostic`]. Only structurally invalid input is fatal.
//!
//! # Architecture
//!
//! - [`ty`]: the type model and its formatting
//! - [`numeric`], [`unions`], [`subst`], [`assignable`], [`matching`]:
//!   promotion, union normalisation, substitution and assignability
//! - `decls`: declaration collection ahead of statement checking
//! - `members`: field, method, implementation and UFCS lookup
//! - `solver`: interface satisfaction with specificity ranking
//! - `checker`: the expression and statement walk
//! - [`program`]: whole-program checking in package dependency order
//! - [`summary`], [`diagnostics`]: output for tools and terminals

pub mod assignable;
pub mod builtins;
mod checker;
mod decls;
pub mod diagnostics;
pub mod env;
pub mod error;
mod imports;
pub mod matching;
mod members;
pub mod numeric;
pub mod program;
mod solver;
pub mod specs;
pub mod subst;
pub mod summary;
pub mod ty;
pub mod unions;
mod validate;

use std::rc::Rc;

use lumen_ast::{Module, NodeId};
use rustc_hash::FxHashMap;
use tracing::{debug, info_span};

use crate::checker::Checker;

pub use crate::error::{CheckError, Diagnostic, DiagnosticKind};
pub use crate::program::{PackageExports, ProgramChecker, ProgramDiagnostic, ProgramResult};
pub use crate::summary::PackageSummary;
pub use crate::ty::Type;

/// Inputs a module check needs besides the module itself.
#[derive(Clone, Debug)]
pub struct CheckOptions {
    /// Export snapshots imports resolve against.
    pub packages: Vec<Rc<PackageExports>>,
    /// Packages whose public symbols every module sees without importing.
    pub prelude: Vec<Rc<PackageExports>>,
    /// Install implementations of the core interfaces for scalars.
    pub builtin_impls: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            packages: Vec::new(),
            prelude: Vec::new(),
            builtin_impls: true,
        }
    }
}

/// The result of checking one module.
#[derive(Debug)]
pub struct TypeckResult {
    pub diagnostics: Vec<Diagnostic>,
    /// Inferred type per expression and statement node.
    pub types: FxHashMap<NodeId, Type>,
    pub exports: PackageExports,
}

impl TypeckResult {
    pub fn type_of(&self, node: NodeId) -> Option<&Type> {
        self.types.get(&node)
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn summary(&self) -> PackageSummary {
        PackageSummary::from_exports(&self.exports)
    }
}

/// Type-check one module.
///
/// Imports bind first, then declarations are collected so statements can
/// refer to names declared further down. Statements are checked in order,
/// pending obligations are resolved, and finally every implementation is
/// validated against its interface.
pub fn check_module(module: Option<&Module>, options: &CheckOptions) -> Result<TypeckResult, CheckError> {
    let module = module.ok_or(CheckError::NilModule)?;
    let package = module.package_name().unwrap_or_default();
    let _span = info_span!("check_module", package = %package).entered();

    let mut checker = Checker::new(module, options);
    checker.check_imports(&module.imports);
    checker.collect_declarations(module);
    for stmt in &module.body {
        checker.check_stmt(stmt);
    }
    checker.resolve_obligations();
    checker.validate_implementations();
    debug!(diagnostics = checker.diagnostics.len(), "module checked");

    let exports = PackageExports::from_checker(&checker);
    Ok(TypeckResult {
        diagnostics: checker.diagnostics,
        types: checker.types,
        exports,
    })
}
