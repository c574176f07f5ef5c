//! Shared types for the Lumen type checker.
//!
//! Source spans, the package dependency graph used to order whole-program
//! checking, and diagnostic presentation settings.

pub mod config;
pub mod package_graph;
pub mod span;

pub use config::DiagnosticConfig;
pub use package_graph::{topological_sort, CycleError, PackageGraph, PackageId};
pub use span::{LineIndex, Span};
