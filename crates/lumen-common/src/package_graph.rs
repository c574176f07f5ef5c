//! Package graph for whole-program checking.
//!
//! A program is a set of modules grouped by package name. Packages import one
//! another, and every package must be checked after the packages it imports
//! so their exports are available. [`PackageGraph`] records the import edges
//! and [`topological_sort`] yields a deterministic checking order.

use std::collections::VecDeque;
use std::fmt;

use rustc_hash::FxHashMap;

/// A unique identifier for a package within one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub u32);

/// Metadata about a single package in the graph.
#[derive(Debug)]
pub struct PackageInfo {
    pub id: PackageId,
    /// Dotted package name, e.g. `"geometry.shapes"`.
    pub name: String,
    /// Indices of the program modules that belong to this package, in input order.
    pub modules: Vec<usize>,
    /// Packages this package imports.
    pub dependencies: Vec<PackageId>,
}

/// Error returned when packages import each other in a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    /// Package names forming the cycle, first name repeated at the end.
    pub cycle_path: Vec<String>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cycle_path.join(" -> "))
    }
}

impl std::error::Error for CycleError {}

/// A directed graph of packages and their imports.
#[derive(Debug, Default)]
pub struct PackageGraph {
    pub packages: Vec<PackageInfo>,
    name_to_id: FxHashMap<String, PackageId>,
}

impl PackageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, registering the package if it is new.
    pub fn intern(&mut self, name: &str) -> PackageId {
        if let Some(id) = self.name_to_id.get(name) {
            return *id;
        }
        let id = PackageId(self.packages.len() as u32);
        self.name_to_id.insert(name.to_string(), id);
        self.packages.push(PackageInfo {
            id,
            name: name.to_string(),
            modules: Vec::new(),
            dependencies: Vec::new(),
        });
        id
    }

    /// Attach the program module at `index` to package `id`.
    pub fn add_module(&mut self, id: PackageId, index: usize) {
        self.packages[id.0 as usize].modules.push(index);
    }

    pub fn resolve(&self, name: &str) -> Option<PackageId> {
        self.name_to_id.get(name).copied()
    }

    /// Record that package `from` imports package `to`.
    /// Duplicate edges and self-imports are ignored.
    pub fn add_dependency(&mut self, from: PackageId, to: PackageId) {
        if from == to {
            return;
        }
        let deps = &mut self.packages[from.0 as usize].dependencies;
        if !deps.contains(&to) {
            deps.push(to);
        }
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn get(&self, id: PackageId) -> &PackageInfo {
        &self.packages[id.0 as usize]
    }
}

/// Order packages so that every package follows the packages it imports.
///
/// Kahn's algorithm with alphabetical tie-breaking, so the order does not
/// depend on module input order.
pub fn topological_sort(graph: &PackageGraph) -> Result<Vec<PackageId>, CycleError> {
    let n = graph.packages.len();
    // Number of imports of package i not yet emitted.
    let mut in_degree: Vec<u32> = graph
        .packages
        .iter()
        .map(|p| p.dependencies.len() as u32)
        .collect();

    let by_name = |a: &PackageId, b: &PackageId| {
        graph.packages[a.0 as usize]
            .name
            .cmp(&graph.packages[b.0 as usize].name)
    };

    let mut ready: Vec<PackageId> = (0..n)
        .filter(|&i| in_degree[i] == 0)
        .map(|i| PackageId(i as u32))
        .collect();
    ready.sort_by(by_name);

    let mut queue = VecDeque::from(ready);
    let mut order = Vec::with_capacity(n);

    while let Some(id) = queue.pop_front() {
        order.push(id);
        let mut newly_ready = Vec::new();
        for (i, package) in graph.packages.iter().enumerate() {
            if in_degree[i] > 0 && package.dependencies.contains(&id) {
                in_degree[i] -= 1;
                if in_degree[i] == 0 {
                    newly_ready.push(PackageId(i as u32));
                }
            }
        }
        newly_ready.sort_by(by_name);
        queue.extend(newly_ready);
    }

    if order.len() == n {
        Ok(order)
    } else {
        Err(CycleError {
            cycle_path: extract_cycle_path(graph, &in_degree),
        })
    }
}

/// Walk import edges among unprocessed packages until one repeats.
fn extract_cycle_path(graph: &PackageGraph, in_degree: &[u32]) -> Vec<String> {
    let Some(start) = (0..graph.packages.len()).find(|&i| in_degree[i] > 0) else {
        return Vec::new();
    };

    let mut path: Vec<usize> = Vec::new();
    let mut visited = vec![false; graph.packages.len()];
    let mut current = start;

    loop {
        if visited[current] {
            let begin = path.iter().position(|&p| p == current).unwrap_or(0);
            let mut cycle: Vec<String> = path[begin..]
                .iter()
                .map(|&p| graph.packages[p].name.clone())
                .collect();
            cycle.push(graph.packages[current].name.clone());
            return cycle;
        }
        visited[current] = true;
        path.push(current);

        let next = graph.packages[current]
            .dependencies
            .iter()
            .find(|dep| in_degree[dep.0 as usize] > 0);
        match next {
            Some(dep) => current = dep.0 as usize,
            None => {
                return path
                    .iter()
                    .map(|&p| graph.packages[p].name.clone())
                    .collect();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(graph: &PackageGraph, order: &[PackageId]) -> Vec<String> {
        order.iter().map(|id| graph.get(*id).name.clone()).collect()
    }

    #[test]
    fn intern_is_idempotent() {
        let mut graph = PackageGraph::new();
        let a = graph.intern("geometry");
        let b = graph.intern("geometry");
        assert_eq!(a, b);
        assert_eq!(graph.package_count(), 1);
        assert_eq!(graph.resolve("geometry"), Some(a));
        assert_eq!(graph.resolve("missing"), None);
    }

    #[test]
    fn modules_attach_in_order() {
        let mut graph = PackageGraph::new();
        let a = graph.intern("app");
        graph.add_module(a, 2);
        graph.add_module(a, 0);
        assert_eq!(graph.get(a).modules, vec![2, 0]);
    }

    #[test]
    fn self_import_is_ignored() {
        let mut graph = PackageGraph::new();
        let a = graph.intern("app");
        graph.add_dependency(a, a);
        assert!(graph.get(a).dependencies.is_empty());
        assert_eq!(names(&graph, &topological_sort(&graph).unwrap()), vec!["app"]);
    }

    // ── Topological sort ────────────────────────────────────────────────

    #[test]
    fn toposort_linear() {
        let mut graph = PackageGraph::new();
        let a = graph.intern("a");
        let b = graph.intern("b");
        let c = graph.intern("c");
        graph.add_dependency(a, b);
        graph.add_dependency(b, c);

        let order = topological_sort(&graph).unwrap();
        assert_eq!(names(&graph, &order), vec!["c", "b", "a"]);
    }

    #[test]
    fn toposort_independent_is_alphabetical() {
        let mut graph = PackageGraph::new();
        graph.intern("zeta");
        graph.intern("alpha");
        graph.intern("mid");

        let order = topological_sort(&graph).unwrap();
        assert_eq!(names(&graph, &order), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn toposort_diamond() {
        let mut graph = PackageGraph::new();
        let main = graph.intern("main");
        let left = graph.intern("left");
        let right = graph.intern("right");
        let base = graph.intern("base");
        graph.add_dependency(main, left);
        graph.add_dependency(main, right);
        graph.add_dependency(left, base);
        graph.add_dependency(right, base);

        let order = topological_sort(&graph).unwrap();
        assert_eq!(names(&graph, &order), vec!["base", "left", "right", "main"]);
    }

    #[test]
    fn toposort_cycle_reports_path() {
        let mut graph = PackageGraph::new();
        let a = graph.intern("a");
        let b = graph.intern("b");
        let c = graph.intern("c");
        graph.add_dependency(a, b);
        graph.add_dependency(b, c);
        graph.add_dependency(c, a);

        let err = topological_sort(&graph).unwrap_err();
        assert_eq!(err.cycle_path, vec!["a", "b", "c", "a"]);
        assert_eq!(err.to_string(), "a -> b -> c -> a");
    }

    #[test]
    fn toposort_cycle_behind_acyclic_prefix() {
        let mut graph = PackageGraph::new();
        let entry = graph.intern("entry");
        let x = graph.intern("x");
        let y = graph.intern("y");
        graph.add_dependency(entry, x);
        graph.add_dependency(x, y);
        graph.add_dependency(y, x);

        let err = topological_sort(&graph).unwrap_err();
        assert_eq!(err.cycle_path.first(), err.cycle_path.last());
        assert!(err.cycle_path.contains(&"x".to_string()));
        assert!(err.cycle_path.contains(&"y".to_string()));
    }
}
