//! Project-wide dependency graph over ISL documents.
//!
//! Nodes are absolute document paths. An edge runs from a dependency to each
//! document that references it, so a topological order lists every
//! dependency before its dependents. Any cycle is fatal.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Error;
use crate::parser::strip_bom;
use crate::reference::{absolute, parse_reference_line, resolve_against};

/// Directed dependency graph with per-node in-degree.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Reverse adjacency: for each node, the documents it references.
    dependencies: BTreeMap<PathBuf, Vec<PathBuf>>,
    /// Forward adjacency: for each node, the documents that reference it.
    dependents: BTreeMap<PathBuf, Vec<PathBuf>>,
    /// Number of recorded edges pointing into each node.
    in_degree: BTreeMap<PathBuf, usize>,
    /// Absolute, normalized project root.
    root: PathBuf,
}

impl DependencyGraph {
    /// Record an edge from `dependency` to `dependent`.
    /// Edges naming unknown nodes are ignored.
    pub fn add_edge(&mut self, dependency: &Path, dependent: &Path) {
        if !self.contains(dependency) || !self.contains(dependent) {
            return;
        }
        self.dependents
            .entry(dependency.to_path_buf())
            .or_default()
            .push(dependent.to_path_buf());
        self.dependencies
            .entry(dependent.to_path_buf())
            .or_default()
            .push(dependency.to_path_buf());
        let degree = self.in_degree.entry(dependent.to_path_buf()).or_default();
        *degree = degree.saturating_add(1);
    }

    /// Register a node with in-degree zero. Re-adding a node is a no-op.
    pub fn add_node(&mut self, path: &Path) {
        self.in_degree.entry(path.to_path_buf()).or_insert(0);
        self.dependents.entry(path.to_path_buf()).or_default();
        self.dependencies.entry(path.to_path_buf()).or_default();
    }

    /// Kahn's algorithm. Every dependency precedes its dependents.
    ///
    /// # Errors
    ///
    /// Returns `Error::DependencyCycle` naming one cycle among the
    /// documents that could not be ordered.
    pub fn build_order(&self) -> Result<Vec<PathBuf>, Error> {
        let mut remaining = self.in_degree.clone();
        let mut queue: VecDeque<PathBuf> = remaining
            .iter()
            .filter(|(_, degree)| return **degree == 0)
            .map(|(path, _)| return path.clone())
            .collect();
        let mut order = Vec::with_capacity(remaining.len());

        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents.get(&current).into_iter().flatten() {
                let Some(degree) = remaining.get_mut(dependent) else {
                    continue;
                };
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    queue.push_back(dependent.clone());
                }
            }
            order.push(current);
        }

        if order.len() < self.in_degree.len() {
            let ordered: BTreeSet<&PathBuf> = order.iter().collect();
            let unordered: BTreeSet<PathBuf> = self
                .in_degree
                .keys()
                .filter(|p| return !ordered.contains(p))
                .cloned()
                .collect();
            return Err(Error::DependencyCycle {
                chain: self.find_cycle(&unordered),
            });
        }

        return Ok(order);
    }

    /// Whether `path` is a node.
    pub fn contains(&self, path: &Path) -> bool {
        return self.in_degree.contains_key(path);
    }

    /// Documents that `path` references, in reference order.
    pub fn dependencies_of(&self, path: &Path) -> &[PathBuf] {
        return self.dependencies.get(path).map(Vec::as_slice).unwrap_or_default();
    }

    /// Walk unordered nodes along their dependencies until one repeats.
    ///
    /// Every unordered node still has an unordered dependency, so the walk
    /// always closes a loop. Paths are reported relative to the root.
    fn find_cycle(&self, unordered: &BTreeSet<PathBuf>) -> Vec<PathBuf> {
        let mut walk: Vec<PathBuf> = Vec::new();
        let mut current = unordered.iter().next().cloned();

        while let Some(node) = current {
            if let Some(start) = walk.iter().position(|p| return *p == node) {
                let mut chain: Vec<PathBuf> = walk.get(start..).unwrap_or_default().to_vec();
                chain.push(node);
                return chain.iter().map(|p| return self.relative(p)).collect();
            }
            current = self
                .dependencies_of(&node)
                .iter()
                .find(|d| return unordered.contains(*d))
                .cloned();
            walk.push(node);
        }

        return unordered.iter().map(|p| return self.relative(p)).collect();
    }

    /// Read every document and record an edge for each reference line that
    /// names another discovered document. Unreadable documents contribute no
    /// edges; their own build step reports the failure.
    pub fn from_documents(root: &Path, documents: &[PathBuf]) -> Self {
        let mut graph = Self::new(root);
        for document in documents {
            graph.add_node(document);
        }

        for document in documents {
            let content = match std::fs::read_to_string(document) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(path = %document.display(), error = %e, "cannot read document while building graph");
                    continue;
                },
            };
            for target in strip_bom(&content).lines().filter_map(parse_reference_line) {
                let dependency = resolve_against(document, target);
                if graph.contains(&dependency) {
                    graph.add_edge(&dependency, document);
                } else {
                    tracing::debug!(from = %document.display(), reference = target, "reference outside the document set");
                }
            }
        }

        return graph;
    }

    /// Group an order into levels: roots are level 0, every other node sits one
    /// level above its deepest dependency. Nodes within a level are independent.
    pub fn levels(&self, order: &[PathBuf]) -> Vec<Vec<PathBuf>> {
        let mut level_of: BTreeMap<&Path, usize> = BTreeMap::new();
        let mut levels: Vec<Vec<PathBuf>> = Vec::new();

        for node in order {
            let level = self
                .dependencies_of(node)
                .iter()
                .filter_map(|d| return level_of.get(d.as_path()))
                .max()
                .map_or(0, |deepest| return deepest.saturating_add(1));
            level_of.insert(node.as_path(), level);
            if levels.len() <= level {
                levels.resize_with(level.saturating_add(1), Vec::new);
            }
            if let Some(bucket) = levels.get_mut(level) {
                bucket.push(node.clone());
            }
        }

        return levels;
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        return self.in_degree.len();
    }

    /// Empty graph rooted at `root`.
    pub fn new(root: &Path) -> Self {
        return Self {
            dependencies: BTreeMap::new(),
            dependents: BTreeMap::new(),
            in_degree: BTreeMap::new(),
            root: absolute(root),
        };
    }

    /// A node path relative to the project root.
    pub fn relative(&self, path: &Path) -> PathBuf {
        return path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
    }

    /// Absolute project root.
    pub fn root(&self) -> &Path {
        return &self.root;
    }
}

/// Recursively find every document under `root` whose file name ends with the
/// configured suffix and passes the include/exclude filters. Sorted, absolute.
pub fn discover(root: &Path, config: &Config) -> Vec<PathBuf> {
    let root = absolute(root);
    let mut documents: Vec<PathBuf> = WalkDir::new(&root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file())
        .filter(|e| return e.file_name().to_string_lossy().ends_with(config.suffix.as_str()))
        .filter(|e| {
            let relative = e.path().strip_prefix(&root).unwrap_or(e.path());
            return config.should_scan(&relative.to_string_lossy().replace('\\', "/"));
        })
        .map(|e| return absolute(e.path()))
        .collect();
    documents.sort();
    return documents;
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::indexing_slicing, reason = "test assertions")]
mod tests {
    use super::*;

    fn graph_of(edges: &[(&str, &str)], nodes: &[&str]) -> DependencyGraph {
        let mut graph = DependencyGraph::new(Path::new("/p"));
        for node in nodes {
            graph.add_node(&Path::new("/p").join(node));
        }
        for (dependency, dependent) in edges {
            graph.add_edge(&Path::new("/p").join(dependency), &Path::new("/p").join(dependent));
        }
        return graph;
    }

    fn position(order: &[PathBuf], name: &str) -> usize {
        return order.iter().position(|p| return p.ends_with(name)).unwrap();
    }

    #[test]
    fn three_document_cycle_is_fatal() {
        // a references b, b references c, c references a.
        let graph = graph_of(&[("b", "a"), ("c", "b"), ("a", "c")], &["a", "b", "c"]);
        let Err(Error::DependencyCycle { chain }) = graph.build_order() else {
            panic!("expected a cycle");
        };
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.first(), chain.last());
        assert_eq!(
            chain,
            vec![PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c"), PathBuf::from("a")]
        );
    }

    #[test]
    fn cycle_report_skips_acyclic_prefix() {
        // root is fine; x <-> y is the cycle; z depends on the cycle.
        let graph = graph_of(&[("x", "y"), ("y", "x"), ("x", "z"), ("root", "x")], &["root", "x", "y", "z"]);
        let Err(Error::DependencyCycle { chain }) = graph.build_order() else {
            panic!("expected a cycle");
        };
        assert!(!chain.contains(&PathBuf::from("root")));
        assert!(!chain.contains(&PathBuf::from("z")));
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let graph = graph_of(&[("a", "a")], &["a"]);
        assert!(matches!(graph.build_order(), Err(Error::DependencyCycle { .. })));
    }

    #[test]
    fn dependencies_precede_dependents() {
        // Diamond: top <- left, right <- bottom; plus an isolated node.
        let edges = [("top", "left"), ("top", "right"), ("left", "bottom"), ("right", "bottom")];
        let graph = graph_of(&edges, &["bottom", "left", "lone", "right", "top"]);
        let order = graph.build_order().unwrap();

        assert_eq!(order.len(), 5);
        for (dependency, dependent) in edges {
            assert!(position(&order, dependency) < position(&order, dependent));
        }
    }

    #[test]
    fn levels_group_independent_documents() {
        let edges = [("top", "left"), ("top", "right"), ("left", "bottom"), ("right", "bottom")];
        let graph = graph_of(&edges, &["bottom", "left", "lone", "right", "top"]);
        let order = graph.build_order().unwrap();
        let levels = graph.levels(&order);

        let names = |level: &[PathBuf]| -> Vec<String> {
            return level.iter().map(|p| return graph.relative(p).display().to_string()).collect();
        };
        assert_eq!(levels.len(), 3);
        assert_eq!(names(&levels[0]), vec!["lone", "top"]);
        assert_eq!(names(&levels[1]), vec!["left", "right"]);
        assert_eq!(names(&levels[2]), vec!["bottom"]);
    }

    #[test]
    fn edges_to_unknown_nodes_are_ignored() {
        let graph = graph_of(&[("ghost", "a")], &["a"]);
        assert_eq!(graph.build_order().unwrap().len(), 1);
        assert!(graph.dependencies_of(Path::new("/p/a")).is_empty());
    }

    #[test]
    fn graph_is_built_from_reference_lines() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("ui")).unwrap();
        std::fs::write(root.join("domain.isl.md"), "# Domain").unwrap();
        std::fs::write(
            root.join("ui/cart.isl.md"),
            "> **Reference**: [d](../domain.isl.md)\n> **Reference**: [x](../missing.isl.md)",
        )
        .unwrap();
        std::fs::write(root.join("notes.md"), "> **Reference**: [d](domain.isl.md)").unwrap();

        let documents = discover(root, &Config::default());
        assert_eq!(documents.len(), 2);

        let graph = DependencyGraph::from_documents(root, &documents);
        let order = graph.build_order().unwrap();
        assert_eq!(graph.relative(&order[0]), PathBuf::from("domain.isl.md"));
        assert_eq!(graph.relative(&order[1]), PathBuf::from("ui/cart.isl.md"));
    }

    #[test]
    fn reference_on_first_line_after_bom_is_an_edge() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("0.isl.md"), "\u{FEFF}> **Reference**: [z](z.isl.md)").unwrap();
        std::fs::write(root.join("z.isl.md"), "\u{FEFF}> **Reference**: [a](a.isl.md)").unwrap();
        std::fs::write(root.join("a.isl.md"), "# A").unwrap();

        let documents = discover(root, &Config::default());
        let graph = DependencyGraph::from_documents(root, &documents);
        let z = documents.iter().find(|d| return d.ends_with("z.isl.md")).unwrap();
        let deps: Vec<PathBuf> = graph.dependencies_of(z).iter().map(|p| return graph.relative(p)).collect();
        assert_eq!(deps, vec![PathBuf::from("a.isl.md")]);

        let order: Vec<PathBuf> = graph.build_order().unwrap().iter().map(|p| return graph.relative(p)).collect();
        assert_eq!(
            order,
            vec![PathBuf::from("a.isl.md"), PathBuf::from("z.isl.md"), PathBuf::from("0.isl.md")]
        );
    }

    #[test]
    fn discovery_skips_output_and_excluded_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for name in ["a.isl.md", "build/a.isl.md", "drafts/b.isl.md", "c.ref.md"] {
            let path = root.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "# X").unwrap();
        }

        let config = Config::parse("exclude = [\"drafts/\"]").unwrap();
        let documents = discover(root, &config);
        assert_eq!(documents, vec![absolute(&root.join("a.isl.md"))]);
    }
}
