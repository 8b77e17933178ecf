use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::hash::BuildHasherDefault;

use crate::request::AnyRequest;

type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// Which requests asked for which, in the order they asked.
///
/// Requests evaluated with an empty active stack are roots. Every other
/// evaluation adds an edge from the request on top of the stack, whether or
/// not the requested value came from a cache.
#[derive(Default)]
pub struct DependencyRecorder {
    roots: FxIndexSet<AnyRequest>,
    edges: FxIndexMap<AnyRequest, FxIndexSet<AnyRequest>>,
}

impl DependencyRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, dependent: Option<&AnyRequest>, request: &AnyRequest) {
        match dependent {
            Some(dependent) => {
                self.edges
                    .entry(dependent.clone())
                    .or_default()
                    .insert(request.clone());
            }
            None => {
                self.roots.insert(request.clone());
            }
        }
    }

    pub fn roots(&self) -> impl Iterator<Item = &AnyRequest> {
        self.roots.iter()
    }

    /// Direct dependencies of `request`, in the order they were first requested
    pub fn dependencies_of(&self, request: &AnyRequest) -> Vec<&AnyRequest> {
        self.edges
            .get(request)
            .map(|deps| deps.iter().collect())
            .unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|deps| deps.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.edges.is_empty()
    }

    /// Render the dependency tree below `request`.
    ///
    /// A request already printed elsewhere in the tree has its subtree
    /// replaced by `(elided)`; an edge back into the current path is marked
    /// `(cyclic dependency)`.
    pub fn print_dependencies(&self, request: &AnyRequest) -> String {
        let mut out = String::new();
        let mut visited = FxHashSet::default();
        let mut path = Vec::new();
        self.print_node(request, "", true, &mut visited, &mut path, &mut out);
        out
    }

    /// Trees for every root, in the order the roots were evaluated
    pub fn print_all(&self) -> String {
        let mut out = String::new();
        let mut visited = FxHashSet::default();
        let mut path = Vec::new();
        for root in &self.roots {
            self.print_node(root, "", true, &mut visited, &mut path, &mut out);
        }
        out
    }

    fn print_node(
        &self,
        request: &AnyRequest,
        prefix: &str,
        last_child: bool,
        visited: &mut FxHashSet<AnyRequest>,
        path: &mut Vec<AnyRequest>,
        out: &mut String,
    ) {
        out.push_str(prefix);
        out.push_str(if last_child { "`--" } else { "|--" });
        out.push_str(&request.to_string());

        if path.contains(request) {
            out.push_str(" (cyclic dependency)\n");
            return;
        }

        let children = self.edges.get(request).filter(|deps| !deps.is_empty());
        if !visited.insert(request.clone()) && children.is_some() {
            out.push_str(" (elided)\n");
            return;
        }
        out.push('\n');

        let Some(children) = children else {
            return;
        };

        let child_prefix = format!("{}{}", prefix, if last_child { "   " } else { "|  " });
        path.push(request.clone());
        for (index, child) in children.iter().enumerate() {
            let last = index + 1 == children.len();
            self.print_node(child, &child_prefix, last, visited, path, out);
        }
        path.pop();
    }

    /// Render the whole graph in Graphviz DOT format
    pub fn to_graphviz(&self) -> String {
        let mut ids: FxHashMap<&AnyRequest, usize> = FxHashMap::default();
        let mut nodes: Vec<&AnyRequest> = Vec::new();
        let mut node_id = |request| {
            *ids.entry(request).or_insert_with(|| {
                nodes.push(request);
                nodes.len() - 1
            })
        };

        for root in &self.roots {
            node_id(root);
        }
        let mut edges = Vec::with_capacity(self.edge_count());
        for (dependent, deps) in &self.edges {
            let from = node_id(dependent);
            for dep in deps {
                edges.push((from, node_id(dep)));
            }
        }

        let mut out = String::from("digraph Dependencies {\n");
        for (id, request) in nodes.iter().enumerate() {
            out.push_str(&format!(
                "  request_{} [label=\"{}\"];\n",
                id,
                escape_label(&request.to_string())
            ));
        }
        if !edges.is_empty() {
            out.push('\n');
        }
        for (from, to) in edges {
            out.push_str(&format!("  request_{} -> request_{};\n", from, to));
        }
        out.push_str("}\n");
        out
    }
}

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
