//! Graph traversal and connectivity.
//!
//! The algorithms here run over anything implementing [`Graph`]: a
//! [`HalfEdgeMesh`] (neighbours in cyclic order) or a plain adjacency map
//! such as the one returned by [`HalfEdgeMesh::adjacency`].
//!
//! # Example
//!
//! ```
//! use meshwork::prelude::*;
//! use meshwork::algo::traversal::{connected_components, is_connected};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(5.0, 0.0, 0.0),
//!     Point3::new(6.0, 0.0, 0.0),
//!     Point3::new(5.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [3, 4, 5]];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! assert_eq!(connected_components(&mesh).len(), 2);
//! assert!(!is_connected(&mesh));
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

use crate::mesh::{HalfEdgeMesh, MeshIndex, VertexKey};

/// A read-only view of nodes and their neighbours.
pub trait Graph {
    /// Node identifier.
    type Node: Copy + Eq + Ord + Hash;

    /// All nodes, in the graph's iteration order.
    fn nodes(&self) -> Vec<Self::Node>;

    /// The neighbours of `node`. Unknown nodes have none.
    fn neighbors(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Number of nodes.
    fn num_nodes(&self) -> usize {
        self.nodes().len()
    }
}

impl<I: MeshIndex> Graph for HalfEdgeMesh<I> {
    type Node = VertexKey<I>;

    fn nodes(&self) -> Vec<VertexKey<I>> {
        self.vertex_keys().collect()
    }

    fn neighbors(&self, node: VertexKey<I>) -> Vec<VertexKey<I>> {
        self.vertex_neighbors(node)
    }

    fn num_nodes(&self) -> usize {
        self.num_vertices()
    }
}

impl<K: Copy + Eq + Ord + Hash> Graph for BTreeMap<K, Vec<K>> {
    type Node = K;

    fn nodes(&self) -> Vec<K> {
        self.keys().copied().collect()
    }

    fn neighbors(&self, node: K) -> Vec<K> {
        self.get(&node).cloned().unwrap_or_default()
    }

    fn num_nodes(&self) -> usize {
        self.len()
    }
}

/// Nodes come out sorted so traversals over a hash map are reproducible.
impl<K: Copy + Eq + Ord + Hash> Graph for HashMap<K, Vec<K>> {
    type Node = K;

    fn nodes(&self) -> Vec<K> {
        let mut nodes: Vec<K> = self.keys().copied().collect();
        nodes.sort_unstable();
        nodes
    }

    fn neighbors(&self, node: K) -> Vec<K> {
        self.get(&node).cloned().unwrap_or_default()
    }

    fn num_nodes(&self) -> usize {
        self.len()
    }
}

/// Nodes reachable from `root`, in breadth-first visiting order.
///
/// `root` itself comes first, even if the graph does not list it.
pub fn breadth_first_ordering<G: Graph>(graph: &G, root: G::Node) -> Vec<G::Node> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::new();

    visited.insert(root);
    queue.push_back(root);

    while let Some(node) = queue.pop_front() {
        order.push(node);
        for nbr in graph.neighbors(node) {
            if visited.insert(nbr) {
                queue.push_back(nbr);
            }
        }
    }

    order
}

/// The set of nodes reachable from `root`.
pub fn breadth_first_traverse<G: Graph>(graph: &G, root: G::Node) -> HashSet<G::Node> {
    breadth_first_ordering(graph, root).into_iter().collect()
}

/// Partition the graph into connected components.
///
/// Roots are taken in node order, so the first component contains the first
/// node. Each component lists its nodes in breadth-first order from its root.
/// Every node appears in exactly one component.
pub fn connected_components<G: Graph>(graph: &G) -> Vec<Vec<G::Node>> {
    let mut pool: BTreeSet<G::Node> = graph.nodes().into_iter().collect();
    let mut components = Vec::new();

    while let Some(root) = pool.pop_first() {
        let component: Vec<G::Node> = breadth_first_ordering(graph, root)
            .into_iter()
            .filter(|n| *n == root || pool.remove(n))
            .collect();
        components.push(component);
    }

    components
}

/// Whether every node is reachable from every other.
///
/// A graph without nodes is not connected.
pub fn is_connected<G: Graph>(graph: &G) -> bool {
    let nodes = graph.nodes();
    let Some(&root) = nodes.first() else {
        return false;
    };
    let reached = breadth_first_traverse(graph, root);
    nodes.iter().all(|n| reached.contains(n))
}

/// Whether the vertices of a mesh form a single connected component.
pub fn mesh_is_connected<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> bool {
    is_connected(mesh)
}
