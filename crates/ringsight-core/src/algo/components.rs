//! Connected-component clustering over a collapsed projection.
//!
//! Fraud rings are extracted as connected components of a *selected* subset
//! of nodes (e.g., all nodes whose fraud probability exceeds a threshold).
//! The projection collapses node and edge types: two selected nodes are
//! connected if any heterogeneous edge joins them, in either direction.

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::hetero::{HeteroGraph, NodeType, TypedNodeIndex};

/// A (node type, local index) pair identifying one node in a [`HeteroGraph`].
pub type TypedNode = (NodeType, TypedNodeIndex);

// Union-Find helpers (module level per clippy).
fn uf_find(parent: &mut [usize], i: usize) -> usize {
    if parent[i] != i {
        parent[i] = uf_find(parent, parent[i]); // Path compression
    }
    parent[i]
}

fn uf_union(parent: &mut [usize], rank: &mut [usize], x: usize, y: usize) {
    let px = uf_find(parent, x);
    let py = uf_find(parent, y);
    if px == py {
        return;
    }
    // Union by rank
    match rank[px].cmp(&rank[py]) {
        Ordering::Less => parent[px] = py,
        Ordering::Greater => parent[py] = px,
        Ordering::Equal => {
            parent[py] = px;
            rank[px] += 1;
        }
    }
}

/// Build the collapsed undirected projection induced by `selected`.
fn collapsed_projection(
    graph: &HeteroGraph,
    selected: &HashSet<TypedNode>,
) -> (UnGraph<TypedNode, ()>, HashMap<TypedNode, petgraph::graph::NodeIndex>) {
    let mut projection = UnGraph::<TypedNode, ()>::default();
    let mut index_of = HashMap::with_capacity(selected.len());

    // Deterministic node order: sort selected nodes.
    let mut ordered: Vec<&TypedNode> = selected.iter().collect();
    ordered.sort();
    for node in ordered {
        let idx = projection.add_node(node.clone());
        index_of.insert(node.clone(), idx);
    }

    for edge_type in graph.edge_types() {
        let Some(store) = graph.edge_store(edge_type) else {
            continue;
        };
        for (src, dst) in store.iter() {
            let s = (edge_type.src_type.clone(), src);
            let d = (edge_type.dst_type.clone(), dst);
            if let (Some(&si), Some(&di)) = (index_of.get(&s), index_of.get(&d)) {
                if si != di {
                    projection.add_edge(si, di, ());
                }
            }
        }
    }

    (projection, index_of)
}

/// Cluster the selected nodes into connected components.
///
/// Components are returned largest-first; within a component, members are in
/// sorted `(node_type, index)` order. Singleton components are included; the
/// caller filters by minimum size.
#[must_use]
pub fn connected_clusters(
    graph: &HeteroGraph,
    selected: &HashSet<TypedNode>,
) -> Vec<Vec<TypedNode>> {
    if selected.is_empty() {
        return vec![];
    }

    let (projection, _) = collapsed_projection(graph, selected);
    let n = projection.node_count();

    let mut parent: Vec<usize> = (0..n).collect();
    let mut rank: Vec<usize> = vec![0; n];

    for edge in projection.edge_references() {
        uf_union(
            &mut parent,
            &mut rank,
            edge.source().index(),
            edge.target().index(),
        );
    }

    let mut components: HashMap<usize, Vec<TypedNode>> = HashMap::new();
    for idx in projection.node_indices() {
        let root = uf_find(&mut parent, idx.index());
        components
            .entry(root)
            .or_default()
            .push(projection[idx].clone());
    }

    let mut clusters: Vec<Vec<TypedNode>> = components.into_values().collect();
    for cluster in &mut clusters {
        cluster.sort();
    }
    // Largest first; ties broken by first member for determinism.
    clusters.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
    clusters
}

/// Statistics about a set of clusters.
#[derive(Debug, Clone)]
pub struct ClusterStats {
    /// Number of clusters.
    pub num_clusters: usize,
    /// Size of the largest cluster.
    pub max_cluster_size: usize,
    /// Size of the smallest cluster.
    pub min_cluster_size: usize,
    /// Average cluster size.
    pub avg_cluster_size: f64,
    /// Fraction of selected nodes in the largest cluster.
    pub largest_cluster_fraction: f64,
}

/// Compute statistics from clusters. Returns zeroed stats for no clusters.
#[must_use]
pub fn cluster_stats(clusters: &[Vec<TypedNode>]) -> ClusterStats {
    if clusters.is_empty() {
        return ClusterStats {
            num_clusters: 0,
            max_cluster_size: 0,
            min_cluster_size: 0,
            avg_cluster_size: 0.0,
            largest_cluster_fraction: 0.0,
        };
    }

    let sizes: Vec<usize> = clusters.iter().map(Vec::len).collect();
    let total: usize = sizes.iter().sum();
    let max_size = sizes.iter().copied().max().unwrap_or(0);
    let min_size = sizes.iter().copied().min().unwrap_or(0);

    ClusterStats {
        num_clusters: clusters.len(),
        max_cluster_size: max_size,
        min_cluster_size: min_size,
        avg_cluster_size: total as f64 / clusters.len() as f64,
        largest_cluster_fraction: if total > 0 {
            max_size as f64 / total as f64
        } else {
            0.0
        },
    }
}
