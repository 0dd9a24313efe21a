//! Heterogeneous graph with typed nodes, features and edge attributes.
//!
//! A fraud graph has multiple node types (account, device, ip, transaction,
//! merchant) and typed relations between them. Each node type keeps its own
//! store with string identifiers, a dense feature vector per node and an
//! optional binary fraud label; each edge type keeps COO index vectors plus
//! optional per-edge attribute vectors.
//!
//! # Example
//!
//! ```rust
//! use ringsight_core::{EdgeType, HeteroGraph, NodeType};
//!
//! let mut graph = HeteroGraph::new();
//! let makes = EdgeType::new("account", "makes", "transaction");
//!
//! graph.add_edge(&makes, "acct_1", "txn_1");
//! graph.add_edge(&makes, "acct_1", "txn_2");
//!
//! let account = NodeType::new("account");
//! let idx = graph.get_node_index(&account, "acct_1").unwrap();
//! assert_eq!(graph.neighbors(&makes, idx).len(), 2);
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A node type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeType(pub String);

impl NodeType {
    /// Create a new node type.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for NodeType {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

/// An edge type, represented as a (src_type, relation, dst_type) triple.
///
/// Serializes as the string `"src:relation:dst"` so edge-typed maps stay
/// JSON-compatible. Component names must therefore not contain `:`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeType {
    /// Source node type.
    pub src_type: NodeType,
    /// Relation name.
    pub relation: String,
    /// Destination node type.
    pub dst_type: NodeType,
}

impl EdgeType {
    /// Create a new edge type.
    pub fn new(
        src_type: impl Into<NodeType>,
        relation: impl Into<String>,
        dst_type: impl Into<NodeType>,
    ) -> Self {
        Self {
            src_type: src_type.into(),
            relation: relation.into(),
            dst_type: dst_type.into(),
        }
    }

    /// The reverse edge type, used to propagate messages against edge direction.
    pub fn reverse(&self) -> Self {
        Self {
            src_type: self.dst_type.clone(),
            relation: format!("rev_{}", self.relation),
            dst_type: self.src_type.clone(),
        }
    }

    /// Whether this is a reverse edge type produced by [`EdgeType::reverse`].
    pub fn is_reverse(&self) -> bool {
        self.relation.starts_with("rev_")
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.src_type, self.relation, self.dst_type)
    }
}

impl FromStr for EdgeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(src), Some(rel), Some(dst), None)
                if !src.is_empty() && !rel.is_empty() && !dst.is_empty() =>
            {
                Ok(Self::new(src, rel, dst))
            }
            _ => Err(Error::MalformedEdgeType(s.to_string())),
        }
    }
}

impl Serialize for EdgeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EdgeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Node index within a specific node type.
pub type TypedNodeIndex = usize;

/// Node store for a single node type.
///
/// Keeps node IDs, an ID-to-index map, a feature vector per node (uniform
/// dimension, established by the first attached vector) and an optional
/// binary fraud label per node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeStore {
    /// Node IDs in insertion order.
    pub ids: Vec<String>,
    id_to_idx: HashMap<String, TypedNodeIndex>,
    features: Vec<Vec<f32>>,
    feature_dim: usize,
    labels: Vec<Option<bool>>,
}

impl NodeStore {
    /// Create an empty node store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.ids.len()
    }

    /// Feature dimension (0 until the first feature vector is attached).
    pub fn feature_dim(&self) -> usize {
        self.feature_dim
    }

    /// Add a node, returning its local index. Adding an existing ID is a no-op.
    pub fn add_node(&mut self, id: impl Into<String>) -> TypedNodeIndex {
        let id = id.into();
        if let Some(&idx) = self.id_to_idx.get(&id) {
            return idx;
        }
        let idx = self.ids.len();
        self.id_to_idx.insert(id.clone(), idx);
        self.ids.push(id);
        self.features.push(Vec::new());
        self.labels.push(None);
        idx
    }

    /// Get a node's index by ID.
    pub fn get_index(&self, id: &str) -> Option<TypedNodeIndex> {
        self.id_to_idx.get(id).copied()
    }

    /// Get a node's ID by index.
    pub fn get_id(&self, idx: TypedNodeIndex) -> Option<&str> {
        self.ids.get(idx).map(String::as_str)
    }

    /// Check if a node exists.
    pub fn contains(&self, id: &str) -> bool {
        self.id_to_idx.contains_key(id)
    }

    /// Attach a feature vector to a node.
    ///
    /// The first attached vector fixes the store's feature dimension.
    pub fn set_features(
        &mut self,
        node_type: &NodeType,
        idx: TypedNodeIndex,
        features: Vec<f32>,
    ) -> Result<()> {
        if self.feature_dim == 0 {
            self.feature_dim = features.len();
        } else if features.len() != self.feature_dim {
            return Err(Error::FeatureDim {
                node_type: node_type.clone(),
                expected: self.feature_dim,
                got: features.len(),
            });
        }
        self.features[idx] = features;
        Ok(())
    }

    /// Feature vector of a node (empty until attached).
    pub fn features(&self, idx: TypedNodeIndex) -> &[f32] {
        &self.features[idx]
    }

    /// All feature vectors, parallel to [`NodeStore::ids`].
    pub fn feature_rows(&self) -> &[Vec<f32>] {
        &self.features
    }

    /// Set a node's fraud label.
    pub fn set_label(&mut self, idx: TypedNodeIndex, is_fraud: bool) {
        self.labels[idx] = Some(is_fraud);
    }

    /// A node's label, if any.
    pub fn label(&self, idx: TypedNodeIndex) -> Option<bool> {
        self.labels.get(idx).copied().flatten()
    }

    /// Indices of labeled nodes, in index order.
    pub fn labeled_indices(&self) -> Vec<TypedNodeIndex> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.map(|_| i))
            .collect()
    }

    /// Number of labeled nodes.
    pub fn num_labeled(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }
}

/// Edge storage for a single edge type (COO format).
///
/// Stores edges as (source_idx, target_idx) pairs; indices are local to the
/// respective node type's store. Each edge may carry an attribute vector of
/// uniform dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeStore {
    /// Source node indices (local to src_type).
    pub src: Vec<TypedNodeIndex>,
    /// Target node indices (local to dst_type).
    pub dst: Vec<TypedNodeIndex>,
    attrs: Vec<Vec<f32>>,
    attr_dim: usize,
}

impl EdgeStore {
    /// Create an empty edge store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.src.len()
    }

    /// Edge attribute dimension (0 until the first attribute is attached).
    pub fn attr_dim(&self) -> usize {
        self.attr_dim
    }

    /// Add an edge without attributes.
    pub fn add_edge(&mut self, src: TypedNodeIndex, dst: TypedNodeIndex) {
        self.src.push(src);
        self.dst.push(dst);
        self.attrs.push(Vec::new());
    }

    /// Add an edge with an attribute vector.
    pub fn add_edge_with_attr(
        &mut self,
        edge_type: &EdgeType,
        src: TypedNodeIndex,
        dst: TypedNodeIndex,
        attr: Vec<f32>,
    ) -> Result<()> {
        if self.attr_dim == 0 {
            self.attr_dim = attr.len();
        } else if attr.len() != self.attr_dim {
            return Err(Error::AttrDim {
                edge_type: edge_type.clone(),
                expected: self.attr_dim,
                got: attr.len(),
            });
        }
        self.src.push(src);
        self.dst.push(dst);
        self.attrs.push(attr);
        Ok(())
    }

    /// Attribute vector of an edge (empty if none attached).
    pub fn attr(&self, edge: usize) -> &[f32] {
        &self.attrs[edge]
    }

    /// Iterate over (src, dst) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (TypedNodeIndex, TypedNodeIndex)> + '_ {
        self.src.iter().copied().zip(self.dst.iter().copied())
    }
}

/// A heterogeneous graph with typed nodes and edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeteroGraph {
    node_stores: HashMap<NodeType, NodeStore>,
    edge_stores: HashMap<EdgeType, EdgeStore>,
}

impl HeteroGraph {
    /// Create an empty heterogeneous graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of node types.
    pub fn num_node_types(&self) -> usize {
        self.node_stores.len()
    }

    /// Number of edge types.
    pub fn num_edge_types(&self) -> usize {
        self.edge_stores.len()
    }

    /// All node types.
    pub fn node_types(&self) -> impl Iterator<Item = &NodeType> {
        self.node_stores.keys()
    }

    /// All edge types.
    pub fn edge_types(&self) -> impl Iterator<Item = &EdgeType> {
        self.edge_stores.keys()
    }

    /// Add a node of the given type, returning its local index.
    pub fn add_node(&mut self, node_type: NodeType, id: impl Into<String>) -> TypedNodeIndex {
        self.node_stores
            .entry(node_type)
            .or_insert_with(NodeStore::new)
            .add_node(id)
    }

    /// Add an edge of the given type, creating endpoints as needed.
    pub fn add_edge(&mut self, edge_type: &EdgeType, src_id: &str, dst_id: &str) {
        let src_idx = self.add_node(edge_type.src_type.clone(), src_id);
        let dst_idx = self.add_node(edge_type.dst_type.clone(), dst_id);
        self.edge_stores
            .entry(edge_type.clone())
            .or_insert_with(EdgeStore::new)
            .add_edge(src_idx, dst_idx);
    }

    /// Add an edge with an attribute vector, creating endpoints as needed.
    pub fn add_edge_with_attr(
        &mut self,
        edge_type: &EdgeType,
        src_id: &str,
        dst_id: &str,
        attr: Vec<f32>,
    ) -> Result<()> {
        let src_idx = self.add_node(edge_type.src_type.clone(), src_id);
        let dst_idx = self.add_node(edge_type.dst_type.clone(), dst_id);
        self.edge_stores
            .entry(edge_type.clone())
            .or_insert_with(EdgeStore::new)
            .add_edge_with_attr(edge_type, src_idx, dst_idx, attr)
    }

    /// Get node store for a type.
    pub fn node_store(&self, node_type: &NodeType) -> Option<&NodeStore> {
        self.node_stores.get(node_type)
    }

    /// Get mutable node store for a type.
    pub fn node_store_mut(&mut self, node_type: &NodeType) -> Option<&mut NodeStore> {
        self.node_stores.get_mut(node_type)
    }

    /// Get edge store for a type.
    pub fn edge_store(&self, edge_type: &EdgeType) -> Option<&EdgeStore> {
        self.edge_stores.get(edge_type)
    }

    /// Number of nodes of a given type.
    pub fn num_nodes(&self, node_type: &NodeType) -> usize {
        self.node_stores
            .get(node_type)
            .map_or(0, NodeStore::num_nodes)
    }

    /// Number of edges of a given type.
    pub fn num_edges(&self, edge_type: &EdgeType) -> usize {
        self.edge_stores
            .get(edge_type)
            .map_or(0, EdgeStore::num_edges)
    }

    /// Total number of nodes across all types.
    pub fn total_nodes(&self) -> usize {
        self.node_stores.values().map(NodeStore::num_nodes).sum()
    }

    /// Total number of edges across all types.
    pub fn total_edges(&self) -> usize {
        self.edge_stores.values().map(EdgeStore::num_edges).sum()
    }

    /// Get node index by type and ID.
    pub fn get_node_index(&self, node_type: &NodeType, id: &str) -> Option<TypedNodeIndex> {
        self.node_stores.get(node_type)?.get_index(id)
    }

    /// Get node ID by type and index.
    pub fn get_node_id(&self, node_type: &NodeType, idx: TypedNodeIndex) -> Option<&str> {
        self.node_stores.get(node_type)?.get_id(idx)
    }

    /// Outgoing neighbors of a node via a specific edge type.
    pub fn neighbors(&self, edge_type: &EdgeType, src_idx: TypedNodeIndex) -> Vec<TypedNodeIndex> {
        self.edge_stores.get(edge_type).map_or_else(Vec::new, |s| {
            s.iter()
                .filter_map(|(src, dst)| (src == src_idx).then_some(dst))
                .collect()
        })
    }

    /// Incoming neighbors of a node via a specific edge type.
    pub fn incoming_neighbors(
        &self,
        edge_type: &EdgeType,
        dst_idx: TypedNodeIndex,
    ) -> Vec<TypedNodeIndex> {
        self.edge_stores.get(edge_type).map_or_else(Vec::new, |s| {
            s.iter()
                .filter_map(|(src, dst)| (dst == dst_idx).then_some(src))
                .collect()
        })
    }

    /// Check graph invariants.
    ///
    /// Every edge endpoint must reference a valid index in the corresponding
    /// node store, and every non-empty feature vector must match its store's
    /// dimension.
    pub fn validate(&self) -> Result<()> {
        for (edge_type, store) in &self.edge_stores {
            let num_src = self.num_nodes(&edge_type.src_type);
            let num_dst = self.num_nodes(&edge_type.dst_type);
            for (src, dst) in store.iter() {
                if src >= num_src {
                    return Err(Error::DanglingEdge {
                        edge_type: edge_type.clone(),
                        side: "src",
                        index: src,
                        num_nodes: num_src,
                    });
                }
                if dst >= num_dst {
                    return Err(Error::DanglingEdge {
                        edge_type: edge_type.clone(),
                        side: "dst",
                        index: dst,
                        num_nodes: num_dst,
                    });
                }
            }
        }
        for (node_type, store) in &self.node_stores {
            let dim = store.feature_dim();
            for row in store.feature_rows() {
                if !row.is_empty() && row.len() != dim {
                    return Err(Error::FeatureDim {
                        node_type: node_type.clone(),
                        expected: dim,
                        got: row.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Summary statistics.
    pub fn stats(&self) -> HeteroGraphStats {
        HeteroGraphStats {
            num_node_types: self.num_node_types(),
            num_edge_types: self.num_edge_types(),
            total_nodes: self.total_nodes(),
            total_edges: self.total_edges(),
            nodes_by_type: self
                .node_stores
                .iter()
                .map(|(t, s)| (t.0.clone(), s.num_nodes()))
                .collect(),
            edges_by_type: self
                .edge_stores
                .iter()
                .map(|(t, s)| (t.to_string(), s.num_edges()))
                .collect(),
            labeled_by_type: self
                .node_stores
                .iter()
                .filter(|(_, s)| s.num_labeled() > 0)
                .map(|(t, s)| (t.0.clone(), s.num_labeled()))
                .collect(),
        }
    }
}

/// Statistics for a heterogeneous graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeteroGraphStats {
    /// Number of node types.
    pub num_node_types: usize,
    /// Number of edge types.
    pub num_edge_types: usize,
    /// Total nodes.
    pub total_nodes: usize,
    /// Total edges.
    pub total_edges: usize,
    /// Nodes per type.
    pub nodes_by_type: HashMap<String, usize>,
    /// Edges per type.
    pub edges_by_type: HashMap<String, usize>,
    /// Labeled nodes per type (types with labels only).
    pub labeled_by_type: HashMap<String, usize>,
}
