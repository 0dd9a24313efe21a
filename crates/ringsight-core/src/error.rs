use thiserror::Error;

use crate::hetero::{EdgeType, NodeType};

/// Errors that can occur in ringsight-core.
#[derive(Error, Debug)]
pub enum Error {
    /// An edge endpoint does not reference a valid node index.
    #[error("dangling edge endpoint in {edge_type}: {side} index {index} (store has {num_nodes} nodes)")]
    DanglingEdge {
        /// Edge type containing the bad endpoint.
        edge_type: EdgeType,
        /// Which endpoint ("src" or "dst").
        side: &'static str,
        /// The offending node index.
        index: usize,
        /// Size of the referenced node store.
        num_nodes: usize,
    },
    /// A feature vector does not match the store's feature dimension.
    #[error("feature dimension mismatch for {node_type}: expected {expected}, got {got}")]
    FeatureDim {
        /// Node type of the store.
        node_type: NodeType,
        /// Dimension established by the first attached vector.
        expected: usize,
        /// Dimension of the offending vector.
        got: usize,
    },
    /// An edge attribute vector does not match the store's attribute dimension.
    #[error("edge attribute dimension mismatch for {edge_type}: expected {expected}, got {got}")]
    AttrDim {
        /// Edge type of the store.
        edge_type: EdgeType,
        /// Dimension established by the first attached vector.
        expected: usize,
        /// Dimension of the offending vector.
        got: usize,
    },
    /// Referenced a node type the graph does not contain.
    #[error("unknown node type: {0}")]
    UnknownNodeType(NodeType),
    /// Referenced a node id the store does not contain.
    #[error("unknown node: {node_type}/{id}")]
    UnknownNode {
        /// Node type searched.
        node_type: NodeType,
        /// Missing identifier.
        id: String,
    },
    /// Split ratios are invalid (negative, or do not sum to 1).
    #[error("invalid split ratios: train={train}, val={val}, test={test}")]
    InvalidSplit {
        /// Training fraction.
        train: f64,
        /// Validation fraction.
        val: f64,
        /// Test fraction.
        test: f64,
    },
    /// Failed to parse an edge type from its string form.
    #[error("malformed edge type string: {0:?} (expected src:relation:dst)")]
    MalformedEdgeType(String),
}

/// Result type alias for ringsight-core.
pub type Result<T> = std::result::Result<T, Error>;
