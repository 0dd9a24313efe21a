use thiserror::Error;

use ringsight_core::NodeType;

/// Errors that can occur in ringsight-train.
#[derive(Error, Debug)]
pub enum Error {
    /// Core graph error.
    #[error("graph error: {0}")]
    Core(#[from] ringsight_core::Error),
    /// Model error.
    #[error("model error: {0}")]
    Nn(#[from] ringsight_nn::Error),
    /// Data loading error.
    #[error("data error: {0}")]
    Data(#[from] ringsight_data::Error),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Checkpoint (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The split contains no labeled training nodes.
    #[error("no labeled nodes available for training")]
    NoLabels,
    /// The split contains no supervision edges.
    #[error("no supervision edges available for training")]
    NoEdges,
    /// An entity was not found in the graph.
    #[error("unknown entity: {node_type}/{id}")]
    UnknownEntity {
        /// Node type searched.
        node_type: NodeType,
        /// Missing identifier.
        id: String,
    },
}

/// Result type alias for ringsight-train.
pub type Result<T> = std::result::Result<T, Error>;
