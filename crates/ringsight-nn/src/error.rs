use thiserror::Error;

use ringsight_core::NodeType;

/// Errors that can occur in ringsight-nn.
#[derive(Error, Debug)]
pub enum Error {
    /// A node type carries no feature vectors.
    #[error("node type {0} has no features attached")]
    MissingFeatures(NodeType),
    /// The graph does not contain a node type the model was built for.
    #[error("graph is missing node type {0}")]
    MissingNodeType(NodeType),
    /// Input dimension does not match the model's schema.
    #[error("dimension mismatch for {what}: expected {expected}, got {got}")]
    DimMismatch {
        /// What was being checked.
        what: String,
        /// Expected dimension.
        expected: usize,
        /// Observed dimension.
        got: usize,
    },
    /// A parameter is missing from a state dict.
    #[error("missing parameter: {0}")]
    MissingParam(String),
    /// A state-dict parameter has the wrong shape.
    #[error("parameter {name} has shape {got:?}, expected {expected:?}")]
    ParamShape {
        /// Parameter name.
        name: String,
        /// Expected shape.
        expected: Vec<usize>,
        /// Shape found in the state dict.
        got: Vec<usize>,
    },
}

/// Result type alias for ringsight-nn.
pub type Result<T> = std::result::Result<T, Error>;
