#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]

//! Heterogeneous graph neural network for fraud detection.
//!
//! Message passing follows the standard three-step paradigm:
//!
//! 1. **Message**: project neighbor features through a per-relation linear map
//! 2. **Aggregate**: combine messages with kind-specific coefficients
//!    ([`ConvKind::Gcn`], [`ConvKind::Sage`], [`ConvKind::Gat`])
//! 3. **Update**: add a per-type self transform, apply the activation
//!
//! ```text
//! h_t^{(l+1)} = act( W_self,t h_t^{(l)} + mean_r AGG_r({W_r h_j : j in N_r}) )
//! ```
//!
//! All layers carry explicit backward passes; training happens with
//! full-graph gradient descent through [`optim::Adam`]. See
//! [`model::HeteroGnn`] for the composition and the calling convention.

mod conv;
mod dense;
mod encoders;
mod error;
mod heads;
pub mod loss;
pub mod model;
pub mod optim;

pub use conv::{ConvKind, RelConv};
pub use dense::Dense;
pub use encoders::TypeEncoder;
pub use error::{Error, Result};
pub use heads::{LinkPredictorHead, NodeClassifierHead};
pub use model::{Embeddings, GraphSchema, HeteroGnn, ModelConfig, ParamTensor, StateDict};
pub use optim::Adam;
