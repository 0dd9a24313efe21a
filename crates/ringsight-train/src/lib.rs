#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]

//! Training, evaluation and inference for ringsight.
//!
//! - [`training`] - full-graph training loops for node classification
//!   (softmax cross-entropy) and link prediction (BCE with negative
//!   sampling), with early stopping and best-epoch checkpointing
//! - [`evaluation`] - classification metrics (accuracy/precision/recall/F1,
//!   AUC-ROC, AUC-PR) and ring-level detection metrics
//! - [`checkpoint`] - JSON model snapshots
//! - [`scorer`] - load a checkpoint, score entities, extract fraud rings
//! - [`pipeline`] - CSV tables to a trained, evaluated model in one call
//!
//! # Example
//!
//! ```rust,ignore
//! use ringsight_train::{pipeline, TaskKind};
//!
//! let config = pipeline::PipelineConfig::default();
//! let report = pipeline::train_eval_pipeline(
//!     "data/", TaskKind::NodeClassification, &config)?;
//! println!("{}", report.test_metrics.summary());
//! ```

pub mod checkpoint;
mod error;
pub mod evaluation;
pub mod pipeline;
pub mod scorer;
pub mod training;

pub use checkpoint::Checkpoint;
pub use error::{Error, Result};
pub use evaluation::{
    evaluate_link_prediction, evaluate_node_classification, ground_truth_rings, ring_metrics,
    ClassificationMetrics, RingMetrics,
};
pub use pipeline::{
    build_graph_pipeline, train_eval_on_graph, train_eval_pipeline, PipelineConfig,
    PipelineReport,
};
pub use scorer::{EntityScore, Scorer};
pub use training::{
    train_link_prediction, train_node_classification, EpochStats, TaskKind, TrainConfig,
    TrainReport,
};
