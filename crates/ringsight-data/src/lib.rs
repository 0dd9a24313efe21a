#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]

//! Data loading and graph construction for fraud-ring detection.
//!
//! The pipeline runs in three stages:
//!
//! 1. [`loaders`] - read CSV tables into typed records
//! 2. [`preprocess`] - clean the tables and engineer per-entity features
//! 3. [`graph_builder`] - assemble a validated [`ringsight_core::HeteroGraph`]
//!
//! # Example
//!
//! ```rust,ignore
//! use ringsight_data::{graph_builder, loaders, preprocess};
//!
//! let raw = loaders::load_all(&data_dir)?;
//! let (tables, report) = preprocess::clean_tables(raw.tables);
//! let features = preprocess::engineer_features(&tables);
//! let graph = graph_builder::build_heterogeneous_graph(
//!     &tables, &features, raw.labels.as_deref())?;
//! ```

mod error;
pub mod graph_builder;
pub mod loaders;
pub mod preprocess;
mod records;

pub use error::{Error, Result};
pub use records::{
    AccountRecord, DeviceRecord, LabelRecord, MerchantRecord, TransactionRecord,
};
