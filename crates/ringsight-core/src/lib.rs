#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]

//! Core types for heterogeneous entity graphs.
//!
//! This crate provides the foundational types for fraud-ring detection over
//! multi-entity transaction data:
//!
//! - [`EntityId`] / [`EntityKind`] - identifiers for accounts, devices, IPs,
//!   transactions and merchants
//! - [`HeteroGraph`] - a heterogeneous graph with typed node/edge stores,
//!   per-node feature vectors and per-edge attributes
//! - [`SplitMasks`] / [`EdgeSplit`] - seeded train/validation/test splits
//! - [`algo::components`] - connected-component clustering over a collapsed
//!   projection, used for fraud-ring extraction
//! - [`FraudRing`] - a predicted cluster of colluding entities
//!
//! # Example
//!
//! ```rust
//! use ringsight_core::{EdgeType, HeteroGraph, NodeType};
//!
//! let mut graph = HeteroGraph::new();
//! let uses = EdgeType::new("account", "uses", "device");
//!
//! graph.add_edge(&uses, "acct_1", "dev_1");
//! graph.add_edge(&uses, "acct_2", "dev_1");
//!
//! assert_eq!(graph.num_nodes(&NodeType::new("account")), 2);
//! assert_eq!(graph.num_edges(&uses), 2);
//! assert!(graph.validate().is_ok());
//! ```

pub mod algo;
mod entity;
mod error;
mod hetero;
mod ring;
mod split;

pub use entity::{EntityId, EntityKind};
pub use error::{Error, Result};
pub use hetero::{EdgeStore, EdgeType, HeteroGraph, HeteroGraphStats, NodeStore, NodeType};
pub use ring::{FraudRing, RingMember};
pub use split::{EdgeIndexSplit, EdgeSplit, NodeSplit, SplitMasks, SplitRatios};

// Re-export petgraph for downstream graph analysis.
pub use petgraph;
