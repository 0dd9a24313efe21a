//! Graph algorithms over heterogeneous graphs.

pub mod components;

pub use components::{connected_clusters, cluster_stats, ClusterStats, TypedNode};
