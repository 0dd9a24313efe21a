//! Seeded train/validation/test splits over nodes and edges.
//!
//! Node splits cover *labeled* nodes only (unlabeled nodes never contribute
//! to a supervised loss). Edge splits partition supervision edges per
//! relation; the full graph remains the message-passing structure, so a
//! held-out edge is unseen by the loss but still propagates features.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::hetero::{EdgeType, HeteroGraph, NodeType, TypedNodeIndex};

/// Fractions assigned to train/validation/test.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitRatios {
    /// Training fraction.
    pub train: f64,
    /// Validation fraction.
    pub val: f64,
    /// Test fraction.
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            val: 0.15,
            test: 0.15,
        }
    }
}

impl SplitRatios {
    /// Create ratios, checking they are non-negative and sum to 1.
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self> {
        let ratios = Self { train, val, test };
        ratios.check()?;
        Ok(ratios)
    }

    fn check(&self) -> Result<()> {
        let sum = self.train + self.val + self.test;
        if self.train < 0.0 || self.val < 0.0 || self.test < 0.0 || (sum - 1.0).abs() > 1e-6 {
            return Err(Error::InvalidSplit {
                train: self.train,
                val: self.val,
                test: self.test,
            });
        }
        Ok(())
    }

    /// Cut a shuffled sequence of length `n` into (train, val, test) counts.
    ///
    /// Rounds train and val down; the remainder goes to test.
    fn cut(&self, n: usize) -> (usize, usize) {
        let n_train = (n as f64 * self.train).floor() as usize;
        let n_val = (n as f64 * self.val).floor() as usize;
        (n_train, n_val)
    }
}

/// Index split for one node type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSplit {
    /// Training node indices.
    pub train: Vec<TypedNodeIndex>,
    /// Validation node indices.
    pub val: Vec<TypedNodeIndex>,
    /// Test node indices.
    pub test: Vec<TypedNodeIndex>,
}

/// Per-node-type train/validation/test masks over labeled nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitMasks {
    /// Splits keyed by node type.
    pub per_type: BTreeMap<NodeType, NodeSplit>,
}

impl SplitMasks {
    /// Split the labeled nodes of every labeled node type.
    ///
    /// Deterministic for a given `(graph, ratios, seed)`.
    pub fn split_labeled_nodes(
        graph: &HeteroGraph,
        ratios: SplitRatios,
        seed: u64,
    ) -> Result<Self> {
        ratios.check()?;
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let mut per_type = BTreeMap::new();

        let mut types: Vec<NodeType> = graph.node_types().cloned().collect();
        types.sort();

        for node_type in types {
            let store = graph
                .node_store(&node_type)
                .ok_or_else(|| Error::UnknownNodeType(node_type.clone()))?;
            let mut labeled = store.labeled_indices();
            if labeled.is_empty() {
                continue;
            }
            labeled.shuffle(&mut rng);
            let (n_train, n_val) = ratios.cut(labeled.len());
            let split = NodeSplit {
                train: labeled[..n_train].to_vec(),
                val: labeled[n_train..n_train + n_val].to_vec(),
                test: labeled[n_train + n_val..].to_vec(),
            };
            per_type.insert(node_type, split);
        }

        Ok(Self { per_type })
    }

    /// Total training nodes across types.
    pub fn num_train(&self) -> usize {
        self.per_type.values().map(|s| s.train.len()).sum()
    }

    /// Total validation nodes across types.
    pub fn num_val(&self) -> usize {
        self.per_type.values().map(|s| s.val.len()).sum()
    }

    /// Total test nodes across types.
    pub fn num_test(&self) -> usize {
        self.per_type.values().map(|s| s.test.len()).sum()
    }
}

/// Edge-index split for one relation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeIndexSplit {
    /// Training edge indices.
    pub train: Vec<usize>,
    /// Validation edge indices.
    pub val: Vec<usize>,
    /// Test edge indices.
    pub test: Vec<usize>,
}

/// Per-relation supervision-edge splits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeSplit {
    /// Splits keyed by edge type.
    pub per_relation: BTreeMap<EdgeType, EdgeIndexSplit>,
}

impl EdgeSplit {
    /// Split the edges of every forward (non-reverse) relation.
    ///
    /// Reverse relations mirror forward ones and would leak supervision
    /// pairs across splits, so they are excluded.
    pub fn split_edges(graph: &HeteroGraph, ratios: SplitRatios, seed: u64) -> Result<Self> {
        ratios.check()?;
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let mut per_relation = BTreeMap::new();

        let mut relations: Vec<EdgeType> = graph
            .edge_types()
            .filter(|e| !e.is_reverse())
            .cloned()
            .collect();
        relations.sort();

        for edge_type in relations {
            let num_edges = graph.num_edges(&edge_type);
            if num_edges == 0 {
                continue;
            }
            let mut indices: Vec<usize> = (0..num_edges).collect();
            indices.shuffle(&mut rng);
            let (n_train, n_val) = ratios.cut(indices.len());
            let split = EdgeIndexSplit {
                train: indices[..n_train].to_vec(),
                val: indices[n_train..n_train + n_val].to_vec(),
                test: indices[n_train + n_val..].to_vec(),
            };
            per_relation.insert(edge_type, split);
        }

        Ok(Self { per_relation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled_graph(num_labeled: usize) -> HeteroGraph {
        let mut graph = HeteroGraph::new();
        let account = NodeType::new("account");
        for i in 0..num_labeled + 3 {
            let idx = graph.add_node(account.clone(), format!("a{i}"));
            if i < num_labeled {
                graph
                    .node_store_mut(&account)
                    .unwrap()
                    .set_label(idx, i % 2 == 0);
            }
        }
        graph
    }

    #[test]
    fn test_ratios_validation() {
        assert!(SplitRatios::new(0.7, 0.15, 0.15).is_ok());
        assert!(SplitRatios::new(0.9, 0.2, 0.1).is_err());
        assert!(SplitRatios::new(-0.1, 0.6, 0.5).is_err());
    }

    #[test]
    fn test_node_split_partitions_labeled_nodes() {
        let graph = labeled_graph(20);
        let masks =
            SplitMasks::split_labeled_nodes(&graph, SplitRatios::default(), 7).unwrap();

        let split = &masks.per_type[&NodeType::new("account")];
        let total = split.train.len() + split.val.len() + split.test.len();
        assert_eq!(total, 20);

        // No overlap between partitions.
        let mut all: Vec<usize> = split
            .train
            .iter()
            .chain(&split.val)
            .chain(&split.test)
            .copied()
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 20);

        // Unlabeled nodes excluded.
        assert!(all.iter().all(|&i| i < 20));
    }

    #[test]
    fn test_node_split_deterministic() {
        let graph = labeled_graph(16);
        let a = SplitMasks::split_labeled_nodes(&graph, SplitRatios::default(), 42).unwrap();
        let b = SplitMasks::split_labeled_nodes(&graph, SplitRatios::default(), 42).unwrap();
        let c = SplitMasks::split_labeled_nodes(&graph, SplitRatios::default(), 43).unwrap();

        let account = NodeType::new("account");
        assert_eq!(a.per_type[&account].train, b.per_type[&account].train);
        assert_ne!(a.per_type[&account].train, c.per_type[&account].train);
    }

    #[test]
    fn test_edge_split_skips_reverse_relations() {
        let mut graph = HeteroGraph::new();
        let uses = EdgeType::new("account", "uses", "device");
        for i in 0..10 {
            graph.add_edge(&uses, &format!("a{i}"), "d0");
            let rev = uses.reverse();
            graph.add_edge(&rev, "d0", &format!("a{i}"));
        }

        let split = EdgeSplit::split_edges(&graph, SplitRatios::default(), 1).unwrap();
        assert_eq!(split.per_relation.len(), 1);
        let s = &split.per_relation[&uses];
        assert_eq!(s.train.len() + s.val.len() + s.test.len(), 10);
    }
}
