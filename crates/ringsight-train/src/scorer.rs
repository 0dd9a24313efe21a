//! Inference: score entities from a trained model and extract fraud rings.
//!
//! A [`Scorer`] runs one full-graph forward pass at construction and caches
//! embeddings and fraud probabilities for every node, so individual lookups
//! are cheap and batch scoring parallelizes over ids.

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::info;

use ringsight_core::algo::{connected_clusters, TypedNode};
use ringsight_core::{FraudRing, HeteroGraph, NodeType, RingMember};
use ringsight_nn::loss::sigmoid;
use ringsight_nn::{Embeddings, HeteroGnn};

use crate::checkpoint::Checkpoint;
use crate::error::{Error, Result};

/// Scoring result for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityScore {
    /// Entity identifier.
    pub entity_id: String,
    /// Node type of the entity.
    pub node_type: NodeType,
    /// Probability the entity is fraudulent.
    pub fraud_probability: f32,
    /// Probability rescaled to 0-100.
    pub risk_score: f32,
    /// Whether the probability clears the scorer's threshold.
    pub flagged: bool,
}

/// A loaded model plus cached full-graph scores.
pub struct Scorer {
    graph: HeteroGraph,
    embeddings: Embeddings,
    probabilities: BTreeMap<NodeType, Vec<f32>>,
    threshold: f32,
}

impl Scorer {
    /// Score the whole graph with a model.
    pub fn new(mut model: HeteroGnn, graph: HeteroGraph, threshold: f32) -> Result<Self> {
        let embeddings = model.forward(&graph)?;

        let mut probabilities = BTreeMap::new();
        for (node_type, emb) in &embeddings {
            let logits = model.node_head_mut().forward(emb);
            let probs: Vec<f32> = logits
                .outer_iter()
                .map(|row| sigmoid(row[1] - row[0]))
                .collect();
            probabilities.insert(node_type.clone(), probs);
        }

        info!(
            nodes = graph.total_nodes(),
            threshold, "scored graph"
        );

        Ok(Self {
            graph,
            embeddings,
            probabilities,
            threshold,
        })
    }

    /// Load a checkpoint and score the graph with it.
    pub fn from_checkpoint(
        path: impl AsRef<Path>,
        graph: HeteroGraph,
        threshold: f32,
    ) -> Result<Self> {
        let checkpoint = Checkpoint::load(path)?;
        let model = checkpoint.build_model()?;
        Self::new(model, graph, threshold)
    }

    /// The scored graph.
    pub fn graph(&self) -> &HeteroGraph {
        &self.graph
    }

    /// Cached fraud probabilities for a node type, index-aligned with the
    /// type's store.
    pub fn probabilities(&self, node_type: &NodeType) -> Option<&[f32]> {
        self.probabilities.get(node_type).map(Vec::as_slice)
    }

    fn lookup(&self, node_type: &NodeType, id: &str) -> Result<usize> {
        self.graph
            .get_node_index(node_type, id)
            .ok_or_else(|| Error::UnknownEntity {
                node_type: node_type.clone(),
                id: id.to_string(),
            })
    }

    /// Score a single entity.
    pub fn score_entity(&self, node_type: &NodeType, id: &str) -> Result<EntityScore> {
        let idx = self.lookup(node_type, id)?;
        let probability = self.probabilities[node_type][idx];
        Ok(EntityScore {
            entity_id: id.to_string(),
            node_type: node_type.clone(),
            fraud_probability: probability,
            risk_score: probability * 100.0,
            flagged: probability >= self.threshold,
        })
    }

    /// Score many entities of one type in parallel.
    pub fn score_batch(&self, node_type: &NodeType, ids: &[String]) -> Result<Vec<EntityScore>> {
        ids.par_iter()
            .map(|id| self.score_entity(node_type, id))
            .collect()
    }

    /// Embeddings for a list of entities, one row per id.
    pub fn embeddings(&self, node_type: &NodeType, ids: &[String]) -> Result<Array2<f32>> {
        let emb = self
            .embeddings
            .get(node_type)
            .ok_or_else(|| Error::UnknownEntity {
                node_type: node_type.clone(),
                id: String::from("<any>"),
            })?;

        let mut out = Array2::zeros((ids.len(), emb.ncols()));
        for (row, id) in ids.iter().enumerate() {
            let idx = self.lookup(node_type, id)?;
            out.row_mut(row).assign(&emb.row(idx));
        }
        Ok(out)
    }

    /// High-risk nodes at a probability threshold.
    pub fn high_risk_nodes(&self, threshold: f32) -> HashSet<TypedNode> {
        let mut selected = HashSet::new();
        for (node_type, probs) in &self.probabilities {
            for (idx, &p) in probs.iter().enumerate() {
                if p >= threshold {
                    selected.insert((node_type.clone(), idx));
                }
            }
        }
        selected
    }

    /// Cluster high-risk nodes into candidate fraud rings.
    ///
    /// Rings are connected components of nodes scoring at or above
    /// `threshold`, keeping components with at least `min_size` members.
    /// Ordered by risk score, descending.
    pub fn predict_rings(&self, threshold: f32, min_size: usize) -> Vec<FraudRing> {
        let selected = self.high_risk_nodes(threshold);
        let clusters = connected_clusters(&self.graph, &selected);

        let mut rings: Vec<FraudRing> = clusters
            .into_iter()
            .filter(|c| c.len() >= min_size.max(1))
            .map(|cluster| {
                let probs: Vec<f32> = cluster
                    .iter()
                    .map(|(t, i)| self.probabilities[t][*i])
                    .collect();
                let risk_score = probs.iter().sum::<f32>() / probs.len() as f32;
                let confidence = probs.iter().copied().fold(f32::INFINITY, f32::min);

                let members = cluster
                    .into_iter()
                    .map(|(node_type, index)| RingMember {
                        entity_id: self
                            .graph
                            .get_node_id(&node_type, index)
                            .unwrap_or_default()
                            .to_string(),
                        node_type,
                        index,
                    })
                    .collect();

                FraudRing {
                    ring_id: 0,
                    members,
                    risk_score,
                    confidence,
                }
            })
            .collect();

        rings.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        for (i, ring) in rings.iter_mut().enumerate() {
            ring.ring_id = i;
        }

        info!(rings = rings.len(), threshold, min_size, "predicted fraud rings");
        rings
    }
}
