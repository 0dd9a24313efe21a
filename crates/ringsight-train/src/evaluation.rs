//! Evaluation metrics.
//!
//! Classification metrics (accuracy, precision, recall, F1, AUC-ROC, AUC-PR)
//! serve both tasks: node classification scores labeled nodes, link
//! prediction scores positive and sampled negative edges.
//!
//! Ring-level metrics compare predicted fraud rings against ground-truth
//! rings - the connected components of fraud-labeled nodes over collapsed
//! edges - by greedy best-Jaccard matching.

use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use ringsight_core::algo::{connected_clusters, TypedNode};
use ringsight_core::{EdgeSplit, HeteroGraph, SplitMasks};
use ringsight_nn::HeteroGnn;

use crate::error::Result;
use crate::training;

/// Binary classification metrics at a fixed threshold, plus threshold-free
/// AUCs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    /// Fraction of correct predictions.
    pub accuracy: f64,
    /// TP / (TP + FP); 0 when nothing is predicted positive.
    pub precision: f64,
    /// TP / (TP + FN); 0 when there are no positives.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Area under the ROC curve (tie-averaged rank statistic).
    /// 0.5 when only one class is present.
    pub auc_roc: f64,
    /// Area under the precision-recall curve (step integration).
    /// Equals the positive prevalence in degenerate cases.
    pub auc_pr: f64,
    /// Number of scored examples.
    pub support: usize,
}

impl ClassificationMetrics {
    /// Compute metrics from scores and binary labels.
    pub fn from_scores(scores: &[f32], labels: &[bool], threshold: f32) -> Self {
        debug_assert_eq!(scores.len(), labels.len());
        if scores.is_empty() {
            return Self::default();
        }

        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut tn = 0usize;
        let mut fnn = 0usize;
        for (&s, &y) in scores.iter().zip(labels) {
            match (s >= threshold, y) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, false) => tn += 1,
                (false, true) => fnn += 1,
            }
        }

        let n = scores.len() as f64;
        let accuracy = (tp + tn) as f64 / n;
        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fnn > 0 {
            tp as f64 / (tp + fnn) as f64
        } else {
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            accuracy,
            precision,
            recall,
            f1,
            auc_roc: auc_roc(scores, labels),
            auc_pr: auc_pr(scores, labels),
            support: scores.len(),
        }
    }

    /// Format as a summary string.
    pub fn summary(&self) -> String {
        format!(
            "acc: {:.3} | P: {:.3} | R: {:.3} | F1: {:.3} | AUC-ROC: {:.3} | AUC-PR: {:.3} (n={})",
            self.accuracy,
            self.precision,
            self.recall,
            self.f1,
            self.auc_roc,
            self.auc_pr,
            self.support
        )
    }
}

/// AUC-ROC via the Mann-Whitney rank statistic with tie averaging.
///
/// Returns 0.5 when only one class is present.
pub fn auc_roc(scores: &[f32], labels: &[bool]) -> f64 {
    let n_pos = labels.iter().filter(|&&y| y).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    // Sort ascending by score; assign average ranks to ties.
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0f64;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; tied entries share the average rank.
        let avg_rank = (i + 1 + j + 1) as f64 / 2.0;
        for &idx in &order[i..=j] {
            if labels[idx] {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let u = rank_sum_pos - (n_pos * (n_pos + 1)) as f64 / 2.0;
    u / (n_pos as f64 * n_neg as f64)
}

/// AUC-PR via step integration of the precision-recall curve.
///
/// No positives yields 0.0; no negatives yields 1.0 (the prevalence in both
/// cases).
pub fn auc_pr(scores: &[f32], labels: &[bool]) -> f64 {
    let n_pos = labels.iter().filter(|&&y| y).count();
    if n_pos == 0 {
        return 0.0;
    }
    if n_pos == labels.len() {
        return 1.0;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut auc = 0.0f64;
    let mut tp = 0usize;
    let mut seen = 0usize;
    let mut prev_recall = 0.0f64;

    let mut i = 0;
    while i < order.len() {
        // Process tied scores as one threshold step.
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        for &idx in &order[i..=j] {
            if labels[idx] {
                tp += 1;
            }
            seen += 1;
        }
        let recall = tp as f64 / n_pos as f64;
        let precision = tp as f64 / seen as f64;
        auc += (recall - prev_recall) * precision;
        prev_recall = recall;
        i = j + 1;
    }
    auc
}

/// Ring-level detection metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RingMetrics {
    /// Fraction of predicted rings matching a true ring (Jaccard >= 0.5).
    pub ring_precision: f64,
    /// Fraction of true rings matched by a predicted ring.
    pub ring_recall: f64,
    /// Harmonic mean of ring precision and recall.
    pub ring_f1: f64,
    /// Fraction of true rings overlapping any predicted ring in at least
    /// one member.
    pub ring_coverage: f64,
    /// Number of predicted rings.
    pub num_predicted: usize,
    /// Number of ground-truth rings.
    pub num_true: usize,
}

fn jaccard(a: &HashSet<TypedNode>, b: &HashSet<TypedNode>) -> f64 {
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// Ground-truth rings: connected components of fraud-labeled nodes with at
/// least two members. A lone fraudulent account is fraud, not a ring.
pub fn ground_truth_rings(graph: &HeteroGraph) -> Vec<HashSet<TypedNode>> {
    let mut fraud_nodes: HashSet<TypedNode> = HashSet::new();
    for node_type in graph.node_types() {
        if let Some(store) = graph.node_store(node_type) {
            for idx in store.labeled_indices() {
                if store.label(idx) == Some(true) {
                    fraud_nodes.insert((node_type.clone(), idx));
                }
            }
        }
    }

    connected_clusters(graph, &fraud_nodes)
        .into_iter()
        .filter(|c| c.len() >= 2)
        .map(|c| c.into_iter().collect())
        .collect()
}

/// Compare predicted member sets against ground-truth rings.
///
/// Greedy matching: predictions are taken in order, each claiming its
/// best-Jaccard unmatched true ring when the overlap reaches 0.5.
pub fn ring_metrics(
    predicted: &[HashSet<TypedNode>],
    truth: &[HashSet<TypedNode>],
) -> RingMetrics {
    let mut matched_true: Vec<bool> = vec![false; truth.len()];
    let mut matched_predictions = 0usize;

    for pred in predicted {
        let best = truth
            .iter()
            .enumerate()
            .filter(|(i, _)| !matched_true[*i])
            .map(|(i, t)| (i, jaccard(pred, t)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((i, score)) = best {
            if score >= 0.5 {
                matched_true[i] = true;
                matched_predictions += 1;
            }
        }
    }

    let covered = truth
        .iter()
        .filter(|t| predicted.iter().any(|p| !p.is_disjoint(t)))
        .count();

    let precision = if predicted.is_empty() {
        0.0
    } else {
        matched_predictions as f64 / predicted.len() as f64
    };
    let recall = if truth.is_empty() {
        0.0
    } else {
        matched_true.iter().filter(|&&m| m).count() as f64 / truth.len() as f64
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    let coverage = if truth.is_empty() {
        0.0
    } else {
        covered as f64 / truth.len() as f64
    };

    RingMetrics {
        ring_precision: precision,
        ring_recall: recall,
        ring_f1: f1,
        ring_coverage: coverage,
        num_predicted: predicted.len(),
        num_true: truth.len(),
    }
}

/// Classification metrics over the test nodes of a split.
///
/// Returns defaulted (all-zero) metrics when the split has no test nodes.
pub fn evaluate_node_classification(
    model: &mut HeteroGnn,
    graph: &HeteroGraph,
    masks: &SplitMasks,
    threshold: f32,
) -> Result<ClassificationMetrics> {
    let items = training::labeled_items(graph, masks, |s| &s.test);
    if items.is_empty() {
        return Ok(ClassificationMetrics::default());
    }
    let (scores, labels, _) = training::score_node_items(model, graph, &items)?;
    Ok(ClassificationMetrics::from_scores(&scores, &labels, threshold))
}

/// Link-prediction metrics over test positives plus sampled negatives.
pub fn evaluate_link_prediction(
    model: &mut HeteroGnn,
    graph: &HeteroGraph,
    split: &EdgeSplit,
    negative_samples: usize,
    seed: u64,
    threshold: f32,
) -> Result<ClassificationMetrics> {
    let positives = training::positive_items(graph, split, |s| &s.test);
    if positives.is_empty() {
        return Ok(ClassificationMetrics::default());
    }

    let (known, num_dst) = training::link_known_edges(graph, split);
    // Distinct stream from the training sampler.
    let mut rng = XorShiftRng::seed_from_u64(seed ^ 0x00e7_a15e);
    let negatives = training::sample_negative_edges(
        &positives,
        &known,
        &num_dst,
        negative_samples.max(1),
        &mut rng,
    );

    let items: Vec<training::LinkItem> =
        positives.into_iter().chain(negatives).collect();
    let emb = model.forward(graph)?;
    let (scores, labels, _) = training::link_scores(model, &emb, &items);
    Ok(ClassificationMetrics::from_scores(&scores, &labels, threshold))
}
