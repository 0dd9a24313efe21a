//! Training loops for node classification and link prediction.
//!
//! Both loops run full-graph gradient descent: one forward pass per epoch,
//! supervision gathered from the split, gradients scattered back to the
//! embeddings and pushed through the model. Large supervision sets are
//! processed in chunks of `batch_size`, with chunk gradients rescaled so the
//! result equals the full-batch gradient.
//!
//! Checkpoint selection: node classification keeps the epoch with the lowest
//! validation loss; link prediction keeps the highest validation AUC-ROC.

use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

use ringsight_core::{EdgeSplit, HeteroGraph, NodeType, SplitMasks};
use ringsight_nn::loss::{bce_with_logits, sigmoid, softmax_cross_entropy};
use ringsight_nn::{Adam, Embeddings, HeteroGnn};

use crate::checkpoint::Checkpoint;
use crate::error::{Error, Result};
use crate::evaluation::auc_roc;

/// Which task a model was trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Per-node fraud classification.
    NodeClassification,
    /// Edge existence prediction.
    LinkPrediction,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::NodeClassification => "node_classification",
            TaskKind::LinkPrediction => "link_prediction",
        };
        write!(f, "{name}")
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "node_classification" => Ok(TaskKind::NodeClassification),
            "link_prediction" => Ok(TaskKind::LinkPrediction),
            other => Err(format!("unknown task: {other:?}")),
        }
    }
}

/// Training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of epochs (default: 100).
    pub epochs: usize,
    /// Learning rate (default: 0.005).
    pub learning_rate: f32,
    /// Decoupled weight decay (default: 0.0).
    pub weight_decay: f32,
    /// Supervision chunk size (default: 512).
    pub batch_size: usize,
    /// Negative samples per positive edge (default: 5).
    pub negative_samples: usize,
    /// Early-stopping patience in epochs (None disables; default: 10).
    pub early_stopping: Option<usize>,
    /// Sampling seed (default: 42).
    pub seed: u64,
    /// Directory for the best-epoch checkpoint (None skips saving).
    pub checkpoint_dir: Option<PathBuf>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 0.005,
            weight_decay: 0.0,
            batch_size: 512,
            negative_samples: 5,
            early_stopping: Some(10),
            seed: 42,
            checkpoint_dir: None,
        }
    }
}

impl TrainConfig {
    /// Set the epoch count.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the learning rate.
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set the negative-sample count.
    pub fn with_negative_samples(mut self, n: usize) -> Self {
        self.negative_samples = n;
        self
    }

    /// Set the early-stopping patience.
    pub fn with_early_stopping(mut self, patience: Option<usize>) -> Self {
        self.early_stopping = patience;
        self
    }

    /// Set the sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the checkpoint directory.
    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }
}

/// Per-epoch training statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// Epoch index (0-based).
    pub epoch: usize,
    /// Mean training loss.
    pub train_loss: f32,
    /// Mean validation loss, when a validation split exists.
    pub val_loss: Option<f32>,
    /// Validation metric: F1 for node classification, AUC-ROC for links.
    pub val_metric: Option<f32>,
}

/// Result of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainReport {
    /// Task trained.
    pub task: TaskKind,
    /// Per-epoch statistics (up to the early-stopping point).
    pub history: Vec<EpochStats>,
    /// Epoch whose weights were kept.
    pub best_epoch: usize,
    /// Selection metric at the best epoch (val loss or val AUC).
    pub best_metric: f32,
    /// Where the best checkpoint was written, if configured.
    pub checkpoint_path: Option<PathBuf>,
}

/// Labeled `(type, index, label)` triples for one split partition.
pub(crate) fn labeled_items(
    graph: &HeteroGraph,
    masks: &SplitMasks,
    pick: impl Fn(&ringsight_core::NodeSplit) -> &[usize],
) -> Vec<(NodeType, usize, bool)> {
    let mut items = Vec::new();
    for (node_type, split) in &masks.per_type {
        let Some(store) = graph.node_store(node_type) else {
            continue;
        };
        for &idx in pick(split) {
            if let Some(label) = store.label(idx) {
                items.push((node_type.clone(), idx, label));
            }
        }
    }
    items
}

fn gather_rows(emb: &Embeddings, items: &[(NodeType, usize, bool)]) -> Array2<f32> {
    let dim = emb.values().next().map_or(0, ndarray::Array2::ncols);
    let mut x = Array2::zeros((items.len(), dim));
    for (row, (node_type, idx, _)) in items.iter().enumerate() {
        x.row_mut(row).assign(&emb[node_type].row(*idx));
    }
    x
}

/// Fraud probability for two-class logits: `sigmoid(logit_1 - logit_0)`.
fn fraud_probabilities(logits: &Array2<f32>) -> Vec<f32> {
    logits
        .outer_iter()
        .map(|row| sigmoid(row[1] - row[0]))
        .collect()
}

fn zero_like(emb: &Embeddings) -> Embeddings {
    emb.iter()
        .map(|(t, m)| (t.clone(), Array2::zeros(m.raw_dim())))
        .collect()
}

/// Scores and labels for a set of node items, using the current weights.
pub(crate) fn score_node_items(
    model: &mut HeteroGnn,
    graph: &HeteroGraph,
    items: &[(NodeType, usize, bool)],
) -> Result<(Vec<f32>, Vec<bool>, f32)> {
    let emb = model.forward(graph)?;
    let x = gather_rows(&emb, items);
    let labels_usize: Vec<usize> = items.iter().map(|(_, _, l)| usize::from(*l)).collect();
    let logits = model.node_head_mut().forward(&x);
    let (loss, _) = softmax_cross_entropy(&logits, &labels_usize);
    let scores = fraud_probabilities(&logits);
    let labels = items.iter().map(|(_, _, l)| *l).collect();
    Ok((scores, labels, loss))
}

/// Train the model for node classification.
///
/// Returns the training history; the model is left holding the best-epoch
/// weights.
pub fn train_node_classification(
    model: &mut HeteroGnn,
    graph: &HeteroGraph,
    masks: &SplitMasks,
    config: &TrainConfig,
) -> Result<TrainReport> {
    let train_items = labeled_items(graph, masks, |s| &s.train);
    let val_items = labeled_items(graph, masks, |s| &s.val);
    if train_items.is_empty() {
        return Err(Error::NoLabels);
    }

    info!(
        train = train_items.len(),
        val = val_items.len(),
        params = model.num_parameters(),
        "training node classification"
    );

    let mut opt = Adam::new(config.learning_rate).with_weight_decay(config.weight_decay);
    let mut history = Vec::with_capacity(config.epochs);
    let mut best_metric = f32::INFINITY;
    let mut best_epoch = 0usize;
    let mut best_state = model.state_dict();
    let total = train_items.len() as f32;

    for epoch in 0..config.epochs {
        model.zero_grads();
        let emb = model.forward(graph)?;
        let mut grads = zero_like(&emb);
        let mut epoch_loss = 0.0f32;

        for chunk in train_items.chunks(config.batch_size) {
            let x = gather_rows(&emb, chunk);
            let labels: Vec<usize> = chunk.iter().map(|(_, _, l)| usize::from(*l)).collect();
            let logits = model.node_head_mut().forward(&x);
            let (loss, mut dlogits) = softmax_cross_entropy(&logits, &labels);

            let scale = chunk.len() as f32 / total;
            dlogits.mapv_inplace(|v| v * scale);
            epoch_loss += loss * scale;

            let dx = model.node_head_mut().backward(&dlogits);
            for (row, (node_type, idx, _)) in chunk.iter().enumerate() {
                let mut target = grads
                    .get_mut(node_type)
                    .expect("gradient map covers every type")
                    .row_mut(*idx);
                target += &dx.row(row);
            }
        }

        model.backward(grads);
        model.apply_grads(&mut opt);

        let (val_loss, val_metric) = if val_items.is_empty() {
            (None, None)
        } else {
            let (scores, labels, loss) = score_node_items(model, graph, &val_items)?;
            let metrics =
                crate::evaluation::ClassificationMetrics::from_scores(&scores, &labels, 0.5);
            (Some(loss), Some(metrics.f1 as f32))
        };

        history.push(EpochStats {
            epoch,
            train_loss: epoch_loss,
            val_loss,
            val_metric,
        });

        let selection = val_loss.unwrap_or(epoch_loss);
        if selection < best_metric {
            best_metric = selection;
            best_epoch = epoch;
            best_state = model.state_dict();
        }

        debug!(epoch, train_loss = epoch_loss, ?val_loss, "epoch finished");
        if epoch % 10 == 0 {
            info!(epoch, train_loss = epoch_loss, ?val_loss, ?val_metric, "training");
        }

        if let Some(patience) = config.early_stopping {
            if epoch > best_epoch + patience {
                info!(epoch, best_epoch, "early stopping");
                break;
            }
        }
    }

    model.load_state_dict(&best_state)?;
    let checkpoint_path = save_checkpoint(
        model,
        TaskKind::NodeClassification,
        best_epoch,
        best_metric,
        config,
    )?;

    Ok(TrainReport {
        task: TaskKind::NodeClassification,
        history,
        best_epoch,
        best_metric,
        checkpoint_path,
    })
}

/// One supervision pair for link prediction.
#[derive(Debug, Clone)]
pub struct LinkItem {
    /// Source node type.
    pub src_type: NodeType,
    /// Source node index.
    pub src: usize,
    /// Destination node type.
    pub dst_type: NodeType,
    /// Destination node index.
    pub dst: usize,
    /// 1.0 for positive edges, 0.0 for sampled negatives.
    pub target: f32,
}

/// Positive supervision edges per relation, resolved to index pairs.
pub(crate) fn positive_items(
    graph: &HeteroGraph,
    split: &EdgeSplit,
    pick: impl Fn(&ringsight_core::EdgeIndexSplit) -> &[usize],
) -> Vec<LinkItem> {
    let mut items = Vec::new();
    for (edge_type, index_split) in &split.per_relation {
        let Some(store) = graph.edge_store(edge_type) else {
            continue;
        };
        for &edge_idx in pick(index_split) {
            items.push(LinkItem {
                src_type: edge_type.src_type.clone(),
                src: store.src[edge_idx],
                dst_type: edge_type.dst_type.clone(),
                dst: store.dst[edge_idx],
                target: 1.0,
            });
        }
    }
    items
}

/// Sample negative edges by corrupting destinations.
///
/// Draws uniformly over the destination type, rejecting pairs that exist in
/// the graph; after a bounded number of attempts the last draw is kept, so
/// very dense relations degrade gracefully instead of looping.
pub fn sample_negative_edges(
    positives: &[LinkItem],
    known: &BTreeMap<(NodeType, NodeType), HashSet<(usize, usize)>>,
    num_dst: &BTreeMap<NodeType, usize>,
    per_positive: usize,
    rng: &mut XorShiftRng,
) -> Vec<LinkItem> {
    let mut negatives = Vec::with_capacity(positives.len() * per_positive);
    for pos in positives {
        let n = num_dst[&pos.dst_type];
        let existing = &known[&(pos.src_type.clone(), pos.dst_type.clone())];
        for _ in 0..per_positive {
            let mut candidate = rng.random_range(0..n);
            for _ in 0..10 {
                if !existing.contains(&(pos.src, candidate)) {
                    break;
                }
                candidate = rng.random_range(0..n);
            }
            negatives.push(LinkItem {
                src_type: pos.src_type.clone(),
                src: pos.src,
                dst_type: pos.dst_type.clone(),
                dst: candidate,
                target: 0.0,
            });
        }
    }
    negatives
}

pub(crate) fn link_known_edges(
    graph: &HeteroGraph,
    split: &EdgeSplit,
) -> (
    BTreeMap<(NodeType, NodeType), HashSet<(usize, usize)>>,
    BTreeMap<NodeType, usize>,
) {
    let mut known: BTreeMap<(NodeType, NodeType), HashSet<(usize, usize)>> = BTreeMap::new();
    let mut num_dst = BTreeMap::new();
    for edge_type in split.per_relation.keys() {
        let entry = known
            .entry((edge_type.src_type.clone(), edge_type.dst_type.clone()))
            .or_default();
        if let Some(store) = graph.edge_store(edge_type) {
            entry.extend(store.iter());
        }
        num_dst.insert(
            edge_type.dst_type.clone(),
            graph.num_nodes(&edge_type.dst_type),
        );
    }
    (known, num_dst)
}

fn gather_pair_rows(emb: &Embeddings, items: &[LinkItem]) -> (Array2<f32>, Array2<f32>) {
    let dim = emb.values().next().map_or(0, ndarray::Array2::ncols);
    let mut src = Array2::zeros((items.len(), dim));
    let mut dst = Array2::zeros((items.len(), dim));
    for (row, item) in items.iter().enumerate() {
        src.row_mut(row).assign(&emb[&item.src_type].row(item.src));
        dst.row_mut(row).assign(&emb[&item.dst_type].row(item.dst));
    }
    (src, dst)
}

pub(crate) fn link_scores(
    model: &mut HeteroGnn,
    emb: &Embeddings,
    items: &[LinkItem],
) -> (Vec<f32>, Vec<bool>, f32) {
    let (src, dst) = gather_pair_rows(emb, items);
    let logits = model.link_head_mut().forward_pairs(&src, &dst);
    let targets: Vec<f32> = items.iter().map(|i| i.target).collect();
    let (loss, _) = bce_with_logits(&logits, &targets);
    let scores = logits.iter().map(|&x| sigmoid(x)).collect();
    let labels = items.iter().map(|i| i.target > 0.5).collect();
    (scores, labels, loss)
}

/// Train the model for link prediction with negative sampling.
pub fn train_link_prediction(
    model: &mut HeteroGnn,
    graph: &HeteroGraph,
    split: &EdgeSplit,
    config: &TrainConfig,
) -> Result<TrainReport> {
    let train_pos = positive_items(graph, split, |s| &s.train);
    let val_pos = positive_items(graph, split, |s| &s.val);
    if train_pos.is_empty() {
        return Err(Error::NoEdges);
    }

    let (known, num_dst) = link_known_edges(graph, split);
    let mut rng = XorShiftRng::seed_from_u64(config.seed);

    info!(
        train_pos = train_pos.len(),
        val_pos = val_pos.len(),
        relations = split.per_relation.len(),
        "training link prediction"
    );

    let mut opt = Adam::new(config.learning_rate).with_weight_decay(config.weight_decay);
    let mut history = Vec::with_capacity(config.epochs);
    let mut best_metric = f32::NEG_INFINITY;
    let mut best_epoch = 0usize;
    let mut best_state = model.state_dict();

    for epoch in 0..config.epochs {
        let negatives = sample_negative_edges(
            &train_pos,
            &known,
            &num_dst,
            config.negative_samples,
            &mut rng,
        );
        let mut batch: Vec<LinkItem> = train_pos.iter().cloned().chain(negatives).collect();
        // Deterministic interleave so chunks mix positives and negatives.
        batch.sort_by_key(|item| (item.src + item.dst) % 7);
        let total = batch.len() as f32;

        model.zero_grads();
        let emb = model.forward(graph)?;
        let mut grads = zero_like(&emb);
        let mut epoch_loss = 0.0f32;

        for chunk in batch.chunks(config.batch_size) {
            let (src, dst) = gather_pair_rows(&emb, chunk);
            let targets: Vec<f32> = chunk.iter().map(|i| i.target).collect();
            let logits = model.link_head_mut().forward_pairs(&src, &dst);
            let (loss, mut dlogits) = bce_with_logits(&logits, &targets);

            let scale = chunk.len() as f32 / total;
            dlogits.mapv_inplace(|v| v * scale);
            epoch_loss += loss * scale;

            let (dsrc, ddst) = model.link_head_mut().backward(&dlogits);
            for (row, item) in chunk.iter().enumerate() {
                let mut target = grads
                    .get_mut(&item.src_type)
                    .expect("gradient map covers every type")
                    .row_mut(item.src);
                target += &dsrc.row(row);
                let mut target = grads
                    .get_mut(&item.dst_type)
                    .expect("gradient map covers every type")
                    .row_mut(item.dst);
                target += &ddst.row(row);
            }
        }

        model.backward(grads);
        model.apply_grads(&mut opt);

        let (val_loss, val_metric) = if val_pos.is_empty() {
            (None, None)
        } else {
            let val_neg =
                sample_negative_edges(&val_pos, &known, &num_dst, config.negative_samples, &mut rng);
            let val_items: Vec<LinkItem> = val_pos.iter().cloned().chain(val_neg).collect();
            let emb = model.forward(graph)?;
            let (scores, labels, loss) = link_scores(model, &emb, &val_items);
            (Some(loss), Some(auc_roc(&scores, &labels) as f32))
        };

        history.push(EpochStats {
            epoch,
            train_loss: epoch_loss,
            val_loss,
            val_metric,
        });

        // Select on val AUC; fall back to (negated) train loss without a
        // validation split so "higher is better" holds either way.
        let selection = val_metric.unwrap_or(-epoch_loss);
        if selection > best_metric {
            best_metric = selection;
            best_epoch = epoch;
            best_state = model.state_dict();
        }

        debug!(epoch, train_loss = epoch_loss, ?val_metric, "epoch finished");
        if epoch % 10 == 0 {
            info!(epoch, train_loss = epoch_loss, ?val_loss, ?val_metric, "training");
        }

        if let Some(patience) = config.early_stopping {
            if epoch > best_epoch + patience {
                info!(epoch, best_epoch, "early stopping");
                break;
            }
        }
    }

    model.load_state_dict(&best_state)?;
    let checkpoint_path = save_checkpoint(
        model,
        TaskKind::LinkPrediction,
        best_epoch,
        best_metric,
        config,
    )?;

    Ok(TrainReport {
        task: TaskKind::LinkPrediction,
        history,
        best_epoch,
        best_metric,
        checkpoint_path,
    })
}

fn save_checkpoint(
    model: &HeteroGnn,
    task: TaskKind,
    epoch: usize,
    metric: f32,
    config: &TrainConfig,
) -> Result<Option<PathBuf>> {
    let Some(dir) = &config.checkpoint_dir else {
        return Ok(None);
    };
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{task}.json"));
    Checkpoint::capture(model, task, epoch, metric).save(&path)?;
    info!(path = %path.display(), "saved checkpoint");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringsight_core::{EdgeType, SplitRatios};
    use ringsight_nn::{GraphSchema, ModelConfig};

    /// A bipartite account/device graph with separable labels: fraud
    /// accounts have feature [1, 0], clean have [0, 1].
    fn labeled_graph(num_accounts: usize) -> HeteroGraph {
        let mut graph = HeteroGraph::new();
        let account = NodeType::new("account");
        let device = NodeType::new("device");
        let uses = EdgeType::new("account", "uses", "device");

        for i in 0..num_accounts {
            let fraud = i % 2 == 0;
            let a = format!("a{i}");
            let d = format!("d{}", i / 4);
            graph.add_edge(&uses, &a, &d);
            graph.add_edge(&uses.reverse(), &d, &a);

            let idx = graph.get_node_index(&account, &a).unwrap();
            let store = graph.node_store_mut(&account).unwrap();
            store
                .set_features(
                    &account,
                    idx,
                    if fraud { vec![1.0, 0.0] } else { vec![0.0, 1.0] },
                )
                .unwrap();
            store.set_label(idx, fraud);
        }
        let device_count = graph.num_nodes(&device);
        for i in 0..device_count {
            graph
                .node_store_mut(&device)
                .unwrap()
                .set_features(&device, i, vec![0.5])
                .unwrap();
        }
        graph
    }

    fn small_model(graph: &HeteroGraph) -> HeteroGnn {
        let schema = GraphSchema::of(graph).unwrap();
        HeteroGnn::new(
            schema,
            ModelConfig::default()
                .with_hidden_dim(8)
                .with_embed_dim(4)
                .with_num_layers(1),
        )
    }

    #[test]
    fn test_node_training_loss_decreases() {
        let graph = labeled_graph(24);
        let masks =
            SplitMasks::split_labeled_nodes(&graph, SplitRatios::new(0.8, 0.2, 0.0).unwrap(), 3)
                .unwrap();
        let mut model = small_model(&graph);

        let config = TrainConfig::default()
            .with_epochs(40)
            .with_learning_rate(0.02)
            .with_early_stopping(None);
        let report = train_node_classification(&mut model, &graph, &masks, &config).unwrap();

        let first = report.history.first().unwrap().train_loss;
        let last = report.history.last().unwrap().train_loss;
        assert!(last < first, "loss did not decrease: {first} -> {last}");
        assert!(report.checkpoint_path.is_none());
    }

    #[test]
    fn test_node_training_requires_labels() {
        let graph = labeled_graph(4);
        let mut model = small_model(&graph);

        // Empty masks: nothing to supervise on.
        let masks = SplitMasks::default();
        let err =
            train_node_classification(&mut model, &graph, &masks, &TrainConfig::default())
                .unwrap_err();
        assert!(matches!(err, Error::NoLabels));
    }

    #[test]
    fn test_link_training_runs_and_improves_auc() {
        let graph = labeled_graph(24);
        let split =
            EdgeSplit::split_edges(&graph, SplitRatios::new(0.7, 0.3, 0.0).unwrap(), 5).unwrap();
        let mut model = small_model(&graph);

        let config = TrainConfig::default()
            .with_epochs(30)
            .with_learning_rate(0.02)
            .with_early_stopping(None)
            .with_negative_samples(3);
        let report = train_link_prediction(&mut model, &graph, &split, &config).unwrap();

        assert_eq!(report.task, TaskKind::LinkPrediction);
        assert!(!report.history.is_empty());
        // Validation AUC at the selected epoch should beat chance.
        assert!(report.best_metric > 0.5, "best AUC {}", report.best_metric);
    }

    #[test]
    fn test_negative_sampling_avoids_known_edges() {
        let graph = labeled_graph(16);
        let split =
            EdgeSplit::split_edges(&graph, SplitRatios::new(1.0, 0.0, 0.0).unwrap(), 1).unwrap();
        let positives = positive_items(&graph, &split, |s| &s.train);
        let (known, num_dst) = link_known_edges(&graph, &split);
        let mut rng = XorShiftRng::seed_from_u64(9);

        let negatives = sample_negative_edges(&positives, &known, &num_dst, 5, &mut rng);
        assert_eq!(negatives.len(), positives.len() * 5);

        // With 4 devices and each account touching 1, rejection should keep
        // nearly all samples off known edges.
        let clashes = negatives
            .iter()
            .filter(|n| {
                known[&(n.src_type.clone(), n.dst_type.clone())].contains(&(n.src, n.dst))
            })
            .count();
        assert!(
            clashes * 10 < negatives.len(),
            "{clashes} of {} negatives hit known edges",
            negatives.len()
        );
    }

    #[test]
    fn test_task_kind_parse() {
        assert_eq!(
            "node-classification".parse::<TaskKind>().unwrap(),
            TaskKind::NodeClassification
        );
        assert_eq!(
            "link_prediction".parse::<TaskKind>().unwrap(),
            TaskKind::LinkPrediction
        );
        assert!("clustering".parse::<TaskKind>().is_err());
    }
}
