//! End-to-end pipelines: raw CSV tables to a trained, evaluated model.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use ringsight_core::algo::TypedNode;
use ringsight_core::{EdgeSplit, HeteroGraph, HeteroGraphStats, SplitMasks, SplitRatios};
use ringsight_data::{graph_builder, loaders, preprocess};
use ringsight_nn::{GraphSchema, HeteroGnn, ModelConfig};

use crate::error::Result;
use crate::evaluation::{
    evaluate_link_prediction, evaluate_node_classification, ground_truth_rings, ring_metrics,
    ClassificationMetrics, RingMetrics,
};
use crate::scorer::Scorer;
use crate::training::{
    train_link_prediction, train_node_classification, TaskKind, TrainConfig, TrainReport,
};

/// Everything a pipeline run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Model hyperparameters.
    pub model: ModelConfig,
    /// Training hyperparameters.
    pub train: TrainConfig,
    /// Split ratios for nodes or edges.
    pub ratios: SplitRatios,
    /// Classification threshold for metrics and ring extraction.
    pub threshold: f32,
    /// Minimum members for a predicted ring.
    pub min_ring_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            train: TrainConfig::default(),
            ratios: SplitRatios::default(),
            threshold: 0.5,
            min_ring_size: 2,
        }
    }
}

/// Load, clean, featurize and assemble the heterogeneous graph.
pub fn build_graph_pipeline(data_dir: impl AsRef<Path>) -> Result<HeteroGraph> {
    let data = loaders::load_all(data_dir.as_ref())?;
    let (tables, report) = preprocess::clean_tables(data.tables);
    if report.total() > 0 {
        info!(dropped = report.total(), "cleaning dropped rows");
    }
    let features = preprocess::engineer_features(&tables);
    let graph =
        graph_builder::build_heterogeneous_graph(&tables, &features, data.labels.as_deref())?;
    Ok(graph)
}

/// Result of a full train-and-evaluate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Task trained.
    pub task: TaskKind,
    /// Statistics of the constructed graph.
    pub graph_stats: HeteroGraphStats,
    /// Training history.
    pub train: TrainReport,
    /// Metrics on the held-out test split.
    pub test_metrics: ClassificationMetrics,
    /// Ring-detection metrics (node-classification runs only).
    pub ring_metrics: Option<RingMetrics>,
}

/// Train and evaluate on an already-built graph.
pub fn train_eval_on_graph(
    graph: HeteroGraph,
    task: TaskKind,
    config: &PipelineConfig,
) -> Result<PipelineReport> {
    let graph_stats = graph.stats();
    let schema = GraphSchema::of(&graph)?;
    let mut model = HeteroGnn::new(schema, config.model.clone());

    match task {
        TaskKind::NodeClassification => {
            let masks =
                SplitMasks::split_labeled_nodes(&graph, config.ratios, config.train.seed)?;
            let train =
                train_node_classification(&mut model, &graph, &masks, &config.train)?;
            let test_metrics =
                evaluate_node_classification(&mut model, &graph, &masks, config.threshold)?;
            info!(metrics = %test_metrics.summary(), "test metrics");

            let truth = ground_truth_rings(&graph);
            let scorer = Scorer::new(model, graph, config.threshold)?;
            let predicted = scorer.predict_rings(config.threshold, config.min_ring_size);
            let predicted_sets: Vec<HashSet<TypedNode>> = predicted
                .iter()
                .map(|ring| {
                    ring.members
                        .iter()
                        .map(|m| (m.node_type.clone(), m.index))
                        .collect()
                })
                .collect();
            let rings = ring_metrics(&predicted_sets, &truth);

            Ok(PipelineReport {
                task,
                graph_stats,
                train,
                test_metrics,
                ring_metrics: Some(rings),
            })
        }
        TaskKind::LinkPrediction => {
            let split = EdgeSplit::split_edges(&graph, config.ratios, config.train.seed)?;
            let train = train_link_prediction(&mut model, &graph, &split, &config.train)?;
            let test_metrics = evaluate_link_prediction(
                &mut model,
                &graph,
                &split,
                config.train.negative_samples,
                config.train.seed,
                config.threshold,
            )?;
            info!(metrics = %test_metrics.summary(), "test metrics");

            Ok(PipelineReport {
                task,
                graph_stats,
                train,
                test_metrics,
                ring_metrics: None,
            })
        }
    }
}

/// Full pipeline: build the graph from `data_dir`, then train and evaluate.
pub fn train_eval_pipeline(
    data_dir: impl AsRef<Path>,
    task: TaskKind,
    config: &PipelineConfig,
) -> Result<PipelineReport> {
    let graph = build_graph_pipeline(data_dir)?;
    train_eval_on_graph(graph, task, config)
}
