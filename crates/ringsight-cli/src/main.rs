//! Ringsight CLI - fraud-ring detection over heterogeneous entity graphs.
//!
//! # Usage
//!
//! ```bash
//! # Build the graph from CSV tables and print statistics
//! ringsight build-graph data/
//!
//! # Train node classification, writing the best checkpoint
//! ringsight train data/ --task node-classification --checkpoint-dir checkpoints/
//!
//! # Evaluate a checkpoint on the held-out split
//! ringsight evaluate data/ checkpoints/node_classification.json
//!
//! # Score individual accounts
//! ringsight score data/ checkpoints/node_classification.json --entity-type account acct_1 acct_2
//!
//! # Extract candidate fraud rings
//! ringsight rings data/ checkpoints/node_classification.json --threshold 0.8
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use ringsight_core::algo::cluster_stats;
use ringsight_core::{NodeType, SplitMasks, SplitRatios};
use ringsight_nn::{ConvKind, ModelConfig};
use ringsight_train::{
    build_graph_pipeline, evaluate_link_prediction, evaluate_node_classification, pipeline,
    Checkpoint, Scorer, TaskKind, TrainConfig,
};

#[derive(Parser)]
#[command(name = "ringsight")]
#[command(about = "GNN-based fraud-ring detection over entity graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the heterogeneous graph from CSV tables and print statistics
    BuildGraph {
        /// Directory with transactions/accounts/devices/merchants[/labels].csv
        data_dir: PathBuf,

        /// Write the full graph as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Train a model and evaluate it on the held-out split
    Train {
        /// Data directory
        data_dir: PathBuf,

        /// Task to train
        #[arg(long, default_value = "node-classification")]
        task: TaskKind,

        /// Convolution variant (gcn, sage, gat)
        #[arg(long, default_value = "sage")]
        conv: ConvKind,

        /// Number of training epochs
        #[arg(long, default_value = "100")]
        epochs: usize,

        /// Learning rate
        #[arg(long, default_value = "0.005")]
        learning_rate: f32,

        /// Hidden dimension
        #[arg(long, default_value = "64")]
        hidden_dim: usize,

        /// Embedding dimension
        #[arg(long, default_value = "32")]
        embed_dim: usize,

        /// Message-passing layers
        #[arg(long, default_value = "2")]
        layers: usize,

        /// Where to write the best checkpoint
        #[arg(long, default_value = "checkpoints")]
        checkpoint_dir: PathBuf,

        /// Split/sampling seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Evaluate a checkpoint against the held-out split
    Evaluate {
        /// Data directory
        data_dir: PathBuf,

        /// Checkpoint file
        checkpoint: PathBuf,

        /// Classification threshold
        #[arg(long, default_value = "0.5")]
        threshold: f32,

        /// Split seed (must match training for a faithful test split)
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Score entities with a trained model
    Score {
        /// Data directory
        data_dir: PathBuf,

        /// Checkpoint file
        checkpoint: PathBuf,

        /// Entity type to score (account, device, ...)
        #[arg(long, default_value = "account")]
        entity_type: String,

        /// Entity ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Flagging threshold
        #[arg(long, default_value = "0.5")]
        threshold: f32,
    },

    /// Extract candidate fraud rings
    Rings {
        /// Data directory
        data_dir: PathBuf,

        /// Checkpoint file
        checkpoint: PathBuf,

        /// Risk threshold for ring membership
        #[arg(long, default_value = "0.5")]
        threshold: f32,

        /// Minimum ring size
        #[arg(long, default_value = "2")]
        min_size: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ringsight=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::BuildGraph { data_dir, output } => build_graph(&data_dir, output.as_deref()),
        Commands::Train {
            data_dir,
            task,
            conv,
            epochs,
            learning_rate,
            hidden_dim,
            embed_dim,
            layers,
            checkpoint_dir,
            seed,
        } => train(
            &data_dir,
            task,
            conv,
            epochs,
            learning_rate,
            hidden_dim,
            embed_dim,
            layers,
            checkpoint_dir,
            seed,
        ),
        Commands::Evaluate {
            data_dir,
            checkpoint,
            threshold,
            seed,
        } => evaluate(&data_dir, &checkpoint, threshold, seed),
        Commands::Score {
            data_dir,
            checkpoint,
            entity_type,
            ids,
            threshold,
        } => score(&data_dir, &checkpoint, &entity_type, &ids, threshold),
        Commands::Rings {
            data_dir,
            checkpoint,
            threshold,
            min_size,
        } => rings(&data_dir, &checkpoint, threshold, min_size),
    }
}

fn build_graph(data_dir: &std::path::Path, output: Option<&std::path::Path>) -> Result<()> {
    let graph = build_graph_pipeline(data_dir)
        .with_context(|| format!("building graph from {}", data_dir.display()))?;
    let stats = graph.stats();

    println!("{}", serde_json::to_string_pretty(&stats)?);

    if let Some(path) = output {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer(std::io::BufWriter::new(file), &graph)?;
        info!(path = %path.display(), "wrote graph");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn train(
    data_dir: &std::path::Path,
    task: TaskKind,
    conv: ConvKind,
    epochs: usize,
    learning_rate: f32,
    hidden_dim: usize,
    embed_dim: usize,
    layers: usize,
    checkpoint_dir: PathBuf,
    seed: u64,
) -> Result<()> {
    let config = pipeline::PipelineConfig {
        model: ModelConfig::default()
            .with_hidden_dim(hidden_dim)
            .with_embed_dim(embed_dim)
            .with_num_layers(layers)
            .with_conv(conv)
            .with_seed(seed),
        train: TrainConfig::default()
            .with_epochs(epochs)
            .with_learning_rate(learning_rate)
            .with_seed(seed)
            .with_checkpoint_dir(checkpoint_dir),
        ratios: SplitRatios::default(),
        threshold: 0.5,
        min_ring_size: 2,
    };

    let spinner = ProgressBar::new_spinner().with_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]").expect("static template"),
    );
    spinner.set_message(format!("training {task}"));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let report = pipeline::train_eval_pipeline(data_dir, task, &config)
        .with_context(|| format!("training {task}"))?;

    spinner.finish_with_message(format!(
        "trained {task}: best epoch {}",
        report.train.best_epoch
    ));

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn evaluate(
    data_dir: &std::path::Path,
    checkpoint_path: &std::path::Path,
    threshold: f32,
    seed: u64,
) -> Result<()> {
    let graph = build_graph_pipeline(data_dir)?;
    let checkpoint = Checkpoint::load(checkpoint_path)
        .with_context(|| format!("loading {}", checkpoint_path.display()))?;
    let mut model = checkpoint.build_model()?;

    let metrics = match checkpoint.task {
        TaskKind::NodeClassification => {
            let masks = SplitMasks::split_labeled_nodes(&graph, SplitRatios::default(), seed)?;
            evaluate_node_classification(&mut model, &graph, &masks, threshold)?
        }
        TaskKind::LinkPrediction => {
            let split =
                ringsight_core::EdgeSplit::split_edges(&graph, SplitRatios::default(), seed)?;
            evaluate_link_prediction(&mut model, &graph, &split, 5, seed, threshold)?
        }
    };

    eprintln!("{}", metrics.summary());
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}

fn score(
    data_dir: &std::path::Path,
    checkpoint: &std::path::Path,
    entity_type: &str,
    ids: &[String],
    threshold: f32,
) -> Result<()> {
    let graph = build_graph_pipeline(data_dir)?;
    let scorer = Scorer::from_checkpoint(checkpoint, graph, threshold)
        .with_context(|| format!("loading {}", checkpoint.display()))?;

    let scores = scorer.score_batch(&NodeType::new(entity_type), ids)?;
    println!("{}", serde_json::to_string_pretty(&scores)?);
    Ok(())
}

fn rings(
    data_dir: &std::path::Path,
    checkpoint: &std::path::Path,
    threshold: f32,
    min_size: usize,
) -> Result<()> {
    let graph = build_graph_pipeline(data_dir)?;
    let scorer = Scorer::from_checkpoint(checkpoint, graph, threshold)
        .with_context(|| format!("loading {}", checkpoint.display()))?;

    let rings = scorer.predict_rings(threshold, min_size);
    let members: Vec<Vec<_>> = rings
        .iter()
        .map(|r| {
            r.members
                .iter()
                .map(|m| (m.node_type.clone(), m.index))
                .collect()
        })
        .collect();
    let stats = cluster_stats(&members);
    info!(
        rings = rings.len(),
        largest = stats.max_cluster_size,
        "ring extraction finished"
    );

    println!("{}", serde_json::to_string_pretty(&rings)?);
    Ok(())
}
