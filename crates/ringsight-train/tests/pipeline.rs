//! End-to-end tests: synthetic tables with a planted fraud ring, through
//! preprocessing, graph construction, training, evaluation and inference.

use chrono::{Duration, TimeZone, Utc};
use ringsight_core::NodeType;
use ringsight_data::loaders::RawTables;
use ringsight_data::preprocess::{clean_tables, engineer_features};
use ringsight_data::{
    graph_builder, AccountRecord, DeviceRecord, LabelRecord, MerchantRecord, TransactionRecord,
};
use ringsight_core::EntityKind;
use ringsight_train::{
    pipeline, Scorer, TaskKind, TrainConfig,
};

/// Synthetic dataset with one planted ring.
///
/// Ten fraud accounts share two devices and one gift-card merchant, firing
/// large night-time transactions from young unverified accounts. Twenty
/// clean accounts each use their own device against ordinary merchants.
fn planted_ring_tables() -> (RawTables, Vec<LabelRecord>) {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let mut transactions = Vec::new();
    let mut accounts = Vec::new();
    let mut devices = Vec::new();
    let mut labels = Vec::new();

    let mut merchants = vec![MerchantRecord {
        merchant_id: "mf".into(),
        merchant_name: "CardMill".into(),
        merchant_category: "gift_cards".into(),
        country: "US".into(),
    }];
    for i in 0..3 {
        merchants.push(MerchantRecord {
            merchant_id: format!("m{i}"),
            merchant_name: format!("Shop {i}"),
            merchant_category: "electronics".into(),
            country: "DE".into(),
        });
    }

    for d in 0..2 {
        devices.push(DeviceRecord {
            device_id: format!("fd{d}"),
            device_type: "mobile".into(),
            os: "android".into(),
            browser: String::new(),
            device_fingerprint: String::new(),
        });
        labels.push(LabelRecord {
            entity_id: format!("fd{d}"),
            entity_kind: EntityKind::Device,
            is_fraud: true,
            fraud_type: Some("ring".into()),
        });
    }

    for i in 0..10 {
        let id = format!("f{i}");
        accounts.push(AccountRecord {
            account_id: id.clone(),
            created_at: base - Duration::days(5),
            account_type: "personal".into(),
            verification_status: "pending".into(),
            country: "US".into(),
        });
        labels.push(LabelRecord {
            entity_id: id.clone(),
            entity_kind: EntityKind::Account,
            is_fraud: true,
            fraud_type: Some("ring".into()),
        });
        for t in 0..3 {
            transactions.push(TransactionRecord {
                transaction_id: format!("ft{i}_{t}"),
                account_id: id.clone(),
                device_id: format!("fd{}", (i + t) % 2),
                ip_address: format!("10.9.9.{}", t % 2),
                merchant_id: "mf".into(),
                amount: 500.0,
                timestamp: base - Duration::hours(9) + Duration::minutes((i * 3 + t) as i64),
                status: "approved".into(),
            });
        }
    }

    for i in 0..20 {
        let id = format!("c{i}");
        accounts.push(AccountRecord {
            account_id: id.clone(),
            created_at: base - Duration::days(400 + i as i64),
            account_type: "personal".into(),
            verification_status: "verified".into(),
            country: "DE".into(),
        });
        labels.push(LabelRecord {
            entity_id: id.clone(),
            entity_kind: EntityKind::Account,
            is_fraud: false,
            fraud_type: None,
        });
        devices.push(DeviceRecord {
            device_id: format!("cd{i}"),
            device_type: "desktop".into(),
            os: "windows".into(),
            browser: "firefox".into(),
            device_fingerprint: format!("fp{i}"),
        });
        for t in 0..2 {
            transactions.push(TransactionRecord {
                transaction_id: format!("ct{i}_{t}"),
                account_id: id.clone(),
                device_id: format!("cd{i}"),
                ip_address: format!("192.168.1.{i}"),
                merchant_id: format!("m{}", i % 3),
                amount: 20.0 + i as f64 + t as f64 * 3.5,
                timestamp: base - Duration::days(2) + Duration::hours(i as i64 % 10),
                status: "approved".into(),
            });
        }
    }

    (
        RawTables {
            transactions,
            accounts,
            devices,
            merchants,
        },
        labels,
    )
}

fn planted_ring_graph() -> ringsight_core::HeteroGraph {
    let (raw, labels) = planted_ring_tables();
    let (tables, _) = clean_tables(raw);
    let features = engineer_features(&tables);
    graph_builder::build_heterogeneous_graph(&tables, &features, Some(&labels)).unwrap()
}

fn fast_config(checkpoint_dir: Option<&std::path::Path>) -> pipeline::PipelineConfig {
    let mut train = TrainConfig::default()
        .with_epochs(60)
        .with_learning_rate(0.01)
        .with_early_stopping(None)
        .with_seed(11);
    if let Some(dir) = checkpoint_dir {
        train = train.with_checkpoint_dir(dir);
    }
    pipeline::PipelineConfig {
        model: ringsight_nn::ModelConfig::default()
            .with_hidden_dim(16)
            .with_embed_dim(8)
            .with_num_layers(2)
            .with_seed(1),
        train,
        ratios: ringsight_core::SplitRatios::new(0.7, 0.15, 0.15).unwrap(),
        threshold: 0.5,
        min_ring_size: 2,
    }
}

#[test]
fn test_node_classification_pipeline_learns_planted_ring() {
    let graph = planted_ring_graph();
    let config = fast_config(None);

    let report =
        pipeline::train_eval_on_graph(graph, TaskKind::NodeClassification, &config).unwrap();

    assert_eq!(report.task, TaskKind::NodeClassification);
    assert!(!report.train.history.is_empty());

    let first = report.train.history.first().unwrap().train_loss;
    let last = report.train.history.last().unwrap().train_loss;
    assert!(last < first, "training loss did not decrease: {first} -> {last}");

    // The planted signal is trivially separable; the held-out metrics
    // should comfortably beat chance.
    assert!(report.test_metrics.support > 0);
    assert!(
        report.test_metrics.accuracy >= 0.7,
        "test accuracy {}",
        report.test_metrics.accuracy
    );
    assert!(
        report.test_metrics.auc_roc >= 0.7,
        "test AUC {}",
        report.test_metrics.auc_roc
    );

    // Exactly one ground-truth ring: the fraud accounts and shared devices.
    let rings = report.ring_metrics.unwrap();
    assert_eq!(rings.num_true, 1);
}

#[test]
fn test_link_prediction_pipeline_completes() {
    let graph = planted_ring_graph();
    let mut config = fast_config(None);
    config.train = config.train.with_epochs(10);

    let report =
        pipeline::train_eval_on_graph(graph, TaskKind::LinkPrediction, &config).unwrap();

    assert_eq!(report.task, TaskKind::LinkPrediction);
    assert!(report.ring_metrics.is_none());
    assert!(report.test_metrics.support > 0);
    assert!(report.test_metrics.auc_roc.is_finite());
    for stats in &report.train.history {
        assert!(stats.train_loss.is_finite());
    }
}

#[test]
fn test_checkpoint_to_scorer_flow() {
    let graph = planted_ring_graph();
    let dir = tempfile::tempdir().unwrap();
    let mut config = fast_config(Some(dir.path()));
    config.train = config.train.with_epochs(30);

    let report = pipeline::train_eval_on_graph(
        graph.clone(),
        TaskKind::NodeClassification,
        &config,
    )
    .unwrap();
    let checkpoint_path = report.train.checkpoint_path.expect("checkpoint configured");

    let scorer = Scorer::from_checkpoint(&checkpoint_path, graph, 0.5).unwrap();
    let account = NodeType::new("account");

    let score = scorer.score_entity(&account, "f0").unwrap();
    assert!((0.0..=1.0).contains(&score.fraud_probability));

    let batch = scorer
        .score_batch(&account, &["f0".into(), "c0".into()])
        .unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].fraud_probability, score.fraud_probability);

    // With everything selected, the graph splits into the fraud component
    // and the clean component (they share no device, IP or merchant).
    let rings = scorer.predict_rings(0.0, 2);
    assert_eq!(rings.len(), 2, "expected fraud and clean components");

    // Embeddings for downstream use.
    let emb = scorer.embeddings(&account, &["f0".into(), "f1".into()]).unwrap();
    assert_eq!(emb.nrows(), 2);
    assert_eq!(emb.ncols(), 8);
}
