//! Heterogeneous graph construction from feature tables.
//!
//! Builds one node per entity with its feature vector attached, then the
//! four canonical relations (plus reverses, so every node type receives
//! messages):
//!
//! - account `uses` device
//! - account `makes` transaction (attrs: scaled amount, scaled age)
//! - transaction `from` ip
//! - transaction `with` merchant (attrs: scaled amount)
//!
//! Edges are deduplicated on (src, dst) per relation; the first occurrence
//! keeps its attributes. Transactions referencing an account, device or
//! merchant missing from its table are kept as nodes but the dangling edge
//! is skipped and counted.

use std::collections::HashSet;
use tracing::{info, warn};

use ringsight_core::{EdgeType, EntityKind, HeteroGraph, NodeType};

use crate::error::Result;
use crate::preprocess::{reference_time, CleanTables, FeatureTable, FeatureTables};
use crate::records::LabelRecord;

/// The canonical edge types, in construction order.
pub fn canonical_relations() -> [EdgeType; 4] {
    [
        EdgeType::new("account", "uses", "device"),
        EdgeType::new("account", "makes", "transaction"),
        EdgeType::new("transaction", "from", "ip"),
        EdgeType::new("transaction", "with", "merchant"),
    ]
}

fn add_typed_nodes(
    graph: &mut HeteroGraph,
    node_type: &NodeType,
    table: &FeatureTable,
) -> Result<()> {
    for (id, row) in table.ids.iter().zip(&table.rows) {
        let idx = graph.add_node(node_type.clone(), id);
        graph
            .node_store_mut(node_type)
            .expect("store just created")
            .set_features(node_type, idx, row.clone())?;
    }
    Ok(())
}

/// Construct a validated heterogeneous graph from processed tables.
///
/// `labels` attach fraud flags to account and device nodes; labels for other
/// kinds or unknown entities are skipped with a warning.
pub fn build_heterogeneous_graph(
    tables: &CleanTables,
    features: &FeatureTables,
    labels: Option<&[LabelRecord]>,
) -> Result<HeteroGraph> {
    let mut graph = HeteroGraph::new();

    let account = NodeType::new("account");
    let device = NodeType::new("device");
    let ip = NodeType::new("ip");
    let transaction = NodeType::new("transaction");
    let merchant = NodeType::new("merchant");

    add_typed_nodes(&mut graph, &account, &features.accounts)?;
    add_typed_nodes(&mut graph, &device, &features.devices)?;
    add_typed_nodes(&mut graph, &ip, &features.ips)?;
    add_typed_nodes(&mut graph, &transaction, &features.transactions)?;
    add_typed_nodes(&mut graph, &merchant, &features.merchants)?;

    let [uses, makes, from, with] = canonical_relations();
    let now = reference_time(tables);

    let mut seen: HashSet<(usize, usize, usize)> = HashSet::new();
    let mut dangling = 0usize;

    // Relation order inside the dedup key: 0=uses, 1=makes, 2=from, 3=with.
    // Each relation is handled independently so one missing endpoint does not
    // drop the transaction's other edges.
    for t in &tables.transactions {
        let a_idx = graph.get_node_index(&account, &t.account_id);
        let d_idx = graph.get_node_index(&device, &t.device_id);
        let m_idx = graph.get_node_index(&merchant, &t.merchant_id);
        let t_idx = graph
            .get_node_index(&transaction, &t.transaction_id)
            .expect("every cleaned transaction has a node");
        let i_idx = graph
            .get_node_index(&ip, &t.ip_address)
            .expect("every transaction ip has a node");

        let amount_scaled = (t.amount.max(0.0)).ln_1p() as f32;
        let age_scaled = ((now - t.timestamp).num_days().max(0) as f32 / 365.0).min(10.0);

        match (a_idx, d_idx) {
            (Some(a), Some(d)) => {
                if seen.insert((0, a, d)) {
                    graph.add_edge(&uses, &t.account_id, &t.device_id);
                    graph.add_edge(&uses.reverse(), &t.device_id, &t.account_id);
                }
            }
            _ => dangling += 1,
        }

        match a_idx {
            Some(a) => {
                if seen.insert((1, a, t_idx)) {
                    graph.add_edge_with_attr(
                        &makes,
                        &t.account_id,
                        &t.transaction_id,
                        vec![amount_scaled, age_scaled],
                    )?;
                    graph.add_edge_with_attr(
                        &makes.reverse(),
                        &t.transaction_id,
                        &t.account_id,
                        vec![amount_scaled, age_scaled],
                    )?;
                }
            }
            None => dangling += 1,
        }

        if seen.insert((2, t_idx, i_idx)) {
            graph.add_edge(&from, &t.transaction_id, &t.ip_address);
            graph.add_edge(&from.reverse(), &t.ip_address, &t.transaction_id);
        }

        match m_idx {
            Some(m) => {
                if seen.insert((3, t_idx, m)) {
                    graph.add_edge_with_attr(
                        &with,
                        &t.transaction_id,
                        &t.merchant_id,
                        vec![amount_scaled],
                    )?;
                    graph.add_edge_with_attr(
                        &with.reverse(),
                        &t.merchant_id,
                        &t.transaction_id,
                        vec![amount_scaled],
                    )?;
                }
            }
            None => dangling += 1,
        }
    }

    if dangling > 0 {
        warn!(dangling, "skipped edges referencing entities missing from their table");
    }

    if let Some(labels) = labels {
        let mut skipped = 0usize;
        for label in labels {
            let node_type = match label.entity_kind {
                EntityKind::Account => &account,
                EntityKind::Device => &device,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            match graph.get_node_index(node_type, &label.entity_id) {
                Some(idx) => graph
                    .node_store_mut(node_type)
                    .expect("store exists")
                    .set_label(idx, label.is_fraud),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "skipped labels for unknown or unlabelable entities");
        }
    }

    graph.validate()?;

    let stats = graph.stats();
    info!(
        nodes = stats.total_nodes,
        edges = stats.total_edges,
        node_types = stats.num_node_types,
        edge_types = stats.num_edge_types,
        "built heterogeneous graph"
    );

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::RawTables;
    use crate::preprocess::{clean_tables, engineer_features};
    use crate::records::{
        AccountRecord, DeviceRecord, MerchantRecord, TransactionRecord,
    };
    use chrono::{TimeZone, Utc};
    use ringsight_core::EntityKind;

    fn txn(id: &str, account: &str, device: &str, ip: &str, merchant: &str) -> TransactionRecord {
        TransactionRecord {
            transaction_id: id.to_string(),
            account_id: account.to_string(),
            device_id: device.to_string(),
            ip_address: ip.to_string(),
            merchant_id: merchant.to_string(),
            amount: 42.0,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            status: "approved".to_string(),
        }
    }

    fn tables() -> CleanTables {
        let raw = RawTables {
            transactions: vec![
                txn("t1", "a1", "d1", "10.0.0.1", "m1"),
                txn("t2", "a2", "d1", "10.0.0.1", "m1"),
                txn("t3", "a1", "d1", "10.0.0.2", "m1"),
            ],
            accounts: vec![
                AccountRecord {
                    account_id: "a1".to_string(),
                    created_at: Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap(),
                    account_type: "personal".to_string(),
                    verification_status: "verified".to_string(),
                    country: "DE".to_string(),
                },
                AccountRecord {
                    account_id: "a2".to_string(),
                    created_at: Utc.with_ymd_and_hms(2023, 7, 1, 0, 0, 0).unwrap(),
                    account_type: "business".to_string(),
                    verification_status: "pending".to_string(),
                    country: "FR".to_string(),
                },
            ],
            devices: vec![DeviceRecord {
                device_id: "d1".to_string(),
                device_type: "mobile".to_string(),
                os: "android".to_string(),
                browser: "chrome".to_string(),
                device_fingerprint: "fp".to_string(),
            }],
            merchants: vec![MerchantRecord {
                merchant_id: "m1".to_string(),
                merchant_name: "Shop".to_string(),
                merchant_category: "electronics".to_string(),
                country: "DE".to_string(),
            }],
        };
        clean_tables(raw).0
    }

    #[test]
    fn test_builds_all_node_types() {
        let tables = tables();
        let features = engineer_features(&tables);
        let graph = build_heterogeneous_graph(&tables, &features, None).unwrap();

        assert_eq!(graph.num_nodes(&NodeType::new("account")), 2);
        assert_eq!(graph.num_nodes(&NodeType::new("device")), 1);
        assert_eq!(graph.num_nodes(&NodeType::new("ip")), 2);
        assert_eq!(graph.num_nodes(&NodeType::new("transaction")), 3);
        assert_eq!(graph.num_nodes(&NodeType::new("merchant")), 1);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_edges_deduplicated_with_reverses() {
        let tables = tables();
        let features = engineer_features(&tables);
        let graph = build_heterogeneous_graph(&tables, &features, None).unwrap();

        let [uses, makes, from, with] = canonical_relations();
        // a1-d1 appears in two transactions but is one edge; a2-d1 is another.
        assert_eq!(graph.num_edges(&uses), 2);
        assert_eq!(graph.num_edges(&uses.reverse()), 2);
        // One per transaction.
        assert_eq!(graph.num_edges(&makes), 3);
        assert_eq!(graph.num_edges(&from), 3);
        assert_eq!(graph.num_edges(&with), 3);
        // 4 relations, each with a reverse.
        assert_eq!(graph.num_edge_types(), 8);
    }

    #[test]
    fn test_edge_attributes_attached() {
        let tables = tables();
        let features = engineer_features(&tables);
        let graph = build_heterogeneous_graph(&tables, &features, None).unwrap();

        let makes = EdgeType::new("account", "makes", "transaction");
        let store = graph.edge_store(&makes).unwrap();
        assert_eq!(store.attr_dim(), 2);
        assert!((store.attr(0)[0] - 43.0f32.ln()).abs() < 1e-5); // ln(1+42)
    }

    #[test]
    fn test_labels_attached_and_unknown_skipped() {
        let tables = tables();
        let features = engineer_features(&tables);
        let labels = vec![
            LabelRecord {
                entity_id: "a1".to_string(),
                entity_kind: EntityKind::Account,
                is_fraud: true,
                fraud_type: Some("ring".to_string()),
            },
            LabelRecord {
                entity_id: "missing".to_string(),
                entity_kind: EntityKind::Account,
                is_fraud: true,
                fraud_type: None,
            },
            LabelRecord {
                entity_id: "m1".to_string(),
                entity_kind: EntityKind::Merchant,
                is_fraud: false,
                fraud_type: None,
            },
        ];
        let graph = build_heterogeneous_graph(&tables, &features, Some(&labels)).unwrap();

        let account = NodeType::new("account");
        let store = graph.node_store(&account).unwrap();
        let a1 = store.get_index("a1").unwrap();
        assert_eq!(store.label(a1), Some(true));
        assert_eq!(store.num_labeled(), 1);
    }

    #[test]
    fn test_dangling_references_skipped() {
        let mut tables = tables();
        tables
            .transactions
            .push(txn("t4", "ghost", "d1", "10.0.0.1", "m1"));
        let features = engineer_features(&tables);
        let graph = build_heterogeneous_graph(&tables, &features, None).unwrap();

        // t4 still gets a transaction node and its ip/merchant edges, but no
        // account edge.
        assert_eq!(graph.num_nodes(&NodeType::new("transaction")), 4);
        let makes = EdgeType::new("account", "makes", "transaction");
        let from = EdgeType::new("transaction", "from", "ip");
        assert_eq!(graph.num_edges(&makes), 3);
        assert_eq!(graph.num_edges(&from), 4);
        assert!(graph.validate().is_ok());
    }
}
