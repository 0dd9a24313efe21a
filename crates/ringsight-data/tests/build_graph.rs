//! End-to-end test: CSV files on disk to a validated heterogeneous graph.

use ringsight_core::NodeType;
use ringsight_data::{graph_builder, loaders, preprocess};
use std::fs;

fn write_fixture(dir: &std::path::Path) {
    fs::write(
        dir.join("transactions.csv"),
        "transaction_id,account_id,device_id,ip_address,merchant_id,amount,timestamp,status\n\
         t1,a1,d1,10.0.0.1,m1,100.0,2024-03-01T10:00:00Z,approved\n\
         t2,a2,d1,10.0.0.1,m1,250.0,2024-03-01T11:00:00Z,approved\n\
         t3,a3,d2,10.0.0.2,m2,12.5,2024-03-02T09:00:00Z,declined\n\
         t3,a3,d2,10.0.0.2,m2,12.5,2024-03-02T09:00:00Z,declined\n",
    )
    .unwrap();
    fs::write(
        dir.join("accounts.csv"),
        "account_id,created_at,account_type,verification_status,country\n\
         a1,2023-01-01T00:00:00Z,personal,verified,DE\n\
         a2,2024-02-20T00:00:00Z,personal,pending,DE\n\
         a3,2023-08-15T00:00:00Z,business,verified,FR\n",
    )
    .unwrap();
    fs::write(
        dir.join("devices.csv"),
        "device_id,device_type,os,browser,device_fingerprint\n\
         d1,mobile,android,chrome,fp1\n\
         d2,desktop,windows,firefox,fp2\n",
    )
    .unwrap();
    fs::write(
        dir.join("merchants.csv"),
        "merchant_id,merchant_name,merchant_category,country\n\
         m1,GiftHub,gift_cards,US\n\
         m2,Groceries,food,DE\n",
    )
    .unwrap();
    fs::write(
        dir.join("labels.csv"),
        "entity_id,entity_kind,is_fraud,fraud_type\n\
         a1,account,1,ring\n\
         a2,account,1,ring\n\
         a3,account,0,\n\
         d1,device,1,ring\n",
    )
    .unwrap();
}

#[test]
fn test_csv_to_graph() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());

    let data = loaders::load_all(dir.path()).unwrap();
    assert_eq!(data.tables.transactions.len(), 4); // duplicate still raw here

    let (tables, report) = preprocess::clean_tables(data.tables);
    assert_eq!(report.transactions_dropped, 1);
    assert_eq!(tables.transactions.len(), 3);

    let features = preprocess::engineer_features(&tables);
    let graph =
        graph_builder::build_heterogeneous_graph(&tables, &features, data.labels.as_deref())
            .unwrap();

    assert_eq!(graph.num_nodes(&NodeType::new("account")), 3);
    assert_eq!(graph.num_nodes(&NodeType::new("device")), 2);
    assert_eq!(graph.num_nodes(&NodeType::new("ip")), 2);
    assert_eq!(graph.num_nodes(&NodeType::new("transaction")), 3);
    assert_eq!(graph.num_nodes(&NodeType::new("merchant")), 2);

    // Labels landed on both labelable types.
    let accounts = graph.node_store(&NodeType::new("account")).unwrap();
    assert_eq!(accounts.num_labeled(), 3);
    let devices = graph.node_store(&NodeType::new("device")).unwrap();
    assert_eq!(devices.num_labeled(), 1);

    // The graph is ready for the model: features on every node type.
    for nt in ["account", "device", "ip", "transaction", "merchant"] {
        let store = graph.node_store(&NodeType::new(nt)).unwrap();
        assert!(store.feature_dim() > 0, "{nt} has no features");
    }
}
