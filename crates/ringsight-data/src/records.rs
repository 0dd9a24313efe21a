//! Typed rows for the raw entity tables.
//!
//! Field names match the CSV headers. Timestamps are RFC 3339
//! (`2024-03-01T12:00:00Z`); labels accept `true`/`false` as well as `1`/`0`.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use ringsight_core::EntityKind;

/// A single payment transaction, with foreign keys to the other entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique transaction identifier.
    pub transaction_id: String,
    /// Paying account.
    pub account_id: String,
    /// Device the transaction was made from.
    pub device_id: String,
    /// Originating IP address.
    pub ip_address: String,
    /// Receiving merchant.
    pub merchant_id: String,
    /// Amount in minor currency units.
    pub amount: f64,
    /// Transaction time.
    pub timestamp: DateTime<Utc>,
    /// Processor status (e.g. "approved", "declined").
    pub status: String,
}

/// A customer account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Unique account identifier.
    pub account_id: String,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
    /// Account type (e.g. "personal", "business").
    pub account_type: String,
    /// KYC status (e.g. "verified", "pending").
    pub verification_status: String,
    /// ISO country code.
    pub country: String,
}

/// A device observed on transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Unique device identifier.
    pub device_id: String,
    /// Device class (e.g. "mobile", "desktop").
    pub device_type: String,
    /// Operating system.
    pub os: String,
    /// Browser, if any.
    pub browser: String,
    /// Browser/device fingerprint hash, if collected.
    pub device_fingerprint: String,
}

/// A merchant receiving payments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantRecord {
    /// Unique merchant identifier.
    pub merchant_id: String,
    /// Display name.
    pub merchant_name: String,
    /// Category (e.g. "electronics", "gift_cards").
    pub merchant_category: String,
    /// ISO country code.
    pub country: String,
}

/// A fraud label for one entity. Labels are sparse: most entities have none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRecord {
    /// Labeled entity identifier.
    pub entity_id: String,
    /// Which entity table the id refers to.
    pub entity_kind: EntityKind,
    /// Confirmed fraud flag.
    #[serde(deserialize_with = "de_flag")]
    pub is_fraud: bool,
    /// Fraud typology, when known (e.g. "ring", "account_takeover").
    #[serde(default)]
    pub fraud_type: Option<String>,
}

/// Accept `true`/`false` and `1`/`0` for boolean CSV columns.
fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    match raw.trim() {
        "true" | "TRUE" | "True" | "1" => Ok(true),
        "false" | "FALSE" | "False" | "0" => Ok(false),
        other => Err(de::Error::custom(format!("invalid flag: {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_flag_parsing() {
        let csv_data = "entity_id,entity_kind,is_fraud,fraud_type\n\
                        a1,account,1,ring\n\
                        d1,device,false,\n";
        let mut reader = csv::Reader::from_reader(csv_data.as_bytes());
        let labels: Vec<LabelRecord> = reader.deserialize().map(|r| r.unwrap()).collect();

        assert_eq!(labels.len(), 2);
        assert!(labels[0].is_fraud);
        assert_eq!(labels[0].entity_kind, EntityKind::Account);
        assert_eq!(labels[0].fraud_type.as_deref(), Some("ring"));
        assert!(!labels[1].is_fraud);
        assert_eq!(labels[1].fraud_type, None);
    }

    #[test]
    fn test_transaction_timestamp_parsing() {
        let csv_data = "transaction_id,account_id,device_id,ip_address,merchant_id,amount,timestamp,status\n\
                        t1,a1,d1,10.0.0.1,m1,120.50,2024-03-01T12:00:00Z,approved\n";
        let mut reader = csv::Reader::from_reader(csv_data.as_bytes());
        let txns: Vec<TransactionRecord> = reader.deserialize().map(|r| r.unwrap()).collect();

        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].amount, 120.50);
        assert_eq!(txns[0].timestamp.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }
}
