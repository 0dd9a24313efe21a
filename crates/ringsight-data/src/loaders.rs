//! CSV loaders for the raw entity tables.
//!
//! Each loader reads a headered CSV file into typed records. File names under
//! a data directory follow the conventional layout used by [`load_all`]:
//!
//! ```text
//! data/
//!   transactions.csv
//!   accounts.csv
//!   devices.csv
//!   merchants.csv
//!   labels.csv        (optional)
//! ```

use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};
use crate::records::{
    AccountRecord, DeviceRecord, LabelRecord, MerchantRecord, TransactionRecord,
};

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| Error::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: T = record.map_err(|source| Error::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Load transaction records.
pub fn load_transactions(path: impl AsRef<Path>) -> Result<Vec<TransactionRecord>> {
    read_csv(path.as_ref())
}

/// Load account records.
pub fn load_accounts(path: impl AsRef<Path>) -> Result<Vec<AccountRecord>> {
    read_csv(path.as_ref())
}

/// Load device records.
pub fn load_devices(path: impl AsRef<Path>) -> Result<Vec<DeviceRecord>> {
    read_csv(path.as_ref())
}

/// Load merchant records.
pub fn load_merchants(path: impl AsRef<Path>) -> Result<Vec<MerchantRecord>> {
    read_csv(path.as_ref())
}

/// Load fraud labels. Unlabeled datasets simply omit the file.
pub fn load_labels(path: impl AsRef<Path>) -> Result<Vec<LabelRecord>> {
    read_csv(path.as_ref())
}

/// The four entity tables, before cleaning.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    /// Transaction rows.
    pub transactions: Vec<TransactionRecord>,
    /// Account rows.
    pub accounts: Vec<AccountRecord>,
    /// Device rows.
    pub devices: Vec<DeviceRecord>,
    /// Merchant rows.
    pub merchants: Vec<MerchantRecord>,
}

/// Everything [`load_all`] reads from a data directory.
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    /// The four entity tables.
    pub tables: RawTables,
    /// Fraud labels, when `labels.csv` is present.
    pub labels: Option<Vec<LabelRecord>>,
}

/// Load all tables from a directory using the conventional file names.
pub fn load_all(data_dir: impl AsRef<Path>) -> Result<LoadedData> {
    let dir = data_dir.as_ref();

    let tables = RawTables {
        transactions: load_transactions(dir.join("transactions.csv"))?,
        accounts: load_accounts(dir.join("accounts.csv"))?,
        devices: load_devices(dir.join("devices.csv"))?,
        merchants: load_merchants(dir.join("merchants.csv"))?,
    };

    let labels_path = dir.join("labels.csv");
    let labels = if labels_path.exists() {
        Some(load_labels(&labels_path)?)
    } else {
        None
    };

    info!(
        transactions = tables.transactions.len(),
        accounts = tables.accounts.len(),
        devices = tables.devices.len(),
        merchants = tables.merchants.len(),
        labels = labels.as_ref().map_or(0, Vec::len),
        "loaded data tables"
    );

    Ok(LoadedData { tables, labels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("transactions.csv"),
            "transaction_id,account_id,device_id,ip_address,merchant_id,amount,timestamp,status\n\
             t1,a1,d1,10.0.0.1,m1,50.0,2024-03-01T10:00:00Z,approved\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("accounts.csv"),
            "account_id,created_at,account_type,verification_status,country\n\
             a1,2023-01-01T00:00:00Z,personal,verified,DE\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("devices.csv"),
            "device_id,device_type,os,browser,device_fingerprint\n\
             d1,mobile,android,chrome,fp1\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("merchants.csv"),
            "merchant_id,merchant_name,merchant_category,country\n\
             m1,Shop,electronics,DE\n",
        )
        .unwrap();

        let data = load_all(dir.path()).unwrap();
        assert_eq!(data.tables.transactions.len(), 1);
        assert_eq!(data.tables.accounts.len(), 1);
        assert!(data.labels.is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_transactions(dir.path().join("transactions.csv")).unwrap_err();
        assert!(err.to_string().contains("transactions.csv"));
    }

    #[test]
    fn test_malformed_row_reports_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.csv");
        fs::write(
            &path,
            "transaction_id,account_id,device_id,ip_address,merchant_id,amount,timestamp,status\n\
             t1,a1,d1,10.0.0.1,m1,not_a_number,2024-03-01T10:00:00Z,approved\n",
        )
        .unwrap();

        let err = load_transactions(&path).unwrap_err();
        assert!(matches!(err, Error::Csv { .. }));
    }
}
