//! Table cleaning and per-entity feature engineering.
//!
//! Cleaning removes duplicate and invalid rows; feature engineering turns
//! each entity into a fixed-order `Vec<f32>`, combining raw attributes with
//! behavioral aggregates (transaction counts, amount statistics, cross-entity
//! diversity). Feature order is part of each function's contract: the graph
//! stores the vectors verbatim and the model reads dimensions from the graph.

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::loaders::RawTables;
use crate::records::{
    AccountRecord, DeviceRecord, MerchantRecord, TransactionRecord,
};

/// Cleaned entity tables.
#[derive(Debug, Clone, Default)]
pub struct CleanTables {
    /// Deduplicated, validated transactions.
    pub transactions: Vec<TransactionRecord>,
    /// Deduplicated accounts.
    pub accounts: Vec<AccountRecord>,
    /// Deduplicated devices.
    pub devices: Vec<DeviceRecord>,
    /// Deduplicated merchants.
    pub merchants: Vec<MerchantRecord>,
}

/// Rows dropped during cleaning, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Transactions dropped (duplicates, bad amounts, empty keys).
    pub transactions_dropped: usize,
    /// Accounts dropped.
    pub accounts_dropped: usize,
    /// Devices dropped.
    pub devices_dropped: usize,
    /// Merchants dropped.
    pub merchants_dropped: usize,
}

impl CleanReport {
    /// Total rows dropped across tables.
    pub fn total(&self) -> usize {
        self.transactions_dropped
            + self.accounts_dropped
            + self.devices_dropped
            + self.merchants_dropped
    }
}

fn dedupe_by_id<T>(rows: Vec<T>, id_of: impl Fn(&T) -> &str) -> (Vec<T>, usize) {
    let mut seen = HashSet::new();
    let before = rows.len();
    let kept: Vec<T> = rows
        .into_iter()
        .filter(|row| {
            let id = id_of(row);
            !id.is_empty() && seen.insert(id.to_string())
        })
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Clean and validate the raw tables.
///
/// - duplicate primary ids keep the first occurrence;
/// - rows with empty primary ids are dropped;
/// - transactions additionally require finite, non-negative amounts and
///   non-empty foreign keys.
pub fn clean_tables(raw: RawTables) -> (CleanTables, CleanReport) {
    let mut report = CleanReport::default();

    let (accounts, dropped) = dedupe_by_id(raw.accounts, |a| &a.account_id);
    report.accounts_dropped = dropped;

    let (devices, dropped) = dedupe_by_id(raw.devices, |d| &d.device_id);
    report.devices_dropped = dropped;

    let (merchants, dropped) = dedupe_by_id(raw.merchants, |m| &m.merchant_id);
    report.merchants_dropped = dropped;

    let before = raw.transactions.len();
    let mut seen = HashSet::new();
    let transactions: Vec<TransactionRecord> = raw
        .transactions
        .into_iter()
        .filter(|t| {
            !t.transaction_id.is_empty()
                && t.amount.is_finite()
                && t.amount >= 0.0
                && !t.account_id.is_empty()
                && !t.device_id.is_empty()
                && !t.ip_address.is_empty()
                && !t.merchant_id.is_empty()
                && seen.insert(t.transaction_id.clone())
        })
        .collect();
    report.transactions_dropped = before - transactions.len();

    if report.total() > 0 {
        info!(
            transactions = report.transactions_dropped,
            accounts = report.accounts_dropped,
            devices = report.devices_dropped,
            merchants = report.merchants_dropped,
            "dropped rows during cleaning"
        );
    }

    (
        CleanTables {
            transactions,
            accounts,
            devices,
            merchants,
        },
        report,
    )
}

/// A feature table: entity ids with one feature row each.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    /// Entity ids, parallel to `rows`.
    pub ids: Vec<String>,
    /// Feature vectors, all of dimension `dim`.
    pub rows: Vec<Vec<f32>>,
    /// Feature dimension.
    pub dim: usize,
}

impl FeatureTable {
    fn push(&mut self, id: String, row: Vec<f32>) {
        debug_assert!(self.rows.is_empty() || row.len() == self.dim);
        self.dim = row.len();
        self.ids.push(id);
        self.rows.push(row);
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Feature tables for all five node types.
#[derive(Debug, Clone, Default)]
pub struct FeatureTables {
    /// Transaction features.
    pub transactions: FeatureTable,
    /// Account features.
    pub accounts: FeatureTable,
    /// Device features.
    pub devices: FeatureTable,
    /// IP features (ids are the distinct `ip_address` values, first-seen order).
    pub ips: FeatureTable,
    /// Merchant features.
    pub merchants: FeatureTable,
}

#[derive(Default)]
struct AccountAgg {
    count: usize,
    sum: f64,
    sum_sq: f64,
    max: f64,
    devices: HashSet<String>,
    ips: HashSet<String>,
}

impl AccountAgg {
    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    fn std(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_sq / self.count as f64 - mean * mean).max(0.0).sqrt()
    }
}

#[derive(Default)]
struct DeviceAgg {
    count: usize,
    accounts: HashSet<String>,
}

#[derive(Default)]
struct IpAgg {
    count: usize,
    accounts: HashSet<String>,
    devices: HashSet<String>,
}

#[derive(Default)]
struct MerchantAgg {
    count: usize,
    sum: f64,
    accounts: HashSet<String>,
}

fn ln1p(x: f64) -> f32 {
    (x.max(0.0)).ln_1p() as f32
}

fn flag(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// The dataset's reference "now": the latest transaction timestamp, falling
/// back to the latest account creation time for transaction-less datasets.
pub fn reference_time(tables: &CleanTables) -> DateTime<Utc> {
    tables
        .transactions
        .iter()
        .map(|t| t.timestamp)
        .chain(tables.accounts.iter().map(|a| a.created_at))
        .max()
        .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH)
}

/// Merchant categories treated as elevated-risk.
const HIGH_RISK_CATEGORIES: [&str; 3] = ["gift_cards", "crypto", "gambling"];

/// Engineer feature vectors for every entity type.
///
/// Feature layouts (order is contractual):
///
/// | type        | features |
/// |-------------|----------|
/// | transaction | ln1p(amount), hour sin/cos, weekday sin/cos, approved, account amount z-score, round amount |
/// | account     | ln1p(age days), verified, business, ln1p(txns), ln1p(amount mean), ln1p(amount max), ln1p(devices), ln1p(ips) |
/// | device      | ln1p(txns), ln1p(accounts), mobile os, has browser, has fingerprint, account share |
/// | ip          | ln1p(txns), ln1p(accounts), ln1p(devices), shared flag |
/// | merchant    | ln1p(txns), ln1p(amount mean), ln1p(accounts), high-risk category, country known |
pub fn engineer_features(tables: &CleanTables) -> FeatureTables {
    let now = reference_time(tables);

    // Behavioral aggregates from the transaction table.
    let mut account_agg: HashMap<&str, AccountAgg> = HashMap::new();
    let mut device_agg: HashMap<&str, DeviceAgg> = HashMap::new();
    let mut ip_agg: HashMap<&str, IpAgg> = HashMap::new();
    let mut ip_order: Vec<&str> = Vec::new();
    let mut merchant_agg: HashMap<&str, MerchantAgg> = HashMap::new();

    for t in &tables.transactions {
        let acct = account_agg.entry(&t.account_id).or_default();
        acct.count += 1;
        acct.sum += t.amount;
        acct.sum_sq += t.amount * t.amount;
        acct.max = acct.max.max(t.amount);
        acct.devices.insert(t.device_id.clone());
        acct.ips.insert(t.ip_address.clone());

        let dev = device_agg.entry(&t.device_id).or_default();
        dev.count += 1;
        dev.accounts.insert(t.account_id.clone());

        if !ip_agg.contains_key(t.ip_address.as_str()) {
            ip_order.push(&t.ip_address);
        }
        let ip = ip_agg.entry(&t.ip_address).or_default();
        ip.count += 1;
        ip.accounts.insert(t.account_id.clone());
        ip.devices.insert(t.device_id.clone());

        let m = merchant_agg.entry(&t.merchant_id).or_default();
        m.count += 1;
        m.sum += t.amount;
        m.accounts.insert(t.account_id.clone());
    }

    let mut out = FeatureTables::default();

    for t in &tables.transactions {
        let agg = &account_agg[t.account_id.as_str()];
        let hour = f64::from(t.timestamp.hour());
        let dow = f64::from(t.timestamp.weekday().num_days_from_monday());
        let hour_angle = hour / 24.0 * std::f64::consts::TAU;
        let dow_angle = dow / 7.0 * std::f64::consts::TAU;
        let z = ((t.amount - agg.mean()) / (agg.std() + 1e-6)).clamp(-5.0, 5.0);

        out.transactions.push(
            t.transaction_id.clone(),
            vec![
                ln1p(t.amount),
                hour_angle.sin() as f32,
                hour_angle.cos() as f32,
                dow_angle.sin() as f32,
                dow_angle.cos() as f32,
                flag(t.status == "approved"),
                z as f32,
                flag(t.amount.fract() == 0.0),
            ],
        );
    }

    for a in &tables.accounts {
        let agg = account_agg.get(a.account_id.as_str());
        let age_days = (now - a.created_at).num_days().max(0) as f64;
        let (count, mean, max, devices, ips) = agg.map_or((0.0, 0.0, 0.0, 0.0, 0.0), |g| {
            (
                g.count as f64,
                g.mean(),
                g.max,
                g.devices.len() as f64,
                g.ips.len() as f64,
            )
        });

        out.accounts.push(
            a.account_id.clone(),
            vec![
                ln1p(age_days),
                flag(a.verification_status == "verified"),
                flag(a.account_type == "business"),
                ln1p(count),
                ln1p(mean),
                ln1p(max),
                ln1p(devices),
                ln1p(ips),
            ],
        );
    }

    for d in &tables.devices {
        let agg = device_agg.get(d.device_id.as_str());
        let (count, accounts) =
            agg.map_or((0.0, 0.0), |g| (g.count as f64, g.accounts.len() as f64));

        out.devices.push(
            d.device_id.clone(),
            vec![
                ln1p(count),
                ln1p(accounts),
                flag(d.os == "android" || d.os == "ios"),
                flag(!d.browser.is_empty()),
                flag(!d.device_fingerprint.is_empty()),
                (accounts / (count + 1.0)) as f32,
            ],
        );
    }

    for ip in &ip_order {
        let agg = &ip_agg[*ip];
        out.ips.push(
            (*ip).to_string(),
            vec![
                ln1p(agg.count as f64),
                ln1p(agg.accounts.len() as f64),
                ln1p(agg.devices.len() as f64),
                flag(agg.accounts.len() >= 2),
            ],
        );
    }

    for m in &tables.merchants {
        let agg = merchant_agg.get(m.merchant_id.as_str());
        let (count, mean, accounts) = agg.map_or((0.0, 0.0, 0.0), |g| {
            let mean = if g.count == 0 { 0.0 } else { g.sum / g.count as f64 };
            (g.count as f64, mean, g.accounts.len() as f64)
        });

        out.merchants.push(
            m.merchant_id.clone(),
            vec![
                ln1p(count),
                ln1p(mean),
                ln1p(accounts),
                flag(HIGH_RISK_CATEGORIES.contains(&m.merchant_category.as_str())),
                flag(!m.country.is_empty()),
            ],
        );
    }

    debug!(
        transactions = out.transactions.len(),
        accounts = out.accounts.len(),
        devices = out.devices.len(),
        ips = out.ips.len(),
        merchants = out.merchants.len(),
        "engineered features"
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn txn(id: &str, account: &str, device: &str, ip: &str, merchant: &str, amount: f64) -> TransactionRecord {
        TransactionRecord {
            transaction_id: id.to_string(),
            account_id: account.to_string(),
            device_id: device.to_string(),
            ip_address: ip.to_string(),
            merchant_id: merchant.to_string(),
            amount,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            status: "approved".to_string(),
        }
    }

    fn account(id: &str) -> AccountRecord {
        AccountRecord {
            account_id: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            account_type: "personal".to_string(),
            verification_status: "verified".to_string(),
            country: "DE".to_string(),
        }
    }

    fn sample_tables() -> RawTables {
        RawTables {
            transactions: vec![
                txn("t1", "a1", "d1", "10.0.0.1", "m1", 100.0),
                txn("t2", "a1", "d1", "10.0.0.2", "m1", 50.0),
                txn("t3", "a2", "d1", "10.0.0.1", "m1", 75.5),
            ],
            accounts: vec![account("a1"), account("a2")],
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
                merchant_category: "gift_cards".to_string(),
                country: "DE".to_string(),
            }],
        }
    }

    #[test]
    fn test_clean_drops_duplicates_and_invalid() {
        let mut raw = sample_tables();
        raw.transactions.push(txn("t1", "a1", "d1", "10.0.0.1", "m1", 100.0)); // dup
        raw.transactions.push(txn("t4", "a1", "d1", "10.0.0.1", "m1", -5.0)); // bad amount
        raw.transactions.push(txn("t5", "", "d1", "10.0.0.1", "m1", 5.0)); // empty fk
        raw.accounts.push(account("a1")); // dup

        let (tables, report) = clean_tables(raw);
        assert_eq!(tables.transactions.len(), 3);
        assert_eq!(tables.accounts.len(), 2);
        assert_eq!(report.transactions_dropped, 3);
        assert_eq!(report.accounts_dropped, 1);
        assert_eq!(report.total(), 4);
    }

    #[test]
    fn test_feature_dimensions() {
        let (tables, _) = clean_tables(sample_tables());
        let features = engineer_features(&tables);

        assert_eq!(features.transactions.dim, 8);
        assert_eq!(features.accounts.dim, 8);
        assert_eq!(features.devices.dim, 6);
        assert_eq!(features.ips.dim, 4);
        assert_eq!(features.merchants.dim, 5);

        assert_eq!(features.transactions.len(), 3);
        assert_eq!(features.ips.len(), 2);
        assert_eq!(features.ips.ids, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn test_account_aggregates() {
        let (tables, _) = clean_tables(sample_tables());
        let features = engineer_features(&tables);

        // a1 made 2 transactions on 1 device and 2 ips.
        let a1 = &features.accounts.rows[0];
        assert!((a1[3] - (1.0f64 + 2.0).ln() as f32).abs() < 1e-6); // ln1p(2 txns)
        assert!((a1[6] - (1.0f64 + 1.0).ln() as f32).abs() < 1e-6); // ln1p(1 device)
        assert!((a1[7] - (1.0f64 + 2.0).ln() as f32).abs() < 1e-6); // ln1p(2 ips)
    }

    #[test]
    fn test_shared_ip_flag() {
        let (tables, _) = clean_tables(sample_tables());
        let features = engineer_features(&tables);

        // 10.0.0.1 is used by a1 and a2; 10.0.0.2 only by a1.
        assert_eq!(features.ips.rows[0][3], 1.0);
        assert_eq!(features.ips.rows[1][3], 0.0);
    }

    #[test]
    fn test_reference_time_is_latest_transaction() {
        let (tables, _) = clean_tables(sample_tables());
        assert_eq!(
            reference_time(&tables),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        );
    }
}
