//! Entity identifiers and kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hetero::NodeType;

/// Unique identifier for an entity (account, device, IP, transaction, merchant).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    /// Create a new entity ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The kind of entity a record or label refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A customer account.
    Account,
    /// A physical or virtual device.
    Device,
    /// An IP address observed on transactions.
    Ip,
    /// A single payment transaction.
    Transaction,
    /// A merchant receiving payments.
    Merchant,
}

impl EntityKind {
    /// All entity kinds, in canonical order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Account,
        EntityKind::Device,
        EntityKind::Ip,
        EntityKind::Transaction,
        EntityKind::Merchant,
    ];

    /// The canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Account => "account",
            EntityKind::Device => "device",
            EntityKind::Ip => "ip",
            EntityKind::Transaction => "transaction",
            EntityKind::Merchant => "merchant",
        }
    }

    /// Parse from a (case-insensitive) name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "account" => Some(EntityKind::Account),
            "device" => Some(EntityKind::Device),
            "ip" => Some(EntityKind::Ip),
            "transaction" => Some(EntityKind::Transaction),
            "merchant" => Some(EntityKind::Merchant),
            _ => None,
        }
    }

    /// The node type used for this kind in a [`crate::HeteroGraph`].
    pub fn node_type(self) -> NodeType {
        NodeType::new(self.as_str())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
