//! Fraud-ring types.

use serde::{Deserialize, Serialize};

use crate::hetero::{NodeType, TypedNodeIndex};

/// A member of a fraud ring.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RingMember {
    /// Node type of the member.
    pub node_type: NodeType,
    /// Index within the node type's store.
    pub index: TypedNodeIndex,
    /// Entity identifier.
    pub entity_id: String,
}

/// A predicted cluster of entities believed to collude.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudRing {
    /// Stable identifier within one prediction run (0-based, ordered by risk).
    pub ring_id: usize,
    /// Ring members.
    pub members: Vec<RingMember>,
    /// Aggregate risk: mean fraud probability over members.
    pub risk_score: f32,
    /// Confidence: minimum member fraud probability (the weakest link).
    pub confidence: f32,
}

impl FraudRing {
    /// Number of members.
    pub fn size(&self) -> usize {
        self.members.len()
    }
}
