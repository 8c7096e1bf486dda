//! Operational vehicles left without a route

use serde::{Deserialize, Serialize};

use super::resource::ResourceDetails;

/// Days since a vehicle last appeared in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum LastSeen {
    Days(i64),
    NoHistory,
}

impl std::fmt::Display for LastSeen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LastSeen::Days(d) => write!(f, "{}", d),
            LastSeen::NoHistory => write!(f, "no history"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnassignedItem {
    pub resource_id: String,
    pub category: String,
    pub details: ResourceDetails,
    pub last_seen: LastSeen,
}
