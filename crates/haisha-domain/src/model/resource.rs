//! Allocatable vehicles

use serde::{Deserialize, Serialize};

/// Secondary attributes joined from the resource detail table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDetails {
    /// VIN or license plate
    pub identification_code: Option<String>,
    pub tracking_device_code: Option<String>,
    /// e.g. "Owned", "Rental"
    pub ownership: Option<String>,
}

/// One vehicle from the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceItem {
    pub resource_id: String,
    pub category: String,
    /// True when the status matched the configured operational value
    pub operational: bool,
    /// Status text as written in the inventory
    pub status: String,
    #[serde(default)]
    pub details: ResourceDetails,
}
