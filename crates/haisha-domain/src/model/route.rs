//! Planned delivery route

use serde::{Deserialize, Serialize};

/// One route from the day's route plan, after provider filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequirement {
    pub route_code: String,
    /// Service type as written on the plan
    pub service_type: String,
    /// Derived from `service_type`; `None` when the mapping has no entry
    pub required_category: Option<String>,
    pub wave: String,
    pub staging_location: String,
    pub provider: String,
}

impl RouteRequirement {
    pub fn is_category_resolved(&self) -> bool {
        self.required_category.is_some()
    }
}
