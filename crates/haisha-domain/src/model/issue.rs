//! Non-fatal conditions collected during a run

use serde::{Deserialize, Serialize};

/// A per-row problem that did not abort the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunIssue {
    /// Service type has no category mapping; the route went unmatched
    CategoryUnresolved { route_code: String, service_type: String },
    /// No roster entry; the placeholder driver was used
    DriverUnresolved { route_code: String },
    /// Route code appeared more than once in the plan; later rows ignored
    DuplicateRouteCode { route_code: String },
    /// Vehicle appeared more than once in the inventory; later rows ignored
    DuplicateResourceRow { resource_id: String },
    /// Detail row for a vehicle that is not in the inventory
    UnknownResourceDetail { resource_id: String },
}

impl RunIssue {
    pub fn label(&self) -> &'static str {
        match self {
            RunIssue::CategoryUnresolved { .. } => "CategoryUnresolved",
            RunIssue::DriverUnresolved { .. } => "DriverUnresolved",
            RunIssue::DuplicateRouteCode { .. } => "DuplicateRouteCode",
            RunIssue::DuplicateResourceRow { .. } => "DuplicateResourceRow",
            RunIssue::UnknownResourceDetail { .. } => "UnknownResourceDetail",
        }
    }

    /// Route code or vehicle id the issue refers to
    pub fn subject(&self) -> &str {
        match self {
            RunIssue::CategoryUnresolved { route_code, .. }
            | RunIssue::DriverUnresolved { route_code }
            | RunIssue::DuplicateRouteCode { route_code } => route_code,
            RunIssue::DuplicateResourceRow { resource_id }
            | RunIssue::UnknownResourceDetail { resource_id } => resource_id,
        }
    }
}

impl std::fmt::Display for RunIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunIssue::CategoryUnresolved { route_code, service_type } => write!(
                f,
                "route {}: service type '{}' has no category mapping",
                route_code, service_type
            ),
            RunIssue::DriverUnresolved { route_code } => {
                write!(f, "route {}: no driver on the roster", route_code)
            }
            RunIssue::DuplicateRouteCode { route_code } => {
                write!(f, "route {}: listed more than once in the plan", route_code)
            }
            RunIssue::DuplicateResourceRow { resource_id } => {
                write!(f, "vehicle {}: listed more than once in the inventory", resource_id)
            }
            RunIssue::UnknownResourceDetail { resource_id } => {
                write!(f, "vehicle {}: detail row has no inventory entry", resource_id)
            }
        }
    }
}
