//! Duplicate vehicle usage within one run

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Blocking,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Blocking => "blocking",
        }
    }
}

/// One competing assignment inside a conflict group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictEntry {
    pub route_code: String,
    pub driver_name: String,
}

/// All assignments that share one vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictGroup {
    pub resource_id: String,
    pub entries: Vec<ConflictEntry>,
}

impl ConflictGroup {
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn route_codes(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.route_code.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub severity: Severity,
    pub groups: Vec<ConflictGroup>,
}

impl ConflictReport {
    pub fn empty(severity: Severity) -> Self {
        Self {
            severity,
            groups: Vec::new(),
        }
    }

    pub fn has_conflicts(&self) -> bool {
        !self.groups.is_empty()
    }

    /// True when conflicts exist and the mode makes them fatal
    pub fn is_blocking(&self) -> bool {
        self.has_conflicts() && self.severity == Severity::Blocking
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
