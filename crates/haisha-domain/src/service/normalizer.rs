//! Input normalization
//!
//! Turns the three raw input tables (route plan, driver roster, vehicle
//! inventory) plus the optional vehicle detail table into typed collections.
//! Column headers are resolved through the [`SynonymTable`] once per table;
//! a missing required column is the only fatal outcome.

use std::collections::{HashMap, HashSet};

use haisha_types::SchemaError;
use tracing::{debug, warn};

use crate::model::{
    normalize_label, CategoryMapping, DriverRoster, LogicalField, RawTable, ResourceDetails,
    ResourceItem, RouteRequirement, RunIssue, SynonymTable,
};

/// Operational status value used when none is configured
pub const DEFAULT_OPERATIONAL_VALUE: &str = "OPERATIONAL";

/// Immutable lookup tables and filter values for one normalizer
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Keep only routes of this provider; `None` keeps every route
    pub provider_filter: Option<String>,
    /// Status value that marks a vehicle as allocatable
    pub operational_value: String,
    pub category_mapping: CategoryMapping,
    pub synonyms: SynonymTable,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            provider_filter: None,
            operational_value: DEFAULT_OPERATIONAL_VALUE.to_string(),
            category_mapping: CategoryMapping::default(),
            synonyms: SynonymTable::default(),
        }
    }
}

/// Typed inputs for one allocation run
#[derive(Debug, Clone, Default)]
pub struct NormalizedInput {
    /// Routes of the configured provider, in plan order
    pub routes: Vec<RouteRequirement>,
    /// Plan rows dropped by the provider filter
    pub dropped_routes: usize,
    pub roster: DriverRoster,
    /// Every vehicle, operational or not, in inventory order
    pub inventory: Vec<ResourceItem>,
    pub issues: Vec<RunIssue>,
}

impl NormalizedInput {
    /// Vehicles eligible for allocation
    pub fn operational(&self) -> impl Iterator<Item = &ResourceItem> {
        self.inventory.iter().filter(|r| r.operational)
    }

    pub fn operational_count(&self) -> usize {
        self.operational().count()
    }
}

pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize all inputs of one run.
    ///
    /// Column resolution for every table happens before any row is read, so a
    /// schema problem in the inventory is reported even if the plan is fine.
    pub fn normalize(
        &self,
        route_plan: &RawTable,
        roster: &RawTable,
        inventory: &RawTable,
        details: Option<&RawTable>,
    ) -> Result<NormalizedInput, SchemaError> {
        let synonyms = &self.config.synonyms;
        synonyms.resolve(route_plan, ROUTE_REQUIRED, ROUTE_OPTIONAL)?;
        synonyms.resolve(roster, ROSTER_REQUIRED, &[])?;
        synonyms.resolve(inventory, INVENTORY_REQUIRED, &[])?;
        if let Some(details) = details {
            synonyms.resolve(details, DETAIL_REQUIRED, DETAIL_OPTIONAL)?;
        }

        let mut issues = Vec::new();
        let (routes, dropped_routes) = self.load_routes(route_plan, &mut issues)?;
        let roster = self.load_roster(roster)?;
        let inventory = self.load_inventory(inventory, details, &mut issues)?;

        Ok(NormalizedInput {
            routes,
            dropped_routes,
            roster,
            inventory,
            issues,
        })
    }

    /// Load routes of the configured provider; returns the routes and the dropped count
    pub fn load_routes(
        &self,
        table: &RawTable,
        issues: &mut Vec<RunIssue>,
    ) -> Result<(Vec<RouteRequirement>, usize), SchemaError> {
        let columns = self
            .config
            .synonyms
            .resolve(table, ROUTE_REQUIRED, ROUTE_OPTIONAL)?;
        let provider_filter = self
            .config
            .provider_filter
            .as_deref()
            .map(normalize_label)
            .filter(|p| !p.is_empty());

        let mut routes = Vec::new();
        let mut seen = HashSet::new();
        let mut dropped = 0;

        for row in &table.rows {
            let route_code = columns.value(row, LogicalField::RouteCode);
            if route_code.is_empty() {
                continue;
            }

            let provider = columns.value(row, LogicalField::Provider);
            if let Some(ref wanted) = provider_filter {
                if normalize_label(provider) != *wanted {
                    dropped += 1;
                    continue;
                }
            }

            if !seen.insert(route_code.to_string()) {
                warn!(route_code, "duplicate route code in plan, keeping the first row");
                issues.push(RunIssue::DuplicateRouteCode {
                    route_code: route_code.to_string(),
                });
                continue;
            }

            let service_type = columns.value(row, LogicalField::ServiceType);
            let required_category = self
                .config
                .category_mapping
                .category_for(service_type)
                .map(str::to_string);
            if required_category.is_none() {
                warn!(route_code, service_type, "service type has no category mapping");
                issues.push(RunIssue::CategoryUnresolved {
                    route_code: route_code.to_string(),
                    service_type: service_type.to_string(),
                });
            }

            routes.push(RouteRequirement {
                route_code: route_code.to_string(),
                service_type: service_type.to_string(),
                required_category,
                wave: columns.value(row, LogicalField::Wave).to_string(),
                staging_location: columns.value(row, LogicalField::StagingLocation).to_string(),
                provider: provider.to_string(),
            });
        }

        debug!(kept = routes.len(), dropped, "route plan loaded");
        Ok((routes, dropped))
    }

    pub fn load_roster(&self, table: &RawTable) -> Result<DriverRoster, SchemaError> {
        let columns = self.config.synonyms.resolve(table, ROSTER_REQUIRED, &[])?;

        let mut roster = DriverRoster::new();
        for row in &table.rows {
            let route_code = columns.value(row, LogicalField::RouteCode);
            let driver = columns.value(row, LogicalField::DriverName);
            if route_code.is_empty() || driver.is_empty() {
                continue;
            }
            if !roster.insert(route_code, driver) {
                debug!(route_code, "second roster entry for route ignored");
            }
        }
        Ok(roster)
    }

    /// Load the inventory and join optional detail rows by vehicle id
    pub fn load_inventory(
        &self,
        table: &RawTable,
        details: Option<&RawTable>,
        issues: &mut Vec<RunIssue>,
    ) -> Result<Vec<ResourceItem>, SchemaError> {
        let columns = self.config.synonyms.resolve(table, INVENTORY_REQUIRED, &[])?;
        let operational_value = normalize_label(&self.config.operational_value);

        let mut items: Vec<ResourceItem> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in &table.rows {
            let resource_id = columns.value(row, LogicalField::ResourceId);
            if resource_id.is_empty() {
                continue;
            }
            if index.contains_key(resource_id) {
                warn!(resource_id, "duplicate vehicle in inventory, keeping the first row");
                issues.push(RunIssue::DuplicateResourceRow {
                    resource_id: resource_id.to_string(),
                });
                continue;
            }

            let status = columns.value(row, LogicalField::Operational);
            index.insert(resource_id.to_string(), items.len());
            items.push(ResourceItem {
                resource_id: resource_id.to_string(),
                category: columns.value(row, LogicalField::Category).to_string(),
                operational: normalize_label(status) == operational_value,
                status: status.to_string(),
                details: ResourceDetails::default(),
            });
        }

        if let Some(details) = details {
            let columns = self
                .config
                .synonyms
                .resolve(details, DETAIL_REQUIRED, DETAIL_OPTIONAL)?;
            let mut joined = HashSet::new();

            for row in &details.rows {
                let resource_id = columns.value(row, LogicalField::ResourceId);
                if resource_id.is_empty() || !joined.insert(resource_id.to_string()) {
                    continue;
                }
                match index.get(resource_id) {
                    Some(&idx) => {
                        items[idx].details = ResourceDetails {
                            identification_code: columns
                                .optional(row, LogicalField::IdentificationCode),
                            tracking_device_code: columns
                                .optional(row, LogicalField::TrackingDeviceCode),
                            ownership: columns.optional(row, LogicalField::Ownership),
                        };
                    }
                    None => {
                        debug!(resource_id, "detail row without inventory entry");
                        issues.push(RunIssue::UnknownResourceDetail {
                            resource_id: resource_id.to_string(),
                        });
                    }
                }
            }
        }

        Ok(items)
    }
}

const ROUTE_REQUIRED: &[LogicalField] = &[
    LogicalField::RouteCode,
    LogicalField::ServiceType,
    LogicalField::Provider,
];
const ROUTE_OPTIONAL: &[LogicalField] = &[LogicalField::Wave, LogicalField::StagingLocation];
const ROSTER_REQUIRED: &[LogicalField] = &[LogicalField::RouteCode, LogicalField::DriverName];
const INVENTORY_REQUIRED: &[LogicalField] = &[
    LogicalField::ResourceId,
    LogicalField::Category,
    LogicalField::Operational,
];
const DETAIL_REQUIRED: &[LogicalField] = &[LogicalField::ResourceId];
const DETAIL_OPTIONAL: &[LogicalField] = &[
    LogicalField::IdentificationCode,
    LogicalField::TrackingDeviceCode,
    LogicalField::Ownership,
];
