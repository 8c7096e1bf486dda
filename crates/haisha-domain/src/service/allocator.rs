//! Route-to-vehicle allocation
//!
//! Strict first-available matching: vehicles are queued per category in
//! inventory order and each route, in plan order, takes the head of its
//! category's queue. No reordering, no location awareness.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{
    logical_id, Assignment, DriverRoster, ResourceItem, RouteRequirement, RunIssue,
    UNASSIGNED_DRIVER,
};

/// Why a route did not receive a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    /// No operational vehicle of the required category was left
    ResourceShortage,
    /// Service type could not be mapped to a category
    CategoryUnresolved,
}

impl UnmatchedReason {
    pub fn label(&self) -> &'static str {
        match self {
            UnmatchedReason::ResourceShortage => "resource shortage",
            UnmatchedReason::CategoryUnresolved => "category unresolved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedRoute {
    pub route: RouteRequirement,
    pub reason: UnmatchedReason,
}

/// Matches before driver lookup
#[derive(Debug, Clone, Default)]
pub struct Allocation {
    pub matches: Vec<(RouteRequirement, ResourceItem)>,
    pub unmatched: Vec<UnmatchedRoute>,
}

impl Allocation {
    pub fn unmatched_by(&self, reason: UnmatchedReason) -> usize {
        self.unmatched.iter().filter(|u| u.reason == reason).count()
    }
}

/// Vehicle queue entry with the number of routes it can still take
struct Slot<'a> {
    resource: &'a ResourceItem,
    remaining: usize,
}

pub struct Allocator {
    max_per_resource: usize,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Allocator {
    /// `max_per_resource` is clamped to at least 1
    pub fn new(max_per_resource: usize) -> Self {
        Self {
            max_per_resource: max_per_resource.max(1),
        }
    }

    pub fn max_per_resource(&self) -> usize {
        self.max_per_resource
    }

    /// Match routes to operational vehicles.
    ///
    /// Runs in O(routes + vehicles). Non-operational vehicles are ignored.
    pub fn allocate(&self, routes: &[RouteRequirement], resources: &[ResourceItem]) -> Allocation {
        let mut queues: HashMap<&str, VecDeque<Slot>> = HashMap::new();
        for resource in resources.iter().filter(|r| r.operational) {
            queues
                .entry(resource.category.as_str())
                .or_default()
                .push_back(Slot {
                    resource,
                    remaining: self.max_per_resource,
                });
        }

        let mut allocation = Allocation::default();
        for route in routes {
            let Some(category) = route.required_category.as_deref() else {
                allocation.unmatched.push(UnmatchedRoute {
                    route: route.clone(),
                    reason: UnmatchedReason::CategoryUnresolved,
                });
                continue;
            };

            let Some(queue) = queues.get_mut(category) else {
                allocation.unmatched.push(UnmatchedRoute {
                    route: route.clone(),
                    reason: UnmatchedReason::ResourceShortage,
                });
                continue;
            };

            match queue.front_mut() {
                Some(slot) => {
                    allocation.matches.push((route.clone(), slot.resource.clone()));
                    slot.remaining -= 1;
                    if slot.remaining == 0 {
                        queue.pop_front();
                    }
                }
                None => {
                    debug!(route_code = %route.route_code, category, "no vehicle left for category");
                    allocation.unmatched.push(UnmatchedRoute {
                        route: route.clone(),
                        reason: UnmatchedReason::ResourceShortage,
                    });
                }
            }
        }

        allocation
    }

    /// Attach drivers from the roster and build the final assignments.
    ///
    /// A route without a roster entry gets [`UNASSIGNED_DRIVER`] and a
    /// [`RunIssue::DriverUnresolved`].
    pub fn attach_drivers(
        &self,
        allocation: &Allocation,
        roster: &DriverRoster,
        run_date: NaiveDate,
    ) -> (Vec<Assignment>, Vec<RunIssue>) {
        let mut issues = Vec::new();
        let assignments = allocation
            .matches
            .iter()
            .map(|(route, resource)| {
                let driver_name = match roster.driver_for(&route.route_code) {
                    Some(name) => name.to_string(),
                    None => {
                        warn!(route_code = %route.route_code, "no driver on roster");
                        issues.push(RunIssue::DriverUnresolved {
                            route_code: route.route_code.clone(),
                        });
                        UNASSIGNED_DRIVER.to_string()
                    }
                };
                let category = route.required_category.clone().unwrap_or_default();
                Assignment {
                    run_date,
                    logical_id: logical_id(
                        run_date,
                        &route.route_code,
                        &driver_name,
                        &resource.resource_id,
                    ),
                    route_code: route.route_code.clone(),
                    service_type: route.service_type.clone(),
                    category,
                    resource_id: resource.resource_id.clone(),
                    driver_name,
                    wave: route.wave.clone(),
                    staging_location: route.staging_location.clone(),
                    provider: route.provider.clone(),
                }
            })
            .collect();
        (assignments, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceDetails;
    use std::collections::HashMap as Map;

    fn route(code: &str, category: Option<&str>) -> RouteRequirement {
        RouteRequirement {
            route_code: code.to_string(),
            service_type: "Standard Parcel".to_string(),
            required_category: category.map(str::to_string),
            wave: "10:20".to_string(),
            staging_location: "STG.A1".to_string(),
            provider: "ACME".to_string(),
        }
    }

    fn vehicle(id: &str, category: &str, operational: bool) -> ResourceItem {
        ResourceItem {
            resource_id: id.to_string(),
            category: category.to_string(),
            operational,
            status: if operational { "OPERATIONAL" } else { "GROUNDED" }.to_string(),
            details: ResourceDetails::default(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    #[test]
    fn test_fifo_within_category() {
        let routes = vec![route("CX1", Some("Large")), route("CX2", Some("Large"))];
        let resources = vec![
            vehicle("V1", "Large", true),
            vehicle("V2", "ExtraLarge", true),
            vehicle("V3", "Large", true),
        ];
        let allocation = Allocator::default().allocate(&routes, &resources);
        let pairs: Vec<_> = allocation
            .matches
            .iter()
            .map(|(r, v)| (r.route_code.as_str(), v.resource_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("CX1", "V1"), ("CX2", "V3")]);
        assert!(allocation.unmatched.is_empty());
    }

    #[test]
    fn test_scenario_a_shortage() {
        let routes = vec![
            route("CX1", Some("Large")),
            route("CX2", Some("Large")),
            route("CX3", Some("Large")),
        ];
        let resources = vec![
            vehicle("V1", "Large", true),
            vehicle("V2", "Large", true),
            vehicle("V3", "ExtraLarge", true),
        ];
        let allocation = Allocator::default().allocate(&routes, &resources);
        assert_eq!(allocation.matches.len(), 2);
        assert_eq!(allocation.unmatched.len(), 1);
        assert_eq!(allocation.unmatched[0].route.route_code, "CX3");
        assert_eq!(allocation.unmatched[0].reason, UnmatchedReason::ResourceShortage);
    }

    #[test]
    fn test_non_operational_never_assigned() {
        let routes = vec![route("CX1", Some("Large"))];
        let resources = vec![vehicle("V1", "Large", false)];
        let allocation = Allocator::default().allocate(&routes, &resources);
        assert!(allocation.matches.is_empty());
        assert_eq!(allocation.unmatched_by(UnmatchedReason::ResourceShortage), 1);
    }

    #[test]
    fn test_unresolved_category_is_unmatched() {
        let routes = vec![route("CX1", None), route("CX2", Some("Large"))];
        let resources = vec![vehicle("V1", "Large", true)];
        let allocation = Allocator::default().allocate(&routes, &resources);
        assert_eq!(allocation.matches.len(), 1);
        assert_eq!(allocation.unmatched[0].reason, UnmatchedReason::CategoryUnresolved);
    }

    #[test]
    fn test_zero_routes() {
        let allocation = Allocator::default().allocate(&[], &[vehicle("V1", "Large", true)]);
        assert!(allocation.matches.is_empty());
        assert!(allocation.unmatched.is_empty());
    }

    #[test]
    fn test_max_per_resource_two() {
        let routes = vec![
            route("CX1", Some("Large")),
            route("CX2", Some("Large")),
            route("CX3", Some("Large")),
        ];
        let resources = vec![vehicle("V1", "Large", true), vehicle("V2", "Large", true)];
        let allocation = Allocator::new(2).allocate(&routes, &resources);
        let ids: Vec<_> = allocation
            .matches
            .iter()
            .map(|(_, v)| v.resource_id.as_str())
            .collect();
        assert_eq!(ids, vec!["V1", "V1", "V2"]);
    }

    #[test]
    fn test_no_vehicle_used_beyond_limit() {
        let routes: Vec<_> = (0..50)
            .map(|i| route(&format!("CX{}", i), Some(if i % 3 == 0 { "ExtraLarge" } else { "Large" })))
            .collect();
        let resources: Vec<_> = (0..20)
            .map(|i| vehicle(&format!("V{}", i), if i % 2 == 0 { "Large" } else { "ExtraLarge" }, i % 5 != 0))
            .collect();
        let allocation = Allocator::default().allocate(&routes, &resources);

        let mut uses: Map<&str, usize> = Map::new();
        for (_, v) in &allocation.matches {
            *uses.entry(v.resource_id.as_str()).or_default() += 1;
        }
        assert!(uses.values().all(|&n| n == 1));
        assert_eq!(allocation.matches.len() + allocation.unmatched.len(), routes.len());
    }

    #[test]
    fn test_attach_drivers_with_placeholder() {
        let routes = vec![route("CX1", Some("Large")), route("CX2", Some("Large"))];
        let resources = vec![vehicle("V1", "Large", true), vehicle("V2", "Large", true)];
        let allocator = Allocator::default();
        let allocation = allocator.allocate(&routes, &resources);
        let roster: DriverRoster = [("CX1", "Sato")].into_iter().collect();

        let (assignments, issues) = allocator.attach_drivers(&allocation, &roster, date());
        assert_eq!(assignments[0].driver_name, "Sato");
        assert_eq!(assignments[0].logical_id, "2024-05-06|CX1|Sato|V1");
        assert_eq!(assignments[1].driver_name, UNASSIGNED_DRIVER);
        assert!(assignments[1].is_driver_missing());
        assert_eq!(
            issues,
            vec![RunIssue::DriverUnresolved {
                route_code: "CX2".to_string()
            }]
        );
    }
}
