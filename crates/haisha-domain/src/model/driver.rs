//! Driver roster (route code -> driver name)

use std::collections::HashMap;

/// Driver value used when the roster has no entry for a route
pub const UNASSIGNED_DRIVER: &str = "UNASSIGNED";

#[derive(Debug, Clone, Default)]
pub struct DriverRoster {
    drivers: HashMap<String, String>,
}

impl DriverRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver; the first entry for a route code wins
    pub fn insert(&mut self, route_code: &str, driver_name: &str) -> bool {
        if self.drivers.contains_key(route_code) {
            return false;
        }
        self.drivers
            .insert(route_code.to_string(), driver_name.to_string());
        true
    }

    pub fn driver_for(&self, route_code: &str) -> Option<&str> {
        self.drivers.get(route_code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DriverRoster {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut roster = DriverRoster::new();
        for (route, driver) in iter {
            roster.insert(&route.into(), &driver.into());
        }
        roster
    }
}
