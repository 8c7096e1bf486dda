//! Service type -> vehicle category mapping

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::schema::normalize_label;

/// Built-in mapping for the service types that appear on daily route plans
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Standard Parcel", "Large"),
    ("Standard Parcel - Large Van", "Large"),
    ("Standard Parcel - Extra Large Van", "ExtraLarge"),
    ("Standard Parcel - Custom Delivery Van", "CDV"),
    ("Standard Parcel Electric", "EV"),
    ("Standard Parcel Electric - Rivian MEDIUM", "EV"),
    ("Nursery Route Level 1", "Large"),
    ("Nursery Route Level 2", "Large"),
    ("AmFlex Large Vehicle", "ExtraLarge"),
];

/// Free-text service type to required category.
///
/// Keys are matched after [`normalize_label`], so case and spacing in the
/// route plan do not matter. There is no fallback category: an unknown service
/// type stays unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMapping {
    entries: BTreeMap<String, String>,
}

impl Default for CategoryMapping {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_CATEGORIES.iter().copied())
    }
}

impl CategoryMapping {
    /// Empty mapping (every service type unresolved)
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut mapping = Self::empty();
        for (service_type, category) in pairs {
            mapping.insert(service_type.as_ref(), category);
        }
        mapping
    }

    pub fn insert(&mut self, service_type: &str, category: impl Into<String>) {
        self.entries
            .insert(normalize_label(service_type), category.into().trim().to_string());
    }

    pub fn category_for(&self, service_type: &str) -> Option<&str> {
        self.entries
            .get(&normalize_label(service_type))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as (normalized service type, category)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
