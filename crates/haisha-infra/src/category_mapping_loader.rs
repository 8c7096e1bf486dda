//! Category mapping loaded from TOML
//!
//! ```toml
//! [[categories]]
//! service_type = "Standard Parcel - Extra Large Van"
//! category = "ExtraLarge"
//! ```

use std::fs;
use std::path::Path;

use haisha_domain::model::CategoryMapping;
use haisha_types::{ConfigError, Error, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CategoryMappingFile {
    /// Start from the built-in mapping instead of an empty one
    #[serde(default)]
    extend_defaults: bool,
    #[serde(default)]
    categories: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    service_type: String,
    category: String,
}

/// Load a category mapping file
pub fn load_category_mapping(path: &Path) -> Result<CategoryMapping> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(ConfigError::ParseError(format!(
            "Failed to read category mapping {}: {}",
            path.display(),
            e
        )))
    })?;
    parse_category_mapping(&content)
}

pub fn parse_category_mapping(toml_content: &str) -> Result<CategoryMapping> {
    let file: CategoryMappingFile = toml::from_str(toml_content).map_err(|e| {
        Error::Config(ConfigError::ParseError(format!(
            "Failed to parse category mapping TOML: {}",
            e
        )))
    })?;

    let mut mapping = if file.extend_defaults {
        CategoryMapping::default()
    } else {
        CategoryMapping::empty()
    };
    for entry in file.categories {
        if entry.service_type.trim().is_empty() || entry.category.trim().is_empty() {
            return Err(Error::Config(ConfigError::InvalidValue(format!(
                "category mapping entry with blank field: '{}' -> '{}'",
                entry.service_type, entry.category
            ))));
        }
        mapping.insert(&entry.service_type, entry.category);
    }
    Ok(mapping)
}
