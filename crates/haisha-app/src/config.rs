//! Configuration management for haisha
//!
//! Config stored at: ~/.config/haisha/config.json

use std::path::{Path, PathBuf};

use haisha_domain::model::{CategoryMapping, SynonymTable};
use haisha_domain::service::normalizer::{NormalizerConfig, DEFAULT_OPERATIONAL_VALUE};
use haisha_infra::load_category_mapping;
use haisha_types::{ConfigError, ConflictMode, GroupingMode, OutputFormat, Result};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Provider tag whose routes are allocated; unset keeps all routes
    #[serde(default)]
    pub provider_filter: Option<String>,

    /// Inventory status value that marks a vehicle as operational
    #[serde(default = "default_operational_value")]
    pub operational_value: String,

    /// warning or strict
    #[serde(default)]
    pub conflict_mode: ConflictMode,

    #[serde(default = "default_max_assignments")]
    pub max_assignments_per_vehicle: usize,

    /// TOML category mapping; the built-in mapping is used when unset
    #[serde(default)]
    pub category_mapping_path: Option<PathBuf>,

    /// Ledger directory override
    #[serde(default)]
    pub ledger_dir: Option<PathBuf>,

    /// Run history directory override
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Grouping pass after each append
    #[serde(default)]
    pub grouping_mode: GroupingMode,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,
}

fn default_operational_value() -> String {
    DEFAULT_OPERATIONAL_VALUE.to_string()
}

fn default_max_assignments() -> usize {
    1
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_filter: None,
            operational_value: default_operational_value(),
            conflict_mode: ConflictMode::default(),
            max_assignments_per_vehicle: default_max_assignments(),
            category_mapping_path: None,
            ledger_dir: None,
            store_dir: None,
            grouping_mode: GroupingMode::default(),
            output_format: default_output_format(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("haisha");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Run history directory
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.store_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join("haisha");
        Ok(data_dir)
    }

    /// Ledger directory
    pub fn ledger_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.ledger_dir {
            return Ok(dir.clone());
        }
        Ok(self.store_dir()?.join("ledger"))
    }

    /// Load config from the default location, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_assignments_per_vehicle == 0 {
            return Err(ConfigError::InvalidValue(
                "max_assignments_per_vehicle must be at least 1".to_string(),
            )
            .into());
        }
        if self.operational_value.trim().is_empty() {
            return Err(
                ConfigError::InvalidValue("operational_value must not be blank".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Category mapping from the configured file, or the built-in one
    pub fn category_mapping(&self) -> Result<CategoryMapping> {
        match self.category_mapping_path {
            Some(ref path) => load_category_mapping(path),
            None => Ok(CategoryMapping::default()),
        }
    }

    pub fn normalizer_config(&self) -> Result<NormalizerConfig> {
        Ok(NormalizerConfig {
            provider_filter: self
                .provider_filter
                .clone()
                .filter(|p| !p.trim().is_empty()),
            operational_value: self.operational_value.clone(),
            category_mapping: self.category_mapping()?,
            synonyms: SynonymTable::default(),
        })
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Haisha Configuration")?;
        writeln!(f, "====================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Provider filter:   {}",
            self.provider_filter.as_deref().unwrap_or("(all providers)")
        )?;
        writeln!(f, "Operational value: {}", self.operational_value)?;
        writeln!(f, "Conflict mode:     {}", self.conflict_mode)?;
        writeln!(f, "Max per vehicle:   {}", self.max_assignments_per_vehicle)?;
        writeln!(
            f,
            "Category mapping:  {}",
            self.category_mapping_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(built-in)".to_string())
        )?;
        writeln!(
            f,
            "Ledger dir:        {}",
            self.ledger_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(
            f,
            "Store dir:         {}",
            self.store_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Grouping mode:     {}", self.grouping_mode)?;
        writeln!(f, "Output format:     {}", self.output_format)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:       {}", path.display())?;
        }

        Ok(())
    }
}
