//! Logical column schema and header synonym resolution
//!
//! Input sheets come from several dispatch tools and hand-edited exports, so
//! the same logical field shows up under different headers ("Vehicle ID",
//! "vehicle_id", "車両番号", ...). Headers are resolved once per table into a
//! [`ColumnMap`]; everything downstream works with [`LogicalField`] only.

use std::collections::HashMap;

use haisha_types::SchemaError;
use serde::{Deserialize, Serialize};

use super::table::RawTable;

/// Fields of the internal schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    RouteCode,
    ServiceType,
    Provider,
    Wave,
    StagingLocation,
    DriverName,
    ResourceId,
    Category,
    Operational,
    IdentificationCode,
    TrackingDeviceCode,
    Ownership,
}

impl LogicalField {
    pub const ALL: [LogicalField; 12] = [
        LogicalField::RouteCode,
        LogicalField::ServiceType,
        LogicalField::Provider,
        LogicalField::Wave,
        LogicalField::StagingLocation,
        LogicalField::DriverName,
        LogicalField::ResourceId,
        LogicalField::Category,
        LogicalField::Operational,
        LogicalField::IdentificationCode,
        LogicalField::TrackingDeviceCode,
        LogicalField::Ownership,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalField::RouteCode => "route code",
            LogicalField::ServiceType => "service type",
            LogicalField::Provider => "provider",
            LogicalField::Wave => "wave",
            LogicalField::StagingLocation => "staging location",
            LogicalField::DriverName => "driver name",
            LogicalField::ResourceId => "resource id",
            LogicalField::Category => "category",
            LogicalField::Operational => "operational status",
            LogicalField::IdentificationCode => "identification code",
            LogicalField::TrackingDeviceCode => "tracking device code",
            LogicalField::Ownership => "ownership",
        }
    }

    /// Built-in header spellings
    fn default_synonyms(&self) -> &'static [&'static str] {
        match self {
            LogicalField::RouteCode => &[
                "route code",
                "route",
                "route id",
                "route no",
                "ルート",
                "ルートコード",
                "ルート番号",
            ],
            LogicalField::ServiceType => &[
                "service type",
                "service",
                "route type",
                "サービス種別",
                "サービスタイプ",
            ],
            LogicalField::Provider => &[
                "provider",
                "dsp",
                "operator",
                "carrier",
                "delivery service partner",
                "事業者",
                "運送会社",
            ],
            LogicalField::Wave => &["wave", "wave time", "dispatch wave", "ウェーブ", "出発ウェーブ"],
            LogicalField::StagingLocation => &[
                "staging location",
                "staging",
                "staging area",
                "location",
                "ステージング",
                "ステージング場所",
            ],
            LogicalField::DriverName => &[
                "driver name",
                "driver",
                "associate",
                "associate name",
                "ドライバー",
                "ドライバー名",
                "運転手",
            ],
            LogicalField::ResourceId => &[
                "resource id",
                "vehicle id",
                "vehicle",
                "van id",
                "vehicle name",
                "fleet id",
                "車両id",
                "車両番号",
                "車両",
            ],
            LogicalField::Category => &[
                "category",
                "vehicle category",
                "vehicle type",
                "vehicle size",
                "type",
                "size",
                "車種",
                "車両区分",
            ],
            LogicalField::Operational => &[
                "operational",
                "operational status",
                "status",
                "availability",
                "稼働状況",
                "ステータス",
            ],
            LogicalField::IdentificationCode => &[
                "identification code",
                "vin",
                "license plate",
                "plate",
                "ナンバー",
                "車台番号",
            ],
            LogicalField::TrackingDeviceCode => &[
                "tracking device code",
                "tracking device",
                "gps",
                "gps id",
                "device id",
                "tracker",
                "gps端末",
            ],
            LogicalField::Ownership => &[
                "ownership",
                "ownership type",
                "ownership classification",
                "owned/rented",
                "owned or rented",
                "rental status",
                "所有区分",
                "所有形態",
            ],
        }
    }
}

impl std::fmt::Display for LogicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a header or lookup key: lowercase, `_`/`-` as spaces, collapsed whitespace
pub fn normalize_label(s: &str) -> String {
    s.trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Logical field -> accepted header spellings (stored normalized)
#[derive(Debug, Clone)]
pub struct SynonymTable {
    entries: HashMap<LogicalField, Vec<String>>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        let entries = LogicalField::ALL
            .iter()
            .map(|field| {
                let names = field
                    .default_synonyms()
                    .iter()
                    .map(|s| normalize_label(s))
                    .collect();
                (*field, names)
            })
            .collect();
        Self { entries }
    }
}

impl SynonymTable {
    /// Add an extra accepted header for a field
    pub fn with_synonym(mut self, field: LogicalField, header: &str) -> Self {
        let name = normalize_label(header);
        let names = self.entries.entry(field).or_default();
        if !names.contains(&name) {
            names.push(name);
        }
        self
    }

    pub fn accepted(&self, field: LogicalField) -> &[String] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve a table's headers into a fixed column map.
    ///
    /// Every field in `required` must resolve; `optional` fields are mapped
    /// when present. When several headers match, the leftmost wins.
    pub fn resolve(
        &self,
        table: &RawTable,
        required: &[LogicalField],
        optional: &[LogicalField],
    ) -> Result<ColumnMap, SchemaError> {
        if table.headers.is_empty() {
            return Err(SchemaError::NoHeader {
                table: table.name.clone(),
            });
        }

        let normalized: Vec<String> = table.headers.iter().map(|h| normalize_label(h)).collect();
        let find = |field: LogicalField| {
            let accepted = self.accepted(field);
            normalized.iter().position(|h| accepted.contains(h))
        };

        let mut columns = HashMap::new();
        for &field in required {
            let idx = find(field).ok_or_else(|| SchemaError::MissingColumn {
                table: table.name.clone(),
                field: field.as_str().to_string(),
                accepted: self.accepted(field).join(", "),
            })?;
            columns.insert(field, idx);
        }
        for &field in optional {
            if let Some(idx) = find(field) {
                columns.insert(field, idx);
            }
        }

        Ok(ColumnMap { columns })
    }
}

/// Resolved column positions for one table
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: HashMap<LogicalField, usize>,
}

impl ColumnMap {
    pub fn index(&self, field: LogicalField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn has(&self, field: LogicalField) -> bool {
        self.columns.contains_key(&field)
    }

    /// Trimmed cell value; empty when the column is unmapped or the row is short
    pub fn value<'a>(&self, row: &'a [String], field: LogicalField) -> &'a str {
        self.index(field)
            .and_then(|idx| row.get(idx))
            .map(|s| s.trim())
            .unwrap_or("")
    }

    /// Like [`ColumnMap::value`], but `None` for blank cells
    pub fn optional(&self, row: &[String], field: LogicalField) -> Option<String> {
        let value = self.value(row, field);
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}
