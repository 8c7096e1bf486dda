//! Raw tabular input, before any column resolution

/// Header row plus string cells, as read from a CSV sheet or any other table source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Display name used in error messages (e.g. "route plan")
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Build a table from string literals; mostly handy in tests
    pub fn from_rows(name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
