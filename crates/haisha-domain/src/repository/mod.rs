//! Repository trait definitions for the historical ledger

use haisha_types::Error;

use crate::model::LedgerRow;
use crate::service::date_sections::{Boundary, SectionLayout};

/// Append-only ledger storage.
///
/// Implementations hold exclusive write access for as long as they live; the
/// writer reads existing state and appends in the same ownership window.
pub trait LedgerStore {
    /// All stored rows, oldest first
    fn rows(&self) -> &[LedgerRow];

    /// Stored date-section boundaries
    fn layout(&self) -> &SectionLayout;

    /// Append rows after the current last row.
    ///
    /// All-or-nothing: on error no row of `rows` may be visible afterwards.
    fn append_rows(&mut self, rows: Vec<LedgerRow>) -> Result<(), Error>;

    /// Replace the stored boundary layout
    fn store_layout(&mut self, layout: SectionLayout) -> Result<(), Error>;

    /// Keep the boundaries above row `from` and store `tail` after them.
    ///
    /// Stores that can rewrite just the end of their layout override this;
    /// the default replaces the whole layout.
    fn store_layout_tail(&mut self, from: usize, tail: Vec<Boundary>) -> Result<(), Error> {
        let mut layout = self.layout().clone();
        layout.splice_tail(from, tail);
        self.store_layout(layout)
    }

    fn len(&self) -> usize {
        self.rows().len()
    }

    fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

/// In-memory ledger, used for dry runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    rows: Vec<LedgerRow>,
    layout: SectionLayout,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing rows without any grouping applied
    pub fn with_rows(rows: Vec<LedgerRow>) -> Self {
        Self {
            rows,
            layout: SectionLayout::default(),
        }
    }
}

impl LedgerStore for MemoryLedger {
    fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    fn layout(&self) -> &SectionLayout {
        &self.layout
    }

    fn append_rows(&mut self, rows: Vec<LedgerRow>) -> Result<(), Error> {
        self.rows.extend(rows);
        Ok(())
    }

    fn store_layout(&mut self, layout: SectionLayout) -> Result<(), Error> {
        self.layout = layout;
        Ok(())
    }

    fn store_layout_tail(&mut self, from: usize, tail: Vec<Boundary>) -> Result<(), Error> {
        self.layout.splice_tail(from, tail);
        Ok(())
    }
}
