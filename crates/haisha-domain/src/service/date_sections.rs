//! Date-section grouping for the ledger
//!
//! Each ledger row carries one boundary: the border drawn above it. A row
//! whose run date differs from the row above starts a new section and gets a
//! strong [`Boundary::Section`]; every other row gets a weak
//! [`Boundary::Row`]. The layout is a pure function of the date column, so a
//! rebuild never drifts from an incremental update.

use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Strong border: first row of a date section
    Section,
    /// Weak border between rows of the same section
    Row,
}

/// One boundary per ledger row, top to bottom
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLayout {
    boundaries: Vec<Boundary>,
}

impl SectionLayout {
    pub fn from_boundaries(boundaries: Vec<Boundary>) -> Self {
        Self { boundaries }
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    pub fn get(&self, row: usize) -> Option<Boundary> {
        self.boundaries.get(row).copied()
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Keep the first `from` boundaries and put `tail` after them
    pub fn splice_tail(&mut self, from: usize, tail: Vec<Boundary>) {
        self.boundaries.truncate(from);
        self.boundaries.extend(tail);
    }

    /// Row indices that start a section
    pub fn section_starts(&self) -> Vec<usize> {
        self.boundaries
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == Boundary::Section)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Boundaries for `dates`, where `prev` is the date of the row above the first.
///
/// This is the whole grouping rule; the full and tail variants only choose
/// which rows to feed it.
pub fn tail_boundaries(prev: Option<NaiveDate>, dates: &[NaiveDate]) -> Vec<Boundary> {
    let mut above = prev;
    dates
        .iter()
        .map(|&date| {
            let boundary = if above == Some(date) {
                Boundary::Row
            } else {
                Boundary::Section
            };
            above = Some(date);
            boundary
        })
        .collect()
}

/// Rebuild boundaries for the whole ledger (one-time backfills)
pub fn group_full(dates: &[NaiveDate]) -> SectionLayout {
    SectionLayout {
        boundaries: tail_boundaries(None, dates),
    }
}

/// Update boundaries after rows were appended from `first_new` onward.
///
/// Boundaries above `first_new` are kept; the boundary of `first_new` itself
/// is recomputed against the row before it, so a run appended to an existing
/// date continues that section instead of opening a new one. When the stored
/// layout is shorter than `first_new` (ledger written before grouping
/// existed), processing starts at the end of the stored layout.
pub fn group_tail(dates: &[NaiveDate], existing: &SectionLayout, first_new: usize) -> SectionLayout {
    let start = tail_start(existing, first_new, dates.len());
    let mut layout = existing.clone();
    layout.splice_tail(start, tail_boundaries(previous(dates, start), &dates[start..]));
    layout
}

/// First row the tail pass has to recompute
pub fn tail_start(existing: &SectionLayout, first_new: usize, rows: usize) -> usize {
    first_new.min(existing.len()).min(rows)
}

fn previous(dates: &[NaiveDate], start: usize) -> Option<NaiveDate> {
    start.checked_sub(1).map(|i| dates[i])
}

/// Contiguous row ranges, one per section
pub fn sections(layout: &SectionLayout) -> Vec<Range<usize>> {
    let starts = layout.section_starts();
    let mut ranges = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(layout.len());
        ranges.push(start..end);
    }
    ranges
}
