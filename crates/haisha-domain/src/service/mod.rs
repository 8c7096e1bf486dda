//! Domain services

pub mod allocator;
pub mod date_sections;
pub mod duplicate_validator;
pub mod ledger_writer;
pub mod normalizer;
pub mod summarizer;
pub mod unassigned;

pub use allocator::{Allocation, Allocator, UnmatchedReason, UnmatchedRoute};
pub use date_sections::{
    group_full, group_tail, sections, tail_boundaries, Boundary, SectionLayout,
};
pub use duplicate_validator::DuplicateValidator;
pub use ledger_writer::{AppendReport, LedgerWriter};
pub use normalizer::{NormalizedInput, Normalizer, NormalizerConfig};
pub use summarizer::{generate_summary_report, summarize, RunStatus, RunSummary};
pub use unassigned::{compute_unassigned, LastSeenIndex};
