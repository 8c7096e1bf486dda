//! Domain model types

pub mod assignment;
pub mod conflict;
pub mod driver;
pub mod issue;
pub mod ledger;
pub mod mapping;
pub mod resource;
pub mod route;
pub mod schema;
pub mod table;
pub mod unassigned;

pub use assignment::{logical_id, Assignment};
pub use conflict::{ConflictEntry, ConflictGroup, ConflictReport, Severity};
pub use driver::{DriverRoster, UNASSIGNED_DRIVER};
pub use issue::RunIssue;
pub use ledger::{iso_week, ExternalFields, LedgerRow};
pub use mapping::CategoryMapping;
pub use resource::{ResourceDetails, ResourceItem};
pub use route::RouteRequirement;
pub use schema::{normalize_label, ColumnMap, LogicalField, SynonymTable};
pub use table::RawTable;
pub use unassigned::{LastSeen, UnassignedItem};
