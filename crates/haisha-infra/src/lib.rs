//! Infrastructure layer - input table loaders and mapping files

pub mod category_mapping_loader;
pub mod table_loader;

pub use category_mapping_loader::{load_category_mapping, parse_category_mapping};
pub use table_loader::{load_table, parse_table, TableLoaderError};
