//! Catalog: table metadata, statistics, views and index declarations.
//!
//! The catalog is the engine's in-memory metadata registry. It hands the
//! query layer two descriptors per table:
//!
//! - [`TableInfo`] — physical description (file name, record layout)
//! - [`StatInfo`] — statistics (block count, record count, distinct values
//!   per field), the raw material of every plan cost estimate
//!
//! Statistics are computed by a full table walk, cached, and recomputed
//! wholesale after every `REFRESH_CALL_LIMIT` lookups rather than maintained
//! incrementally — they are estimates by contract, and plans snapshot them
//! at construction time.

mod core;
mod error;
mod info;

pub use self::core::{Catalog, IndexInfo};
pub use error::CatalogError;
pub use info::{StatInfo, TableInfo};
