//! Catalog errors.

use std::fmt;

use crate::record::RecordError;
use crate::tx::TxError;

/// Errors from catalog lookups and metadata updates.
#[derive(Debug)]
pub enum CatalogError {
    /// Referenced table does not exist.
    TableNotFound(String),

    /// A table or view with this name already exists.
    NameInUse(String),

    /// Schema/layout problem while creating a table or reading statistics.
    Record(RecordError),

    /// Block access failure while computing statistics.
    Tx(TxError),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::TableNotFound(name) => {
                write!(f, "table \"{}\" does not exist", name)
            }
            CatalogError::NameInUse(name) => {
                write!(f, "relation \"{}\" already exists", name)
            }
            CatalogError::Record(e) => write!(f, "{}", e),
            CatalogError::Tx(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Record(e) => Some(e),
            CatalogError::Tx(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RecordError> for CatalogError {
    fn from(e: RecordError) -> Self {
        CatalogError::Record(e)
    }
}

impl From<TxError> for CatalogError {
    fn from(e: TxError) -> Self {
        CatalogError::Tx(e)
    }
}
