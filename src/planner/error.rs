//! Planner errors.

use std::fmt;

use crate::catalog::CatalogError;
use crate::plan::PlanError;
use crate::query::QueryError;
use crate::tx::TxError;

/// Errors from query planning and update execution.
#[derive(Debug)]
pub enum PlannerError {
    /// A query referenced no tables at all.
    NoTables,

    /// An insert's field list and value list have different lengths.
    InsertArity {
        /// Number of fields named.
        fields: usize,
        /// Number of values supplied.
        values: usize,
    },

    /// Plan construction or opening failed.
    Plan(PlanError),

    /// Scan iteration or row mutation failed.
    Query(QueryError),

    /// Catalog update failed (duplicate name, unknown table).
    Catalog(CatalogError),

    /// Transaction-level failure (including a rollback attempt).
    Tx(TxError),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::NoTables => write!(f, "query references no tables"),
            PlannerError::InsertArity { fields, values } => write!(
                f,
                "insert names {} fields but supplies {} values",
                fields, values
            ),
            PlannerError::Plan(e) => write!(f, "{}", e),
            PlannerError::Query(e) => write!(f, "{}", e),
            PlannerError::Catalog(e) => write!(f, "{}", e),
            PlannerError::Tx(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::Plan(e) => Some(e),
            PlannerError::Query(e) => Some(e),
            PlannerError::Catalog(e) => Some(e),
            PlannerError::Tx(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PlanError> for PlannerError {
    fn from(e: PlanError) -> Self {
        PlannerError::Plan(e)
    }
}

impl From<QueryError> for PlannerError {
    fn from(e: QueryError) -> Self {
        PlannerError::Query(e)
    }
}

impl From<CatalogError> for PlannerError {
    fn from(e: CatalogError) -> Self {
        PlannerError::Catalog(e)
    }
}

impl From<TxError> for PlannerError {
    fn from(e: TxError) -> Self {
        PlannerError::Tx(e)
    }
}
