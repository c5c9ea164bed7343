//! Plan construction and opening errors.

use std::fmt;

use crate::catalog::CatalogError;
use crate::query::QueryError;
use crate::record::RecordError;

/// Errors from building a plan tree or opening it into a scan.
#[derive(Debug)]
pub enum PlanError {
    /// A field was requested (projection list, join column, sort key,
    /// `distinct_values`) that the relevant schema does not contain.
    UnknownField(String),

    /// Schema or layout problem (overlapping join schemas, oversized slot).
    Record(RecordError),

    /// Catalog lookup failure while resolving a table leaf.
    Catalog(CatalogError),

    /// Scan-level failure while opening the plan.
    Query(QueryError),
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::UnknownField(name) => {
                write!(f, "field \"{}\" does not exist in this plan's schema", name)
            }
            PlanError::Record(e) => write!(f, "{}", e),
            PlanError::Catalog(e) => write!(f, "{}", e),
            PlanError::Query(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlanError::Record(e) => Some(e),
            PlanError::Catalog(e) => Some(e),
            PlanError::Query(e) => Some(e),
            PlanError::UnknownField(_) => None,
        }
    }
}

impl From<RecordError> for PlanError {
    fn from(e: RecordError) -> Self {
        PlanError::Record(e)
    }
}

impl From<CatalogError> for PlanError {
    fn from(e: CatalogError) -> Self {
        PlanError::Catalog(e)
    }
}

impl From<QueryError> for PlanError {
    fn from(e: QueryError) -> Self {
        PlanError::Query(e)
    }
}
