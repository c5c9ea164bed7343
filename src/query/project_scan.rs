//! Field-list restriction over a child scan.

use crate::datum::Constant;
use crate::storage::Storage;

use super::error::QueryError;
use super::scan::Scan;

/// Cursor exposing only a fixed subset of the child's fields.
///
/// Row positions mirror the child exactly; only field visibility changes.
/// Accessing a field outside the projection list is a
/// [`QueryError::UnknownField`], even if the child could resolve it.
pub struct ProjectScan<S: Storage> {
    child: Box<Scan<S>>,
    fields: Vec<String>,
}

impl<S: Storage> ProjectScan<S> {
    /// Wraps `child`, exposing only `fields`.
    ///
    /// The owning plan validates the field list against the child's schema
    /// at construction time.
    pub fn new(child: Scan<S>, fields: Vec<String>) -> Self {
        Self {
            child: Box::new(child),
            fields,
        }
    }

    /// Repositions the child before its first row.
    pub async fn before_first(&mut self) -> Result<(), QueryError> {
        self.child.before_first().await
    }

    /// Advances the child one row.
    pub async fn next(&mut self) -> Result<bool, QueryError> {
        self.child.next().await
    }

    /// Reads a projected field of the current row.
    pub async fn get_value(&self, field: &str) -> Result<Constant, QueryError> {
        if !self.has_field(field) {
            return Err(QueryError::UnknownField(field.to_string()));
        }
        self.child.get_value(field).await
    }

    /// Returns whether `field` is in the projection list.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Releases the child's resources.
    pub fn close(&mut self) {
        self.child.close();
    }
}
