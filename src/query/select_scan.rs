//! Predicate filter over a child scan.

use crate::datum::Constant;
use crate::storage::Storage;

use super::error::QueryError;
use super::predicate::Predicate;
use super::scan::Scan;

/// Cursor that yields only the child rows satisfying a predicate.
///
/// `next()` repeatedly advances the child and tests the predicate until a
/// row satisfies it or the child is exhausted. The visible schema is the
/// child's, unchanged. Update operations pass through to the child, so a
/// selection over a table scan is itself updatable — the shape the update
/// planner relies on.
pub struct SelectScan<S: Storage> {
    child: Box<Scan<S>>,
    pred: Predicate,
}

impl<S: Storage> SelectScan<S> {
    /// Wraps `child`, filtering by `pred`.
    pub fn new(child: Scan<S>, pred: Predicate) -> Self {
        Self {
            child: Box::new(child),
            pred,
        }
    }

    /// Repositions the child before its first row.
    pub async fn before_first(&mut self) -> Result<(), QueryError> {
        self.child.before_first().await
    }

    /// Advances to the next row satisfying the predicate.
    pub async fn next(&mut self) -> Result<bool, QueryError> {
        while self.child.next().await? {
            if self.pred.is_satisfied(&self.child).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Reads the named field of the current row.
    pub async fn get_value(&self, field: &str) -> Result<Constant, QueryError> {
        self.child.get_value(field).await
    }

    /// Returns whether the child's schema contains `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.child.has_field(field)
    }

    /// Writes through to the child's current row.
    pub async fn set_value(&mut self, field: &str, val: Constant) -> Result<(), QueryError> {
        self.child.set_value(field, val).await
    }

    /// Inserts through to the child.
    pub async fn insert(&mut self) -> Result<(), QueryError> {
        self.child.insert().await
    }

    /// Deletes the child's current row.
    pub async fn delete(&mut self) -> Result<(), QueryError> {
        self.child.delete().await
    }

    /// Releases the child's resources.
    pub fn close(&mut self) {
        self.child.close();
    }
}
