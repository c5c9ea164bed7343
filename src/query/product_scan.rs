//! Naive cross product of two child scans.

use crate::datum::Constant;
use crate::storage::Storage;

use super::error::QueryError;
use super::scan::Scan;

/// Cursor over every pairing of an lhs row with an rhs row.
///
/// The rhs is rescanned from its start each time the lhs advances, so the
/// rhs child's full cost is paid once per lhs row — the baseline the
/// block-nested-loop join improves on. Field access dispatches to whichever
/// side declares the field (the owning plan guarantees the two schemas are
/// disjoint).
pub struct ProductScan<S: Storage> {
    lhs: Box<Scan<S>>,
    rhs: Box<Scan<S>>,
    lhs_valid: bool,
}

impl<S: Storage> ProductScan<S> {
    /// Combines two scans into their cross product, positioned before the
    /// first output row.
    pub async fn new(lhs: Scan<S>, rhs: Scan<S>) -> Result<Self, QueryError> {
        let mut scan = Self {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            lhs_valid: false,
        };
        scan.before_first().await?;
        Ok(scan)
    }

    /// Repositions both children; the lhs is advanced onto its first row so
    /// `next()` can drive the rhs.
    pub async fn before_first(&mut self) -> Result<(), QueryError> {
        self.lhs.before_first().await?;
        self.lhs_valid = self.lhs.next().await?;
        self.rhs.before_first().await
    }

    /// Advances to the next pairing.
    pub async fn next(&mut self) -> Result<bool, QueryError> {
        loop {
            if !self.lhs_valid {
                return Ok(false);
            }
            if self.rhs.next().await? {
                return Ok(true);
            }
            // rhs exhausted for this lhs row: advance lhs, rewind rhs.
            self.lhs_valid = self.lhs.next().await?;
            self.rhs.before_first().await?;
        }
    }

    /// Reads the named field from whichever side declares it.
    pub async fn get_value(&self, field: &str) -> Result<Constant, QueryError> {
        if self.lhs.has_field(field) {
            self.lhs.get_value(field).await
        } else if self.rhs.has_field(field) {
            self.rhs.get_value(field).await
        } else {
            Err(QueryError::UnknownField(field.to_string()))
        }
    }

    /// Returns whether either side declares `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.lhs.has_field(field) || self.rhs.has_field(field)
    }

    /// Releases both children's resources.
    pub fn close(&mut self) {
        self.lhs.close();
        self.rhs.close();
    }
}
