//! In-memory stable sort cursor.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::datum::Constant;
use crate::record::Schema;
use crate::storage::Storage;

use super::error::QueryError;
use super::scan::Scan;

/// Cursor that drains its child, stably sorts the rows by the key fields
/// (ascending) and serves them in order.
///
/// The drain happens once, at the first positioning call; later rewinds
/// reuse the sorted rows. Ties keep the child's order (`sort_by` is
/// stable). Key comparison is per-[`Constant`]; a field always holds one
/// type (the schema fixes it), so within a column comparison cannot
/// mismatch.
pub struct SortScan<S: Storage> {
    child: Box<Scan<S>>,
    schema: Arc<Schema>,
    sort_fields: Vec<String>,

    /// Sorted rows, one `Constant` per schema field; `None` until drained.
    rows: Option<Vec<Vec<Constant>>>,
    /// Current row index; `None` = before first.
    pos: Option<usize>,
}

impl<S: Storage> SortScan<S> {
    /// Wraps `child` (whose visible schema is `schema`), sorting by
    /// `sort_fields`, positioned before the first row.
    pub async fn new(
        child: Scan<S>,
        schema: Arc<Schema>,
        sort_fields: Vec<String>,
    ) -> Result<Self, QueryError> {
        let mut scan = Self {
            child: Box::new(child),
            schema,
            sort_fields,
            rows: None,
            pos: None,
        };
        scan.before_first().await?;
        Ok(scan)
    }

    /// Repositions before the first row, draining and sorting the child on
    /// the first call.
    pub async fn before_first(&mut self) -> Result<(), QueryError> {
        if self.rows.is_none() {
            self.rows = Some(self.drain_and_sort().await?);
        }
        self.pos = None;
        Ok(())
    }

    async fn drain_and_sort(&mut self) -> Result<Vec<Vec<Constant>>, QueryError> {
        let mut rows: Vec<Vec<Constant>> = Vec::new();
        self.child.before_first().await?;
        while self.child.next().await? {
            let mut row = Vec::with_capacity(self.schema.fields().len());
            for field in self.schema.fields() {
                row.push(self.child.get_value(field).await?);
            }
            rows.push(row);
        }
        self.child.close();

        let key_indices: Vec<usize> = self
            .sort_fields
            .iter()
            .filter_map(|f| self.schema.fields().iter().position(|s| s == f))
            .collect();

        rows.sort_by(|a, b| {
            for &i in &key_indices {
                // Same field, same type: the mismatch arm is unreachable.
                match a[i].compare(&b[i]).unwrap_or(Ordering::Equal) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            Ordering::Equal
        });
        Ok(rows)
    }

    /// Advances to the next row in sort order.
    pub async fn next(&mut self) -> Result<bool, QueryError> {
        let len = self.rows.as_ref().map(Vec::len).unwrap_or(0);
        let next = match self.pos {
            None => 0,
            Some(p) => p + 1,
        };
        if next < len {
            self.pos = Some(next);
            Ok(true)
        } else {
            self.pos = Some(len);
            Ok(false)
        }
    }

    /// Reads the named field of the current row.
    pub async fn get_value(&self, field: &str) -> Result<Constant, QueryError> {
        let i = self
            .schema
            .fields()
            .iter()
            .position(|f| f == field)
            .ok_or_else(|| QueryError::UnknownField(field.to_string()))?;
        let rows = self.rows.as_ref().ok_or(QueryError::NoCurrentRow)?;
        let pos = self.pos.ok_or(QueryError::NoCurrentRow)?;
        rows.get(pos)
            .map(|row| row[i].clone())
            .ok_or(QueryError::NoCurrentRow)
    }

    /// Returns whether the schema contains `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.schema.has_field(field)
    }

    /// Releases the child's resources (the sorted rows stay in memory
    /// until the cursor is dropped).
    pub fn close(&mut self) {
        self.child.close();
    }
}
