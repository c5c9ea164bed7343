//! Grouped aggregation cursor.

use crate::datum::Constant;
use crate::storage::Storage;

use super::aggregate::{AggregateFn, AggregateState};
use super::error::QueryError;
use super::scan::Scan;

/// Cursor producing one row per group of a sorted child scan.
///
/// The child must deliver its rows sorted (or at least clustered) by the
/// grouping fields — the owning plan wraps the child in a sort on exactly
/// those fields. Each `next()` consumes one full run of rows sharing a
/// grouping-value combination and exposes the grouping values plus each
/// aggregate's result as the current row.
pub struct GroupByScan<S: Storage> {
    child: Box<Scan<S>>,
    group_fields: Vec<String>,
    aggs: Vec<AggregateFn>,

    /// Grouping values of the current output row, parallel to
    /// `group_fields`.
    group_vals: Vec<Constant>,
    /// Finished aggregate values of the current output row, parallel to
    /// `aggs`.
    agg_vals: Vec<Constant>,
    /// Whether the child still has rows (the next group's first row is
    /// already consumed).
    more_groups: bool,
}

impl<S: Storage> GroupByScan<S> {
    /// Wraps a sorted child scan, positioned before the first group.
    pub async fn new(
        child: Scan<S>,
        group_fields: Vec<String>,
        aggs: Vec<AggregateFn>,
    ) -> Result<Self, QueryError> {
        let mut scan = Self {
            child: Box::new(child),
            group_fields,
            aggs,
            group_vals: Vec::new(),
            agg_vals: Vec::new(),
            more_groups: false,
        };
        scan.before_first().await?;
        Ok(scan)
    }

    /// Repositions before the first group.
    pub async fn before_first(&mut self) -> Result<(), QueryError> {
        self.child.before_first().await?;
        self.more_groups = self.child.next().await?;
        self.group_vals.clear();
        self.agg_vals.clear();
        Ok(())
    }

    /// Consumes the next run of same-group rows; returns `false` when no
    /// groups remain.
    pub async fn next(&mut self) -> Result<bool, QueryError> {
        if !self.more_groups {
            return Ok(false);
        }

        // The child already sits on this group's first row.
        self.group_vals = self.read_group_values().await?;
        let mut states: Vec<AggregateState> = Vec::with_capacity(self.aggs.len());
        for agg in &self.aggs {
            let first = self.child.get_value(agg.source_field()).await?;
            states.push(agg.start(first));
        }

        loop {
            self.more_groups = self.child.next().await?;
            if !self.more_groups {
                break;
            }
            let vals = self.read_group_values().await?;
            if vals != self.group_vals {
                // First row of the next group; it stays consumed until the
                // next call.
                break;
            }
            for (agg, state) in self.aggs.iter().zip(states.iter_mut()) {
                let val = self.child.get_value(agg.source_field()).await?;
                state.feed(val)?;
            }
        }

        self.agg_vals = states.iter().map(AggregateState::finish).collect();
        Ok(true)
    }

    async fn read_group_values(&self) -> Result<Vec<Constant>, QueryError> {
        let mut vals = Vec::with_capacity(self.group_fields.len());
        for field in &self.group_fields {
            vals.push(self.child.get_value(field).await?);
        }
        Ok(vals)
    }

    /// Reads a grouping field or an aggregate output of the current group.
    pub async fn get_value(&self, field: &str) -> Result<Constant, QueryError> {
        if let Some(i) = self.group_fields.iter().position(|f| f == field) {
            return self
                .group_vals
                .get(i)
                .cloned()
                .ok_or(QueryError::NoCurrentRow);
        }
        if let Some(i) = self.aggs.iter().position(|a| a.output_field() == field) {
            return self
                .agg_vals
                .get(i)
                .cloned()
                .ok_or(QueryError::NoCurrentRow);
        }
        Err(QueryError::UnknownField(field.to_string()))
    }

    /// Returns whether `field` is a grouping field or an aggregate output.
    pub fn has_field(&self, field: &str) -> bool {
        self.group_fields.iter().any(|f| f == field)
            || self.aggs.iter().any(|a| a.output_field() == field)
    }

    /// Releases the child's resources.
    pub fn close(&mut self) {
        self.child.close();
    }
}
