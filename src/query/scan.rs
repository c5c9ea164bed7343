//! The scan cursor family.

use std::future::Future;
use std::pin::Pin;

use crate::datum::{Constant, Type};
use crate::storage::Storage;

use super::error::QueryError;
use super::group_scan::GroupByScan;
use super::join_scan::BlockJoinScan;
use super::product_scan::ProductScan;
use super::project_scan::ProjectScan;
use super::select_scan::SelectScan;
use super::sort_scan::SortScan;
use super::table_scan::TableScan;

/// Boxed future breaking the recursive async cycle through boxed children
/// (Scan -> SelectScan -> Scan).
pub(super) type ScanFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, QueryError>> + Send + 'a>>;

/// A stateful cursor over a relation.
///
/// Uses enum dispatch instead of `dyn Trait`: the set of cursor variants is
/// closed and small, and enum dispatch avoids boxing every async method.
/// Composite variants own their children as `Box<Scan<_>>`.
///
/// A scan starts positioned before its first row; each [`next()`](Scan::next)
/// advances one row and returns `false` on exhaustion. Field accessors read
/// the current row. Update operations are only valid over leaf (table)
/// relations — a [`SelectScan`] passes them through to its child, every
/// other variant refuses with [`QueryError::NotUpdatable`].
pub enum Scan<S: Storage> {
    /// Sequential scan over one table's record pages.
    Table(TableScan<S>),
    /// Predicate filter over a child scan.
    Select(SelectScan<S>),
    /// Field-list restriction over a child scan.
    Project(ProjectScan<S>),
    /// Naive cross product of two child scans.
    Product(ProductScan<S>),
    /// Block-nested-loop equi-join over a materialized inner relation.
    BlockJoin(BlockJoinScan<S>),
    /// Grouped aggregation over a sorted child scan.
    GroupBy(GroupByScan<S>),
    /// In-memory stable sort of a child scan.
    Sort(SortScan<S>),
}

impl<S: Storage> Scan<S> {
    /// Repositions the scan before its first row.
    pub fn before_first(&mut self) -> ScanFuture<'_, ()> {
        Box::pin(async move {
            match self {
                Scan::Table(s) => s.before_first().await,
                Scan::Select(s) => s.before_first().await,
                Scan::Project(s) => s.before_first().await,
                Scan::Product(s) => s.before_first().await,
                Scan::BlockJoin(s) => s.before_first().await,
                Scan::GroupBy(s) => s.before_first().await,
                Scan::Sort(s) => s.before_first().await,
            }
        })
    }

    /// Advances to the next row; returns `false` when exhausted.
    pub fn next(&mut self) -> ScanFuture<'_, bool> {
        Box::pin(async move {
            match self {
                Scan::Table(s) => s.next().await,
                Scan::Select(s) => s.next().await,
                Scan::Project(s) => s.next().await,
                Scan::Product(s) => s.next().await,
                Scan::BlockJoin(s) => s.next().await,
                Scan::GroupBy(s) => s.next().await,
                Scan::Sort(s) => s.next().await,
            }
        })
    }

    /// Reads the named field of the current row.
    pub fn get_value<'a>(&'a self, field: &'a str) -> ScanFuture<'a, Constant> {
        Box::pin(async move {
            match self {
                Scan::Table(s) => s.get_value(field).await,
                Scan::Select(s) => s.get_value(field).await,
                Scan::Project(s) => s.get_value(field).await,
                Scan::Product(s) => s.get_value(field).await,
                Scan::BlockJoin(s) => s.get_value(field).await,
                Scan::GroupBy(s) => s.get_value(field).await,
                Scan::Sort(s) => s.get_value(field).await,
            }
        })
    }

    /// Reads the named integer field of the current row.
    pub async fn get_i32(&self, field: &str) -> Result<i32, QueryError> {
        match self.get_value(field).await? {
            Constant::Int(n) => Ok(n),
            Constant::Text(_) => Err(QueryError::WrongFieldType {
                field: field.to_string(),
                expected: Type::Integer,
            }),
        }
    }

    /// Reads the named string field of the current row.
    pub async fn get_string(&self, field: &str) -> Result<String, QueryError> {
        match self.get_value(field).await? {
            Constant::Text(s) => Ok(s),
            Constant::Int(_) => Err(QueryError::WrongFieldType {
                field: field.to_string(),
                expected: Type::Varchar,
            }),
        }
    }

    /// Returns whether the scan's visible schema contains `field`.
    pub fn has_field(&self, field: &str) -> bool {
        match self {
            Scan::Table(s) => s.has_field(field),
            Scan::Select(s) => s.has_field(field),
            Scan::Project(s) => s.has_field(field),
            Scan::Product(s) => s.has_field(field),
            Scan::BlockJoin(s) => s.has_field(field),
            Scan::GroupBy(s) => s.has_field(field),
            Scan::Sort(s) => s.has_field(field),
        }
    }

    /// Writes `val` into the named field of the current row.
    ///
    /// Valid over leaf relations only.
    pub fn set_value<'a>(&'a mut self, field: &'a str, val: Constant) -> ScanFuture<'a, ()> {
        Box::pin(async move {
            match self {
                Scan::Table(s) => s.set_value(field, &val).await,
                Scan::Select(s) => s.set_value(field, val).await,
                _ => Err(QueryError::NotUpdatable("set_value")),
            }
        })
    }

    /// Inserts a fresh row and positions the scan on it.
    ///
    /// Valid over leaf relations only.
    pub fn insert(&mut self) -> ScanFuture<'_, ()> {
        Box::pin(async move {
            match self {
                Scan::Table(s) => s.insert().await,
                Scan::Select(s) => s.insert().await,
                _ => Err(QueryError::NotUpdatable("insert")),
            }
        })
    }

    /// Deletes the current row.
    ///
    /// Valid over leaf relations only.
    pub fn delete(&mut self) -> ScanFuture<'_, ()> {
        Box::pin(async move {
            match self {
                Scan::Table(s) => s.delete().await,
                Scan::Select(s) => s.delete().await,
                _ => Err(QueryError::NotUpdatable("delete")),
            }
        })
    }

    /// Releases the scan's resources (pinned pages), recursively.
    ///
    /// Dropping a scan releases them too; `close` exists for eager release
    /// on shared cursors.
    pub fn close(&mut self) {
        match self {
            Scan::Table(s) => s.close(),
            Scan::Select(s) => s.close(),
            Scan::Project(s) => s.close(),
            Scan::Product(s) => s.close(),
            Scan::BlockJoin(s) => s.close(),
            Scan::GroupBy(s) => s.close(),
            Scan::Sort(s) => s.close(),
        }
    }
}
