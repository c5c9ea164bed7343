//! Parsed statement descriptors.
//!
//! These are the structured forms a SQL parser hands the planner; producing
//! them from text is an external collaborator's job, so every field here is
//! already resolved to names, constants and predicates.

use std::fmt;

use crate::datum::Constant;
use crate::query::{Expression, Predicate};
use crate::record::Schema;

/// A parsed query: which tables, which filter, which output fields.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryData {
    fields: Vec<String>,
    tables: Vec<String>,
    pred: Predicate,
}

impl QueryData {
    /// Creates a query descriptor.
    pub fn new(fields: Vec<String>, tables: Vec<String>, pred: Predicate) -> Self {
        Self {
            fields,
            tables,
            pred,
        }
    }

    /// Returns the projected field names.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the referenced table (or view) names.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Returns the filter predicate.
    pub fn pred(&self) -> &Predicate {
        &self.pred
    }
}

impl fmt::Display for QueryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "select {} from {} where {}",
            self.fields.join(", "),
            self.tables.join(", "),
            self.pred
        )
    }
}

/// A parsed `insert` statement: one row of constants for the named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertData {
    /// Target table.
    pub table: String,
    /// Fields being set, in statement order.
    pub fields: Vec<String>,
    /// Values, parallel to `fields`.
    pub values: Vec<Constant>,
}

/// A parsed `delete` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteData {
    /// Target table.
    pub table: String,
    /// Rows to delete.
    pub pred: Predicate,
}

/// A parsed `update` statement: one field set to an expression evaluated
/// per matching row.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifyData {
    /// Target table.
    pub table: String,
    /// Field being assigned.
    pub field: String,
    /// New value, evaluated against each matching row.
    pub value: Expression,
    /// Rows to modify.
    pub pred: Predicate,
}

/// A parsed `create table` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableData {
    /// New table's name.
    pub table: String,
    /// New table's schema.
    pub schema: Schema,
}

/// A parsed `create view` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateViewData {
    /// New view's name.
    pub view: String,
    /// The query the view stands for.
    pub definition: QueryData,
}

/// A parsed `create index` statement.
///
/// Recorded as metadata only; the engine has no index access paths.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexData {
    /// New index's name.
    pub index: String,
    /// Indexed table.
    pub table: String,
    /// Indexed field.
    pub field: String,
}

/// One parsed update statement, ready for the update planner.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateCommand {
    /// Insert one row.
    Insert(InsertData),
    /// Delete matching rows.
    Delete(DeleteData),
    /// Modify one field of matching rows.
    Modify(ModifyData),
    /// Create a table.
    CreateTable(CreateTableData),
    /// Create a view.
    CreateView(CreateViewData),
    /// Declare an index.
    CreateIndex(CreateIndexData),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Term;

    #[test]
    fn test_query_data_display() {
        let pred = Predicate::from_term(Term::new(
            Expression::field("smername"),
            Expression::constant("SI"),
        ));
        let data = QueryData::new(
            vec!["smid".to_string()],
            vec!["smer".to_string()],
            pred,
        );
        assert_eq!(
            data.to_string(),
            "select smid from smer where smername = 'SI'"
        );
    }
}
