//! Expressions: constants and field references.

use std::fmt;

use crate::datum::Constant;
use crate::record::Schema;
use crate::storage::Storage;

use super::error::QueryError;
use super::scan::Scan;

/// An expression: either a literal constant or a reference to a field of
/// the current row.
///
/// Evaluating a field reference against a row whose schema lacks the field
/// is a [`QueryError::UnknownField`] — never a silent default.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal constant.
    Constant(Constant),
    /// A reference to a named field.
    Field(String),
}

impl Expression {
    /// Creates a constant expression.
    pub fn constant(val: impl Into<Constant>) -> Self {
        Expression::Constant(val.into())
    }

    /// Creates a field-reference expression.
    pub fn field(name: impl Into<String>) -> Self {
        Expression::Field(name.into())
    }

    /// Evaluates the expression against the current row of `scan`.
    pub async fn evaluate<S: Storage>(&self, scan: &Scan<S>) -> Result<Constant, QueryError> {
        match self {
            Expression::Constant(c) => Ok(c.clone()),
            Expression::Field(name) => scan.get_value(name).await,
        }
    }

    /// Returns the referenced field name, if this is a field reference.
    pub fn as_field_name(&self) -> Option<&str> {
        match self {
            Expression::Constant(_) => None,
            Expression::Field(name) => Some(name),
        }
    }

    /// Returns the literal value, if this is a constant.
    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expression::Constant(c) => Some(c),
            Expression::Field(_) => None,
        }
    }

    /// Returns whether the expression can be evaluated against rows of the
    /// given schema. Constants apply to every schema.
    pub fn applies_to(&self, schema: &Schema) -> bool {
        match self {
            Expression::Constant(_) => true,
            Expression::Field(name) => schema.has_field(name),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(c) => write!(f, "{}", c),
            Expression::Field(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let c = Expression::constant(5);
        assert_eq!(c.as_constant(), Some(&Constant::Int(5)));
        assert_eq!(c.as_field_name(), None);

        let f = Expression::field("smid");
        assert_eq!(f.as_field_name(), Some("smid"));
        assert_eq!(f.as_constant(), None);
    }

    #[test]
    fn test_applies_to() {
        let mut schema = Schema::new();
        schema.add_int_field("smid").unwrap();

        assert!(Expression::constant(1).applies_to(&schema));
        assert!(Expression::field("smid").applies_to(&schema));
        assert!(!Expression::field("pid").applies_to(&schema));
    }

    #[test]
    fn test_display() {
        assert_eq!(Expression::field("smername").to_string(), "smername");
        assert_eq!(Expression::constant("SI").to_string(), "'SI'");
    }
}
