//! Query execution errors.

use std::fmt;

use crate::datum::{Type, TypeMismatchError};
use crate::record::RecordError;
use crate::tx::TxError;

/// Errors from scan iteration and row evaluation.
#[derive(Debug)]
pub enum QueryError {
    /// A field was accessed on a row whose visible schema lacks it.
    UnknownField(String),

    /// Field access or mutation without a current row (before the first
    /// `next()`, or after exhaustion).
    NoCurrentRow,

    /// An update operation was invoked on a scan that does not sit over a
    /// leaf (table) relation.
    NotUpdatable(&'static str),

    /// A typed accessor was used on a field of a different type.
    WrongFieldType {
        /// Field accessed.
        field: String,
        /// Type the accessor expected.
        expected: Type,
    },

    /// Two constants of incompatible types were ordered against each other.
    Comparison(TypeMismatchError),

    /// Record-layer failure (layout, value bounds).
    Record(RecordError),

    /// Transaction/buffer failure during block access.
    Tx(TxError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::UnknownField(name) => {
                write!(f, "field \"{}\" does not exist in this row", name)
            }
            QueryError::NoCurrentRow => write!(f, "no current row"),
            QueryError::NotUpdatable(op) => {
                write!(f, "{} is only valid over a table scan", op)
            }
            QueryError::WrongFieldType { field, expected } => {
                write!(f, "field \"{}\" is not of type {}", field, expected)
            }
            QueryError::Comparison(e) => write!(f, "{}", e),
            QueryError::Record(e) => write!(f, "{}", e),
            QueryError::Tx(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Comparison(e) => Some(e),
            QueryError::Record(e) => Some(e),
            QueryError::Tx(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TypeMismatchError> for QueryError {
    fn from(e: TypeMismatchError) -> Self {
        QueryError::Comparison(e)
    }
}

impl From<RecordError> for QueryError {
    fn from(e: RecordError) -> Self {
        QueryError::Record(e)
    }
}

impl From<TxError> for QueryError {
    fn from(e: TxError) -> Self {
        QueryError::Tx(e)
    }
}
