//! Record-layer errors.

use std::fmt;

/// Errors from schema construction and record access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A field name was added to a schema that already contains it, or two
    /// schemas with overlapping field names were concatenated.
    DuplicateField(String),

    /// A field name was looked up in a schema that does not contain it.
    UnknownField(String),

    /// A schema's slot does not fit in one block.
    SlotTooLarge {
        /// Bytes one record of the schema occupies.
        slot_size: usize,
        /// Bytes available in a block.
        block_size: usize,
    },

    /// A string value exceeds the field's declared maximum length.
    ValueTooLong {
        /// Field being written.
        field: String,
        /// Declared maximum length.
        max: usize,
        /// Actual value length.
        actual: usize,
    },

    /// A constant of the wrong type was written to a field.
    TypeMismatch {
        /// Field being written.
        field: String,
        /// The field's declared type.
        expected: crate::datum::Type,
        /// The constant's type.
        found: crate::datum::Type,
    },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::DuplicateField(name) => {
                write!(f, "field \"{}\" already exists in schema", name)
            }
            RecordError::UnknownField(name) => {
                write!(f, "field \"{}\" does not exist in schema", name)
            }
            RecordError::SlotTooLarge {
                slot_size,
                block_size,
            } => write!(
                f,
                "record slot of {} bytes does not fit in a {}-byte block",
                slot_size, block_size
            ),
            RecordError::ValueTooLong { field, max, actual } => write!(
                f,
                "value of {} bytes exceeds length {} of field \"{}\"",
                actual, max, field
            ),
            RecordError::TypeMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "cannot store {} value in {} field \"{}\"",
                found, expected, field
            ),
        }
    }
}

impl std::error::Error for RecordError {}
