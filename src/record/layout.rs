//! Physical record layout.

use std::collections::HashMap;
use std::sync::Arc;

use crate::datum::Type;
use crate::storage::{Page, BLOCK_SIZE};

use super::error::RecordError;
use super::schema::Schema;

/// Size of the in-use flag at the start of every slot.
const FLAG_BYTES: usize = 4;

/// The physical layout of a schema's records: the byte offset of each field
/// within a slot and the total slot size.
///
/// Records are fixed-length. A slot is a 4-byte in-use flag followed by the
/// fields in declaration order — integers as 4 bytes, strings as a length
/// prefix plus their declared maximum bytes.
#[derive(Debug, Clone)]
pub struct Layout {
    schema: Arc<Schema>,
    offsets: HashMap<String, usize>,
    slot_size: usize,
}

impl Layout {
    /// Computes the layout for a schema.
    ///
    /// # Errors
    ///
    /// [`RecordError::SlotTooLarge`] if one record would not fit in a block.
    pub fn new(schema: Schema) -> Result<Self, RecordError> {
        let mut offsets = HashMap::new();
        let mut pos = FLAG_BYTES;
        for name in schema.fields() {
            offsets.insert(name.clone(), pos);
            pos += match schema.field_type(name)? {
                Type::Integer => 4,
                Type::Varchar => Page::max_length(schema.field_length(name)?),
            };
        }
        if pos > BLOCK_SIZE {
            return Err(RecordError::SlotTooLarge {
                slot_size: pos,
                block_size: BLOCK_SIZE,
            });
        }
        Ok(Self {
            schema: Arc::new(schema),
            offsets,
            slot_size: pos,
        })
    }

    /// Returns the described schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the byte offset of a field within a slot.
    pub fn offset(&self, field: &str) -> Result<usize, RecordError> {
        self.offsets
            .get(field)
            .copied()
            .ok_or_else(|| RecordError::UnknownField(field.to_string()))
    }

    /// Returns the size of one slot in bytes (flag included).
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Returns how many slots fit in one block.
    pub fn slots_per_block(&self) -> usize {
        BLOCK_SIZE / self.slot_size
    }
}
