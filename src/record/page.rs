//! Typed record access within one pinned block.

use std::sync::Arc;

use crate::datum::{Constant, Type};
use crate::storage::{BlockId, PinnedPage, Storage};
use crate::tx::Transaction;

use super::error::RecordError;
use super::layout::Layout;

/// Slot flag: slot does not hold a record.
const EMPTY: i32 = 0;
/// Slot flag: slot holds a record.
const USED: i32 = 1;

/// Record-granular view of one pinned block.
///
/// Wraps a [`PinnedPage`] with a [`Layout`] so callers address values by
/// (slot, field) instead of byte offsets. Reads go straight to the pinned
/// frame; writes are routed through the owning [`Transaction`] so a
/// before-image is captured for rollback. A freshly appended block is
/// all-zero, which reads as "every slot empty" — no separate format step.
pub struct RecordPage<S: Storage> {
    tx: Arc<Transaction<S>>,
    page: PinnedPage<S>,
    layout: Arc<Layout>,
}

impl<S: Storage> RecordPage<S> {
    /// Pins `blk` and wraps it for record access.
    pub async fn open(
        tx: &Arc<Transaction<S>>,
        blk: &BlockId,
        layout: Arc<Layout>,
    ) -> Result<RecordPage<S>, crate::tx::TxError> {
        let page = tx.pin(blk).await?;
        Ok(Self {
            tx: Arc::clone(tx),
            page,
            layout,
        })
    }

    /// Returns the underlying block's address.
    pub fn block(&self) -> &BlockId {
        self.page.block()
    }

    /// Returns the layout records in this page follow.
    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    fn field_offset(&self, slot: usize, field: &str) -> Result<usize, RecordError> {
        Ok(slot * self.layout.slot_size() + self.layout.offset(field)?)
    }

    fn flag_offset(&self, slot: usize) -> usize {
        slot * self.layout.slot_size()
    }

    /// Reads the integer stored in `field` of `slot`.
    pub async fn get_i32(&self, slot: usize, field: &str) -> Result<i32, RecordError> {
        let offset = self.field_offset(slot, field)?;
        Ok(self.page.with_read(|p| p.get_i32(offset)).await)
    }

    /// Reads the string stored in `field` of `slot`.
    pub async fn get_string(&self, slot: usize, field: &str) -> Result<String, RecordError> {
        let offset = self.field_offset(slot, field)?;
        Ok(self.page.with_read(|p| p.get_string(offset)).await)
    }

    /// Reads `field` of `slot` as a typed constant.
    pub async fn get_value(&self, slot: usize, field: &str) -> Result<Constant, RecordError> {
        match self.layout.schema().field_type(field)? {
            Type::Integer => Ok(Constant::Int(self.get_i32(slot, field).await?)),
            Type::Varchar => Ok(Constant::Text(self.get_string(slot, field).await?)),
        }
    }

    /// Writes an integer into `field` of `slot`.
    pub async fn set_i32(&self, slot: usize, field: &str, val: i32) -> Result<(), RecordError> {
        let offset = self.field_offset(slot, field)?;
        self.tx.set_i32(&self.page, offset, val).await;
        Ok(())
    }

    /// Writes a string into `field` of `slot`.
    ///
    /// # Errors
    ///
    /// [`RecordError::ValueTooLong`] if `val` exceeds the field's declared
    /// maximum length.
    pub async fn set_string(&self, slot: usize, field: &str, val: &str) -> Result<(), RecordError> {
        let max = self.layout.schema().field_length(field)?;
        if val.len() > max {
            return Err(RecordError::ValueTooLong {
                field: field.to_string(),
                max,
                actual: val.len(),
            });
        }
        let offset = self.field_offset(slot, field)?;
        self.tx.set_string(&self.page, offset, val).await;
        Ok(())
    }

    /// Writes a typed constant into `field` of `slot`.
    ///
    /// # Errors
    ///
    /// [`RecordError::TypeMismatch`] if the constant's type does not match
    /// the field's declared type.
    pub async fn set_value(
        &self,
        slot: usize,
        field: &str,
        val: &Constant,
    ) -> Result<(), RecordError> {
        match (self.layout.schema().field_type(field)?, val) {
            (Type::Integer, Constant::Int(n)) => self.set_i32(slot, field, *n).await,
            (Type::Varchar, Constant::Text(s)) => self.set_string(slot, field, s).await,
            (expected, _) => Err(RecordError::TypeMismatch {
                field: field.to_string(),
                expected,
                found: val.ty(),
            }),
        }
    }

    /// Returns whether `slot` holds a record.
    pub async fn is_used(&self, slot: usize) -> bool {
        let offset = self.flag_offset(slot);
        self.page.with_read(|p| p.get_i32(offset)).await == USED
    }

    /// Returns the first used slot after `slot` (`None` input scans from the
    /// start), or `None` when the rest of the block is empty.
    pub async fn next_used_after(&self, slot: Option<usize>) -> Option<usize> {
        self.search_after(slot, USED).await
    }

    /// Claims the first empty slot after `slot`, marks it used and returns
    /// it, or `None` when the block is full.
    pub async fn insert_after(&self, slot: Option<usize>) -> Option<usize> {
        let found = self.search_after(slot, EMPTY).await?;
        let offset = self.flag_offset(found);
        self.tx.set_i32(&self.page, offset, USED).await;
        Some(found)
    }

    /// Marks `slot` empty.
    pub async fn delete(&self, slot: usize) {
        let offset = self.flag_offset(slot);
        self.tx.set_i32(&self.page, offset, EMPTY).await;
    }

    async fn search_after(&self, slot: Option<usize>, flag: i32) -> Option<usize> {
        let start = match slot {
            Some(s) => s + 1,
            None => 0,
        };
        let slots = self.layout.slots_per_block();
        for candidate in start..slots {
            let offset = self.flag_offset(candidate);
            if self.page.with_read(|p| p.get_i32(offset)).await == flag {
                return Some(candidate);
            }
        }
        None
    }
}
