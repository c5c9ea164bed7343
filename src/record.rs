//! Record management: schemas, physical layouts and slotted pages.
//!
//! A relation's rows are stored as fixed-length records in slotted blocks:
//!
//! - [`Schema`] — the logical description: ordered field names with types
//!   and declared lengths
//! - [`Layout`] — the physical description derived from a schema: byte
//!   offset of every field within a slot, and the slot size
//! - [`RecordPage`] — typed record access within one pinned block
//!
//! Each slot starts with a 4-byte in-use flag followed by the field values
//! at their layout offsets. Records never span blocks.

mod error;
mod layout;
mod page;
mod schema;

pub use error::RecordError;
pub use layout::Layout;
pub use page::RecordPage;
pub use schema::Schema;
