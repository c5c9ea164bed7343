//! Block identifier.

use std::fmt;

/// Address of one disk block: a relation file name plus a block number.
///
/// Each relation (including temporary relations) is its own logical file,
/// so a block is addressed by the pair rather than by a single global page
/// number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId {
    file: String,
    num: u64,
}

impl BlockId {
    /// Creates a block address within the given file.
    pub fn new(file: impl Into<String>, num: u64) -> Self {
        Self {
            file: file.into(),
            num,
        }
    }

    /// Returns the relation file name.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Returns the block number within the file.
    pub fn num(&self) -> u64 {
        self.num
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[file {}, block {}]", self.file, self.num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_and_hash_key() {
        use std::collections::HashMap;

        let a = BlockId::new("t.tbl", 3);
        let b = BlockId::new("t.tbl", 3);
        let c = BlockId::new("t.tbl", 4);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut map = HashMap::new();
        map.insert(a.clone(), 1);
        assert_eq!(map.get(&b), Some(&1));
        assert_eq!(map.get(&c), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            BlockId::new("smer.tbl", 0).to_string(),
            "[file smer.tbl, block 0]"
        );
    }
}
