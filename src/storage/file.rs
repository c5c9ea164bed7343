//! File-backed storage implementation.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::storage::{BlockId, Storage, StorageError, BLOCK_SIZE};

/// Disk-backed storage: one file per relation under a database directory.
///
/// # File Layout
///
/// ```text
/// dbdir/
///   smer.tbl     +-----------+-----------+----
///   predmet.tbl  | block 0   | block 1   | ...
///   temp1.tbl    +-----------+-----------+----
/// ```
///
/// Each file is a contiguous run of `BLOCK_SIZE` blocks; block `n` lives at
/// byte offset `n * BLOCK_SIZE`.
///
/// # Concurrency
///
/// A single `tokio::Mutex` serializes all file I/O. Handles are opened per
/// operation; the buffer pool in front of this layer absorbs most reads, so
/// handle caching is left out.
///
/// # Durability
///
/// `sync_all()` fsyncs every file in the directory. Without it, data may be
/// lost on crash.
pub struct FileStorage {
    dir: PathBuf,
    io: Mutex<()>,
}

impl FileStorage {
    /// Opens (or creates) a database directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            io: Mutex::new(()),
        })
    }

    /// Returns the database directory path.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    async fn open_rw(&self, file: &str) -> Result<File, StorageError> {
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.file_path(file))
            .await?)
    }

    async fn file_blocks(&self, file: &str) -> Result<u64, StorageError> {
        let len = match fs::metadata(self.file_path(file)).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        if len % BLOCK_SIZE as u64 != 0 {
            return Err(StorageError::Corrupted(format!(
                "file {} has size {} which is not a multiple of block size {}",
                file, len, BLOCK_SIZE
            )));
        }
        Ok(len / BLOCK_SIZE as u64)
    }
}

impl Storage for FileStorage {
    async fn read_block(&self, blk: &BlockId, buf: &mut [u8]) -> Result<(), StorageError> {
        if buf.len() != BLOCK_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: BLOCK_SIZE,
                actual: buf.len(),
            });
        }

        let _io = self.io.lock().await;
        if blk.num() >= self.file_blocks(blk.file()).await? {
            return Err(StorageError::BlockNotFound(blk.clone()));
        }

        let mut file = self.open_rw(blk.file()).await?;
        file.seek(std::io::SeekFrom::Start(blk.num() * BLOCK_SIZE as u64))
            .await?;
        file.read_exact(buf).await?;
        Ok(())
    }

    async fn write_block(&self, blk: &BlockId, buf: &[u8]) -> Result<(), StorageError> {
        if buf.len() != BLOCK_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: BLOCK_SIZE,
                actual: buf.len(),
            });
        }

        let _io = self.io.lock().await;
        if blk.num() >= self.file_blocks(blk.file()).await? {
            return Err(StorageError::BlockNotFound(blk.clone()));
        }

        let mut file = self.open_rw(blk.file()).await?;
        file.seek(std::io::SeekFrom::Start(blk.num() * BLOCK_SIZE as u64))
            .await?;
        file.write_all(buf).await?;
        Ok(())
    }

    async fn append_block(&self, name: &str) -> Result<BlockId, StorageError> {
        let _io = self.io.lock().await;
        let num = self.file_blocks(name).await?;

        let mut file = self.open_rw(name).await?;
        file.seek(std::io::SeekFrom::Start(num * BLOCK_SIZE as u64))
            .await?;
        file.write_all(&[0u8; BLOCK_SIZE]).await?;
        Ok(BlockId::new(name, num))
    }

    async fn block_count(&self, name: &str) -> Result<u64, StorageError> {
        let _io = self.io.lock().await;
        self.file_blocks(name).await
    }

    async fn remove_file(&self, name: &str) -> Result<(), StorageError> {
        let _io = self.io.lock().await;
        match fs::remove_file(self.file_path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn sync_all(&self) -> Result<(), StorageError> {
        let _io = self.io.lock().await;
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                File::open(entry.path()).await?.sync_all().await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_append_write_read() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).await.unwrap();

        let blk = storage.append_block("t.tbl").await.unwrap();
        assert_eq!(blk.num(), 0);

        let mut buf = [0u8; BLOCK_SIZE];
        buf[10] = 0xAB;
        storage.write_block(&blk, &buf).await.unwrap();

        let mut read = [0u8; BLOCK_SIZE];
        storage.read_block(&blk, &mut read).await.unwrap();
        assert_eq!(read[10], 0xAB);
    }

    #[tokio::test]
    async fn test_block_count_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let storage = FileStorage::open(dir.path()).await.unwrap();
            storage.append_block("t.tbl").await.unwrap();
            storage.append_block("t.tbl").await.unwrap();
        }
        let storage = FileStorage::open(dir.path()).await.unwrap();
        assert_eq!(storage.block_count("t.tbl").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_read_past_end() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).await.unwrap();
        storage.append_block("t.tbl").await.unwrap();

        let mut buf = [0u8; BLOCK_SIZE];
        let result = storage.read_block(&BlockId::new("t.tbl", 5), &mut buf).await;
        assert!(matches!(result, Err(StorageError::BlockNotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_file() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).await.unwrap();
        storage.append_block("tmp1.tbl").await.unwrap();

        storage.remove_file("tmp1.tbl").await.unwrap();
        assert_eq!(storage.block_count("tmp1.tbl").await.unwrap(), 0);
        storage.remove_file("tmp1.tbl").await.unwrap();
    }
}
