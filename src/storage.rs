//! File plumbing under the repositories
//!
//! Every table is read whole and replaced whole. A replace writes a sibling
//! temporary file, syncs it and renames it over the original, so a crash
//! mid-write leaves either the old or the new contents, never a torn file.
//!
//! Each backing file is guarded by exactly one async mutex. Tables own their
//! mutex directly ([`TableFile`]); per-user cart files get theirs from a
//! [`KeyedLocks`] registry so that different users never contend.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

use crate::codec::TableRecord;
use crate::error::StoreResult;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A text file that is only ever read whole and replaced atomically
#[derive(Debug, Clone)]
pub struct TextFile {
    path: PathBuf,
}

impl TextFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Contents of the file; a missing file reads as empty
    pub async fn read(&self) -> StoreResult<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn exists(&self) -> StoreResult<bool> {
        Ok(tokio::fs::try_exists(&self.path).await?)
    }

    /// Creates the file empty if it does not exist yet
    pub async fn touch(&self) -> StoreResult<()> {
        if !self.exists().await? {
            self.replace("").await?;
        }
        Ok(())
    }

    /// Replaces the whole file via temp file + rename
    pub async fn replace(&self, contents: &str) -> StoreResult<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("table");
        let tmp = parent.join(format!(
            ".{file_name}.tmp.{}.{}",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(contents.as_bytes()).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        if let Err(err) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        Ok(())
    }
}

/// One table file plus the mutex serializing its read-modify-write cycles
pub struct TableFile<T> {
    file: Mutex<TextFile>,
    _records: PhantomData<fn() -> T>,
}

impl<T: TableRecord> TableFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Mutex::new(TextFile::new(path)),
            _records: PhantomData,
        }
    }

    /// Takes exclusive access to the table until the guard is dropped
    pub async fn lock(&self) -> TableGuard<'_, T> {
        TableGuard {
            file: self.file.lock().await,
            _records: PhantomData,
        }
    }

    /// Locked snapshot of every record
    pub async fn load_all(&self) -> StoreResult<Vec<T>> {
        self.lock().await.load().await
    }
}

/// Exclusive access to a table file
pub struct TableGuard<'a, T> {
    file: MutexGuard<'a, TextFile>,
    _records: PhantomData<fn() -> T>,
}

impl<T: TableRecord> TableGuard<'_, T> {
    pub async fn load(&self) -> StoreResult<Vec<T>> {
        T::decode_all(&self.file.read().await?)
    }

    pub async fn store(&mut self, records: &[T]) -> StoreResult<()> {
        self.file.replace(&T::encode_all(records)).await
    }

    /// Raw contents, for restoring after a failed multi-file update
    pub async fn snapshot(&self) -> StoreResult<String> {
        self.file.read().await
    }

    pub async fn restore(&mut self, snapshot: &str) -> StoreResult<()> {
        self.file.replace(snapshot).await
    }
}

/// Lazily created async mutexes, one per key
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the lock on `key`
    ///
    /// Entries nobody holds or waits on are dropped here, so the registry
    /// only tracks keys that are in use.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(
                locks
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// Number of keys currently tracked
    pub async fn tracked_keys(&self) -> usize {
        self.locks.lock().await.len()
    }
}
