//! Durable record storage on top of sled.
//!
//! Records are bincode-encoded and addressed by `(tree, key)`. All writes go
//! through [`Storage::update`], which applies a change with compare-and-swap
//! against the bytes it read, so concurrent writers never lose updates and a
//! killed process never leaves a partially written record.

use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Tree holding one record per local admin account, keyed by username.
pub const ADMINS_TREE: &str = "admins";
/// Tree holding one resolver list per realm, keyed by realm name.
pub const REALMS_TREE: &str = "realms";

/// Attempts made by [`Storage::update`] before giving up on a contended key.
pub const MAX_CAS_RETRIES: u32 = 5;

/// Attempts made by [`Storage::open`] while another process holds the lock.
pub const MAX_OPEN_ATTEMPTS: u32 = 8;
const OPEN_BACKOFF_START_MS: u64 = 10;
const OPEN_BACKOFF_MAX_MS: u64 = 500;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("cannot open database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: sled::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] sled::Error),
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("record {tree}/{key} changed concurrently {attempts} times, giving up")]
    Conflict {
        tree: String,
        key: String,
        attempts: u32,
    },
}

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

/// What an [`Storage::update`] closure wants done with the record.
#[derive(Debug)]
pub enum Change<T> {
    Put(T),
    Delete,
    Keep,
}

#[derive(Clone)]
pub struct Storage {
    db: sled::Db,
}

impl Storage {
    /// Open the database at `path`.
    ///
    /// sled allows one process per directory. While another process holds
    /// the lock, opening is retried with exponential backoff up to
    /// [`MAX_OPEN_ATTEMPTS`] times before failing.
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening database");
        let mut backoff_ms = OPEN_BACKOFF_START_MS;
        let mut attempt = 1;

        loop {
            match sled::open(path) {
                Ok(db) => return Ok(Storage { db }),
                Err(source) if is_locked(&source) && attempt < MAX_OPEN_ATTEMPTS => {
                    warn!(path = %path.display(), attempt, "database locked by another process, waiting");
                    std::thread::sleep(Duration::from_millis(backoff_ms));
                    backoff_ms = (backoff_ms * 2).min(OPEN_BACKOFF_MAX_MS);
                    attempt += 1;
                }
                Err(source) => {
                    return Err(StorageError::Open {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            }
        }
    }

    /// In-memory database removed on drop.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Storage { db })
    }

    pub fn get<T: DeserializeOwned>(&self, tree: &str, key: &str) -> Result<Option<T>> {
        let tree = self.db.open_tree(tree)?;
        match tree.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All records of a tree in key order.
    pub fn scan<T: DeserializeOwned>(&self, tree: &str) -> Result<Vec<(String, T)>> {
        let tree = self.db.open_tree(tree)?;
        let mut out = Vec::new();
        for entry in tree.iter() {
            let (key, value) = entry?;
            let key = String::from_utf8_lossy(&key).into_owned();
            out.push((key, decode(&value)?));
        }
        Ok(out)
    }

    /// Read-modify-write of a single record.
    ///
    /// `apply` sees the current value and returns the change to make plus a
    /// result for the caller. If another writer touched the record between
    /// the read and the swap, the record is re-read and `apply` runs again,
    /// up to [`MAX_CAS_RETRIES`] times. Errors returned by `apply` abort
    /// without writing anything.
    pub fn update<T, R, E, F>(&self, tree_name: &str, key: &str, mut apply: F) -> Result<R, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StorageError>,
        F: FnMut(Option<T>) -> Result<(Change<T>, R), E>,
    {
        let tree = self.db.open_tree(tree_name).map_err(StorageError::from)?;

        for attempt in 1..=MAX_CAS_RETRIES {
            let current = tree.get(key.as_bytes()).map_err(StorageError::from)?;
            let decoded = current.as_deref().map(decode::<T>).transpose()?;

            let (change, out) = apply(decoded)?;
            let next = match change {
                Change::Keep => return Ok(out),
                Change::Put(value) => Some(encode(&value)?),
                Change::Delete => None,
            };

            let swapped = tree
                .compare_and_swap(key.as_bytes(), current, next)
                .map_err(StorageError::from)?;
            match swapped {
                Ok(()) => {
                    self.db.flush().map_err(StorageError::from)?;
                    return Ok(out);
                }
                Err(_) => {
                    warn!(tree = tree_name, key, attempt, "record changed concurrently, retrying");
                }
            }
        }

        Err(StorageError::Conflict {
            tree: tree_name.to_string(),
            key: key.to_string(),
            attempts: MAX_CAS_RETRIES,
        }
        .into())
    }
}

fn is_locked(err: &sled::Error) -> bool {
    matches!(err, sled::Error::Io(io) if io.kind() == std::io::ErrorKind::WouldBlock)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StorageError::Encoding(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_put_and_get() {
        let storage = Storage::temporary().unwrap();
        let created: bool = storage
            .update::<u32, _, StorageError, _>("t", "k", |cur| {
                assert!(cur.is_none());
                Ok((Change::Put(7), true))
            })
            .unwrap();
        assert!(created);
        assert_eq!(storage.get::<u32>("t", "k").unwrap(), Some(7));
    }

    #[test]
    fn test_update_error_writes_nothing() {
        let storage = Storage::temporary().unwrap();
        let res: Result<(), StorageError> = storage.update::<u32, _, _, _>("t", "k", |_| {
            Err(StorageError::Encoding("rejected".into()))
        });
        assert!(res.is_err());
        assert_eq!(storage.get::<u32>("t", "k").unwrap(), None);
    }

    #[test]
    fn test_update_retries_after_concurrent_write() {
        let storage = Storage::temporary().unwrap();
        let other = storage.clone();
        let mut calls = 0;

        let seen: u32 = storage
            .update::<u32, _, StorageError, _>("t", "k", |cur| {
                calls += 1;
                if calls == 1 {
                    // another writer sneaks in between our read and our swap
                    other
                        .update::<u32, _, StorageError, _>("t", "k", |_| Ok((Change::Put(10), ())))
                        .unwrap();
                }
                let next = cur.unwrap_or(0) + 1;
                Ok((Change::Put(next), next))
            })
            .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(seen, 11);
        assert_eq!(storage.get::<u32>("t", "k").unwrap(), Some(11));
    }

    #[test]
    fn test_update_gives_up_after_bounded_retries() {
        let storage = Storage::temporary().unwrap();
        let other = storage.clone();
        let mut calls = 0;

        let res: Result<(), StorageError> = storage.update::<u32, _, _, _>("t", "k", |cur| {
            calls += 1;
            other
                .update::<u32, _, StorageError, _>("t", "k", |c| {
                    Ok((Change::Put(c.unwrap_or(0) + 100), ()))
                })
                .unwrap();
            Ok((Change::Put(cur.unwrap_or(0) + 1), ()))
        });

        assert!(matches!(res, Err(StorageError::Conflict { attempts: MAX_CAS_RETRIES, .. })));
        assert_eq!(calls, MAX_CAS_RETRIES);
    }

    #[test]
    fn test_reopen_keeps_flushed_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        {
            let storage = Storage::open(&path).unwrap();
            storage
                .update::<u32, _, StorageError, _>("t", "k", |_| Ok((Change::Put(42), ())))
                .unwrap();
        }

        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.get::<u32>("t", "k").unwrap(), Some(42));
    }

    #[test]
    fn test_open_while_locked_gives_up_naming_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        let _held = Storage::open(&path).unwrap();

        let err = Storage::open(&path).err().expect("database is locked");
        assert!(matches!(&err, StorageError::Open { source, .. } if is_locked(source)));
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_open_waits_for_lock_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        let held = Storage::open(&path).unwrap();

        let releaser = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            drop(held);
        });
        let storage = Storage::open(&path).unwrap();
        releaser.join().unwrap();
        assert_eq!(storage.get::<u32>("t", "k").unwrap(), None);
    }

    #[test]
    fn test_delete_and_scan_in_key_order() {
        let storage = Storage::temporary().unwrap();
        for (k, v) in [("b", 2u32), ("a", 1), ("c", 3)] {
            storage
                .update::<u32, _, StorageError, _>("t", k, |_| Ok((Change::Put(v), ())))
                .unwrap();
        }
        storage
            .update::<u32, _, StorageError, _>("t", "b", |_| Ok((Change::Delete, ())))
            .unwrap();

        let all: Vec<(String, u32)> = storage.scan("t").unwrap();
        assert_eq!(all, vec![("a".to_string(), 1), ("c".to_string(), 3)]);
    }
}
