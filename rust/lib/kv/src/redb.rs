use std::path::Path;
use std::sync::Arc;

use ::redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::KVError;
use crate::traits::{KVStore, UpdateFn};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// RedbStore is a KVStore implementation backed by redb, a pure-Rust embedded
/// key-value database with serializable write transactions.
pub struct RedbStore {
    db: Arc<Database>,
}

fn storage_err(e: impl std::fmt::Display) -> KVError {
    KVError::Storage(e.to_string())
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(storage_err)?;

        // Ensure the table exists by doing a write transaction.
        let write_txn = db.begin_write().map_err(storage_err)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        debug!("RedbStore: opened {:?}", path);
        Ok(Self { db: Arc::new(db) })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(TABLE).map_err(storage_err)?;

        match table.get(key) {
            Ok(Some(val)) => Ok(Some(val.value().to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(storage_err)?;
            table.insert(key, value).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, KVError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let existed = {
            let mut table = write_txn.open_table(TABLE).map_err(storage_err)?;
            let removed = table.remove(key).map_err(storage_err)?;
            removed.is_some()
        };
        write_txn.commit().map_err(storage_err)?;
        Ok(existed)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(TABLE).map_err(storage_err)?;

        let mut results = Vec::new();
        let iter = table.range(prefix..).map_err(storage_err)?;

        for entry in iter {
            let entry = entry.map_err(storage_err)?;
            let key = entry.0.value().to_string();
            if !key.starts_with(prefix) {
                break;
            }
            let value = entry.1.value().to_vec();
            results.push((key, value));
        }

        Ok(results)
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<Vec<u8>, KVError> {
        // redb admits one write transaction at a time, so the read below
        // cannot be interleaved with another writer.
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let stored = {
            let mut table = write_txn.open_table(TABLE).map_err(storage_err)?;
            let current = table
                .get(key)
                .map_err(storage_err)?
                .map(|guard| guard.value().to_vec());
            let next = f(current.as_deref())?;
            table.insert(key, next.as_slice()).map_err(storage_err)?;
            next
        };
        write_txn.commit().map_err(storage_err)?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (RedbStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn test_set_get_delete() {
        let (store, _dir) = open_temp();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", b"one").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"one".to_vec()));

        assert!(store.delete("a").unwrap());
        assert_eq!(store.get("a").unwrap(), None);
        assert!(!store.delete("a").unwrap(), "second delete finds nothing");
    }

    #[test]
    fn test_scan_prefix_sorted() {
        let (store, _dir) = open_temp();
        store.set("doc:002", b"2").unwrap();
        store.set("doc:001", b"1").unwrap();
        store.set("other:001", b"x").unwrap();
        store.set("doc:010", b"10").unwrap();

        let keys: Vec<String> = store
            .scan("doc:")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["doc:001", "doc:002", "doc:010"]);
    }

    #[test]
    fn test_update_creates_and_transforms() {
        let (store, _dir) = open_temp();

        let created = store
            .update("counter", &mut |cur| {
                assert!(cur.is_none());
                Ok(b"1".to_vec())
            })
            .unwrap();
        assert_eq!(created, b"1".to_vec());

        let bumped = store
            .update("counter", &mut |cur| {
                let mut v = cur.unwrap().to_vec();
                v.push(b'!');
                Ok(v)
            })
            .unwrap();
        assert_eq!(bumped, b"1!".to_vec());
        assert_eq!(store.get("counter").unwrap(), Some(b"1!".to_vec()));
    }

    #[test]
    fn test_update_error_writes_nothing() {
        let (store, _dir) = open_temp();
        store.set("k", b"keep").unwrap();

        let result = store.update("k", &mut |_| Err(KVError::Serialization("nope".into())));
        assert!(result.is_err());
        assert_eq!(store.get("k").unwrap(), Some(b"keep".to_vec()));
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let (store, _dir) = open_temp();
        let store = Arc::new(store);
        store.set("n", b"0").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store
                            .update("n", &mut |cur| {
                                let n: u64 = std::str::from_utf8(cur.unwrap())
                                    .unwrap()
                                    .parse()
                                    .unwrap();
                                Ok((n + 1).to_string().into_bytes())
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.get("n").unwrap(), Some(b"200".to_vec()));
    }
}
