//! Test doubles shared by the service and API tests.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use insure_kv::{KVError, KVStore, RedbStore, UpdateFn};

use crate::model::PolicyFields;

pub fn core(number: &str, holder: &str) -> PolicyFields {
    PolicyFields {
        policy_number: number.into(),
        policy_holder_name: holder.into(),
        coverage_amount: 1000.0,
        premium_amount: 50.0,
    }
}

/// Document store that can be switched into failing mode. Counts every
/// write call it receives, including failed ones.
pub struct FlakyKV {
    inner: RedbStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyKV {
    pub fn open() -> (Arc<Self>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let kv = Self::open_at(&dir.path().join("docs.redb"));
        (Arc::new(kv), dir)
    }

    fn open_at(path: &Path) -> Self {
        Self {
            inner: RedbStore::open(path).unwrap(),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_read(&self) -> Result<(), KVError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(KVError::Storage("connection refused".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), KVError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KVError::Storage("connection refused".into()));
        }
        Ok(())
    }
}

impl KVStore for FlakyKV {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        self.check_read()?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.check_write()?;
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<bool, KVError> {
        self.check_write()?;
        self.inner.delete(key)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        self.check_read()?;
        self.inner.scan(prefix)
    }

    fn update(&self, key: &str, f: &mut UpdateFn<'_>) -> Result<Vec<u8>, KVError> {
        self.check_write()?;
        self.inner.update(key, f)
    }
}
