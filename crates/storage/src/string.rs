//! String handle
//!
//! The value lives at `_k[key]`; the existence record carries the type tag
//! and is written in the same batch as the value.

use crate::db::RocksStore;
use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::registry::StructureKind;
use parking_lot::Mutex;
use rocksdb::WriteBatch;
use std::sync::Arc;

/// Handle for one string key
pub struct StringHandle {
    store: Arc<RocksStore>,
    key: Vec<u8>,
    mu: Mutex<()>,
}

impl StringHandle {
    pub fn new(store: Arc<RocksStore>, key: Vec<u8>) -> Self {
        Self {
            store,
            key,
            mu: Mutex::new(()),
        }
    }

    fn write_value(&self, value: &[u8]) -> StoreResult<()> {
        let mut batch = WriteBatch::default();
        batch.put(keys::string_key(&self.key), value);
        batch.put(keys::existence_key(&self.key), StructureKind::String.tag());
        self.store.write(batch)
    }

    /// Current value, or None when absent
    pub fn get(&self) -> StoreResult<Option<Vec<u8>>> {
        self.store.get(&keys::string_key(&self.key))
    }

    /// Set the value
    pub fn set(&self, value: &[u8]) -> StoreResult<()> {
        let _guard = self.mu.lock();
        self.write_value(value)
    }

    /// Set the value and return the previous one
    pub fn get_set(&self, value: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let _guard = self.mu.lock();
        let old = self.get()?;
        self.write_value(value)?;
        Ok(old)
    }

    /// Set only when absent; returns whether the write happened
    pub fn set_nx(&self, value: &[u8]) -> StoreResult<bool> {
        let _guard = self.mu.lock();
        if self.get()?.is_some() {
            return Ok(false);
        }
        self.write_value(value)?;
        Ok(true)
    }

    /// Value length in bytes, 0 when absent
    pub fn strlen(&self) -> StoreResult<usize> {
        Ok(self.get()?.map(|v| v.len()).unwrap_or(0))
    }

    /// Append to the value (materializing it when absent) and return the new
    /// length
    pub fn append(&self, suffix: &[u8]) -> StoreResult<usize> {
        let _guard = self.mu.lock();
        let mut value = self.get()?.unwrap_or_default();
        value.extend_from_slice(suffix);
        let len = value.len();
        self.write_value(&value)?;
        Ok(len)
    }

    /// Add `delta` to the decimal integer value and return the new value
    pub fn incr_by(&self, delta: i64) -> StoreResult<i64> {
        let _guard = self.mu.lock();
        let current = match self.get()? {
            Some(raw) => String::from_utf8_lossy(&raw).parse::<i64>().map_err(|_| {
                StoreError::InvalidArgument("value is not an integer".to_string())
            })?,
            None => 0,
        };
        let new_value = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::InvalidArgument("integer overflow".to_string()))?;
        self.write_value(new_value.to_string().as_bytes())?;
        Ok(new_value)
    }

    /// Delete the value and the existence record in one batch
    pub fn drop_all(&self) -> StoreResult<()> {
        let _guard = self.mu.lock();
        let mut batch = WriteBatch::default();
        batch.delete(keys::string_key(&self.key));
        batch.delete(keys::existence_key(&self.key));
        self.store.write(batch)
    }
}
