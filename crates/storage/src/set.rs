//! Set handle
//!
//! Members live at `_s[key]#member` with empty values; an exact member count
//! is maintained at `_S[key]` in the same batch as every mutation, mirroring
//! the hash counter.

use crate::db::{Direction, RocksStore};
use crate::error::StoreResult;
use crate::keys;
use crate::registry::StructureKind;
use parking_lot::Mutex;
use rocksdb::WriteBatch;
use std::collections::HashSet;
use std::sync::Arc;

/// Handle for one set
pub struct SetHandle {
    store: Arc<RocksStore>,
    key: Vec<u8>,
    mu: Mutex<()>,
}

impl SetHandle {
    pub fn new(store: Arc<RocksStore>, key: Vec<u8>) -> Self {
        Self {
            store,
            key,
            mu: Mutex::new(()),
        }
    }

    fn read_count(&self) -> StoreResult<i64> {
        let count = self
            .store
            .get(&keys::set_size_key(&self.key))?
            .and_then(|v| String::from_utf8_lossy(&v).parse::<i64>().ok())
            .unwrap_or(0);
        Ok(count)
    }

    /// Add members; returns how many were new
    pub fn add(&self, members: &[&[u8]]) -> StoreResult<usize> {
        let _guard = self.mu.lock();
        let mut batch = WriteBatch::default();
        let mut seen = HashSet::new();
        let mut added = 0i64;
        for member in members {
            let member_key = keys::set_member_key(&self.key, member);
            if seen.insert(member_key.clone()) && self.store.get(&member_key)?.is_none() {
                added += 1;
            }
            batch.put(&member_key, b"");
        }
        if added > 0 {
            let count = self.read_count()? + added;
            batch.put(keys::set_size_key(&self.key), count.to_string());
        }
        batch.put(keys::existence_key(&self.key), StructureKind::Set.tag());
        self.store.write(batch)?;
        Ok(added as usize)
    }

    /// Remove members; returns how many were present. Emptying the set
    /// deletes the counter and the existence record in the same batch.
    pub fn remove(&self, members: &[&[u8]]) -> StoreResult<usize> {
        let _guard = self.mu.lock();
        let mut batch = WriteBatch::default();
        let mut seen = HashSet::new();
        let mut removed = 0i64;
        for member in members {
            let member_key = keys::set_member_key(&self.key, member);
            if seen.insert(member_key.clone()) && self.store.get(&member_key)?.is_some() {
                batch.delete(&member_key);
                removed += 1;
            }
        }
        if removed > 0 {
            let remaining = (self.read_count()? - removed).max(0);
            if remaining == 0 {
                batch.delete(keys::set_size_key(&self.key));
                batch.delete(keys::existence_key(&self.key));
            } else {
                batch.put(keys::set_size_key(&self.key), remaining.to_string());
            }
            self.store.write(batch)?;
        }
        Ok(removed as usize)
    }

    /// Whether a member is present
    pub fn contains(&self, member: &[u8]) -> StoreResult<bool> {
        Ok(self
            .store
            .get(&keys::set_member_key(&self.key, member))?
            .is_some())
    }

    /// Every member in byte order
    pub fn members(&self) -> StoreResult<Vec<Vec<u8>>> {
        let prefix = keys::set_prefix(&self.key);
        let mut out = Vec::new();
        self.store
            .prefix_scan(&prefix, Direction::Forward, |_i, k, _v, _quit| {
                if let Some(member) = keys::set_member_of(k, prefix.len()) {
                    out.push(member.to_vec());
                }
            })?;
        Ok(out)
    }

    /// Exact member count from the counter entry
    pub fn card(&self) -> StoreResult<i64> {
        self.read_count()
    }

    /// Delete every entry of the structure in one batch
    pub fn drop_all(&self) -> StoreResult<()> {
        let _guard = self.mu.lock();
        let mut batch = WriteBatch::default();
        self.store.prefix_scan(
            &keys::set_prefix(&self.key),
            Direction::Forward,
            |_i, k, _v, _quit| {
                batch.delete(k);
            },
        )?;
        batch.delete(keys::set_size_key(&self.key));
        batch.delete(keys::existence_key(&self.key));
        self.store.write(batch)
    }
}
