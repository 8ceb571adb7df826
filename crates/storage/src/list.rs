//! List handle
//!
//! A double-ended sequence: elements live at `_l[key]#<seq8>` under
//! order-encoded sequence numbers, and the boundary record `_L[key]` holds
//! the head and tail sequences. Pushing at either end extends the boundary;
//! the element keys stay contiguous, so LLEN is a point read and LRANGE is
//! one range scan.

use crate::db::{Direction, RocksStore};
use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::registry::StructureKind;
use parking_lot::Mutex;
use rocksdb::WriteBatch;
use std::sync::Arc;

/// Handle for one list
pub struct ListHandle {
    store: Arc<RocksStore>,
    key: Vec<u8>,
    mu: Mutex<()>,
}

impl ListHandle {
    pub fn new(store: Arc<RocksStore>, key: Vec<u8>) -> Self {
        Self {
            store,
            key,
            mu: Mutex::new(()),
        }
    }

    /// Head and tail sequence numbers; None while the list is empty
    fn bounds(&self) -> StoreResult<Option<(i64, i64)>> {
        match self.store.get(&keys::list_meta_key(&self.key))? {
            Some(raw) => {
                let head = raw
                    .get(0..8)
                    .and_then(|b| b.try_into().ok())
                    .map(i64::from_be_bytes);
                let tail = raw
                    .get(8..16)
                    .and_then(|b| b.try_into().ok())
                    .map(i64::from_be_bytes);
                match (head, tail) {
                    (Some(head), Some(tail)) => Ok(Some((head, tail))),
                    _ => Err(StoreError::Io(format!(
                        "corrupt list boundary record ({} bytes)",
                        raw.len()
                    ))),
                }
            }
            None => Ok(None),
        }
    }

    fn put_bounds(batch: &mut WriteBatch, meta_key: &[u8], head: i64, tail: i64) {
        let mut raw = [0u8; 16];
        raw[0..8].copy_from_slice(&head.to_be_bytes());
        raw[8..16].copy_from_slice(&tail.to_be_bytes());
        batch.put(meta_key, raw);
    }

    /// Push values at the head (each value ends up in front of the previous
    /// ones); returns the new length
    pub fn push_front(&self, values: &[&[u8]]) -> StoreResult<usize> {
        self.push(values, true)
    }

    /// Push values at the tail; returns the new length
    pub fn push_back(&self, values: &[&[u8]]) -> StoreResult<usize> {
        self.push(values, false)
    }

    fn push(&self, values: &[&[u8]], front: bool) -> StoreResult<usize> {
        let _guard = self.mu.lock();
        let (mut head, mut tail) = self.bounds()?.unwrap_or((0, -1));
        if values.is_empty() {
            return Ok((tail - head + 1) as usize);
        }
        let mut batch = WriteBatch::default();
        for value in values {
            let seq = if front {
                head -= 1;
                head
            } else {
                tail += 1;
                tail
            };
            batch.put(keys::list_entry_key(&self.key, seq), value);
        }
        Self::put_bounds(&mut batch, &keys::list_meta_key(&self.key), head, tail);
        batch.put(keys::existence_key(&self.key), StructureKind::List.tag());
        self.store.write(batch)?;
        Ok((tail - head + 1) as usize)
    }

    /// Pop the head element
    pub fn pop_front(&self) -> StoreResult<Option<Vec<u8>>> {
        self.pop(true)
    }

    /// Pop the tail element
    pub fn pop_back(&self) -> StoreResult<Option<Vec<u8>>> {
        self.pop(false)
    }

    fn pop(&self, front: bool) -> StoreResult<Option<Vec<u8>>> {
        let _guard = self.mu.lock();
        let Some((head, tail)) = self.bounds()? else {
            return Ok(None);
        };
        let seq = if front { head } else { tail };
        let entry_key = keys::list_entry_key(&self.key, seq);
        let value = self.store.get(&entry_key)?;

        let mut batch = WriteBatch::default();
        batch.delete(&entry_key);
        if head == tail {
            // popping the last element tears the list down
            batch.delete(keys::list_meta_key(&self.key));
            batch.delete(keys::existence_key(&self.key));
        } else if front {
            Self::put_bounds(&mut batch, &keys::list_meta_key(&self.key), head + 1, tail);
        } else {
            Self::put_bounds(&mut batch, &keys::list_meta_key(&self.key), head, tail - 1);
        }
        self.store.write(batch)?;
        Ok(value)
    }

    /// Element at `index`; negative indexes count from the tail
    pub fn index(&self, index: i64) -> StoreResult<Option<Vec<u8>>> {
        let Some((head, tail)) = self.bounds()? else {
            return Ok(None);
        };
        let seq = if index < 0 {
            tail + 1 + index
        } else {
            head + index
        };
        if seq < head || seq > tail {
            return Ok(None);
        }
        self.store.get(&keys::list_entry_key(&self.key, seq))
    }

    /// Elements between `start` and `stop` inclusive, with Redis
    /// negative-index semantics
    pub fn range(&self, start: i64, stop: i64) -> StoreResult<Vec<Vec<u8>>> {
        let Some((head, tail)) = self.bounds()? else {
            return Ok(Vec::new());
        };
        let len = tail - head + 1;
        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if start > stop {
            return Ok(Vec::new());
        }

        let lo = keys::list_entry_key(&self.key, head + start);
        let hi = keys::list_entry_key(&self.key, head + stop);
        let mut out = Vec::new();
        self.store
            .range_scan(&lo, &hi, Direction::Forward, |_i, _k, v, _quit| {
                out.push(v.to_vec());
            })?;
        Ok(out)
    }

    /// Element count from the boundary record
    pub fn len(&self) -> StoreResult<i64> {
        Ok(self
            .bounds()?
            .map(|(head, tail)| tail - head + 1)
            .unwrap_or(0))
    }

    /// Delete every entry of the structure in one batch
    pub fn drop_all(&self) -> StoreResult<()> {
        let _guard = self.mu.lock();
        let mut batch = WriteBatch::default();
        self.store.prefix_scan(
            &keys::list_prefix(&self.key),
            Direction::Forward,
            |_i, k, _v, _quit| {
                batch.delete(k);
            },
        )?;
        batch.delete(keys::list_meta_key(&self.key));
        batch.delete(keys::existence_key(&self.key));
        self.store.write(batch)
    }
}
