//! Hash handle
//!
//! Fields live at `_h[key]#field`; an exact field count is maintained at
//! `_H[key]` in the same batch as every mutation, so HLEN is a point read
//! instead of a prefix scan.

use crate::db::{Direction, RocksStore};
use crate::error::{StoreError, StoreResult};
use crate::keys;
use crate::registry::StructureKind;
use parking_lot::Mutex;
use rocksdb::WriteBatch;
use std::collections::HashSet;
use std::sync::Arc;

/// Handle for one hash
pub struct HashHandle {
    store: Arc<RocksStore>,
    key: Vec<u8>,
    mu: Mutex<()>,
}

impl HashHandle {
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
            .get(&keys::hash_size_key(&self.key))?
            .and_then(|v| String::from_utf8_lossy(&v).parse::<i64>().ok())
            .unwrap_or(0);
        Ok(count)
    }

    /// Field value, or None when absent
    pub fn get(&self, field: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.store.get(&keys::hash_field_key(&self.key, field))
    }

    /// Parallel lookup of several fields
    pub fn mget(&self, fields: &[&[u8]]) -> StoreResult<Vec<Option<Vec<u8>>>> {
        let mut out = Vec::with_capacity(fields.len());
        for field in fields {
            out.push(self.get(field)?);
        }
        Ok(out)
    }

    /// Whether a field is present
    pub fn exists(&self, field: &[u8]) -> StoreResult<bool> {
        Ok(self.get(field)?.is_some())
    }

    /// Write every `(field, value)` pair, the counter, and the existence
    /// record in one batch; returns the number of pairs written
    pub fn set(&self, pairs: &[(&[u8], &[u8])]) -> StoreResult<usize> {
        let _guard = self.mu.lock();
        let mut batch = WriteBatch::default();
        let mut seen = HashSet::new();
        let mut new_fields = 0i64;
        for (field, value) in pairs {
            let field_key = keys::hash_field_key(&self.key, field);
            if seen.insert(field_key.clone()) && self.store.get(&field_key)?.is_none() {
                new_fields += 1;
            }
            batch.put(&field_key, value);
        }
        if new_fields > 0 {
            let count = self.read_count()? + new_fields;
            batch.put(keys::hash_size_key(&self.key), count.to_string());
        }
        batch.put(keys::existence_key(&self.key), StructureKind::Hash.tag());
        self.store.write(batch)?;
        Ok(pairs.len())
    }

    /// Delete fields; returns the number that existed. The counter moves in
    /// the same batch, and emptying the hash removes the counter and the
    /// existence record with it.
    pub fn del(&self, fields: &[&[u8]]) -> StoreResult<usize> {
        let _guard = self.mu.lock();
        let mut batch = WriteBatch::default();
        let mut seen = HashSet::new();
        let mut deleted = 0i64;
        for field in fields {
            let field_key = keys::hash_field_key(&self.key, field);
            if seen.insert(field_key.clone()) && self.store.get(&field_key)?.is_some() {
                batch.delete(&field_key);
                deleted += 1;
            }
        }
        if deleted > 0 {
            let remaining = (self.read_count()? - deleted).max(0);
            if remaining == 0 {
                batch.delete(keys::hash_size_key(&self.key));
                batch.delete(keys::existence_key(&self.key));
            } else {
                batch.put(keys::hash_size_key(&self.key), remaining.to_string());
            }
            self.store.write(batch)?;
        }
        Ok(deleted as usize)
    }

    /// Add `delta` to an integer-valued field and return the new value
    pub fn incr_by(&self, field: &[u8], delta: i64) -> StoreResult<i64> {
        let _guard = self.mu.lock();
        let field_key = keys::hash_field_key(&self.key, field);
        let (current, is_new) = match self.store.get(&field_key)? {
            Some(raw) => {
                let n = String::from_utf8_lossy(&raw).parse::<i64>().map_err(|_| {
                    StoreError::InvalidArgument("hash value is not an integer".to_string())
                })?;
                (n, false)
            }
            None => (0, true),
        };
        let new_value = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::InvalidArgument("integer overflow".to_string()))?;

        let mut batch = WriteBatch::default();
        batch.put(&field_key, new_value.to_string());
        if is_new {
            let count = self.read_count()? + 1;
            batch.put(keys::hash_size_key(&self.key), count.to_string());
        }
        batch.put(keys::existence_key(&self.key), StructureKind::Hash.tag());
        self.store.write(batch)?;
        Ok(new_value)
    }

    /// Every `(field, value)` pair in field byte order
    pub fn get_all(&self) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let prefix = keys::hash_prefix(&self.key);
        let mut out = Vec::new();
        self.store
            .prefix_scan(&prefix, Direction::Forward, |_i, k, v, _quit| {
                if let Some(field) = keys::hash_field_of(k, prefix.len()) {
                    out.push((field.to_vec(), v.to_vec()));
                }
            })?;
        Ok(out)
    }

    /// Field names in byte order
    pub fn fields(&self) -> StoreResult<Vec<Vec<u8>>> {
        let prefix = keys::hash_prefix(&self.key);
        let mut out = Vec::new();
        self.store
            .prefix_scan(&prefix, Direction::Forward, |_i, k, _v, _quit| {
                if let Some(field) = keys::hash_field_of(k, prefix.len()) {
                    out.push(field.to_vec());
                }
            })?;
        Ok(out)
    }

    /// Field values in field byte order
    pub fn values(&self) -> StoreResult<Vec<Vec<u8>>> {
        let prefix = keys::hash_prefix(&self.key);
        let mut out = Vec::new();
        self.store
            .prefix_scan(&prefix, Direction::Forward, |_i, _k, v, _quit| {
                out.push(v.to_vec());
            })?;
        Ok(out)
    }

    /// Exact field count from the counter entry
    pub fn len(&self) -> StoreResult<i64> {
        self.read_count()
    }

    /// Delete every entry of the structure in one batch
    pub fn drop_all(&self) -> StoreResult<()> {
        let _guard = self.mu.lock();
        let mut batch = WriteBatch::default();
        self.store.prefix_scan(
            &keys::hash_prefix(&self.key),
            Direction::Forward,
            |_i, k, _v, _quit| {
                batch.delete(k);
            },
        )?;
        batch.delete(keys::hash_size_key(&self.key));
        batch.delete(keys::existence_key(&self.key));
        self.store.write(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{cleanup, temp_store};

    fn hash(store: &Arc<RocksStore>, key: &[u8]) -> HashHandle {
        HashHandle::new(store.clone(), key.to_vec())
    }

    #[test]
    fn test_set_get_len_del() {
        let (store, path) = temp_store();
        let h = hash(&store, b"user");

        assert_eq!(h.set(&[(b"name", b"alice")]).unwrap(), 1);
        assert_eq!(h.set(&[(b"age", b"30")]).unwrap(), 1);
        assert_eq!(h.get(b"name").unwrap(), Some(b"alice".to_vec()));
        assert_eq!(h.len().unwrap(), 2);

        assert_eq!(h.del(&[b"age", b"name"]).unwrap(), 2);
        assert_eq!(h.len().unwrap(), 0);
        assert_eq!(h.get(b"name").unwrap(), None);
        // emptied hash leaves no existence record behind
        assert!(store.get(&keys::existence_key(b"user")).unwrap().is_none());

        cleanup(&path);
    }

    #[test]
    fn test_counter_ignores_overwrites_and_misses() {
        let (store, path) = temp_store();
        let h = hash(&store, b"c");

        h.set(&[(b"f1", b"a"), (b"f2", b"b")]).unwrap();
        assert_eq!(h.len().unwrap(), 2);

        // overwriting an existing field does not move the counter
        h.set(&[(b"f1", b"changed")]).unwrap();
        assert_eq!(h.len().unwrap(), 2);

        // deleting a missing field does not move the counter
        assert_eq!(h.del(&[b"nope"]).unwrap(), 0);
        assert_eq!(h.len().unwrap(), 2);

        // a repeated new field in one call counts once
        h.set(&[(b"f3", b"x"), (b"f3", b"y")]).unwrap();
        assert_eq!(h.len().unwrap(), 3);
        assert_eq!(h.get(b"f3").unwrap(), Some(b"y".to_vec()));

        cleanup(&path);
    }

    #[test]
    fn test_mget_parallel_order() {
        let (store, path) = temp_store();
        let h = hash(&store, b"m");
        h.set(&[(b"a", b"1"), (b"c", b"3")]).unwrap();

        let got = h.mget(&[b"a", b"b", b"c"]).unwrap();
        assert_eq!(
            got,
            vec![Some(b"1".to_vec()), None, Some(b"3".to_vec())]
        );

        cleanup(&path);
    }

    #[test]
    fn test_get_all_fields_values() {
        let (store, path) = temp_store();
        let h = hash(&store, b"g");
        h.set(&[(b"b", b"2"), (b"a", b"1")]).unwrap();

        assert_eq!(
            h.get_all().unwrap(),
            vec![
                (b"a".to_vec(), b"1".to_vec()),
                (b"b".to_vec(), b"2".to_vec()),
            ]
        );
        assert_eq!(h.fields().unwrap(), vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(h.values().unwrap(), vec![b"1".to_vec(), b"2".to_vec()]);
        assert!(h.exists(b"a").unwrap());
        assert!(!h.exists(b"z").unwrap());

        cleanup(&path);
    }

    #[test]
    fn test_field_bytes_may_contain_separators() {
        let (store, path) = temp_store();
        let h = hash(&store, b"s");
        h.set(&[(b"fi#eld", b"v"), (b"]a[", b"w")]).unwrap();

        assert_eq!(h.get(b"fi#eld").unwrap(), Some(b"v".to_vec()));
        let all = h.get_all().unwrap();
        assert!(all.contains(&(b"fi#eld".to_vec(), b"v".to_vec())));
        assert!(all.contains(&(b"]a[".to_vec(), b"w".to_vec())));

        cleanup(&path);
    }

    #[test]
    fn test_incr_by() {
        let (store, path) = temp_store();
        let h = hash(&store, b"i");

        assert_eq!(h.incr_by(b"n", 5).unwrap(), 5);
        assert_eq!(h.incr_by(b"n", -2).unwrap(), 3);
        assert_eq!(h.len().unwrap(), 1);

        h.set(&[(b"text", b"abc")]).unwrap();
        assert!(matches!(
            h.incr_by(b"text", 1),
            Err(StoreError::InvalidArgument(_))
        ));

        cleanup(&path);
    }

    #[test]
    fn test_drop_all() {
        let (store, path) = temp_store();
        let h = hash(&store, b"d");
        h.set(&[(b"a", b"1"), (b"b", b"2")]).unwrap();

        h.drop_all().unwrap();
        assert_eq!(h.len().unwrap(), 0);
        assert_eq!(h.get(b"a").unwrap(), None);
        assert!(store.get(&keys::existence_key(b"d")).unwrap().is_none());

        cleanup(&path);
    }
}
