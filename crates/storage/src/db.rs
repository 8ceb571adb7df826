//! Ordered store adapter
//!
//! Thin capability surface over RocksDB: point get, atomic write batch, and
//! forward/backward iteration over a byte prefix or an explicit `[lo, hi]`
//! interval. Handles assemble a `WriteBatch` per operation and apply it here;
//! no transaction spans an iteration and a write.

use crate::error::StoreResult;
use rocksdb::{IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::path::Path;
use tracing::info;

/// Iteration direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Shared RocksDB instance behind every structure handle
pub struct RocksStore {
    db: DB,
    path: String,
    write_opts: WriteOptions,
}

impl RocksStore {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(4);
        opts.set_target_file_size_base(64 * 1024 * 1024);
        opts.set_max_background_jobs(4);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, &path_str)?;

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(false);

        info!("RocksStore opened at: {}", path_str);

        Ok(Self {
            db,
            path: path_str,
            write_opts,
        })
    }

    /// Get database path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Point lookup
    pub fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.db.get(key)?)
    }

    /// Apply a batch of puts/deletes atomically
    pub fn write(&self, batch: WriteBatch) -> StoreResult<()> {
        self.db.write_opt(batch, &self.write_opts)?;
        Ok(())
    }

    /// Visit every `(key, value)` whose key starts with `prefix`.
    ///
    /// The callback receives a visit index starting at 0 and a quit flag;
    /// setting the flag terminates the scan.
    pub fn prefix_scan<F>(&self, prefix: &[u8], direction: Direction, mut visit: F) -> StoreResult<()>
    where
        F: FnMut(usize, &[u8], &[u8], &mut bool),
    {
        let mode = match direction {
            Direction::Forward => IteratorMode::From(prefix, rocksdb::Direction::Forward),
            Direction::Backward => match prefix_successor(prefix) {
                Some(upper) => {
                    return self.scan_backward_from(upper, prefix, visit);
                }
                None => IteratorMode::End,
            },
        };

        let mut index = 0;
        let mut quit = false;
        for item in self.db.iterator(mode) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            visit(index, &key, &value, &mut quit);
            if quit {
                break;
            }
            index += 1;
        }
        Ok(())
    }

    /// Backward prefix scan seeded from the prefix successor
    fn scan_backward_from<F>(&self, upper: Vec<u8>, prefix: &[u8], mut visit: F) -> StoreResult<()>
    where
        F: FnMut(usize, &[u8], &[u8], &mut bool),
    {
        let mode = IteratorMode::From(&upper, rocksdb::Direction::Reverse);
        let mut index = 0;
        let mut quit = false;
        for item in self.db.iterator(mode) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                // at most the successor itself sits above the prefix range
                if key.as_ref() < prefix {
                    break;
                }
                continue;
            }
            visit(index, &key, &value, &mut quit);
            if quit {
                break;
            }
            index += 1;
        }
        Ok(())
    }

    /// Visit every `(key, value)` with `lo <= key <= hi`
    pub fn range_scan<F>(
        &self,
        lo: &[u8],
        hi: &[u8],
        direction: Direction,
        mut visit: F,
    ) -> StoreResult<()>
    where
        F: FnMut(usize, &[u8], &[u8], &mut bool),
    {
        let mode = match direction {
            Direction::Forward => IteratorMode::From(lo, rocksdb::Direction::Forward),
            Direction::Backward => IteratorMode::From(hi, rocksdb::Direction::Reverse),
        };

        let mut index = 0;
        let mut quit = false;
        for item in self.db.iterator(mode) {
            let (key, value) = item?;
            let done = match direction {
                Direction::Forward => key.as_ref() > hi,
                Direction::Backward => key.as_ref() < lo,
            };
            if done {
                break;
            }
            visit(index, &key, &value, &mut quit);
            if quit {
                break;
            }
            index += 1;
        }
        Ok(())
    }
}

/// Smallest byte string greater than every string starting with `prefix`:
/// increment the last non-0xFF byte and truncate. All-0xFF prefixes have no
/// successor.
fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut out = prefix.to_vec();
    while let Some(last) = out.last_mut() {
        if *last < 0xFF {
            *last += 1;
            return Some(out);
        }
        out.pop();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{cleanup, temp_store};

    fn seed(store: &RocksStore, pairs: &[(&[u8], &[u8])]) {
        let mut batch = WriteBatch::default();
        for (k, v) in pairs {
            batch.put(k, v);
        }
        store.write(batch).unwrap();
    }

    #[test]
    fn test_prefix_successor() {
        assert_eq!(prefix_successor(b"ab"), Some(b"ac".to_vec()));
        assert_eq!(prefix_successor(b"a\xff"), Some(b"b".to_vec()));
        assert_eq!(prefix_successor(b"\xff\xff"), None);
    }

    #[test]
    fn test_prefix_scan_both_directions() {
        let (store, path) = temp_store();
        seed(
            &store,
            &[
                (b"p:a", b"1"),
                (b"p:b", b"2"),
                (b"p:c", b"3"),
                (b"q:x", b"9"),
            ],
        );

        let mut forward = Vec::new();
        store
            .prefix_scan(b"p:", Direction::Forward, |i, k, _v, _quit| {
                forward.push((i, k.to_vec()));
            })
            .unwrap();
        assert_eq!(
            forward,
            vec![
                (0, b"p:a".to_vec()),
                (1, b"p:b".to_vec()),
                (2, b"p:c".to_vec()),
            ]
        );

        let mut backward = Vec::new();
        store
            .prefix_scan(b"p:", Direction::Backward, |i, k, _v, _quit| {
                backward.push((i, k.to_vec()));
            })
            .unwrap();
        assert_eq!(
            backward,
            vec![
                (0, b"p:c".to_vec()),
                (1, b"p:b".to_vec()),
                (2, b"p:a".to_vec()),
            ]
        );

        cleanup(&path);
    }

    #[test]
    fn test_prefix_scan_quit_flag() {
        let (store, path) = temp_store();
        seed(&store, &[(b"p:a", b"1"), (b"p:b", b"2"), (b"p:c", b"3")]);

        let mut seen = 0;
        store
            .prefix_scan(b"p:", Direction::Forward, |_i, _k, _v, quit| {
                seen += 1;
                if seen == 2 {
                    *quit = true;
                }
            })
            .unwrap();
        assert_eq!(seen, 2);

        cleanup(&path);
    }

    #[test]
    fn test_range_scan_inclusive_bounds() {
        let (store, path) = temp_store();
        seed(
            &store,
            &[(b"k1", b"a"), (b"k2", b"b"), (b"k3", b"c"), (b"k4", b"d")],
        );

        let mut keys = Vec::new();
        store
            .range_scan(b"k2", b"k3", Direction::Forward, |_i, k, _v, _quit| {
                keys.push(k.to_vec());
            })
            .unwrap();
        assert_eq!(keys, vec![b"k2".to_vec(), b"k3".to_vec()]);

        let mut reversed = Vec::new();
        store
            .range_scan(b"k2", b"k3", Direction::Backward, |_i, k, _v, _quit| {
                reversed.push(k.to_vec());
            })
            .unwrap();
        assert_eq!(reversed, vec![b"k3".to_vec(), b"k2".to_vec()]);

        cleanup(&path);
    }

    #[test]
    fn test_batch_applies_in_order() {
        let (store, path) = temp_store();
        let mut batch = WriteBatch::default();
        batch.put(b"k", b"old");
        batch.delete(b"k");
        batch.put(b"k", b"new");
        store.write(batch).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"new".to_vec()));

        cleanup(&path);
    }
}
