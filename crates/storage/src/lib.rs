//! Disk-backed Redis data structures
//!
//! Every structure family (string, hash, list, set, zset) is encoded as a
//! group of prefix-segregated entries in one shared RocksDB key space, so
//! capacity scales with disk rather than RAM. Handles provide the Redis-level
//! operations; the registry guarantees one live handle per logical key.

mod db;
mod error;
pub mod keys;
mod registry;

mod hash;
mod list;
mod set;
mod string;
mod zset;

pub use db::{Direction, RocksStore};
pub use error::{StoreError, StoreResult};
pub use hash::HashHandle;
pub use list::ListHandle;
pub use registry::{Registry, Structure, StructureKind};
pub use set::SetHandle;
pub use string::StringHandle;
pub use zset::ZSetHandle;

#[cfg(test)]
pub(crate) mod test_util {
    use crate::RocksStore;
    use std::sync::Arc;

    /// Open a RocksStore under a unique temp path
    pub fn temp_store() -> (Arc<RocksStore>, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!("redrock_test_{}", rand::random::<u64>()));
        let store = Arc::new(RocksStore::open(&path).unwrap());
        (store, path)
    }

    pub fn cleanup(path: &std::path::Path) {
        let _ = std::fs::remove_dir_all(path);
    }
}
