//! Structure registry
//!
//! Process-wide mapping from `(kind, logical key)` to the live handle, so
//! that there is exactly one handle instance per structure and per-handle
//! mutual exclusion is meaningful. The registry guard protects only
//! lookup/insert; it is released before any storage access, and the registry
//! itself never touches storage.

use crate::db::RocksStore;
use crate::hash::HashHandle;
use crate::list::ListHandle;
use crate::set::SetHandle;
use crate::string::StringHandle;
use crate::zset::ZSetHandle;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Structure family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    String,
    Hash,
    List,
    Set,
    ZSet,
}

impl StructureKind {
    /// Type tag stored in the existence record, also the TYPE reply
    pub fn tag(&self) -> &'static [u8] {
        match self {
            StructureKind::String => b"string",
            StructureKind::Hash => b"hash",
            StructureKind::List => b"list",
            StructureKind::Set => b"set",
            StructureKind::ZSet => b"zset",
        }
    }

    /// Parse an existence record value back into a kind
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"string" => Some(StructureKind::String),
            b"hash" => Some(StructureKind::Hash),
            b"list" => Some(StructureKind::List),
            b"set" => Some(StructureKind::Set),
            b"zset" => Some(StructureKind::ZSet),
            _ => None,
        }
    }
}

/// A live handle of any structure family
#[derive(Clone)]
pub enum Structure {
    String(Arc<StringHandle>),
    Hash(Arc<HashHandle>),
    List(Arc<ListHandle>),
    Set(Arc<SetHandle>),
    ZSet(Arc<ZSetHandle>),
}

/// Handle registry
pub struct Registry {
    store: Arc<RocksStore>,
    handles: Mutex<HashMap<(StructureKind, Vec<u8>), Structure>>,
}

impl Registry {
    pub fn new(store: Arc<RocksStore>) -> Self {
        Self {
            store,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// The shared store behind every handle
    pub fn store(&self) -> &Arc<RocksStore> {
        &self.store
    }

    /// Look up or construct the handle for `(kind, key)`.
    ///
    /// A freshly minted handle for a key that already exists on disk is
    /// indistinguishable from a brand-new one: operations check existence
    /// lazily.
    pub fn structure(&self, kind: StructureKind, key: &[u8]) -> Structure {
        let mut handles = self.handles.lock();
        handles
            .entry((kind, key.to_vec()))
            .or_insert_with(|| {
                let key = key.to_vec();
                match kind {
                    StructureKind::String => {
                        Structure::String(Arc::new(StringHandle::new(self.store.clone(), key)))
                    }
                    StructureKind::Hash => {
                        Structure::Hash(Arc::new(HashHandle::new(self.store.clone(), key)))
                    }
                    StructureKind::List => {
                        Structure::List(Arc::new(ListHandle::new(self.store.clone(), key)))
                    }
                    StructureKind::Set => {
                        Structure::Set(Arc::new(SetHandle::new(self.store.clone(), key)))
                    }
                    StructureKind::ZSet => {
                        Structure::ZSet(Arc::new(ZSetHandle::new(self.store.clone(), key)))
                    }
                }
            })
            .clone()
    }

    /// String handle for `key`
    pub fn string(&self, key: &[u8]) -> Arc<StringHandle> {
        match self.structure(StructureKind::String, key) {
            Structure::String(handle) => handle,
            _ => unreachable!("registry returned a foreign handle kind"),
        }
    }

    /// Hash handle for `key`
    pub fn hash(&self, key: &[u8]) -> Arc<HashHandle> {
        match self.structure(StructureKind::Hash, key) {
            Structure::Hash(handle) => handle,
            _ => unreachable!("registry returned a foreign handle kind"),
        }
    }

    /// List handle for `key`
    pub fn list(&self, key: &[u8]) -> Arc<ListHandle> {
        match self.structure(StructureKind::List, key) {
            Structure::List(handle) => handle,
            _ => unreachable!("registry returned a foreign handle kind"),
        }
    }

    /// Set handle for `key`
    pub fn set(&self, key: &[u8]) -> Arc<SetHandle> {
        match self.structure(StructureKind::Set, key) {
            Structure::Set(handle) => handle,
            _ => unreachable!("registry returned a foreign handle kind"),
        }
    }

    /// Sorted-set handle for `key`
    pub fn zset(&self, key: &[u8]) -> Arc<ZSetHandle> {
        match self.structure(StructureKind::ZSet, key) {
            Structure::ZSet(handle) => handle,
            _ => unreachable!("registry returned a foreign handle kind"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{cleanup, temp_store};

    #[test]
    fn test_tags_round_trip() {
        for kind in [
            StructureKind::String,
            StructureKind::Hash,
            StructureKind::List,
            StructureKind::Set,
            StructureKind::ZSet,
        ] {
            assert_eq!(StructureKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(StructureKind::from_tag(b"stream"), None);
    }

    #[test]
    fn test_same_handle_instance_per_key() {
        let (store, path) = temp_store();
        let registry = Registry::new(store);

        let a = registry.zset(b"rank");
        let b = registry.zset(b"rank");
        assert!(Arc::ptr_eq(&a, &b));

        let other = registry.zset(b"other");
        assert!(!Arc::ptr_eq(&a, &other));

        // distinct kinds get distinct handles even for the same key bytes
        let _hash = registry.hash(b"rank");
        let again = registry.zset(b"rank");
        assert!(Arc::ptr_eq(&a, &again));

        cleanup(&path);
    }

    #[test]
    fn test_handles_share_storage() {
        let (store, path) = temp_store();
        let registry = Registry::new(store);

        registry.hash(b"h").set(&[(b"f", b"v")]).unwrap();
        // a different handle instance created later sees the same data
        let fresh = crate::HashHandle::new(registry.store().clone(), b"h".to_vec());
        assert_eq!(fresh.get(b"f").unwrap(), Some(b"v".to_vec()));

        cleanup(&path);
    }
}
