//! Process-wide read-through caches, shared across reader streams.
//!
//! Both caches are LRU by entry count and internally locked; callers only
//! ever look up and insert, eviction is the cache's business.

use std::num::NonZeroUsize;
use std::sync::Arc;

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;

use crate::marks::Mark;

/// Key of a decompressed block: column file path plus the physical offset
/// of the block start.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockKey {
    pub path: String,
    pub offset: u64,
}

/// Cached decompressed block. `next_offset` is the physical offset right
/// after the compressed frame, kept so a cache hit can chain to the next
/// block without re-reading the frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBlock {
    pub data: Bytes,
    pub next_offset: u64,
}

/// Cache of decompressed blocks.
pub struct BlockCache {
    inner: Mutex<LruCache<BlockKey, CachedBlock>>,
}

impl BlockCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    pub fn get(&self, key: &BlockKey) -> Option<CachedBlock> {
        self.inner.lock().get(key).cloned()
    }

    pub fn insert(&self, key: BlockKey, block: CachedBlock) {
        self.inner.lock().put(key, block);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache of loaded mark arrays, keyed by marks file path.
pub struct MarkCache {
    inner: Mutex<LruCache<String, Arc<Vec<Mark>>>>,
}

impl MarkCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    pub fn get(&self, path: &str) -> Option<Arc<Vec<Mark>>> {
        self.inner.lock().get(path).cloned()
    }

    pub fn insert(&self, path: String, marks: Arc<Vec<Mark>>) {
        self.inner.lock().put(path, marks);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: &str, offset: u64) -> BlockKey {
        BlockKey {
            path: path.to_string(),
            offset,
        }
    }

    fn block(data: &'static [u8]) -> CachedBlock {
        CachedBlock {
            data: Bytes::from_static(data),
            next_offset: data.len() as u64,
        }
    }

    #[test]
    fn test_block_cache_hit_and_miss() {
        let cache = BlockCache::new(4);
        cache.insert(key("a.bin", 0), block(b"block"));

        let hit = cache.get(&key("a.bin", 0)).unwrap();
        assert_eq!(hit.data, Bytes::from_static(b"block"));
        assert_eq!(hit.next_offset, 5);
        assert!(cache.get(&key("a.bin", 100)).is_none());
        assert!(cache.get(&key("b.bin", 0)).is_none());
    }

    #[test]
    fn test_block_cache_evicts_least_recent() {
        let cache = BlockCache::new(2);
        cache.insert(key("a.bin", 0), block(b"0"));
        cache.insert(key("a.bin", 1), block(b"1"));
        // Touch offset 0 so offset 1 is the eviction candidate.
        cache.get(&key("a.bin", 0));
        cache.insert(key("a.bin", 2), block(b"2"));

        assert!(cache.get(&key("a.bin", 0)).is_some());
        assert!(cache.get(&key("a.bin", 1)).is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_mark_cache_shares_loaded_array() {
        let cache = MarkCache::new(2);
        let marks = Arc::new(vec![Mark::new(0, 0), Mark::new(100, 16)]);
        cache.insert("col.mrk".to_string(), marks.clone());

        let hit = cache.get("col.mrk").unwrap();
        assert!(Arc::ptr_eq(&hit, &marks));
        assert!(cache.get("other.mrk").is_none());
    }
}
