use serde::{Deserialize, Serialize};

/// Capacities for the process-wide caches, in entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_block_cache_entries")]
    pub block_cache_entries: usize,
    #[serde(default = "CacheConfig::default_mark_cache_entries")]
    pub mark_cache_entries: usize,
}

impl CacheConfig {
    fn default_block_cache_entries() -> usize {
        1024
    }

    fn default_mark_cache_entries() -> usize {
        256
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            block_cache_entries: Self::default_block_cache_entries(),
            mark_cache_entries: Self::default_mark_cache_entries(),
        }
    }
}
