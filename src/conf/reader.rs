use serde::{Deserialize, Serialize};

/// Settings governing a single column read path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReaderSettings {
    /// Verify block checksums on every read.
    #[serde(default = "ReaderSettings::default_checksum_on_read")]
    pub checksum_on_read: bool,
    /// Keep loaded mark arrays in the shared mark cache.
    #[serde(default = "ReaderSettings::default_save_marks_in_cache")]
    pub save_marks_in_cache: bool,
    #[serde(default)]
    pub read: ReadSettings,
}

impl ReaderSettings {
    fn default_checksum_on_read() -> bool {
        true
    }

    fn default_save_marks_in_cache() -> bool {
        true
    }
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            checksum_on_read: Self::default_checksum_on_read(),
            save_marks_in_cache: Self::default_save_marks_in_cache(),
            read: ReadSettings::default(),
        }
    }
}

/// Raw stream I/O sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReadSettings {
    #[serde(default = "ReadSettings::default_buffer_size", with = "crate::core::readable")]
    pub buffer_size: usize,
    #[serde(default = "ReadSettings::default_max_buffer_size", with = "crate::core::readable")]
    pub max_buffer_size: usize,
}

pub(crate) const MIN_BUFFER_SIZE: usize = 4 * 1024;

impl ReadSettings {
    fn default_buffer_size() -> usize {
        1024 * 1024
    }

    fn default_max_buffer_size() -> usize {
        4 * 1024 * 1024
    }

    /// Shrink the buffer to the largest span that will actually be read.
    /// Callers skip this when the estimated span is zero, keeping the default.
    pub fn adjust_buffer_size(&self, estimated_bytes: u64) -> ReadSettings {
        let estimated = (estimated_bytes as usize).clamp(MIN_BUFFER_SIZE, self.max_buffer_size);
        ReadSettings {
            buffer_size: self.buffer_size.min(estimated),
            max_buffer_size: self.max_buffer_size,
        }
    }
}

impl Default for ReadSettings {
    fn default() -> Self {
        Self {
            buffer_size: Self::default_buffer_size(),
            max_buffer_size: Self::default_max_buffer_size(),
        }
    }
}
