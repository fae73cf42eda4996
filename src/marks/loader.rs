use std::sync::Arc;

use log::debug;
use once_cell::sync::OnceCell;

use crate::cache::MarkCache;
use crate::conf::ReadSettings;
use crate::core::MarqError;
use crate::io::Disk;
use crate::marks::format::{self, MARK_ENTRY_SIZE, Mark};

/// Lazy loader for the mark array of one column file.
///
/// The array is loaded on first access, optionally read through the shared
/// mark cache, and shared as `Arc` thereafter. First access may block on
/// disk; every later access is in-memory.
pub struct MarkLoader {
    disk: Arc<dyn Disk>,
    marks_path: String,
    marks_count: usize,
    save_in_cache: bool,
    cache: Option<Arc<MarkCache>>,
    loaded: OnceCell<Arc<Vec<Mark>>>,
}

impl MarkLoader {
    pub fn new(
        disk: Arc<dyn Disk>,
        marks_path: String,
        marks_count: usize,
        save_in_cache: bool,
        cache: Option<Arc<MarkCache>>,
    ) -> Self {
        Self {
            disk,
            marks_path,
            marks_count,
            save_in_cache,
            cache,
            loaded: OnceCell::new(),
        }
    }

    pub fn marks_count(&self) -> usize {
        self.marks_count
    }

    /// The full mark array, loading it on first call.
    pub fn load(&self) -> Result<&Arc<Vec<Mark>>, MarqError> {
        self.loaded.get_or_try_init(|| {
            if let Some(cache) = &self.cache {
                if let Some(marks) = cache.get(&self.marks_path) {
                    return self.validated(marks);
                }
            }
            let marks = Arc::new(self.load_from_disk()?);
            if self.save_in_cache {
                if let Some(cache) = &self.cache {
                    cache.insert(self.marks_path.clone(), marks.clone());
                }
            }
            Ok(marks)
        })
    }

    /// One mark by index. An index at or past `marks_count` is the distinct
    /// out-of-bound kind, so the stream controller can enrich it.
    pub fn get_mark(&self, index: usize) -> Result<Mark, MarqError> {
        if index >= self.marks_count {
            return Err(MarqError::SeekOutOfBound(format!(
                "mark {index} requested while only {} marks exist in '{}'",
                self.marks_count, self.marks_path
            )));
        }
        Ok(self.load()?[index])
    }

    fn load_from_disk(&self) -> Result<Vec<Mark>, MarqError> {
        let expected = self.marks_count * MARK_ENTRY_SIZE;
        let size = self.disk.file_size(&self.marks_path)?;
        if size as usize != expected {
            return Err(MarqError::MarksError(format!(
                "bad size of marks file '{}': {size} bytes, must be {expected} for {} marks",
                self.marks_path, self.marks_count
            )));
        }

        let mut reader = self
            .disk
            .open(&self.marks_path, &ReadSettings::default(), Some(size))?;
        let mut data = vec![0u8; expected];
        reader.read_exact(&mut data)?;

        debug!("loaded {} marks from {}", self.marks_count, self.marks_path);
        format::decode_marks(&data, &self.marks_path)
    }

    fn validated(&self, marks: Arc<Vec<Mark>>) -> Result<Arc<Vec<Mark>>, MarqError> {
        if marks.len() != self.marks_count {
            return Err(MarqError::MarksError(format!(
                "cached mark array for '{}' has {} entries, expected {}",
                self.marks_path,
                marks.len(),
                self.marks_count
            )));
        }
        Ok(marks)
    }
}
