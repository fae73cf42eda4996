pub(crate) mod format;
mod loader;

pub use format::{MARK_ENTRY_SIZE, Mark};
pub use loader::MarkLoader;

/// Half-open span of mark indices a reader intends to visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkRange {
    pub begin: usize,
    pub end: usize,
}

impl MarkRange {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

pub type MarkRanges = Vec<MarkRange>;

/// Mark-store parameters tying a column path prefix to its marks file.
#[derive(Debug, Clone, PartialEq)]
pub struct GranularityInfo {
    pub marks_file_extension: String,
}

impl GranularityInfo {
    pub fn marks_file_path(&self, path_prefix: &str) -> String {
        format!("{path_prefix}{}", self.marks_file_extension)
    }
}

impl Default for GranularityInfo {
    fn default() -> Self {
        Self {
            marks_file_extension: ".mrk".to_string(),
        }
    }
}
