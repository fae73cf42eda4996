use std::sync::Arc;

use crate::block::{CachedCompressedReader, CompressedReader, FileFactory};
use crate::cache::{BlockCache, MarkCache};
use crate::conf::ReaderSettings;
use crate::core::MarqError;
use crate::io::{Disk, ProfileCallback};
use crate::marks::{GranularityInfo, MarkLoader, MarkRanges};
use crate::reader::resolver::RangeResolver;

/// The active decoding buffer: exactly one variant is live for the stream's
/// lifetime, chosen at construction and never swapped.
pub enum DataBuffer {
    Cached(CachedCompressedReader),
    Plain(CompressedReader),
}

impl DataBuffer {
    pub fn seek(&mut self, offset_in_file: u64, offset_in_block: u32) -> Result<(), MarqError> {
        match self {
            DataBuffer::Cached(buffer) => buffer.seek(offset_in_file, offset_in_block),
            DataBuffer::Plain(buffer) => buffer.seek(offset_in_file, offset_in_block),
        }
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, MarqError> {
        match self {
            DataBuffer::Cached(buffer) => buffer.read(buf),
            DataBuffer::Plain(buffer) => buffer.read(buf),
        }
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), MarqError> {
        match self {
            DataBuffer::Cached(buffer) => buffer.read_exact(buf),
            DataBuffer::Plain(buffer) => buffer.read_exact(buf),
        }
    }

    pub fn set_read_until_position(&mut self, limit: u64) {
        match self {
            DataBuffer::Cached(buffer) => buffer.set_read_until_position(limit),
            DataBuffer::Plain(buffer) => buffer.set_read_until_position(limit),
        }
    }

    pub fn read_until_position(&self) -> Option<u64> {
        match self {
            DataBuffer::Cached(buffer) => buffer.read_until_position(),
            DataBuffer::Plain(buffer) => buffer.read_until_position(),
        }
    }

    fn disable_checksumming(&mut self) {
        match self {
            DataBuffer::Cached(buffer) => buffer.disable_checksumming(),
            DataBuffer::Plain(buffer) => buffer.disable_checksumming(),
        }
    }

    fn set_profile_callback(&mut self, callback: ProfileCallback) {
        match self {
            DataBuffer::Cached(buffer) => buffer.set_profile_callback(callback),
            DataBuffer::Plain(buffer) => buffer.set_profile_callback(callback),
        }
    }
}

/// Mark-indexed read stream over one column file.
///
/// Constructed once per (column file, set of mark ranges the caller will
/// visit); the caller then seeks by mark index in any order and reads
/// decompressed bytes off the exposed buffer. Not internally synchronized:
/// one controller belongs to one logical reader.
pub struct ReaderStream {
    path: String,
    path_prefix: String,
    marks_count: usize,
    file_size: u64,
    marks: MarkLoader,
    buffer: DataBuffer,
    /// Furthest physical offset the raw stream may read up to. Only ever
    /// raised: an earlier, larger read-ahead may already be in flight, and
    /// shrinking the bound could truncate data a caller still wants.
    last_right_offset: u64,
}

impl ReaderStream {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        disk: Arc<dyn Disk>,
        path_prefix: &str,
        data_file_extension: &str,
        marks_count: usize,
        all_mark_ranges: &MarkRanges,
        settings: &ReaderSettings,
        mark_cache: Option<Arc<MarkCache>>,
        block_cache: Option<Arc<BlockCache>>,
        file_size: u64,
        granularity_info: &GranularityInfo,
        profile_callback: Option<ProfileCallback>,
    ) -> Result<Self, MarqError> {
        let path = format!("{path_prefix}{data_file_extension}");
        let marks = MarkLoader::new(
            disk.clone(),
            granularity_info.marks_file_path(path_prefix),
            marks_count,
            settings.save_marks_in_cache,
            mark_cache,
        );

        // Compute the size of the buffer from the spans that will be visited.
        let resolver = RangeResolver::new(&marks, marks_count, file_size);
        let mut max_mark_range_bytes: u64 = 0;
        let mut sum_mark_range_bytes: u64 = 0;
        for range in all_mark_ranges {
            let (_, mark_range_bytes) = resolver.resolve(range.begin, range.end)?;
            max_mark_range_bytes = max_mark_range_bytes.max(mark_range_bytes);
            sum_mark_range_bytes += mark_range_bytes;
        }

        // Avoid an empty buffer. Happens when every supplied range is empty,
        // e.g. all marks of a low-cardinality dictionary point at the same
        // position; keep the default size then.
        let mut read_settings = settings.read.clone();
        if max_mark_range_bytes != 0 {
            read_settings = read_settings.adjust_buffer_size(max_mark_range_bytes);
        }

        let mut buffer = match block_cache {
            Some(cache) => {
                let factory_disk = disk.clone();
                let factory_path = path.clone();
                let factory_settings = read_settings.clone();
                let factory: FileFactory = Box::new(move || {
                    factory_disk.open(&factory_path, &factory_settings, Some(sum_mark_range_bytes))
                });
                DataBuffer::Cached(CachedCompressedReader::new(
                    path.clone(),
                    file_size,
                    factory,
                    cache,
                ))
            }
            None => {
                let file = disk.open(&path, &read_settings, Some(sum_mark_range_bytes))?;
                DataBuffer::Plain(CompressedReader::new(file, path.clone()))
            }
        };

        if let Some(callback) = profile_callback {
            buffer.set_profile_callback(callback);
        }
        if !settings.checksum_on_read {
            buffer.disable_checksumming();
        }

        Ok(Self {
            path,
            path_prefix: path_prefix.to_string(),
            marks_count,
            file_size,
            marks,
            buffer,
            last_right_offset: 0,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn marks_count(&self) -> usize {
        self.marks_count
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// The active decoding buffer; the caller performs the actual byte reads
    /// on it, this stream only positions it.
    pub fn data_buffer(&mut self) -> &mut DataBuffer {
        &mut self.buffer
    }

    fn resolver(&self) -> RangeResolver<'_> {
        RangeResolver::new(&self.marks, self.marks_count, self.file_size)
    }

    /// Position the buffer at the mark's `(physical offset, in-block offset)`.
    /// May block on the first mark-array load.
    pub fn seek_to_mark(&mut self, index: usize) -> Result<(), MarqError> {
        let mark = self.marks.get_mark(index).map_err(|e| {
            e.with_context(|| {
                format!(
                    "while seeking to mark {index} of column {}",
                    self.path_prefix
                )
            })
        })?;

        self.buffer
            .seek(mark.offset_in_file, mark.offset_in_block)
            .map_err(|e| {
                // Better diagnostics.
                e.with_context(|| {
                    format!(
                        "while seeking to mark {index} of column {}; offsets are: {} {}",
                        self.path_prefix, mark.offset_in_file, mark.offset_in_block
                    )
                })
            })
    }

    /// Position at the implicit mark `(0, 0)`.
    pub fn seek_to_start(&mut self) -> Result<(), MarqError> {
        self.buffer.seek(0, 0).map_err(|e| {
            // Better diagnostics.
            e.with_context(|| format!("while seeking to start of column {}", self.path_prefix))
        })
    }

    /// Raise the read-ahead bound to cover `[left_mark, right_mark)`. A
    /// resolved edge at or below the current watermark is a no-op.
    pub fn adjust_for_range(&mut self, left_mark: usize, right_mark: usize) -> Result<(), MarqError> {
        let (right_offset, _) = self.resolver().resolve(left_mark, right_mark)?;
        if right_offset > self.last_right_offset {
            self.last_right_offset = right_offset;
            self.buffer.set_read_until_position(right_offset);
        }
        Ok(())
    }
}
