use std::sync::Arc;

use bytes::Bytes;

use crate::block::format::read_block_at;
use crate::cache::{BlockCache, BlockKey, CachedBlock};
use crate::core::MarqError;
use crate::io::{FileReader, ProfileCallback};

/// Factory for the raw stream, invoked on the first cache miss only.
pub type FileFactory = Box<dyn Fn() -> Result<FileReader, MarqError> + Send>;

/// Cache-backed decoding buffer: consults the shared decompressed-block
/// cache before touching disk. The raw stream stays unopened as long as
/// every requested block is a cache hit.
pub struct CachedCompressedReader {
    path: String,
    file_size: u64,
    cache: Arc<BlockCache>,
    factory: FileFactory,
    file: Option<FileReader>,
    checksum_on_read: bool,
    read_until: Option<u64>,
    profile: Option<ProfileCallback>,
    block: Bytes,
    block_start: Option<u64>,
    next_block_offset: u64,
    pos_in_block: usize,
}

impl CachedCompressedReader {
    pub fn new(
        path: impl Into<String>,
        file_size: u64,
        factory: FileFactory,
        cache: Arc<BlockCache>,
    ) -> Self {
        Self {
            path: path.into(),
            file_size,
            cache,
            factory,
            file: None,
            checksum_on_read: true,
            read_until: None,
            profile: None,
            block: Bytes::new(),
            block_start: None,
            next_block_offset: 0,
            pos_in_block: 0,
        }
    }

    pub fn disable_checksumming(&mut self) {
        self.checksum_on_read = false;
    }

    pub fn set_profile_callback(&mut self, callback: ProfileCallback) {
        if let Some(file) = self.file.as_mut() {
            file.set_profile_callback(callback.clone());
        }
        self.profile = Some(callback);
    }

    pub fn set_read_until_position(&mut self, limit: u64) {
        self.read_until = Some(limit);
        if let Some(file) = self.file.as_mut() {
            file.set_read_until_position(limit);
        }
    }

    pub fn read_until_position(&self) -> Option<u64> {
        self.read_until
    }

    /// Whether the raw stream has been opened (it stays closed while every
    /// block comes out of the cache).
    pub fn is_file_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn seek(&mut self, offset_in_file: u64, offset_in_block: u32) -> Result<(), MarqError> {
        if self.block_start != Some(offset_in_file) {
            if offset_in_file >= self.file_size {
                return Err(MarqError::SeekOutOfBound(format!(
                    "block offset {offset_in_file} is at or beyond '{}' of {} bytes",
                    self.path, self.file_size
                )));
            }
            let (block, next) = self.fetch_block(offset_in_file)?;
            self.block = block;
            self.block_start = Some(offset_in_file);
            self.next_block_offset = next;
        }

        if offset_in_block as usize > self.block.len() {
            return Err(MarqError::SeekOutOfBound(format!(
                "offset {offset_in_block} is beyond the {} decompressed bytes of the block at {offset_in_file} in '{}'",
                self.block.len(),
                self.path
            )));
        }
        self.pos_in_block = offset_in_block as usize;
        Ok(())
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, MarqError> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pos_in_block == self.block.len() {
            let bound = self.read_until.unwrap_or(self.file_size).min(self.file_size);
            if self.next_block_offset >= bound {
                return Ok(0);
            }
            let offset = self.next_block_offset;
            let (block, next) = self.fetch_block(offset)?;
            self.block = block;
            self.block_start = Some(offset);
            self.next_block_offset = next;
            self.pos_in_block = 0;
        }

        let n = buf.len().min(self.block.len() - self.pos_in_block);
        buf[..n].copy_from_slice(&self.block[self.pos_in_block..self.pos_in_block + n]);
        self.pos_in_block += n;
        Ok(n)
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), MarqError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(MarqError::IoError(format!(
                    "unexpected end of stream: wanted {} decompressed bytes from '{}'",
                    buf.len(),
                    self.path
                )));
            }
            filled += n;
        }
        Ok(())
    }

    fn fetch_block(&mut self, offset: u64) -> Result<(Bytes, u64), MarqError> {
        let key = BlockKey {
            path: self.path.clone(),
            offset,
        };
        if let Some(hit) = self.cache.get(&key) {
            return Ok((hit.data, hit.next_offset));
        }

        let checksum_on_read = self.checksum_on_read;
        let path = self.path.clone();
        let file = self.ensure_file()?;
        let (data, next) = read_block_at(file, &path, offset, checksum_on_read)?;
        self.cache.insert(
            key,
            CachedBlock {
                data: data.clone(),
                next_offset: next,
            },
        );
        Ok((data, next))
    }

    fn ensure_file(&mut self) -> Result<&mut FileReader, MarqError> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                let mut file = (self.factory)()?;
                if let Some(limit) = self.read_until {
                    file.set_read_until_position(limit);
                }
                if let Some(callback) = &self.profile {
                    file.set_profile_callback(callback.clone());
                }
                file
            }
        };
        Ok(self.file.insert(file))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tempfile::TempDir;

    use crate::block::format::{CompressionMethod, compress_block};

    use super::*;

    fn column_file(dir: &TempDir, blocks: &[&[u8]]) -> (Vec<u64>, u64) {
        let mut bytes = Vec::new();
        let mut offsets = Vec::new();
        for data in blocks {
            offsets.push(bytes.len() as u64);
            bytes.extend(compress_block(CompressionMethod::Zstd, data).unwrap());
        }
        let total = bytes.len() as u64;
        std::fs::write(dir.path().join("col.bin"), bytes).unwrap();
        (offsets, total)
    }

    fn counting_reader(
        dir: &TempDir,
        file_size: u64,
        cache: Arc<BlockCache>,
    ) -> (CachedCompressedReader, Arc<AtomicUsize>) {
        let opens = Arc::new(AtomicUsize::new(0));
        let counter = opens.clone();
        let path = dir.path().join("col.bin");
        let factory: FileFactory = Box::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
            FileReader::open(&path, 4096)
        });
        (
            CachedCompressedReader::new("col.bin", file_size, factory, cache),
            opens,
        )
    }

    #[test]
    fn test_miss_opens_file_and_populates_cache() {
        let dir = TempDir::new().unwrap();
        let (offsets, total) = column_file(&dir, &[b"alpha", b"beta"]);
        let cache = Arc::new(BlockCache::new(8));

        let (mut reader, opens) = counting_reader(&dir, total, cache.clone());
        assert!(!reader.is_file_open());

        reader.seek(offsets[0], 0).unwrap();
        let mut buf = [0u8; 5];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"alpha");
        assert_eq!(opens.load(Ordering::Relaxed), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_hit_never_opens_file() {
        let dir = TempDir::new().unwrap();
        let (offsets, total) = column_file(&dir, &[b"alpha", b"beta"]);
        let cache = Arc::new(BlockCache::new(8));

        // Warm the cache with a first reader.
        let (mut warm, _) = counting_reader(&dir, total, cache.clone());
        warm.seek(offsets[0], 0).unwrap();
        warm.seek(offsets[1], 0).unwrap();

        let (mut reader, opens) = counting_reader(&dir, total, cache);
        reader.seek(offsets[1], 0).unwrap();
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"beta");
        assert!(!reader.is_file_open());
        assert_eq!(opens.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_sequential_read_chains_through_cache() {
        let dir = TempDir::new().unwrap();
        let (offsets, total) = column_file(&dir, &[b"first ", b"second"]);
        let cache = Arc::new(BlockCache::new(8));

        let (mut warm, _) = counting_reader(&dir, total, cache.clone());
        warm.seek(offsets[0], 0).unwrap();
        warm.seek(offsets[1], 0).unwrap();

        // Fully cached: chaining reads across both blocks opens nothing.
        let (mut reader, opens) = counting_reader(&dir, total, cache);
        let mut buf = [0u8; 12];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"first second");
        assert_eq!(opens.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_seek_past_file_is_out_of_bound_without_opening() {
        let dir = TempDir::new().unwrap();
        let (_, total) = column_file(&dir, &[b"data"]);
        let cache = Arc::new(BlockCache::new(8));

        let (mut reader, opens) = counting_reader(&dir, total, cache);
        let err = reader.seek(total + 10, 0).unwrap_err();
        assert!(err.is_seek_out_of_bound());
        assert_eq!(opens.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_read_until_respected_on_cache_hits() {
        let dir = TempDir::new().unwrap();
        let (offsets, total) = column_file(&dir, &[b"first", b"extra"]);
        let cache = Arc::new(BlockCache::new(8));

        let (mut warm, _) = counting_reader(&dir, total, cache.clone());
        warm.seek(offsets[0], 0).unwrap();
        warm.seek(offsets[1], 0).unwrap();

        let (mut reader, _) = counting_reader(&dir, total, cache);
        reader.set_read_until_position(offsets[1]);
        let mut buf = [0u8; 10];
        assert_eq!(reader.read(&mut buf).unwrap(), 5);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }
}
