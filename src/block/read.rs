use bytes::Bytes;

use crate::block::format::read_block_at;
use crate::core::MarqError;
use crate::io::{FileReader, ProfileCallback};

/// Plain decoding buffer: decompresses blocks straight off an eagerly opened
/// raw stream, holding one decompressed block at a time.
pub struct CompressedReader {
    file: FileReader,
    path: String,
    checksum_on_read: bool,
    block: Bytes,
    block_start: Option<u64>,
    next_block_offset: u64,
    pos_in_block: usize,
}

impl CompressedReader {
    pub fn new(file: FileReader, path: impl Into<String>) -> Self {
        Self {
            file,
            path: path.into(),
            checksum_on_read: true,
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
        self.file.set_profile_callback(callback);
    }

    pub fn set_read_until_position(&mut self, limit: u64) {
        self.file.set_read_until_position(limit);
    }

    pub fn read_until_position(&self) -> Option<u64> {
        self.file.read_until_position()
    }

    /// Position on `(block start, offset inside the decompressed block)`.
    /// A seek into the currently held block repositions without touching disk.
    pub fn seek(&mut self, offset_in_file: u64, offset_in_block: u32) -> Result<(), MarqError> {
        if self.block_start != Some(offset_in_file) {
            if offset_in_file >= self.file.size() {
                return Err(MarqError::SeekOutOfBound(format!(
                    "block offset {offset_in_file} is at or beyond '{}' of {} bytes",
                    self.path,
                    self.file.size()
                )));
            }
            let (block, next) =
                read_block_at(&mut self.file, &self.path, offset_in_file, self.checksum_on_read)?;
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

    /// Read decompressed bytes, advancing through blocks as needed. Returns
    /// zero at end of file or at the read-until bound.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, MarqError> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pos_in_block == self.block.len() {
            let bound = self
                .file
                .read_until_position()
                .unwrap_or(self.file.size())
                .min(self.file.size());
            if self.next_block_offset >= bound {
                return Ok(0);
            }
            let offset = self.next_block_offset;
            let (block, next) =
                read_block_at(&mut self.file, &self.path, offset, self.checksum_on_read)?;
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
}
