use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::MarqError;

/// Timing of a single physical read, reported to the profiling callback.
#[derive(Debug, Clone, Copy)]
pub struct ReadProfile {
    pub bytes_read: usize,
    pub elapsed: Duration,
}

pub type ProfileCallback = Arc<dyn Fn(&ReadProfile) + Send + Sync>;

/// Seekable raw byte stream over a column file.
///
/// Reads never go past `read_until` once it is set: a read at the bound
/// returns zero bytes, the same as end of file. The bound only ever comes
/// from block boundaries, so a clamped read never splits a block.
pub struct FileReader {
    path: String,
    inner: BufReader<File>,
    size: u64,
    pos: u64,
    read_until: Option<u64>,
    profile: Option<ProfileCallback>,
}

impl std::fmt::Debug for FileReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileReader")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("pos", &self.pos)
            .field("read_until", &self.read_until)
            .finish_non_exhaustive()
    }
}

impl FileReader {
    pub fn open(path: impl AsRef<Path>, buffer_size: usize) -> Result<Self, MarqError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            MarqError::IoError(format!("opening {}: {e}", path.display()))
        })?;
        let size = file
            .metadata()
            .map_err(|e| MarqError::IoError(format!("reading metadata for {}: {e}", path.display())))?
            .len();
        Ok(Self {
            path: path.display().to_string(),
            inner: BufReader::with_capacity(buffer_size.max(1), file),
            size,
            pos: 0,
            read_until: None,
            profile: None,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Seek to an absolute offset. Seeking to `size` itself is allowed and
    /// leaves the stream at end of file.
    pub fn seek(&mut self, offset: u64) -> Result<(), MarqError> {
        if offset > self.size {
            return Err(MarqError::SeekOutOfBound(format!(
                "offset {offset} is beyond '{}' of {} bytes",
                self.path, self.size
            )));
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        self.pos = offset;
        Ok(())
    }

    /// Forbid reads past `limit`. The limit is advisory read-ahead bounding,
    /// not a truncation: it may only be pushed further out by the caller.
    pub fn set_read_until_position(&mut self, limit: u64) {
        self.read_until = Some(limit);
    }

    pub fn read_until_position(&self) -> Option<u64> {
        self.read_until
    }

    pub fn set_profile_callback(&mut self, callback: ProfileCallback) {
        self.profile = Some(callback);
    }

    /// Read up to `buf.len()` bytes, clamped at the read-until bound and at
    /// end of file. Returns the number of bytes read, zero at either bound.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, MarqError> {
        let limit = self.read_until.unwrap_or(self.size).min(self.size);
        if self.pos >= limit || buf.is_empty() {
            return Ok(0);
        }
        let allowed = buf.len().min((limit - self.pos) as usize);

        let started = self.profile.is_some().then(Instant::now);
        let n = self
            .inner
            .read(&mut buf[..allowed])
            .map_err(|e| MarqError::IoError(format!("reading {}: {e}", self.path)))?;
        self.pos += n as u64;

        if let (Some(callback), Some(started)) = (&self.profile, started) {
            callback(&ReadProfile {
                bytes_read: n,
                elapsed: started.elapsed(),
            });
        }
        Ok(n)
    }

    /// Read exactly `buf.len()` bytes or fail.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), MarqError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(MarqError::IoError(format!(
                    "unexpected end of stream: wanted {} bytes at offset {} of '{}'",
                    buf.len(),
                    self.pos - filled as u64,
                    self.path
                )));
            }
            filled += n;
        }
        Ok(())
    }
}
