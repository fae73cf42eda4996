use std::path::PathBuf;

use log::debug;

use crate::conf::ReadSettings;
use crate::core::MarqError;
use crate::io::FileReader;

/// File provider abstraction the reader opens its raw streams through.
///
/// `estimated_read_bytes` is a sizing hint only: requested ranges may overlap
/// in physical bytes, so the hint can overestimate what is actually pulled.
pub trait Disk: Send + Sync {
    fn open(
        &self,
        path: &str,
        settings: &ReadSettings,
        estimated_read_bytes: Option<u64>,
    ) -> Result<FileReader, MarqError>;

    fn file_size(&self, path: &str) -> Result<u64, MarqError>;

    fn exists(&self, path: &str) -> bool;
}

/// Local filesystem disk, all paths relative to a root directory.
pub struct LocalDisk {
    root: PathBuf,
}

impl LocalDisk {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl Disk for LocalDisk {
    fn open(
        &self,
        path: &str,
        settings: &ReadSettings,
        estimated_read_bytes: Option<u64>,
    ) -> Result<FileReader, MarqError> {
        let buffer_size = match estimated_read_bytes {
            Some(estimated) if estimated > 0 => settings.buffer_size.min(estimated as usize),
            _ => settings.buffer_size,
        };
        debug!("opening {path} with buffer size {buffer_size}");
        FileReader::open(self.full_path(path), buffer_size)
    }

    fn file_size(&self, path: &str) -> Result<u64, MarqError> {
        let full = self.full_path(path);
        let metadata = std::fs::metadata(&full).map_err(|e| {
            MarqError::IoError(format!("reading metadata for {}: {e}", full.display()))
        })?;
        Ok(metadata.len())
    }

    fn exists(&self, path: &str) -> bool {
        self.full_path(path).exists()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_open_and_size() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("col.bin"), b"payload").unwrap();

        let disk = LocalDisk::new(dir.path());
        assert!(disk.exists("col.bin"));
        assert!(!disk.exists("missing.bin"));
        assert_eq!(disk.file_size("col.bin").unwrap(), 7);

        let mut reader = disk
            .open("col.bin", &ReadSettings::default(), Some(7))
            .unwrap();
        let mut buf = [0u8; 7];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"payload");
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let disk = LocalDisk::new(dir.path());
        let err = disk
            .open("missing.bin", &ReadSettings::default(), None)
            .unwrap_err();
        assert!(matches!(err, MarqError::IoError(_)));
    }
}
