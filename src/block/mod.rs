mod cached;
pub(crate) mod format;
mod read;

pub use cached::{CachedCompressedReader, FileFactory};
pub use format::{CompressionMethod, compress_block};
pub use read::CompressedReader;
