use bytes::Bytes;

use crate::core::MarqError;
use crate::io::FileReader;
use crate::marks::format::read_u32_le;

/// Block frame layout, little-endian:
/// `[checksum u32][method u8][compressed_size u32][decompressed_size u32][payload]`
///
/// The checksum is CRC32 over everything after the checksum field.
/// `compressed_size` counts the payload only.
pub(crate) const BLOCK_HEADER_SIZE: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    None,
    Lz4,
    Zstd,
}

impl CompressionMethod {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            CompressionMethod::None => 0,
            CompressionMethod::Lz4 => 1,
            CompressionMethod::Zstd => 2,
        }
    }

    pub(crate) fn from_byte(byte: u8, path: &str, offset: u64) -> Result<Self, MarqError> {
        match byte {
            0 => Ok(CompressionMethod::None),
            1 => Ok(CompressionMethod::Lz4),
            2 => Ok(CompressionMethod::Zstd),
            other => Err(MarqError::CorruptedBlock(format!(
                "unknown compression method {other} in '{path}' at offset {offset}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockHeader {
    pub checksum: u32,
    pub method: CompressionMethod,
    pub compressed_size: u32,
    pub decompressed_size: u32,
}

impl BlockHeader {
    pub(crate) fn parse(
        data: &[u8; BLOCK_HEADER_SIZE],
        path: &str,
        offset: u64,
    ) -> Result<Self, MarqError> {
        Ok(Self {
            checksum: read_u32_le(data, 0),
            method: CompressionMethod::from_byte(data[4], path, offset)?,
            compressed_size: read_u32_le(data, 5),
            decompressed_size: read_u32_le(data, 9),
        })
    }
}

fn checksum_of(method: CompressionMethod, compressed: &[u8], decompressed_size: u32) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&[method.to_byte()]);
    hasher.update(&(compressed.len() as u32).to_le_bytes());
    hasher.update(&decompressed_size.to_le_bytes());
    hasher.update(compressed);
    hasher.finalize()
}

/// Compress `data` into one full block frame (header + payload).
pub fn compress_block(method: CompressionMethod, data: &[u8]) -> Result<Vec<u8>, MarqError> {
    let payload = match method {
        CompressionMethod::None => data.to_vec(),
        CompressionMethod::Lz4 => lz4::block::compress(data, None, false)
            .map_err(|e| MarqError::IoError(format!("lz4 compression failed: {e}")))?,
        CompressionMethod::Zstd => zstd::bulk::compress(data, zstd::DEFAULT_COMPRESSION_LEVEL)
            .map_err(|e| MarqError::IoError(format!("zstd compression failed: {e}")))?,
    };

    let checksum = checksum_of(method, &payload, data.len() as u32);
    let mut frame = Vec::with_capacity(BLOCK_HEADER_SIZE + payload.len());
    frame.extend_from_slice(&checksum.to_le_bytes());
    frame.push(method.to_byte());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&(data.len() as u32).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

fn decompress_payload(
    header: &BlockHeader,
    payload: &[u8],
    path: &str,
    offset: u64,
) -> Result<Vec<u8>, MarqError> {
    let decompressed = match header.method {
        CompressionMethod::None => payload.to_vec(),
        CompressionMethod::Lz4 => {
            let mut buf = vec![0u8; header.decompressed_size as usize];
            let size =
                lz4::block::decompress_to_buffer(payload, Some(header.decompressed_size as i32), &mut buf)
                    .map_err(|e| {
                        MarqError::CorruptedBlock(format!(
                            "lz4 decompression failed in '{path}' at offset {offset}: {e}"
                        ))
                    })?;
            buf.truncate(size);
            buf
        }
        CompressionMethod::Zstd => {
            zstd::bulk::decompress(payload, header.decompressed_size as usize).map_err(|e| {
                MarqError::CorruptedBlock(format!(
                    "zstd decompression failed in '{path}' at offset {offset}: {e}"
                ))
            })?
        }
    };

    if decompressed.len() != header.decompressed_size as usize {
        return Err(MarqError::CorruptedBlock(format!(
            "decompressed size mismatch in '{path}' at offset {offset}: header says {}, got {}",
            header.decompressed_size,
            decompressed.len()
        )));
    }
    Ok(decompressed)
}

/// Read and decode the block frame starting at `offset`, leaving the file
/// positioned right after it. Returns the decompressed bytes and the physical
/// offset of the next block.
pub(crate) fn read_block_at(
    file: &mut FileReader,
    path: &str,
    offset: u64,
    verify_checksum: bool,
) -> Result<(Bytes, u64), MarqError> {
    if file.position() != offset {
        file.seek(offset)?;
    }

    let mut header_buf = [0u8; BLOCK_HEADER_SIZE];
    file.read_exact(&mut header_buf)?;
    let header = BlockHeader::parse(&header_buf, path, offset)?;

    let mut payload = vec![0u8; header.compressed_size as usize];
    file.read_exact(&mut payload)?;

    if verify_checksum {
        let actual = checksum_of(header.method, &payload, header.decompressed_size);
        if actual != header.checksum {
            return Err(MarqError::CorruptedBlock(format!(
                "checksum mismatch in '{path}' at offset {offset}: expected {:#010x}, got {actual:#010x}",
                header.checksum
            )));
        }
    }

    let data = decompress_payload(&header, &payload, path, offset)?;
    let next_offset = offset + BLOCK_HEADER_SIZE as u64 + header.compressed_size as u64;
    Ok((Bytes::from(data), next_offset))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn reader_over(frames: &[Vec<u8>]) -> (TempDir, FileReader) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("col.bin");
        let bytes: Vec<u8> = frames.concat();
        std::fs::write(&path, bytes).unwrap();
        let file = FileReader::open(&path, 4096).unwrap();
        (dir, file)
    }

    #[rstest]
    #[case(CompressionMethod::None)]
    #[case(CompressionMethod::Lz4)]
    #[case(CompressionMethod::Zstd)]
    fn test_compress_read_round_trip(#[case] method: CompressionMethod) {
        let data: Vec<u8> = (0..2000u32).flat_map(|i| (i % 251).to_le_bytes()).collect();
        let frame = compress_block(method, &data).unwrap();
        let (_dir, mut file) = reader_over(std::slice::from_ref(&frame));

        let (block, next) = read_block_at(&mut file, "col.bin", 0, true).unwrap();
        assert_eq!(&block[..], &data[..]);
        assert_eq!(next, frame.len() as u64);
    }

    #[test]
    fn test_two_blocks_chain() {
        let a = compress_block(CompressionMethod::Lz4, b"first block").unwrap();
        let b = compress_block(CompressionMethod::Lz4, b"second block").unwrap();
        let (_dir, mut file) = reader_over(&[a.clone(), b.clone()]);

        let (block_a, next) = read_block_at(&mut file, "col.bin", 0, true).unwrap();
        assert_eq!(&block_a[..], b"first block");
        let (block_b, end) = read_block_at(&mut file, "col.bin", next, true).unwrap();
        assert_eq!(&block_b[..], b"second block");
        assert_eq!(end, (a.len() + b.len()) as u64);
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let mut frame = compress_block(CompressionMethod::None, b"payload").unwrap();
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        let (_dir, mut file) = reader_over(std::slice::from_ref(&frame));

        let err = read_block_at(&mut file, "col.bin", 0, true).unwrap_err();
        assert!(matches!(err, MarqError::CorruptedBlock(_)));
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_checksum_skipped_when_disabled() {
        // Flip a payload byte of an uncompressed block: without verification
        // the corruption goes unnoticed.
        let mut frame = compress_block(CompressionMethod::None, b"payload").unwrap();
        let last = frame.len() - 1;
        frame[last] = b'D';
        let (_dir, mut file) = reader_over(std::slice::from_ref(&frame));

        let (block, _) = read_block_at(&mut file, "col.bin", 0, false).unwrap();
        assert_eq!(&block[..], b"payloaD");
    }

    #[test]
    fn test_unknown_method_rejected() {
        let mut frame = compress_block(CompressionMethod::None, b"x").unwrap();
        frame[4] = 9;
        let (_dir, mut file) = reader_over(std::slice::from_ref(&frame));

        let err = read_block_at(&mut file, "col.bin", 0, false).unwrap_err();
        assert!(err.to_string().contains("unknown compression method"));
    }

    #[test]
    fn test_truncated_frame_is_io_error() {
        let frame = compress_block(CompressionMethod::Lz4, b"some data worth keeping").unwrap();
        let truncated = frame[..frame.len() - 4].to_vec();
        let (_dir, mut file) = reader_over(std::slice::from_ref(&truncated));

        let err = read_block_at(&mut file, "col.bin", 0, true).unwrap_err();
        assert!(matches!(err, MarqError::IoError(_)));
    }
}
