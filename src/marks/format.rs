use crate::core::MarqError;

/// On-disk size of one mark entry: offset_in_file (u64) + offset_in_block (u32).
pub const MARK_ENTRY_SIZE: usize = 12;

/// Index entry pointing into a column file: the physical offset of a block
/// start, plus the byte offset inside the decompressed block where the row
/// group begins. Offsets are non-decreasing across increasing mark index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub offset_in_file: u64,
    pub offset_in_block: u32,
}

impl Mark {
    pub fn new(offset_in_file: u64, offset_in_block: u32) -> Self {
        Self {
            offset_in_file,
            offset_in_block,
        }
    }
}

/// Read a little-endian u64 from `data` at `offset`.
/// Caller must ensure `offset + 8 <= data.len()`.
pub(crate) fn read_u64_le(data: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(data[offset..offset + 8].try_into().unwrap())
}

/// Read a little-endian u32 from `data` at `offset`.
/// Caller must ensure `offset + 4 <= data.len()`.
pub(crate) fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

/// Decode a dense `.mrk` payload into a mark array.
pub(crate) fn decode_marks(data: &[u8], path_label: &str) -> Result<Vec<Mark>, MarqError> {
    if data.len() % MARK_ENTRY_SIZE != 0 {
        return Err(MarqError::MarksError(format!(
            "bad size of marks file '{path_label}': {} bytes is not a multiple of {MARK_ENTRY_SIZE}",
            data.len()
        )));
    }
    let marks = data
        .chunks_exact(MARK_ENTRY_SIZE)
        .map(|entry| Mark::new(read_u64_le(entry, 0), read_u32_le(entry, 8)))
        .collect();
    Ok(marks)
}

/// Append one mark entry in the on-disk layout.
pub(crate) fn encode_mark(mark: &Mark, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&mark.offset_in_file.to_le_bytes());
    buf.extend_from_slice(&mark.offset_in_block.to_le_bytes());
}
