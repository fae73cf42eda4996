//! Test and benchmark utilities.
//!
//! This module is only available when the `testutil` feature is enabled.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::block::{CompressionMethod, compress_block};
use crate::core::MarqError;
use crate::marks::format::encode_mark;
use crate::marks::{GranularityInfo, Mark};

/// A written `.bin`/`.mrk` pair, with everything a test needs to open a
/// reader stream over it.
#[derive(Debug)]
pub struct WrittenColumn {
    pub path_prefix: String,
    pub marks: Vec<Mark>,
    pub file_size: u64,
}

impl WrittenColumn {
    pub fn marks_count(&self) -> usize {
        self.marks.len()
    }
}

/// Builds a compressed column file plus its marks file.
///
/// Row groups added between block boundaries share one physical block; each
/// row group gets a mark pointing at the block start and the group's byte
/// offset inside the decompressed block.
pub struct ColumnFileBuilder {
    method: CompressionMethod,
    blocks: Vec<Vec<Vec<u8>>>,
    current: Vec<Vec<u8>>,
}

impl ColumnFileBuilder {
    pub fn new(method: CompressionMethod) -> Self {
        Self {
            method,
            blocks: Vec::new(),
            current: Vec::new(),
        }
    }

    /// Add one row group to the block currently being built.
    pub fn add_row_group(&mut self, data: impl Into<Vec<u8>>) -> &mut Self {
        self.current.push(data.into());
        self
    }

    /// Close the current block; the next row group starts a new one.
    pub fn end_block(&mut self) -> &mut Self {
        if !self.current.is_empty() {
            self.blocks.push(std::mem::take(&mut self.current));
        }
        self
    }

    /// Write `<prefix>.bin` and `<prefix>.mrk` under `dir`.
    pub fn write(&mut self, dir: &Path, path_prefix: &str) -> Result<WrittenColumn, MarqError> {
        self.end_block();

        let mut bin = Vec::new();
        let mut marks = Vec::new();
        for groups in &self.blocks {
            let block_offset = bin.len() as u64;
            let mut in_block = 0u32;
            let mut payload = Vec::new();
            for group in groups {
                marks.push(Mark::new(block_offset, in_block));
                in_block += group.len() as u32;
                payload.extend_from_slice(group);
            }
            bin.extend(compress_block(self.method, &payload)?);
        }

        let mut mrk = Vec::new();
        for mark in &marks {
            encode_mark(mark, &mut mrk);
        }

        let bin_path = dir.join(format!("{path_prefix}.bin"));
        if let Some(parent) = bin_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MarqError::IoError(format!("creating {}: {e}", parent.display())))?;
        }
        let file_size = bin.len() as u64;
        std::fs::write(&bin_path, bin)
            .map_err(|e| MarqError::IoError(format!("writing {}: {e}", bin_path.display())))?;

        let info = GranularityInfo::default();
        let mrk_path = dir.join(info.marks_file_path(path_prefix));
        std::fs::write(&mrk_path, mrk)
            .map_err(|e| MarqError::IoError(format!("writing {}: {e}", mrk_path.display())))?;

        Ok(WrittenColumn {
            path_prefix: path_prefix.to_string(),
            marks,
            file_size,
        })
    }
}

/// Deterministic row-group payloads: `count` groups of `len` bytes each,
/// seeded so runs are reproducible.
pub fn deterministic_row_groups(count: usize, len: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect())
        .collect()
}

/// A column with `blocks` blocks of `groups_per_block` row groups each, every
/// group `group_len` bytes. Returns the builder output.
pub fn write_uniform_column(
    dir: &Path,
    path_prefix: &str,
    method: CompressionMethod,
    blocks: usize,
    groups_per_block: usize,
    group_len: usize,
) -> Result<WrittenColumn, MarqError> {
    let groups = deterministic_row_groups(blocks * groups_per_block, group_len, 42);
    let mut builder = ColumnFileBuilder::new(method);
    for (i, group) in groups.into_iter().enumerate() {
        builder.add_row_group(group);
        if (i + 1) % groups_per_block == 0 {
            builder.end_block();
        }
    }
    builder.write(dir, path_prefix)
}
