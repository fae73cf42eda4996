use crate::core::MarqError;
use crate::marks::MarkLoader;

/// Maps a logical mark range onto the physical byte span that has to come
/// off disk to cover it.
pub(crate) struct RangeResolver<'a> {
    marks: &'a MarkLoader,
    marks_count: usize,
    file_size: u64,
}

impl<'a> RangeResolver<'a> {
    pub fn new(marks: &'a MarkLoader, marks_count: usize, file_size: u64) -> Self {
        Self {
            marks,
            marks_count,
            file_size,
        }
    }

    /// Resolve `[left_mark, right_mark)` to `(right_physical_offset, span_bytes)`.
    ///
    /// When the range ends inside a block (`offset_in_block > 0`), the whole
    /// block has to be read, so the right edge extends to the first mark with
    /// a different physical offset. Physical blocks can be shared by many
    /// marks, e.g. a low-cardinality dictionary block, which is why the span
    /// is measured in physical bytes rather than logical marks.
    pub fn resolve(&self, left_mark: usize, right_mark: usize) -> Result<(u64, u64), MarqError> {
        // Reading the whole file is right_mark == marks_count; the right edge
        // is then the file size and no mark lookup is needed for it.
        let mut result_right_mark = right_mark;
        if right_mark < self.marks_count && self.marks.get_mark(right_mark)?.offset_in_block > 0 {
            let marks = self.marks.load()?;
            let base = marks[right_mark].offset_in_file;
            // Offsets are non-decreasing, so the leftmost differing offset is
            // the partition point of "still equal to base".
            result_right_mark =
                right_mark + marks[right_mark..].partition_point(|m| m.offset_in_file <= base);
        }

        let left_offset = if left_mark < self.marks_count {
            self.marks.get_mark(left_mark)?.offset_in_file
        } else {
            0
        };

        // No marks after the end of the range, or the tail marks collapse
        // onto the tested offset: the file size is the right edge.
        let right_offset = if result_right_mark >= self.marks_count
            || (result_right_mark + 1 == self.marks_count
                && self.marks.get_mark(result_right_mark)?.offset_in_file
                    == self.marks.get_mark(right_mark)?.offset_in_file)
        {
            self.file_size
        } else {
            self.marks.get_mark(result_right_mark)?.offset_in_file
        };

        Ok((right_offset, right_offset.saturating_sub(left_offset)))
    }
}
