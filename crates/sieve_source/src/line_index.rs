//! Line-start indexing for fast line/column lookup.

/// Precomputed line starts of a text buffer.
pub struct LineIndex {
    /// Byte offsets of each line start (the first entry is always 0).
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Indexes the line starts of `content`.
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in content.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// Converts a byte offset into 1-indexed (line, column) coordinates.
    ///
    /// Columns count bytes, matching how the lexer reports positions.
    pub fn line_col(&self, byte_offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line = (line_idx as u32) + 1;
        let col = byte_offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Returns the number of lines in the indexed text.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_starts_computation() {
        let idx = LineIndex::new("abc\ndef\nghi");
        assert_eq!(idx.line_starts, vec![0, 4, 8]);
        assert_eq!(idx.line_count(), 3);
    }

    #[test]
    fn line_col_resolution() {
        let idx = LineIndex::new("abc\ndef\nghi");
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(4), (2, 1));
        assert_eq!(idx.line_col(5), (2, 2));
        assert_eq!(idx.line_col(8), (3, 1));
    }

    #[test]
    fn offset_at_end_of_text() {
        let idx = LineIndex::new("ab\n");
        assert_eq!(idx.line_col(3), (2, 1));
    }

    #[test]
    fn empty_text() {
        let idx = LineIndex::new("");
        assert_eq!(idx.line_col(0), (1, 1));
    }
}
