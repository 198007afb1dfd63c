//! Overlapping text chunker.
//!
//! Windows are measured in characters, not bytes, so multi-byte text never
//! splits inside a code point. When a window does not reach the end of the
//! text, the cut moves back to the last sentence terminator found inside the
//! overlap region, if any.

use crate::domain::foundation::ValidationError;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

const TERMINATORS: &[char] = &['.', '!', '?', '\n'];

/// Splits text into overlapping windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl TextChunker {
    /// # Errors
    ///
    /// - `OutOfRange` if `chunk_size` is zero or `overlap >= chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ValidationError> {
        if chunk_size == 0 {
            return Err(ValidationError::out_of_range("chunk_size", 1.0, f64::MAX, 0.0));
        }
        if overlap >= chunk_size {
            return Err(ValidationError::out_of_range(
                "chunk_overlap",
                0.0,
                (chunk_size - 1) as f64,
                overlap as f64,
            ));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Splits `text` into trimmed, non-empty chunks in order.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = (start + self.chunk_size).min(len);
            if end < len {
                end = self.sentence_cut(&chars, start, end);
            }

            let piece: String = chars[start..end].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }

            if end >= len {
                break;
            }
            start = end.saturating_sub(self.overlap).max(start + 1);
        }

        chunks
    }

    /// Last terminator inside the overlap region, or `end` if there is none.
    fn sentence_cut(&self, chars: &[char], start: usize, end: usize) -> usize {
        let region_start = end.saturating_sub(self.overlap).max(start + 1);
        (region_start..end)
            .rev()
            .find(|&i| {
                TERMINATORS.contains(&chars[i]) && chars.get(i + 1).map_or(true, |next| next.is_whitespace())
            })
            .map_or(end, |i| i + 1)
    }
}
