//! Character-offset helpers.
//!
//! Candidates carry Unicode scalar offsets while `regex` and string slicing
//! work in bytes. `CharIndex` converts between the two for one source text.

/// Byte positions of every character boundary in a text.
#[derive(Debug, Clone)]
pub struct CharIndex {
    // One entry per char plus the trailing `text.len()`; empty for ASCII text,
    // where byte and char offsets coincide.
    boundaries: Vec<usize>,
    byte_len: usize,
}

impl CharIndex {
    pub fn new(text: &str) -> Self {
        let boundaries = if text.is_ascii() {
            Vec::new()
        } else {
            text.char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(text.len()))
                .collect()
        };
        Self {
            boundaries,
            byte_len: text.len(),
        }
    }

    fn is_ascii(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Number of characters in the indexed text
    pub fn char_len(&self) -> usize {
        if self.is_ascii() {
            self.byte_len
        } else {
            self.boundaries.len() - 1
        }
    }

    /// Character offset of a byte offset, if it falls on a char boundary
    pub fn to_char(&self, byte: usize) -> Option<usize> {
        if self.is_ascii() {
            return (byte <= self.byte_len).then_some(byte);
        }
        self.boundaries.binary_search(&byte).ok()
    }

    /// Byte offset of a character offset
    pub fn to_byte(&self, char_offset: usize) -> Option<usize> {
        if self.is_ascii() {
            return (char_offset <= self.byte_len).then_some(char_offset);
        }
        self.boundaries.get(char_offset).copied()
    }

    /// Slice `text` by character range `[start, end)`
    pub fn slice<'a>(&self, text: &'a str, start: usize, end: usize) -> Option<&'a str> {
        if start > end {
            return None;
        }
        let from = self.to_byte(start)?;
        let to = self.to_byte(end)?;
        text.get(from..to)
    }
}
