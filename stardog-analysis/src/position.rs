//! Offset ⇄ line/character conversion and token lookup.
//!
//! Offsets are byte offsets into the document text. LSP positions count
//! characters in UTF-16 code units. `\n`, `\r\n` and a lone `\r` all end a
//! line. Both directions are total over `[0, len]`: anything out of range is
//! clamped rather than rejected.

use lsp_types::{Position, Range};

use crate::token::Token;

#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        for (idx, byte) in bytes.iter().enumerate() {
            match byte {
                b'\n' => line_starts.push(idx + 1),
                b'\r' if bytes.get(idx + 1) != Some(&b'\n') => line_starts.push(idx + 1),
                _ => {}
            }
        }
        Self { text, line_starts }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn offset_to_position(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        let line_start = self.line_starts[line];
        let character = self.text[line_start..offset].encode_utf16().count();
        Position::new(line as u32, character as u32)
    }

    pub fn position_to_offset(&self, position: Position) -> usize {
        let line = position.line as usize;
        let Some(&line_start) = self.line_starts.get(line) else {
            return self.text.len();
        };
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());

        let target = position.character as usize;
        let mut units = 0;
        for (idx, ch) in self.text[line_start..line_end].char_indices() {
            if units >= target || units + ch.len_utf16() > target {
                return line_start + idx;
            }
            units += ch.len_utf16();
        }
        line_end
    }

    /// Range covering `start..end` (end exclusive).
    pub fn range(&self, start: usize, end: usize) -> Range {
        Range::new(self.offset_to_position(start), self.offset_to_position(end.max(start)))
    }
}

/// Index of the first token whose inclusive span, widened by one on the
/// right, contains `offset`.
pub fn find_token_index_at(tokens: &[Token], offset: usize) -> Option<usize> {
    tokens
        .iter()
        .position(|token| token.start_offset <= offset && offset <= token.end_offset + 1)
}

pub fn find_token_at(tokens: &[Token], offset: usize) -> Option<&Token> {
    find_token_index_at(tokens, offset).map(|idx| &tokens[idx])
}
