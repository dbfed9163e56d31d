use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a document in its host: a file path, an LSP URI, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Zero-based line and character column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// What the core needs from an open document.
pub trait TextDocument {
    fn id(&self) -> &DocumentId;

    fn text(&self) -> &str;

    /// Convert a byte offset into a position. Offsets past the end clamp.
    fn position_at(&self, offset: usize) -> Position {
        offset_to_position(self.text(), offset)
    }

    /// Convert a position back into a byte offset. Positions past the end
    /// of a line clamp to the line end.
    fn offset_at(&self, position: Position) -> usize {
        position_to_offset(self.text(), position)
    }
}

/// An owned, in-memory document snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    id: DocumentId,
    text: String,
}

impl SourceDocument {
    pub fn new(id: DocumentId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl TextDocument for SourceDocument {
    fn id(&self) -> &DocumentId {
        &self.id
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// Convert a byte offset to a line/character position.
pub fn offset_to_position(source: &str, offset: usize) -> Position {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.bytes().filter(|b| *b == b'\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count();
    Position {
        line: line as u32,
        column: column as u32,
    }
}

/// Convert a line/character position to a byte offset.
pub fn position_to_offset(source: &str, position: Position) -> usize {
    let mut line_start = 0usize;
    for _ in 0..position.line {
        match source[line_start..].find('\n') {
            Some(i) => line_start += i + 1,
            None => return source.len(),
        }
    }
    let line = &source[line_start..];
    let line_len = line.find('\n').unwrap_or(line.len());
    let col = line[..line_len]
        .char_indices()
        .nth(position.column as usize)
        .map(|(i, _)| i)
        .unwrap_or(line_len);
    line_start + col
}

/// 1-based line number of a byte offset.
pub fn line_number_at(source: &str, offset: usize) -> usize {
    offset_to_position(source, offset).line as usize + 1
}
