//! Editor-neutral document and selection types.

use serde::{Deserialize, Serialize};

/// A 0-based line and character position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// A selection between two positions. `start` may come after `end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    /// Create a new selection.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Select whole lines `start_line..=end_line`.
    pub fn lines(start_line: usize, end_line: usize) -> Self {
        Self {
            start: Position::new(start_line, 0),
            end: Position::new(end_line, usize::MAX),
        }
    }

    /// The selection with `start <= end`.
    pub fn ordered(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }
}

/// An open source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocument {
    /// File name or path as shown by the editor.
    pub file_name: String,

    /// Editor language id, e.g. `javascript` or `typescriptreact`.
    pub language_id: String,

    /// Full document text.
    pub text: String,
}

impl TextDocument {
    /// Create a new document.
    pub fn new(
        file_name: impl Into<String>,
        language_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            language_id: language_id.into(),
            text: text.into(),
        }
    }

    /// Byte ranges of each line, excluding the line terminator.
    pub fn line_ranges(&self) -> Vec<(usize, usize)> {
        let mut ranges = Vec::new();
        let mut start = 0;
        for line in self.text.split_inclusive('\n') {
            let content = line.trim_end_matches('\n').trim_end_matches('\r');
            ranges.push((start, start + content.len()));
            start += line.len();
        }
        if ranges.is_empty() || self.text.ends_with('\n') {
            ranges.push((start, start));
        }
        ranges
    }

    /// Number of lines, counting a trailing empty line.
    pub fn line_count(&self) -> usize {
        self.line_ranges().len()
    }

    /// Text of one line, or `None` past the end.
    pub fn line(&self, line: usize) -> Option<&str> {
        let (start, end) = *self.line_ranges().get(line)?;
        self.text.get(start..end)
    }

    /// Byte offset of a position, clamped to the document.
    ///
    /// Lines past the end clamp to the last line; characters past the end of
    /// a line clamp to the line end.
    pub fn offset_at(&self, position: Position) -> usize {
        let ranges = self.line_ranges();
        let Some(&(start, end)) = ranges.get(position.line.min(ranges.len() - 1)) else {
            return 0;
        };
        let line = self.text.get(start..end).unwrap_or_default();
        let within = line
            .char_indices()
            .nth(position.character)
            .map_or(line.len(), |(i, _)| i);
        start + within
    }

    /// Position clamped to the document.
    pub fn clamp(&self, position: Position) -> Position {
        let ranges = self.line_ranges();
        let line = position.line.min(ranges.len() - 1);
        let (start, end) = ranges[line];
        let chars = self.text.get(start..end).map_or(0, |l| l.chars().count());
        Position::new(line, position.character.min(chars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_ranges_handle_crlf_and_trailing_newline() {
        let doc = TextDocument::new("a.js", "javascript", "ab\r\ncd\n");
        assert_eq!(doc.line_ranges(), vec![(0, 2), (4, 6), (7, 7)]);
        assert_eq!(doc.line(1), Some("cd"));
        assert_eq!(doc.line(2), Some(""));
        assert_eq!(doc.line(3), None);
    }

    #[test]
    fn test_empty_document_has_one_line() {
        let doc = TextDocument::new("a.js", "javascript", "");
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.offset_at(Position::new(10, 10)), 0);
    }

    #[test]
    fn test_offset_clamps() {
        let doc = TextDocument::new("a.js", "javascript", "let x;\nlet y;");
        assert_eq!(doc.offset_at(Position::new(0, 4)), 4);
        assert_eq!(doc.offset_at(Position::new(0, 99)), 6);
        assert_eq!(doc.offset_at(Position::new(1, 0)), 7);
        assert_eq!(doc.offset_at(Position::new(99, 0)), 7);
        assert_eq!(doc.clamp(Position::new(99, 99)), Position::new(1, 6));
    }

    #[test]
    fn test_offset_counts_chars() {
        let doc = TextDocument::new("a.js", "javascript", "é = 1");
        assert_eq!(doc.offset_at(Position::new(0, 1)), 2);
    }

    #[test]
    fn test_reversed_selection_is_ordered() {
        let sel = Selection::new(Position::new(3, 0), Position::new(1, 2)).ordered();
        assert_eq!(sel.start, Position::new(1, 2));
        assert_eq!(sel.end, Position::new(3, 0));
    }
}
