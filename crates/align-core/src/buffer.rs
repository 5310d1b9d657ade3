//! Text buffer, snapshots and edit transactions.
//!
//! [`TextBuffer`] stores the document in a [`Rope`], which gives O(log N) line access and cheap,
//! structurally shared clones. Every committed modification bumps the buffer version; a
//! [`BufferSnapshot`] remembers the version it was taken at, so edits planned against a snapshot
//! can detect that the buffer moved on underneath them.
//!
//! Edits are grouped in a [`BufferEdit`] transaction: insertions are validated against the
//! snapshot as they are queued and committed all at once by [`BufferEdit::apply`]. Dropping a
//! transaction without applying it leaves the buffer untouched.

use crate::delta::{TextDelta, TextDeltaEdit};
use crate::error::BufferError;
use ropey::{Rope, RopeSlice};
use std::cmp::Reverse;

/// Number of trailing line-break chars at the end of a rope line (0, 1 or 2 for `"\r\n"`).
fn line_break_len(line: RopeSlice<'_>) -> usize {
    let len = line.len_chars();
    if len == 0 {
        return 0;
    }

    let last = line.char(len - 1);
    if last == '\n' {
        if len >= 2 && line.char(len - 2) == '\r' {
            2
        } else {
            1
        }
    } else if matches!(
        last,
        '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    ) {
        1
    } else {
        0
    }
}

/// An immutable view of a [`TextBuffer`] at one version.
///
/// Cloning the underlying rope is O(1), so taking a snapshot never copies the document.
#[derive(Debug, Clone)]
pub struct BufferSnapshot {
    rope: Rope,
    version: u64,
}

impl BufferSnapshot {
    /// Version of the buffer when this snapshot was taken.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Total line count. An empty document has one (empty) line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total character count.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    fn content_len(&self, line: usize) -> usize {
        let slice = self.rope.line(line);
        slice.len_chars() - line_break_len(slice)
    }

    /// Characters of `line`, excluding its line break.
    pub fn line_chars(&self, line: usize) -> Option<impl Iterator<Item = char> + '_> {
        if line >= self.line_count() {
            return None;
        }
        let len = self.content_len(line);
        Some(self.rope.line(line).chars().take(len))
    }

    /// Text of `line`, excluding its line break.
    pub fn line_text(&self, line: usize) -> Option<String> {
        self.line_chars(line).map(|chars| chars.collect())
    }

    /// Character offset of the first character of `line`.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        (line < self.line_count()).then(|| self.rope.line_to_char(line))
    }

    /// Character offset just past the last character of `line` (before its line break).
    pub fn line_end(&self, line: usize) -> Option<usize> {
        self.line_start(line)
            .map(|start| start + self.content_len(line))
    }

    /// Line containing the character offset (offsets past the end map to the last line).
    pub fn line_of_offset(&self, char_offset: usize) -> usize {
        let char_offset = char_offset.min(self.rope.len_chars());
        self.rope.char_to_line(char_offset)
    }

    /// Character at `char_offset`, if any.
    pub fn char_at(&self, char_offset: usize) -> Option<char> {
        (char_offset < self.rope.len_chars()).then(|| self.rope.char(char_offset))
    }

    /// Convert a character offset to `(line, column)`.
    pub fn char_offset_to_position(&self, char_offset: usize) -> (usize, usize) {
        let char_offset = char_offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(char_offset);
        (line, char_offset - self.rope.line_to_char(line))
    }

    /// Convert `(line, column)` to a character offset.
    ///
    /// The column is clamped to the line content; lines past the end map to the end of the text.
    pub fn position_to_char_offset(&self, line: usize, column: usize) -> usize {
        if line >= self.line_count() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(line) + column.min(self.content_len(line))
    }

    /// Complete text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }
}

/// A mutable, versioned text document.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    version: u64,
}

impl TextBuffer {
    /// Create a buffer holding `text`, at version 0.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            version: 0,
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Current version (incremented by every committed transaction).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Take an immutable snapshot of the current contents.
    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            rope: self.rope.clone(),
            version: self.version,
        }
    }

    /// Whether `snapshot` still reflects the current contents.
    pub fn is_current(&self, snapshot: &BufferSnapshot) -> bool {
        snapshot.version == self.version
    }

    /// Total line count.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total character count.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Complete text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text of `line`, excluding its line break.
    pub fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.rope.len_lines() {
            return None;
        }
        let slice = self.rope.line(line);
        let len = slice.len_chars() - line_break_len(slice);
        Some(slice.chars().take(len).collect())
    }

    /// Start a transaction planned against `snapshot`.
    pub fn create_edit(&mut self, snapshot: &BufferSnapshot) -> BufferEdit<'_> {
        BufferEdit {
            snapshot_version: snapshot.version,
            snapshot_len: snapshot.char_count(),
            buffer: self,
            inserts: Vec::new(),
        }
    }

    /// Insert `text` at `char_offset` as a single-edit transaction.
    pub fn insert(&mut self, char_offset: usize, text: &str) -> Result<TextDelta, BufferError> {
        let snapshot = self.snapshot();
        let mut edit = self.create_edit(&snapshot);
        edit.insert(char_offset, text)?;
        edit.apply()
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

/// A pending, all-or-nothing set of insertions against one snapshot.
///
/// Offsets are interpreted in the snapshot's coordinates. Nothing touches the buffer until
/// [`BufferEdit::apply`] succeeds; dropping the transaction abandons it.
#[derive(Debug)]
pub struct BufferEdit<'a> {
    buffer: &'a mut TextBuffer,
    snapshot_version: u64,
    snapshot_len: usize,
    inserts: Vec<(usize, String)>,
}

impl BufferEdit<'_> {
    /// Queue an insertion of `text` at `char_offset` (snapshot coordinates).
    pub fn insert(&mut self, char_offset: usize, text: &str) -> Result<(), BufferError> {
        if text.is_empty() {
            return Err(BufferError::EmptyInsert);
        }
        if char_offset > self.snapshot_len {
            return Err(BufferError::InvalidOffset {
                offset: char_offset,
                len: self.snapshot_len,
            });
        }
        self.inserts.push((char_offset, text.to_string()));
        Ok(())
    }

    /// Number of queued insertions.
    pub fn len(&self) -> usize {
        self.inserts.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
    }

    /// Commit every queued insertion at once.
    ///
    /// Fails with [`BufferError::StaleSnapshot`] (and writes nothing) if the buffer changed since
    /// the snapshot was taken. On success the version is bumped by exactly one; an empty
    /// transaction commits nothing and keeps the version.
    pub fn apply(self) -> Result<TextDelta, BufferError> {
        let BufferEdit {
            buffer,
            snapshot_version,
            inserts,
            ..
        } = self;

        if buffer.version != snapshot_version {
            return Err(BufferError::StaleSnapshot {
                snapshot_version,
                current_version: buffer.version,
            });
        }

        if inserts.is_empty() {
            let char_count = buffer.rope.len_chars();
            return Ok(TextDelta {
                before_version: buffer.version,
                after_version: buffer.version,
                before_char_count: char_count,
                after_char_count: char_count,
                edits: Vec::new(),
            });
        }

        // Highest offset first keeps lower offsets valid; ties keep queue order in the result.
        let mut ordered: Vec<(usize, usize, String)> = inserts
            .into_iter()
            .enumerate()
            .map(|(seq, (offset, text))| (offset, seq, text))
            .collect();
        ordered.sort_by_key(|(offset, seq, _)| (Reverse(*offset), Reverse(*seq)));

        let before_char_count = buffer.rope.len_chars();
        let mut rope = buffer.rope.clone();
        for (offset, _, text) in &ordered {
            rope.insert(*offset, text);
        }

        let before_version = buffer.version;
        buffer.rope = rope;
        buffer.version += 1;

        Ok(TextDelta {
            before_version,
            after_version: buffer.version,
            before_char_count,
            after_char_count: buffer.rope.len_chars(),
            edits: ordered
                .into_iter()
                .map(|(start, _, inserted_text)| TextDeltaEdit {
                    start,
                    inserted_text,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_has_one_line() {
        let buffer = TextBuffer::empty();
        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.line_count(), 1);
        assert_eq!(snapshot.line_text(0).as_deref(), Some(""));
        assert_eq!(snapshot.line_text(1), None);
    }

    #[test]
    fn test_line_text_excludes_breaks() {
        let buffer = TextBuffer::new("a = 1\r\nbb = 2\nc");
        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.line_count(), 3);
        assert_eq!(snapshot.line_text(0).as_deref(), Some("a = 1"));
        assert_eq!(snapshot.line_text(1).as_deref(), Some("bb = 2"));
        assert_eq!(snapshot.line_text(2).as_deref(), Some("c"));
        assert_eq!(snapshot.line_end(0), Some(5));
        assert_eq!(snapshot.line_start(1), Some(7));
        assert_eq!(buffer.line_text(1).as_deref(), Some("bb = 2"));
    }

    #[test]
    fn test_trailing_newline_adds_empty_line() {
        let snapshot = TextBuffer::new("x = 1\n").snapshot();
        assert_eq!(snapshot.line_count(), 2);
        assert_eq!(snapshot.line_text(1).as_deref(), Some(""));
    }

    #[test]
    fn test_position_conversions() {
        let snapshot = TextBuffer::new("ABC\nDEF\nGHI").snapshot();

        assert_eq!(snapshot.char_offset_to_position(0), (0, 0));
        assert_eq!(snapshot.char_offset_to_position(4), (1, 0));
        assert_eq!(snapshot.char_offset_to_position(100), (2, 3));

        assert_eq!(snapshot.position_to_char_offset(1, 2), 6);
        assert_eq!(snapshot.position_to_char_offset(0, 99), 3);
        assert_eq!(snapshot.position_to_char_offset(9, 0), 11);

        assert_eq!(snapshot.line_of_offset(5), 1);
        assert_eq!(snapshot.char_at(4), Some('D'));
        assert_eq!(snapshot.char_at(11), None);
    }

    #[test]
    fn test_utf8_cjk_offsets_are_chars() {
        let snapshot = TextBuffer::new("你好\n世界").snapshot();
        assert_eq!(snapshot.char_count(), 5);
        assert_eq!(snapshot.line_start(1), Some(3));
        assert_eq!(snapshot.char_offset_to_position(3), (1, 0));
    }

    #[test]
    fn test_transaction_commits_all_inserts() {
        let mut buffer = TextBuffer::new("a = 1\nbb = 2");
        let snapshot = buffer.snapshot();

        let mut edit = buffer.create_edit(&snapshot);
        edit.insert(1, " ").unwrap();
        edit.insert(8, "  ").unwrap();
        assert_eq!(edit.len(), 2);
        let delta = edit.apply().unwrap();

        assert_eq!(buffer.text(), "a  = 1\nbb   = 2");
        assert_eq!(buffer.version(), 1);
        assert_eq!(delta.before_version, 0);
        assert_eq!(delta.after_version, 1);
        assert_eq!(delta.edits[0].start, 8);
        assert_eq!(delta.edits[1].start, 1);
        assert_eq!(delta.after_char_count, delta.before_char_count + 3);
    }

    #[test]
    fn test_empty_transaction_keeps_version() {
        let mut buffer = TextBuffer::new("abc");
        let snapshot = buffer.snapshot();
        let delta = buffer.create_edit(&snapshot).apply().unwrap();
        assert!(delta.is_empty());
        assert_eq!(delta.before_version, delta.after_version);
        assert_eq!(buffer.version(), 0);
    }

    #[test]
    fn test_inserts_at_same_offset_keep_queue_order() {
        let mut buffer = TextBuffer::new("x");
        let snapshot = buffer.snapshot();
        let mut edit = buffer.create_edit(&snapshot);
        edit.insert(0, "a").unwrap();
        edit.insert(0, "b").unwrap();
        edit.apply().unwrap();
        assert_eq!(buffer.text(), "abx");
    }

    #[test]
    fn test_stale_snapshot_aborts() {
        let mut buffer = TextBuffer::new("a = 1");
        let snapshot = buffer.snapshot();
        buffer.insert(0, "// ").unwrap();

        let mut edit = buffer.create_edit(&snapshot);
        edit.insert(1, " ").unwrap();
        let err = edit.apply().unwrap_err();

        assert_eq!(
            err,
            BufferError::StaleSnapshot {
                snapshot_version: 0,
                current_version: 1
            }
        );
        assert_eq!(buffer.text(), "// a = 1");
        assert_eq!(buffer.version(), 1);
    }

    #[test]
    fn test_invalid_insert_rejected() {
        let mut buffer = TextBuffer::new("abc");
        let snapshot = buffer.snapshot();
        let mut edit = buffer.create_edit(&snapshot);
        assert_eq!(
            edit.insert(4, " "),
            Err(BufferError::InvalidOffset { offset: 4, len: 3 })
        );
        assert_eq!(edit.insert(0, ""), Err(BufferError::EmptyInsert));
        assert!(edit.is_empty());
    }

    #[test]
    fn test_dropped_transaction_leaves_buffer_untouched() {
        let mut buffer = TextBuffer::new("abc");
        let snapshot = buffer.snapshot();
        {
            let mut edit = buffer.create_edit(&snapshot);
            edit.insert(0, "zzz").unwrap();
        }
        assert_eq!(buffer.text(), "abc");
        assert!(buffer.is_current(&snapshot));
    }
}
