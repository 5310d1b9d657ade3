//! Structured description of a committed edit transaction.
//!
//! Hosts that keep derived state (undo stacks, language servers, caret trackers) can replay a
//! [`TextDelta`] instead of diffing the old and new text. Offsets are **character offsets**
//! (Unicode scalar values).

/// One insertion of a committed transaction.
///
/// `start` is a character offset in the document **before** the transaction. Edits inside a
/// [`TextDelta`] are sorted by `start` descending, so applying them in order never shifts the
/// offset of an edit that has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDeltaEdit {
    /// Start character offset in the pre-edit document.
    pub start: usize,
    /// Inserted text.
    pub inserted_text: String,
}

impl TextDeltaEdit {
    /// Length of `inserted_text` in characters.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }
}

/// The change produced by one committed [`BufferEdit`](crate::BufferEdit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDelta {
    /// Buffer version before the commit.
    pub before_version: u64,
    /// Buffer version after the commit.
    pub after_version: u64,
    /// Character count before the commit.
    pub before_char_count: usize,
    /// Character count after the commit.
    pub after_char_count: usize,
    /// Insertions, sorted by `start` descending.
    pub edits: Vec<TextDeltaEdit>,
}

impl TextDelta {
    /// Returns `true` if this delta contains no edits.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Total number of inserted characters.
    pub fn inserted_chars(&self) -> usize {
        self.edits.iter().map(TextDeltaEdit::inserted_len).sum()
    }

    /// Map a pre-edit character offset to its post-edit position.
    ///
    /// An insertion exactly at `offset` pushes it forward, like text typed before a caret.
    pub fn map_offset(&self, offset: usize) -> usize {
        let shift: usize = self
            .edits
            .iter()
            .filter(|edit| edit.start <= offset)
            .map(TextDeltaEdit::inserted_len)
            .sum();
        offset + shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta() -> TextDelta {
        TextDelta {
            before_version: 0,
            after_version: 1,
            before_char_count: 10,
            after_char_count: 13,
            edits: vec![
                TextDeltaEdit {
                    start: 8,
                    inserted_text: " ".to_string(),
                },
                TextDeltaEdit {
                    start: 2,
                    inserted_text: "  ".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_inserted_chars() {
        assert_eq!(delta().inserted_chars(), 3);
        assert!(!delta().is_empty());
    }

    #[test]
    fn test_map_offset() {
        let delta = delta();
        assert_eq!(delta.map_offset(0), 0);
        assert_eq!(delta.map_offset(2), 4);
        assert_eq!(delta.map_offset(5), 7);
        assert_eq!(delta.map_offset(9), 12);
    }
}
