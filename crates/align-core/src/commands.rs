//! Command Interface Layer
//!
//! The align command is host-agnostic: any editor binding implements [`AlignHost`] (buffer,
//! caret, selection, tab size) and invokes [`AlignAssignments`]. [`EditorSession`] is the
//! in-memory host used by the terminal front end and by tests.
//!
//! # Example
//!
//! ```rust
//! use align_core::{AlignAssignments, AlignConfig, AlignHost, AlignOutcome, EditorSession, Position};
//!
//! let mut session = EditorSession::new("x = 1\nlonger = 2\nmid = 3", AlignConfig::default());
//! session.set_caret(Position::new(1, 0));
//!
//! let command = AlignAssignments::new(AlignConfig::default()).unwrap();
//! assert!(command.query_status(&session).enabled);
//!
//! let outcome = command.execute(&mut session);
//! assert!(matches!(outcome, AlignOutcome::Aligned { lines_padded: 2, .. }));
//! assert_eq!(session.buffer().text(), "x      = 1\nlonger = 2\nmid    = 3");
//! ```

use crate::align::AlignmentEngine;
use crate::buffer::{BufferSnapshot, TextBuffer};
use crate::config::AlignConfig;
use crate::delta::TextDelta;
use crate::error::{BufferError, ConfigError};
use std::cmp::Ordering;
use tracing::debug;

/// Position coordinates (line and column numbers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Zero-based logical line index.
    pub line: usize,
    /// Zero-based column in characters within the logical line.
    pub column: usize,
}

impl Position {
    /// Create a new logical position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Selection direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionDirection {
    /// Forward selection (from start to end)
    Forward,
    /// Backward selection (from end to start)
    Backward,
}

/// Selection range. `start` is the anchor, `end` the active end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Selection start position
    pub start: Position,
    /// Selection end position
    pub end: Position,
    /// Selection direction
    pub direction: SelectionDirection,
}

impl Selection {
    /// Create a selection from `start` (anchor) to `end` (active end).
    pub fn new(start: Position, end: Position) -> Self {
        let direction = if start <= end {
            SelectionDirection::Forward
        } else {
            SelectionDirection::Backward
        };
        Self {
            start,
            end,
            direction,
        }
    }

    /// Select whole lines `first..=last` (columns 0 to `usize::MAX`, clamped by consumers).
    pub fn lines(first: usize, last: usize) -> Self {
        Self::new(Position::new(first, 0), Position::new(last, usize::MAX))
    }

    /// `(min, max)` regardless of direction.
    pub fn ordered(&self) -> (Position, Position) {
        if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        }
    }

    /// Returns `true` if the selection is a bare caret.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the selection reaches past the line it starts on.
    pub fn is_multiline(&self) -> bool {
        let (min, max) = self.ordered();
        max.line > min.line
    }

    /// Whether `line` lies within the selected line range.
    pub fn contains_line(&self, line: usize) -> bool {
        let (min, max) = self.ordered();
        min.line <= line && line <= max.line
    }
}

/// What an editor binding provides to the align command.
pub trait AlignHost {
    /// The document being edited.
    fn buffer(&self) -> &TextBuffer;

    /// Mutable access for committing the alignment transaction.
    fn buffer_mut(&mut self) -> &mut TextBuffer;

    /// Current caret position.
    fn caret(&self) -> Position;

    /// Current selection, if any.
    fn selection(&self) -> Option<Selection>;

    /// Configured tab size.
    fn tab_width(&self) -> usize;

    /// The snapshot the view currently shows.
    ///
    /// Views that render asynchronously may lag behind the buffer; the command refuses to edit
    /// through a snapshot that is not current.
    fn view_snapshot(&self) -> BufferSnapshot {
        self.buffer().snapshot()
    }

    /// Called after a committed alignment with the snapshot the edit was planned against, e.g.
    /// to remap caret and selection.
    fn did_apply(&mut self, before: &BufferSnapshot, delta: &TextDelta) {
        let _ = (before, delta);
    }
}

/// Enablement of a command, as reported to the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// The host should show the command.
    pub supported: bool,
    /// The command is worth invoking (a hint, not a guarantee).
    pub enabled: bool,
}

/// Why an invocation changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoopReason {
    /// The caret line has no operator (or the caret is past the end of the buffer).
    NoOperatorOnCaretLine,
    /// No neighbouring line qualifies.
    SingleLineBlock,
    /// Every operator in the block already sits at the same column.
    AlreadyAligned,
}

/// Result of one invocation of [`AlignAssignments::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignOutcome {
    /// Padding was inserted.
    Aligned {
        /// Column every operator now sits at.
        target_column: usize,
        /// First line of the aligned block.
        first_line: usize,
        /// Last line of the aligned block.
        last_line: usize,
        /// Number of lines that received padding.
        lines_padded: usize,
        /// The committed change.
        delta: TextDelta,
    },
    /// Nothing to do; the buffer is untouched.
    NothingToAlign(NoopReason),
    /// The edit was abandoned (stale snapshot or invalid insertion); the buffer is untouched.
    Aborted(BufferError),
}

impl AlignOutcome {
    /// Returns `true` if the buffer changed.
    pub fn is_aligned(&self) -> bool {
        matches!(self, Self::Aligned { .. })
    }
}

/// The "align assignments" command.
#[derive(Debug, Clone, Default)]
pub struct AlignAssignments {
    engine: AlignmentEngine,
}

impl AlignAssignments {
    /// Create the command; the host's tab size overrides `config.tab_width` on each invocation.
    pub fn new(config: AlignConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            engine: AlignmentEngine::new(config)?,
        })
    }

    /// The underlying engine.
    pub fn engine(&self) -> &AlignmentEngine {
        &self.engine
    }

    /// Side-effect-free enablement query: does the caret line contain the operator?
    pub fn query_status<H: AlignHost + ?Sized>(&self, host: &H) -> CommandStatus {
        let enabled = host
            .buffer()
            .line_text(host.caret().line)
            .is_some_and(|line| self.engine.can_align(&line));
        CommandStatus {
            supported: true,
            enabled,
        }
    }

    /// Detect, plan and apply in one go.
    ///
    /// Never leaves a partial edit behind: either every planned insertion is committed or the
    /// buffer is untouched.
    pub fn execute<H: AlignHost + ?Sized>(&self, host: &mut H) -> AlignOutcome {
        let snapshot = host.view_snapshot();
        if !host.buffer().is_current(&snapshot) {
            let err = BufferError::StaleSnapshot {
                snapshot_version: snapshot.version(),
                current_version: host.buffer().version(),
            };
            debug!(%err, "align skipped");
            return AlignOutcome::Aborted(err);
        }

        let engine = self.engine.with_tab_width(host.tab_width());
        let selection = host.selection();
        let caret_line = host.caret().line;

        let Some(block) = engine.find_alignable_block(&snapshot, caret_line, selection.as_ref())
        else {
            return AlignOutcome::NothingToAlign(NoopReason::NoOperatorOnCaretLine);
        };
        if block.len() < 2 {
            return AlignOutcome::NothingToAlign(NoopReason::SingleLineBlock);
        }

        let plan = engine.build_edit_plan(&block);
        if plan.is_empty() {
            return AlignOutcome::NothingToAlign(NoopReason::AlreadyAligned);
        }

        match engine.apply_edit_plan(host.buffer_mut(), &snapshot, &plan) {
            Ok(delta) => {
                host.did_apply(&snapshot, &delta);
                AlignOutcome::Aligned {
                    target_column: plan.target_column(),
                    first_line: block.first_line(),
                    last_line: block.last_line(),
                    lines_padded: plan.len(),
                    delta,
                }
            }
            Err(err) => AlignOutcome::Aborted(err),
        }
    }
}

/// An in-memory [`AlignHost`]: buffer, caret, optional selection and settings.
#[derive(Debug, Clone)]
pub struct EditorSession {
    buffer: TextBuffer,
    caret: Position,
    selection: Option<Selection>,
    config: AlignConfig,
}

impl EditorSession {
    /// Create a session over `text` with the caret at the start.
    pub fn new(text: &str, config: AlignConfig) -> Self {
        Self::from_buffer(TextBuffer::new(text), config)
    }

    /// Create a session over an existing buffer.
    pub fn from_buffer(buffer: TextBuffer, config: AlignConfig) -> Self {
        Self {
            buffer,
            caret: Position::default(),
            selection: None,
            config,
        }
    }

    /// Session settings.
    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    /// Change the tab size used for column computation.
    pub fn set_tab_width(&mut self, tab_width: usize) {
        self.config.tab_width = tab_width.max(1);
    }

    /// Clamp `pos` to an existing line and column.
    pub fn clamp_position(&self, pos: Position) -> Position {
        let snapshot = self.buffer.snapshot();
        let line = pos.line.min(snapshot.line_count() - 1);
        let offset = snapshot.position_to_char_offset(line, pos.column);
        let (line, column) = snapshot.char_offset_to_position(offset);
        Position::new(line, column)
    }

    /// Move the caret (clamped) and drop the selection.
    pub fn set_caret(&mut self, pos: Position) {
        self.caret = self.clamp_position(pos);
        self.selection = None;
    }

    /// Move the caret to an absolute character offset.
    pub fn set_caret_offset(&mut self, char_offset: usize) {
        let (line, column) = self.buffer.snapshot().char_offset_to_position(char_offset);
        self.set_caret(Position::new(line, column));
    }

    /// Caret as an absolute character offset.
    pub fn caret_offset(&self) -> usize {
        self.buffer
            .snapshot()
            .position_to_char_offset(self.caret.line, self.caret.column)
    }

    /// Set the selection (clamped); the caret follows its active end.
    pub fn set_selection(&mut self, selection: Selection) {
        let start = self.clamp_position(selection.start);
        let end = self.clamp_position(selection.end);
        self.caret = end;
        self.selection = (start != end).then(|| Selection::new(start, end));
    }

    /// Place the caret and the selection independently (both clamped).
    ///
    /// Hosts that track the caret apart from the selection's active end use this; the caret
    /// line is what the align command starts from.
    pub fn set_caret_and_selection(&mut self, caret: Position, selection: Option<Selection>) {
        self.caret = self.clamp_position(caret);
        self.selection = selection
            .map(|sel| Selection::new(self.clamp_position(sel.start), self.clamp_position(sel.end)))
            .filter(|sel| !sel.is_empty());
    }

    /// Extend the selection (or start one at the caret) to `pos`.
    pub fn extend_selection_to(&mut self, pos: Position) {
        let anchor = self
            .selection
            .as_ref()
            .map(|sel| sel.start)
            .unwrap_or(self.caret);
        self.set_selection(Selection::new(anchor, pos));
    }

    /// Drop the selection, keeping the caret.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Text of the caret line.
    pub fn caret_line_text(&self) -> String {
        self.buffer.line_text(self.caret.line).unwrap_or_default()
    }
}

impl AlignHost for EditorSession {
    fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut TextBuffer {
        &mut self.buffer
    }

    fn caret(&self) -> Position {
        self.caret
    }

    fn selection(&self) -> Option<Selection> {
        self.selection.clone()
    }

    fn tab_width(&self) -> usize {
        self.config.tab_width
    }

    fn did_apply(&mut self, before: &BufferSnapshot, delta: &TextDelta) {
        let after = self.buffer.snapshot();
        let remap = |pos: Position| {
            let offset = delta.map_offset(before.position_to_char_offset(pos.line, pos.column));
            let (line, column) = after.char_offset_to_position(offset);
            Position::new(line, column)
        };

        self.caret = remap(self.caret);
        self.selection = self
            .selection
            .take()
            .map(|sel| Selection::new(remap(sel.start), remap(sel.end)));
    }
}
