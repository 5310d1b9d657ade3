//! Assignment alignment engine.
//!
//! Given a snapshot and the caret line, [`AlignmentEngine`] finds the contiguous run of lines
//! that contain the operator (default `=`), and plans space insertions so that the operator on
//! every line of the run sits at the same visual column.
//!
//! The pipeline is split in three steps so hosts can inspect each stage:
//!
//! 1. [`AlignmentEngine::find_alignable_block`] - detect the block around the caret.
//! 2. [`AlignmentEngine::build_edit_plan`] - compute the padding per line.
//! 3. [`AlignmentEngine::apply_edit_plan`] - commit the padding as one transaction.
//!
//! Detection and planning use the same column metric and never rescan the buffer, so the plan is
//! always consistent with the snapshot it was built from.
//!
//! # Example
//!
//! ```rust
//! use align_core::{AlignConfig, AlignmentEngine, TextBuffer};
//!
//! let mut buffer = TextBuffer::new("a = 1\nbb = 2");
//! let engine = AlignmentEngine::new(AlignConfig::default()).unwrap();
//!
//! let snapshot = buffer.snapshot();
//! let block = engine.find_alignable_block(&snapshot, 0, None).unwrap();
//! let plan = engine.build_edit_plan(&block);
//! engine.apply_edit_plan(&mut buffer, &snapshot, &plan).unwrap();
//!
//! assert_eq!(buffer.text(), "a  = 1\nbb = 2");
//! ```

use crate::buffer::{BufferSnapshot, TextBuffer};
use crate::commands::Selection;
use crate::config::AlignConfig;
use crate::delta::TextDelta;
use crate::error::{BufferError, ConfigError};
use crate::width::{ColumnMetric, advance_width};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Where the operator sits on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnAndOffset {
    /// Visual column of the operator (tabs expanded).
    pub column: usize,
    /// Character index within the line where padding is inserted.
    ///
    /// This is the start of the non-whitespace run glued to the operator: `x = 1` is padded
    /// right before `=`, while `x=1` is padded before `x`.
    pub offset: usize,
}

/// Scan `chars` for the first `operator`.
fn scan_line<I>(
    chars: I,
    operator: char,
    tab_width: usize,
    metric: ColumnMetric,
) -> Option<ColumnAndOffset>
where
    I: IntoIterator<Item = char>,
{
    let mut column = 0usize;
    let mut run = 0usize;

    for (index, ch) in chars.into_iter().enumerate() {
        if ch == operator {
            return Some(ColumnAndOffset {
                column,
                offset: index - run,
            });
        }

        if ch == ' ' || ch == '\t' {
            run = 0;
        } else {
            run += 1;
        }

        column += advance_width(ch, column, tab_width, metric);
    }

    None
}

/// Locate the first `=` on `line` with tab stops every `tab_width` columns.
///
/// Returns `None` when the line has no `=`.
pub fn detect_operator_column(line: &str, tab_width: usize) -> Option<ColumnAndOffset> {
    scan_line(line.chars(), '=', tab_width, ColumnMetric::Chars)
}

/// A contiguous run of lines that all contain the operator, keyed by line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentBlock {
    caret_line: usize,
    lines: BTreeMap<usize, ColumnAndOffset>,
}

impl AlignmentBlock {
    /// The line the search started from.
    pub fn caret_line(&self) -> usize {
        self.caret_line
    }

    /// Members, in line order.
    pub fn lines(&self) -> &BTreeMap<usize, ColumnAndOffset> {
        &self.lines
    }

    /// Number of member lines (at least 1).
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always `false`: a block contains at least the caret line.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First member line.
    pub fn first_line(&self) -> usize {
        self.lines.keys().next().copied().unwrap_or(self.caret_line)
    }

    /// Last member line.
    pub fn last_line(&self) -> usize {
        self.lines.keys().next_back().copied().unwrap_or(self.caret_line)
    }

    /// Largest operator column in the block.
    pub fn max_column(&self) -> usize {
        self.lines.values().map(|c| c.column).max().unwrap_or(0)
    }
}

/// Padding planned for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// Character index within the line.
    pub offset: usize,
    /// Spaces to insert.
    pub padding: String,
}

/// Insertions that align one block, keyed by line number.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditPlan {
    target_column: usize,
    insertions: BTreeMap<usize, Insertion>,
}

impl EditPlan {
    /// Column every operator ends up at.
    pub fn target_column(&self) -> usize {
        self.target_column
    }

    /// Planned insertions, in line order.
    pub fn insertions(&self) -> &BTreeMap<usize, Insertion> {
        &self.insertions
    }

    /// Number of lines that receive padding.
    pub fn len(&self) -> usize {
        self.insertions.len()
    }

    /// Returns `true` if nothing needs to change.
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty()
    }
}

/// The alignment algorithm, bound to one [`AlignConfig`].
#[derive(Debug, Clone, Default)]
pub struct AlignmentEngine {
    config: AlignConfig,
}

impl AlignmentEngine {
    /// Create an engine; fails if `config` does not validate.
    pub fn new(config: AlignConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The engine's settings.
    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    /// A copy of this engine using `tab_width` (clamped to at least 1).
    ///
    /// Hosts own the tab size setting, so the command rebinds it on every invocation.
    pub fn with_tab_width(&self, tab_width: usize) -> Self {
        Self {
            config: self.config.with_tab_width(tab_width.max(1)),
        }
    }

    /// Locate the operator on `line`.
    pub fn detect_operator_column(&self, line: &str) -> Option<ColumnAndOffset> {
        self.detect_chars(line.chars())
    }

    fn detect_chars<I: IntoIterator<Item = char>>(&self, chars: I) -> Option<ColumnAndOffset> {
        scan_line(
            chars,
            self.config.operator,
            self.config.tab_width,
            self.config.column_metric,
        )
    }

    fn detect_line(&self, snapshot: &BufferSnapshot, line: usize) -> Option<ColumnAndOffset> {
        let found = snapshot
            .line_chars(line)
            .and_then(|chars| self.detect_chars(chars));
        trace!(line, ?found, "scanned line");
        found
    }

    /// Cheap enablement hint: does `line` contain the operator at all?
    ///
    /// A `true` answer does not guarantee there is anything to align.
    pub fn can_align(&self, line: &str) -> bool {
        line.contains(self.config.operator)
    }

    /// Find the contiguous block of operator lines around `caret_line`.
    ///
    /// Returns `None` if the caret line is out of range or has no operator. A selection that
    /// spans several lines limits the scan to the selected lines; otherwise the scan runs until
    /// the first line without the operator in each direction. Gaps are never skipped.
    pub fn find_alignable_block(
        &self,
        snapshot: &BufferSnapshot,
        caret_line: usize,
        selection: Option<&Selection>,
    ) -> Option<AlignmentBlock> {
        let caret = self.detect_line(snapshot, caret_line)?;

        let mut lines = BTreeMap::new();
        lines.insert(caret_line, caret);

        let (min_line, max_line) = match selection {
            Some(selection) if selection.is_multiline() => {
                let (start, end) = selection.ordered();
                (start.line, end.line.min(snapshot.line_count() - 1))
            }
            _ => (0, snapshot.line_count() - 1),
        };

        for line in (min_line..caret_line).rev() {
            let Some(found) = self.detect_line(snapshot, line) else {
                break;
            };
            lines.insert(line, found);
        }

        for line in caret_line.saturating_add(1)..=max_line {
            let Some(found) = self.detect_line(snapshot, line) else {
                break;
            };
            lines.insert(line, found);
        }

        let block = AlignmentBlock { caret_line, lines };
        debug!(
            caret_line,
            first = block.first_line(),
            last = block.last_line(),
            members = block.len(),
            "found alignable block"
        );
        Some(block)
    }

    /// Plan the padding that brings every operator of `block` to the block's largest column.
    ///
    /// Blocks with a single line produce an empty plan, as do blocks that are already aligned.
    pub fn build_edit_plan(&self, block: &AlignmentBlock) -> EditPlan {
        if block.len() < 2 {
            return EditPlan::default();
        }

        let target_column = block.max_column();
        let insertions = block
            .lines
            .iter()
            .filter(|(_, found)| found.column < target_column)
            .map(|(&line, found)| {
                (
                    line,
                    Insertion {
                        offset: found.offset,
                        padding: " ".repeat(target_column - found.column),
                    },
                )
            })
            .collect();

        EditPlan {
            target_column,
            insertions,
        }
    }

    /// Commit `plan` to `buffer` as one transaction planned against `snapshot`.
    ///
    /// Nothing is written if the snapshot is stale or any insertion is invalid.
    pub fn apply_edit_plan(
        &self,
        buffer: &mut TextBuffer,
        snapshot: &BufferSnapshot,
        plan: &EditPlan,
    ) -> Result<TextDelta, BufferError> {
        let mut edit = buffer.create_edit(snapshot);

        for (&line, insertion) in &plan.insertions {
            let start = snapshot.line_start(line).ok_or(BufferError::InvalidLine {
                line,
                line_count: snapshot.line_count(),
            })?;
            edit.insert(start + insertion.offset, &insertion.padding)?;
        }

        match edit.apply() {
            Ok(delta) => {
                debug!(
                    lines = plan.len(),
                    target_column = plan.target_column,
                    version = delta.after_version,
                    "applied alignment"
                );
                Ok(delta)
            }
            Err(err) => {
                debug!(%err, "alignment abandoned");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Position;

    fn engine() -> AlignmentEngine {
        AlignmentEngine::default()
    }

    #[test]
    fn test_no_operator_is_none() {
        assert_eq!(detect_operator_column("let x;", 4), None);
        assert_eq!(detect_operator_column("", 4), None);
        assert_eq!(detect_operator_column("\t\t  ", 8), None);
    }

    #[test]
    fn test_tab_then_operator_reports_tab_width() {
        for width in [1, 2, 4, 8] {
            let found = detect_operator_column("\t=", width).unwrap();
            assert_eq!(found.column, width);
            assert_eq!(found.offset, 1);
        }
    }

    #[test]
    fn test_offset_precedes_whitespace_run() {
        let found = detect_operator_column("a = 1", 4).unwrap();
        assert_eq!(found, ColumnAndOffset { column: 2, offset: 2 });

        let found = detect_operator_column("    value   = 1", 4).unwrap();
        assert_eq!(found, ColumnAndOffset { column: 12, offset: 12 });
    }

    #[test]
    fn test_offset_moves_before_glued_token() {
        let found = detect_operator_column("x=1", 4).unwrap();
        assert_eq!(found, ColumnAndOffset { column: 1, offset: 0 });

        let found = detect_operator_column("a += 1", 4).unwrap();
        assert_eq!(found, ColumnAndOffset { column: 3, offset: 2 });
    }

    #[test]
    fn test_only_first_operator_counts() {
        let found = detect_operator_column("a = b == c", 4).unwrap();
        assert_eq!(found.column, 2);
    }

    #[test]
    fn test_mixed_tabs_columns() {
        // "ab" -> 2, tab -> 4, "c" -> 5, then '='
        let found = detect_operator_column("ab\tc=", 4).unwrap();
        assert_eq!(found, ColumnAndOffset { column: 5, offset: 3 });
    }

    #[test]
    fn test_cells_metric() {
        let engine = AlignmentEngine::new(
            AlignConfig::default().with_column_metric(ColumnMetric::Cells),
        )
        .unwrap();
        assert_eq!(engine.detect_operator_column("你 = 1").unwrap().column, 3);
        assert_eq!(engine.detect_operator_column("你 = 1").unwrap().offset, 2);
        assert_eq!(self::engine().detect_operator_column("你 = 1").unwrap().column, 2);
    }

    #[test]
    fn test_custom_operator() {
        let engine =
            AlignmentEngine::new(AlignConfig::default().with_operator(':')).unwrap();
        assert_eq!(engine.detect_operator_column("key: 1").unwrap().column, 3);
        assert!(engine.detect_operator_column("key = 1").is_none());
        assert!(engine.can_align("a: b"));
        assert!(!engine.can_align("a = b"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(AlignmentEngine::new(AlignConfig::default().with_tab_width(0)).is_err());
    }

    #[test]
    fn test_block_stops_at_gap() {
        let snapshot = TextBuffer::new("a = 1\nb = 2\nplain\nc = 3").snapshot();
        let block = engine().find_alignable_block(&snapshot, 0, None).unwrap();
        assert_eq!(block.lines().keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(block.caret_line(), 0);
    }

    #[test]
    fn test_block_scans_both_directions() {
        let snapshot = TextBuffer::new("x\na = 1\nbb = 2\nccc = 3\ny").snapshot();
        let block = engine().find_alignable_block(&snapshot, 2, None).unwrap();
        assert_eq!(block.first_line(), 1);
        assert_eq!(block.last_line(), 3);
        assert_eq!(block.max_column(), 4);
    }

    #[test]
    fn test_caret_line_without_operator() {
        let snapshot = TextBuffer::new("a = 1\nplain\nb = 2").snapshot();
        assert!(engine().find_alignable_block(&snapshot, 1, None).is_none());
        assert!(engine().find_alignable_block(&snapshot, 9, None).is_none());
    }

    #[test]
    fn test_single_line_selection_does_not_bound() {
        let snapshot = TextBuffer::new("a = 1\nb = 2\nc = 3").snapshot();
        let selection = Selection::new(Position::new(1, 0), Position::new(1, 3));
        let block = engine()
            .find_alignable_block(&snapshot, 1, Some(&selection))
            .unwrap();
        assert_eq!(block.len(), 3);
    }

    #[test]
    fn test_plan_pads_to_max_column() {
        let snapshot = TextBuffer::new("abc = 1\nabcdefg = 2\nabcde = 3").snapshot();
        let block = engine().find_alignable_block(&snapshot, 0, None).unwrap();
        let plan = engine().build_edit_plan(&block);

        assert_eq!(plan.target_column(), 8);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.insertions()[&0].padding, "    ");
        assert_eq!(plan.insertions()[&2].padding, "  ");
        assert!(!plan.insertions().contains_key(&1));
    }

    #[test]
    fn test_single_member_plan_is_empty() {
        let snapshot = TextBuffer::new("a = 1\n\nb = 2").snapshot();
        let block = engine().find_alignable_block(&snapshot, 0, None).unwrap();
        assert_eq!(block.len(), 1);
        assert!(engine().build_edit_plan(&block).is_empty());
    }

    #[test]
    fn test_apply_against_invalid_line_abandons() {
        let mut buffer = TextBuffer::new("a = 1\nbb = 2");
        let snapshot = buffer.snapshot();
        let mut plan = EditPlan {
            target_column: 3,
            insertions: BTreeMap::new(),
        };
        plan.insertions.insert(
            0,
            Insertion {
                offset: 1,
                padding: " ".to_string(),
            },
        );
        plan.insertions.insert(
            7,
            Insertion {
                offset: 0,
                padding: " ".to_string(),
            },
        );

        let err = engine()
            .apply_edit_plan(&mut buffer, &snapshot, &plan)
            .unwrap_err();
        assert_eq!(err, BufferError::InvalidLine { line: 7, line_count: 2 });
        assert_eq!(buffer.text(), "a = 1\nbb = 2");
        assert_eq!(buffer.version(), 0);
    }
}
