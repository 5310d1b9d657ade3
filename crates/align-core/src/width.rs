//! Column metrics.
//!
//! Operators are aligned by *visual* column, so every character is measured the same way during
//! detection and padding. `'\t'` always advances to the next tab stop; other characters advance
//! by one column ([`ColumnMetric::Chars`]) or by their terminal cell width
//! ([`ColumnMetric::Cells`]).

use unicode_width::UnicodeWidthChar;

/// How a non-tab character advances the visual column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnMetric {
    /// Every character is one column wide.
    #[default]
    Chars,
    /// Characters are measured in terminal cells (UAX #11), so CJK text counts as two columns.
    Cells,
}

impl ColumnMetric {
    /// Parse a metric name (`"chars"` or `"cells"`, case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chars" | "char" => Some(Self::Chars),
            "cells" | "cell" => Some(Self::Cells),
            _ => None,
        }
    }

    /// Stable lowercase name of the metric.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chars => "chars",
            Self::Cells => "cells",
        }
    }
}

/// Cell width of a single character (UAX #11). Control characters count as one cell.
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Width of `ch` when it starts at visual column `column`.
///
/// `'\t'` advances to the next multiple of `tab_width` (a zero tab width is treated as 1).
pub fn advance_width(ch: char, column: usize, tab_width: usize, metric: ColumnMetric) -> usize {
    if ch == '\t' {
        let tab_width = tab_width.max(1);
        return tab_width - column % tab_width;
    }

    match metric {
        ColumnMetric::Chars => 1,
        ColumnMetric::Cells => char_width(ch),
    }
}

/// Visual width of a whole string measured from column 0.
pub fn str_width(s: &str, tab_width: usize, metric: ColumnMetric) -> usize {
    s.chars().fold(0usize, |x, ch| {
        x.saturating_add(advance_width(ch, x, tab_width, metric))
    })
}
