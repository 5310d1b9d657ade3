//! Line ending detection for status displays.
//!
//! The buffer keeps line breaks exactly as loaded: line text, columns and offsets exclude the
//! break, and alignment only inserts spaces inside lines, so files are saved byte for byte
//! except for the padding. This module only reports which convention a document uses.

/// The newline convention found in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`), also reported for text without line breaks.
    #[default]
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
    /// Both LF-only and CRLF breaks occur.
    Mixed,
}

impl LineEnding {
    /// Classify the line breaks of `text`.
    pub fn detect_in_text(text: &str) -> Self {
        let crlf = text.matches("\r\n").count();
        let lf = text.matches('\n').count();
        match (crlf, lf - crlf) {
            (0, _) => Self::Lf,
            (_, 0) => Self::Crlf,
            _ => Self::Mixed,
        }
    }

    /// Short label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Lf => "LF",
            Self::Crlf => "CRLF",
            Self::Mixed => "Mixed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(LineEnding::detect_in_text("x\ny"), LineEnding::Lf);
        assert_eq!(LineEnding::detect_in_text("no breaks"), LineEnding::Lf);
        assert_eq!(LineEnding::detect_in_text("a = 1\r\nbb = 2\r\n"), LineEnding::Crlf);
        assert_eq!(LineEnding::detect_in_text("a\r\nb\nc"), LineEnding::Mixed);
    }

    #[test]
    fn test_label() {
        assert_eq!(LineEnding::Lf.label(), "LF");
        assert_eq!(LineEnding::Crlf.label(), "CRLF");
        assert_eq!(LineEnding::Mixed.label(), "Mixed");
    }
}
