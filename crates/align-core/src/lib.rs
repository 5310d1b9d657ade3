#![warn(missing_docs)]
//! Align Core - Headless Assignment Alignment Kernel
//!
//! # Overview
//!
//! `align-core` implements a single editor command: starting from the caret line, find the
//! contiguous block of lines that contain an assignment operator and insert spaces so that every
//! operator in the block sits at the same visual column.
//!
//! ```text
//! a = 1            a     = 1
//! count = 2   ->   count = 2
//! xy = 3           xy    = 3
//! ```
//!
//! The crate does not render anything and does not know about any particular editor; hosts
//! implement [`AlignHost`] and invoke [`AlignAssignments`].
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Command Interface (AlignAssignments)       │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Alignment Engine (detect / plan / apply)   │  ← Algorithm
//! ├─────────────────────────────────────────────┤
//! │  Column Metrics (tab stops, cell widths)    │  ← Measurement
//! ├─────────────────────────────────────────────┤
//! │  Versioned Rope Buffer + Transactions       │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use align_core::{AlignAssignments, AlignConfig, AlignHost, AlignOutcome, EditorSession, Selection};
//!
//! let text = "a = 1\nbb = 2\n\nccc = 3\nd = 4";
//! let mut session = EditorSession::new(text, AlignConfig::default());
//!
//! // The caret starts on line 0: the block is lines 0..=1, the blank line stops the scan.
//! let command = AlignAssignments::new(AlignConfig::default()).unwrap();
//! assert!(command.execute(&mut session).is_aligned());
//! assert_eq!(session.buffer().text(), "a  = 1\nbb = 2\n\nccc = 3\nd = 4");
//!
//! // Running it again is a no-op.
//! assert!(matches!(command.execute(&mut session), AlignOutcome::NothingToAlign(_)));
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - Rope-backed versioned buffer, snapshots and edit transactions
//! - [`align`] - Alignment engine
//! - [`width`] - Column metrics
//! - [`commands`] - Host interface and the align command
//! - [`config`] - Settings and environment overrides
//! - [`delta`] - Structured description of committed edits
//! - [`line_ending`] - Line ending detection for status displays

pub mod align;
pub mod buffer;
pub mod commands;
pub mod config;
pub mod delta;
mod error;
pub mod line_ending;
pub mod width;

pub use align::{
    AlignmentBlock, AlignmentEngine, ColumnAndOffset, EditPlan, Insertion, detect_operator_column,
};
pub use buffer::{BufferEdit, BufferSnapshot, TextBuffer};
pub use commands::{
    AlignAssignments, AlignHost, AlignOutcome, CommandStatus, EditorSession, NoopReason, Position,
    Selection, SelectionDirection,
};
pub use config::AlignConfig;
pub use delta::{TextDelta, TextDeltaEdit};
pub use error::{BufferError, ConfigError};
pub use line_ending::LineEnding;
pub use width::ColumnMetric;
