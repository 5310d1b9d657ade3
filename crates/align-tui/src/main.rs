//! Align assignments in a file, from a script or an interactive terminal view.
//!
//! # Usage
//!
//! ```bash
//! # Interactive: move the caret to a block and press Ctrl+A
//! cargo run -p align-tui -- settings.ini
//!
//! # Batch: align the block around line 12 and print the result
//! align-assignments src/config.rs --line 12
//!
//! # Batch, limited to lines 10..=20, rewriting the file
//! align-assignments src/config.rs --line 12 --select 10:20 --write
//! ```
//!
//! `ALIGN_TAB_WIDTH`, `ALIGN_OPERATOR` and `ALIGN_COLUMNS` set defaults; flags win over them.
//! `RUST_LOG` controls log verbosity.
//!
//! Exit status: 0 on success, 1 when `--check` finds a block that would change, 2 on errors.
//!
//! # Key bindings
//!
//! - Arrows / Home / End / PageUp / PageDown: move the caret
//! - Shift+arrows: extend the selection
//! - Ctrl+A or Alt+=: align assignments around the caret
//! - Ctrl+S: save
//! - Ctrl+X / Esc: quit

mod app;

use align_core::config::parse_operator;
use align_core::{
    AlignAssignments, AlignConfig, AlignHost, AlignOutcome, ColumnMetric, ConfigError,
    EditorSession, NoopReason, Position, Selection,
};
use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Align assignment operators across contiguous lines.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to open
    file: PathBuf,

    /// Run once with the caret on this line (1-based) instead of opening the viewer
    #[arg(short, long, value_parser = parse_line_number)]
    line: Option<usize>,

    /// Limit the block to a 1-based inclusive line range, e.g. `10:20`
    #[arg(short, long, value_parser = parse_line_range, requires = "line")]
    select: Option<(usize, usize)>,

    /// Tab width used to compute columns
    #[arg(short, long)]
    tab_width: Option<usize>,

    /// Operator character to align
    #[arg(short, long, value_parser = parse_operator_arg)]
    operator: Option<char>,

    /// Measure columns in terminal cells (wide characters count twice)
    #[arg(long)]
    cells: bool,

    /// Rewrite the file instead of printing the result (batch mode)
    #[arg(short, long, requires = "line", conflicts_with = "check")]
    write: bool,

    /// Exit with status 1 if the block would change; print nothing (batch mode, errors exit 2)
    #[arg(long, requires = "line")]
    check: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Write logs to this file (the viewer logs nowhere otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Exit status for errors; `--check` uses 1.
const ERROR_EXIT: u8 = 2;

fn parse_line_number(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err("line numbers start at 1".to_string()),
        Ok(line) => Ok(line),
        Err(_) => Err(format!("invalid line number '{raw}'")),
    }
}

fn parse_line_range(raw: &str) -> Result<(usize, usize), String> {
    let (start, end) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{raw}'"))?;
    let start = parse_line_number(start)?;
    let end = parse_line_number(end)?;
    Ok((start.min(end), start.max(end)))
}

fn parse_operator_arg(raw: &str) -> Result<char, ConfigError> {
    parse_operator(raw)
}

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match (&args.log_file, args.line.is_some()) {
        (Some(path), _) => {
            let file = fs::File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        (None, true) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(args.verbose)
                .with_writer(std::io::stderr)
                .init();
        }
        // The viewer owns the terminal; stray log lines would corrupt it.
        (None, false) => {}
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<AlignConfig, ConfigError> {
    let mut config = AlignConfig::from_env()?;
    if let Some(tab_width) = args.tab_width {
        config.tab_width = tab_width;
    }
    if let Some(operator) = args.operator {
        config.operator = operator;
    }
    if args.cells {
        config.column_metric = ColumnMetric::Cells;
    }
    config.validate()?;
    Ok(config)
}

/// Read `path` verbatim; a missing file opens as an empty document.
pub(crate) fn load_document(path: &Path) -> std::io::Result<String> {
    if path.exists() {
        fs::read_to_string(path)
    } else {
        Ok(String::new())
    }
}

fn run_batch(args: &Args, config: AlignConfig, line: usize) -> Result<ExitCode, Box<dyn Error>> {
    let text = load_document(&args.file)?;
    let mut session = EditorSession::new(&text, config);
    let command = AlignAssignments::new(config)?;

    // Caret placement clamps, so a line past the end has to be caught first.
    let caret_line = line
        .checked_sub(1)
        .filter(|&caret_line| caret_line < session.buffer().line_count());
    let outcome = match caret_line {
        Some(caret_line) => {
            let selection = args
                .select
                .map(|(first, last)| Selection::lines(first - 1, last - 1));
            session.set_caret_and_selection(Position::new(caret_line, 0), selection);
            command.execute(&mut session)
        }
        None => AlignOutcome::NothingToAlign(NoopReason::NoOperatorOnCaretLine),
    };

    match &outcome {
        AlignOutcome::Aligned {
            target_column,
            first_line,
            last_line,
            lines_padded,
            ..
        } => info!(
            file = %args.file.display(),
            first = first_line + 1,
            last = last_line + 1,
            target_column,
            lines_padded,
            "aligned block"
        ),
        AlignOutcome::NothingToAlign(reason) => {
            info!(file = %args.file.display(), ?reason, "nothing to align")
        }
        AlignOutcome::Aborted(err) => info!(file = %args.file.display(), %err, "alignment aborted"),
    }

    if args.check {
        return Ok(if outcome.is_aligned() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    let output = session.buffer().text();
    if args.write {
        if outcome.is_aligned() {
            fs::write(&args.file, output)?;
        }
    } else {
        print!("{output}");
    }
    Ok(ExitCode::SUCCESS)
}

fn run(args: &Args) -> Result<ExitCode, Box<dyn Error>> {
    init_logging(args)?;
    let config = build_config(args)?;

    match args.line {
        Some(line) => run_batch(args, config, line),
        None => {
            app::run(args.file.clone(), config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(ERROR_EXIT)
        }
    }
}
