//! Interactive viewer: move the caret, select lines, align, save.

use crate::load_document;
use align_core::width::{ColumnMetric, advance_width, str_width};
use align_core::{
    AlignAssignments, AlignConfig, AlignHost, AlignOutcome, EditorSession, LineEnding, NoopReason,
    Position,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::error::Error;
use std::fs;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub(crate) struct App {
    session: EditorSession,
    command: AlignAssignments,
    file_path: PathBuf,
    line_ending: LineEnding,
    saved_version: u64,
    should_quit: bool,
    confirm_quit: bool,
    status_message: String,
    scroll_top: usize,
    viewport_height: usize,
}

impl App {
    pub(crate) fn new(file_path: PathBuf, config: AlignConfig) -> Result<Self, Box<dyn Error>> {
        let text = load_document(&file_path)?;
        Ok(Self::from_text(file_path, &text, config)?)
    }

    fn from_text(
        file_path: PathBuf,
        text: &str,
        config: AlignConfig,
    ) -> Result<Self, align_core::ConfigError> {
        let command = AlignAssignments::new(config)?;
        let session = EditorSession::new(text, config);
        let line_ending = LineEnding::detect_in_text(text);
        let saved_version = session.buffer().version();
        Ok(Self {
            session,
            command,
            file_path,
            line_ending,
            saved_version,
            should_quit: false,
            confirm_quit: false,
            status_message: String::new(),
            scroll_top: 0,
            viewport_height: 0,
        })
    }

    fn is_modified(&self) -> bool {
        self.session.buffer().version() != self.saved_version
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.confirm_quit {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => match self.save_file() {
                    Ok(()) => self.should_quit = true,
                    Err(e) => {
                        self.status_message = format!("Save failed: {e}");
                        self.confirm_quit = false;
                    }
                },
                KeyCode::Char('n') | KeyCode::Char('N') => self.should_quit = true,
                KeyCode::Esc => {
                    self.confirm_quit = false;
                    self.status_message.clear();
                }
                _ => {}
            }
            return;
        }

        self.status_message.clear();
        let selecting = key.modifiers.contains(KeyModifiers::SHIFT);

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('a')) | (KeyModifiers::ALT, KeyCode::Char('=')) => {
                self.align();
            }
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => match self.save_file() {
                Ok(()) => self.status_message = format!("Saved {}", self.file_path.display()),
                Err(e) => self.status_message = format!("Save failed: {e}"),
            },
            (KeyModifiers::CONTROL, KeyCode::Char('x')) | (_, KeyCode::Esc) => {
                if self.is_modified() {
                    self.confirm_quit = true;
                    self.status_message = "File modified. Save? (y/n)".to_string();
                } else {
                    self.should_quit = true;
                }
            }
            (_, KeyCode::Left) => self.move_left(selecting),
            (_, KeyCode::Right) => self.move_right(selecting),
            (_, KeyCode::Up) => self.move_lines(-1, selecting),
            (_, KeyCode::Down) => self.move_lines(1, selecting),
            (_, KeyCode::Home) => {
                let pos = self.session.caret();
                self.move_to(Position::new(pos.line, 0), selecting);
            }
            (_, KeyCode::End) => {
                let pos = self.session.caret();
                self.move_to(Position::new(pos.line, usize::MAX), selecting);
            }
            (_, KeyCode::PageUp) => self.move_lines(-(self.page_size() as isize), selecting),
            (_, KeyCode::PageDown) => self.move_lines(self.page_size() as isize, selecting),
            _ => {}
        }

        self.adjust_scroll();
    }

    fn align(&mut self) {
        let outcome = self.command.execute(&mut self.session);
        self.status_message = match outcome {
            AlignOutcome::Aligned {
                target_column,
                first_line,
                last_line,
                lines_padded,
                ..
            } => {
                info!(first_line, last_line, target_column, "aligned block");
                format!(
                    "Aligned lines {}-{} at column {} ({} padded)",
                    first_line + 1,
                    last_line + 1,
                    target_column + 1,
                    lines_padded
                )
            }
            AlignOutcome::NothingToAlign(reason) => match reason {
                NoopReason::NoOperatorOnCaretLine => "No operator on this line".to_string(),
                NoopReason::SingleLineBlock => "No neighbouring line to align with".to_string(),
                NoopReason::AlreadyAligned => "Already aligned".to_string(),
            },
            AlignOutcome::Aborted(err) => {
                warn!(%err, "alignment aborted");
                format!("Alignment aborted: {err}")
            }
        };
    }

    fn page_size(&self) -> usize {
        self.viewport_height.max(1)
    }

    fn line_len(&self, line: usize) -> usize {
        self.session
            .buffer()
            .line_text(line)
            .map(|text| text.chars().count())
            .unwrap_or(0)
    }

    fn move_to(&mut self, pos: Position, selecting: bool) {
        if selecting {
            self.session.extend_selection_to(pos);
        } else {
            self.session.set_caret(pos);
        }
    }

    fn move_left(&mut self, selecting: bool) {
        let pos = self.session.caret();
        if pos.column > 0 {
            self.move_to(Position::new(pos.line, pos.column - 1), selecting);
        } else if pos.line > 0 {
            let prev = pos.line - 1;
            self.move_to(Position::new(prev, self.line_len(prev)), selecting);
        }
    }

    fn move_right(&mut self, selecting: bool) {
        let pos = self.session.caret();
        if pos.column < self.line_len(pos.line) {
            self.move_to(Position::new(pos.line, pos.column + 1), selecting);
        } else if pos.line + 1 < self.session.buffer().line_count() {
            self.move_to(Position::new(pos.line + 1, 0), selecting);
        }
    }

    fn move_lines(&mut self, delta: isize, selecting: bool) {
        let pos = self.session.caret();
        let last = self.session.buffer().line_count().saturating_sub(1);
        let line = pos.line.saturating_add_signed(delta).min(last);
        self.move_to(Position::new(line, pos.column), selecting);
    }

    fn adjust_scroll(&mut self) {
        if self.viewport_height == 0 {
            return;
        }
        let line = self.session.caret().line;
        if line < self.scroll_top {
            self.scroll_top = line;
        }
        if line >= self.scroll_top + self.viewport_height {
            self.scroll_top = line + 1 - self.viewport_height;
        }
    }

    fn save_file(&mut self) -> io::Result<()> {
        fs::write(&self.file_path, self.session.buffer().text())?;
        self.saved_version = self.session.buffer().version();
        info!(file = %self.file_path.display(), "saved");
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.viewport_height = chunks[0].height.saturating_sub(2) as usize;
        self.adjust_scroll();

        self.render_editor(frame, chunks[0]);
        self.render_status_line(frame, chunks[1]);
        self.render_shortcuts(frame, chunks[2]);
    }

    /// Expand one line for display: tabs become spaces, selected chars are highlighted.
    fn display_line(&self, line: usize, text: &str) -> Line<'static> {
        let tab_width = self.session.tab_width();
        let selected = self.session.selection().and_then(|sel| {
            if !sel.contains_line(line) {
                return None;
            }
            let (start, end) = sel.ordered();
            let from = if start.line == line { start.column } else { 0 };
            let to = if end.line == line { end.column } else { usize::MAX };
            Some((from, to))
        });
        let selected_style = Style::default().bg(Color::Blue).fg(Color::White);

        let mut spans = Vec::new();
        let mut buffer = String::new();
        let mut in_selection = false;
        let mut column = 0;

        for (index, ch) in text.chars().enumerate() {
            let is_selected = selected.is_some_and(|(from, to)| from <= index && index < to);
            if is_selected != in_selection && !buffer.is_empty() {
                let style = if in_selection {
                    selected_style
                } else {
                    Style::default()
                };
                spans.push(Span::styled(std::mem::take(&mut buffer), style));
            }
            in_selection = is_selected;

            let width = advance_width(ch, column, tab_width, ColumnMetric::Cells);
            if ch == '\t' {
                buffer.extend(std::iter::repeat_n(' ', width));
            } else {
                buffer.push(ch);
            }
            column += width;
        }

        if !buffer.is_empty() {
            let style = if in_selection {
                selected_style
            } else {
                Style::default()
            };
            spans.push(Span::styled(buffer, style));
        }
        Line::from(spans)
    }

    fn render_editor(&self, frame: &mut Frame, area: Rect) {
        let buffer = self.session.buffer();
        let inner_height = area.height.saturating_sub(2) as usize;

        let display_lines: Vec<Line> = (self.scroll_top..buffer.line_count())
            .take(inner_height)
            .map(|line| {
                let text = buffer.line_text(line).unwrap_or_default();
                self.display_line(line, &text)
            })
            .collect();

        let title = format!(
            " {} {}",
            self.file_path.display(),
            if self.is_modified() { "[+] " } else { "" }
        );
        let paragraph =
            Paragraph::new(display_lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);

        let caret = self.session.caret();
        if inner_height == 0 || caret.line < self.scroll_top {
            return;
        }
        let rel_row = caret.line - self.scroll_top;
        if rel_row >= inner_height {
            return;
        }

        let prefix: String = self
            .session
            .caret_line_text()
            .chars()
            .take(caret.column)
            .collect();
        let x = str_width(&prefix, self.session.tab_width(), ColumnMetric::Cells);

        let inner_right = area.x + area.width.saturating_sub(2);
        let cursor_x = (area.x + 1 + x as u16).min(inner_right);
        let cursor_y = area.y + 1 + rel_row as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let caret = self.session.caret();
            let align_hint = if self.command.query_status(&self.session).enabled {
                " | align: ready"
            } else {
                ""
            };
            format!(
                "Ln {} Col {} | Lines {} | Version {} | {} | Tab {}{}",
                caret.line + 1,
                caret.column + 1,
                self.session.buffer().line_count(),
                self.session.buffer().version(),
                self.line_ending.label(),
                self.session.tab_width(),
                align_hint
            )
        };

        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, area);
    }

    fn render_shortcuts(&self, frame: &mut Frame, area: Rect) {
        let shortcuts = if self.confirm_quit {
            "Y:save and quit  N:quit without saving  Esc:cancel"
        } else {
            "Ctrl-A/Alt-=:align  Shift-arrows:select  Ctrl-S:save  Ctrl-X/Esc:quit"
        };
        let shortcuts_line =
            Paragraph::new(shortcuts).style(Style::default().bg(Color::Blue).fg(Color::White));
        frame.render_widget(shortcuts_line, area);
    }
}

/// Open `file_path` in the terminal viewer until the user quits.
pub(crate) fn run(file_path: PathBuf, config: AlignConfig) -> Result<(), Box<dyn Error>> {
    let mut app = App::new(file_path, config)?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key_event(key);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn app(text: &str) -> App {
        App::from_text(
            PathBuf::from("untitled.txt"),
            text,
            AlignConfig::default(),
        )
        .unwrap()
    }

    fn press(app: &mut App, modifiers: KeyModifiers, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, modifiers));
    }

    #[test]
    fn test_ctrl_a_aligns_block_under_caret() {
        let mut app = app("a = 1\nbbb = 2");
        press(&mut app, KeyModifiers::CONTROL, KeyCode::Char('a'));

        assert_eq!(app.session.buffer().text(), "a   = 1\nbbb = 2");
        assert!(app.is_modified());
        assert_eq!(app.status_message, "Aligned lines 1-2 at column 5 (1 padded)");
    }

    #[test]
    fn test_noop_reports_reason() {
        let mut app = app("plain\na = 1");
        press(&mut app, KeyModifiers::ALT, KeyCode::Char('='));
        assert_eq!(app.status_message, "No operator on this line");
        assert!(!app.is_modified());
    }

    #[test]
    fn test_shift_down_selects_and_bounds_block() {
        let mut app = app("a = 1\nbb = 2\ncccccc = 3");
        press(&mut app, KeyModifiers::SHIFT, KeyCode::Down);
        assert!(app.session.selection().is_some());

        press(&mut app, KeyModifiers::CONTROL, KeyCode::Char('a'));
        assert_eq!(app.session.buffer().text(), "a  = 1\nbb = 2\ncccccc = 3");
    }

    #[test]
    fn test_quit_asks_when_modified() {
        let mut app = app("a = 1\nbb = 2");
        press(&mut app, KeyModifiers::CONTROL, KeyCode::Char('a'));
        press(&mut app, KeyModifiers::CONTROL, KeyCode::Char('x'));
        assert!(app.confirm_quit);
        assert!(!app.should_quit);

        press(&mut app, KeyModifiers::NONE, KeyCode::Char('n'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_caret_movement_clamps() {
        let mut app = app("ab\nc");
        press(&mut app, KeyModifiers::NONE, KeyCode::End);
        assert_eq!(app.session.caret(), Position::new(0, 2));
        press(&mut app, KeyModifiers::NONE, KeyCode::Right);
        assert_eq!(app.session.caret(), Position::new(1, 0));
        press(&mut app, KeyModifiers::NONE, KeyCode::Down);
        assert_eq!(app.session.caret(), Position::new(1, 0));
        press(&mut app, KeyModifiers::NONE, KeyCode::Left);
        assert_eq!(app.session.caret(), Position::new(0, 2));
    }

    #[test]
    fn test_save_keeps_line_breaks_as_loaded() {
        let path = std::env::temp_dir().join(format!("align-app-{}.ini", std::process::id()));
        let mut app = App::from_text(
            path.clone(),
            "a = 1\r\nbbb = 2\nplain\r\n",
            AlignConfig::default(),
        )
        .unwrap();
        assert_eq!(app.line_ending, LineEnding::Mixed);

        press(&mut app, KeyModifiers::CONTROL, KeyCode::Char('a'));
        press(&mut app, KeyModifiers::CONTROL, KeyCode::Char('s'));

        assert_eq!(fs::read_to_string(&path).unwrap(), "a   = 1\r\nbbb = 2\nplain\r\n");
        assert!(!app.is_modified());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_display_line_expands_tabs() {
        let app = app("\tx = 1");
        let line = app.display_line(0, "\tx = 1");
        let rendered: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(rendered, "    x = 1");
    }
}
