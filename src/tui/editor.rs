//! Source editor panes.
//!
//! Each pane owns a plain text buffer for one source kind. Buffers are
//! seeded from the session and reconciled by version: a session file whose
//! version has grown past the one the editor last saw replaces the buffer
//! outright (that only happens when a save is restored), otherwise local
//! edits win and the session is updated from the buffer.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::session::{FileKind, SourceFile};

/// The seam a source editor is consumed through. The plain [`TextEditor`]
/// is the built-in implementation; a richer engine can slot in behind the
/// same surface.
pub trait EditorPane {
    fn kind(&self) -> FileKind;
    /// The buffer as a single string, the form the session stores.
    fn contents(&self) -> String;
    /// Adopts the session file when its version is newer than the last one
    /// seen. Returns whether the buffer changed.
    fn reconcile(&mut self, file: &SourceFile) -> bool;
    /// Applies a key to the buffer. Returns true when the contents changed.
    fn handle_key(&mut self, key: KeyEvent) -> bool;
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, focused: bool);
}

/// A plain text editor for one source file.
pub struct TextEditor {
    kind: FileKind,
    lines: Vec<String>,
    cursor: (usize, usize),
    scroll: u16,
    seen_version: u32,
}

impl TextEditor {
    #[must_use]
    pub fn new(kind: FileKind) -> Self {
        Self {
            kind,
            lines: vec![String::new()],
            cursor: (0, 0),
            scroll: 0,
            seen_version: 0,
        }
    }

    fn follow_cursor(&mut self, viewport_height: u16) {
        if viewport_height == 0 {
            return;
        }
        let row = self.cursor.0 as u16;
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + viewport_height {
            self.scroll = row - viewport_height + 1;
        }
    }
}

impl EditorPane for TextEditor {
    fn kind(&self) -> FileKind {
        self.kind
    }

    fn contents(&self) -> String {
        self.lines.join("\n")
    }

    fn reconcile(&mut self, file: &SourceFile) -> bool {
        if file.version <= self.seen_version {
            return false;
        }
        self.seen_version = file.version;
        self.lines = file.contents.split('\n').map(str::to_string).collect();
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.cursor = (0, 0);
        self.scroll = 0;
        true
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        let (row, col) = self.cursor;
        match key.code {
            KeyCode::Char(ch) => {
                let at = byte_index(&self.lines[row], col);
                self.lines[row].insert(at, ch);
                self.cursor.1 += 1;
                true
            }
            KeyCode::Enter => {
                let at = byte_index(&self.lines[row], col);
                let rest = self.lines[row].split_off(at);
                self.lines.insert(row + 1, rest);
                self.cursor = (row + 1, 0);
                true
            }
            KeyCode::Backspace => {
                if col > 0 {
                    let at = byte_index(&self.lines[row], col - 1);
                    self.lines[row].remove(at);
                    self.cursor.1 -= 1;
                    true
                } else if row > 0 {
                    let removed = self.lines.remove(row);
                    let prev_len = self.lines[row - 1].chars().count();
                    self.lines[row - 1].push_str(&removed);
                    self.cursor = (row - 1, prev_len);
                    true
                } else {
                    false
                }
            }
            KeyCode::Left => {
                if col > 0 {
                    self.cursor.1 -= 1;
                } else if row > 0 {
                    self.cursor = (row - 1, self.lines[row - 1].chars().count());
                }
                false
            }
            KeyCode::Right => {
                if col < self.lines[row].chars().count() {
                    self.cursor.1 += 1;
                } else if row + 1 < self.lines.len() {
                    self.cursor = (row + 1, 0);
                }
                false
            }
            KeyCode::Up => {
                if row > 0 {
                    let target = row - 1;
                    self.cursor = (target, col.min(self.lines[target].chars().count()));
                }
                false
            }
            KeyCode::Down => {
                if row + 1 < self.lines.len() {
                    let target = row + 1;
                    self.cursor = (target, col.min(self.lines[target].chars().count()));
                }
                false
            }
            _ => false,
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, focused: bool) {
        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(self.kind.language());

        let inner = block.inner(area);
        self.follow_cursor(inner.height);

        let lines: Vec<Line<'_>> = self
            .lines
            .iter()
            .skip(self.scroll as usize)
            .take(inner.height as usize)
            .map(|line| Line::raw(line.as_str()))
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);

        if focused {
            let row = self.cursor.0 as u16;
            if row >= self.scroll && row < self.scroll + inner.height {
                let x = inner.x + (self.cursor.1 as u16).min(inner.width.saturating_sub(1));
                let y = inner.y + (row - self.scroll);
                frame.set_cursor_position((x, y));
            }
        }
    }
}

/// Byte offset of the `col`th character of `line`.
fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map_or(line.len(), |(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn seeded(contents: &str) -> TextEditor {
        let mut editor = TextEditor::new(FileKind::JavaScript);
        editor.reconcile(&SourceFile {
            kind: FileKind::JavaScript,
            version: 1,
            contents: contents.to_string(),
        });
        editor
    }

    #[test]
    fn test_typing_and_newlines_round_trip() {
        let mut editor = seeded("");
        for ch in "let x".chars() {
            assert!(editor.handle_key(key(KeyCode::Char(ch))));
        }
        editor.handle_key(key(KeyCode::Enter));
        editor.handle_key(key(KeyCode::Char('y')));
        assert_eq!(editor.contents(), "let x\ny");
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut editor = seeded("ab\ncd");
        editor.handle_key(key(KeyCode::Down));
        assert!(editor.handle_key(key(KeyCode::Backspace)));
        assert_eq!(editor.contents(), "abcd");
    }

    #[test]
    fn test_reconcile_only_applies_newer_versions() {
        let mut editor = seeded("draft");
        editor.handle_key(key(KeyCode::Char('!')));

        // Same version again: local edits survive.
        let stale = SourceFile {
            kind: FileKind::JavaScript,
            version: 1,
            contents: "draft".to_string(),
        };
        assert!(!editor.reconcile(&stale));
        assert_eq!(editor.contents(), "!draft");

        // A restored save bumped the version: buffer is replaced.
        let restored = SourceFile {
            kind: FileKind::JavaScript,
            version: 2,
            contents: "restored".to_string(),
        };
        assert!(editor.reconcile(&restored));
        assert_eq!(editor.contents(), "restored");
    }

    #[test]
    fn test_control_chords_do_not_type() {
        let mut editor = seeded("x");
        let chord = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert!(!editor.handle_key(chord));
        assert_eq!(editor.contents(), "x");
    }
}
