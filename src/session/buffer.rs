/// One indent step, inserted by Tab and by auto-indent after `{`.
pub const INDENT_UNIT: &str = "  ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit {
    Insert(char),
    Paste(String),
    Newline,
    Indent,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

impl Edit {
    /// Cursor-only edits are still allowed on read-only sessions.
    pub fn changes_text(&self) -> bool {
        !matches!(
            self,
            Edit::Left | Edit::Right | Edit::Up | Edit::Down | Edit::Home | Edit::End
        )
    }
}

/// Multi-line text with a char-index cursor.
#[derive(Clone, Debug, Default)]
pub struct EditBuffer {
    text: String,
    /// Cursor position as a char index (0 = before first char).
    cursor: usize,
}

impl EditBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Zero-based (line, column) of the cursor, both in chars.
    pub fn line_col(&self) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for ch in self.text.chars().take(self.cursor) {
            if ch == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    pub fn apply(&mut self, edit: &Edit) {
        match edit {
            Edit::Insert('\r') => {}
            Edit::Insert(ch) => self.insert_str(&ch.to_string()),
            Edit::Paste(text) => {
                let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
                self.insert_str(&normalized);
            }
            Edit::Newline => {
                let before_byte = self.char_to_byte(self.cursor);
                let indent = newline_indent(&self.text[..before_byte]);
                self.insert_str(&format!("\n{indent}"));
            }
            Edit::Indent => self.insert_str(INDENT_UNIT),
            Edit::Backspace => {
                if self.cursor > 0 {
                    self.remove_char_at(self.cursor - 1);
                    self.cursor -= 1;
                }
            }
            Edit::Delete => {
                if self.cursor < self.char_len() {
                    self.remove_char_at(self.cursor);
                }
            }
            Edit::Left => self.cursor = self.cursor.saturating_sub(1),
            Edit::Right => self.cursor = (self.cursor + 1).min(self.char_len()),
            Edit::Up => self.move_vertical(false),
            Edit::Down => self.move_vertical(true),
            Edit::Home => {
                let (_, col) = self.line_col();
                self.cursor -= col;
            }
            Edit::End => {
                let rest = self.text.chars().skip(self.cursor).take_while(|&c| c != '\n');
                self.cursor += rest.count();
            }
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn insert_str(&mut self, s: &str) {
        let byte_offset = self.char_to_byte(self.cursor);
        self.text.insert_str(byte_offset, s);
        self.cursor += s.chars().count();
    }

    fn remove_char_at(&mut self, char_idx: usize) {
        let byte_offset = self.char_to_byte(char_idx);
        if let Some(ch) = self.text[byte_offset..].chars().next() {
            self.text
                .replace_range(byte_offset..byte_offset + ch.len_utf8(), "");
        }
    }

    /// Convert char index to byte offset.
    fn char_to_byte(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    fn move_vertical(&mut self, down: bool) {
        let (line, col) = self.line_col();
        let starts = line_starts(&self.text);
        let len = self.char_len();

        let target = if down {
            line + 1
        } else if let Some(prev) = line.checked_sub(1) {
            prev
        } else {
            self.cursor = 0;
            return;
        };
        let Some(&start) = starts.get(target) else {
            self.cursor = len;
            return;
        };
        let end = starts.get(target + 1).map_or(len, |&next| next - 1);
        self.cursor = (start + col).min(end);
    }
}

/// Char index at which each line begins.
fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, ch) in text.chars().enumerate() {
        if ch == '\n' {
            starts.push(i + 1);
        }
    }
    starts
}

/// Leading whitespace for a line opened after `before`: the current line's
/// indent, one unit deeper when that line ends with an opening brace.
pub fn newline_indent(before: &str) -> String {
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let line = &before[line_start..];
    let mut indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
    if line.trim_end().ends_with('{') {
        indent.push_str(INDENT_UNIT);
    }
    indent
}
