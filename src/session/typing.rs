use crate::session::buffer::{Edit, EditBuffer};

/// Fired on the edit that makes the typed text equal the target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completed {
    pub text: String,
}

/// Typing state for one snippet.
///
/// Completion is never cached: it is `text == target`, evaluated before and
/// after every edit. An event is produced only on the false -> true edge, so a
/// streak of matching renders fires once, and leaving then re-entering the
/// match fires again.
pub struct TypingSession {
    target: String,
    buffer: EditBuffer,
    read_only: bool,
}

impl TypingSession {
    /// Open a session, restoring previously typed text. A restored text that
    /// already matches counts as the current streak and fires nothing.
    pub fn new(target: &str, initial: &str, read_only: bool) -> Self {
        Self {
            target: target.to_string(),
            buffer: EditBuffer::new(initial),
            read_only,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn cursor(&self) -> usize {
        self.buffer.cursor()
    }

    pub fn line_col(&self) -> (usize, usize) {
        self.buffer.line_col()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Exact, case- and whitespace-sensitive equality.
    pub fn is_complete(&self) -> bool {
        self.buffer.text() == self.target
    }

    /// Apply an edit. Returns `Some` exactly when this edit completed the
    /// snippet. Read-only sessions only move the cursor.
    ///
    /// Tab inserts a literal tab where the target has one at the cursor,
    /// otherwise one indent unit.
    pub fn apply(&mut self, edit: &Edit) -> Option<Completed> {
        if self.read_only && edit.changes_text() {
            return None;
        }
        let was_complete = self.is_complete();
        if *edit == Edit::Indent && self.target_char_at_cursor() == Some('\t') {
            self.buffer.apply(&Edit::Insert('\t'));
        } else {
            self.buffer.apply(edit);
        }
        let now_complete = self.is_complete();

        if !self.read_only && !was_complete && now_complete {
            Some(Completed {
                text: self.buffer.text().to_string(),
            })
        } else {
            None
        }
    }

    fn target_char_at_cursor(&self) -> Option<char> {
        self.target.chars().nth(self.buffer.cursor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(session: &mut TypingSession, text: &str) -> usize {
        let mut events = 0;
        for ch in text.chars() {
            if session.apply(&Edit::Insert(ch)).is_some() {
                events += 1;
            }
        }
        events
    }

    #[test]
    fn test_exact_match_fires_once() {
        let mut session = TypingSession::new("ab", "", false);
        assert!(session.apply(&Edit::Insert('a')).is_none());
        let done = session.apply(&Edit::Insert('b'));
        assert_eq!(done, Some(Completed { text: "ab".to_string() }));
        // Cursor moves while still matching do not re-fire.
        assert!(session.apply(&Edit::Left).is_none());
        assert!(session.apply(&Edit::Right).is_none());
        assert!(session.is_complete());
    }

    #[test]
    fn test_fires_again_after_leaving_match() {
        let mut session = TypingSession::new("ab", "", false);
        assert_eq!(type_str(&mut session, "ab"), 1);
        assert!(session.apply(&Edit::Backspace).is_none());
        assert!(!session.is_complete());
        assert!(session.apply(&Edit::Insert('b')).is_some());
    }

    #[test]
    fn test_tab_follows_target_whitespace() {
        let mut session = TypingSession::new("if x:\n\treturn", "", false);
        type_str(&mut session, "if x:");
        session.apply(&Edit::Paste("\n".to_string()));
        assert!(session.apply(&Edit::Indent).is_none());
        assert_eq!(session.text(), "if x:\n\t");
        assert_eq!(type_str(&mut session, "return"), 1);

        let mut spaced = TypingSession::new("a\n  b", "a\n", false);
        spaced.apply(&Edit::Indent);
        assert_eq!(spaced.text(), "a\n  ");
    }

    #[test]
    fn test_case_and_whitespace_sensitive() {
        let mut session = TypingSession::new("Ab", "", false);
        assert_eq!(type_str(&mut session, "ab"), 0);

        let mut session = TypingSession::new("a b", "", false);
        assert_eq!(type_str(&mut session, "a  b"), 0);
        assert_eq!(type_str(&mut session, ""), 0);

        let mut trailing = TypingSession::new("ab", "", false);
        assert_eq!(type_str(&mut trailing, "ab "), 1);
        assert!(!trailing.is_complete());
    }

    #[test]
    fn test_read_only_never_fires_or_edits() {
        let mut session = TypingSession::new("ab", "a", true);
        assert!(session.apply(&Edit::Insert('b')).is_none());
        assert_eq!(session.text(), "a");

        let mut matched = TypingSession::new("ab", "ab", true);
        assert!(matched.is_complete());
        assert!(matched.apply(&Edit::Backspace).is_none());
        assert!(matched.apply(&Edit::Left).is_none());
        assert_eq!(matched.cursor(), 1);
    }

    #[test]
    fn test_restored_match_does_not_fire() {
        let mut session = TypingSession::new("ab", "ab", false);
        assert!(session.apply(&Edit::Home).is_none());
        assert!(session.apply(&Edit::Delete).is_none());
        assert!(session.apply(&Edit::Insert('a')).is_some());
    }

    #[test]
    fn test_paste_reaches_match_without_enter() {
        let target = "if (a) {\n  b();\n}";
        let mut session = TypingSession::new(target, "", false);
        assert!(session.apply(&Edit::Paste(target.to_string())).is_some());
    }

    #[test]
    fn test_auto_indent_matches_brace_blocks() {
        let target = "function f() {\n  return 1;\n}";
        let mut session = TypingSession::new(target, "", false);
        type_str(&mut session, "function f() {");
        session.apply(&Edit::Newline);
        type_str(&mut session, "return 1;");
        session.apply(&Edit::Newline);
        // Auto-indent carried two spaces; the closing brace sits at column 0.
        session.apply(&Edit::Backspace);
        session.apply(&Edit::Backspace);
        assert_eq!(type_str(&mut session, "}"), 1);
    }
}
