use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::typing::TypingSession;
use crate::snippet::Language;
use crate::ui::highlight;
use crate::ui::theme::Theme;

const COMPLETE_BADGE: &str = " ✓ Complete! ";

/// The practice editor: line numbers, highlighted user text, a block cursor,
/// and a mark on the first char that diverges from the target.
pub struct CodeEditor<'a> {
    session: &'a TypingSession,
    language: Language,
    title: &'a str,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> CodeEditor<'a> {
    pub fn new(
        session: &'a TypingSession,
        language: Language,
        title: &'a str,
        focused: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            session,
            language,
            title,
            focused,
            theme,
        }
    }
}

/// Char index of the first typed char that differs from the target. Typing
/// past the end of the target counts as a divergence.
pub fn first_divergence(text: &str, target: &str) -> Option<usize> {
    let mut target_chars = target.chars();
    text.chars()
        .enumerate()
        .find(|&(_, ch)| target_chars.next() != Some(ch))
        .map(|(i, _)| i)
}

/// Styled lines for `session`, without gutter. The cursor cell is drawn even
/// at a line end.
fn code_lines(session: &TypingSession, language: Language, theme: &Theme, show_cursor: bool) -> Vec<Line<'static>> {
    let colors = &theme.colors;
    let text = session.text();
    let kinds = highlight::classify(text, language);
    let divergence = first_divergence(text, session.target());
    let cursor = show_cursor.then(|| session.cursor());
    let cursor_style = Style::default()
        .fg(colors.text_cursor_fg())
        .bg(colors.text_cursor_bg());

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();

    for (i, (ch, kind)) in text.chars().zip(kinds).enumerate() {
        let at_cursor = cursor == Some(i);
        if ch == '\n' {
            if at_cursor {
                spans.push(Span::styled(" ", cursor_style));
            }
            lines.push(Line::from(std::mem::take(&mut spans)));
            continue;
        }

        let style = if at_cursor {
            cursor_style
        } else if divergence == Some(i) {
            Style::default()
                .fg(colors.text_incorrect())
                .bg(colors.text_incorrect_bg())
                .add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(colors.syntax(kind))
        };
        spans.push(Span::styled(ch.to_string(), style));
    }

    if cursor == Some(text.chars().count()) {
        spans.push(Span::styled(" ", cursor_style));
    }
    lines.push(Line::from(spans));
    lines
}

impl Widget for CodeEditor<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let complete = self.session.is_complete();
        let read_only = self.session.is_read_only();

        let border_color = if complete {
            colors.success()
        } else if self.focused {
            colors.border_focused()
        } else {
            colors.border()
        };
        let title = if read_only {
            format!(" {} (read-only) ", self.title)
        } else {
            format!(" {} ", self.title)
        };
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let mut lines = code_lines(self.session, self.language, self.theme, self.focused);
        let (cursor_line, _) = self.session.line_col();
        let scroll = cursor_line.saturating_sub(inner.height as usize - 1);
        let gutter = lines.len().to_string().len().max(2);

        for (n, line) in lines.iter_mut().enumerate() {
            let number = Span::styled(
                format!("{:>gutter$} ", n + 1),
                Style::default().fg(colors.line_number()),
            );
            line.spans.insert(0, number);
        }

        let mut paragraph = Paragraph::new(lines).scroll((scroll as u16, 0));
        if read_only {
            paragraph = paragraph.style(Style::default().add_modifier(Modifier::DIM));
        }
        paragraph.render(inner, buf);

        if complete {
            let width = (COMPLETE_BADGE.chars().count() as u16).min(inner.width);
            let badge_area = Rect::new(inner.right() - width, inner.y, width, 1);
            Paragraph::new(Span::styled(
                COMPLETE_BADGE,
                Style::default()
                    .fg(colors.bg())
                    .bg(colors.success())
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Right)
            .render(badge_area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::buffer::Edit;

    fn theme() -> Theme {
        Theme::default()
    }

    #[test]
    fn test_first_divergence() {
        assert_eq!(first_divergence("", "abc"), None);
        assert_eq!(first_divergence("ab", "abc"), None);
        assert_eq!(first_divergence("axc", "abc"), Some(1));
        assert_eq!(first_divergence("abcd", "abc"), Some(3));
        assert_eq!(first_divergence("abc", "abc"), None);
    }

    #[test]
    fn test_code_lines_split_and_cursor_at_end() {
        let session = TypingSession::new("a\nb", "a\nb", false);
        let theme = theme();
        let lines = code_lines(&session, Language::JavaScript, &theme, true);
        assert_eq!(lines.len(), 2);
        // "b" plus the cursor cell.
        assert_eq!(lines[1].spans.len(), 2);
        assert_eq!(lines[1].spans[1].content, " ");
    }

    #[test]
    fn test_code_lines_cursor_on_newline() {
        let mut session = TypingSession::new("ab\ncd", "ab\ncd", false);
        for _ in 0..3 {
            session.apply(&Edit::Left);
        }
        let theme = theme();
        let lines = code_lines(&session, Language::JavaScript, &theme, true);
        assert_eq!(lines[0].spans.len(), 3);
        assert_eq!(lines[1].spans.len(), 2);
    }

    #[test]
    fn test_hidden_cursor_adds_no_cell() {
        let session = TypingSession::new("x", "x", true);
        let theme = theme();
        let lines = code_lines(&session, Language::Python, &theme, false);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans.len(), 1);
    }

    #[test]
    fn test_render_shows_badge_when_complete() {
        let session = TypingSession::new("ok", "ok", false);
        let theme = theme();
        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        CodeEditor::new(&session, Language::JavaScript, "practice", true, &theme).render(area, &mut buf);
        let top: String = (0..area.width)
            .map(|x| buf[(x, 1)].symbol().to_string())
            .collect();
        assert!(top.contains("Complete!"));
    }
}
