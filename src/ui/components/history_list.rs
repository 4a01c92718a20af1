use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::practice::Practice;
use crate::ui::theme::Theme;

/// Snippets reached so far. The entry open in the editor is marked, the
/// highlighted one is where Enter would go.
pub struct HistoryList<'a> {
    practice: &'a Practice,
    selected: usize,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> HistoryList<'a> {
    pub fn new(practice: &'a Practice, selected: usize, focused: bool, theme: &'a Theme) -> Self {
        Self {
            practice,
            selected,
            focused,
            theme,
        }
    }
}

impl Widget for HistoryList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(" History ")
            .border_style(Style::default().fg(if self.focused {
                colors.border_focused()
            } else {
                colors.border()
            }))
            .style(Style::default().bg(colors.panel_bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let nav = self.practice.navigator();
        let active = nav.active();
        let current = nav.current();

        let lines: Vec<Line> = self
            .practice
            .history()
            .map(|(i, snippet)| {
                let marker = if i == active { "▸" } else { " " };
                let suffix = if i == current { " ●" } else { "" };
                let mut style = Style::default().fg(colors.fg());
                if i == active {
                    style = style.add_modifier(Modifier::BOLD);
                }
                if self.focused && i == self.selected {
                    style = style.bg(colors.selection_bg());
                }
                Line::from(vec![
                    Span::styled(format!("{marker}{:>2}. ", i + 1), style),
                    Span::styled(snippet.title().to_string(), style),
                    Span::styled(suffix, style.fg(colors.accent())),
                ])
            })
            .collect();

        // Keep the selection in view.
        let height = inner.height as usize;
        let scroll = if height == 0 {
            0
        } else {
            self.selected.saturating_sub(height - 1)
        };
        Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .render(inner, buf);
    }
}
