use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::app::{App, Focus, GenerateField};
use crate::gateway::gate::GateStatus;
use crate::snippet::Snippet;
use crate::ui::highlight;
use crate::ui::theme::{Theme, ThemeColors};

/// Assistant panel: intro, generate form, the reference snippet and the
/// previous/next controls.
pub struct SnippetPanel<'a> {
    app: &'a App,
}

impl<'a> SnippetPanel<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }
}

/// Label for the submit control, mirroring the gate state.
pub fn submit_label(status: GateStatus, remaining_secs: Option<u64>) -> String {
    match status {
        GateStatus::Generating => "Generating…".to_string(),
        GateStatus::CoolingDown => match remaining_secs {
            Some(secs) => format!("Cooldown… {secs}s"),
            None => "Cooldown…".to_string(),
        },
        GateStatus::Idle => "[Enter] Generate snippet".to_string(),
    }
}

fn snippet_lines(snippet: &Snippet, colors: &ThemeColors) -> Vec<Line<'static>> {
    let code = snippet.code();
    let kinds = highlight::classify(code, snippet.language());
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    for (ch, kind) in code.chars().zip(kinds) {
        if ch == '\n' {
            lines.push(Line::from(std::mem::take(&mut spans)));
        } else {
            spans.push(Span::styled(ch.to_string(), Style::default().fg(colors.syntax(kind))));
        }
    }
    lines.push(Line::from(spans));
    lines
}

impl SnippetPanel<'_> {
    fn form_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let colors = &theme.colors;
        let app = self.app;
        let form_focused = app.focus == Focus::Generate;
        let label = Style::default().fg(colors.text_pending());
        let field_style = |field: GenerateField| {
            if form_focused && app.generate_field == field {
                Style::default()
                    .fg(colors.fg())
                    .bg(colors.selection_bg())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            }
        };

        let mut lines = vec![
            Line::from(Span::styled(
                "Generate a new snippet",
                Style::default().fg(colors.header_fg()).add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled("Language  ", label),
                Span::styled(
                    format!("< {} >", app.selected_language()),
                    field_style(GenerateField::Language),
                ),
            ]),
        ];

        let mut topic = vec![Span::styled("Topic     ", label)];
        let topic_style = field_style(GenerateField::Topic);
        if form_focused && app.generate_field == GenerateField::Topic {
            let (before, at, after) = app.topic.render_parts();
            let cursor = Style::default()
                .fg(colors.text_cursor_fg())
                .bg(colors.text_cursor_bg());
            topic.push(Span::styled(before.to_string(), topic_style));
            topic.push(Span::styled(at.map_or(" ".to_string(), |c| c.to_string()), cursor));
            topic.push(Span::styled(after.to_string(), topic_style));
        } else if app.topic.value().is_empty() {
            topic.push(Span::styled("(blank: syntax)", label));
        } else {
            topic.push(Span::styled(app.topic.value().to_string(), topic_style));
        }
        lines.push(Line::from(topic));

        let status = app.gate_status();
        let remaining = app.cooldown_remaining().map(|d| d.as_secs() + 1);
        let submit_style = match status {
            GateStatus::Idle if form_focused => Style::default()
                .fg(colors.fg())
                .bg(colors.accent())
                .add_modifier(Modifier::BOLD),
            GateStatus::Idle => Style::default().fg(colors.accent()),
            _ => Style::default().fg(colors.accent_dim()),
        };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {} ", submit_label(status, remaining)),
            submit_style,
        )));
        lines.push(Line::from(Span::styled(
            "Uses Gemini with a short cooldown to prevent rapid calls.",
            label,
        )));
        if let Some(err) = &app.generate_error {
            lines.push(Line::from(Span::styled(
                err.clone(),
                Style::default().fg(colors.error()),
            )));
        }
        lines
    }

    fn nav_line(&self, colors: &ThemeColors) -> Line<'static> {
        let practice = &self.app.practice;
        if self.app.is_reviewing() {
            return Line::from(Span::styled(
                "Reviewing history · [Esc] back to practice",
                Style::default().fg(colors.warning()),
            ));
        }
        let enabled = Style::default().fg(colors.accent());
        let disabled = Style::default().fg(colors.accent_dim());
        Line::from(vec![
            Span::styled(
                "← Previous [^P]",
                if practice.is_at_start() { disabled } else { enabled },
            ),
            Span::raw("   "),
            Span::styled(
                "[^N] Next →",
                if practice.is_at_end() { disabled } else { enabled },
            ),
        ])
    }
}

impl Widget for SnippetPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = self.app.theme;
        let colors = &theme.colors;

        let block = Block::bordered()
            .title(" Assistant ")
            .border_style(Style::default().fg(if self.app.focus == Focus::Generate {
                colors.border_focused()
            } else {
                colors.border()
            }))
            .style(Style::default().bg(colors.panel_bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let form = self.form_lines(theme);
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(form.len() as u16 + 2),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(inner);

        let intro = Paragraph::new(vec![
            Line::from(Span::styled(
                "Type code from memory to build the muscle memory for its syntax.",
                Style::default().fg(colors.fg()),
            )),
            Line::from(Span::styled(
                "Type the code below character for character.",
                Style::default().fg(colors.text_pending()),
            )),
        ])
        .wrap(Wrap { trim: true });
        intro.render(sections[0], buf);

        Paragraph::new(form)
            .wrap(Wrap { trim: false })
            .block(
                Block::bordered()
                    .border_style(Style::default().fg(colors.border()))
                    .style(Style::default().bg(colors.bg())),
            )
            .render(sections[1], buf);

        let snippet = self.app.practice.active_snippet();
        let code_block = Block::bordered()
            .title(Line::from(vec![
                Span::styled(
                    format!(" {} ", snippet.title()),
                    Style::default().fg(colors.header_fg()),
                ),
                Span::styled(
                    format!("{} · {} ", snippet.language(), snippet.difficulty().as_str()),
                    Style::default().fg(colors.text_pending()),
                ),
            ]))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        Paragraph::new(snippet_lines(snippet, colors))
            .wrap(Wrap { trim: false })
            .block(code_block)
            .render(sections[2], buf);

        Paragraph::new(self.nav_line(colors)).render(sections[3], buf);
    }
}
