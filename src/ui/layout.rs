use ratatui::layout::{Constraint, Direction, Layout, Rect};

const HISTORY_WIDTH: u16 = 26;
const PANEL_WIDTH_WIDE: u16 = 52;
const PANEL_WIDTH_MEDIUM: u16 = 42;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutTier {
    Wide,   // ≥120 cols: history | editor | assistant panel
    Medium, // 80-119 cols: editor | assistant panel, history as popup
    Narrow, // <80 cols: editor over assistant panel, history as popup
}

impl LayoutTier {
    pub fn from_area(area: Rect) -> Self {
        if area.width >= 120 {
            LayoutTier::Wide
        } else if area.width >= 80 {
            LayoutTier::Medium
        } else {
            LayoutTier::Narrow
        }
    }

    pub fn show_history_sidebar(&self) -> bool {
        *self == LayoutTier::Wide
    }
}

pub struct AppLayout {
    pub header: Rect,
    pub history: Option<Rect>,
    pub editor: Rect,
    pub panel: Rect,
    pub footer: Rect,
    pub tier: LayoutTier,
}

impl AppLayout {
    pub fn new(area: Rect, footer_lines: u16) -> Self {
        let tier = LayoutTier::from_area(area);

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(6),
                Constraint::Length(footer_lines.max(1)),
            ])
            .split(area);
        let body = vertical[1];

        let (history, editor, panel) = match tier {
            LayoutTier::Wide => {
                let cols = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Length(HISTORY_WIDTH),
                        Constraint::Min(20),
                        Constraint::Length(PANEL_WIDTH_WIDE),
                    ])
                    .split(body);
                (Some(cols[0]), cols[1], cols[2])
            }
            LayoutTier::Medium => {
                let cols = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Min(20), Constraint::Length(PANEL_WIDTH_MEDIUM)])
                    .split(body);
                (None, cols[0], cols[1])
            }
            LayoutTier::Narrow => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                    .split(body);
                (None, rows[0], rows[1])
            }
        };

        Self {
            header: vertical[0],
            history,
            editor,
            panel,
            footer: vertical[2],
            tier,
        }
    }
}

pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = " ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints.iter().filter(|h| !h.is_empty()) {
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width {
            current = candidate;
        } else {
            if has_hint {
                out.push(current);
            }
            current = format!("{prefix}{hint}");
        }
        has_hint = true;
    }

    if has_hint {
        out.push(current);
    }
    out
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 30;
    const MIN_POPUP_HEIGHT: u16 = 8;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}
