use std::fs;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config;
use crate::ui::highlight::TokenKind;

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub bg: String,
    pub fg: String,
    pub panel_bg: String,
    pub line_number: String,
    pub text_incorrect: String,
    pub text_incorrect_bg: String,
    pub text_pending: String,
    pub text_cursor_bg: String,
    pub text_cursor_fg: String,
    pub accent: String,
    pub accent_dim: String,
    pub border: String,
    pub border_focused: String,
    pub header_bg: String,
    pub header_fg: String,
    pub selection_bg: String,
    pub error: String,
    pub warning: String,
    pub success: String,
    pub syntax_keyword: String,
    pub syntax_string: String,
    pub syntax_comment: String,
    pub syntax_number: String,
    pub syntax_type: String,
    pub syntax_punctuation: String,
}

impl Theme {
    pub fn load(name: &str) -> Option<Self> {
        // User themes shadow bundled ones.
        let user_theme_path = config::config_dir()
            .join("themes")
            .join(format!("{name}.toml"));
        if let Ok(content) = fs::read_to_string(&user_theme_path) {
            match toml::from_str::<Theme>(&content) {
                Ok(theme) => {
                    debug!(path = %user_theme_path.display(), "loaded user theme");
                    return Some(theme);
                }
                Err(e) => warn!(path = %user_theme_path.display(), error = %e, "bad user theme"),
            }
        }

        let filename = format!("{name}.toml");
        let file = ThemeAssets::get(&filename)?;
        let content = std::str::from_utf8(file.data.as_ref()).ok()?;
        toml::from_str::<Theme>(content).ok()
    }

    pub fn available_themes() -> Vec<String> {
        ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
            .collect()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load("vscode-dark").unwrap_or_else(|| Self {
            name: "default".to_string(),
            colors: ThemeColors::default(),
        })
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            bg: "#1e1e1e".to_string(),
            fg: "#d4d4d4".to_string(),
            panel_bg: "#252526".to_string(),
            line_number: "#858585".to_string(),
            text_incorrect: "#f48771".to_string(),
            text_incorrect_bg: "#5a1d1d".to_string(),
            text_pending: "#6f6f6f".to_string(),
            text_cursor_bg: "#aeafad".to_string(),
            text_cursor_fg: "#1e1e1e".to_string(),
            accent: "#0e639c".to_string(),
            accent_dim: "#3e3e42".to_string(),
            border: "#3e3e42".to_string(),
            border_focused: "#007acc".to_string(),
            header_bg: "#2d2d30".to_string(),
            header_fg: "#cccccc".to_string(),
            selection_bg: "#37373d".to_string(),
            error: "#f14c4c".to_string(),
            warning: "#cca700".to_string(),
            success: "#89d185".to_string(),
            syntax_keyword: "#569cd6".to_string(),
            syntax_string: "#ce9178".to_string(),
            syntax_comment: "#6a9955".to_string(),
            syntax_number: "#b5cea8".to_string(),
            syntax_type: "#4ec9b0".to_string(),
            syntax_punctuation: "#d4d4d4".to_string(),
        }
    }
}

impl ThemeColors {
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6
            && hex.is_ascii()
            && let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            )
        {
            return Color::Rgb(r, g, b);
        }
        Color::White
    }

    pub fn bg(&self) -> Color { Self::parse_color(&self.bg) }
    pub fn fg(&self) -> Color { Self::parse_color(&self.fg) }
    pub fn panel_bg(&self) -> Color { Self::parse_color(&self.panel_bg) }
    pub fn line_number(&self) -> Color { Self::parse_color(&self.line_number) }
    pub fn text_incorrect(&self) -> Color { Self::parse_color(&self.text_incorrect) }
    pub fn text_incorrect_bg(&self) -> Color { Self::parse_color(&self.text_incorrect_bg) }
    pub fn text_pending(&self) -> Color { Self::parse_color(&self.text_pending) }
    pub fn text_cursor_bg(&self) -> Color { Self::parse_color(&self.text_cursor_bg) }
    pub fn text_cursor_fg(&self) -> Color { Self::parse_color(&self.text_cursor_fg) }
    pub fn accent(&self) -> Color { Self::parse_color(&self.accent) }
    pub fn accent_dim(&self) -> Color { Self::parse_color(&self.accent_dim) }
    pub fn border(&self) -> Color { Self::parse_color(&self.border) }
    pub fn border_focused(&self) -> Color { Self::parse_color(&self.border_focused) }
    pub fn header_bg(&self) -> Color { Self::parse_color(&self.header_bg) }
    pub fn header_fg(&self) -> Color { Self::parse_color(&self.header_fg) }
    pub fn selection_bg(&self) -> Color { Self::parse_color(&self.selection_bg) }
    pub fn error(&self) -> Color { Self::parse_color(&self.error) }
    pub fn warning(&self) -> Color { Self::parse_color(&self.warning) }
    pub fn success(&self) -> Color { Self::parse_color(&self.success) }
    pub fn syntax_keyword(&self) -> Color { Self::parse_color(&self.syntax_keyword) }
    pub fn syntax_string(&self) -> Color { Self::parse_color(&self.syntax_string) }
    pub fn syntax_comment(&self) -> Color { Self::parse_color(&self.syntax_comment) }
    pub fn syntax_number(&self) -> Color { Self::parse_color(&self.syntax_number) }
    pub fn syntax_type(&self) -> Color { Self::parse_color(&self.syntax_type) }
    pub fn syntax_punctuation(&self) -> Color { Self::parse_color(&self.syntax_punctuation) }

    pub fn syntax(&self, kind: TokenKind) -> Color {
        match kind {
            TokenKind::Plain => self.fg(),
            TokenKind::Keyword => self.syntax_keyword(),
            TokenKind::Type => self.syntax_type(),
            TokenKind::String => self.syntax_string(),
            TokenKind::Comment => self.syntax_comment(),
            TokenKind::Number => self.syntax_number(),
            TokenKind::Punctuation => self.syntax_punctuation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_themes_parse() {
        let names = Theme::available_themes();
        assert!(names.contains(&"vscode-dark".to_string()));
        assert!(names.contains(&"catppuccin-mocha".to_string()));
        for name in names {
            let file = ThemeAssets::get(&format!("{name}.toml")).unwrap();
            let content = std::str::from_utf8(file.data.as_ref()).unwrap();
            let theme: Theme = toml::from_str(content).unwrap();
            assert_eq!(theme.name, name);
        }
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(ThemeColors::parse_color("#1e1e1e"), Color::Rgb(0x1e, 0x1e, 0x1e));
        assert_eq!(ThemeColors::parse_color("zzzzzz"), Color::White);
        assert_eq!(ThemeColors::parse_color("#fff"), Color::White);
    }

    #[test]
    fn test_unknown_theme_is_none() {
        assert!(Theme::load("definitely-not-a-theme").is_none());
    }
}
