use ratatui::style::{Color, Modifier, Style};

use crate::editor::TagKind;

/// Theme configuration for the editor
#[derive(Clone, Debug)]
pub struct Theme {
    /// Background color for the editor
    pub background: Color,

    /// Foreground color for plain text
    pub text_fg: Color,

    /// Foreground color for hashtags
    pub hashtag_fg: Color,

    /// Foreground color for mentions
    pub mention_fg: Color,

    /// Foreground (text) color for the status bar
    pub status_bar_fg: Color,

    /// Background color for the status bar
    pub status_bar_bg: Color,

    /// Color for the tag list in the status bar
    pub tag_list_color: Color,

    /// Foreground color for active selection
    pub selection_fg: Color,

    /// Background color for active selection
    pub selection_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            text_fg: Color::Reset,
            hashtag_fg: Color::LightBlue,
            mention_fg: Color::LightMagenta,
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            tag_list_color: Color::LightYellow,
            selection_fg: Color::White,
            selection_bg: Color::LightBlue,
        }
    }
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text_fg).bg(self.background)
    }

    /// Style for a tagged run of the given kind
    pub fn tag_style(&self, kind: TagKind) -> Style {
        let fg = match kind {
            TagKind::Hashtag => self.hashtag_fg,
            TagKind::Mention => self.mention_fg,
        };
        Style::default()
            .fg(fg)
            .bg(self.background)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().fg(self.selection_fg).bg(self.selection_bg)
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.status_bar_fg)
            .bg(self.status_bar_bg)
    }

    pub fn tag_list_style(&self) -> Style {
        Style::default().fg(self.tag_list_color)
    }
}
