use ratatui::style::{Color, Modifier, Style};

/// Grey and indigo material theme.
///
/// Base aesthetic:
/// - light grey foreground on a near-black grey background
/// - indigo accent for the active section, selections and the prediction
pub struct Theme;

impl Theme {
    // Grey palette
    pub const BG: Color = Color::Rgb(33, 33, 33);
    pub const FG: Color = Color::Rgb(238, 238, 238);
    pub const FG_DIM: Color = Color::Rgb(158, 158, 158);
    pub const FG_MUTED: Color = Color::Rgb(97, 97, 97);

    // Indigo accents
    pub const ACCENT: Color = Color::Rgb(121, 134, 203);
    pub const ACCENT_DEEP: Color = Color::Rgb(40, 53, 147);

    pub const ERROR: Color = Color::Rgb(229, 115, 115);

    /// Default full-screen style.
    pub fn base() -> Style {
        Style::default().fg(Self::FG).bg(Self::BG)
    }

    /// Panel borders.
    pub fn border() -> Style {
        Style::default().fg(Self::FG_MUTED).bg(Self::BG)
    }

    /// Panel titles.
    pub fn title() -> Style {
        Style::default().fg(Self::FG).add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    /// Secondary text, keys in tables.
    pub fn dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    /// Placeholders and hint descriptions.
    pub fn muted() -> Style {
        Style::default().fg(Self::FG_MUTED)
    }

    /// Selected table row.
    pub fn highlight_bg() -> Style {
        Style::default()
            .fg(Self::FG)
            .bg(Self::ACCENT_DEEP)
            .add_modifier(Modifier::BOLD)
    }

    pub fn accent() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::ERROR).add_modifier(Modifier::BOLD)
    }
}
