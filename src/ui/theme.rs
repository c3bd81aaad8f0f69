use ratatui::style::Color;

use crate::kernel::ProcState;

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub header_accent_bg: Color,
    pub header_accent_fg: Color,
    pub status_ok: Color,
    pub status_err: Color,
    pub statusbar_bg: Color,
    pub overlay_border: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub accent: Color,
    pub pill_key_bg: Color,
    pub pill_key_fg: Color,
    pub pill_desc_fg: Color,
    pub surface_bg: Color,
    pub gauge_filled: Color,
    pub gauge_unfilled: Color,
    pub sparkline_color: Color,
    pub selection_bg: Color,
    /// Running, ready, sleeping, zombie, everything else.
    pub state_colors: [Color; 5],
}

impl Theme {
    pub fn from_config(theme_name: &str) -> Self {
        match theme_name.to_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn dark() -> Self {
        Theme {
            name: "dark",
            header_accent_bg: Color::Green,
            header_accent_fg: Color::Black,
            status_ok: Color::Green,
            status_err: Color::Red,
            statusbar_bg: Color::DarkGray,
            overlay_border: Color::DarkGray,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            accent: Color::Green,
            pill_key_bg: Color::Yellow,
            pill_key_fg: Color::Black,
            pill_desc_fg: Color::White,
            surface_bg: Color::DarkGray,
            gauge_filled: Color::Rgb(103, 232, 249),
            gauge_unfilled: Color::DarkGray,
            sparkline_color: Color::Rgb(251, 146, 60),
            selection_bg: Color::Rgb(51, 65, 85),
            state_colors: [
                Color::Rgb(52, 211, 153),
                Color::Rgb(251, 191, 36),
                Color::Rgb(96, 165, 250),
                Color::Rgb(239, 68, 68),
                Color::Rgb(148, 163, 184),
            ],
        }
    }

    pub fn light() -> Self {
        Theme {
            name: "light",
            header_accent_bg: Color::Blue,
            header_accent_fg: Color::White,
            status_ok: Color::Rgb(0, 120, 0),
            status_err: Color::Red,
            statusbar_bg: Color::Rgb(220, 220, 220),
            overlay_border: Color::Rgb(150, 150, 150),
            text_primary: Color::Black,
            text_secondary: Color::DarkGray,
            accent: Color::Blue,
            pill_key_bg: Color::Blue,
            pill_key_fg: Color::White,
            pill_desc_fg: Color::Black,
            surface_bg: Color::Rgb(200, 200, 200),
            gauge_filled: Color::Rgb(70, 130, 180),
            gauge_unfilled: Color::Rgb(200, 200, 200),
            sparkline_color: Color::Rgb(70, 130, 180),
            selection_bg: Color::Rgb(190, 210, 235),
            state_colors: [
                Color::Rgb(0, 130, 60),
                Color::Rgb(180, 120, 0),
                Color::Rgb(40, 90, 180),
                Color::Rgb(200, 40, 40),
                Color::Rgb(110, 110, 110),
            ],
        }
    }

    pub fn state_color(&self, state: ProcState) -> Color {
        let idx = match state {
            ProcState::Running => 0,
            ProcState::Runnable => 1,
            ProcState::Sleeping => 2,
            ProcState::Zombie => 3,
            ProcState::Embryo | ProcState::Unused => 4,
        };
        self.state_colors[idx]
    }
}
