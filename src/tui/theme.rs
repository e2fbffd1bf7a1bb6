//! Color themes for the UI.
//!
//! Built-in themes: default, nord, dracula, monochrome. Selected with
//! `--theme` or cycled with `c`; the choice is saved in preferences.

use gms::state::QualityTier;
use ratatui::style::Color;

#[derive(Clone, Debug)]
pub struct Theme {
    name: &'static str,

    // UI chrome
    pub border: Color,
    pub text: Color,
    pub text_dim: Color,
    pub highlight_bg: Color,

    // Quality and loss indicators
    pub success: Color,
    pub good: Color,
    pub warning: Color,
    pub error: Color,

    // Accents
    pub shortcut: Color,
    pub header: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            name: "default",
            border: Color::Cyan,
            text: Color::White,
            text_dim: Color::Gray,
            highlight_bg: Color::DarkGray,
            success: Color::Green,
            good: Color::LightGreen,
            warning: Color::Yellow,
            error: Color::Red,
            shortcut: Color::Yellow,
            header: Color::Cyan,
        }
    }

    /// Nord theme - arctic, north-bluish colors
    pub fn nord() -> Self {
        Self {
            name: "nord",
            border: Color::Rgb(136, 192, 208),    // Nord8 cyan
            text: Color::Rgb(236, 239, 244),      // Nord6
            text_dim: Color::Rgb(76, 86, 106),    // Nord3
            highlight_bg: Color::Rgb(59, 66, 82), // Nord1
            success: Color::Rgb(163, 190, 140),   // Nord14 green
            good: Color::Rgb(143, 188, 187),      // Nord7 teal
            warning: Color::Rgb(235, 203, 139),   // Nord13 yellow
            error: Color::Rgb(191, 97, 106),      // Nord11 red
            shortcut: Color::Rgb(235, 203, 139),
            header: Color::Rgb(136, 192, 208),
        }
    }

    pub fn dracula() -> Self {
        Self {
            name: "dracula",
            border: Color::Rgb(189, 147, 249),    // Purple
            text: Color::Rgb(248, 248, 242),
            text_dim: Color::Rgb(98, 114, 164),   // Comment
            highlight_bg: Color::Rgb(68, 71, 90),
            success: Color::Rgb(80, 250, 123),
            good: Color::Rgb(139, 233, 253),      // Cyan
            warning: Color::Rgb(255, 184, 108),   // Orange
            error: Color::Rgb(255, 85, 85),
            shortcut: Color::Rgb(241, 250, 140),
            header: Color::Rgb(255, 121, 198),    // Pink
        }
    }

    /// Grayscale only; Poor stands out as white
    pub fn monochrome() -> Self {
        Self {
            name: "monochrome",
            border: Color::Rgb(200, 200, 200),
            text: Color::Rgb(230, 230, 230),
            text_dim: Color::Rgb(120, 120, 120),
            highlight_bg: Color::Rgb(50, 50, 50),
            success: Color::Rgb(160, 160, 160),
            good: Color::Rgb(180, 180, 180),
            warning: Color::Rgb(210, 210, 210),
            error: Color::Rgb(255, 255, 255),
            shortcut: Color::Rgb(200, 200, 200),
            header: Color::Rgb(255, 255, 255),
        }
    }

    /// Get a theme by name; unknown names give the default theme
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "nord" => Self::nord(),
            "dracula" => Self::dracula(),
            "monochrome" | "mono" => Self::monochrome(),
            _ => Self::default_theme(),
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn list() -> &'static [&'static str] {
        &["default", "nord", "dracula", "monochrome"]
    }

    pub fn quality_color(&self, tier: QualityTier) -> Color {
        match tier {
            QualityTier::Unknown => self.text_dim,
            QualityTier::Excellent => self.success,
            QualityTier::Good => self.good,
            QualityTier::Fair => self.warning,
            QualityTier::Poor => self.error,
        }
    }

    /// Color for a loss percentage
    pub fn loss_color(&self, loss_pct: f64) -> Color {
        if loss_pct >= 10.0 {
            self.error
        } else if loss_pct > 0.0 {
            self.warning
        } else {
            self.success
        }
    }
}
