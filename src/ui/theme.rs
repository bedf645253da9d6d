//! Greyscale theme for tartex-runner
//! Monochrome palette with a little colour reserved for severities.

use crate::classify::Severity;
use ratatui::style::{Color, Modifier, Style};

pub struct Theme;

impl Theme {
    // ─────────────────────────────────────────────────────────────────────
    // Core greyscale palette - from brightest to darkest
    // ─────────────────────────────────────────────────────────────────────

    pub const WHITE: Color = Color::Rgb(255, 255, 255);
    pub const GREY_50: Color = Color::Rgb(250, 250, 250);
    pub const GREY_100: Color = Color::Rgb(220, 220, 220);
    pub const GREY_200: Color = Color::Rgb(180, 180, 180);
    pub const GREY_300: Color = Color::Rgb(140, 140, 140);
    pub const GREY_400: Color = Color::Rgb(100, 100, 100);
    pub const GREY_500: Color = Color::Rgb(70, 70, 70);
    pub const GREY_700: Color = Color::Rgb(35, 35, 35);
    pub const GREY_800: Color = Color::Rgb(28, 28, 28);
    pub const GREY_900: Color = Color::Rgb(18, 18, 18);

    /// Background color alias
    pub const BG: Color = Self::GREY_900;

    // ─────────────────────────────────────────────────────────────────────
    // Accents
    // ─────────────────────────────────────────────────────────────────────

    pub const GREEN: Color = Color::Rgb(100, 200, 100);
    pub const RED: Color = Color::Rgb(200, 100, 100);
    pub const YELLOW: Color = Color::Rgb(220, 190, 90);

    /// Search match highlight
    pub const MATCH_BG: Color = Color::Rgb(90, 80, 30);

    pub const TITLE: &'static str = "t a r t e x";

    // ─────────────────────────────────────────────────────────────────────
    // Glyphs
    // ─────────────────────────────────────────────────────────────────────

    /// Spinner frames - braille pattern (smooth)
    pub const SPINNER_BRAILLE: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

    pub const CHECK_MARK: char = '✓';
    pub const CROSS_MARK: char = '✗';
    pub const WARNING_MARK: char = '⚠';
    pub const INFO_MARK: char = '·';
    pub const DOT_SEPARATOR: char = '·';

    // ─────────────────────────────────────────────────────────────────────
    // Pre-built styles
    // ─────────────────────────────────────────────────────────────────────

    pub fn text() -> Style {
        Style::default().fg(Self::GREY_100)
    }

    pub fn text_muted() -> Style {
        Style::default().fg(Self::GREY_300)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::GREY_400)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::GREY_50)
            .add_modifier(Modifier::BOLD)
    }

    /// Keybinding highlight
    pub fn key() -> Style {
        Style::default()
            .fg(Self::WHITE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::GREY_500)
    }

    pub fn search_match() -> Style {
        Style::default()
            .bg(Self::MATCH_BG)
            .fg(Self::WHITE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn severity(severity: Severity) -> Style {
        match severity {
            Severity::Error => Style::default().fg(Self::RED),
            Severity::Warning => Style::default().fg(Self::YELLOW),
            Severity::Info => Style::default().fg(Self::GREY_200),
        }
    }

    pub fn severity_mark(severity: Severity) -> char {
        match severity {
            Severity::Error => Self::CROSS_MARK,
            Severity::Warning => Self::WARNING_MARK,
            Severity::Info => Self::INFO_MARK,
        }
    }
}
