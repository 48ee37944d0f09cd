//! TUI color semantics per color mode.
//!
//! The active [`ColorMode`] is handed to the renderer by the caller;
//! nothing here reads terminal or process state.
//!
//! Color semantics:
//! - Green: correct, revealed answer
//! - Red: incorrect
//! - Cyan/Blue: interactive elements (keybinding hints, enabled buttons)
//! - Dim: de-emphasized (locations, disabled controls, help)
//! - Bold: the question prompt

use ratatui::style::{Color, Modifier, Style};

use crate::types::ColorMode;

/// Every style the renderer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub title: Style,
    pub prompt: Style,
    pub correct: Style,
    pub incorrect: Style,
    pub interactive: Style,
    pub disabled: Style,
    pub dim: Style,
    pub cursor: Style,
    pub checked: Style,
    pub help: Style,
}

/// Palette for dark terminal backgrounds.
pub const DARK: Palette = Palette {
    title: Style::new().fg(Color::White).add_modifier(Modifier::BOLD),
    prompt: Style::new().add_modifier(Modifier::BOLD),
    correct: Style::new().fg(Color::Green).add_modifier(Modifier::BOLD),
    incorrect: Style::new().fg(Color::Red).add_modifier(Modifier::BOLD),
    interactive: Style::new().fg(Color::Cyan),
    disabled: Style::new().fg(Color::DarkGray),
    dim: Style::new().fg(Color::DarkGray),
    cursor: Style::new().add_modifier(Modifier::REVERSED),
    checked: Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    help: Style::new().fg(Color::DarkGray),
};

/// Palette for light terminal backgrounds.
pub const LIGHT: Palette = Palette {
    title: Style::new().fg(Color::Black).add_modifier(Modifier::BOLD),
    prompt: Style::new().fg(Color::Black).add_modifier(Modifier::BOLD),
    correct: Style::new().fg(Color::Green).add_modifier(Modifier::BOLD),
    incorrect: Style::new().fg(Color::Red).add_modifier(Modifier::BOLD),
    interactive: Style::new().fg(Color::Blue),
    disabled: Style::new().fg(Color::Gray),
    dim: Style::new().fg(Color::Gray),
    cursor: Style::new().add_modifier(Modifier::REVERSED),
    checked: Style::new().fg(Color::Blue).add_modifier(Modifier::BOLD),
    help: Style::new().fg(Color::Gray),
};

impl Palette {
    pub fn for_mode(mode: ColorMode) -> &'static Palette {
        match mode {
            ColorMode::Dark => &DARK,
            ColorMode::Light => &LIGHT,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_colors_match_in_both_modes() {
        for mode in [ColorMode::Dark, ColorMode::Light] {
            let p = Palette::for_mode(mode);
            assert_eq!(p.correct.fg, Some(Color::Green));
            assert_eq!(p.incorrect.fg, Some(Color::Red));
        }
    }

    #[test]
    fn modes_pick_different_palettes() {
        assert_ne!(Palette::for_mode(ColorMode::Dark), Palette::for_mode(ColorMode::Light));
        assert_eq!(Palette::for_mode(ColorMode::Light).interactive.fg, Some(Color::Blue));
    }

    #[test]
    fn cursor_style_is_reversed() {
        assert!(DARK.cursor.add_modifier.contains(Modifier::REVERSED));
    }
}
