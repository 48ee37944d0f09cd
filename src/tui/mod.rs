//! TUI module for taking quizzes in the terminal.
//!
//! Organized along FP/Unix boundaries:
//! - `state`: data types (Deck, Screen, Action, Transition)
//! - `update`: transitions
//! - `view`: pure rendering
//! - `theme`: palettes per color mode
//! - `run`: effects (terminal, event loop)

pub mod run;
pub mod state;
pub mod theme;
pub mod update;
pub mod view;
