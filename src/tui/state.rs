//! TUI state algebra: the deck of widgets, screens, actions, transitions.
//!
//! Design principle: Screen variants carry only navigation state
//! (which quiz, which option the cursor is on). Attempt state lives in
//! the widgets owned by the [`Deck`], one per quiz instance, so leaving
//! a quiz and coming back keeps the learner's progress.

use crossterm::event::KeyEvent;

use crate::quiz::{Quiz, QuizWidget, Status};
use crate::types::{ColorMode, Location};

// ============================================================================
// APP EVENTS
// ============================================================================

/// Everything the event loop can receive from its channel.
#[derive(Debug)]
pub enum AppEvent {
    /// A terminal key event from the crossterm reader thread.
    Key(KeyEvent),
    /// The terminal was resized; redraw.
    Resize,
}

// ============================================================================
// DECK
// ============================================================================

/// One quiz instance on the deck and where it was authored.
#[derive(Debug, Clone)]
pub struct DeckEntry {
    pub location: Location,
    pub widget: QuizWidget,
}

/// Every quiz being taken, each with independent attempt state.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    entries: Vec<DeckEntry>,
}

/// Tally of widget outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub incorrect: usize,
    pub revealed: usize,
    pub unanswered: usize,
}

impl Score {
    pub fn total(&self) -> usize {
        self.correct + self.incorrect + self.revealed + self.unanswered
    }
}

impl Deck {
    /// Mount a fresh widget for every quiz.
    pub fn new(quizzes: Vec<(Location, Quiz)>) -> Self {
        let entries = quizzes
            .into_iter()
            .map(|(location, quiz)| DeckEntry {
                location,
                widget: QuizWidget::new(quiz),
            })
            .collect();
        Deck { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DeckEntry> {
        self.entries.get(index)
    }

    pub fn widget_mut(&mut self, index: usize) -> Option<&mut QuizWidget> {
        self.entries.get_mut(index).map(|e| &mut e.widget)
    }

    pub fn entries(&self) -> &[DeckEntry] {
        &self.entries
    }

    pub fn score(&self) -> Score {
        let mut score = Score::default();
        for entry in &self.entries {
            match entry.widget.status() {
                Status::Correct => score.correct += 1,
                Status::Incorrect => score.incorrect += 1,
                Status::Revealed => score.revealed += 1,
                Status::Unanswered => score.unanswered += 1,
            }
        }
        score
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

/// Top-level TUI model.
#[derive(Debug)]
pub struct App {
    /// Current screen.
    pub screen: Screen,

    /// The quizzes and their attempt state.
    pub deck: Deck,

    /// Palette to render with, chosen by the caller.
    pub mode: ColorMode,

    /// Set to true when the app should exit on the next tick.
    pub should_quit: bool,
}

impl App {
    /// Land on the first quiz, or the summary when there is none.
    pub fn new(deck: Deck, mode: ColorMode) -> Self {
        let screen = if deck.is_empty() {
            Screen::Summary { cursor: 0 }
        } else {
            Screen::question(0, &deck)
        };
        App {
            screen,
            deck,
            mode,
            should_quit: false,
        }
    }
}

// ============================================================================
// SCREENS
// ============================================================================

/// The current TUI screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// One quiz widget.
    Question {
        /// Index into the deck.
        index: usize,
        /// Focused option row.
        cursor: usize,
    },

    /// Outcome of every quiz on the deck.
    Summary {
        /// Focused quiz row.
        cursor: usize,
    },
}

/// Default screen is the summary (used as placeholder during transitions).
impl Default for Screen {
    fn default() -> Self {
        Screen::Summary { cursor: 0 }
    }
}

impl Screen {
    /// Open a quiz with the cursor on its current choice, or the first option.
    pub fn question(index: usize, deck: &Deck) -> Self {
        let cursor = deck
            .get(index)
            .and_then(|e| e.widget.attempt().selected())
            .unwrap_or(0);
        Screen::Question { index, cursor }
    }
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Semantic user action, decoupled from raw key events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move cursor up in a list.
    MoveUp,
    /// Move cursor down in a list.
    MoveDown,
    /// Choose the option under the cursor.
    Choose,
    /// Choose an option by its 1-based number.
    NumberKey(u8),
    /// Submit on a quiz; open the focused quiz on the summary.
    Enter,
    /// Show the correct answer.
    Reveal,
    /// Next quiz.
    Next,
    /// Previous quiz.
    Prev,
    /// Open the summary.
    Summary,
    /// Navigate back to the previous screen.
    Back,
    /// Quit the application.
    Quit,
}

// ============================================================================
// TRANSITIONS
// ============================================================================

/// Result of a state transition.
#[derive(Debug, PartialEq, Eq)]
pub enum Transition {
    /// Render this screen (may be the same or a different screen).
    Screen(Screen),
    /// Quit the application.
    Quit,
}

// ============================================================================
// TESTS
// ============================================================================
