//! State transitions: (Screen, Action, Deck) → Transition.
//!
//! This is the core logic of the TUI. Fully testable without a terminal.
//! Navigation is pure; the only mutation is forwarding Choose, Enter and
//! Reveal to the focused quiz widget. Unhandled actions return the
//! current screen unchanged (no-op).

use super::state::{Action, Deck, Screen, Transition};

/// State transition function.
pub fn update(screen: Screen, action: &Action, deck: &mut Deck) -> Transition {
    match screen {
        Screen::Question { index, cursor } => update_question(index, cursor, action, deck),
        Screen::Summary { cursor } => update_summary(cursor, action, deck),
    }
}

// ============================================================================
// PER-SCREEN HANDLERS
// ============================================================================

/// Question: cursor movement, choosing, submitting, revealing, paging.
fn update_question(index: usize, cursor: usize, action: &Action, deck: &mut Deck) -> Transition {
    let deck_len = deck.len();
    let Some(widget) = deck.widget_mut(index) else {
        // Stale index: fall back to the summary.
        return Transition::Screen(Screen::Summary { cursor: 0 });
    };
    let option_count = widget.quiz().options().len();
    let stay = |cursor| Transition::Screen(Screen::Question { index, cursor });

    match action {
        Action::MoveUp => stay(cursor.saturating_sub(1)),
        Action::MoveDown => stay((cursor + 1).min(option_count - 1)),
        Action::Choose => {
            widget.select(cursor);
            stay(cursor)
        }
        Action::NumberKey(n) => {
            let choice = usize::from(*n).wrapping_sub(1);
            if choice < option_count {
                widget.select(choice);
                stay(choice)
            } else {
                stay(cursor)
            }
        }
        Action::Enter => {
            widget.submit();
            stay(cursor)
        }
        Action::Reveal => {
            widget.reveal_answer();
            stay(cursor)
        }
        Action::Next => {
            if index + 1 < deck_len {
                Transition::Screen(Screen::question(index + 1, deck))
            } else {
                Transition::Screen(Screen::Summary { cursor: index })
            }
        }
        Action::Prev => Transition::Screen(Screen::question(index.saturating_sub(1), deck)),
        Action::Summary | Action::Back => Transition::Screen(Screen::Summary { cursor: index }),
        Action::Quit => Transition::Quit,
    }
}

/// Summary: browse quizzes, jump into one, quit.
fn update_summary(cursor: usize, action: &Action, deck: &mut Deck) -> Transition {
    let len = deck.len();

    match action {
        Action::MoveUp => Transition::Screen(Screen::Summary {
            cursor: cursor.saturating_sub(1),
        }),
        Action::MoveDown => {
            let new_cursor = if len == 0 { 0 } else { (cursor + 1).min(len - 1) };
            Transition::Screen(Screen::Summary { cursor: new_cursor })
        }
        Action::Enter | Action::Back if cursor < len => {
            Transition::Screen(Screen::question(cursor, deck))
        }
        Action::Quit => Transition::Quit,
        _ => Transition::Screen(Screen::Summary { cursor }),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    use crate::quiz::{Quiz, Status};
    use crate::types::{Feedback, Location, MaxTries};

    fn deck_with_tries(n: usize, max_tries: MaxTries) -> Deck {
        let quizzes = (0..n)
            .map(|i| {
                let quiz = Quiz::new(
                    format!("Question {}", i),
                    vec!["Henry".into(), "Farad".into(), "Tesla".into()],
                    1,
                    max_tries,
                )
                .unwrap();
                (Location::new("4.1.mdx", 10 * (i + 1)), quiz)
            })
            .collect();
        Deck::new(quizzes)
    }

    fn deck(n: usize) -> Deck {
        deck_with_tries(n, MaxTries::ONE)
    }

    fn q(index: usize, cursor: usize) -> Screen {
        Screen::Question { index, cursor }
    }

    /// Apply actions in order, returning the final screen.
    fn run(mut screen: Screen, actions: &[Action], deck: &mut Deck) -> Screen {
        for action in actions {
            match update(screen, action, deck) {
                Transition::Screen(next) => screen = next,
                Transition::Quit => panic!("unexpected quit"),
            }
        }
        screen
    }

    // -- Question: cursor --

    #[test]
    fn cursor_moves_within_options() {
        let mut d = deck(1);
        assert_eq!(update(q(0, 0), &Action::MoveUp, &mut d), Transition::Screen(q(0, 0)));
        assert_eq!(update(q(0, 0), &Action::MoveDown, &mut d), Transition::Screen(q(0, 1)));
        assert_eq!(update(q(0, 2), &Action::MoveDown, &mut d), Transition::Screen(q(0, 2)));
    }

    #[test]
    fn moving_cursor_does_not_select() {
        let mut d = deck(1);
        run(q(0, 0), &[Action::MoveDown, Action::MoveDown], &mut d);
        assert_eq!(d.get(0).unwrap().widget.attempt().selected(), None);
    }

    // -- Question: choose & submit --

    #[test]
    fn choose_selects_option_under_cursor() {
        let mut d = deck(1);
        run(q(0, 0), &[Action::MoveDown, Action::Choose], &mut d);
        assert_eq!(d.get(0).unwrap().widget.attempt().selected(), Some(1));
    }

    #[test]
    fn number_key_selects_and_moves_cursor() {
        let mut d = deck(1);
        let screen = run(q(0, 0), &[Action::NumberKey(3)], &mut d);
        assert_eq!(screen, q(0, 2));
        assert_eq!(d.get(0).unwrap().widget.attempt().selected(), Some(2));
    }

    #[test]
    fn out_of_range_number_key_is_noop() {
        let mut d = deck(1);
        for n in [0u8, 4, 9] {
            let screen = run(q(0, 1), &[Action::NumberKey(n)], &mut d);
            assert_eq!(screen, q(0, 1));
        }
        assert_eq!(d.get(0).unwrap().widget.attempt().selected(), None);
    }

    #[test]
    fn enter_without_choice_submits_nothing() {
        let mut d = deck(1);
        run(q(0, 0), &[Action::Enter], &mut d);
        assert_eq!(d.get(0).unwrap().widget.attempt().submissions(), 0);
    }

    #[test]
    fn wrong_answer_then_reveal() {
        let mut d = deck(1);
        run(
            q(0, 0),
            &[Action::NumberKey(1), Action::Enter, Action::Reveal],
            &mut d,
        );
        let widget = &d.get(0).unwrap().widget;
        assert_eq!(widget.feedback(), Some(Feedback::Incorrect));
        assert_eq!(widget.view().revealed_answer, Some("Farad"));
    }

    #[test]
    fn reveal_before_tries_exhausted_is_refused() {
        let mut d = deck_with_tries(1, MaxTries::Limited(NonZeroU32::new(2).unwrap()));
        run(
            q(0, 0),
            &[Action::NumberKey(1), Action::Enter, Action::Reveal],
            &mut d,
        );
        assert!(!d.get(0).unwrap().widget.attempt().revealed());

        run(
            q(0, 0),
            &[Action::NumberKey(3), Action::Enter, Action::Reveal],
            &mut d,
        );
        assert!(d.get(0).unwrap().widget.attempt().revealed());
    }

    // -- Question: paging --

    #[test]
    fn next_and_prev_page_through_deck() {
        let mut d = deck(2);
        assert_eq!(update(q(0, 2), &Action::Next, &mut d), Transition::Screen(q(1, 0)));
        assert_eq!(update(q(1, 0), &Action::Prev, &mut d), Transition::Screen(q(0, 0)));
        assert_eq!(update(q(0, 0), &Action::Prev, &mut d), Transition::Screen(q(0, 0)));
    }

    #[test]
    fn next_on_last_quiz_opens_summary() {
        let mut d = deck(2);
        assert_eq!(
            update(q(1, 0), &Action::Next, &mut d),
            Transition::Screen(Screen::Summary { cursor: 1 })
        );
    }

    #[test]
    fn returning_to_quiz_keeps_attempt_and_cursor() {
        let mut d = deck(2);
        let screen = run(
            q(0, 0),
            &[Action::NumberKey(2), Action::Enter, Action::Next, Action::Prev],
            &mut d,
        );
        assert_eq!(screen, q(0, 1));
        assert_eq!(d.get(0).unwrap().widget.status(), Status::Correct);
    }

    #[test]
    fn stale_index_falls_back_to_summary() {
        let mut d = deck(1);
        assert_eq!(
            update(q(5, 0), &Action::Enter, &mut d),
            Transition::Screen(Screen::Summary { cursor: 0 })
        );
    }

    #[test]
    fn question_quit() {
        let mut d = deck(1);
        assert_eq!(update(q(0, 0), &Action::Quit, &mut d), Transition::Quit);
    }

    // -- Summary --

    #[test]
    fn summary_cursor_is_clamped() {
        let mut d = deck(2);
        let s = |cursor| Screen::Summary { cursor };
        assert_eq!(update(s(0), &Action::MoveUp, &mut d), Transition::Screen(s(0)));
        assert_eq!(update(s(0), &Action::MoveDown, &mut d), Transition::Screen(s(1)));
        assert_eq!(update(s(1), &Action::MoveDown, &mut d), Transition::Screen(s(1)));
    }

    #[test]
    fn summary_enter_opens_focused_quiz() {
        let mut d = deck(3);
        assert_eq!(
            update(Screen::Summary { cursor: 2 }, &Action::Enter, &mut d),
            Transition::Screen(q(2, 0))
        );
    }

    #[test]
    fn empty_summary_ignores_enter() {
        let mut d = Deck::default();
        let s = Screen::Summary { cursor: 0 };
        assert_eq!(update(s, &Action::Enter, &mut d), Transition::Screen(s));
        assert_eq!(update(s, &Action::MoveDown, &mut d), Transition::Screen(s));
    }

    #[test]
    fn summary_ignores_quiz_actions() {
        let mut d = deck(1);
        let s = Screen::Summary { cursor: 0 };
        assert_eq!(update(s, &Action::Reveal, &mut d), Transition::Screen(s));
        assert_eq!(d.score().unanswered, 1);
    }

    #[test]
    fn summary_quit() {
        let mut d = deck(1);
        assert_eq!(
            update(Screen::Summary { cursor: 0 }, &Action::Quit, &mut d),
            Transition::Quit
        );
    }
}
