//! Pure rendering: map App state to ratatui widget trees.
//!
//! The question screen draws a widget's [`QuizView`] snapshot, so what
//! the learner sees is exactly the quiz rendering contract. The only
//! effect is Frame::render_widget() which writes to the terminal buffer.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use crate::quiz::{QuizView, Status};
use crate::types::Feedback;

use super::state::{App, Deck, Screen};
use super::theme::Palette;

// ============================================================================
// DISPATCH
// ============================================================================

/// Render the current screen to the terminal frame.
pub fn render(app: &App, frame: &mut Frame) {
    let palette = Palette::for_mode(app.mode);
    let area = frame.area();

    // Common layout: title bar at top, content in middle, help at bottom
    let chunks = Layout::vertical([
        Constraint::Length(1), // title
        Constraint::Min(0),    // content
        Constraint::Length(1), // help
    ])
    .split(area);

    frame.render_widget(render_title(&app.screen, &app.deck, palette), chunks[0]);
    frame.render_widget(render_help(&app.screen, palette), chunks[2]);

    let content_area = chunks[1];

    match app.screen {
        Screen::Question { index, cursor } => match app.deck.get(index) {
            Some(entry) => {
                render_question(&entry.widget.view(), cursor, palette, frame, content_area)
            }
            None => render_summary(&app.deck, 0, palette, frame, content_area),
        },
        Screen::Summary { cursor } => {
            render_summary(&app.deck, cursor, palette, frame, content_area);
        }
    }
}

// ============================================================================
// SHARED LAYOUT
// ============================================================================

/// Title bar: position in the deck and where the quiz was authored.
fn render_title(screen: &Screen, deck: &Deck, palette: &Palette) -> Paragraph<'static> {
    let line = match screen {
        Screen::Question { index, .. } => {
            let location = deck
                .get(*index)
                .map(|e| e.location.to_string())
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(format!("Quiz {}/{}", index + 1, deck.len()), palette.title),
                Span::styled(format!("  {}", location), palette.dim),
            ])
        }
        Screen::Summary { .. } => Line::from(Span::styled("Summary", palette.title)),
    };

    Paragraph::new(line)
}

/// Help line showing available keybindings for the current screen.
fn render_help(screen: &Screen, palette: &Palette) -> Paragraph<'static> {
    let help_text = match screen {
        Screen::Question { .. } => {
            "[j/k] move  [Space/1-9] choose  [Enter] submit  [r] reveal  [n/p] next/prev  [s] summary  [q] quit"
        }
        Screen::Summary { .. } => "[j/k] move  [Enter] open quiz  [q] quit",
    };

    Paragraph::new(Span::styled(help_text, palette.help))
}

// ============================================================================
// SCREEN: QUESTION
// ============================================================================

fn render_question(
    view: &QuizView<'_>,
    cursor: usize,
    palette: &Palette,
    frame: &mut Frame,
    area: Rect,
) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", view.prompt), palette.prompt)),
        Line::from(""),
    ];

    for (i, option) in view.options.iter().enumerate() {
        let (mark, mark_style) = if option.checked {
            ("(•) ", palette.checked)
        } else {
            ("( ) ", palette.dim)
        };
        let text_style = if i == cursor {
            palette.cursor
        } else {
            ratatui::style::Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {}. ", i + 1), palette.dim),
            Span::styled(mark, mark_style),
            Span::styled(option.text.to_string(), text_style),
        ]));
    }

    lines.push(Line::from(""));

    // Button row
    let submit_style = if view.submit_enabled {
        palette.interactive
    } else {
        palette.disabled
    };
    let mut buttons = vec![Span::styled("  [Enter] Submit", submit_style)];
    if view.reveal_offered {
        buttons.push(Span::styled("    [r] Show Answer", palette.interactive));
    }
    lines.push(Line::from(buttons));

    lines.push(Line::from(Span::styled(
        format!("  Tries: {} / {}", view.submissions, view.max_tries),
        palette.dim,
    )));
    lines.push(Line::from(""));

    if let Some(feedback) = view.feedback {
        let (glyph, style) = match feedback {
            Feedback::Correct => ("✓", palette.correct),
            Feedback::Incorrect => ("✗", palette.incorrect),
        };
        lines.push(Line::from(Span::styled(
            format!("  {} {}", glyph, feedback.message()),
            style,
        )));
    }

    if let Some(answer) = view.revealed_answer {
        lines.push(Line::from(vec![
            Span::styled("  ✓ The correct answer is: ", palette.correct),
            Span::styled(answer.to_string(), palette.prompt),
        ]));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

// ============================================================================
// SCREEN: SUMMARY
// ============================================================================

fn render_summary(deck: &Deck, cursor: usize, palette: &Palette, frame: &mut Frame, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Min(0),    // list
        Constraint::Length(1), // score
    ])
    .split(area);

    let mut lines: Vec<Line> = Vec::new();
    if deck.is_empty() {
        lines.push(Line::from(Span::styled("  No quizzes to take.", palette.dim)));
    }

    for (i, entry) in deck.entries().iter().enumerate() {
        let (glyph, style) = match entry.widget.status() {
            Status::Correct => ("✓", palette.correct),
            Status::Incorrect => ("✗", palette.incorrect),
            Status::Revealed => ("?", palette.dim),
            Status::Unanswered => ("·", palette.dim),
        };
        let prompt_style = if i == cursor {
            palette.cursor
        } else {
            ratatui::style::Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {} ", glyph), style),
            Span::styled(format!("{:>3}. ", i + 1), palette.dim),
            Span::styled(first_line(entry.widget.quiz().prompt()), prompt_style),
            Span::styled(format!("  {}", entry.location), palette.dim),
        ]));
    }

    // Keep the cursor visible in long decks
    let visible = chunks[0].height as usize;
    let scroll = if visible > 0 && cursor >= visible {
        cursor + 1 - visible
    } else {
        0
    };

    let list = Paragraph::new(lines).scroll((scroll as u16, 0));
    frame.render_widget(list, chunks[0]);

    let score = deck.score();
    let tally = Line::from(vec![
        Span::styled(format!("  {} correct", score.correct), palette.correct),
        Span::styled(format!("  {} incorrect", score.incorrect), palette.incorrect),
        Span::styled(
            format!("  {} revealed  {} unanswered", score.revealed, score.unanswered),
            palette.dim,
        ),
    ]);
    frame.render_widget(Paragraph::new(tally), chunks[1]);
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Quiz;
    use crate::tui::state::App;
    use crate::types::{ColorMode, Location, MaxTries};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn make_terminal() -> Terminal<TestBackend> {
        let backend = TestBackend::new(100, 20);
        Terminal::new(backend).unwrap()
    }

    fn app_with(n: usize) -> App {
        let quizzes = (0..n)
            .map(|i| {
                let quiz = Quiz::new(
                    format!("Which unit measures flux {}?", i),
                    vec!["Weber".into(), "Gauss".into(), "Ohm".into()],
                    0,
                    MaxTries::ONE,
                )
                .unwrap();
                (Location::new("docs/5.2.mdx", 7 + i), quiz)
            })
            .collect();
        App::new(Deck::new(quizzes), ColorMode::Dark)
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = make_terminal();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol().to_string())
            .collect()
    }

    #[test]
    fn question_shows_prompt_options_and_location() {
        let content = screen_text(&app_with(2));
        assert!(content.contains("Quiz 1/2"));
        assert!(content.contains("docs/5.2.mdx:7"));
        assert!(content.contains("Which unit measures flux 0?"));
        assert!(content.contains("Weber"));
        assert!(content.contains("Ohm"));
        assert!(content.contains("Tries: 0 / 1"));
    }

    #[test]
    fn no_feedback_before_submit() {
        let mut app = app_with(1);
        app.deck.widget_mut(0).unwrap().select(1);
        let content = screen_text(&app);
        assert!(content.contains("(•)"));
        assert!(!content.contains("Try again."));
        assert!(!content.contains("Show Answer"));
    }

    #[test]
    fn wrong_answer_shows_feedback_and_reveal_button() {
        let mut app = app_with(1);
        let w = app.deck.widget_mut(0).unwrap();
        w.select(1);
        w.submit();
        let content = screen_text(&app);
        assert!(content.contains("Try again."));
        assert!(content.contains("Show Answer"));
    }

    #[test]
    fn revealed_answer_is_shown() {
        let mut app = app_with(1);
        let w = app.deck.widget_mut(0).unwrap();
        w.select(2);
        w.submit();
        w.reveal_answer();
        let content = screen_text(&app);
        assert!(content.contains("The correct answer is: Weber"));
        assert!(!content.contains("Show Answer"));
    }

    #[test]
    fn correct_answer_shows_correct_only() {
        let mut app = app_with(1);
        let w = app.deck.widget_mut(0).unwrap();
        w.select(0);
        w.submit();
        let content = screen_text(&app);
        assert!(content.contains("Correct!"));
        assert!(!content.contains("Show Answer"));
    }

    #[test]
    fn summary_lists_quizzes_and_score() {
        let mut app = app_with(3);
        let w = app.deck.widget_mut(1).unwrap();
        w.select(0);
        w.submit();
        app.screen = Screen::Summary { cursor: 0 };
        let content = screen_text(&app);
        assert!(content.contains("Summary"));
        assert!(content.contains("flux 2?"));
        assert!(content.contains("1 correct"));
        assert!(content.contains("2 unanswered"));
    }

    #[test]
    fn empty_deck_summary_renders() {
        let app = App::new(Deck::default(), ColorMode::Light);
        let content = screen_text(&app);
        assert!(content.contains("No quizzes to take."));
    }

    #[test]
    fn long_summary_scrolls_to_cursor() {
        let mut app = app_with(40);
        app.screen = Screen::Summary { cursor: 39 };
        let content = screen_text(&app);
        assert!(content.contains("flux 39?"));
    }
}
