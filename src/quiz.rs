//! The quiz widget state machine.
//!
//! A [`Quiz`] is an immutable, validated question plus its try cap.
//! A [`QuizWidget`] is one rendered instance of it: the quiz and the
//! learner's [`Attempt`]. Every operation on a widget is total; the only
//! failure point is construction.
//!
//! State space:
//!
//! ```text
//!   (none) --select i--> (i, open) --submit--> (i, submitted) --reveal--> (i, revealed)
//!                            ^                        |                        |
//!                            +------select j != i-----+------------------------+
//! ```

use std::fmt;
use std::num::NonZeroU32;

use crate::hash::quiz_id;
use crate::types::{Feedback, MaxTries, QuizId, QuizProps, TriesProp};

// ============================================================================
// ERRORS
// ============================================================================

/// An authoring mistake in a quiz definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The question prompt is empty or whitespace.
    EmptyPrompt,
    /// The option list is empty.
    NoOptions,
    /// An option's text is empty or whitespace.
    BlankOption { index: usize },
    /// The answer index does not name an option.
    AnswerOutOfRange { answer: i64, len: usize },
    /// `maxTries` is zero, negative, or too large.
    InvalidMaxTries { value: i64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyPrompt => write!(f, "question prompt is empty"),
            ConfigError::NoOptions => write!(f, "option list is empty"),
            ConfigError::BlankOption { index } => write!(f, "option {} is blank", index),
            ConfigError::AnswerOutOfRange { answer, len } => write!(
                f,
                "answer index {} is out of range for {} option{}",
                answer,
                len,
                if *len == 1 { "" } else { "s" }
            ),
            ConfigError::InvalidMaxTries { value } => {
                write!(f, "maxTries must be a positive integer, got {}", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// QUIZ (immutable input)
// ============================================================================

/// A validated multiple-choice question with its try cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    prompt: String,
    options: Vec<String>,
    answer: usize,
    max_tries: MaxTries,
    id: QuizId,
}

impl Quiz {
    /// Build a quiz, failing fast on malformed input.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found, checked in order:
    /// prompt, options, answer.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        answer: usize,
        max_tries: MaxTries,
    ) -> Result<Self, ConfigError> {
        let prompt = prompt.into();

        if prompt.trim().is_empty() {
            return Err(ConfigError::EmptyPrompt);
        }
        if options.is_empty() {
            return Err(ConfigError::NoOptions);
        }
        if let Some(index) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(ConfigError::BlankOption { index });
        }
        if answer >= options.len() {
            return Err(ConfigError::AnswerOutOfRange {
                answer: answer as i64,
                len: options.len(),
            });
        }

        let id = quiz_id(&prompt, &options, answer);
        Ok(Quiz {
            prompt,
            options,
            answer,
            max_tries,
            id,
        })
    }

    /// Build a quiz from raw authoring props.
    ///
    /// Problems are reported in a fixed order: prompt, options, blank
    /// option, answer, then `maxTries`.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for negative answers and non-positive
    /// try counts in addition to everything [`Quiz::new`] rejects.
    pub fn from_props(props: QuizProps) -> Result<Self, ConfigError> {
        let QuizProps {
            question,
            options,
            answer,
            max_tries,
        } = props;

        // A negative answer is out of range for any option list.
        let index = usize::try_from(answer).unwrap_or(usize::MAX);
        let quiz = Quiz::new(question, options, index, MaxTries::default()).map_err(|e| match e {
            ConfigError::AnswerOutOfRange { len, .. } => ConfigError::AnswerOutOfRange { answer, len },
            other => other,
        })?;

        let max_tries = match max_tries {
            None => MaxTries::default(),
            Some(TriesProp::Unlimited) => MaxTries::Unlimited,
            Some(TriesProp::Count(value)) => u32::try_from(value)
                .ok()
                .and_then(NonZeroU32::new)
                .map(MaxTries::Limited)
                .ok_or(ConfigError::InvalidMaxTries { value })?,
        };

        Ok(Quiz { max_tries, ..quiz })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn answer(&self) -> usize {
        self.answer
    }

    /// Text of the correct option.
    pub fn answer_text(&self) -> &str {
        &self.options[self.answer]
    }

    pub fn max_tries(&self) -> MaxTries {
        self.max_tries
    }

    pub fn id(&self) -> QuizId {
        self.id
    }

    pub fn is_correct(&self, index: usize) -> bool {
        index == self.answer
    }
}

// ============================================================================
// ATTEMPT (mutable, per instance)
// ============================================================================

/// The learner's interaction with one widget instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attempt {
    selected: Option<usize>,
    submitted: bool,
    submissions: u32,
    revealed: bool,
}

impl Attempt {
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn submitted(&self) -> bool {
        self.submitted
    }

    /// Number of accepted submissions so far.
    pub fn submissions(&self) -> u32 {
        self.submissions
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }
}

/// Coarse outcome of a widget, for summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing submitted yet for the current choice.
    Unanswered,
    /// Last submission was correct.
    Correct,
    /// Last submission was wrong.
    Incorrect,
    /// The learner gave up and looked at the answer.
    Revealed,
}

// ============================================================================
// WIDGET
// ============================================================================

/// One rendered quiz instance: the question plus its attempt state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizWidget {
    quiz: Quiz,
    attempt: Attempt,
}

impl QuizWidget {
    /// Mount a widget with empty attempt state.
    pub fn new(quiz: Quiz) -> Self {
        QuizWidget {
            quiz,
            attempt: Attempt::default(),
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    /// Choose an option.
    ///
    /// Any change of choice invalidates the current attempt. Choosing the
    /// option that is already chosen changes nothing, so a learner must
    /// pick something different to submit again. Returns whether the
    /// state changed.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.quiz.options.len() {
            tracing::debug!(index, len = self.quiz.options.len(), "ignoring out-of-range select");
            return false;
        }
        if self.attempt.selected == Some(index) {
            return false;
        }

        self.attempt.selected = Some(index);
        self.attempt.submitted = false;
        self.attempt.revealed = false;
        true
    }

    /// Submit the current choice. Returns the feedback if accepted.
    ///
    /// No-op without a choice or when the choice was already submitted.
    pub fn submit(&mut self) -> Option<Feedback> {
        if !self.can_submit() {
            return None;
        }

        self.attempt.submitted = true;
        self.attempt.submissions = self.attempt.submissions.saturating_add(1);

        let feedback = self.feedback();
        tracing::debug!(
            quiz = %self.quiz.id.short(),
            submissions = self.attempt.submissions,
            ?feedback,
            "submitted"
        );
        feedback
    }

    /// Show the correct answer. Returns whether it is now shown.
    pub fn reveal_answer(&mut self) -> bool {
        if self.can_reveal() {
            self.attempt.revealed = true;
        }
        self.attempt.revealed
    }

    pub fn can_submit(&self) -> bool {
        self.attempt.selected.is_some() && !self.attempt.submitted
    }

    /// Submitted, wrong, and out of tries.
    pub fn can_reveal(&self) -> bool {
        match self.attempt.selected {
            Some(selected) => {
                self.attempt.submitted
                    && !self.quiz.is_correct(selected)
                    && self.quiz.max_tries.exhausted_by(self.attempt.submissions)
            }
            None => false,
        }
    }

    /// Feedback for the submitted choice, if any.
    pub fn feedback(&self) -> Option<Feedback> {
        if !self.attempt.submitted {
            return None;
        }
        self.attempt.selected.map(|s| {
            if self.quiz.is_correct(s) {
                Feedback::Correct
            } else {
                Feedback::Incorrect
            }
        })
    }

    pub fn status(&self) -> Status {
        if self.attempt.revealed {
            return Status::Revealed;
        }
        match self.feedback() {
            Some(Feedback::Correct) => Status::Correct,
            Some(Feedback::Incorrect) => Status::Incorrect,
            None => Status::Unanswered,
        }
    }

    /// Snapshot of everything a renderer should show.
    pub fn view(&self) -> QuizView<'_> {
        let options = self
            .quiz
            .options
            .iter()
            .enumerate()
            .map(|(i, text)| OptionView {
                text,
                checked: self.attempt.selected == Some(i),
            })
            .collect();

        QuizView {
            prompt: &self.quiz.prompt,
            options,
            submit_enabled: self.can_submit(),
            feedback: self.feedback(),
            reveal_offered: self.can_reveal() && !self.attempt.revealed,
            revealed_answer: self.attempt.revealed.then(|| self.quiz.answer_text()),
            submissions: self.attempt.submissions,
            max_tries: self.quiz.max_tries,
        }
    }
}

// ============================================================================
// VIEW MODEL
// ============================================================================

/// One option as rendered: its text and whether it is the current choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionView<'a> {
    pub text: &'a str,
    pub checked: bool,
}

/// Observable output of a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizView<'a> {
    pub prompt: &'a str,
    pub options: Vec<OptionView<'a>>,
    pub submit_enabled: bool,
    pub feedback: Option<Feedback>,
    /// The "Show Answer" control is visible.
    pub reveal_offered: bool,
    /// Correct option text once revealed.
    pub revealed_answer: Option<&'a str>,
    pub submissions: u32,
    pub max_tries: MaxTries,
}

// ============================================================================
// TESTS
// ============================================================================
