//! lesson-quiz: validate and take the multiple-choice quizzes embedded
//! in course lesson pages.

pub mod bank;
pub mod hash;
pub mod mdx;
pub mod quiz;
pub mod renumber;
pub mod report;
pub mod tui;
pub mod types;
