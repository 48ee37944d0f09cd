//! Content identity for quizzes.
//!
//! Uses BLAKE3 over a length-prefixed encoding so that moving text
//! between the prompt and an option can never produce the same id.

use crate::types::QuizId;

/// Compute the id of a quiz from its prompt, options and answer.
pub fn quiz_id(prompt: &str, options: &[String], answer: usize) -> QuizId {
    let mut hasher = blake3::Hasher::new();

    update_str(&mut hasher, prompt);
    hasher.update(&(options.len() as u64).to_le_bytes());
    for option in options {
        update_str(&mut hasher, option);
    }
    hasher.update(&(answer as u64).to_le_bytes());

    QuizId(*hasher.finalize().as_bytes())
}

fn update_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

// ============================================================================
// TESTS
// ============================================================================
