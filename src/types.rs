//! Domain types for lesson-quiz.
//!
//! Shared vocabulary between the loader, the report layer and the TUI.
//! The quiz state machine itself lives in [`crate::quiz`].

use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// PRIMITIVES
// ============================================================================

/// Content identity of a quiz: BLAKE3 over prompt, options and answer.
///
/// Two quizzes with the same id ask the same thing with the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuizId(pub [u8; 32]);

impl QuizId {
    /// Returns the id as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// First 8 hex characters, enough to tell quizzes apart in a listing.
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for QuizId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for QuizId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        let bytes = hex_to_bytes(&hex_str).map_err(serde::de::Error::custom)?;
        Ok(QuizId(bytes))
    }
}

/// Parse a 64-character hex string into 32 bytes.
fn hex_to_bytes(hex: &str) -> Result<[u8; 32], String> {
    if hex.len() != 64 {
        return Err(format!("Expected 64 hex chars, got {}", hex.len()));
    }
    let mut bytes = [0u8; 32];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let s = std::str::from_utf8(chunk).map_err(|e| e.to_string())?;
        bytes[i] = u8::from_str_radix(s, 16).map_err(|e| e.to_string())?;
    }
    Ok(bytes)
}

// ============================================================================
// TRIES
// ============================================================================

/// How many submissions a learner gets before "Show Answer" is offered.
///
/// `Unlimited` never offers a reveal: the learner may keep re-choosing
/// and re-submitting forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxTries {
    Limited(NonZeroU32),
    Unlimited,
}

impl MaxTries {
    /// The default cap of one try.
    pub const ONE: MaxTries = MaxTries::Limited(NonZeroU32::MIN);

    /// True once `submissions` has reached the cap.
    pub fn exhausted_by(&self, submissions: u32) -> bool {
        match self {
            MaxTries::Limited(max) => submissions >= max.get(),
            MaxTries::Unlimited => false,
        }
    }
}

impl Default for MaxTries {
    fn default() -> Self {
        MaxTries::ONE
    }
}

impl fmt::Display for MaxTries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxTries::Limited(n) => write!(f, "{}", n),
            MaxTries::Unlimited => f.write_str("∞"),
        }
    }
}

/// Serialized as the try count, or `null` for unlimited.
impl Serialize for MaxTries {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            MaxTries::Limited(n) => serializer.serialize_u32(n.get()),
            MaxTries::Unlimited => serializer.serialize_none(),
        }
    }
}

// ============================================================================
// CONSTRUCTION PROPS
// ============================================================================

/// The `maxTries` prop as the author wrote it, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriesProp {
    Count(i64),
    Unlimited,
}

/// Raw construction-time props of a `<Quiz>` instance.
///
/// Mirrors `{ question, options, answer, maxTries? }`. Numbers stay wide
/// and signed so that bad values reach validation as config errors
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuizProps {
    pub question: String,
    pub options: Vec<String>,
    pub answer: i64,
    /// Absent = default (1). `null` = unlimited.
    #[serde(
        default,
        rename = "maxTries",
        deserialize_with = "deserialize_tries"
    )]
    pub max_tries: Option<TriesProp>,
}

fn deserialize_tries<'de, D>(deserializer: D) -> Result<Option<TriesProp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<i64>::deserialize(deserializer)?;
    Ok(Some(match value {
        Some(n) => TriesProp::Count(n),
        None => TriesProp::Unlimited,
    }))
}

// ============================================================================
// LOCATIONS & FEEDBACK
// ============================================================================

/// Where a quiz was authored: file and 1-based line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Location {
    pub path: PathBuf,
    pub line: usize,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Location {
            path: path.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// Verdict shown after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Correct,
    Incorrect,
}

impl Feedback {
    pub fn message(&self) -> &'static str {
        match self {
            Feedback::Correct => "Correct!",
            Feedback::Incorrect => "Try again.",
        }
    }
}

// ============================================================================
// REPORTS
// ============================================================================

/// Why a quiz definition was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The tag or JSON could not be read as quiz props.
    Parse,
    /// The props were read but describe an invalid quiz.
    Config,
}

/// A rejected quiz definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub location: Location,
    pub kind: IssueKind,
    pub message: String,
}

/// A valid quiz as it appears in a report or listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizEntry {
    pub location: Location,
    pub id: QuizId,
    pub prompt: String,
    pub option_count: usize,
    pub max_tries: MaxTries,
}

/// The same quiz authored in more than one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateQuiz {
    pub id: QuizId,
    pub prompt: String,
    pub locations: Vec<Location>,
}

/// Complete check results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    /// Number of files read (successfully or not).
    pub files_scanned: usize,
    /// Every valid quiz, in file order.
    pub quizzes: Vec<QuizEntry>,
    /// Every rejected quiz definition.
    pub issues: Vec<Issue>,
    /// Quizzes that appear more than once.
    pub duplicates: Vec<DuplicateQuiz>,
    /// Files that could not be read (path, error message).
    pub skipped: Vec<(PathBuf, String)>,
}

impl CheckReport {
    /// True when an author has something to fix.
    pub fn has_errors(&self) -> bool {
        !self.issues.is_empty() || !self.skipped.is_empty()
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable pretty output.
    #[default]
    Human,
    /// Machine-readable JSON.
    Json,
}

/// Light or dark terminal palette. Passed explicitly to rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    Light,
    #[default]
    Dark,
}

/// Configuration for discovering quiz sources.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Files or directories to search.
    pub roots: Vec<PathBuf>,
    /// Maximum directory depth (None = unlimited).
    pub max_depth: Option<usize>,
    /// Include hidden files and directories (dotfiles).
    pub include_hidden: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            max_depth: None,
            include_hidden: false,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
