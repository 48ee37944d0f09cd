//! Discovery and loading of quiz definitions.
//!
//! Lesson pages (`.md`, `.mdx`) are searched for `<Quiz>` tags; quiz
//! banks (`*.quiz.json`) hold prop objects directly. Loading never stops
//! at a bad quiz: every definition comes back located, either as a
//! [`Quiz`] or as an [`Issue`] for the author.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Deserialize;
use walkdir::{DirEntry, WalkDir};

use crate::mdx::extract_quizzes;
use crate::quiz::Quiz;
use crate::types::{
    CheckConfig, CheckReport, DuplicateQuiz, Issue, IssueKind, Location, QuizEntry, QuizProps,
};

/// Suffix of standalone quiz bank files.
pub const BANK_SUFFIX: &str = ".quiz.json";

/// Extensions of lesson pages that may embed `<Quiz>` tags.
const PAGE_EXTENSIONS: [&str; 2] = ["md", "mdx"];

/// A quiz definition and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub location: Location,
    pub outcome: Result<Quiz, Issue>,
}

/// What kind of quiz source a path is, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Page,
    Bank,
}

/// Classify a path by its name.
pub fn source_kind(path: &Path) -> Option<SourceKind> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(BANK_SUFFIX) {
        return Some(SourceKind::Bank);
    }
    let ext = path.extension()?.to_str()?;
    PAGE_EXTENSIONS
        .iter()
        .any(|e| ext.eq_ignore_ascii_case(e))
        .then_some(SourceKind::Page)
}

// ============================================================================
// DISCOVERY
// ============================================================================

/// Find every quiz source under the configured roots, sorted and deduplicated.
///
/// A root that is itself a file is taken as-is when it is a quiz source.
/// Unreadable directory entries are logged and skipped.
pub fn discover(config: &CheckConfig) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for root in &config.roots {
        if root.is_file() {
            if source_kind(root).is_some() {
                found.push(root.clone());
            } else {
                tracing::warn!(path = %root.display(), "not a quiz source, ignoring");
            }
            continue;
        }

        let mut walker = WalkDir::new(root).follow_links(false);
        if let Some(max_depth) = config.max_depth {
            walker = walker.max_depth(max_depth);
        }

        let entries = walker
            .into_iter()
            .filter_entry(|e| config.include_hidden || e.depth() == 0 || !is_hidden(e));

        for entry in entries {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    if source_kind(entry.path()).is_some() {
                        found.push(entry.into_path());
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "skipping unreadable entry"),
            }
        }
    }

    found.sort();
    found.dedup();
    tracing::debug!(count = found.len(), "discovered quiz sources");
    found
}

pub(crate) fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

// ============================================================================
// LOADING
// ============================================================================

/// Load every quiz definition in one file.
///
/// # Errors
/// Returns an error if the file cannot be read. A bank that is not valid
/// JSON is reported as a single parse [`Issue`] at line 1 instead.
pub fn load_file(path: &Path) -> io::Result<Vec<Located>> {
    let text = fs::read_to_string(path)?;
    let kind = source_kind(path).unwrap_or(SourceKind::Page);
    Ok(load_text(path, &text, kind))
}

/// Load quiz definitions from already-read text.
pub fn load_text(path: &Path, text: &str, kind: SourceKind) -> Vec<Located> {
    match kind {
        SourceKind::Page => load_page(path, text),
        SourceKind::Bank => load_bank(path, text),
    }
}

fn load_page(path: &Path, text: &str) -> Vec<Located> {
    extract_quizzes(text)
        .into_iter()
        .map(|extracted| match extracted {
            Ok((line, props)) => located(Location::new(path, line), props),
            Err(e) => {
                let location = Location::new(path, e.line);
                Located {
                    location: location.clone(),
                    outcome: Err(Issue {
                        location,
                        kind: IssueKind::Parse,
                        message: e.message,
                    }),
                }
            }
        })
        .collect()
}

/// Accepted bank layouts: a bare array, or `{ "quizzes": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum BankFile {
    List(Vec<serde_json::Value>),
    Wrapped { quizzes: Vec<serde_json::Value> },
}

fn load_bank(path: &Path, text: &str) -> Vec<Located> {
    let items = match serde_json::from_str::<BankFile>(text) {
        Ok(BankFile::List(items)) | Ok(BankFile::Wrapped { quizzes: items }) => items,
        Err(e) => {
            let location = Location::new(path, e.line().max(1));
            return vec![Located {
                location: location.clone(),
                outcome: Err(Issue {
                    location,
                    kind: IssueKind::Parse,
                    message: format!("not a quiz bank: {}", e),
                }),
            }];
        }
    };

    let lines = item_lines(text, items.len());

    items
        .into_iter()
        .zip(lines)
        .map(|(value, line)| {
            let location = Location::new(path, line);
            match serde_json::from_value::<QuizProps>(value) {
                Ok(props) => located(location, props),
                Err(e) => Located {
                    location: location.clone(),
                    outcome: Err(Issue {
                        location,
                        kind: IssueKind::Parse,
                        message: e.to_string(),
                    }),
                },
            }
        })
        .collect()
}

/// Validate props into a quiz, keeping the location either way.
fn located(location: Location, props: QuizProps) -> Located {
    let outcome = Quiz::from_props(props).map_err(|e| Issue {
        location: location.clone(),
        kind: IssueKind::Config,
        message: e.to_string(),
    });
    Located { location, outcome }
}

/// Approximate 1-based line of each top-level object in a bank array.
///
/// Counts `{` at nesting depth one of the item array; falls back to
/// line 1 when the layout is unusual.
fn item_lines(text: &str, count: usize) -> Vec<usize> {
    let mut lines = Vec::with_capacity(count);
    let mut depth = 0usize;
    let mut array_depth: Option<usize> = None;
    let mut in_string = false;
    let mut escaped = false;
    let mut line = 1;

    for c in text.chars() {
        if c == '\n' {
            line += 1;
        }
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => {
                depth += 1;
                if array_depth.is_none() {
                    array_depth = Some(depth);
                }
            }
            '{' => {
                if array_depth == Some(depth) {
                    lines.push(line);
                }
                depth += 1;
            }
            ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    lines.resize(count, 1);
    lines
}

// ============================================================================
// CHECK
// ============================================================================

/// Load and validate every file, in parallel.
pub fn check(paths: &[PathBuf]) -> CheckReport {
    check_with_progress(paths, || {})
}

/// Like [`check`], calling `on_file` after each file is loaded.
pub fn check_with_progress<F>(paths: &[PathBuf], on_file: F) -> CheckReport
where
    F: Fn() + Sync,
{
    let results: Vec<(PathBuf, io::Result<Vec<Located>>)> = paths
        .par_iter()
        .map(|path| {
            let result = load_file(path);
            on_file();
            (path.clone(), result)
        })
        .collect();

    assemble_report(results)
}

/// Assemble a report from per-file load results, preserving file order.
pub fn assemble_report(results: Vec<(PathBuf, io::Result<Vec<Located>>)>) -> CheckReport {
    let mut report = CheckReport {
        files_scanned: results.len(),
        ..Default::default()
    };

    for (path, result) in results {
        match result {
            Ok(found) => {
                for item in found {
                    match item.outcome {
                        Ok(quiz) => report.quizzes.push(QuizEntry {
                            location: item.location,
                            id: quiz.id(),
                            prompt: quiz.prompt().to_string(),
                            option_count: quiz.options().len(),
                            max_tries: quiz.max_tries(),
                        }),
                        Err(issue) => report.issues.push(issue),
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read quiz source");
                report.skipped.push((path, e.to_string()));
            }
        }
    }

    report.duplicates = find_duplicates(&report.quizzes);
    report
}

fn find_duplicates(quizzes: &[QuizEntry]) -> Vec<DuplicateQuiz> {
    let mut by_id: BTreeMap<_, Vec<&QuizEntry>> = BTreeMap::new();
    for entry in quizzes {
        by_id.entry(entry.id).or_default().push(entry);
    }

    let mut duplicates: Vec<DuplicateQuiz> = by_id
        .into_iter()
        .filter(|(_, entries)| entries.len() > 1)
        .map(|(id, entries)| DuplicateQuiz {
            id,
            prompt: entries[0].prompt.clone(),
            locations: entries.iter().map(|e| e.location.clone()).collect(),
        })
        .collect();

    duplicates.sort_by(|a, b| a.locations[0].cmp(&b.locations[0]));
    duplicates
}

/// Load only the valid quizzes, in path order, for taking them.
///
/// Invalid definitions are logged and left out.
///
/// # Errors
/// Returns the first file that cannot be read.
pub fn load_deck(paths: &[PathBuf]) -> io::Result<Vec<(Location, Quiz)>> {
    let mut deck = Vec::new();

    for path in paths {
        for item in load_file(path)? {
            match item.outcome {
                Ok(quiz) => deck.push((item.location, quiz)),
                Err(issue) => {
                    tracing::warn!(location = %issue.location, message = %issue.message, "skipping invalid quiz")
                }
            }
        }
    }

    Ok(deck)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PAGE: &str = r#"# Coulomb's Law

Some text.

<Quiz question="Force doubles when charge doubles?" options={["Yes", "No"]} answer={0} />

<Quiz question="Bad" options={["only"]} answer={3} />
"#;

    const BANK: &str = r#"[
  {
    "question": "Unit of resistance?",
    "options": ["Ohm", "Volt"],
    "answer": 0
  },
  {
    "question": "Unit of current?",
    "options": ["Ampere", "Watt"],
    "answer": 0,
    "maxTries": null
  }
]
"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn source_kind_by_name() {
        assert_eq!(source_kind(Path::new("a/1.1.mdx")), Some(SourceKind::Page));
        assert_eq!(source_kind(Path::new("a/intro.MD")), Some(SourceKind::Page));
        assert_eq!(source_kind(Path::new("unit1.quiz.json")), Some(SourceKind::Bank));
        assert_eq!(source_kind(Path::new("package.json")), None);
        assert_eq!(source_kind(Path::new("Makefile")), None);
    }

    #[test]
    fn discover_finds_pages_and_banks() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "unit1/1.1.mdx", PAGE);
        write(dir.path(), "unit1/bank.quiz.json", BANK);
        write(dir.path(), "unit1/notes.txt", "nothing");
        write(dir.path(), ".docusaurus/routes.md", PAGE);

        let config = CheckConfig {
            roots: vec![dir.path().to_path_buf()],
            ..Default::default()
        };
        let found = discover(&config);

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| !p.to_string_lossy().contains(".docusaurus")));
    }

    #[test]
    fn discover_includes_hidden_when_asked() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".drafts/draft.md", PAGE);

        let config = CheckConfig {
            roots: vec![dir.path().to_path_buf()],
            include_hidden: true,
            ..Default::default()
        };
        assert_eq!(discover(&config).len(), 1);
    }

    #[test]
    fn discover_respects_max_depth() {
        let dir = TempDir::new().unwrap();
        let top = write(dir.path(), "top.mdx", PAGE);
        write(dir.path(), "unit1/1.1.mdx", PAGE);

        let config = CheckConfig {
            roots: vec![dir.path().to_path_buf()],
            max_depth: Some(1),
            ..Default::default()
        };
        assert_eq!(discover(&config), vec![top]);

        let config = CheckConfig {
            max_depth: None,
            ..config
        };
        assert_eq!(discover(&config).len(), 2);
    }

    #[test]
    fn discover_accepts_file_root() {
        let dir = TempDir::new().unwrap();
        let page = write(dir.path(), "1.1.mdx", PAGE);
        let config = CheckConfig {
            roots: vec![page.clone(), page.clone()],
            ..Default::default()
        };
        assert_eq!(discover(&config), vec![page]);
    }

    #[test]
    fn load_page_splits_valid_and_invalid() {
        let found = load_text(Path::new("1.1.mdx"), PAGE, SourceKind::Page);
        assert_eq!(found.len(), 2);

        assert_eq!(found[0].location.line, 5);
        assert!(found[0].outcome.is_ok());

        let issue = found[1].outcome.as_ref().unwrap_err();
        assert_eq!(issue.kind, IssueKind::Config);
        assert_eq!(issue.location.line, 7);
        assert!(issue.message.contains("out of range"));
    }

    #[test]
    fn load_bank_reads_array_with_lines() {
        let found = load_text(Path::new("b.quiz.json"), BANK, SourceKind::Bank);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].location.line, 2);
        assert_eq!(found[1].location.line, 7);
        let second = found[1].outcome.as_ref().unwrap();
        assert_eq!(second.max_tries(), crate::types::MaxTries::Unlimited);
    }

    #[test]
    fn load_bank_reads_wrapped_form() {
        let text = r#"{"quizzes": [{"question": "Q", "options": ["a"], "answer": 0}]}"#;
        let found = load_text(Path::new("b.quiz.json"), text, SourceKind::Bank);
        assert_eq!(found.len(), 1);
        assert!(found[0].outcome.is_ok());
    }

    #[test]
    fn load_bank_invalid_json_is_single_issue() {
        let found = load_text(Path::new("b.quiz.json"), "{ nope", SourceKind::Bank);
        assert_eq!(found.len(), 1);
        let issue = found[0].outcome.as_ref().unwrap_err();
        assert_eq!(issue.kind, IssueKind::Parse);
        assert!(issue.message.starts_with("not a quiz bank"));
    }

    #[test]
    fn load_bank_item_with_wrong_shape_is_parse_issue() {
        let text = r#"[{"question": "Q", "options": "a", "answer": 0}]"#;
        let found = load_text(Path::new("b.quiz.json"), text, SourceKind::Bank);
        assert_eq!(found[0].outcome.as_ref().unwrap_err().kind, IssueKind::Parse);
    }

    #[test]
    fn check_reports_issues_duplicates_and_skips() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.mdx", PAGE);
        let b = write(dir.path(), "b.md", PAGE);
        let missing = dir.path().join("gone.mdx");

        let report = check(&[a, b, missing.clone()]);

        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.quizzes.len(), 2);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates[0].locations.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, missing);
        assert!(report.has_errors());
    }

    #[test]
    fn check_calls_progress_per_file() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.mdx", PAGE);
        let b = write(dir.path(), "b.quiz.json", BANK);
        let seen = AtomicUsize::new(0);

        check_with_progress(&[a, b], || {
            seen.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(seen.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn load_deck_keeps_only_valid_quizzes() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a.mdx", PAGE);
        let b = write(dir.path(), "b.quiz.json", BANK);

        let deck = load_deck(&[a, b]).unwrap();
        let prompts: Vec<&str> = deck.iter().map(|(_, q)| q.prompt()).collect();
        assert_eq!(
            prompts,
            vec![
                "Force doubles when charge doubles?",
                "Unit of resistance?",
                "Unit of current?"
            ]
        );
    }

    #[test]
    fn load_deck_fails_on_unreadable_file() {
        let dir = TempDir::new().unwrap();
        assert!(load_deck(&[dir.path().join("missing.mdx")]).is_err());
    }
}
