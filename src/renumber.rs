//! Make room for a new lesson unit by renumbering the units after it.
//!
//! Inserting unit `major.insert_minor` shifts every existing unit
//! `major.m` with `m >= insert_minor` to `major.(m + 1)`: page files,
//! unit folders, image folders like `8.5-Images`, references inside
//! pages, and the frontmatter `sidebar_position`.
//!
//! [`plan`] only reads. [`apply`] is the only function that changes the
//! tree, and it refuses to overwrite anything.

use std::cmp::Reverse;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::bank::is_hidden;

/// Page extensions whose text is rewritten.
const TEXT_EXTENSIONS: [&str; 4] = ["md", "mdx", "markdown", "mdown"];

/// Marker between the root name and the timestamp of a backup copy.
const BACKUP_MARKER: &str = "__backup__";

// ============================================================================
// TYPES
// ============================================================================

/// Which unit numbers move: `major.m` for every `m >= insert_minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitShift {
    pub major: u32,
    pub insert_minor: u32,
}

/// Configuration for a renumbering run.
#[derive(Debug, Clone)]
pub struct RenumberConfig {
    /// Docs tree to renumber.
    pub root: PathBuf,
    pub shift: UnitShift,
    /// Smallest `sidebar_position` that moves. Defaults to `insert_minor + 1`.
    pub sidebar_threshold: Option<u32>,
    pub include_hidden: bool,
}

impl RenumberConfig {
    pub fn sidebar_threshold(&self) -> u32 {
        self.sidebar_threshold
            .unwrap_or(self.shift.insert_minor.saturating_add(1))
    }
}

/// A file or directory that gets a new unit number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// A `sidebar_position` bump in a page's frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SidebarChange {
    pub from: u32,
    pub to: u32,
}

/// What changed in one page's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextChanges {
    /// Unit references rewritten (ids, slugs, links, image paths, prose).
    pub references: usize,
    pub sidebar: Option<SidebarChange>,
}

/// A page whose text changes. Paths are as they were before any rename.
#[derive(Debug, Clone, Serialize)]
pub struct FileRewrite {
    pub path: PathBuf,
    pub references: usize,
    pub sidebar_position: Option<SidebarChange>,
    #[serde(skip)]
    pub new_text: String,
}

/// Everything a renumbering run would do.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenumberPlan {
    /// In execution order: deepest entries first, then highest unit first.
    pub renames: Vec<Rename>,
    pub rewrites: Vec<FileRewrite>,
    /// Pages that could not be read, with the error.
    pub skipped: Vec<(PathBuf, String)>,
}

impl RenumberPlan {
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty() && self.rewrites.is_empty()
    }
}

// ============================================================================
// PURE FUNCTIONS (names and text)
// ============================================================================

impl UnitShift {
    /// The minor number of an entry named `major.minor…`, if it moves.
    ///
    /// The number must be followed by the end of the name, `.`, `-`, `_`
    /// or an alphanumeric character, so `8.5.mdx`, `8.5-Images` and
    /// `8.5_intro` match while `8.5 draft` does not.
    pub fn unit_minor(&self, name: &str) -> Option<u32> {
        let rest = name.strip_prefix(&format!("{}.", self.major))?;
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let minor: u32 = rest[..digits].parse().ok()?;

        let boundary_ok = match rest[digits..].chars().next() {
            None => true,
            Some(c) => c.is_alphanumeric() || matches!(c, '.' | '-' | '_'),
        };
        (boundary_ok && minor >= self.insert_minor).then_some(minor)
    }

    /// The new name of an entry, or None if it keeps its name.
    pub fn rename(&self, name: &str) -> Option<String> {
        let minor = self.unit_minor(name)?;
        let next = minor.checked_add(1)?;
        let old_prefix = format!("{}.{}", self.major, minor);
        Some(format!("{}.{}{}", self.major, next, &name[old_prefix.len()..]))
    }

    /// Rewrite unit references in a page.
    ///
    /// Bumps the frontmatter `sidebar_position` when it is at least
    /// `sidebar_threshold`, then every `major.minor` token that is not the
    /// tail of a bigger number (`18.5` is left alone when `major` is 8).
    /// Each token moves exactly once.
    pub fn rewrite_text(&self, text: &str, sidebar_threshold: u32) -> (String, TextChanges) {
        let (text, sidebar) = shift_sidebar(text, sidebar_threshold);
        let (text, references) = self.shift_tokens(&text);
        (text, TextChanges { references, sidebar })
    }

    fn shift_tokens(&self, text: &str) -> (String, usize) {
        let needle = format!("{}.", self.major);
        let mut out = String::with_capacity(text.len());
        let mut count = 0;
        let mut copied = 0;
        let mut from = 0;

        while let Some(rel) = text[from..].find(&needle) {
            let start = from + rel;
            let digits_at = start + needle.len();
            from = digits_at;

            if text[..start].ends_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            let digits = text[digits_at..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            let Ok(minor) = text[digits_at..digits_at + digits].parse::<u32>() else {
                continue;
            };
            let Some(next) = minor.checked_add(1) else {
                continue;
            };
            if minor < self.insert_minor {
                continue;
            }

            out.push_str(&text[copied..digits_at]);
            out.push_str(&next.to_string());
            copied = digits_at + digits;
            from = copied;
            count += 1;
        }

        out.push_str(&text[copied..]);
        (out, count)
    }
}

/// Bump `sidebar_position` inside a leading `---` frontmatter block.
fn shift_sidebar(text: &str, threshold: u32) -> (String, Option<SidebarChange>) {
    let mut offset = 0;

    for (i, line) in text.split_inclusive('\n').enumerate() {
        let trimmed = line.trim();
        if i == 0 && trimmed != "---" {
            break;
        }
        if i > 0 && trimmed == "---" {
            break;
        }

        if let Some((start, len, value)) = sidebar_value(line) {
            if value < threshold {
                break;
            }
            let Some(next) = value.checked_add(1) else {
                break;
            };
            let at = offset + start;
            let shifted = format!("{}{}{}", &text[..at], next, &text[at + len..]);
            return (shifted, Some(SidebarChange { from: value, to: next }));
        }
        offset += line.len();
    }

    (text.to_string(), None)
}

/// `(offset, length, value)` of the number on a `sidebar_position: N` line.
fn sidebar_value(line: &str) -> Option<(usize, usize, u32)> {
    let rest = line.trim_start().strip_prefix("sidebar_position")?;
    let after_colon = rest.trim_start().strip_prefix(':')?.trim_start();
    let value = after_colon.trim_end();
    let number = value.parse().ok()?;
    Some((line.len() - after_colon.len(), value.len(), number))
}

fn is_text_page(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| TEXT_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

// ============================================================================
// PLANNING (reads only)
// ============================================================================

/// Work out every rename and rewrite without touching the tree.
///
/// # Errors
/// Fails when the root is not a directory.
pub fn plan(config: &RenumberConfig) -> io::Result<RenumberPlan> {
    if !config.root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", config.root.display()),
        ));
    }

    let shift = config.shift;
    let threshold = config.sidebar_threshold();
    let mut renames: Vec<(usize, u32, Rename)> = Vec::new();
    let mut plan = RenumberPlan::default();

    let entries = WalkDir::new(&config.root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| config.include_hidden || !is_hidden(e));

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy();

        if let (Some(minor), Some(new_name)) = (shift.unit_minor(&name), shift.rename(&name)) {
            let rename = Rename {
                from: entry.path().to_path_buf(),
                to: entry.path().with_file_name(new_name),
            };
            renames.push((entry.depth(), minor, rename));
        }

        if entry.file_type().is_file() && is_text_page(entry.path()) {
            match fs::read_to_string(entry.path()) {
                Ok(text) => {
                    let (new_text, changes) = shift.rewrite_text(&text, threshold);
                    if new_text != text {
                        plan.rewrites.push(FileRewrite {
                            path: entry.path().to_path_buf(),
                            references: changes.references,
                            sidebar_position: changes.sidebar,
                            new_text,
                        });
                    }
                }
                Err(e) => plan.skipped.push((entry.path().to_path_buf(), e.to_string())),
            }
        }
    }

    // Children before their parent keeps the planned paths valid; the
    // highest unit first keeps siblings from colliding.
    renames.sort_by_key(|(depth, minor, rename)| {
        (Reverse(*depth), Reverse(*minor), rename.from.clone())
    });
    plan.renames = renames.into_iter().map(|(_, _, r)| r).collect();
    plan.rewrites.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(
        renames = plan.renames.len(),
        rewrites = plan.rewrites.len(),
        "planned renumbering"
    );
    Ok(plan)
}

/// Rename targets that already exist and will not be moved out of the way.
pub fn collisions(plan: &RenumberPlan) -> Vec<PathBuf> {
    plan.renames
        .iter()
        .filter(|r| r.to.exists() && !plan.renames.iter().any(|other| other.from == r.to))
        .map(|r| r.to.clone())
        .collect()
}

// ============================================================================
// EFFECTS
// ============================================================================

/// Carry out a plan: optional backup, page rewrites, then renames.
///
/// Returns the backup directory when one was made.
///
/// # Errors
/// Fails with `AlreadyExists` before changing anything when a rename
/// target is taken, and with the underlying error if a write or rename
/// fails part way.
pub fn apply(plan: &RenumberPlan, root: &Path, backup: bool) -> io::Result<Option<PathBuf>> {
    if let Some(taken) = collisions(plan).first() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("target path already exists: {}", taken.display()),
        ));
    }

    let backup_dir = if backup {
        Some(backup_tree(root)?)
    } else {
        None
    };

    for rewrite in &plan.rewrites {
        fs::write(&rewrite.path, &rewrite.new_text)?;
        tracing::info!(path = %rewrite.path.display(), "rewrote page");
    }

    for rename in &plan.renames {
        fs::rename(&rename.from, &rename.to)?;
        tracing::info!(from = %rename.from.display(), to = %rename.to.display(), "renamed");
    }

    Ok(backup_dir)
}

/// Copy the whole tree next to itself as `<root>__backup__<unix seconds>`.
fn backup_tree(root: &Path) -> io::Result<PathBuf> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let root = fs::canonicalize(root)?;
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "docs".to_string());
    let dest = root.with_file_name(format!("{}{}{}", name, BACKUP_MARKER, secs));

    fs::create_dir(&dest)?;
    for entry in WalkDir::new(&root).min_depth(1).follow_links(false) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(&root).map_err(io::Error::other)?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)?;
        }
    }

    tracing::info!(path = %dest.display(), "backed up docs tree");
    Ok(dest)
}

// ============================================================================
// TESTS
// ============================================================================
