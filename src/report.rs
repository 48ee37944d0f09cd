//! Report formatting for check, list and renumber results.
//!
//! Pure functions — (report, OutputFormat) → String.
//! No I/O, no side effects.

use serde::Serialize;

use crate::renumber::RenumberPlan;
use crate::types::{CheckReport, OutputFormat, QuizEntry};

/// Longest prompt shown on one listing line before eliding.
const PROMPT_WIDTH: usize = 60;

/// Format a check report for output.
pub fn format_report(report: &CheckReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_human(report),
        OutputFormat::Json => format_json(report),
    }
}

/// Format the valid quizzes of a report as a listing.
pub fn format_listing(report: &CheckReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_listing_human(&report.quizzes),
        OutputFormat::Json => to_json(&report.quizzes),
    }
}

/// Format a renumbering plan. `applied` says whether it was carried out.
pub fn format_plan(plan: &RenumberPlan, applied: bool, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_plan_human(plan, applied),
        OutputFormat::Json => to_json(plan),
    }
}

// ============================================================================
// HUMAN FORMAT
// ============================================================================

fn format_human(report: &CheckReport) -> String {
    let mut out = String::new();

    if !report.issues.is_empty() {
        out.push_str("=== Invalid Quizzes ===\n");
        for issue in &report.issues {
            out.push_str(&format!("  {}  {}\n", issue.location, issue.message));
        }
        out.push('\n');
    }

    if !report.duplicates.is_empty() {
        out.push_str("=== Duplicate Quizzes ===\n");
        for dup in &report.duplicates {
            out.push_str(&format!("{}  {}\n", dup.id.short(), elide(&dup.prompt)));
            for loc in &dup.locations {
                out.push_str(&format!("  └─ {}\n", loc));
            }
        }
        out.push('\n');
    }

    if !report.skipped.is_empty() {
        out.push_str("=== Skipped (read errors) ===\n");
        for (path, error) in &report.skipped {
            out.push_str(&format!("  {} - {}\n", path.display(), error));
        }
        out.push('\n');
    }

    out.push_str(&format_summary(report));
    out
}

fn format_summary(report: &CheckReport) -> String {
    let mut out = String::new();
    out.push_str("=== Summary ===\n");
    out.push_str(&format!("Files scanned:     {}\n", report.files_scanned));
    out.push_str(&format!("Valid quizzes:     {}\n", report.quizzes.len()));
    out.push_str(&format!("Invalid quizzes:   {}\n", report.issues.len()));
    out.push_str(&format!("Duplicates:        {}\n", report.duplicates.len()));
    out.push_str(&format!("Skipped files:     {}\n", report.skipped.len()));
    out
}

fn format_listing_human(quizzes: &[QuizEntry]) -> String {
    if quizzes.is_empty() {
        return "No quizzes found.\n".to_string();
    }

    let mut out = String::new();
    for entry in quizzes {
        out.push_str(&format!(
            "{}  {}  [{} options, tries {}]\n    {}\n",
            entry.id.short(),
            entry.location,
            entry.option_count,
            entry.max_tries,
            elide(&entry.prompt),
        ));
    }
    out
}

fn format_plan_human(plan: &RenumberPlan, applied: bool) -> String {
    if plan.is_empty() {
        return "Nothing to renumber.\n".to_string();
    }

    let mut out = String::new();

    if !plan.renames.is_empty() {
        out.push_str("=== Renames ===\n");
        for rename in &plan.renames {
            out.push_str(&format!("  {} -> {}\n", rename.from.display(), rename.to.display()));
        }
        out.push('\n');
    }

    if !plan.rewrites.is_empty() {
        out.push_str("=== Page Updates ===\n");
        for rewrite in &plan.rewrites {
            let mut line = format!("  {}  {} reference(s)", rewrite.path.display(), rewrite.references);
            if let Some(change) = rewrite.sidebar_position {
                line.push_str(&format!(", sidebar_position {} -> {}", change.from, change.to));
            }
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
    }

    if !plan.skipped.is_empty() {
        out.push_str("=== Skipped (read errors) ===\n");
        for (path, error) in &plan.skipped {
            out.push_str(&format!("  {} - {}\n", path.display(), error));
        }
        out.push('\n');
    }

    if applied {
        out.push_str(&format!(
            "Renamed {} path(s) and updated {} page(s).\n",
            plan.renames.len(),
            plan.rewrites.len()
        ));
    } else {
        out.push_str("Dry run: nothing was changed. Re-run with --apply to make these changes.\n");
    }
    out
}

/// Collapse whitespace and cut long prompts to one line.
fn elide(prompt: &str) -> String {
    let flat = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PROMPT_WIDTH {
        return flat;
    }
    let cut: String = flat.chars().take(PROMPT_WIDTH - 1).collect();
    format!("{}…", cut)
}

// ============================================================================
// JSON FORMAT
// ============================================================================

fn format_json(report: &CheckReport) -> String {
    to_json(report)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(json) => format!("{}\n", json),
        Err(e) => format!("{{\"error\": \"{}\"}}\n", e),
    }
}

// ============================================================================
// TESTS
// ============================================================================
