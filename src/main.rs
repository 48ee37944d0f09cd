//! lesson-quiz CLI
//!
//! Validate, list, and take the quizzes embedded in course lesson pages,
//! and renumber lesson units to make room for a new one.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use lesson_quiz::bank::{check, check_with_progress, discover, load_deck};
use lesson_quiz::renumber::{self, RenumberConfig, UnitShift};
use lesson_quiz::report::{format_listing, format_plan, format_report};
use lesson_quiz::tui::run::run;
use lesson_quiz::tui::state::Deck;
use lesson_quiz::types::{CheckConfig, ColorMode, OutputFormat};

#[derive(Parser)]
#[command(name = "lesson-quiz")]
#[command(about = "Validate and take the quizzes embedded in lesson pages")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take the quizzes interactively in the terminal
    Take {
        #[command(flatten)]
        sources: SourceArgs,

        /// Palette matching the terminal background
        #[arg(long, value_enum, default_value = "dark")]
        theme: ColorModeArg,
    },

    /// Validate quiz definitions (exit code 1 on any problem)
    Check {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// List valid quizzes with their ids and locations
    List {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Insert a unit by renumbering the units after it (dry run unless --apply)
    Renumber {
        #[command(flatten)]
        args: RenumberArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },
}

#[derive(Args)]
struct RenumberArgs {
    /// Docs tree to renumber
    #[arg(long, default_value = "docs")]
    root: PathBuf,

    /// Major unit number (8 for units 8.x)
    #[arg(long)]
    major: u32,

    /// Minor number of the new unit; existing units from here on move up by one
    #[arg(long)]
    insert_minor: u32,

    /// Smallest sidebar_position that moves [default: insert-minor + 1]
    #[arg(long)]
    sidebar_threshold: Option<u32>,

    /// Also renumber hidden files and directories
    #[arg(long)]
    hidden: bool,

    /// Make the changes (default is a dry run)
    #[arg(long)]
    apply: bool,

    /// Skip the backup copy of the tree when applying
    #[arg(long)]
    no_backup: bool,
}

impl From<&RenumberArgs> for RenumberConfig {
    fn from(args: &RenumberArgs) -> Self {
        RenumberConfig {
            root: args.root.clone(),
            shift: UnitShift {
                major: args.major,
                insert_minor: args.insert_minor,
            },
            sidebar_threshold: args.sidebar_threshold,
            include_hidden: args.hidden,
        }
    }
}

#[derive(Args)]
struct SourceArgs {
    /// Lesson pages, quiz banks, or directories to search
    #[arg(default_value = "docs")]
    paths: Vec<PathBuf>,

    /// Maximum directory depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Also search hidden files and directories
    #[arg(long)]
    hidden: bool,
}

impl From<SourceArgs> for CheckConfig {
    fn from(args: SourceArgs) -> Self {
        CheckConfig {
            roots: args.paths,
            max_depth: args.max_depth,
            include_hidden: args.hidden,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ColorModeArg {
    Dark,
    Light,
}

impl From<ColorModeArg> for ColorMode {
    fn from(arg: ColorModeArg) -> Self {
        match arg {
            ColorModeArg::Dark => ColorMode::Dark,
            ColorModeArg::Light => ColorMode::Light,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Take { sources, theme } => cmd_take(sources.into(), theme.into()),
        Commands::Check { sources, format } => cmd_check(sources.into(), format.into()),
        Commands::List { sources, format } => cmd_list(sources.into(), format.into()),
        Commands::Renumber { args, format } => cmd_renumber(&args, format.into()),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lesson_quiz={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ============================================================================
// PROGRESS HELPERS
// ============================================================================

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn progress_bar(total: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(msg.to_string());
    pb
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

/// Discover sources, failing when there is nothing to work with.
fn find_sources(config: &CheckConfig, show_progress: bool) -> Result<Vec<PathBuf>, String> {
    let paths = if show_progress {
        let sp = spinner("Looking for lesson pages and quiz banks...");
        let paths = discover(config);
        sp.finish_and_clear();
        paths
    } else {
        discover(config)
    };

    if paths.is_empty() {
        let roots: Vec<String> = config.roots.iter().map(|p| p.display().to_string()).collect();
        return Err(format!("No lesson pages or quiz banks found in {}", roots.join(", ")));
    }

    tracing::info!(files = paths.len(), "found quiz sources");
    Ok(paths)
}

fn cmd_take(config: CheckConfig, mode: ColorMode) -> Result<bool, String> {
    let paths = find_sources(&config, false)?;
    let quizzes = load_deck(&paths).map_err(|e| e.to_string())?;

    if quizzes.is_empty() {
        return Err("No valid quizzes found. Run `lesson-quiz check` for details.".to_string());
    }

    let score = run(Deck::new(quizzes), mode).map_err(|e| e.to_string())?;

    println!(
        "{} of {} correct ({} incorrect, {} revealed, {} unanswered)",
        score.correct,
        score.total(),
        score.incorrect,
        score.revealed,
        score.unanswered
    );
    Ok(true)
}

fn cmd_check(config: CheckConfig, format: OutputFormat) -> Result<bool, String> {
    let show_progress = format == OutputFormat::Human;
    let paths = find_sources(&config, show_progress)?;

    let report = if show_progress {
        let pb = progress_bar(paths.len() as u64, "Checking...");
        let report = check_with_progress(&paths, || pb.inc(1));
        pb.finish_and_clear();
        report
    } else {
        check(&paths)
    };

    print!("{}", format_report(&report, format));
    Ok(!report.has_errors())
}

fn cmd_list(config: CheckConfig, format: OutputFormat) -> Result<bool, String> {
    let paths = find_sources(&config, false)?;
    let report = check(&paths);

    for issue in &report.issues {
        tracing::warn!(location = %issue.location, message = %issue.message, "invalid quiz not listed");
    }

    print!("{}", format_listing(&report, format));
    Ok(true)
}

fn cmd_renumber(args: &RenumberArgs, format: OutputFormat) -> Result<bool, String> {
    let config = RenumberConfig::from(args);
    let plan = renumber::plan(&config).map_err(|e| e.to_string())?;

    if !args.apply || plan.is_empty() {
        print!("{}", format_plan(&plan, false, format));
        let taken = renumber::collisions(&plan);
        for path in &taken {
            eprintln!("Warning: rename target already exists: {}", path.display());
        }
        return Ok(taken.is_empty());
    }

    let backup = renumber::apply(&plan, &config.root, !args.no_backup).map_err(|e| e.to_string())?;
    if let Some(path) = backup {
        eprintln!("Backup: {}", path.display());
    }

    print!("{}", format_plan(&plan, true, format));
    Ok(plan.skipped.is_empty())
}
