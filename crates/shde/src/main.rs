//! CLI for the self-healing debugging engine.

#![warn(clippy::all)]
#![deny(unsafe_code)]

mod executor;
mod import_scan;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use executor::ShellTestExecutor;
use shde_controller::{DebugSession, SessionState};
use shde_core::{ShdeConfig, SessionId, Timestamp};
use shde_oracle::NoopOracleProvider;
use std::path::PathBuf;
use std::process::ExitCode;

/// Self-healing debugging engine: run the test suite, and escalate through
/// learned, pattern, and oracle fixes for anything that fails.
#[derive(Parser, Debug)]
#[command(name = "shde")]
#[command(version)]
#[command(about = "Run a project's tests and try to fix what fails", long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults under the project root if present).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Project root to operate on. Defaults to the current directory.
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the debug loop: run tests, escalate fixes, revalidate.
    Debug {
        /// Scope every run to a single file instead of the whole suite.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Seed the Learned-Fix Store from a previously exported file
        /// before running.
        #[arg(long, value_name = "FILE")]
        import_patterns: Option<PathBuf>,

        /// Export the Learned-Fix Store to a file after the session ends.
        #[arg(long, value_name = "FILE")]
        capture: Option<PathBuf>,
    },
    /// Print the recorded outcome ledgers (successful and failed attempts).
    Logs,
    /// Restore the most recent session's backups without re-running the loop.
    Rollback,
    /// Print the daily performance roll-up.
    Performance,
    /// Scan the project for missing imports and patch them in place,
    /// without running the test suite.
    FixImports,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let project_root = cli
        .project
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let config = ShdeConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Some(Commands::Debug {
            file,
            import_patterns,
            capture,
        }) => cmd_debug(config, project_root, file, import_patterns, capture),
        Some(Commands::Logs) => cmd_logs(config),
        Some(Commands::Rollback) => cmd_rollback(config),
        Some(Commands::Performance) => cmd_performance(config),
        Some(Commands::FixImports) => cmd_fix_imports(config, project_root),
        None => {
            println!("shde: self-healing debugging engine");
            println!("Use 'shde --help' for usage information");
            println!("Use 'shde debug' to run the test suite and attempt fixes");
            Ok(ExitCode::from(3))
        }
    }
}

fn now() -> Timestamp {
    Timestamp(chrono::Utc::now().timestamp())
}

fn cmd_debug(
    config: ShdeConfig,
    project_root: PathBuf,
    file: Option<PathBuf>,
    import_patterns: Option<PathBuf>,
    capture: Option<PathBuf>,
) -> Result<ExitCode> {
    let learning_db = config.data_dir.join("learning_db.json");
    if let Some(path) = &import_patterns {
        let mut store = shde_learn::LearnedFixStore::open(learning_db.clone());
        let imported = store
            .import(path)
            .with_context(|| format!("importing patterns from {}", path.display()))?;
        println!("imported {imported} learned fix(es) from {}", path.display());
    }

    let executor = ShellTestExecutor::new(&config.test_command, &project_root).with_fixed_scope(file);
    let session_id = SessionId(format!("session-{}", now().0));
    let providers: Vec<Box<dyn shde_core::PatchOracleProvider>> = vec![Box::new(NoopOracleProvider)];
    let session = DebugSession::new(&executor, &project_root, config, session_id, providers, now());

    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_style(
        indicatif::ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner.set_message("running debug session...");

    let (report, state) = session.run(now())?;
    spinner.finish_and_clear();
    println!(
        "session finished: {state} ({} resolved, {} manual review)",
        report.resolved_count(),
        report.manual_review_count()
    );

    if let Some(path) = &capture {
        let store = shde_learn::LearnedFixStore::open(learning_db.clone());
        store
            .export(path)
            .with_context(|| format!("exporting patterns to {}", path.display()))?;
        println!("captured {} learned fix(es) to {}", store.len(), path.display());
    }

    Ok(match state {
        SessionState::Success => ExitCode::from(0),
        SessionState::Partial => ExitCode::from(1),
        _ => ExitCode::from(2),
    })
}

fn cmd_logs(config: ShdeConfig) -> Result<ExitCode> {
    let tracker = shde_tracker::PatchTracker::open(&config.data_dir, now().0);
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "successful": tracker.successful().entries,
            "failed": tracker.failed().entries,
        }))?
    );
    Ok(ExitCode::from(0))
}

fn cmd_rollback(config: ShdeConfig) -> Result<ExitCode> {
    let backups_root = config.data_dir.join("rollback_backups");
    if !backups_root.exists() {
        println!("no backups on disk; nothing to roll back");
        return Ok(ExitCode::from(0));
    }

    let mut sessions: Vec<PathBuf> = std::fs::read_dir(&backups_root)
        .context("reading rollback_backups directory")?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    sessions.sort();

    let Some(latest) = sessions.last() else {
        println!("no backups on disk; nothing to roll back");
        return Ok(ExitCode::from(0));
    };

    let manifest_path = latest.join("manifest.json");
    let manifest = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("reading {}", manifest_path.display()))?;
    let mut restored = 0;
    for line in manifest.lines() {
        let Some((original, snapshot)) = line.split_once('\t') else {
            continue;
        };
        let bytes = std::fs::read(snapshot)
            .with_context(|| format!("reading snapshot {snapshot}"))?;
        std::fs::write(original, bytes).with_context(|| format!("restoring {original}"))?;
        restored += 1;
    }
    std::fs::remove_dir_all(latest).ok();
    println!("restored {restored} file(s) from {}", latest.display());
    Ok(ExitCode::from(0))
}

fn cmd_performance(config: ShdeConfig) -> Result<ExitCode> {
    let tracker = shde_tracker::PatchTracker::open(&config.data_dir, now().0);
    let days = &tracker.performance().days;
    if days.is_empty() {
        println!("no recorded sessions yet");
        return Ok(ExitCode::from(0));
    }
    println!(
        "{:<12} {:>10} {:>12} {}",
        style("date").bold(),
        style("fixes").bold(),
        style("success %").bold(),
        style("feedback").bold()
    );
    for (date, entry) in days {
        println!(
            "{date:<12} {:>10} {:>11.1}% {}",
            entry.total_fixes,
            entry.success_rate * 100.0,
            entry.feedback_summary
        );
    }
    Ok(ExitCode::from(0))
}

fn cmd_fix_imports(config: ShdeConfig, project_root: PathBuf) -> Result<ExitCode> {
    let mut tracker = shde_tracker::PatchTracker::open(&config.data_dir, now().0);
    let outcomes =
        import_scan::scan_and_fix(&project_root).context("scanning project for missing imports")?;
    let mut total_fixed = 0;
    for outcome in &outcomes {
        for module in &outcome.fixed {
            tracker.record_import_fix(module, true)?;
            total_fixed += 1;
            println!(
                "{} {}: added `import {module}`",
                style("fixed").green().bold(),
                outcome.path.display()
            );
        }
    }
    println!("{total_fixed} import(s) fixed across {} file(s)", outcomes.len());
    Ok(ExitCode::from(0))
}
