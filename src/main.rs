mod allowlist;
mod archiver;
mod cache;
mod cleaner;
mod config;
mod confirm;
mod constants;
mod engine;
mod error;
mod git;
mod guard;
mod model;
mod policy;
mod report;
mod scanner;

use allowlist::Allowlist;
use anyhow::{Context, Result};
use archiver::FsArchiver;
use cache::{CacheCandidate, SafetyTier, TierFilter};
use clap::{Parser, Subcommand};
use cleaner::DeleteMethod;
use config::{Settings, expand_tilde};
use confirm::ConsoleConfirmer;
use crossterm::style::Stylize;
use engine::{Engine, RunOptions, RunOutcome};
use guard::ProtectionGuard;
use indicatif::{ProgressBar, ProgressStyle};
use model::{CleanupConfig, Mode};
use policy::WorkspacePolicy;
use report::{AuditLog, format_results};
use scanner::size::format_size;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use sysinfo::Disks;
use tracing::Level;
use tracing_subscriber::EnvFilter;

const PREFLIGHT_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(version, about, long_about = None, disable_version_flag = true)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    #[command(subcommand)]
    command: Command,

    /// Roots to scan (repeatable, or several separated by spaces)
    #[arg(long = "path", global = true)]
    paths: Vec<String>,

    /// Report what would happen without changing anything (default)
    #[arg(long, global = true, conflicts_with = "execute")]
    dry_run: bool,

    /// Archive and delete for real
    #[arg(long, global = true)]
    execute: bool,

    /// Skip per-item confirmation (review-tier caches are still asked)
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// Retention in days; older items are cleaned
    #[arg(long, global = true)]
    days: Option<u32>,

    #[arg(long, global = true)]
    archive_root: Option<String>,

    #[arg(long, global = true)]
    logs_dir: Option<String>,

    /// Move deleted items to the OS trash instead of removing them
    #[arg(long, global = true)]
    trash: bool,

    /// Debug logging on stderr
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Archive old projects and transcripts, drop regenerable workspace data
    Workspace,
    /// Remove old dependency directories (`node_modules`, `.venv`, ...)
    Deps,
    /// Remove old build output (`target`, `dist`, `__pycache__`, ...)
    Build,
    /// Remove tool caches by safety tier
    Cache {
        #[arg(long, value_enum, default_value_t = TierFilter::All)]
        category: TierFilter,
    },
    /// Repack and prune git repositories
    Git,
}

impl Cli {
    const fn mode(&self) -> Mode {
        if self.execute && !self.dry_run {
            Mode::Execute
        } else {
            Mode::DryRun
        }
    }

    fn roots(&self) -> Vec<PathBuf> {
        self.paths
            .iter()
            .flat_map(|p| p.split_whitespace())
            .map(expand_tilde)
            .collect()
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(PREFLIGHT_FAILURE)
        }
    }
}

/// Shared inputs of every subcommand.
struct RunContext {
    settings: Settings,
    options: RunOptions,
    archive_root: PathBuf,
    logs_dir: PathBuf,
    retention_days: u32,
    now: chrono::DateTime<chrono::Local>,
}

fn run(cli: &Cli) -> Result<u8> {
    let settings = match Settings::default_path() {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };
    let ctx = RunContext {
        options: RunOptions {
            mode: cli.mode(),
            assume_yes: cli.yes,
            method: if cli.trash {
                DeleteMethod::Trash
            } else {
                DeleteMethod::Permanent
            },
        },
        archive_root: cli
            .archive_root
            .as_deref()
            .map_or_else(|| settings.archive_root(), expand_tilde),
        logs_dir: cli
            .logs_dir
            .as_deref()
            .map_or_else(|| settings.logs_dir(), expand_tilde),
        retention_days: cli.days.unwrap_or_else(|| settings.retention_days()),
        now: chrono::Local::now(),
        settings,
    };
    tracing::debug!(mode = ?ctx.options.mode, days = ctx.retention_days, "starting");

    let guard = ProtectionGuard::new(Allowlist::load());
    let roots = cli.roots();

    match &cli.command {
        Command::Workspace => run_workspace(&ctx, &guard, roots),
        Command::Deps => run_targets(&ctx, &guard, roots, policy::is_dependency_dir),
        Command::Build => run_targets(&ctx, &guard, roots, policy::is_build_dir),
        Command::Cache { category } => run_cache(&ctx, &guard, &roots, *category),
        Command::Git => run_git(&ctx, &guard, roots),
    }
}

impl RunContext {
    fn config(&self, workspace_root: PathBuf) -> CleanupConfig {
        CleanupConfig::new(
            workspace_root,
            &self.archive_root,
            self.retention_days,
            self.now,
        )
    }

    fn scan_roots(&self, roots: Vec<PathBuf>) -> Vec<PathBuf> {
        if roots.is_empty() {
            self.settings.scan_roots()
        } else {
            roots
        }
    }

    fn audit_log(&self) -> Result<Option<AuditLog>> {
        if self.options.mode.is_dry_run() {
            return Ok(None);
        }
        let log = AuditLog::create(&self.logs_dir, self.now)
            .with_context(|| format!("Failed to create log in {}", self.logs_dir.display()))?;
        Ok(Some(log))
    }

    /// Prints the summary, plus free space on the disk holding `disk_root`
    /// after an execute run.
    fn report(
        &self,
        outcome: &RunOutcome,
        config: &CleanupConfig,
        log: Option<&Path>,
        disk_root: &Path,
    ) -> u8 {
        tracing::debug!(state = ?outcome.state, "run finished");
        let mode = self.options.mode;
        print!("{}", format_results(&outcome.results, config, mode));
        if let Some(log) = log {
            println!("Log: {}", log.display());
        }
        if !mode.is_dry_run() {
            print_free_space(disk_root);
        }
        outcome.exit_code()
    }
}

fn run_workspace(ctx: &RunContext, guard: &ProtectionGuard, roots: Vec<PathBuf>) -> Result<u8> {
    let roots = if roots.is_empty() {
        vec![ctx.settings.workspace_root()]
    } else {
        roots
    };
    let configs: Vec<CleanupConfig> = roots.into_iter().map(|r| ctx.config(r)).collect();
    // every root passes pre-flight before anything is touched
    for config in &configs {
        engine::preflight(config)?;
    }

    let policy = WorkspacePolicy::new()?;
    let mut exit_code = 0;
    for config in &configs {
        let log = ctx.audit_log()?;
        let log_path = log.as_ref().map(|l| l.path().to_path_buf());
        let mut confirmer = ConsoleConfirmer::stdin();
        let engine = Engine::new(ctx.options, guard, &FsArchiver, &mut confirmer, log);
        let outcome = engine.run_categories(config, || {
            let pb = spinner(&format!("Scanning {}", config.workspace_root.display()));
            let categories = policy.enumerate(config);
            pb.finish_and_clear();
            categories
        });
        let root = &config.workspace_root;
        let code = ctx.report(&outcome, config, log_path.as_deref(), root);
        exit_code = exit_code.max(code);
    }
    Ok(exit_code)
}

fn run_targets(
    ctx: &RunContext,
    guard: &ProtectionGuard,
    roots: Vec<PathBuf>,
    matcher: fn(&Path) -> bool,
) -> Result<u8> {
    let roots = ctx.scan_roots(roots);
    let config = ctx.config(ctx.settings.workspace_root());
    let log = ctx.audit_log()?;
    let log_path = log.as_ref().map(|l| l.path().to_path_buf());

    let mut confirmer = ConsoleConfirmer::stdin();
    let engine = Engine::new(ctx.options, guard, &FsArchiver, &mut confirmer, log);
    let outcome = engine.run_categories(&config, || {
        let pb = spinner("Scanning projects");
        let categories = policy::enumerate_targets(&roots, matcher, config.cutoff);
        pb.finish_and_clear();
        categories
    });
    let disk_root = first_root(&roots, &config.workspace_root);
    Ok(ctx.report(&outcome, &config, log_path.as_deref(), disk_root))
}

fn run_cache(
    ctx: &RunContext,
    guard: &ProtectionGuard,
    roots: &[PathBuf],
    filter: TierFilter,
) -> Result<u8> {
    let pb = spinner("Scanning caches");
    let home = config::home();
    let paths = if roots.is_empty() {
        cache::default_candidate_paths(&home)
    } else {
        cache::candidate_paths_under(roots)
    };
    let candidates = cache::scan(&paths);
    pb.finish_and_clear();
    print_cache_candidates(&candidates, filter);

    let config = ctx.config(ctx.settings.workspace_root());
    let log = ctx.audit_log()?;
    let log_path = log.as_ref().map(|l| l.path().to_path_buf());
    let mut confirmer = ConsoleConfirmer::stdin();
    let engine = Engine::new(ctx.options, guard, &FsArchiver, &mut confirmer, log);
    let outcome = engine.run_caches(&candidates, filter);
    let disk_root = first_root(roots, &home);
    Ok(ctx.report(&outcome, &config, log_path.as_deref(), disk_root))
}

fn run_git(ctx: &RunContext, guard: &ProtectionGuard, roots: Vec<PathBuf>) -> Result<u8> {
    let roots = ctx.scan_roots(roots);
    let pb = spinner("Looking for repositories");
    let repos = git::find_repositories(&roots);
    pb.finish_and_clear();

    let config = ctx.config(ctx.settings.workspace_root());
    let log = ctx.audit_log()?;
    let log_path = log.as_ref().map(|l| l.path().to_path_buf());
    let mut confirmer = ConsoleConfirmer::stdin();
    let engine = Engine::new(ctx.options, guard, &FsArchiver, &mut confirmer, log);
    let outcome = engine.run_git(&repos);
    let disk_root = first_root(&roots, &config.workspace_root);
    Ok(ctx.report(&outcome, &config, log_path.as_deref(), disk_root))
}

/// The disk to report free space for: the first scanned root, else `fallback`.
fn first_root<'a>(roots: &'a [PathBuf], fallback: &'a Path) -> &'a Path {
    roots.first().map_or(fallback, PathBuf::as_path)
}

fn spinner(message: &str) -> ProgressBar {
    if !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_cache_candidates(candidates: &[CacheCandidate], filter: TierFilter) {
    let shown: Vec<_> = candidates
        .iter()
        .filter(|c| filter.includes(c.tier))
        .collect();
    if shown.is_empty() {
        return;
    }
    println!("CACHES ({}):", shown.len());
    for candidate in shown {
        let label = candidate.tier.label();
        let label = match candidate.tier {
            SafetyTier::Safe => label.green(),
            SafetyTier::Review => label.yellow(),
            SafetyTier::Danger => label.red().bold(),
        };
        println!(
            "  [{label}] {} ({})",
            candidate.entry.path.display(),
            format_size(candidate.entry.size())
        );
    }
    println!();
}

/// Free space of the disk holding `path`.
fn print_free_space(path: &Path) {
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .filter(|d| path.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len());

    if let Some(disk) = disk {
        println!(
            "Free space on {}: {}",
            disk.mount_point().display(),
            format_size(disk.available_space())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn path_before_subcommand() -> Result<()> {
        let cli = Cli::try_parse_from(["reclaim", "--path", "/tmp/x", "workspace"])?;
        assert!(matches!(cli.command, Command::Workspace));
        assert_eq!(cli.roots(), vec![PathBuf::from("/tmp/x")]);
        Ok(())
    }

    #[test]
    fn path_after_subcommand() -> Result<()> {
        let cli = Cli::try_parse_from(["reclaim", "workspace", "--path", "/tmp/x"])?;
        assert!(matches!(cli.command, Command::Workspace));
        assert_eq!(cli.roots(), vec![PathBuf::from("/tmp/x")]);
        Ok(())
    }

    #[test]
    fn path_is_repeatable_and_splits_on_spaces() -> Result<()> {
        let args = ["reclaim", "--path", "/a /b", "deps", "--path", "/c"];
        let cli = Cli::try_parse_from(args)?;
        assert!(matches!(cli.command, Command::Deps));
        let expected: Vec<PathBuf> = ["/a", "/b", "/c"].iter().map(PathBuf::from).collect();
        assert_eq!(cli.roots(), expected);
        Ok(())
    }

    #[test]
    fn execute_requires_flag_and_conflicts_with_dry_run() -> Result<()> {
        let cli = Cli::try_parse_from(["reclaim", "git"])?;
        assert_eq!(cli.mode(), Mode::DryRun);
        let cli = Cli::try_parse_from(["reclaim", "git", "--execute"])?;
        assert_eq!(cli.mode(), Mode::Execute);

        let both = ["reclaim", "git", "--execute", "--dry-run"];
        assert!(Cli::try_parse_from(both).is_err());
        Ok(())
    }

    fn category(args: &[&str]) -> Result<Option<TierFilter>> {
        let cli = Cli::try_parse_from(args)?;
        match cli.command {
            Command::Cache { category } => Ok(Some(category)),
            _ => Ok(None),
        }
    }

    #[test]
    fn cache_category_defaults_to_all() -> Result<()> {
        assert_eq!(category(&["reclaim", "cache"])?, Some(TierFilter::All));
        let safe = category(&["reclaim", "cache", "--category", "safe"])?;
        assert_eq!(safe, Some(TierFilter::Safe));
        Ok(())
    }

    #[test]
    fn free_space_root_prefers_scanned_roots() {
        let fallback = Path::new("/home/someone");
        assert_eq!(first_root(&[], fallback), fallback);
        let roots = [PathBuf::from("/mnt/data"), PathBuf::from("/srv")];
        assert_eq!(first_root(&roots, fallback), Path::new("/mnt/data"));
    }
}
