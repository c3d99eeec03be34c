#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use tincture::cli::{Cli, Command};
use tincture::lint::LintSeverity;
use tincture::{Config, ErrorCode, TinctureError};

/// Exit codes: success, build error, lint failure, invalid configuration.
const EXIT_OK: u8 = 0;
const EXIT_BUILD_ERROR: u8 = 1;
const EXIT_LINT_FAILED: u8 = 2;
const EXIT_INVALID_CONFIG: u8 = 3;

// ── Color control ──────────────────────────────────────────────

/// Global flag for whether colored output is enabled.
static USE_COLOR: AtomicBool = AtomicBool::new(true);

fn color_enabled() -> bool {
    USE_COLOR.load(Ordering::Relaxed)
}

fn green(s: &str) -> String {
    if color_enabled() {
        format!("{}", s.green())
    } else {
        s.to_string()
    }
}

fn red(s: &str) -> String {
    if color_enabled() {
        format!("{}", s.red().bold())
    } else {
        s.to_string()
    }
}

fn yellow(s: &str) -> String {
    if color_enabled() {
        format!("{}", s.yellow())
    } else {
        s.to_string()
    }
}

fn bold(s: &str) -> String {
    if color_enabled() {
        format!("{}", s.bold())
    } else {
        s.to_string()
    }
}

fn dim(s: &str) -> String {
    if color_enabled() {
        format!("{}", s.dimmed())
    } else {
        s.to_string()
    }
}

// ── Setup ──────────────────────────────────────────────────────

/// Configure the color mode based on `--color` flag value.
fn setup_color(mode: &str) {
    let enabled = match mode {
        "always" => true,
        "never" => false,
        // "auto" -- color when stderr is a terminal
        _ => io::stderr().is_terminal(),
    };
    USE_COLOR.store(enabled, Ordering::Relaxed);
}

/// Install `miette` as the global error report handler.
fn setup_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok(); // Ignore if already set (e.g. in tests)
}

/// Initialize tracing-subscriber based on verbosity level.
///
/// - quiet: no tracing
/// - v=0: warn
/// - v=1: info
/// - v=2: debug
/// - v=3+: trace
fn setup_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    let filter = match verbose {
        0 => "tincture=warn",
        1 => "tincture=info",
        2 => "tincture=debug",
        _ => "tincture=trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .without_time()
        .init();
}

// ── Config loading ─────────────────────────────────────────────

/// Load the config from an explicit path, the working directory, or the
/// user config directory, in that order.
fn load_config(explicit: Option<&Path>) -> Result<(Config, PathBuf), TinctureError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => discover_config().ok_or_else(|| TinctureError::Configuration {
            message: "no tincture.config.json or tincture.config.toml found; pass --config"
                .to_string(),
        })?,
    };
    let config = Config::from_file(&path)?;
    let base_dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((config, base_dir))
}

fn discover_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    tincture::config::discover(&cwd).or_else(|| {
        let dirs = directories::ProjectDirs::from("", "", "tincture")?;
        tincture::config::discover(dirs.config_dir())
    })
}

fn report_error(error: TinctureError) {
    eprintln!("{:?}", miette::Report::new(error));
}

// ── Mode handlers ──────────────────────────────────────────────

fn run_build(
    config_path: Option<&Path>,
    build_path: Option<PathBuf>,
    dry_run: bool,
    quiet: bool,
) -> u8 {
    let started = Instant::now();
    let (mut config, base_dir) = match load_config(config_path) {
        Ok(loaded) => loaded,
        Err(error) => {
            report_error(error);
            return EXIT_INVALID_CONFIG;
        }
    };
    if let Some(path) = build_path {
        config.build_path = Some(path);
    }

    let mut coordinator = tincture::BuildCoordinator::new(config, base_dir);
    coordinator.set_dry_run(dry_run);

    let spinner = if quiet || !io::stderr().is_terminal() {
        None
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("building token outputs…");
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Some(bar)
    };
    let result = coordinator.build();
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    if !quiet {
        for output in &result.outputs {
            let size = output
                .content
                .as_ref()
                .map_or_else(String::new, |content| format!(" {}", dim(&format!("({} bytes)", content.len()))));
            let marker = if dry_run { dim("plan") } else { green("✓") };
            let destination = output
                .path
                .as_ref()
                .map_or_else(|| output.file.clone(), |path| path.display().to_string());
            println!("  {marker} {destination}{size}");
        }
        for warning in &result.warnings {
            eprintln!("  {} {warning}", yellow("warning:"));
        }
    }
    for error in &result.errors {
        let scope = error
            .output
            .as_deref()
            .map_or_else(String::new, |name| format!(" [{name}]"));
        eprintln!(
            "  {} {}{scope} {}",
            red("error:"),
            bold(error.code.as_str()),
            error.message
        );
    }

    if !quiet {
        let elapsed = started.elapsed();
        let status = if result.success { green("done:") } else { red("failed:") };
        println!("{status} {} output(s) in {elapsed:.1?}", result.outputs.len());
    }
    if result.success { EXIT_OK } else { EXIT_BUILD_ERROR }
}

fn run_lint(config_path: Option<&Path>, max_warnings: Option<usize>, quiet: bool) -> u8 {
    let (config, base_dir) = match load_config(config_path) {
        Ok(loaded) => loaded,
        Err(error) => {
            report_error(error);
            return EXIT_INVALID_CONFIG;
        }
    };

    let result = match tincture::lint(&config, &base_dir) {
        Ok(result) => result,
        Err(error) => {
            let code = error.code();
            report_error(error);
            return if code == ErrorCode::Configuration {
                EXIT_INVALID_CONFIG
            } else {
                EXIT_BUILD_ERROR
            };
        }
    };

    if !quiet {
        for issue in &result.issues {
            let label = match issue.severity {
                LintSeverity::Error => red("error"),
                LintSeverity::Warn => yellow("warn"),
                LintSeverity::Off => dim("off"),
            };
            println!("  {label}  {}  {} {}", issue.rule, bold(&issue.token), issue.message);
        }
        println!(
            "{}: {} error(s), {} warning(s)",
            bold("lint"),
            result.error_count,
            result.warning_count
        );
    }

    let over_warning_budget =
        max_warnings.is_some_and(|budget| result.warning_count > budget);
    if result.error_count > 0 || over_warning_budget {
        EXIT_LINT_FAILED
    } else {
        EXIT_OK
    }
}

fn run_validate(config_path: Option<&Path>, quiet: bool) -> u8 {
    let (config, base_dir) = match load_config(config_path) {
        Ok(loaded) => loaded,
        Err(error) => {
            report_error(error);
            return EXIT_INVALID_CONFIG;
        }
    };

    match tincture::validate(&config, &base_dir) {
        Ok(warnings) => {
            if !quiet {
                for warning in &warnings {
                    eprintln!("  {} {warning}", yellow("warning:"));
                }
                println!("{} configuration and token documents are valid", green("✓"));
            }
            EXIT_OK
        }
        // Any failure here means the configuration (resolver or token
        // documents included) is invalid.
        Err(error) => {
            report_error(error);
            EXIT_INVALID_CONFIG
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_color(&cli.color);
    setup_miette();
    setup_tracing(cli.verbose, cli.quiet);

    if let Err(error) = cli.validate() {
        report_error(error);
        return ExitCode::from(EXIT_INVALID_CONFIG);
    }

    let code = match cli.command {
        Command::Build {
            ref config,
            ref build_path,
            dry_run,
        } => run_build(config.as_deref(), build_path.clone(), dry_run, cli.quiet),
        Command::Lint {
            ref config,
            max_warnings,
        } => run_lint(config.as_deref(), max_warnings, cli.quiet),
        Command::Validate { ref config } => run_validate(config.as_deref(), cli.quiet),
    };
    ExitCode::from(code)
}
