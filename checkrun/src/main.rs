//! Hierarchical checker runner.
//!
//! Loads scopes, hooks and checkers from `checkrun.toml`, resolves the target
//! files and runs every selected checker over them, printing diagnostics and
//! a pass/pending/fail epilogue.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use checkrun::core::selector::Selection;
use checkrun::exit_codes;
use checkrun::format::{Formatter, FormatterKind, use_colors};
use checkrun::io::config::{build_tree, discover_config};
use checkrun::io::lookup::resolve_targets;
use checkrun::logging;
use checkrun::report::Reporter;
use checkrun::runner::{Runner, UnitLimits};

#[derive(Parser)]
#[command(
    name = "checkrun",
    version,
    about = "Run hierarchical checkers over source files"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check targets with the configured scopes.
    Run(RunArgs),
    /// List available formatters.
    Formatters,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Files, directories or glob patterns. Defaults to the working directory.
    #[arg(default_value = ".")]
    targets: Vec<PathBuf>,

    /// Additional configuration file, loaded after the defaults.
    #[arg(short = 'c', long = "config")]
    config: Vec<PathBuf>,

    /// Working directory for config discovery and relative targets.
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Print nothing; only the exit code reports the outcome.
    #[arg(long)]
    silent: bool,

    /// Force colored output.
    #[arg(long, conflicts_with = "no_colors")]
    colors: bool,

    /// Disable colored output.
    #[arg(long)]
    no_colors: bool,

    /// Formatter to render diagnostics with.
    #[arg(short = 'F', long)]
    formatter: Option<String>,

    /// Stop after the first failure.
    #[arg(short = 'b', long)]
    bail: bool,

    /// Only run checkers whose full title matches this regex.
    #[arg(short = 'g', long, conflicts_with = "fgrep")]
    grep: Option<String>,

    /// Only run checkers whose full title contains this string.
    #[arg(short = 'f', long)]
    fgrep: Option<String>,

    /// Invert `--grep`/`--fgrep` matches.
    #[arg(short = 'i', long)]
    invert: bool,

    /// Do not descend into subdirectories.
    #[arg(long)]
    flat: bool,

    /// Do not check for global leaks.
    #[arg(long)]
    ignore_leaks: bool,

    /// Allow-listed globals, comma separated (`prefix*` wildcards allowed).
    #[arg(long, value_delimiter = ',')]
    globals: Vec<String>,
}

impl RunArgs {
    fn requested_colors(&self) -> Option<bool> {
        if self.colors {
            Some(true)
        } else if self.no_colors {
            Some(false)
        } else {
            None
        }
    }

    fn selection(&self) -> Result<Selection> {
        let selection = match (&self.grep, &self.fgrep) {
            (Some(pattern), _) => Selection::from_pattern(pattern, self.invert)?,
            (None, Some(text)) => Selection::literal(text, self.invert)?,
            (None, None) if self.invert => bail!("--invert requires --grep or --fgrep"),
            (None, None) => Selection::all(),
        };
        Ok(selection)
    }
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => cmd_run(&args),
        Command::Formatters => {
            cmd_formatters();
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_formatters() {
    println!();
    for kind in FormatterKind::ALL {
        println!("    {} - {}", kind.name(), kind.description());
    }
    println!();
}

fn cmd_run(args: &RunArgs) -> Result<i32> {
    let cwd = match &args.cwd {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("resolve working directory")?,
    };
    let cwd = cwd
        .canonicalize()
        .with_context(|| format!("working directory {}", cwd.display()))?;

    let mut cfg = discover_config(&cwd, &args.config)?;
    if !cfg.has_checkers() {
        bail!(
            "no checkers declared; add a [[scope]] with checkers to checkrun.toml or pass -c <file>"
        );
    }
    if args.bail {
        cfg.bail = Some(true);
    }

    let formatter_name = args
        .formatter
        .as_deref()
        .or(cfg.formatter.as_deref())
        .unwrap_or("compact");
    let kind = FormatterKind::from_name(formatter_name)?;
    let colors = use_colors(kind, args.requested_colors());
    let formatter = Formatter::new(kind, colors);
    let selection = args.selection()?;

    let tree = build_tree(&cfg)?;
    let targets = resolve_targets(&cwd, &args.targets, &cfg.extensions, !args.flat)?;
    debug!(targets = targets.len(), "targets resolved");

    let reporter = Reporter::new();
    let mut runner = Runner::new(&tree, targets);
    runner
        .with_base_dir(cwd.clone())
        .with_limits(UnitLimits::from_millis(cfg.timeout_ms(), cfg.slow_ms()))
        .globals(cfg.globals.iter().chain(&args.globals).cloned())
        .ignore_leaks(args.ignore_leaks || cfg.ignore_leaks())
        .grep(selection)
        .subscribe(reporter.clone());
    let summary = runner.run();
    info!(
        passes = summary.passes,
        failures = summary.failures,
        pending = summary.pending,
        "run finished"
    );

    if !args.silent {
        let rendered = formatter.render(&reporter.results())?;
        match kind {
            FormatterKind::Json => {
                println!("{rendered}");
                eprint!("{}", reporter.epilogue(false));
            }
            FormatterKind::Compact => {
                if !rendered.is_empty() {
                    println!("{rendered}");
                }
                print!("{}", reporter.epilogue(colors));
            }
        }
    }

    if summary.failures > 0 || reporter.error_count() > 0 {
        Ok(exit_codes::FAILURES)
    } else {
        Ok(exit_codes::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["checkrun", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Run(args) => args,
            Command::Formatters => panic!("expected run"),
        }
    }

    #[test]
    fn targets_default_to_cwd() {
        let args = run_args(&[]);
        assert_eq!(args.targets, vec![PathBuf::from(".")]);
        assert_eq!(args.requested_colors(), None);
    }

    #[test]
    fn parses_flags() {
        let args = run_args(&[
            "-c", "a.toml", "-c", "b.toml", "-F", "json", "-b", "-g", "style", "-i",
            "--flat", "--globals", "CI,npm_*", "--no-colors", "src",
        ]);
        assert_eq!(args.config.len(), 2);
        assert_eq!(args.formatter.as_deref(), Some("json"));
        assert!(args.bail && args.invert && args.flat);
        assert_eq!(args.globals, vec!["CI".to_string(), "npm_*".to_string()]);
        assert_eq!(args.requested_colors(), Some(false));
        assert_eq!(args.targets, vec![PathBuf::from("src")]);
        let selection = args.selection().expect("selection");
        assert!(selection.is_inverted());
        assert!(!selection.matches("style lines"));
    }

    #[test]
    fn grep_and_fgrep_conflict() {
        let parsed = Cli::try_parse_from(["checkrun", "run", "-g", "a", "-f", "b"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn invert_alone_is_rejected() {
        assert!(run_args(&["-i"]).selection().is_err());
    }

    #[test]
    fn parse_formatters() {
        let cli = Cli::parse_from(["checkrun", "formatters"]);
        assert!(matches!(cli.command, Command::Formatters));
    }
}
