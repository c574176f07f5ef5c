//! The Lumen type checker CLI.
//!
//! `lumenc <program.json>` loads a parsed program, checks its packages in
//! dependency order and reports every diagnostic on stderr. The exit code
//! is 0 for a clean program, 1 when diagnostics were reported and 2 for
//! fatal errors (unreadable input, import cycles).
//!
//! Options:
//! - `--json` - Output diagnostics as JSON (one object per line)
//! - `--config` - Settings file (default: `lumen.toml` beside the program)
//! - `--emit-summary` - Write package summaries as JSON to a file
//! - `--root` - Directory diagnostic paths are shown relative to
//! - `--no-color` - Disable colorized output
//! - `-v` - Debug logging (`RUST_LOG` overrides)

mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use lumen_ast::Program;
use lumen_common::DiagnosticConfig;
use lumen_typeck::diagnostics::{json_line, render_diagnostic, render_plain, DiagnosticOptions};
use lumen_typeck::{ProgramChecker, ProgramDiagnostic, ProgramResult};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "lumenc", version, about = "The Lumen type checker")]
struct Cli {
    /// Parsed program as JSON (`{"modules": [...]}`)
    program: PathBuf,

    /// Output diagnostics as JSON (one object per line) instead of human-readable format
    #[arg(long)]
    json: bool,

    /// Settings file; defaults to lumen.toml next to the program
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the package summaries as JSON to this path
    #[arg(long = "emit-summary", value_name = "PATH")]
    emit_summary: Option<PathBuf>,

    /// Directory that diagnostic paths are shown relative to
    #[arg(long)]
    root: Option<PathBuf>,

    /// Disable colorized output
    #[arg(long = "no-color")]
    no_color: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Non-diagnostic failures.
const EXIT_FATAL: i32 = 2;

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(result) if result.has_errors() => process::exit(1),
        Ok(_) => {}
        Err(e) => {
            if cli.json {
                let msg = serde_json::json!({
                    "code": "F0001",
                    "severity": "fatal",
                    "message": e,
                });
                eprintln!("{}", msg);
            } else {
                eprintln!("error: {}", e);
            }
            process::exit(EXIT_FATAL);
        }
    }
}

fn run(cli: &Cli) -> Result<ProgramResult, String> {
    let config = Config::discover(cli.config.as_deref(), &cli.program)?;
    init_logging(&config.log_level(cli.verbose));

    let diag_config = config.diagnostic_config(cli.root.clone(), cli.no_color || cli.json);
    let program = load_program(&cli.program)?;
    info!(modules = program.modules.len(), "loaded program");

    let result = ProgramChecker::new(diag_config.clone())
        .check(&program)
        .map_err(|e| e.to_string())?;
    debug!(packages = ?result.order, "checked program");

    report_diagnostics(&result.diagnostics, &diag_config, cli.json);
    if let Some(path) = &cli.emit_summary {
        write_summaries(&result, path)?;
    }
    Ok(result)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .init();
}

fn load_program(path: &Path) -> Result<Program, String> {
    let content = std::fs::read_to_string(path).map_err(|e| format!("failed to read '{}': {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("failed to parse program '{}': {}", path.display(), e))
}

/// Print every diagnostic to stderr. Human-readable output draws an
/// ariadne report when the source file can be read and falls back to
/// `path:line:column: message` otherwise.
fn report_diagnostics(diagnostics: &[ProgramDiagnostic], config: &DiagnosticConfig, json: bool) {
    let options = DiagnosticOptions::from_config(config);
    for diagnostic in diagnostics {
        if json {
            match json_line(diagnostic) {
                Ok(line) => eprintln!("{}", line),
                Err(_) => eprintln!("{}", render_plain(diagnostic)),
            }
            continue;
        }
        match read_source(diagnostic, config) {
            Some(source) => {
                let filename = diagnostic.source.as_ref().map(|hint| hint.path.as_str()).unwrap_or("");
                eprint!("{}", render_diagnostic(&diagnostic.diagnostic, &source, filename, &options));
            }
            None => eprintln!("{}", render_plain(diagnostic)),
        }
    }
}

/// The source text behind a diagnostic's hint. Hint paths are relative
/// to the diagnostic root when one is configured.
fn read_source(diagnostic: &ProgramDiagnostic, config: &DiagnosticConfig) -> Option<String> {
    let hint = diagnostic.source.as_ref()?;
    let path = match &config.root {
        Some(root) => root.join(&hint.path),
        None => PathBuf::from(&hint.path),
    };
    std::fs::read_to_string(path).ok()
}

fn write_summaries(result: &ProgramResult, path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&result.summaries).map_err(|e| format!("failed to encode summaries: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("failed to write '{}': {}", path.display(), e))
}
