use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use sift_contracts::{SIFTC_CHECKS_SCHEMA_VERSION, SIFTC_REPORT_SCHEMA_VERSION};
use siftc::checks::CheckId;
use siftc::config::{self, LintOptions};
use siftc::diagnostics::{self, Severity};
use siftc::lint;
use siftc::tree::{self, CompilationUnit};

#[derive(Parser)]
#[command(name = "siftc")]
#[command(about = "Equality and collection-narrowing checks over resolved syntax trees.", long_about = None)]
struct Cli {
    /// Log at debug level (overridden by SIFT_LOG).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the diagnostics report for a tree document.
    Lint {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        report_json: bool,
    },
    /// Apply every quickfix and emit the rewritten source.
    Fix {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        report_json: bool,
    },
    /// List the available checks.
    Checks,
}

#[derive(Debug, Serialize)]
struct SiftcToolReport {
    schema_version: &'static str,
    command: &'static str,
    ok: bool,
    r#in: String,
    diagnostics_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<diagnostics::Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fixes_applied: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    fixes_skipped: Vec<String>,
    exit_code: u8,
}

#[derive(Debug, Serialize)]
struct ChecksDoc {
    schema_version: &'static str,
    checks: Vec<CheckRow>,
}

#[derive(Debug, Serialize)]
struct CheckRow {
    name: &'static str,
    code: &'static str,
    default_severity: Severity,
    summary: &'static str,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SIFT_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Cmd::Checks => {
            let doc = ChecksDoc {
                schema_version: SIFTC_CHECKS_SCHEMA_VERSION,
                checks: CheckId::ALL
                    .iter()
                    .map(|c| CheckRow {
                        name: c.name(),
                        code: c.code(),
                        default_severity: c.default_severity(),
                        summary: c.summary(),
                    })
                    .collect(),
            };
            print_json(&doc)?;
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Lint {
            input,
            config,
            report_json,
        } => {
            let (unit, options) = match load_inputs(&input, config.as_deref()) {
                Ok(loaded) => loaded,
                Err(failure) => return failure.finish("lint", &input, report_json),
            };
            let report = lint::lint_unit(&unit, &options)
                .with_context(|| format!("lint: {}", input.display()))?;
            let exit_code = if report.ok { 0 } else { 1 };

            if report_json {
                let tool_report = SiftcToolReport {
                    schema_version: SIFTC_REPORT_SCHEMA_VERSION,
                    command: "lint",
                    ok: report.ok,
                    r#in: input.display().to_string(),
                    diagnostics_count: report.diagnostics.len(),
                    diagnostics: report.diagnostics,
                    fixes_applied: None,
                    fixes_skipped: Vec::new(),
                    exit_code,
                };
                print_json(&tool_report)?;
                return Ok(ExitCode::from(exit_code));
            }

            print_json(&report)?;
            Ok(ExitCode::from(exit_code))
        }
        Cmd::Fix {
            input,
            config,
            out,
            report_json,
        } => {
            if report_json && out.is_none() {
                return Failure::new(
                    "SIFT-CLI-ARGS-0001",
                    "--report-json requires --out (otherwise stdout would be the fixed source)",
                )
                .finish("fix", &input, report_json);
            }
            let (unit, options) = match load_inputs(&input, config.as_deref()) {
                Ok(loaded) => loaded,
                Err(failure) => return failure.finish("fix", &input, report_json),
            };
            let report = lint::lint_unit(&unit, &options)
                .with_context(|| format!("lint: {}", input.display()))?;
            let outcome = lint::apply_report_fixes(&unit, &report)
                .with_context(|| format!("apply quickfixes: {}", input.display()))?;
            tracing::info!(
                applied = outcome.applied,
                skipped = outcome.skipped.len(),
                "quickfixes applied"
            );

            match &out {
                Some(path) => write_text_file(path, &outcome.source)?,
                None => print!("{}", outcome.source),
            }

            let exit_code = if report.ok { 0 } else { 1 };
            if report_json {
                let tool_report = SiftcToolReport {
                    schema_version: SIFTC_REPORT_SCHEMA_VERSION,
                    command: "fix",
                    ok: report.ok,
                    r#in: input.display().to_string(),
                    diagnostics_count: report.diagnostics.len(),
                    diagnostics: report.diagnostics,
                    fixes_applied: Some(outcome.applied),
                    fixes_skipped: outcome.skipped,
                    exit_code,
                };
                print_json(&tool_report)?;
            }
            Ok(ExitCode::from(exit_code))
        }
    }
}

/// An input problem reported as a single error diagnostic.
struct Failure {
    code: &'static str,
    message: String,
}

impl Failure {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn finish(self, command: &'static str, input: &Path, report_json: bool) -> Result<ExitCode> {
        if !report_json {
            anyhow::bail!("{}", self.message);
        }
        let report = SiftcToolReport {
            schema_version: SIFTC_REPORT_SCHEMA_VERSION,
            command,
            ok: false,
            r#in: input.display().to_string(),
            diagnostics_count: 1,
            diagnostics: vec![diagnostics::Diagnostic::new(
                self.code,
                Severity::Error,
                diagnostics::Stage::Parse,
                self.message,
            )],
            fixes_applied: None,
            fixes_skipped: Vec::new(),
            exit_code: 2,
        };
        print_json(&report)?;
        Ok(ExitCode::from(2))
    }
}

fn load_inputs(
    input: &Path,
    config_path: Option<&Path>,
) -> std::result::Result<(CompilationUnit, LintOptions), Failure> {
    let bytes = std::fs::read(input).map_err(|err| {
        Failure::new(
            "SIFT-IO-READ-0001",
            format!("read input {}: {err}", input.display()),
        )
    })?;
    let unit = tree::parse_tree_json(&bytes).map_err(|err| {
        Failure::new(
            "SIFT-TREE-PARSE-0001",
            format!("parse tree {}: {err}", input.display()),
        )
    })?;
    let options = match config_path {
        Some(path) => config::load_config(path)
            .map_err(|err| Failure::new("SIFT-CONFIG-0001", format!("{err:#}")))?,
        None => LintOptions::default(),
    };
    Ok((unit, options))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn write_text_file(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }
    std::fs::write(path, text.as_bytes()).with_context(|| format!("write: {}", path.display()))
}
