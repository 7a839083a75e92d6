use clap::Parser;
use formdebug::{Engine, EngineOptions, format_finding, format_summary};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Find hidden-required fields, impossible combinations, payload drift and
/// dependency cycles in a dynamic-form configuration.
#[derive(Parser, Debug)]
#[command(name = "formdebug", version, about)]
struct Args {
    /// Configuration document (JSON or YAML).
    configuration: PathBuf,

    /// Invariants document: versioning, payload schema, cross-field rules.
    #[arg(long)]
    invariants: Option<PathBuf>,

    /// Example states document; without it the defaults are probed.
    #[arg(long)]
    states: Option<PathBuf>,

    /// Write the findings as a JSON artifact.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Skip a rule by id (repeatable).
    #[arg(long = "disable-rule", value_name = "RULE")]
    disable_rule: Vec<String>,

    /// Print only the summary line.
    #[arg(long)]
    summary_only: bool,

    /// Do not probe an implicit "defaults" state when no states are given.
    #[arg(long)]
    no_default_probe: bool,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("FORMDEBUG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let engine = Engine::new(EngineOptions {
        probe_defaults_when_no_states: !args.no_default_probe,
        disabled_rules: args.disable_rule,
        artifact_path: args.out,
    });

    let report = match engine.run_files(
        &args.configuration,
        args.invariants.as_deref(),
        args.states.as_deref(),
    ) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    if !args.summary_only {
        for finding in &report.findings {
            println!("{}", format_finding(finding));
        }
    }
    println!("{}", format_summary(&report.findings));

    if report.summary().has_errors() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
