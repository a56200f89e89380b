use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Result};
use attribute_core::{
    check_defaults_dir, run_simulation, DefaultAttributes, SimulationReport, SimulationScript,
};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Run and check bounded health attribute scripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a step script against one character and emit a JSON report.
    Simulate(SimulateArgs),
    /// Validate every defaults file under a directory.
    Check(CheckArgs),
    /// Summarize an existing report.
    Report(ReportArgs),
}

#[derive(Args)]
struct SimulateArgs {
    #[arg(long)]
    script: PathBuf,
    /// Defaults file; built-in values (100/100) when omitted.
    #[arg(long)]
    defaults: Option<PathBuf>,
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct CheckArgs {
    #[arg(long, default_value = "assets/attributes")]
    dir: PathBuf,
}

#[derive(Args)]
struct ReportArgs {
    #[arg(long)]
    input: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Simulate(args) => handle_simulate(args),
        Commands::Check(args) => {
            init_tracing(None);
            handle_check(args)
        }
        Commands::Report(args) => {
            init_tracing(None);
            handle_report(args)
        }
    }
}

/// `RUST_LOG` wins over the defaults file's `telemetry.trace_filter`.
fn init_tracing(fallback: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| EnvFilter::try_new(fallback.unwrap_or("info")).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn handle_simulate(args: SimulateArgs) -> Result<()> {
    let defaults = match args.defaults.as_deref() {
        Some(path) => DefaultAttributes::from_path(path)?,
        None => DefaultAttributes::default(),
    };
    init_tracing(defaults.trace_filter());

    let script = SimulationScript::from_path(&args.script)?;
    let run_id = args
        .id
        .unwrap_or_else(|| format!("run-{}", Utc::now().format("%Y%m%dT%H%M%S")));

    let report = run_simulation(&defaults, &script, run_id)?;
    let json = serde_json::to_string_pretty(&report)?;
    println!("{json}");

    if let Some(out) = args.out.as_ref() {
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(out, &json)?;
        println!("Report written to {}", out.display());
    }
    Ok(())
}

fn handle_check(args: CheckArgs) -> Result<()> {
    let check = check_defaults_dir(&args.dir)?;
    for file in &check.files {
        match &file.error {
            None => println!("ok    {}", file.path.display()),
            Some(err) => println!("FAIL  {}: {err}", file.path.display()),
        }
    }
    let failed = check.failures().count();
    if failed > 0 {
        bail!(
            "{failed} of {} defaults files under {} are invalid",
            check.files.len(),
            args.dir.display()
        );
    }
    println!("{} defaults files valid", check.files.len());
    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<()> {
    let data = fs::read_to_string(&args.input)?;
    let report: SimulationReport = serde_json::from_str(&data)?;
    println!(
        "Report {} -> {:?}: {} applied, {} rejected, health {:.1}/{:.1} (net {:+.1}){}",
        report.id,
        report.summary.status,
        report.summary.applied,
        report.summary.rejected,
        report.final_state.current_health,
        report.final_state.max_health,
        report.summary.net_delta,
        if report.summary.dead { ", dead" } else { "" }
    );
    Ok(())
}
