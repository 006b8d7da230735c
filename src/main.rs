use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Deserialize;
use tokio::sync::watch;

use vitalscope::{
    init_logging, ChannelSource, EntryBatch, Finding, ObservationPump, Report, SessionController,
    Settings, SignalChannel, Visibility,
};

#[derive(Parser, Debug)]
#[command(name = "vitalscope", about = "Replay recorded performance entries into a session")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed a recorded trace through a session and print its report.
    Replay(ReplayArgs),
    /// Write the default settings to a file for editing.
    InitConfig(InitConfigArgs),
}

#[derive(ClapArgs, Debug)]
struct ReplayArgs {
    /// JSON trace with entry batches, optional findings and a hide flag.
    trace: PathBuf,
    /// Settings file; defaults apply when omitted. A named file must exist.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the report here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
struct InitConfigArgs {
    path: PathBuf,
}

/// Recorded host activity. Channels missing from `supported` are treated as
/// unobservable; omitting the field means every channel is available.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Trace {
    supported: Option<Vec<SignalChannel>>,
    #[serde(default)]
    batches: Vec<EntryBatch>,
    #[serde(default)]
    findings: Vec<Finding>,
    /// Send a `hidden` visibility change after the last batch.
    #[serde(default)]
    hide: bool,
    #[serde(default)]
    environment: serde_json::Value,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let debug = std::env::var("VITALSCOPE_DEBUG").is_ok_and(|v| !v.is_empty() && v != "0");
    init_logging(debug);

    let cli = Cli::parse();
    match cli.command {
        Command::Replay(args) => replay(args).await,
        Command::InitConfig(args) => {
            Settings::default().save(&args.path)?;
            log::info!("default settings written to {}", args.path.display());
            Ok(())
        }
    }
}

async fn replay(args: ReplayArgs) -> Result<()> {
    let settings = match &args.config {
        Some(path) => Settings::load_existing(path)?,
        None => Settings::default(),
    };
    let trace = read_trace(&args.trace)?;

    let controller = SessionController::new(&settings)?;
    let (mut source, feed) = match trace.supported {
        Some(channels) => ChannelSource::new(channels),
        None => ChannelSource::with_all_channels(),
    };
    controller.attach(&mut source);

    for finding in trace.findings {
        controller.log_issue(finding.category, finding.messages);
    }

    let (visibility_tx, visibility_rx) = watch::channel(Visibility::Visible);
    let mut pump = ObservationPump::new();
    pump.start(source, controller.clone(), visibility_rx)?;

    for batch in trace.batches {
        if !feed.push(batch.channel, batch.entries) {
            log::warn!("observation pump went away before the trace was fully replayed");
            break;
        }
    }
    drop(feed);

    if trace.hide {
        visibility_tx
            .send(Visibility::Hidden)
            .context("observation pump stopped before the page was hidden")?;
    }
    drop(visibility_tx);
    pump.finish().await?;

    let report = controller.get_report(trace.environment);
    write_report(&report, args.out.as_deref())
}

fn read_trace(path: &Path) -> Result<Trace> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid trace in {}", path.display()))
}

fn write_report(report: &Report, out: Option<&Path>) -> Result<()> {
    let serialized = serde_json::to_string_pretty(report)?;
    match out {
        Some(path) => fs::write(path, serialized)
            .with_context(|| format!("Failed to write report to {}", path.display())),
        None => {
            println!("{serialized}");
            Ok(())
        }
    }
}
