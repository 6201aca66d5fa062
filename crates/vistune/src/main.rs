//! vistune: run a live-tunable image pipeline over a frame sequence.
//!
//! Frames come from image files (or one directory of them), user input
//! comes from a `--script` of key presses and mouse clicks, and previews
//! land in an output directory. Useful for:
//!
//! - Reproducing a tuning session headlessly
//! - Checking which stage fails, and why, on a given frame
//! - Measuring per-stage durations across a sequence
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin vistune -- [OPTIONS] <FRAMES>...
//! ```
//!
//! Logging goes to stderr and honors `RUST_LOG`; stdout carries the
//! report or JSON.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod pipeline;
mod script;
mod sink;
mod source;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vistune_pipeline::{HostConfig, HostLoop, HostSummary, ScriptedInput, summarize};

use crate::pipeline::PipelineKind;
use crate::sink::DirectorySink;
use crate::source::ImageSequence;

/// Run a live-tunable image pipeline over a frame sequence.
///
/// Plays the frames through the pipeline, replays scripted input against
/// it, and prints per-tick diagnostics.
#[derive(Parser)]
#[command(name = "vistune", version)]
struct Cli {
    /// Image files to play in order, or a single directory of images.
    #[arg(required = true)]
    frames: Vec<PathBuf>,

    /// Demo pipeline to run.
    #[arg(long, value_enum, default_value_t = PipelineKind::default())]
    pipeline: PipelineKind,

    /// Start with playback paused on the first frame.
    #[arg(long)]
    start_paused: bool,

    /// Rewind to the first frame at end of stream while input remains.
    #[arg(long)]
    loop_playback: bool,

    /// Stop after this many ticks.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Do not pass help text to the preview.
    #[arg(long)]
    no_help: bool,

    /// Input events, `;`-separated: `key <k>`, `click <x> <y>`,
    /// `mclick <x> <y>`, `drag <x0> <y0> <x1> <y1>`, `wait`.
    #[arg(long)]
    script: Option<String>,

    /// Select this stage before the first tick.
    #[arg(long)]
    select: Option<String>,

    /// Directory for snapshots and the final preview.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output the run summary as JSON instead of human-readable reports.
    #[arg(long)]
    json: bool,

    /// Full host config as a JSON string.
    ///
    /// When provided, the playback flags are ignored.
    /// The JSON must be a valid `HostConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`HostConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// playback flags are ignored. Missing JSON fields take their defaults.
fn config_from_cli(cli: &Cli) -> Result<HostConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(HostConfig {
        start_paused: cli.start_paused,
        loop_playback: cli.loop_playback,
        max_ticks: cli.max_ticks,
        show_help: !cli.no_help,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: HostConfig) -> anyhow::Result<()> {
    let mut manager = pipeline::build(cli.pipeline)?;
    if let Some(ref name) = cli.select
        && !manager.select_name(name)
    {
        let known: Vec<&str> = manager.stages().iter().map(|s| s.name()).collect();
        anyhow::bail!("no stage named `{name}` (stages: {})", known.join(", "));
    }

    let mut source = ImageSequence::from_args(&cli.frames)?;
    anyhow::ensure!(!source.paths().is_empty(), "no image files to play");

    let ticks = match cli.script {
        Some(ref text) => script::parse(text).context("invalid --script")?,
        None => Vec::new(),
    };
    let mut input = ScriptedInput::from_ticks(ticks);
    let mut sink = DirectorySink::new(cli.out.clone());

    info!(
        frames = source.paths().len(),
        pipeline = ?cli.pipeline,
        stages = manager.len(),
        "starting"
    );
    let summary = HostLoop::new(config).run(&mut manager, &mut source, &mut sink, &mut input)?;
    if let Some(path) = sink.finish()? {
        eprintln!("Final preview written to {}", path.display());
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("serializing summary")?;
        println!("{json}");
    } else {
        print_report(&summary, sink.last_help());
    }
    Ok(())
}

/// Print the last tick's table, the help overlay, and the multi-tick summary.
fn print_report(summary: &HostSummary, help: Option<&str>) {
    println!(
        "Ran {} ticks over {} frames ({} snapshots), stopped: {:?}",
        summary.ticks, summary.frames_read, summary.snapshots, summary.stop,
    );
    println!();

    if let Some(last) = summary.diagnostics.last() {
        println!("{}", last.report());
    }
    if let Some(help) = help {
        println!("{help}");
        println!();
    }
    if summary.diagnostics.len() > 1 {
        println!("{}", summarize(&summary.diagnostics).report());
    }
}
