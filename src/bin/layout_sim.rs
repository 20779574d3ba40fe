//! # Layout Simulator
//!
//! Runs the layout controller on mock hardware, for trying out command
//! sequences and inspecting the resulting state without a layout attached.
//!
//! # Usage
//!
//! ```bash
//! # Queue two exits, dispatch one, run half a second of ticks
//! layout_sim --cmd "exit main 1" --cmd "exit goods 2" --cmd pop --cmd show --ticks 25
//!
//! # Run a script against a persistent storage image (survives between runs)
//! layout_sim --store layout.bin --script demo.txt
//!
//! # Custom wiring / timings
//! layout_sim --config layout.toml -v --cmd "point 25 set" --ticks 1
//! ```
//!
//! The final state is printed as JSON on stdout.

use anyhow::{bail, Context};
use clap::Parser;
use rs_layout::hal::{MockDelay, MockEeprom, MockLines};
use rs_layout::nv::STORE_SIZE;
use rs_layout::{CommandError, CommandOutcome, Config, Layout, LayoutCommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Model railway layout controller simulator
#[derive(Parser, Debug)]
#[command(name = "layout_sim")]
#[command(version)]
#[command(about = "Run the layout controller on mock hardware")]
#[command(long_about = None)]
struct Args {
    /// TOML configuration file (defaults to the reference wiring)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Storage image file, loaded at start and saved at exit
    #[arg(long, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Command script, one command per line
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Command to run (can be specified multiple times, runs after the script)
    #[arg(long = "cmd", action = clap::ArgAction::Append)]
    commands: Vec<String>,

    /// Driver ticks to run after all commands
    #[arg(short, long, default_value_t = 0)]
    ticks: u32,

    /// Factory reset: wipe points and machine states before starting
    #[arg(long)]
    wipe: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_tracing(&args);

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    let eeprom = match &args.store {
        Some(path) if path.exists() => load_store(path)?,
        _ => MockEeprom::new(),
    };

    info!(name = config.device.name.as_str(), "starting layout simulator");
    let mut layout = Layout::new(MockLines::new(), eeprom, MockDelay::new(), config);
    layout.init(args.wipe);

    let mut lines = Vec::new();
    if let Some(path) = &args.script {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        lines.extend(text.lines().map(str::to_owned));
    }
    lines.extend(args.commands.iter().cloned());

    for (n, line) in lines.iter().enumerate() {
        let cmd = match LayoutCommand::parse(line) {
            Ok(cmd) => cmd,
            Err(CommandError::Empty) => continue,
            Err(e) => bail!("command {} `{}`: {}", n + 1, line.trim(), e),
        };
        match layout.apply(cmd) {
            Ok(outcome) => report(line, outcome),
            Err(e) => warn!(command = line.trim(), error = %e, "command rejected"),
        }
    }

    for _ in 0..args.ticks {
        layout.tick();
    }

    let mut buf = [0u8; 1024];
    let len = layout
        .state()
        .write_json(&mut buf)
        .map_err(|e| anyhow::anyhow!("encoding state: {e:?}"))?;
    println!("{}", std::str::from_utf8(&buf[..len])?);

    if let Some(path) = &args.store {
        let (_, eeprom, _) = layout.into_parts();
        fs::write(path, eeprom.as_bytes())
            .with_context(|| format!("saving storage image {}", path.display()))?;
        info!(path = %path.display(), "storage image saved");
    }
    Ok(())
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let config =
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

fn load_store(path: &Path) -> anyhow::Result<MockEeprom> {
    let bytes =
        fs::read(path).with_context(|| format!("reading storage image {}", path.display()))?;
    if bytes.len() != STORE_SIZE as usize {
        bail!(
            "storage image {} is {} bytes, expected {}",
            path.display(),
            bytes.len(),
            STORE_SIZE
        );
    }
    Ok(MockEeprom::from_bytes(&bytes))
}

fn report(line: &str, outcome: CommandOutcome) {
    let command = line.trim();
    match outcome {
        CommandOutcome::Applied => info!(command, "ok"),
        CommandOutcome::Dispatched(Some(request)) => info!(
            command,
            siding = request.siding(),
            destination = ?request.destination(),
            "dispatched"
        ),
        CommandOutcome::Dispatched(None) => info!(command, "nothing to dispatch"),
        CommandOutcome::Indicator(encoding) => info!(
            command,
            lit = ?encoding.lit(),
            flashing = ?encoding.flashing(),
            "indicator"
        ),
        CommandOutcome::Machine(state) => info!(
            command,
            state = state.value(),
            repeat = state.is_repeat(),
            "machine moved"
        ),
        CommandOutcome::Advanced(n) => info!(command, n, "advanced"),
    }
}
