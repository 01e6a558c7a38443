//! tsbuffer - pipe stdin to stdout through a thread-safe buffer.
//!
//! A producer thread copies stdin into the buffer and closes it at EOF, while
//! the main thread reads fixed-size chunks back out. Useful for exercising
//! buffer settings (size limits, timeouts, drain windows) from the shell.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use giztoy_tsbuffer::{parse_duration, Config};
use tracing_subscriber::EnvFilter;

mod pipe;

/// Pipe stdin to stdout through a thread-safe buffer.
#[derive(Parser)]
#[command(name = "tsbuffer")]
#[command(about = "Pipe stdin to stdout through a thread-safe buffer")]
#[command(version)]
struct Cli {
    /// Buffer config file (YAML or JSON). Flags override file values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enforce a maximum buffer size in bytes
    #[arg(long)]
    max_buffer_size: Option<usize>,

    /// Fail reads right after close instead of draining the buffer
    #[arg(long)]
    no_drain: bool,

    /// Per-read timeout, e.g. 500ms or 2s (0 = none)
    #[arg(long, value_parser = parse_duration)]
    read_timeout: Option<Duration>,

    /// How long draining reads are allowed after close (0 = unbounded)
    #[arg(long, value_parser = parse_duration)]
    drain_time: Option<Duration>,

    /// Bytes per read
    #[arg(long, default_value_t = 4096)]
    chunk_size: usize,

    /// Print the effective buffer config as YAML and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose output (logs go to stderr)
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn buffer_config(&self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config::unlimited(),
        };

        if let Some(size) = self.max_buffer_size {
            cfg = cfg.max_buffer_size(size);
        }
        if self.no_drain {
            cfg = cfg.drain_read(false);
        }
        if let Some(timeout) = self.read_timeout {
            cfg = cfg.read_timeout(timeout);
        }
        if let Some(window) = self.drain_time {
            cfg = cfg.drain_time(window);
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cfg = cli.buffer_config()?;
    if cli.print_config {
        print!("{}", serde_yaml::to_string(&cfg)?);
        return Ok(());
    }

    let stats = pipe::run(cfg, cli.chunk_size, io::stdin(), io::stdout().lock())?;
    tracing::info!(
        "piped {} bytes in {} writes and {} reads",
        stats.bytes,
        stats.writes,
        stats.reads
    );
    Ok(())
}
