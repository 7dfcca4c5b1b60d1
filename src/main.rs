use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{Level, debug, info};
use tracing_subscriber::{EnvFilter, fmt};

use trickle::config::{DEFAULT_MAX_UNIT_SIZE, DEFAULT_QUEUE_CAPACITY};
use trickle::{
    Cancellation, DelayPolicy, Handoff, InputSource, PaceConfig, Pacer, RunStats, SplitMode,
    parse_duration,
};

/// Copy input to standard output one unit at a time, with a jittered delay
/// before each unit.
#[derive(Parser, Debug)]
#[command(name = "trickle")]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("split").args(["mode", "bytes", "runes", "words", "lines"])))]
struct Args {
    /// Input files, drained in order; standard input when none are given
    files: Vec<PathBuf>,

    /// Unit boundary policy
    #[arg(short, long, value_enum)]
    mode: Option<SplitMode>,

    /// No partitioning; emit input byte by byte (default)
    #[arg(short = 'b', long)]
    bytes: bool,

    /// Partition input at UTF-8 character boundaries
    #[arg(short = 'c', long)]
    runes: bool,

    /// Partition input at word boundaries; words of one input are joined by a
    /// single space, separate inputs are not
    #[arg(short = 'w', long)]
    words: bool,

    /// Partition input at line boundaries; no newline is added after the last
    /// line of an input
    #[arg(short = 'l', long)]
    lines: bool,

    /// Minimum delay between units (e.g. 10ms, 1.5s)
    #[arg(
        long = "min",
        env = "TRICKLE_MIN_DELAY",
        default_value = "10ms",
        value_parser = parse_duration
    )]
    min_delay: Duration,

    /// Maximum delay between units; raised to the minimum if lower
    #[arg(
        long = "max",
        env = "TRICKLE_MAX_DELAY",
        default_value = "100ms",
        value_parser = parse_duration
    )]
    max_delay: Duration,

    /// Uniform delay; sets both minimum and maximum when positive
    #[arg(short = 'd', long = "delay", env = "TRICKLE_DELAY", value_parser = parse_duration)]
    delay: Option<Duration>,

    /// Longest unit accepted before a boundary is found, in bytes
    #[arg(long, env = "TRICKLE_MAX_UNIT_SIZE", default_value_t = DEFAULT_MAX_UNIT_SIZE)]
    max_unit_size: usize,

    /// Capacity of the queue between splitter and writer
    #[arg(long, env = "TRICKLE_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Split inline in the writer instead of in a separate task
    #[arg(long)]
    direct: bool,

    /// Print run statistics as JSON to standard error when done
    #[arg(long)]
    stats: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TRICKLE_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log format (plain, json)
    #[arg(long, env = "TRICKLE_LOG_FORMAT", default_value = "plain")]
    log_format: String,
}

impl Args {
    fn split_mode(&self) -> SplitMode {
        if let Some(mode) = self.mode {
            return mode;
        }
        match (self.lines, self.words, self.runes) {
            (true, _, _) => SplitMode::Lines,
            (_, true, _) => SplitMode::Words,
            (_, _, true) => SplitMode::Runes,
            _ => SplitMode::Bytes,
        }
    }
}

fn setup_logging(log_level: &str, log_format: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Standard output carries the paced data, so logs go to stderr
    match log_format.to_lowercase().as_str() {
        "json" => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
        _ => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
    }

    Ok(())
}

/// Build the pacing configuration from CLI arguments
fn build_config(args: &Args) -> Result<PaceConfig> {
    let delay = DelayPolicy::from_bounds(args.min_delay, args.max_delay, args.delay);
    let handoff = if args.direct {
        Handoff::Direct
    } else {
        Handoff::Queue {
            capacity: args.queue_capacity,
        }
    };

    let config = PaceConfig::new()
        .mode(args.split_mode())
        .delay(delay)
        .handoff(handoff)
        .max_unit_size(args.max_unit_size)?;

    Ok(config)
}

async fn run(args: Args) -> Result<RunStats> {
    setup_logging(&args.log_level, &args.log_format)?;

    let config = build_config(&args)?;
    info!(
        mode = %config.mode,
        min = ?config.delay.min(),
        max = ?config.delay.max(),
        handoff = ?config.handoff,
        "Starting trickle"
    );

    let cancellation = Cancellation::new();
    let on_signal = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt signal");
            on_signal.cancel();
        }
    });

    let pacer = Pacer::new(config, cancellation);
    let sources = InputSource::from_paths(args.files.clone());
    let mut stdout = tokio::io::stdout();

    let stats = pacer.run(&sources, &mut stdout).await?;
    stdout.flush().await.context("Error writing")?;
    debug!(?stats, "run finished");

    if args.stats {
        eprintln!("{}", serde_json::to_string(&stats)?);
    }

    Ok(stats)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let code = match run(args).await {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {err:?}");
            1
        }
    };

    // A producer blocked on stdin would otherwise hold runtime shutdown open
    std::process::exit(code);
}
