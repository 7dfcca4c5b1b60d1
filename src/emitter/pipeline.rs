use super::{PaceError, SessionOutcome, SessionReport, UnitQueue, UnitStream, emit_units};
use crate::config::{Handoff, PaceConfig};
use crate::scheduler::{Cancellation, Ticker};
use crate::splitter::{SplitMode, UnitScanner};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

/// One input stream of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    Path(PathBuf),
}

impl InputSource {
    /// Sources for a list of positional paths; no paths means stdin
    pub fn from_paths(paths: Vec<PathBuf>) -> Vec<InputSource> {
        if paths.is_empty() {
            return vec![InputSource::Stdin];
        }
        paths.into_iter().map(InputSource::Path).collect()
    }

    pub fn name(&self) -> String {
        self.to_string()
    }

    async fn open(&self) -> Result<Box<dyn AsyncRead + Send + Unpin>, PaceError> {
        match self {
            InputSource::Stdin => Ok(Box::new(tokio::io::stdin())),
            InputSource::Path(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|source| PaceError::Open {
                        path: path.clone(),
                        source,
                    })?;
                Ok(Box::new(file))
            }
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Stdin => f.write_str("<stdin>"),
            InputSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Totals for a whole run, printable as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub mode: SplitMode,
    /// Sources drained to end of stream
    pub sources: usize,
    pub units: u64,
    pub bytes: u64,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

impl RunStats {
    fn new(mode: SplitMode) -> Self {
        Self {
            mode,
            sources: 0,
            units: 0,
            bytes: 0,
            cancelled: false,
            elapsed_ms: 0,
        }
    }

    fn record(&mut self, report: &SessionReport) {
        self.units += report.units;
        self.bytes += report.bytes;
        match report.outcome {
            SessionOutcome::Completed => self.sources += 1,
            SessionOutcome::Cancelled => self.cancelled = true,
        }
    }
}

/// Paces input sources onto an output sink
///
/// Owns the delay scheduler shared by every session of the run.
pub struct Pacer {
    config: PaceConfig,
    cancellation: Cancellation,
    ticker: Ticker,
}

impl Pacer {
    /// Create a pacer and start its delay scheduler
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: PaceConfig, cancellation: Cancellation) -> Self {
        let ticker = Ticker::spawn(config.delay, cancellation.clone());
        Self::with_ticker(config, ticker)
    }

    /// Create a pacer around an existing scheduler
    pub fn with_ticker(config: PaceConfig, ticker: Ticker) -> Self {
        Self {
            config,
            cancellation: ticker.cancellation().clone(),
            ticker,
        }
    }

    pub fn config(&self) -> &PaceConfig {
        &self.config
    }

    /// Run one session: split `reader` and emit its units to `out`
    pub async fn pace_reader<R, W>(
        &self,
        name: impl Into<String>,
        reader: R,
        out: &mut W,
    ) -> Result<SessionReport, PaceError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin,
    {
        let mode = self.config.mode;
        let scanner = UnitScanner::new(name, reader, mode, self.config.max_unit_size);
        let mut units = match self.config.handoff {
            Handoff::Direct => UnitStream::Direct(scanner),
            Handoff::Queue { capacity } => UnitStream::Queued(UnitQueue::spawn(scanner, capacity)),
        };

        emit_units(&mut units, mode.separator(), &self.ticker, out).await
    }

    /// Drain every source in order onto `out`
    ///
    /// Stops at the first failure, or early with `cancelled` set when the run
    /// is cancelled.
    pub async fn run<W>(&self, sources: &[InputSource], out: &mut W) -> Result<RunStats, PaceError>
    where
        W: AsyncWrite + Unpin,
    {
        let started = Instant::now();
        let mut stats = RunStats::new(self.config.mode);

        for source in sources {
            if self.cancellation.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            let reader = source.open().await?;
            debug!(source = %source, mode = %self.config.mode, "session started");
            let report = self.pace_reader(source.name(), reader, out).await?;
            debug!(
                source = %source,
                units = report.units,
                bytes = report.bytes,
                outcome = ?report.outcome,
                "session finished"
            );

            stats.record(&report);
            if report.outcome == SessionOutcome::Cancelled {
                info!(source = %source, "run cancelled");
                break;
            }
        }

        stats.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(stats)
    }
}
