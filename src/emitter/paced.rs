use super::{PaceError, UnitQueue};
use crate::scheduler::{Tick, Ticker};
use crate::splitter::UnitScanner;
use bytes::Bytes;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Where the emitter pulls units from
pub enum UnitStream<R> {
    /// Split inline, in the emitter's own task
    Direct(UnitScanner<R>),
    /// Split in a producer task behind an ordered queue
    Queued(UnitQueue),
}

impl<R: AsyncRead + Unpin> UnitStream<R> {
    pub async fn next_unit(&mut self) -> Result<Option<Bytes>, PaceError> {
        match self {
            UnitStream::Direct(scanner) => scanner.next_unit().await,
            UnitStream::Queued(queue) => queue.next_unit().await,
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    /// The source was drained to end of stream
    #[default]
    Completed,
    /// The run was cancelled; output written so far is kept
    Cancelled,
}

/// What one session wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub units: u64,
    /// Unit and separator bytes written
    pub bytes: u64,
}

impl SessionReport {
    fn cancelled(mut self) -> Self {
        self.outcome = SessionOutcome::Cancelled;
        self
    }
}

/// Write every unit to `out`, paying one tick before each
///
/// Separators go strictly between units: before every unit except the first
/// of the session, never leading or trailing. Cancellation ends the session
/// with [`SessionOutcome::Cancelled`] rather than an error.
pub async fn emit_units<R, W>(
    units: &mut UnitStream<R>,
    separator: &[u8],
    ticker: &Ticker,
    out: &mut W,
) -> Result<SessionReport, PaceError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let cancellation = ticker.cancellation();
    let mut report = SessionReport::default();

    loop {
        let unit = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Ok(report.cancelled()),
            unit = units.next_unit() => unit?,
        };
        let Some(unit) = unit else {
            return Ok(report);
        };

        // Tick precedes write, so the first unit is delayed as well
        if ticker.wait().await == Tick::Cancelled {
            return Ok(report.cancelled());
        }

        if report.units > 0 && !separator.is_empty() {
            out.write_all(separator).await.map_err(PaceError::Write)?;
            report.bytes += separator.len() as u64;
        }
        out.write_all(&unit).await.map_err(PaceError::Write)?;
        out.flush().await.map_err(PaceError::Write)?;

        report.units += 1;
        report.bytes += unit.len() as u64;
        trace!(len = unit.len(), units = report.units, "unit written");
    }
}
