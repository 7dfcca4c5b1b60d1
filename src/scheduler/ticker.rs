use super::{Cancellation, DelayPolicy, DelaySampler};
use kanal::{AsyncReceiver, AsyncSender, bounded_async};
use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Outcome of waiting on the ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Permission to emit one unit
    Ready,
    /// The run was cancelled (or the scheduler is gone); stop emitting
    Cancelled,
}

/// Background task offering one tick per sampled delay
///
/// The task loops {sleep for a sampled delay, hand over one tick}. The
/// hand-off channel has zero capacity: at most one tick is ever pending and
/// the next sleep starts only once that tick was taken.
pub struct Ticker {
    ticks: AsyncReceiver<()>,
    cancellation: Cancellation,
    task: JoinHandle<()>,
}

impl Ticker {
    /// Spawn a ticker with an entropy-seeded sampler
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(policy: DelayPolicy, cancellation: Cancellation) -> Self {
        Self::with_sampler(DelaySampler::from_entropy(policy), cancellation)
    }

    pub fn with_sampler<R>(sampler: DelaySampler<R>, cancellation: Cancellation) -> Self
    where
        R: Rng + Send + 'static,
    {
        let (sender, ticks) = bounded_async(0);
        let task = tokio::spawn(run_ticker(sampler, sender, cancellation.clone()));

        Self {
            ticks,
            cancellation,
            task,
        }
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// Wait for the next tick, returning early on cancellation
    pub async fn wait(&self) -> Tick {
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Tick::Cancelled,
            tick = self.ticks.recv() => match tick {
                Ok(()) => Tick::Ready,
                Err(_) => {
                    warn!("delay scheduler stopped; treating as cancellation");
                    Tick::Cancelled
                }
            },
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_ticker<R: Rng>(
    mut sampler: DelaySampler<R>,
    ticks: AsyncSender<()>,
    cancellation: Cancellation,
) {
    let policy = sampler.policy();
    debug!(
        min = ?policy.min(),
        max = ?policy.max(),
        "delay scheduler started"
    );

    loop {
        let delay = sampler.sample();
        tokio::select! {
            _ = cancellation.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        tokio::select! {
            _ = cancellation.cancelled() => break,
            sent = ticks.send(()) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }

    debug!("delay scheduler stopped");
}
