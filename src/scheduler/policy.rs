use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Bounds of the delay paid before each unit
///
/// Invariant: `max >= min`. Constructors clamp an inverted `max` up to `min`
/// instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    min: Duration,
    max: Duration,
}

impl DelayPolicy {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// Same delay before every unit
    pub fn uniform(delay: Duration) -> Self {
        Self::new(delay, delay)
    }

    /// Resolve CLI-style bounds: a positive `uniform` overrides both ends
    pub fn from_bounds(min: Duration, max: Duration, uniform: Option<Duration>) -> Self {
        match uniform {
            Some(delay) if !delay.is_zero() => Self::uniform(delay),
            _ => Self::new(min, max),
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn span(&self) -> Duration {
        self.max - self.min
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }
}

/// Draws delays from a [`DelayPolicy`]
///
/// Samples fall in `[min, max)`: `max` itself is never produced unless the
/// policy is fixed, in which case every sample is exactly `min`.
pub struct DelaySampler<R = StdRng> {
    policy: DelayPolicy,
    rng: R,
}

impl DelaySampler<StdRng> {
    /// Sampler seeded once from OS entropy
    pub fn from_entropy(policy: DelayPolicy) -> Self {
        Self::with_rng(policy, StdRng::from_entropy())
    }
}

impl<R: Rng> DelaySampler<R> {
    pub fn with_rng(policy: DelayPolicy, rng: R) -> Self {
        Self { policy, rng }
    }

    pub fn policy(&self) -> DelayPolicy {
        self.policy
    }

    pub fn sample(&mut self) -> Duration {
        let span = span_nanos(self.policy.span());
        if span == 0 {
            return self.policy.min;
        }
        self.policy.min + Duration::from_nanos(self.rng.gen_range(0..span))
    }
}

fn span_nanos(span: Duration) -> u64 {
    u64::try_from(span.as_nanos()).unwrap_or(u64::MAX)
}
