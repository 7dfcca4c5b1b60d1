mod duration;


pub use duration::parse_duration;

use crate::scheduler::DelayPolicy;
use crate::splitter::SplitMode;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(10);

pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(100);

/// Longest unit accepted before a boundary is found (64 KiB)
pub const DEFAULT_MAX_UNIT_SIZE: usize = 64 * 1024;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid duration {0:?}")]
    InvalidDuration(String),

    #[error("negative duration {0:?} not allowed")]
    NegativeDuration(String),

    #[error("maximum unit size must be at least 1 byte")]
    ZeroUnitSize,
}

/// How units travel from the splitter to the emitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// The emitter calls the splitter itself
    Direct,
    /// The splitter runs in its own task behind an ordered queue
    Queue { capacity: usize },
}

impl Default for Handoff {
    fn default() -> Self {
        Handoff::Queue {
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Settings for a pacing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaceConfig {
    pub mode: SplitMode,
    pub delay: DelayPolicy,
    pub handoff: Handoff,
    pub max_unit_size: usize,
}

impl PaceConfig {
    pub fn new() -> Self {
        Self {
            mode: SplitMode::default(),
            delay: DelayPolicy::new(DEFAULT_MIN_DELAY, DEFAULT_MAX_DELAY),
            handoff: Handoff::default(),
            max_unit_size: DEFAULT_MAX_UNIT_SIZE,
        }
    }

    pub fn mode(mut self, mode: SplitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn delay(mut self, delay: DelayPolicy) -> Self {
        self.delay = delay;
        self
    }

    pub fn handoff(mut self, handoff: Handoff) -> Self {
        self.handoff = handoff;
        self
    }

    /// Set the longest accepted unit; zero is rejected
    pub fn max_unit_size(mut self, size: usize) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::ZeroUnitSize);
        }
        self.max_unit_size = size;
        Ok(self)
    }
}

impl Default for PaceConfig {
    fn default() -> Self {
        Self::new()
    }
}
