// Public API exports
pub mod config;
pub mod emitter;
pub mod scheduler;
pub mod splitter;

// Re-export main types for convenience
pub use config::{ConfigError, Handoff, PaceConfig, parse_duration};

pub use emitter::{InputSource, PaceError, Pacer, RunStats, SessionOutcome, SessionReport};

pub use scheduler::{Cancellation, DelayPolicy, DelaySampler, Tick, Ticker};

pub use splitter::{SplitMode, UnitScanner};
