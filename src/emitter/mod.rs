mod error;
mod handoff;
mod paced;
mod pipeline;

#[cfg(test)]
mod tests;

pub use error::PaceError;
pub use handoff::UnitQueue;
pub use paced::{SessionOutcome, SessionReport, UnitStream, emit_units};
pub use pipeline::{InputSource, Pacer, RunStats};
