use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaceError {
    #[error("Error opening {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error reading {name}: {source}")]
    Read {
        name: String,
        source: std::io::Error,
    },

    #[error("Unit in {name} exceeds {max} bytes without a boundary")]
    UnitTooLong { name: String, max: usize },

    #[error("Error writing: {0}")]
    Write(#[source] std::io::Error),

    #[error("Producer for {name} stopped before end of stream")]
    ProducerFailed { name: String },
}
