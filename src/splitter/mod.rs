mod scanner;
mod split;


pub use scanner::UnitScanner;
pub use split::{Split, split};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Boundary policy used to cut a byte stream into units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Every raw byte is a unit
    #[default]
    Bytes,
    /// Every UTF-8 encoded character is a unit
    Runes,
    /// Runs of non-whitespace; whitespace is dropped
    Words,
    /// Newline-delimited lines with the terminator stripped
    Lines,
}

impl SplitMode {
    /// Bytes written between two units when re-emitting under this mode
    pub fn separator(&self) -> &'static [u8] {
        match self {
            SplitMode::Bytes | SplitMode::Runes => b"",
            SplitMode::Words => b" ",
            SplitMode::Lines => b"\n",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SplitMode::Bytes => "bytes",
            SplitMode::Runes => "runes",
            SplitMode::Words => "words",
            SplitMode::Lines => "lines",
        }
    }
}

impl std::fmt::Display for SplitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
