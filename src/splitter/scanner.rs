use super::{Split, SplitMode, split};
use crate::emitter::PaceError;
use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Bytes requested from the reader per refill
const READ_CHUNK: usize = 4096;

const REPLACEMENT: &[u8] = "\u{FFFD}".as_bytes();

/// Lazily cuts a byte stream into units under a [`SplitMode`]
///
/// Units are produced in stream order, one per call to [`next_unit`](Self::next_unit).
/// The scanner holds at most one pending unit plus one read chunk in memory.
pub struct UnitScanner<R> {
    reader: R,
    mode: SplitMode,
    /// Source name used in diagnostics
    name: String,
    buf: BytesMut,
    eof: bool,
    max_unit_size: usize,
}

impl<R: AsyncRead + Unpin> UnitScanner<R> {
    pub fn new(name: impl Into<String>, reader: R, mode: SplitMode, max_unit_size: usize) -> Self {
        Self {
            reader,
            mode,
            name: name.into(),
            buf: BytesMut::with_capacity(READ_CHUNK),
            eof: false,
            max_unit_size,
        }
    }

    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produce the next unit, or `None` once the stream is exhausted
    pub async fn next_unit(&mut self) -> Result<Option<Bytes>, PaceError> {
        loop {
            if !self.buf.is_empty() || self.eof {
                match split(self.mode, &self.buf, self.eof) {
                    Split::Token { advance, len } => {
                        let mut unit = self.buf.split_to(advance);
                        unit.truncate(len);
                        return Ok(Some(unit.freeze()));
                    }
                    Split::Invalid { advance } => {
                        self.buf.advance(advance);
                        return Ok(Some(Bytes::from_static(REPLACEMENT)));
                    }
                    Split::Skip(advance) => {
                        self.buf.advance(advance);
                        continue;
                    }
                    Split::NeedMore => {}
                }
            }

            if self.eof {
                return Ok(None);
            }

            if self.buf.len() >= self.max_unit_size {
                return Err(PaceError::UnitTooLong {
                    name: self.name.clone(),
                    max: self.max_unit_size,
                });
            }

            self.fill().await?;
        }
    }

    async fn fill(&mut self) -> Result<(), PaceError> {
        self.buf.reserve(READ_CHUNK);
        let read = self
            .reader
            .read_buf(&mut self.buf)
            .await
            .map_err(|source| PaceError::Read {
                name: self.name.clone(),
                source,
            })?;

        if read == 0 {
            self.eof = true;
        }
        Ok(())
    }
}
