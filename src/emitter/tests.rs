use super::*;
use crate::config::{Handoff, PaceConfig};
use crate::scheduler::{Cancellation, DelayPolicy};
use crate::splitter::SplitMode;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::Instant;

fn pacer(mode: SplitMode, delay: Duration, handoff: Handoff) -> (Pacer, Cancellation) {
    let cancellation = Cancellation::new();
    let config = PaceConfig::new()
        .mode(mode)
        .delay(DelayPolicy::uniform(delay))
        .handoff(handoff);
    (Pacer::new(config, cancellation.clone()), cancellation)
}

/// Sink that accepts `budget` bytes and then rejects every write
struct FailingWriter {
    written: Vec<u8>,
    budget: usize,
}

impl AsyncWrite for FailingWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.written.len() + buf.len() > self.budget {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")));
        }
        self.written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Reader that hands out a fixed prefix and then fails
struct FailingReader {
    prefix: &'static [u8],
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.prefix.is_empty() {
            return Poll::Ready(Err(io::Error::other("device gone")));
        }
        let n = self.prefix.len().min(buf.remaining());
        buf.put_slice(&self.prefix[..n]);
        self.prefix = &self.prefix[n..];
        Poll::Ready(Ok(()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_words_end_to_end() {
    for handoff in [Handoff::Direct, Handoff::default()] {
        let (pacer, _cancel) = pacer(SplitMode::Words, Duration::from_millis(1), handoff);
        let mut out = Vec::new();
        let start = Instant::now();

        let report = pacer
            .pace_reader("greeting", &b"hello world"[..], &mut out)
            .await
            .unwrap();

        assert_eq!(out, b"hello world");
        assert_eq!(report.outcome, SessionOutcome::Completed);
        assert_eq!(report.units, 2);
        assert_eq!(report.bytes, 11);
        assert!(start.elapsed() >= Duration::from_millis(2));
    }
}

#[tokio::test(start_paused = true)]
async fn test_lines_separator_only_between_units() {
    let (pacer, _cancel) = pacer(SplitMode::Lines, Duration::ZERO, Handoff::default());
    let mut out = Vec::new();

    pacer
        .pace_reader("lines", &b"a\nb\nc"[..], &mut out)
        .await
        .unwrap();
    assert_eq!(out, b"a\nb\nc");

    // A trailing newline in the source is not carried over
    let mut out = Vec::new();
    pacer
        .pace_reader("lines", &b"a\nb\n"[..], &mut out)
        .await
        .unwrap();
    assert_eq!(out, b"a\nb");
}

#[tokio::test(start_paused = true)]
async fn test_bytes_pass_through_unchanged() {
    let input: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();
    let (pacer, _cancel) = pacer(
        SplitMode::Bytes,
        Duration::from_micros(10),
        Handoff::Queue { capacity: 0 },
    );
    let mut out = Vec::new();

    let report = pacer
        .pace_reader("blob", std::io::Cursor::new(input.clone()), &mut out)
        .await
        .unwrap();

    assert_eq!(out, input);
    assert_eq!(report.units, input.len() as u64);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_third_tick() {
    for handoff in [Handoff::Direct, Handoff::default()] {
        let input = vec![b'x'; 1000];
        let (pacer, cancel) = pacer(SplitMode::Bytes, Duration::from_millis(50), handoff);
        let mut out = Vec::new();

        let canceller = async {
            // Ticks land at 50ms, 100ms and 150ms
            tokio::time::sleep(Duration::from_millis(175)).await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(
            pacer.pace_reader("many", std::io::Cursor::new(input), &mut out),
            canceller
        );

        let report = result.unwrap();
        assert_eq!(report.outcome, SessionOutcome::Cancelled);
        assert_eq!(report.units, 3);
        assert_eq!(out, b"xxx");
    }
}

#[tokio::test(start_paused = true)]
async fn test_write_failure_aborts_session() {
    let (pacer, _cancel) = pacer(
        SplitMode::Words,
        Duration::from_millis(1),
        Handoff::default(),
    );
    let mut out = FailingWriter {
        written: Vec::new(),
        budget: 5,
    };

    let result = pacer
        .pace_reader("words", &b"hello brave new world"[..], &mut out)
        .await;

    assert!(matches!(result, Err(PaceError::Write(_))));
    assert_eq!(out.written, b"hello");
}

#[tokio::test(start_paused = true)]
async fn test_read_failure_crosses_queue() {
    for handoff in [Handoff::Direct, Handoff::default()] {
        let (pacer, _cancel) = pacer(SplitMode::Lines, Duration::from_millis(1), handoff);
        let reader = FailingReader { prefix: b"ab\ncd" };
        let mut out = Vec::new();

        match pacer.pace_reader("flaky", reader, &mut out).await {
            Err(PaceError::Read { name, .. }) => assert_eq!(name, "flaky"),
            other => panic!("expected read failure, got {:?}", other),
        }
        // Units split before the failure are still written
        assert_eq!(out, b"ab");
    }
}

#[tokio::test]
async fn test_run_drains_sources_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");
    std::fs::write(&first, b"AB").unwrap();
    std::fs::write(&second, b"CD").unwrap();

    let (pacer, _cancel) = pacer(
        SplitMode::Bytes,
        Duration::from_millis(1),
        Handoff::default(),
    );
    let sources = InputSource::from_paths(vec![first, second]);
    let mut out = Vec::new();

    let stats = pacer.run(&sources, &mut out).await.unwrap();

    assert_eq!(out, b"ABCD");
    assert_eq!(stats.sources, 2);
    assert_eq!(stats.units, 4);
    assert_eq!(stats.bytes, 4);
    assert!(!stats.cancelled);
}

#[tokio::test]
async fn test_run_starts_each_source_without_separator() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.txt");
    let second = dir.path().join("second.txt");
    std::fs::write(&first, b"a\nb\n").unwrap();
    std::fs::write(&second, b"c\nd\n").unwrap();
    let sources = InputSource::from_paths(vec![first, second]);

    // Separators only sit between units of the same source
    let (lines, _cancel) = pacer(SplitMode::Lines, Duration::ZERO, Handoff::default());
    let mut out = Vec::new();
    lines.run(&sources, &mut out).await.unwrap();
    assert_eq!(out, b"a\nbc\nd");

    let (words, _cancel) = pacer(SplitMode::Words, Duration::ZERO, Handoff::default());
    let mut out = Vec::new();
    let stats = words.run(&sources, &mut out).await.unwrap();
    assert_eq!(out, b"a bc d");
    assert_eq!(stats.units, 4);
}

#[tokio::test]
async fn test_run_fails_fast_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("present.txt");
    let missing = dir.path().join("missing.txt");
    std::fs::write(&present, b"ok").unwrap();

    let (pacer, _cancel) = pacer(SplitMode::Bytes, Duration::ZERO, Handoff::default());
    let sources = InputSource::from_paths(vec![
        present,
        missing.clone(),
        dir.path().join("never.txt"),
    ]);
    let mut out = Vec::new();

    match pacer.run(&sources, &mut out).await {
        Err(PaceError::Open { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected open failure, got {:?}", other),
    }
    assert_eq!(out, b"ok");
}

#[tokio::test(start_paused = true)]
async fn test_run_skips_sources_after_cancel() {
    let (pacer, cancel) = pacer(SplitMode::Bytes, Duration::ZERO, Handoff::default());
    cancel.cancel();

    let sources = InputSource::from_paths(vec!["does-not-matter.txt".into()]);
    let mut out = Vec::new();
    let stats = pacer.run(&sources, &mut out).await.unwrap();

    assert!(stats.cancelled);
    assert_eq!(stats.sources, 0);
    assert!(out.is_empty());
}

#[test]
fn test_stdin_when_no_paths() {
    assert_eq!(InputSource::from_paths(vec![]), vec![InputSource::Stdin]);
    assert_eq!(InputSource::Stdin.name(), "<stdin>");
}

#[test]
fn test_run_stats_serialize() {
    let stats = RunStats {
        mode: SplitMode::Words,
        sources: 1,
        units: 2,
        bytes: 11,
        cancelled: false,
        elapsed_ms: 3,
    };

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["mode"], "words");
    assert_eq!(json["units"], 2);
    assert_eq!(json["cancelled"], false);
}
