use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

use super::ansi::SgrOutcome;

/// Keeps a counter group on its own cache line so concurrent renderers
/// updating different groups do not contend.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// Output volume (updated per line and per flushed segment)
#[derive(Debug, Default)]
pub struct OutputMetrics {
    pub lines: AtomicU64,
    pub segments: AtomicU64,
}

/// Escape sequence outcomes
#[derive(Debug, Default)]
pub struct SequenceMetrics {
    pub applied: AtomicU64,
    pub ignored: AtomicU64,
    /// ESC bytes that did not start a complete CSI and were kept as text
    pub literal_escapes: AtomicU64,
}

/// Counters for log rendering.
///
/// Shared between renderers through `Arc`. All operations use
/// `Ordering::Relaxed`; a snapshot is not transactional across fields.
#[derive(Debug, Default)]
pub struct RenderMetrics {
    pub output: CacheAligned<OutputMetrics>,
    pub sequences: CacheAligned<SequenceMetrics>,
}

impl RenderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_line(&self) {
        self.output.0.lines.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_segments(&self, count: u64) {
        self.output.0.segments.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sequence(&self, outcome: SgrOutcome) {
        match outcome {
            SgrOutcome::Applied => self.sequences.0.applied.fetch_add(1, Ordering::Relaxed),
            SgrOutcome::Ignored => self.sequences.0.ignored.fetch_add(1, Ordering::Relaxed),
        };
    }

    #[inline]
    pub fn record_literal_escape(&self) {
        self.sequences.0.literal_escapes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RenderMetricsSnapshot {
        let lines = self.output.0.lines.load(Ordering::Relaxed);
        let segments = self.output.0.segments.load(Ordering::Relaxed);

        RenderMetricsSnapshot {
            lines,
            segments,
            avg_segments_per_line: if lines > 0 {
                segments as f64 / lines as f64
            } else {
                0.0
            },
            sequences_applied: self.sequences.0.applied.load(Ordering::Relaxed),
            sequences_ignored: self.sequences.0.ignored.load(Ordering::Relaxed),
            literal_escapes: self.sequences.0.literal_escapes.load(Ordering::Relaxed),
        }
    }
}

/// A read-only snapshot of render metrics, suitable for logging.
#[derive(Debug, Clone, Serialize)]
pub struct RenderMetricsSnapshot {
    pub lines: u64,
    pub segments: u64,
    pub avg_segments_per_line: f64,
    pub sequences_applied: u64,
    pub sequences_ignored: u64,
    pub literal_escapes: u64,
}
