use std::sync::Arc;

use super::ansi::{apply_sequence, scan_csi, SgrOutcome, ESC};
use super::metrics::RenderMetrics;
use super::model::{ParsedLine, Style, StyledSegment};

/// Turns raw log text into styled lines.
///
/// The style accumulator lives as long as the renderer: it is carried from
/// one line to the next and from one `render` call to the next, so a log
/// delivered in several chunks renders the same as one delivered whole.
/// Only code `0` clears it.
#[derive(Debug, Default)]
pub struct LogRenderer {
    style: Style,
    metrics: Option<Arc<RenderMetrics>>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer that records into shared counters.
    pub fn with_metrics(metrics: Arc<RenderMetrics>) -> Self {
        Self {
            style: Style::default(),
            metrics: Some(metrics),
        }
    }

    /// Style that the next piece of text would get.
    pub fn style(&self) -> Style {
        self.style
    }

    pub fn reset(&mut self) {
        self.style = Style::default();
    }

    /// Render `input`, one `ParsedLine` per `\n`-delimited line.
    ///
    /// Never fails: unsupported or malformed sequences are dropped without
    /// touching the style, and unterminated ones are kept as text.
    pub fn render(&mut self, input: &str) -> Vec<ParsedLine> {
        input.split('\n').map(|line| self.render_line(line)).collect()
    }

    fn render_line(&mut self, line: &str) -> ParsedLine {
        let mut segments = Vec::new();
        let mut rest = line;

        while let Some(pos) = rest.find(ESC) {
            push_text(&mut segments, &rest[..pos], self.style);
            let tail = &rest[pos..];

            let Some((csi, len)) = scan_csi(tail) else {
                if let Some(metrics) = &self.metrics {
                    metrics.record_literal_escape();
                }
                let (esc, after) = tail.split_at(ESC.len_utf8());
                push_text(&mut segments, esc, self.style);
                rest = after;
                continue;
            };
            rest = &tail[len..];

            let outcome = apply_sequence(&mut self.style, &csi);
            if outcome == SgrOutcome::Ignored {
                tracing::trace!(params = csi.params, final_byte = %char::from(csi.final_byte), "ignoring escape sequence");
            }
            if let Some(metrics) = &self.metrics {
                metrics.record_sequence(outcome);
            }
        }
        push_text(&mut segments, rest, self.style);

        if let Some(metrics) = &self.metrics {
            metrics.record_line();
            metrics.record_segments(segments.len() as u64);
        }
        ParsedLine { segments }
    }
}

/// Append `text` to the line, extending the last segment when the style
/// matches so that adjacent segments always differ.
fn push_text(segments: &mut Vec<StyledSegment>, text: &str, style: Style) {
    if text.is_empty() {
        return;
    }
    match segments.last_mut() {
        Some(last) if last.style == style => last.text.push_str(text),
        _ => segments.push(StyledSegment::new(text, style)),
    }
}

/// Parse a complete log with a fresh style accumulator.
pub fn parse_log(input: &str) -> Vec<ParsedLine> {
    LogRenderer::new().render(input)
}
