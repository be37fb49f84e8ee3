/// ANSI log parsing
///
/// Converts deployment log text carrying SGR escape sequences into styled
/// segments for display.
///
/// # Architecture
///
/// - `ansi.rs`: CSI scanning, SGR interpretation, and escape stripping
/// - `model.rs`: colors, styles, segments, and lines
/// - `renderer.rs`: the stateful renderer that carries style across lines
/// - `metrics.rs`: render counters
///
/// # Guarantees
///
/// - Never fails: unsupported or malformed sequences are no-ops
/// - Style persists across line boundaries until reset by code `0`
/// - O(n) in input length, no allocation for lines without ESC beyond the output

pub mod metrics;
pub mod model;
pub mod renderer;
mod ansi;

// Re-export commonly used types
pub use ansi::{strip_ansi_codes, SgrOutcome};
pub use metrics::{RenderMetrics, RenderMetricsSnapshot};
pub use model::{plain_text, Color, ParsedLine, Style, StyledSegment};
pub use renderer::{parse_log, LogRenderer};
