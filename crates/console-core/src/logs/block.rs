use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::parser::{LogRenderer, ParsedLine};

/// Serialized by name. Deserialization also takes the backend's numeric
/// enum values (`0` info, `1` success, `2` error).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogSeverity {
    #[default]
    Info,
    Success,
    Error,
}

impl LogSeverity {
    const NAMES: &'static [&'static str] = &["INFO", "SUCCESS", "ERROR"];

    pub fn from_number(value: i64) -> Option<Self> {
        match value {
            0 => Some(LogSeverity::Info),
            1 => Some(LogSeverity::Success),
            2 => Some(LogSeverity::Error),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "INFO" => Some(LogSeverity::Info),
            "SUCCESS" => Some(LogSeverity::Success),
            "ERROR" => Some(LogSeverity::Error),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for LogSeverity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeverityVisitor;

        impl<'de> Visitor<'de> for SeverityVisitor {
            type Value = LogSeverity;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a severity name or number 0-2")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                LogSeverity::from_name(value)
                    .ok_or_else(|| E::unknown_variant(value, LogSeverity::NAMES))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                LogSeverity::from_number(value)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(value), &self))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                i64::try_from(value)
                    .ok()
                    .and_then(LogSeverity::from_number)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(value), &self))
            }
        }

        deserializer.deserialize_any(SeverityVisitor)
    }
}

/// One chunk of a deployment stage log as streamed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBlock {
    pub index: i64,
    pub log: String,
    #[serde(default)]
    pub severity: LogSeverity,
    /// Unix seconds; `0` when unknown
    #[serde(default)]
    pub created_at: i64,
}

impl LogBlock {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if self.created_at <= 0 {
            return None;
        }
        DateTime::from_timestamp(self.created_at, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedBlock {
    pub index: i64,
    pub severity: LogSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub lines: Vec<ParsedLine>,
}

/// Render a stage log delivered as blocks.
///
/// Blocks are ordered by `index`; a repeated index keeps its first
/// occurrence. One renderer is used for the whole stream, so a color
/// opened in one block is still active at the start of the next.
pub fn render_blocks(blocks: &[LogBlock]) -> Vec<RenderedBlock> {
    render_blocks_with(&mut LogRenderer::new(), blocks)
}

/// Like [`render_blocks`], continuing from the state of `renderer`.
pub fn render_blocks_with(renderer: &mut LogRenderer, blocks: &[LogBlock]) -> Vec<RenderedBlock> {
    let mut ordered: Vec<&LogBlock> = blocks.iter().collect();
    ordered.sort_by_key(|b| b.index);
    ordered.dedup_by_key(|b| b.index);

    if ordered.len() != blocks.len() {
        tracing::debug!(
            received = blocks.len(),
            kept = ordered.len(),
            "dropped log blocks with repeated index"
        );
    }

    ordered
        .into_iter()
        .map(|block| RenderedBlock {
            index: block.index,
            severity: block.severity,
            created_at: block.created_at(),
            lines: renderer.render(&block.log),
        })
        .collect()
}
