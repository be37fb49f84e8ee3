//! Formatting of parsed logs for stdout.

use std::fmt::Write;

use anyhow::{Context, Result};
use console_core::logs::{LogSeverity, RenderedBlock};
use console_core::parser::{plain_text, ParsedLine, Style, StyledSegment};
use serde::Serialize;

use crate::config::OutputFormat;

pub fn format_lines(lines: &[ParsedLine], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(lines),
        OutputFormat::Html => Ok(lines_to_html(lines)),
        OutputFormat::Plain => Ok(plain_text(lines)),
    }
}

pub fn format_blocks(blocks: &[RenderedBlock], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(blocks),
        OutputFormat::Html => Ok(blocks
            .iter()
            .map(|block| {
                format!(
                    "<div class=\"log-block {}\" data-index=\"{}\">\n{}\n</div>",
                    severity_class(block.severity),
                    block.index,
                    lines_to_html(&block.lines)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Plain => Ok(blocks
            .iter()
            .map(|block| plain_text(&block.lines))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

fn severity_class(severity: LogSeverity) -> &'static str {
    match severity {
        LogSeverity::Info => "severity-info",
        LogSeverity::Success => "severity-success",
        LogSeverity::Error => "severity-error",
    }
}

/// One `<div class="log-line">` per line, one `<span>` per segment.
pub fn lines_to_html(lines: &[ParsedLine]) -> String {
    lines
        .iter()
        .map(|line| {
            let mut html = String::from("<div class=\"log-line\">");
            for segment in &line.segments {
                push_segment(&mut html, segment);
            }
            html.push_str("</div>");
            html
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_segment(html: &mut String, segment: &StyledSegment) {
    let classes = style_classes(&segment.style);
    if classes.is_empty() {
        html.push_str("<span>");
    } else {
        // Writing to a String cannot fail
        let _ = write!(html, "<span class=\"{}\">", classes.join(" "));
    }
    html.push_str(&escape_html(&segment.text));
    html.push_str("</span>");
}

pub fn style_classes(style: &Style) -> Vec<String> {
    let mut classes = Vec::new();
    if let Some(fg) = style.foreground {
        classes.push(format!("fg-{}", fg.as_str()));
    }
    if let Some(bg) = style.background {
        classes.push(format!("bg-{}", bg.as_str()));
    }
    if style.bold {
        classes.push("bold".to_string());
    }
    if style.underline {
        classes.push("underline".to_string());
    }
    if style.reversed {
        classes.push("reversed".to_string());
    }
    classes
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_core::logs::{render_blocks, LogBlock};
    use console_core::parser::{parse_log, Color};

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_style_classes_order() {
        let style = Style {
            foreground: Some(Color::Red),
            background: Some(Color::BrightBlue),
            bold: true,
            underline: true,
            reversed: true,
        };
        assert_eq!(
            style_classes(&style).join(" "),
            "fg-red bg-bright-blue bold underline reversed"
        );
        assert!(style_classes(&Style::default()).is_empty());
    }

    #[test]
    fn test_lines_to_html() {
        let html = lines_to_html(&parse_log("ok \x1b[1;31m<err>\x1b[0m\n"));
        assert_eq!(
            html,
            "<div class=\"log-line\"><span>ok </span><span class=\"fg-bright-red bold\">&lt;err&gt;</span></div>\n<div class=\"log-line\"></div>"
        );
    }

    #[test]
    fn test_format_lines_plain_strips_styles() {
        let out = format_lines(&parse_log("\x1b[32mgreen\x1b[0m\nnext"), OutputFormat::Plain).unwrap();
        assert_eq!(out, "green\nnext");
    }

    #[test]
    fn test_format_lines_json() {
        let out = format_lines(&parse_log("\x1b[34mx"), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["segments"][0]["foreground"], "blue");
        assert_eq!(value[0]["segments"][0]["text"], "x");
    }

    #[test]
    fn test_format_blocks_html_and_plain() {
        let blocks = render_blocks(&[
            LogBlock {
                index: 1,
                log: "done".to_string(),
                severity: LogSeverity::Success,
                created_at: 0,
            },
            LogBlock {
                index: 0,
                log: "start".to_string(),
                severity: LogSeverity::Info,
                created_at: 0,
            },
        ]);

        let html = format_blocks(&blocks, OutputFormat::Html).unwrap();
        assert!(html.starts_with("<div class=\"log-block severity-info\" data-index=\"0\">"));
        assert!(html.contains("<div class=\"log-block severity-success\" data-index=\"1\">"));

        assert_eq!(format_blocks(&blocks, OutputFormat::Plain).unwrap(), "start\ndone");
    }
}
