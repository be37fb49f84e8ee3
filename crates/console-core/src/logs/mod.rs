//! Deployment stage logs as delivered by the backend in blocks.

pub mod block;

pub use block::{render_blocks, render_blocks_with, LogBlock, LogSeverity, RenderedBlock};
