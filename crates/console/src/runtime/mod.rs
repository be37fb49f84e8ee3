//! Process bootstrap for the `console` binary.

pub mod boot;
