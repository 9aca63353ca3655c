//! # GCodeRip Generator
//!
//! Writes segment sequences back out as G-code text.
//!
//! - Modal suppression of unchanged words, with arc centers always written
//! - Axis remapping so a wrapped axis is written as A or B
//! - Optional safe-height rapids between discontinuous cuts
//! - Header, preamble and postamble lines

pub mod config;
pub mod format;
pub mod generator;

pub use config::GenConfig;
pub use format::{format_feed, format_number};
pub use generator::generate;
