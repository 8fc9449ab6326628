//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

/// Vocabulary scene poster prompt
pub const SCENE: &str = include_str!("../../prompts/scene.pmt");
