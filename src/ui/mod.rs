//! ui
//!
//! User-facing output utilities.

pub mod output;

pub use output::{IoStreams, Verbosity};
