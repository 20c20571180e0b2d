//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware printing and column formatting
//!
//! # Design
//!
//! All command output goes through this module so that `--quiet` and
//! `--debug` behave the same everywhere.

pub mod output;
