//! slack_cli
//!
//! A command-line tool for building Slack apps: authentication against
//! the platform API, per-user and per-project configuration, SDK hook
//! execution, manifest change detection, and binary self-update.
//!
//! # Module map
//!
//! - [`api`] - HTTP client for the platform web API
//! - [`auth`] - credential records and the on-disk credential store
//! - [`cache`] - manifest hash cache for change detection
//! - [`cli`] - argument parsing and command handlers
//! - [`config`] - system and project configuration stores
//! - [`error`] - the tagged error model shared across the crate
//! - [`hooks`] - SDK hook configuration and execution
//! - [`ui`] - user-facing output
//! - [`update`] - release checks and self-update

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod hooks;
pub mod ui;
pub mod update;
