//! hooks
//!
//! The SDK hook interface: a project's `.slack/hooks.json` names the
//! scripts the CLI shells out to for SDK-owned work such as producing the
//! manifest or starting a local dev server.

pub mod config;
pub mod executor;

pub use config::{HookScript, Protocol, SdkConfig};
pub use executor::{executor_for, HookExecOpts, HookExecutor};
