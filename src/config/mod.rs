//! config
//!
//! System-level and project-level configuration stores.

pub mod project;
pub mod system;

pub use project::{ManifestSource, ProjectConfigStore};
pub use system::{resolve_config_dir, SystemConfigStore};
