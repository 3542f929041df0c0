//! cache
//!
//! Project-local cache of manifest hashes, used to detect drift between
//! the local manifest and the installed app.

pub mod hash;
pub mod manifest;

pub use hash::Hash;
pub use manifest::ManifestCache;
