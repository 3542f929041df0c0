//! auth
//!
//! Credential records and the on-disk credential store.

pub mod record;
pub mod store;

pub use record::{is_team_id, Auth};
pub use store::AuthStore;
