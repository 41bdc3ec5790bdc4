//! # ghdb-store: Documents on a Compare-and-Swap File Store
//!
//! Two stores over a [`ghdb_github::ContentStore`]:
//!
//! - [`ConfigStore`]: the per-user list of connected repositories, with a
//!   self-healing `initialize`, strict `read`, and compare-and-swap
//!   `update`.
//! - [`MappingStore`]: the advisory index of issued file-link tokens.
//!
//! Both hold an `Arc<dyn ContentStore>` and are cheap to clone.

pub mod config_store;
pub mod error;
pub mod mapping;

pub use config_store::{ConfigStore, ServiceEntity};
pub use error::StoreError;
pub use mapping::{MappingStore, NewMapping, TokenPolicy};
