//! # ghdb-github: Content Store Client
//!
//! The storage primitive ghdb is built on: a hosted git repository that
//! offers whole-file read and replace-by-revision, nothing more.
//!
//! - [`ContentStore`]: the async, object-safe contract.
//! - [`GithubClient`]: the contract over the GitHub REST v3 API.
//! - [`MemoryStore`]: the same contract in process, for tests and local
//!   development.
//!
//! ## Conflicts Are Outcomes
//!
//! A stale revision, a create over an existing file, or a repository name
//! that is already taken are expected results of optimistic concurrency.
//! They come back as [`WriteOutcome::Conflict`], [`DeleteOutcome::Conflict`]
//! and [`CreateOutcome::AlreadyExisted`], never as errors.
//!
//! ## Crate Policy
//!
//! - Depends on `ghdb-core` only for identifier newtypes.
//! - No retries: transport and rate-limit failures propagate unchanged.

pub mod client;
pub mod config;
mod contents;
pub mod credentials;
pub mod error;
pub mod memory;
mod repos;
pub mod store;

pub use client::{GithubClient, COMMITTER_NAME};
pub use config::{ConfigError, GithubConfig};
pub use credentials::Credentials;
pub use error::ContentStoreError;
pub use memory::{content_revision, MemoryStore};
pub use store::{
    ContentStore, CreateOutcome, DeleteOutcome, FileWrite, Repository, RepositoryOwner,
    StoredFile, WriteOutcome,
};
