//! # ghdb-core: Foundational Types for ghdb
//!
//! ghdb keeps two small JSON documents inside a per-user git repository
//! (the *service entity*): the list of repositories the user has
//! connected, and an advisory index of masked file links. This crate
//! defines the types every other crate agrees on:
//!
//! - **`QualifiedName`**: validated `owner/name` repository identifier.
//!   No bare strings for repository references in document schemas.
//! - **`RevisionTag`**: opaque content hash returned by the store and
//!   presented back on compare-and-swap writes.
//! - **`ConfigDocument` / `MappingDocument`**: explicit schemas for the
//!   two persisted files, parsed strictly.
//! - **Sanitizers** for user-supplied paths and file names.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ghdb-*` crates (leaf of the DAG).
//! - No async, no IO.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod document;
pub mod error;
pub mod identity;
pub mod sanitize;

pub use document::{
    ConfigDocument, MappingDocument, MappingEntry, SchemaVersion, CONFIG_FILE, MAPPINGS_FILE,
};
pub use error::{DocumentError, ValidationError};
pub use identity::{validate_repository_name, QualifiedName, RevisionTag, SERVICE_REPO_NAME};
pub use sanitize::{sanitize_filename, sanitize_path};
