//! # The `ContentStore` Trait
//!
//! Whole-file read and replace-by-revision over a hosted git repository.
//! No locking, no transactions, no partial updates: the only concurrency
//! primitive is that a write carrying a [`RevisionTag`] succeeds only if
//! the tag still names the stored content.
//!
//! | Operation             | Success                | Tagged non-success          |
//! |-----------------------|------------------------|-----------------------------|
//! | `read_file`           | `StoredFile`           | `Err(NotFound)`             |
//! | `write_file`          | `Created` / `Replaced` | `Conflict`                  |
//! | `delete_file`         | `Deleted`              | `Conflict`, `Err(NotFound)` |
//! | `create_repository`   | `Created`              | `AlreadyExisted`            |
//! | `get_repository`      | `Some(repo)`           | `None`                      |
//! | `authenticated_login` | token owner's login    | `Err(Api { status: 401 })`  |

use async_trait::async_trait;
use ghdb_core::{QualifiedName, RevisionTag};
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::error::ContentStoreError;

/// A file as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Decoded file bytes.
    pub content: Vec<u8>,
    /// Revision of exactly these bytes.
    pub revision: RevisionTag,
    /// Direct download URL, when the store provides one.
    pub download_url: Option<String>,
}

/// A whole-file write.
#[derive(Debug, Clone)]
pub struct FileWrite {
    pub content: Vec<u8>,
    /// `None` creates the file and conflicts if it exists. `Some` replaces
    /// and conflicts if the tag is stale.
    pub revision: Option<RevisionTag>,
    /// Commit message.
    pub message: String,
}

impl FileWrite {
    /// A create-only write.
    pub fn create(content: impl Into<Vec<u8>>, message: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            revision: None,
            message: message.into(),
        }
    }

    /// A compare-and-swap replacement of the content at `revision`.
    pub fn replace(
        content: impl Into<Vec<u8>>,
        revision: RevisionTag,
        message: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            revision: Some(revision),
            message: message.into(),
        }
    }
}

/// Result of a write attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new file was created.
    Created(RevisionTag),
    /// An existing file was replaced.
    Replaced(RevisionTag),
    /// The expected revision did not match (or the file already existed on
    /// a create-only write). Nothing was written.
    Conflict,
}

impl WriteOutcome {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }

    /// Revision of the written content, if the write took effect.
    pub fn revision(&self) -> Option<&RevisionTag> {
        match self {
            Self::Created(rev) | Self::Replaced(rev) => Some(rev),
            Self::Conflict => None,
        }
    }
}

/// Result of a delete attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Conflict,
}

/// Result of a repository creation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Repository),
    /// A repository with that name already exists for the caller.
    AlreadyExisted,
}

/// Owner of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

/// Repository descriptor, in the hosting API's wire shape.
///
/// Unknown fields are ignored so new API fields never break parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: RepositoryOwner,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Repository {
    /// The repository's `owner/name`, if the names are valid.
    pub fn qualified_name(&self) -> Option<QualifiedName> {
        QualifiedName::new(&self.owner.login, &self.name).ok()
    }
}

/// Remote content store.
///
/// Object-safe so services can hold an `Arc<dyn ContentStore>` and swap
/// the GitHub client for [`crate::MemoryStore`] in tests.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read a file. `NotFound` if the repository or file is absent,
    /// `NotAFile` if the path names a directory.
    async fn read_file(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
        path: &str,
    ) -> Result<StoredFile, ContentStoreError>;

    /// Create or replace a file. See [`FileWrite::revision`].
    async fn write_file(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
        path: &str,
        write: FileWrite,
    ) -> Result<WriteOutcome, ContentStoreError>;

    /// Delete a file at a known revision.
    async fn delete_file(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
        path: &str,
        revision: &RevisionTag,
        message: &str,
    ) -> Result<DeleteOutcome, ContentStoreError>;

    /// Create a repository owned by the caller, with an initial commit.
    async fn create_repository(
        &self,
        creds: &Credentials,
        name: &str,
        private: bool,
    ) -> Result<CreateOutcome, ContentStoreError>;

    /// Every repository the caller can access.
    async fn list_repositories(
        &self,
        creds: &Credentials,
    ) -> Result<Vec<Repository>, ContentStoreError>;

    /// Look up one repository. `None` if it does not exist.
    async fn get_repository(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
    ) -> Result<Option<Repository>, ContentStoreError>;

    /// Login of the account that owns the credentials' token. The login
    /// carried in `creds` is not consulted. An unknown or revoked token is
    /// `Api { status: 401 }`.
    async fn authenticated_login(&self, creds: &Credentials) -> Result<String, ContentStoreError>;

    /// Whether a repository exists. Transport failures are errors, never
    /// `false`.
    async fn repository_exists(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
    ) -> Result<bool, ContentStoreError> {
        Ok(self.get_repository(creds, repo).await?.is_some())
    }
}
