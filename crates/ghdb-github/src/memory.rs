//! # In-Memory Content Store
//!
//! `MemoryStore` gives the [`ContentStore`] contract without a network:
//! revisions are SHA-256 hex digests of the stored bytes, repository names
//! are case-insensitive, and create-only writes conflict when the file
//! exists, exactly as the GitHub client reports them.
//!
//! Every operation yields to the runtime once before it takes effect, so
//! two calls joined on one task interleave at each store access the way
//! two requests would against the real service.
//!
//! Cheaply cloneable via `Arc`; all clones share the same data. Every
//! repository in the store is visible to every caller. Tokens identify
//! an account only once registered with [`MemoryStore::add_user`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use ghdb_core::{QualifiedName, RevisionTag};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::credentials::Credentials;
use crate::error::ContentStoreError;
use crate::store::{
    ContentStore, CreateOutcome, DeleteOutcome, FileWrite, Repository, RepositoryOwner,
    StoredFile, WriteOutcome,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    /// Writes and deletes report a conflict.
    Conflict,
    /// Reads, writes and deletes fail with a server error.
    Failure,
}

#[derive(Debug)]
struct RepoRecord {
    repo: Repository,
    files: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Keyed by lowercased `owner/name`.
    repos: BTreeMap<String, RepoRecord>,
    /// Keyed by file path, applied in every repository.
    faults: HashMap<String, Fault>,
    /// Token to login.
    users: HashMap<String, String>,
    file_writes: usize,
    repos_created: usize,
}

/// Shared in-memory content store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

/// SHA-256 hex digest of `content`.
pub fn content_revision(content: &[u8]) -> RevisionTag {
    let digest = Sha256::digest(content);
    RevisionTag::new(digest.iter().map(|b| format!("{b:02x}")).collect::<String>())
}

fn repo_key(owner: &str, name: &str) -> String {
    format!("{}/{}", owner.to_ascii_lowercase(), name.to_ascii_lowercase())
}

fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn descriptor(owner: &str, name: &str, private: bool) -> Repository {
    Repository {
        name: name.to_string(),
        full_name: format!("{owner}/{name}"),
        owner: RepositoryOwner {
            login: owner.to_string(),
        },
        private,
        default_branch: Some("main".into()),
        html_url: Some(format!("https://github.com/{owner}/{name}")),
        description: None,
    }
}

fn not_found(endpoint: String) -> ContentStoreError {
    ContentStoreError::NotFound { endpoint }
}

fn injected_failure(endpoint: String) -> ContentStoreError {
    ContentStoreError::Api {
        endpoint,
        status: 500,
        body: "injected failure".into(),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a repository. Returns the existing descriptor if present.
    pub fn add_repository(&self, owner: &str, name: &str) -> Repository {
        let mut inner = self.inner.lock();
        inner
            .repos
            .entry(repo_key(owner, name))
            .or_insert_with(|| RepoRecord {
                repo: descriptor(owner, name, false),
                files: BTreeMap::new(),
            })
            .repo
            .clone()
    }

    /// Register `token` as belonging to `login`.
    pub fn add_user(&self, token: &str, login: &str) {
        self.inner
            .lock()
            .users
            .insert(token.to_string(), login.to_string());
    }

    /// Remove a repository and its files, as if deleted out of band.
    pub fn remove_repository(&self, repo: &QualifiedName) -> bool {
        self.inner
            .lock()
            .repos
            .remove(&repo_key(repo.owner(), repo.name()))
            .is_some()
    }

    /// Seed or overwrite a file, creating the repository if needed. Not
    /// counted as a write.
    pub fn put_file(&self, repo: &QualifiedName, path: &str, content: impl Into<Vec<u8>>) {
        self.add_repository(repo.owner(), repo.name());
        let mut inner = self.inner.lock();
        if let Some(record) = inner.repos.get_mut(&repo_key(repo.owner(), repo.name())) {
            record.files.insert(normalize_path(path), content.into());
        }
    }

    /// Current bytes of a file.
    pub fn file(&self, repo: &QualifiedName, path: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .repos
            .get(&repo_key(repo.owner(), repo.name()))
            .and_then(|r| r.files.get(&normalize_path(path)).cloned())
    }

    /// Make every write or delete of `path` report a conflict.
    pub fn inject_conflict(&self, path: &str) {
        self.inner
            .lock()
            .faults
            .insert(normalize_path(path), Fault::Conflict);
    }

    /// Make every access to `path` fail with a server error.
    pub fn inject_failure(&self, path: &str) {
        self.inner
            .lock()
            .faults
            .insert(normalize_path(path), Fault::Failure);
    }

    pub fn clear_faults(&self) {
        self.inner.lock().faults.clear();
    }

    /// Number of file writes that took effect.
    pub fn file_writes(&self) -> usize {
        self.inner.lock().file_writes
    }

    /// Number of repositories created through `create_repository`.
    pub fn repositories_created(&self) -> usize {
        self.inner.lock().repos_created
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn read_file(
        &self,
        _creds: &Credentials,
        repo: &QualifiedName,
        path: &str,
    ) -> Result<StoredFile, ContentStoreError> {
        tokio::task::yield_now().await;
        let path = normalize_path(path);
        let endpoint = format!("GET /repos/{repo}/contents/{path}");
        let inner = self.inner.lock();

        if inner.faults.get(&path) == Some(&Fault::Failure) {
            return Err(injected_failure(endpoint));
        }
        let record = inner
            .repos
            .get(&repo_key(repo.owner(), repo.name()))
            .ok_or_else(|| not_found(endpoint.clone()))?;

        if let Some(content) = record.files.get(&path) {
            return Ok(StoredFile {
                revision: content_revision(content),
                content: content.clone(),
                download_url: Some(format!(
                    "https://raw.githubusercontent.com/{}/main/{path}",
                    record.repo.full_name
                )),
            });
        }
        let prefix = format!("{path}/");
        if record.files.keys().any(|k| k.starts_with(&prefix)) {
            return Err(ContentStoreError::NotAFile { path });
        }
        Err(not_found(endpoint))
    }

    async fn write_file(
        &self,
        _creds: &Credentials,
        repo: &QualifiedName,
        path: &str,
        write: FileWrite,
    ) -> Result<WriteOutcome, ContentStoreError> {
        tokio::task::yield_now().await;
        let path = normalize_path(path);
        let endpoint = format!("PUT /repos/{repo}/contents/{path}");
        let mut inner = self.inner.lock();

        match inner.faults.get(&path) {
            Some(Fault::Failure) => return Err(injected_failure(endpoint)),
            Some(Fault::Conflict) => return Ok(WriteOutcome::Conflict),
            None => {}
        }
        let record = inner
            .repos
            .get_mut(&repo_key(repo.owner(), repo.name()))
            .ok_or_else(|| not_found(endpoint))?;

        let current = record.files.get(&path).map(|c| content_revision(c));
        let created = match (current, write.revision) {
            (None, None) => true,
            (Some(current), Some(expected)) if current == expected => false,
            _ => return Ok(WriteOutcome::Conflict),
        };

        let revision = content_revision(&write.content);
        record.files.insert(path, write.content);
        inner.file_writes += 1;
        Ok(if created {
            WriteOutcome::Created(revision)
        } else {
            WriteOutcome::Replaced(revision)
        })
    }

    async fn delete_file(
        &self,
        _creds: &Credentials,
        repo: &QualifiedName,
        path: &str,
        revision: &RevisionTag,
        _message: &str,
    ) -> Result<DeleteOutcome, ContentStoreError> {
        tokio::task::yield_now().await;
        let path = normalize_path(path);
        let endpoint = format!("DELETE /repos/{repo}/contents/{path}");
        let mut inner = self.inner.lock();

        match inner.faults.get(&path) {
            Some(Fault::Failure) => return Err(injected_failure(endpoint)),
            Some(Fault::Conflict) => return Ok(DeleteOutcome::Conflict),
            None => {}
        }
        let record = inner
            .repos
            .get_mut(&repo_key(repo.owner(), repo.name()))
            .ok_or_else(|| not_found(endpoint.clone()))?;
        let current = record
            .files
            .get(&path)
            .map(|c| content_revision(c))
            .ok_or_else(|| not_found(endpoint))?;

        if &current != revision {
            return Ok(DeleteOutcome::Conflict);
        }
        record.files.remove(&path);
        Ok(DeleteOutcome::Deleted)
    }

    async fn create_repository(
        &self,
        creds: &Credentials,
        name: &str,
        private: bool,
    ) -> Result<CreateOutcome, ContentStoreError> {
        tokio::task::yield_now().await;
        let mut inner = self.inner.lock();
        let key = repo_key(creds.login(), name);
        if inner.repos.contains_key(&key) {
            return Ok(CreateOutcome::AlreadyExisted);
        }

        let repo = descriptor(creds.login(), name, private);
        let mut files = BTreeMap::new();
        // auto_init
        files.insert("README.md".to_string(), format!("# {name}\n").into_bytes());
        inner.repos.insert(
            key,
            RepoRecord {
                repo: repo.clone(),
                files,
            },
        );
        inner.repos_created += 1;
        Ok(CreateOutcome::Created(repo))
    }

    async fn list_repositories(
        &self,
        _creds: &Credentials,
    ) -> Result<Vec<Repository>, ContentStoreError> {
        tokio::task::yield_now().await;
        Ok(self
            .inner
            .lock()
            .repos
            .values()
            .map(|r| r.repo.clone())
            .collect())
    }

    async fn get_repository(
        &self,
        _creds: &Credentials,
        repo: &QualifiedName,
    ) -> Result<Option<Repository>, ContentStoreError> {
        tokio::task::yield_now().await;
        Ok(self
            .inner
            .lock()
            .repos
            .get(&repo_key(repo.owner(), repo.name()))
            .map(|r| r.repo.clone()))
    }

    async fn authenticated_login(&self, creds: &Credentials) -> Result<String, ContentStoreError> {
        tokio::task::yield_now().await;
        self.inner
            .lock()
            .users
            .get(creds.token())
            .cloned()
            .ok_or_else(|| ContentStoreError::Api {
                endpoint: "GET /user".into(),
                status: 401,
                body: "Bad credentials".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("token", "alice")
    }

    fn qn(raw: &str) -> QualifiedName {
        QualifiedName::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn create_then_replace_with_current_revision() {
        let store = MemoryStore::new();
        let repo = qn("alice/notes");
        store.add_repository("alice", "notes");

        let created = store
            .write_file(&creds(), &repo, "a.json", FileWrite::create(b"1".to_vec(), "c"))
            .await
            .unwrap();
        let rev = match created {
            WriteOutcome::Created(rev) => rev,
            other => panic!("expected Created, got {other:?}"),
        };
        assert_eq!(rev, content_revision(b"1"));

        let replaced = store
            .write_file(&creds(), &repo, "a.json", FileWrite::replace(b"2".to_vec(), rev, "u"))
            .await
            .unwrap();
        assert_eq!(replaced, WriteOutcome::Replaced(content_revision(b"2")));
        assert_eq!(store.file_writes(), 2);
    }

    #[tokio::test]
    async fn stale_or_missing_revision_conflicts() {
        let store = MemoryStore::new();
        let repo = qn("alice/notes");
        store.put_file(&repo, "a.json", b"1".to_vec());

        let tagless = store
            .write_file(&creds(), &repo, "a.json", FileWrite::create(b"x".to_vec(), "c"))
            .await
            .unwrap();
        assert!(tagless.is_conflict());

        let stale = store
            .write_file(
                &creds(),
                &repo,
                "a.json",
                FileWrite::replace(b"x".to_vec(), content_revision(b"0"), "u"),
            )
            .await
            .unwrap();
        assert!(stale.is_conflict());
        assert_eq!(store.file(&repo, "a.json").unwrap(), b"1");
        assert_eq!(store.file_writes(), 0);
    }

    #[tokio::test]
    async fn read_reports_not_found_and_directories() {
        let store = MemoryStore::new();
        let repo = qn("alice/notes");
        assert!(store
            .read_file(&creds(), &repo, "a.json")
            .await
            .unwrap_err()
            .is_not_found());

        store.put_file(&repo, "docs/a.md", b"x".to_vec());
        assert!(matches!(
            store.read_file(&creds(), &repo, "docs").await,
            Err(ContentStoreError::NotAFile { .. })
        ));
        let file = store.read_file(&creds(), &repo, "/docs//a.md").await.unwrap();
        assert_eq!(file.content, b"x");
    }

    #[tokio::test]
    async fn create_repository_is_case_insensitive() {
        let store = MemoryStore::new();
        let first = store
            .create_repository(&creds(), "3db-service", true)
            .await
            .unwrap();
        assert!(matches!(first, CreateOutcome::Created(ref r) if r.private));
        let second = store
            .create_repository(&creds(), "3DB-Service", true)
            .await
            .unwrap();
        assert_eq!(second, CreateOutcome::AlreadyExisted);
        assert_eq!(store.repositories_created(), 1);
        assert!(store
            .repository_exists(&creds(), &qn("ALICE/3db-service"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn delete_checks_revision() {
        let store = MemoryStore::new();
        let repo = qn("alice/notes");
        store.put_file(&repo, "a.json", b"1".to_vec());

        let stale = store
            .delete_file(&creds(), &repo, "a.json", &content_revision(b"0"), "d")
            .await
            .unwrap();
        assert_eq!(stale, DeleteOutcome::Conflict);
        let ok = store
            .delete_file(&creds(), &repo, "a.json", &content_revision(b"1"), "d")
            .await
            .unwrap();
        assert_eq!(ok, DeleteOutcome::Deleted);
        assert!(store.file(&repo, "a.json").is_none());
    }

    #[tokio::test]
    async fn injected_faults() {
        let store = MemoryStore::new();
        let repo = qn("alice/notes");
        store.put_file(&repo, "a.json", b"1".to_vec());

        store.inject_conflict("a.json");
        let outcome = store
            .write_file(
                &creds(),
                &repo,
                "a.json",
                FileWrite::replace(b"2".to_vec(), content_revision(b"1"), "u"),
            )
            .await
            .unwrap();
        assert!(outcome.is_conflict());

        store.inject_failure("a.json");
        assert!(matches!(
            store.read_file(&creds(), &repo, "a.json").await,
            Err(ContentStoreError::Api { status: 500, .. })
        ));

        store.clear_faults();
        assert!(store.read_file(&creds(), &repo, "a.json").await.is_ok());
    }

    #[tokio::test]
    async fn authenticated_login_ignores_claimed_login() {
        let store = MemoryStore::new();
        store.add_user("token", "alice");

        let claimed_bob = Credentials::new("token", "bob");
        assert_eq!(store.authenticated_login(&claimed_bob).await.unwrap(), "alice");
        assert!(matches!(
            store.authenticated_login(&Credentials::new("other", "alice")).await,
            Err(ContentStoreError::Api { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn removed_repository_is_gone() {
        let store = MemoryStore::new();
        let repo = qn("alice/old");
        store.add_repository("alice", "old");
        assert!(store.remove_repository(&repo));
        assert!(!store.repository_exists(&creds(), &repo).await.unwrap());
        assert!(store.list_repositories(&creds()).await.unwrap().is_empty());
    }
}
