//! # Config Store
//!
//! One `config.json` per user, kept in the user's service entity
//! (`<login>/3db-service`). The content store has no locks, so every
//! mutation is a compare-and-swap on the revision observed at read time.
//!
//! ## Conflict Policy
//!
//! | Path                                  | On `Conflict` / `AlreadyExisted`       |
//! |---------------------------------------|----------------------------------------|
//! | create service entity                 | look it up, continue as existing       |
//! | create default document               | success (another initializer won)      |
//! | write back reconciled document        | success (winner's write stands)        |
//! | `update` (replace or create)          | `StoreError::StaleWrite`               |
//!
//! Nothing retries. Reconciliation is idempotent given the same
//! repository existence facts, so the next `initialize` converges.

use std::sync::Arc;

use ghdb_core::{ConfigDocument, QualifiedName, RevisionTag, CONFIG_FILE, SERVICE_REPO_NAME};
use ghdb_github::{
    ContentStore, CreateOutcome, Credentials, FileWrite, Repository, WriteOutcome,
};

use crate::error::StoreError;

/// The repository backing a user's documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntity {
    pub name: QualifiedName,
    pub repository: Repository,
}

/// Config document persistence with self-healing initialization.
#[derive(Clone)]
pub struct ConfigStore {
    store: Arc<dyn ContentStore>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore").finish_non_exhaustive()
    }
}

impl ConfigStore {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// The underlying content store.
    pub fn content_store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Ensure the service entity and a reconciled config document exist.
    ///
    /// Idempotent: on a store that already holds a valid, reconciled
    /// document this performs reads only.
    #[tracing::instrument(skip_all, fields(login = creds.login()))]
    pub async fn initialize(&self, creds: &Credentials) -> Result<ServiceEntity, StoreError> {
        let service = QualifiedName::service_entity(creds.login())?;
        let (repository, fresh) = self.ensure_entity(creds, &service).await?;

        if fresh {
            self.write_default(creds, &service).await?;
        } else {
            match self.read_document(creds, &service).await? {
                None => self.write_default(creds, &service).await?,
                Some((document, revision)) => {
                    self.reconcile(creds, &service, document, revision).await?
                }
            }
        }

        Ok(ServiceEntity {
            name: service,
            repository,
        })
    }

    /// Read the config document.
    pub async fn read(&self, creds: &Credentials) -> Result<ConfigDocument, StoreError> {
        let service = QualifiedName::service_entity(creds.login())?;
        self.read_document(creds, &service)
            .await?
            .map(|(document, _)| document)
            .ok_or_else(|| StoreError::NotFound {
                what: format!("{service}/{CONFIG_FILE}"),
            })
    }

    /// Replace the config document.
    ///
    /// The self-reference is inserted at the front if the caller dropped
    /// it. A concurrent edit between our read and write surfaces as
    /// `StaleWrite`; a missing document is created. Returns the document
    /// as written.
    #[tracing::instrument(skip_all, fields(login = creds.login()))]
    pub async fn update(
        &self,
        creds: &Credentials,
        mut document: ConfigDocument,
    ) -> Result<ConfigDocument, StoreError> {
        let service = QualifiedName::service_entity(creds.login())?;
        for raw in &document.connected_repos {
            QualifiedName::parse(raw)?;
        }
        document.ensure_self_reference(&service);
        let body = document.to_pretty_json()?;

        let write = match self.store.read_file(creds, &service, CONFIG_FILE).await {
            Ok(current) => FileWrite::replace(body, current.revision, "Update service config"),
            Err(e) if e.is_not_found() => FileWrite::create(body, "Create service config"),
            Err(e) => return Err(e.into()),
        };

        match self.store.write_file(creds, &service, CONFIG_FILE, write).await {
            Ok(WriteOutcome::Conflict) => {
                tracing::warn!(repo = %service, "config update lost a race");
                Err(StoreError::StaleWrite {
                    path: format!("{service}/{CONFIG_FILE}"),
                })
            }
            Ok(_) => Ok(document),
            Err(e) if e.is_not_found() => Err(StoreError::NotFound {
                what: service.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// The caller's repositories that the document lists, service entity
    /// first. The service entity is included even if the document lost it.
    pub async fn connected_repositories(
        &self,
        creds: &Credentials,
        document: &ConfigDocument,
    ) -> Result<Vec<Repository>, StoreError> {
        let service = QualifiedName::service_entity(creds.login())?;
        let all = self.store.list_repositories(creds).await?;

        let is_service = |r: &Repository| service.matches(&r.full_name);
        let service_repo = all.iter().find(|r| is_service(r)).cloned();
        let mut connected: Vec<Repository> = all
            .into_iter()
            .filter(|r| !is_service(r))
            .filter(|r| {
                document
                    .connected_repos
                    .iter()
                    .any(|raw| raw.eq_ignore_ascii_case(&r.full_name))
            })
            .collect();
        if let Some(repo) = service_repo {
            connected.insert(0, repo);
        }
        Ok(connected)
    }

    /// Look up the service entity, creating it if absent. Returns whether
    /// this call created it.
    async fn ensure_entity(
        &self,
        creds: &Credentials,
        service: &QualifiedName,
    ) -> Result<(Repository, bool), StoreError> {
        if let Some(existing) = self.store.get_repository(creds, service).await? {
            return Ok((existing, false));
        }

        match self
            .store
            .create_repository(creds, SERVICE_REPO_NAME, true)
            .await?
        {
            CreateOutcome::Created(repo) => {
                tracing::info!(repo = %service, "created service entity");
                Ok((repo, true))
            }
            CreateOutcome::AlreadyExisted => {
                tracing::debug!(repo = %service, "service entity created concurrently");
                let repo = self
                    .store
                    .get_repository(creds, service)
                    .await?
                    .ok_or_else(|| StoreError::NotFound {
                        what: service.to_string(),
                    })?;
                Ok((repo, false))
            }
        }
    }

    /// Read and parse the document. `None` if the file is absent.
    async fn read_document(
        &self,
        creds: &Credentials,
        service: &QualifiedName,
    ) -> Result<Option<(ConfigDocument, RevisionTag)>, StoreError> {
        match self.store.read_file(creds, service, CONFIG_FILE).await {
            Ok(file) => {
                let document = ConfigDocument::from_slice(&file.content)?;
                Ok(Some((document, file.revision)))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create the initial document. `Conflict` means another initializer
    /// already wrote it.
    async fn write_default(
        &self,
        creds: &Credentials,
        service: &QualifiedName,
    ) -> Result<(), StoreError> {
        let body = ConfigDocument::initial(service).to_pretty_json()?;
        let outcome = self
            .store
            .write_file(
                creds,
                service,
                CONFIG_FILE,
                FileWrite::create(body, "Initialize service config"),
            )
            .await?;
        match outcome {
            WriteOutcome::Conflict => {
                tracing::debug!(repo = %service, "config created concurrently")
            }
            _ => tracing::info!(repo = %service, "created config document"),
        }
        Ok(())
    }

    /// Drop references that no longer resolve and restore the
    /// self-reference, writing back only if something changed.
    ///
    /// A name is dropped when it fails to parse, repeats an earlier entry,
    /// or the store positively reports the repository absent. Probe
    /// failures propagate.
    async fn reconcile(
        &self,
        creds: &Credentials,
        service: &QualifiedName,
        document: ConfigDocument,
        revision: RevisionTag,
    ) -> Result<(), StoreError> {
        let mut kept: Vec<String> = Vec::with_capacity(document.connected_repos.len());
        for raw in &document.connected_repos {
            let name = match QualifiedName::parse(raw) {
                Ok(name) => name,
                Err(e) => {
                    tracing::info!(entry = %raw, error = %e, "dropping malformed repository reference");
                    continue;
                }
            };
            if kept.iter().any(|k| name.matches(k)) {
                continue;
            }
            if !service.matches(raw) && !self.store.repository_exists(creds, &name).await? {
                tracing::info!(entry = %raw, "repository no longer exists, removing from config");
                continue;
            }
            kept.push(raw.clone());
        }

        let mut reconciled = ConfigDocument {
            connected_repos: kept,
            version: document.version.clone(),
        };
        reconciled.ensure_self_reference(service);
        if reconciled == document {
            return Ok(());
        }

        let body = reconciled.to_pretty_json()?;
        let outcome = self
            .store
            .write_file(
                creds,
                service,
                CONFIG_FILE,
                FileWrite::replace(body, revision, "Clean up invalid repositories"),
            )
            .await?;
        match outcome {
            WriteOutcome::Conflict => {
                tracing::info!(repo = %service, "reconciliation lost a race; keeping winner's document")
            }
            _ => tracing::info!(
                repo = %service,
                before = document.connected_repos.len(),
                after = reconciled.connected_repos.len(),
                "reconciled config document"
            ),
        }
        Ok(())
    }
}
