//! # Mapping Store
//!
//! Advisory index of issued file-link tokens, kept as `url-mappings.json`
//! in a namespace's service entity. The index is never needed to resolve
//! a token: tokens decode with the key alone. Persisting metadata is
//! therefore best effort, and `add_mapping` fails only if the cipher does.

use std::sync::Arc;

use chrono::Utc;
use ghdb_core::{MappingDocument, MappingEntry, QualifiedName, RevisionTag, MAPPINGS_FILE};
use ghdb_crypto::{TokenCipher, TokenError};
use ghdb_github::{ContentStore, Credentials, FileWrite, WriteOutcome};

use crate::error::StoreError;

/// How `add_mapping` obtains a token for a URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenPolicy {
    /// Mint a fresh token on every call. Repeated links to one file yield
    /// distinct, independently valid tokens.
    #[default]
    AlwaysMint,
    /// Return the token already recorded for the identical URL when the
    /// index can be read and the token still decodes under the current
    /// key. Otherwise mint.
    ReuseByUrl,
}

/// A file to issue a link for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMapping {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub sha: String,
    pub download_url: String,
}

/// Token index persistence.
#[derive(Clone)]
pub struct MappingStore {
    store: Arc<dyn ContentStore>,
    policy: TokenPolicy,
}

impl std::fmt::Debug for MappingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingStore")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl MappingStore {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            policy: TokenPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TokenPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> TokenPolicy {
        self.policy
    }

    /// Every recorded token for `namespace`. Empty if the index (or the
    /// service entity) does not exist.
    pub async fn get_all(
        &self,
        creds: &Credentials,
        namespace: &str,
    ) -> Result<MappingDocument, StoreError> {
        let service = QualifiedName::service_entity(namespace)?;
        Ok(self.read_index(creds, &service).await?.0)
    }

    /// Recorded metadata for one token.
    pub async fn get_mapping(
        &self,
        creds: &Credentials,
        namespace: &str,
        token: &str,
    ) -> Result<Option<MappingEntry>, StoreError> {
        Ok(self.get_all(creds, namespace).await?.get(token).cloned())
    }

    /// Issue a token for `mapping.download_url` and record it.
    ///
    /// Recording failures, conflicts included, are logged and swallowed:
    /// the returned token decodes regardless.
    #[tracing::instrument(skip_all, fields(namespace = %namespace, repo = %mapping.repo, path = %mapping.path))]
    pub async fn add_mapping(
        &self,
        creds: &Credentials,
        namespace: &str,
        mapping: NewMapping,
        cipher: &TokenCipher,
    ) -> Result<String, TokenError> {
        let token = match self.reusable_token(creds, namespace, &mapping, cipher).await {
            Some(token) => token,
            None => cipher.encode(&mapping.download_url)?,
        };

        if let Err(e) = self.record(creds, namespace, &token, mapping).await {
            tracing::warn!(error = %e, "failed to save mapping metadata");
        }
        Ok(token)
    }

    async fn reusable_token(
        &self,
        creds: &Credentials,
        namespace: &str,
        mapping: &NewMapping,
        cipher: &TokenCipher,
    ) -> Option<String> {
        if self.policy != TokenPolicy::ReuseByUrl {
            return None;
        }
        let index = match self.get_all(creds, namespace).await {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(error = %e, "mapping index unreadable; minting a new token");
                return None;
            }
        };
        let token = index.token_for_url(&mapping.download_url)?;
        match cipher.decode(token) {
            Ok(url) if url == mapping.download_url => Some(token.to_string()),
            _ => None,
        }
    }

    /// Read-modify-write of the index under its captured revision.
    async fn record(
        &self,
        creds: &Credentials,
        namespace: &str,
        token: &str,
        mapping: NewMapping,
    ) -> Result<(), StoreError> {
        let service = QualifiedName::service_entity(namespace)?;
        let (mut index, revision) = self.read_index(creds, &service).await?;

        index.upsert(
            token,
            MappingEntry {
                owner: mapping.owner,
                repo: mapping.repo,
                path: mapping.path,
                sha: mapping.sha,
                download_url: mapping.download_url,
                created: Utc::now(),
            },
        );
        let body = index.to_pretty_json()?;
        let write = match revision {
            Some(revision) => FileWrite::replace(body, revision, "Update URL mappings"),
            None => FileWrite::create(body, "Update URL mappings"),
        };

        match self
            .store
            .write_file(creds, &service, MAPPINGS_FILE, write)
            .await?
        {
            WriteOutcome::Conflict => Err(StoreError::StaleWrite {
                path: format!("{service}/{MAPPINGS_FILE}"),
            }),
            _ => {
                tracing::debug!(entries = index.len(), "saved mapping metadata");
                Ok(())
            }
        }
    }

    async fn read_index(
        &self,
        creds: &Credentials,
        service: &QualifiedName,
    ) -> Result<(MappingDocument, Option<RevisionTag>), StoreError> {
        match self.store.read_file(creds, service, MAPPINGS_FILE).await {
            Ok(file) => Ok((MappingDocument::from_slice(&file.content)?, Some(file.revision))),
            Err(e) if e.is_not_found() => Ok((MappingDocument::default(), None)),
            Err(e) => Err(e.into()),
        }
    }
}
