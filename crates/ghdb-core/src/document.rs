//! # Persisted Document Schemas
//!
//! The two JSON files ghdb keeps in the service entity:
//!
//! ```text
//! config.json        {"connectedRepos": ["owner/name", ...], "version": 1}
//! url-mappings.json  {"<token>": {"owner", "repo", "path", "sha", "download_url", "created"}}
//! ```
//!
//! Both are parsed strictly: a file whose shape does not match is a
//! [`DocumentError`], never silently replaced with a default. Individual
//! `connectedRepos` entries stay raw strings so that one bad entry can be
//! pruned by reconciliation instead of poisoning the whole document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::identity::QualifiedName;

/// Path of the config document inside the service entity.
pub const CONFIG_FILE: &str = "config.json";

/// Path of the mapping document inside the service entity.
pub const MAPPINGS_FILE: &str = "url-mappings.json";

/// Schema version of a config document. Older writers stored a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaVersion {
    /// Integer version (current writers).
    Number(u64),
    /// Free-form version label.
    Label(String),
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::Number(1)
    }
}

/// The per-user config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Qualified names (`owner/name`) of connected repositories, in order.
    #[serde(rename = "connectedRepos")]
    pub connected_repos: Vec<String>,
    /// Schema version.
    pub version: SchemaVersion,
}

impl ConfigDocument {
    /// The document written on first initialization: the service entity
    /// references itself so the store never orphans its own repository.
    pub fn initial(service: &QualifiedName) -> Self {
        Self {
            connected_repos: vec![service.to_string()],
            version: SchemaVersion::default(),
        }
    }

    /// Parse stored bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        serde_json::from_slice(bytes).map_err(|source| DocumentError::Schema {
            document: CONFIG_FILE,
            source,
        })
    }

    /// Render as 2-space indented JSON, the stored form.
    pub fn to_pretty_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|source| DocumentError::Serialize {
            document: CONFIG_FILE,
            source,
        })
    }

    /// Whether `name` is listed (case-insensitive).
    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.connected_repos.iter().any(|raw| name.matches(raw))
    }

    /// Insert `service` at the front unless already present.
    ///
    /// Returns `true` if the list changed.
    pub fn ensure_self_reference(&mut self, service: &QualifiedName) -> bool {
        if self.contains(service) {
            return false;
        }
        self.connected_repos.insert(0, service.to_string());
        true
    }
}

/// Metadata recorded for one issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Owner of the repository holding the file.
    pub owner: String,
    /// Repository holding the file.
    pub repo: String,
    /// Path of the file inside the repository.
    pub path: String,
    /// Content revision of the file when the link was issued.
    pub sha: String,
    /// Target URL the token decodes to.
    pub download_url: String,
    /// First time this token key was recorded.
    pub created: DateTime<Utc>,
}

/// Advisory index of issued tokens, keyed by token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingDocument(BTreeMap<String, MappingEntry>);

impl MappingDocument {
    /// Parse stored bytes. An empty file is an empty document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes).map_err(|source| DocumentError::Schema {
            document: MAPPINGS_FILE,
            source,
        })
    }

    /// Render as 2-space indented JSON.
    pub fn to_pretty_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|source| DocumentError::Serialize {
            document: MAPPINGS_FILE,
            source,
        })
    }

    /// Entry for a token.
    pub fn get(&self, token: &str) -> Option<&MappingEntry> {
        self.0.get(token)
    }

    /// Insert or overwrite the entry for `token`. If the key already
    /// exists its `created` timestamp is kept.
    pub fn upsert(&mut self, token: &str, mut entry: MappingEntry) {
        if let Some(existing) = self.0.get(token) {
            entry.created = existing.created;
        }
        self.0.insert(token.to_string(), entry);
    }

    /// Token of the first entry whose target URL is exactly `url`.
    pub fn token_for_url(&self, url: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, entry)| entry.download_url == url)
            .map(|(token, _)| token.as_str())
    }

    /// Number of recorded tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no tokens are recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MappingEntry)> {
        self.0.iter()
    }
}
