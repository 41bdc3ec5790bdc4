//! # Repository Identity Newtypes
//!
//! `QualifiedName` identifies a repository as `owner/name`. `RevisionTag`
//! is the opaque content hash a store attaches to a file version.
//! Keeping them distinct from `String` prevents passing a path where a
//! revision is expected and vice versa.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Well-known name of the per-user repository that backs the config and
/// mapping documents.
pub const SERVICE_REPO_NAME: &str = "3db-service";

const MAX_REPO_NAME_LEN: usize = 100;
const RESERVED_NAMES: &[&str] = &["_", ".", ".."];

/// Validate a repository name against the hosting service's rules.
///
/// Alphanumerics, `-`, `_` and `.` only; 1..=100 characters; no leading
/// `.`/`-`; no trailing `.`; not a reserved name.
pub fn validate_repository_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.len() > MAX_REPO_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(ValidationError::Reserved(name.to_string()));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidCharacters);
    }
    if name.starts_with('.') || name.starts_with('-') {
        return Err(ValidationError::InvalidStart);
    }
    if name.ends_with('.') {
        return Err(ValidationError::InvalidEnd);
    }
    Ok(())
}

/// Repository identifier of the form `owner/name`.
///
/// Serializes as the plain `owner/name` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName {
    owner: String,
    name: String,
}

impl QualifiedName {
    /// Build a qualified name from its parts, validating both.
    pub fn new(owner: &str, name: &str) -> Result<Self, ValidationError> {
        let owner = owner.trim();
        if owner.is_empty() || owner.contains('/') || owner.chars().any(char::is_whitespace) {
            return Err(ValidationError::MalformedQualifiedName(format!(
                "{owner}/{name}"
            )));
        }
        validate_repository_name(name)?;
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Parse `owner/name`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let (owner, name) = raw
            .split_once('/')
            .ok_or_else(|| ValidationError::MalformedQualifiedName(raw.to_string()))?;
        if name.contains('/') {
            return Err(ValidationError::MalformedQualifiedName(raw.to_string()));
        }
        Self::new(owner, name)
    }

    /// The service entity name for a given login.
    pub fn service_entity(login: &str) -> Result<Self, ValidationError> {
        Self::new(login, SERVICE_REPO_NAME)
    }

    /// Repository owner (user or organization login).
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name without the owner.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive comparison against a raw `owner/name` string,
    /// matching how the hosting service resolves repository names.
    pub fn matches(&self, raw: &str) -> bool {
        raw.split_once('/').is_some_and(|(owner, name)| {
            owner.eq_ignore_ascii_case(&self.owner) && name.eq_ignore_ascii_case(&self.name)
        })
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl std::str::FromStr for QualifiedName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QualifiedName> for String {
    fn from(value: QualifiedName) -> Self {
        value.to_string()
    }
}

/// Opaque content hash identifying one version of a stored file.
///
/// A write that replaces existing content must present the tag it last
/// observed. A write without a tag means "create, fail if present".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionTag(String);

impl RevisionTag {
    /// Wrap a store-provided revision string.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The raw tag as sent to the store.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RevisionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
