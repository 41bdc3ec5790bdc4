//! Mapping store behavior against the in-memory content store.

use std::sync::Arc;

use ghdb_core::{MappingDocument, QualifiedName, MAPPINGS_FILE};
use ghdb_crypto::TokenCipher;
use ghdb_github::{Credentials, MemoryStore};
use ghdb_store::{MappingStore, NewMapping, StoreError, TokenPolicy};

const README: &str = "https://raw.githubusercontent.com/acme/docs/main/readme.md";

fn creds() -> Credentials {
    Credentials::new("token", "alice")
}

fn service() -> QualifiedName {
    QualifiedName::service_entity("alice").unwrap()
}

fn readme() -> NewMapping {
    NewMapping {
        owner: "acme".into(),
        repo: "docs".into(),
        path: "readme.md".into(),
        sha: "abc123".into(),
        download_url: README.into(),
    }
}

fn setup(policy: TokenPolicy) -> (MemoryStore, MappingStore) {
    let memory = MemoryStore::new();
    memory.add_repository("alice", "3db-service");
    let store = MappingStore::new(Arc::new(memory.clone())).with_policy(policy);
    (memory, store)
}

fn stored_index(memory: &MemoryStore) -> MappingDocument {
    MappingDocument::from_slice(&memory.file(&service(), MAPPINGS_FILE).unwrap()).unwrap()
}

#[tokio::test]
async fn add_mapping_records_metadata_and_token_decodes() {
    let (memory, store) = setup(TokenPolicy::AlwaysMint);
    let cipher = TokenCipher::new("secret");

    let token = store
        .add_mapping(&creds(), "alice", readme(), &cipher)
        .await
        .unwrap();

    assert_eq!(cipher.decode(&token).unwrap(), README);
    let entry = stored_index(&memory).get(&token).cloned().unwrap();
    assert_eq!(entry.owner, "acme");
    assert_eq!(entry.repo, "docs");
    assert_eq!(entry.sha, "abc123");
    assert_eq!(entry.download_url, README);

    let fetched = store.get_mapping(&creds(), "alice", &token).await.unwrap();
    assert_eq!(fetched, Some(entry));
}

#[tokio::test]
async fn always_mint_issues_distinct_tokens_for_same_url() {
    let (memory, store) = setup(TokenPolicy::AlwaysMint);
    let cipher = TokenCipher::new("secret");

    let first = store
        .add_mapping(&creds(), "alice", readme(), &cipher)
        .await
        .unwrap();
    let second = store
        .add_mapping(&creds(), "alice", readme(), &cipher)
        .await
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(cipher.decode(&first).unwrap(), README);
    assert_eq!(cipher.decode(&second).unwrap(), README);
    assert_eq!(stored_index(&memory).len(), 2);
}

#[tokio::test]
async fn reuse_by_url_returns_prior_token_and_keeps_created() {
    let (memory, store) = setup(TokenPolicy::ReuseByUrl);
    let cipher = TokenCipher::new("secret");

    let first = store
        .add_mapping(&creds(), "alice", readme(), &cipher)
        .await
        .unwrap();
    let created = stored_index(&memory).get(&first).unwrap().created;

    let mut updated = readme();
    updated.sha = "def456".into();
    let second = store
        .add_mapping(&creds(), "alice", updated, &cipher)
        .await
        .unwrap();

    assert_eq!(first, second);
    let index = stored_index(&memory);
    assert_eq!(index.len(), 1);
    let entry = index.get(&first).unwrap();
    assert_eq!(entry.created, created);
    assert_eq!(entry.sha, "def456");
}

#[tokio::test]
async fn reuse_by_url_mints_when_recorded_token_no_longer_decodes() {
    let (_memory, store) = setup(TokenPolicy::ReuseByUrl);

    let old = store
        .add_mapping(&creds(), "alice", readme(), &TokenCipher::new("old-key"))
        .await
        .unwrap();
    let rotated = TokenCipher::new("new-key");
    let fresh = store
        .add_mapping(&creds(), "alice", readme(), &rotated)
        .await
        .unwrap();

    assert_ne!(old, fresh);
    assert_eq!(rotated.decode(&fresh).unwrap(), README);
}

#[tokio::test]
async fn add_mapping_survives_persistence_conflict() {
    let (memory, store) = setup(TokenPolicy::AlwaysMint);
    memory.inject_conflict(MAPPINGS_FILE);
    let cipher = TokenCipher::new("secret");

    let token = store
        .add_mapping(&creds(), "alice", readme(), &cipher)
        .await
        .unwrap();

    assert_eq!(cipher.decode(&token).unwrap(), README);
    assert!(memory.file(&service(), MAPPINGS_FILE).is_none());
}

#[tokio::test]
async fn add_mapping_survives_store_failure_and_missing_entity() {
    let (memory, store) = setup(TokenPolicy::ReuseByUrl);
    memory.inject_failure(MAPPINGS_FILE);
    let cipher = TokenCipher::new("secret");

    let token = store
        .add_mapping(&creds(), "alice", readme(), &cipher)
        .await
        .unwrap();
    assert_eq!(cipher.decode(&token).unwrap(), README);

    let token = store
        .add_mapping(&creds(), "nobody", readme(), &cipher)
        .await
        .unwrap();
    assert_eq!(cipher.decode(&token).unwrap(), README);
}

#[tokio::test]
async fn add_mapping_survives_corrupt_index() {
    let (memory, store) = setup(TokenPolicy::AlwaysMint);
    memory.put_file(&service(), MAPPINGS_FILE, b"[]".to_vec());
    let cipher = TokenCipher::new("secret");

    let token = store
        .add_mapping(&creds(), "alice", readme(), &cipher)
        .await
        .unwrap();

    assert_eq!(cipher.decode(&token).unwrap(), README);
    assert_eq!(memory.file(&service(), MAPPINGS_FILE).unwrap(), b"[]");
}

#[tokio::test]
async fn get_all_is_empty_when_index_absent_or_blank() {
    let (memory, store) = setup(TokenPolicy::AlwaysMint);
    assert!(store.get_all(&creds(), "alice").await.unwrap().is_empty());
    assert!(store.get_all(&creds(), "nobody").await.unwrap().is_empty());

    memory.put_file(&service(), MAPPINGS_FILE, Vec::new());
    assert!(store.get_all(&creds(), "alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn get_all_surfaces_corrupt_index_and_store_failures() {
    let (memory, store) = setup(TokenPolicy::AlwaysMint);
    memory.put_file(&service(), MAPPINGS_FILE, b"{oops".to_vec());
    assert!(matches!(
        store.get_all(&creds(), "alice").await,
        Err(StoreError::CorruptDocument(_))
    ));

    memory.inject_failure(MAPPINGS_FILE);
    assert!(matches!(
        store.get_all(&creds(), "alice").await,
        Err(StoreError::Store(_))
    ));
}

#[tokio::test]
async fn get_mapping_for_unknown_token_is_none() {
    let (_memory, store) = setup(TokenPolicy::AlwaysMint);
    assert_eq!(
        store.get_mapping(&creds(), "alice", "missing").await.unwrap(),
        None
    );
}
