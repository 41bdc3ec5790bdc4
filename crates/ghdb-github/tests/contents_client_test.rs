//! Contract tests for the contents endpoints of `GithubClient`.
//!
//! | Method | Path                                   | Test            |
//! |--------|----------------------------------------|-----------------|
//! | GET    | `/repos/{owner}/{repo}/contents/{path}`| `read_*`        |
//! | PUT    | `/repos/{owner}/{repo}/contents/{path}`| `write_*`       |
//! | DELETE | `/repos/{owner}/{repo}/contents/{path}`| `delete_*`      |

use ghdb_core::{QualifiedName, RevisionTag};
use ghdb_github::{
    ContentStore, ContentStoreError, Credentials, DeleteOutcome, FileWrite, GithubClient,
    GithubConfig, WriteOutcome,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONFIG_PATH: &str = "/repos/alice/3db-service/contents/config.json";

/// Build a GithubClient pointed at a wiremock server.
async fn test_client(mock_server: &MockServer) -> GithubClient {
    GithubClient::new(GithubConfig::local_mock(&mock_server.uri()).unwrap()).unwrap()
}

fn creds() -> Credentials {
    Credentials::new("test-token", "alice").with_email("alice@example.com")
}

fn service() -> QualifiedName {
    QualifiedName::service_entity("alice").unwrap()
}

// ── GET contents ─────────────────────────────────────────────────────

#[tokio::test]
async fn read_sends_auth_headers_and_decodes_content() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONFIG_PATH))
        .and(header("authorization", "token test-token"))
        .and(header("accept", "application/vnd.github.v3+json"))
        .and(header("user-agent", "ghdb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "file",
            "encoding": "base64",
            "name": "config.json",
            "path": "config.json",
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
            // `{"a":1}` wrapped the way the API wraps long content
            "content": "eyJh\nIjox\nfQ==\n",
            "download_url": "https://raw.githubusercontent.com/alice/3db-service/main/config.json"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let file = client
        .read_file(&creds(), &service(), "config.json")
        .await
        .unwrap();

    assert_eq!(file.content, br#"{"a":1}"#);
    assert_eq!(
        file.revision,
        RevisionTag::new("3d21ec53a331a6f037a91c368710b99387d012c1")
    );
    assert!(file.download_url.unwrap().ends_with("/config.json"));
}

#[tokio::test]
async fn read_maps_404_to_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONFIG_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "Not Found"
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let err = client
        .read_file(&creds(), &service(), "config.json")
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn read_of_directory_is_not_a_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/alice/3db-service/contents/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"type": "file", "name": "a.md", "sha": "x"}
        ])))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let err = client
        .read_file(&creds(), &service(), "docs")
        .await
        .unwrap_err();
    assert!(matches!(err, ContentStoreError::NotAFile { .. }), "got {err:?}");
}

#[tokio::test]
async fn read_maps_exhausted_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONFIG_PATH))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "1700000000")
                .set_body_json(serde_json::json!({"message": "API rate limit exceeded"})),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let err = client
        .read_file(&creds(), &service(), "config.json")
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ContentStoreError::RateLimited {
                reset_at: Some(1_700_000_000),
                ..
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn read_keeps_plain_403_as_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONFIG_PATH))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "4999")
                .set_body_string("Resource not accessible by integration"),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let err = client
        .read_file(&creds(), &service(), "config.json")
        .await
        .unwrap_err();
    assert!(
        matches!(err, ContentStoreError::Api { status: 403, .. }),
        "got {err:?}"
    );
}

// ── PUT contents ─────────────────────────────────────────────────────

#[tokio::test]
async fn write_create_sends_base64_and_committer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONFIG_PATH))
        .and(body_partial_json(serde_json::json!({
            "message": "Create service config",
            "content": "eyJhIjoxfQ==",
            "committer": {"name": "db3 service", "email": "alice@example.com"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "content": {"sha": "newsha", "path": "config.json"},
            "commit": {"sha": "commitsha"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let outcome = client
        .write_file(
            &creds(),
            &service(),
            "config.json",
            FileWrite::create(br#"{"a":1}"#.to_vec(), "Create service config"),
        )
        .await
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Created(RevisionTag::new("newsha")));
}

#[tokio::test]
async fn write_replace_sends_sha_and_reports_replaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONFIG_PATH))
        .and(body_partial_json(serde_json::json!({"sha": "oldsha"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": {"sha": "newsha"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let outcome = client
        .write_file(
            &creds(),
            &service(),
            "config.json",
            FileWrite::replace(b"{}".to_vec(), RevisionTag::new("oldsha"), "Update"),
        )
        .await
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Replaced(RevisionTag::new("newsha")));
}

#[tokio::test]
async fn write_with_stale_sha_is_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONFIG_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "message": "config.json does not match oldsha"
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let outcome = client
        .write_file(
            &creds(),
            &service(),
            "config.json",
            FileWrite::replace(b"{}".to_vec(), RevisionTag::new("oldsha"), "Update"),
        )
        .await
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Conflict);
}

#[tokio::test]
async fn write_without_sha_over_existing_file_is_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONFIG_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "message": "Invalid request.\n\n\"sha\" wasn't supplied."
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let outcome = client
        .write_file(
            &creds(),
            &service(),
            "config.json",
            FileWrite::create(b"{}".to_vec(), "Create"),
        )
        .await
        .unwrap();
    assert!(outcome.is_conflict());
}

#[tokio::test]
async fn write_422_with_sha_stays_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONFIG_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad request"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let err = client
        .write_file(
            &creds(),
            &service(),
            "config.json",
            FileWrite::replace(b"{}".to_vec(), RevisionTag::new("s"), "Update"),
        )
        .await
        .unwrap_err();
    assert!(
        matches!(err, ContentStoreError::Api { status: 422, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn write_to_missing_repository_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(CONFIG_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let err = client
        .write_file(
            &creds(),
            &service(),
            "config.json",
            FileWrite::create(b"{}".to_vec(), "Create"),
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

// ── DELETE contents ──────────────────────────────────────────────────

#[tokio::test]
async fn delete_sends_sha_and_maps_outcomes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(CONFIG_PATH))
        .and(body_partial_json(serde_json::json!({"sha": "current"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": null,
            "commit": {"sha": "c"}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(CONFIG_PATH))
        .and(body_partial_json(serde_json::json!({"sha": "stale"})))
        .respond_with(ResponseTemplate::new(409))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server).await;
    let deleted = client
        .delete_file(
            &creds(),
            &service(),
            "config.json",
            &RevisionTag::new("current"),
            "Delete",
        )
        .await
        .unwrap();
    assert_eq!(deleted, DeleteOutcome::Deleted);

    let conflict = client
        .delete_file(
            &creds(),
            &service(),
            "config.json",
            &RevisionTag::new("stale"),
            "Delete",
        )
        .await
        .unwrap();
    assert_eq!(conflict, DeleteOutcome::Conflict);
}
