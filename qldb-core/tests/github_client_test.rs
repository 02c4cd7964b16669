//! GitHub client tests against a wiremock server.

use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use qldb_core::{GitHubClient, QldbError, RepoId};

fn repo() -> RepoId {
    RepoId::parse("octo/hello").unwrap()
}

fn client_for(server: &MockServer) -> GitHubClient {
    GitHubClient::with_base_url(server.uri(), None).unwrap()
}

#[tokio::test]
async fn lists_available_databases() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/code-scanning/codeql/databases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": 1,
                "name": "python-database",
                "language": "python",
                "url": "https://api.github.com/repos/octo/hello/code-scanning/codeql/databases/python",
                "created_at": "2023-05-01T12:00:00Z"
            },
            {
                "id": 2,
                "name": "javascript-database",
                "language": "javascript"
            }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let databases = client.list_databases(&repo()).await.unwrap();

    let languages: Vec<&str> = databases.iter().map(|d| d.language.as_str()).collect();
    assert_eq!(languages, vec!["python", "javascript"]);
}

#[tokio::test]
async fn downloads_archive_bytes_with_zip_accept_header() {
    let server = MockServer::start().await;
    let body = b"PK\x03\x04fake zip bytes".to_vec();

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/code-scanning/codeql/databases/python"))
        .and(header("accept", "application/zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let bytes = client.download_database(&repo(), "python").await.unwrap();
    assert_eq!(bytes, body);
}

#[tokio::test]
async fn resolves_commit_fingerprints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/commits/11112222"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sha": "1111222233334444555566667777888899990000",
            "commit": {
                "committer": {
                    "name": "Octo Cat",
                    "date": "2023-05-01T12:34:56Z"
                }
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let info = client.commit_info(&repo(), "11112222").await.unwrap();

    assert_eq!(info.sha, "1111222233334444555566667777888899990000");
    assert_eq!(info.committed_date.to_rfc3339(), "2023-05-01T12:34:56+00:00");
}

#[tokio::test]
async fn non_success_status_is_an_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/code-scanning/codeql/databases"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.list_databases(&repo()).await;

    match result {
        Err(QldbError::Api { status, url }) => {
            assert_eq!(status.as_u16(), 404);
            assert!(url.contains("/repos/octo/hello/code-scanning/codeql/databases"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
