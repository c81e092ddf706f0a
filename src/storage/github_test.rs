use super::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

// =============================================================================
// PURE HELPERS
// =============================================================================

#[test]
fn parse_repo_accepts_owner_slash_repo() {
    assert_eq!(parse_repo("acme/uis").unwrap(), ("acme".to_owned(), "uis".to_owned()));
    assert_eq!(parse_repo("  acme/uis  ").unwrap(), ("acme".to_owned(), "uis".to_owned()));
}

#[test]
fn parse_repo_strips_git_suffix() {
    assert_eq!(parse_repo("acme/uis.git").unwrap(), ("acme".to_owned(), "uis".to_owned()));
}

#[test]
fn parse_repo_rejects_urls_and_bad_shapes() {
    for bad in ["https://github.com/acme/uis", "github.com/acme/uis", "acme", "/uis", "acme/", "a/b/c", ""] {
        assert!(matches!(parse_repo(bad), Err(StorageError::Config(_))), "{bad} should be rejected");
    }
}

#[test]
fn decode_content_ignores_line_wrapping() {
    let encoded = STANDARD.encode(br#"{"schema":[{"type":"button","label":"Go"}]}"#);
    let (head, tail) = encoded.split_at(10);
    let wrapped = format!("{head}\n{tail}\n");
    let bytes = decode_content("x", &wrapped).unwrap();
    let record = decode_record("x", &bytes).unwrap();
    assert!(record.created_at.is_none());
}

#[test]
fn decode_content_rejects_garbage() {
    assert!(matches!(decode_content("x", "!!!"), Err(StorageError::Corrupt { .. })));
}

#[test]
fn schema_names_filters_listing() {
    let listing = json!([
        {"type": "file", "name": "signup.json"},
        {"type": "file", "name": "README.md"},
        {"type": "dir", "name": "nested.json"},
        {"type": "file", "name": "bad name.json"},
        {"type": "file", "name": "contact.json"}
    ]);
    assert_eq!(schema_names(&listing), vec!["signup".to_owned(), "contact".to_owned()]);
    assert!(schema_names(&json!({"type": "file"})).is_empty());
}

#[test]
fn file_path_lives_under_schema_dir() {
    assert_eq!(file_path("signup"), "schemas/signup.json");
}

// =============================================================================
// MOCK CONTENTS API
// =============================================================================

const TOKEN: &str = "test-token";

#[derive(Default)]
struct MockRepo {
    /// path -> (sha, base64 content)
    files: HashMap<String, (String, String)>,
    next_sha: u64,
    commits: Vec<String>,
}

type Shared = Arc<Mutex<MockRepo>>;

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {TOKEN}");
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(expected.as_str())
}

fn wrap_base64(content: &str) -> String {
    content.as_bytes().chunks(60).map(|c| String::from_utf8_lossy(c).into_owned()).collect::<Vec<_>>().join("\n")
}

async fn mock_get(
    State(repo): State<Shared>,
    headers: HeaderMap,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Bad credentials"})));
    }
    let repo = repo.lock().unwrap();
    if path == "schemas" {
        let entries: Vec<Value> = repo
            .files
            .keys()
            .filter_map(|p| p.strip_prefix("schemas/"))
            .map(|name| json!({"type": "file", "name": name}))
            .collect();
        if entries.is_empty() {
            return (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"})));
        }
        return (StatusCode::OK, Json(Value::Array(entries)));
    }
    match repo.files.get(&path) {
        Some((sha, content)) => {
            (StatusCode::OK, Json(json!({"type": "file", "sha": sha, "content": wrap_base64(content)})))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))),
    }
}

async fn mock_put(
    State(repo): State<Shared>,
    headers: HeaderMap,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Bad credentials"})));
    }
    let mut repo = repo.lock().unwrap();
    let sent_sha = body.get("sha").and_then(Value::as_str).map(str::to_owned);
    let current_sha = repo.files.get(&path).map(|(sha, _)| sha.clone());
    if sent_sha != current_sha {
        return (StatusCode::CONFLICT, Json(json!({"message": "sha mismatch"})));
    }
    repo.next_sha += 1;
    let sha = format!("sha{}", repo.next_sha);
    let content = body["content"].as_str().unwrap_or_default().to_owned();
    repo.files.insert(path, (sha, content));
    repo.commits.push(body["message"].as_str().unwrap_or_default().to_owned());
    let status = if current_sha.is_some() { StatusCode::OK } else { StatusCode::CREATED };
    (status, Json(json!({"content": {}})))
}

async fn mock_delete(
    State(repo): State<Shared>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut repo = repo.lock().unwrap();
    let Some((sha, _)) = repo.files.get(&path) else {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"})));
    };
    if body.get("sha").and_then(Value::as_str) != Some(sha.as_str()) {
        return (StatusCode::CONFLICT, Json(json!({"message": "sha mismatch"})));
    }
    repo.files.remove(&path);
    repo.commits.push(body["message"].as_str().unwrap_or_default().to_owned());
    (StatusCode::OK, Json(json!({"commit": {}})))
}

async fn spawn_mock() -> (String, Shared) {
    let shared = Shared::default();
    let app = Router::new()
        .route("/repos/{owner}/{repo}/contents/{*path}", get(mock_get).put(mock_put).delete(mock_delete))
        .with_state(shared.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), shared)
}

fn store_for(api_url: &str, token: &str) -> GitHubStore {
    GitHubStore::new(&GitHubConfig {
        token: token.to_owned(),
        repo: "acme/uis".to_owned(),
        branch: "main".to_owned(),
        api_url: api_url.to_owned(),
    })
    .unwrap()
}

fn seed(repo: &Shared, name: &str, record: &Value) {
    let mut repo = repo.lock().unwrap();
    repo.next_sha += 1;
    let sha = format!("seed{}", repo.next_sha);
    repo.files.insert(file_path(name), (sha, STANDARD.encode(record.to_string())));
}

fn schema() -> UiSchema {
    uischema::validate(&json!([{"type": "div", "header": "H", "children": [{"type": "input", "name": "firstName"}]}]))
        .unwrap()
}

// =============================================================================
// STORE AGAINST MOCK
// =============================================================================

#[tokio::test]
async fn save_then_get_round_trips() {
    let (url, repo) = spawn_mock().await;
    let store = store_for(&url, TOKEN);

    store.save("signup", &schema()).await.unwrap();
    let ui = store.get("signup").await.unwrap().unwrap();
    assert_eq!(ui.name, "signup");
    assert_eq!(ui.schema, schema());
    assert!(ui.created_at.is_some());
    assert_eq!(repo.lock().unwrap().commits, vec!["Create UI schema: signup".to_owned()]);
}

#[tokio::test]
async fn overwrite_updates_and_preserves_created_at() {
    let (url, repo) = spawn_mock().await;
    let store = store_for(&url, TOKEN);

    store.save("signup", &schema()).await.unwrap();
    let first = store.get("signup").await.unwrap().unwrap().created_at;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let replacement = uischema::validate(&json!([{"type": "button", "label": "Only"}])).unwrap();
    store.save("signup", &replacement).await.unwrap();

    let ui = store.get("signup").await.unwrap().unwrap();
    assert_eq!(ui.schema, replacement);
    assert_eq!(ui.created_at, first);
    assert_eq!(repo.lock().unwrap().commits.last().map(String::as_str), Some("Update UI schema: signup"));
}

#[tokio::test]
async fn get_missing_returns_none() {
    let (url, _repo) = spawn_mock().await;
    assert!(store_for(&url, TOKEN).get("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn list_orders_by_created_at_descending() {
    let (url, repo) = spawn_mock().await;
    let s = json!([{"type": "button", "label": "b"}]);
    seed(&repo, "older", &json!({"schema": s, "createdAt": "2024-01-01T00:00:00.000Z"}));
    seed(&repo, "newer", &json!({"schema": s, "createdAt": "2024-06-01T00:00:00.000Z"}));
    seed(&repo, "undated", &json!({"schema": s}));
    seed(&repo, "broken", &json!({"schema": []}));

    let entries = store_for(&url, TOKEN).list().await.unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["newer", "older", "broken", "undated"]);
    assert!(entries[2].created_at.is_none());
}

#[tokio::test]
async fn list_empty_repo_is_empty() {
    let (url, _repo) = spawn_mock().await;
    assert!(store_for(&url, TOKEN).list().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let (url, repo) = spawn_mock().await;
    let store = store_for(&url, TOKEN);
    store.save("signup", &schema()).await.unwrap();

    store.delete("signup").await.unwrap();
    assert!(store.get("signup").await.unwrap().is_none());
    assert_eq!(repo.lock().unwrap().commits.last().map(String::as_str), Some("Delete UI schema: signup"));
}

#[tokio::test]
async fn delete_missing_is_not_found() {
    let (url, _repo) = spawn_mock().await;
    let err = store_for(&url, TOKEN).delete("ghost").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(name) if name == "ghost"));
}

#[tokio::test]
async fn corrupt_record_surfaces_on_get() {
    let (url, repo) = spawn_mock().await;
    seed(&repo, "broken", &json!({"schema": [{"type": "input"}]}));
    let err = store_for(&url, TOKEN).get("broken").await.unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));
}

#[tokio::test]
async fn bad_credentials_surface_as_remote_error() {
    let (url, _repo) = spawn_mock().await;
    let err = store_for(&url, "wrong").get("signup").await.unwrap_err();
    assert!(matches!(err, StorageError::Remote { status: 401, .. }));
}

#[tokio::test]
async fn mode_is_github() {
    let (url, _repo) = spawn_mock().await;
    assert_eq!(store_for(&url, TOKEN).mode(), StorageMode::GitHub);
}
