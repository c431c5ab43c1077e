//! HTTP API tests against an in-process server.
//!
//! OCR and the book catalog are replaced by stubs so the full scan flow
//! (multipart upload → titles → lookups → storage → recommendations) runs
//! without any third-party service.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use shelf_scanner::catalog::BookCatalog;
use shelf_scanner::config::Config;
use shelf_scanner::models::BookRecord;
use shelf_scanner::ocr::TextRecognizer;
use shelf_scanner::server::run_server_with_services;
use shelf_scanner::services::Services;
use shelf_scanner::store::InMemoryStore;
use std::sync::Arc;

// ─── Stubs ──────────────────────────────────────────────────────────

/// Treats the uploaded bytes as UTF-8 text, so each test controls the
/// "recognized" shelf by what it uploads. `FAIL` simulates a provider error.
struct EchoRecognizer;

#[async_trait]
impl TextRecognizer for EchoRecognizer {
    fn name(&self) -> &str {
        "echo"
    }

    async fn recognize(&self, image: &[u8]) -> Result<String> {
        let text = String::from_utf8_lossy(image).to_string();
        if text == "FAIL" {
            bail!("vision quota exceeded");
        }
        Ok(text)
    }
}

struct ShelfCatalog;

fn book(title: &str, authors: &[&str], categories: &[&str]) -> BookRecord {
    BookRecord {
        id: None,
        title: Some(title.to_string()),
        authors: Some(authors.iter().map(|a| a.to_string()).collect()),
        thumbnail: Some(format!("http://books.example/{}.jpg", title.len())),
        categories: Some(categories.iter().map(|c| c.to_string()).collect()),
        description: None,
    }
}

#[async_trait]
impl BookCatalog for ShelfCatalog {
    async fn lookup(&self, title: &str) -> Result<Option<BookRecord>> {
        Ok(match title {
            "Dune" => Some(book("Dune", &["Frank Herbert"], &["Fiction"])),
            "Emma" => Some(book("Emma", &["Jane Austen"], &["Fiction", "Romance"])),
            "A Brief History of Time" => Some(book(
                "A Brief History of Time",
                &["Stephen Hawking"],
                &["Science"],
            )),
            _ => None,
        })
    }

    async fn search_subject(&self, subject: &str, _max: usize) -> Result<Vec<BookRecord>> {
        Ok(vec![book(&format!("More {}", subject), &["Someone"], &[subject])])
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn test_config(port: u16, strategy: &str) -> Config {
    let config_content = format!(
        r#"
[db]
path = "/unused/shelf.sqlite"

[server]
bind = "127.0.0.1:{}"

[ocr]
provider = "disabled"

[recommend]
strategy = "{}"
limit = 5
"#,
        port, strategy
    );
    toml::from_str(&config_content).unwrap()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

/// Start a server with stub providers; returns its base URL.
async fn start_server(strategy: &str) -> String {
    start_server_with(strategy, |_| {}).await
}

async fn start_server_with(strategy: &str, adjust: impl FnOnce(&mut Config)) -> String {
    let port = find_free_port();
    let mut cfg = test_config(port, strategy);
    adjust(&mut cfg);
    let services = Services {
        recognizer: Arc::new(EchoRecognizer),
        catalog: Arc::new(ShelfCatalog),
        store: Arc::new(InMemoryStore::new()),
    };
    tokio::spawn(async move {
        run_server_with_services(&cfg, services).await.unwrap();
    });
    wait_for_server(port).await;
    format!("http://127.0.0.1:{}", port)
}

async fn scan(base: &str, shelf_text: &str, user_id: Option<&str>) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(shelf_text.as_bytes().to_vec())
        .file_name("shelf.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("image", part);
    let url = match user_id {
        Some(u) => format!("{}/api/scan?user_id={}", base, u),
        None => format!("{}/api/scan", base),
    };
    reqwest::Client::new()
        .post(url)
        .multipart(form)
        .send()
        .await
        .unwrap()
}

fn titles(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_root_and_health() {
    let base = start_server("local").await;

    let body: Value = reqwest::get(format!("{}/", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["message"].as_str().unwrap().contains("ShelfScanner"));

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_scan_returns_titles_books_and_recommendations() {
    let base = start_server("local").await;

    let resp = scan(
        &base,
        "Dune\nPRH\nEmma\nA Brief History of Time\nNot A Real Book\n",
        None,
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(
        body["extracted_titles"],
        json!(["Dune", "Emma", "A Brief History of Time", "Not A Real Book"])
    );
    assert_eq!(
        titles(&body["books_found"]),
        vec!["Dune", "Emma", "A Brief History of Time"]
    );
    for b in body["books_found"].as_array().unwrap() {
        assert!(b["id"].is_string(), "stored books carry ids: {}", b);
    }
    assert_eq!(titles(&body["recommended"]), vec!["Dune", "Emma"]);

    // Scanned books are searchable afterwards
    let listed: Value = reqwest::get(format!("{}/api/books?q=dune", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(titles(&listed["books"]), vec!["Dune"]);

    let id = body["books_found"][0]["id"].as_str().unwrap();
    let one: Value = reqwest::get(format!("{}/api/books/{}", base, id))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(one["title"], "Dune");
}

#[tokio::test]
async fn test_scan_remote_strategy() {
    let base = start_server("remote").await;
    let body: Value = scan(&base, "Dune\nEmma\n", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(titles(&body["recommended"]), vec!["More Fiction"]);
}

#[tokio::test]
async fn test_scan_without_matches_has_empty_lists() {
    let base = start_server("local").await;
    let body: Value = scan(&base, "Nothing Here\n", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["books_found"], json!([]));
    assert_eq!(body["recommended"], json!([]));
}

#[tokio::test]
async fn test_scan_blank_text_is_no_text() {
    let base = start_server("local").await;
    let resp = scan(&base, "   \n  ", None).await;
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "no_text");
}

#[tokio::test]
async fn test_scan_ocr_failure_is_bad_gateway() {
    let base = start_server("local").await;
    let resp = scan(&base, "FAIL", None).await;
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "ocr_failed");
}

#[tokio::test]
async fn test_scan_missing_image_field() {
    let base = start_server("local").await;
    let form = reqwest::multipart::Form::new().text("other", "value");
    let resp = reqwest::Client::new()
        .post(format!("{}/api/scan", base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_scan_oversized_upload_is_payload_too_large() {
    let base = start_server_with("local", |cfg| cfg.server.max_upload_bytes = 1024).await;

    let resp = scan(&base, &"Dune\n".repeat(2048), None).await;
    assert_eq!(resp.status(), 413);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "payload_too_large");
    assert!(body["error"]["message"].as_str().unwrap().contains("1024"));

    // Uploads under the limit still scan
    let resp = scan(&base, "Dune\n", None).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_session_remembers_last_scan() {
    let base = start_server("local").await;
    let client = reqwest::Client::new();

    let session: Value = client
        .post(format!("{}/api/session", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let user_id = session["user_id"].as_str().unwrap().to_string();
    assert!(user_id.starts_with("user_"));

    let resp = client
        .get(format!("{}/api/session/{}/scan", base, user_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    scan(&base, "Dune\n", Some(&user_id)).await;
    let last: Value = client
        .get(format!("{}/api/session/{}/scan", base, user_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(last["extracted_titles"], json!(["Dune"]));
}

#[tokio::test]
async fn test_recommend_endpoint() {
    let base = start_server("local").await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/api/recommend", base))
        .json(&json!({
            "books": [
                { "title": "One", "categories": ["History"] },
                { "title": "Two", "categories": ["Science"] },
                { "title": "Three", "categories": ["Science", "History"] },
                { "title": "Four" }
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(titles(&body["recommended"]), vec!["One", "Three"]);

    let empty: Value = client
        .post(format!("{}/api/recommend", base))
        .json(&json!({ "books": [] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(empty["recommended"], json!([]));
}

#[tokio::test]
async fn test_bookmark_crud() {
    let base = start_server("local").await;
    let client = reqwest::Client::new();

    let add = |title: &'static str, user: &'static str| {
        let client = client.clone();
        let base = base.clone();
        async move {
            client
                .post(format!("{}/api/bookmarks", base))
                .json(&json!({
                    "user_id": user,
                    "book": { "title": title, "authors": ["A. Author"], "categories": ["Fiction"] }
                }))
                .send()
                .await
                .unwrap()
        }
    };

    let resp = add("Dune", "user_a").await;
    assert_eq!(resp.status(), 201);
    let first: Value = resp.json().await.unwrap();
    assert_eq!(first["user_id"], "user_a");
    assert_eq!(first["title"], "Dune");
    let first_id = first["id"].as_str().unwrap().to_string();

    add("Emma", "user_a").await;
    add("Ulysses", "user_b").await;

    let listed: Value = client
        .get(format!("{}/api/bookmarks/user_a", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(titles(&listed["bookmarks"]), vec!["Dune", "Emma"]);

    // Deleting through another user's path fails
    let resp = client
        .delete(format!("{}/api/bookmarks/user_b/{}", base, first_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .delete(format!("{}/api/bookmarks/user_a/{}", base, first_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["deleted"], true);

    let cleared: Value = client
        .delete(format!("{}/api/bookmarks/user_a", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared["deleted"], 1);

    let other: Value = client
        .get(format!("{}/api/bookmarks/user_b", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(titles(&other["bookmarks"]), vec!["Ulysses"]);
}

#[tokio::test]
async fn test_bookmark_requires_user_id() {
    let base = start_server("local").await;
    let resp = reqwest::Client::new()
        .post(format!("{}/api/bookmarks", base))
        .json(&json!({ "user_id": "  ", "book": { "title": "Dune" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
