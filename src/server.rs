//! HTTP API server.
//!
//! Exposes shelf scanning, stored books, recommendations, sessions, and
//! bookmarks as a JSON API for the browser UI.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/` | Banner message |
//! | `GET`    | `/health` | Health check (returns version) |
//! | `POST`   | `/api/session` | Create an anonymous session |
//! | `GET`    | `/api/session/{user_id}/scan` | Last scan made in a session |
//! | `POST`   | `/api/scan` | Scan a shelf image (multipart field `image`) |
//! | `GET`    | `/api/books` | List stored books (`?q=&limit=`) |
//! | `GET`    | `/api/books/{id}` | One stored book |
//! | `POST`   | `/api/recommend` | Recommend from a posted book list |
//! | `GET`    | `/api/bookmarks/{user_id}` | A user's bookmarks |
//! | `POST`   | `/api/bookmarks` | Save a bookmark |
//! | `DELETE` | `/api/bookmarks/{user_id}/{bookmark_id}` | Delete one bookmark |
//! | `DELETE` | `/api/bookmarks/{user_id}` | Delete all of a user's bookmarks |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "user_id must not be empty" } }
//! ```
//!
//! | Code | Status | When |
//! |------|--------|------|
//! | `bad_request` | 400 | Malformed input or missing `image` field |
//! | `not_found` | 404 | Unknown book, bookmark, or session scan |
//! | `payload_too_large` | 413 | Upload exceeds `server.max_upload_bytes` |
//! | `no_text` | 422 | OCR found no text in the image |
//! | `ocr_failed` | 502 | The OCR provider failed |
//! | `internal` | 500 | Storage failure |
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the UI can be served
//! from anywhere.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::models::{BookRecord, Bookmark, ScanResponse};
use crate::scan::{ScanError, Scanner};
use crate::services::Services;
use crate::session::SessionRegistry;
use crate::store::BookStore;

const DEFAULT_LIST_LIMIT: i64 = 50;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    scanner: Scanner,
    store: Arc<dyn BookStore>,
    sessions: Arc<SessionRegistry>,
    max_upload_bytes: usize,
}

/// Starts the HTTP server with production services.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let services = Services::from_config(config).await?;
    run_server_with_services(config, services).await
}

/// Starts the HTTP server with caller-supplied services.
pub async fn run_server_with_services(config: &Config, services: Services) -> anyhow::Result<()> {
    let app = build_router(config, services)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        bind = %config.server.bind,
        strategy = %config.recommend.strategy,
        "shelf scanner listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router with all routes and layers attached.
pub fn build_router(config: &Config, services: Services) -> anyhow::Result<Router> {
    let state = AppState {
        scanner: services.scanner(config)?,
        store: services.store.clone(),
        sessions: Arc::new(SessionRegistry::new(config.server.max_sessions)),
        max_upload_bytes: config.server.max_upload_bytes,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/api/session", post(handle_create_session))
        .route("/api/session/{user_id}/scan", get(handle_session_scan))
        .route("/api/scan", post(handle_scan))
        .route("/api/books", get(handle_list_books))
        .route("/api/books/{id}", get(handle_get_book))
        .route("/api/recommend", post(handle_recommend))
        .route("/api/bookmarks", post(handle_add_bookmark))
        .route(
            "/api/bookmarks/{user_id}",
            get(handle_list_bookmarks).delete(handle_clear_bookmarks),
        )
        .route(
            "/api/bookmarks/{user_id}/{bookmark_id}",
            delete(handle_delete_bookmark),
        )
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(cors)
        .with_state(state))
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn app_error(status: StatusCode, code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status,
        code: code.to_string(),
        message: message.into(),
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    app_error(StatusCode::BAD_REQUEST, "bad_request", message)
}

fn not_found(message: impl Into<String>) -> AppError {
    app_error(StatusCode::NOT_FOUND, "not_found", message)
}

/// Store failures are logged in full and reported generically.
fn internal(err: anyhow::Error) -> AppError {
    tracing::error!(error = %err, "request failed");
    app_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error")
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        let message = err.to_string();
        match err {
            ScanError::EmptyImage => bad_request(message),
            ScanError::NoText => app_error(StatusCode::UNPROCESSABLE_ENTITY, "no_text", message),
            ScanError::Ocr(_) => {
                tracing::warn!(error = %message, "scan failed");
                app_error(StatusCode::BAD_GATEWAY, "ocr_failed", message)
            }
            ScanError::Internal(e) => internal(e),
        }
    }
}

/// Multipart failures keep their status, so a body over the upload limit
/// is reported as 413 rather than a parse error.
fn multipart_error(err: MultipartError, max_upload_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return app_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            format!("image exceeds the upload limit of {} bytes", max_upload_bytes),
        );
    }
    bad_request(format!("invalid multipart body: {}", err.body_text()))
}

fn require_user_id(user_id: &str) -> Result<(), AppError> {
    if user_id.trim().is_empty() {
        return Err(bad_request("user_id must not be empty"));
    }
    Ok(())
}

// ============ GET / and GET /health ============

#[derive(Serialize)]
struct RootResponse {
    message: String,
}

async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "ShelfScanner API running".to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Handler for `GET /health`, used by load balancers and tests.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Sessions ============

#[derive(Serialize)]
struct SessionResponse {
    user_id: String,
}

async fn handle_create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(SessionResponse {
        user_id: state.sessions.create(),
    })
}

async fn handle_session_scan(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ScanResponse>, AppError> {
    state
        .sessions
        .last_scan(&user_id)
        .map(Json)
        .ok_or_else(|| not_found(format!("no scan recorded for session: {}", user_id)))
}

// ============ POST /api/scan ============

#[derive(Deserialize)]
struct ScanQuery {
    user_id: Option<String>,
}

/// Handler for `POST /api/scan`.
///
/// Reads the multipart field `image`, runs the scan pipeline, and, when a
/// `user_id` query parameter is given, remembers the result for that session.
async fn handle_scan(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
    mut multipart: Multipart,
) -> Result<Json<ScanResponse>, AppError> {
    let mut image = None;
    let limit = state.max_upload_bytes;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() == Some("image") {
            let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
            image = Some(bytes);
            break;
        }
    }
    let image = image.ok_or_else(|| bad_request("missing multipart field: image"))?;

    let response = state.scanner.scan(&image).await?;

    if let Some(user_id) = query.user_id.filter(|u| !u.trim().is_empty()) {
        state.sessions.record_scan(&user_id, response.clone());
    }

    Ok(Json(response))
}

// ============ Books ============

#[derive(Deserialize)]
struct ListBooksQuery {
    q: Option<String>,
    limit: Option<i64>,
}

#[derive(Serialize)]
struct BooksResponse {
    books: Vec<BookRecord>,
}

async fn handle_list_books(
    State(state): State<AppState>,
    Query(query): Query<ListBooksQuery>,
) -> Result<Json<BooksResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit < 1 {
        return Err(bad_request("limit must be >= 1"));
    }
    let books = state
        .store
        .list_books(query.q.as_deref(), limit)
        .await
        .map_err(internal)?;
    Ok(Json(BooksResponse { books }))
}

async fn handle_get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookRecord>, AppError> {
    state
        .store
        .get_book(&id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found(format!("book not found: {}", id)))
}

// ============ POST /api/recommend ============

#[derive(Deserialize)]
struct RecommendRequest {
    #[serde(default)]
    books: Vec<BookRecord>,
}

#[derive(Serialize)]
struct RecommendResponse {
    recommended: Vec<BookRecord>,
}

async fn handle_recommend(
    State(state): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> Json<RecommendResponse> {
    let recommended = state.scanner.recommender().recommend(&req.books).await;
    Json(RecommendResponse { recommended })
}

// ============ Bookmarks ============

#[derive(Deserialize)]
struct AddBookmarkRequest {
    user_id: String,
    book: BookRecord,
}

#[derive(Serialize)]
struct BookmarksResponse {
    bookmarks: Vec<Bookmark>,
}

#[derive(Serialize)]
struct DeletedResponse<T> {
    deleted: T,
}

async fn handle_add_bookmark(
    State(state): State<AppState>,
    Json(req): Json<AddBookmarkRequest>,
) -> Result<(StatusCode, Json<Bookmark>), AppError> {
    require_user_id(&req.user_id)?;
    let bookmark = state
        .store
        .add_bookmark(&req.user_id, &req.book)
        .await
        .map_err(internal)?;
    tracing::debug!(user_id = %req.user_id, bookmark_id = %bookmark.id, "bookmark added");
    Ok((StatusCode::CREATED, Json(bookmark)))
}

async fn handle_list_bookmarks(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<BookmarksResponse>, AppError> {
    require_user_id(&user_id)?;
    let bookmarks = state
        .store
        .list_bookmarks(&user_id)
        .await
        .map_err(internal)?;
    Ok(Json(BookmarksResponse { bookmarks }))
}

async fn handle_delete_bookmark(
    State(state): State<AppState>,
    Path((user_id, bookmark_id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse<bool>>, AppError> {
    require_user_id(&user_id)?;
    let deleted = state
        .store
        .delete_bookmark(&user_id, &bookmark_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(not_found(format!("bookmark not found: {}", bookmark_id)));
    }
    Ok(Json(DeletedResponse { deleted }))
}

async fn handle_clear_bookmarks(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DeletedResponse<u64>>, AppError> {
    require_user_id(&user_id)?;
    let deleted = state
        .store
        .clear_bookmarks(&user_id)
        .await
        .map_err(internal)?;
    Ok(Json(DeletedResponse { deleted }))
}
