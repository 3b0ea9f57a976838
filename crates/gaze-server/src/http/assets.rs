//! Static hosting for the browser experiment client.
//!
//! `ServeDir` handles exact files and directory `index.html`. Anything it
//! cannot find lands in [`spa_fallback`], which tries `<path>.html` and then
//! the root `index.html`. In front of both, [`guard`] refuses hidden files,
//! the local config file, `/api` paths, and methods other than `GET`/`HEAD`.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::handler::Handler;
use axum::http::header::{ALLOW, CACHE_CONTROL};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use gaze_config::LOCAL_CONFIG_FILE;
use gaze_core::SaveResponse;
use tower::{Layer, ServiceExt};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;

/// Root directory the client is served from.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    root: Arc<PathBuf>,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    /// `<root>/<path>.html`, if the request path is safe and the file exists.
    fn html_sibling(&self, uri_path: &str) -> Option<PathBuf> {
        let relative = sanitize(uri_path)?;
        let mut candidate = self.root.join(relative).into_os_string();
        candidate.push(".html");
        let candidate = PathBuf::from(candidate);
        candidate.is_file().then_some(candidate)
    }

    fn index(&self) -> PathBuf {
        self.root.join("index.html")
    }

    /// Install the static service as `router`'s fallback, with cache headers
    /// applied.
    pub fn mount(self, router: Router, max_age_secs: u64) -> Router {
        let cache = HeaderValue::from_str(&format!("public, max-age={max_age_secs}"))
            .unwrap_or_else(|_| HeaderValue::from_static("public, max-age=3600"));
        let dir = ServeDir::new(self.root.as_ref())
            .append_index_html_on_directories(true)
            .fallback(spa_fallback.with_state(self));
        let statics = SetResponseHeaderLayer::if_not_present(CACHE_CONTROL, cache).layer(dir);
        router.fallback_service(middleware::from_fn(guard).layer(statics))
    }
}

/// Relative path for a request path, or `None` if any component would leave
/// the root.
fn sanitize(uri_path: &str) -> Option<PathBuf> {
    let trimmed = uri_path.trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    let mut out = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(out)
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Dotfiles (`.env`, `.git/...`) and the local config file are never served.
/// A path that does not percent-decode to UTF-8 counts as hidden.
fn is_hidden(path: &str) -> bool {
    let Ok(decoded) = urlencoding::decode(path) else {
        return true;
    };
    decoded
        .split(['/', '\\'])
        .any(|segment| segment.starts_with('.') || segment.eq_ignore_ascii_case(LOCAL_CONFIG_FILE))
}

fn json_error(status: StatusCode, message: &str) -> Response {
    let mut response = (status, Json(SaveResponse::failed(message))).into_response();
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

async fn guard(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if is_api_path(path) || is_hidden(path) {
        return json_error(StatusCode::NOT_FOUND, "not found");
    }
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        let mut response = json_error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
        return response;
    }
    next.run(request).await
}

async fn spa_fallback(State(assets): State<StaticAssets>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    let file = assets.html_sibling(&path).unwrap_or_else(|| assets.index());
    match ServeFile::new(file).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
