use std::net::SocketAddr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, StatusCode};
use gaze_core::{HealthResponse, IdentityQuery, RequestMeta, SaveResponse};
use gaze_db::LogStore;
use serde_json::Value;

use super::AppState;
use super::client::{client_ip, user_agent};

/// `POST /save`
///
/// An empty or unparseable body is ingested as an empty submission.
pub async fn save<S: LogStore>(
    State(state): State<AppState<S>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<SaveResponse>) {
    let value = parse_body(&body);
    let query = match query {
        Ok(Query(pairs)) => IdentityQuery::from_pairs(pairs),
        Err(e) => {
            tracing::warn!(error = %e, "unreadable query string; identity taken from body only");
            IdentityQuery::default()
        }
    };
    let meta = RequestMeta {
        user_agent: user_agent(&headers),
        ip: client_ip(
            &headers,
            connect_info.map(|ConnectInfo(addr)| addr),
            state.trust_forwarded_for,
        ),
    };

    let response = state.ingest.ingest(value, &query, meta).await;
    let status = if response.ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(response))
}

fn parse_body(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        tracing::warn!("empty submission body; ingesting as empty");
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::warn!(error = %e, bytes = body.len(), "unparseable submission body; ingesting as empty");
        Value::Null
    })
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::now())
}

pub async fn not_found() -> (StatusCode, Json<SaveResponse>) {
    (StatusCode::NOT_FOUND, Json(SaveResponse::failed("not found")))
}
