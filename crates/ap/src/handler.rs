//! axum handlers for the ActivityPub surface.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use ccbridge_federation::RawApObj;

use crate::service::ApService;

/// Shared state of the AP handlers.
#[derive(Clone)]
pub struct ApState {
    pub service: ApService,
}

/// Routes under `/.well-known`.
pub fn well_known_router(state: ApState) -> Router {
    Router::new()
        .route("/.well-known/host-meta", get(host_meta))
        .route("/.well-known/webfinger", get(webfinger))
        .route("/.well-known/nodeinfo", get(nodeinfo_well_known))
        .with_state(state)
}

/// Routes under `/ap`.
pub fn ap_router(state: ApState) -> Router {
    Router::new()
        .route("/nodeinfo/2.0", get(nodeinfo))
        .route("/acct/{id}", get(user))
        .route("/acct/{id}/inbox", post(acct_inbox))
        .route("/note/{id}", get(note))
        .route("/inbox", post(shared_inbox))
        .with_state(state)
}

/// Whether the Accept header asks for an AP document.
fn accepts_activity_json(headers: &HeaderMap) -> bool {
    headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| {
            accept.split(',').any(|part| {
                let media_type = part.split(';').next().unwrap_or("").trim();
                media_type == "application/activity+json" || media_type == "application/ld+json"
            })
        })
}

async fn host_meta(State(state): State<ApState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "application/xrd+xml")],
        state.service.host_meta(),
    )
}

#[derive(Debug, Deserialize)]
struct WebfingerQuery {
    resource: String,
}

async fn webfinger(
    State(state): State<ApState>,
    Query(query): Query<WebfingerQuery>,
) -> Response {
    match state.service.web_finger(&query.resource).await {
        Ok(result) => (
            StatusCode::OK,
            [("Content-Type", "application/jrd+json")],
            Json(result),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn nodeinfo_well_known(State(state): State<ApState>) -> impl IntoResponse {
    Json(state.service.node_info_well_known())
}

async fn nodeinfo(State(state): State<ApState>) -> impl IntoResponse {
    Json(state.service.node_info())
}

async fn user(
    State(state): State<ApState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !accepts_activity_json(&headers) {
        return match state.service.user_web_url(&id).await {
            Ok(url) => (StatusCode::FOUND, [("Location", url)]).into_response(),
            Err(_) => (StatusCode::NOT_FOUND, "entity not found").into_response(),
        };
    }

    match state.service.user(&id).await {
        Ok(actor) => (
            StatusCode::OK,
            [("Content-Type", "application/activity+json")],
            Json(actor),
        )
            .into_response(),
        Err(e) => {
            warn!(id = %id, error = %e, "actor lookup failed");
            (StatusCode::NOT_FOUND, "entity not found").into_response()
        }
    }
}

async fn note(
    State(state): State<ApState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !accepts_activity_json(&headers) {
        return match state.service.note_web_url(&id).await {
            Ok(url) => (StatusCode::FOUND, [("Location", url)]).into_response(),
            Err(_) => (StatusCode::NOT_FOUND, "note not found").into_response(),
        };
    }

    match state.service.note(&id).await {
        Ok(note) => (
            StatusCode::OK,
            [("Content-Type", "application/activity+json")],
            Json(note),
        )
            .into_response(),
        Err(e) => {
            warn!(id = %id, error = %e, "note lookup failed");
            (StatusCode::NOT_FOUND, "note not found").into_response()
        }
    }
}

async fn shared_inbox(
    State(state): State<ApState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle_inbox(state, None, uri.path(), &headers, &body).await
}

async fn acct_inbox(
    State(state): State<ApState>,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle_inbox(state, Some(id), uri.path(), &headers, &body).await
}

/// Shared inbox plumbing.
///
/// Post-verification failures still answer 200: AP servers retry
/// aggressively on anything else and a retry would not change the outcome.
async fn handle_inbox(
    state: ApState,
    inbox_id: Option<String>,
    path: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    let object = match RawApObj::from_slice(body) {
        Ok(object) => object,
        Err(e) => {
            warn!(error = %e, "invalid inbox body");
            return (StatusCode::BAD_REQUEST, "invalid request body").into_response();
        }
    };

    let header_map: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect();

    if let Err(e) = state
        .service
        .inbox(&object, inbox_id.as_deref(), path, &header_map)
        .await
    {
        warn!(error = %e, "inbox processing failed");
    }

    (
        StatusCode::OK,
        [("Content-Type", "application/activity+json")],
        Json(json!({})),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_activity_json() {
        let mut headers = HeaderMap::new();
        headers.insert("accept", "application/activity+json".parse().unwrap());
        assert!(accepts_activity_json(&headers));

        headers.insert(
            "accept",
            "application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\""
                .parse()
                .unwrap(),
        );
        assert!(accepts_activity_json(&headers));

        headers.insert("accept", "text/html,application/xhtml+xml".parse().unwrap());
        assert!(!accepts_activity_json(&headers));

        assert!(!accepts_activity_json(&HeaderMap::new()));
    }
}
