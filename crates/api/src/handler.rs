//! axum handlers for the administrative API.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ccbridge_common::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::Requester;
use crate::service::ApiService;

/// Shared state of the administrative handlers.
#[derive(Clone)]
pub struct ApiState {
    pub service: ApiService,
}

/// Routes under `/ap/api`.
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/entity", get(get_entity).post(create_entity))
        .route("/entity/{ccid}", get(get_entity_by_ccid))
        .route("/follow/{id}", post(follow_handler).delete(unfollow_handler))
        .route("/resolve/{id}", get(resolve))
        .route("/stats", get(stats))
        .route("/entities/aliases", post(update_aliases))
        .route("/import", get(import_note))
        .route("/settings", get(get_settings).post(update_settings))
        .with_state(state)
}

fn ok<T: Serialize>(content: T) -> Response {
    Json(json!({"status": "ok", "content": content})).into_response()
}

#[derive(Debug, Deserialize)]
struct EntityQuery {
    ccid: Option<String>,
    id: Option<String>,
}

async fn get_entity(
    State(state): State<ApiState>,
    Requester(requester): Requester,
    Query(query): Query<EntityQuery>,
) -> Response {
    let result = if let Some(ccid) = query.ccid {
        state.service.entity_by_ccid(&ccid).await
    } else if let Some(id) = query.id {
        state.service.entity_by_id(&id).await
    } else {
        state.service.entity_by_ccid(&requester).await
    };

    match result {
        Ok(entity) => ok(entity),
        Err(e) => e.into_response(),
    }
}

async fn get_entity_by_ccid(
    State(state): State<ApiState>,
    _requester: Requester,
    Path(ccid): Path<String>,
) -> Response {
    match state.service.entity_by_ccid(&ccid).await {
        Ok(entity) => ok(entity),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct CreateEntityRequest {
    id: String,
}

async fn create_entity(
    State(state): State<ApiState>,
    Requester(requester): Requester,
    Json(request): Json<CreateEntityRequest>,
) -> Response {
    match state.service.create_entity(&requester, &request.id).await {
        Ok(entity) => ok(entity),
        Err(e) => e.into_response(),
    }
}

/// Normalize a follow target to the `@user@host` form.
fn normalize_handle(id: &str) -> String {
    if id.starts_with('@') {
        id.to_string()
    } else {
        format!("@{id}")
    }
}

async fn follow_handler(
    State(state): State<ApiState>,
    Requester(requester): Requester,
    Path(id): Path<String>,
) -> Response {
    match state.service.follow(&requester, &normalize_handle(&id)).await {
        Ok(follow) => ok(follow),
        Err(e) => e.into_response(),
    }
}

async fn unfollow_handler(
    State(state): State<ApiState>,
    Requester(requester): Requester,
    Path(id): Path<String>,
) -> Response {
    match state
        .service
        .unfollow(&requester, &normalize_handle(&id))
        .await
    {
        Ok(follow) => ok(follow),
        Err(e) => e.into_response(),
    }
}

async fn resolve(
    State(state): State<ApiState>,
    Requester(requester): Requester,
    Path(id): Path<String>,
) -> Response {
    match state.service.resolve_person(&requester, &id).await {
        Ok(person) => ok(person.data()),
        Err(e) => e.into_response(),
    }
}

async fn stats(State(state): State<ApiState>, Requester(requester): Requester) -> Response {
    match state.service.stats(&requester).await {
        Ok(stats) => ok(stats),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct UpdateAliasesRequest {
    aliases: Vec<String>,
}

async fn update_aliases(
    State(state): State<ApiState>,
    Requester(requester): Requester,
    Json(request): Json<UpdateAliasesRequest>,
) -> Response {
    match state
        .service
        .update_aliases(&requester, &request.aliases)
        .await
    {
        Ok(entity) => ok(entity),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct ImportQuery {
    note: Option<String>,
}

async fn import_note(
    State(state): State<ApiState>,
    Requester(requester): Requester,
    Query(query): Query<ImportQuery>,
) -> Response {
    let Some(note) = query.note.filter(|n| !n.is_empty()) else {
        return AppError::BadRequest("note query parameter required".to_string()).into_response();
    };

    match state.service.import_note(&requester, &note).await {
        Ok(message) => ok(message),
        Err(e) => e.into_response(),
    }
}

async fn get_settings(State(state): State<ApiState>, Requester(requester): Requester) -> Response {
    match state.service.settings(&requester).await {
        Ok(settings) => ok(settings),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSettingsRequest {
    #[serde(default)]
    listen_timelines: Vec<String>,
}

async fn update_settings(
    State(state): State<ApiState>,
    Requester(requester): Requester,
    Json(request): Json<UpdateSettingsRequest>,
) -> Response {
    match state
        .service
        .update_settings(&requester, &request.listen_timelines)
        .await
    {
        Ok(settings) => ok(settings),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("user@host"), "@user@host");
        assert_eq!(normalize_handle("@user@host"), "@user@host");
    }
}
