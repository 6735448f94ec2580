use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use reqwest::Method;

use crate::middleware::RequestId;

use super::{AppState, BackendError, Envelope};

pub(super) async fn list_posts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    RawQuery(query): RawQuery,
) -> Result<Response, BackendError> {
    relay(
        &state,
        &req_id,
        Method::GET,
        "api/posts",
        query.as_deref(),
        Envelope::Read,
    )
    .await
}

pub(super) async fn post_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, BackendError> {
    relay(
        &state,
        &req_id,
        Method::GET,
        "api/posts/stats",
        None,
        Envelope::Read,
    )
    .await
}

pub(super) async fn post_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, BackendError> {
    relay(
        &state,
        &req_id,
        Method::GET,
        "api/posts/categories",
        None,
        Envelope::Read,
    )
    .await
}

pub(super) async fn get_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(post_id): Path<String>,
) -> Result<Response, BackendError> {
    if !is_valid_post_id(&post_id) {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "invalid post id" })),
        )
            .into_response());
    }

    relay(
        &state,
        &req_id,
        Method::GET,
        &format!("api/posts/{post_id}"),
        None,
        Envelope::Read,
    )
    .await
}

pub(super) async fn trending_keywords(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    RawQuery(query): RawQuery,
) -> Result<Response, BackendError> {
    relay(
        &state,
        &req_id,
        Method::GET,
        "api/keywords/trending",
        query.as_deref(),
        Envelope::Read,
    )
    .await
}

pub(super) async fn run_crawler(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    RawQuery(query): RawQuery,
) -> Result<Response, BackendError> {
    relay(
        &state,
        &req_id,
        Method::POST,
        "api/crawler/run",
        query.as_deref(),
        Envelope::Action,
    )
    .await
}

/// Forwards one call upstream and mirrors its status and JSON body.
async fn relay(
    state: &AppState,
    req_id: &RequestId,
    method: Method,
    path: &str,
    query: Option<&str>,
    envelope: Envelope,
) -> Result<Response, BackendError> {
    match state.gateway.forward(method, path, query).await {
        Ok(upstream) => {
            let status = StatusCode::from_u16(upstream.status.as_u16())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            Ok((status, Json(upstream.body)).into_response())
        }
        Err(e) => {
            tracing::error!(
                request_id = %req_id.0,
                path,
                error = %e,
                "upstream call failed"
            );
            Err(BackendError::new(envelope))
        }
    }
}

/// Board post ids are plain tokens; anything that could rewrite the
/// upstream path is refused.
fn is_valid_post_id(post_id: &str) -> bool {
    !post_id.is_empty()
        && post_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
