mod proxy;

use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use hotposts_gateway::GatewayClient;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::middleware::{request_id, REQUEST_ID_HEADER};

const BACKEND_ERROR: &str = "Backend error";

#[derive(Clone)]
pub struct AppState {
    pub gateway: GatewayClient,
}

/// Which error envelope a route answers with when the upstream call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Envelope {
    /// `{"error": "..."}`
    Read,
    /// `{"success": false, "error": "..."}`
    Action,
}

/// Fixed HTTP 500 body returned when the backend cannot be reached or
/// answers with something that is not JSON.
#[derive(Debug, Serialize)]
pub struct BackendError {
    #[serde(skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    error: &'static str,
}

impl BackendError {
    pub(crate) fn new(envelope: Envelope) -> Self {
        Self {
            success: match envelope {
                Envelope::Read => None,
                Envelope::Action => Some(false),
            },
            error: BACKEND_ERROR,
        }
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
}

fn proxy_router() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(proxy::list_posts))
        .route("/api/posts/stats", get(proxy::post_stats))
        .route("/api/posts/categories", get(proxy::post_categories))
        .route("/api/posts/{post_id}", get(proxy::get_post))
        .route("/api/keywords/trending", get(proxy::trending_keywords))
        .route("/api/crawler/run", post(proxy::run_crawler))
}

pub fn build_app(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(proxy_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                )),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(HealthData { status: "ok" })
}
