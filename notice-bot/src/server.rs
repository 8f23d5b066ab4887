// HTTP boundary for the Kakao skill server.
//
// Deliberately thin: handlers decode the webhook body, hand off to the
// dispatcher, and return its payload as JSON. All behavior lives behind the
// dispatcher; nothing here can fail a request.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::kakao::Payload;

// ---------------------------------------------------------------------------
// Request decoding
// ---------------------------------------------------------------------------

/// The slice of a Kakao webhook request this server reads. Every field
/// defaults so a sparse body decodes to empty parameters — the dispatcher
/// turns those into nudge replies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KakaoRequest {
    #[serde(default, rename = "userRequest")]
    pub user_request: UserRequest,
    #[serde(default)]
    pub action: Action,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub user: KakaoUser,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KakaoUser {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub params: Params,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Params {
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default, rename = "cate")]
    pub category: Option<String>,
    #[serde(default, rename = "sys_text")]
    pub keyword: Option<String>,
}

impl KakaoRequest {
    fn user_id(&self) -> &str {
        &self.user_request.user.id
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/ask", post(ask))
        .route("/ask/filter", post(ask_filter))
        .route("/search", post(search))
        .route("/last", post(last))
        .route("/message", post(message))
        .route("/schedule", post(schedule))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

/// Bind and serve until the process exits.
pub async fn serve(dispatcher: Arc<Dispatcher>, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("listening on 0.0.0.0:{port}");
    axum::serve(listener, router(dispatcher)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "Welcome, the server is running well."
}

async fn ask(State(dispatcher): State<Arc<Dispatcher>>) -> Json<Payload> {
    Json(dispatcher.ask_category())
}

async fn ask_filter(
    State(dispatcher): State<Arc<Dispatcher>>,
    Json(request): Json<KakaoRequest>,
) -> Json<Payload> {
    let category = request.action.params.category.as_deref().unwrap_or("");
    Json(
        dispatcher
            .category_notices(request.user_id(), category)
            .await,
    )
}

async fn search(
    State(dispatcher): State<Arc<Dispatcher>>,
    Json(request): Json<KakaoRequest>,
) -> Json<Payload> {
    let keyword = request.action.params.keyword.as_deref();
    Json(dispatcher.search_notices(request.user_id(), keyword).await)
}

async fn last(
    State(dispatcher): State<Arc<Dispatcher>>,
    Json(request): Json<KakaoRequest>,
) -> Json<Payload> {
    Json(dispatcher.latest(request.user_id()).await)
}

async fn message(
    State(dispatcher): State<Arc<Dispatcher>>,
    Json(request): Json<KakaoRequest>,
) -> Json<Payload> {
    let when = request.action.params.when.as_deref().unwrap_or("today");
    Json(dispatcher.day_notices(request.user_id(), when).await)
}

async fn schedule(
    State(dispatcher): State<Arc<Dispatcher>>,
    Json(request): Json<KakaoRequest>,
) -> Json<Payload> {
    Json(dispatcher.schedule(request.user_id()))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
