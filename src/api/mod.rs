//! HTTP surface: router, shared state, and the owner extractor.

pub mod ai;
pub mod records;

use std::{path::Path, sync::Arc};

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post, put},
    Router,
};
use sqlx::types::Uuid;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{error::ApiError, inference::ChatClient, store::Store};

/// Set by the fronting auth layer; every record route is scoped to it.
pub const OWNER_HEADER: &str = "x-owner-id";

pub struct AppState {
    pub store: Store,
    pub inference: Option<Arc<dyn ChatClient>>,
}

impl AppState {
    pub fn new(store: Store, inference: Option<Arc<dyn ChatClient>>) -> Self {
        Self { store, inference }
    }

    pub fn inference(&self) -> Option<&dyn ChatClient> {
        self.inference.as_deref()
    }
}

pub type SharedState = Arc<AppState>;

/// The requesting user, read from [`OWNER_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub Uuid);

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(Owner)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Open cross-origin allowance; preflight requests are answered by the layer.
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn router(state: SharedState, static_dir: &str) -> Router {
    let index = Path::new(static_dir).join("index.html");
    Router::new()
        .route("/api/generate-course", post(ai::generate_course))
        .route("/api/recommendations", post(ai::recommendations))
        .route("/api/validate-answer", post(ai::validate_answer))
        .route("/api/adaptive-feedback", post(ai::adaptive_feedback))
        .route("/api/roadmap-content", post(ai::roadmap_content))
        .route("/api/tutor-chat", post(ai::tutor_chat))
        .route("/api/courses", get(records::list_courses).post(records::create_course))
        .route("/api/courses/{id}", get(records::get_course).delete(records::delete_course))
        .route("/api/courses/{id}/folder", put(records::move_course))
        .route(
            "/api/courses/{id}/quiz-scores",
            get(records::list_quiz_scores).post(records::record_quiz_score),
        )
        .route(
            "/api/courses/{id}/tutor-chats",
            get(records::list_tutor_chats).post(records::save_tutor_chat),
        )
        .route("/api/lessons/{id}/completion", put(records::set_lesson_completion))
        .route("/api/folders", get(records::list_folders).post(records::create_folder))
        .route(
            "/api/folders/{id}",
            put(records::update_folder).delete(records::delete_folder),
        )
        .fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index)))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
