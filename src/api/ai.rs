use axum::{extract::State, Json};

use crate::{
    error::Failure,
    generate::{
        course::{self, CourseRequest, CourseResponse},
        feedback::{self, FeedbackRequest, FeedbackResponse},
        recommendations::{self, RecommendationRequest, RecommendationResponse},
        roadmap::{self, RoadmapRequest, RoadmapResponse},
        tutor::{self, TutorRequest, TutorResponse},
        validation::{self, ValidationRequest, ValidationResponse},
    },
};

use super::SharedState;

#[axum::debug_handler]
pub async fn generate_course(
    state: State<SharedState>,
    Json(body): Json<CourseRequest>,
) -> Result<Json<CourseResponse>, Failure> {
    course::generate(state.inference(), &body)
        .await
        .map(Json)
        .map_err(|e| e.with_message("Failed to generate course content"))
}

#[axum::debug_handler]
pub async fn recommendations(
    state: State<SharedState>,
    Json(body): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, Failure> {
    recommendations::generate(state.inference(), &body)
        .await
        .map(Json)
        .map_err(|e| e.with_message("Failed to generate recommendations"))
}

#[axum::debug_handler]
pub async fn validate_answer(
    state: State<SharedState>,
    Json(body): Json<ValidationRequest>,
) -> Result<Json<ValidationResponse>, Failure> {
    validation::validate(state.inference(), &body)
        .await
        .map(Json)
        .map_err(|e| e.with_message("Failed to validate answer"))
}

#[axum::debug_handler]
pub async fn adaptive_feedback(
    state: State<SharedState>,
    Json(body): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, Failure> {
    feedback::generate(state.inference(), &body)
        .await
        .map(Json)
        .map_err(|e| e.with_message("Failed to generate adaptive feedback"))
}

#[axum::debug_handler]
pub async fn roadmap_content(
    state: State<SharedState>,
    Json(body): Json<RoadmapRequest>,
) -> Result<Json<RoadmapResponse>, Failure> {
    roadmap::generate(state.inference(), &body)
        .await
        .map(Json)
        .map_err(|e| e.with_message("Failed to generate roadmap content"))
}

#[axum::debug_handler]
pub async fn tutor_chat(
    state: State<SharedState>,
    Json(body): Json<TutorRequest>,
) -> Result<Json<TutorResponse>, Failure> {
    tutor::reply(state.inference(), &body)
        .await
        .map(Json)
        .map_err(|e| e.with_message("Failed to get tutor response"))
}
