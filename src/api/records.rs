use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::ApiError,
    generate::course::normalize,
    models::{
        Course, CourseContent, CourseSummary, CourseTree, Folder, NewCourse, NewFolder,
        NewQuizScore, QuizScore, TutorChat,
    },
    store::LessonProgress,
};

use super::{Owner, SharedState};

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    #[serde(flatten)]
    pub course: NewCourse,
    #[serde(rename = "courseContent", alias = "course_content")]
    pub course_content: CourseContent,
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct MoveCourseRequest {
    #[serde(default)]
    pub folder_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ChatTurnRequest {
    pub message: String,
    pub response: String,
}

#[axum::debug_handler]
pub async fn list_courses(
    state: State<SharedState>,
    Owner(owner): Owner,
) -> Result<Json<Vec<CourseSummary>>, ApiError> {
    Ok(Json(state.store.list_courses(owner).await?))
}

/// Saves a generated tree. The tree is normalized the same way fresh completions are.
#[axum::debug_handler]
pub async fn create_course(
    state: State<SharedState>,
    Owner(owner): Owner,
    Json(body): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseTree>), ApiError> {
    let content = normalize(body.course_content);
    let tree = state.store.create_course(owner, &body.course, &content).await?;
    Ok((StatusCode::CREATED, Json(tree)))
}

#[axum::debug_handler]
pub async fn get_course(
    state: State<SharedState>,
    Owner(owner): Owner,
    Path(id): Path<i32>,
) -> Result<Json<CourseTree>, ApiError> {
    state
        .store
        .course_tree(owner, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("course"))
}

#[axum::debug_handler]
pub async fn delete_course(
    state: State<SharedState>,
    Owner(owner): Owner,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete_course(owner, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("course"))
    }
}

#[axum::debug_handler]
pub async fn move_course(
    state: State<SharedState>,
    Owner(owner): Owner,
    Path(id): Path<i32>,
    Json(body): Json<MoveCourseRequest>,
) -> Result<Json<Course>, ApiError> {
    state
        .store
        .move_course(owner, id, body.folder_id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("course or folder"))
}

#[axum::debug_handler]
pub async fn set_lesson_completion(
    state: State<SharedState>,
    Owner(owner): Owner,
    Path(id): Path<i32>,
    Json(body): Json<CompletionRequest>,
) -> Result<Json<LessonProgress>, ApiError> {
    let progress = state
        .store
        .set_lesson_completed(owner, id, body.completed)
        .await?
        .ok_or(ApiError::NotFound("lesson"))?;
    info!(lesson_id = id, progress = progress.progress, "lesson completion saved");
    Ok(Json(progress))
}

#[axum::debug_handler]
pub async fn record_quiz_score(
    state: State<SharedState>,
    Owner(owner): Owner,
    Path(id): Path<i32>,
    Json(body): Json<NewQuizScore>,
) -> Result<(StatusCode, Json<QuizScore>), ApiError> {
    let score = state
        .store
        .record_quiz_score(owner, id, &body)
        .await?
        .ok_or(ApiError::NotFound("course or lesson"))?;
    Ok((StatusCode::CREATED, Json(score)))
}

#[axum::debug_handler]
pub async fn list_quiz_scores(
    state: State<SharedState>,
    Owner(owner): Owner,
    Path(id): Path<i32>,
) -> Result<Json<Vec<QuizScore>>, ApiError> {
    Ok(Json(state.store.quiz_scores(owner, id).await?))
}

#[axum::debug_handler]
pub async fn save_tutor_chat(
    state: State<SharedState>,
    Owner(owner): Owner,
    Path(id): Path<i32>,
    Json(body): Json<ChatTurnRequest>,
) -> Result<(StatusCode, Json<TutorChat>), ApiError> {
    let chat = state
        .store
        .save_tutor_chat(owner, id, &body.message, &body.response)
        .await?
        .ok_or(ApiError::NotFound("course"))?;
    Ok((StatusCode::CREATED, Json(chat)))
}

#[axum::debug_handler]
pub async fn list_tutor_chats(
    state: State<SharedState>,
    Owner(owner): Owner,
    Path(id): Path<i32>,
) -> Result<Json<Vec<TutorChat>>, ApiError> {
    Ok(Json(state.store.tutor_chats(owner, id).await?))
}

#[axum::debug_handler]
pub async fn list_folders(
    state: State<SharedState>,
    Owner(owner): Owner,
) -> Result<Json<Vec<Folder>>, ApiError> {
    Ok(Json(state.store.folders(owner).await?))
}

#[axum::debug_handler]
pub async fn create_folder(
    state: State<SharedState>,
    Owner(owner): Owner,
    Json(body): Json<NewFolder>,
) -> Result<(StatusCode, Json<Folder>), ApiError> {
    let folder = state.store.create_folder(owner, &body).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

#[axum::debug_handler]
pub async fn update_folder(
    state: State<SharedState>,
    Owner(owner): Owner,
    Path(id): Path<i32>,
    Json(body): Json<NewFolder>,
) -> Result<Json<Folder>, ApiError> {
    state
        .store
        .update_folder(owner, id, &body)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("folder"))
}

#[axum::debug_handler]
pub async fn delete_folder(
    state: State<SharedState>,
    Owner(owner): Owner,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete_folder(owner, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("folder"))
    }
}
