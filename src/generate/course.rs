use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::ApiError,
    extract::{self, ExtractOptions},
    fallback,
    inference::{ChatClient, ChatRequest, InferenceError},
    models::{CourseContent, GeneratedLesson, GeneratedModule, GeneratedQuestion},
    prompts,
};

use super::required;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub audience_level: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub success: bool,
    pub course_content: CourseContent,
}

/// Generates a full course tree. A rate-limited provider or an unusable completion yields
/// the fallback course; other provider failures are errors.
pub async fn generate(
    client: Option<&dyn ChatClient>,
    request: &CourseRequest,
) -> Result<CourseResponse, ApiError> {
    let title = required(&request.title, "title")?;
    let audience_level = required(&request.audience_level, "audience_level")?;
    let duration = required(&request.duration, "duration")?;
    let client = client.ok_or(ApiError::MissingCredential)?;

    info!(title, audience_level, duration, "generating course");
    let chat = ChatRequest::new(
        prompts::COURSE_PROMPT,
        prompts::course_request(title, audience_level, duration),
    )
    .max_tokens(8000);

    let course_content = match client.complete(chat).await {
        Ok(text) => parse_course(&text).unwrap_or_else(|| {
            warn!(title, "course completion unusable, serving fallback course");
            fallback::course(title, audience_level, duration)
        }),
        Err(InferenceError::RateLimited) => {
            warn!(title, "rate limited, serving fallback course");
            fallback::course(title, audience_level, duration)
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        title,
        modules = course_content.modules.len(),
        "course content ready"
    );
    Ok(CourseResponse {
        success: true,
        course_content,
    })
}

/// Strict extraction plus normalization. `None` when nothing usable survives.
pub fn parse_course(text: &str) -> Option<CourseContent> {
    let content: CourseContent = match extract::extract_as(text, &ExtractOptions::strict()) {
        Ok(content) => content,
        Err(e) => {
            warn!(error = %e, "course completion did not parse");
            return None;
        }
    };
    let content = normalize(content);
    if content.modules.is_empty() {
        None
    } else {
        Some(content)
    }
}

/// Fills blank titles, drops unusable questions and resources, and drops modules left
/// without lessons.
pub fn normalize(content: CourseContent) -> CourseContent {
    let modules = content
        .modules
        .into_iter()
        .filter(|m| !m.lessons.is_empty())
        .enumerate()
        .map(|(i, module)| GeneratedModule {
            title: or_default(module.title, || format!("Module {}", i + 1)),
            lessons: module
                .lessons
                .into_iter()
                .enumerate()
                .map(|(j, lesson)| normalize_lesson(j, lesson))
                .collect(),
        })
        .collect();
    CourseContent { modules }
}

fn normalize_lesson(index: usize, lesson: GeneratedLesson) -> GeneratedLesson {
    GeneratedLesson {
        title: or_default(lesson.title, || format!("Lesson {}", index + 1)),
        objectives: lesson
            .objectives
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect(),
        content: lesson.content.trim().to_string(),
        quiz: lesson.quiz.into_iter().filter_map(normalize_question).collect(),
        resources: lesson
            .resources
            .into_iter()
            .filter(|r| !r.url.trim().is_empty())
            .map(|mut r| {
                r.url = r.url.trim().to_string();
                if r.title.trim().is_empty() {
                    r.title = r.url.clone();
                }
                r
            })
            .collect(),
    }
}

fn normalize_question(mut question: GeneratedQuestion) -> Option<GeneratedQuestion> {
    question.question = question.question.trim().to_string();
    question.correct_answer = question.correct_answer.trim().to_string();
    question.options.retain(|o| !o.trim().is_empty());
    if question.question.is_empty() || question.correct_answer.is_empty() {
        return None;
    }
    if !question.options.iter().any(|o| o.trim() == question.correct_answer) {
        question.options.push(question.correct_answer.clone());
    }
    Some(question)
}

fn or_default(value: String, default: impl FnOnce() -> String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default()
    } else {
        trimmed.to_string()
    }
}
