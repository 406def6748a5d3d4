use serde::{Deserialize, Serialize};
use sqlx::types::{time::OffsetDateTime, Uuid};
use time::serde::iso8601;

use crate::category::{self, Category};

// Persisted records. Every table below a course is reached through it, so ownership
// is checked on the course (or folder) row.

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Course {
    pub id: i32,
    pub owner_id: Uuid,
    pub folder_id: Option<i32>,
    pub title: String,
    pub audience_level: String,
    pub duration: String,
    pub progress: i32,
    #[serde(with = "iso8601")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Module {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    #[serde(rename = "order")]
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Lesson {
    pub id: i32,
    pub module_id: i32,
    pub title: String,
    #[serde(rename = "order")]
    pub position: i32,
    pub objectives: Vec<String>,
    pub content: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuizQuestion {
    pub id: i32,
    pub lesson_id: i32,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(rename = "order")]
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Resource {
    pub id: i32,
    pub lesson_id: i32,
    pub title: String,
    pub url: String,
    #[serde(rename = "order")]
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuizScore {
    pub id: i32,
    pub owner_id: Uuid,
    pub course_id: i32,
    pub lesson_id: Option<i32>,
    pub score: i32,
    pub total_questions: i32,
    pub struggle_topics: Vec<String>,
    pub confidence_level: String,
    #[serde(with = "iso8601")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TutorChat {
    pub id: i32,
    pub owner_id: Uuid,
    pub course_id: i32,
    pub message: String,
    pub response: String,
    #[serde(with = "iso8601")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Folder {
    pub id: i32,
    pub owner_id: Uuid,
    pub name: String,
    pub color: String,
    #[serde(with = "iso8601")]
    pub created_at: OffsetDateTime,
}

// Write inputs.

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub title: String,
    pub audience_level: String,
    pub duration: String,
    #[serde(default)]
    pub folder_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuizScore {
    #[serde(default)]
    pub lesson_id: Option<i32>,
    pub score: i32,
    pub total_questions: i32,
    #[serde(default)]
    pub struggle_topics: Vec<String>,
    #[serde(default = "default_confidence")]
    pub confidence_level: String,
}

fn default_confidence() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFolder {
    pub name: String,
    #[serde(default = "default_folder_color")]
    pub color: String,
}

fn default_folder_color() -> String {
    "#6366f1".to_string()
}

// Read models assembled from several tables.

#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    #[serde(flatten)]
    pub course: Course,
    pub category: Category,
}

impl From<Course> for CourseSummary {
    fn from(course: Course) -> Self {
        let category = category::classify(&course.title);
        Self { course, category }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseTree {
    #[serde(flatten)]
    pub course: Course,
    pub category: Category,
    pub modules: Vec<ModuleTree>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleTree {
    #[serde(flatten)]
    pub module: Module,
    pub lessons: Vec<LessonTree>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonTree {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub quiz_questions: Vec<QuizQuestion>,
    pub resources: Vec<Resource>,
}

impl CourseTree {
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }
}

// The tree a model produces for a new course. Keys the model leaves out default
// individually; normalization happens in `generate::course`.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseContent {
    #[serde(default)]
    pub modules: Vec<GeneratedModule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedModule {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<GeneratedLesson>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedLesson {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "quiz_questions", alias = "quizQuestions", alias = "quizzes")]
    pub quiz: Vec<GeneratedQuestion>,
    #[serde(default)]
    pub resources: Vec<GeneratedResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, alias = "correctAnswer", alias = "answer")]
    pub correct_answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}
