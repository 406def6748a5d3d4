//! Postgres persistence. Every query is scoped by the owning user.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::{
    migrate::MigrateError,
    postgres::{PgPool, PgPoolOptions},
    types::Uuid,
};
use tracing::{debug, info};

use crate::{
    category,
    error::ApiError,
    models::{
        Course, CourseContent, CourseSummary, CourseTree, Folder, Lesson, LessonTree, Module,
        ModuleTree, NewCourse, NewFolder, NewQuizScore, QuizQuestion, QuizScore, Resource,
        TutorChat,
    },
    progress,
};

#[derive(Debug, Clone, Serialize)]
pub struct LessonProgress {
    pub lesson_id: i32,
    pub course_id: i32,
    pub completed: bool,
    pub progress: i32,
}

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// A pool that opens connections on first use.
    pub fn connect_lazy(database_url: &str) -> Result<Self, sqlx::Error> {
        Ok(Self::new(PgPoolOptions::new().connect_lazy(database_url)?))
    }

    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Writes the course and its whole subtree in one transaction, so a failure part
    /// way through leaves nothing behind.
    pub async fn create_course(
        &self,
        owner: Uuid,
        new_course: &NewCourse,
        content: &CourseContent,
    ) -> Result<CourseTree, ApiError> {
        for (value, field) in [
            (&new_course.title, "title"),
            (&new_course.audience_level, "audience_level"),
            (&new_course.duration, "duration"),
        ] {
            if value.trim().is_empty() {
                return Err(ApiError::MissingField(field));
            }
        }

        let mut tx = self.pool.begin().await?;

        if let Some(folder_id) = new_course.folder_id {
            sqlx::query("SELECT id FROM folders WHERE id = $1 AND owner_id = $2")
                .bind(folder_id)
                .bind(owner)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(ApiError::NotFound("folder"))?;
        }

        let course: Course = sqlx::query_as(
            "INSERT INTO courses (owner_id, folder_id, title, audience_level, duration)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *",
        )
        .bind(owner)
        .bind(new_course.folder_id)
        .bind(new_course.title.trim())
        .bind(new_course.audience_level.trim())
        .bind(new_course.duration.trim())
        .fetch_one(&mut *tx)
        .await?;

        let mut modules = Vec::with_capacity(content.modules.len());
        for (module_pos, generated_module) in content.modules.iter().enumerate() {
            let module: Module = sqlx::query_as(
                "INSERT INTO modules (course_id, title, position)
                VALUES ($1, $2, $3)
                RETURNING *",
            )
            .bind(course.id)
            .bind(&generated_module.title)
            .bind(module_pos as i32)
            .fetch_one(&mut *tx)
            .await?;

            let mut lessons = Vec::with_capacity(generated_module.lessons.len());
            for (lesson_pos, generated) in generated_module.lessons.iter().enumerate() {
                let lesson: Lesson = sqlx::query_as(
                    "INSERT INTO lessons (module_id, title, position, objectives, content)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING *",
                )
                .bind(module.id)
                .bind(&generated.title)
                .bind(lesson_pos as i32)
                .bind(generated.objectives.as_slice())
                .bind(&generated.content)
                .fetch_one(&mut *tx)
                .await?;

                let mut quiz_questions = Vec::with_capacity(generated.quiz.len());
                for (pos, question) in generated.quiz.iter().enumerate() {
                    let row: QuizQuestion = sqlx::query_as(
                        "INSERT INTO quiz_questions (lesson_id, question, options, correct_answer, position)
                        VALUES ($1, $2, $3, $4, $5)
                        RETURNING *",
                    )
                    .bind(lesson.id)
                    .bind(&question.question)
                    .bind(question.options.as_slice())
                    .bind(&question.correct_answer)
                    .bind(pos as i32)
                    .fetch_one(&mut *tx)
                    .await?;
                    quiz_questions.push(row);
                }

                let mut resources = Vec::with_capacity(generated.resources.len());
                for (pos, resource) in generated.resources.iter().enumerate() {
                    let row: Resource = sqlx::query_as(
                        "INSERT INTO resources (lesson_id, title, url, position)
                        VALUES ($1, $2, $3, $4)
                        RETURNING *",
                    )
                    .bind(lesson.id)
                    .bind(&resource.title)
                    .bind(&resource.url)
                    .bind(pos as i32)
                    .fetch_one(&mut *tx)
                    .await?;
                    resources.push(row);
                }

                lessons.push(LessonTree {
                    lesson,
                    quiz_questions,
                    resources,
                });
            }
            modules.push(ModuleTree { module, lessons });
        }

        tx.commit().await?;

        let tree = CourseTree {
            category: category::classify(&course.title),
            course,
            modules,
        };
        info!(
            course_id = tree.course.id,
            modules = tree.modules.len(),
            lessons = tree.lesson_count(),
            "course saved"
        );
        Ok(tree)
    }

    pub async fn list_courses(&self, owner: Uuid) -> Result<Vec<CourseSummary>, ApiError> {
        let courses: Vec<Course> = sqlx::query_as(
            "SELECT * FROM courses
            WHERE owner_id = $1
            ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses.into_iter().map(CourseSummary::from).collect())
    }

    pub async fn course_tree(&self, owner: Uuid, course_id: i32) -> Result<Option<CourseTree>, ApiError> {
        let course: Option<Course> =
            sqlx::query_as("SELECT * FROM courses WHERE id = $1 AND owner_id = $2")
                .bind(course_id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?;
        let course = match course {
            Some(course) => course,
            None => return Ok(None),
        };

        let modules: Vec<Module> = sqlx::query_as(
            "SELECT * FROM modules WHERE course_id = $1 ORDER BY position",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let lessons: Vec<Lesson> = sqlx::query_as(
            "SELECT l.* FROM lessons l
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = $1
            ORDER BY l.position",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let questions: Vec<QuizQuestion> = sqlx::query_as(
            "SELECT q.* FROM quiz_questions q
            JOIN lessons l ON l.id = q.lesson_id
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = $1
            ORDER BY q.position",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let resources: Vec<Resource> = sqlx::query_as(
            "SELECT r.* FROM resources r
            JOIN lessons l ON l.id = r.lesson_id
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = $1
            ORDER BY r.position",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(assemble(course, modules, lessons, questions, resources)))
    }

    /// Quiz scores do not cascade with their course, so they go first.
    pub async fn delete_course(&self, owner: Uuid, course_id: i32) -> Result<bool, ApiError> {
        let mut tx = self.pool.begin().await?;

        let owned = sqlx::query("SELECT id FROM courses WHERE id = $1 AND owner_id = $2 FOR UPDATE")
            .bind(course_id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?;
        if owned.is_none() {
            return Ok(false);
        }

        let scores = sqlx::query("DELETE FROM quiz_scores WHERE course_id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(course_id, scores_removed = scores.rows_affected(), "course deleted");
        Ok(true)
    }

    /// Sets a lesson's completed flag and writes the recomputed course progress back.
    pub async fn set_lesson_completed(
        &self,
        owner: Uuid,
        lesson_id: i32,
        completed: bool,
    ) -> Result<Option<LessonProgress>, ApiError> {
        let mut tx = self.pool.begin().await?;

        let course_id: Option<(i32,)> = sqlx::query_as(
            "UPDATE lessons l
            SET completed = $3
            FROM modules m, courses c
            WHERE l.id = $1
              AND m.id = l.module_id
              AND c.id = m.course_id
              AND c.owner_id = $2
            RETURNING c.id",
        )
        .bind(lesson_id)
        .bind(owner)
        .bind(completed)
        .fetch_optional(&mut *tx)
        .await?;
        let course_id = match course_id {
            Some((id,)) => id,
            None => return Ok(None),
        };

        let (total, done): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE l.completed)
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = $1",
        )
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await?;
        let progress = progress::percent(done, total);

        sqlx::query("UPDATE courses SET progress = $1 WHERE id = $2")
            .bind(progress)
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(lesson_id, course_id, progress, "lesson completion updated");
        Ok(Some(LessonProgress {
            lesson_id,
            course_id,
            completed,
            progress,
        }))
    }

    pub async fn record_quiz_score(
        &self,
        owner: Uuid,
        course_id: i32,
        score: &NewQuizScore,
    ) -> Result<Option<QuizScore>, ApiError> {
        if score.total_questions <= 0 || score.score < 0 || score.score > score.total_questions {
            return Err(ApiError::InvalidField {
                field: "score",
                value: format!("{}/{}", score.score, score.total_questions),
            });
        }

        let row: Option<QuizScore> = sqlx::query_as(
            "INSERT INTO quiz_scores
                (owner_id, course_id, lesson_id, score, total_questions, struggle_topics, confidence_level)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE EXISTS (SELECT 1 FROM courses WHERE id = $2 AND owner_id = $1)
              AND ($3::int IS NULL OR EXISTS (
                  SELECT 1 FROM lessons l
                  JOIN modules m ON m.id = l.module_id
                  WHERE l.id = $3 AND m.course_id = $2
              ))
            RETURNING *",
        )
        .bind(owner)
        .bind(course_id)
        .bind(score.lesson_id)
        .bind(score.score)
        .bind(score.total_questions)
        .bind(score.struggle_topics.as_slice())
        .bind(&score.confidence_level)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn quiz_scores(&self, owner: Uuid, course_id: i32) -> Result<Vec<QuizScore>, ApiError> {
        let rows = sqlx::query_as(
            "SELECT * FROM quiz_scores
            WHERE owner_id = $1 AND course_id = $2
            ORDER BY created_at DESC",
        )
        .bind(owner)
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn save_tutor_chat(
        &self,
        owner: Uuid,
        course_id: i32,
        message: &str,
        response: &str,
    ) -> Result<Option<TutorChat>, ApiError> {
        let row = sqlx::query_as(
            "INSERT INTO tutor_chats (owner_id, course_id, message, response)
            SELECT $1, $2, $3, $4
            WHERE EXISTS (SELECT 1 FROM courses WHERE id = $2 AND owner_id = $1)
            RETURNING *",
        )
        .bind(owner)
        .bind(course_id)
        .bind(message)
        .bind(response)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn tutor_chats(&self, owner: Uuid, course_id: i32) -> Result<Vec<TutorChat>, ApiError> {
        let rows = sqlx::query_as(
            "SELECT * FROM tutor_chats
            WHERE owner_id = $1 AND course_id = $2
            ORDER BY created_at ASC",
        )
        .bind(owner)
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_folder(&self, owner: Uuid, folder: &NewFolder) -> Result<Folder, ApiError> {
        let name = folder.name.trim();
        if name.is_empty() {
            return Err(ApiError::MissingField("name"));
        }
        let row = sqlx::query_as(
            "INSERT INTO folders (owner_id, name, color)
            VALUES ($1, $2, $3)
            RETURNING *",
        )
        .bind(owner)
        .bind(name)
        .bind(&folder.color)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn folders(&self, owner: Uuid) -> Result<Vec<Folder>, ApiError> {
        let rows = sqlx::query_as("SELECT * FROM folders WHERE owner_id = $1 ORDER BY name")
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn update_folder(
        &self,
        owner: Uuid,
        folder_id: i32,
        folder: &NewFolder,
    ) -> Result<Option<Folder>, ApiError> {
        let name = folder.name.trim();
        if name.is_empty() {
            return Err(ApiError::MissingField("name"));
        }
        let row = sqlx::query_as(
            "UPDATE folders SET name = $3, color = $4
            WHERE id = $1 AND owner_id = $2
            RETURNING *",
        )
        .bind(folder_id)
        .bind(owner)
        .bind(name)
        .bind(&folder.color)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Courses in the folder stay, with their folder cleared.
    pub async fn delete_folder(&self, owner: Uuid, folder_id: i32) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1 AND owner_id = $2")
            .bind(folder_id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `None` for `folder_id` takes the course out of its folder.
    pub async fn move_course(
        &self,
        owner: Uuid,
        course_id: i32,
        folder_id: Option<i32>,
    ) -> Result<Option<Course>, ApiError> {
        let row = sqlx::query_as(
            "UPDATE courses SET folder_id = $3
            WHERE id = $1 AND owner_id = $2
              AND ($3::int IS NULL OR EXISTS (
                  SELECT 1 FROM folders WHERE id = $3 AND owner_id = $2
              ))
            RETURNING *",
        )
        .bind(course_id)
        .bind(owner)
        .bind(folder_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

/// Groups flat rows into the nested tree, keeping each list in the order given.
pub fn assemble(
    course: Course,
    modules: Vec<Module>,
    lessons: Vec<Lesson>,
    questions: Vec<QuizQuestion>,
    resources: Vec<Resource>,
) -> CourseTree {
    let mut questions_by_lesson: HashMap<i32, Vec<QuizQuestion>> = HashMap::new();
    for question in questions {
        questions_by_lesson.entry(question.lesson_id).or_default().push(question);
    }
    let mut resources_by_lesson: HashMap<i32, Vec<Resource>> = HashMap::new();
    for resource in resources {
        resources_by_lesson.entry(resource.lesson_id).or_default().push(resource);
    }
    let mut lessons_by_module: HashMap<i32, Vec<LessonTree>> = HashMap::new();
    for lesson in lessons {
        let tree = LessonTree {
            quiz_questions: questions_by_lesson.remove(&lesson.id).unwrap_or_default(),
            resources: resources_by_lesson.remove(&lesson.id).unwrap_or_default(),
            lesson,
        };
        lessons_by_module.entry(tree.lesson.module_id).or_default().push(tree);
    }

    let modules = modules
        .into_iter()
        .map(|module| ModuleTree {
            lessons: lessons_by_module.remove(&module.id).unwrap_or_default(),
            module,
        })
        .collect();

    CourseTree {
        category: category::classify(&course.title),
        course,
        modules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use sqlx::types::time::OffsetDateTime;

    fn course() -> Course {
        Course {
            id: 1,
            owner_id: Uuid::nil(),
            folder_id: None,
            title: "Intro to Python".into(),
            audience_level: "Beginner".into(),
            duration: "4 weeks".into(),
            progress: 0,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn lesson(id: i32, module_id: i32, position: i32) -> Lesson {
        Lesson {
            id,
            module_id,
            title: format!("Lesson {}", id),
            position,
            objectives: vec![],
            content: String::new(),
            completed: false,
        }
    }

    #[test]
    fn assemble_groups_rows_under_parents() {
        let modules = vec![
            Module { id: 10, course_id: 1, title: "A".into(), position: 0 },
            Module { id: 11, course_id: 1, title: "B".into(), position: 1 },
            Module { id: 12, course_id: 1, title: "Empty".into(), position: 2 },
        ];
        let lessons = vec![lesson(100, 10, 0), lesson(101, 11, 0), lesson(102, 10, 1)];
        let questions = vec![QuizQuestion {
            id: 1000,
            lesson_id: 102,
            question: "Q".into(),
            options: vec!["a".into()],
            correct_answer: "a".into(),
            position: 0,
        }];
        let resources = vec![Resource {
            id: 2000,
            lesson_id: 101,
            title: "Docs".into(),
            url: "https://docs.python.org".into(),
            position: 0,
        }];

        let tree = assemble(course(), modules, lessons, questions, resources);
        assert_eq!(tree.category, Category::Programming);
        assert_eq!(tree.modules.len(), 3);
        let first: Vec<i32> = tree.modules[0].lessons.iter().map(|l| l.lesson.id).collect();
        assert_eq!(first, vec![100, 102]);
        assert_eq!(tree.modules[0].lessons[1].quiz_questions.len(), 1);
        assert_eq!(tree.modules[1].lessons[0].resources.len(), 1);
        assert!(tree.modules[2].lessons.is_empty());
        assert_eq!(tree.lesson_count(), 3);
    }

    #[test]
    fn tree_serializes_flat_records() {
        let tree = assemble(course(), vec![], vec![], vec![], vec![]);
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(value["title"], "Intro to Python");
        assert_eq!(value["category"], "programming");
        assert!(value["modules"].as_array().unwrap().is_empty());
    }
}
