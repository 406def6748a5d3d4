use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use coursegen::{
    api::{ai, AppState, SharedState},
    fallback,
    inference::{ChatClient, ChatRequest, InferenceError},
    store::Store,
};

enum Reply {
    Text(&'static str),
    RateLimited,
    ServerError,
}

struct Scripted {
    reply: Reply,
    requests: Mutex<Vec<ChatRequest>>,
}

impl Scripted {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatClient for Scripted {
    async fn complete(&self, request: ChatRequest) -> Result<String, InferenceError> {
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Reply::Text(text) => Ok(text.to_string()),
            Reply::RateLimited => Err(InferenceError::RateLimited),
            Reply::ServerError => Err(InferenceError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "upstream exploded".to_string(),
            }),
        }
    }
}

fn state_with(client: Option<Arc<Scripted>>) -> State<SharedState> {
    let store = Store::connect_lazy("postgres://localhost/coursegen_test").unwrap();
    let inference = client.map(|c| c as Arc<dyn ChatClient>);
    State(Arc::new(AppState::new(store, inference)))
}

async fn read(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn body<T: serde::de::DeserializeOwned>(value: Value) -> Json<T> {
    Json(serde_json::from_value(value).unwrap())
}

fn course_body() -> Value {
    json!({"title": "Intro to Rust", "audience_level": "Beginner", "duration": "4 weeks"})
}

mod generate_course {
    use super::*;

    #[tokio::test]
    async fn recovers_noisy_completion() {
        let client = Scripted::new(Reply::Text(
            "Sure! Here it is:\n```json\n{\"modules\": [{\"title\": \"Ownership\", \"lessons\": [{\"title\": \"Moves\", \"objectives\": [\"Explain moves\"], \"content\": \"A move \u{2014} transfer of ownership.\", \"quiz\": [], \"resources\": [],}]}]}\n```",
        ));
        let response = ai::generate_course(state_with(Some(client.clone())), body(course_body()))
            .await
            .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["success"], true);
        let lesson = &value["courseContent"]["modules"][0]["lessons"][0];
        assert_eq!(lesson["title"], "Moves");
        assert_eq!(lesson["content"], "A move - transfer of ownership.");
        assert_eq!(client.calls(), 1);
        assert!(client.requests.lock().unwrap()[0].user.contains("Intro to Rust"));
    }

    #[tokio::test]
    async fn unusable_completion_serves_fallback() {
        let client = Scripted::new(Reply::Text("I'm sorry, I can't produce that."));
        let response = ai::generate_course(state_with(Some(client)), body(course_body()))
            .await
            .into_response();
        let (status, value) = read(response).await;

        let expected = fallback::course("Intro to Rust", "Beginner", "4 weeks");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["success"], true);
        assert_eq!(value["courseContent"], serde_json::to_value(&expected).unwrap());
    }

    #[tokio::test]
    async fn rate_limit_serves_fallback() {
        let client = Scripted::new(Reply::RateLimited);
        let response = ai::generate_course(state_with(Some(client)), body(course_body()))
            .await
            .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::OK);
        let lessons = &value["courseContent"]["modules"][0]["lessons"];
        assert_eq!(lessons[0]["quiz"].as_array().unwrap().len(), 2);
        assert_eq!(lessons[0]["resources"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn provider_error_is_a_hard_failure() {
        let client = Scripted::new(Reply::ServerError);
        let response = ai::generate_course(state_with(Some(client)), body(course_body()))
            .await
            .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["error"], "Failed to generate course content");
        assert!(value["details"].as_str().unwrap().contains("upstream exploded"));
    }

    #[tokio::test]
    async fn missing_field_fails_before_calling_the_model() {
        let client = Scripted::new(Reply::Text("{}"));
        let response = ai::generate_course(
            state_with(Some(client.clone())),
            body(json!({"title": "Rust", "audience_level": "Beginner"})),
        )
        .await
        .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["details"], "missing required field: duration");
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn missing_credential_is_a_hard_failure() {
        let response = ai::generate_course(state_with(None), body(course_body()))
            .await
            .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(value["details"].as_str().unwrap().contains("INFERENCE_API_KEY"));
    }
}

mod recommendations {
    use super::*;

    #[tokio::test]
    async fn model_output_is_normalized() {
        let client = Scripted::new(Reply::Text(
            r#"{"recommendations": [{"title": "Lifetimes", "relevanceScore": 0.3}, {"title": "Traits", "difficulty": "Advanced", "relevanceScore": 0.92}]}"#,
        ));
        let response = ai::recommendations(
            state_with(Some(client)),
            body(json!({"courseTitle": "Intro to Rust", "score": 70})),
        )
        .await
        .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::OK);
        let recs = value["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0]["difficulty"], "Intermediate");
        assert_eq!(recs[0]["relevanceScore"], 0.7);
        assert_eq!(recs[1]["relevanceScore"], 0.92);
    }

    #[tokio::test]
    async fn typographic_quotes_in_titles_survive() {
        let client = Scripted::new(Reply::Text(
            "{\"recommendations\": [{\"title\": \"Read \u{201C}The Book\u{201D} twice\"}]}",
        ));
        let response = ai::recommendations(
            state_with(Some(client)),
            body(json!({"courseTitle": "Intro to Rust"})),
        )
        .await
        .into_response();
        let (_, value) = read(response).await;

        let recs = value["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0]["title"], "Read \"The Book\" twice");
    }

    #[tokio::test]
    async fn failures_serve_templates() {
        for client in [
            None,
            Some(Scripted::new(Reply::ServerError)),
            Some(Scripted::new(Reply::Text("no json here"))),
        ] {
            let response = ai::recommendations(
                state_with(client),
                body(json!({"courseTitle": "Conversational Spanish"})),
            )
            .await
            .into_response();
            let (status, value) = read(response).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(value["recommendations"][0]["title"], "Everyday Conversation Drills");
        }
    }

    #[tokio::test]
    async fn course_title_is_required() {
        let response = ai::recommendations(state_with(None), body(json!({"topics": ["x"]})))
            .await
            .into_response();
        let (status, _) = read(response).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}

mod validate_answer {
    use super::*;

    fn answer(user: &str) -> Value {
        json!({"userAnswer": user, "question": "Capital of France?", "correctAnswer": "Paris"})
    }

    #[tokio::test]
    async fn exact_match_skips_the_model() {
        let client = Scripted::new(Reply::Text(r#"{"isCorrect": false}"#));
        let response = ai::validate_answer(state_with(Some(client.clone())), body(answer(" paris ")))
            .await
            .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["isCorrect"], true);
        assert_eq!(value["userAnswer"], "paris");
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn model_verdict_is_used() {
        let client = Scripted::new(Reply::Text("```json\n{\"isCorrect\": true}\n```"));
        let response = ai::validate_answer(state_with(Some(client)), body(answer("the city of Paris")))
            .await
            .into_response();
        let (_, value) = read(response).await;
        assert_eq!(value["isCorrect"], true);
        assert_eq!(value["correctAnswer"], "Paris");
    }

    #[tokio::test]
    async fn unreadable_verdict_falls_back_to_equality() {
        let client = Scripted::new(Reply::Text("Let me think about that."));
        let response = ai::validate_answer(state_with(Some(client)), body(answer("Lyon")))
            .await
            .into_response();
        let (status, value) = read(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["isCorrect"], false);
    }

    #[tokio::test]
    async fn blank_answer_is_a_missing_field() {
        let client = Scripted::new(Reply::Text(r#"{"isCorrect": false}"#));
        let response = ai::validate_answer(state_with(Some(client.clone())), body(answer("   ")))
            .await
            .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["details"], "missing required field: userAnswer");
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn provider_error_is_a_hard_failure() {
        let client = Scripted::new(Reply::ServerError);
        let response = ai::validate_answer(state_with(Some(client)), body(answer("Lyon")))
            .await
            .into_response();
        let (status, value) = read(response).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["error"], "Failed to validate answer");
    }
}

mod adaptive_feedback {
    use super::*;

    fn request() -> Value {
        json!({
            "quiz_score": 45,
            "confidence_level": "high",
            "struggle_topics": ["loops"],
            "understanding_topics": ["variables"]
        })
    }

    #[tokio::test]
    async fn provider_failure_gives_rule_based_feedback() {
        let client = Scripted::new(Reply::ServerError);
        let response = ai::adaptive_feedback(state_with(Some(client)), body(request()))
            .await
            .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["success"], true);
        assert_eq!(value["feedback"]["recommendedDifficulty"], "easier");
        assert_eq!(value["feedback"]["strengths"][0], "Good understanding of variables");
        assert_eq!(value["feedback"]["areasForImprovement"][0], "loops");
    }

    #[tokio::test]
    async fn model_feedback_is_returned() {
        let client = Scripted::new(Reply::Text(
            r#"{"summary": "Keep at it.", "strengths": [], "nextSteps": ["Redo lesson 2"], "recommendedDifficulty": "same"}"#,
        ));
        let response = ai::adaptive_feedback(state_with(Some(client)), body(request()))
            .await
            .into_response();
        let (_, value) = read(response).await;

        assert_eq!(value["feedback"]["summary"], "Keep at it.");
        assert_eq!(value["feedback"]["nextSteps"][0], "Redo lesson 2");
        assert_eq!(value["feedback"]["recommendedDifficulty"], "same");
        assert!(!value["feedback"]["encouragement"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn score_is_required() {
        let response = ai::adaptive_feedback(state_with(None), body(json!({"confidence_level": "low"})))
            .await
            .into_response();
        let (status, value) = read(response).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["details"], "missing required field: quiz_score");
    }
}

mod roadmap_content {
    use super::*;

    #[tokio::test]
    async fn projects_from_the_model() {
        let client = Scripted::new(Reply::Text(
            r#"Here you go: {"projects": [{"title": "Chat server", "difficulty": "Advanced", "skills": ["tokio"]}]}"#,
        ));
        let response = ai::roadmap_content(
            state_with(Some(client)),
            body(json!({"courseTitle": "Async Rust", "category": "programming", "contentType": "projects"})),
        )
        .await
        .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["content"]["projects"][0]["title"], "Chat server");
    }

    #[tokio::test]
    async fn missing_credential_serves_template() {
        let response = ai::roadmap_content(
            state_with(None),
            body(json!({"courseTitle": "Async Rust", "category": "programming", "contentType": "opportunities"})),
        )
        .await
        .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["content"]["opportunities"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_content_type_is_rejected() {
        let response = ai::roadmap_content(
            state_with(None),
            body(json!({"courseTitle": "Async Rust", "category": "programming", "contentType": "videos"})),
        )
        .await
        .into_response();
        let (status, value) = read(response).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(value["details"].as_str().unwrap().contains("contentType"));
    }
}

mod tutor_chat {
    use super::*;

    #[tokio::test]
    async fn replies_with_model_text() {
        let client = Scripted::new(Reply::Text("  A borrow is a reference.  "));
        let response = ai::tutor_chat(
            state_with(Some(client.clone())),
            body(json!({
                "message": "What is a borrow?",
                "courseId": 7,
                "userId": "3f0c6e0e-8f53-4c1e-9d52-1f4b0a7e9b10",
                "context": {"lesson": "References"}
            })),
        )
        .await
        .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, json!({"success": true, "response": "A borrow is a reference."}));
        assert!(client.requests.lock().unwrap()[0].user.contains("References"));
    }

    #[tokio::test]
    async fn ids_are_required() {
        let client = Scripted::new(Reply::Text("hi"));
        let response = ai::tutor_chat(
            state_with(Some(client.clone())),
            body(json!({"message": "Hello", "userId": "u"})),
        )
        .await
        .into_response();
        let (status, value) = read(response).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["error"], "Failed to get tutor response");
        assert_eq!(client.calls(), 0);
    }
}
