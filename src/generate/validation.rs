use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    error::ApiError,
    extract::{self, ExtractOptions},
    inference::{ChatClient, ChatRequest},
    prompts,
};

use super::required;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    #[serde(default)]
    pub user_answer: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub success: bool,
    pub is_correct: bool,
    pub user_answer: String,
    pub correct_answer: String,
}

/// Asks the model whether the answer is right. An unreadable verdict falls back to
/// case-insensitive string equality.
pub async fn validate(
    client: Option<&dyn ChatClient>,
    request: &ValidationRequest,
) -> Result<ValidationResponse, ApiError> {
    let user_answer = required(&request.user_answer, "userAnswer")?;
    let question = required(&request.question, "question")?;
    let correct_answer = required(&request.correct_answer, "correctAnswer")?;

    let respond = |is_correct| ValidationResponse {
        success: true,
        is_correct,
        user_answer: user_answer.to_string(),
        correct_answer: correct_answer.to_string(),
    };

    if answers_match(user_answer, correct_answer) {
        return Ok(respond(true));
    }

    let client = client.ok_or(ApiError::MissingCredential)?;
    let chat = ChatRequest::new(
        prompts::VALIDATION_PROMPT,
        prompts::validation_request(question, correct_answer, user_answer),
    )
    .temperature(0.0)
    .max_tokens(50);
    let text = client.complete(chat).await?;

    let is_correct = match parse_verdict(&text) {
        Some(verdict) => verdict,
        None => {
            debug!(response = %text, "unreadable verdict, comparing strings");
            answers_match(user_answer, correct_answer)
        }
    };
    info!(is_correct, "answer validated");
    Ok(respond(is_correct))
}

pub fn answers_match(user_answer: &str, correct_answer: &str) -> bool {
    user_answer.trim().to_lowercase() == correct_answer.trim().to_lowercase()
}

/// Reads `{"isCorrect": bool}`, a bare boolean, or a plain yes/no style reply.
pub fn parse_verdict(text: &str) -> Option<bool> {
    if let Ok(value) = extract::extract_json(text, &ExtractOptions::lenient()) {
        match value {
            Value::Bool(b) => return Some(b),
            Value::Object(map) => {
                for key in ["isCorrect", "is_correct", "correct"] {
                    if let Some(Value::Bool(b)) = map.get(key) {
                        return Some(*b);
                    }
                }
            }
            _ => {}
        }
    }

    let lowered = text.trim().to_lowercase();
    let first = lowered
        .split(|c: char| !c.is_alphanumeric())
        .find(|w| !w.is_empty())?;
    match first {
        "true" | "yes" | "correct" => Some(true),
        "false" | "no" | "incorrect" | "wrong" => Some(false),
        _ => None,
    }
}
