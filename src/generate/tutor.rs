use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::{
    error::ApiError,
    inference::{ChatClient, ChatRequest, InferenceError},
    prompts,
};

use super::required;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub course_id: Option<Value>,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TutorResponse {
    pub success: bool,
    pub response: String,
}

/// One tutoring turn. There is no fallback: every failure is a hard failure.
pub async fn reply(
    client: Option<&dyn ChatClient>,
    request: &TutorRequest,
) -> Result<TutorResponse, ApiError> {
    let message = required(&request.message, "message")?;
    let course_id = present(&request.course_id, "courseId")?;
    let user_id = present(&request.user_id, "userId")?;
    let client = client.ok_or(ApiError::MissingCredential)?;

    let context = render_context(request.context.as_ref());
    let chat = ChatRequest::new(prompts::TUTOR_PROMPT, prompts::tutor_request(message, &context))
        .max_tokens(800);
    let response = client.complete(chat).await?;
    let response = response.trim();
    if response.is_empty() {
        return Err(InferenceError::EmptyResponse.into());
    }

    info!(%course_id, %user_id, "tutor reply ready");
    Ok(TutorResponse {
        success: true,
        response: response.to_string(),
    })
}

fn present<'a>(value: &'a Option<Value>, field: &'static str) -> Result<&'a Value, ApiError> {
    match value {
        None | Some(Value::Null) => Err(ApiError::MissingField(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ApiError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

/// Plain strings pass through; structured context is pretty-printed for the prompt.
pub fn render_context(context: Option<&Value>) -> String {
    match context {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}
