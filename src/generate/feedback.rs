use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::ApiError,
    extract::{self, ExtractOptions},
    fallback,
    inference::{ChatClient, ChatRequest},
    prompts,
};

use super::{non_blank, required};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub quiz_score: Option<f64>,
    #[serde(default)]
    pub confidence_level: Option<String>,
    #[serde(default)]
    pub struggle_topics: Vec<String>,
    #[serde(default)]
    pub understanding_topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub summary: String,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub study_tips: Vec<String>,
    pub next_steps: Vec<String>,
    pub encouragement: String,
    pub recommended_difficulty: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub feedback: Feedback,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFeedback {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    areas_for_improvement: Vec<String>,
    #[serde(default)]
    study_tips: Vec<String>,
    #[serde(default)]
    next_steps: Vec<String>,
    #[serde(default)]
    encouragement: Option<String>,
    #[serde(default)]
    recommended_difficulty: Option<String>,
}

/// Validated input for feedback generation.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizOutcome {
    /// Percentage, 0 to 100.
    pub score: f64,
    pub confidence_level: String,
    pub struggle_topics: Vec<String>,
    pub understanding_topics: Vec<String>,
}

impl QuizOutcome {
    pub fn from_request(request: &FeedbackRequest) -> Result<Self, ApiError> {
        let score = request
            .quiz_score
            .filter(|s| s.is_finite())
            .ok_or(ApiError::MissingField("quiz_score"))?;
        let confidence_level = required(&request.confidence_level, "confidence_level")?;
        Ok(Self {
            score: score.clamp(0.0, 100.0),
            confidence_level: confidence_level.to_lowercase(),
            struggle_topics: clean_topics(&request.struggle_topics),
            understanding_topics: clean_topics(&request.understanding_topics),
        })
    }
}

fn clean_topics(topics: &[String]) -> Vec<String> {
    topics
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Never fails once the input is valid; rule-based feedback covers every provider or
/// parsing problem.
pub async fn generate(
    client: Option<&dyn ChatClient>,
    request: &FeedbackRequest,
) -> Result<FeedbackResponse, ApiError> {
    let outcome = QuizOutcome::from_request(request)?;
    let rules = fallback::feedback(&outcome);

    let feedback = match client {
        Some(client) => {
            let chat = ChatRequest::new(
                prompts::FEEDBACK_PROMPT,
                prompts::feedback_request(
                    outcome.score,
                    &outcome.confidence_level,
                    &outcome.struggle_topics,
                    &outcome.understanding_topics,
                ),
            )
            .max_tokens(1000);
            match client.complete(chat).await {
                Ok(text) => merge(&text, rules),
                Err(e) => {
                    warn!(error = %e, "feedback request failed, using rule-based feedback");
                    rules
                }
            }
        }
        None => {
            warn!("no inference credential, using rule-based feedback");
            rules
        }
    };

    info!(score = outcome.score, "feedback ready");
    Ok(FeedbackResponse {
        success: true,
        feedback,
    })
}

/// Model feedback with missing strings taken from the rule-based version.
fn merge(text: &str, rules: Feedback) -> Feedback {
    let raw: RawFeedback = match extract::extract_as(text, &ExtractOptions::lenient()) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "feedback completion did not parse, using rule-based feedback");
            return rules;
        }
    };
    Feedback {
        summary: non_blank(raw.summary).unwrap_or(rules.summary),
        strengths: raw.strengths,
        areas_for_improvement: raw.areas_for_improvement,
        study_tips: raw.study_tips,
        next_steps: raw.next_steps,
        encouragement: non_blank(raw.encouragement).unwrap_or(rules.encouragement),
        recommended_difficulty: non_blank(raw.recommended_difficulty)
            .unwrap_or(rules.recommended_difficulty),
    }
}
