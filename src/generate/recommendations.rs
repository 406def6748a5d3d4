use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    category,
    error::ApiError,
    extract::{self, ExtractOptions},
    fallback,
    inference::{ChatClient, ChatRequest},
    prompts,
};

use super::{list_under, non_blank, required};

pub const DEFAULT_DIFFICULTY: &str = "Intermediate";
pub const DEFAULT_RELEVANCE: f64 = 0.8;
pub const MIN_RELEVANCE: f64 = 0.7;
pub const MAX_RELEVANCE: f64 = 1.0;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub course_title: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub reason: String,
    pub difficulty: String,
    pub estimated_time: String,
    pub relevance_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecommendation {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default, alias = "estimated_time")]
    estimated_time: Option<String>,
    #[serde(default, alias = "relevance_score")]
    relevance_score: Option<Value>,
}

/// Never fails once `courseTitle` is present: any provider or parsing problem yields the
/// category templates.
pub async fn generate(
    client: Option<&dyn ChatClient>,
    request: &RecommendationRequest,
) -> Result<RecommendationResponse, ApiError> {
    let course_title = required(&request.course_title, "courseTitle")?;
    let category = category::classify(course_title);

    let recommendations = match client {
        Some(client) => {
            let chat = ChatRequest::new(
                prompts::RECOMMENDATIONS_PROMPT,
                prompts::recommendations_request(
                    course_title,
                    &request.topics,
                    request.progress,
                    request.score,
                ),
            )
            .max_tokens(1500);
            match client.complete(chat).await {
                Ok(text) => parse_recommendations(&text),
                Err(e) => {
                    warn!(error = %e, course_title, "recommendation request failed");
                    Vec::new()
                }
            }
        }
        None => {
            warn!("no inference credential, serving template recommendations");
            Vec::new()
        }
    };

    let recommendations = if recommendations.is_empty() {
        fallback::recommendations(course_title, category)
    } else {
        recommendations
    };
    info!(course_title, count = recommendations.len(), "recommendations ready");
    Ok(RecommendationResponse { recommendations })
}

/// Items without a title are dropped; every other missing field is defaulted.
pub fn parse_recommendations(text: &str) -> Vec<Recommendation> {
    let value = match extract::extract_json(text, &ExtractOptions::lenient()) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "recommendation completion did not parse");
            return Vec::new();
        }
    };
    list_under(value, "recommendations")
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawRecommendation>(item).ok())
        .filter_map(normalize)
        .collect()
}

fn normalize(raw: RawRecommendation) -> Option<Recommendation> {
    let title = non_blank(raw.title)?;
    Some(Recommendation {
        title,
        description: non_blank(raw.description).unwrap_or_default(),
        reason: non_blank(raw.reason).unwrap_or_default(),
        difficulty: non_blank(raw.difficulty).unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
        estimated_time: non_blank(raw.estimated_time).unwrap_or_else(|| "30 minutes".to_string()),
        relevance_score: clamp_relevance(raw.relevance_score.as_ref().and_then(score_value)),
    })
}

fn score_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn clamp_relevance(score: Option<f64>) -> f64 {
    match score {
        Some(s) if s.is_finite() => s.clamp(MIN_RELEVANCE, MAX_RELEVANCE),
        _ => DEFAULT_RELEVANCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_relevance_into_range() {
        assert_eq!(clamp_relevance(Some(0.2)), 0.7);
        assert_eq!(clamp_relevance(Some(3.0)), 1.0);
        assert_eq!(clamp_relevance(Some(0.85)), 0.85);
        assert_eq!(clamp_relevance(Some(f64::NAN)), DEFAULT_RELEVANCE);
        assert_eq!(clamp_relevance(None), DEFAULT_RELEVANCE);
    }

    #[test]
    fn defaults_missing_fields_individually() {
        let text = r#"Sure: {"recommendations": [
            {"title": "Closures", "relevanceScore": "0.95"},
            {"description": "no title"},
            {"title": "Traits", "difficulty": "Advanced", "relevanceScore": 0.1, "estimatedTime": "1 hour"}
        ]}"#;
        let recs = parse_recommendations(text);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(recs[0].relevance_score, 0.95);
        assert_eq!(recs[1].difficulty, "Advanced");
        assert_eq!(recs[1].relevance_score, MIN_RELEVANCE);
        assert_eq!(recs[1].estimated_time, "1 hour");
    }

    #[test]
    fn bare_array_is_accepted() {
        let recs = parse_recommendations(r#"[{"title": "Borrowing"}]"#);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn garbage_yields_nothing() {
        assert!(parse_recommendations("no idea").is_empty());
    }
}
