use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    category::Category,
    error::ApiError,
    extract::{self, ExtractOptions},
    fallback,
    inference::{ChatClient, ChatRequest},
    prompts,
};

use super::{list_under, non_blank, required};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Projects,
    Opportunities,
}

impl ContentType {
    pub fn parse(value: &str) -> Option<ContentType> {
        match value.trim().to_lowercase().as_str() {
            "projects" | "project" => Some(ContentType::Projects),
            "opportunities" | "opportunity" | "careers" => Some(ContentType::Opportunities),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            ContentType::Projects => "projects",
            ContentType::Opportunities => "opportunities",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapRequest {
    #[serde(default)]
    pub course_title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default, alias = "estimated_time")]
    pub estimated_time: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default, alias = "where_to_find")]
    pub where_to_find: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RoadmapContent {
    Projects { projects: Vec<Project> },
    Opportunities { opportunities: Vec<Opportunity> },
}

impl RoadmapContent {
    pub fn is_empty(&self) -> bool {
        match self {
            RoadmapContent::Projects { projects } => projects.is_empty(),
            RoadmapContent::Opportunities { opportunities } => opportunities.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoadmapResponse {
    pub success: bool,
    pub content: RoadmapContent,
}

pub async fn generate(
    client: Option<&dyn ChatClient>,
    request: &RoadmapRequest,
) -> Result<RoadmapResponse, ApiError> {
    let course_title = required(&request.course_title, "courseTitle")?;
    let category_label = required(&request.category, "category")?;
    let raw_type = required(&request.content_type, "contentType")?;
    let content_type = ContentType::parse(raw_type).ok_or_else(|| ApiError::InvalidField {
        field: "contentType",
        value: raw_type.to_string(),
    })?;
    let category = Category::resolve(Some(category_label), course_title);

    let system = match content_type {
        ContentType::Projects => prompts::PROJECTS_PROMPT,
        ContentType::Opportunities => prompts::OPPORTUNITIES_PROMPT,
    };
    let parsed = match client {
        Some(client) => {
            let chat = ChatRequest::new(system, prompts::roadmap_request(course_title, category_label))
                .max_tokens(1500);
            match client.complete(chat).await {
                Ok(text) => parse_content(&text, content_type),
                Err(e) => {
                    warn!(error = %e, course_title, "roadmap request failed");
                    None
                }
            }
        }
        None => {
            warn!("no inference credential, serving roadmap template");
            None
        }
    };

    let content = parsed.unwrap_or_else(|| fallback::roadmap(course_title, category, content_type));
    info!(course_title, kind = content_type.key(), "roadmap content ready");
    Ok(RoadmapResponse {
        success: true,
        content,
    })
}

/// Untitled items are dropped; `None` when nothing is left.
pub fn parse_content(text: &str, content_type: ContentType) -> Option<RoadmapContent> {
    let value = match extract::extract_json(text, &ExtractOptions::lenient()) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "roadmap completion did not parse");
            return None;
        }
    };
    let items = list_under(value, content_type.key());
    let content = match content_type {
        ContentType::Projects => RoadmapContent::Projects {
            projects: items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<Project>(item).ok())
                .filter_map(normalize_project)
                .collect(),
        },
        ContentType::Opportunities => RoadmapContent::Opportunities {
            opportunities: items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<Opportunity>(item).ok())
                .filter_map(normalize_opportunity)
                .collect(),
        },
    };
    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}

fn normalize_project(mut project: Project) -> Option<Project> {
    project.title = non_blank(Some(project.title))?;
    project.difficulty = non_blank(Some(project.difficulty))
        .unwrap_or_else(|| super::recommendations::DEFAULT_DIFFICULTY.to_string());
    Some(project)
}

fn normalize_opportunity(mut opportunity: Opportunity) -> Option<Opportunity> {
    opportunity.title = non_blank(Some(opportunity.title))?;
    opportunity.kind = non_blank(Some(opportunity.kind)).unwrap_or_else(|| "community".to_string());
    Some(opportunity)
}
