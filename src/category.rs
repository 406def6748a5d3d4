//! Keyword-based course categories.
//!
//! One table drives every place that needs a category: course listings, template
//! recommendations, roadmap fallbacks, and remediation hints in feedback.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Language,
    WebDevelopment,
    DataScience,
    Programming,
    Business,
    Design,
    General,
}

// First match wins, so more specific categories come first.
const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Language,
        &[
            "spanish", "french", "german", "italian", "portuguese", "japanese", "chinese",
            "mandarin", "korean", "arabic", "russian", "english", "language learning",
            "sign language", "grammar", "vocabulary", "conversation",
        ],
    ),
    (
        Category::WebDevelopment,
        &[
            "react", "javascript", "typescript", "html", "css", "web", "frontend", "backend",
            "node", "nodejs", "vue", "angular", "nextjs", "tailwind",
        ],
    ),
    (
        Category::DataScience,
        &[
            "data science", "machine learning", "deep learning", "ai", "artificial intelligence",
            "statistics", "analytics", "pandas", "data", "sql",
        ],
    ),
    (
        Category::Programming,
        &[
            "python", "java", "rust", "golang", "c++", "c#", "programming", "coding",
            "algorithms", "software", "kotlin", "swift",
        ],
    ),
    (
        Category::Business,
        &[
            "business", "marketing", "finance", "management", "entrepreneurship", "sales",
            "accounting", "economics", "leadership",
        ],
    ),
    (
        Category::Design,
        &[
            "design", "ui", "ux", "figma", "illustration", "photography", "drawing", "art",
        ],
    ),
];

const REMEDIATION: &[(&[&str], &str)] = &[
    (
        &["loop", "loops", "iteration"],
        "Trace a short loop by hand, writing down each variable after every pass.",
    ),
    (
        &["function", "functions", "parameters", "return"],
        "Rewrite one earlier exercise as a small function with clear inputs and a return value.",
    ),
    (
        &["variable", "variables", "types"],
        "Make a table of five variables with their type and a sample value.",
    ),
    (
        &["recursion", "recursive"],
        "Draw the call stack for a recursive call with a small input.",
    ),
    (
        &["async", "promise", "promises", "await"],
        "Log before and after each await to see the order things actually run in.",
    ),
    (
        &["state", "hooks", "component", "components"],
        "Build a counter component and change it one feature at a time.",
    ),
    (
        &["css", "layout", "flexbox", "grid"],
        "Recreate a simple layout with borders on every box so the structure is visible.",
    ),
    (
        &["grammar", "conjugation", "verbs", "tenses"],
        "Write five short sentences using the pattern, then read them aloud.",
    ),
    (
        &["vocabulary", "words"],
        "Review the lesson words with spaced flashcards for ten minutes a day.",
    ),
    (
        &["pronunciation", "listening", "speaking"],
        "Shadow a short native recording, pausing after each sentence to repeat it.",
    ),
    (
        &["statistics", "probability", "math"],
        "Work one example by hand before using a library to check the result.",
    ),
];

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Language => "Language Learning",
            Category::WebDevelopment => "Web Development",
            Category::DataScience => "Data Science",
            Category::Programming => "Programming",
            Category::Business => "Business",
            Category::Design => "Design",
            Category::General => "General",
        }
    }

    /// Accepts the category names clients send, e.g. `"web development"` or `"data_science"`.
    pub fn parse(name: &str) -> Option<Category> {
        let normalized = name.trim().to_lowercase().replace(['_', '-'], " ");
        let category = match normalized.as_str() {
            "language" | "languages" | "language learning" => Category::Language,
            "web" | "web development" | "webdev" => Category::WebDevelopment,
            "data" | "data science" => Category::DataScience,
            "programming" | "coding" | "software" => Category::Programming,
            "business" => Category::Business,
            "design" => Category::Design,
            "general" => Category::General,
            _ => return None,
        };
        Some(category)
    }

    /// Uses the client's label when it names a category, otherwise classifies the label
    /// text and finally the title.
    pub fn resolve(label: Option<&str>, title: &str) -> Category {
        let label = label.map(str::trim).filter(|l| !l.is_empty());
        if let Some(category) = label.and_then(Category::parse) {
            return category;
        }
        match label.map(classify) {
            Some(category) if category != Category::General => category,
            _ => classify(title),
        }
    }
}

fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|w| !w.is_empty())
        .collect();
    format!(" {} ", words.join(" "))
}

fn contains_keyword(normalized: &str, keyword: &str) -> bool {
    normalized.contains(&format!(" {} ", keyword))
}

pub fn classify(title: &str) -> Category {
    let normalized = normalize(title);
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| contains_keyword(&normalized, w)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}

/// A concrete study suggestion for a self-reported struggle topic.
pub fn remediation_for(topic: &str) -> Option<&'static str> {
    let normalized = normalize(topic);
    REMEDIATION
        .iter()
        .find(|(words, _)| words.iter().any(|w| contains_keyword(&normalized, w)))
        .map(|(_, hint)| *hint)
}
