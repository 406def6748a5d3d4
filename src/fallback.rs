//! Hard-coded content served when a completion cannot be used.
//!
//! Everything here is deterministic for a given input and already in the shape the
//! matching endpoint promises.

use reqwest::Url;

use crate::{
    category::{self, Category},
    generate::{
        feedback::{Feedback, QuizOutcome},
        recommendations::Recommendation,
        roadmap::{ContentType, Opportunity, Project, RoadmapContent},
    },
    models::{CourseContent, GeneratedLesson, GeneratedModule, GeneratedQuestion, GeneratedResource},
};

fn search_url(base: &str, param: &str, query: &str) -> String {
    Url::parse_with_params(base, &[(param, query)])
        .map(String::from)
        .unwrap_or_else(|_| base.to_string())
}

/// A single-module course with one complete lesson.
pub fn course(title: &str, audience_level: &str, duration: &str) -> CourseContent {
    let lesson = GeneratedLesson {
        title: format!("Getting Started with {}", title),
        objectives: vec![
            format!("Understand what {} is and where it is used", title),
            format!("Learn the core vocabulary of {}", title),
            "Set up a regular practice routine".to_string(),
        ],
        content: format!(
            "Welcome to {title}. This {duration} course is designed for {level} learners. \
             In this first lesson you will get an overview of the subject, learn the key terms \
             you will meet again later, and plan how to practice. Start by writing down what you \
             already know about {title} and what you want to be able to do by the end. Then work \
             through the objectives above one at a time, taking short notes in your own words. \
             Revisit those notes before each new lesson; small, regular sessions build skill \
             faster than occasional long ones.",
            title = title,
            duration = duration,
            level = audience_level.to_lowercase(),
        ),
        quiz: vec![
            GeneratedQuestion {
                question: format!("What is the best first step when starting to learn {}?", title),
                options: vec![
                    "Understand the core concepts and vocabulary".to_string(),
                    "Skip straight to the most advanced topics".to_string(),
                    "Memorize everything without practicing".to_string(),
                    "Avoid asking questions".to_string(),
                ],
                correct_answer: "Understand the core concepts and vocabulary".to_string(),
            },
            GeneratedQuestion {
                question: format!("How do new {} skills stick best?", title),
                options: vec![
                    "Read the material once and move on".to_string(),
                    "Practice regularly in short sessions".to_string(),
                    "Only watch other people do it".to_string(),
                    "Wait until you feel completely ready".to_string(),
                ],
                correct_answer: "Practice regularly in short sessions".to_string(),
            },
        ],
        resources: vec![
            GeneratedResource {
                title: format!("{} on Wikipedia", title),
                url: search_url("https://en.wikipedia.org/w/index.php", "search", title),
            },
            GeneratedResource {
                title: format!("{} tutorials on YouTube", title),
                url: search_url("https://www.youtube.com/results", "search_query", title),
            },
        ],
    };

    CourseContent {
        modules: vec![GeneratedModule {
            title: format!("Introduction to {}", title),
            lessons: vec![lesson],
        }],
    }
}

struct Template {
    title: &'static str,
    description: &'static str,
    difficulty: &'static str,
    estimated_time: &'static str,
}

const fn template(
    title: &'static str,
    description: &'static str,
    difficulty: &'static str,
    estimated_time: &'static str,
) -> Template {
    Template {
        title,
        description,
        difficulty,
        estimated_time,
    }
}

fn templates(category: Category) -> [Template; 3] {
    match category {
        Category::Language => [
            template("Everyday Conversation Drills", "Practice greetings, questions, and short exchanges you will use daily.", "Beginner", "20 minutes"),
            template("Core Grammar Review", "Revisit the sentence patterns from recent lessons with short writing exercises.", "Intermediate", "30 minutes"),
            template("Listening Practice", "Follow a short native recording and summarize it in your own words.", "Intermediate", "25 minutes"),
        ],
        Category::WebDevelopment => [
            template("Build a Small Interactive Page", "Combine markup, styling, and a little scripting into one working page.", "Beginner", "45 minutes"),
            template("Component Thinking", "Split an interface into reusable pieces and pass data between them.", "Intermediate", "40 minutes"),
            template("Debugging in the Browser", "Use developer tools to inspect elements, network calls, and errors.", "Intermediate", "30 minutes"),
        ],
        Category::DataScience => [
            template("Exploring a Real Dataset", "Load a small public dataset and describe it with summary statistics.", "Beginner", "40 minutes"),
            template("Visualizing Patterns", "Chart relationships in the data and write down what they suggest.", "Intermediate", "35 minutes"),
            template("Your First Model", "Train and evaluate a simple model, then explain its mistakes.", "Advanced", "60 minutes"),
        ],
        Category::Programming => [
            template("Practice Problems", "Solve three short exercises that reuse the constructs from recent lessons.", "Beginner", "30 minutes"),
            template("Refactoring Exercise", "Take working code and make it clearer without changing its behavior.", "Intermediate", "40 minutes"),
            template("Mini Project", "Build a small program end to end, from idea to working version.", "Intermediate", "90 minutes"),
        ],
        Category::Business => [
            template("Case Study Analysis", "Read a short business case and identify the key decision and its trade-offs.", "Beginner", "30 minutes"),
            template("Apply a Framework", "Use a framework from the course on a company you know.", "Intermediate", "40 minutes"),
            template("Pitch Practice", "Summarize an idea in a two-minute pitch and refine it.", "Intermediate", "25 minutes"),
        ],
        Category::Design => [
            template("Design Critique", "Critique an existing design against the principles from the course.", "Beginner", "25 minutes"),
            template("Redesign Challenge", "Improve a small interface or layout and explain each change.", "Intermediate", "45 minutes"),
            template("Build a Mini Portfolio Piece", "Take one exercise to a finished, presentable state.", "Advanced", "90 minutes"),
        ],
        Category::General => [
            template("Review Key Concepts", "Go back over the main ideas so far and summarize each in one sentence.", "Beginner", "20 minutes"),
            template("Apply What You Learned", "Use the material on a small real-world task of your own.", "Intermediate", "40 minutes"),
            template("Teach It Back", "Explain the hardest topic so far as if teaching a friend.", "Intermediate", "20 minutes"),
        ],
    }
}

pub fn recommendations(course_title: &str, category: Category) -> Vec<Recommendation> {
    templates(category)
        .into_iter()
        .zip([0.9, 0.85, 0.8])
        .map(|(t, relevance_score)| Recommendation {
            title: t.title.to_string(),
            description: t.description.to_string(),
            reason: format!("A good next step for {}.", course_title),
            difficulty: t.difficulty.to_string(),
            estimated_time: t.estimated_time.to_string(),
            relevance_score,
        })
        .collect()
}

/// Rule-based feedback from score bands, confidence, and topic keywords.
pub fn feedback(outcome: &QuizOutcome) -> Feedback {
    let score = outcome.score;
    let (summary, recommended_difficulty, next_steps) = if score >= 80.0 {
        (
            format!("Great result: you scored {:.0}%. You have a strong grasp of this lesson.", score),
            "harder",
            vec![
                "Move on to the next lesson".to_string(),
                "Try a more challenging exercise on this topic".to_string(),
            ],
        )
    } else if score >= 60.0 {
        (
            format!("Solid effort: you scored {:.0}%. A little review will lock this in.", score),
            "same",
            vec![
                "Review the questions you missed".to_string(),
                "Continue to the next lesson when the review feels easy".to_string(),
            ],
        )
    } else {
        (
            format!("You scored {:.0}%. This lesson needs another pass before moving on.", score),
            "easier",
            vec![
                "Re-read the lesson content".to_string(),
                "Retake the quiz after reviewing".to_string(),
            ],
        )
    };

    let mut strengths: Vec<String> = outcome
        .understanding_topics
        .iter()
        .map(|t| format!("Good understanding of {}", t))
        .collect();
    if strengths.is_empty() && score >= 60.0 {
        strengths.push("Good overall understanding of the material".to_string());
    }

    let mut study_tips: Vec<String> = Vec::new();
    for topic in &outcome.struggle_topics {
        if let Some(hint) = category::remediation_for(topic) {
            if !study_tips.iter().any(|t| t == hint) {
                study_tips.push(hint.to_string());
            }
        }
    }
    if study_tips.is_empty() {
        study_tips.push("Summarize the lesson in your own words, then check it against the text.".to_string());
    }

    let encouragement = match (outcome.confidence_level.as_str(), score >= 70.0) {
        ("low", true) => "You know more than you think. Trust what you have learned.",
        ("high", false) => "Confidence is great; pair it with a careful review to match it.",
        (_, true) => "Keep up the momentum!",
        (_, false) => "Every expert started here. Keep practicing and it will click.",
    };

    Feedback {
        summary,
        strengths,
        areas_for_improvement: outcome.struggle_topics.clone(),
        study_tips,
        next_steps,
        encouragement: encouragement.to_string(),
        recommended_difficulty: recommended_difficulty.to_string(),
    }
}

pub fn roadmap(course_title: &str, category: Category, content_type: ContentType) -> RoadmapContent {
    match content_type {
        ContentType::Projects => RoadmapContent::Projects {
            projects: vec![Project {
                title: format!("{} Capstone Project", course_title),
                description: format!(
                    "Plan and build a small project that uses the main skills from {}, then write a short summary of what you learned.",
                    course_title
                ),
                difficulty: "Intermediate".to_string(),
                estimated_time: "2 weeks".to_string(),
                skills: vec![category.label().to_string(), "Planning".to_string()],
                deliverables: vec![
                    "A working project".to_string(),
                    "A short write-up of decisions and lessons learned".to_string(),
                ],
            }],
        },
        ContentType::Opportunities => RoadmapContent::Opportunities {
            opportunities: vec![Opportunity {
                title: format!("Join a {} community", category.label()),
                description: format!(
                    "Find a community of people learning {} to share progress, ask questions, and hear about openings.",
                    course_title
                ),
                kind: "community".to_string(),
                requirements: vec![format!("Completed {}", course_title)],
                where_to_find: "Online forums, local meetups, and study groups".to_string(),
            }],
        },
    }
}
