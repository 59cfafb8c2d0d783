use crate::domain::models::{AnsweredQuestion, Category};
use crate::domain::scoring::raw_total;
use serde::Serialize;

pub const PHYSICAL_FALLBACK: &str =
    "Please consult with a healthcare professional for personalized recommendations.";
pub const MENTAL_FALLBACK: &str =
    "Please consult with a mental health professional for personalized recommendations.";

pub fn fallback_recommendation(category: Category) -> &'static str {
    match category {
        Category::Physical => PHYSICAL_FALLBACK,
        Category::Mental => MENTAL_FALLBACK,
    }
}

struct Framing {
    role: &'static str,
    focus: &'static str,
    verbs: &'static str,
    goal: &'static str,
}

fn framing(category: Category) -> Framing {
    match category {
        Category::Physical => Framing {
            role: "physical health assistant",
            focus: "fitness, endurance, or body conditioning relevant to space travel",
            verbs: "'Increase', 'Train', 'Perform'",
            goal: "improving physical health before preparing to fly to space",
        },
        Category::Mental => Framing {
            role: "mental health assistant",
            focus: "psychological resilience, stress management, or cognitive performance relevant to space travel",
            verbs: "'Practice', 'Enhance', 'Develop'",
            goal: "improving mental readiness before preparing to fly to space",
        },
    }
}

#[derive(Serialize)]
struct PromptEntry<'a> {
    domain: &'a str,
    question: &'a str,
    answer: &'a str,
    score: i32,
}

/// Renders the instruction block sent to the text generator. Only answers of
/// `category` are included; output depends on nothing but the arguments.
pub fn build_prompt(category: Category, max_score: u32, answers: &[AnsweredQuestion]) -> String {
    let details = framing(category);
    let total = raw_total(category, answers);
    let entries: Vec<PromptEntry<'_>> = answers
        .iter()
        .filter(|a| a.category == category)
        .map(|a| PromptEntry {
            domain: &a.domain,
            question: &a.question_text,
            answer: &a.option_text,
            score: a.option_value,
        })
        .collect();
    let formatted = serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string());
    let category_name = category.as_str();

    format!(
        "You are a professional {role} evaluating an astronaut candidate's readiness for spaceflight.
The user completed a {category_name} health survey with a score of {total} out of {max_score} (maximum possible score is {max_score}).

Below are the questions, their domains, user responses, and corresponding scores (0–3):

{formatted}

Based on this performance (score: {total}/{max_score}), give exactly 3 short, action-based recommendations (each ≤10 words) for {goal}.

Each recommendation must:
- Begin with a verb (e.g., {verbs})
- Be specific, expert, and practical
- Focus only on {focus}

Output format:
1. …
2. …
3. …

No introductions, summaries, or explanations. Output the 3 recommendations only.",
        role = details.role,
        goal = details.goal,
        verbs = details.verbs,
        focus = details.focus,
    )
}

/// Splits a free-form reply into directives: one per non-empty line, with any
/// leading `"<digits>."` marker removed. Never fails; count is not enforced.
pub fn parse_recommendations(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| strip_enumeration(line.trim()).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

fn strip_enumeration(line: &str) -> &str {
    let digits = line.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return line;
    }
    match line[digits..].strip_prefix('.') {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

/// The one place stored recommendation lists are decoded. The canonical form is
/// a JSON array of strings and comes back exactly as written. Rows written by
/// older clients may instead hold a string containing either a JSON array or
/// newline separated text; only those are trimmed and cleaned of blank entries.
pub fn decode_stored_recommendations(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Null => Vec::new(),
        serde_json::Value::Array(items) => items.iter().filter_map(array_entry).collect(),
        serde_json::Value::String(text) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(array_entry)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => parse_recommendations(text),
        },
        other => parse_recommendations(&other.to_string()),
    }
}

fn array_entry(item: &serde_json::Value) -> Option<String> {
    match item {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
