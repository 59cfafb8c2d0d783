use crate::domain::models::{AnsweredQuestion, Category};
use crate::domain::recommendations::{build_prompt, fallback_recommendation, parse_recommendations};
use crate::domain::scoring::ScoreScale;
use crate::error::AppError;
use crate::services::ai::TextGenerator;

/// Sends `prompt` to the generator and returns its raw reply. Failures
/// propagate as `AppError::Upstream`.
pub async fn request_recommendations(
    generator: &dyn TextGenerator,
    prompt: &str,
) -> Result<String, AppError> {
    generator.generate(prompt).await.map_err(|err| {
        tracing::error!("Text generation failed: {}", err);
        AppError::Upstream(err.to_string())
    })
}

/// Recommendations for one category. No answers means no generation call and
/// an empty list; a failed or unusable reply degrades to the category's fixed
/// advisory instead of failing the caller.
pub async fn recommend_for_category(
    generator: &dyn TextGenerator,
    scale: &ScoreScale,
    category: Category,
    answers: &[AnsweredQuestion],
) -> Vec<String> {
    if !answers.iter().any(|a| a.category == category) {
        return Vec::new();
    }

    let prompt = build_prompt(category, scale.max_for(category), answers);
    match request_recommendations(generator, &prompt).await {
        Ok(raw) => {
            let parsed = parse_recommendations(&raw);
            if parsed.is_empty() {
                tracing::warn!("Empty {} recommendations from generator, using fallback", category.as_str());
                vec![fallback_recommendation(category).to_string()]
            } else {
                parsed
            }
        }
        Err(_) => {
            tracing::warn!("Falling back to default {} recommendation", category.as_str());
            vec![fallback_recommendation(category).to_string()]
        }
    }
}
