use crate::domain::models::{AnsweredQuestion, Category, Question};
use serde::{Deserialize, Serialize};

/// Maximum attainable score of the seeded question set: 8 questions per
/// category, each topping out at 3.
pub const DEFAULT_PHYSICAL_MAX_SCORE: u32 = 24;
pub const DEFAULT_MENTAL_MAX_SCORE: u32 = 24;

/// Per-category denominators used to turn raw sums into percentages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreScale {
    pub physical_max: u32,
    pub mental_max: u32,
}

impl Default for ScoreScale {
    fn default() -> Self {
        Self {
            physical_max: DEFAULT_PHYSICAL_MAX_SCORE,
            mental_max: DEFAULT_MENTAL_MAX_SCORE,
        }
    }
}

impl ScoreScale {
    pub fn max_for(&self, category: Category) -> u32 {
        match category {
            Category::Physical => self.physical_max,
            Category::Mental => self.mental_max,
        }
    }

    /// Sum of every question's top option value, per category. Falls back to
    /// `fallback` for a category with no questions so the scale stays positive.
    pub fn derive(questions: &[Question], fallback: ScoreScale) -> ScoreScale {
        let sum_for = |category: Category| -> u32 {
            questions
                .iter()
                .filter(|q| q.category == category)
                .map(|q| q.max_option_value().max(0) as u32)
                .sum()
        };
        let physical = sum_for(Category::Physical);
        let mental = sum_for(Category::Mental);
        ScoreScale {
            physical_max: if physical > 0 { physical } else { fallback.physical_max },
            mental_max: if mental > 0 { mental } else { fallback.mental_max },
        }
    }
}

/// Raw total of the selected option values for `category`.
pub fn raw_total(category: Category, answers: &[AnsweredQuestion]) -> i64 {
    answers
        .iter()
        .filter(|a| a.category == category)
        .map(|a| a.option_value as i64)
        .sum()
}

/// Percentage (0..=100) of the category maximum reached by `answers`.
/// Answers belonging to other categories do not count.
pub fn score_category(scale: &ScoreScale, category: Category, answers: &[AnsweredQuestion]) -> i32 {
    let max = scale.max_for(category);
    if max == 0 {
        return 0;
    }
    let total = raw_total(category, answers).max(0) as f64;
    let pct = (total / max as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as i32
}

/// Unweighted mean of the two category percentages.
pub fn score_overall(physical: i32, mental: i32) -> i32 {
    ((physical + mental) as f64 / 2.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ResponseOption;
    use uuid::Uuid;

    fn answer(category: Category, value: i32) -> AnsweredQuestion {
        AnsweredQuestion {
            question_id: Uuid::new_v4(),
            category,
            domain: "Domain".into(),
            question_text: "Question?".into(),
            option_text: format!("Option {value}"),
            option_value: value,
        }
    }

    #[test]
    fn empty_category_scores_zero() {
        let scale = ScoreScale::default();
        assert_eq!(score_category(&scale, Category::Physical, &[]), 0);
        assert_eq!(score_category(&scale, Category::Mental, &[]), 0);
    }

    #[test]
    fn score_is_rounded_percentage_of_max() {
        let scale = ScoreScale { physical_max: 30, mental_max: 30 };
        let answers = vec![answer(Category::Physical, 3), answer(Category::Physical, 2)];
        // 5 / 30 = 16.67%
        assert_eq!(score_category(&scale, Category::Physical, &answers), 17);
    }

    #[test]
    fn other_categories_are_ignored() {
        let scale = ScoreScale::default();
        let answers = vec![answer(Category::Mental, 3)];
        assert_eq!(score_category(&scale, Category::Physical, &answers), 0);
        assert_eq!(score_category(&scale, Category::Mental, &answers), 13);
    }

    #[test]
    fn score_stays_within_bounds_when_max_is_understated() {
        let scale = ScoreScale { physical_max: 3, mental_max: 3 };
        let answers = vec![answer(Category::Physical, 3), answer(Category::Physical, 3)];
        assert_eq!(score_category(&scale, Category::Physical, &answers), 100);
    }

    #[test]
    fn adding_positive_answers_never_lowers_score() {
        let scale = ScoreScale::default();
        let mut answers = Vec::new();
        let mut previous = score_category(&scale, Category::Mental, &answers);
        for value in [1, 0, 3, 2, 3, 1, 2, 3, 3, 3] {
            answers.push(answer(Category::Mental, value));
            let current = score_category(&scale, Category::Mental, &answers);
            assert!(current >= previous, "{current} < {previous}");
            assert!((0..=100).contains(&current));
            previous = current;
        }
    }

    #[test]
    fn overall_is_rounded_mean() {
        assert_eq!(score_overall(60, 86), 73);
        assert_eq!(score_overall(67, 0), 34);
        assert_eq!(score_overall(0, 0), 0);
        assert_eq!(score_overall(100, 100), 100);
        for p in (0..=100).step_by(7) {
            for m in (0..=100).step_by(11) {
                let expected = ((p + m) as f64 / 2.0).round() as i32;
                assert_eq!(score_overall(p, m), expected);
            }
        }
    }

    #[test]
    fn derived_scale_sums_top_option_per_question() {
        let question = |category, values: &[i32]| Question {
            id: Uuid::new_v4(),
            question_number: 1,
            category,
            domain: "Domain".into(),
            question_text: "Q".into(),
            advanced_question_text: None,
            advanced_question_note: None,
            response_options: values
                .iter()
                .map(|v| ResponseOption {
                    id: Uuid::new_v4(),
                    option_text: v.to_string(),
                    option_value: *v,
                })
                .collect(),
        };
        let questions = vec![
            question(Category::Physical, &[0, 1, 2, 3]),
            question(Category::Physical, &[0, 4]),
        ];
        let scale = ScoreScale::derive(&questions, ScoreScale::default());
        assert_eq!(scale.physical_max, 7);
        assert_eq!(scale.mental_max, DEFAULT_MENTAL_MAX_SCORE);
    }
}
