use super::Store;
use crate::domain::models::{Category, NewQuestion};
use anyhow::Result;

struct SeedQuestion<'a> {
    domain: &'a str,
    text: &'a str,
    advanced: Option<(&'a str, &'a str)>,
    options: [&'a str; 4],
}

const PHYSICAL: &[SeedQuestion<'static>] = &[
    SeedQuestion {
        domain: "Cardiovascular Fitness",
        text: "How many minutes of moderate-to-vigorous aerobic exercise do you do per week?",
        advanced: Some((
            "Have you completed a VO2 max or treadmill stress test in the last 12 months?",
            "Upload the test report if available.",
        )),
        options: ["Less than 30 minutes", "30-90 minutes", "90-150 minutes", "More than 150 minutes"],
    },
    SeedQuestion {
        domain: "Musculoskeletal Strength",
        text: "How often do you perform resistance or strength training?",
        advanced: None,
        options: ["Never", "Once a week", "2-3 times a week", "4 or more times a week"],
    },
    SeedQuestion {
        domain: "Flexibility & Mobility",
        text: "How would you rate your flexibility and joint mobility?",
        advanced: None,
        options: ["Very limited", "Somewhat limited", "Good", "Excellent"],
    },
    SeedQuestion {
        domain: "Vestibular Tolerance",
        text: "How often do you experience motion sickness or dizziness?",
        advanced: None,
        options: ["Frequently", "Sometimes", "Rarely", "Never"],
    },
    SeedQuestion {
        domain: "Body Composition",
        text: "How would you describe your current body composition relative to medical guidance?",
        advanced: Some((
            "Do you have a recent body composition scan (DEXA or bioimpedance)?",
            "Upload the scan summary if available.",
        )),
        options: ["Well outside the healthy range", "Slightly outside", "Within range", "Optimal"],
    },
    SeedQuestion {
        domain: "Bone Health",
        text: "Have you been diagnosed with low bone density or had a stress fracture?",
        advanced: None,
        options: ["Yes, untreated", "Yes, under treatment", "Not tested", "No"],
    },
    SeedQuestion {
        domain: "Sleep Recovery",
        text: "How rested do you feel after a typical night's sleep?",
        advanced: None,
        options: ["Never rested", "Rarely rested", "Usually rested", "Always rested"],
    },
    SeedQuestion {
        domain: "Medical History",
        text: "Do you have any chronic condition that limits physical exertion?",
        advanced: Some((
            "Has a physician cleared you for high-G or high-altitude activity?",
            "Upload the clearance letter if available.",
        )),
        options: ["Yes, severely", "Yes, moderately", "Yes, mildly", "No"],
    },
];

const MENTAL: &[SeedQuestion<'static>] = &[
    SeedQuestion {
        domain: "Stress Management",
        text: "How well do you cope with high-pressure situations?",
        advanced: None,
        options: ["Very poorly", "Poorly", "Well", "Very well"],
    },
    SeedQuestion {
        domain: "Isolation Tolerance",
        text: "How comfortable are you spending long periods in confined or isolated spaces?",
        advanced: None,
        options: ["Very uncomfortable", "Uncomfortable", "Comfortable", "Very comfortable"],
    },
    SeedQuestion {
        domain: "Emotional Regulation",
        text: "How quickly do you recover from frustration or anxiety?",
        advanced: None,
        options: ["Hours or days", "About an hour", "Within minutes", "Almost immediately"],
    },
    SeedQuestion {
        domain: "Cognitive Performance",
        text: "How well can you maintain focus on detailed tasks for extended periods?",
        advanced: Some((
            "Have you completed a standardized cognitive assessment recently?",
            "Upload the assessment results if available.",
        )),
        options: ["Not at all", "For short periods", "For most of a shift", "Consistently"],
    },
    SeedQuestion {
        domain: "Teamwork",
        text: "How effectively do you resolve conflicts within a small team?",
        advanced: None,
        options: ["I avoid them", "With difficulty", "Effectively", "Very effectively"],
    },
    SeedQuestion {
        domain: "Adaptability",
        text: "How do you respond when plans change unexpectedly?",
        advanced: None,
        options: ["I struggle a lot", "I need time", "I adjust quickly", "I thrive on change"],
    },
    SeedQuestion {
        domain: "Mood Stability",
        text: "How often have you felt down or hopeless in the past two weeks?",
        advanced: Some((
            "Are you currently working with a mental health professional?",
            "Upload a summary letter if you wish.",
        )),
        options: ["Nearly every day", "More than half the days", "Several days", "Not at all"],
    },
    SeedQuestion {
        domain: "Sleep Quality",
        text: "How often does worry keep you awake at night?",
        advanced: None,
        options: ["Nearly every night", "Often", "Occasionally", "Never"],
    },
];

fn to_new_question(category: Category, index: usize, seed: &SeedQuestion<'_>) -> NewQuestion {
    NewQuestion {
        question_number: index as i32 + 1,
        category,
        domain: seed.domain.to_string(),
        question_text: seed.text.to_string(),
        advanced_question_text: seed.advanced.map(|(text, _)| text.to_string()),
        advanced_question_note: seed.advanced.map(|(_, note)| note.to_string()),
        options: seed
            .options
            .iter()
            .enumerate()
            .map(|(value, text)| (text.to_string(), value as i32))
            .collect(),
    }
}

/// The built-in questionnaire: 8 questions per category, options valued 0..=3.
pub fn reference_questions() -> Vec<NewQuestion> {
    let physical = PHYSICAL
        .iter()
        .enumerate()
        .map(|(i, q)| to_new_question(Category::Physical, i, q));
    let mental = MENTAL
        .iter()
        .enumerate()
        .map(|(i, q)| to_new_question(Category::Mental, i, q));
    physical.chain(mental).collect()
}

/// Inserts the reference questionnaire when the question table is empty.
/// Returns the number of questions inserted.
pub async fn seed_questions(store: &dyn Store) -> Result<usize> {
    if store.count_questions().await? > 0 {
        tracing::debug!("Questions already present, skipping seed");
        return Ok(0);
    }
    let questions = reference_questions();
    for question in &questions {
        store.insert_question(question).await?;
    }
    tracing::info!("Seeded {} questions", questions.len());
    Ok(questions.len())
}
