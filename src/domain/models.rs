use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Physical,
    Mental,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Physical, Category::Mental];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Physical => "physical",
            Category::Mental => "mental",
        }
    }
}

impl TryFrom<&str> for Category {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "physical" => Ok(Category::Physical),
            "mental" => Ok(Category::Mental),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    InProgress,
    Completed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::InProgress => "in_progress",
            SubmissionStatus::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for SubmissionStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "in_progress" => Ok(SubmissionStatus::InProgress),
            "completed" => Ok(SubmissionStatus::Completed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_picture_url: Option<String>,
    pub weight: Option<f64>,
    pub weight_unit: Option<String>,
    pub height: Option<f64>,
    pub height_unit: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub country: Option<String>,
    pub sleep_time: Option<f64>,
    pub biological_sex: Option<String>,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub external_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Partial profile edit. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture_url: Option<String>,
    pub weight: Option<f64>,
    pub weight_unit: Option<String>,
    pub height: Option<f64>,
    pub height_unit: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub country: Option<String>,
    pub sleep_time: Option<f64>,
    pub biological_sex: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ResponseOption {
    pub id: Uuid,
    pub option_text: String,
    pub option_value: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: Uuid,
    pub question_number: i32,
    pub category: Category,
    pub domain: String,
    pub question_text: String,
    pub advanced_question_text: Option<String>,
    pub advanced_question_note: Option<String>,
    pub response_options: Vec<ResponseOption>,
}

impl Question {
    pub fn option(&self, option_id: Uuid) -> Option<&ResponseOption> {
        self.response_options.iter().find(|o| o.id == option_id)
    }

    pub fn max_option_value(&self) -> i32 {
        self.response_options
            .iter()
            .map(|o| o.option_value)
            .max()
            .unwrap_or(0)
    }

    /// Advanced questions offer an optional supporting file upload.
    pub fn is_advanced(&self) -> bool {
        self.advanced_question_text.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_number: i32,
    pub category: Category,
    pub domain: String,
    pub question_text: String,
    pub advanced_question_text: Option<String>,
    pub advanced_question_note: Option<String>,
    pub options: Vec<(String, i32)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Response {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub question_id: Uuid,
    pub response_option_id: Uuid,
    pub uploaded_file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewResponse {
    pub submission_id: Uuid,
    pub question_id: Uuid,
    pub response_option_id: Uuid,
    pub uploaded_file_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SubmissionStatus,
    pub physical_health_score: Option<i32>,
    pub mental_health_score: Option<i32>,
    pub overall_readiness_score: Option<i32>,
    pub physical_health_recommendations: Vec<String>,
    pub mental_health_recommendations: Vec<String>,
    pub responses: Vec<Response>,
}

impl Submission {
    pub fn is_completed(&self) -> bool {
        self.status == SubmissionStatus::Completed
    }
}

/// Everything the terminal `in_progress -> completed` transition writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionOutcome {
    pub physical_health_score: i32,
    pub mental_health_score: i32,
    pub overall_readiness_score: i32,
    pub physical_health_recommendations: Vec<String>,
    pub mental_health_recommendations: Vec<String>,
}

/// A stored response joined with its question and chosen option.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnsweredQuestion {
    pub question_id: Uuid,
    pub category: Category,
    pub domain: String,
    pub question_text: String,
    pub option_text: String,
    pub option_value: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Conversation {
    pub id: Uuid,
    pub kind: String,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub is_ai: bool,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub is_ai: bool,
    pub text: String,
}
