use super::{DbError, DbResult, Store};
use crate::domain::models::{
    AnsweredQuestion, Category, Conversation, Message, NewMessage, NewQuestion, NewResponse,
    NewUser, Question, Response, ResponseOption, Submission, SubmissionOutcome, SubmissionStatus,
    User, UserUpdate,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    questions: Vec<Question>,
    submissions: Vec<Submission>,
    responses: Vec<Response>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
}

impl Inner {
    fn submission_with_responses(&self, submission: &Submission) -> Submission {
        let mut out = submission.clone();
        out.responses = self
            .responses
            .iter()
            .filter(|r| r.submission_id == submission.id)
            .cloned()
            .collect();
        out
    }
}

/// Process-local `Store` with the same constraints as the SQL schema
/// (one in-progress submission per user, one response per question).
/// Used for tests and local demos; nothing is persisted.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn response_count(&self, submission_id: Uuid) -> usize {
        let inner = self.inner.read().await;
        inner
            .responses
            .iter()
            .filter(|r| r.submission_id == submission_id)
            .count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_or_create_user(&self, new: &NewUser) -> DbResult<User> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.users.iter().find(|u| u.external_id == new.external_id) {
            return Ok(existing.clone());
        }
        let user = User {
            id: Uuid::new_v4(),
            external_id: new.external_id.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            profile_picture_url: None,
            weight: None,
            weight_unit: None,
            height: None,
            height_unit: None,
            birth_date: None,
            country: None,
            sleep_time: None,
            biological_sex: None,
            gender: None,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> DbResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.external_id == external_id).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_user(&self, external_id: &str, update: &UserUpdate) -> DbResult<Option<User>> {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.users.iter_mut().find(|u| u.external_id == external_id) else {
            return Ok(None);
        };
        if let Some(v) = &update.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &update.last_name {
            user.last_name = v.clone();
        }
        if update.profile_picture_url.is_some() {
            user.profile_picture_url = update.profile_picture_url.clone();
        }
        if update.weight.is_some() {
            user.weight = update.weight;
        }
        if update.weight_unit.is_some() {
            user.weight_unit = update.weight_unit.clone();
        }
        if update.height.is_some() {
            user.height = update.height;
        }
        if update.height_unit.is_some() {
            user.height_unit = update.height_unit.clone();
        }
        if update.birth_date.is_some() {
            user.birth_date = update.birth_date;
        }
        if update.country.is_some() {
            user.country = update.country.clone();
        }
        if update.sleep_time.is_some() {
            user.sleep_time = update.sleep_time;
        }
        if update.biological_sex.is_some() {
            user.biological_sex = update.biological_sex.clone();
        }
        if update.gender.is_some() {
            user.gender = update.gender.clone();
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, external_id: &str) -> DbResult<bool> {
        let mut inner = self.inner.write().await;
        let Some(pos) = inner.users.iter().position(|u| u.external_id == external_id) else {
            return Ok(false);
        };
        let user = inner.users.remove(pos);
        // Mirror ON DELETE CASCADE.
        let doomed: Vec<Uuid> = inner
            .submissions
            .iter()
            .filter(|s| s.user_id == user.id)
            .map(|s| s.id)
            .collect();
        inner.submissions.retain(|s| s.user_id != user.id);
        inner.responses.retain(|r| !doomed.contains(&r.submission_id));
        let convs: Vec<Uuid> = inner
            .conversations
            .iter()
            .filter(|c| c.user_id == Some(user.id))
            .map(|c| c.id)
            .collect();
        inner.conversations.retain(|c| c.user_id != Some(user.id));
        inner.messages.retain(|m| !convs.contains(&m.conversation_id));
        Ok(true)
    }

    async fn count_questions(&self) -> DbResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner.questions.len() as i64)
    }

    async fn insert_question(&self, question: &NewQuestion) -> DbResult<Question> {
        let mut inner = self.inner.write().await;
        if inner
            .questions
            .iter()
            .any(|q| q.category == question.category && q.question_number == question.question_number)
        {
            return Err(DbError::Conflict("question number already used in category"));
        }
        let mut options: Vec<ResponseOption> = question
            .options
            .iter()
            .map(|(text, value)| ResponseOption {
                id: Uuid::new_v4(),
                option_text: text.clone(),
                option_value: *value,
            })
            .collect();
        options.sort_by_key(|o| o.option_value);
        if options.windows(2).any(|w| w[0].option_value == w[1].option_value) {
            return Err(DbError::Conflict("duplicate option value"));
        }
        let stored = Question {
            id: Uuid::new_v4(),
            question_number: question.question_number,
            category: question.category,
            domain: question.domain.clone(),
            question_text: question.question_text.clone(),
            advanced_question_text: question.advanced_question_text.clone(),
            advanced_question_note: question.advanced_question_note.clone(),
            response_options: options,
        };
        inner.questions.push(stored.clone());
        Ok(stored)
    }

    async fn questions_by_category(&self, category: Category) -> DbResult<Vec<Question>> {
        let inner = self.inner.read().await;
        let mut questions: Vec<Question> = inner
            .questions
            .iter()
            .filter(|q| q.category == category)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.question_number);
        Ok(questions)
    }

    async fn find_question(&self, id: Uuid) -> DbResult<Option<Question>> {
        let inner = self.inner.read().await;
        Ok(inner.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn latest_submission(
        &self,
        user_id: Uuid,
        completed_only: bool,
    ) -> DbResult<Option<Submission>> {
        let inner = self.inner.read().await;
        let latest = inner
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter(|s| !completed_only || s.is_completed())
            .max_by_key(|s| s.started_at);
        Ok(latest.map(|s| inner.submission_with_responses(s)))
    }

    async fn find_submission(&self, id: Uuid) -> DbResult<Option<Submission>> {
        let inner = self.inner.read().await;
        Ok(inner
            .submissions
            .iter()
            .find(|s| s.id == id)
            .map(|s| inner.submission_with_responses(s)))
    }

    async fn insert_submission(&self, user_id: Uuid) -> DbResult<Submission> {
        let mut inner = self.inner.write().await;
        if inner
            .submissions
            .iter()
            .any(|s| s.user_id == user_id && s.status == SubmissionStatus::InProgress)
        {
            return Err(DbError::Conflict("user already has an in-progress submission"));
        }
        // Keep started_at strictly increasing per user so "latest" is unambiguous
        // even when two submissions are created within the clock resolution.
        let mut started_at = Utc::now();
        if let Some(last) = inner
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.started_at)
            .max()
        {
            if started_at <= last {
                started_at = last + Duration::microseconds(1);
            }
        }
        let submission = Submission {
            id: Uuid::new_v4(),
            user_id,
            started_at,
            completed_at: None,
            status: SubmissionStatus::InProgress,
            physical_health_score: None,
            mental_health_score: None,
            overall_readiness_score: None,
            physical_health_recommendations: Vec::new(),
            mental_health_recommendations: Vec::new(),
            responses: Vec::new(),
        };
        inner.submissions.push(submission.clone());
        Ok(submission)
    }

    async fn complete_submission(
        &self,
        id: Uuid,
        outcome: &SubmissionOutcome,
    ) -> DbResult<Option<Submission>> {
        let mut inner = self.inner.write().await;
        let Some(submission) = inner
            .submissions
            .iter_mut()
            .find(|s| s.id == id && s.status == SubmissionStatus::InProgress)
        else {
            return Ok(None);
        };
        submission.status = SubmissionStatus::Completed;
        submission.completed_at = Some(Utc::now());
        submission.physical_health_score = Some(outcome.physical_health_score);
        submission.mental_health_score = Some(outcome.mental_health_score);
        submission.overall_readiness_score = Some(outcome.overall_readiness_score);
        submission.physical_health_recommendations = outcome.physical_health_recommendations.clone();
        submission.mental_health_recommendations = outcome.mental_health_recommendations.clone();
        let snapshot = submission.clone();
        Ok(Some(inner.submission_with_responses(&snapshot)))
    }

    async fn upsert_response(&self, new: &NewResponse) -> DbResult<Response> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .responses
            .iter_mut()
            .find(|r| r.submission_id == new.submission_id && r.question_id == new.question_id)
        {
            existing.response_option_id = new.response_option_id;
            existing.uploaded_file_url = new.uploaded_file_url.clone();
            return Ok(existing.clone());
        }
        let response = Response {
            id: Uuid::new_v4(),
            submission_id: new.submission_id,
            question_id: new.question_id,
            response_option_id: new.response_option_id,
            uploaded_file_url: new.uploaded_file_url.clone(),
            created_at: Utc::now(),
        };
        inner.responses.push(response.clone());
        Ok(response)
    }

    async fn answered_questions(&self, submission_id: Uuid) -> DbResult<Vec<AnsweredQuestion>> {
        let inner = self.inner.read().await;
        let questions: HashMap<Uuid, &Question> =
            inner.questions.iter().map(|q| (q.id, q)).collect();
        let mut answered = Vec::new();
        for response in inner.responses.iter().filter(|r| r.submission_id == submission_id) {
            let question = questions.get(&response.question_id).ok_or_else(|| {
                DbError::Corrupt(format!("response references unknown question {}", response.question_id))
            })?;
            let option = question.option(response.response_option_id).ok_or_else(|| {
                DbError::Corrupt(format!(
                    "response references unknown option {}",
                    response.response_option_id
                ))
            })?;
            answered.push((
                question.question_number,
                AnsweredQuestion {
                    question_id: question.id,
                    category: question.category,
                    domain: question.domain.clone(),
                    question_text: question.question_text.clone(),
                    option_text: option.option_text.clone(),
                    option_value: option.option_value,
                },
            ));
        }
        answered.sort_by_key(|(number, a)| (a.category.as_str(), *number));
        Ok(answered.into_iter().map(|(_, a)| a).collect())
    }

    async fn find_ai_conversation(&self, user_id: Uuid) -> DbResult<Option<Conversation>> {
        let inner = self.inner.read().await;
        Ok(inner
            .conversations
            .iter()
            .find(|c| c.user_id == Some(user_id) && c.kind == "ai")
            .cloned())
    }

    async fn create_ai_conversation(&self, user_id: Uuid) -> DbResult<Conversation> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .conversations
            .iter()
            .find(|c| c.user_id == Some(user_id) && c.kind == "ai")
        {
            return Ok(existing.clone());
        }
        let conversation = Conversation {
            id: Uuid::new_v4(),
            kind: "ai".to_string(),
            user_id: Some(user_id),
            created_at: Utc::now(),
        };
        inner.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn find_conversation(&self, id: Uuid) -> DbResult<Option<Conversation>> {
        let inner = self.inner.read().await;
        Ok(inner.conversations.iter().find(|c| c.id == id).cloned())
    }

    async fn list_messages(&self, conversation_id: Uuid) -> DbResult<Vec<Message>> {
        let inner = self.inner.read().await;
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn insert_message(&self, new: &NewMessage) -> DbResult<Message> {
        let mut inner = self.inner.write().await;
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: new.conversation_id,
            sender_id: new.sender_id,
            is_ai: new.is_ai,
            text: new.text.clone(),
            created_at: Utc::now(),
        };
        inner.messages.push(message.clone());
        Ok(message)
    }
}
