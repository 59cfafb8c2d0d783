use super::{DbError, DbResult, Store};
use crate::domain::models::{
    AnsweredQuestion, Category, Conversation, Message, NewMessage, NewQuestion, NewResponse,
    NewUser, Question, Response, ResponseOption, Submission, SubmissionOutcome, SubmissionStatus,
    User, UserUpdate,
};
use crate::domain::recommendations::decode_stored_recommendations;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

const USER_COLUMNS: &str = r#"
    id, external_id, first_name, last_name, email, profile_picture_url,
    weight, weight_unit, height, height_unit, birth_date, country,
    sleep_time, biological_sex, gender, created_at
"#;

const SUBMISSION_COLUMNS: &str = r#"
    id, user_id, started_at, completed_at, status,
    physical_health_score, mental_health_score, overall_readiness_score,
    physical_health_recommendations, mental_health_recommendations
"#;

#[derive(Debug, FromRow)]
struct QuestionRow {
    id: Uuid,
    question_number: i32,
    category: String,
    domain: String,
    question_text: String,
    advanced_question_text: Option<String>,
    advanced_question_note: Option<String>,
}

#[derive(Debug, FromRow)]
struct OptionRow {
    id: Uuid,
    question_id: Uuid,
    option_text: String,
    option_value: i32,
}

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: Uuid,
    user_id: Uuid,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    status: String,
    physical_health_score: Option<i32>,
    mental_health_score: Option<i32>,
    overall_readiness_score: Option<i32>,
    physical_health_recommendations: serde_json::Value,
    mental_health_recommendations: serde_json::Value,
}

#[derive(Debug, FromRow)]
struct AnsweredRow {
    question_id: Uuid,
    category: String,
    domain: String,
    question_text: String,
    option_text: String,
    option_value: i32,
}

fn parse_category(raw: &str) -> DbResult<Category> {
    Category::try_from(raw).map_err(|_| DbError::Corrupt(format!("unknown category '{raw}'")))
}

impl QuestionRow {
    fn into_question(self, options: Vec<ResponseOption>) -> DbResult<Question> {
        Ok(Question {
            id: self.id,
            question_number: self.question_number,
            category: parse_category(&self.category)?,
            domain: self.domain,
            question_text: self.question_text,
            advanced_question_text: self.advanced_question_text,
            advanced_question_note: self.advanced_question_note,
            response_options: options,
        })
    }
}

impl SubmissionRow {
    fn into_submission(self, responses: Vec<Response>) -> DbResult<Submission> {
        let status = SubmissionStatus::try_from(self.status.as_str())
            .map_err(|_| DbError::Corrupt(format!("unknown submission status '{}'", self.status)))?;
        Ok(Submission {
            id: self.id,
            user_id: self.user_id,
            started_at: self.started_at,
            completed_at: self.completed_at,
            status,
            physical_health_score: self.physical_health_score,
            mental_health_score: self.mental_health_score,
            overall_readiness_score: self.overall_readiness_score,
            physical_health_recommendations: decode_stored_recommendations(
                &self.physical_health_recommendations,
            ),
            mental_health_recommendations: decode_stored_recommendations(
                &self.mental_health_recommendations,
            ),
            responses,
        })
    }
}

fn unique_to_conflict(err: sqlx::Error, what: &'static str) -> DbError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DbError::Conflict(what),
        _ => DbError::Sqlx(err),
    }
}

/// `Store` backed by the PostgreSQL pool created at startup.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_questions(&self, rows: Vec<QuestionRow>) -> DbResult<Vec<Question>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let options = sqlx::query_as::<_, OptionRow>(
            r#"
            SELECT id, question_id, option_text, option_value
            FROM response_options
            WHERE question_id = ANY($1)
            ORDER BY option_value ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_question: HashMap<Uuid, Vec<ResponseOption>> = HashMap::new();
        for row in options {
            by_question.entry(row.question_id).or_default().push(ResponseOption {
                id: row.id,
                option_text: row.option_text,
                option_value: row.option_value,
            });
        }

        rows.into_iter()
            .map(|row| {
                let opts = by_question.remove(&row.id).unwrap_or_default();
                row.into_question(opts)
            })
            .collect()
    }

    async fn responses_for(&self, submission_id: Uuid) -> DbResult<Vec<Response>> {
        let responses = sqlx::query_as::<_, Response>(
            r#"
            SELECT id, submission_id, question_id, response_option_id, uploaded_file_url, created_at
            FROM responses
            WHERE submission_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(responses)
    }

    async fn hydrate(&self, row: Option<SubmissionRow>) -> DbResult<Option<Submission>> {
        match row {
            Some(row) => {
                let responses = self.responses_for(row.id).await?;
                Ok(Some(row.into_submission(responses)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_or_create_user(&self, new: &NewUser) -> DbResult<User> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (external_id, first_name, last_name, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (external_id) DO UPDATE SET external_id = EXCLUDED.external_id
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.external_id)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, external_id: &str, update: &UserUpdate) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                profile_picture_url = COALESCE($4, profile_picture_url),
                weight = COALESCE($5, weight),
                weight_unit = COALESCE($6, weight_unit),
                height = COALESCE($7, height),
                height_unit = COALESCE($8, height_unit),
                birth_date = COALESCE($9, birth_date),
                country = COALESCE($10, country),
                sleep_time = COALESCE($11, sleep_time),
                biological_sex = COALESCE($12, biological_sex),
                gender = COALESCE($13, gender),
                updated_at = now()
            WHERE external_id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(external_id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.profile_picture_url)
        .bind(update.weight)
        .bind(&update.weight_unit)
        .bind(update.height)
        .bind(&update.height_unit)
        .bind(update.birth_date)
        .bind(&update.country)
        .bind(update.sleep_time)
        .bind(&update.biological_sex)
        .bind(&update.gender)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_user(&self, external_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE external_id = $1")
            .bind(external_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_questions(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_question(&self, question: &NewQuestion) -> DbResult<Question> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            INSERT INTO questions
                (question_number, category, domain, question_text,
                 advanced_question_text, advanced_question_note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, question_number, category, domain, question_text,
                      advanced_question_text, advanced_question_note
            "#,
        )
        .bind(question.question_number)
        .bind(question.category.as_str())
        .bind(&question.domain)
        .bind(&question.question_text)
        .bind(&question.advanced_question_text)
        .bind(&question.advanced_question_note)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_to_conflict(e, "question number already used in category"))?;

        let mut options = Vec::with_capacity(question.options.len());
        for (text, value) in &question.options {
            let option = sqlx::query_as::<_, ResponseOption>(
                r#"
                INSERT INTO response_options (question_id, option_text, option_value)
                VALUES ($1, $2, $3)
                RETURNING id, option_text, option_value
                "#,
            )
            .bind(row.id)
            .bind(text)
            .bind(value)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| unique_to_conflict(e, "duplicate option value"))?;
            options.push(option);
        }
        tx.commit().await?;

        options.sort_by_key(|o| o.option_value);
        row.into_question(options)
    }

    async fn questions_by_category(&self, category: Category) -> DbResult<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, question_number, category, domain, question_text,
                   advanced_question_text, advanced_question_note
            FROM questions
            WHERE category = $1
            ORDER BY question_number ASC
            "#,
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;
        self.load_questions(rows).await
    }

    async fn find_question(&self, id: Uuid) -> DbResult<Option<Question>> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, question_number, category, domain, question_text,
                   advanced_question_text, advanced_question_note
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(self.load_questions(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn latest_submission(
        &self,
        user_id: Uuid,
        completed_only: bool,
    ) -> DbResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"
            SELECT {SUBMISSION_COLUMNS}
            FROM submissions
            WHERE user_id = $1
              AND ($2 = false OR status = 'completed')
            ORDER BY started_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .bind(completed_only)
        .fetch_optional(&self.pool)
        .await?;
        self.hydrate(row).await
    }

    async fn find_submission(&self, id: Uuid) -> DbResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.hydrate(row).await
    }

    async fn insert_submission(&self, user_id: Uuid) -> DbResult<Submission> {
        // submissions_one_in_progress (partial unique index) rejects a second
        // in-progress row for the same user.
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"
            INSERT INTO submissions (user_id, status, started_at)
            VALUES ($1, 'in_progress', now())
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_to_conflict(e, "user already has an in-progress submission"))?;
        row.into_submission(Vec::new())
    }

    async fn complete_submission(
        &self,
        id: Uuid,
        outcome: &SubmissionOutcome,
    ) -> DbResult<Option<Submission>> {
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"
            UPDATE submissions SET
                status = 'completed',
                completed_at = now(),
                physical_health_score = $2,
                mental_health_score = $3,
                overall_readiness_score = $4,
                physical_health_recommendations = $5,
                mental_health_recommendations = $6
            WHERE id = $1 AND status = 'in_progress'
            RETURNING {SUBMISSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(outcome.physical_health_score)
        .bind(outcome.mental_health_score)
        .bind(outcome.overall_readiness_score)
        .bind(Json(&outcome.physical_health_recommendations))
        .bind(Json(&outcome.mental_health_recommendations))
        .fetch_optional(&self.pool)
        .await?;
        self.hydrate(row).await
    }

    async fn upsert_response(&self, new: &NewResponse) -> DbResult<Response> {
        let response = sqlx::query_as::<_, Response>(
            r#"
            INSERT INTO responses (submission_id, question_id, response_option_id, uploaded_file_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (submission_id, question_id) DO UPDATE SET
                response_option_id = EXCLUDED.response_option_id,
                uploaded_file_url = EXCLUDED.uploaded_file_url,
                updated_at = now()
            RETURNING id, submission_id, question_id, response_option_id, uploaded_file_url, created_at
            "#,
        )
        .bind(new.submission_id)
        .bind(new.question_id)
        .bind(new.response_option_id)
        .bind(&new.uploaded_file_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(response)
    }

    async fn answered_questions(&self, submission_id: Uuid) -> DbResult<Vec<AnsweredQuestion>> {
        let rows = sqlx::query_as::<_, AnsweredRow>(
            r#"
            SELECT q.id AS question_id, q.category, q.domain, q.question_text,
                   o.option_text, o.option_value
            FROM responses r
            JOIN questions q ON q.id = r.question_id
            JOIN response_options o ON o.id = r.response_option_id
            WHERE r.submission_id = $1
            ORDER BY q.category, q.question_number
            "#,
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(AnsweredQuestion {
                    question_id: row.question_id,
                    category: parse_category(&row.category)?,
                    domain: row.domain,
                    question_text: row.question_text,
                    option_text: row.option_text,
                    option_value: row.option_value,
                })
            })
            .collect()
    }

    async fn find_ai_conversation(&self, user_id: Uuid) -> DbResult<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, kind, user_id, created_at
            FROM conversations
            WHERE user_id = $1 AND kind = 'ai'
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(conversation)
    }

    async fn create_ai_conversation(&self, user_id: Uuid) -> DbResult<Conversation> {
        if let Some(existing) = self.find_ai_conversation(user_id).await? {
            return Ok(existing);
        }
        let inserted = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (kind, user_id)
            VALUES ('ai', $1)
            RETURNING id, kind, user_id, created_at
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(conversation) => Ok(conversation),
            // Lost a race with a concurrent create; the winner's row is the answer.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => self
                .find_ai_conversation(user_id)
                .await?
                .ok_or_else(|| DbError::Corrupt("ai conversation vanished".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_conversation(&self, id: Uuid) -> DbResult<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT id, kind, user_id, created_at FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(conversation)
    }

    async fn list_messages(&self, conversation_id: Uuid) -> DbResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, is_ai, text, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn insert_message(&self, new: &NewMessage) -> DbResult<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (conversation_id, sender_id, is_ai, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id, conversation_id, sender_id, is_ai, text, created_at
            "#,
        )
        .bind(new.conversation_id)
        .bind(new.sender_id)
        .bind(new.is_ai)
        .bind(&new.text)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }
}
