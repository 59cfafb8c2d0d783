pub mod memory;
pub mod postgres;
pub mod seed;

use crate::domain::models::{
    AnsweredQuestion, Category, Conversation, Message, NewMessage, NewQuestion, NewResponse,
    NewUser, Question, Response, Submission, SubmissionOutcome, User, UserUpdate,
};
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Data access used by every handler and service. One shared instance is built
/// at startup and injected through `AppState`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the user registered under `new.external_id`, creating it first
    /// when absent.
    async fn find_or_create_user(&self, new: &NewUser) -> DbResult<User>;
    async fn find_user_by_external_id(&self, external_id: &str) -> DbResult<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> DbResult<Option<User>>;
    async fn update_user(&self, external_id: &str, update: &UserUpdate) -> DbResult<Option<User>>;
    async fn delete_user(&self, external_id: &str) -> DbResult<bool>;

    async fn count_questions(&self) -> DbResult<i64>;
    async fn insert_question(&self, question: &NewQuestion) -> DbResult<Question>;
    /// Ordered by question number, options ascending by value.
    async fn questions_by_category(&self, category: Category) -> DbResult<Vec<Question>>;
    async fn find_question(&self, id: Uuid) -> DbResult<Option<Question>>;

    /// Most recently started submission of the user, responses included.
    async fn latest_submission(&self, user_id: Uuid, completed_only: bool)
        -> DbResult<Option<Submission>>;
    async fn find_submission(&self, id: Uuid) -> DbResult<Option<Submission>>;
    /// Fails with `DbError::Conflict` when the user already has an in-progress
    /// submission.
    async fn insert_submission(&self, user_id: Uuid) -> DbResult<Submission>;
    /// Single compound write of status, completion time, scores and
    /// recommendations. `None` when the submission is missing or not in progress.
    async fn complete_submission(
        &self,
        id: Uuid,
        outcome: &SubmissionOutcome,
    ) -> DbResult<Option<Submission>>;

    /// Insert or overwrite the row keyed on (submission, question).
    async fn upsert_response(&self, new: &NewResponse) -> DbResult<Response>;
    async fn answered_questions(&self, submission_id: Uuid) -> DbResult<Vec<AnsweredQuestion>>;

    async fn find_ai_conversation(&self, user_id: Uuid) -> DbResult<Option<Conversation>>;
    async fn create_ai_conversation(&self, user_id: Uuid) -> DbResult<Conversation>;
    async fn find_conversation(&self, id: Uuid) -> DbResult<Option<Conversation>>;
    async fn list_messages(&self, conversation_id: Uuid) -> DbResult<Vec<Message>>;
    async fn insert_message(&self, new: &NewMessage) -> DbResult<Message>;
}
