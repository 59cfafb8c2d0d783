use crate::db::{DbError, Store};
use crate::domain::models::{
    Category, NewResponse, Response, Submission, SubmissionOutcome,
};
use crate::domain::scoring::{score_category, score_overall, ScoreScale};
use crate::error::AppError;
use crate::services::ai::TextGenerator;
use crate::services::recommendations::recommend_for_category;
use crate::services::storage::{response_file_path, ObjectStorage};
use chrono::Utc;
use uuid::Uuid;

/// Raw attachment for one answer, uploaded before the answer is saved.
#[derive(Debug, Clone)]
pub struct ResponseUpload {
    pub submission_id: Uuid,
    pub question_id: Uuid,
    pub response_option_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Returns the user's resumable submission, creating one when the user has
/// none or only completed ones. Never leaves two in-progress rows behind.
pub async fn get_or_create(store: &dyn Store, user_id: Uuid) -> Result<Submission, AppError> {
    if let Some(latest) = store.latest_submission(user_id, false).await? {
        if !latest.is_completed() {
            return Ok(latest);
        }
    }

    match store.insert_submission(user_id).await {
        Ok(created) => {
            tracing::info!("Started submission {} for user {}", created.id, user_id);
            Ok(created)
        }
        // A concurrent call created it first; resume that one.
        Err(DbError::Conflict(_)) => store
            .latest_submission(user_id, false)
            .await?
            .filter(|s| !s.is_completed())
            .ok_or(AppError::Internal),
        Err(err) => Err(err.into()),
    }
}

/// Explicit creation: refuses while the user still has one in progress.
pub async fn create(store: &dyn Store, user_id: Uuid) -> Result<Submission, AppError> {
    if let Some(latest) = store.latest_submission(user_id, false).await? {
        if !latest.is_completed() {
            return Err(AppError::conflict(
                "You already have an in-progress survey. Please complete it first.",
            ));
        }
    }
    let created = store.insert_submission(user_id).await?;
    tracing::info!("Created submission {} for user {}", created.id, user_id);
    Ok(created)
}

pub async fn get_latest(
    store: &dyn Store,
    user_id: Uuid,
    completed_only: bool,
) -> Result<Option<Submission>, AppError> {
    Ok(store.latest_submission(user_id, completed_only).await?)
}

async fn writable_submission(store: &dyn Store, submission_id: Uuid) -> Result<Submission, AppError> {
    let submission = store
        .find_submission(submission_id)
        .await?
        .ok_or_else(|| AppError::not_found("Submission not found"))?;
    if submission.is_completed() {
        return Err(AppError::conflict("Cannot add response to a completed submission"));
    }
    Ok(submission)
}

/// Inserts or overwrites the answer for (submission, question). This is the
/// only way answers change.
pub async fn upsert_response(store: &dyn Store, new: NewResponse) -> Result<Response, AppError> {
    writable_submission(store, new.submission_id).await?;

    let question = store
        .find_question(new.question_id)
        .await?
        .ok_or_else(|| AppError::validation("Unknown question_id"))?;
    if question.option(new.response_option_id).is_none() {
        return Err(AppError::validation(
            "response_option_id does not belong to question_id",
        ));
    }

    let response = store.upsert_response(&new).await?;
    tracing::debug!(
        "Stored response for submission {} question {}",
        new.submission_id,
        new.question_id
    );
    Ok(response)
}

/// Stores an attachment under its deterministic path and returns the public URL.
pub async fn upload_response_file(
    store: &dyn Store,
    storage: &dyn ObjectStorage,
    upload: ResponseUpload,
) -> Result<String, AppError> {
    store
        .find_submission(upload.submission_id)
        .await?
        .ok_or_else(|| AppError::not_found("Submission not found"))?;
    let question = store
        .find_question(upload.question_id)
        .await?
        .ok_or_else(|| AppError::validation("Unknown question_id"))?;
    if question.option(upload.response_option_id).is_none() {
        return Err(AppError::validation(
            "response_option_id does not belong to question_id",
        ));
    }

    let path = response_file_path(
        question.category.as_str(),
        upload.submission_id,
        upload.question_id,
        upload.response_option_id,
        &upload.file_name,
        Utc::now(),
    );

    storage
        .upload(&path, upload.bytes, &upload.content_type)
        .await
        .map_err(|err| {
            tracing::error!("Failed to upload response file to {}: {}", path, err);
            AppError::Upstream(err.to_string())
        })
}

/// Saves an answer with an optional attachment. The answer is mandatory, the
/// attachment best-effort: an upload failure is logged and the answer is kept
/// without a file URL.
pub async fn save_answer(
    store: &dyn Store,
    storage: &dyn ObjectStorage,
    answer: NewResponse,
    attachment: Option<ResponseUpload>,
) -> Result<Response, AppError> {
    writable_submission(store, answer.submission_id).await?;

    let uploaded_file_url = match attachment {
        Some(upload) => match upload_response_file(store, storage, upload).await {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(
                    "Attachment for question {} not stored, saving answer without it: {}",
                    answer.question_id,
                    err
                );
                None
            }
        },
        None => answer.uploaded_file_url.clone(),
    };

    upsert_response(
        store,
        NewResponse {
            uploaded_file_url,
            ..answer
        },
    )
    .await
}

fn validate_outcome(outcome: &SubmissionOutcome) -> Result<(), AppError> {
    let scores = [
        ("physical_health_score", outcome.physical_health_score),
        ("mental_health_score", outcome.mental_health_score),
        ("overall_readiness_score", outcome.overall_readiness_score),
    ];
    for (name, value) in scores {
        if !(0..=100).contains(&value) {
            return Err(AppError::validation(format!("{name} must be between 0 and 100")));
        }
    }
    Ok(())
}

async fn complete(
    store: &dyn Store,
    submission_id: Uuid,
    outcome: &SubmissionOutcome,
) -> Result<Submission, AppError> {
    let completed = store
        .complete_submission(submission_id, outcome)
        .await?
        .ok_or_else(|| AppError::conflict("Submission is already completed"))?;
    tracing::info!(
        "Completed submission {} (overall {}%)",
        completed.id,
        outcome.overall_readiness_score
    );
    Ok(completed)
}

async fn active_submission(store: &dyn Store, user_id: Uuid) -> Result<Submission, AppError> {
    let latest = store
        .latest_submission(user_id, false)
        .await?
        .ok_or_else(|| AppError::not_found("No active submission found for this user."))?;
    if latest.is_completed() {
        return Err(AppError::conflict("Submission is already completed"));
    }
    Ok(latest)
}

/// Terminal transition of the user's latest submission, with caller-computed
/// scores and recommendations written in one update.
pub async fn finalize(
    store: &dyn Store,
    user_id: Uuid,
    outcome: SubmissionOutcome,
) -> Result<Submission, AppError> {
    validate_outcome(&outcome)?;
    let latest = active_submission(store, user_id).await?;
    complete(store, latest.id, &outcome).await
}

/// Scores the stored answers, asks for recommendations for both categories
/// concurrently and finalizes the submission.
pub async fn submit(
    store: &dyn Store,
    generator: &dyn TextGenerator,
    scale: &ScoreScale,
    user_id: Uuid,
) -> Result<Submission, AppError> {
    let latest = active_submission(store, user_id).await?;
    let answers = store.answered_questions(latest.id).await?;

    let physical = score_category(scale, Category::Physical, &answers);
    let mental = score_category(scale, Category::Mental, &answers);

    let (physical_recs, mental_recs) = futures::join!(
        recommend_for_category(generator, scale, Category::Physical, &answers),
        recommend_for_category(generator, scale, Category::Mental, &answers),
    );

    let outcome = SubmissionOutcome {
        physical_health_score: physical,
        mental_health_score: mental,
        overall_readiness_score: score_overall(physical, mental),
        physical_health_recommendations: physical_recs,
        mental_health_recommendations: mental_recs,
    };
    complete(store, latest.id, &outcome).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{seed, DbResult, MemoryStore};
    use crate::domain::models::{
        AnsweredQuestion, Conversation, Message, NewMessage, NewQuestion, NewUser, Question,
        SubmissionStatus, User, UserUpdate,
    };
    use crate::domain::recommendations::fallback_recommendation;
    use crate::services::recommendations::tests::ScriptedGenerator;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct RecordingStorage {
        fail: bool,
        paths: Mutex<Vec<String>>,
    }

    impl RecordingStorage {
        fn new(fail: bool) -> Self {
            Self { fail, paths: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ObjectStorage for RecordingStorage {
        async fn upload(&self, path: &str, _bytes: Vec<u8>, _content_type: &str) -> anyhow::Result<String> {
            if self.fail {
                return Err(anyhow!("storage offline"));
            }
            self.paths.lock().unwrap().push(path.to_string());
            Ok(format!("https://files.test/{path}"))
        }
    }

    /// Hides the in-progress submission from the first lookup, the way a
    /// concurrent request that inserted it just after our read would.
    struct LateReader {
        inner: MemoryStore,
        hidden: AtomicBool,
    }

    #[async_trait]
    impl Store for LateReader {
        async fn find_or_create_user(&self, new: &NewUser) -> DbResult<User> {
            self.inner.find_or_create_user(new).await
        }
        async fn find_user_by_external_id(&self, external_id: &str) -> DbResult<Option<User>> {
            self.inner.find_user_by_external_id(external_id).await
        }
        async fn find_user_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
            self.inner.find_user_by_id(id).await
        }
        async fn update_user(&self, external_id: &str, update: &UserUpdate) -> DbResult<Option<User>> {
            self.inner.update_user(external_id, update).await
        }
        async fn delete_user(&self, external_id: &str) -> DbResult<bool> {
            self.inner.delete_user(external_id).await
        }
        async fn count_questions(&self) -> DbResult<i64> {
            self.inner.count_questions().await
        }
        async fn insert_question(&self, question: &NewQuestion) -> DbResult<Question> {
            self.inner.insert_question(question).await
        }
        async fn questions_by_category(&self, category: Category) -> DbResult<Vec<Question>> {
            self.inner.questions_by_category(category).await
        }
        async fn find_question(&self, id: Uuid) -> DbResult<Option<Question>> {
            self.inner.find_question(id).await
        }
        async fn latest_submission(
            &self,
            user_id: Uuid,
            completed_only: bool,
        ) -> DbResult<Option<Submission>> {
            if self.hidden.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.latest_submission(user_id, completed_only).await
        }
        async fn find_submission(&self, id: Uuid) -> DbResult<Option<Submission>> {
            self.inner.find_submission(id).await
        }
        async fn insert_submission(&self, user_id: Uuid) -> DbResult<Submission> {
            self.inner.insert_submission(user_id).await
        }
        async fn complete_submission(
            &self,
            id: Uuid,
            outcome: &SubmissionOutcome,
        ) -> DbResult<Option<Submission>> {
            self.inner.complete_submission(id, outcome).await
        }
        async fn upsert_response(&self, new: &NewResponse) -> DbResult<Response> {
            self.inner.upsert_response(new).await
        }
        async fn answered_questions(&self, submission_id: Uuid) -> DbResult<Vec<AnsweredQuestion>> {
            self.inner.answered_questions(submission_id).await
        }
        async fn find_ai_conversation(&self, user_id: Uuid) -> DbResult<Option<Conversation>> {
            self.inner.find_ai_conversation(user_id).await
        }
        async fn create_ai_conversation(&self, user_id: Uuid) -> DbResult<Conversation> {
            self.inner.create_ai_conversation(user_id).await
        }
        async fn find_conversation(&self, id: Uuid) -> DbResult<Option<Conversation>> {
            self.inner.find_conversation(id).await
        }
        async fn list_messages(&self, conversation_id: Uuid) -> DbResult<Vec<Message>> {
            self.inner.list_messages(conversation_id).await
        }
        async fn insert_message(&self, new: &NewMessage) -> DbResult<Message> {
            self.inner.insert_message(new).await
        }
    }

    async fn setup() -> (MemoryStore, Uuid, Vec<Question>, Vec<Question>) {
        let store = MemoryStore::new();
        seed::seed_questions(&store).await.unwrap();
        let user = store
            .find_or_create_user(&NewUser {
                external_id: "user_abc".into(),
                first_name: "Nino".into(),
                last_name: "Beridze".into(),
                email: "nino@example.com".into(),
            })
            .await
            .unwrap();
        let physical = store.questions_by_category(Category::Physical).await.unwrap();
        let mental = store.questions_by_category(Category::Mental).await.unwrap();
        (store, user.id, physical, mental)
    }

    fn answer_for(submission_id: Uuid, question: &Question, value: i32) -> NewResponse {
        let option = question
            .response_options
            .iter()
            .find(|o| o.option_value == value)
            .unwrap();
        NewResponse {
            submission_id,
            question_id: question.id,
            response_option_id: option.id,
            uploaded_file_url: None,
        }
    }

    fn outcome(p: i32, m: i32, o: i32) -> SubmissionOutcome {
        SubmissionOutcome {
            physical_health_score: p,
            mental_health_score: m,
            overall_readiness_score: o,
            physical_health_recommendations: vec!["Train daily".into()],
            mental_health_recommendations: vec!["Practice breathing".into(), "Sleep more".into()],
        }
    }

    #[tokio::test]
    async fn get_or_create_twice_returns_same_submission() {
        let (store, user_id, _, _) = setup().await;
        let first = get_or_create(&store, user_id).await.unwrap();
        let second = get_or_create(&store, user_id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.status, SubmissionStatus::InProgress);
        assert!(first.physical_health_score.is_none());
        assert!(first.responses.is_empty());
    }

    #[tokio::test]
    async fn get_or_create_after_completion_starts_fresh() {
        let (store, user_id, _, _) = setup().await;
        let first = get_or_create(&store, user_id).await.unwrap();
        finalize(&store, user_id, outcome(10, 20, 15)).await.unwrap();
        let next = get_or_create(&store, user_id).await.unwrap();
        assert_ne!(first.id, next.id);
        assert_eq!(next.status, SubmissionStatus::InProgress);
    }

    #[tokio::test]
    async fn create_while_in_progress_conflicts() {
        let (store, user_id, _, _) = setup().await;
        create(&store, user_id).await.unwrap();
        let err = create(&store, user_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn get_latest_empty_is_none() {
        let (store, user_id, _, _) = setup().await;
        assert!(get_latest(&store, user_id, false).await.unwrap().is_none());
        get_or_create(&store, user_id).await.unwrap();
        assert!(get_latest(&store, user_id, true).await.unwrap().is_none());
        assert!(get_latest(&store, user_id, false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn reanswering_overwrites() {
        let (store, user_id, physical, _) = setup().await;
        let submission = get_or_create(&store, user_id).await.unwrap();
        upsert_response(&store, answer_for(submission.id, &physical[0], 1)).await.unwrap();
        let latest = upsert_response(&store, answer_for(submission.id, &physical[0], 3))
            .await
            .unwrap();

        let stored = get_latest(&store, user_id, false).await.unwrap().unwrap();
        assert_eq!(stored.responses.len(), 1);
        assert_eq!(stored.responses[0].response_option_id, latest.response_option_id);
        assert_eq!(
            physical[0].option(latest.response_option_id).unwrap().option_value,
            3
        );
    }

    #[tokio::test]
    async fn upsert_on_completed_submission_conflicts() {
        let (store, user_id, physical, _) = setup().await;
        let submission = get_or_create(&store, user_id).await.unwrap();
        finalize(&store, user_id, outcome(50, 50, 50)).await.unwrap();

        let valid = answer_for(submission.id, &physical[0], 2);
        assert!(matches!(
            upsert_response(&store, valid).await.unwrap_err(),
            AppError::Conflict(_)
        ));

        let garbage = NewResponse {
            submission_id: submission.id,
            question_id: Uuid::new_v4(),
            response_option_id: Uuid::new_v4(),
            uploaded_file_url: None,
        };
        assert!(matches!(
            upsert_response(&store, garbage).await.unwrap_err(),
            AppError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn upsert_validates_references() {
        let (store, user_id, physical, mental) = setup().await;
        let missing = NewResponse {
            submission_id: Uuid::new_v4(),
            question_id: physical[0].id,
            response_option_id: physical[0].response_options[0].id,
            uploaded_file_url: None,
        };
        assert!(matches!(
            upsert_response(&store, missing).await.unwrap_err(),
            AppError::NotFound(_)
        ));

        let submission = get_or_create(&store, user_id).await.unwrap();
        let mismatched = NewResponse {
            submission_id: submission.id,
            question_id: physical[0].id,
            response_option_id: mental[0].response_options[0].id,
            uploaded_file_url: None,
        };
        assert!(matches!(
            upsert_response(&store, mismatched).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn finalize_writes_everything_at_once() {
        let (store, user_id, _, _) = setup().await;
        get_or_create(&store, user_id).await.unwrap();
        let expected = outcome(60, 86, 73);
        finalize(&store, user_id, expected.clone()).await.unwrap();

        let latest = get_latest(&store, user_id, false).await.unwrap().unwrap();
        assert_eq!(latest.status, SubmissionStatus::Completed);
        assert!(latest.completed_at.is_some());
        assert_eq!(latest.physical_health_score, Some(60));
        assert_eq!(latest.mental_health_score, Some(86));
        assert_eq!(latest.overall_readiness_score, Some(73));
        assert_eq!(latest.physical_health_recommendations, expected.physical_health_recommendations);
        assert_eq!(latest.mental_health_recommendations, expected.mental_health_recommendations);
    }

    #[tokio::test]
    async fn finalize_without_submission_is_not_found() {
        let (store, user_id, _, _) = setup().await;
        let err = finalize(&store, user_id, outcome(1, 1, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn finalize_is_terminal() {
        let (store, user_id, _, _) = setup().await;
        get_or_create(&store, user_id).await.unwrap();
        finalize(&store, user_id, outcome(1, 1, 1)).await.unwrap();
        let err = finalize(&store, user_id, outcome(2, 2, 2)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn finalize_rejects_out_of_range_scores() {
        let (store, user_id, _, _) = setup().await;
        get_or_create(&store, user_id).await.unwrap();
        let err = finalize(&store, user_id, outcome(101, 0, 50)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let latest = get_latest(&store, user_id, false).await.unwrap().unwrap();
        assert_eq!(latest.status, SubmissionStatus::InProgress);
    }

    #[tokio::test]
    async fn submit_with_only_physical_answers() {
        let (store, user_id, physical, _) = setup().await;
        let submission = get_or_create(&store, user_id).await.unwrap();
        // Reach 16 of 24 (two thirds of the physical maximum).
        for question in physical.iter().take(5) {
            upsert_response(&store, answer_for(submission.id, question, 3)).await.unwrap();
        }
        upsert_response(&store, answer_for(submission.id, &physical[5], 1)).await.unwrap();

        let generator = ScriptedGenerator::new(vec![Ok("1. Train\n2. Run\n3. Stretch".into())]);
        let completed = submit(&store, &generator, &ScoreScale::default(), user_id)
            .await
            .unwrap();

        assert_eq!(completed.physical_health_score, Some(67));
        assert_eq!(completed.mental_health_score, Some(0));
        assert_eq!(completed.overall_readiness_score, Some(34));
        assert_eq!(completed.physical_health_recommendations, vec!["Train", "Run", "Stretch"]);
        assert!(completed.mental_health_recommendations.is_empty());
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn submit_survives_generator_outage() {
        let (store, user_id, physical, mental) = setup().await;
        let submission = get_or_create(&store, user_id).await.unwrap();
        upsert_response(&store, answer_for(submission.id, &physical[0], 3)).await.unwrap();
        upsert_response(&store, answer_for(submission.id, &mental[0], 3)).await.unwrap();

        let generator = ScriptedGenerator::new(vec![]);
        let completed = submit(&store, &generator, &ScoreScale::default(), user_id)
            .await
            .unwrap();

        assert_eq!(completed.status, SubmissionStatus::Completed);
        assert_eq!(completed.physical_health_score, Some(13));
        assert_eq!(completed.mental_health_score, Some(13));
        assert_eq!(
            completed.physical_health_recommendations,
            vec![fallback_recommendation(Category::Physical).to_string()]
        );
        assert_eq!(
            completed.mental_health_recommendations,
            vec![fallback_recommendation(Category::Mental).to_string()]
        );
    }

    #[tokio::test]
    async fn submit_without_answers_scores_zero() {
        let (store, user_id, _, _) = setup().await;
        get_or_create(&store, user_id).await.unwrap();
        let generator = ScriptedGenerator::new(vec![]);
        let completed = submit(&store, &generator, &ScoreScale::default(), user_id)
            .await
            .unwrap();
        assert_eq!(completed.overall_readiness_score, Some(0));
        assert!(completed.physical_health_recommendations.is_empty());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn attachment_upload_uses_category_path() {
        let (store, user_id, physical, _) = setup().await;
        let submission = get_or_create(&store, user_id).await.unwrap();
        let storage = RecordingStorage::new(false);
        let answer = answer_for(submission.id, &physical[0], 2);
        let upload = ResponseUpload {
            submission_id: submission.id,
            question_id: answer.question_id,
            response_option_id: answer.response_option_id,
            file_name: "vo2.pdf".into(),
            content_type: "application/pdf".into(),
            bytes: vec![1, 2, 3],
        };

        let saved = save_answer(&store, &storage, answer.clone(), Some(upload)).await.unwrap();
        let url = saved.uploaded_file_url.unwrap();
        let prefix = format!(
            "physical/{}/{}/{}/",
            submission.id, answer.question_id, answer.response_option_id
        );
        assert!(url.starts_with(&format!("https://files.test/{prefix}")));
        assert!(url.ends_with(".pdf"));
        assert_eq!(storage.paths.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_attachment_still_saves_answer() {
        let (store, user_id, physical, _) = setup().await;
        let submission = get_or_create(&store, user_id).await.unwrap();
        let storage = RecordingStorage::new(true);
        let answer = answer_for(submission.id, &physical[0], 2);
        let upload = ResponseUpload {
            submission_id: submission.id,
            question_id: answer.question_id,
            response_option_id: answer.response_option_id,
            file_name: "scan.png".into(),
            content_type: "image/png".into(),
            bytes: vec![0; 16],
        };

        let saved = save_answer(&store, &storage, answer, Some(upload)).await.unwrap();
        assert!(saved.uploaded_file_url.is_none());
        assert_eq!(store.response_count(submission.id).await, 1);
    }

    #[tokio::test]
    async fn get_or_create_resumes_row_won_by_concurrent_insert() {
        let (store, user_id, _, _) = setup().await;
        let winner = store.insert_submission(user_id).await.unwrap();
        let racing = LateReader {
            inner: store.clone(),
            hidden: AtomicBool::new(true),
        };

        assert!(matches!(
            racing.insert_submission(user_id).await,
            Err(DbError::Conflict(_))
        ));
        let resolved = get_or_create(&racing, user_id).await.unwrap();
        assert_eq!(resolved.id, winner.id);
        assert_eq!(resolved.status, SubmissionStatus::InProgress);
    }

    #[tokio::test]
    async fn attachment_option_must_belong_to_question() {
        let (store, user_id, physical, mental) = setup().await;
        let submission = get_or_create(&store, user_id).await.unwrap();
        let storage = RecordingStorage::new(false);
        let upload = ResponseUpload {
            submission_id: submission.id,
            question_id: physical[0].id,
            response_option_id: mental[0].response_options[0].id,
            file_name: "scan.pdf".into(),
            content_type: "application/pdf".into(),
            bytes: vec![1],
        };

        let err = upload_response_file(&store, &storage, upload).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(storage.paths.lock().unwrap().is_empty());
    }
}
