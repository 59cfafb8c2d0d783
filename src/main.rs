use chakrulo::config::Config;
use chakrulo::db::{seed, PgStore, Store};
use chakrulo::domain::scoring::ScoreScale;
use chakrulo::middleware::RateLimiter;
use chakrulo::services::ai::GeminiService;
use chakrulo::services::storage::SupabaseStorage;
use chakrulo::state::{AppState, SharedState};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            e
        })?;
    tracing::info!("Database migrations completed");

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    seed::seed_questions(store.as_ref()).await?;

    let score_scale = if config.derive_max_scores {
        let mut questions = Vec::new();
        for category in chakrulo::domain::models::Category::ALL {
            questions.extend(store.questions_by_category(category).await?);
        }
        let derived = ScoreScale::derive(&questions, config.score_scale);
        tracing::info!(
            "Derived max scores from questions: physical {}, mental {}",
            derived.physical_max,
            derived.mental_max
        );
        derived
    } else {
        config.score_scale
    };

    let shared: SharedState = Arc::new(AppState {
        store,
        storage: Arc::new(SupabaseStorage::new(
            config.supabase_url.clone(),
            config.supabase_service_key.clone(),
            config.storage_bucket.clone(),
        )),
        ai: Arc::new(GeminiService::new(
            config.gemini_api_key.clone(),
            config.gemini_api_base.clone(),
            config.gemini_model.clone(),
        )),
        session_key: config.session_key.clone(),
        score_scale,
        ai_limiter: RateLimiter::new(config.ai_rate_limit, Duration::from_secs(60)),
    });

    let scheduler = JobScheduler::new().await?;
    let limiter = shared.ai_limiter.clone();
    scheduler
        .add(Job::new_async("0 0 * * * *", move |_uuid, _l| {
            let limiter = limiter.clone();
            Box::pin(async move {
                limiter.cleanup().await;
            })
        })?)
        .await?;
    scheduler.start().await?;
    tracing::info!("Scheduler started: rate limiter cleanup hourly");

    let app = chakrulo::router(shared);

    tracing::info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
