use interview_orchestrator::{
    config::{get_config, init_config, Config},
    database::pool::{create_pool, run_migrations},
    routes,
    services::{
        ai_service::AIService,
        orchestrator_service::{Collaborators, InterviewOrchestrator, OrchestratorSettings},
        store_service::{MemorySessionStore, PgSessionStore, SessionStore},
    },
    AppState,
};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if log_format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn SessionStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            run_migrations(&pool).await?;
            info!("Persisting interviews to PostgreSQL");
            Ok(Arc::new(PgSessionStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, interviews will not survive a restart");
            Ok(Arc::new(MemorySessionStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config()?;
    init_tracing(&config.log_format);

    let store = open_store(config).await?;

    let http_client = Client::builder()
        .timeout(Duration::from_secs(config.ai_timeout_secs))
        .build()?;
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set, every AI call will use its local fallback");
    }
    let ai_service = AIService::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
        Duration::from_secs(config.ai_timeout_secs),
        http_client,
    );

    let interview = InterviewOrchestrator::spawn(
        OrchestratorSettings::from_config(config),
        Collaborators::shared(ai_service),
        store.clone(),
    )
    .await?;

    let app = routes::router(AppState::new(interview, store));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
