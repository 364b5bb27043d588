mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use marinet_api::auth::hash_password;
use marinet_api::gemini::GeminiClient;
use marinet_api::tutor::TutorBridge;
use marinet_api::uploads::{PUBLIC_PREFIX, UploadStore};
use marinet_api::{AppState, AppStateInner};
use marinet_db::Database;

use crate::config::{Config, DEFAULT_JWT_SECRET};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marinet=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("MARINET_JWT_SECRET is unset; using the development secret");
    }

    // Init database
    let db = Database::open(&config.db_path)?;
    if config.seed_demo {
        let hash = hash_password(&config.admin_password)?;
        if db.seed_demo(&hash)? {
            info!("Seeded demo admin and groups");
        }
    }

    // AI tutor
    let gemini = GeminiClient::new(
        &config.gemini_base_url,
        &config.gemini_model,
        &config.gemini_api_key,
        config.ai_timeout,
    )?;
    if !gemini.is_configured() {
        warn!("GEMINI_API_KEY is not set; the AI tutor will answer with a fallback message");
    }
    let tutor = TutorBridge::new(Arc::new(gemini), config.ai_timeout);

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let uploads = UploadStore::new(config.upload_dir.clone());

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        tutor,
        uploads,
        mentions_on_vote: config.mentions_on_vote,
    });

    let app = marinet_api::router(state, config.max_upload_bytes)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&config.upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Marinet server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
