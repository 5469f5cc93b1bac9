// DocVault API Server
// Entry point for the document management REST API

mod config;
mod handlers;
mod middleware;
mod routes;

use anyhow::Context;
use config::Config;
use docvault_auth::{AuthService, JwtService};
use docvault_authz::AccessGuard;
use docvault_cache::Cache;
use docvault_database::Database;
use docvault_documents::{
    AuditService, DocumentService, LocalStorage, OrganizationService, Storage, VersionService,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub struct AppState {
    pub auth_service: AuthService,
    pub organization_service: OrganizationService,
    pub document_service: DocumentService,
    pub version_service: VersionService,
    pub audit_service: AuditService,
    pub cache: Option<Cache>,
    pub upload_body_limit: usize,
}

impl AppState {
    pub fn new(
        config: &Config,
        database: Database,
        cache: Option<Cache>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let jwt = JwtService::new(&config.jwt_secret)
            .with_expiration(config.jwt_expiration_hours, config.refresh_token_expiration_days);
        let guard = AccessGuard::new(database.pool().clone(), cache.clone());
        let audit_service = AuditService::new(&database, guard.clone());

        Self {
            auth_service: AuthService::new(database.clone(), jwt)
                .with_password_policy(config.password_policy),
            organization_service: OrganizationService::new(
                database.clone(),
                guard.clone(),
                storage.clone(),
            ),
            document_service: DocumentService::new(
                database.clone(),
                guard.clone(),
                audit_service.clone(),
                storage.clone(),
            ),
            version_service: VersionService::new(database, guard, audit_service.clone(), storage)
                .with_max_upload_bytes(config.max_upload_bytes),
            audit_service,
            cache,
            upload_body_limit: config.upload_body_limit(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,docvault_api=debug,tower_http=debug".to_string()),
        )
        .init();

    tracing::info!("🚀 Starting DocVault API Server");
    tracing::info!("📦 Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    tracing::info!("🔌 Server: {}:{}", config.server_host, config.server_port);

    // Initialize database
    tracing::info!("🗄️  Connecting to database at {}", config.database.redacted_url());
    let database = Database::new(config.database.clone())
        .await
        .context("Failed to connect to database")?;
    database.ping().await.context("Database ping failed")?;
    tracing::info!("✅ Database connected");

    if config.run_migrations {
        database.migrate().await.context("Failed to run migrations")?;
        tracing::info!("✅ Migrations applied");
    }

    // Redis is optional: without it roles are always read from the database
    // and rate limiting is disabled
    tracing::info!("⚡ Connecting to Redis...");
    let cache = match connect_cache(&config).await {
        Ok(cache) => {
            tracing::info!("✅ Redis connected");
            Some(cache)
        }
        Err(e) => {
            tracing::warn!("Redis unavailable, continuing without cache: {:#}", e);
            None
        }
    };

    // Initialize storage
    tokio::fs::create_dir_all(&config.storage_path)
        .await
        .with_context(|| format!("Failed to create storage directory {}", config.storage_path))?;
    let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(&config.storage_path));
    tracing::info!("💾 Storage at {}", config.storage_path);

    let state = Arc::new(AppState::new(&config, database, cache, storage));

    // Create router
    let app = routes::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("✅ Server ready at http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn connect_cache(config: &Config) -> anyhow::Result<Cache> {
    let cache = Cache::new(config.cache.clone()).await?;
    cache.ping().await?;
    Ok(cache)
}
