use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};

use axum::extract::DefaultBodyLimit;
use axum::http::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE, ETAG, IF_NONE_MATCH},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use aloite_api::AppStateInner;
use aloite_core::{CoreConfig, Platform};
use aloite_db::Database;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

/// Request bodies above this are cut off before any handler runs. Image
/// uploads have their own, smaller limit.
const MAX_BODY_BYTES: usize = 1024 * 1024;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 720;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aloite_server=debug,aloite_api=debug,aloite_core=debug,aloite_db=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("ALOITE_JWT_SECRET").unwrap_or_default();
    if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        eprintln!("FATAL: ALOITE_JWT_SECRET is unset or still a placeholder.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }

    let host = std::env::var("ALOITE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("ALOITE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let db_path: PathBuf = std::env::var("ALOITE_DB_PATH")
        .unwrap_or_else(|_| "aloite.db".into())
        .into();
    let token_ttl = token_ttl(std::env::var("ALOITE_TOKEN_TTL_HOURS").ok().as_deref())?;

    let core_config = CoreConfig::from_env()?;

    // Init database and core
    let db = Database::open(&db_path)?;
    let platform = Platform::new(db, core_config)?;

    match (
        std::env::var("ALOITE_ADMIN_USERNAME"),
        std::env::var("ALOITE_ADMIN_PASSWORD"),
    ) {
        (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
            let admin = platform.ensure_admin(&username, &password)?;
            info!("Administrator account: {}", admin.username);
        }
        _ => warn!("ALOITE_ADMIN_USERNAME/ALOITE_ADMIN_PASSWORD not set; no bootstrap admin"),
    }

    let state = Arc::new(AppStateInner {
        platform,
        jwt_secret,
        token_ttl,
    });

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, IF_NONE_MATCH])
        .expose_headers([ETAG])
        .allow_credentials(false);

    let app = aloite_api::router(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Aloite server listening on {}", addr);
    info!("Database: {}", db_path.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Session token lifetime from `ALOITE_TOKEN_TTL_HOURS`: 30 days when unset,
/// a startup error when not a positive whole number of hours.
fn token_ttl(raw: Option<&str>) -> anyhow::Result<chrono::Duration> {
    let Some(raw) = raw else {
        return Ok(chrono::Duration::hours(DEFAULT_TOKEN_TTL_HOURS));
    };
    let hours: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("ALOITE_TOKEN_TTL_HOURS={raw:?} is not a number"))?;
    if hours <= 0 {
        bail!("ALOITE_TOKEN_TTL_HOURS must be positive, got {hours}");
    }
    Ok(chrono::Duration::hours(hours))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
