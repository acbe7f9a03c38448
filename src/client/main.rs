/**
 * POS Sync Agent Entry Point
 *
 * Headless runner for the offline machinery: opens the local store, watches
 * connectivity, pushes queued sales whenever the server comes back and keeps
 * the catalog cache fresh. Useful on a till without a UI process attached.
 *
 * Usage: pos-sync-agent [config.toml]
 *
 * Environment:
 * - `RUST_LOG`           log filter (default `info`)
 * - `POS_API_URL`        store server URL
 * - `POS_DATABASE_PATH`  local database file
 * - `POS_API_TOKEN`      bearer token for the store server
 * - `POS_SESSION_USER`   operator name, enables catalog preload
 * - `POS_SESSION_ROLE`   operator role (`admin`, `cashier`, `viewer`)
 */
use pos_offline::client::{AppContext, Config, HttpRemote, Role, Session};
use std::sync::Arc;
use std::time::Duration;

const STATUS_LOG_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path);
            Config::from_file(&path)?
        }
        None => Config::new(),
    };
    config.set_token(std::env::var("POS_API_TOKEN").ok());

    let session = session_from_env()?;
    if let Some(session) = &session {
        tracing::info!("Operator {} ({:?})", session.username, session.role);
    }

    tracing::info!(
        "Store server {}, database {}",
        config.server_url(),
        config.database_path().display()
    );

    let remote = Arc::new(HttpRemote::new(&config)?);
    let ctx = AppContext::start(config, remote, session).await?;

    let _logger = ctx.subscribe(|status, _| {
        tracing::info!("Connectivity changed: {}", status);
    });

    let mut ticker = tokio::time::interval(STATUS_LOG_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let status = ctx.status().await;
                tracing::info!(
                    online = status.is_online,
                    syncing = status.is_syncing,
                    pending = status.pending_count,
                    last_sync = ?status.last_sync_time,
                    last_error = ?status.last_sync_error,
                    "Status"
                );
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("Failed to listen for shutdown signal: {}", e);
                }
                break;
            }
        }
    }

    tracing::info!("Shutting down");
    ctx.shutdown().await;
    Ok(())
}

fn session_from_env() -> Result<Option<Session>, Box<dyn std::error::Error>> {
    let Ok(username) = std::env::var("POS_SESSION_USER") else {
        return Ok(None);
    };

    let role = match std::env::var("POS_SESSION_ROLE") {
        Ok(raw) => serde_json::from_value::<Role>(serde_json::Value::String(raw.to_lowercase()))?,
        Err(_) => Role::Cashier,
    };

    Ok(Some(Session::new(username, role)))
}
