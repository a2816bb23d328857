use std::{sync::Arc, time::Duration};

use chrono::Utc;
use engine::Engine;
use migration::{Migrator, MigratorTrait};
use settings::Database;
use tokio::time::MissedTickBehavior;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "moneta={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no server settings found, nothing to run");
        return Ok(());
    };

    tracing::info!("Found server settings...");
    let db = parse_database(&server.database).await?;
    let engine = Arc::new(Engine::builder().database(db).build().await?);

    if let Some(sweep) = settings.sweep {
        let period = Duration::from_secs(sweep.interval_secs.max(1));
        tracing::info!(interval_secs = period.as_secs(), "periodic expiry sweep enabled");
        tasks.spawn(sweep_periodically(engine.clone(), period));
    }

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tasks.spawn(async move {
        if let Err(err) = server::run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

/// Expires overdue goals every `period`, starting immediately.
async fn sweep_periodically(engine: Arc<Engine>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match engine.sweep_expired(Utc::now().date_naive()).await {
            Ok(expired) => tracing::debug!(expired, "periodic sweep done"),
            Err(err) => tracing::error!("periodic sweep failed: {err}"),
        }
    }
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
