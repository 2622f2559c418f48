use invite_control::{MemberStore, PgStore};
use invite_dispatch::{run_polling, AppState};
use invite_metrics::{start_server, MetricsService};
use invite_models::{BotError, Config};
use invite_telegram::{BotClient, TelegramApi};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Runs the bot until Ctrl-C or until polling stops on its own.
pub async fn run(config: Config) -> anyhow::Result<()> {
    info!(database = %config.database.url(), "Connecting to database");
    let store = PgStore::connect(&config.database).await?;
    store.migrate().await?;

    let api = Arc::new(BotClient::new(&config.telegram)?);
    let me = api.get_me().await?;
    info!(bot_id = me.id, username = ?me.username, "✅ Bot identity confirmed");

    let metrics = Arc::new(MetricsService::new()?);
    let state = AppState::new(
        config.clone(),
        api,
        Arc::new(store.clone()),
        metrics.clone(),
        &me,
    );

    match state.refresh_chats().await {
        Ok(report) => info!(chats = report.chats_after, "Chat registry loaded"),
        Err(e) => warn!(error = %e, "Initial chat refresh failed"),
    }

    if config.ops.enabled {
        let bind = config.ops.bind.clone();
        let port = config.ops.port;
        tokio::spawn(async move {
            if let Err(e) = start_server(bind, port, metrics).await {
                error!("Ops server error: {}", e);
            }
        });
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut poller = tokio::spawn(run_polling(state, shutdown_rx));
    info!("📡 Ready to handle updates");

    tokio::select! {
        result = &mut poller => {
            result??;
            warn!("Polling ended without a shutdown signal");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
            poller.await??;
        }
    }

    store.close().await;
    info!("👋 Invite Bot stopped");
    Ok(())
}

pub async fn migrate(config: &Config) -> anyhow::Result<()> {
    let store = PgStore::connect(&config.database).await?;
    store.migrate().await?;
    store.close().await;
    info!("Schema is up to date");
    Ok(())
}

pub async fn stats(config: &Config) -> anyhow::Result<()> {
    let store = PgStore::connect(&config.database).await?;
    let report = statistics_json(&store, config.access.target_chat_id).await;
    store.close().await;

    println!("{}", serde_json::to_string_pretty(&report?)?);
    Ok(())
}

/// Statistics for the target chat as a JSON document.
pub async fn statistics_json(
    store: &dyn MemberStore,
    target_chat_id: i64,
) -> Result<serde_json::Value, BotError> {
    let stats = store.statistics(target_chat_id).await?;
    let mut value = serde_json::to_value(&stats).map_err(|e| BotError::InternalError {
        reason: e.to_string(),
    })?;
    if let Some(object) = value.as_object_mut() {
        object.insert("target_chat_id".to_string(), target_chat_id.into());
    }
    Ok(value)
}
