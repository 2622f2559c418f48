use crate::handlers::handle_update;
use crate::state::AppState;
use invite_metrics::TracingService;
use invite_models::BotError;
use invite_telegram::Update;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

/// Long-polls `getUpdates` until `shutdown` flips to true.
///
/// Each update runs on its own task so a paced broadcast does not hold up
/// other users. Handlers still in flight are awaited before returning.
pub async fn run_polling(state: AppState, mut shutdown: watch::Receiver<bool>) -> Result<(), BotError> {
    let timeout = state.config.telegram.poll_timeout_secs;
    let mut offset: Option<i64> = None;
    let mut backoff = INITIAL_BACKOFF;
    let mut tasks = JoinSet::new();

    info!(timeout_secs = timeout, "Polling for updates");

    loop {
        while let Some(joined) = tasks.try_join_next() {
            log_panicked(joined);
        }

        if *shutdown.borrow() {
            break;
        }

        let batch = tokio::select! {
            _ = shutdown.changed() => break,
            batch = state.api.get_updates(offset, timeout) => batch,
        };

        let updates = match batch {
            Ok(updates) => {
                backoff = INITIAL_BACKOFF;
                updates
            }
            Err(e) => {
                if e.is_transient() {
                    warn!(error = %e, backoff_ms = backoff.as_millis() as u64, "getUpdates failed, retrying");
                } else {
                    error!(error = %e, backoff_ms = backoff.as_millis() as u64, "getUpdates rejected, retrying");
                }
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = next_backoff(backoff);
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            state.metrics.record_update();
            tasks.spawn(process(state.clone(), update));
        }
    }

    if !tasks.is_empty() {
        info!(in_flight = tasks.len(), "Waiting for in-flight updates");
    }
    while let Some(joined) = tasks.join_next().await {
        log_panicked(joined);
    }

    info!("Polling stopped");
    Ok(())
}

async fn process(state: AppState, update: Update) {
    if let Err(e) = handle_update(&state, &update).await {
        state.metrics.record_update_error(&e);
        TracingService::log_update_failed(update.update_id, &e);
    }
}

fn log_panicked(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Update handler panicked");
    }
}
