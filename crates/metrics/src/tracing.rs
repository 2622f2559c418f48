use invite_models::{BotChat, BotError, BroadcastReport, LoggingConfig, RefreshReport, SyncReport};
use tracing::{error, info, warn};

pub struct TracingService;

impl TracingService {
    pub fn init(config: &LoggingConfig) -> Result<(), BotError> {
        let level: tracing::Level = config.level.parse().map_err(|_| BotError::ConfigError {
            reason: format!("unknown log level: {}", config.level),
        })?;

        let builder = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339());

        let result = if config.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };

        result.map_err(|e| BotError::InternalError {
            reason: e.to_string(),
        })
    }

    pub fn log_update_failed(update_id: i64, err: &BotError) {
        error!(
            update_id = update_id,
            error_kind = %err.kind(),
            error_message = %err,
            "Update handling failed"
        );
    }

    pub fn log_chat_recorded(chat: &BotChat) {
        info!(
            chat_id = chat.chat_id,
            title = %chat.title,
            chat_type = %chat.chat_type,
            members_count = chat.members_count,
            "Chat info updated"
        );
    }

    pub fn log_chat_removed(chat_id: i64, reason: &str) {
        warn!(
            chat_id = chat_id,
            reason = %reason,
            "Chat removed"
        );
    }

    pub fn log_member_removed(chat_id: i64, user_id: i64, reason: &str) {
        info!(
            chat_id = chat_id,
            user_id = user_id,
            reason = %reason,
            "Member removed"
        );
    }

    pub fn log_refresh_completed(report: &RefreshReport) {
        info!(
            chats_before = report.chats_before,
            chats_after = report.chats_after,
            removed = report.removed,
            "Chat refresh completed"
        );
    }

    pub fn log_sync_completed(chat_id: i64, report: &SyncReport) {
        info!(
            chat_id = chat_id,
            removed_count = report.removed_count,
            current_members = report.current_members,
            db_members_before = report.db_members_before,
            "Member sync completed"
        );
    }

    pub fn log_broadcast_started(broadcast_id: &str, total_targets: usize) {
        info!(
            broadcast_id = %broadcast_id,
            total_targets = total_targets,
            "Broadcast started"
        );
    }

    pub fn log_delivery_failed(broadcast_id: &str, chat_id: i64, err: &BotError) {
        warn!(
            broadcast_id = %broadcast_id,
            chat_id = chat_id,
            error_kind = %err.kind(),
            error_message = %err,
            "Delivery failed"
        );
    }

    pub fn log_broadcast_completed(report: &BroadcastReport, duration_ms: u64) {
        info!(
            broadcast_id = %report.broadcast_id,
            success_count = report.success_count,
            error_count = report.error_count,
            total_targets = report.total_targets,
            duration_ms = duration_ms,
            "Broadcast completed"
        );
    }
}
