use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Telegram API error in {method}: {description}")]
    Telegram {
        method: String,
        error_code: Option<i64>,
        description: String,
    },

    #[error("Telegram transport error: {reason}")]
    Transport { reason: String },

    #[error("Invalid callback data: {data}")]
    InvalidCallback { data: String },

    #[error("User {user_id} is not allowed to do this")]
    Unauthorized { user_id: i64 },

    #[error("Internal error: {reason}")]
    InternalError { reason: String },

    #[error("Database error: {reason}")]
    DatabaseError { reason: String },

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },
}

impl BotError {
    pub fn telegram(method: &str, error_code: Option<i64>, description: impl Into<String>) -> Self {
        BotError::Telegram {
            method: method.to_string(),
            error_code,
            description: description.into(),
        }
    }

    /// Stable label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BotError::Telegram { .. } => "telegram",
            BotError::Transport { .. } => "transport",
            BotError::InvalidCallback { .. } => "invalid_callback",
            BotError::Unauthorized { .. } => "unauthorized",
            BotError::InternalError { .. } => "internal",
            BotError::DatabaseError { .. } => "database",
            BotError::SqlxError(_) => "database",
            BotError::ConfigError { .. } => "config",
        }
    }

    /// True when Telegram reports that the chat or the member no longer exists
    /// from the bot's point of view.
    pub fn is_gone(&self) -> bool {
        match self {
            BotError::Telegram { description, .. } => {
                let description = description.to_lowercase();
                description.contains("chat not found")
                    || description.contains("member not found")
                    || description.contains("bot was kicked")
                    || description.contains("bot is not a member")
            }
            _ => false,
        }
    }

    /// True for failures worth retrying after a pause (network, 5xx, 429).
    pub fn is_transient(&self) -> bool {
        match self {
            BotError::Transport { .. } => true,
            BotError::Telegram { error_code, .. } => {
                matches!(error_code, Some(code) if *code == 429 || *code >= 500)
            }
            _ => false,
        }
    }
}
