use crate::types::{
    AnswerCallbackQuery, ApiResponse, Chat, ChatMember, EditMessageText, GetUpdates, Message,
    SendMessage, Update, User,
};
use async_trait::async_trait;
use invite_models::{BotError, TelegramConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bot API calls the bot depends on. Implemented over HTTP by [`BotClient`]
/// and by in-memory fakes in tests.
#[async_trait]
pub trait TelegramApi: Send + Sync + 'static {
    async fn get_me(&self) -> Result<User, BotError>;
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>, BotError>;
    async fn send_message(&self, request: SendMessage) -> Result<Message, BotError>;
    async fn edit_message_text(&self, request: EditMessageText) -> Result<(), BotError>;
    async fn answer_callback_query(&self, request: AnswerCallbackQuery) -> Result<(), BotError>;
    async fn get_chat(&self, chat_id: i64) -> Result<Chat, BotError>;
    async fn get_chat_member(&self, chat_id: i64, user_id: i64) -> Result<ChatMember, BotError>;
    async fn get_chat_member_count(&self, chat_id: i64) -> Result<i64, BotError>;
    async fn get_chat_administrators(&self, chat_id: i64) -> Result<Vec<ChatMember>, BotError>;
}

pub struct BotClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl BotClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, BotError> {
        // Long polls hold the request open for poll_timeout_secs.
        let timeout = Duration::from_secs(config.poll_timeout_secs + config.request_timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::Transport {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Error text with the bot token masked; reqwest errors embed the URL.
    fn redact(&self, text: &str) -> String {
        if self.token.is_empty() {
            text.to_string()
        } else {
            text.replace(&self.token, "***")
        }
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T, BotError>
    where
        P: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(method = %method, "Calling Bot API");

        let response = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(|e| BotError::Transport {
                reason: self.redact(&e.to_string()),
            })?;

        // Telegram answers errors with a JSON body too, so the status is only
        // used when that body is unreadable.
        let status = response.status();
        let body: ApiResponse<T> = response.json().await.map_err(|e| BotError::Transport {
            reason: format!("{} returned {}: {}", method, status, self.redact(&e.to_string())),
        })?;

        body.into_result(method)
    }
}

#[async_trait]
impl TelegramApi for BotClient {
    #[instrument(skip(self))]
    async fn get_me(&self) -> Result<User, BotError> {
        self.call("getMe", &json!({})).await
    }

    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>, BotError> {
        let request = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message".to_string(), "callback_query".to_string()],
        };
        self.call("getUpdates", &request).await
    }

    #[instrument(skip(self, request), fields(chat_id = request.chat_id))]
    async fn send_message(&self, request: SendMessage) -> Result<Message, BotError> {
        self.call("sendMessage", &request).await
    }

    #[instrument(skip(self, request), fields(chat_id = request.chat_id, message_id = request.message_id))]
    async fn edit_message_text(&self, request: EditMessageText) -> Result<(), BotError> {
        // Result is the edited Message, or `true` for inline messages.
        let _: serde_json::Value = self.call("editMessageText", &request).await?;
        Ok(())
    }

    async fn answer_callback_query(&self, request: AnswerCallbackQuery) -> Result<(), BotError> {
        let _: bool = self.call("answerCallbackQuery", &request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_chat(&self, chat_id: i64) -> Result<Chat, BotError> {
        self.call("getChat", &json!({ "chat_id": chat_id })).await
    }

    #[instrument(skip(self))]
    async fn get_chat_member(&self, chat_id: i64, user_id: i64) -> Result<ChatMember, BotError> {
        self.call("getChatMember", &json!({ "chat_id": chat_id, "user_id": user_id }))
            .await
    }

    #[instrument(skip(self))]
    async fn get_chat_member_count(&self, chat_id: i64) -> Result<i64, BotError> {
        self.call("getChatMemberCount", &json!({ "chat_id": chat_id }))
            .await
    }

    #[instrument(skip(self))]
    async fn get_chat_administrators(&self, chat_id: i64) -> Result<Vec<ChatMember>, BotError> {
        self.call("getChatAdministrators", &json!({ "chat_id": chat_id }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TelegramConfig {
        TelegramConfig {
            bot_token: "123:secret".to_string(),
            api_url: "https://api.telegram.org/".to_string(),
            poll_timeout_secs: 30,
            request_timeout_secs: 10,
        }
    }

    #[test]
    fn method_url_includes_token_once() {
        let client = BotClient::new(&config()).unwrap();
        assert_eq!(
            client.method_url("getMe"),
            "https://api.telegram.org/bot123:secret/getMe"
        );
    }

    #[test]
    fn redact_masks_token() {
        let client = BotClient::new(&config()).unwrap();
        let text = "error sending request for url (https://api.telegram.org/bot123:secret/getMe)";
        let redacted = client.redact(text);
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("bot***"));
    }

    #[tokio::test]
    async fn unreachable_api_is_a_transport_error() {
        let mut config = config();
        config.api_url = "http://127.0.0.1:9".to_string();
        config.poll_timeout_secs = 0;
        config.request_timeout_secs = 2;
        let client = BotClient::new(&config).unwrap();

        let err = client.get_me().await.unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert!(!err.to_string().contains("secret"));
    }
}
