#![allow(dead_code)]

use invite_control::{MemberStore, MemoryStore};
use invite_dispatch::{handle_update, AppState};
use invite_metrics::MetricsService;
use invite_models::{BotError, Config, MemberStatus, UserRecord};
use invite_telegram::Update;
use invite_testsupport::{admin, callback_update, message_update, private_chat, test_config, text_message, MockTelegram, BOT_ID};
use std::sync::Arc;

pub struct Harness {
    pub api: Arc<MockTelegram>,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let api = Arc::new(MockTelegram::new(BOT_ID));
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(MetricsService::new().unwrap());
        let state = AppState::new(config, api.clone(), store.clone(), metrics, &api.me());
        Self { api, store, state }
    }

    pub async fn handle(&self, update: Update) -> Result<(), BotError> {
        handle_update(&self.state, &update).await
    }

    /// Presses a panel button as the admin.
    pub async fn press(&self, data: &str) -> Result<(), BotError> {
        self.handle(callback_update(&admin(), data)).await
    }

    /// Sends private text as the admin.
    pub async fn admin_says(&self, text: &str) -> Result<(), BotError> {
        let admin = admin();
        self.handle(message_update(text_message(private_chat(admin.id), &admin, text)))
            .await
    }

    pub async fn add_member(&self, user_id: i64, chat_id: i64) {
        self.store
            .upsert_user(&UserRecord {
                user_id,
                username: None,
                first_name: Some(format!("User {}", user_id)),
                last_name: None,
                is_bot: false,
            })
            .await
            .unwrap();
        self.store
            .upsert_chat_member(user_id, chat_id, MemberStatus::Member)
            .await
            .unwrap();
    }

    /// Text of the last message sent or edited into `chat_id`.
    pub fn last_text(&self, chat_id: i64) -> String {
        self.api
            .last_to(chat_id)
            .map(|o| o.text().to_string())
            .unwrap_or_default()
    }

    pub fn last_keyboard(&self, chat_id: i64) -> Vec<String> {
        self.api
            .last_to(chat_id)
            .map(|o| o.keyboard_data())
            .unwrap_or_default()
    }

    pub fn last_answer(&self) -> Option<(Option<String>, bool)> {
        self.api
            .answers()
            .last()
            .map(|a| (a.text.clone(), a.show_alert))
    }
}
