use invite_control::{AdminSessions, Broadcaster, ChatRegistry, MemberStore, MemberSync};
use invite_metrics::MetricsService;
use invite_models::{BotError, BroadcastSettings, Config, RefreshReport};
use invite_telegram::{TelegramApi, User};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub api: Arc<dyn TelegramApi>,
    pub store: Arc<dyn MemberStore>,
    pub registry: Arc<ChatRegistry>,
    pub settings: Arc<Mutex<BroadcastSettings>>,
    pub sessions: Arc<AdminSessions>,
    pub metrics: Arc<MetricsService>,
    pub bot_id: i64,
    pub bot_username: Option<String>,
}

impl AppState {
    pub fn new(
        config: Config,
        api: Arc<dyn TelegramApi>,
        store: Arc<dyn MemberStore>,
        metrics: Arc<MetricsService>,
        bot: &User,
    ) -> Self {
        let settings = config.broadcast.clone();
        Self {
            config,
            api,
            store,
            registry: Arc::new(ChatRegistry::new()),
            settings: Arc::new(Mutex::new(settings)),
            sessions: Arc::new(AdminSessions::new()),
            metrics,
            bot_id: bot.id,
            bot_username: bot.username.clone(),
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.config.access.admin_id
    }

    pub fn target_chat_id(&self) -> i64 {
        self.config.access.target_chat_id
    }

    pub async fn settings_snapshot(&self) -> BroadcastSettings {
        self.settings.lock().await.clone()
    }

    pub fn broadcaster(&self) -> Broadcaster {
        Broadcaster::new(
            self.api.clone(),
            self.store.clone(),
            self.registry.clone(),
            self.target_chat_id(),
            self.config.pacing.clone(),
        )
    }

    pub fn member_sync(&self) -> MemberSync {
        MemberSync::new(
            self.api.clone(),
            self.store.clone(),
            self.target_chat_id(),
            Duration::from_millis(self.config.pacing.member_check_ms),
        )
    }

    /// Rebuilds the chat registry from storage and Telegram.
    pub async fn refresh_chats(&self) -> Result<RefreshReport, BotError> {
        let report = self
            .registry
            .refresh(self.api.as_ref(), self.store.as_ref(), self.bot_id)
            .await?;
        self.metrics.record_refresh(&report);
        Ok(report)
    }
}
