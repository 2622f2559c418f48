use crate::chat_registry::ChatRegistry;
use crate::store::MemberStore;
use crate::sync::ProgressReporter;
use invite_metrics::TracingService;
use invite_models::{
    BotError, BroadcastReport, BroadcastSettings, NetworkMode, PacingConfig, TargetLine,
};
use invite_telegram::{SendMessage, TelegramApi};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;
use uuid::Uuid;

/// Resolved recipients of one broadcast, in delivery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BroadcastPlan {
    /// Direct messages to target chat members.
    pub audience: Vec<i64>,
    pub target_chat: Option<i64>,
    /// Set when network delivery is enabled.
    pub network_mode: Option<NetworkMode>,
    pub network_chats: Vec<i64>,
    /// Direct messages in `members_only` mode.
    pub network_members: Vec<i64>,
    audience_enabled: bool,
}

impl BroadcastPlan {
    pub fn total(&self) -> usize {
        self.audience.len()
            + usize::from(self.target_chat.is_some())
            + self.network_chats.len()
            + self.network_members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// One line per enabled destination, for the preview.
    pub fn lines(&self) -> Vec<TargetLine> {
        let mut lines = Vec::new();
        if self.audience_enabled {
            lines.push(line("👤 Target chat members (direct)", self.audience.len(), "users"));
        }
        if self.target_chat.is_some() {
            lines.push(line("💬 Target chat", 1, "chat"));
        }
        match self.network_mode {
            Some(NetworkMode::All) => {
                lines.push(line("🌐 All available chats", self.network_chats.len(), "chats"));
            }
            Some(NetworkMode::MembersOnly) => {
                lines.push(line(
                    "👥 Network chat members (target chat only)",
                    self.network_members.len(),
                    "users",
                ));
            }
            Some(NetworkMode::SpecificChats) => {
                lines.push(line("🎯 Selected chats", self.network_chats.len(), "chats"));
            }
            None => {}
        }
        lines
    }
}

fn line(label: &str, count: usize, unit: &str) -> TargetLine {
    TargetLine {
        label: label.to_string(),
        count,
        unit: unit.to_string(),
    }
}

/// Plans and delivers broadcasts.
pub struct Broadcaster {
    api: Arc<dyn TelegramApi>,
    store: Arc<dyn MemberStore>,
    registry: Arc<ChatRegistry>,
    target_chat_id: i64,
    pacing: PacingConfig,
}

impl Broadcaster {
    pub fn new(
        api: Arc<dyn TelegramApi>,
        store: Arc<dyn MemberStore>,
        registry: Arc<ChatRegistry>,
        target_chat_id: i64,
        pacing: PacingConfig,
    ) -> Self {
        Self {
            api,
            store,
            registry,
            target_chat_id,
            pacing,
        }
    }

    /// Resolves settings into recipients. A recipient appears at most once
    /// per plan.
    pub async fn plan(&self, settings: &BroadcastSettings) -> Result<BroadcastPlan, BotError> {
        let mut plan = BroadcastPlan {
            audience_enabled: settings.to_target_chat_members,
            ..Default::default()
        };

        let audience = self.store.list_audience(self.target_chat_id).await?;
        if settings.to_target_chat_members {
            plan.audience = audience.clone();
        }

        if settings.to_target_chat {
            plan.target_chat = Some(self.target_chat_id);
        }

        if settings.to_network_chats {
            plan.network_mode = Some(settings.network_mode);
            let skip_target = settings.to_target_chat;
            let registry_ids = self.registry.chat_ids().await;

            match settings.network_mode {
                NetworkMode::All => {
                    plan.network_chats = registry_ids
                        .into_iter()
                        .filter(|id| !(skip_target && *id == self.target_chat_id))
                        .collect();
                }
                NetworkMode::SpecificChats => {
                    let known: HashSet<i64> = registry_ids.into_iter().collect();
                    let mut seen = HashSet::new();
                    plan.network_chats = settings
                        .selected_chats
                        .iter()
                        .copied()
                        .filter(|id| known.contains(id))
                        .filter(|id| !(skip_target && *id == self.target_chat_id))
                        .filter(|id| seen.insert(*id))
                        .collect();
                }
                NetworkMode::MembersOnly => {
                    let mut network_members = BTreeSet::new();
                    for chat_id in registry_ids {
                        network_members.extend(self.store.list_chat_members(chat_id).await?);
                    }
                    let audience: HashSet<i64> = audience.into_iter().collect();
                    let already_messaged: HashSet<i64> = plan.audience.iter().copied().collect();
                    plan.network_members = network_members
                        .into_iter()
                        .filter(|id| audience.contains(id) && !already_messaged.contains(id))
                        .collect();
                }
            }
        }

        Ok(plan)
    }

    /// Sends `text` to every recipient of the plan. Failed deliveries are
    /// counted and logged; the run always completes.
    #[instrument(skip_all, fields(total = plan.total()))]
    pub async fn execute(
        &self,
        plan: &BroadcastPlan,
        text: &str,
        progress: &dyn ProgressReporter,
    ) -> BroadcastReport {
        let started = Instant::now();
        let mut report = BroadcastReport {
            broadcast_id: Uuid::new_v4().to_string(),
            total_targets: plan.total(),
            ..Default::default()
        };
        TracingService::log_broadcast_started(&report.broadcast_id, report.total_targets);

        let dm_delay = Duration::from_millis(self.pacing.direct_message_ms);
        let chat_delay = Duration::from_millis(self.pacing.chat_message_ms);

        if !plan.audience.is_empty() {
            progress
                .report(&format!(
                    "📤 **Sending to target chat members**\nSending to {} members directly...",
                    plan.audience.len()
                ))
                .await;
            for user_id in &plan.audience {
                self.deliver(&mut report, *user_id, text, dm_delay).await;
            }
        }

        if let Some(chat_id) = plan.target_chat {
            self.deliver(&mut report, chat_id, text, Duration::ZERO).await;
        }

        if !plan.network_members.is_empty() {
            progress
                .report(&format!(
                    "🌐 **Sending to the chat network**\nSending to {} members directly...",
                    plan.network_members.len()
                ))
                .await;
            for user_id in &plan.network_members {
                self.deliver(&mut report, *user_id, text, dm_delay).await;
            }
        }

        if !plan.network_chats.is_empty() {
            progress
                .report(&format!(
                    "🌐 **Sending to the chat network**\nSending to {} chats...",
                    plan.network_chats.len()
                ))
                .await;
            for chat_id in &plan.network_chats {
                self.deliver(&mut report, *chat_id, text, chat_delay).await;
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        TracingService::log_broadcast_completed(&report, duration_ms);
        report
    }

    async fn deliver(&self, report: &mut BroadcastReport, chat_id: i64, text: &str, pause: Duration) {
        match self
            .api
            .send_message(SendMessage::new(chat_id, text).markdown())
            .await
        {
            Ok(_) => report.success_count += 1,
            Err(e) => {
                report.error_count += 1;
                TracingService::log_delivery_failed(&report.broadcast_id, chat_id, &e);
            }
        }

        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}
