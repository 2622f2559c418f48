use crate::keyboards::{self, CHATS_PER_PAGE};
use crate::routes::{route, CallbackAction, Command, Route};
use crate::state::AppState;
use crate::texts;
use async_trait::async_trait;
use invite_control::{AdminState, ProgressReporter};
use invite_metrics::TracingService;
use invite_models::{BotError, MemberStatus};
use invite_telegram::{
    AnswerCallbackQuery, CallbackQuery, EditMessageText, InlineKeyboardMarkup, Message,
    SendMessage, TelegramApi, Update,
};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Handles one update end to end.
#[instrument(skip_all, fields(update_id = update.update_id))]
pub async fn handle_update(state: &AppState, update: &Update) -> Result<(), BotError> {
    match route(update, state.bot_username.as_deref()) {
        Route::Command(command, message) => handle_command(state, command, message).await,
        Route::Text(message) => handle_text(state, message).await,
        Route::MembersJoined(message) => handle_members_joined(state, message).await,
        Route::MemberLeft(message) => handle_member_left(state, message).await,
        Route::GroupMessage(message) => handle_group_message(state, message).await,
        Route::Callback(query) => handle_callback(state, query).await,
        Route::Ignored => Ok(()),
    }
}

/// Edits one message in place with each progress line.
struct EditProgress<'a> {
    api: &'a dyn TelegramApi,
    chat_id: i64,
    message_id: i64,
    frame: fn(&str) -> String,
}

#[async_trait]
impl ProgressReporter for EditProgress<'_> {
    async fn report(&self, line: &str) {
        let request = EditMessageText::new(self.chat_id, self.message_id, (self.frame)(line)).markdown();
        if let Err(e) = self.api.edit_message_text(request).await {
            debug!(error = %e, "Progress update dropped");
        }
    }
}

/// The message that carries the admin panel buttons.
struct Panel<'a> {
    api: &'a dyn TelegramApi,
    chat_id: i64,
    message_id: i64,
}

impl Panel<'_> {
    async fn show(
        &self,
        text: impl Into<String>,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), BotError> {
        let mut request = EditMessageText::new(self.chat_id, self.message_id, text).markdown();
        if let Some(keyboard) = keyboard {
            request = request.keyboard(keyboard);
        }
        self.api.edit_message_text(request).await
    }
}

async fn send_markdown(
    state: &AppState,
    chat_id: i64,
    text: impl Into<String>,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<Message, BotError> {
    let mut request = SendMessage::new(chat_id, text).markdown();
    if let Some(keyboard) = keyboard {
        request = request.keyboard(keyboard);
    }
    state.api.send_message(request).await
}

async fn send_plain(state: &AppState, chat_id: i64, text: impl Into<String>) -> Result<Message, BotError> {
    state.api.send_message(SendMessage::new(chat_id, text)).await
}

/// Refreshes the registry; a failure only costs freshness.
async fn refresh_quietly(state: &AppState) {
    if let Err(e) = state.refresh_chats().await {
        warn!(error = %e, "Chat refresh failed");
    }
}

async fn handle_command(state: &AppState, command: Command, message: &Message) -> Result<(), BotError> {
    let Some(user) = &message.from else {
        return Ok(());
    };
    let chat_id = message.chat.id;

    match command {
        Command::Start => {
            state.store.upsert_user(&user.to_record()).await?;

            if message.chat.kind.is_group() {
                state
                    .registry
                    .record_chat(state.api.as_ref(), state.store.as_ref(), &message.chat)
                    .await;
                state
                    .store
                    .upsert_chat_member(user.id, chat_id, MemberStatus::Member)
                    .await?;
            }

            if state.is_admin(user.id) {
                refresh_quietly(state).await;
                send_markdown(state, chat_id, texts::ADMIN_WELCOME, Some(keyboards::admin_keyboard())).await?;
            } else {
                let is_member = state
                    .store
                    .list_chat_members(state.target_chat_id())
                    .await?
                    .contains(&user.id);
                send_plain(state, chat_id, texts::greeting(&user.first_name, is_member)).await?;
            }
        }
        Command::Admin => {
            if !state.is_admin(user.id) {
                send_plain(state, chat_id, texts::NO_PANEL_ACCESS).await?;
                return Ok(());
            }
            refresh_quietly(state).await;
            send_markdown(state, chat_id, texts::ADMIN_PANEL, Some(keyboards::admin_keyboard())).await?;
        }
        Command::AddChat => {
            if !state.is_admin(user.id) {
                send_plain(state, chat_id, texts::NO_COMMAND_RIGHTS).await?;
                return Ok(());
            }
            if !message.chat.kind.is_group() {
                send_plain(state, chat_id, texts::GROUPS_ONLY).await?;
                return Ok(());
            }

            match state
                .registry
                .record_chat(state.api.as_ref(), state.store.as_ref(), &message.chat)
                .await
            {
                Some(chat) => {
                    send_markdown(state, chat_id, texts::chat_added(&chat.title, chat.chat_id), None).await?;
                }
                None => {
                    send_plain(
                        state,
                        chat_id,
                        "❌ Could not add the chat: its details are not readable by the bot.",
                    )
                    .await?;
                }
            }
        }
        Command::Cancel => {
            if !state.is_admin(user.id) {
                return Ok(());
            }
            let was_writing = state.sessions.state(user.id) == AdminState::WaitingBroadcastText;
            state.sessions.clear(user.id);

            let text = if was_writing {
                texts::BROADCAST_TEXT_CANCELLED
            } else {
                texts::OPERATION_CANCELLED
            };
            state
                .api
                .send_message(SendMessage::new(chat_id, text).keyboard(keyboards::admin_keyboard()))
                .await?;
        }
    }

    Ok(())
}

async fn handle_text(state: &AppState, message: &Message) -> Result<(), BotError> {
    let (Some(user), Some(text)) = (&message.from, &message.text) else {
        return Ok(());
    };
    if !state.is_admin(user.id) || state.sessions.state(user.id) != AdminState::WaitingBroadcastText {
        return Ok(());
    }

    prepare_broadcast(state, user.id, message.chat.id, text).await
}

/// Stores the text, syncs the audience and shows the preview.
async fn prepare_broadcast(state: &AppState, admin_id: i64, chat_id: i64, text: &str) -> Result<(), BotError> {
    state.sessions.set_text(admin_id, text);

    let status = send_markdown(state, chat_id, texts::PREPARING_BROADCAST, None).await?;
    let panel = Panel {
        api: state.api.as_ref(),
        chat_id,
        message_id: status.message_id,
    };
    let progress = EditProgress {
        api: state.api.as_ref(),
        chat_id,
        message_id: status.message_id,
        frame: texts::preparing,
    };

    let sync = match state.member_sync().run(&progress).await {
        Ok(report) => {
            state.metrics.record_sync(&report);
            Some(report)
        }
        Err(e) => {
            warn!(error = %e, "Member sync before broadcast failed");
            None
        }
    };

    let plan = state.broadcaster().plan(&state.settings_snapshot().await).await?;
    if plan.is_empty() {
        panel.show(texts::NO_TARGETS, Some(keyboards::admin_keyboard())).await?;
        state.sessions.clear(admin_id);
        return Ok(());
    }

    let preview = texts::preview(
        sync.as_ref(),
        text,
        &plan.lines(),
        plan.total(),
        state.target_chat_id(),
    );
    panel.show(preview, Some(keyboards::confirmation_keyboard())).await?;
    state.sessions.set_state(admin_id, AdminState::ConfirmingBroadcast);
    Ok(())
}

async fn handle_members_joined(state: &AppState, message: &Message) -> Result<(), BotError> {
    let chat = &message.chat;
    let bot_added = message.new_chat_members.iter().any(|u| u.id == state.bot_id);

    for user in message.new_chat_members.iter().filter(|u| !u.is_bot) {
        state
            .store
            .upsert_chat_member(user.id, chat.id, MemberStatus::Member)
            .await?;
        state.store.upsert_user(&user.to_record()).await?;
    }

    if chat.kind.is_group() {
        state
            .registry
            .record_chat(state.api.as_ref(), state.store.as_ref(), chat)
            .await;
        if bot_added {
            info!(chat_id = chat.id, title = ?chat.title, "Bot added to a new chat");
        }
    }
    Ok(())
}

async fn handle_member_left(state: &AppState, message: &Message) -> Result<(), BotError> {
    if let Some(user) = &message.left_chat_member {
        if !user.is_bot {
            state.store.remove_chat_member(user.id, message.chat.id).await?;
            TracingService::log_member_removed(message.chat.id, user.id, "left the chat");
        }
    }
    Ok(())
}

async fn handle_group_message(state: &AppState, message: &Message) -> Result<(), BotError> {
    if let Some(user) = &message.from {
        state.store.upsert_user(&user.to_record()).await?;
        state
            .store
            .upsert_chat_member(user.id, message.chat.id, MemberStatus::Member)
            .await?;
    }
    state
        .registry
        .record_chat(state.api.as_ref(), state.store.as_ref(), &message.chat)
        .await;
    Ok(())
}

async fn answer(state: &AppState, query: &CallbackQuery, text: Option<&str>, alert: bool) -> Result<(), BotError> {
    let mut request = AnswerCallbackQuery::new(query.id.clone());
    request = match (text, alert) {
        (Some(text), true) => request.alert(text),
        (Some(text), false) => request.text(text),
        (None, _) => request,
    };
    state.api.answer_callback_query(request).await
}

async fn handle_callback(state: &AppState, query: &CallbackQuery) -> Result<(), BotError> {
    let admin_id = query.from.id;
    if !state.is_admin(admin_id) {
        answer(state, query, Some(texts::NO_ACCESS), true).await?;
        return Err(BotError::Unauthorized { user_id: admin_id });
    }

    let data = query.data.as_deref().unwrap_or_default();
    let action = match data.parse::<CallbackAction>() {
        Ok(action) => action,
        Err(e) => {
            answer(state, query, None, false).await?;
            return Err(e);
        }
    };

    let Some(message) = &query.message else {
        // Panel too old to edit.
        return answer(state, query, None, false).await;
    };
    let panel = Panel {
        api: state.api.as_ref(),
        chat_id: message.chat.id,
        message_id: message.message_id,
    };

    debug!(action = %action, "Admin callback");
    match action {
        CallbackAction::CreateBroadcast => {
            panel.show(texts::create_prompt(false), None).await?;
            state.sessions.set_state(admin_id, AdminState::WaitingBroadcastText);
            answer(state, query, None, false).await?;
        }
        CallbackAction::EditBroadcastText => {
            panel.show(texts::create_prompt(true), None).await?;
            state.sessions.set_state(admin_id, AdminState::WaitingBroadcastText);
            answer(state, query, None, false).await?;
        }
        CallbackAction::BroadcastSettings => {
            show_settings(state, &panel).await?;
            answer(state, query, None, false).await?;
        }
        CallbackAction::UpdateChats => {
            answer(state, query, Some("🔄 Updating chat list..."), false).await?;
            panel.show(texts::REFRESH_PROGRESS, None).await?;

            let text = match state.refresh_chats().await {
                Ok(report) => texts::refresh_report(&report, &state.registry.snapshot().await),
                Err(e) => {
                    warn!(error = %e, "Chat refresh failed");
                    format!("❌ **Chat update failed**\n\n{}", e)
                }
            };
            panel.show(text, Some(keyboards::admin_keyboard())).await?;
        }
        CallbackAction::SyncMembers => {
            answer(state, query, Some("🔄 Syncing members..."), false).await?;
            panel.show(texts::SYNC_PROGRESS, None).await?;

            let progress = EditProgress {
                api: state.api.as_ref(),
                chat_id: panel.chat_id,
                message_id: panel.message_id,
                frame: texts::syncing,
            };
            let text = match state.member_sync().run(&progress).await {
                Ok(report) => {
                    state.metrics.record_sync(&report);
                    texts::sync_report(&report)
                }
                Err(e) => texts::sync_failed(&e.to_string()),
            };
            panel.show(text, Some(keyboards::admin_keyboard())).await?;
        }
        CallbackAction::Statistics => {
            let stats = state.store.statistics(state.target_chat_id()).await?;
            let chats = state.registry.snapshot().await;
            let selected = state.settings.lock().await.selected_chats.len();
            panel
                .show(
                    texts::statistics(&stats, &chats, selected, state.target_chat_id()),
                    Some(keyboards::back_keyboard()),
                )
                .await?;
            answer(state, query, None, false).await?;
        }
        CallbackAction::Toggle(destination) => {
            state.settings.lock().await.toggle(destination);
            answer(state, query, Some("✅ Setting changed!"), false).await?;
            show_settings(state, &panel).await?;
        }
        CallbackAction::ChangeNetworkMode => {
            panel
                .show(texts::NETWORK_MODE_PROMPT, Some(keyboards::network_mode_keyboard()))
                .await?;
            answer(state, query, None, false).await?;
        }
        CallbackAction::SetMode(mode) => {
            state.settings.lock().await.network_mode = mode;
            answer(state, query, Some("✅ Mode changed!"), false).await?;
            show_settings(state, &panel).await?;
        }
        CallbackAction::SelectChats => {
            if state.registry.is_empty().await {
                return answer(
                    state,
                    query,
                    Some("❌ No chats available. Refresh the chat list."),
                    true,
                )
                .await;
            }
            state.sessions.set_state(admin_id, AdminState::SelectingNetworkChats);
            show_selection(state, &panel, 0).await?;
            answer(state, query, None, false).await?;
        }
        CallbackAction::ToggleChat(chat_id) => {
            let selected = state.settings.lock().await.toggle_chat(chat_id);
            let text = if selected {
                "✅ Chat added!"
            } else {
                "✅ Chat removed!"
            };
            answer(state, query, Some(text), false).await?;

            let page = state
                .registry
                .snapshot()
                .await
                .iter()
                .position(|c| c.chat_id == chat_id)
                .map(|i| i / CHATS_PER_PAGE)
                .unwrap_or(0);
            show_selection(state, &panel, page).await?;
        }
        CallbackAction::ChatPage(page) => {
            show_selection(state, &panel, page).await?;
            answer(state, query, None, false).await?;
        }
        CallbackAction::SelectAllChats => {
            let ids = state.registry.chat_ids().await;
            let count = ids.len();
            state.settings.lock().await.select_all(ids);
            answer(state, query, Some(format!("✅ All chats selected ({})", count).as_str()), false).await?;
            show_selection(state, &panel, 0).await?;
        }
        CallbackAction::ClearSelectedChats => {
            state.settings.lock().await.clear_selection();
            answer(state, query, Some("❌ Selection cleared"), false).await?;
            show_selection(state, &panel, 0).await?;
        }
        CallbackAction::ChatSelectionDone => {
            if state.sessions.state(admin_id) == AdminState::SelectingNetworkChats {
                state.sessions.set_state(admin_id, AdminState::Idle);
            }
            let count = state.settings.lock().await.selected_chats.len();
            answer(
                state,
                query,
                Some(format!("✅ Selection done! Chats selected: {}", count).as_str()),
                false,
            )
            .await?;
            show_settings(state, &panel).await?;
        }
        CallbackAction::BackToAdmin => {
            panel
                .show(texts::ADMIN_PANEL, Some(keyboards::admin_keyboard()))
                .await?;
            answer(state, query, None, false).await?;
        }
        CallbackAction::ConfirmBroadcast => {
            let Some(text) = state.sessions.text(admin_id) else {
                state.sessions.clear(admin_id);
                return answer(state, query, Some("❌ Error: broadcast text not found"), true).await;
            };
            answer(state, query, Some("🚀 Starting broadcast..."), false).await?;
            state.sessions.clear(admin_id);
            run_broadcast(state, panel.chat_id, &text).await?;
        }
        CallbackAction::CancelBroadcast => {
            state.sessions.clear(admin_id);
            answer(state, query, Some("❌ Broadcast cancelled"), false).await?;
            panel
                .show(texts::BROADCAST_CANCELLED, Some(keyboards::admin_keyboard()))
                .await?;
        }
    }

    Ok(())
}

async fn show_settings(state: &AppState, panel: &Panel<'_>) -> Result<(), BotError> {
    let settings = state.settings_snapshot().await;
    let available = state.registry.len().await;
    panel
        .show(
            texts::settings(&settings, available),
            Some(keyboards::settings_keyboard(&settings)),
        )
        .await
}

async fn show_selection(state: &AppState, panel: &Panel<'_>, page: usize) -> Result<(), BotError> {
    let chats = state.registry.snapshot().await;
    let settings = state.settings_snapshot().await;
    panel
        .show(
            texts::chat_selection(settings.selected_chats.len(), chats.len()),
            Some(keyboards::chat_selection_keyboard(&chats, &settings, page)),
        )
        .await
}

/// Delivers the broadcast, reporting progress in a fresh message.
async fn run_broadcast(state: &AppState, chat_id: i64, text: &str) -> Result<(), BotError> {
    let status = send_markdown(state, chat_id, texts::BROADCAST_STARTING, None).await?;
    let progress = EditProgress {
        api: state.api.as_ref(),
        chat_id,
        message_id: status.message_id,
        frame: str::to_string,
    };

    let broadcaster = state.broadcaster();
    let plan = broadcaster.plan(&state.settings_snapshot().await).await?;

    let started = Instant::now();
    let report = broadcaster.execute(&plan, text, &progress).await;
    state
        .metrics
        .record_broadcast(&report, started.elapsed().as_millis() as u64);

    let panel = Panel {
        api: state.api.as_ref(),
        chat_id,
        message_id: status.message_id,
    };
    panel
        .show(texts::broadcast_report(&report), Some(keyboards::admin_keyboard()))
        .await
}
