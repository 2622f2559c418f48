use crate::routes::CallbackAction;
use crate::texts;
use invite_models::{BotChat, BroadcastSettings, Destination, NetworkMode};
use invite_telegram::{InlineKeyboardButton, InlineKeyboardMarkup};

pub const CHATS_PER_PAGE: usize = 6;
pub const BUTTON_TITLE_CHARS: usize = 25;

fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::new(text, action.to_string())
}

pub fn admin_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("📢 Create broadcast", CallbackAction::CreateBroadcast)],
        vec![button("⚙️ Broadcast settings", CallbackAction::BroadcastSettings)],
        vec![button("🔄 Update chats", CallbackAction::UpdateChats)],
        vec![button("🔄 Sync members", CallbackAction::SyncMembers)],
        vec![button("📊 Statistics", CallbackAction::Statistics)],
    ])
}

pub fn settings_keyboard(settings: &BroadcastSettings) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button(
            texts::settings_button("👤 Target chat members", settings.to_target_chat_members),
            CallbackAction::Toggle(Destination::TargetMembers),
        )],
        vec![button(
            texts::settings_button("💬 Target chat", settings.to_target_chat),
            CallbackAction::Toggle(Destination::TargetChat),
        )],
        vec![button(
            texts::settings_button("🌐 Chat network", settings.to_network_chats),
            CallbackAction::Toggle(Destination::Network),
        )],
        vec![button(
            format!("📋 Network mode: {}", settings.network_mode.label()),
            CallbackAction::ChangeNetworkMode,
        )],
        vec![button("🎯 Select chats", CallbackAction::SelectChats)],
        vec![button("◀️ Back", CallbackAction::BackToAdmin)],
    ])
}

pub fn network_mode_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("🌐 All available chats", CallbackAction::SetMode(NetworkMode::All))],
        vec![button(
            "👥 Target chat members only",
            CallbackAction::SetMode(NetworkMode::MembersOnly),
        )],
        vec![button(
            "🎯 Selected chats",
            CallbackAction::SetMode(NetworkMode::SpecificChats),
        )],
        vec![button("◀️ Back to settings", CallbackAction::BroadcastSettings)],
    ])
}

/// Number of pages needed for `chats` entries; at least one.
pub fn page_count(chats: usize) -> usize {
    chats.div_ceil(CHATS_PER_PAGE).max(1)
}

/// One page of the chat picker, `chats` in display order.
pub fn chat_selection_keyboard(
    chats: &[BotChat],
    settings: &BroadcastSettings,
    page: usize,
) -> InlineKeyboardMarkup {
    let page = page.min(page_count(chats.len()) - 1);
    let start = page * CHATS_PER_PAGE;
    let end = (start + CHATS_PER_PAGE).min(chats.len());

    let mut rows: Vec<Vec<InlineKeyboardButton>> = chats[start..end]
        .iter()
        .map(|chat| {
            vec![button(
                texts::selection_button(
                    &chat.title,
                    settings.is_selected(chat.chat_id),
                    BUTTON_TITLE_CHARS,
                ),
                CallbackAction::ToggleChat(chat.chat_id),
            )]
        })
        .collect();

    rows.push(vec![
        button("✅ Select all", CallbackAction::SelectAllChats),
        button("❌ Clear", CallbackAction::ClearSelectedChats),
    ]);

    let mut nav = Vec::new();
    if page > 0 {
        nav.push(button("◀️ Previous", CallbackAction::ChatPage(page - 1)));
    }
    if end < chats.len() {
        nav.push(button("▶️ Next", CallbackAction::ChatPage(page + 1)));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }

    rows.push(vec![button("✅ Done", CallbackAction::ChatSelectionDone)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn confirmation_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("✅ Yes, send", CallbackAction::ConfirmBroadcast),
            button("❌ Cancel", CallbackAction::CancelBroadcast),
        ],
        vec![button("📝 Edit text", CallbackAction::EditBroadcastText)],
    ])
}

pub fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("◀️ Back", CallbackAction::BackToAdmin)]])
}
