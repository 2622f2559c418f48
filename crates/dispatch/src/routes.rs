use invite_models::{BotError, Destination, NetworkMode};
use invite_telegram::{CallbackQuery, Message, Update};
use std::fmt;
use std::str::FromStr;

/// Slash commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Admin,
    AddChat,
    Cancel,
}

impl Command {
    /// Parses `/name`, `/name@bot_username` and `/name args`. A command
    /// addressed to another bot is not ours.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Command> {
        let token = text.trim_start().split_whitespace().next()?;
        let token = token.strip_prefix('/')?;
        let (name, mention) = match token.split_once('@') {
            Some((name, mention)) => (name, Some(mention)),
            None => (token, None),
        };
        if let (Some(mention), Some(username)) = (mention, bot_username) {
            if !mention.eq_ignore_ascii_case(username) {
                return None;
            }
        }
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "admin" => Some(Command::Admin),
            "addchat" => Some(Command::AddChat),
            "cancel" => Some(Command::Cancel),
            _ => None,
        }
    }
}

/// Buttons of the admin panel, as carried in `callback_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    CreateBroadcast,
    BroadcastSettings,
    UpdateChats,
    SyncMembers,
    Statistics,
    Toggle(Destination),
    ChangeNetworkMode,
    SetMode(NetworkMode),
    SelectChats,
    ToggleChat(i64),
    ChatPage(usize),
    SelectAllChats,
    ClearSelectedChats,
    ChatSelectionDone,
    BackToAdmin,
    ConfirmBroadcast,
    CancelBroadcast,
    EditBroadcastText,
}

const TOGGLE_CHAT_PREFIX: &str = "toggle_chat_";
const CHAT_PAGE_PREFIX: &str = "chat_page_";

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::CreateBroadcast => f.write_str("create_broadcast"),
            CallbackAction::BroadcastSettings => f.write_str("broadcast_settings"),
            CallbackAction::UpdateChats => f.write_str("update_chats"),
            CallbackAction::SyncMembers => f.write_str("sync_members"),
            CallbackAction::Statistics => f.write_str("statistics"),
            CallbackAction::Toggle(Destination::TargetMembers) => f.write_str("toggle_target_members"),
            CallbackAction::Toggle(Destination::TargetChat) => f.write_str("toggle_target_chat"),
            CallbackAction::Toggle(Destination::Network) => f.write_str("toggle_network"),
            CallbackAction::ChangeNetworkMode => f.write_str("change_network_mode"),
            CallbackAction::SetMode(NetworkMode::All) => f.write_str("mode_all"),
            CallbackAction::SetMode(NetworkMode::MembersOnly) => f.write_str("mode_members_only"),
            CallbackAction::SetMode(NetworkMode::SpecificChats) => f.write_str("mode_specific"),
            CallbackAction::SelectChats => f.write_str("select_chats"),
            CallbackAction::ToggleChat(chat_id) => write!(f, "{}{}", TOGGLE_CHAT_PREFIX, chat_id),
            CallbackAction::ChatPage(page) => write!(f, "{}{}", CHAT_PAGE_PREFIX, page),
            CallbackAction::SelectAllChats => f.write_str("select_all_chats"),
            CallbackAction::ClearSelectedChats => f.write_str("clear_selected_chats"),
            CallbackAction::ChatSelectionDone => f.write_str("chat_selection_done"),
            CallbackAction::BackToAdmin => f.write_str("back_to_admin"),
            CallbackAction::ConfirmBroadcast => f.write_str("confirm_broadcast"),
            CallbackAction::CancelBroadcast => f.write_str("cancel_broadcast"),
            CallbackAction::EditBroadcastText => f.write_str("edit_broadcast_text"),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s {
            "create_broadcast" => CallbackAction::CreateBroadcast,
            "broadcast_settings" => CallbackAction::BroadcastSettings,
            "update_chats" => CallbackAction::UpdateChats,
            "sync_members" => CallbackAction::SyncMembers,
            "statistics" => CallbackAction::Statistics,
            "toggle_target_members" => CallbackAction::Toggle(Destination::TargetMembers),
            "toggle_target_chat" => CallbackAction::Toggle(Destination::TargetChat),
            "toggle_network" => CallbackAction::Toggle(Destination::Network),
            "change_network_mode" => CallbackAction::ChangeNetworkMode,
            "mode_all" => CallbackAction::SetMode(NetworkMode::All),
            "mode_members_only" => CallbackAction::SetMode(NetworkMode::MembersOnly),
            "mode_specific" | "mode_specific_chats" => {
                CallbackAction::SetMode(NetworkMode::SpecificChats)
            }
            "select_chats" => CallbackAction::SelectChats,
            "select_all_chats" => CallbackAction::SelectAllChats,
            "clear_selected_chats" => CallbackAction::ClearSelectedChats,
            "chat_selection_done" => CallbackAction::ChatSelectionDone,
            "back_to_admin" => CallbackAction::BackToAdmin,
            "confirm_broadcast" => CallbackAction::ConfirmBroadcast,
            "cancel_broadcast" => CallbackAction::CancelBroadcast,
            "edit_broadcast_text" => CallbackAction::EditBroadcastText,
            other => {
                if let Some(id) = other.strip_prefix(TOGGLE_CHAT_PREFIX) {
                    CallbackAction::ToggleChat(id.parse().map_err(|_| invalid(s))?)
                } else if let Some(page) = other.strip_prefix(CHAT_PAGE_PREFIX) {
                    CallbackAction::ChatPage(page.parse().map_err(|_| invalid(s))?)
                } else {
                    return Err(invalid(s));
                }
            }
        };
        Ok(action)
    }
}

fn invalid(data: &str) -> BotError {
    BotError::InvalidCallback {
        data: data.to_string(),
    }
}

/// What an incoming update asks the bot to do.
#[derive(Debug)]
pub enum Route<'a> {
    Command(Command, &'a Message),
    /// Free text in a private chat.
    Text(&'a Message),
    MembersJoined(&'a Message),
    MemberLeft(&'a Message),
    /// Anything else said in a group.
    GroupMessage(&'a Message),
    Callback(&'a CallbackQuery),
    Ignored,
}

/// Classifies an update. Commands win over membership tracking so they work
/// in groups too.
pub fn route<'a>(update: &'a Update, bot_username: Option<&str>) -> Route<'a> {
    if let Some(query) = &update.callback_query {
        return Route::Callback(query);
    }

    let Some(message) = &update.message else {
        return Route::Ignored;
    };

    let command = message
        .text
        .as_deref()
        .and_then(|text| Command::parse(text, bot_username));
    if let Some(command) = command {
        return Route::Command(command, message);
    }
    if !message.new_chat_members.is_empty() {
        return Route::MembersJoined(message);
    }
    if message.left_chat_member.is_some() {
        return Route::MemberLeft(message);
    }
    if message.chat.kind.is_group() {
        return Route::GroupMessage(message);
    }
    if message.text.is_some() {
        return Route::Text(message);
    }
    Route::Ignored
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_FIXED: [&str; 20] = [
        "create_broadcast",
        "broadcast_settings",
        "update_chats",
        "sync_members",
        "statistics",
        "toggle_target_members",
        "toggle_target_chat",
        "toggle_network",
        "change_network_mode",
        "mode_all",
        "mode_members_only",
        "mode_specific",
        "select_chats",
        "select_all_chats",
        "clear_selected_chats",
        "chat_selection_done",
        "back_to_admin",
        "confirm_broadcast",
        "cancel_broadcast",
        "edit_broadcast_text",
    ];

    #[test]
    fn every_panel_button_parses_back_to_itself() {
        for data in ALL_FIXED {
            let action: CallbackAction = data.parse().unwrap();
            assert_eq!(action.to_string(), data);
        }
    }

    #[test]
    fn toggle_chat_is_not_mistaken_for_a_setting_toggle() {
        assert_eq!(
            "toggle_chat_-1001234567890".parse::<CallbackAction>().unwrap(),
            CallbackAction::ToggleChat(-1001234567890)
        );
        assert_eq!(
            "toggle_target_chat".parse::<CallbackAction>().unwrap(),
            CallbackAction::Toggle(Destination::TargetChat)
        );
    }

    #[test]
    fn mode_specific_means_selected_chats() {
        assert_eq!(
            "mode_specific".parse::<CallbackAction>().unwrap(),
            CallbackAction::SetMode(NetworkMode::SpecificChats)
        );
    }

    #[test]
    fn chat_page_carries_page_number() {
        assert_eq!(
            "chat_page_3".parse::<CallbackAction>().unwrap(),
            CallbackAction::ChatPage(3)
        );
        assert!("chat_page_-1".parse::<CallbackAction>().is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let err = "toggle_chat_abc".parse::<CallbackAction>().unwrap_err();
        assert_eq!(err.kind(), "invalid_callback");
        assert!("toggle_everything".parse::<CallbackAction>().is_err());
        assert!("".parse::<CallbackAction>().is_err());
    }

    #[test]
    fn commands_accept_bot_mentions_and_arguments() {
        let me = Some("invite_bot");
        assert_eq!(Command::parse("/start", me), Some(Command::Start));
        assert_eq!(Command::parse("/addchat@invite_bot", me), Some(Command::AddChat));
        assert_eq!(Command::parse("/admin please", me), Some(Command::Admin));
        assert_eq!(Command::parse("/CANCEL", me), Some(Command::Cancel));
        assert_eq!(Command::parse("/help", me), None);
        assert_eq!(Command::parse("start", me), None);
        assert_eq!(Command::parse("", me), None);
    }

    #[test]
    fn commands_for_other_bots_are_not_ours() {
        let me = Some("invite_bot");
        assert_eq!(Command::parse("/start@some_other_bot", me), None);
        assert_eq!(Command::parse("/start@Invite_Bot", me), Some(Command::Start));
        assert_eq!(
            Command::parse("/start@some_other_bot", None),
            Some(Command::Start)
        );
    }
}
