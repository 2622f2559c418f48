use invite_models::{ChatKind, Config};
use invite_telegram::{CallbackQuery, Chat, Message, Update, User};
use std::sync::atomic::{AtomicI64, Ordering};

pub const ADMIN_ID: i64 = 42;
pub const BOT_ID: i64 = 7000;
pub const TARGET_CHAT_ID: i64 = -1001000;

static NEXT_ID: AtomicI64 = AtomicI64::new(1);

fn next_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Valid config with no pacing delays.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.telegram.bot_token = "1:test".to_string();
    config.access.admin_id = ADMIN_ID;
    config.access.target_chat_id = TARGET_CHAT_ID;
    config.pacing.direct_message_ms = 0;
    config.pacing.chat_message_ms = 0;
    config.pacing.member_check_ms = 0;
    config.ops.enabled = false;
    config
}

pub fn user(id: i64, first_name: &str) -> User {
    User {
        id,
        is_bot: false,
        first_name: first_name.to_string(),
        last_name: None,
        username: Some(first_name.to_lowercase()),
    }
}

pub fn admin() -> User {
    user(ADMIN_ID, "Admin")
}

pub fn bot_user(id: i64) -> User {
    User {
        id,
        is_bot: true,
        first_name: "SomeBot".to_string(),
        last_name: None,
        username: Some("some_bot".to_string()),
    }
}

pub fn private_chat(user_id: i64) -> Chat {
    Chat {
        id: user_id,
        kind: ChatKind::Private,
        title: None,
        username: None,
    }
}

pub fn group(id: i64, title: &str) -> Chat {
    Chat {
        id,
        kind: ChatKind::Group,
        title: Some(title.to_string()),
        username: None,
    }
}

pub fn supergroup(id: i64, title: &str) -> Chat {
    Chat {
        id,
        kind: ChatKind::Supergroup,
        title: Some(title.to_string()),
        username: None,
    }
}

pub fn text_message(chat: Chat, from: &User, text: &str) -> Message {
    Message {
        message_id: next_id(),
        from: Some(from.clone()),
        chat,
        date: 1_700_000_000,
        text: Some(text.to_string()),
        new_chat_members: Vec::new(),
        left_chat_member: None,
    }
}

pub fn joined_message(chat: Chat, members: Vec<User>) -> Message {
    Message {
        message_id: next_id(),
        from: members.first().cloned(),
        chat,
        date: 1_700_000_000,
        text: None,
        new_chat_members: members,
        left_chat_member: None,
    }
}

pub fn left_message(chat: Chat, member: User) -> Message {
    Message {
        message_id: next_id(),
        from: Some(member.clone()),
        chat,
        date: 1_700_000_000,
        text: None,
        new_chat_members: Vec::new(),
        left_chat_member: Some(member),
    }
}

pub fn message_update(message: Message) -> Update {
    Update {
        update_id: next_id(),
        message: Some(message),
        callback_query: None,
    }
}

/// Callback pressed on a panel message in the presser's private chat.
pub fn callback_update(from: &User, data: &str) -> Update {
    let panel = Message {
        message_id: 500,
        from: None,
        chat: private_chat(from.id),
        date: 1_700_000_000,
        text: Some("panel".to_string()),
        new_chat_members: Vec::new(),
        left_chat_member: None,
    };
    Update {
        update_id: next_id(),
        message: None,
        callback_query: Some(CallbackQuery {
            id: format!("cb-{}", next_id()),
            from: from.clone(),
            message: Some(panel),
            data: Some(data.to_string()),
        }),
    }
}
