use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatKind::Private => "private",
            ChatKind::Group => "group",
            ChatKind::Supergroup => "supergroup",
            ChatKind::Channel => "channel",
        }
    }

    /// Group chats are the only ones with a member list worth tracking.
    pub fn is_group(&self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

impl fmt::Display for ChatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(ChatKind::Private),
            "group" => Ok(ChatKind::Group),
            "supergroup" => Ok(ChatKind::Supergroup),
            "channel" => Ok(ChatKind::Channel),
            _ => Err(format!("Invalid chat type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Creator => "creator",
            MemberStatus::Administrator => "administrator",
            MemberStatus::Member => "member",
            MemberStatus::Restricted => "restricted",
            MemberStatus::Left => "left",
            MemberStatus::Kicked => "kicked",
        }
    }

    pub fn has_left(&self) -> bool {
        matches!(self, MemberStatus::Left | MemberStatus::Kicked)
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creator" => Ok(MemberStatus::Creator),
            "administrator" => Ok(MemberStatus::Administrator),
            "member" => Ok(MemberStatus::Member),
            "restricted" => Ok(MemberStatus::Restricted),
            "left" => Ok(MemberStatus::Left),
            "kicked" => Ok(MemberStatus::Kicked),
            _ => Err(format!("Invalid member status: {}", s)),
        }
    }
}

/// A Telegram account the bot has seen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_bot: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMemberRecord {
    pub user_id: i64,
    pub chat_id: i64,
    pub status: MemberStatus,
    pub joined_date: DateTime<Utc>,
}

/// A chat the bot is a member of.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BotChat {
    pub chat_id: i64,
    pub title: String,
    pub chat_type: ChatKind,
    pub members_count: i32,
}

impl BotChat {
    pub fn new(chat_id: i64, title: Option<&str>, chat_type: ChatKind, members_count: i32) -> Self {
        Self {
            chat_id,
            title: title
                .map(str::to_string)
                .unwrap_or_else(|| format!("Chat {}", chat_id)),
            chat_type,
            members_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopChat {
    pub title: String,
    pub members_count: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Statistics {
    /// Non-bot users that ever reached the bot.
    pub users_count: i64,
    pub target_chat_members: i64,
    /// Target chat members that are known non-bot users.
    pub audience_count: i64,
    pub chats_count: i64,
    pub top_chats: Vec<TopChat>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SyncReport {
    pub removed_count: usize,
    pub current_members: usize,
    pub db_members_before: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RefreshReport {
    pub chats_before: usize,
    pub chats_after: usize,
    pub removed: usize,
}

impl RefreshReport {
    pub fn delta(&self) -> i64 {
        self.chats_after as i64 - self.chats_before as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_kind_parses_telegram_names() {
        assert_eq!("supergroup".parse::<ChatKind>().unwrap(), ChatKind::Supergroup);
        assert_eq!("private".parse::<ChatKind>().unwrap(), ChatKind::Private);
        assert!("forum".parse::<ChatKind>().is_err());
        assert!(ChatKind::Group.is_group());
        assert!(!ChatKind::Channel.is_group());
    }

    #[test]
    fn member_status_left_and_kicked() {
        assert!(MemberStatus::Left.has_left());
        assert!(MemberStatus::Kicked.has_left());
        assert!(!MemberStatus::Restricted.has_left());
        let status: MemberStatus = serde_json::from_str("\"administrator\"").unwrap();
        assert_eq!(status, MemberStatus::Administrator);
    }

    #[test]
    fn bot_chat_without_title_gets_placeholder() {
        let chat = BotChat::new(-100, None, ChatKind::Group, 3);
        assert_eq!(chat.title, "Chat -100");
    }

    #[test]
    fn refresh_delta_can_be_negative() {
        let report = RefreshReport {
            chats_before: 5,
            chats_after: 3,
            removed: 2,
        };
        assert_eq!(report.delta(), -2);
    }
}
