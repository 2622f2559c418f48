use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the chat network is reached by a broadcast.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    /// Post into every chat the bot is in.
    #[default]
    All,
    /// Direct-message audience members who also sit in any network chat.
    MembersOnly,
    /// Post into the chats the admin picked.
    SpecificChats,
}

impl NetworkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkMode::All => "all",
            NetworkMode::MembersOnly => "members_only",
            NetworkMode::SpecificChats => "specific_chats",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NetworkMode::All => "All chats",
            NetworkMode::MembersOnly => "Target chat members only",
            NetworkMode::SpecificChats => "Selected chats",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(NetworkMode::All),
            "members_only" => Ok(NetworkMode::MembersOnly),
            "specific_chats" | "specific" => Ok(NetworkMode::SpecificChats),
            _ => Err(format!("Invalid network mode: {}", s)),
        }
    }
}

/// One of the three on/off broadcast destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    TargetMembers,
    TargetChat,
    Network,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BroadcastSettings {
    pub to_target_chat: bool,
    pub to_target_chat_members: bool,
    pub to_network_chats: bool,
    pub network_mode: NetworkMode,
    #[serde(default)]
    pub selected_chats: Vec<i64>,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            to_target_chat: true,
            to_target_chat_members: true,
            to_network_chats: true,
            network_mode: NetworkMode::All,
            selected_chats: Vec::new(),
        }
    }
}

impl BroadcastSettings {
    pub fn is_enabled(&self, destination: Destination) -> bool {
        match destination {
            Destination::TargetMembers => self.to_target_chat_members,
            Destination::TargetChat => self.to_target_chat,
            Destination::Network => self.to_network_chats,
        }
    }

    /// Flips a destination and returns its new value.
    pub fn toggle(&mut self, destination: Destination) -> bool {
        let flag = match destination {
            Destination::TargetMembers => &mut self.to_target_chat_members,
            Destination::TargetChat => &mut self.to_target_chat,
            Destination::Network => &mut self.to_network_chats,
        };
        *flag = !*flag;
        *flag
    }

    pub fn is_selected(&self, chat_id: i64) -> bool {
        self.selected_chats.contains(&chat_id)
    }

    /// Adds or removes a chat from the selection. Returns true if it is now selected.
    pub fn toggle_chat(&mut self, chat_id: i64) -> bool {
        if let Some(pos) = self.selected_chats.iter().position(|id| *id == chat_id) {
            self.selected_chats.remove(pos);
            false
        } else {
            self.selected_chats.push(chat_id);
            true
        }
    }

    pub fn select_all<I: IntoIterator<Item = i64>>(&mut self, chat_ids: I) {
        self.selected_chats = chat_ids.into_iter().collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected_chats.clear();
    }
}

/// Summary line shown in the broadcast preview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetLine {
    pub label: String,
    pub count: usize,
    pub unit: String,
}

impl fmt::Display for TargetLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.label, self.count, self.unit)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BroadcastReport {
    pub broadcast_id: String,
    pub success_count: usize,
    pub error_count: usize,
    pub total_targets: usize,
}

impl BroadcastReport {
    /// Percentage of targets reached; zero when nothing was targeted.
    pub fn success_rate(&self) -> f64 {
        if self.total_targets == 0 {
            0.0
        } else {
            self.success_count as f64 / self.total_targets as f64 * 100.0
        }
    }
}
