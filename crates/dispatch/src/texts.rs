//! Message templates of the admin panel and the user-facing replies.
//!
//! Texts marked as Markdown are sent with the legacy `Markdown` parse mode.

use invite_models::{BotChat, BroadcastReport, BroadcastSettings, RefreshReport, Statistics, SyncReport, TargetLine};

/// Chats listed in the refresh report and statistics before "...and N more".
pub const LISTED_CHATS: usize = 5;
/// Longest text echoed in the broadcast preview.
pub const PREVIEW_CHARS: usize = 200;

pub const ADMIN_PANEL: &str = "🔐 **Admin panel**\n\nChoose an action:";
pub const ADMIN_WELCOME: &str = "🔐 **Welcome to the admin panel!**\n\nChoose an action:";
pub const NO_PANEL_ACCESS: &str = "❌ You do not have access to the admin panel.";
pub const NO_ACCESS: &str = "❌ No access";
pub const NO_COMMAND_RIGHTS: &str = "❌ You do not have permission to run this command.";
pub const GROUPS_ONLY: &str = "❌ This command only works in group chats.";
pub const OPERATION_CANCELLED: &str = "❌ Operation cancelled.";
pub const BROADCAST_TEXT_CANCELLED: &str = "❌ Broadcast creation cancelled.";
pub const BROADCAST_CANCELLED: &str = "❌ **Broadcast cancelled**\n\nChoose an action:";
pub const BROADCAST_STARTING: &str = "🚀 **Starting broadcast...**";
pub const REFRESH_PROGRESS: &str = "🔄 **Updating chat list**\n\nChecking stored chats...";
pub const SYNC_PROGRESS: &str = "🔄 **Member sync**\n\nChecking the target chat member list...";
pub const PREPARING_BROADCAST: &str = "🔄 **Preparing broadcast**\n\nChecking the target chat member list...";
pub const NO_TARGETS: &str = "⚠️ **Attention!**\n\n\
    No target chat members found for the broadcast.\n\
    Make sure that:\n\
    • The bot is added to the target chat\n\
    • Members have started a dialog with the bot\n\
    • Broadcast destinations are enabled";
pub const NETWORK_MODE_PROMPT: &str = "📋 **Choose the chat network mode:**\n\n\
    🌐 **All available chats** - post into every chat the bot is in\n\
    👥 **Target chat members only** - direct messages to target chat members who also sit in network chats\n\
    🎯 **Selected chats** - post only into the chats you pick\n\n\
    ℹ️ **Note:** direct messages only ever go to target chat members!";
const NOTE: &str = "ℹ️ **Note:** direct messages only ever go to target chat members!";

/// Cuts `text` to `max` characters, marking the cut with "...".
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn flag(on: bool) -> &'static str {
    if on {
        "✅"
    } else {
        "❌"
    }
}

fn enabled(on: bool) -> &'static str {
    if on {
        "✅ Enabled"
    } else {
        "❌ Disabled"
    }
}

/// Greeting for a non-admin `/start`.
pub fn greeting(first_name: &str, is_member: bool) -> String {
    if is_member {
        format!(
            "👋 Hi, {}!\n\nYou are a member of the target chat and are subscribed to notifications from the bot.",
            first_name
        )
    } else {
        format!(
            "👋 Hi, {}!\n\n⚠️ You need to be a member of our chat to receive broadcasts.",
            first_name
        )
    }
}

pub fn chat_added(title: &str, chat_id: i64) -> String {
    format!(
        "✅ Chat '{}' added to the available chats!\n🆔 Chat ID: `{}`",
        title, chat_id
    )
}

pub fn create_prompt(editing: bool) -> String {
    let header = if editing {
        "📝 **Edit broadcast**\n\nSend the new broadcast text."
    } else {
        "📝 **New broadcast**\n\nSend the broadcast text."
    };
    format!(
        "{}\nDirect messages go **only to target chat members**.\n\n\
         Markdown formatting is supported.\n\n\
         Send /cancel to abort.",
        header
    )
}

pub fn settings(settings: &BroadcastSettings, available_chats: usize) -> String {
    format!(
        "⚙️ **Broadcast settings**\n\n\
         👤 Target chat members: {}\n\
         💬 Target chat: {}\n\
         🌐 Chat network: {}\n\
         📋 Network mode: {}\n\
         🎯 Selected chats: {}\n\
         📊 Available chats: {}\n\n\
         {}",
        enabled(settings.to_target_chat_members),
        enabled(settings.to_target_chat),
        enabled(settings.to_network_chats),
        settings.network_mode.label(),
        settings.selected_chats.len(),
        available_chats,
        NOTE
    )
}

pub fn settings_button(label: &str, on: bool) -> String {
    format!("{}: {}", label, flag(on))
}

pub fn selection_button(title: &str, selected: bool, max_title: usize) -> String {
    format!("{} {}", flag(selected), truncate(title, max_title))
}

pub fn chat_selection(selected: usize, available: usize) -> String {
    format!(
        "🎯 **Choose chats for the broadcast**\n\n\
         Selected: {}/{}\n\n\
         Tap a chat to include or exclude it.",
        selected, available
    )
}

/// Bullet list of the first [`LISTED_CHATS`] chats.
pub fn chat_list(chats: &[BotChat], max_title: usize) -> String {
    let mut list = String::new();
    for chat in chats.iter().take(LISTED_CHATS) {
        list.push_str(&format!(
            "• {} ({} members)\n",
            truncate(&chat.title, max_title),
            chat.members_count
        ));
    }
    if chats.len() > LISTED_CHATS {
        list.push_str(&format!("• ...and {} more chats\n", chats.len() - LISTED_CHATS));
    }
    list
}

const HOW_TO_ADD_CHATS: &str = "1. Add the bot to group chats\n\
    2. Send /start in the chat\n\
    3. Refresh the chat list";

pub fn refresh_report(report: &RefreshReport, chats: &[BotChat]) -> String {
    if chats.is_empty() {
        return format!(
            "📋 **Chat update finished**\n\n\
             ❌ No available chats found\n\n\
             **Possible reasons:**\n\
             • The bot has not been added to any chat\n\
             • The bot was removed from every chat\n\n\
             **How to add chats:**\n{}",
            HOW_TO_ADD_CHATS
        );
    }

    format!(
        "✅ **Chat update finished**\n\n\
         📊 Chats before: {}\n\
         📊 Chats after: {}\n\
         🔄 Change: {:+}\n\n\
         **Available chats:**\n{}",
        report.chats_before,
        report.chats_after,
        report.delta(),
        chat_list(chats, 25)
    )
}

pub fn statistics(stats: &Statistics, chats: &[BotChat], selected: usize, target_chat_id: i64) -> String {
    let chats_info = if chats.is_empty() {
        format!(
            "❌ No available chats\n\n**To add chats:**\n{}",
            HOW_TO_ADD_CHATS
        )
    } else {
        chat_list(chats, 20)
    };

    let mut top = String::new();
    for (i, chat) in stats.top_chats.iter().enumerate() {
        top.push_str(&format!(
            "{}. {} ({} members)\n",
            i + 1,
            truncate(&chat.title, 20),
            chat.members_count
        ));
    }
    if top.is_empty() {
        top.push_str("—\n");
    }

    format!(
        "📊 **Bot statistics**\n\n\
         👥 Users (started a dialog): {}\n\
         💬 Target chat members: {}\n\
         🎯 Target chat members with a dialog: {}\n\
         🗄️ Stored chats: {}\n\
         🌐 Available chats: {}\n\
         📝 Selected chats: {}\n\
         🆔 Target chat ID: `{}`\n\n\
         **Largest chats:**\n{}\n\
         **Available chats:**\n{}\n\n\
         {}",
        stats.users_count,
        stats.target_chat_members,
        stats.audience_count,
        stats.chats_count,
        chats.len(),
        selected,
        target_chat_id,
        top,
        chats_info,
        NOTE
    )
}

pub fn sync_report(report: &SyncReport) -> String {
    format!(
        "✅ **Member sync finished**\n\n\
         👥 Stored members checked: {}\n\
         🟢 Still in the chat: {}\n\
         🗑️ Removed: {}",
        report.db_members_before, report.current_members, report.removed_count
    )
}

pub fn sync_failed(reason: &str) -> String {
    format!("❌ **Member sync failed**\n\n{}", reason)
}

/// Progress frame shown while preparing a broadcast.
pub fn preparing(line: &str) -> String {
    format!("🔄 **Preparing broadcast**\n\n{}", line)
}

/// Progress frame shown while a sync runs from the panel.
pub fn syncing(line: &str) -> String {
    format!("🔄 **Member sync**\n\n{}", line)
}

pub fn preview(
    sync: Option<&SyncReport>,
    text: &str,
    lines: &[TargetLine],
    total: usize,
    target_chat_id: i64,
) -> String {
    let mut preview = String::from("📋 **Broadcast preview**\n\n");

    if let Some(sync) = sync {
        preview.push_str("🔄 **Sync finished:**\n");
        preview.push_str(&format!("• Inactive members removed: {}\n\n", sync.removed_count));
    }

    preview.push_str(&format!("**Message text:**\n{}\n\n", truncate(text, PREVIEW_CHARS)));
    preview.push_str("**Broadcast targets:**\n");
    preview.push_str(
        &lines
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    );
    preview.push_str(&format!("\n\n**Messages to send:** {}\n\n", total));
    preview.push_str("⚠️ **Send this broadcast?**\n\n");
    preview.push_str(&format!("ℹ️ **Target chat:** `{}`", target_chat_id));
    preview
}

pub fn broadcast_report(report: &BroadcastReport) -> String {
    format!(
        "📊 **Broadcast finished!**\n\n\
         ✅ Delivered: {}\n\
         ❌ Errors: {}\n\
         🎯 Total targets: {}\n\
         📈 Success rate: {:.1}%",
        report.success_count,
        report.error_count,
        report.total_targets,
        report.success_rate()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use invite_models::ChatKind;

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate("short", 25), "short");
        assert_eq!(truncate("Привет мир", 6), "Привет...");
        assert_eq!(truncate(&"x".repeat(26), 25), format!("{}...", "x".repeat(25)));
    }

    #[test]
    fn chat_list_shows_five_and_the_rest_as_count() {
        let chats: Vec<BotChat> = (1..=7)
            .map(|i| BotChat::new(-i, Some(&format!("Chat number {}", i)), ChatKind::Group, i as i32))
            .collect();

        let list = chat_list(&chats, 25);
        assert_eq!(list.lines().count(), 6);
        assert!(list.contains("• Chat number 1 (1 members)"));
        assert!(!list.contains("Chat number 6"));
        assert!(list.ends_with("• ...and 2 more chats\n"));
    }

    #[test]
    fn preview_truncates_long_text() {
        let text = "a".repeat(250);
        let lines = vec![TargetLine {
            label: "💬 Target chat".to_string(),
            count: 1,
            unit: "chat".to_string(),
        }];
        let rendered = preview(None, &text, &lines, 1, -100);

        assert!(rendered.contains(&format!("{}...", "a".repeat(200))));
        assert!(!rendered.contains(&"a".repeat(201)));
        assert!(rendered.contains("💬 Target chat: 1 chat"));
        assert!(rendered.contains("**Messages to send:** 1"));
        assert!(rendered.contains("`-100`"));
        assert!(!rendered.contains("Sync finished"));
    }

    #[test]
    fn refresh_report_signs_the_change() {
        let report = RefreshReport {
            chats_before: 3,
            chats_after: 1,
            removed: 2,
        };
        let chats = vec![BotChat::new(-1, Some("Left over"), ChatKind::Group, 4)];
        assert!(refresh_report(&report, &chats).contains("Change: -2"));

        let grown = RefreshReport {
            chats_before: 1,
            chats_after: 2,
            removed: 0,
        };
        assert!(refresh_report(&grown, &chats).contains("Change: +1"));
        assert!(refresh_report(&grown, &[]).contains("No available chats found"));
    }

    #[test]
    fn broadcast_report_formats_rate() {
        let report = BroadcastReport {
            broadcast_id: "id".to_string(),
            success_count: 2,
            error_count: 1,
            total_targets: 3,
        };
        assert!(broadcast_report(&report).contains("Success rate: 66.7%"));
        assert!(broadcast_report(&BroadcastReport::default()).contains("Success rate: 0.0%"));
    }
}
