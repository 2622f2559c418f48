use invite_control::{ChatRegistry, MemberStore, MemoryStore};
use invite_models::{BotChat, ChatKind, MemberStatus};
use invite_testsupport::{group, supergroup, MockTelegram, BOT_ID};
use invite_telegram::Chat;

async fn stored(store: &MemoryStore, id: i64, title: &str, count: i32) {
    store
        .upsert_bot_chat(&BotChat::new(id, Some(title), ChatKind::Supergroup, count))
        .await
        .unwrap();
}

#[tokio::test]
async fn refresh_keeps_live_chats_with_fresh_counts() {
    let api = MockTelegram::new(BOT_ID);
    let store = MemoryStore::new();
    api.add_chat(supergroup(-1, "Renamed"), 42);
    stored(&store, -1, "Old title", 10).await;

    let registry = ChatRegistry::new();
    let report = registry.refresh(&api, &store, BOT_ID).await.unwrap();

    assert_eq!(report.chats_before, 1);
    assert_eq!(report.chats_after, 1);
    assert_eq!(report.removed, 0);

    let chat = registry.get(-1).await.unwrap();
    assert_eq!(chat.title, "Renamed");
    assert_eq!(chat.members_count, 42);
    assert_eq!(store.bot_chat(-1).await.unwrap().members_count, 42);
}

#[tokio::test]
async fn refresh_drops_chats_the_bot_left() {
    let api = MockTelegram::new(BOT_ID);
    let store = MemoryStore::new();
    api.add_chat(group(-1, "Kicked"), 5);
    api.set_bot_status(-1, MemberStatus::Kicked);
    api.add_chat(group(-2, "Left"), 5);
    api.set_bot_status(-2, MemberStatus::Left);
    api.add_chat(group(-3, "Alive"), 5);
    stored(&store, -1, "Kicked", 5).await;
    stored(&store, -2, "Left", 5).await;
    stored(&store, -3, "Alive", 5).await;

    let registry = ChatRegistry::new();
    let report = registry.refresh(&api, &store, BOT_ID).await.unwrap();

    assert_eq!(report.removed, 2);
    assert_eq!(report.chats_after, 1);
    assert_eq!(report.delta(), -2);
    assert_eq!(registry.chat_ids().await, vec![-3]);
    assert!(store.bot_chat(-1).await.is_none());
    assert!(store.bot_chat(-2).await.is_none());
}

#[tokio::test]
async fn refresh_deletes_chats_telegram_no_longer_knows() {
    let api = MockTelegram::new(BOT_ID);
    let store = MemoryStore::new();
    // never registered with the mock: getChat answers "chat not found"
    stored(&store, -9, "Ghost", 3).await;

    let registry = ChatRegistry::new();
    let report = registry.refresh(&api, &store, BOT_ID).await.unwrap();

    assert_eq!(report.removed, 1);
    assert!(registry.is_empty().await);
    assert!(store.list_bot_chats().await.unwrap().is_empty());
}

#[tokio::test]
async fn refresh_skips_but_keeps_chats_with_other_get_chat_errors() {
    let api = MockTelegram::new(BOT_ID);
    let store = MemoryStore::new();
    api.add_chat(group(-1, "Flaky"), 3);
    api.fail_chat(-1, "Internal Server Error");
    stored(&store, -1, "Flaky", 3).await;

    let registry = ChatRegistry::new();
    let report = registry.refresh(&api, &store, BOT_ID).await.unwrap();

    assert_eq!(report.removed, 0);
    assert!(!registry.contains(-1).await);
    assert!(store.bot_chat(-1).await.is_some());
}

#[tokio::test]
async fn refresh_keeps_stored_info_when_bot_status_is_unreadable() {
    let api = MockTelegram::new(BOT_ID);
    let store = MemoryStore::new();
    api.add_chat(group(-1, "Fresh"), 99);
    api.fail_member(-1, BOT_ID, "Bad Request: not enough rights");
    stored(&store, -1, "Stored", 7).await;

    let registry = ChatRegistry::new();
    registry.refresh(&api, &store, BOT_ID).await.unwrap();

    let chat = registry.get(-1).await.unwrap();
    assert_eq!(chat.title, "Stored");
    assert_eq!(chat.members_count, 7);
}

#[tokio::test]
async fn refresh_falls_back_to_stored_count() {
    let api = MockTelegram::new(BOT_ID);
    let store = MemoryStore::new();
    api.add_chat(supergroup(-1, "Quiet"), 99);
    api.fail_member_count(-1);
    stored(&store, -1, "Quiet", 12).await;

    let registry = ChatRegistry::new();
    registry.refresh(&api, &store, BOT_ID).await.unwrap();

    assert_eq!(registry.get(-1).await.unwrap().members_count, 12);
}

#[tokio::test]
async fn refresh_with_empty_storage_clears_registry() {
    let api = MockTelegram::new(BOT_ID);
    let store = MemoryStore::new();
    let registry = ChatRegistry::new();
    registry
        .insert(BotChat::new(-5, Some("Stale"), ChatKind::Group, 1))
        .await;

    let report = registry.refresh(&api, &store, BOT_ID).await.unwrap();

    assert_eq!(report.chats_before, 0);
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn record_chat_stores_groups_only() {
    let api = MockTelegram::new(BOT_ID);
    let store = MemoryStore::new();
    let registry = ChatRegistry::new();
    api.add_chat(group(-1, "Team"), 8);

    let recorded = registry.record_chat(&api, &store, &group(-1, "Team")).await;
    assert_eq!(recorded.unwrap().members_count, 8);
    assert!(registry.contains(-1).await);
    assert!(store.bot_chat(-1).await.is_some());

    let private = Chat {
        id: 5,
        kind: ChatKind::Private,
        title: None,
        username: None,
    };
    assert!(registry.record_chat(&api, &store, &private).await.is_none());
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn record_chat_swallows_api_errors() {
    let api = MockTelegram::new(BOT_ID);
    let store = MemoryStore::new();
    let registry = ChatRegistry::new();

    // unknown to the mock, so getChatMemberCount fails
    assert!(registry
        .record_chat(&api, &store, &supergroup(-77, "Unknown"))
        .await
        .is_none());
    assert!(registry.is_empty().await);
}
