use invite_bot::server::statistics_json;
use invite_bot::{MemberStore, MemoryStore};
use invite_models::{BotChat, ChatKind, MemberStatus, UserRecord};

const TARGET: i64 = -1001000;

fn user(id: i64) -> UserRecord {
    UserRecord {
        user_id: id,
        username: None,
        first_name: Some(format!("User {}", id)),
        last_name: None,
        is_bot: false,
    }
}

#[tokio::test]
async fn stats_document_carries_counts_and_target() {
    let store = MemoryStore::new();
    for id in [1, 2, 3] {
        store.upsert_user(&user(id)).await.unwrap();
    }
    store.upsert_chat_member(1, TARGET, MemberStatus::Member).await.unwrap();
    store.upsert_chat_member(2, TARGET, MemberStatus::Administrator).await.unwrap();
    store
        .upsert_bot_chat(&BotChat::new(-5, Some("Big"), ChatKind::Supergroup, 300))
        .await
        .unwrap();
    store
        .upsert_bot_chat(&BotChat::new(-6, Some("Small"), ChatKind::Group, 12))
        .await
        .unwrap();

    let doc = statistics_json(&store, TARGET).await.unwrap();

    assert_eq!(doc["target_chat_id"], TARGET);
    assert_eq!(doc["users_count"], 3);
    assert_eq!(doc["target_chat_members"], 2);
    assert_eq!(doc["audience_count"], 2);
    assert_eq!(doc["chats_count"], 2);
    assert_eq!(doc["top_chats"][0]["title"], "Big");
    assert_eq!(doc["top_chats"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn empty_store_reports_zeroes() {
    let store = MemoryStore::new();
    let doc = statistics_json(&store, TARGET).await.unwrap();

    assert_eq!(doc["users_count"], 0);
    assert!(doc["top_chats"].as_array().unwrap().is_empty());
}
