#![cfg(feature = "postgres_tests")]
//! Runs against a real PostgreSQL given by `DATABASE_URL`, e.g.
//! `DATABASE_URL=postgres://postgres@localhost/invite_bot_test cargo test -p invite-control --features postgres_tests`.

use invite_control::{MemberStore, PgStore};
use invite_models::{BotChat, ChatKind, MemberStatus, UserRecord};
use sqlx::postgres::PgPoolOptions;

// Far outside the range of real Telegram ids.
const TARGET: i64 = -9_000_000_000_001;
const NET: i64 = -9_000_000_000_002;
const USER_A: i64 = 9_000_000_000_001;
const USER_B: i64 = 9_000_000_000_002;
const BOT: i64 = 9_000_000_000_003;

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect");
    let store = PgStore::from_pool(pool);
    store.migrate().await.expect("migrate");

    for id in [USER_A, USER_B, BOT] {
        sqlx::query("DELETE FROM chat_members WHERE user_id = $1")
            .bind(id)
            .execute(store.pool())
            .await
            .unwrap();
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(id)
            .execute(store.pool())
            .await
            .unwrap();
    }
    for id in [TARGET, NET] {
        store.remove_bot_chat(id).await.unwrap();
    }
    store
}

fn user(id: i64, is_bot: bool) -> UserRecord {
    UserRecord {
        user_id: id,
        username: None,
        first_name: Some("Pg".to_string()),
        last_name: None,
        is_bot,
    }
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let store = store().await;
    store.migrate().await.unwrap();
    store.migrate().await.unwrap();
}

#[tokio::test]
async fn audience_and_member_lifecycle() {
    let store = store().await;
    store.upsert_user(&user(USER_A, false)).await.unwrap();
    store.upsert_user(&user(BOT, true)).await.unwrap();
    for id in [USER_A, USER_B, BOT] {
        store
            .upsert_chat_member(id, TARGET, MemberStatus::Member)
            .await
            .unwrap();
    }

    assert_eq!(store.list_audience(TARGET).await.unwrap(), vec![USER_A]);
    assert_eq!(store.list_chat_members(TARGET).await.unwrap().len(), 3);

    store.remove_chat_member(USER_B, TARGET).await.unwrap();
    assert_eq!(store.list_chat_members(TARGET).await.unwrap().len(), 2);

    let stats = store.statistics(TARGET).await.unwrap();
    assert_eq!(stats.target_chat_members, 2);
    assert_eq!(stats.audience_count, 1);
}

#[tokio::test]
async fn bot_chat_upsert_overwrites() {
    let store = store().await;
    store
        .upsert_bot_chat(&BotChat::new(NET, Some("Before"), ChatKind::Group, 3))
        .await
        .unwrap();
    store
        .upsert_bot_chat(&BotChat::new(NET, Some("After"), ChatKind::Supergroup, 9))
        .await
        .unwrap();

    let chat = store
        .list_bot_chats()
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.chat_id == NET)
        .unwrap();
    assert_eq!(chat.title, "After");
    assert_eq!(chat.chat_type, ChatKind::Supergroup);
    assert_eq!(chat.members_count, 9);
}
