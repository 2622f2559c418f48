use invite_control::{MemberStore, MemoryStore};
use invite_models::{BotChat, ChatKind, MemberStatus, UserRecord};

fn user(id: i64, is_bot: bool) -> UserRecord {
    UserRecord {
        user_id: id,
        username: Some(format!("user{}", id)),
        first_name: Some("Test".to_string()),
        last_name: None,
        is_bot,
    }
}

const TARGET: i64 = -100;

#[tokio::test]
async fn audience_excludes_bots_and_unknown_users() {
    let store = MemoryStore::new();
    store.upsert_user(&user(1, false)).await.unwrap();
    store.upsert_user(&user(2, true)).await.unwrap();
    store.upsert_user(&user(3, false)).await.unwrap();

    // 4 is a member we never saw as a user
    for id in [1, 2, 3, 4] {
        store.upsert_chat_member(id, TARGET, MemberStatus::Member).await.unwrap();
    }
    store.upsert_chat_member(3, -200, MemberStatus::Member).await.unwrap();

    assert_eq!(store.list_audience(TARGET).await.unwrap(), vec![1, 3]);
    assert_eq!(store.list_chat_members(TARGET).await.unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(store.list_users().await.unwrap(), vec![1, 3]);
}

#[tokio::test]
async fn upsert_member_overwrites_status() {
    let store = MemoryStore::new();
    store.upsert_chat_member(1, TARGET, MemberStatus::Member).await.unwrap();
    store
        .upsert_chat_member(1, TARGET, MemberStatus::Administrator)
        .await
        .unwrap();

    let member = store.member(TARGET, 1).await.unwrap();
    assert_eq!(member.status, MemberStatus::Administrator);
    assert_eq!(store.list_chat_members(TARGET).await.unwrap().len(), 1);

    store.remove_chat_member(1, TARGET).await.unwrap();
    assert!(store.member(TARGET, 1).await.is_none());
}

#[tokio::test]
async fn statistics_rank_top_five_chats() {
    let store = MemoryStore::new();
    store.upsert_user(&user(1, false)).await.unwrap();
    store.upsert_user(&user(2, false)).await.unwrap();
    store.upsert_user(&user(9, true)).await.unwrap();
    store.upsert_chat_member(1, TARGET, MemberStatus::Member).await.unwrap();
    store.upsert_chat_member(9, TARGET, MemberStatus::Member).await.unwrap();

    for (i, count) in [10, 70, 30, 50, 20, 60].iter().enumerate() {
        let id = -1000 - i as i64;
        store
            .upsert_bot_chat(&BotChat::new(id, Some(&format!("Chat {}", count)), ChatKind::Group, *count))
            .await
            .unwrap();
    }

    let stats = store.statistics(TARGET).await.unwrap();
    assert_eq!(stats.users_count, 2);
    assert_eq!(stats.target_chat_members, 2);
    assert_eq!(stats.audience_count, 1);
    assert_eq!(stats.chats_count, 6);

    let counts: Vec<i32> = stats.top_chats.iter().map(|c| c.members_count).collect();
    assert_eq!(counts, vec![70, 60, 50, 30, 20]);
}

#[tokio::test]
async fn bot_chats_listed_by_title_and_removable() {
    let store = MemoryStore::new();
    store
        .upsert_bot_chat(&BotChat::new(-2, Some("Beta"), ChatKind::Supergroup, 5))
        .await
        .unwrap();
    store
        .upsert_bot_chat(&BotChat::new(-1, Some("Alpha"), ChatKind::Group, 3))
        .await
        .unwrap();

    let titles: Vec<String> = store
        .list_bot_chats()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.title)
        .collect();
    assert_eq!(titles, vec!["Alpha", "Beta"]);

    store.remove_bot_chat(-1).await.unwrap();
    assert!(store.bot_chat(-1).await.is_none());
    assert_eq!(store.list_bot_chats().await.unwrap().len(), 1);
}
