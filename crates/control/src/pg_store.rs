use crate::migrations::run_migrations;
use crate::store::{MemberStore, TOP_CHATS_LIMIT};
use async_trait::async_trait;
use invite_models::{
    BotChat, BotError, ChatKind, DatabaseConfig, MemberStatus, Statistics, TopChat, UserRecord,
};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{info, instrument};

/// [`MemberStore`] over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, BotError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| BotError::DatabaseError {
                reason: format!("cannot connect to {}: {}", config.url(), e),
            })?;

        info!("Connected to database at {}", config.url());
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), BotError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| BotError::DatabaseError {
                reason: e.to_string(),
            })
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }

    fn row_to_bot_chat(row: &PgRow) -> Result<BotChat, BotError> {
        let chat_id: i64 = row.try_get("chat_id")?;
        let title: Option<String> = row.try_get("chat_title")?;
        let chat_type: Option<String> = row.try_get("chat_type")?;
        let members_count: Option<i32> = row.try_get("members_count")?;

        let chat_type = chat_type
            .as_deref()
            .unwrap_or("group")
            .parse::<ChatKind>()
            .map_err(|reason| BotError::DatabaseError { reason })?;

        Ok(BotChat::new(
            chat_id,
            title.as_deref(),
            chat_type,
            members_count.unwrap_or(0),
        ))
    }
}

#[async_trait]
impl MemberStore for PgStore {
    #[instrument(skip(self, user), fields(user_id = user.user_id))]
    async fn upsert_user(&self, user: &UserRecord) -> Result<(), BotError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, first_name, last_name, is_bot)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                is_bot = EXCLUDED.is_bot
            "#,
        )
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_bot)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn upsert_chat_member(
        &self,
        user_id: i64,
        chat_id: i64,
        status: MemberStatus,
    ) -> Result<(), BotError> {
        sqlx::query(
            r#"
            INSERT INTO chat_members (user_id, chat_id, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, chat_id) DO UPDATE SET
                status = EXCLUDED.status,
                joined_date = CURRENT_TIMESTAMP
            "#,
        )
        .bind(user_id)
        .bind(chat_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_chat_member(&self, user_id: i64, chat_id: i64) -> Result<(), BotError> {
        sqlx::query("DELETE FROM chat_members WHERE user_id = $1 AND chat_id = $2")
            .bind(user_id)
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self, chat), fields(chat_id = chat.chat_id))]
    async fn upsert_bot_chat(&self, chat: &BotChat) -> Result<(), BotError> {
        sqlx::query(
            r#"
            INSERT INTO bot_chats (chat_id, chat_title, chat_type, members_count, last_updated)
            VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP)
            ON CONFLICT (chat_id) DO UPDATE SET
                chat_title = EXCLUDED.chat_title,
                chat_type = EXCLUDED.chat_type,
                members_count = EXCLUDED.members_count,
                last_updated = CURRENT_TIMESTAMP
            "#,
        )
        .bind(chat.chat_id)
        .bind(&chat.title)
        .bind(chat.chat_type.as_str())
        .bind(chat.members_count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_bot_chat(&self, chat_id: i64) -> Result<(), BotError> {
        sqlx::query("DELETE FROM bot_chats WHERE chat_id = $1")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<i64>, BotError> {
        let ids = sqlx::query_scalar("SELECT user_id FROM users WHERE is_bot = FALSE ORDER BY user_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn list_chat_members(&self, chat_id: i64) -> Result<Vec<i64>, BotError> {
        let ids = sqlx::query_scalar(
            "SELECT user_id FROM chat_members WHERE chat_id = $1 ORDER BY user_id",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn list_audience(&self, target_chat_id: i64) -> Result<Vec<i64>, BotError> {
        let ids = sqlx::query_scalar(
            r#"
            SELECT DISTINCT cm.user_id
            FROM chat_members cm
            JOIN users u ON cm.user_id = u.user_id
            WHERE cm.chat_id = $1 AND u.is_bot = FALSE
            ORDER BY cm.user_id
            "#,
        )
        .bind(target_chat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn list_bot_chats(&self) -> Result<Vec<BotChat>, BotError> {
        let rows = sqlx::query(
            r#"
            SELECT chat_id, chat_title, chat_type, members_count
            FROM bot_chats
            ORDER BY chat_title, chat_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_bot_chat).collect()
    }

    #[instrument(skip(self))]
    async fn statistics(&self, target_chat_id: i64) -> Result<Statistics, BotError> {
        let users_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_bot = FALSE")
            .fetch_one(&self.pool)
            .await?;

        let target_chat_members: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chat_members WHERE chat_id = $1")
                .bind(target_chat_id)
                .fetch_one(&self.pool)
                .await?;

        let audience_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT cm.user_id)
            FROM chat_members cm
            JOIN users u ON cm.user_id = u.user_id
            WHERE cm.chat_id = $1 AND u.is_bot = FALSE
            "#,
        )
        .bind(target_chat_id)
        .fetch_one(&self.pool)
        .await?;

        let chats_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bot_chats")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT chat_id, chat_title, members_count
            FROM bot_chats
            ORDER BY members_count DESC, chat_id
            LIMIT $1
            "#,
        )
        .bind(TOP_CHATS_LIMIT as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut top_chats = Vec::with_capacity(rows.len());
        for row in &rows {
            let chat_id: i64 = row.try_get("chat_id")?;
            let title: Option<String> = row.try_get("chat_title")?;
            let members_count: Option<i32> = row.try_get("members_count")?;
            top_chats.push(TopChat {
                title: title.unwrap_or_else(|| format!("Chat {}", chat_id)),
                members_count: members_count.unwrap_or(0),
            });
        }

        Ok(Statistics {
            users_count,
            target_chat_members,
            audience_count,
            chats_count,
            top_chats,
        })
    }
}
