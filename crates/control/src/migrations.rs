use sqlx::PgPool;
use tracing::info;

/// Embedded migration scripts
const MIGRATION_001_INITIAL: &str = include_str!("../migrations/001_initial.sql");

/// Run all embedded migrations. Every statement is idempotent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    // Migration 001: users, chat members, bot chats
    info!("Running migration 001: Initial schema");
    for statement in statements(MIGRATION_001_INITIAL) {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("All migrations completed successfully");
    Ok(())
}

/// Splits a script into single statements; prepared queries take one at a time.
fn statements(script: &str) -> Vec<&str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
