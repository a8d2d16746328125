use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        avatar_image TEXT NOT NULL DEFAULT '',
        is_avatar_image_set BOOLEAN NOT NULL DEFAULT 0
    )",
    // seq fixes send order; id is what clients see
    "CREATE TABLE IF NOT EXISTS messages (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        user_low TEXT NOT NULL,
        user_high TEXT NOT NULL,
        sender TEXT NOT NULL,
        recipient TEXT NOT NULL,
        body TEXT NOT NULL,
        sent_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS messages_by_conversation ON messages (user_low, user_high, seq)",
];

pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    init(&db_pool).await?;
    Ok(db_pool)
}

pub async fn init(db_pool: &SqlitePool) -> anyhow::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(db_pool).await?;
    }

    info!("database schema ready");
    Ok(())
}

/// Fresh in-memory database. Every connection would get its own copy, so the
/// pool is held to one.
pub async fn memory() -> anyhow::Result<SqlitePool> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    init(&db_pool).await?;
    Ok(db_pool)
}
