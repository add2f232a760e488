use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use std::path::Path;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;
pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("game state error: {0}")]
    Game(#[from] crate::games::GameError),
}

pub struct Database {
    pool: DbPool,
}

impl Database {
    pub fn new(database_url: &str) -> DbResult<Self> {
        Self::with_pool_size(database_url, crate::config::defaults::DB_POOL_SIZE)
    }

    pub fn with_pool_size(database_url: &str, pool_size: u32) -> DbResult<Self> {
        let in_memory = database_url == ":memory:";

        // Create parent directory if it doesn't exist
        if !in_memory {
            if let Some(parent) = Path::new(database_url).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).ok();
                }
            }
        }

        let manager = if in_memory {
            SqliteConnectionManager::memory()
        } else {
            SqliteConnectionManager::file(database_url)
        }
        .with_init(|c| {
            c.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;",
            )
        });

        // Every in-memory connection is its own database, so tests get exactly one
        let max_size = if in_memory { 1 } else { pool_size.max(1) };
        let pool = Pool::builder().max_size(max_size).build(manager)?;

        let db = Self { pool };
        db.init()?;
        Ok(db)
    }

    pub(crate) fn conn(&self) -> DbResult<DbConn> {
        Ok(self.pool.get()?)
    }

    fn init(&self) -> DbResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                display_name TEXT,
                last_active TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                sender_id TEXT NOT NULL REFERENCES users(id),
                receiver_id TEXT REFERENCES users(id),
                room_id TEXT,
                content TEXT NOT NULL,
                message_type TEXT NOT NULL DEFAULT 'text',
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_chat_messages_pair
                ON chat_messages(sender_id, receiver_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_chat_messages_room
                ON chat_messages(room_id, created_at);

            CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                player1_id TEXT NOT NULL REFERENCES users(id),
                player2_id TEXT NOT NULL REFERENCES users(id),
                game_type TEXT NOT NULL,
                game_state TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                winner_id TEXT REFERENCES users(id),
                current_turn TEXT REFERENCES users(id),
                move_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_games_player1 ON games(player1_id, status);
            CREATE INDEX IF NOT EXISTS idx_games_player2 ON games(player2_id, status);

            CREATE TABLE IF NOT EXISTS activities (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                activity_type TEXT NOT NULL,
                description TEXT NOT NULL,
                data TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_activities_user ON activities(user_id, created_at);

            CREATE TABLE IF NOT EXISTS friend_streaks (
                user_a TEXT NOT NULL REFERENCES users(id),
                user_b TEXT NOT NULL REFERENCES users(id),
                streak_count INTEGER NOT NULL DEFAULT 0,
                longest_streak INTEGER NOT NULL DEFAULT 0,
                last_interaction TEXT NOT NULL,
                PRIMARY KEY (user_a, user_b),
                CHECK (user_a < user_b)
            );",
        )?;

        Ok(())
    }
}

/// Timestamps are stored as fixed-width RFC 3339 so they sort lexicographically.
pub(crate) fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp inside a row mapper, reporting the column on failure.
pub(crate) fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

/// Report a stored enum value no variant matches.
pub(crate) fn unknown_variant(column: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, format!("unknown value '{}'", value).into())
}
