use async_trait::async_trait;
use chess_matchmaking::UserDirectory;
use common::{Error, UserId};

/// A `UserDirectory` backed by the same SQLite database as the rest of the
/// service. Registration/login themselves are out of scope (spec §1); this
/// only answers whether a given id was ever issued one.
pub struct SqlxUserDirectory {
    pool: sqlx::SqlitePool,
}

impl SqlxUserDirectory {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        SqlxUserDirectory { pool }
    }

    pub async fn init_schema(pool: &sqlx::SqlitePool) -> Result<(), Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(pool)
        .await
        .map_err(|e| Error::Transient(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqlxUserDirectory {
    async fn user_exists(&self, user_id: UserId) -> Result<bool, Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Transient(e.to_string()))?;
        Ok(row.is_some())
    }
}
