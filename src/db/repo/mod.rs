//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `calls.rs` - Call record operations
//! - `snapshots.rs` - Price snapshot operations

mod calls;
mod snapshots;

use crate::domain::{Caller, Decimal, TelegramId};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

/// A call joined with its caller, as served by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallWithCaller {
    pub call: crate::domain::Call,
    pub caller: Caller,
}

/// Minimal per-call row for leaderboard aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardCallRow {
    pub telegram_id: TelegramId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub pnl_percent: Decimal,
    pub score: Decimal,
}

/// Derived fields written back by one refresh of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRefreshUpdate {
    pub ath_price: Decimal,
    pub locked_multiplier: Option<Decimal>,
    pub current_price: Decimal,
    pub current_market_cap: Decimal,
    pub pnl_percent: Decimal,
    pub score: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Caller operations
    // =========================================================================

    /// Insert or update a caller row.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn upsert_caller(&self, caller: &Caller) -> Result<(), sqlx::Error> {
        let now = Utc::now().timestamp_millis();
        sqlx::query(
            r#"
            INSERT INTO users (
                telegram_id, username, first_name, display_name,
                twitter_username, twitter_profile_pic, is_linked,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(telegram_id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                display_name = excluded.display_name,
                twitter_username = excluded.twitter_username,
                twitter_profile_pic = excluded.twitter_profile_pic,
                is_linked = excluded.is_linked,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(caller.telegram_id.as_i64())
        .bind(caller.username.as_deref())
        .bind(caller.first_name.as_deref())
        .bind(caller.display_name.as_deref())
        .bind(caller.twitter_username.as_deref())
        .bind(caller.twitter_profile_pic.as_deref())
        .bind(caller.is_linked as i64)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a caller by telegram id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_caller(
        &self,
        telegram_id: TelegramId,
    ) -> Result<Option<Caller>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT telegram_id, username, first_name, display_name,
                   twitter_username, twitter_profile_pic, is_linked
            FROM users
            WHERE telegram_id = ?
            "#,
        )
        .bind(telegram_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| caller_from_row(&row)))
    }
}

pub(crate) fn caller_from_row(row: &sqlx::sqlite::SqliteRow) -> Caller {
    let is_linked: i64 = row.get("is_linked");
    Caller {
        telegram_id: TelegramId::new(row.get("telegram_id")),
        username: row.get("username"),
        first_name: row.get("first_name"),
        display_name: row.get("display_name"),
        twitter_username: row.get("twitter_username"),
        twitter_profile_pic: row.get("twitter_profile_pic"),
        is_linked: is_linked != 0,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Repository;
    use crate::db::init_db;
    use tempfile::TempDir;

    pub async fn setup_repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::setup_repo;
    use crate::domain::{Caller, TelegramId};

    #[tokio::test]
    async fn test_upsert_and_get_caller() {
        let (repo, _temp) = setup_repo().await;

        let mut caller = Caller::anonymous(TelegramId::new(42));
        caller.username = Some("trencher".to_string());
        repo.upsert_caller(&caller).await.unwrap();

        let fetched = repo.get_caller(TelegramId::new(42)).await.unwrap().unwrap();
        assert_eq!(fetched, caller);
    }

    #[tokio::test]
    async fn test_upsert_caller_updates_in_place() {
        let (repo, _temp) = setup_repo().await;

        let mut caller = Caller::anonymous(TelegramId::new(42));
        repo.upsert_caller(&caller).await.unwrap();

        caller.twitter_username = Some("trencher_x".to_string());
        caller.is_linked = true;
        repo.upsert_caller(&caller).await.unwrap();

        let fetched = repo.get_caller(TelegramId::new(42)).await.unwrap().unwrap();
        assert!(fetched.is_linked);
        assert_eq!(fetched.twitter_username.as_deref(), Some("trencher_x"));
    }

    #[tokio::test]
    async fn test_get_caller_missing() {
        let (repo, _temp) = setup_repo().await;
        let fetched = repo.get_caller(TelegramId::new(7)).await.unwrap();
        assert!(fetched.is_none());
    }
}
