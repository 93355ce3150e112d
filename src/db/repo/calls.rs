//! Call record operations for the repository.

use crate::domain::{Call, ContractAddress, Decimal, TelegramId, TokenMeta};
use chrono::DateTime;
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

use super::{caller_from_row, CallRefreshUpdate, CallWithCaller, LeaderboardCallRow, Repository};

const CALL_COLUMNS: &str = r#"
    calls.id, calls.telegram_id, calls.contract_address, calls.token_symbol,
    calls.token_name, calls.token_image, calls.entry_price,
    calls.entry_market_cap, calls.ath_price, calls.locked_multiplier,
    calls.current_price, calls.current_market_cap, calls.pnl_percent,
    calls.score, calls.created_at, calls.updated_at
"#;

impl Repository {
    /// Insert a new call record.
    ///
    /// # Errors
    /// Returns an error if the insert fails, including the unique-index
    /// violation for a duplicate (caller, contract) pair.
    pub async fn insert_call(&self, call: &Call) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO calls (
                id, telegram_id, contract_address, token_symbol, token_name,
                token_image, entry_price, entry_market_cap, ath_price,
                locked_multiplier, current_price, current_market_cap,
                pnl_percent, score, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(call.id.to_string())
        .bind(call.telegram_id.as_i64())
        .bind(call.contract_address.as_str())
        .bind(call.token.symbol.as_str())
        .bind(call.token.name.as_str())
        .bind(call.token.image.as_deref())
        .bind(call.entry_price.to_canonical_string())
        .bind(call.entry_market_cap.to_canonical_string())
        .bind(call.ath_price.to_canonical_string())
        .bind(call.locked_multiplier.map(|d| d.to_canonical_string()))
        .bind(call.current_price.to_canonical_string())
        .bind(call.current_market_cap.to_canonical_string())
        .bind(call.pnl_percent.to_canonical_string())
        .bind(call.score.to_canonical_string())
        .bind(call.created_at.timestamp_millis())
        .bind(call.updated_at.timestamp_millis())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Fetch a call by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_call(&self, id: Uuid) -> Result<Option<Call>, sqlx::Error> {
        let sql = format!("SELECT {} FROM calls WHERE id = ?", CALL_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(|row| call_from_row(&row)))
    }

    /// Fetch the call a given caller has open on a contract, if any.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_call_by_caller_and_contract(
        &self,
        telegram_id: TelegramId,
        contract_address: &ContractAddress,
    ) -> Result<Option<Call>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM calls WHERE telegram_id = ? AND contract_address = ?",
            CALL_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(telegram_id.as_i64())
            .bind(contract_address.as_str())
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(|row| call_from_row(&row)))
    }

    /// List every tracked call.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_calls(&self) -> Result<Vec<Call>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM calls ORDER BY created_at ASC, id ASC",
            CALL_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(self.pool()).await?;

        Ok(rows.iter().map(call_from_row).collect())
    }

    /// List every call on a contract.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_calls_for_contract(
        &self,
        contract_address: &ContractAddress,
    ) -> Result<Vec<Call>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM calls WHERE contract_address = ? ORDER BY created_at ASC, id ASC",
            CALL_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(contract_address.as_str())
            .fetch_all(self.pool())
            .await?;

        Ok(rows.iter().map(call_from_row).collect())
    }

    /// List every call joined with its caller, for the API.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_calls_with_callers(&self) -> Result<Vec<CallWithCaller>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {},
                   u.username, u.first_name,
                   u.display_name, u.twitter_username, u.twitter_profile_pic,
                   u.is_linked
            FROM calls
            JOIN users u ON u.telegram_id = calls.telegram_id
            ORDER BY calls.created_at ASC, id ASC
            "#,
            CALL_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(self.pool()).await?;

        Ok(rows
            .iter()
            .map(|row| CallWithCaller {
                call: call_from_row(row),
                caller: caller_from_row(row),
            })
            .collect())
    }

    /// Fetch the most recent call on a contract, joined with its caller.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_latest_call_for_contract(
        &self,
        contract_address: &ContractAddress,
    ) -> Result<Option<CallWithCaller>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {},
                   u.username, u.first_name,
                   u.display_name, u.twitter_username, u.twitter_profile_pic,
                   u.is_linked
            FROM calls
            JOIN users u ON u.telegram_id = calls.telegram_id
            WHERE contract_address = ?
            ORDER BY calls.created_at DESC, id DESC
            LIMIT 1
            "#,
            CALL_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(contract_address.as_str())
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(|row| CallWithCaller {
            call: call_from_row(&row),
            caller: caller_from_row(&row),
        }))
    }

    /// Write back the derived fields from one refresh.
    ///
    /// Entry price/market cap and token metadata are immutable and never
    /// touched here.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn apply_refresh(
        &self,
        id: Uuid,
        update: &CallRefreshUpdate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE calls SET
                ath_price = ?,
                locked_multiplier = ?,
                current_price = ?,
                current_market_cap = ?,
                pnl_percent = ?,
                score = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.ath_price.to_canonical_string())
        .bind(update.locked_multiplier.map(|d| d.to_canonical_string()))
        .bind(update.current_price.to_canonical_string())
        .bind(update.current_market_cap.to_canonical_string())
        .bind(update.pnl_percent.to_canonical_string())
        .bind(update.score.to_canonical_string())
        .bind(update.updated_at.timestamp_millis())
        .bind(id.to_string())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Query the per-call rows the leaderboard reduces over.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_leaderboard_rows(&self) -> Result<Vec<LeaderboardCallRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT calls.telegram_id, u.username, u.first_name,
                   calls.pnl_percent, calls.score
            FROM calls
            JOIN users u ON u.telegram_id = calls.telegram_id
            ORDER BY calls.telegram_id ASC, calls.created_at ASC
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let pnl_str: String = row.get("pnl_percent");
                let score_str: String = row.get("score");
                LeaderboardCallRow {
                    telegram_id: TelegramId::new(row.get("telegram_id")),
                    username: row.get("username"),
                    first_name: row.get("first_name"),
                    pnl_percent: Decimal::from_str(&pnl_str).unwrap_or_default(),
                    score: Decimal::from_str(&score_str).unwrap_or_default(),
                }
            })
            .collect())
    }
}

fn call_from_row(row: &sqlx::sqlite::SqliteRow) -> Call {
    let id_str: String = row.get("id");
    let entry_price: String = row.get("entry_price");
    let entry_market_cap: String = row.get("entry_market_cap");
    let ath_price: String = row.get("ath_price");
    let locked_multiplier: Option<String> = row.get("locked_multiplier");
    let current_price: String = row.get("current_price");
    let current_market_cap: String = row.get("current_market_cap");
    let pnl_percent: String = row.get("pnl_percent");
    let score: String = row.get("score");
    let created_at: i64 = row.get("created_at");
    let updated_at: i64 = row.get("updated_at");

    Call {
        id: Uuid::parse_str(&id_str).unwrap_or_default(),
        telegram_id: TelegramId::new(row.get("telegram_id")),
        contract_address: ContractAddress::new(row.get("contract_address")),
        token: TokenMeta {
            symbol: row.get("token_symbol"),
            name: row.get("token_name"),
            image: row.get("token_image"),
        },
        entry_price: Decimal::from_str(&entry_price).unwrap_or_default(),
        entry_market_cap: Decimal::from_str(&entry_market_cap).unwrap_or_default(),
        ath_price: Decimal::from_str(&ath_price).unwrap_or_default(),
        locked_multiplier: locked_multiplier.and_then(|s| Decimal::from_str(&s).ok()),
        current_price: Decimal::from_str(&current_price).unwrap_or_default(),
        current_market_cap: Decimal::from_str(&current_market_cap).unwrap_or_default(),
        pnl_percent: Decimal::from_str(&pnl_percent).unwrap_or_default(),
        score: Decimal::from_str(&score).unwrap_or_default(),
        created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_default(),
        updated_at: DateTime::from_timestamp_millis(updated_at).unwrap_or_default(),
    }
}
