//! Price snapshot operations for the repository.

use crate::domain::{ContractAddress, Decimal, Snapshot};
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::str::FromStr;

use super::Repository;

impl Repository {
    /// Append a snapshot idempotently.
    ///
    /// Returns true if a new row was written, false for a duplicate
    /// (contract, timestamp) pair.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_snapshot(&self, snapshot: &Snapshot) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO snapshots (
                contract_address, timestamp, price, market_cap,
                liquidity, volume_24h, event_key
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(event_key) DO NOTHING
            "#,
        )
        .bind(snapshot.contract_address.as_str())
        .bind(snapshot.timestamp.timestamp_millis())
        .bind(snapshot.price.to_canonical_string())
        .bind(snapshot.market_cap.to_canonical_string())
        .bind(snapshot.liquidity.to_canonical_string())
        .bind(snapshot.volume_24h.to_canonical_string())
        .bind(snapshot.event_key.as_str())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Query snapshots for a contract from a cutoff time onward, ascending.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_snapshots(
        &self,
        contract_address: &ContractAddress,
        from: DateTime<Utc>,
    ) -> Result<Vec<Snapshot>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT contract_address, timestamp, price, market_cap,
                   liquidity, volume_24h, event_key
            FROM snapshots
            WHERE contract_address = ? AND timestamp >= ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(contract_address.as_str())
        .bind(from.timestamp_millis())
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let price: String = row.get("price");
                let market_cap: String = row.get("market_cap");
                let liquidity: String = row.get("liquidity");
                let volume_24h: String = row.get("volume_24h");
                let timestamp: i64 = row.get("timestamp");

                Snapshot {
                    contract_address: ContractAddress::new(row.get("contract_address")),
                    timestamp: DateTime::from_timestamp_millis(timestamp).unwrap_or_default(),
                    price: Decimal::from_str(&price).unwrap_or_default(),
                    market_cap: Decimal::from_str(&market_cap).unwrap_or_default(),
                    liquidity: Decimal::from_str(&liquidity).unwrap_or_default(),
                    volume_24h: Decimal::from_str(&volume_24h).unwrap_or_default(),
                    event_key: row.get("event_key"),
                }
            })
            .collect())
    }
}
