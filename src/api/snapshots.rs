use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::{ApiResponse, AppState};
use crate::domain::{ContractAddress, Decimal, Snapshot};
use crate::error::AppError;

/// Chart window for the snapshot query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    OneHour,
    FourHours,
    OneDay,
    SevenDays,
    ThirtyDays,
}

impl Timeframe {
    fn duration(self) -> Duration {
        match self {
            Timeframe::OneHour => Duration::hours(1),
            Timeframe::FourHours => Duration::hours(4),
            Timeframe::OneDay => Duration::days(1),
            Timeframe::SevenDays => Duration::days(7),
            Timeframe::ThirtyDays => Duration::days(30),
        }
    }
}

impl FromStr for Timeframe {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1h" => Ok(Timeframe::OneHour),
            "4h" => Ok(Timeframe::FourHours),
            "1d" => Ok(Timeframe::OneDay),
            "7d" => Ok(Timeframe::SevenDays),
            "30d" => Ok(Timeframe::ThirtyDays),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SnapshotsQuery {
    pub timeframe: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotsResponse {
    pub snapshots: Vec<SnapshotResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub market_cap: Decimal,
    pub liquidity: Decimal,
    pub volume_24h: Decimal,
}

impl From<Snapshot> for SnapshotResponse {
    fn from(snapshot: Snapshot) -> Self {
        SnapshotResponse {
            timestamp: snapshot.timestamp,
            price: snapshot.price,
            market_cap: snapshot.market_cap,
            liquidity: snapshot.liquidity,
            volume_24h: snapshot.volume_24h,
        }
    }
}

/// GET /api/tokens/:contractAddress/snapshots?timeframe=7d - chart series.
pub async fn get_snapshots(
    Path(contract_address): Path<String>,
    Query(params): Query<SnapshotsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SnapshotsResponse>>, AppError> {
    let contract = ContractAddress::new(contract_address.trim().to_string());
    if contract.is_blank() {
        return Err(AppError::BadRequest(
            "contract address must not be empty".to_string(),
        ));
    }

    let timeframe = match params.timeframe.as_deref() {
        None => Timeframe::SevenDays,
        Some(s) => Timeframe::from_str(s).map_err(|_| {
            AppError::BadRequest("timeframe must be one of: 1h, 4h, 1d, 7d, 30d".to_string())
        })?,
    };

    let from = Utc::now() - timeframe.duration();
    let snapshots = state.repo.query_snapshots(&contract, from).await?;

    Ok(ApiResponse::ok(SnapshotsResponse {
        snapshots: snapshots.into_iter().map(SnapshotResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_parse() {
        assert_eq!(Timeframe::from_str("1h").unwrap(), Timeframe::OneHour);
        assert_eq!(Timeframe::from_str("4H").unwrap(), Timeframe::FourHours);
        assert_eq!(Timeframe::from_str(" 7d ").unwrap(), Timeframe::SevenDays);
        assert!(Timeframe::from_str("2w").is_err());
    }

    #[test]
    fn test_timeframe_durations() {
        assert_eq!(Timeframe::OneDay.duration(), Duration::days(1));
        assert_eq!(Timeframe::ThirtyDays.duration(), Duration::days(30));
    }
}
