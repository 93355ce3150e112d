use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::{ApiResponse, AppState};
use crate::db::repo::LeaderboardCallRow;
use crate::domain::{Decimal, TelegramId};
use crate::engine;
use crate::error::AppError;

const DEFAULT_LIMIT: usize = 25;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub telegram_id: TelegramId,
    pub rank: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    pub total_score: Decimal,
    pub total_calls: i64,
    pub successful_calls: i64,
    pub win_rate: Decimal,
}

/// GET /api/leaderboard?limit=N - users ranked by total score.
pub async fn get_leaderboard(
    Query(params): Query<LeaderboardQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let rows = state.repo.query_leaderboard_rows().await?;
    let mut entries = aggregate(rows);
    entries.truncate(limit);

    Ok(ApiResponse::ok(entries))
}

struct UserTotals {
    username: Option<String>,
    first_name: Option<String>,
    total_score: Decimal,
    total_calls: i64,
    successful_calls: i64,
}

/// Reduce per-call rows into ranked per-user entries.
///
/// Ties break by call count (more active first), then telegram id.
fn aggregate(rows: Vec<LeaderboardCallRow>) -> Vec<LeaderboardEntry> {
    let mut totals: BTreeMap<TelegramId, UserTotals> = BTreeMap::new();

    for row in rows {
        let entry = totals.entry(row.telegram_id).or_insert(UserTotals {
            username: row.username,
            first_name: row.first_name,
            total_score: Decimal::zero(),
            total_calls: 0,
            successful_calls: 0,
        });

        entry.total_score = entry.total_score + row.score;
        entry.total_calls += 1;

        let multiplier = row.pnl_percent / Decimal::hundred() + Decimal::one();
        if engine::is_successful(multiplier) {
            entry.successful_calls += 1;
        }
    }

    let mut users: Vec<(TelegramId, UserTotals)> = totals.into_iter().collect();
    users.sort_by(|(id_a, a), (id_b, b)| {
        b.total_score
            .cmp(&a.total_score)
            .then_with(|| b.total_calls.cmp(&a.total_calls))
            .then_with(|| id_a.cmp(id_b))
    });

    users
        .into_iter()
        .enumerate()
        .map(|(idx, (telegram_id, totals))| LeaderboardEntry {
            telegram_id,
            rank: (idx + 1) as i64,
            username: totals.username,
            first_name: totals.first_name,
            total_score: totals.total_score,
            total_calls: totals.total_calls,
            successful_calls: totals.successful_calls,
            win_rate: engine::win_rate(totals.successful_calls, totals.total_calls),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn row(telegram_id: i64, pnl: &str, score: &str) -> LeaderboardCallRow {
        LeaderboardCallRow {
            telegram_id: TelegramId::new(telegram_id),
            username: Some(format!("user{}", telegram_id)),
            first_name: None,
            pnl_percent: d(pnl),
            score: d(score),
        }
    }

    #[test]
    fn test_aggregate_totals_and_win_rate() {
        let entries = aggregate(vec![
            // 1.8x counts as a win, 1.5x does not.
            row(1, "80", "1"),
            row(1, "50", "0"),
            row(2, "900", "3"),
        ]);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].telegram_id, TelegramId::new(2));
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].win_rate, d("100"));

        assert_eq!(entries[1].total_calls, 2);
        assert_eq!(entries[1].successful_calls, 1);
        assert_eq!(entries[1].win_rate, d("50"));
        assert_eq!(entries[1].total_score, d("1"));
    }

    #[test]
    fn test_aggregate_tie_breaks_by_call_count_then_id() {
        let entries = aggregate(vec![
            row(5, "0", "2"),
            row(3, "0", "1"),
            row(3, "0", "1"),
            row(4, "0", "2"),
        ]);

        // Same total score 2: user 3 has two calls and ranks above 4 and 5;
        // 4 beats 5 on the id tie-break.
        let ids: Vec<i64> = entries.iter().map(|e| e.telegram_id.as_i64()).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[2].rank, 3);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(Vec::new()).is_empty());
    }
}
