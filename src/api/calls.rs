use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{ApiResponse, AppState};
use crate::db::repo::CallWithCaller;
use crate::domain::{Call, Caller, ContractAddress, Decimal, Snapshot, TelegramId};
use crate::engine;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallResponse {
    pub id: Uuid,
    pub contract_address: String,
    pub token: TokenResponse,
    pub user: UserResponse,
    pub prices: PricesResponse,
    pub performance: PerformanceResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub symbol: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_info: Option<TwitterInfoResponse>,
    pub is_linked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterInfoResponse {
    pub twitter_username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_profile_pic: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricesResponse {
    pub entry: Decimal,
    pub entry_market_cap: Decimal,
    pub current: Decimal,
    pub current_market_cap: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResponse {
    pub pnl_percent: Decimal,
    pub score: Decimal,
}

impl From<CallWithCaller> for CallResponse {
    fn from(row: CallWithCaller) -> Self {
        let CallWithCaller { call, caller } = row;

        let twitter_info = caller
            .twitter_username
            .map(|twitter_username| TwitterInfoResponse {
                twitter_username,
                twitter_profile_pic: caller.twitter_profile_pic,
            });

        CallResponse {
            id: call.id,
            contract_address: call.contract_address.as_str().to_string(),
            token: TokenResponse {
                symbol: call.token.symbol,
                name: call.token.name,
                image: call.token.image,
            },
            user: UserResponse {
                display_name: caller.display_name,
                username: caller.username,
                first_name: caller.first_name,
                twitter_info,
                is_linked: caller.is_linked,
            },
            prices: PricesResponse {
                entry: call.entry_price,
                entry_market_cap: call.entry_market_cap,
                current: call.current_price,
                current_market_cap: call.current_market_cap,
            },
            performance: PerformanceResponse {
                pnl_percent: call.pnl_percent,
                score: call.score,
            },
            created_at: call.created_at,
            updated_at: call.updated_at,
        }
    }
}

/// GET /api/calls - every tracked call, best performers first.
pub async fn list_calls(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CallResponse>>>, AppError> {
    let mut rows = state.repo.list_calls_with_callers().await?;

    rows.sort_by(|a, b| {
        b.call
            .pnl_percent
            .cmp(&a.call.pnl_percent)
            .then_with(|| b.call.created_at.cmp(&a.call.created_at))
    });

    let calls = rows.into_iter().map(CallResponse::from).collect();
    Ok(ApiResponse::ok(calls))
}

/// GET /api/calls/:contractAddress - most recent call on a contract.
pub async fn get_call(
    Path(contract_address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CallResponse>>, AppError> {
    let contract = parse_contract(&contract_address)?;

    let row = state
        .repo
        .get_latest_call_for_contract(&contract)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No call tracked for {}", contract)))?;

    Ok(ApiResponse::ok(CallResponse::from(row)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallRequest {
    pub telegram_id: i64,
    pub contract_address: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub display_name: Option<String>,
    pub twitter_username: Option<String>,
    pub twitter_profile_pic: Option<String>,
    #[serde(default)]
    pub is_linked: bool,
}

/// POST /api/calls - track a new call from the bot.
///
/// Entry price/market cap are captured from the feed at creation time and
/// count as the call's first observation.
pub async fn create_call(
    State(state): State<AppState>,
    Json(request): Json<CreateCallRequest>,
) -> Result<Json<ApiResponse<CallResponse>>, AppError> {
    let contract = parse_contract(&request.contract_address)?;
    let telegram_id = TelegramId::new(request.telegram_id);

    if let Some(existing) = state
        .repo
        .find_call_by_caller_and_contract(telegram_id, &contract)
        .await?
    {
        return Err(AppError::Conflict(format!(
            "Caller {} already has a call on {}",
            telegram_id, existing.contract_address
        )));
    }

    let meta = state.datasource.fetch_token_meta(contract.as_str()).await?;
    let market = state
        .datasource
        .fetch_market_data(contract.as_str())
        .await?;
    if !market.price.is_positive() {
        return Err(AppError::BadRequest(format!(
            "Feed reports no positive price for {}",
            contract
        )));
    }

    let caller = Caller {
        telegram_id,
        username: request.username,
        first_name: request.first_name,
        display_name: request.display_name,
        twitter_username: request.twitter_username,
        twitter_profile_pic: request.twitter_profile_pic,
        is_linked: request.is_linked,
    };
    state.repo.upsert_caller(&caller).await?;

    let now = Utc::now();
    let mut call = Call::new(telegram_id, contract.clone(), meta, &market, now);
    // A brand-new call sits at exactly 1.0x, which the tier table scores.
    call.score = engine::score_call(
        Decimal::one(),
        call.entry_market_cap,
        chrono::Duration::zero(),
        state.decay.as_ref(),
    );

    state.repo.insert_call(&call).await?;
    state
        .repo
        .insert_snapshot(&Snapshot::new(contract, now, &market))
        .await?;

    tracing::info!(contract = %call.contract_address, caller = %telegram_id,
                   entry_price = %call.entry_price, "New call tracked");

    Ok(ApiResponse::ok(CallResponse::from(CallWithCaller {
        call,
        caller,
    })))
}

fn parse_contract(input: &str) -> Result<ContractAddress, AppError> {
    let contract = ContractAddress::new(input.trim().to_string());
    if contract.is_blank() {
        return Err(AppError::BadRequest(
            "contract address must not be empty".to_string(),
        ));
    }
    Ok(contract)
}
