use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::{ApiResponse, AppState};
use crate::domain::ContractAddress;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshContractResponse {
    pub refreshed_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshAllResponse {
    pub refreshed_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
}

/// POST /api/refresh/:contractAddress - refresh every call on one token.
pub async fn refresh_contract(
    Path(contract_address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RefreshContractResponse>>, AppError> {
    let contract = ContractAddress::new(contract_address.trim().to_string());
    if contract.is_blank() {
        return Err(AppError::BadRequest(
            "contract address must not be empty".to_string(),
        ));
    }

    let outcomes = state.refresher.refresh_contract(&contract).await?;
    if outcomes.is_empty() {
        return Err(AppError::NotFound(format!(
            "No call tracked for {}",
            contract
        )));
    }

    Ok(ApiResponse::ok(RefreshContractResponse {
        refreshed_count: outcomes.len(),
    }))
}

/// POST /api/refresh-all - bulk sweep over every tracked call.
///
/// Per-item failures are counted, not raised: the sweep itself completing is
/// a success even when some tokens errored.
pub async fn refresh_all(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RefreshAllResponse>>, AppError> {
    let summary = state.refresher.refresh_all().await?;

    Ok(ApiResponse::ok(RefreshAllResponse {
        refreshed_count: summary.refreshed,
        skipped_count: summary.skipped,
        error_count: summary.errors,
    }))
}
