use axum::http::StatusCode;
use callboard::api::{self, AppState};
use callboard::config::{Config, DecayMode};
use callboard::datasource::{MarketDataSource, MockMarketDataSource};
use callboard::db::init_db;
use callboard::domain::{Caller, ContractAddress, Decimal, MarketData, TelegramId, TokenMeta};
use callboard::refresh::{decay_for_mode, Refresher};
use callboard::{Call, Repository};
use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    state: AppState,
    mock: Arc<MockMarketDataSource>,
    _temp: TempDir,
}

fn test_config() -> Config {
    Config {
        port: 0,
        database_path: ":memory:".to_string(),
        dexscreener_api_url: "http://example.invalid".to_string(),
        refresh_concurrency: 4,
        feed_timeout_ms: 2_000,
        corruption_threshold: Decimal::from_str("5").unwrap(),
        decay_mode: DecayMode::None,
        poll_interval_secs: 0,
    }
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");

    let repo = Arc::new(Repository::new(pool));
    let mock = Arc::new(MockMarketDataSource::new());
    let datasource: Arc<dyn MarketDataSource> = mock.clone();
    let config = test_config();
    let decay = decay_for_mode(config.decay_mode);
    let refresher = Arc::new(Refresher::new(
        datasource.clone(),
        repo.clone(),
        config.clone(),
        decay.clone(),
    ));
    let state = AppState::new(repo, refresher, datasource, decay, config);
    let app = api::create_router(state.clone());

    TestApp {
        app,
        state,
        mock,
        _temp: temp_dir,
    }
}

fn market(price: &str, mc: &str) -> MarketData {
    MarketData {
        price: Decimal::from_str(price).unwrap(),
        market_cap: Decimal::from_str(mc).unwrap(),
        liquidity: Decimal::from_str("10000").unwrap(),
        volume_24h: Decimal::from_str("5000").unwrap(),
    }
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_create_call_captures_entry_from_feed() {
    let test_app = setup_test_app().await;
    test_app.mock.set_market_data("mint1", market("0.5", "250000"));

    let (status, body) = post_json(
        test_app.app.clone(),
        "/api/calls",
        serde_json::json!({
            "telegramId": 42,
            "contractAddress": "mint1",
            "username": "trencher",
            "isLinked": false
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["contractAddress"], "mint1");
    assert_eq!(data["prices"]["entry"].as_f64(), Some(0.5));
    assert_eq!(data["prices"]["entryMarketCap"].as_f64(), Some(250000.0));
    assert_eq!(data["prices"]["current"].as_f64(), Some(0.5));
    assert_eq!(data["performance"]["pnlPercent"].as_f64(), Some(0.0));
    // 1.0x sits in the [1, 1.3) tier: -1, unscaled by market cap.
    assert_eq!(data["performance"]["score"].as_f64(), Some(-1.0));
    assert_eq!(data["user"]["username"], "trencher");
}

#[tokio::test]
async fn test_create_call_unknown_token_404() {
    let test_app = setup_test_app().await;

    let (status, body) = post_json(
        test_app.app.clone(),
        "/api/calls",
        serde_json::json!({
            "telegramId": 42,
            "contractAddress": "unknown-mint"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("unknown-mint"));
}

#[tokio::test]
async fn test_create_call_duplicate_conflict() {
    let test_app = setup_test_app().await;
    test_app.mock.set_market_data("mint1", market("0.5", "250000"));

    let body = serde_json::json!({
        "telegramId": 42,
        "contractAddress": "mint1"
    });
    let (status, _) = post_json(test_app.app.clone(), "/api/calls", body.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) = post_json(test_app.app.clone(), "/api/calls", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response["success"], false);
}

#[tokio::test]
async fn test_create_call_blank_contract_rejected() {
    let test_app = setup_test_app().await;

    let (status, _) = post_json(
        test_app.app.clone(),
        "/api/calls",
        serde_json::json!({
            "telegramId": 42,
            "contractAddress": "   "
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_calls_sorted_by_pnl_then_recency() {
    let test_app = setup_test_app().await;

    for (telegram_id, contract, pnl) in [(1, "mint1", "50"), (2, "mint2", "200"), (3, "mint3", "-20")] {
        test_app
            .state
            .repo
            .upsert_caller(&Caller::anonymous(TelegramId::new(telegram_id)))
            .await
            .unwrap();
        let mut call = Call::new(
            TelegramId::new(telegram_id),
            ContractAddress::new(contract.to_string()),
            TokenMeta {
                symbol: format!("T{}", telegram_id),
                name: "Test Token".to_string(),
                image: None,
            },
            &market("1", "100000"),
            Utc::now(),
        );
        call.pnl_percent = Decimal::from_str(pnl).unwrap();
        test_app.state.repo.insert_call(&call).await.unwrap();
    }

    let (status, body) = get(test_app.app.clone(), "/api/calls").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let calls = body["data"].as_array().unwrap();
    assert_eq!(calls.len(), 3);
    let pnls: Vec<f64> = calls
        .iter()
        .map(|c| c["performance"]["pnlPercent"].as_f64().unwrap())
        .collect();
    assert_eq!(pnls, vec![200.0, 50.0, -20.0]);
}

#[tokio::test]
async fn test_get_call_by_contract() {
    let test_app = setup_test_app().await;
    test_app.mock.set_market_data("mint1", market("0.5", "250000"));

    post_json(
        test_app.app.clone(),
        "/api/calls",
        serde_json::json!({
            "telegramId": 42,
            "contractAddress": "mint1",
            "twitterUsername": "trencher_x",
            "isLinked": true
        }),
    )
    .await;

    let (status, body) = get(test_app.app.clone(), "/api/calls/mint1").await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["user"]["isLinked"], true);
    assert_eq!(data["user"]["twitterInfo"]["twitterUsername"], "trencher_x");
    assert_eq!(data["token"]["symbol"], "MOCK");
}

#[tokio::test]
async fn test_get_call_unknown_contract_404() {
    let test_app = setup_test_app().await;

    let (status, body) = get(test_app.app.clone(), "/api/calls/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
