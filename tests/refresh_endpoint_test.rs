use axum::http::StatusCode;
use callboard::api::{self, AppState};
use callboard::config::{Config, DecayMode};
use callboard::datasource::{MarketDataError, MarketDataSource, MockMarketDataSource};
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

fn now_ms() -> chrono::DateTime<Utc> {
    chrono::DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap()
}

async fn seed_call(test_app: &TestApp, telegram_id: i64, contract: &str, entry: &MarketData) -> Call {
    test_app
        .state
        .repo
        .upsert_caller(&Caller::anonymous(TelegramId::new(telegram_id)))
        .await
        .unwrap();
    let call = Call::new(
        TelegramId::new(telegram_id),
        ContractAddress::new(contract.to_string()),
        TokenMeta {
            symbol: "TST".to_string(),
            name: "Test Token".to_string(),
            image: None,
        },
        entry,
        now_ms(),
    );
    test_app.state.repo.insert_call(&call).await.unwrap();
    call
}

async fn post(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
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

#[tokio::test]
async fn test_refresh_contract_updates_performance() {
    let test_app = setup_test_app().await;
    let call = seed_call(&test_app, 1, "mint1", &market("1", "100000")).await;

    test_app.mock.set_market_data("mint1", market("2.5", "250000"));
    let (status, body) = post(test_app.app.clone(), "/api/refresh/mint1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["refreshedCount"], 1);

    let stored = test_app.state.repo.get_call(call.id).await.unwrap().unwrap();
    assert_eq!(stored.pnl_percent, Decimal::from_str("150").unwrap());
    assert_eq!(
        stored.locked_multiplier,
        Some(Decimal::from_str("2.5").unwrap())
    );
}

#[tokio::test]
async fn test_refresh_contract_unknown_404() {
    let test_app = setup_test_app().await;

    let (status, body) = post(test_app.app.clone(), "/api/refresh/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_refresh_contract_feed_down_502_keeps_values() {
    let test_app = setup_test_app().await;
    let call = seed_call(&test_app, 1, "mint1", &market("1", "100000")).await;
    test_app
        .mock
        .set_failure("mint1", MarketDataError::RateLimited);

    let (status, body) = post(test_app.app.clone(), "/api/refresh/mint1").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);

    let stored = test_app.state.repo.get_call(call.id).await.unwrap().unwrap();
    assert_eq!(stored, call);
}

#[tokio::test]
async fn test_refresh_all_reports_per_item_counts() {
    let test_app = setup_test_app().await;

    // 10 tracked tokens, 3 with a failing feed.
    let mut failed_calls = Vec::new();
    for i in 0..10 {
        let contract = format!("mint{}", i);
        let call = seed_call(&test_app, i, &contract, &market("1", "100000")).await;
        if i < 3 {
            test_app
                .mock
                .set_failure(&contract, MarketDataError::RateLimited);
            failed_calls.push(call);
        } else {
            test_app
                .mock
                .set_market_data(&contract, market("1.5", "150000"));
        }
    }

    let (status, body) = post(test_app.app.clone(), "/api/refresh-all").await;

    // Partial failure is still an overall success.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["refreshedCount"], 7);
    assert_eq!(body["data"]["errorCount"], 3);
    assert_eq!(body["data"]["skippedCount"], 0);

    // Failed calls keep their prior values untouched.
    for call in failed_calls {
        let stored = test_app.state.repo.get_call(call.id).await.unwrap().unwrap();
        assert_eq!(stored, call);
    }
}

#[tokio::test]
async fn test_refresh_all_empty_is_success() {
    let test_app = setup_test_app().await;

    let (status, body) = post(test_app.app.clone(), "/api/refresh-all").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["refreshedCount"], 0);
    assert_eq!(body["data"]["errorCount"], 0);
}

#[tokio::test]
async fn test_refresh_appends_snapshots_for_charting() {
    let test_app = setup_test_app().await;
    seed_call(&test_app, 1, "mint1", &market("1", "100000")).await;

    test_app.mock.set_market_data("mint1", market("1.2", "120000"));
    post(test_app.app.clone(), "/api/refresh/mint1").await;

    let snapshots = test_app
        .state
        .repo
        .query_snapshots(
            &ContractAddress::new("mint1".to_string()),
            Utc::now() - chrono::Duration::hours(1),
        )
        .await
        .unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].price, Decimal::from_str("1.2").unwrap());
}
