//! Pool loading over HTTP against a mock server.

use card_draw::config::AppConfig;
use card_draw::error::{LoadError, LoadErrorKind};
use card_draw::model::{LoadStatus, Mode};
use card_draw::session::{LoadOutcome, SessionController};
use card_draw::source::{fetch_with_timeout, CardSource, HttpSource};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_for(server: &MockServer) -> HttpSource {
    HttpSource::new(&server.uri()).unwrap()
}

#[tokio::test]
async fn shared_pool_is_fetched_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards_filled.json"))
        .and(header("cache-control", "no-store"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "Fool", "description": "begin", "image": "fool.png"},
            {"name": "Star"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let mut session = SessionController::new(AppConfig::default());

    assert_eq!(
        session.enter_mode(&source, Mode::Simple).await,
        LoadOutcome::Applied { count: 2 }
    );
    // Divination shares the simple source key, and re-entering simple is a cache hit.
    assert_eq!(
        session.enter_mode(&source, Mode::Divination).await,
        LoadOutcome::Applied { count: 2 }
    );
    assert_eq!(session.spread_order().len(), 2);
    assert_eq!(
        session.enter_mode(&source, Mode::Simple).await,
        LoadOutcome::Applied { count: 2 }
    );

    let card = session.draw_random().unwrap();
    if card.title == "Fool" {
        assert_eq!(card.image_url.as_deref(), Some("imgs/fool.png"));
    }
}

#[tokio::test]
async fn missing_pool_marks_session_failed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hidden_words_en.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let mut session = SessionController::new(AppConfig::default());

    let outcome = session
        .enter_mode(&source, Mode::HiddenText("en".into()))
        .await;
    assert_eq!(outcome, LoadOutcome::Failed);
    assert!(matches!(session.status(), LoadStatus::Failed { .. }));
    assert!(session.draw_random().is_none());

    let snap = session.snapshot();
    assert!(!snap.loading);
    assert_eq!(
        snap.status_message,
        "資料載入失敗，請確認網頁目錄下是否有 hidden_words_en.json"
    );
}

#[tokio::test]
async fn non_array_payload_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards_filled.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cards": []
        })))
        .mount(&server)
        .await;

    let source = source_for(&server);
    let err = source.fetch("cards_filled.json").await.unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::MalformedData);

    let mut session = SessionController::new(AppConfig::default());
    assert_eq!(
        session.enter_mode(&source, Mode::Simple).await,
        LoadOutcome::Failed
    );
    match session.status() {
        LoadStatus::Failed { kind, error, .. } => {
            assert_eq!(*kind, LoadErrorKind::MalformedData);
            assert!(error.contains("expected a JSON array"));
        }
        other => panic!("unexpected status: {other:?}"),
    }
}

#[tokio::test]
async fn keys_resolve_under_base_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/static/hidden_words_zh.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 7, "description": "汝當..."}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpSource::new(&format!("{}/static", server.uri())).unwrap();
    let mut session = SessionController::new(AppConfig::default());

    assert_eq!(
        session
            .enter_mode(&source, Mode::HiddenText("zh".into()))
            .await,
        LoadOutcome::Applied { count: 1 }
    );
    let card = session.draw_random().unwrap();
    assert_eq!(card.title, "編號 7");
    assert_eq!(card.description, "汝當...");
    assert!(card.image_url.is_none());
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards_filled.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let source = source_for(&server);
    let mut cfg = AppConfig::default();
    cfg.fetch_timeout = Duration::from_millis(100);
    let mut session = SessionController::new(cfg);

    assert_eq!(
        session.enter_mode(&source, Mode::Simple).await,
        LoadOutcome::Failed
    );
    assert!(!session.is_loading());
    match session.status() {
        LoadStatus::Failed { kind, error, .. } => {
            assert_eq!(*kind, LoadErrorKind::Fetch);
            assert!(error.starts_with("fetch timed out"), "got: {error}");
        }
        other => panic!("unexpected status: {other:?}"),
    }

    // The HTTP client itself never gives up first.
    let err = fetch_with_timeout(&source, "cards_filled.json", Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Timeout(_)), "got: {err:?}");
}

#[tokio::test]
async fn odd_card_records_still_load() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cards_filled.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "A", "description": "ok"},
            {"name": "B", "description": 5},
            {"name": true},
            null
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let mut session = SessionController::new(AppConfig::default());

    assert_eq!(
        session.enter_mode(&source, Mode::Simple).await,
        LoadOutcome::Applied { count: 4 }
    );
    assert_eq!(session.pool()[1].description(), "5");

    let snap = session.snapshot();
    assert_eq!(
        snap.card_list,
        vec!["A", "B", "未命名卡牌 #3", "未命名卡牌 #4"]
    );
}
