use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use banter_api::{
    BanterError, StatusPayload, TokenExchangeWorkflow,
    config::Config,
    db::{BanterStorage, connect},
    plaid::{PlaidApi, PlaidClientFactory, TokenExchange},
    router::{BanterState, banter_router},
};
use std::{
    fs,
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

struct AcceptingPlaid;

#[async_trait]
impl PlaidApi for AcceptingPlaid {
    async fn exchange_public_token(
        &self,
        public_token: &str,
    ) -> Result<TokenExchange, BanterError> {
        if public_token.starts_with("public-") {
            Ok(TokenExchange {
                access_token: "access-sandbox-1".to_string(),
                item_id: "item-1".to_string(),
                request_id: None,
            })
        } else {
            Err(BanterError::UpstreamStatus(StatusCode::BAD_REQUEST))
        }
    }
}

struct Factory {
    broken: bool,
}

impl PlaidClientFactory for Factory {
    fn build(&self) -> Result<Arc<dyn PlaidApi>, BanterError> {
        if self.broken {
            return Err(BanterError::InvalidPlaidEnvironment("staging".to_string()));
        }
        Ok(Arc::new(AcceptingPlaid))
    }
}

fn app(workflow: TokenExchangeWorkflow) -> Router {
    banter_router(BanterState::new(workflow), &Config::default())
}

fn plaid_app() -> Router {
    app(TokenExchangeWorkflow::new(Arc::new(Factory { broken: false })))
}

fn temp_db_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "banter-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    path
}

async fn post(app: Router, body: impl Into<Body>) -> (StatusCode, StatusPayload) {
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/plaid")
                .header("content-type", "application/json")
                .body(body.into())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let payload = serde_json::from_slice(&body).expect("response body was not a status payload");
    (status, payload)
}

#[tokio::test]
async fn valid_token_returns_200_with_code_2002() {
    let (status, payload) = post(
        plaid_app(),
        r#"{"public_token":"public-sandbox-1","link_session_id":"sess-1"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload.status, "200");
    assert_eq!(payload.code, "2002");
}

#[tokio::test]
async fn missing_token_returns_400() {
    let (status, payload) = post(plaid_app(), r#"{"link_session_id":"sess-1"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload.code, "4001");
    assert!(!payload.message.is_empty());
}

#[tokio::test]
async fn invalid_json_returns_400() {
    let (status, payload) = post(plaid_app(), "{public_token:").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload.code, "4000");
}

#[tokio::test]
async fn rejected_token_returns_4002() {
    let (status, payload) = post(plaid_app(), r#"{"public_token":"garbage"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload.code, "4002");
    assert!(!payload.message.contains("UpstreamStatus"));
}

#[tokio::test]
async fn client_init_failure_returns_500() {
    let app = app(TokenExchangeWorkflow::new(Arc::new(Factory { broken: true })));
    let (status, payload) = post(app, r#"{"public_token":"public-sandbox-1"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payload.status, "500");
    assert_eq!(payload.code, "5001");
}

#[tokio::test]
async fn oversized_body_returns_413() {
    let limit = Config::default().body_limit_bytes;
    let padding = "a".repeat(limit + 1024);
    let body = format!(r#"{{"public_token":"public-sandbox-1","padding":"{padding}"}}"#);

    let resp = plaid_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/plaid")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn persisted_exchange_deduplicates_institutions_on_disk() {
    let path = temp_db_path("route");
    let database_url = format!("sqlite:{}", path.display());
    let storage = BanterStorage::new(connect(&database_url).await.expect("connect failed"));
    storage.init_schema().await.expect("schema init failed");

    let workflow = TokenExchangeWorkflow::new(Arc::new(Factory { broken: false }))
        .with_persistence(storage.clone());
    let app = app(workflow);
    let body = r#"{
        "public_token": "public-sandbox-1",
        "institution": {"institution_id": "ins_109508", "name": "First Platypus Bank"},
        "accounts": [{"id": "acc_1", "name": "Plaid Checking"}]
    }"#;

    for _ in 0..2 {
        let (status, payload) = post(app.clone(), body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.code, "2002");
    }

    assert_eq!(storage.list_institutions().await.unwrap().len(), 1);
    assert_eq!(storage.list_accounts().await.unwrap().len(), 1);

    storage.pool().close().await;
    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn unexpected_link_metadata_does_not_block_the_exchange() {
    let (status, payload) = post(
        plaid_app(),
        r#"{"public_token":"public-sandbox-1","link_session_id":42,"accounts":null}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload.code, "2002");
}
