use std::collections::VecDeque;
use std::sync::Arc;

use fbgraph::client::{AccessToken, AppAccessToken};
use fbgraph::config::GraphConfig;
use fbgraph::fbgraph_common::error::{AuthError, ClientError};
use fbgraph::fbgraph_common::http_client::HttpClient;
use fbgraph::fbgraph_object::ObjectError;
use fbgraph::Application;
use http::{Response as HttpResponse, StatusCode};
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct MockClient {
    queue: Arc<Mutex<VecDeque<HttpResponse<Vec<u8>>>>>,
    log: Arc<Mutex<Vec<http::Request<Vec<u8>>>>>,
}

impl MockClient {
    async fn push(&self, resp: HttpResponse<Vec<u8>>) {
        self.queue.lock().await.push_back(resp);
    }
    async fn take_log(&self) -> Vec<http::Request<Vec<u8>>> {
        let mut log = self.log.lock().await;
        let out = log.clone();
        log.clear();
        out
    }
}

impl HttpClient for MockClient {
    type Error = std::convert::Infallible;

    fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl core::future::Future<
        Output = core::result::Result<http::Response<Vec<u8>>, Self::Error>,
    > + Send {
        let log = self.log.clone();
        let queue = self.queue.clone();
        async move {
            log.lock().await.push(request);
            Ok(queue.lock().await.pop_front().expect("no queued response"))
        }
    }
}

fn body(status: StatusCode, bytes: &[u8]) -> HttpResponse<Vec<u8>> {
    HttpResponse::builder()
        .status(status)
        .body(bytes.to_vec())
        .unwrap()
}

#[tokio::test]
async fn fetches_once_then_caches() {
    let client = MockClient::default();
    client
        .push(body(StatusCode::OK, br#"{"access_token":"123|abc","token_type":"bearer"}"#))
        .await;

    let token = AppAccessToken::new(client.clone(), "123", "shh");
    assert!(token.is_stale().await);
    assert_eq!(token.token().await.unwrap(), "123|abc");
    assert_eq!(token.token().await.unwrap(), "123|abc");
    assert!(!token.is_stale().await);

    let log = client.take_log().await;
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].uri().path(), "/oauth/access_token");
    let query = log[0].uri().query().unwrap();
    assert!(query.contains("client_id=123"), "{query}");
    assert!(query.contains("client_secret=shh"), "{query}");
    assert!(query.contains("grant_type=client_credentials"), "{query}");
    assert!(log[0].headers().get(http::header::AUTHORIZATION).is_none());
}

#[tokio::test]
async fn invalidation_forces_a_new_fetch() {
    let client = MockClient::default();
    client.push(body(StatusCode::OK, b"access_token=first")).await;
    client.push(body(StatusCode::OK, b"access_token=second")).await;

    let token = AppAccessToken::new(client.clone(), "123", "shh");
    assert_eq!(token.token().await.unwrap(), "first");
    token.invalidate().await;
    assert!(token.is_stale().await);
    assert_eq!(token.token().await.unwrap(), "second");
    assert_eq!(client.take_log().await.len(), 2);
}

#[tokio::test]
async fn concurrent_callers_share_one_fetch() {
    let client = MockClient::default();
    client
        .push(body(StatusCode::OK, br#"{"access_token":"shared"}"#))
        .await;
    let token = Arc::new(AppAccessToken::new(client.clone(), "123", "shh"));

    let (a, b) = tokio::join!(token.token(), token.token());
    assert_eq!(a.unwrap(), "shared");
    assert_eq!(b.unwrap(), "shared");
    assert_eq!(client.take_log().await.len(), 1);
}

#[tokio::test]
async fn bad_secret_is_rejected() {
    let client = MockClient::default();
    client
        .push(body(
            StatusCode::BAD_REQUEST,
            br#"{"error":{"message":"Error validating client secret.","type":"OAuthException","code":1}}"#,
        ))
        .await;
    let token = AppAccessToken::new(client, "123", "wrong");
    assert!(matches!(
        token.token().await,
        Err(ClientError::Auth(AuthError::Rejected { .. }))
    ));
    assert!(token.is_stale().await);
}

#[tokio::test]
async fn needs_both_credentials() {
    let mut app = Application::new();
    app.set_id("123").unwrap();
    assert!(matches!(
        AppAccessToken::for_application(MockClient::default(), &app),
        Err(ObjectError::MissingCredentials { .. })
    ));
    app.set_secret("shh");
    let token = AppAccessToken::for_application(MockClient::default(), &app).unwrap();
    assert_eq!(token.app_id(), "123");
}

#[tokio::test]
async fn introspection_marks_dead_tokens_stale() {
    let client = MockClient::default();
    client
        .push(body(
            StatusCode::OK,
            br#"{"data":{"app_id":"123","application":"Graffiti","expires_at":0,"is_valid":true,"scopes":[]}}"#,
        ))
        .await;
    client
        .push(body(
            StatusCode::OK,
            br#"{"data":{"app_id":"123","is_valid":false,"expires_at":1000}}"#,
        ))
        .await;

    let token = AppAccessToken::new(client.clone(), "123", "shh")
        .with_config(&GraphConfig::new().api_version("v19.0").build())
        .unwrap()
        .with_token("123|abc");

    assert!(token.check().await.unwrap());
    assert!(!token.is_stale().await);
    assert_eq!(
        token.last_info().await.unwrap().application.as_deref(),
        Some("Graffiti")
    );

    assert!(!token.check().await.unwrap());
    assert!(token.is_stale().await);

    let log = client.take_log().await;
    assert_eq!(log[0].uri().path(), "/v19.0/debug_token");
    assert_eq!(log[0].uri().query(), Some("input_token=123%7Cabc"));
    assert_eq!(
        log[0].headers().get(http::header::AUTHORIZATION).unwrap(),
        "Bearer 123|abc"
    );
}
