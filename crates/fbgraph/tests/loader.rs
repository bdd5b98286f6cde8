use std::collections::VecDeque;
use std::sync::Arc;

use fbgraph::client::{AccessToken, UserAccessToken};
use fbgraph::config::{GraphConfig, IngestPolicy};
use fbgraph::fbgraph_common::error::{AuthError, ClientError, TransportError};
use fbgraph::fbgraph_common::http_client::HttpClient;
use fbgraph::fbgraph_common::retry::RetryPolicy;
use fbgraph::fbgraph_object::{ErrorKind, ObjectError};
use fbgraph::{AppNotification, Application, EntityType, Error, FieldValue, Payment, RemoteLoader};
use http::{Method, Response as HttpResponse, StatusCode};
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct MockClient {
    // Queue of HTTP responses to pop for each send_http call
    queue: Arc<Mutex<VecDeque<HttpResponse<Vec<u8>>>>>,
    // Capture requests for assertions
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

fn json(status: StatusCode, body: serde_json::Value) -> HttpResponse<Vec<u8>> {
    HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(serde_json::to_vec(&body).unwrap())
        .unwrap()
}

fn graph_error(status: StatusCode, code: i64, kind: &str) -> HttpResponse<Vec<u8>> {
    json(
        status,
        serde_json::json!({"error": {"message": "nope", "type": kind, "code": code}}),
    )
}

fn graffiti() -> serde_json::Value {
    serde_json::json!({"id": "2439131959", "name": "Graffiti ", "namespace": "graffitiwall"})
}

fn query_of(req: &http::Request<Vec<u8>>) -> String {
    req.uri().query().unwrap_or_default().to_owned()
}

#[tokio::test]
async fn loads_public_application() {
    let client = MockClient::default();
    client.push(json(StatusCode::OK, graffiti())).await;

    let loader = RemoteLoader::new(client.clone());
    let record = loader
        .load(EntityType::Application, "2439131959", &["name", "namespace"])
        .await
        .unwrap();

    assert_eq!(record.name(), "Application");
    assert!(!record.is_new());
    assert!(!record.is_modified());
    assert_eq!(
        record.get_field_value("namespace").unwrap(),
        Some(&FieldValue::from("graffitiwall"))
    );
    assert_eq!(record.get_field_value("name").unwrap().unwrap().as_str(), Some("Graffiti "));

    let log = client.take_log().await;
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].method(), Method::GET);
    assert_eq!(log[0].uri().path(), "/2439131959");
    assert_eq!(query_of(&log[0]), "fields=name%2Cnamespace");
    assert!(log[0].headers().get(http::header::AUTHORIZATION).is_none());
}

#[tokio::test]
async fn tags_are_normalized() {
    let client = MockClient::default();
    client
        .push(json(StatusCode::OK, serde_json::json!({"id": "55", "quantity": 2})))
        .await;
    let record = RemoteLoader::new(client)
        .load(" Payments ", "55", &[])
        .await
        .unwrap();
    assert_eq!(record.name(), "Payment");
}

#[tokio::test]
async fn validates_before_sending() {
    let client = MockClient::default();
    let loader = RemoteLoader::new(client.clone());

    let err = loader
        .load(EntityType::Application, "1", &["invalidfield"])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Object(ObjectError::UnknownField { .. })));

    let err = loader.load("photo", "1", &[]).await.unwrap_err();
    assert!(matches!(&err, Error::Object(e) if e.kind() == ErrorKind::UnsupportedObject));

    // `installed` needs the app token and there is no credential at all
    let err = loader
        .load(EntityType::User, "4", &["name", "installed"])
        .await
        .unwrap_err();
    assert!(matches!(err.as_auth(), Some(AuthError::NotAuthenticated)));

    assert!(client.take_log().await.is_empty());
}

#[tokio::test]
async fn strict_ingestion_rejects_unknown_keys() {
    let client = MockClient::default();
    let mut body = graffiti();
    body["shiny_new_field"] = serde_json::json!(true);
    client.push(json(StatusCode::OK, body.clone())).await;
    client.push(json(StatusCode::OK, body)).await;

    let strict = RemoteLoader::new(client.clone());
    let err = strict.load("application", "2439131959", &[]).await.unwrap_err();
    assert!(
        matches!(&err, Error::Object(ObjectError::UnknownField { field, .. }) if field == "shiny_new_field")
    );

    let permissive = RemoteLoader::new(client)
        .with_config(GraphConfig::new().ingest(IngestPolicy::Permissive).build())
        .unwrap();
    let record = permissive.load("application", "2439131959", &[]).await.unwrap();
    assert_eq!(record.values().count(), 3);
}

#[tokio::test]
async fn type_errors_fail_in_both_modes() {
    let client = MockClient::default();
    client
        .push(json(StatusCode::OK, serde_json::json!({"id": "1", "app_domains": "example.com"})))
        .await;
    let loader = RemoteLoader::new(client)
        .with_config(GraphConfig::new().ingest(IngestPolicy::Permissive).build())
        .unwrap();
    let err = loader.load("application", "1", &[]).await.unwrap_err();
    assert!(matches!(&err, Error::Object(e) if e.kind() == ErrorKind::InvalidType));
}

#[tokio::test]
async fn unusable_responses_are_invalid_nodes() {
    let client = MockClient::default();
    client
        .push(graph_error(StatusCode::BAD_REQUEST, 100, "GraphMethodException"))
        .await;
    client
        .push(HttpResponse::builder().status(StatusCode::NOT_FOUND).body(b"gone".to_vec()).unwrap())
        .await;
    client
        .push(HttpResponse::builder().status(StatusCode::OK).body(b"false".to_vec()).unwrap())
        .await;
    client
        .push(HttpResponse::builder().status(StatusCode::OK).body(b"<html>".to_vec()).unwrap())
        .await;

    let loader = RemoteLoader::new(client);
    for expected in [
        StatusCode::BAD_REQUEST,
        StatusCode::NOT_FOUND,
        StatusCode::OK,
        StatusCode::OK,
    ] {
        match loader.load("user", "404", &[]).await {
            Err(Error::InvalidNode { id, status, .. }) => {
                assert_eq!(id, "404");
                assert_eq!(status, expected);
            }
            other => panic!("expected InvalidNode, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn permission_errors_keep_their_shape() {
    let client = MockClient::default();
    client
        .push(graph_error(StatusCode::FORBIDDEN, 200, "OAuthException"))
        .await;
    let loader = RemoteLoader::new(client).with_token(UserAccessToken::new("EAAB"));
    let err = loader.load("user", "4", &["email"]).await.unwrap_err();
    assert!(err.is_auth());
    assert!(matches!(
        err.as_auth(),
        Some(AuthError::InsufficientPermissions { .. })
    ));
}

#[tokio::test]
async fn expired_token_is_invalidated_and_retried_once() {
    let client = MockClient::default();
    client
        .push(graph_error(StatusCode::BAD_REQUEST, 190, "OAuthException"))
        .await;
    client
        .push(json(StatusCode::OK, serde_json::json!({"access_token": "fresh"})))
        .await;
    client.push(json(StatusCode::OK, graffiti())).await;

    let token = Arc::new(
        fbgraph::AppAccessToken::new(client.clone(), "2439131959", "s3cr3t").with_token("old"),
    );
    let loader = RemoteLoader::new(client.clone()).with_token(token.clone());
    let app: Application = loader.load_typed("2439131959", &["name"]).await.unwrap();
    assert_eq!(app.namespace(), Some("graffitiwall"));
    assert!(!token.is_stale().await);

    let log = client.take_log().await;
    assert_eq!(log.len(), 3);
    let auth = |req: &http::Request<Vec<u8>>| {
        req.headers()
            .get(http::header::AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_owned())
    };
    assert_eq!(auth(&log[0]).as_deref(), Some("Bearer old"));
    assert_eq!(log[1].uri().path(), "/oauth/access_token");
    assert_eq!(auth(&log[2]).as_deref(), Some("Bearer fresh"));
}

#[tokio::test]
async fn second_expiry_is_reported() {
    let client = MockClient::default();
    client
        .push(graph_error(StatusCode::UNAUTHORIZED, 190, "OAuthException"))
        .await;
    let token = Arc::new(UserAccessToken::new("EAAB"));
    let loader = RemoteLoader::new(client.clone()).with_token(token.clone());

    let err = loader.load("user", "me", &["name"]).await.unwrap_err();
    assert!(matches!(err.as_auth(), Some(AuthError::TokenExpired)));
    assert!(token.is_stale().await);
    assert_eq!(client.take_log().await.len(), 1);
}

#[tokio::test]
async fn refresh_replaces_values() {
    let client = MockClient::default();
    client.push(json(StatusCode::OK, graffiti())).await;
    client
        .push(json(StatusCode::OK, serde_json::json!({"id": "2439131959", "name": "Graffiti"})))
        .await;

    let loader = RemoteLoader::new(client.clone());
    let mut record = loader.load("application", "2439131959", &[]).await.unwrap();
    record.set_field_value("name", "Local edit").unwrap();
    assert!(record.is_modified());

    loader.refresh(&mut record, &["name"]).await.unwrap();
    assert!(!record.is_modified());
    assert_eq!(record.get_field_value("name").unwrap().unwrap().as_str(), Some("Graffiti"));
    assert_eq!(record.get_field_value("namespace").unwrap(), None);

    let mut blank = loader.factory().create("user").unwrap();
    assert!(matches!(
        loader.refresh(&mut blank, &[]).await,
        Err(Error::MissingId { entity: "User" })
    ));
}

#[tokio::test]
async fn typed_loads_check_the_type() {
    let client = MockClient::default();
    client
        .push(json(StatusCode::OK, serde_json::json!({"id": "9", "quantity": "3", "test": 1})))
        .await;
    let payment: Payment = RemoteLoader::new(client).load_typed("9", &[]).await.unwrap();
    assert_eq!(payment.quantity(), Some(3));
    assert_eq!(payment.test(), Some(true));
}

#[tokio::test]
async fn versioned_base_url() {
    let client = MockClient::default();
    client.push(json(StatusCode::OK, graffiti())).await;
    let loader = RemoteLoader::new(client.clone())
        .with_config(GraphConfig::new().api_version("v19.0").build())
        .unwrap();
    loader.load("application", "2439131959", &[]).await.unwrap();
    assert_eq!(client.take_log().await[0].uri().path(), "/v19.0/2439131959");
}

#[tokio::test]
async fn rejects_bad_config() {
    let bad = GraphConfig::new()
        .retry(RetryPolicy::new().max_attempts(0).build())
        .build();
    assert!(matches!(
        RemoteLoader::new(MockClient::default()).with_config(bad),
        Err(Error::Config(_))
    ));
}

#[derive(Clone, Default)]
struct DeadClient;

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
struct Refused;

impl From<Refused> for TransportError {
    fn from(e: Refused) -> Self {
        TransportError::Connect(e.to_string())
    }
}

impl HttpClient for DeadClient {
    type Error = Refused;

    async fn send_http(
        &self,
        _request: http::Request<Vec<u8>>,
    ) -> core::result::Result<http::Response<Vec<u8>>, Self::Error> {
        Err(Refused)
    }
}

#[tokio::test(start_paused = true)]
async fn transport_exhaustion_is_retryable() {
    let loader = RemoteLoader::new(DeadClient)
        .with_config(
            GraphConfig::new()
                .retry(RetryPolicy::new().max_attempts(2).build())
                .build(),
        )
        .unwrap();
    let err = loader.load("user", "4", &[]).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(
        err,
        Error::Client(ClientError::Transport(TransportError::Exhausted { attempts: 2, .. }))
    ));
}

#[derive(Clone, Default)]
struct MalformedClient {
    calls: Arc<Mutex<u32>>,
}

#[derive(Debug, thiserror::Error)]
#[error("header value contains a newline")]
struct BadHeader;

impl From<BadHeader> for TransportError {
    fn from(e: BadHeader) -> Self {
        TransportError::InvalidRequest(e.to_string())
    }
}

impl HttpClient for MalformedClient {
    type Error = BadHeader;

    async fn send_http(
        &self,
        _request: http::Request<Vec<u8>>,
    ) -> core::result::Result<http::Response<Vec<u8>>, Self::Error> {
        *self.calls.lock().await += 1;
        Err(BadHeader)
    }
}

#[tokio::test]
async fn invalid_requests_fail_without_retry() {
    let client = MalformedClient::default();
    let loader = RemoteLoader::new(client.clone());
    let err = loader.load("user", "4", &[]).await.unwrap_err();
    assert!(!err.is_retryable());
    assert!(matches!(
        err,
        Error::Client(ClientError::Transport(TransportError::InvalidRequest(_)))
    ));
    assert_eq!(*client.calls.lock().await, 1);
}

#[tokio::test]
async fn fetches_subscriptions_with_the_app_token() {
    let client = MockClient::default();
    client
        .push(json(
            StatusCode::OK,
            serde_json::json!({"data": [
                {"object": "user", "callback_url": "https://cb.example/u", "fields": ["name", "email"], "active": true},
                {"object": "permissions", "callback_url": "https://cb.example/p", "fields": ["email"], "active": true}
            ]}),
        ))
        .await;

    let mut app = Application::with_credentials("2439131959", "s3cr3t");
    let token = fbgraph::AppAccessToken::for_application(client.clone(), &app)
        .unwrap()
        .with_token("2439131959|s3cr3t");
    let loader = RemoteLoader::new(client.clone()).with_token(token);

    loader.fetch_subscriptions(&mut app).await.unwrap();
    assert_eq!(app.subscriptions().len(), 2);
    assert!(app.subscriptions().get("user").unwrap().fields().contains("email"));

    let log = client.take_log().await;
    assert_eq!(log[0].uri().path(), "/2439131959/subscriptions");
    assert_eq!(
        log[0].headers().get(http::header::AUTHORIZATION).unwrap(),
        "Bearer 2439131959|s3cr3t"
    );
}

#[tokio::test]
async fn subscriptions_need_a_token() {
    let loader = RemoteLoader::new(MockClient::default());
    let err = loader.subscriptions("2439131959").await.unwrap_err();
    assert!(matches!(err.as_auth(), Some(AuthError::NotAuthenticated)));
}

#[tokio::test]
async fn sends_notifications() {
    let client = MockClient::default();
    client
        .push(json(StatusCode::OK, serde_json::json!({"success": true})))
        .await;
    let loader = RemoteLoader::new(client.clone()).with_token(UserAccessToken::new("123|abc"));

    let note = AppNotification::new("100004", "Your crops are ready")
        .unwrap()
        .param("farm", "north");
    assert!(note.send(&loader).await.unwrap());

    let log = client.take_log().await;
    assert_eq!(log[0].method(), Method::POST);
    assert_eq!(log[0].uri().path(), "/100004/notifications");
    let query = query_of(&log[0]);
    assert!(query.contains("template=Your+crops+are+ready"), "{query}");
    assert!(query.contains("href=%3Ffarm%3Dnorth"), "{query}");

    let empty = AppNotification::new("100004", "").unwrap();
    assert!(matches!(
        empty.send(&loader).await,
        Err(Error::InvalidNotification { .. })
    ));
}
