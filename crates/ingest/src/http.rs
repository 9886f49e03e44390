use crate::service::IngestionService;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use posprint_messaging::Publisher;
use posprint_store::MessageStore;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

#[derive(Serialize)]
struct ApiMessage {
    message: &'static str,
}

/// Resolves the origin identifier for a request: the first entry of the
/// forwarded-for chain when present, otherwise the socket peer address.
#[must_use]
pub fn resolve_source_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    peer.map(|addr| addr.ip().to_string())
}

async fn submit_handler<S, P>(
    State(service): State<Arc<IngestionService<S, P>>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: String,
) -> Response
where
    S: MessageStore,
    P: Publisher,
{
    let source_ip = resolve_source_ip(&headers, Some(peer));

    match service.ingest(&body, source_ip.as_deref()).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(ApiMessage {
                message: "Message received.",
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "submission rejected");
            (
                e.status(),
                Json(ApiMessage {
                    message: e.client_message(),
                }),
            )
                .into_response()
        }
    }
}

async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Builds the public router: `POST /` for submissions, `OPTIONS /` for CORS
/// preflight, permissive CORS headers on every response.
pub fn create_router<S, P>(service: IngestionService<S, P>) -> Router
where
    S: MessageStore,
    P: Publisher,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([Method::OPTIONS, Method::POST]);

    Router::new()
        .route("/", post(submit_handler::<S, P>).options(preflight_handler))
        .layer(cors)
        .with_state(Arc::new(service))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::RateLimitConfig;
    use crate::service::IngestionServiceOptions;

    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;
    use bytes::Bytes;
    use posprint_messaging::{
        PrintNotification, Subscription, SubscriptionHandler, SubscriptionHandlerError,
    };
    use posprint_messaging_memory::{
        MemoryPublisher, MemorySubscription, MemorySubscriptionOptions,
    };
    use posprint_store_memory::MemoryMessageStore;
    use serde_json::json;
    use tower::ServiceExt;

    fn test_router(store: MemoryMessageStore, topic: &str) -> Router {
        let service = IngestionService::new(IngestionServiceOptions {
            store,
            publisher: MemoryPublisher::new(),
            topic: topic.to_string(),
            rate_limit: RateLimitConfig::default(),
        });

        create_router(service).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
    }

    fn submission(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_valid_submission_returns_201() {
        let store = MemoryMessageStore::new();
        let router = test_router(store.clone(), "posprint/messages");

        let response = router
            .oneshot(submission(r#"{"email":"a@b.c","message":"hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Message received." })
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_oversized_message_returns_400() {
        let store = MemoryMessageStore::new();
        let router = test_router(store.clone(), "posprint/messages");
        let message = "x".repeat(1025);

        let response = router
            .oneshot(submission(&format!(
                r#"{{"email":"a@b.c","message":"{message}"}}"#
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_rate_limit_returns_429() {
        let store = MemoryMessageStore::new();
        let router = test_router(store.clone(), "posprint/messages");

        for _ in 0..10 {
            let response = router
                .clone()
                .oneshot(submission(r#"{"email":"a@b.c","message":"hi"}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = router
            .oneshot(submission(r#"{"email":"a@b.c","message":"hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(store.len().await, 10);
    }

    #[tokio::test]
    async fn test_forwarded_for_takes_priority() {
        let store = MemoryMessageStore::new();
        let router = test_router(store.clone(), "posprint/messages");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Forwarded-For", "203.0.113.9, 192.0.2.1")
            .body(Body::from(r#"{"email":"a@b.c","message":"hi"}"#))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let count = store
            .count_for_origin_since(
                "203.0.113.9",
                chrono::Utc::now() - chrono::Duration::hours(1),
            )
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_preflight_returns_204() {
        let router = test_router(MemoryMessageStore::new(), "posprint/messages");

        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_accepted_message_is_published() {
        #[derive(Clone)]
        struct CaptureHandler {
            sender: tokio::sync::mpsc::Sender<Bytes>,
        }

        #[derive(Debug, thiserror::Error)]
        #[error("capture failed")]
        struct CaptureError;

        impl SubscriptionHandlerError for CaptureError {}

        #[async_trait::async_trait]
        impl SubscriptionHandler for CaptureHandler {
            type Error = CaptureError;

            async fn handle(&self, _topic: String, payload: Bytes) -> Result<(), Self::Error> {
                let _ = self.sender.send(payload).await;
                Ok(())
            }
        }

        // Unique topic: the in-memory topic map is process-global.
        let topic = "posprint/messages/publish-test";

        let (sender, mut received) = tokio::sync::mpsc::channel(1);
        let _subscription: MemorySubscription = Subscription::new(
            topic.to_string(),
            MemorySubscriptionOptions,
            CaptureHandler { sender },
        )
        .await
        .unwrap();

        let router = test_router(MemoryMessageStore::new(), topic);
        let response = router
            .oneshot(submission(r#"{"email":"a@b.c","message":"hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let payload = tokio::time::timeout(std::time::Duration::from_secs(1), received.recv())
            .await
            .unwrap()
            .unwrap();
        let notification = PrintNotification::try_from(payload).unwrap();

        assert_eq!(notification.email, "a@b.c");
        assert_eq!(notification.message, "hello");
        assert!(notification.received_at.is_some());

        // The payload never carries the origin address or message id.
        let bytes: Bytes = notification.try_into().unwrap();
        let raw: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(raw.get("sourceIp").is_none());
        assert!(raw.get("messageId").is_none());
    }
}
