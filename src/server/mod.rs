//! HTTP front end of the registry.
//!
//! Speaks the subset of the DynamoDB JSON 1.0 protocol that covers table
//! management, so the stock AWS SDK and CLI work against it unchanged.

mod handlers;

pub use handlers::{AMZ_JSON_CONTENT_TYPE, REQUEST_ID_HEADER, TARGET_HEADER, TARGET_PREFIX};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::errors::{Error, Result};
use crate::registry::TableRegistry;

/// How long `shutdown` waits for open connections before aborting.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub fn registry_router(registry: Arc<TableRegistry>) -> Router {
    Router::new()
        .route("/", get(handlers::health).post(handlers::dispatch))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// A running registry server.
pub struct RegistryServer {
    local_addr: SocketAddr,
    registry: Arc<TableRegistry>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RegistryServer {
    /// Bind `host:port` and start serving. Port 0 picks a free port.
    pub async fn start(host: &str, port: u16, registry: Arc<TableRegistry>) -> Result<Self> {
        let unavailable = |message: String| Error::RegistryUnavailable {
            addr: format!("{}:{}", host, port),
            message,
        };

        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| unavailable(format!("failed to bind: {}", e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| unavailable(format!("failed to read listener addr: {}", e)))?;

        let cancel = CancellationToken::new();
        let app = registry_router(Arc::clone(&registry));
        let shutdown = cancel.clone();
        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await });
            if let Err(e) = server.await {
                warn!(error = %e, "registry server stopped with error");
            }
        });

        info!(addr = %local_addr, region = registry.region(), "registry listening");
        Ok(Self {
            local_addr,
            registry,
            cancel,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `http://host:port` of the bound socket, with wildcard hosts mapped to
    /// loopback.
    pub fn endpoint_url(&self) -> String {
        let ip = self.local_addr.ip();
        if ip.is_unspecified() {
            format!("http://localhost:{}", self.local_addr.port())
        } else {
            format!("http://{}", self.local_addr)
        }
    }

    pub fn registry(&self) -> &Arc<TableRegistry> {
        &self.registry
    }

    /// Stop accepting connections, drain open ones, then stop the registry's
    /// lifecycle timers.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut self.task)
            .await
            .is_err()
        {
            warn!("registry server did not drain in time, aborting");
            self.task.abort();
        }
        self.registry.shutdown().await;
        info!(addr = %self.local_addr, "registry stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn call(router: &Router, target: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(TARGET_HEADER, format!("{}{}", TARGET_PREFIX, target))
            .header("content-type", AMZ_JSON_CONTENT_TYPE)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            AMZ_JSON_CONTENT_TYPE
        );
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn users() -> Value {
        json!({
            "TableName": "Users",
            "AttributeDefinitions": [{"AttributeName": "id", "AttributeType": "S"}],
            "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}],
            "BillingMode": "PAY_PER_REQUEST"
        })
    }

    #[tokio::test]
    async fn test_create_list_describe_delete() {
        let router = registry_router(Arc::new(TableRegistry::default()));

        let (status, body) = call(&router, "CreateTable", users()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["TableDescription"]["TableName"], "Users");
        assert_eq!(body["TableDescription"]["TableStatus"], "CREATING");

        let (_, body) = call(&router, "ListTables", json!({})).await;
        assert_eq!(body["TableNames"], json!(["Users"]));

        let (status, body) = call(&router, "DescribeTable", json!({"TableName": "Users"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Table"]["TableStatus"], "ACTIVE");

        let (status, body) = call(&router, "DeleteTable", json!({"TableName": "Users"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["TableDescription"]["TableStatus"], "DELETING");

        let (_, body) = call(&router, "ListTables", json!({})).await;
        assert_eq!(body["TableNames"], json!([]));
    }

    #[tokio::test]
    async fn test_error_envelopes() {
        let router = registry_router(Arc::new(TableRegistry::default()));
        call(&router, "CreateTable", users()).await;

        let (status, body) = call(&router, "CreateTable", users()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["__type"],
            "com.amazonaws.dynamodb.v20120810#ResourceInUseException"
        );

        let (status, body) = call(&router, "DescribeTable", json!({"TableName": "Nope"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["__type"],
            "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException"
        );

        let (_, body) = call(&router, "PutItem", json!({})).await;
        assert_eq!(
            body["__type"],
            "com.amazonaws.dynamodb.v20120810#UnknownOperationException"
        );

        let (_, body) = call(&router, "ListTables", json!({"Limit": 0})).await;
        assert_eq!(
            body["__type"],
            "com.amazonaws.dynamodb.v20120810#ValidationException"
        );
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let router = registry_router(Arc::new(TableRegistry::default()));
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(TARGET_HEADER, "DynamoDB_20120810.CreateTable")
            .body(Body::from("{ nope"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body["__type"],
            "com.amazonaws.dynamodb.v20120810#SerializationException"
        );
    }

    #[tokio::test]
    async fn test_list_tables_pagination() {
        let registry = Arc::new(TableRegistry::default());
        for name in ["Alpha", "Bravo", "Charlie"] {
            registry
                .create_table(crate::types::TableDefinition::with_hash_key(name, "id"))
                .unwrap();
        }
        let router = registry_router(registry);

        let (_, body) = call(&router, "ListTables", json!({"Limit": 2})).await;
        assert_eq!(body["TableNames"], json!(["Alpha", "Bravo"]));
        assert_eq!(body["LastEvaluatedTableName"], "Bravo");

        let (_, body) = call(
            &router,
            "ListTables",
            json!({"Limit": 2, "ExclusiveStartTableName": "Bravo"}),
        )
        .await;
        assert_eq!(body["TableNames"], json!(["Charlie"]));
        assert!(body.get("LastEvaluatedTableName").is_none());
    }

    #[tokio::test]
    async fn test_port_in_use_is_unavailable() {
        let registry = Arc::new(TableRegistry::default());
        let first = RegistryServer::start("127.0.0.1", 0, registry.clone())
            .await
            .unwrap();
        let port = first.local_addr().port();

        let err = RegistryServer::start("127.0.0.1", port, registry)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::RegistryUnavailable { .. }));
        first.shutdown().await;
    }
}
