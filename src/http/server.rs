//! Handler set construction.
//!
//! # Responsibilities
//! - Map route patterns to handlers
//! - Wire up middleware (tracing, request ID, handler timeout)
//!
//! # Design Decisions
//! - Built explicitly and handed to the listener; no global router
//! - Unmatched routes fall through to axum's 404

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{any, MethodRouter};
use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::items::ItemCatalog;

/// Route table handed to the listener.
#[derive(Clone, Default)]
pub struct HandlerSet {
    router: Router,
}

impl HandlerSet {
    /// An empty handler set; every route answers 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// The service's public routes: `/` and `/v1/items`, for any method.
    pub fn with_default_routes(catalog: ItemCatalog) -> Self {
        let items = Router::new()
            .route("/v1/items", any(handlers::list_items))
            .with_state(Arc::new(catalog));

        let mut set = Self::new().route("/", any(handlers::index));
        set.router = set.router.merge(items);
        set
    }

    /// Add a route.
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        self.router = self.router.route(path, method_router);
        self
    }

    /// Finish the set into a router with middleware applied.
    ///
    /// Handlers running past `write_timeout` are answered with 408.
    pub(crate) fn into_router(self, write_timeout: Duration) -> Router {
        self.router
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                write_timeout,
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use tower::ServiceExt;

    fn router(set: HandlerSet) -> Router {
        set.into_router(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn index_answers_plain_text() {
        let response = router(HandlerSet::with_default_routes(ItemCatalog::default()))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
    }

    #[tokio::test]
    async fn public_routes_answer_any_method() {
        let router = router(HandlerSet::with_default_routes(ItemCatalog::default()));

        for (method, path) in [("POST", "/"), ("DELETE", "/v1/items")] {
            let response = router
                .clone()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri(path)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{method} {path}");
        }
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = router(HandlerSet::with_default_routes(ItemCatalog::default()))
            .oneshot(Request::get("/v2/nothing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn responses_carry_generated_request_id() {
        let response = router(HandlerSet::with_default_routes(ItemCatalog::default()))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn incoming_request_id_is_propagated() {
        let response = router(HandlerSet::with_default_routes(ItemCatalog::default()))
            .oneshot(
                Request::get("/")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test]
    async fn slow_handler_hits_write_timeout() {
        let set = HandlerSet::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                "late"
            }),
        );

        let response = set
            .into_router(Duration::from_millis(20))
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
