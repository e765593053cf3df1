//! REST routes for pizzas and their comments.
//!
//! ```text
//! /api/pizzas                                 GET list, POST create (one or many)
//! /api/pizzas/:id                             GET, PUT, DELETE
//! /api/comments/:pizzaId                      POST comment
//! /api/comments/:pizzaId/:commentId           PUT reply, DELETE comment
//! /api/comments/:pizzaId/:commentId/:replyId  DELETE reply
//! /healthz                                    liveness, used by the sync agent
//! ```

mod comments;
mod error;
mod pizzas;

pub use error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::storage::PizzaStore;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn PizzaStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn PizzaStore>) -> Self {
        Self { store }
    }
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/api/pizzas",
            get(pizzas::get_all_pizza).post(pizzas::create_pizza),
        )
        .route(
            "/api/pizzas/:id",
            get(pizzas::get_pizza_by_id)
                .put(pizzas::update_pizza)
                .delete(pizzas::delete_pizza),
        )
        .route("/api/comments/:pizza_id", post(comments::add_comment))
        .route(
            "/api/comments/:pizza_id/:comment_id",
            axum::routing::put(comments::add_reply).delete(comments::remove_comment),
        )
        .route(
            "/api/comments/:pizza_id/:comment_id/:reply_id",
            delete(comments::remove_reply),
        )
        .with_state(state)
}

async fn healthz() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::storage::LocalStore;

    pub struct TestApp {
        _dir: tempfile::TempDir,
        router: Router,
    }

    impl TestApp {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = LocalStore::open(&dir.path().join("pizzas.redb")).unwrap();
            let router = router(AppState::new(Arc::new(store)));
            Self { _dir: dir, router }
        }

        pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let builder = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(json) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            let response = self.router.clone().oneshot(request).await.expect("response");
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let app = TestApp::new();
        let (status, body) = app.request(Method::GET, "/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
