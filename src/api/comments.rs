use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use super::{ApiResult, AppState};
use crate::models::{NewComment, NewReply, Pizza};

pub(super) async fn add_comment(
    State(state): State<AppState>,
    Path(pizza_id): Path<String>,
    body: Result<Json<NewComment>, JsonRejection>,
) -> ApiResult<Json<Pizza>> {
    let Json(comment) = body?;
    Ok(Json(state.store.add_comment(&pizza_id, comment).await?))
}

pub(super) async fn add_reply(
    State(state): State<AppState>,
    Path((pizza_id, comment_id)): Path<(String, String)>,
    body: Result<Json<NewReply>, JsonRejection>,
) -> ApiResult<Json<Pizza>> {
    let Json(reply) = body?;
    Ok(Json(state.store.add_reply(&pizza_id, &comment_id, reply).await?))
}

pub(super) async fn remove_comment(
    State(state): State<AppState>,
    Path((pizza_id, comment_id)): Path<(String, String)>,
) -> ApiResult<Json<Pizza>> {
    Ok(Json(state.store.remove_comment(&pizza_id, &comment_id).await?))
}

pub(super) async fn remove_reply(
    State(state): State<AppState>,
    Path((pizza_id, comment_id, reply_id)): Path<(String, String, String)>,
) -> ApiResult<Json<Pizza>> {
    Ok(Json(
        state
            .store
            .remove_reply(&pizza_id, &comment_id, &reply_id)
            .await?,
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::api::test_support::TestApp;

    async fn create_pizza(app: &TestApp) -> String {
        let (_, created) = app
            .request(Method::POST, "/api/pizzas", Some(json!({"pizzaName": "Discussed"})))
            .await;
        created["_id"].as_str().unwrap().to_string()
    }

    async fn add_comment(app: &TestApp, pizza_id: &str) -> (String, Value) {
        let (status, pizza) = app
            .request(
                Method::POST,
                &format!("/api/comments/{pizza_id}"),
                Some(json!({"writtenBy": "Pat", "commentBody": "Needs more basil"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let comment_id = pizza["comments"][0]["commentId"].as_str().unwrap().to_string();
        (comment_id, pizza)
    }

    #[tokio::test]
    async fn comment_is_embedded_in_pizza() {
        let app = TestApp::new();
        let pizza_id = create_pizza(&app).await;
        let (_, pizza) = add_comment(&app, &pizza_id).await;

        assert_eq!(pizza["_id"], pizza_id.as_str());
        assert_eq!(pizza["comments"][0]["writtenBy"], "Pat");
        assert_eq!(pizza["comments"][0]["replies"], json!([]));

        let (_, fetched) = app
            .request(Method::GET, &format!("/api/pizzas/{pizza_id}"), None)
            .await;
        assert_eq!(fetched["comments"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reply_add_and_remove() {
        let app = TestApp::new();
        let pizza_id = create_pizza(&app).await;
        let (comment_id, _) = add_comment(&app, &pizza_id).await;

        let (status, pizza) = app
            .request(
                Method::PUT,
                &format!("/api/comments/{pizza_id}/{comment_id}"),
                Some(json!({"writtenBy": "Sam", "replyBody": "Agreed"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let reply = &pizza["comments"][0]["replies"][0];
        assert_eq!(reply["replyBody"], "Agreed");
        let reply_id = reply["replyId"].as_str().unwrap();

        let (status, pizza) = app
            .request(
                Method::DELETE,
                &format!("/api/comments/{pizza_id}/{comment_id}/{reply_id}"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pizza["comments"][0]["replies"], json!([]));
    }

    #[tokio::test]
    async fn remove_comment_splices_array() {
        let app = TestApp::new();
        let pizza_id = create_pizza(&app).await;
        let (comment_id, _) = add_comment(&app, &pizza_id).await;

        let (status, pizza) = app
            .request(
                Method::DELETE,
                &format!("/api/comments/{pizza_id}/{comment_id}"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pizza["comments"], json!([]));
        assert_eq!(pizza["pizzaName"], "Discussed");
    }

    #[tokio::test]
    async fn comment_on_missing_pizza_is_404() {
        let app = TestApp::new();
        let (status, body) = app
            .request(
                Method::POST,
                "/api/comments/000000000000000000000000",
                Some(json!({"writtenBy": "Pat", "commentBody": "Hello?"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn blank_comment_is_400() {
        let app = TestApp::new();
        let pizza_id = create_pizza(&app).await;
        let (status, body) = app
            .request(
                Method::POST,
                &format!("/api/comments/{pizza_id}"),
                Some(json!({"writtenBy": "Pat"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }
}
