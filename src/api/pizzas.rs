use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use super::{ApiResult, AppState};
use crate::models::{NewPizza, OneOrMany, Pizza, PizzaUpdate};
use crate::storage::StoreError;

pub(super) async fn get_all_pizza(State(state): State<AppState>) -> ApiResult<Json<Vec<Pizza>>> {
    Ok(Json(state.store.list_pizzas().await?))
}

pub(super) async fn get_pizza_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Pizza>> {
    Ok(Json(state.store.get_pizza(&id).await?))
}

/// Accepts one pizza or an array and answers in the same shape; the
/// offline sync agent always sends an array.
pub(super) async fn create_pizza(
    State(state): State<AppState>,
    body: Result<Json<OneOrMany<NewPizza>>, JsonRejection>,
) -> ApiResult<Json<OneOrMany<Pizza>>> {
    let Json(body) = body?;
    let created = match body {
        OneOrMany::One(pizza) => {
            let mut created = state.store.create_pizzas(vec![pizza]).await?;
            match created.pop() {
                Some(pizza) => OneOrMany::One(pizza),
                None => return Err(StoreError::Validation("no pizza was created".into()).into()),
            }
        }
        OneOrMany::Many(batch) => OneOrMany::Many(state.store.create_pizzas(batch).await?),
    };
    let count = match &created {
        OneOrMany::One(_) => 1,
        OneOrMany::Many(batch) => batch.len(),
    };
    tracing::info!(count, "pizzas created");
    Ok(Json(created))
}

pub(super) async fn update_pizza(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<PizzaUpdate>, JsonRejection>,
) -> ApiResult<Json<Pizza>> {
    let Json(update) = body?;
    Ok(Json(state.store.update_pizza(&id, update).await?))
}

pub(super) async fn delete_pizza(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Pizza>> {
    Ok(Json(state.store.delete_pizza(&id).await?))
}
