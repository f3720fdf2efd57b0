use crate::api::handlers::AppState;
use crate::api::models::{
    CreateShopItemRequest, DeleteResponse, InsertResponse, JsonBody, UpdateShopItemRequest,
};
use crate::auth::CallerIdentity;
use crate::core::error::{Result, ShopError};
use crate::db::models::{NewShopItem, ShopItem, ShopItemPatch};
use crate::db::repository::OwnedRepository;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// Handler for GET /shopItem - List the caller's items
pub async fn list_shop_items(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<ShopItem>>> {
    let items = state.item_repo.list_for_owner(&caller.user_id).await?;
    Ok(Json(items))
}

/// Handler for GET /shopItem/:id - Get one of the caller's items
pub async fn get_shop_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<ShopItem>> {
    let item = state
        .item_repo
        .find_owned(&caller.user_id, &id)
        .await?
        .ok_or_else(|| ShopError::NotFound("Not found".to_string()))?;

    Ok(Json(item))
}

/// Handler for POST /shopItem - Create an item owned by the caller
pub async fn create_shop_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    JsonBody(req): JsonBody<CreateShopItemRequest>,
) -> Result<impl IntoResponse> {
    let item = state
        .item_repo
        .create_owned(&caller.user_id, NewShopItem::from(req))
        .await?;

    tracing::info!(user_id = %caller.user_id, item_id = %item.id, "Shop item created");

    Ok((
        StatusCode::CREATED,
        Json(InsertResponse {
            acknowledged: true,
            inserted_id: item.id,
        }),
    ))
}

/// Handler for PATCH /shopItem/:id - Partially update one of the caller's items
pub async fn update_shop_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateShopItemRequest>,
) -> Result<Json<ShopItem>> {
    let item = state
        .item_repo
        .update_owned(&caller.user_id, &id, ShopItemPatch::from(req))
        .await?
        .ok_or_else(|| ShopError::NotFound("Item not found".to_string()))?;

    tracing::debug!(user_id = %caller.user_id, item_id = %item.id, "Shop item updated");

    Ok(Json(item))
}

/// Handler for DELETE /shopItem/:id - Delete one of the caller's items
pub async fn delete_shop_item(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.item_repo.delete_owned(&caller.user_id, &id).await?;
    if deleted == 0 {
        return Err(ShopError::NotFound("Item not found".to_string()));
    }

    tracing::info!(user_id = %caller.user_id, item_id = %id, "Shop item deleted");

    Ok(Json(DeleteResponse {
        acknowledged: true,
        deleted_count: deleted,
    }))
}
