//! Cart routes.
//!
//! Every handler here takes [`RequireUser`], so an anonymous request is
//! rejected with 401 before the cart engine ever runs.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use cartwright_core::{CartLineId, ProductId};

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::CartLine;
use crate::state::AppState;

/// `GET /cart` - the caller's cart lines, ordered by line id.
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<CartLine>>> {
    let lines = state.cart().list(&user).await?;
    Ok(Json(lines))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// `POST /cart/add` - add one unit of a product variant.
///
/// Returns 201 with the created or incremented line.
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartLine>)> {
    let line = state
        .cart()
        .add_item(
            &user,
            body.product_id,
            body.size.as_deref(),
            body.color.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(line)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

/// `PUT /cart/{id}` - set an absolute quantity on a line.
///
/// A quantity of zero or less removes the line and returns 204;
/// otherwise the updated line comes back as JSON.
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(line_id): Path<CartLineId>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Response> {
    let updated = state
        .cart()
        .update_quantity(&user, line_id, body.quantity)
        .await?;

    Ok(match updated {
        Some(line) => Json(line).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// `DELETE /cart/{id}` - remove one line.
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(line_id): Path<CartLineId>,
) -> Result<StatusCode> {
    state.cart().remove_item(&user, line_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /cart/clear` - empty the caller's cart.
pub async fn clear(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<StatusCode> {
    state.cart().clear(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}
