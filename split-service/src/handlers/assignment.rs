//! Item assignment: exclusive ownership of items by people.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use service_core::error::AppError;

use crate::dtos::{AssignItemRequest, ErrorResponse, SplitResponse};
use crate::handlers::{domain_err, session_or_404};
use crate::models::ItemId;
use crate::AppState;

/// Assign an item to a person. If the item already has an owner it moves:
/// ownership is exclusive by construction.
#[utoipa::path(
    put,
    path = "/splits/{split_id}/items/{item_id}/owner",
    params(
        ("split_id" = Uuid, Path, description = "Split session id"),
        ("item_id" = u32, Path, description = "Item id")
    ),
    request_body = AssignItemRequest,
    responses(
        (status = 200, description = "Item assigned", body = SplitResponse),
        (status = 404, description = "Split, item, or person not found", body = ErrorResponse),
        (status = 409, description = "Split already finalized", body = ErrorResponse)
    ),
    tag = "Assignment"
)]
pub async fn assign_item(
    State(state): State<AppState>,
    Path((split_id, item_id)): Path<(Uuid, ItemId)>,
    Json(req): Json<AssignItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_or_404(&state, split_id)?;
    let mut session = session.lock().await;
    session
        .assign_item(item_id, req.person_id)
        .map_err(domain_err)?;

    Ok(Json(SplitResponse::from_session(&session)))
}

/// Unassign an item from whoever holds it.
#[utoipa::path(
    delete,
    path = "/splits/{split_id}/items/{item_id}/owner",
    params(
        ("split_id" = Uuid, Path, description = "Split session id"),
        ("item_id" = u32, Path, description = "Item id")
    ),
    responses(
        (status = 200, description = "Item unassigned", body = SplitResponse),
        (status = 404, description = "Split or item not found", body = ErrorResponse),
        (status = 409, description = "Split already finalized", body = ErrorResponse),
        (status = 422, description = "Item was not assigned", body = ErrorResponse)
    ),
    tag = "Assignment"
)]
pub async fn unassign_item(
    State(state): State<AppState>,
    Path((split_id, item_id)): Path<(Uuid, ItemId)>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_or_404(&state, split_id)?;
    let mut session = session.lock().await;
    session.unassign_item(item_id).map_err(domain_err)?;

    Ok(Json(SplitResponse::from_session(&session)))
}
