//! People management: add, rename, remove with item transfer.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use service_core::error::AppError;

use crate::dtos::{AddPersonRequest, ErrorResponse, RenamePersonRequest, SplitResponse};
use crate::handlers::{domain_err, session_or_404};
use crate::AppState;

/// Add a person to the split. The name may be empty while the user is
/// mid-typing; finalization will insist on one.
#[utoipa::path(
    post,
    path = "/splits/{split_id}/people",
    params(("split_id" = Uuid, Path, description = "Split session id")),
    request_body = AddPersonRequest,
    responses(
        (status = 201, description = "Person added", body = SplitResponse),
        (status = 404, description = "Split not found", body = ErrorResponse),
        (status = 409, description = "Split already finalized", body = ErrorResponse)
    ),
    tag = "People"
)]
pub async fn add_person(
    State(state): State<AppState>,
    Path(split_id): Path<Uuid>,
    Json(req): Json<AddPersonRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let session = session_or_404(&state, split_id)?;
    let mut session = session.lock().await;
    let person_id = session.add_person(&req.name).map_err(domain_err)?;

    tracing::info!(split_id = %split_id, person_id = %person_id, "Person added");
    Ok((
        StatusCode::CREATED,
        Json(SplitResponse::from_session(&session)),
    ))
}

/// Rename a person.
#[utoipa::path(
    patch,
    path = "/splits/{split_id}/people/{person_id}",
    params(
        ("split_id" = Uuid, Path, description = "Split session id"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    request_body = RenamePersonRequest,
    responses(
        (status = 200, description = "Person renamed", body = SplitResponse),
        (status = 404, description = "Split or person not found", body = ErrorResponse),
        (status = 409, description = "Split already finalized", body = ErrorResponse)
    ),
    tag = "People"
)]
pub async fn rename_person(
    State(state): State<AppState>,
    Path((split_id, person_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<RenamePersonRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let session = session_or_404(&state, split_id)?;
    let mut session = session.lock().await;
    session
        .rename_person(person_id, &req.name)
        .map_err(domain_err)?;

    Ok(Json(SplitResponse::from_session(&session)))
}

/// Remove a person. Their items transfer to the first-created remaining
/// person; removing the last person is rejected.
#[utoipa::path(
    delete,
    path = "/splits/{split_id}/people/{person_id}",
    params(
        ("split_id" = Uuid, Path, description = "Split session id"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    responses(
        (status = 200, description = "Person removed, items transferred", body = SplitResponse),
        (status = 404, description = "Split or person not found", body = ErrorResponse),
        (status = 409, description = "Split already finalized", body = ErrorResponse),
        (status = 422, description = "Cannot remove the last person", body = ErrorResponse)
    ),
    tag = "People"
)]
pub async fn remove_person(
    State(state): State<AppState>,
    Path((split_id, person_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_or_404(&state, split_id)?;
    let mut session = session.lock().await;
    session.remove_person(person_id).map_err(domain_err)?;

    tracing::info!(split_id = %split_id, person_id = %person_id, "Person removed");
    Ok(Json(SplitResponse::from_session(&session)))
}
