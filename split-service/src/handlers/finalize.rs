//! The validation gate between assignment and the shareable result.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use service_core::error::AppError;

use crate::dtos::ErrorResponse;
use crate::handlers::{domain_err, session_or_404};
use crate::models::{SplitStatus, SplitSummary};
use crate::services::metrics::SPLITS_FINALIZED_TOTAL;
use crate::AppState;

/// Finalize the split: validate, round to cents with the remainder folded
/// into the first person, and freeze the session. Finalizing an
/// already-finalized split returns the same summary.
#[utoipa::path(
    post,
    path = "/splits/{split_id}/finalize",
    params(("split_id" = Uuid, Path, description = "Split session id")),
    responses(
        (status = 200, description = "Shareable split summary", body = SplitSummary),
        (status = 404, description = "Split not found", body = ErrorResponse),
        (status = 422, description = "Unassigned items or unnamed people", body = ErrorResponse)
    ),
    tag = "Finalize"
)]
pub async fn finalize_split(
    State(state): State<AppState>,
    Path(split_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_or_404(&state, split_id)?;
    let mut session = session.lock().await;

    let was_open = session.status == SplitStatus::Open;
    let summary = session.finalize().map_err(domain_err)?;
    if was_open {
        SPLITS_FINALIZED_TOTAL.inc();
    }

    tracing::info!(
        split_id = %split_id,
        people = summary.people.len(),
        grand_total = %summary.grand_total,
        "Split finalized"
    );

    Ok(Json(summary))
}
